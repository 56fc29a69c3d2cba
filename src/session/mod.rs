//! Backend session lifecycle
//! - error.rs: session error taxonomy
//!
//! The coordinator owns the one authoritative backend session. Creation is
//! lazy and guarded: callers arriving before a workspace root and a valid
//! configuration are known wait until both arrive, and concurrent callers
//! serialize on a single create-if-absent path instead of racing to spawn
//! redundant backends.

pub mod error;

pub use error::SessionError;

use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tracing::info;

use crate::config::YcmdSettings;
use crate::ycmd::{SemanticBackend, YcmdClient, YcmdError};

/// One live backend connection plus the settings snapshot it was created
/// from. Handlers hold this by `Arc`; a config change produces a new
/// instance rather than mutating this one.
pub struct Session {
    backend: Arc<dyn SemanticBackend>,
    settings: YcmdSettings,
}

impl Session {
    pub fn backend(&self) -> &dyn SemanticBackend {
        self.backend.as_ref()
    }

    pub fn settings(&self) -> &YcmdSettings {
        &self.settings
    }
}

/// Creates the backend connection for a session. Injected so tests can
/// substitute a scripted backend for a real ycmd process.
#[async_trait::async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(
        &self,
        workspace_root: &str,
        settings: &YcmdSettings,
    ) -> Result<Arc<dyn SemanticBackend>, YcmdError>;
}

/// Production factory: spawn ycmd and wait for it to become ready.
pub struct YcmdSessionFactory;

#[async_trait::async_trait]
impl SessionFactory for YcmdSessionFactory {
    async fn create(
        &self,
        workspace_root: &str,
        settings: &YcmdSettings,
    ) -> Result<Arc<dyn SemanticBackend>, YcmdError> {
        let client = YcmdClient::start(settings, workspace_root).await?;
        Ok(Arc::new(client))
    }
}

#[derive(Default)]
struct State {
    workspace_root: Option<String>,
    settings: Option<YcmdSettings>,
    session: Option<Arc<Session>>,
}

pub struct SessionCoordinator {
    state: Mutex<State>,
    configured: Notify,
    factory: Arc<dyn SessionFactory>,
}

impl SessionCoordinator {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            configured: Notify::new(),
            factory,
        }
    }

    pub async fn set_workspace_root(&self, root: String) {
        let mut state = self.state.lock().await;
        state.workspace_root = Some(root);
        self.configured.notify_waiters();
    }

    /// Stores already-validated settings and discards any live session so
    /// the next `get()` recreates it against the new configuration.
    pub async fn set_settings(&self, settings: YcmdSettings) {
        let mut state = self.state.lock().await;
        if state.session.is_some() {
            info!("configuration changed, discarding current ycmd session");
        }
        state.settings = Some(settings);
        state.session = None;
        self.configured.notify_waiters();
    }

    /// Returns the current session, creating it if absent.
    ///
    /// Waits indefinitely while no workspace root or configuration is known.
    /// A failed creation attempt returns `Startup` for this call only; the
    /// next call retries from scratch.
    pub async fn get(&self) -> Result<Arc<Session>, SessionError> {
        loop {
            let notified = self.configured.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if let Some(session) = &state.session {
                    return Ok(session.clone());
                }

                if let (Some(root), Some(settings)) =
                    (state.workspace_root.clone(), state.settings.clone())
                {
                    // Creation happens under the state lock: concurrent
                    // callers wait here and find the session already set.
                    let backend = self
                        .factory
                        .create(&root, &settings)
                        .await
                        .map_err(|e| SessionError::Startup(e.to_string()))?;
                    let session = Arc::new(Session { backend, settings });
                    state.session = Some(session.clone());
                    info!("ycmd session ready for {}", root);
                    return Ok(session);
                }
            }

            notified.as_mut().await;
        }
    }

    /// Unconditionally discards the session reference. Used on shutdown;
    /// no drain of in-flight requests is attempted.
    pub async fn reset(&self) {
        self.state.lock().await.session = None;
    }
}
