//! ycmd process management

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::info;

use crate::ycmd::error::YcmdError;

/// Handle to a spawned ycmd child process.
///
/// The child is killed when the handle is dropped, so a discarded session
/// takes its backend down with it.
pub struct YcmdProcess {
    child: Child,
    port: u16,
}

impl YcmdProcess {
    pub fn spawn(path: &str, workspace_root: &str, debug: bool) -> Result<Self, YcmdError> {
        let port = free_port().map_err(YcmdError::Spawn)?;

        let mut command = Command::new(path);
        command
            .arg("--port")
            .arg(port.to_string())
            .arg("--idle_suicide_seconds")
            .arg("10800")
            .current_dir(workspace_root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if debug {
            command.arg("--log").arg("debug");
        }

        let child = command.spawn().map_err(YcmdError::Spawn)?;
        info!("spawned ycmd from {} on port {}", path, port);

        Ok(Self { child, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for YcmdProcess {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}

/// Asks the OS for a free TCP port to hand to ycmd.
fn free_port() -> std::io::Result<u16> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}
