//! Literal and comment masking
//!
//! Replaces the contents of quoted literals and single-line comments with a
//! filler character so downstream bracket/comma scanning never trips over
//! punctuation embedded in them. The output has the same character length as
//! the input and every non-literal character keeps its position.

const FILLER: char = ' ';

#[derive(Clone, Copy, PartialEq)]
enum State {
    Code,
    DoubleQuoted,
    SingleQuoted,
    Comment,
}

/// Masks string/char literal bodies and `//` comment bodies.
///
/// Delimiters (the quotes and the comment marker itself) are preserved.
/// A literal never spans a line break; an unterminated literal is masked up
/// to the end of its line.
pub fn mask(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = chars.clone();
    let mut state = State::Code;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match state {
            State::Code => {
                if c == '"' {
                    state = State::DoubleQuoted;
                } else if c == '\'' {
                    state = State::SingleQuoted;
                } else if c == '/' && chars.get(i + 1) == Some(&'/') {
                    state = State::Comment;
                    i += 1;
                }
            }
            State::DoubleQuoted | State::SingleQuoted => {
                let closer = if state == State::DoubleQuoted { '"' } else { '\'' };
                if c == '\n' {
                    state = State::Code;
                } else if c == '\\' {
                    out[i] = FILLER;
                    // an escaped character cannot terminate the literal
                    if matches!(chars.get(i + 1), Some(&next) if next != '\n') {
                        out[i + 1] = FILLER;
                        i += 1;
                    }
                } else if c == closer {
                    state = State::Code;
                } else {
                    out[i] = FILLER;
                }
            }
            State::Comment => {
                if c == '\n' {
                    state = State::Code;
                } else {
                    out[i] = FILLER;
                }
            }
        }
        i += 1;
    }

    out.into_iter().collect()
}
