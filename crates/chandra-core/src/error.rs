//! Runtime error types.

use std::fmt;

/// An error raised while a compiled chunk executes.
#[derive(Clone, Debug)]
pub enum RuntimeError {
    /// General runtime error with message.
    Runtime(String),
    /// Stack overflow (too many nested non-tail calls).
    StackOverflow,
    /// Attempt to call a value that is not callable; carries the type name.
    NotCallable(&'static str),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Runtime(msg) => write!(f, "{msg}"),
            RuntimeError::StackOverflow => write!(f, "stack overflow"),
            RuntimeError::NotCallable(t) => write!(f, "attempt to call a {t} value"),
        }
    }
}

impl std::error::Error for RuntimeError {}
