//! Shared primitives used across Marlin crates.

use core::fmt;

pub mod config;
pub mod destination;
pub mod timeline;

pub use config::SearchRewrite;
pub use config::ShellConfig;
pub use destination::Destination;
pub use timeline::DayKey;
pub use timeline::HistoryEntry;
pub use timeline::now_unix_seconds;

/// Result alias used across the workspace.
pub type ShellResult<T> = Result<T, ShellError>;

/// Top-level error type for the browser shell core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellError {
    pub code: &'static str,
    pub message: String,
}

impl ShellError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ShellError {}
