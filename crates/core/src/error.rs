//! Error types for deck assembly.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while indexing the corpus or composing a deck.
///
/// Per-entry conditions (hymn not found, slide skipped, corrupt title token,
/// missing media file) are deliberately *not* represented here: they are
/// non-fatal outcomes recorded in the generation log so a single bad hymn
/// never blocks the rest of the service.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read a file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error (PPTX and XLSX are ZIP containers).
    #[error("ZIP error: {0}")]
    Zip(String),

    /// XML parsing error inside a presentation part.
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// Invalid or corrupted presentation file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// Fatal configuration problem: malformed request line, unknown section
    /// label, or no corpus root could be scanned. Carries enough context to
    /// fix the request without re-running blind.
    #[error("Configuration error{}: {detail}", .line.map(|n| format!(" (line {n})")).unwrap_or_default())]
    Config {
        /// 1-based request line number, when the error concerns one.
        line: Option<usize>,
        detail: String,
    },
}

impl Error {
    /// Configuration error tied to a specific request line.
    pub fn config_at(line: usize, detail: impl Into<String>) -> Self {
        Error::Config {
            line: Some(line),
            detail: detail.into(),
        }
    }

    /// Configuration error with no associated line.
    pub fn config(detail: impl Into<String>) -> Self {
        Error::Config {
            line: None,
            detail: detail.into(),
        }
    }
}
