//! Error types for rendering

use thiserror::Error;

/// Errors raised while rendering a document
#[derive(Debug, Error)]
pub enum RenderError {
    /// No inline rule matched the remaining text.
    ///
    /// The plain-text rule covers everything except raw control characters,
    /// so hitting this means the input carried one of those (or a rule is broken).
    #[error("no inline rule matches byte {byte} (U+{byte:04X})")]
    UnmatchedInput { byte: u32 },

    /// A token document could not be read or written as JSON
    #[error("invalid token document: {0}")]
    Json(#[from] serde_json::Error),
}

impl RenderError {
    /// Build an `UnmatchedInput` for the first character of `rest`
    pub(crate) fn unmatched(rest: &str) -> Self {
        let byte = rest.chars().next().map(u32::from).unwrap_or_default();
        Self::UnmatchedInput { byte }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
