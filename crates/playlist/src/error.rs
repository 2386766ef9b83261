use thiserror::Error;

/// Playlist bodies that cannot be interpreted at all.
///
/// Anything less severe is reported as a [`crate::Diagnostic`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Playlist is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Missing #EXTM3U header, not an HLS playlist")]
    MissingHeader,
}
