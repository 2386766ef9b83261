use std::fmt;
use std::sync::Arc;

use crate::fetch::FetchError;
use crate::loader::LoaderState;

/// Error code for a request that failed without a server error.
pub const MEDIA_ERR_NETWORK: u16 = 2;
/// Error code for media that arrived but could not be decoded.
pub const MEDIA_ERR_DECODE: u16 = 3;
/// Error code for a server error or an unusable playlist.
pub const MEDIA_ERR_SRC_NOT_SUPPORTED: u16 = 4;

#[derive(Debug, thiserror::Error, Clone)]
pub enum EngineError {
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: Arc<reqwest::Error>,
    },
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: Arc<std::io::Error>,
    },
    #[error("Playlist unavailable: {0}")]
    Playlist(MediaError),
    #[error("Cannot {operation} while the loader is in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: LoaderState,
    },
    #[error("Unknown playlist: {0}")]
    UnknownPlaylist(String),
}

// Manual implementation of From<reqwest::Error> for EngineError
// because of the Arc wrapping.
impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::Network {
            source: Arc::new(err),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io {
            source: Arc::new(err),
        }
    }
}

/// A failure reported to the player: the HTTP status (0 when there was no
/// response), a message and one of the `MEDIA_ERR_*` codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaError {
    pub status: u16,
    pub message: String,
    pub code: u16,
}

impl MediaError {
    /// A playlist body that could not be parsed.
    pub fn unsupported(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: MEDIA_ERR_SRC_NOT_SUPPORTED,
        }
    }

    /// A segment whose transport stream could not be transmuxed.
    pub fn decode(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: MEDIA_ERR_DECODE,
        }
    }
}

impl From<&FetchError> for MediaError {
    fn from(err: &FetchError) -> Self {
        Self {
            status: err.status,
            message: err.message.clone(),
            code: err.code(),
        }
    }
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (status {}, code {})",
            self.message, self.status, self.code
        )
    }
}

impl std::error::Error for MediaError {}
