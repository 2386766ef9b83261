use std::io;

use flv::FlvError;
use thiserror::Error;
use ts::TsError;

/// Failures that make the current segment unusable.
#[derive(Debug, Error)]
pub enum TransmuxError {
    #[error("Malformed transport stream: {0}")]
    Ts(#[from] TsError),

    #[error("Failed to build FLV tag: {0}")]
    Flv(#[from] FlvError),

    #[error("Invalid AAC configuration: {0}")]
    AudioConfig(#[source] io::Error),
}
