use amf0::Amf0WriteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlvError {
    #[error("Invalid FLV header")]
    InvalidHeader,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Metadata encoding error: {0}")]
    Metadata(#[from] Amf0WriteError),
    #[error("A NAL unit is already open in this tag")]
    NalUnitAlreadyOpen,
    #[error("Tag data size too large: {0}")]
    TagTooLarge(usize),
}
