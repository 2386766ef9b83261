use thiserror::Error;

/// Errors that can occur during TS parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TsError {
    #[error("Invalid packet size: expected 188 bytes, got {0}")]
    InvalidPacketSize(usize),

    #[error("Invalid sync byte: expected 0x47, got 0x{0:02x}")]
    InvalidSyncByte(u8),

    #[error("Insufficient data: expected at least {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Invalid table ID: expected {expected}, got {actual}")]
    InvalidTableId { expected: u8, actual: u8 },

    #[error("Invalid section length: {0}")]
    InvalidSectionLength(u16),

    #[error("PAT describes {0} programs, only a single program is supported")]
    MultipleProgramsNotSupported(usize),

    #[error("Stream type 0x{stream_type:02x} is mapped to both PID {first} and PID {second}")]
    DuplicateStreamType {
        stream_type: u8,
        first: u16,
        second: u16,
    },

    #[error("PES packet does not start with 00 00 01, got {0:02x?}")]
    MissingPesStartCode([u8; 3]),

    #[error("Parse error: {0}")]
    ParseError(String),
}
