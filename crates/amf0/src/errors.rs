use super::define::Amf0Marker;

/// Errors that can occur when decoding AMF0 data.
#[derive(Debug, thiserror::Error)]
pub enum Amf0ReadError {
    /// An unknown marker was encountered.
    #[error("unknown marker: {0}")]
    UnknownMarker(u8),
    /// An unsupported type was encountered.
    #[error("unsupported type: {0:?}")]
    UnsupportedType(Amf0Marker),
    /// A string parse error occurred.
    #[error("string parse error: {0}")]
    StringParseError(#[from] std::str::Utf8Error),
    /// The input ended in the middle of a value.
    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes required by the value being read.
        needed: usize,
        /// Bytes left in the input.
        remaining: usize,
    },
    /// A wrong type was encountered. Created when using
    /// `Amf0Decoder::decode_with_type` and the next value is not the expected
    /// type.
    #[error("wrong type: expected {expected:?}, got {got:?}")]
    WrongType {
        /// The marker the caller asked for.
        expected: Amf0Marker,
        /// The marker found in the data.
        got: Amf0Marker,
    },
}

/// Errors that can occur when encoding AMF0 data.
#[derive(Debug, thiserror::Error)]
pub enum Amf0WriteError {
    /// A property name does not fit the 16-bit length prefix.
    #[error("property key too long: {0} bytes")]
    KeyTooLong(usize),
    /// A string does not fit even the 32-bit long-string length prefix.
    #[error("string too long: {0} bytes")]
    StringTooLong(usize),
}
