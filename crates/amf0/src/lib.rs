//! AMF0 encoding and decoding for FLV script data.
//!
//! FLV metadata tags carry an AMF0 string (usually `onMetaData`) followed by
//! an ECMA array of named values. This crate writes those values into any
//! [`bytes::BufMut`] and reads them back from a byte slice.
//!
//! # Examples
//!
//! ```rust
//! # fn test() -> Result<(), Box<dyn std::error::Error>> {
//! use amf0::{Amf0Decoder, Amf0Encoder, Amf0Value};
//!
//! let mut buf = Vec::new();
//! Amf0Encoder::encode_string(&mut buf, "onMetaData")?;
//! Amf0Encoder::encode_ecma_array_header(&mut buf, 1);
//! Amf0Encoder::encode_property(&mut buf, "width", &Amf0Value::Number(1280.0))?;
//! Amf0Encoder::object_eof(&mut buf);
//!
//! let mut reader = Amf0Decoder::new(&buf);
//! assert_eq!(reader.decode()?, Amf0Value::String("onMetaData".into()));
//! let metadata = reader.decode()?;
//! assert_eq!(metadata.get("width").and_then(Amf0Value::as_number), Some(1280.0));
//! # Ok(())
//! # }
//! # test().expect("test failed");
//! ```
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod decode;
mod define;
mod encode;
mod errors;

pub use crate::decode::Amf0Decoder;
pub use crate::define::{Amf0Marker, Amf0Value};
pub use crate::encode::Amf0Encoder;
pub use crate::errors::{Amf0ReadError, Amf0WriteError};
