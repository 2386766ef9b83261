use bytes::BufMut;

use super::define::Amf0Marker;
use super::{Amf0Value, Amf0WriteError};

/// AMF0 encoder.
///
/// Writes AMF0 values into any [`BufMut`]. Writes into a growable buffer
/// cannot fail, so the only errors are values the format cannot represent.
pub struct Amf0Encoder;

impl Amf0Encoder {
    /// Encode a generic AMF0 value
    pub fn encode(buf: &mut impl BufMut, value: &Amf0Value) -> Result<(), Amf0WriteError> {
        match value {
            Amf0Value::Number(val) => Self::encode_number(buf, *val),
            Amf0Value::Boolean(val) => Self::encode_bool(buf, *val),
            Amf0Value::String(val) => Self::encode_string(buf, val)?,
            Amf0Value::Null => buf.put_u8(Amf0Marker::Null as u8),
            Amf0Value::Undefined => buf.put_u8(Amf0Marker::Undefined as u8),
            Amf0Value::Object(properties) => {
                buf.put_u8(Amf0Marker::Object as u8);
                for (key, value) in properties {
                    Self::encode_property(buf, key, value)?;
                }
                Self::object_eof(buf);
            }
            Amf0Value::EcmaArray(properties) => {
                Self::encode_ecma_array_header(buf, properties.len() as u32);
                for (key, value) in properties {
                    Self::encode_property(buf, key, value)?;
                }
                Self::object_eof(buf);
            }
            Amf0Value::StrictArray(values) => {
                buf.put_u8(Amf0Marker::StrictArray as u8);
                buf.put_u32(values.len() as u32);
                for value in values {
                    Self::encode(buf, value)?;
                }
            }
        }
        Ok(())
    }

    /// Write object end marker to signify the end of an AMF0 object
    pub fn object_eof(buf: &mut impl BufMut) {
        buf.put_uint(Amf0Marker::ObjectEnd as u64, 3);
    }

    /// Encode an AMF0 number
    pub fn encode_number(buf: &mut impl BufMut, value: f64) {
        buf.put_u8(Amf0Marker::Number as u8);
        buf.put_f64(value);
    }

    /// Encode an AMF0 boolean
    pub fn encode_bool(buf: &mut impl BufMut, value: bool) {
        buf.put_u8(Amf0Marker::Boolean as u8);
        buf.put_u8(value as u8);
    }

    /// Encode an AMF0 string, switching to the long-string form when the
    /// value does not fit a 16-bit length.
    pub fn encode_string(buf: &mut impl BufMut, value: &str) -> Result<(), Amf0WriteError> {
        if value.len() <= u16::MAX as usize {
            buf.put_u8(Amf0Marker::String as u8);
            Self::encode_key(buf, value)
        } else if value.len() <= u32::MAX as usize {
            buf.put_u8(Amf0Marker::LongString as u8);
            buf.put_u32(value.len() as u32);
            buf.put_slice(value.as_bytes());
            Ok(())
        } else {
            Err(Amf0WriteError::StringTooLong(value.len()))
        }
    }

    /// Encode a property name: a 16-bit length followed by UTF-8 bytes, no marker.
    pub fn encode_key(buf: &mut impl BufMut, key: &str) -> Result<(), Amf0WriteError> {
        if key.len() > u16::MAX as usize {
            return Err(Amf0WriteError::KeyTooLong(key.len()));
        }
        buf.put_u16(key.len() as u16);
        buf.put_slice(key.as_bytes());
        Ok(())
    }

    /// Encode a `name: value` pair as found inside objects and ECMA arrays.
    pub fn encode_property(
        buf: &mut impl BufMut,
        key: &str,
        value: &Amf0Value,
    ) -> Result<(), Amf0WriteError> {
        Self::encode_key(buf, key)?;
        Self::encode(buf, value)
    }

    /// Encode the ECMA array marker and its approximate element count.
    ///
    /// The properties and the trailing [`Amf0Encoder::object_eof`] are
    /// written separately by the caller.
    pub fn encode_ecma_array_header(buf: &mut impl BufMut, count: u32) {
        buf.put_u8(Amf0Marker::EcmaArray as u8);
        buf.put_u32(count);
    }
}
