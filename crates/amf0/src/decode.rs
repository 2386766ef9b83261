use std::borrow::Cow;

use bytes::Buf;
use num_traits::FromPrimitive;

use super::{Amf0Marker, Amf0ReadError, Amf0Value};

/// An AMF0 Decoder.
///
/// Reads values out of a borrowed byte slice. Strings and keys borrow from
/// the input, so decoding never copies text.
pub struct Amf0Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Amf0Decoder<'a> {
    /// Create a new AMF0 decoder.
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Check if the decoder has reached the end of the AMF0 data.
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn ensure(&self, needed: usize) -> Result<(), Amf0ReadError> {
        if self.buf.remaining() < needed {
            return Err(Amf0ReadError::UnexpectedEof {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Amf0ReadError> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    fn read_u8(&mut self) -> Result<u8, Amf0ReadError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    fn read_u16(&mut self) -> Result<u16, Amf0ReadError> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    fn read_u32(&mut self) -> Result<u32, Amf0ReadError> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    fn read_marker(&mut self) -> Result<Amf0Marker, Amf0ReadError> {
        let marker = self.read_u8()?;
        Amf0Marker::from_u8(marker).ok_or(Amf0ReadError::UnknownMarker(marker))
    }

    /// Read the next encoded value from the decoder.
    pub fn decode(&mut self) -> Result<Amf0Value<'a>, Amf0ReadError> {
        match self.read_marker()? {
            Amf0Marker::Number => {
                self.ensure(8)?;
                Ok(Amf0Value::Number(self.buf.get_f64()))
            }
            Amf0Marker::Boolean => Ok(Amf0Value::Boolean(self.read_u8()? > 0)),
            Amf0Marker::String => Ok(Amf0Value::String(self.read_string()?)),
            Amf0Marker::LongString => {
                let len = self.read_u32()? as usize;
                let bytes = self.read_bytes(len)?;
                Ok(Amf0Value::String(Cow::Borrowed(std::str::from_utf8(bytes)?)))
            }
            Amf0Marker::Object => Ok(Amf0Value::Object(self.read_properties()?)),
            Amf0Marker::EcmaArray => {
                // The declared count is only a hint; the end marker is authoritative.
                self.read_u32()?;
                Ok(Amf0Value::EcmaArray(self.read_properties()?))
            }
            Amf0Marker::StrictArray => {
                let len = self.read_u32()?;
                let mut values = Vec::with_capacity(len.min(1024) as usize);
                for _ in 0..len {
                    values.push(self.decode()?);
                }
                Ok(Amf0Value::StrictArray(values))
            }
            Amf0Marker::Null => Ok(Amf0Value::Null),
            Amf0Marker::Undefined => Ok(Amf0Value::Undefined),
            marker @ Amf0Marker::ObjectEnd => Err(Amf0ReadError::UnsupportedType(marker)),
        }
    }

    /// Read the next encoded value from the decoder and check if it matches the
    /// specified marker.
    pub fn decode_with_type(
        &mut self,
        expected: Amf0Marker,
    ) -> Result<Amf0Value<'a>, Amf0ReadError> {
        self.ensure(1)?;
        let got = Amf0Marker::from_u8(self.buf[0]).ok_or(Amf0ReadError::UnknownMarker(self.buf[0]))?;
        if got != expected {
            return Err(Amf0ReadError::WrongType { expected, got });
        }

        self.decode()
    }

    fn read_string(&mut self) -> Result<Cow<'a, str>, Amf0ReadError> {
        let len = self.read_u16()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(Cow::Borrowed(std::str::from_utf8(bytes)?))
    }

    fn at_object_end(&self) -> bool {
        self.buf.len() >= 3 && self.buf[..3] == [0x00, 0x00, Amf0Marker::ObjectEnd as u8]
    }

    fn read_properties(&mut self) -> Result<Vec<(Cow<'a, str>, Amf0Value<'a>)>, Amf0ReadError> {
        let mut properties = Vec::new();

        // Some muxers omit the terminator on the final ECMA array; running
        // out of input ends the property list as well.
        while !self.buf.is_empty() {
            if self.at_object_end() {
                self.buf.advance(3);
                break;
            }

            let key = self.read_string()?;
            let value = self.decode()?;
            properties.push((key, value));
        }

        Ok(properties)
    }
}

impl<'a> Iterator for Amf0Decoder<'a> {
    type Item = Result<Amf0Value<'a>, Amf0ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_empty() {
            return None;
        }

        Some(self.decode())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::Amf0Encoder;

    #[test]
    fn test_reader_bool() {
        let amf0_bool = vec![0x01, 0x01];
        let mut amf_reader = Amf0Decoder::new(&amf0_bool);
        assert_eq!(amf_reader.decode().unwrap(), Amf0Value::Boolean(true));
        assert!(amf_reader.is_empty());
    }

    #[test]
    fn test_reader_number() {
        let mut amf0_number = vec![0x00];
        amf0_number.extend_from_slice(&772.161_f64.to_be_bytes());

        let mut amf_reader = Amf0Decoder::new(&amf0_number);
        assert_eq!(amf_reader.decode().unwrap(), Amf0Value::Number(772.161));
    }

    #[test]
    fn test_reader_truncated_number() {
        let data = [0x00, 0x40, 0x00];
        let mut amf_reader = Amf0Decoder::new(&data);
        let err = amf_reader.decode().unwrap_err();
        assert!(matches!(
            err,
            Amf0ReadError::UnexpectedEof {
                needed: 8,
                remaining: 2
            }
        ));
    }

    #[test]
    fn test_reader_unknown_marker() {
        let data = [0x42];
        let mut amf_reader = Amf0Decoder::new(&data);
        assert!(matches!(
            amf_reader.decode().unwrap_err(),
            Amf0ReadError::UnknownMarker(0x42)
        ));
    }

    #[test]
    fn test_reader_script_tag_body() {
        let mut body = Vec::new();
        Amf0Encoder::encode_string(&mut body, "onMetaData").unwrap();
        Amf0Encoder::encode_ecma_array_header(&mut body, 2);
        Amf0Encoder::encode_property(&mut body, "duration", &Amf0Value::Number(12.5)).unwrap();
        Amf0Encoder::encode_property(&mut body, "stereo", &Amf0Value::Boolean(true)).unwrap();
        Amf0Encoder::object_eof(&mut body);

        let values: Vec<_> = Amf0Decoder::new(&body)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].as_str(), Some("onMetaData"));
        assert_eq!(values[1].get("duration").and_then(Amf0Value::as_number), Some(12.5));
        assert_eq!(values[1].get("stereo").and_then(Amf0Value::as_bool), Some(true));
    }

    #[test]
    fn test_reader_ecma_array_without_terminator() {
        let mut body = Vec::new();
        Amf0Encoder::encode_ecma_array_header(&mut body, 1);
        Amf0Encoder::encode_property(&mut body, "width", &Amf0Value::Number(320.0)).unwrap();

        let mut amf_reader = Amf0Decoder::new(&body);
        let value = amf_reader.decode().unwrap();
        assert_eq!(value.get("width").and_then(Amf0Value::as_number), Some(320.0));
        assert!(amf_reader.is_empty());
    }

    #[test]
    fn test_decode_with_type() {
        let data = [0x01, 0x00];
        let mut amf_reader = Amf0Decoder::new(&data);
        let err = amf_reader.decode_with_type(Amf0Marker::String).unwrap_err();
        assert!(matches!(
            err,
            Amf0ReadError::WrongType {
                expected: Amf0Marker::String,
                got: Amf0Marker::Boolean
            }
        ));

        let value = amf_reader.decode_with_type(Amf0Marker::Boolean).unwrap();
        assert_eq!(value, Amf0Value::Boolean(false));
    }

    #[test]
    fn test_nested_values_round_trip() {
        let value = Amf0Value::Object(vec![
            ("name".into(), Amf0Value::String("clip".into())),
            (
                "sizes".into(),
                Amf0Value::StrictArray(vec![Amf0Value::Number(1.0), Amf0Value::Null]),
            ),
        ]);

        let mut buf = Vec::new();
        Amf0Encoder::encode(&mut buf, &value).unwrap();
        assert_eq!(Amf0Decoder::new(&buf).decode().unwrap(), value);
    }
}
