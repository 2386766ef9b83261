use std::fmt::Display;

use bytes::{BufMut, Bytes, BytesMut};

use crate::builder::FlvTagBuilder;
use crate::error::FlvError;

const FLV_HEADER_SIZE: u32 = 9;
const FLV_SIGNATURE: &[u8; 3] = b"FLV";

/// The 9-byte FLV file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlvHeader {
    pub version: u8,
    pub has_audio: bool,
    pub has_video: bool,
}

impl Default for FlvHeader {
    fn default() -> Self {
        Self {
            version: 1,
            has_audio: true,
            has_video: true,
        }
    }
}

impl Display for FlvHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FLV v{} (audio: {}, video: {})",
            self.version, self.has_audio, self.has_video
        )
    }
}

impl FlvHeader {
    pub fn new(has_audio: bool, has_video: bool) -> Self {
        Self {
            has_audio,
            has_video,
            ..Self::default()
        }
    }

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.has_audio {
            flags |= 0x04;
        }
        if self.has_video {
            flags |= 0x01;
        }
        flags
    }

    /// Encodes the header followed by the zero PreviousTagSize0 field,
    /// 13 bytes in total.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(13);
        buf.put_slice(FLV_SIGNATURE);
        buf.put_u8(self.version);
        buf.put_u8(self.flags());
        buf.put_u32(FLV_HEADER_SIZE);
        buf.put_u32(0);
        buf.freeze()
    }

    /// Encodes the header and, for a known positive duration, a leading
    /// `onMetaData` tag announcing it (in seconds).
    pub fn encode_with_duration(&self, duration: Option<f64>) -> Result<Bytes, FlvError> {
        let header = self.encode();
        let Some(duration) = duration.filter(|d| d.is_finite() && *d > 0.0) else {
            return Ok(header);
        };

        let mut metadata = FlvTagBuilder::metadata();
        metadata.write_metadata_double("duration", duration)?;
        let tag = metadata.finalize()?;

        let mut buf = BytesMut::with_capacity(header.len() + tag.data.len());
        buf.put_slice(&header);
        buf.put_slice(&tag.data);
        Ok(buf.freeze())
    }

    /// Parses the 9-byte header (the trailing PreviousTagSize0 is not consumed).
    pub fn parse(data: &[u8]) -> Result<Self, FlvError> {
        if data.len() < FLV_HEADER_SIZE as usize || &data[..3] != FLV_SIGNATURE {
            return Err(FlvError::InvalidHeader);
        }

        let data_offset = u32::from_be_bytes([data[5], data[6], data[7], data[8]]);
        if data_offset != FLV_HEADER_SIZE {
            return Err(FlvError::InvalidHeader);
        }

        Ok(Self {
            version: data[3],
            has_audio: data[4] & 0x04 != 0,
            has_video: data[4] & 0x01 != 0,
        })
    }
}
