use std::io;

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;

/// Size of the fixed tag header preceding every payload.
pub const TAG_HEADER_SIZE: usize = 11;

/// FLV Tag Type
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - FLV tags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlvTagType {
    Audio = 8,
    Video = 9,
    ScriptData = 18,
}

impl TryFrom<u8> for FlvTagType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            8 => Ok(FlvTagType::Audio),
            9 => Ok(FlvTagType::Video),
            18 => Ok(FlvTagType::ScriptData),
            other => Err(other),
        }
    }
}

impl From<FlvTagType> for u8 {
    fn from(value: FlvTagType) -> Self {
        value as u8
    }
}

/// A finalized FLV tag.
///
/// `data` holds the complete framing: tag header, payload and the
/// previous-tag-size footer, ready to be appended to an FLV stream.
/// Timestamps are kept in milliseconds next to the bytes so that the
/// demuxer can order tags without re-parsing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlvTag {
    pub tag_type: FlvTagType,
    pub pts: i64,
    pub dts: i64,
    pub key_frame: bool,
    pub data: Bytes,
}

impl FlvTag {
    /// The tag payload, without header or footer.
    pub fn payload(&self) -> Bytes {
        self.data
            .slice(TAG_HEADER_SIZE..self.data.len().saturating_sub(4).max(TAG_HEADER_SIZE))
    }

    /// Whether this is a codec configuration tag (AVC/AAC sequence header).
    pub fn is_sequence_header(&self) -> bool {
        matches!(self.tag_type, FlvTagType::Audio | FlvTagType::Video)
            && self.data.len() > TAG_HEADER_SIZE + 1
            && self.data[TAG_HEADER_SIZE + 1] == 0
    }

    /// Decodes the fixed header back out of the framed bytes.
    pub fn header(&self) -> io::Result<FlvTagHeader> {
        FlvTagHeader::parse(&self.data)
    }
}

/// The 11-byte header in front of every tag payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlvTagHeader {
    pub tag_type: u8,
    pub data_size: u32,
    pub timestamp_ms: u32,
    pub stream_id: u32,
}

impl FlvTagHeader {
    pub fn parse(mut data: &[u8]) -> io::Result<Self> {
        let tag_type = data.read_u8()?;
        let data_size = data.read_u24::<BigEndian>()?;
        // 24 low bits followed by the extended upper byte.
        let timestamp_ms = data.read_u24::<BigEndian>()? | ((data.read_u8()? as u32) << 24);
        let stream_id = data.read_u24::<BigEndian>()?;

        Ok(Self {
            tag_type,
            data_size,
            timestamp_ms,
            stream_id,
        })
    }
}
