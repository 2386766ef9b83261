//! Incremental construction of a single FLV tag.

use amf0::{Amf0Encoder, Amf0Marker, Amf0Value};
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::FlvError;
use crate::tag::{FlvTag, FlvTagType, TAG_HEADER_SIZE};

const INITIAL_CAPACITY: usize = 16 * 1024;

/// Frame type / codec id, AVC packet type and 24-bit composition time.
const VIDEO_PREFIX_SIZE: usize = 5;
/// Sound format / rate / size / type and AAC packet type.
const AUDIO_PREFIX_SIZE: usize = 2;
const METADATA_NAME: &str = "onMetaData";
/// String marker, name length, name, ECMA array marker and element count.
const METADATA_PREFIX_SIZE: usize = 1 + 2 + METADATA_NAME.len() + 1 + 4;

/// Sound format 10 (AAC), 44 kHz, 16-bit samples, stereo.
const AAC_SOUND_FLAGS: u8 = 0xAF;
const AVC_CODEC_ID: u8 = 0x07;
const KEY_FRAME: u8 = 0x10;
const INTER_FRAME: u8 = 0x20;

/// A growable buffer accumulating one FLV tag.
///
/// Space for the tag header and the type-specific payload prefix is reserved
/// up front and filled in by [`FlvTagBuilder::finalize`], which consumes the
/// builder.
#[derive(Debug)]
pub struct FlvTagBuilder {
    tag_type: FlvTagType,
    buf: BytesMut,
    /// Presentation timestamp in milliseconds.
    pub pts: i64,
    /// Decode timestamp in milliseconds.
    pub dts: i64,
    pub key_frame: bool,
    /// Marks an AVC/AAC sequence header rather than coded media.
    sequence_header: bool,
    nal_unit_start: Option<usize>,
    metadata_count: u32,
}

impl FlvTagBuilder {
    pub fn new(tag_type: FlvTagType, sequence_header: bool) -> Self {
        let prefix = match tag_type {
            FlvTagType::Video => VIDEO_PREFIX_SIZE,
            FlvTagType::Audio => AUDIO_PREFIX_SIZE,
            FlvTagType::ScriptData => METADATA_PREFIX_SIZE,
        };

        let mut buf = BytesMut::with_capacity(INITIAL_CAPACITY);
        buf.resize(TAG_HEADER_SIZE + prefix, 0);

        Self {
            tag_type,
            buf,
            pts: 0,
            dts: 0,
            key_frame: false,
            sequence_header,
            nal_unit_start: None,
            metadata_count: 0,
        }
    }

    pub fn video(sequence_header: bool) -> Self {
        Self::new(FlvTagType::Video, sequence_header)
    }

    pub fn audio(sequence_header: bool) -> Self {
        Self::new(FlvTagType::Audio, sequence_header)
    }

    pub fn metadata() -> Self {
        Self::new(FlvTagType::ScriptData, false)
    }

    pub fn with_timestamps(mut self, pts: i64, dts: i64) -> Self {
        self.pts = pts;
        self.dts = dts;
        self
    }

    pub fn tag_type(&self) -> FlvTagType {
        self.tag_type
    }

    /// Bytes written so far, including the reserved header.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing has been written past the reserved header.
    pub fn is_empty(&self) -> bool {
        self.buf.len() == TAG_HEADER_SIZE + self.prefix_size()
    }

    fn prefix_size(&self) -> usize {
        match self.tag_type {
            FlvTagType::Video => VIDEO_PREFIX_SIZE,
            FlvTagType::Audio => AUDIO_PREFIX_SIZE,
            FlvTagType::ScriptData => METADATA_PREFIX_SIZE,
        }
    }

    /// Grows the buffer by doubling so that `additional` more bytes fit.
    fn prepare_write(&mut self, additional: usize) {
        let free = self.buf.capacity() - self.buf.len();
        if free < additional {
            let target = (self.buf.capacity() * 2).max(self.buf.len() + additional);
            self.buf.reserve(target - self.buf.len());
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.prepare_write(1);
        self.buf.put_u8(byte);
    }

    pub fn write_short(&mut self, value: u16) {
        self.prepare_write(2);
        self.buf.put_u16(value);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.prepare_write(bytes.len());
        self.buf.put_slice(bytes);
    }

    pub fn write_metadata_double(&mut self, name: &str, value: f64) -> Result<(), FlvError> {
        self.write_metadata(name, &Amf0Value::Number(value))
    }

    pub fn write_metadata_boolean(&mut self, name: &str, value: bool) -> Result<(), FlvError> {
        self.write_metadata(name, &Amf0Value::Boolean(value))
    }

    fn write_metadata(&mut self, name: &str, value: &Amf0Value) -> Result<(), FlvError> {
        // key length + key + marker + widest scalar
        self.prepare_write(2 + name.len() + 1 + 8);
        Amf0Encoder::encode_property(&mut self.buf, name, value)?;
        self.metadata_count += 1;
        Ok(())
    }

    /// Reserves a 4-byte length field for a NAL unit about to be written.
    pub fn start_nal_unit(&mut self) -> Result<(), FlvError> {
        if self.nal_unit_start.is_some() {
            return Err(FlvError::NalUnitAlreadyOpen);
        }

        self.prepare_write(4);
        self.nal_unit_start = Some(self.buf.len());
        self.buf.put_u32(0);
        Ok(())
    }

    /// Size of the open NAL unit's payload so far.
    pub fn nal_unit_size(&self) -> usize {
        self.nal_unit_start
            .map(|start| self.buf.len() - start - 4)
            .unwrap_or(0)
    }

    /// Closes the open NAL unit by back-patching its length.
    ///
    /// An empty unit is rolled back entirely. When `capture` is given, a
    /// copy of the unit bytes (without the length field) is appended to it.
    pub fn end_nal_unit(&mut self, capture: Option<&mut Vec<Bytes>>) {
        let Some(start) = self.nal_unit_start.take() else {
            return;
        };

        let size = self.buf.len() - start - 4;
        if size == 0 {
            self.buf.truncate(start);
            return;
        }

        self.buf[start..start + 4].copy_from_slice(&(size as u32).to_be_bytes());
        if let Some(capture) = capture {
            capture.push(Bytes::copy_from_slice(&self.buf[start + 4..]));
        }
    }

    /// Writes the tag header, payload prefix and footer and freezes the bytes.
    pub fn finalize(mut self) -> Result<FlvTag, FlvError> {
        match self.tag_type {
            FlvTagType::Video => {
                let frame_type = if self.key_frame { KEY_FRAME } else { INTER_FRAME };
                let composition_time = (self.pts - self.dts) as i32;
                self.buf[11] = frame_type | AVC_CODEC_ID;
                self.buf[12] = if self.sequence_header { 0 } else { 1 };
                self.buf[13..16].copy_from_slice(&composition_time.to_be_bytes()[1..]);
            }
            FlvTagType::Audio => {
                self.buf[11] = AAC_SOUND_FLAGS;
                self.buf[12] = if self.sequence_header { 0 } else { 1 };
            }
            FlvTagType::ScriptData => {
                let name_end = 14 + METADATA_NAME.len();
                self.buf[11] = Amf0Marker::String as u8;
                self.buf[12..14].copy_from_slice(&(METADATA_NAME.len() as u16).to_be_bytes());
                self.buf[14..name_end].copy_from_slice(METADATA_NAME.as_bytes());
                self.buf[name_end] = Amf0Marker::EcmaArray as u8;
                self.buf[name_end + 1..name_end + 5]
                    .copy_from_slice(&self.metadata_count.to_be_bytes());
                self.prepare_write(3);
                Amf0Encoder::object_eof(&mut self.buf);
            }
        }

        let tag_size = self.buf.len();
        let data_size = tag_size - TAG_HEADER_SIZE;
        if data_size > 0x00FF_FFFF {
            return Err(FlvError::TagTooLarge(data_size));
        }

        let timestamp = self.dts.clamp(0, u32::MAX as i64) as u32;
        self.buf[0] = self.tag_type.into();
        self.buf[1..4].copy_from_slice(&(data_size as u32).to_be_bytes()[1..]);
        self.buf[4..7].copy_from_slice(&timestamp.to_be_bytes()[1..]);
        self.buf[7] = (timestamp >> 24) as u8;
        self.buf[8..11].fill(0);

        self.prepare_write(4);
        self.buf.put_u32(tag_size as u32);

        Ok(FlvTag {
            tag_type: self.tag_type,
            pts: self.pts,
            dts: self.dts,
            key_frame: self.key_frame,
            data: self.buf.freeze(),
        })
    }
}
