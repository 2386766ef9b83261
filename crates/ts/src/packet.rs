use bytes::Buf;
use memchr::memchr;

use crate::{Result, TsError};

/// Size of a transport stream packet.
pub const TS_PACKET_SIZE: usize = 188;

/// First byte of every packet.
pub const SYNC_BYTE: u8 = 0x47;

/// PAT PID (always 0x0000)
pub const PID_PAT: u16 = 0x0000;

/// NULL PID (always 0x1FFF)
pub const PID_NULL: u16 = 0x1FFF;

/// Offset of the next sync byte in `data`, if any.
#[inline]
pub fn find_sync(data: &[u8]) -> Option<usize> {
    memchr(SYNC_BYTE, data)
}

/// A TS packet parsed in place over a borrowed 188-byte slice.
#[derive(Debug, Clone, Copy)]
pub struct TsPacketRef<'a> {
    data: &'a [u8],
    pub transport_error_indicator: bool,
    pub payload_unit_start_indicator: bool,
    pub transport_priority: bool,
    pub pid: u16,
    pub transport_scrambling_control: u8,
    pub adaptation_field_control: u8,
    pub continuity_counter: u8,
    /// Offset to adaptation field (if present)
    adaptation_field_offset: Option<usize>,
    /// Offset to payload (if present)
    payload_offset: Option<usize>,
}

impl<'a> TsPacketRef<'a> {
    /// Parse a TS packet from exactly 188 bytes
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() != TS_PACKET_SIZE {
            return Err(TsError::InvalidPacketSize(data.len()));
        }
        let mut reader = data;
        let sync_byte = reader.get_u8();
        if sync_byte != SYNC_BYTE {
            return Err(TsError::InvalidSyncByte(sync_byte));
        }
        let byte1 = reader.get_u8();
        let byte2 = reader.get_u8();
        let byte3 = reader.get_u8();
        let transport_error_indicator = (byte1 & 0x80) != 0;
        let payload_unit_start_indicator = (byte1 & 0x40) != 0;
        let transport_priority = (byte1 & 0x20) != 0;
        let pid = ((byte1 as u16 & 0x1F) << 8) | byte2 as u16;
        let transport_scrambling_control = (byte3 >> 6) & 0x03;
        let adaptation_field_control = (byte3 >> 4) & 0x03;
        let continuity_counter = byte3 & 0x0F;

        let mut offset = 4;
        let mut adaptation_field_offset = None;
        let mut payload_offset = None;
        if adaptation_field_control & 0x02 != 0 {
            adaptation_field_offset = Some(offset);
            offset += 1 + data[offset] as usize;
        }
        if adaptation_field_control & 0x01 != 0 && offset < data.len() {
            payload_offset = Some(offset);
        }

        Ok(Self {
            data,
            transport_error_indicator,
            payload_unit_start_indicator,
            transport_priority,
            pid,
            transport_scrambling_control,
            adaptation_field_control,
            continuity_counter,
            adaptation_field_offset,
            payload_offset,
        })
    }

    /// Adaptation field bytes, without the length byte.
    #[inline]
    pub fn adaptation_field(&self) -> Option<&'a [u8]> {
        let offset = self.adaptation_field_offset?;
        let length = self.data[offset] as usize;
        self.data.get(offset + 1..offset + 1 + length)
    }

    /// Payload bytes.
    #[inline]
    pub fn payload(&self) -> Option<&'a [u8]> {
        self.payload_offset.map(|offset| &self.data[offset..])
    }

    /// PSI payload with the pointer field applied when PUSI is set.
    pub fn psi_payload(&self) -> Option<&'a [u8]> {
        let payload = self.payload()?;
        if self.payload_unit_start_indicator {
            let pointer_field = *payload.first()? as usize;
            payload.get(1 + pointer_field..).filter(|p| !p.is_empty())
        } else {
            Some(payload)
        }
    }
}
