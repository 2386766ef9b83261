use crate::{Result, TsError};

/// Fixed part of a PES header: start code, stream id, length and two flag
/// bytes plus the header data length.
const PES_FIXED_HEADER: usize = 9;

/// The parts of a PES packet header the transmuxer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PesHeader {
    pub stream_id: u8,
    /// `PES_packet_length`; 0 means unbounded.
    pub packet_length: u16,
    pub data_alignment: bool,
    /// Presentation time in milliseconds.
    pub pts: Option<i64>,
    /// Decode time in milliseconds, equal to `pts` when the stream omits it.
    pub dts: Option<i64>,
    /// Offset of the elementary stream payload from the start of the packet.
    pub header_len: usize,
}

impl PesHeader {
    /// Parses the header at the start of a PES packet.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < PES_FIXED_HEADER {
            return Err(TsError::InsufficientData {
                expected: PES_FIXED_HEADER,
                actual: data.len(),
            });
        }
        if data[..3] != [0x00, 0x00, 0x01] {
            return Err(TsError::MissingPesStartCode([data[0], data[1], data[2]]));
        }

        let stream_id = data[3];
        let packet_length = u16::from_be_bytes([data[4], data[5]]);
        let data_alignment = data[6] & 0x04 != 0;
        let pts_dts_flags = data[7] >> 6;
        let header_len = PES_FIXED_HEADER + data[8] as usize;

        let mut pts = None;
        let mut dts = None;
        if pts_dts_flags & 0x02 != 0 {
            pts = Some(timestamp_ms(field(data, 9)?));
            dts = pts;
            if pts_dts_flags == 0x03 {
                dts = Some(timestamp_ms(field(data, 14)?));
            }
        }

        Ok(Self {
            stream_id,
            packet_length,
            data_alignment,
            pts,
            dts,
            header_len,
        })
    }

    /// Elementary stream bytes this PES packet carries, or `None` when the
    /// packet length is unbounded.
    pub fn payload_len(&self) -> Option<usize> {
        if self.packet_length == 0 {
            return None;
        }
        // packet_length counts from the byte after the length field
        Some((self.packet_length as usize + 6).saturating_sub(self.header_len))
    }
}

fn field(data: &[u8], offset: usize) -> Result<[u8; 5]> {
    data.get(offset..offset + 5)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(TsError::InsufficientData {
            expected: offset + 5,
            actual: data.len(),
        })
}

/// Decodes a 33-bit 90 kHz timestamp into milliseconds: the low bit is
/// dropped and the rest divided by 45.
fn timestamp_ms(bytes: [u8; 5]) -> i64 {
    let ticks = ((bytes[0] as i64 & 0x0E) << 29)
        | ((bytes[1] as i64) << 22)
        | ((bytes[2] as i64 & 0xFE) << 14)
        | ((bytes[3] as i64) << 7)
        | ((bytes[4] as i64) >> 1);
    (ticks >> 1) / 45
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    fn encode_timestamp(marker: u8, ticks: u64) -> [u8; 5] {
        [
            (marker << 4) | (((ticks >> 30) as u8 & 0x07) << 1) | 1,
            (ticks >> 22) as u8,
            (((ticks >> 15) as u8) << 1) | 1,
            (ticks >> 7) as u8,
            ((ticks as u8) << 1) | 1,
        ]
    }

    fn header(pts: Option<u64>, dts: Option<u64>, length: u16, aligned: bool) -> Vec<u8> {
        let flags = match (pts, dts) {
            (Some(_), Some(_)) => 0xC0,
            (Some(_), None) => 0x80,
            _ => 0x00,
        };
        let header_data_len = match flags {
            0xC0 => 10,
            0x80 => 5,
            _ => 0,
        };
        let mut data = vec![0x00, 0x00, 0x01, 0xE0];
        data.extend_from_slice(&length.to_be_bytes());
        data.push(0x80 | if aligned { 0x04 } else { 0 });
        data.push(flags);
        data.push(header_data_len);
        if let Some(pts) = pts {
            data.extend_from_slice(&encode_timestamp(if dts.is_some() { 3 } else { 2 }, pts));
        }
        if let Some(dts) = dts {
            data.extend_from_slice(&encode_timestamp(1, dts));
        }
        data
    }

    #[test]
    fn test_pts_and_dts() {
        let data = header(Some(183_000), Some(180_000), 0, true);
        let pes = PesHeader::parse(&data).unwrap();

        assert_eq!(pes.stream_id, 0xE0);
        assert!(pes.data_alignment);
        assert_eq!(pes.pts, Some(2033));
        assert_eq!(pes.dts, Some(2000));
        assert_eq!(pes.header_len, 19);
        assert_eq!(pes.payload_len(), None);
    }

    #[test]
    fn test_dts_defaults_to_pts() {
        let data = header(Some(90_000), None, 0, false);
        let pes = PesHeader::parse(&data).unwrap();
        assert_eq!(pes.pts, Some(1000));
        assert_eq!(pes.dts, Some(1000));
        assert!(!pes.data_alignment);
    }

    #[test]
    fn test_full_33_bit_range() {
        let max = (1u64 << 33) - 1;
        let data = header(Some(max), None, 0, false);
        let pes = PesHeader::parse(&data).unwrap();
        assert_eq!(pes.pts, Some(((max >> 1) / 45) as i64));
    }

    #[test]
    fn test_bounded_payload_length() {
        // 8 bytes after the length field cover flags, header data length and PTS
        let data = header(Some(0), None, 8 + 200, false);
        let pes = PesHeader::parse(&data).unwrap();
        assert_eq!(pes.header_len, 14);
        assert_eq!(pes.payload_len(), Some(200));
    }

    #[test]
    fn test_missing_start_code() {
        let mut data = header(None, None, 0, false);
        data[2] = 0x02;
        assert_eq!(
            PesHeader::parse(&data),
            Err(TsError::MissingPesStartCode([0x00, 0x00, 0x02]))
        );
    }

    #[test]
    fn test_truncated_timestamp() {
        let data = header(Some(90_000), None, 0, false);
        assert!(matches!(
            PesHeader::parse(&data[..11]),
            Err(TsError::InsufficientData { .. })
        ));
    }
}
