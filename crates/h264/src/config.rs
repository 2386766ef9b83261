use std::io;

use bytes::{Buf, BufMut, Bytes};

use crate::sps::Sps;

/// SPS and PPS NAL units (header byte included) collected from the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSets {
    pub sps: Vec<Bytes>,
    pub pps: Vec<Bytes>,
}

impl ParameterSets {
    pub fn has_sps(&self) -> bool {
        !self.sps.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.sps.is_empty() && self.pps.is_empty()
    }

    pub fn clear(&mut self) {
        self.sps.clear();
        self.pps.clear();
    }

    /// Decodes the first SPS.
    pub fn sps_info(&self) -> io::Result<Sps> {
        let first = self.sps.first().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "no SPS has been captured")
        })?;
        Sps::parse_nal(first)
    }
}

/// The `AVCDecoderConfigurationRecord` from ISO/IEC 14496-15, as stored in
/// an FLV video sequence header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvcDecoderConfigurationRecord {
    pub configuration_version: u8,
    pub profile_indication: u8,
    pub profile_compatibility: u8,
    pub level_indication: u8,
    pub length_size_minus_one: u8,
    pub sps: Vec<Bytes>,
    pub pps: Vec<Bytes>,
}

impl AvcDecoderConfigurationRecord {
    /// Builds a record from captured parameter sets. Profile, compatibility
    /// and level are copied from bytes 1..4 of the first SPS.
    ///
    /// Returns `None` if there is no SPS long enough to carry them.
    pub fn from_parameter_sets(sets: &ParameterSets) -> Option<Self> {
        let first = sets.sps.first().filter(|sps| sps.len() >= 4)?;

        Some(Self {
            configuration_version: 1,
            profile_indication: first[1],
            profile_compatibility: first[2],
            level_indication: first[3],
            length_size_minus_one: 3,
            sps: vec![first.clone()],
            pps: sets.pps.clone(),
        })
    }

    /// Serializes the record. Only the first SPS is written.
    pub fn build(&self, writer: &mut impl BufMut) {
        writer.put_u8(self.configuration_version);
        writer.put_u8(self.profile_indication);
        writer.put_u8(self.profile_compatibility);
        writer.put_u8(self.level_indication);
        writer.put_u8(0xFC | (self.length_size_minus_one & 0x03));

        let sps_count = self.sps.len().min(1);
        writer.put_u8(0xE0 | sps_count as u8);
        for sps in self.sps.iter().take(sps_count) {
            writer.put_u16(sps.len() as u16);
            writer.put_slice(sps);
        }

        writer.put_u8(self.pps.len() as u8);
        for pps in &self.pps {
            writer.put_u16(pps.len() as u16);
            writer.put_slice(pps);
        }
    }

    /// The serialized size of the record.
    pub fn size(&self) -> usize {
        7 + self.sps.iter().take(1).map(|s| 2 + s.len()).sum::<usize>()
            + self.pps.iter().map(|p| 2 + p.len()).sum::<usize>()
    }

    pub fn parse(data: &[u8]) -> io::Result<Self> {
        let mut reader = io::Cursor::new(data);

        let header = take(&mut reader, 6)?;
        let configuration_version = header[0];
        let profile_indication = header[1];
        let profile_compatibility = header[2];
        let level_indication = header[3];
        let length_size_minus_one = header[4] & 0x03;
        let sps_count = header[5] & 0x1F;

        let mut sps = Vec::with_capacity(sps_count as usize);
        for _ in 0..sps_count {
            let len = take(&mut reader, 2)?;
            let len = u16::from_be_bytes([len[0], len[1]]);
            sps.push(Bytes::copy_from_slice(take(&mut reader, len as usize)?));
        }

        let pps_count = take(&mut reader, 1)?[0];
        let mut pps = Vec::with_capacity(pps_count as usize);
        for _ in 0..pps_count {
            let len = take(&mut reader, 2)?;
            let len = u16::from_be_bytes([len[0], len[1]]);
            pps.push(Bytes::copy_from_slice(take(&mut reader, len as usize)?));
        }

        Ok(Self {
            configuration_version,
            profile_indication,
            profile_compatibility,
            level_indication,
            length_size_minus_one,
            sps,
            pps,
        })
    }
}

fn take<'a>(reader: &mut io::Cursor<&'a [u8]>, len: usize) -> io::Result<&'a [u8]> {
    if reader.remaining() < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "truncated AVC decoder configuration record",
        ));
    }
    let start = reader.position() as usize;
    let data: &'a [u8] = *reader.get_ref();
    reader.advance(len);
    Ok(&data[start..start + len])
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    fn sets() -> ParameterSets {
        ParameterSets {
            sps: vec![
                Bytes::from_static(&[0x67, 0x64, 0x00, 0x28, 0xAC, 0xD9]),
                Bytes::from_static(&[0x67, 0x4D, 0x40, 0x1F]),
            ],
            pps: vec![
                Bytes::from_static(&[0x68, 0xEB, 0xE3, 0xCB]),
                Bytes::from_static(&[0x68, 0x22]),
            ],
        }
    }

    #[test]
    fn test_build_record_layout() {
        let record = AvcDecoderConfigurationRecord::from_parameter_sets(&sets()).unwrap();

        let mut out = Vec::new();
        record.build(&mut out);

        assert_eq!(
            out,
            vec![
                0x01, 0x64, 0x00, 0x28, 0xFF, 0xE1, // header, one SPS
                0x00, 0x06, 0x67, 0x64, 0x00, 0x28, 0xAC, 0xD9, // first SPS only
                0x02, // PPS count
                0x00, 0x04, 0x68, 0xEB, 0xE3, 0xCB, //
                0x00, 0x02, 0x68, 0x22,
            ]
        );
        assert_eq!(out.len(), record.size());
    }

    #[test]
    fn test_parse_round_trips_built_record() {
        let record = AvcDecoderConfigurationRecord::from_parameter_sets(&sets()).unwrap();
        let mut out = Vec::new();
        record.build(&mut out);

        assert_eq!(AvcDecoderConfigurationRecord::parse(&out).unwrap(), record);
    }

    #[test]
    fn test_record_requires_sps() {
        let only_pps = ParameterSets {
            sps: vec![],
            pps: vec![Bytes::from_static(&[0x68, 0x01])],
        };
        assert!(AvcDecoderConfigurationRecord::from_parameter_sets(&only_pps).is_none());

        let short_sps = ParameterSets {
            sps: vec![Bytes::from_static(&[0x67, 0x42])],
            pps: vec![],
        };
        assert!(AvcDecoderConfigurationRecord::from_parameter_sets(&short_sps).is_none());
    }

    #[test]
    fn test_parse_truncated_record() {
        let err = AvcDecoderConfigurationRecord::parse(&[0x01, 0x42, 0x00, 0x1E, 0xFF, 0xE1, 0x00])
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_parameter_set_helpers() {
        let mut sets = sets();
        assert!(sets.has_sps());
        assert!(!sets.is_empty());
        sets.clear();
        assert!(sets.is_empty());
        assert_eq!(sets.sps_info().unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
