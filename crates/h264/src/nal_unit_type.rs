/// NAL (Network Abstraction Layer) unit types as defined by ISO/IEC 14496-10:2022 (Table 7-1).
///
/// Only the types the transmuxer acts on get their own variant; the
/// remaining values are kept in [`NALUnitType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NALUnitType {
    /// Regular video slice (non-IDR picture)
    NonIDRSlice,
    /// IDR picture (used to refresh the video stream)
    IDRSlice,
    /// Extra metadata (Supplemental Enhancement Information)
    SEI,
    /// Sequence Parameter Set (SPS) – contains video configuration details
    SPS,
    /// Picture Parameter Set (PPS) – contains picture-specific settings
    PPS,
    /// Marks the start of a new access unit (frame boundary)
    AccessUnitDelimiter,
    /// End of video sequence
    EndOfSeq,
    /// End of video stream
    EndOfStream,
    /// Extra filler data (can be ignored)
    FillerData,
    /// Any other `nal_unit_type` value
    Other(u8),
}

impl NALUnitType {
    /// Classifies a NAL unit by its first (header) byte.
    pub fn from_header(header: u8) -> Self {
        Self::from(header & 0x1F)
    }

    /// The raw 5-bit `nal_unit_type`.
    pub fn value(self) -> u8 {
        match self {
            NALUnitType::NonIDRSlice => 1,
            NALUnitType::IDRSlice => 5,
            NALUnitType::SEI => 6,
            NALUnitType::SPS => 7,
            NALUnitType::PPS => 8,
            NALUnitType::AccessUnitDelimiter => 9,
            NALUnitType::EndOfSeq => 10,
            NALUnitType::EndOfStream => 11,
            NALUnitType::FillerData => 12,
            NALUnitType::Other(value) => value,
        }
    }
}

impl From<u8> for NALUnitType {
    fn from(value: u8) -> Self {
        match value {
            1 => NALUnitType::NonIDRSlice,
            5 => NALUnitType::IDRSlice,
            6 => NALUnitType::SEI,
            7 => NALUnitType::SPS,
            8 => NALUnitType::PPS,
            9 => NALUnitType::AccessUnitDelimiter,
            10 => NALUnitType::EndOfSeq,
            11 => NALUnitType::EndOfStream,
            12 => NALUnitType::FillerData,
            other => NALUnitType::Other(other),
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_from_header() {
        assert_eq!(NALUnitType::from_header(0x65), NALUnitType::IDRSlice);
        assert_eq!(NALUnitType::from_header(0x41), NALUnitType::NonIDRSlice);
        assert_eq!(NALUnitType::from_header(0x67), NALUnitType::SPS);
        assert_eq!(NALUnitType::from_header(0x68), NALUnitType::PPS);
        assert_eq!(NALUnitType::from_header(0x09), NALUnitType::AccessUnitDelimiter);
        assert_eq!(NALUnitType::from_header(0x06), NALUnitType::SEI);
        assert_eq!(NALUnitType::from_header(0x7F), NALUnitType::Other(31));
    }

    #[test]
    fn test_value_round_trip() {
        for value in 0..32u8 {
            assert_eq!(NALUnitType::from(value).value(), value);
        }
    }
}
