/// Elementary stream types that can appear in a PMT.
///
/// Only H.264 video and ADTS AAC audio are transmuxed; the rest are named so
/// that ignored streams show up readably in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// MPEG-1 Video
    Mpeg1Video,
    /// MPEG-2 Video
    Mpeg2Video,
    /// MPEG-1 Audio
    Mpeg1Audio,
    /// MPEG-2 Audio
    Mpeg2Audio,
    /// MPEG-2 Private PES packets
    Mpeg2PrivatePes,
    /// ADTS AAC Audio
    AdtsAac,
    /// LATM AAC Audio
    LatmAac,
    /// Metadata carried in PES packets
    MetadataPes,
    /// AVC video stream (ITU-T Rec. H.264 | ISO/IEC 14496-10)
    H264,
    /// HEVC video stream (ITU-T Rec. H.265 | ISO/IEC 23008-2)
    H265,
    /// AC-3 Audio
    Ac3,
    /// E-AC-3 Audio
    EAc3,
    /// Unknown stream type
    Unknown(u8),
}

impl StreamType {
    /// Whether this stream is consumed by the transmuxer.
    pub fn is_supported(&self) -> bool {
        matches!(self, StreamType::H264 | StreamType::AdtsAac)
    }
}

impl From<u8> for StreamType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => StreamType::Mpeg1Video,
            0x02 => StreamType::Mpeg2Video,
            0x03 => StreamType::Mpeg1Audio,
            0x04 => StreamType::Mpeg2Audio,
            0x06 => StreamType::Mpeg2PrivatePes,
            0x0F => StreamType::AdtsAac,
            0x11 => StreamType::LatmAac,
            0x15 => StreamType::MetadataPes,
            0x1B => StreamType::H264,
            0x24 => StreamType::H265,
            0x81 => StreamType::Ac3,
            0x87 => StreamType::EAc3,
            _ => StreamType::Unknown(value),
        }
    }
}

impl From<StreamType> for u8 {
    fn from(value: StreamType) -> Self {
        match value {
            StreamType::Mpeg1Video => 0x01,
            StreamType::Mpeg2Video => 0x02,
            StreamType::Mpeg1Audio => 0x03,
            StreamType::Mpeg2Audio => 0x04,
            StreamType::Mpeg2PrivatePes => 0x06,
            StreamType::AdtsAac => 0x0F,
            StreamType::LatmAac => 0x11,
            StreamType::MetadataPes => 0x15,
            StreamType::H264 => 0x1B,
            StreamType::H265 => 0x24,
            StreamType::Ac3 => 0x81,
            StreamType::EAc3 => 0x87,
            StreamType::Unknown(value) => value,
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_stream_type_conversion() {
        assert_eq!(StreamType::from(0x1B), StreamType::H264);
        assert_eq!(StreamType::from(0x0F), StreamType::AdtsAac);
        assert_eq!(StreamType::from(0xFF), StreamType::Unknown(0xFF));
        assert_eq!(u8::from(StreamType::H264), 0x1B);
        assert_eq!(u8::from(StreamType::Unknown(0x42)), 0x42);
    }

    #[test]
    fn test_supported_types() {
        assert!(StreamType::H264.is_supported());
        assert!(StreamType::AdtsAac.is_supported());
        assert!(!StreamType::H265.is_supported());
        assert!(!StreamType::LatmAac.is_supported());
    }
}
