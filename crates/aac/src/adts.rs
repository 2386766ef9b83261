use std::io;

use crate::config::SampleFrequencyIndex;

/// Size of the fixed ADTS header, without the optional CRC.
pub const ADTS_HEADER_SIZE: usize = 7;

/// PCM samples carried by one raw data block.
pub const SAMPLES_PER_RAW_BLOCK: u32 = 1024;

/// A decoded ADTS frame header.
/// ISO/IEC 13818-7 - 6.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    /// When `false`, a 2-byte CRC follows the fixed header.
    pub protection_absent: bool,
    /// MPEG-4 audio object type (ADTS profile + 1).
    pub object_type: u8,
    /// Raw 4-bit sampling frequency index.
    pub sampling_frequency_index: u8,
    /// Channel configuration.
    pub channel_configuration: u8,
    /// Length of the whole frame, header and CRC included.
    pub frame_length: u16,
    /// Number of raw data blocks in the frame minus one.
    pub raw_data_blocks: u8,
}

impl AdtsHeader {
    /// Whether the two leading bytes carry the 12-bit `0xFFF` syncword
    /// followed by the zero layer field.
    pub fn is_sync(b0: u8, b1: u8) -> bool {
        b0 == 0xFF && b1 & 0xF6 == 0xF0
    }

    /// Decodes the fixed header.
    pub fn parse(header: &[u8; ADTS_HEADER_SIZE]) -> io::Result<Self> {
        if !Self::is_sync(header[0], header[1]) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("missing ADTS syncword: {:02x} {:02x}", header[0], header[1]),
            ));
        }

        let frame_length = ((header[3] as u16 & 0x03) << 11)
            | ((header[4] as u16) << 3)
            | ((header[5] as u16 & 0xE0) >> 5);

        Ok(Self {
            protection_absent: header[1] & 0x01 == 1,
            object_type: ((header[2] & 0xC0) >> 6) + 1,
            sampling_frequency_index: (header[2] & 0x3C) >> 2,
            channel_configuration: ((header[2] & 0x01) << 2) | ((header[3] & 0xC0) >> 6),
            frame_length,
            raw_data_blocks: header[6] & 0x03,
        })
    }

    /// Header size including the CRC when present.
    pub fn header_size(&self) -> usize {
        if self.protection_absent {
            ADTS_HEADER_SIZE
        } else {
            ADTS_HEADER_SIZE + 2
        }
    }

    /// Number of raw AAC bytes following the header, or `None` if the
    /// declared frame length cannot even hold the header.
    pub fn payload_len(&self) -> Option<usize> {
        (self.frame_length as usize).checked_sub(self.header_size())
    }

    /// Sampling rate in Hz, `None` for reserved or escape indices.
    pub fn sample_rate(&self) -> Option<u32> {
        SampleFrequencyIndex::from_index(self.sampling_frequency_index)?.to_freq()
    }

    /// PCM samples in this frame.
    pub fn samples(&self) -> u32 {
        (self.raw_data_blocks as u32 + 1) * SAMPLES_PER_RAW_BLOCK
    }

    /// Frame duration in milliseconds.
    pub fn duration_ms(&self) -> Option<f64> {
        let rate = self.sample_rate()?;
        Some(self.samples() as f64 * 1000.0 / rate as f64)
    }

    /// Packs the fields that define the decoder configuration, so a change
    /// between frames can be detected with a single comparison.
    pub fn config_word(&self) -> u16 {
        ((self.object_type as u16) << 11)
            | ((self.sampling_frequency_index as u16) << 7)
            | ((self.channel_configuration as u16) << 3)
    }

    /// The 2-byte AudioSpecificConfig describing this stream.
    pub fn audio_specific_config(&self) -> [u8; 2] {
        [
            (self.object_type << 3) | ((self.sampling_frequency_index & 0x0E) >> 1),
            ((self.sampling_frequency_index & 0x01) << 7) | ((self.channel_configuration & 0x0F) << 3),
        ]
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::{AudioObjectType, PartialAudioSpecificConfig};

    // AAC LC, 44100 Hz, stereo, 200 byte frame
    const LC_44100_STEREO: [u8; 7] = [0xFF, 0xF1, 0x50, 0x80, 0x19, 0x1F, 0xFC];

    #[test]
    fn test_parse_header_fields() {
        let header = AdtsHeader::parse(&LC_44100_STEREO).unwrap();

        assert!(header.protection_absent);
        assert_eq!(header.object_type, 2);
        assert_eq!(header.sampling_frequency_index, 4);
        assert_eq!(header.sample_rate(), Some(44100));
        assert_eq!(header.channel_configuration, 2);
        assert_eq!(header.frame_length, 200);
        assert_eq!(header.raw_data_blocks, 0);
        assert_eq!(header.payload_len(), Some(193));
        assert_eq!(header.samples(), 1024);
    }

    #[test]
    fn test_crc_changes_payload_length() {
        let mut bytes = LC_44100_STEREO;
        bytes[1] = 0xF0;
        let header = AdtsHeader::parse(&bytes).unwrap();

        assert!(!header.protection_absent);
        assert_eq!(header.header_size(), 9);
        assert_eq!(header.payload_len(), Some(191));
    }

    #[test]
    fn test_rejects_missing_sync() {
        let mut bytes = LC_44100_STEREO;
        bytes[1] = 0x71;
        assert_eq!(
            AdtsHeader::parse(&bytes).unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
        assert!(!AdtsHeader::is_sync(0xFE, 0xF1));
        // layer must be zero
        assert!(!AdtsHeader::is_sync(0xFF, 0xFF));
        assert!(AdtsHeader::is_sync(0xFF, 0xF9));
    }

    #[test]
    fn test_frame_shorter_than_header() {
        // frame length 5
        let bytes = [0xFF, 0xF1, 0x50, 0x80, 0x00, 0xBF, 0xFC];
        let header = AdtsHeader::parse(&bytes).unwrap();
        assert_eq!(header.frame_length, 5);
        assert_eq!(header.payload_len(), None);
    }

    #[test]
    fn test_two_raw_blocks_double_duration() {
        let mut bytes = LC_44100_STEREO;
        bytes[6] = 0xFD;
        let header = AdtsHeader::parse(&bytes).unwrap();
        assert_eq!(header.samples(), 2048);

        let duration = header.duration_ms().unwrap();
        assert!((duration - 2048.0 * 1000.0 / 44100.0).abs() < 1e-9);
    }

    #[test]
    fn test_reserved_rate_has_no_duration() {
        let mut bytes = LC_44100_STEREO;
        // index 13
        bytes[2] = 0x74;
        let header = AdtsHeader::parse(&bytes).unwrap();
        assert_eq!(header.sample_rate(), None);
        assert_eq!(header.duration_ms(), None);
    }

    #[test]
    fn test_audio_specific_config_matches_header() {
        let header = AdtsHeader::parse(&LC_44100_STEREO).unwrap();
        let asc = header.audio_specific_config();
        assert_eq!(asc, [0x12, 0x10]);

        let config = PartialAudioSpecificConfig::parse(&asc).unwrap();
        assert_eq!(config.audio_object_type, AudioObjectType::AacLowComplexity);
        assert_eq!(config.sampling_frequency, 44100);
        assert_eq!(config.channel_configuration, 2);
    }

    #[test]
    fn test_config_word_tracks_configuration_fields() {
        let stereo = AdtsHeader::parse(&LC_44100_STEREO).unwrap();

        let mut longer = LC_44100_STEREO;
        longer[4] = 0x40;
        let longer = AdtsHeader::parse(&longer).unwrap();
        assert_eq!(stereo.config_word(), longer.config_word());

        let mut mono = LC_44100_STEREO;
        mono[3] = 0x40;
        let mono = AdtsHeader::parse(&mono).unwrap();
        assert_eq!(mono.channel_configuration, 1);
        assert_ne!(stereo.config_word(), mono.config_word());
    }
}
