use std::collections::VecDeque;

use aac::{ADTS_HEADER_SIZE, AdtsHeader, PartialAudioSpecificConfig};
use flv::{FlvTag, FlvTagBuilder};
use memchr::memchr;
use tracing::{debug, trace, warn};

use super::rebaser::TimestampRebaser;
use crate::TransmuxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdtsState {
    /// Looking for the first syncword byte.
    Sync,
    /// Accumulating the fixed header.
    Header,
    /// Skipping CRC bytes.
    Crc(usize),
    /// Copying the raw frame.
    Payload,
}

/// Splits an ADTS byte stream into FLV audio tags.
///
/// Every frame becomes one `AF 01` audio tag. When the object type, sampling
/// frequency or channel layout changes, a metadata tag and an AAC sequence
/// header are queued first.
#[derive(Debug)]
pub struct AacReassembler {
    state: AdtsState,
    header: [u8; ADTS_HEADER_SIZE],
    header_len: usize,
    current: Option<AdtsHeader>,
    /// `None` while a frame with an unusable header is being skipped.
    frame: Option<FlvTagBuilder>,
    remaining: usize,
    /// Bytes left in the current PES packet, `None` when unbounded.
    budget: Option<usize>,
    next_pts: f64,
    rebaser: TimestampRebaser,
    config_word: Option<u16>,
    tags: VecDeque<FlvTag>,
    last_dts: Option<i64>,
}

impl Default for AacReassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl AacReassembler {
    pub fn new() -> Self {
        Self {
            state: AdtsState::Sync,
            header: [0; ADTS_HEADER_SIZE],
            header_len: 0,
            current: None,
            frame: None,
            remaining: 0,
            budget: None,
            next_pts: 0.0,
            rebaser: TimestampRebaser::default(),
            config_word: None,
            tags: VecDeque::new(),
            last_dts: None,
        }
    }

    /// Starts a new PES packet.
    ///
    /// `pes_payload_len` bounds how many bytes of this packet are consumed.
    /// A data-aligned packet drops any partially read frame.
    pub fn set_next_timestamp(
        &mut self,
        pts: Option<i64>,
        pes_payload_len: Option<usize>,
        data_aligned: bool,
    ) {
        if let Some(pts) = pts {
            let (pts, _) = self.rebaser.rebase(pts, pts);
            self.next_pts = pts as f64;
        }
        self.budget = pes_payload_len;

        if data_aligned {
            if self.state != AdtsState::Sync {
                debug!(state = ?self.state, "Dropping incomplete ADTS frame at aligned PES start");
            }
            self.reset_frame();
        }
    }

    /// Feeds elementary stream bytes.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransmuxError> {
        let mut data = match self.budget {
            Some(budget) => {
                let len = data.len().min(budget);
                self.budget = Some(budget - len);
                &data[..len]
            }
            None => data,
        };

        while !data.is_empty() {
            match self.state {
                AdtsState::Sync => match memchr(0xFF, data) {
                    Some(offset) => {
                        if offset > 0 {
                            trace!(skipped = offset, "Skipping bytes before ADTS syncword");
                        }
                        self.header[0] = 0xFF;
                        self.header_len = 1;
                        self.state = AdtsState::Header;
                        data = &data[offset + 1..];
                    }
                    None => {
                        trace!(skipped = data.len(), "No ADTS syncword in chunk");
                        data = &[];
                    }
                },
                AdtsState::Header => {
                    if self.header_len == 1 && !AdtsHeader::is_sync(0xFF, data[0]) {
                        // drop the lone 0xFF and rescan from this byte
                        warn!(byte = data[0], "Invalid ADTS syncword, resynchronizing");
                        self.state = AdtsState::Sync;
                        self.header_len = 0;
                        continue;
                    }

                    let take = (ADTS_HEADER_SIZE - self.header_len).min(data.len());
                    self.header[self.header_len..self.header_len + take]
                        .copy_from_slice(&data[..take]);
                    self.header_len += take;
                    data = &data[take..];

                    if self.header_len == ADTS_HEADER_SIZE {
                        self.start_frame()?;
                    }
                }
                AdtsState::Crc(left) => {
                    let take = left.min(data.len());
                    data = &data[take..];
                    self.state = if left == take {
                        AdtsState::Payload
                    } else {
                        AdtsState::Crc(left - take)
                    };
                    if self.state == AdtsState::Payload && self.remaining == 0 {
                        self.finish_frame()?;
                    }
                }
                AdtsState::Payload => {
                    let take = self.remaining.min(data.len());
                    if let Some(frame) = self.frame.as_mut() {
                        frame.write_bytes(&data[..take]);
                    }
                    data = &data[take..];
                    self.remaining -= take;

                    if self.remaining == 0 {
                        self.finish_frame()?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Drops partial frames and re-arms timestamp rebasing at `base`.
    pub fn discontinuity(&mut self, base: i64) {
        self.reset_frame();
        self.rebaser.rearm(base);
    }

    /// Drops the partial frame and every queued tag. The next frame repeats
    /// the configuration tags.
    pub fn abort(&mut self) {
        self.reset_frame();
        self.budget = None;
        self.config_word = None;
        self.tags.clear();
    }

    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }

    pub fn peek_tag(&self) -> Option<&FlvTag> {
        self.tags.front()
    }

    pub fn pop_tag(&mut self) -> Option<FlvTag> {
        self.tags.pop_front()
    }

    /// Highest DTS of any tag produced so far.
    pub fn last_dts(&self) -> Option<i64> {
        self.last_dts
    }

    fn reset_frame(&mut self) {
        self.state = AdtsState::Sync;
        self.header_len = 0;
        self.current = None;
        self.frame = None;
        self.remaining = 0;
    }

    fn start_frame(&mut self) -> Result<(), TransmuxError> {
        let header = match AdtsHeader::parse(&self.header) {
            Ok(header) => header,
            Err(e) => {
                warn!(error = %e, "Undecodable ADTS header, resynchronizing");
                self.reset_frame();
                return Ok(());
            }
        };

        let Some(payload_len) = header.payload_len() else {
            warn!(
                frame_length = header.frame_length,
                "ADTS frame shorter than its header, resynchronizing"
            );
            self.reset_frame();
            return Ok(());
        };

        let pts = self.next_pts.floor() as i64;
        self.frame = match header.sample_rate() {
            Some(_) => {
                if self.config_word != Some(header.config_word()) {
                    self.push_config_tags(&header, pts)?;
                    self.config_word = Some(header.config_word());
                }
                Some(FlvTagBuilder::audio(false).with_timestamps(pts, pts))
            }
            None => {
                warn!(
                    index = header.sampling_frequency_index,
                    "Invalid ADTS sampling frequency index, skipping frame"
                );
                None
            }
        };

        self.current = Some(header);
        self.remaining = payload_len;
        self.state = if header.protection_absent {
            AdtsState::Payload
        } else {
            AdtsState::Crc(2)
        };
        if self.state == AdtsState::Payload && self.remaining == 0 {
            self.finish_frame()?;
        }
        Ok(())
    }

    fn finish_frame(&mut self) -> Result<(), TransmuxError> {
        if let Some(frame) = self.frame.take() {
            let tag = frame.finalize()?;
            self.push_tag(tag);
        }
        if let Some(duration) = self.current.take().and_then(|h| h.duration_ms()) {
            self.next_pts += duration;
        }
        self.state = AdtsState::Sync;
        self.header_len = 0;
        Ok(())
    }

    /// Queues the metadata and sequence header tags. The metadata is read
    /// back from the AudioSpecificConfig that goes into the sequence header.
    fn push_config_tags(&mut self, header: &AdtsHeader, pts: i64) -> Result<(), TransmuxError> {
        let asc = header.audio_specific_config();
        let parsed = PartialAudioSpecificConfig::parse(&asc).map_err(TransmuxError::AudioConfig)?;
        debug!(
            object_type = ?parsed.audio_object_type,
            sample_rate = parsed.sampling_frequency,
            channels = parsed.channel_configuration,
            "AAC configuration changed"
        );

        let mut metadata = FlvTagBuilder::metadata().with_timestamps(pts, pts);
        metadata.write_metadata_double("audiocodecid", 10.0)?;
        metadata.write_metadata_boolean("stereo", parsed.channel_configuration == 2)?;
        metadata.write_metadata_double("audiosamplerate", parsed.sampling_frequency as f64)?;
        metadata.write_metadata_double("audiosamplesize", 16.0)?;
        let metadata = metadata.finalize()?;
        self.push_tag(metadata);

        let mut config = FlvTagBuilder::audio(true).with_timestamps(pts, pts);
        config.write_bytes(&asc);
        let config = config.finalize()?;
        self.push_tag(config);
        Ok(())
    }

    fn push_tag(&mut self, tag: FlvTag) {
        self.last_dts = Some(self.last_dts.map_or(tag.dts, |last| last.max(tag.dts)));
        self.tags.push_back(tag);
    }
}
