use std::collections::VecDeque;

use flv::{FlvTag, FlvTagBuilder};
use h264::{AvcDecoderConfigurationRecord, NALUnitType, ParameterSets};
use memchr::memchr;
use tracing::{trace, warn};

use super::rebaser::TimestampRebaser;
use crate::TransmuxError;

/// Start code scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// No unit is open; bytes are dropped until a start code.
    New,
    /// `zeros` zero bytes are held back because they may begin a start code.
    FoundSync,
    /// Copying unit payload.
    Scanning,
    /// A start code was consumed; the next byte is a NAL header.
    UnitStart,
}

/// Rebuilds H.264 access units from an Annex-B byte stream.
///
/// Input may be split at arbitrary byte positions, including inside a start
/// code. Each NAL unit is copied into the current video tag with a 4-byte
/// length prefix instead of its start code. Access units end at an access
/// unit delimiter, a data-aligned PES start or [`flush`](Self::flush).
#[derive(Debug)]
pub struct H264Reassembler {
    state: ScanState,
    zeros: usize,
    frame: Option<FlvTagBuilder>,
    /// Type of the unit currently open in `frame`.
    nal_type: Option<NALUnitType>,
    next_pts: i64,
    next_dts: i64,
    rebaser: TimestampRebaser,
    /// Parameter sets describing the stream, used for key frame config tags.
    active: ParameterSets,
    /// Parameter sets seen in the access unit being built.
    pending: ParameterSets,
    tags: VecDeque<FlvTag>,
    last_dts: Option<i64>,
}

impl Default for H264Reassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl H264Reassembler {
    pub fn new() -> Self {
        Self {
            state: ScanState::New,
            zeros: 0,
            frame: None,
            nal_type: None,
            next_pts: 0,
            next_dts: 0,
            rebaser: TimestampRebaser::default(),
            active: ParameterSets::default(),
            pending: ParameterSets::default(),
            tags: VecDeque::new(),
            last_dts: None,
        }
    }

    /// Sets the timestamps for access units that start after this call.
    /// A data-aligned PES start closes the open access unit first.
    pub fn set_next_timestamp(
        &mut self,
        pts: i64,
        dts: i64,
        data_aligned: bool,
    ) -> Result<(), TransmuxError> {
        if data_aligned {
            self.finish_frame()?;
        }
        (self.next_pts, self.next_dts) = self.rebaser.rebase(pts, dts);
        Ok(())
    }

    /// Feeds elementary stream bytes.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransmuxError> {
        let mut pos = 0;

        while pos < data.len() {
            match self.state {
                ScanState::New | ScanState::Scanning => {
                    let rest = &data[pos..];
                    match memchr(0x00, rest) {
                        Some(zero) => {
                            self.write_payload(&rest[..zero]);
                            pos += zero + 1;
                            self.zeros = 1;
                            self.state = ScanState::FoundSync;
                        }
                        None => {
                            self.write_payload(rest);
                            pos = data.len();
                        }
                    }
                }
                ScanState::FoundSync => match data[pos] {
                    0x00 => {
                        self.zeros += 1;
                        pos += 1;
                    }
                    0x01 if self.zeros >= 2 => {
                        pos += 1;
                        self.zeros = 0;
                        self.state = ScanState::UnitStart;
                    }
                    _ => {
                        // not a start code, the zeros belong to the payload
                        self.release_zeros();
                        self.state = ScanState::Scanning;
                    }
                },
                ScanState::UnitStart => {
                    self.begin_unit(data[pos])?;
                    // the header byte itself is copied by the scanner
                    self.state = ScanState::Scanning;
                }
            }
        }

        Ok(())
    }

    /// Emits the access unit being built, with its config tags if it is a
    /// key frame.
    pub fn flush(&mut self) -> Result<(), TransmuxError> {
        self.finish_frame()
    }

    /// Flushes and restarts timestamp rebasing at `base`.
    pub fn discontinuity(&mut self, base: i64) -> Result<(), TransmuxError> {
        self.finish_frame()?;
        self.rebaser.rearm(base);
        Ok(())
    }

    /// Drops the partial access unit and every queued tag.
    pub fn abort(&mut self) {
        self.frame = None;
        self.nal_type = None;
        self.pending.clear();
        self.state = ScanState::New;
        self.zeros = 0;
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

    /// Parameter sets used for the most recent key frame.
    pub fn parameter_sets(&self) -> &ParameterSets {
        &self.active
    }

    fn write_payload(&mut self, bytes: &[u8]) {
        if bytes.is_empty() || self.nal_type.is_none() {
            return;
        }
        if let Some(frame) = self.frame.as_mut() {
            frame.write_bytes(bytes);
        }
    }

    fn release_zeros(&mut self) {
        let zeros = std::mem::take(&mut self.zeros);
        if self.nal_type.is_none() {
            return;
        }
        if let Some(frame) = self.frame.as_mut() {
            for _ in 0..zeros {
                frame.write_byte(0x00);
            }
        }
    }

    /// Closes the open unit, capturing its bytes if it is an SPS or PPS.
    fn end_unit(&mut self) {
        let nal_type = self.nal_type.take();
        let Some(frame) = self.frame.as_mut() else {
            return;
        };

        let capture = match nal_type {
            Some(NALUnitType::SPS) => Some(&mut self.pending.sps),
            Some(NALUnitType::PPS) => Some(&mut self.pending.pps),
            _ => None,
        };
        frame.end_nal_unit(capture);
    }

    fn begin_unit(&mut self, header: u8) -> Result<(), TransmuxError> {
        let nal_type = NALUnitType::from_header(header);
        trace!(?nal_type, "NAL unit start");

        self.end_unit();
        if nal_type == NALUnitType::AccessUnitDelimiter {
            self.finish_frame()?;
        }

        let (pts, dts) = (self.next_pts, self.next_dts);
        let frame = self
            .frame
            .get_or_insert_with(|| FlvTagBuilder::video(false).with_timestamps(pts, dts));
        if nal_type == NALUnitType::IDRSlice {
            frame.key_frame = true;
        }
        frame.start_nal_unit()?;
        self.nal_type = Some(nal_type);
        Ok(())
    }

    fn finish_frame(&mut self) -> Result<(), TransmuxError> {
        self.end_unit();

        if self.pending.has_sps() {
            self.active = std::mem::take(&mut self.pending);
        } else if !self.pending.pps.is_empty() {
            self.active.pps = std::mem::take(&mut self.pending.pps);
        }

        if let Some(frame) = self.frame.take().filter(|frame| !frame.is_empty()) {
            if frame.key_frame {
                self.push_config_tags(frame.pts, frame.dts)?;
            }
            let tag = frame.finalize()?;
            self.push_tag(tag);
        }

        self.state = ScanState::New;
        self.zeros = 0;
        Ok(())
    }

    /// Metadata and AVC sequence header tags for a key frame.
    fn push_config_tags(&mut self, pts: i64, dts: i64) -> Result<(), TransmuxError> {
        let sps = match self.active.sps_info() {
            Ok(sps) => sps,
            Err(e) => {
                warn!(error = %e, pts, "Key frame without a usable SPS, config tags skipped");
                return Ok(());
            }
        };
        let Some(record) = AvcDecoderConfigurationRecord::from_parameter_sets(&self.active) else {
            warn!(pts, "Key frame without a usable SPS, config tags skipped");
            return Ok(());
        };

        let mut metadata = FlvTagBuilder::metadata().with_timestamps(pts, dts);
        metadata.write_metadata_double("videocodecid", 7.0)?;
        metadata.write_metadata_double("width", sps.width() as f64)?;
        metadata.write_metadata_double("height", sps.height() as f64)?;
        let metadata = metadata.finalize()?;
        self.push_tag(metadata);

        let mut config = FlvTagBuilder::video(true).with_timestamps(pts, dts);
        config.key_frame = true;
        let mut record_bytes = Vec::with_capacity(record.size());
        record.build(&mut record_bytes);
        config.write_bytes(&record_bytes);
        let config = config.finalize()?;
        self.push_tag(config);

        Ok(())
    }

    fn push_tag(&mut self, tag: FlvTag) {
        self.last_dts = Some(self.last_dts.map_or(tag.dts, |last| last.max(tag.dts)));
        self.tags.push_back(tag);
    }
}
