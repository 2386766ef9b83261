use flv::FlvTag;
use tracing::{debug, trace, warn};
use ts::{
    PID_NULL, PID_PAT, PatRef, PesHeader, PmtRef, ProgramMap, SYNC_BYTE, StreamType,
    TS_PACKET_SIZE, TsPacketRef, find_sync,
};

use super::{AacReassembler, H264Reassembler};
use crate::TransmuxError;

/// Which reassembler the next output tag comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Video,
    Audio,
}

/// Demultiplexes a transport stream into FLV tags.
///
/// Bytes may arrive in chunks of any size; a trailing partial packet is kept
/// until the next [`push`](Self::push). Tags are handed out in ascending DTS
/// order across the video and audio streams, video first on ties.
#[derive(Debug, Default)]
pub struct SegmentDemuxer {
    partial: Vec<u8>,
    pmt_pid: Option<u16>,
    program_map: ProgramMap,
    video: H264Reassembler,
    audio: AacReassembler,
}

impl SegmentDemuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes transport stream bytes.
    ///
    /// Errors leave the demuxer in an undefined position within the stream;
    /// callers should [`abort`](Self::abort) before feeding another segment.
    pub fn push(&mut self, mut data: &[u8]) -> Result<(), TransmuxError> {
        if !self.partial.is_empty() {
            let missing = TS_PACKET_SIZE - self.partial.len();
            if data.len() < missing {
                self.partial.extend_from_slice(data);
                return Ok(());
            }

            self.partial.extend_from_slice(&data[..missing]);
            data = &data[missing..];
            let packet = std::mem::take(&mut self.partial);
            self.process_packet(&packet)?;
        }

        while !data.is_empty() {
            if data[0] != SYNC_BYTE {
                match find_sync(data) {
                    Some(offset) => {
                        warn!(skipped = offset, "Lost TS packet alignment, resynchronizing");
                        data = &data[offset..];
                    }
                    None => {
                        warn!(skipped = data.len(), "No TS sync byte in chunk");
                        return Ok(());
                    }
                }
            }

            if data.len() < TS_PACKET_SIZE {
                self.partial.extend_from_slice(data);
                break;
            }

            let (packet, rest) = data.split_at(TS_PACKET_SIZE);
            self.process_packet(packet)?;
            data = rest;
        }

        Ok(())
    }

    /// Finishes the access unit being built.
    ///
    /// Audio frames are emitted as soon as they are complete, so only the
    /// video stream holds data that a flush can finish.
    pub fn flush(&mut self) -> Result<(), TransmuxError> {
        self.video.flush()
    }

    /// Marks a timeline break. Both streams restart rebasing so that the
    /// next timestamps continue from the last emitted DTS.
    pub fn discontinuity(&mut self) -> Result<(), TransmuxError> {
        self.flush()?;
        let base = self
            .video
            .last_dts()
            .into_iter()
            .chain(self.audio.last_dts())
            .max()
            .unwrap_or(0);
        debug!(base, "Discontinuity, rearming timestamp rebasing");

        self.video.discontinuity(base)?;
        self.audio.discontinuity(base);
        Ok(())
    }

    /// Drops the partial packet, in-progress frames and undelivered tags.
    /// The program map is kept.
    pub fn abort(&mut self) {
        self.partial.clear();
        self.video.abort();
        self.audio.abort();
    }

    pub fn tags_available(&self) -> bool {
        self.video.has_tags() || self.audio.has_tags()
    }

    /// The tag [`next_tag`](Self::next_tag) would return.
    pub fn peek_next_tag(&self) -> Option<&FlvTag> {
        match self.next_source()? {
            Source::Video => self.video.peek_tag(),
            Source::Audio => self.audio.peek_tag(),
        }
    }

    pub fn next_tag(&mut self) -> Option<FlvTag> {
        match self.next_source()? {
            Source::Video => self.video.pop_tag(),
            Source::Audio => self.audio.pop_tag(),
        }
    }

    /// Drains every available tag in output order.
    pub fn take_tags(&mut self) -> Vec<FlvTag> {
        std::iter::from_fn(|| self.next_tag()).collect()
    }

    /// Elementary streams resolved from the latest PMT.
    pub fn program_map(&self) -> &ProgramMap {
        &self.program_map
    }

    fn next_source(&self) -> Option<Source> {
        match (self.video.peek_tag(), self.audio.peek_tag()) {
            (Some(video), Some(audio)) if audio.dts < video.dts => Some(Source::Audio),
            (Some(_), _) => Some(Source::Video),
            (None, Some(_)) => Some(Source::Audio),
            (None, None) => None,
        }
    }

    fn process_packet(&mut self, data: &[u8]) -> Result<(), TransmuxError> {
        let packet = TsPacketRef::parse(data)?;

        if packet.transport_error_indicator {
            debug!(pid = packet.pid, "Dropping packet with transport error indicator");
            return Ok(());
        }
        if packet.pid == PID_NULL {
            return Ok(());
        }

        if packet.pid == PID_PAT {
            if packet.payload_unit_start_indicator {
                if let Some(section) = packet.psi_payload() {
                    let pat = PatRef::parse(section)?;
                    self.pmt_pid = ProgramMap::resolve_pmt_pid(&pat)?;
                    trace!(pmt_pid = ?self.pmt_pid, "PAT parsed");
                }
            }
            return Ok(());
        }

        if Some(packet.pid) == self.pmt_pid {
            if packet.payload_unit_start_indicator {
                if let Some(section) = packet.psi_payload() {
                    self.apply_pmt(section)?;
                }
            }
            return Ok(());
        }

        let Some(stream_type) = self.program_map.stream_type(packet.pid) else {
            return Ok(());
        };
        let Some(payload) = packet.payload() else {
            return Ok(());
        };

        match stream_type {
            StreamType::H264 => self.push_video(payload, packet.payload_unit_start_indicator),
            StreamType::AdtsAac => self.push_audio(payload, packet.payload_unit_start_indicator),
            _ => Ok(()),
        }
    }

    fn apply_pmt(&mut self, section: &[u8]) -> Result<(), TransmuxError> {
        let pmt = PmtRef::parse(section)?;
        if !pmt.current_next_indicator {
            trace!(version = pmt.version_number, "Ignoring PMT not yet applicable");
            return Ok(());
        }

        let map = ProgramMap::from_pmt(&pmt)?;
        if map != self.program_map {
            debug!(
                version = map.version(),
                video_pid = ?map.video_pid(),
                audio_pid = ?map.audio_pid(),
                "Program map updated"
            );
        }
        self.program_map = map;
        Ok(())
    }

    fn push_video(&mut self, payload: &[u8], unit_start: bool) -> Result<(), TransmuxError> {
        if !unit_start {
            return self.video.write_bytes(payload);
        }

        let pes = PesHeader::parse(payload)?;
        match pes.pts {
            Some(pts) => {
                let dts = pes.dts.unwrap_or(pts);
                self.video.set_next_timestamp(pts, dts, pes.data_alignment)?;
            }
            None if pes.data_alignment => self.video.flush()?,
            None => {}
        }
        self.video.write_bytes(es_payload(payload, &pes))
    }

    fn push_audio(&mut self, payload: &[u8], unit_start: bool) -> Result<(), TransmuxError> {
        if !unit_start {
            return self.audio.write_bytes(payload);
        }

        let pes = PesHeader::parse(payload)?;
        self.audio
            .set_next_timestamp(pes.pts, pes.payload_len(), pes.data_alignment);
        self.audio.write_bytes(es_payload(payload, &pes))
    }
}

/// Elementary stream bytes of the packet that starts a PES.
fn es_payload<'a>(payload: &'a [u8], pes: &PesHeader) -> &'a [u8] {
    payload.get(pes.header_len..).unwrap_or_default()
}
