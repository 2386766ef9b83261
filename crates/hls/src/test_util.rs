//! A minimal transport stream muxer for building test segments.
//!
//! Only what the demuxer needs is produced: a single-program PAT, a PMT,
//! and PES packets split across 188-byte packets with adaptation field
//! stuffing. Section CRCs are left zero since they are never checked.

use std::collections::HashMap;

use ts::{SYNC_BYTE, TS_PACKET_SIZE};

pub const PMT_PID: u16 = 0x1000;
pub const VIDEO_PID: u16 = 0x100;
pub const AUDIO_PID: u16 = 0x101;

/// Baseline profile SPS describing a 640x480 picture.
pub const SPS_640X480: [u8; 9] = [0x67, 0x42, 0xC0, 0x1E, 0xDA, 0x02, 0x80, 0xF6, 0x40];
pub const PPS: [u8; 4] = [0x68, 0xCE, 0x3C, 0x80];
pub const AUD: [u8; 2] = [0x09, 0xF0];

/// Writes transport stream packets with per-PID continuity counters.
#[derive(Debug, Default)]
pub struct TsMuxer {
    continuity: HashMap<u16, u8>,
}

impl TsMuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// PAT announcing one program and a PMT with H.264 and ADTS streams.
    pub fn psi(&mut self) -> Vec<u8> {
        let mut out = self.section(0, &pat_section(&[(1, PMT_PID)]));
        out.extend(self.section(
            PMT_PID,
            &pmt_section(&[(0x1B, VIDEO_PID), (0x0F, AUDIO_PID)]),
        ));
        out
    }

    /// Wraps a PSI section in a single packet with a zero pointer field.
    pub fn section(&mut self, pid: u16, section: &[u8]) -> Vec<u8> {
        let mut payload = vec![0x00];
        payload.extend_from_slice(section);
        self.packetize(pid, &payload, true)
    }

    /// A data-aligned video PES with unbounded length.
    pub fn video(&mut self, pts_ms: u64, dts_ms: u64, data: &[u8]) -> Vec<u8> {
        let dts = (dts_ms != pts_ms).then_some(dts_ms);
        self.pes(VIDEO_PID, 0xE0, pts_ms, dts, true, false, data)
    }

    /// A data-aligned audio PES whose length field covers `data`.
    pub fn audio(&mut self, pts_ms: u64, data: &[u8]) -> Vec<u8> {
        self.pes(AUDIO_PID, 0xC0, pts_ms, None, true, true, data)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn pes(
        &mut self,
        pid: u16,
        stream_id: u8,
        pts_ms: u64,
        dts_ms: Option<u64>,
        data_aligned: bool,
        bounded: bool,
        data: &[u8],
    ) -> Vec<u8> {
        let header_data_len: u8 = if dts_ms.is_some() { 10 } else { 5 };
        let mut pes = vec![0x00, 0x00, 0x01, stream_id];
        let length = if bounded {
            3 + header_data_len as usize + data.len()
        } else {
            0
        };
        pes.extend_from_slice(&(length as u16).to_be_bytes());
        pes.push(0x80 | if data_aligned { 0x04 } else { 0x00 });
        pes.push(if dts_ms.is_some() { 0xC0 } else { 0x80 });
        pes.push(header_data_len);
        let pts_marker = if dts_ms.is_some() { 0x3 } else { 0x2 };
        pes.extend_from_slice(&encode_timestamp(pts_marker, pts_ms * 90));
        if let Some(dts_ms) = dts_ms {
            pes.extend_from_slice(&encode_timestamp(0x1, dts_ms * 90));
        }
        pes.extend_from_slice(data);

        self.packetize(pid, &pes, true)
    }

    /// Splits `payload` into packets, stuffing the last one through its
    /// adaptation field.
    pub fn packetize(&mut self, pid: u16, payload: &[u8], start: bool) -> Vec<u8> {
        let mut out = Vec::new();

        for (index, chunk) in payload.chunks(TS_PACKET_SIZE - 4).enumerate() {
            let counter = self.continuity.entry(pid).or_insert(0);
            let cc = *counter;
            *counter = (*counter + 1) & 0x0F;

            let unit_start = start && index == 0;
            let mut packet = Vec::with_capacity(TS_PACKET_SIZE);
            packet.push(SYNC_BYTE);
            packet.push(((unit_start as u8) << 6) | ((pid >> 8) as u8 & 0x1F));
            packet.push(pid as u8);

            let stuffing = TS_PACKET_SIZE - 4 - chunk.len();
            if stuffing == 0 {
                packet.push(0x10 | cc);
            } else {
                packet.push(0x30 | cc);
                packet.push((stuffing - 1) as u8);
                if stuffing > 1 {
                    packet.push(0x00);
                    packet.extend(std::iter::repeat_n(0xFF, stuffing - 2));
                }
            }
            packet.extend_from_slice(chunk);
            debug_assert_eq!(packet.len(), TS_PACKET_SIZE);

            out.extend_from_slice(&packet);
        }
        out
    }
}

pub fn pat_section(programs: &[(u16, u16)]) -> Vec<u8> {
    let section_length = 5 + programs.len() * 4 + 4;
    let mut section = vec![
        0x00,
        0xB0 | (section_length >> 8) as u8,
        section_length as u8,
        0x00,
        0x01,
        0xC1,
        0x00,
        0x00,
    ];
    for &(program, pid) in programs {
        section.extend_from_slice(&program.to_be_bytes());
        section.extend_from_slice(&(0xE000 | pid).to_be_bytes());
    }
    section.extend_from_slice(&[0; 4]);
    section
}

pub fn pmt_section(streams: &[(u8, u16)]) -> Vec<u8> {
    let section_length = 9 + streams.len() * 5 + 4;
    let mut section = vec![
        0x02,
        0xB0 | (section_length >> 8) as u8,
        section_length as u8,
        0x00,
        0x01,
        0xC1,
        0x00,
        0x00,
        0xE0 | (VIDEO_PID >> 8) as u8,
        VIDEO_PID as u8,
        0xF0,
        0x00,
    ];
    for &(stream_type, pid) in streams {
        section.push(stream_type);
        section.extend_from_slice(&(0xE000 | pid).to_be_bytes());
        section.extend_from_slice(&[0xF0, 0x00]);
    }
    section.extend_from_slice(&[0; 4]);
    section
}

fn encode_timestamp(marker: u8, ticks: u64) -> [u8; 5] {
    [
        (marker << 4) | (((ticks >> 30) as u8 & 0x07) << 1) | 1,
        (ticks >> 22) as u8,
        (((ticks >> 15) as u8) << 1) | 1,
        (ticks >> 7) as u8,
        ((ticks as u8) << 1) | 1,
    ]
}

/// Annex-B access unit: an AUD followed by `nals`, each behind a 4-byte
/// start code.
pub fn access_unit(nals: &[&[u8]]) -> Vec<u8> {
    let mut out = vec![0x00, 0x00, 0x00, 0x01];
    out.extend_from_slice(&AUD);
    for nal in nals {
        out.extend_from_slice(&[0x00, 0x00, 0x00, 0x01]);
        out.extend_from_slice(nal);
    }
    out
}

/// A key frame access unit carrying SPS, PPS and an IDR slice.
pub fn key_frame(slice: &[u8]) -> Vec<u8> {
    let mut idr = vec![0x65];
    idr.extend_from_slice(slice);
    access_unit(&[&SPS_640X480, &PPS, &idr])
}

/// An inter frame access unit.
pub fn inter_frame(slice: &[u8]) -> Vec<u8> {
    let mut non_idr = vec![0x41];
    non_idr.extend_from_slice(slice);
    access_unit(&[&non_idr])
}

/// An AAC LC ADTS frame without CRC.
pub fn adts_frame(sampling_frequency_index: u8, channels: u8, payload: &[u8]) -> Vec<u8> {
    let frame_length = 7 + payload.len();
    let mut frame = vec![
        0xFF,
        0xF1,
        0x40 | (sampling_frequency_index << 2) | (channels >> 2),
        ((channels & 0x03) << 6) | ((frame_length >> 11) as u8 & 0x03),
        (frame_length >> 3) as u8,
        (((frame_length & 0x07) as u8) << 5) | 0x1F,
        0xFC,
    ];
    frame.extend_from_slice(payload);
    frame
}

/// A segment with PSI, `frames` video access units (the first a key frame)
/// 40 ms apart, and one 44.1 kHz stereo ADTS frame per video frame.
pub fn sample_segment(frames: u64) -> Vec<u8> {
    let mut muxer = TsMuxer::new();
    let mut segment = muxer.psi();

    for i in 0..frames {
        let unit = if i == 0 {
            key_frame(&[0x88, 0x84, 0x00, 0x33, 0xFF])
        } else {
            inter_frame(&[0x9A, 0x02, i as u8, 0x10])
        };
        segment.extend(muxer.video(1_000 + 40 * i + 80, 1_000 + 40 * i, &unit));
        segment.extend(muxer.audio(1_000 + 23 * i, &adts_frame(4, 2, &[0x21, 0x10, i as u8, 0x05])));
    }
    segment
}
