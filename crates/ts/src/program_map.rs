use std::collections::HashMap;

use crate::{PatRef, PmtRef, Result, StreamType, TsError};

/// Resolved elementary streams of the single program in a transport stream.
///
/// A map is only ever built whole from one PMT section; a newer section
/// replaces it instead of being merged into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramMap {
    streams: HashMap<StreamType, u16>,
    version: u8,
}

impl ProgramMap {
    /// Extracts the PMT PID from a PAT, rejecting PATs that announce more
    /// than one program. Returns `None` when the PAT lists no program.
    pub fn resolve_pmt_pid(pat: &PatRef<'_>) -> Result<Option<u16>> {
        let mut programs = pat.programs().filter(|p| p.program_number != 0);
        let Some(first) = programs.next() else {
            return Ok(None);
        };

        let extra = programs.count();
        if extra > 0 {
            return Err(TsError::MultipleProgramsNotSupported(extra + 1));
        }
        Ok(Some(first.pmt_pid))
    }

    /// Builds the map from a PMT section. Streams the transmuxer does not
    /// handle are skipped, and a second PID for an already mapped stream
    /// type is rejected.
    pub fn from_pmt(pmt: &PmtRef<'_>) -> Result<Self> {
        let mut streams = HashMap::new();

        for stream in pmt.streams() {
            let stream = stream?;
            if !stream.stream_type.is_supported() {
                continue;
            }

            if let Some(&first) = streams.get(&stream.stream_type) {
                if first != stream.elementary_pid {
                    return Err(TsError::DuplicateStreamType {
                        stream_type: stream.stream_type.into(),
                        first,
                        second: stream.elementary_pid,
                    });
                }
                continue;
            }
            streams.insert(stream.stream_type, stream.elementary_pid);
        }

        Ok(Self {
            streams,
            version: pmt.version_number,
        })
    }

    pub fn pid(&self, stream_type: StreamType) -> Option<u16> {
        self.streams.get(&stream_type).copied()
    }

    pub fn video_pid(&self) -> Option<u16> {
        self.pid(StreamType::H264)
    }

    pub fn audio_pid(&self) -> Option<u16> {
        self.pid(StreamType::AdtsAac)
    }

    /// Stream type carried on `pid`, if it is mapped.
    pub fn stream_type(&self, pid: u16) -> Option<StreamType> {
        self.streams
            .iter()
            .find_map(|(stream_type, &mapped)| (mapped == pid).then_some(*stream_type))
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
