//! Program Specific Information sections: PAT and PMT.

use bytes::Buf;

use crate::{Result, StreamType, TsError};

/// Zero-copy PAT parser
#[derive(Debug, Clone, Copy)]
pub struct PatRef<'a> {
    programs: &'a [u8],
    pub transport_stream_id: u16,
    pub version_number: u8,
    pub current_next_indicator: bool,
    pub section_number: u8,
    pub last_section_number: u8,
}

impl<'a> PatRef<'a> {
    /// Parse PAT from PSI section data
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(TsError::InsufficientData {
                expected: 8,
                actual: data.len(),
            });
        }
        let mut reader = data;
        let table_id = reader.get_u8();
        if table_id != 0x00 {
            return Err(TsError::InvalidTableId {
                expected: 0x00,
                actual: table_id,
            });
        }
        let byte1 = reader.get_u8();
        if byte1 & 0x80 == 0 {
            return Err(TsError::ParseError(
                "PAT must have section syntax indicator set".to_string(),
            ));
        }
        let section_length = ((byte1 as u16 & 0x0F) << 8) | reader.get_u8() as u16;
        if section_length < 9 {
            return Err(TsError::InvalidSectionLength(section_length));
        }
        if data.len() < 3 + section_length as usize {
            return Err(TsError::InsufficientData {
                expected: 3 + section_length as usize,
                actual: data.len(),
            });
        }
        let transport_stream_id = reader.get_u16();
        let byte5 = reader.get_u8();
        let section_number = reader.get_u8();
        let last_section_number = reader.get_u8();
        // CRC32 excluded
        let programs_end = 3 + section_length as usize - 4;

        Ok(Self {
            programs: &data[8..programs_end],
            transport_stream_id,
            version_number: (byte5 >> 1) & 0x1F,
            current_next_indicator: byte5 & 0x01 != 0,
            section_number,
            last_section_number,
        })
    }

    /// Iterator over programs without allocating
    pub fn programs(&self) -> PatProgramIterator<'a> {
        PatProgramIterator {
            data: self.programs,
        }
    }
}

/// Iterator over PAT programs that doesn't allocate
#[derive(Debug)]
pub struct PatProgramIterator<'a> {
    data: &'a [u8],
}

impl Iterator for PatProgramIterator<'_> {
    type Item = PatProgramRef;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.remaining() < 4 {
            return None;
        }
        let program_number = self.data.get_u16();
        let pmt_pid = ((self.data.get_u8() as u16 & 0x1F) << 8) | self.data.get_u8() as u16;
        Some(PatProgramRef {
            program_number,
            pmt_pid,
        })
    }
}

/// PAT program entry. Program number 0 points at the network PID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatProgramRef {
    pub program_number: u16,
    pub pmt_pid: u16,
}

/// Zero-copy PMT parser
#[derive(Debug, Clone, Copy)]
pub struct PmtRef<'a> {
    program_info: &'a [u8],
    streams: &'a [u8],
    pub program_number: u16,
    pub version_number: u8,
    pub current_next_indicator: bool,
    pub pcr_pid: u16,
}

impl<'a> PmtRef<'a> {
    /// Parse PMT from PSI section data
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < 12 {
            return Err(TsError::InsufficientData {
                expected: 12,
                actual: data.len(),
            });
        }
        let mut reader = data;
        let table_id = reader.get_u8();
        if table_id != 0x02 {
            return Err(TsError::InvalidTableId {
                expected: 0x02,
                actual: table_id,
            });
        }
        let byte1 = reader.get_u8();
        if byte1 & 0x80 == 0 {
            return Err(TsError::ParseError(
                "PMT must have section syntax indicator set".to_string(),
            ));
        }
        let section_length = ((byte1 as u16 & 0x0F) << 8) | reader.get_u8() as u16;
        if section_length < 13 {
            return Err(TsError::InvalidSectionLength(section_length));
        }
        if data.len() < 3 + section_length as usize {
            return Err(TsError::InsufficientData {
                expected: 3 + section_length as usize,
                actual: data.len(),
            });
        }
        let program_number = reader.get_u16();
        let byte5 = reader.get_u8();
        reader.advance(2); // section_number, last_section_number
        let pcr_pid = reader.get_u16() & 0x1FFF;
        let program_info_length = (reader.get_u16() & 0x0FFF) as usize;

        if (section_length as usize) < 9 + program_info_length + 4 {
            return Err(TsError::InvalidSectionLength(section_length));
        }

        let streams_offset = 12 + program_info_length;
        // CRC32 excluded
        let streams_end = 3 + section_length as usize - 4;

        Ok(Self {
            program_info: &data[12..streams_offset],
            streams: &data[streams_offset..streams_end],
            program_number,
            version_number: (byte5 >> 1) & 0x1F,
            current_next_indicator: byte5 & 0x01 != 0,
            pcr_pid,
        })
    }

    /// Program info descriptors
    #[inline]
    pub fn program_info(&self) -> &'a [u8] {
        self.program_info
    }

    /// Iterator over elementary streams without allocating
    pub fn streams(&self) -> PmtStreamIterator<'a> {
        PmtStreamIterator { data: self.streams }
    }
}

/// Iterator over PMT streams that doesn't allocate
#[derive(Debug)]
pub struct PmtStreamIterator<'a> {
    data: &'a [u8],
}

impl<'a> Iterator for PmtStreamIterator<'a> {
    type Item = Result<PmtStreamRef<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.remaining() < 5 {
            return None;
        }
        let stream_type = StreamType::from(self.data.get_u8());
        let elementary_pid = self.data.get_u16() & 0x1FFF;
        let es_info_length = (self.data.get_u16() & 0x0FFF) as usize;

        if self.data.remaining() < es_info_length {
            let actual = self.data.remaining();
            self.data = &[];
            return Some(Err(TsError::InsufficientData {
                expected: es_info_length,
                actual,
            }));
        }

        let (es_info, rest) = self.data.split_at(es_info_length);
        self.data = rest;

        Some(Ok(PmtStreamRef {
            stream_type,
            elementary_pid,
            es_info,
        }))
    }
}

/// PMT elementary stream entry
#[derive(Debug, Clone, Copy)]
pub struct PmtStreamRef<'a> {
    pub stream_type: StreamType,
    pub elementary_pid: u16,
    pub es_info: &'a [u8],
}
