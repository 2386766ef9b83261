//! Transport Stream (TS) parsing for the HLS transmuxer.
//!
//! Packets are parsed in place from borrowed 188-byte slices. Program
//! Association and Program Map sections are decoded into a [`ProgramMap`]
//! that resolves the single H.264 and ADTS elementary stream of a program,
//! and [`PesHeader`] decodes the timestamps that start each PES packet.
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]

pub mod error;
pub mod packet;
pub mod pes;
pub mod program_map;
pub mod psi;
pub mod stream_type;

pub use error::TsError;
pub use packet::{PID_NULL, PID_PAT, SYNC_BYTE, TS_PACKET_SIZE, TsPacketRef, find_sync};
pub use pes::PesHeader;
pub use program_map::ProgramMap;
pub use psi::{PatProgramIterator, PatProgramRef, PatRef, PmtRef, PmtStreamIterator, PmtStreamRef};
pub use stream_type::StreamType;

/// Result type for TS parsing operations
pub type Result<T> = std::result::Result<T, TsError>;
