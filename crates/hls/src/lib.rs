//! HLS segment transmuxing: MPEG-TS in, FLV tags out.
//!
//! [`SegmentDemuxer`] accepts transport stream bytes in chunks of any size,
//! routes the H.264 and ADTS elementary streams of the single program to
//! their reassemblers, and hands back fully framed [`flv::FlvTag`]s in
//! decode order.
//!
//! ```rust
//! use hls::SegmentDemuxer;
//!
//! let mut demuxer = SegmentDemuxer::new();
//! demuxer.push(&[]).unwrap();
//! demuxer.flush().unwrap();
//! assert!(!demuxer.tags_available());
//! ```
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or
//! [Apache-2.0](./LICENSE.Apache-2.0) license. You can choose between one of
//! them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]

pub mod error;
pub mod transmux;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use error::TransmuxError;
pub use transmux::{AacReassembler, H264Reassembler, SegmentDemuxer};
