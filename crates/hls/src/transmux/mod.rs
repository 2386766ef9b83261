//! The transmuxing pipeline: TS packets to elementary streams to FLV tags.

mod aac_stream;
mod demuxer;
mod h264_stream;
mod rebaser;

pub use aac_stream::AacReassembler;
pub use demuxer::SegmentDemuxer;
pub use h264_stream::H264Reassembler;
