use std::io;

use bytes::Bytes;
use flv::FlvTag;

use crate::config::Viewport;

/// The consumer of the transmuxed FLV stream.
///
/// Times are in seconds on the output timeline, which starts at zero.
pub trait PlaybackSink {
    /// Appends the stream preamble: the FLV file header, optionally followed
    /// by a metadata tag. Called once, before any tag.
    fn append_header(&mut self, header: Bytes) -> io::Result<()>;

    /// Appends one framed tag. Tags arrive in decode order.
    fn append(&mut self, tag: &FlvTag) -> io::Result<()>;

    /// No more tags will follow.
    fn end_of_stream(&mut self) -> io::Result<()>;

    /// Drops anything buffered but not yet consumed, ahead of a seek.
    fn abort(&mut self);

    /// End of the buffered range.
    fn buffered_end(&self) -> f64;

    /// The playback position.
    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    /// Display size, if the sink has one.
    fn viewport(&self) -> Option<Viewport> {
        None
    }
}
