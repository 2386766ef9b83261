use std::io::{self, Write};

use bytes::Bytes;
use flv::{FlvTag, FlvWriter};
use hlsflv_engine::PlaybackSink;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Writes the transmuxed stream to an FLV file.
///
/// A file is consumed as fast as it is written, so the playback position
/// always equals the buffered end and the controller keeps fetching. When a
/// duration limit is set the sink cancels `shutdown` once it is reached.
pub struct FlvFileSink<W: Write> {
    writer: FlvWriter<W>,
    buffered_end: f64,
    limit: Option<f64>,
    shutdown: CancellationToken,
}

impl<W: Write> FlvFileSink<W> {
    pub fn new(writer: W, limit: Option<f64>, shutdown: CancellationToken) -> Self {
        Self {
            writer: FlvWriter::new(writer),
            buffered_end: 0.0,
            limit: limit.filter(|l| *l > 0.0),
            shutdown,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.writer.bytes_written()
    }

    pub fn tags_written(&self) -> u64 {
        self.writer.tags_written()
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer.into_inner())
    }
}

impl<W: Write> PlaybackSink for FlvFileSink<W> {
    fn append_header(&mut self, header: Bytes) -> io::Result<()> {
        self.writer.write_preamble(&header)
    }

    fn append(&mut self, tag: &FlvTag) -> io::Result<()> {
        self.writer.write_tag(tag)?;
        self.buffered_end = self.buffered_end.max(tag.dts as f64 / 1000.0);

        if let Some(limit) = self.limit {
            if self.buffered_end >= limit && !self.shutdown.is_cancelled() {
                info!(seconds = self.buffered_end, "Duration limit reached");
                self.shutdown.cancel();
            }
        }
        Ok(())
    }

    fn end_of_stream(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn abort(&mut self) {
        // Bytes already in the file stay there.
        debug!(bytes = self.writer.bytes_written(), "Abort requested");
    }

    fn buffered_end(&self) -> f64 {
        self.buffered_end
    }

    fn current_time(&self) -> f64 {
        self.buffered_end
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.buffered_end = self.buffered_end.max(seconds);
    }
}
