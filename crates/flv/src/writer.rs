//! # FLV Writer Module
//!
//! Streams a transmuxed FLV file to any [`Write`] implementation: the
//! preamble once, then finalized tags in order.

use std::io::{self, Write};

use tracing::trace;

use crate::tag::FlvTag;

/// FLV Writer for creating FLV files
pub struct FlvWriter<W: Write> {
    writer: W,
    bytes_written: u64,
    tags_written: u64,
    last_timestamp: i64,
}

impl<W: Write> FlvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            bytes_written: 0,
            tags_written: 0,
            last_timestamp: 0,
        }
    }

    /// Writes the file preamble produced by [`crate::FlvHeader::encode`] or
    /// [`crate::FlvHeader::encode_with_duration`].
    pub fn write_preamble(&mut self, preamble: &[u8]) -> io::Result<()> {
        self.writer.write_all(preamble)?;
        self.bytes_written += preamble.len() as u64;
        Ok(())
    }

    /// Writes a finalized tag. The tag already carries its header and
    /// previous-tag-size footer.
    pub fn write_tag(&mut self, tag: &FlvTag) -> io::Result<()> {
        self.writer.write_all(&tag.data)?;
        self.bytes_written += tag.data.len() as u64;
        self.tags_written += 1;
        self.last_timestamp = self.last_timestamp.max(tag.dts);
        trace!(
            tag_type = ?tag.tag_type,
            dts = tag.dts,
            size = tag.data.len(),
            "Wrote FLV tag"
        );
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn tags_written(&self) -> u64 {
        self.tags_written
    }

    /// Highest DTS written so far, in milliseconds.
    pub fn last_timestamp(&self) -> i64 {
        self.last_timestamp
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
