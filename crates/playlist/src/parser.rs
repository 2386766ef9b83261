//! Folding classified lines into a [`Manifest`].

use std::fmt;

use tracing::{debug, trace, warn};

use crate::attributes::StreamAttributes;
use crate::error::ParseError;
use crate::line::{Line, Tag};
use crate::model::{
    ByteRange, MasterPlaylist, MediaPlaylist, Playlist, PlaylistType, Segment, VariantRef,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    /// A field was defaulted.
    Info,
    /// Input was ignored.
    Warning,
}

/// A non-fatal observation made while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Everything read from a playlist body, before it is classified as a
/// master or media playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Whether `#EXTM3U` was seen.
    pub has_header: bool,
    pub version: Option<u64>,
    pub target_duration: Option<f64>,
    pub total_duration: Option<f64>,
    pub media_sequence: Option<u64>,
    pub playlist_type: Option<PlaylistType>,
    pub end_list: bool,
    pub allow_cache: bool,
    pub segments: Vec<Segment>,
    pub variants: Vec<VariantRef>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            has_header: false,
            version: None,
            target_duration: None,
            total_duration: None,
            media_sequence: None,
            playlist_type: None,
            end_list: false,
            allow_cache: true,
            segments: Vec::new(),
            variants: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

impl Manifest {
    /// Parses a complete playlist body.
    pub fn parse(text: &str) -> Self {
        let mut parser = PlaylistParser::new();
        parser.push(text);
        parser.finish()
    }

    /// Parses a complete playlist body received as bytes.
    pub fn from_bytes(body: &[u8]) -> Result<Self, ParseError> {
        Ok(Self::parse(std::str::from_utf8(body)?))
    }

    /// Classifies the manifest. Any variant makes it a master playlist.
    ///
    /// `uri` is the identity of the playlist: the master URI, or for a media
    /// playlist the URI it is listed under in its master.
    pub fn into_playlist(self, uri: impl Into<String>) -> Result<Playlist, ParseError> {
        if !self.has_header {
            return Err(ParseError::MissingHeader);
        }
        let uri = uri.into();

        if !self.variants.is_empty() {
            if !self.segments.is_empty() {
                debug!(
                    uri = %uri,
                    segments = self.segments.len(),
                    "Master playlist also lists segments, ignoring them"
                );
            }
            return Ok(Playlist::Master(MasterPlaylist::new(uri, self.variants)));
        }

        Ok(Playlist::Media(MediaPlaylist {
            uri,
            version: self.version,
            media_sequence: self.media_sequence.unwrap_or(0),
            target_duration: self.target_duration,
            explicit_duration: self.total_duration,
            end_list: self.end_list,
            playlist_type: self.playlist_type,
            allow_cache: self.allow_cache,
            segments: self.segments,
        }))
    }
}

/// Attributes collected from tags until the URI line they apply to.
#[derive(Debug, Default)]
struct PendingEntry {
    duration: Option<f64>,
    title: Option<String>,
    byterange: Option<ByteRange>,
    discontinuity: bool,
    /// Set by `#EXT-X-STREAM-INF`, which makes the next URI a variant.
    attributes: Option<StreamAttributes>,
}

/// Incremental playlist parser.
///
/// Input is accepted in chunks that may split lines anywhere. Lines are
/// processed as soon as their newline arrives; [`end`](Self::end) processes
/// a final line without one.
#[derive(Debug, Default)]
pub struct PlaylistParser {
    buffer: String,
    line_number: usize,
    pending: PendingEntry,
    manifest: Manifest,
}

impl PlaylistParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) {
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.push_str(chunk);

        let mut start = 0;
        while let Some(newline) = buffer[start..].find('\n') {
            self.process_line(&buffer[start..start + newline]);
            start += newline + 1;
        }

        buffer.drain(..start);
        self.buffer = buffer;
    }

    /// Processes any buffered partial line.
    pub fn end(&mut self) {
        let rest = std::mem::take(&mut self.buffer);
        if !rest.is_empty() {
            self.process_line(&rest);
        }
    }

    /// The manifest as read so far.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Ends the input and returns the manifest.
    pub fn finish(mut self) -> Manifest {
        self.end();
        self.manifest
    }

    fn process_line(&mut self, line: &str) {
        self.line_number += 1;

        match Line::classify(line) {
            Some(Line::Tag(tag)) => self.process_tag(tag, line),
            Some(Line::Uri(uri)) => self.process_uri(uri),
            Some(Line::Comment(text)) => trace!(line = self.line_number, text = %text, "Comment"),
            None => {}
        }
    }

    fn process_tag(&mut self, tag: Tag, raw: &str) {
        let raw = raw.trim_end_matches('\r');

        match tag {
            Tag::M3u => self.manifest.has_header = true,
            Tag::Inf { duration, title } => {
                if self.manifest.media_sequence.is_none() {
                    self.manifest.media_sequence = Some(0);
                    self.info("defaulting media sequence to zero");
                }
                match duration {
                    Some(duration) if duration >= 0.0 && duration.is_finite() => {
                        self.pending.duration = Some(duration);
                    }
                    Some(_) => self.warning(format!("ignoring invalid segment duration: {raw}")),
                    None => {}
                }
                self.pending.title = title;
            }
            Tag::TargetDuration(value) => match value.filter(|d| *d >= 0.0 && d.is_finite()) {
                Some(duration) => self.manifest.target_duration = Some(duration),
                None => self.warning(format!("ignoring invalid target duration: {raw}")),
            },
            Tag::TotalDuration(value) => match value.filter(|d| *d >= 0.0 && d.is_finite()) {
                Some(duration) => self.manifest.total_duration = Some(duration),
                None => self.warning(format!("ignoring invalid total duration: {raw}")),
            },
            Tag::Version(value) => match value {
                Some(version) => self.manifest.version = Some(version),
                None => self.warning(format!("ignoring invalid version: {raw}")),
            },
            Tag::MediaSequence(value) => match value {
                Some(sequence) => self.manifest.media_sequence = Some(sequence),
                None => self.warning(format!("ignoring invalid media sequence: {raw}")),
            },
            Tag::PlaylistType(value) => {
                match value.as_deref().and_then(|v| v.parse::<PlaylistType>().ok()) {
                    Some(playlist_type) => self.manifest.playlist_type = Some(playlist_type),
                    None => self.warning(format!("ignoring unknown playlist type: {raw}")),
                }
            }
            Tag::ByteRange { length, offset } => match length {
                Some(length) => {
                    if offset.is_none() {
                        self.info("defaulting byterange offset to zero");
                    }
                    self.pending.byterange = Some(ByteRange {
                        length,
                        offset: offset.unwrap_or(0),
                    });
                }
                None => self.warning(format!("ignoring byterange without length: {raw}")),
            },
            Tag::AllowCache(value) => {
                if value.is_none() {
                    self.info("defaulting allow cache to YES");
                }
                self.manifest.allow_cache = value.unwrap_or(true);
            }
            Tag::StreamInf(pairs) => {
                let mut invalid = Vec::new();
                let attributes = match pairs {
                    Some(pairs) => StreamAttributes::from_pairs(pairs, |key, value| {
                        invalid.push(format!("ignoring invalid {key} attribute: {value}"));
                    }),
                    None => {
                        invalid.push("ignoring empty stream-inf attributes".to_string());
                        StreamAttributes::default()
                    }
                };
                for message in invalid {
                    self.warning(message);
                }
                self.pending
                    .attributes
                    .get_or_insert_with(StreamAttributes::default)
                    .merge(attributes);
            }
            Tag::Discontinuity => self.pending.discontinuity = true,
            Tag::EndList => self.manifest.end_list = true,
            Tag::Unknown(data) => trace!(line = self.line_number, tag = %data, "Unknown tag"),
        }
    }

    fn process_uri(&mut self, uri: String) {
        let pending = std::mem::take(&mut self.pending);

        if let Some(attributes) = pending.attributes {
            self.manifest.variants.push(VariantRef::new(uri, attributes));
            return;
        }

        let duration = match (pending.duration, self.manifest.target_duration) {
            (Some(duration), _) => Some(duration),
            (None, Some(target)) => {
                self.warning("defaulting segment duration to the target duration".to_string());
                Some(target)
            }
            (None, None) => {
                self.warning(format!("segment {uri} has no duration"));
                None
            }
        };

        self.manifest.segments.push(Segment {
            uri,
            duration,
            title: pending.title,
            byterange: pending.byterange,
            discontinuity: pending.discontinuity,
        });
    }

    fn info(&mut self, message: &str) {
        debug!(line = self.line_number, "{message}");
        self.manifest.diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Info,
            line: self.line_number,
            message: message.to_string(),
        });
    }

    fn warning(&mut self, message: String) {
        warn!(line = self.line_number, "{message}");
        self.manifest.diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Warning,
            line: self.line_number,
            message,
        });
    }
}
