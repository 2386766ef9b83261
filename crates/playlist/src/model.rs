//! Parsed playlist model.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::attributes::StreamAttributes;

/// A sub-range of a resource, from `#EXT-X-BYTERANGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub length: u64,
    pub offset: u64,
}

/// One media segment of a media playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub uri: String,
    /// Duration in seconds. `None` when neither `#EXTINF` nor a target
    /// duration preceded the URI.
    pub duration: Option<f64>,
    pub title: Option<String>,
    pub byterange: Option<ByteRange>,
    /// Whether an `#EXT-X-DISCONTINUITY` precedes this segment.
    pub discontinuity: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistType {
    Vod,
    Event,
}

impl FromStr for PlaylistType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VOD" => Ok(PlaylistType::Vod),
            "EVENT" => Ok(PlaylistType::Event),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PlaylistType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaylistType::Vod => write!(f, "VOD"),
            PlaylistType::Event => write!(f, "EVENT"),
        }
    }
}

/// A media playlist: an ordered list of segments.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPlaylist {
    /// The URI this playlist is known by in its master playlist.
    pub uri: String,
    pub version: Option<u64>,
    pub media_sequence: u64,
    pub target_duration: Option<f64>,
    /// Explicit total from `#ZEN-TOTAL-DURATION`.
    pub explicit_duration: Option<f64>,
    pub end_list: bool,
    pub playlist_type: Option<PlaylistType>,
    pub allow_cache: bool,
    pub segments: Vec<Segment>,
}

impl MediaPlaylist {
    /// Whether more segments may still be appended on refresh.
    pub fn is_live(&self) -> bool {
        !self.end_list
    }

    /// Duration of segment `index`, falling back to the target duration.
    pub fn segment_duration(&self, index: usize) -> f64 {
        self.segments
            .get(index)
            .and_then(|s| s.duration)
            .or(self.target_duration)
            .unwrap_or(0.0)
    }

    /// Presentation length in seconds.
    ///
    /// An explicit total wins. Otherwise a live playlist is unbounded and an
    /// ended one sums its segments.
    pub fn total_duration(&self) -> f64 {
        if let Some(duration) = self.explicit_duration.filter(|d| *d > 0.0) {
            return duration;
        }
        if self.is_live() {
            return f64::INFINITY;
        }
        (0..self.segments.len())
            .map(|index| self.segment_duration(index))
            .sum()
    }

    /// Index of the segment whose time range contains `seconds`.
    pub fn segment_index_for_time(&self, seconds: f64) -> Option<usize> {
        let mut start = 0.0;
        for index in 0..self.segments.len() {
            let end = start + self.segment_duration(index);
            if seconds >= start && seconds < end {
                return Some(index);
            }
            start = end;
        }
        None
    }
}

/// A variant entry of a master playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRef {
    pub uri: String,
    pub attributes: StreamAttributes,
    /// Latest snapshot of this variant's media playlist, once loaded.
    pub media: Option<Arc<MediaPlaylist>>,
}

impl VariantRef {
    pub fn new(uri: impl Into<String>, attributes: StreamAttributes) -> Self {
        Self {
            uri: uri.into(),
            attributes,
            media: None,
        }
    }

    pub fn bandwidth(&self) -> Option<u64> {
        self.attributes.bandwidth
    }
}

/// A master playlist: the variants of one presentation.
///
/// Snapshots are replaced rather than mutated; see [`crate::update_master`].
#[derive(Debug, Clone, PartialEq)]
pub struct MasterPlaylist {
    pub uri: String,
    variants: Vec<VariantRef>,
    index: HashMap<String, usize>,
}

impl MasterPlaylist {
    pub fn new(uri: impl Into<String>, variants: Vec<VariantRef>) -> Self {
        let mut index = HashMap::with_capacity(variants.len());
        for (position, variant) in variants.iter().enumerate() {
            index.entry(variant.uri.clone()).or_insert(position);
        }
        Self {
            uri: uri.into(),
            variants,
            index,
        }
    }

    /// A master whose only variant is `uri` itself, for sources that are
    /// a media playlist. The variant's media is installed by
    /// [`crate::update_master`].
    pub fn single(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let variant = VariantRef::new(uri.clone(), StreamAttributes::default());
        Self::new(uri, vec![variant])
    }

    pub fn variants(&self) -> &[VariantRef] {
        &self.variants
    }

    pub fn position(&self, uri: &str) -> Option<usize> {
        self.index.get(uri).copied()
    }

    pub fn variant(&self, uri: &str) -> Option<&VariantRef> {
        self.position(uri).map(|position| &self.variants[position])
    }

    pub fn media(&self, uri: &str) -> Option<&Arc<MediaPlaylist>> {
        self.variant(uri)?.media.as_ref()
    }

    pub(crate) fn variants_mut(&mut self) -> &mut [VariantRef] {
        &mut self.variants
    }
}

/// A parsed playlist of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Playlist {
    Master(MasterPlaylist),
    Media(MediaPlaylist),
}
