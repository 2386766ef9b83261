//! Context-free classification of single playlist lines.

use std::str::FromStr;

use crate::attributes::parse_attribute_list;

/// One directive recognised by the parser.
///
/// Values that are missing or fail to parse are `None`; whether that is
/// worth a diagnostic is decided by the parser, which knows the context.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// `#EXTM3U`
    M3u,
    /// `#EXTINF:<duration>,<title>`
    Inf {
        duration: Option<f64>,
        title: Option<String>,
    },
    /// `#EXT-X-TARGETDURATION:<s>`
    TargetDuration(Option<f64>),
    /// `#ZEN-TOTAL-DURATION:<s>`
    TotalDuration(Option<f64>),
    /// `#EXT-X-VERSION:<n>`
    Version(Option<u64>),
    /// `#EXT-X-MEDIA-SEQUENCE:<n>`
    MediaSequence(Option<u64>),
    /// `#EXT-X-PLAYLIST-TYPE:<type>`, unvalidated.
    PlaylistType(Option<String>),
    /// `#EXT-X-BYTERANGE:<length>[@<offset>]`
    ByteRange {
        length: Option<u64>,
        offset: Option<u64>,
    },
    /// `#EXT-X-ALLOW-CACHE:<YES|NO>`
    AllowCache(Option<bool>),
    /// `#EXT-X-STREAM-INF:<attribute-list>`, `None` when the list is empty.
    StreamInf(Option<Vec<(String, String)>>),
    /// `#EXT-X-DISCONTINUITY`
    Discontinuity,
    /// `#EXT-X-ENDLIST`
    EndList,
    /// Any other `#EXT` line, without the `#EXT` prefix.
    Unknown(String),
}

/// A classified playlist line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Tag(Tag),
    Uri(String),
    /// A `#` line that is not a tag, without the `#`.
    Comment(String),
}

impl Line {
    /// Classifies one line. Blank lines yield `None`.
    pub fn classify(line: &str) -> Option<Self> {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            return None;
        }

        let Some(comment) = line.strip_prefix('#') else {
            return Some(Line::Uri(line.trim().to_string()));
        };
        if !line.starts_with("#EXT") && !line.starts_with("#ZEN-") {
            return Some(Line::Comment(comment.to_string()));
        }

        Some(Line::Tag(classify_tag(line)))
    }
}

fn classify_tag(line: &str) -> Tag {
    if tag_value(line, "#EXTM3U").is_some() {
        return Tag::M3u;
    }
    if let Some(value) = tag_value(line, "#EXTINF") {
        let (duration, title) = match value {
            Some(value) => match value.split_once(',') {
                Some((duration, title)) => (duration, Some(title)),
                None => (value, None),
            },
            None => ("", None),
        };
        return Tag::Inf {
            duration: parse_number(Some(duration)),
            title: title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        };
    }
    if let Some(value) = tag_value(line, "#EXT-X-TARGETDURATION") {
        return Tag::TargetDuration(parse_number(value));
    }
    if let Some(value) = tag_value(line, "#ZEN-TOTAL-DURATION") {
        return Tag::TotalDuration(parse_number(value));
    }
    if let Some(value) = tag_value(line, "#EXT-X-VERSION") {
        return Tag::Version(parse_number(value));
    }
    if let Some(value) = tag_value(line, "#EXT-X-MEDIA-SEQUENCE") {
        return Tag::MediaSequence(parse_number(value));
    }
    if let Some(value) = tag_value(line, "#EXT-X-PLAYLIST-TYPE") {
        return Tag::PlaylistType(value.map(str::to_string));
    }
    if let Some(value) = tag_value(line, "#EXT-X-BYTERANGE") {
        let (length, offset) = match value.map(|v| v.split_once('@')) {
            Some(Some((length, offset))) => (Some(length), Some(offset)),
            Some(None) => (value, None),
            None => (None, None),
        };
        return Tag::ByteRange {
            length: parse_number(length),
            offset: parse_number(offset),
        };
    }
    if let Some(value) = tag_value(line, "#EXT-X-ALLOW-CACHE") {
        return Tag::AllowCache(match value {
            Some("YES") => Some(true),
            Some("NO") => Some(false),
            _ => None,
        });
    }
    if let Some(value) = tag_value(line, "#EXT-X-STREAM-INF") {
        return Tag::StreamInf(
            value
                .map(parse_attribute_list)
                .filter(|pairs| !pairs.is_empty()),
        );
    }
    if tag_value(line, "#EXT-X-DISCONTINUITY").is_some() {
        return Tag::Discontinuity;
    }
    if tag_value(line, "#EXT-X-ENDLIST").is_some() {
        return Tag::EndList;
    }

    Tag::Unknown(line.get(4..).unwrap_or_default().to_string())
}

/// Matches `name` exactly, optionally followed by `:value`.
///
/// The outer `Option` says whether the tag matched, the inner one whether it
/// carried a non-empty value.
fn tag_value<'a>(line: &'a str, name: &str) -> Option<Option<&'a str>> {
    let rest = line.strip_prefix(name)?;
    if rest.is_empty() {
        return Some(None);
    }
    let value = rest.strip_prefix(':')?.trim();
    Some((!value.is_empty()).then_some(value))
}

fn parse_number<T: FromStr>(value: Option<&str>) -> Option<T> {
    value?.trim().parse().ok()
}
