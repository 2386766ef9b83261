//! `#EXT-X-STREAM-INF` attribute lists.

use std::collections::BTreeMap;
use std::fmt;

/// Splits an attribute list into key/value pairs.
///
/// Commas inside double quotes do not separate attributes, and surrounding
/// quotes are removed from values. A fragment without `=` is dropped.
pub fn parse_attribute_list(input: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                push_pair(&mut pairs, &input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_pair(&mut pairs, &input[start..]);
    pairs
}

fn push_pair(pairs: &mut Vec<(String, String)>, fragment: &str) {
    let Some((key, value)) = fragment.split_once('=') else {
        return;
    };
    let key = key.trim();
    if key.is_empty() {
        return;
    }
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    pairs.push((key.to_string(), value.to_string()));
}

/// Picture size from a `RESOLUTION=<width>x<height>` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn parse(value: &str) -> Option<Self> {
        let (width, height) = value.split_once(['x', 'X'])?;
        Some(Self {
            width: width.trim().parse().ok()?,
            height: height.trim().parse().ok()?,
        })
    }

    /// Whether this picture fits inside `other` in both dimensions.
    pub fn fits_within(&self, other: &Resolution) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Typed view of a variant's attributes.
///
/// `BANDWIDTH`, `RESOLUTION` and `PROGRAM-ID` are decoded; every other
/// attribute is kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamAttributes {
    pub bandwidth: Option<u64>,
    pub resolution: Option<Resolution>,
    pub program_id: Option<u64>,
    pub extra: BTreeMap<String, String>,
}

impl StreamAttributes {
    /// Builds the typed view. `on_invalid` is called with the key and raw
    /// value of every typed attribute that fails to parse; such attributes
    /// are left unset.
    pub fn from_pairs<I>(pairs: I, mut on_invalid: impl FnMut(&str, &str)) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut attributes = Self::default();

        for (key, value) in pairs {
            match key.as_str() {
                "BANDWIDTH" => match value.parse() {
                    Ok(bandwidth) => attributes.bandwidth = Some(bandwidth),
                    Err(_) => on_invalid(&key, &value),
                },
                "RESOLUTION" => match Resolution::parse(&value) {
                    Some(resolution) => attributes.resolution = Some(resolution),
                    None => on_invalid(&key, &value),
                },
                "PROGRAM-ID" => match value.parse() {
                    Ok(program_id) => attributes.program_id = Some(program_id),
                    Err(_) => on_invalid(&key, &value),
                },
                _ => {
                    attributes.extra.insert(key, value);
                }
            }
        }

        attributes
    }

    /// Overlays `other` on top of `self`, as when a variant carries more
    /// than one `#EXT-X-STREAM-INF` line.
    pub fn merge(&mut self, other: StreamAttributes) {
        if other.bandwidth.is_some() {
            self.bandwidth = other.bandwidth;
        }
        if other.resolution.is_some() {
            self.resolution = other.resolution;
        }
        if other.program_id.is_some() {
            self.program_id = other.program_id;
        }
        self.extra.extend(other.extra);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}
