//! HLS playlist parsing.
//!
//! [`PlaylistParser`] consumes playlist text in arbitrary chunks, classifies
//! every line into a [`Line`], and folds the result into a [`Manifest`].
//! Unusual input never aborts a parse: defaulted and ignored fields are
//! recorded as [`Diagnostic`]s instead. [`Manifest::into_playlist`] then
//! classifies the manifest as a master or a media playlist.
//!
//! ```rust
//! use playlist::{Manifest, Playlist};
//!
//! let manifest = Manifest::parse("#EXTM3U\n#EXT-X-TARGETDURATION:10\n#EXTINF:9.5,\nseg0.ts\n#EXT-X-ENDLIST\n");
//! let Playlist::Media(media) = manifest.into_playlist("index.m3u8").unwrap() else {
//!     panic!("expected a media playlist");
//! };
//! assert_eq!(media.segments.len(), 1);
//! assert_eq!(media.total_duration(), 9.5);
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

pub mod attributes;
pub mod error;
pub mod line;
pub mod merge;
pub mod model;
pub mod parser;
pub mod resolve;

pub use attributes::{Resolution, StreamAttributes};
pub use error::ParseError;
pub use line::{Line, Tag};
pub use merge::update_master;
pub use model::{
    ByteRange, MasterPlaylist, MediaPlaylist, Playlist, PlaylistType, Segment, VariantRef,
};
pub use parser::{Diagnostic, DiagnosticLevel, Manifest, PlaylistParser};
pub use resolve::resolve_uri;
