//! FLV output for the transmuxer.
//!
//! [`FlvTagBuilder`] accumulates one tag (video, audio or script data) and is
//! consumed by [`FlvTagBuilder::finalize`] into an immutable [`FlvTag`] whose
//! bytes are fully framed: 11-byte tag header, payload and the trailing
//! previous-tag-size field. [`FlvHeader`] produces the file preamble and
//! [`FlvWriter`] streams both to any [`std::io::Write`].
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or
//! [Apache-2.0](./LICENSE.Apache-2.0) license. You can choose between one of
//! them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]

pub mod builder;
pub mod error;
pub mod header;
pub mod tag;
pub mod writer;

pub use builder::FlvTagBuilder;
pub use error::FlvError;
pub use header::FlvHeader;
pub use tag::{FlvTag, FlvTagHeader, FlvTagType, TAG_HEADER_SIZE};
pub use writer::FlvWriter;
