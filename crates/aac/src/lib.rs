//! A crate for decoding AAC audio headers.
//!
//! Two header forms are supported: the fixed 7-byte ADTS frame header found
//! in MPEG-TS audio streams ([`AdtsHeader`]) and the leading fields of the
//! AudioSpecificConfig that FLV carries as the AAC sequence header
//! ([`PartialAudioSpecificConfig`]).
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or
//! [Apache-2.0](./LICENSE.Apache-2.0) license. You can choose between one of
//! them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod adts;
mod config;

pub use adts::{ADTS_HEADER_SIZE, AdtsHeader, SAMPLES_PER_RAW_BLOCK};
pub use config::{AudioObjectType, PartialAudioSpecificConfig, SampleFrequencyIndex};
