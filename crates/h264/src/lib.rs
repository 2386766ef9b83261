//! H.264 header helpers for the TS to FLV transmuxer.
//!
//! Only what a transmuxer needs is implemented: NAL unit classification,
//! emulation prevention handling, decoding of the SPS fields that determine
//! the frame size, and building the AVC decoder configuration record that
//! FLV carries as the video sequence header.
//!
//! ```rust
//! use bytes::Bytes;
//! use h264::{AvcDecoderConfigurationRecord, ParameterSets};
//!
//! let sets = ParameterSets {
//!     sps: vec![Bytes::from_static(&[0x67, 0x42, 0xC0, 0x1E, 0xDA])],
//!     pps: vec![Bytes::from_static(&[0x68, 0xCE, 0x3C, 0x80])],
//! };
//!
//! let record = AvcDecoderConfigurationRecord::from_parameter_sets(&sets).unwrap();
//! assert_eq!(record.profile_indication, 0x42);
//!
//! let mut built = Vec::new();
//! record.build(&mut built);
//! assert_eq!(&built[..6], &[0x01, 0x42, 0xC0, 0x1E, 0xFF, 0xE1]);
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
#![deny(unsafe_code)]

mod config;
mod nal_unit_type;
mod rbsp;
mod sps;

pub use config::{AvcDecoderConfigurationRecord, ParameterSets};
pub use nal_unit_type::NALUnitType;
pub use rbsp::{escape_rbsp, nal_to_rbsp};
pub use sps::{FrameCrop, Sps};
