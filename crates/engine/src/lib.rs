//! # hlsflv-engine
//!
//! Plays an HLS presentation into an FLV sink: loads and refreshes the
//! playlists, picks a variant from the measured throughput, fetches segments
//! ahead of the playback position and transmuxes them with [`hls`].
//!
//! [`PlaylistLoader`] and [`StreamingController`] are synchronous state
//! machines. They never touch the network; [`driver::run`] executes their
//! commands over a [`Transport`], such as [`HttpTransport`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use hlsflv_engine::{EngineConfig, HttpTransport, StreamingController, PlaybackSink};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn play<S: PlaybackSink>(sink: S) -> Result<(), hlsflv_engine::EngineError> {
//! let config = EngineConfig::default();
//! let transport = Arc::new(HttpTransport::new(&config.http)?);
//! let mut controller =
//!     StreamingController::new("https://example.com/live/master.m3u8", &config, sink);
//!
//! hlsflv_engine::driver::run(
//!     &mut controller,
//!     transport,
//!     &config.streaming,
//!     CancellationToken::new(),
//! )
//! .await?;
//! # Ok(())
//! # }
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

pub mod builder;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod http;
pub mod loader;
pub mod sink;

pub use builder::EngineConfigBuilder;
pub use config::{EngineConfig, HttpConfig, LoaderConfig, StreamingConfig, Viewport};
pub use controller::{ControllerEvent, StreamingController, translate_media_index};
pub use driver::RunOutcome;
pub use error::{EngineError, MediaError};
pub use fetch::{FetchError, FetchRequest, FetchResponse, RequestId, RequestKind, Transport};
pub use http::HttpTransport;
pub use loader::{LoaderCommand, LoaderEvent, LoaderState, PlaylistLoader};
pub use sink::PlaybackSink;
