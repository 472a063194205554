#![doc(html_root_url = "https://docs.rs/nutio/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

//! # nutio - Rust NUT Container Demuxer
//!
//! `nutio` decodes the FFmpeg NUT container format as a live stream. Its
//! primary use is reading the stdout pipe of an `ffmpeg -f nut` process
//! configured with raw codecs (`rawvideo`, `pcm_*`), turning the
//! self-describing, checksum-protected byte stream into per-stream
//! frames and native PCM / pixel-buffer format descriptors.
//!
//! ## Features
//!
//! ### Demuxing
//! - Forward-only, blocking, pull-based read loop over any
//!   [`std::io::Read`] source; backpressure falls out of the pipe itself
//! - Var-int decoding, startcode framing and CRC32 validation of packet
//!   headers, packet footers and frame headers
//! - Exact rational time bases and sample rates, never coerced to
//!   floating point
//! - Fail-fast error taxonomy: truncation, corruption, unknown stream
//!   references and unsupported formats are all typed and terminal
//!
//! ### Raw format translation
//! - Codec-tag tables mapping raw audio streams to PCM descriptors
//!   (encoding, bits, channels, byte order) and raw video frames to
//!   rectangular pixel buffers
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! nutio = "0.1.0"
//! ```
//!
//! ### Reading frames from a live encoder
//!
//! ```rust,no_run
//! use nutio::format::nut::{handlers, NutDemuxer};
//! use std::process::{Command, Stdio};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut child = Command::new("ffmpeg")
//!         .args([
//!             "-i", "input.mp4",
//!             "-f", "nut",
//!             "-c:v", "rawvideo", "-pix_fmt", "argb",
//!             "-c:a", "pcm_f32le",
//!             "pipe:1",
//!         ])
//!         .stdout(Stdio::piped())
//!         .spawn()?;
//!     let stdout = child.stdout.take().ok_or("no stdout pipe")?;
//!
//!     let mut demuxer = NutDemuxer::new(stdout);
//!     let mut handler = handlers(
//!         |stream| {
//!             println!("stream {}: {:?}", stream.index(), stream.header.kind);
//!             Ok(())
//!         },
//!         |frame| {
//!             println!(
//!                 "stream {} pts {} ({} bytes)",
//!                 frame.stream.index(),
//!                 frame.pts,
//!                 frame.data.len()
//!             );
//!             Ok(())
//!         },
//!     );
//!     demuxer.read(&mut handler)?;
//!     child.wait()?;
//!     Ok(())
//! }
//! ```
//!
//! ### Translating raw streams
//!
//! Inside the callbacks, [`format::nut::Stream::audio_format`] yields
//! the exact PCM descriptor an output device needs, and
//! [`format::nut::Frame::pixel_buffer`] reinterprets a raw video payload
//! as a rectangular pixel buffer.
//!
//! ## Module Overview
//!
//! - `av`: container-independent media types: exact rationals, PCM
//!   format descriptors, pixel layouts and buffers
//! - `format`: container implementations; `format::nut` holds the
//!   demuxer, its callback interface and the raw format translator
//! - `error`: the [`NutError`] taxonomy and [`Result`] alias
//! - `utils`: the CRC32 variant NUT checksums are built on

/// Audio/Video base types: rationals, PCM and pixel descriptors
pub mod av;

/// Error types and utilities
pub mod error;

/// Media container format implementations
pub mod format;

/// Common utilities and helper functions
pub mod utils;

pub use error::{NutError, Result};
