//! # NUT Container Demuxer
//!
//! A streaming reader for the FFmpeg NUT container format, built for the
//! way NUT is used on live pipes: an external encoder is told to emit
//! `-f nut` with raw codecs to stdout, and this demuxer decodes the
//! self-describing, checksum-protected byte stream back into per-stream
//! frames as they arrive.
//!
//! ## Core Features
//!
//! - **Packet framing**: startcode detection, var-int lengths, CRC32
//!   validation of packet headers, packet footers and frame headers
//! - **Stream declarations**: global and per-stream headers decoded into
//!   immutable metadata, with exact rational sample rates and time bases
//! - **Frame decoding**: frame-code table application, delta and
//!   absolute pts reconstruction, elision header expansion, side/meta
//!   data
//! - **Raw translation**: codec-tag tables mapping raw audio streams to
//!   native PCM descriptors and raw video frames to pixel buffers
//!
//! The reader is forward-only and fail-fast: no seeking, and any
//! checksum or framing violation ends the session with a typed error
//! rather than attempting resynchronization.
//!
//! ## Example Usage
//!
//! ```rust
//! use nutio::format::nut::{handlers, NutDemuxer};
//! use std::io::Cursor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // An exhausted container is just the file magic; in deployment the
//! // source is an encoder pipe instead.
//! let bytes = nutio::format::nut::FILE_ID.to_vec();
//! let mut demuxer = NutDemuxer::new(Cursor::new(bytes));
//! let mut handler = handlers(
//!     |stream| {
//!         println!("stream {}: {:?}", stream.index(), stream.header.kind);
//!         Ok(())
//!     },
//!     |frame| {
//!         println!("pts {} ({} bytes)", frame.pts, frame.data.len());
//!         Ok(())
//!     },
//! );
//! demuxer.read(&mut handler)?;
//! # Ok(())
//! # }
//! ```

/// Demuxer read loop and the callback interface
pub mod demuxer;

/// Frame decoding and per-stream state
pub mod frame;

/// Main header and stream header decoding
pub mod header;

mod io;
mod packet;

/// Raw-sample translation into native PCM and pixel formats
pub mod raw;

#[cfg(test)]
mod tests;

pub use demuxer::{handlers, CallbackError, NutDemuxer, NutHandler};
pub use frame::{Frame, MetaValue, Stream};
pub use header::{MainHeader, StreamHeader};
pub use packet::FILE_ID;
pub use raw::{frame_pixel_buffer, stream_audio_format, stream_pixel_layout};
