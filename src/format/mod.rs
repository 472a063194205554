//! # Media Container Formats
//!
//! Container format implementations. The crate currently ships one:
//! a streaming demuxer for the FFmpeg NUT container, the format FFmpeg
//! emits for lossless intermediate transport over pipes.

/// FFmpeg NUT container demuxer
pub mod nut;
