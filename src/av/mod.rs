//! # Audio/Video Base Types
//!
//! Container-independent descriptions of raw media: exact rationals for
//! time bases and sample rates, PCM audio format descriptors, and raw
//! pixel-buffer layouts. The NUT demuxer produces these through its raw
//! format translator; they carry everything a playback or conversion
//! layer needs without referencing the container again.

mod rational;

pub use rational::Rational;

use bytes::Bytes;

/// Broad classification of a media stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Video stream
    Video,
    /// Audio stream
    Audio,
    /// Anything the demuxer does not classify (subtitles, data streams,
    /// unrecognized codec tags)
    Unknown,
}

/// Byte order of multi-byte samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

/// Sample encoding of a raw audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Linear PCM, signed integer samples
    PcmSigned,
    /// Linear PCM, unsigned integer samples
    PcmUnsigned,
    /// Linear PCM, IEEE float samples
    PcmFloat,
    /// 8-bit A-law companded
    ALaw,
    /// 8-bit mu-law companded
    ULaw,
}

/// A native PCM format descriptor for a raw audio stream.
///
/// Field for field this is what an audio output device needs to be
/// opened: encoding, exact sample rate, sample width, channel count and
/// byte order. Samples are channel-interleaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Sample encoding
    pub encoding: SampleEncoding,
    /// Exact sample rate in Hz
    pub sample_rate: Rational,
    /// Bits per sample
    pub bits: u32,
    /// Number of interleaved channels
    pub channels: u32,
    /// Byte order of each sample
    pub byte_order: ByteOrder,
}

impl AudioFormat {
    /// Size in bytes of one interleaved sample frame (all channels).
    pub fn frame_size(&self) -> usize {
        (self.bits as usize / 8) * self.channels as usize
    }
}

/// Pixel layout of a raw video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// 32-bit ARGB, 8 bits per channel
    Argb,
    /// 32-bit RGBA, 8 bits per channel
    Rgba,
    /// 32-bit ABGR, 8 bits per channel
    Abgr,
    /// 32-bit BGRA, 8 bits per channel
    Bgra,
    /// 24-bit packed RGB
    Rgb24,
    /// 24-bit packed BGR
    Bgr24,
}

impl PixelLayout {
    /// Bytes occupied by a single pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelLayout::Argb | PixelLayout::Rgba | PixelLayout::Abgr | PixelLayout::Bgra => 4,
            PixelLayout::Rgb24 | PixelLayout::Bgr24 => 3,
        }
    }
}

/// A decoded video frame reinterpreted as a rectangular pixel buffer.
///
/// `data` holds `height` rows of `stride` bytes each, tightly packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Pixel layout of `data`
    pub layout: PixelLayout,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per row
    pub stride: usize,
    /// Raw pixel bytes, row-major
    pub data: Bytes,
}

impl PixelBuffer {
    /// Returns the bytes of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {} out of range", y);
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }
}
