//! Translation of raw NUT streams into native sample formats.
//!
//! Raw audio codec tags follow the FFmpeg convention:
//! `P[type][interleaving][bits]` for little-endian PCM and
//! `[bits][interleaving][type]P` for big-endian PCM, where type is `S`
//! (signed), `U` (unsigned) or `F` (IEEE float), interleaving is `D`
//! (default) or `P` (planar), and bits is the raw sample width byte.
//! `ALAW` and `ULAW` name the 8-bit companded law encodings. The tables
//! below enumerate every recognized tag exactly; downstream playback
//! depends on the byte order they declare, so they are matched on the
//! full byte pattern and nothing is ever guessed.

use super::frame::Frame;
use super::header::StreamHeader;
use crate::av::{AudioFormat, ByteOrder, MediaKind, PixelBuffer, PixelLayout, SampleEncoding};
use crate::error::{NutError, Result};

struct PcmTag {
    tag: [u8; 4],
    encoding: SampleEncoding,
    bits: u32,
    byte_order: ByteOrder,
}

const fn le(type_byte: u8, encoding: SampleEncoding, bits: u8) -> PcmTag {
    PcmTag {
        tag: [b'P', type_byte, b'D', bits],
        encoding,
        bits: bits as u32,
        byte_order: ByteOrder::Little,
    }
}

const fn be(type_byte: u8, encoding: SampleEncoding, bits: u8) -> PcmTag {
    PcmTag {
        tag: [bits, b'D', type_byte, b'P'],
        encoding,
        bits: bits as u32,
        byte_order: ByteOrder::Big,
    }
}

/// Every raw audio tag the translator recognizes. The table is total:
/// a tag is either matched here byte for byte or reported as
/// unsupported.
const PCM_TAGS: &[PcmTag] = &[
    PcmTag {
        tag: *b"ALAW",
        encoding: SampleEncoding::ALaw,
        bits: 8,
        byte_order: ByteOrder::Big,
    },
    PcmTag {
        tag: *b"ULAW",
        encoding: SampleEncoding::ULaw,
        bits: 8,
        byte_order: ByteOrder::Big,
    },
    le(b'S', SampleEncoding::PcmSigned, 8),
    le(b'S', SampleEncoding::PcmSigned, 16),
    le(b'S', SampleEncoding::PcmSigned, 24),
    le(b'S', SampleEncoding::PcmSigned, 32),
    be(b'S', SampleEncoding::PcmSigned, 8),
    be(b'S', SampleEncoding::PcmSigned, 16),
    be(b'S', SampleEncoding::PcmSigned, 24),
    be(b'S', SampleEncoding::PcmSigned, 32),
    le(b'U', SampleEncoding::PcmUnsigned, 8),
    le(b'U', SampleEncoding::PcmUnsigned, 16),
    le(b'U', SampleEncoding::PcmUnsigned, 24),
    le(b'U', SampleEncoding::PcmUnsigned, 32),
    be(b'U', SampleEncoding::PcmUnsigned, 8),
    be(b'U', SampleEncoding::PcmUnsigned, 16),
    be(b'U', SampleEncoding::PcmUnsigned, 24),
    be(b'U', SampleEncoding::PcmUnsigned, 32),
    le(b'F', SampleEncoding::PcmFloat, 32),
    be(b'F', SampleEncoding::PcmFloat, 32),
];

/// Every raw video pixel tag the translator recognizes.
const PIXEL_TAGS: &[([u8; 4], PixelLayout)] = &[
    (*b"ARGB", PixelLayout::Argb),
    (*b"RGBA", PixelLayout::Rgba),
    (*b"ABGR", PixelLayout::Abgr),
    (*b"BGRA", PixelLayout::Bgra),
    ([b'R', b'G', b'B', 24], PixelLayout::Rgb24),
    ([b'B', b'G', b'R', 24], PixelLayout::Bgr24),
];

fn tag_of(fourcc: &[u8]) -> Option<[u8; 4]> {
    <[u8; 4]>::try_from(fourcc).ok()
}

fn unsupported(fourcc: &[u8]) -> NutError {
    NutError::UnsupportedFormat(format!(
        "unknown fourcc {:?}",
        String::from_utf8_lossy(fourcc)
    ))
}

/// Classifies a codec tag by looking it up in the raw format tables.
/// Used for streams whose declared class is neither video nor audio.
pub(crate) fn classify_tag(fourcc: &[u8]) -> MediaKind {
    if let Some(tag) = tag_of(fourcc) {
        if PCM_TAGS.iter().any(|e| e.tag == tag) {
            return MediaKind::Audio;
        }
        if PIXEL_TAGS.iter().any(|(t, _)| *t == tag) {
            return MediaKind::Video;
        }
    }
    MediaKind::Unknown
}

/// Translates an audio stream's declaration into a native PCM format
/// descriptor, keyed on the exact codec tag.
pub fn stream_audio_format(header: &StreamHeader) -> Result<AudioFormat> {
    if header.kind != MediaKind::Audio {
        return Err(NutError::UnsupportedFormat(format!(
            "stream {} is not audio",
            header.id
        )));
    }
    let tag = tag_of(&header.fourcc).ok_or_else(|| unsupported(&header.fourcc))?;
    let entry = PCM_TAGS.iter().find(|e| e.tag == tag).ok_or_else(|| {
        // Distinguish a planar layout, which is recognized but not
        // handled, from a tag we know nothing about.
        if (tag[0] == b'P' && tag[2] == b'P') || (tag[3] == b'P' && tag[1] == b'P') {
            NutError::UnsupportedFormat(format!(
                "planar sample layout {:?} is not supported",
                String::from_utf8_lossy(&header.fourcc)
            ))
        } else {
            unsupported(&header.fourcc)
        }
    })?;
    Ok(AudioFormat {
        encoding: entry.encoding,
        sample_rate: header.sample_rate,
        bits: entry.bits,
        channels: header.channels,
        byte_order: entry.byte_order,
    })
}

/// Looks up the pixel layout a video stream's codec tag declares.
pub fn stream_pixel_layout(header: &StreamHeader) -> Result<PixelLayout> {
    if header.kind != MediaKind::Video {
        return Err(NutError::UnsupportedFormat(format!(
            "stream {} is not video",
            header.id
        )));
    }
    let tag = tag_of(&header.fourcc).ok_or_else(|| unsupported(&header.fourcc))?;
    PIXEL_TAGS
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, layout)| *layout)
        .ok_or_else(|| unsupported(&header.fourcc))
}

/// Reinterprets a raw video frame's payload as a rectangular pixel
/// buffer using the stream's declared geometry.
pub fn frame_pixel_buffer(frame: &Frame<'_>) -> Result<PixelBuffer> {
    let header = &frame.stream.header;
    let layout = stream_pixel_layout(header)?;
    let stride = header.width as usize * layout.bytes_per_pixel();
    let expected = stride * header.height as usize;
    if frame.data.len() != expected {
        return Err(NutError::CorruptStream(format!(
            "pixel payload is {} bytes, {}x{} {:?} needs {}",
            frame.data.len(),
            header.width,
            header.height,
            layout,
            expected
        )));
    }
    Ok(PixelBuffer {
        layout,
        width: header.width,
        height: header.height,
        stride,
        data: frame.data.clone(),
    })
}
