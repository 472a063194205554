use super::frame::FLAG_INVALID;
use super::io::NutInput;
use super::packet::{read_footer, PacketHeader};
use super::raw;
use crate::av::{MediaKind, Rational};
use crate::error::{NutError, Result};
use std::io::Read;

// Stream classes declared by the container.
pub(crate) const CLASS_VIDEO: u64 = 0;
pub(crate) const CLASS_AUDIO: u64 = 1;

/// One entry of the main header's frame-code table. A frame packet's
/// leading byte indexes this table, which supplies defaults for every
/// field the frame header then optionally overrides.
#[derive(Debug, Clone)]
pub(crate) struct FrameCode {
    pub flags: u64,
    pub stream_id: usize,
    pub data_size_mul: u64,
    pub data_size_lsb: u64,
    pub pts_delta: i64,
    pub reserved_count: u64,
    pub header_idx: usize,
}

impl FrameCode {
    fn invalid() -> Self {
        FrameCode {
            flags: FLAG_INVALID,
            stream_id: 0,
            data_size_mul: 1,
            data_size_lsb: 0,
            pts_delta: 0,
            reserved_count: 0,
            header_idx: 0,
        }
    }
}

/// The container's global header: format version, stream count, the
/// time-base table and the 256-entry frame-code table.
#[derive(Debug, Clone)]
pub struct MainHeader {
    /// Major format version
    pub version: u64,
    /// Minor format version (versions > 3 only)
    pub minor_version: u64,
    /// Number of streams the container declares
    pub stream_count: usize,
    /// Maximum distance between syncpoints, clamped to 65536
    pub max_distance: u64,
    /// Table of exact time bases streams refer to by index
    pub time_base: Vec<Rational>,
    /// Global format flags (versions > 3 only)
    pub flags: u64,
    pub(crate) frame_codes: Vec<FrameCode>,
    pub(crate) elision: Vec<Vec<u8>>,
}

impl MainHeader {
    /// Parses a main header packet, startcode already consumed.
    pub(crate) fn read<R: Read>(input: &mut NutInput<R>, startcode: u64) -> Result<Self> {
        let header = PacketHeader::read(input, startcode)?;

        let version = input.read_var_u64()?;
        let minor_version = if version > 3 { input.read_var_u64()? } else { 0 };

        let stream_count = input.read_var_u64()? as usize;
        if stream_count >= 250 {
            return Err(NutError::CorruptStream(format!(
                "illegal stream count {} must be < 250",
                stream_count
            )));
        }

        let mut max_distance = input.read_var_u64()?;
        if max_distance > 65_536 {
            max_distance = 65_536;
        }

        let time_base_count = input.read_var_u64()? as usize;
        let mut time_base = Vec::with_capacity(time_base_count.min(256));
        for _ in 0..time_base_count {
            let num = input.read_var_u64()?;
            let den = input.read_var_u64()?;
            if num == 0 || den == 0 {
                return Err(NutError::CorruptStream(format!(
                    "invalid time base {}/{}",
                    num, den
                )));
            }
            time_base.push(Rational::new(num as i64, den as i64));
        }

        let frame_codes = Self::read_frame_codes(input, stream_count)?;

        // Elision headers: the first entry is always the empty prefix.
        let mut elision: Vec<Vec<u8>> = vec![Vec::new()];
        if input.offset() < header.end {
            let header_count = input.read_var_u64()? as usize;
            if header_count >= 128 {
                return Err(NutError::CorruptStream(format!(
                    "invalid header_count {} must be < 128",
                    header_count
                )));
            }
            let mut remain = 1024usize;
            for _ in 0..header_count {
                let e = input.read_var_array()?;
                if e.is_empty() || e.len() >= 256 {
                    return Err(NutError::CorruptStream(format!(
                        "invalid elision length {} must be > 0 and < 256",
                        e.len()
                    )));
                }
                if e.len() > remain {
                    return Err(NutError::CorruptStream(format!(
                        "invalid elision length {} must be <= {}",
                        e.len(),
                        remain
                    )));
                }
                remain -= e.len();
                elision.push(e);
            }
        }

        for fc in &frame_codes {
            if fc.header_idx >= elision.len() {
                return Err(NutError::CorruptStream(format!(
                    "frame code header index {} must be < {}",
                    fc.header_idx,
                    elision.len()
                )));
            }
        }

        let mut flags = 0;
        if version > 3 && input.offset() < header.end {
            flags = input.read_var_u64()?;
        }

        header.skip_to_footer(input)?;
        read_footer(input)?;

        log::debug!(
            "main header: version {} streams {} time bases {}",
            version,
            stream_count,
            time_base.len()
        );

        Ok(MainHeader {
            version,
            minor_version,
            stream_count,
            max_distance,
            time_base,
            flags,
            frame_codes,
            elision,
        })
    }

    fn read_frame_codes<R: Read>(
        input: &mut NutInput<R>,
        stream_count: usize,
    ) -> Result<Vec<FrameCode>> {
        let mut frame_codes = Vec::with_capacity(256);

        // Running defaults, carried from one group to the next.
        let mut pts_delta: i64 = 0;
        let mut mul: u64 = 1;
        let mut stream_id: usize = 0;
        let mut header_idx: usize = 0;

        let mut i: usize = 0;
        while i < 256 {
            let flags = input.read_var_u64()?;
            let fields = input.read_var_u64()?;
            if fields > 0 {
                pts_delta = input.read_var_i64()?;
            }
            if fields > 1 {
                mul = input.read_var_u64()?;
                if mul >= 16_384 {
                    return Err(NutError::CorruptStream(format!(
                        "illegal mul value {} must be < 16384",
                        mul
                    )));
                }
            }
            if fields > 2 {
                stream_id = input.read_var_u64()? as usize;
            }
            // Holds for the carried default too, so a container declaring
            // zero streams is rejected here rather than at its first frame.
            if stream_id >= stream_count {
                return Err(NutError::CorruptStream(format!(
                    "illegal stream id {} must be < {}",
                    stream_id, stream_count
                )));
            }
            let size = if fields > 3 { input.read_var_u64()? } else { 0 };
            let reserved = if fields > 4 {
                let r = input.read_var_u64()?;
                if r >= 256 {
                    return Err(NutError::CorruptStream(format!(
                        "illegal reserved frame count {} must be < 256",
                        r
                    )));
                }
                r
            } else {
                0
            };
            let count = if fields > 5 {
                input.read_var_u64()?
            } else {
                mul.checked_sub(size).unwrap_or(0)
            };
            if fields > 6 {
                let _match_time = input.read_var_i64()?;
            }
            if fields > 7 {
                header_idx = input.read_var_u64()? as usize;
            }
            for _ in 8..fields {
                input.read_var_u64()?; // reserved main-header fields
            }

            let limit = 256 - i - if i <= b'N' as usize { 1 } else { 0 };
            if count == 0 || count > limit as u64 {
                return Err(NutError::CorruptStream(format!(
                    "invalid count {} must be > 0 and <= {}",
                    count, limit
                )));
            }

            let mut j: u64 = 0;
            while j < count && i < 256 {
                // 'N' can never be a frame code; it introduces startcodes.
                if i == b'N' as usize {
                    frame_codes.push(FrameCode::invalid());
                    i += 1;
                    continue;
                }
                let fc = FrameCode {
                    flags,
                    stream_id,
                    data_size_mul: mul,
                    data_size_lsb: size + j,
                    pts_delta,
                    reserved_count: reserved,
                    header_idx,
                };
                if fc.data_size_lsb >= 16_384 {
                    return Err(NutError::CorruptStream(format!(
                        "illegal data_size_lsb {} must be < 16384",
                        fc.data_size_lsb
                    )));
                }
                frame_codes.push(fc);
                j += 1;
                i += 1;
            }
        }

        Ok(frame_codes)
    }
}

/// The immutable declaration of one stream: codec tag, time base binding,
/// and the video geometry or audio sample format the codec needs.
///
/// Built exactly once, when the stream's declaration packet is parsed,
/// and never mutated afterward; per-session decode state lives on
/// [`Stream`](super::Stream) instead.
#[derive(Debug, Clone)]
pub struct StreamHeader {
    /// Stream index, assigned by declaration order
    pub id: usize,
    /// Raw stream class declared by the container
    pub class: u64,
    /// Media kind derived from the class and codec tag
    pub kind: MediaKind,
    /// Codec tag ("fourcc"), retained verbatim even when unrecognized
    pub fourcc: Vec<u8>,
    /// Index into the main header's time-base table
    pub time_base_id: usize,
    /// Bits of pts transmitted in delta-coded frame headers
    pub msb_pts_shift: u8,
    /// Largest pts distance between syncpoint-adjacent frames
    pub max_pts_distance: u64,
    /// Frames of delay between input and output of the codec
    pub decode_delay: u64,
    /// Per-stream format flags
    pub flags: u64,
    /// Opaque codec-specific bytes, handed through untouched
    pub codec_specific: Vec<u8>,
    /// Width in pixels (video only)
    pub width: u32,
    /// Height in pixels (video only)
    pub height: u32,
    /// Pixel aspect ratio numerator, 0 when unknown (video only)
    pub sample_width: u32,
    /// Pixel aspect ratio denominator, 0 when unknown (video only)
    pub sample_height: u32,
    /// Colorspace identifier (video only)
    pub colorspace: u64,
    /// Exact sample rate (audio only)
    pub sample_rate: Rational,
    /// Channel count (audio only)
    pub channels: u32,
}

impl StreamHeader {
    /// Parses a stream declaration packet, startcode already consumed.
    pub(crate) fn read<R: Read>(input: &mut NutInput<R>, startcode: u64) -> Result<Self> {
        let packet = PacketHeader::read(input, startcode)?;

        let id = input.read_var_u64()? as usize;
        let class = input.read_var_u64()?;
        let fourcc = input.read_var_array()?;
        if fourcc.len() != 2 && fourcc.len() != 4 {
            return Err(NutError::CorruptStream(format!(
                "unexpected fourcc length {}",
                fourcc.len()
            )));
        }
        let time_base_id = input.read_var_u64()? as usize;
        let msb_pts_shift = input.read_var_u64()?;
        if msb_pts_shift >= 16 {
            return Err(NutError::CorruptStream(format!(
                "invalid msb_pts_shift {} want < 16",
                msb_pts_shift
            )));
        }
        let max_pts_distance = input.read_var_u64()?;
        let decode_delay = input.read_var_u64()?;
        let flags = input.read_var_u64()?;
        let codec_specific = input.read_var_array()?;

        let mut header = StreamHeader {
            id,
            class,
            kind: match class {
                CLASS_VIDEO => MediaKind::Video,
                CLASS_AUDIO => MediaKind::Audio,
                _ => raw::classify_tag(&fourcc),
            },
            fourcc,
            time_base_id,
            msb_pts_shift: msb_pts_shift as u8,
            max_pts_distance,
            decode_delay,
            flags,
            codec_specific,
            width: 0,
            height: 0,
            sample_width: 0,
            sample_height: 0,
            colorspace: 0,
            sample_rate: Rational::new(0, 1),
            channels: 0,
        };

        match class {
            CLASS_VIDEO => {
                header.width = input.read_var_u64()? as u32;
                header.height = input.read_var_u64()? as u32;
                if header.width == 0 || header.height == 0 {
                    return Err(NutError::CorruptStream(format!(
                        "invalid video dimensions {}x{}",
                        header.width, header.height
                    )));
                }
                header.sample_width = input.read_var_u64()? as u32;
                header.sample_height = input.read_var_u64()? as u32;
                // Both must be zero if unknown, otherwise both nonzero.
                if (header.sample_width == 0 || header.sample_height == 0)
                    && header.sample_width != header.sample_height
                {
                    return Err(NutError::CorruptStream(format!(
                        "invalid video sample dimensions {}x{}",
                        header.sample_width, header.sample_height
                    )));
                }
                header.colorspace = input.read_var_u64()?;
            }
            CLASS_AUDIO => {
                let num = input.read_var_u64()?;
                let den = input.read_var_u64()?;
                if den == 0 {
                    return Err(NutError::UnsupportedFormat(format!(
                        "stream {} declares sample rate {}/0",
                        id, num
                    )));
                }
                header.sample_rate = Rational::new(num as i64, den as i64);
                header.channels = input.read_var_u64()? as u32;
            }
            _ => {}
        }

        packet.skip_to_footer(input)?;
        read_footer(input)?;

        Ok(header)
    }
}
