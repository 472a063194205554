use super::header::{MainHeader, StreamHeader};
use super::io::NutInput;
use super::raw;
use crate::av::{AudioFormat, PixelBuffer, Rational};
use crate::error::{NutError, Result};
use bytes::Bytes;
use std::io::Read;

/// Frame is a keyframe.
pub const FLAG_KEY: u64 = 1 << 0;
/// Frame is an end-of-record marker; its payload is empty.
pub const FLAG_EOR: u64 = 1 << 1;
/// pts is transmitted in the frame header.
pub const FLAG_CODED_PTS: u64 = 1 << 3;
/// Stream id is transmitted in the frame header.
pub const FLAG_STREAM_ID: u64 = 1 << 4;
/// The high bits of the payload size are transmitted in the frame header.
pub const FLAG_SIZE_MSB: u64 = 1 << 5;
/// The frame header carries its own checksum.
pub const FLAG_CHECKSUM: u64 = 1 << 6;
/// Reserved-field count is transmitted in the frame header.
pub const FLAG_RESERVED: u64 = 1 << 7;
/// Side data and metadata precede the payload (format version >= 4).
pub const FLAG_SM_DATA: u64 = 1 << 8;
/// Elision header index is transmitted in the frame header.
pub const FLAG_HEADER_IDX: u64 = 1 << 10;
/// A match-time delta is transmitted in the frame header.
pub const FLAG_MATCH_TIME: u64 = 1 << 11;
/// The frame header XORs in a per-frame flag word.
pub const FLAG_CODED: u64 = 1 << 12;
/// The frame code is invalid; decoding a frame through it is an error.
pub const FLAG_INVALID: u64 = 1 << 13;

/// Frames larger than this always use elision header 0.
const LARGE_FRAME_THRESHOLD: u64 = 4096;

/// Refuse to allocate payloads past this size; a declared size this large
/// means the stream is garbage, not media.
const MAX_FRAME_SIZE: u64 = 1 << 30;

/// One declared stream plus its per-session decode state.
///
/// The immutable declaration lives in [`StreamHeader`]; the only mutable
/// part is the running pts used to resolve delta-coded timestamps, and
/// that is owned here, per session, so concurrent sessions never share
/// state.
#[derive(Debug, Clone)]
pub struct Stream {
    /// The stream's immutable declaration
    pub header: StreamHeader,
    /// The stream's time base, resolved from the main header table
    pub time_base: Rational,
    pub(crate) last_pts: i64,
}

impl Stream {
    pub(crate) fn new(main: &MainHeader, header: StreamHeader) -> Result<Self> {
        let time_base = *main.time_base.get(header.time_base_id).ok_or_else(|| {
            NutError::CorruptStream(format!(
                "invalid time_base_id {} must be < {}",
                header.time_base_id,
                main.time_base.len()
            ))
        })?;
        Ok(Stream {
            header,
            time_base,
            last_pts: 0,
        })
    }

    /// The stream's index within the session.
    pub fn index(&self) -> usize {
        self.header.id
    }

    /// The pts of the most recently decoded frame of this stream.
    pub fn last_pts(&self) -> i64 {
        self.last_pts
    }

    /// Translates this stream's declaration into a native PCM format
    /// descriptor. Audio streams only.
    pub fn audio_format(&self) -> Result<AudioFormat> {
        raw::stream_audio_format(&self.header)
    }
}

/// A value attached to a frame through its side-data or metadata tables.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// UTF-8 string
    Str(String),
    /// A key=value pair
    Pair(String, String),
    /// Signed integer
    Int(i64),
    /// Coded universal timestamp
    Timestamp(u64),
    /// Exact rational
    Rational(Rational),
}

/// A single decoded frame, borrowed state and all.
///
/// Frames are ephemeral: the demuxer constructs one per data packet,
/// hands it to the handler, and discards it. `data` is a [`Bytes`] so a
/// handler that needs to keep the payload can clone it without copying.
#[derive(Debug)]
pub struct Frame<'a> {
    /// The stream this frame belongs to
    pub stream: &'a Stream,
    /// Effective frame flags (frame-code flags with any per-frame word
    /// XORed in)
    pub flags: u64,
    /// Presentation timestamp in ticks of the stream's time base
    pub pts: i64,
    /// Raw payload bytes; empty for end-of-record markers
    pub data: Bytes,
    /// Side data attached to this frame (format version >= 4)
    pub side_data: Vec<(String, MetaValue)>,
    /// Metadata attached to this frame (format version >= 4)
    pub meta_data: Vec<(String, MetaValue)>,
}

impl Frame<'_> {
    /// True when the frame is a keyframe.
    pub fn is_key(&self) -> bool {
        self.flags & FLAG_KEY != 0
    }

    /// True when the frame marks the end of its stream's records. What an
    /// empty payload means beyond that is the handler's business.
    pub fn is_end_of_record(&self) -> bool {
        self.flags & FLAG_EOR != 0
    }

    /// Reinterprets the payload as a rectangular pixel buffer using the
    /// stream's declared geometry. Raw video streams only.
    pub fn pixel_buffer(&self) -> Result<PixelBuffer> {
        raw::frame_pixel_buffer(self)
    }
}

/// The owned result of parsing a frame packet, before it is bound to its
/// stream reference for dispatch.
pub(crate) struct FrameInfo {
    pub stream_id: usize,
    pub flags: u64,
    pub pts: i64,
    pub data: Bytes,
    pub side_data: Vec<(String, MetaValue)>,
    pub meta_data: Vec<(String, MetaValue)>,
}

/// Parses one frame packet. `code` is the frame-code byte; the running
/// CRC must start at it so the optional frame-header checksum can be
/// verified. Updates the referenced stream's running pts.
pub(crate) fn read_frame<R: Read>(
    input: &mut NutInput<R>,
    main: &MainHeader,
    streams: &mut [Stream],
    code: u8,
) -> Result<FrameInfo> {
    let fc = &main.frame_codes[code as usize];
    let mut flags = fc.flags;
    if flags & FLAG_INVALID != 0 {
        return Err(NutError::CorruptStream(format!(
            "invalid frame code {:#04X}",
            code
        )));
    }
    if flags & FLAG_CODED != 0 {
        flags ^= input.read_var_u64()?;
    }

    let stream_id = if flags & FLAG_STREAM_ID != 0 {
        input.read_var_u64()? as usize
    } else {
        fc.stream_id
    };
    if stream_id >= streams.len() {
        return Err(NutError::UnknownStream(stream_id));
    }
    let stream = &mut streams[stream_id];

    let pts = if flags & FLAG_CODED_PTS != 0 {
        let coded = input.read_var_u64()? as i64;
        let shift = stream.header.msb_pts_shift as u32;
        if coded < (1i64 << shift) {
            // Delta against the stream's running pts, wrapped to the
            // window the shift defines.
            let mask = (1i64 << shift) - 1;
            let delta = stream.last_pts - mask / 2;
            ((coded - delta) & mask) + delta
        } else {
            coded - (1i64 << shift)
        }
    } else {
        stream.last_pts + fc.pts_delta
    };
    stream.last_pts = pts;

    let mut size = fc.data_size_lsb;
    if flags & FLAG_SIZE_MSB != 0 {
        let msb = input.read_var_u64()?;
        size = fc
            .data_size_mul
            .checked_mul(msb)
            .and_then(|n| n.checked_add(size))
            .filter(|&n| n <= MAX_FRAME_SIZE)
            .ok_or_else(|| {
                NutError::CorruptStream(format!("implausible frame size for code {:#04X}", code))
            })?;
    }
    if flags & FLAG_MATCH_TIME != 0 {
        let _match_time = input.read_var_i64()?;
    }
    let mut header_idx = fc.header_idx;
    if flags & FLAG_HEADER_IDX != 0 {
        header_idx = input.read_var_u64()? as usize;
        if header_idx >= main.elision.len() {
            return Err(NutError::CorruptStream(format!(
                "illegal header index {} must be < {}",
                header_idx,
                main.elision.len()
            )));
        }
    }
    let mut frame_res = fc.reserved_count;
    if flags & FLAG_RESERVED != 0 {
        frame_res = input.read_var_u64()?;
    }
    for _ in 0..frame_res {
        input.read_var_u64()?; // reserved frame-header fields
    }
    if flags & FLAG_CHECKSUM != 0 {
        let expected = input.crc();
        let checksum = input.read_u32_be()?;
        if checksum != expected {
            return Err(NutError::CorruptStream(format!(
                "invalid frame header checksum {:08X} want {:08X}",
                checksum, expected
            )));
        }
    }
    if size > LARGE_FRAME_THRESHOLD {
        header_idx = 0;
    }

    let (side_data, meta_data) = if flags & FLAG_SM_DATA != 0 {
        if main.version < 4 {
            return Err(NutError::CorruptStream(
                "frame side/meta data requires format version 4".to_string(),
            ));
        }
        let start = input.offset();
        let side = read_metadata(input)?;
        let meta = read_metadata(input)?;
        let consumed = input.offset() - start;
        if consumed > size {
            return Err(NutError::CorruptStream(format!(
                "side/meta data ({} bytes) larger than frame ({} bytes)",
                consumed, size
            )));
        }
        size -= consumed;
        (side, meta)
    } else {
        (Vec::new(), Vec::new())
    };

    let elision = &main.elision[header_idx];
    if (size as usize) < elision.len() {
        return Err(NutError::CorruptStream(format!(
            "frame of {} bytes smaller than its {} byte elided header",
            size,
            elision.len()
        )));
    }
    let mut data = vec![0u8; size as usize];
    data[..elision.len()].copy_from_slice(elision);
    input.fill(&mut data[elision.len()..])?;

    Ok(FrameInfo {
        stream_id,
        flags,
        pts,
        data: Bytes::from(data),
        side_data,
        meta_data,
    })
}

fn read_metadata<R: Read>(input: &mut NutInput<R>) -> Result<Vec<(String, MetaValue)>> {
    fn utf8(bytes: Vec<u8>) -> String {
        String::from_utf8_lossy(&bytes).into_owned()
    }

    let count = input.read_var_u64()?;
    let mut entries = Vec::new();
    for _ in 0..count {
        let name = utf8(input.read_var_array()?);
        let kind = input.read_var_i64()?;
        let value = match kind {
            -1 => MetaValue::Str(utf8(input.read_var_array()?)),
            -2 => {
                let k = utf8(input.read_var_array()?);
                let v = utf8(input.read_var_array()?);
                MetaValue::Pair(k, v)
            }
            -3 => MetaValue::Int(input.read_var_i64()?),
            -4 => MetaValue::Timestamp(input.read_var_u64()?),
            t if t < -4 => {
                let den = -t - 4;
                let num = input.read_var_i64()?;
                MetaValue::Rational(Rational::new(num, den))
            }
            t => MetaValue::Int(t),
        };
        entries.push((name, value));
    }
    Ok(entries)
}
