use super::demuxer::{handlers, NutDemuxer};
use super::frame::{
    Frame, Stream, FLAG_CHECKSUM, FLAG_CODED, FLAG_CODED_PTS, FLAG_EOR, FLAG_HEADER_IDX, FLAG_KEY,
    FLAG_SIZE_MSB, FLAG_SM_DATA, FLAG_STREAM_ID,
};
use super::packet::{StartCode, FILE_ID};
use super::MetaValue;
use crate::av::{MediaKind, Rational, SampleEncoding};
use crate::error::NutError;
use crate::utils::Crc32Nut;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::io::Cursor;

// Every fixture stream uses this pts shift; coded pts values of
// `pts + 128` are therefore absolute.
const MSB_PTS_SHIFT: u64 = 7;

const GROUP_FLAGS: u64 = FLAG_CODED | FLAG_CODED_PTS | FLAG_STREAM_ID | FLAG_SIZE_MSB;

fn put_var_u64(out: &mut Vec<u8>, mut v: u64) {
    let mut bytes = vec![(v & 0x7F) as u8];
    v >>= 7;
    while v > 0 {
        bytes.push(0x80 | (v & 0x7F) as u8);
        v >>= 7;
    }
    bytes.reverse();
    out.extend_from_slice(&bytes);
}

fn put_var_i64(out: &mut Vec<u8>, v: i64) {
    let raw = if v > 0 {
        (v as u64) * 2 - 1
    } else {
        v.unsigned_abs() * 2
    };
    put_var_u64(out, raw);
}

fn put_var_array(out: &mut Vec<u8>, data: &[u8]) {
    put_var_u64(out, data.len() as u64);
    out.extend_from_slice(data);
}

/// Assembles well-formed NUT byte streams the same way the muxer side
/// would, checksums included.
struct FileBuilder {
    out: Vec<u8>,
}

impl FileBuilder {
    fn new() -> Self {
        FileBuilder {
            out: FILE_ID.to_vec(),
        }
    }

    fn packet(&mut self, startcode: StartCode, body: &[u8]) {
        let mut head = startcode.value().to_be_bytes().to_vec();
        put_var_u64(&mut head, body.len() as u64 + 4);
        if body.len() as u64 + 4 > 4096 {
            // Large packets carry a checksum over startcode + forward_ptr.
            let crc = Crc32Nut::new().calculate(&head);
            head.extend_from_slice(&crc.to_be_bytes());
        }
        self.out.extend_from_slice(&head);
        self.out.extend_from_slice(body);
        self.out
            .extend_from_slice(&Crc32Nut::new().calculate(body).to_be_bytes());
    }

    fn main_header(&mut self, streams: u64, time_bases: &[(u64, u64)]) {
        self.main_header_custom(3, streams, time_bases, GROUP_FLAGS, 0, &[]);
    }

    /// Writes a main header whose single frame-code group covers all 256
    /// codes ('N' takes the one invalid slot).
    fn main_header_custom(
        &mut self,
        version: u64,
        streams: u64,
        time_bases: &[(u64, u64)],
        group_flags: u64,
        pts_delta: i64,
        elision: &[&[u8]],
    ) {
        let mut body = Vec::new();
        put_var_u64(&mut body, version);
        if version > 3 {
            put_var_u64(&mut body, 0); // minor version
        }
        put_var_u64(&mut body, streams);
        put_var_u64(&mut body, 65_536); // max_distance
        put_var_u64(&mut body, time_bases.len() as u64);
        for &(num, den) in time_bases {
            put_var_u64(&mut body, num);
            put_var_u64(&mut body, den);
        }
        put_var_u64(&mut body, group_flags);
        put_var_u64(&mut body, 6); // fields
        put_var_i64(&mut body, pts_delta);
        put_var_u64(&mut body, 1); // mul
        put_var_u64(&mut body, 0); // stream id
        put_var_u64(&mut body, 0); // size lsb
        put_var_u64(&mut body, 0); // reserved count
        put_var_u64(&mut body, 255); // count
        put_var_u64(&mut body, elision.len() as u64); // header_count
        for prefix in elision {
            put_var_array(&mut body, prefix);
        }
        if version > 3 {
            put_var_u64(&mut body, 0); // main flags
        }
        self.packet(StartCode::Main, &body);
    }

    fn stream_common(id: u64, class: u64, fourcc: &[u8], time_base_id: u64) -> Vec<u8> {
        let mut body = Vec::new();
        put_var_u64(&mut body, id);
        put_var_u64(&mut body, class);
        put_var_array(&mut body, fourcc);
        put_var_u64(&mut body, time_base_id);
        put_var_u64(&mut body, MSB_PTS_SHIFT);
        put_var_u64(&mut body, 16); // max_pts_distance
        put_var_u64(&mut body, 0); // decode_delay
        put_var_u64(&mut body, 0); // flags
        put_var_array(&mut body, &[]); // codec_specific
        body
    }

    fn video_stream_tb(&mut self, id: u64, fourcc: &[u8], width: u64, height: u64, tb: u64) {
        let mut body = Self::stream_common(id, 0, fourcc, tb);
        put_var_u64(&mut body, width);
        put_var_u64(&mut body, height);
        put_var_u64(&mut body, 0); // sample_width
        put_var_u64(&mut body, 0); // sample_height
        put_var_u64(&mut body, 0); // colorspace
        self.packet(StartCode::Stream, &body);
    }

    fn video_stream(&mut self, id: u64, fourcc: &[u8], width: u64, height: u64) {
        self.video_stream_tb(id, fourcc, width, height, 0);
    }

    fn audio_stream(&mut self, id: u64, fourcc: &[u8], rate: (u64, u64), channels: u64) {
        let mut body = Self::stream_common(id, 1, fourcc, 0);
        put_var_u64(&mut body, rate.0);
        put_var_u64(&mut body, rate.1);
        put_var_u64(&mut body, channels);
        self.packet(StartCode::Stream, &body);
    }

    fn frame_header(stream_id: u64, coded_word: u64, coded_pts: u64, size_msb: u64) -> Vec<u8> {
        let mut hdr = vec![0x00]; // frame code 0
        put_var_u64(&mut hdr, coded_word);
        put_var_u64(&mut hdr, stream_id);
        put_var_u64(&mut hdr, coded_pts);
        put_var_u64(&mut hdr, size_msb);
        hdr
    }

    fn frame_coded(&mut self, stream_id: u64, pts: i64, payload: &[u8], coded_word: u64) {
        let coded_pts = (pts as u64) + (1 << MSB_PTS_SHIFT);
        let mut hdr = Self::frame_header(stream_id, coded_word, coded_pts, payload.len() as u64);
        if coded_word & FLAG_CHECKSUM != 0 {
            let crc = Crc32Nut::new().calculate(&hdr);
            hdr.extend_from_slice(&crc.to_be_bytes());
        }
        self.out.extend_from_slice(&hdr);
        self.out.extend_from_slice(payload);
    }

    fn frame(&mut self, stream_id: u64, pts: i64, payload: &[u8], key: bool) {
        self.frame_coded(stream_id, pts, payload, if key { FLAG_KEY } else { 0 });
    }

    /// A frame whose coded pts is written verbatim, for exercising the
    /// delta window reconstruction.
    fn frame_raw_pts(&mut self, stream_id: u64, coded_pts: u64, payload: &[u8]) {
        let hdr = Self::frame_header(stream_id, 0, coded_pts, payload.len() as u64);
        self.out.extend_from_slice(&hdr);
        self.out.extend_from_slice(payload);
    }

    /// A frame that names an elision header; `total_size` counts the
    /// elided prefix, `tail` holds only the bytes after it.
    fn frame_elided(&mut self, stream_id: u64, pts: i64, total_size: u64, tail: &[u8], idx: u64) {
        let mut hdr = vec![0x00];
        put_var_u64(&mut hdr, FLAG_HEADER_IDX); // coded word
        put_var_u64(&mut hdr, stream_id);
        put_var_u64(&mut hdr, (pts as u64) + (1 << MSB_PTS_SHIFT));
        put_var_u64(&mut hdr, total_size);
        put_var_u64(&mut hdr, idx);
        self.out.extend_from_slice(&hdr);
        self.out.extend_from_slice(tail);
    }

    /// A frame for tables without FLAG_CODED_PTS / FLAG_CODED.
    fn frame_delta(&mut self, stream_id: u64, payload: &[u8]) {
        let mut hdr = vec![0x00];
        put_var_u64(&mut hdr, stream_id);
        put_var_u64(&mut hdr, payload.len() as u64);
        self.out.extend_from_slice(&hdr);
        self.out.extend_from_slice(payload);
    }

    fn frame_with_side_data(&mut self, stream_id: u64, pts: i64, payload: &[u8]) {
        let mut sm = Vec::new();
        put_var_u64(&mut sm, 1); // one side-data entry
        put_var_array(&mut sm, b"lang");
        put_var_i64(&mut sm, -1); // string value
        put_var_array(&mut sm, b"eng");
        put_var_u64(&mut sm, 0); // no metadata entries

        let coded_pts = (pts as u64) + (1 << MSB_PTS_SHIFT);
        let size = (sm.len() + payload.len()) as u64;
        let hdr = Self::frame_header(stream_id, FLAG_SM_DATA, coded_pts, size);
        self.out.extend_from_slice(&hdr);
        self.out.extend_from_slice(&sm);
        self.out.extend_from_slice(payload);
    }

    fn bytes(self) -> Vec<u8> {
        self.out
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Stream(usize, MediaKind),
    Frame {
        stream: usize,
        pts: i64,
        len: usize,
        key: bool,
        eor: bool,
    },
}

fn collect(bytes: Vec<u8>) -> (crate::Result<()>, Vec<Event>) {
    let events = RefCell::new(Vec::new());
    let mut demuxer = NutDemuxer::new(Cursor::new(bytes));
    let result = {
        let mut handler = handlers(
            |stream: &Stream| {
                events
                    .borrow_mut()
                    .push(Event::Stream(stream.index(), stream.header.kind));
                Ok(())
            },
            |frame: &Frame<'_>| {
                events.borrow_mut().push(Event::Frame {
                    stream: frame.stream.index(),
                    pts: frame.pts,
                    len: frame.data.len(),
                    key: frame.is_key(),
                    eor: frame.is_end_of_record(),
                });
                Ok(())
            },
        );
        demuxer.read(&mut handler)
    };
    (result, events.into_inner())
}

fn two_stream_file() -> Vec<u8> {
    let mut b = FileBuilder::new();
    b.main_header(2, &[(1, 1000)]);
    b.video_stream(0, b"ARGB", 2, 2);
    b.audio_stream(1, b"PFD ", (48_000, 1), 2);
    b.frame(0, 0, &[0xAA; 16], true);
    b.frame(1, 0, &[0x11; 8], true);
    b.frame(1, 10, &[0x22; 8], false);
    b.frame(0, 40, &[0xBB; 16], false);
    b.frame(1, 20, &[0x33; 8], false);
    b.frame(0, 80, &[0xCC; 16], false);
    b.frame(1, 30, &[0x44; 8], false);
    b.frame(1, 40, &[0x55; 8], false);
    b.bytes()
}

#[test]
fn test_end_to_end_two_streams() {
    let events = RefCell::new(Vec::new());
    let mut demuxer = NutDemuxer::new(Cursor::new(two_stream_file()));
    {
        let mut handler = handlers(
            |stream: &Stream| {
                events
                    .borrow_mut()
                    .push(Event::Stream(stream.index(), stream.header.kind));
                Ok(())
            },
            |frame: &Frame<'_>| {
                events.borrow_mut().push(Event::Frame {
                    stream: frame.stream.index(),
                    pts: frame.pts,
                    len: frame.data.len(),
                    key: frame.is_key(),
                    eor: frame.is_end_of_record(),
                });
                Ok(())
            },
        );
        demuxer.read(&mut handler).unwrap();
    }

    let frame = |stream, pts, len, key| Event::Frame {
        stream,
        pts,
        len,
        key,
        eor: false,
    };
    assert_eq!(
        events.into_inner(),
        vec![
            Event::Stream(0, MediaKind::Video),
            Event::Stream(1, MediaKind::Audio),
            frame(0, 0, 16, true),
            frame(1, 0, 8, true),
            frame(1, 10, 8, false),
            frame(0, 40, 16, false),
            frame(1, 20, 8, false),
            frame(0, 80, 16, false),
            frame(1, 30, 8, false),
            frame(1, 40, 8, false),
        ]
    );

    // Both stream declarations survive on the session, state updated.
    let streams = demuxer.streams();
    assert_eq!(streams.len(), 2);
    assert_eq!(streams[0].time_base, Rational::new(1, 1000));
    assert_eq!(streams[0].last_pts(), 80);
    assert_eq!(streams[1].last_pts(), 40);

    // The audio declaration translates to an exact native descriptor.
    let format = streams[1].audio_format().unwrap();
    assert_eq!(format.encoding, SampleEncoding::PcmFloat);
    assert_eq!(format.bits, 32);
    assert_eq!(format.channels, 2);
    assert_eq!(format.byte_order, crate::av::ByteOrder::Little);
    assert_eq!(format.sample_rate, Rational::new(48_000, 1));
}

#[test]
fn test_single_byte_corruption_is_fatal() {
    let mut bytes = two_stream_file();
    // Flip one byte of the audio stream declaration's fourcc. The field
    // itself stays parseable, so only the packet checksum can catch it.
    let at = bytes
        .windows(5)
        .position(|w| w == [0x04, b'P', b'F', b'D', b' '])
        .expect("audio fourcc not found");
    bytes[at + 2] ^= 0x01;

    let (result, events) = collect(bytes);
    assert!(
        matches!(result, Err(NutError::CorruptStream(_))),
        "{:?}",
        result
    );
    // The video stream was announced before the corrupt packet; nothing
    // fires after it.
    assert_eq!(events, vec![Event::Stream(0, MediaKind::Video)]);
}

#[test]
fn test_truncated_length_field_in_first_packet() {
    let mut bytes = FILE_ID.to_vec();
    bytes.extend_from_slice(&StartCode::Main.value().to_be_bytes());
    bytes.push(0x80); // forward_ptr var-int cut after its first byte

    let (result, events) = collect(bytes);
    assert!(
        matches!(result, Err(NutError::TruncatedStream(_))),
        "{:?}",
        result
    );
    assert_eq!(events, vec![]);
}

#[test]
fn test_truncation_mid_frame_payload() {
    let mut b = FileBuilder::new();
    b.main_header(1, &[(1, 1000)]);
    b.video_stream(0, b"ARGB", 2, 2);
    b.frame(0, 0, &[0xAA; 16], true);
    b.frame(0, 40, &[0xBB; 16], false);
    let mut bytes = b.bytes();
    bytes.truncate(bytes.len() - 8); // inside the second frame's payload

    let (result, events) = collect(bytes);
    assert!(
        matches!(result, Err(NutError::TruncatedStream(_))),
        "{:?}",
        result
    );
    assert_eq!(
        events,
        vec![
            Event::Stream(0, MediaKind::Video),
            Event::Frame {
                stream: 0,
                pts: 0,
                len: 16,
                key: true,
                eor: false
            },
        ]
    );
}

#[test]
fn test_unknown_stream_reference() {
    let mut b = FileBuilder::new();
    b.main_header(2, &[(1, 1000)]);
    b.video_stream(0, b"ARGB", 2, 2);
    b.audio_stream(1, b"PFD ", (48_000, 1), 2);
    b.frame(7, 0, &[0xAA; 4], true);
    // Nothing past the bad reference may be delivered.
    b.frame(0, 0, &[0xBB; 16], true);

    let (result, events) = collect(b.bytes());
    assert!(matches!(result, Err(NutError::UnknownStream(7))), "{:?}", result);
    assert_eq!(
        events,
        vec![
            Event::Stream(0, MediaKind::Video),
            Event::Stream(1, MediaKind::Audio),
        ]
    );
}

#[test]
fn test_end_of_record_frame_dispatched() {
    let mut b = FileBuilder::new();
    b.main_header(1, &[(1, 1000)]);
    b.audio_stream(0, b"PFD ", (48_000, 1), 2);
    b.frame(0, 0, &[0x11; 8], true);
    b.frame_coded(0, 10, &[], FLAG_KEY | FLAG_EOR);

    let (result, events) = collect(b.bytes());
    result.unwrap();
    assert_eq!(
        events[2],
        Event::Frame {
            stream: 0,
            pts: 10,
            len: 0,
            key: true,
            eor: true
        }
    );
}

#[test]
fn test_callback_error_aborts_session() {
    let frames_seen = RefCell::new(0u32);
    let mut demuxer = NutDemuxer::new(Cursor::new(two_stream_file()));
    let result = {
        let mut handler = handlers(
            |_: &Stream| Ok(()),
            |_: &Frame<'_>| {
                *frames_seen.borrow_mut() += 1;
                Err("synthetic handler failure".into())
            },
        );
        demuxer.read(&mut handler)
    };
    assert!(matches!(result, Err(NutError::Callback(_))), "{:?}", result);
    assert_eq!(*frames_seen.borrow(), 1);
}

#[test]
fn test_frame_before_main_header() {
    let mut bytes = FILE_ID.to_vec();
    bytes.push(0x00);
    let (result, events) = collect(bytes);
    assert!(
        matches!(result, Err(NutError::CorruptStream(_))),
        "{:?}",
        result
    );
    assert_eq!(events, vec![]);
}

#[test]
fn test_unknown_startcode() {
    let mut bytes = FILE_ID.to_vec();
    bytes.extend_from_slice(&[b'N', 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    let (result, _) = collect(bytes);
    assert!(
        matches!(result, Err(NutError::CorruptStream(_))),
        "{:?}",
        result
    );
}

#[test]
fn test_bad_or_missing_file_magic() {
    let mut bytes = FILE_ID.to_vec();
    bytes[0] = b'N';
    let (result, _) = collect(bytes);
    assert!(
        matches!(result, Err(NutError::CorruptStream(_))),
        "{:?}",
        result
    );

    let (result, events) = collect(Vec::new());
    assert!(
        matches!(result, Err(NutError::TruncatedStream(_))),
        "{:?}",
        result
    );
    assert_eq!(events, vec![]);
}

#[test]
fn test_clean_eof_after_headers_only() {
    let mut b = FileBuilder::new();
    b.main_header(1, &[(1, 1000)]);
    b.video_stream(0, b"ARGB", 2, 2);
    let (result, events) = collect(b.bytes());
    result.unwrap();
    assert_eq!(events, vec![Event::Stream(0, MediaKind::Video)]);
}

#[test]
fn test_coded_pts_delta_window() {
    let mut b = FileBuilder::new();
    b.main_header(1, &[(1, 1000)]);
    b.video_stream(0, b"ARGB", 2, 2);
    b.frame(0, 100, &[0xAA; 16], true); // absolute pts 100
    b.frame_raw_pts(0, 5, &[0xBB; 16]); // delta-coded against last pts

    let (result, events) = collect(b.bytes());
    result.unwrap();
    // shift 7: mask 127, delta window centered on 100 - 63 = 37, so a
    // coded value of 5 reconstructs to ((5 - 37) & 127) + 37 = 133.
    assert_eq!(
        events[2],
        Event::Frame {
            stream: 0,
            pts: 133,
            len: 16,
            key: false,
            eor: false
        }
    );
}

#[test]
fn test_pts_delta_from_frame_code_table() {
    let mut b = FileBuilder::new();
    b.main_header_custom(3, 1, &[(1, 1000)], FLAG_STREAM_ID | FLAG_SIZE_MSB, 10, &[]);
    b.audio_stream(0, b"PFD ", (48_000, 1), 2);
    b.frame_delta(0, &[0x11; 8]);
    b.frame_delta(0, &[0x22; 8]);
    b.frame_delta(0, &[0x33; 8]);

    let (result, events) = collect(b.bytes());
    result.unwrap();
    let pts: Vec<i64> = events
        .iter()
        .filter_map(|e| match e {
            Event::Frame { pts, .. } => Some(*pts),
            _ => None,
        })
        .collect();
    assert_eq!(pts, vec![10, 20, 30]);
}

#[test]
fn test_syncpoint_packets_discarded() {
    let mut b = FileBuilder::new();
    b.main_header(1, &[(1, 1000)]);
    b.video_stream(0, b"ARGB", 2, 2);
    b.frame(0, 0, &[0xAA; 16], true);
    let mut sync_body = Vec::new();
    put_var_u64(&mut sync_body, 256); // global key pts
    put_var_u64(&mut sync_body, 0); // back pointer
    b.packet(StartCode::SyncPoint, &sync_body);
    b.frame(0, 40, &[0xBB; 16], false);

    let (result, events) = collect(b.bytes());
    result.unwrap();
    assert_eq!(events.len(), 3); // one stream, two frames, nothing extra
}

#[test]
fn test_repeated_stream_header_announced_once() {
    let mut b = FileBuilder::new();
    b.main_header(1, &[(1, 1000)]);
    b.video_stream(0, b"ARGB", 2, 2);
    b.frame(0, 0, &[0xAA; 16], true);
    b.video_stream(0, b"ARGB", 2, 2); // streamed NUT repeats headers
    b.frame(0, 40, &[0xBB; 16], false);

    let (result, events) = collect(b.bytes());
    result.unwrap();
    let announced = events
        .iter()
        .filter(|e| matches!(e, Event::Stream(..)))
        .count();
    assert_eq!(announced, 1);
    assert_eq!(events.len(), 3);
}

#[test]
fn test_zero_denominator_sample_rate_rejected() {
    let mut b = FileBuilder::new();
    b.main_header(1, &[(1, 1000)]);
    b.audio_stream(0, b"PFD ", (48_000, 0), 2);

    let (result, events) = collect(b.bytes());
    assert!(
        matches!(result, Err(NutError::UnsupportedFormat(_))),
        "{:?}",
        result
    );
    assert_eq!(events, vec![]);
}

#[test]
fn test_out_of_range_time_base_id() {
    let mut b = FileBuilder::new();
    b.main_header(1, &[(1, 1000)]);
    b.video_stream_tb(0, b"ARGB", 2, 2, 5);

    let (result, events) = collect(b.bytes());
    assert!(
        matches!(result, Err(NutError::CorruptStream(_))),
        "{:?}",
        result
    );
    assert_eq!(events, vec![]);
}

#[test]
fn test_frame_header_checksum() {
    let mut b = FileBuilder::new();
    b.main_header(1, &[(1, 1000)]);
    b.video_stream(0, b"ARGB", 2, 2);
    b.frame_coded(0, 0, &[0xAA; 16], FLAG_KEY | FLAG_CHECKSUM);

    let (result, events) = collect(b.bytes());
    result.unwrap();
    assert_eq!(events.len(), 2);
}

#[test]
fn test_frame_header_checksum_mismatch() {
    let mut b = FileBuilder::new();
    b.main_header(1, &[(1, 1000)]);
    b.video_stream(0, b"ARGB", 2, 2);
    // Write the checksummed frame header by hand, with a wrong checksum.
    let mut hdr = FileBuilder::frame_header(0, FLAG_CHECKSUM, 128, 16);
    let crc = Crc32Nut::new().calculate(&hdr);
    hdr.extend_from_slice(&(crc ^ 1).to_be_bytes());
    let mut bytes = b.bytes();
    bytes.extend_from_slice(&hdr);
    bytes.extend_from_slice(&[0xAA; 16]);

    let (result, events) = collect(bytes);
    assert!(
        matches!(result, Err(NutError::CorruptStream(_))),
        "{:?}",
        result
    );
    assert_eq!(events, vec![Event::Stream(0, MediaKind::Video)]);
}

#[test]
fn test_frame_side_data() {
    let mut b = FileBuilder::new();
    b.main_header_custom(4, 1, &[(1, 1000)], GROUP_FLAGS, 0, &[]);
    b.audio_stream(0, b"PFD ", (48_000, 1), 2);
    b.frame_with_side_data(0, 0, &[0x11; 8]);

    let side = RefCell::new(Vec::new());
    let mut demuxer = NutDemuxer::new(Cursor::new(b.bytes()));
    {
        let mut handler = handlers(
            |_: &Stream| Ok(()),
            |frame: &Frame<'_>| {
                side.borrow_mut().extend(frame.side_data.iter().cloned());
                assert_eq!(frame.data.len(), 8);
                Ok(())
            },
        );
        demuxer.read(&mut handler).unwrap();
    }
    assert_eq!(
        side.into_inner(),
        vec![("lang".to_string(), MetaValue::Str("eng".to_string()))]
    );
}

#[test]
fn test_large_packet_header_checksum() {
    let mut b = FileBuilder::new();
    b.main_header(1, &[(1, 1000)]);
    b.video_stream(0, b"ARGB", 2, 2);
    // Past 4096 bytes the packet header carries its own checksum, which
    // the builder writes and the framer must verify before skipping.
    b.packet(StartCode::Info, &vec![0x5A; 5000]);
    b.frame(0, 0, &[0xAA; 16], true);

    let (result, events) = collect(b.bytes());
    result.unwrap();
    assert_eq!(events.len(), 2); // the stream and the frame, info discarded
}

#[test]
fn test_large_packet_header_checksum_mismatch() {
    let mut b = FileBuilder::new();
    b.main_header(1, &[(1, 1000)]);
    let mut bytes = b.bytes();

    // A large Info packet whose header checksum is off by one bit; body
    // and footer are otherwise valid.
    let body = vec![0x5A; 5000];
    let mut head = StartCode::Info.value().to_be_bytes().to_vec();
    put_var_u64(&mut head, body.len() as u64 + 4);
    let crc = Crc32Nut::new().calculate(&head);
    bytes.extend_from_slice(&head);
    bytes.extend_from_slice(&(crc ^ 1).to_be_bytes());
    bytes.extend_from_slice(&body);
    bytes.extend_from_slice(&Crc32Nut::new().calculate(&body).to_be_bytes());

    let (result, events) = collect(bytes);
    assert!(
        matches!(result, Err(NutError::CorruptStream(_))),
        "{:?}",
        result
    );
    assert_eq!(events, vec![]);
}

#[test]
fn test_elision_header_prefix_restored() {
    let mut b = FileBuilder::new();
    b.main_header_custom(3, 1, &[(1, 1000)], GROUP_FLAGS, 0, &[&[0x00, 0x00, 0x00, 0x01]]);
    b.audio_stream(0, b"PFD ", (48_000, 1), 2);
    // 8 bytes total, of which the first 4 are elided into the header.
    b.frame_elided(0, 0, 8, &[0x11, 0x22, 0x33, 0x44], 1);

    let payloads = RefCell::new(Vec::new());
    let mut demuxer = NutDemuxer::new(Cursor::new(b.bytes()));
    {
        let mut handler = handlers(
            |_: &Stream| Ok(()),
            |frame: &Frame<'_>| {
                payloads.borrow_mut().push(frame.data.to_vec());
                Ok(())
            },
        );
        demuxer.read(&mut handler).unwrap();
    }
    assert_eq!(
        payloads.into_inner(),
        vec![vec![0x00, 0x00, 0x00, 0x01, 0x11, 0x22, 0x33, 0x44]]
    );
}

#[test]
fn test_frame_smaller_than_elision_prefix() {
    let mut b = FileBuilder::new();
    b.main_header_custom(3, 1, &[(1, 1000)], GROUP_FLAGS, 0, &[&[0x00, 0x00, 0x00, 0x01]]);
    b.audio_stream(0, b"PFD ", (48_000, 1), 2);
    b.frame_elided(0, 0, 2, &[], 1); // declares fewer bytes than the prefix

    let (result, events) = collect(b.bytes());
    assert!(
        matches!(result, Err(NutError::CorruptStream(_))),
        "{:?}",
        result
    );
    assert_eq!(events, vec![Event::Stream(0, MediaKind::Audio)]);
}

#[test]
fn test_zero_stream_main_header_rejected() {
    let mut b = FileBuilder::new();
    b.main_header(0, &[(1, 1000)]);

    let (result, events) = collect(b.bytes());
    assert!(
        matches!(result, Err(NutError::CorruptStream(_))),
        "{:?}",
        result
    );
    assert_eq!(events, vec![]);
}
