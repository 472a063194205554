use super::frame::{read_frame, Frame, Stream};
use super::header::{MainHeader, StreamHeader};
use super::io::{Code, NutInput};
use super::packet::{skip_packet, StartCode, FILE_ID};
use crate::error::{NutError, Result};
use log::{debug, trace};
use std::io::Read;

/// The error type caller-supplied handlers may fail with. It is wrapped
/// in [`NutError::Callback`] and terminates the read loop immediately.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// The two events a demux session produces.
///
/// Both callbacks run synchronously on the thread driving
/// [`NutDemuxer::read`], in arrival order. Every `on_stream` for a given
/// stream happens before any `on_frame` referencing it, and frames within
/// a stream arrive in the order they were parsed. Returning an error from
/// either aborts the session; no further callbacks fire.
pub trait NutHandler {
    /// A new stream was declared.
    fn on_stream(&mut self, stream: &Stream) -> std::result::Result<(), CallbackError>;

    /// A frame was decoded.
    fn on_frame(&mut self, frame: &Frame<'_>) -> std::result::Result<(), CallbackError>;
}

/// Builds a [`NutHandler`] from two independent closures, for callers
/// that do not want a handler type of their own.
///
/// ```
/// use nutio::format::nut::handlers;
///
/// let mut frames = 0u64;
/// let mut handler = handlers(
///     |stream| {
///         println!("stream {}", stream.index());
///         Ok(())
///     },
///     |frame| {
///         frames += 1;
///         println!("pts {} ({} bytes)", frame.pts, frame.data.len());
///         Ok(())
///     },
/// );
/// # let _ = &mut handler;
/// ```
pub fn handlers<S, F>(on_stream: S, on_frame: F) -> impl NutHandler
where
    S: FnMut(&Stream) -> std::result::Result<(), CallbackError>,
    F: FnMut(&Frame<'_>) -> std::result::Result<(), CallbackError>,
{
    struct FnHandler<S, F> {
        on_stream: S,
        on_frame: F,
    }

    impl<S, F> NutHandler for FnHandler<S, F>
    where
        S: FnMut(&Stream) -> std::result::Result<(), CallbackError>,
        F: FnMut(&Frame<'_>) -> std::result::Result<(), CallbackError>,
    {
        fn on_stream(&mut self, stream: &Stream) -> std::result::Result<(), CallbackError> {
            (self.on_stream)(stream)
        }

        fn on_frame(&mut self, frame: &Frame<'_>) -> std::result::Result<(), CallbackError> {
            (self.on_frame)(frame)
        }
    }

    FnHandler {
        on_stream,
        on_frame,
    }
}

/// Streaming demuxer for the FFmpeg NUT container format.
///
/// Reads a forward-only byte stream, typically the stdout pipe of a live
/// `ffmpeg -f nut` process, and dispatches declared streams and decoded
/// frames to a [`NutHandler`]. The read loop is blocking and pull-based:
/// it stalls wherever the underlying source stalls, which is the intended
/// backpressure against a live encoder. The demuxer never owns the
/// source; the caller opens it beforehand and closes it after the loop
/// returns.
///
/// Seeking, resynchronization after corruption, and interpretation of
/// compressed payloads are all out of scope: any framing or checksum
/// violation tears the session down with a typed error.
pub struct NutDemuxer<R: Read> {
    input: NutInput<R>,
    main: Option<MainHeader>,
    streams: Vec<Stream>,
}

impl<R: Read> NutDemuxer<R> {
    /// Creates a demuxer over a byte source positioned at the start of
    /// the container.
    pub fn new(reader: R) -> Self {
        NutDemuxer {
            input: NutInput::new(reader),
            main: None,
            streams: Vec::new(),
        }
    }

    /// The streams declared so far.
    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    /// The container's main header, once one has been parsed.
    pub fn main_header(&self) -> Option<&MainHeader> {
        self.main.as_ref()
    }

    /// Demuxes the source to exhaustion, dispatching every declared
    /// stream and decoded frame to `handler` in arrival order.
    ///
    /// Returns `Ok(())` when the source ends cleanly at a packet
    /// boundary. Every error is terminal for the session: no further
    /// callbacks fire and no partial results are produced. One session
    /// reads one container; create a new demuxer for a new source.
    pub fn read<H: NutHandler>(&mut self, handler: &mut H) -> Result<()> {
        self.read_file_id()?;
        loop {
            self.input.reset_crc();
            let code = match self.input.read_code()? {
                Some(code) => code,
                None => return Ok(()),
            };
            match code {
                Code::Frame(fc) => {
                    let main = self.main.as_ref().ok_or_else(|| {
                        NutError::CorruptStream("frame before main header".to_string())
                    })?;
                    let info = read_frame(&mut self.input, main, &mut self.streams, fc)?;
                    let frame = Frame {
                        stream: &self.streams[info.stream_id],
                        flags: info.flags,
                        pts: info.pts,
                        data: info.data,
                        side_data: info.side_data,
                        meta_data: info.meta_data,
                    };
                    trace!(
                        "frame: stream {} pts {} ({} bytes)",
                        info.stream_id,
                        frame.pts,
                        frame.data.len()
                    );
                    handler.on_frame(&frame).map_err(NutError::Callback)?;
                }
                Code::Start(sc) => match StartCode::from_u64(sc) {
                    None => {
                        return Err(NutError::CorruptStream(format!(
                            "unknown startcode {:016X}",
                            sc
                        )));
                    }
                    Some(StartCode::Main) => {
                        self.main = Some(MainHeader::read(&mut self.input, sc)?);
                    }
                    Some(StartCode::Stream) => self.read_stream_header(sc, handler)?,
                    Some(other) => {
                        // Syncpoints, index and info packets carry nothing
                        // a forward-only reader needs; verify and discard.
                        skip_packet(&mut self.input, sc)?;
                        trace!("discarded {:?} packet", other);
                    }
                },
            }
        }
    }

    fn read_file_id(&mut self) -> Result<()> {
        let mut magic = [0u8; FILE_ID.len()];
        self.input.fill(&mut magic)?;
        if &magic != FILE_ID {
            return Err(NutError::CorruptStream(format!(
                "file id mismatch, got {:?}",
                String::from_utf8_lossy(&magic)
            )));
        }
        Ok(())
    }

    fn read_stream_header<H: NutHandler>(&mut self, startcode: u64, handler: &mut H) -> Result<()> {
        let main = self.main.as_ref().ok_or_else(|| {
            NutError::CorruptStream("stream header before main header".to_string())
        })?;
        let header = StreamHeader::read(&mut self.input, startcode)?;
        if header.id < self.streams.len() {
            // Streamed NUT repeats its headers; the stream was already
            // announced, so this declaration carries nothing new.
            trace!("ignoring repeated header for stream {}", header.id);
            return Ok(());
        }
        if header.id != self.streams.len() {
            return Err(NutError::CorruptStream(format!(
                "stream {} declared out of order, expected {}",
                header.id,
                self.streams.len()
            )));
        }
        debug!(
            "stream {}: {:?} fourcc {:?}",
            header.id,
            header.kind,
            String::from_utf8_lossy(&header.fourcc)
        );
        let stream = Stream::new(main, header)?;
        self.streams.push(stream);
        let announced = &self.streams[self.streams.len() - 1];
        handler.on_stream(announced).map_err(NutError::Callback)
    }
}
