use thiserror::Error;

/// Errors raised while demuxing a NUT stream.
///
/// Every variant is fatal to the read loop that raised it: the demuxer
/// performs no internal retries and fires no further callbacks once an
/// error has been returned. Recovery (reopening the pipe, relaunching the
/// encoder) is the caller's responsibility.
#[derive(Error, Debug)]
pub enum NutError {
    /// The byte source ended in the middle of a packet.
    #[error("truncated stream: {0}")]
    TruncatedStream(String),

    /// The stream violated the container format, including any checksum
    /// mismatch. Corruption usually means the encoder was configured to
    /// emit something other than NUT on this pipe.
    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    /// A frame referenced a stream id that was never declared.
    #[error("unknown stream id {0}")]
    UnknownStream(usize),

    /// A recognized but unhandled codec tag or pixel layout.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// An error propagated out of a caller-supplied handler.
    #[error("callback error: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A non-EOF I/O failure on the underlying byte source.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NutError>;
