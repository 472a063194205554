use crate::error::{NutError, Result};
use crate::utils::Crc32Nut;
use std::io::{ErrorKind, Read};

/// Largest var-int prefixed array the reader will allocate for. Real
/// streams keep codec-specific data and elision headers far below this;
/// anything larger means the framing is wrong.
const MAX_VAR_ARRAY: u64 = 1 << 26;

/// The code introducing the next unit in the stream: either a one-byte
/// frame code, or a 64-bit startcode beginning with `'N'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Code {
    /// A frame packet, identified by its frame-code byte.
    Frame(u8),
    /// A full 64-bit startcode.
    Start(u64),
}

/// A forward-only byte source with the primitives the NUT format is built
/// from: var-ints, var-int prefixed arrays, startcodes, and a running
/// CRC32 over every byte read.
///
/// The CRC accumulates across reads and is reset at checksum-range
/// boundaries by the packet and frame parsers, so that `crc()` at a
/// checksum field yields exactly the value the muxer wrote.
pub(crate) struct NutInput<R: Read> {
    reader: R,
    crc: Crc32Nut,
    running: u32,
    offset: u64,
}

impl<R: Read> NutInput<R> {
    pub fn new(reader: R) -> Self {
        NutInput {
            reader,
            crc: Crc32Nut::new(),
            running: 0,
            offset: 0,
        }
    }

    /// Bytes consumed from the source so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Current value of the running checksum.
    pub fn crc(&self) -> u32 {
        self.running
    }

    /// Starts a fresh checksum range at the current position.
    pub fn reset_crc(&mut self) {
        self.running = 0;
    }

    fn note(&mut self, bytes: &[u8]) {
        self.running = self.crc.update(self.running, bytes);
        self.offset += bytes.len() as u64;
    }

    fn truncated(&self, what: &str) -> NutError {
        NutError::TruncatedStream(format!("source ended at offset {} ({})", self.offset, what))
    }

    /// Reads one byte, returning `None` on a clean end of source.
    fn read_byte_or_eof(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.note(&buf);
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(NutError::Io(e)),
            }
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        match self.read_byte_or_eof()? {
            Some(b) => Ok(b),
            None => Err(self.truncated("expected one more byte")),
        }
    }

    /// Reads exactly `buf.len()` bytes.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.reader.read_exact(buf) {
            Ok(()) => {
                self.note(buf);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                Err(self.truncated(&format!("expected {} more bytes", buf.len())))
            }
            Err(e) => Err(NutError::Io(e)),
        }
    }

    /// Discards `n` bytes, keeping them in the running checksum.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let mut scratch = [0u8; 4096];
        let mut left = n;
        while left > 0 {
            let chunk = left.min(scratch.len() as u64) as usize;
            self.fill(&mut scratch[..chunk])?;
            left -= chunk as u64;
        }
        Ok(())
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Reads an unsigned var-int: big-endian groups of 7 data bits, the
    /// high bit of each byte flagging continuation.
    pub fn read_var_u64(&mut self) -> Result<u64> {
        let mut result: u64 = 0;
        loop {
            let b = self.read_u8()?;
            if result > (u64::MAX >> 7) {
                return Err(NutError::CorruptStream(format!(
                    "var-int overflows 64 bits at offset {}",
                    self.offset
                )));
            }
            result = (result << 7) | (b & 0x7F) as u64;
            if b & 0x80 == 0 {
                return Ok(result);
            }
        }
    }

    /// Reads a signed var-int using the format's zig-zag style mapping.
    pub fn read_var_i64(&mut self) -> Result<i64> {
        let temp = self.read_var_u64()?.checked_add(1).ok_or_else(|| {
            NutError::CorruptStream(format!(
                "signed var-int overflows 64 bits at offset {}",
                self.offset
            ))
        })?;
        if temp & 1 == 1 {
            Ok(-((temp >> 1) as i64))
        } else {
            Ok((temp >> 1) as i64)
        }
    }

    /// Reads a var-int prefixed byte array.
    pub fn read_var_array(&mut self) -> Result<Vec<u8>> {
        let len = self.read_var_u64()?;
        if len > MAX_VAR_ARRAY {
            return Err(NutError::CorruptStream(format!(
                "implausible array length {} at offset {}",
                len, self.offset
            )));
        }
        let mut data = vec![0u8; len as usize];
        self.fill(&mut data)?;
        Ok(data)
    }

    /// Reads the next frame code or startcode. `None` means the source
    /// ended cleanly at a packet boundary.
    pub fn read_code(&mut self) -> Result<Option<Code>> {
        let first = match self.read_byte_or_eof()? {
            Some(b) => b,
            None => return Ok(None),
        };
        if first != b'N' {
            return Ok(Some(Code::Frame(first)));
        }
        let mut tail = [0u8; 7];
        self.fill(&mut tail)?;
        let mut code = (first as u64) << 56;
        for (i, b) in tail.iter().enumerate() {
            code |= (*b as u64) << (8 * (6 - i));
        }
        Ok(Some(Code::Start(code)))
    }
}
