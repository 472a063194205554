use super::io::NutInput;
use crate::error::{NutError, Result};
use std::io::Read;

/// The magic at offset 0 of every NUT stream: "nut/multimedia container\0".
pub const FILE_ID: &[u8; 25] = b"nut/multimedia container\0";

/// Packets with a payload longer than this carry an extra checksum over
/// their header.
const CHECKSUMMED_HEADER_THRESHOLD: u64 = 4096;

/// The 64-bit startcodes introducing non-frame packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartCode {
    Main,
    Stream,
    SyncPoint,
    Index,
    Info,
}

impl StartCode {
    pub fn from_u64(code: u64) -> Option<StartCode> {
        match code {
            0x4E4D_7A56_1F5F_04AD => Some(StartCode::Main),
            0x4E53_1140_5BF2_F9DB => Some(StartCode::Stream),
            0x4E4B_E4AD_EECA_4569 => Some(StartCode::SyncPoint),
            0x4E58_DD67_2F23_E64E => Some(StartCode::Index),
            0x4E49_AB68_B596_BA78 => Some(StartCode::Info),
            _ => None,
        }
    }

    pub const fn value(self) -> u64 {
        match self {
            StartCode::Main => 0x4E4D_7A56_1F5F_04AD,
            StartCode::Stream => 0x4E53_1140_5BF2_F9DB,
            StartCode::SyncPoint => 0x4E4B_E4AD_EECA_4569,
            StartCode::Index => 0x4E58_DD67_2F23_E64E,
            StartCode::Info => 0x4E49_AB68_B596_BA78,
        }
    }
}

/// The framing common to every startcode packet: the startcode itself, a
/// forward pointer to the packet's end, and for large packets a checksum
/// over the header.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PacketHeader {
    pub startcode: u64,
    pub forward_ptr: u64,
    /// Source offset of the packet footer (the trailing body checksum).
    pub end: u64,
}

impl PacketHeader {
    /// Reads the packet header. The caller has already consumed the
    /// startcode; the running CRC must cover it so that the header
    /// checksum, when present, can be verified.
    pub fn read<R: Read>(input: &mut NutInput<R>, startcode: u64) -> Result<Self> {
        let forward_ptr = input.read_var_u64()?;
        if forward_ptr > CHECKSUMMED_HEADER_THRESHOLD {
            let expected = input.crc();
            let checksum = input.read_u32_be()?;
            if checksum != expected {
                return Err(NutError::CorruptStream(format!(
                    "invalid header checksum {:08X} want {:08X}",
                    checksum, expected
                )));
            }
        }
        input.reset_crc();
        if forward_ptr < 4 {
            return Err(NutError::CorruptStream(format!(
                "forward_ptr {} leaves no room for the packet footer",
                forward_ptr
            )));
        }
        Ok(PacketHeader {
            startcode,
            forward_ptr,
            end: input.offset() + forward_ptr - 4,
        })
    }

    /// Skips whatever remains of the packet body.
    pub fn skip_to_footer<R: Read>(&self, input: &mut NutInput<R>) -> Result<()> {
        let current = input.offset();
        if current > self.end {
            return Err(NutError::CorruptStream(format!(
                "packet body overran its forward_ptr: at {} end {}",
                current, self.end
            )));
        }
        input.skip(self.end - current)
    }
}

/// Reads the packet footer and verifies the body checksum. A mismatch is
/// fatal: the session is torn down rather than resynchronized.
pub(crate) fn read_footer<R: Read>(input: &mut NutInput<R>) -> Result<()> {
    let expected = input.crc();
    let checksum = input.read_u32_be()?;
    if checksum != expected {
        return Err(NutError::CorruptStream(format!(
            "invalid packet checksum {:08X} want {:08X}",
            checksum, expected
        )));
    }
    input.reset_crc();
    Ok(())
}

/// Frames, checksum-verifies and discards a whole packet. Used for the
/// packet types this forward-only reader has no use for (syncpoints,
/// index, info).
pub(crate) fn skip_packet<R: Read>(input: &mut NutInput<R>, startcode: u64) -> Result<()> {
    let header = PacketHeader::read(input, startcode)?;
    header.skip_to_footer(input)?;
    read_footer(input)
}
