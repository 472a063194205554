/// CRC32 implementation for NUT container checksums.
/// Generator polynomial: x32 + x26 + x23 + x22 + x16 + x12 + x11 + x10 + x8 + x7 + x5 + x4 + x2 + x + 1
/// Initial value: 0 (the NUT variant; MPEG-2 PSI uses the same polynomial
/// with an all-ones initial state)

const CRC32_POLY: u32 = 0x04C11DB7;

/// CRC32 calculator used to validate NUT packet headers, packet footers
/// and frame headers.
///
/// The NUT container specifies an MSB-first CRC32 with the ITU polynomial
/// and a zero initial register, applied over whole byte ranges with no
/// final inversion.
pub struct Crc32Nut {
    /// Lookup table for fast CRC calculation
    table: [u32; 256],
}

impl Crc32Nut {
    /// Creates a new CRC32 calculator with a pre-computed lookup table.
    pub fn new() -> Self {
        let mut table = [0u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut crc = (i as u32) << 24;
            for _ in 0..8 {
                crc = if (crc & 0x8000_0000) != 0 {
                    (crc << 1) ^ CRC32_POLY
                } else {
                    crc << 1
                };
            }
            *entry = crc;
        }
        Self { table }
    }

    /// Folds `data` into a running checksum and returns the new value.
    ///
    /// Start from `0` for a fresh NUT checksum range.
    pub fn update(&self, crc: u32, data: &[u8]) -> u32 {
        let mut crc = crc;
        for &byte in data {
            let index = ((crc >> 24) ^ (byte as u32)) & 0xFF;
            crc = (crc << 8) ^ self.table[index as usize];
        }
        crc
    }

    /// Calculates the checksum of `data` as a single range.
    pub fn calculate(&self, data: &[u8]) -> u32 {
        self.update(0, data)
    }
}

impl Default for Crc32Nut {
    fn default() -> Self {
        Self::new()
    }
}
