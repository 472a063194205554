//! # Utility Functions and Types
//!
//! Shared helpers used throughout the nutio library.
//!
//! ## CRC Calculation
//!
//! The crc module provides the CRC32 variant the NUT container uses for
//! its packet and frame checksums:
//!
//! ```rust
//! use nutio::utils::Crc32Nut;
//!
//! # fn main() {
//! let crc = Crc32Nut::new();
//! let checksum = crc.calculate(b"Hello, world!");
//! println!("CRC32: {:08x}", checksum);
//! # }
//! ```

/// CRC32 calculation for NUT checksums
pub mod crc;

pub use crc::Crc32Nut;
