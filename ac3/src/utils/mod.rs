//! Utility functions and supporting infrastructure.
//!
//! Provides bitstream reading, CRC validation and error types.

pub mod bitstream_io;
pub mod crc;
pub mod errors;
