#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Stream front end for AC-3 (Dolby Digital, ATSC A/52) elementary streams.
//!
//! ### Bitstream Organization
//!
//! **Sync frames**: self-delimited units opening with the 0x0B77 sync word.
//! The first seven bytes give the sample rate, bit rate and channel mode,
//! which together fix the frame length.
//! **Blocks**: every frame carries six audio blocks of 256 samples per
//! channel.
//!
//! ### Stream Recovery
//!
//! Input may arrive in chunks of any size and may contain garbage. Headers
//! that fail validation cost one byte each until the stream realigns. Frames
//! rejected by CRC verification, setup, decoding or the sink are dropped
//! without stopping the stream.
//!
//! ## Quick Start
//!
//! 1. Implement [`process::engine::DecodeEngine`] over the block decoder
//! 2. Open a [`process::session::Session`] with a setup policy and a sink
//! 3. Run it over any [`std::io::Read`]
//!
//! ```rust
//! use ac3::process::engine::{DecodeEngine, FixedSetup};
//! use ac3::process::session::{Session, StreamConfig};
//! use ac3::structs::channel::OutputFlags;
//! use ac3::utils::errors::EngineError;
//!
//! #[derive(Default)]
//! struct Silence(Vec<f32>);
//!
//! impl DecodeEngine for Silence {
//!     fn frame(
//!         &mut self,
//!         _frame: &[u8],
//!         _flags: &mut OutputFlags,
//!         _level: &mut f32,
//!         bias: f32,
//!     ) -> Result<(), EngineError> {
//!         self.0 = vec![bias; 6 * 256];
//!         Ok(())
//!     }
//!
//!     fn block(&mut self) -> Result<(), EngineError> {
//!         Ok(())
//!     }
//!
//!     fn samples(&self) -> &[f32] {
//!         &self.0
//!     }
//! }
//!
//! let mut session = Session::open(
//!     StreamConfig::default(),
//!     || Ok(Silence::default()),
//!     FixedSetup::default(),
//!     Vec::new(),
//! )?;
//!
//! let stats = session.run(&[0u8; 1000][..])?;
//! assert_eq!(stats.frames_decoded, 0);
//!
//! let (pcm, _) = session.close();
//! assert!(pcm.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Stream processing: accumulation, extraction, dispatch and conversion.
///
/// 1. **Accumulation** ([`process::accumulate`]): Collects header prefixes
///    and whole frames from arbitrarily sized chunks.
///
/// 2. **Extraction** ([`process::extract`]): Validates headers, resyncs and
///    optionally verifies CRCs.
///
/// 3. **Dispatch** ([`process::dispatch`]): Runs setup, the decode engine and
///    the sink for every frame.
///
/// 4. **Session** ([`process::session`]): Owns the engine and reads the byte
///    source.
pub mod process;

/// Data structures describing sync frames.
///
/// - **Headers** ([`structs::header`]): Sync frame header fields and lengths
/// - **Channels** ([`structs::channel`]): Coding modes and output flags
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **CRC Validation** ([`utils::crc`]): Error detection
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
