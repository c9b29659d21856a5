//! Sync frame header.
//!
//! ## Layout
//!
//! Every AC-3 sync frame opens with `syncinfo` followed by the start of
//! `bsi`. The first [`PREFIX_LEN`] bytes are always enough to locate the
//! frame and compute its length:
//!
//! | field        | bits | notes                                   |
//! |--------------|------|-----------------------------------------|
//! | syncword     | 16   | 0x0B77                                  |
//! | crc1         | 16   |                                         |
//! | fscod        | 2    | 48 / 44.1 / 32 kHz, 3 reserved          |
//! | frmsizecod   | 6    | bit rate index and 44.1 kHz padding     |
//! | bsid         | 5    | 9..=11 are reduced sample rate variants |
//! | bsmod        | 3    |                                         |
//! | acmod        | 3    |                                         |
//! | cmixlev      | 2    | 3 front channels only                   |
//! | surmixlev    | 2    | surround channels only                  |
//! | dsurmod      | 2    | 2/0 only                                |
//! | lfeon        | 1    |                                         |

use std::io;

use crate::structs::channel::{AudioCodingMode, OutputFlags};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::SyncError;

pub const SYNC_WORD: u16 = 0x0B77;

/// Bytes needed to parse a header.
pub const PREFIX_LEN: usize = 7;

/// Largest sync frame (640 kbps at 32 kHz).
pub const MAX_FRAME_LEN: usize = 3840;

pub const BLOCKS_PER_FRAME: usize = 6;
pub const SAMPLES_PER_BLOCK: usize = 256;
pub const SAMPLES_PER_FRAME: usize = BLOCKS_PER_FRAME * SAMPLES_PER_BLOCK;

/// Nominal bit rates in kbps, indexed by `frmsizecod >> 1`.
pub const BIT_RATES_KBPS: [u32; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];

/// Parsed sync frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub sample_rate: u32,
    /// Bit rate in bits per second.
    pub bit_rate: u32,
    pub flags: OutputFlags,
    pub frame_len: usize,

    pub fscod: u8,
    pub frmsizecod: u8,
    pub bsid: u8,
    pub bsmod: u8,
    pub acmod: AudioCodingMode,
    pub dsurmod: Option<u8>,
    pub lfe: bool,
}

impl FrameHeader {
    /// Parses the header at the start of `prefix`.
    ///
    /// Only the first [`PREFIX_LEN`] bytes are looked at. Any failure means
    /// the bytes are not the start of a frame.
    pub fn parse(prefix: &[u8]) -> Result<Self, SyncError> {
        if prefix.len() < PREFIX_LEN {
            return Err(SyncError::Truncated(prefix.len()));
        }

        let reader = &mut BsIoSliceReader::from_slice(&prefix[..PREFIX_LEN]);
        Self::read(reader).map_err(|_| SyncError::Truncated(prefix.len()))?
    }

    fn read(reader: &mut BsIoSliceReader) -> io::Result<Result<Self, SyncError>> {
        let sync_word: u16 = reader.get_n(16)?;
        if sync_word != SYNC_WORD {
            return Ok(Err(SyncError::InvalidSyncWord(sync_word)));
        }

        reader.skip_n(16)?; // crc1

        let fscod: u8 = reader.get_n(2)?;
        let frmsizecod: u8 = reader.get_n(6)?;
        let bsid: u8 = reader.get_n(5)?;
        let bsmod: u8 = reader.get_n(3)?;
        let acmod = AudioCodingMode::from_acmod(reader.get_n(3)?);

        if bsid >= 12 {
            return Ok(Err(SyncError::UnsupportedBsid(bsid)));
        }

        if frmsizecod >= 38 {
            return Ok(Err(SyncError::InvalidFrameSizeCode(frmsizecod)));
        }

        if acmod.has_center_mix() {
            reader.skip_n(2)?; // cmixlev
        }

        if acmod.has_surround() {
            reader.skip_n(2)?; // surmixlev
        }

        let dsurmod = if acmod == AudioCodingMode::Stereo {
            Some(reader.get_n::<u8>(2)?)
        } else {
            None
        };

        let lfe = reader.get()?;

        let Some(frame_len) = frame_len(fscod, frmsizecod) else {
            return Ok(Err(SyncError::ReservedSampleRateCode));
        };

        let shift = bsid.saturating_sub(8);
        let base_rate = BIT_RATES_KBPS[(frmsizecod >> 1) as usize];
        let sample_rate = [48000, 44100, 32000][fscod as usize] >> shift;

        let mut flags = if dsurmod == Some(2) {
            OutputFlags::DOLBY
        } else {
            OutputFlags(acmod.acmod() as u32)
        };
        if lfe {
            flags |= OutputFlags::LFE;
        }

        Ok(Ok(Self {
            sample_rate,
            bit_rate: (base_rate * 1000) >> shift,
            flags,
            frame_len,
            fscod,
            frmsizecod,
            bsid,
            bsmod,
            acmod,
            dsurmod,
            lfe,
        }))
    }

    pub fn bit_rate_kbps(&self) -> u32 {
        self.bit_rate / 1000
    }

    /// Number of PCM sample frames one sync frame decodes to.
    pub fn samples(&self) -> usize {
        SAMPLES_PER_FRAME
    }

    /// Reduced sample rate variants signal themselves through `bsid`.
    pub fn is_half_rate(&self) -> bool {
        self.bsid > 8
    }
}

/// Frame length in bytes for a sample rate code and frame size code.
///
/// At 44.1 kHz the odd `frmsizecod` of each pair carries one extra padding
/// word.
pub fn frame_len(fscod: u8, frmsizecod: u8) -> Option<usize> {
    let rate = *BIT_RATES_KBPS.get((frmsizecod >> 1) as usize)? as usize;

    match fscod {
        0 => Some(4 * rate),
        1 => Some(2 * (320 * rate / 147 + (frmsizecod & 1) as usize)),
        2 => Some(6 * rate),
        _ => None,
    }
}
