//! Channel configuration and output flag word.
//!
//! The same flag word travels through the whole pipeline: the header parser
//! reports the coded configuration in it, the setup callback answers with the
//! requested output configuration, and the decode engine may rewrite it with
//! the configuration it actually produced.

use std::fmt::Display;
use std::ops::{BitOr, BitOrAssign};

/// Audio coding mode (`acmod`) as coded in the bitstream information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodingMode {
    /// 1+1, two independent mono channels.
    DualMono,
    Mono,
    Stereo,
    ThreeFront,
    TwoFrontOneRear,
    ThreeFrontOneRear,
    TwoFrontTwoRear,
    ThreeFrontTwoRear,
}

impl AudioCodingMode {
    pub fn from_acmod(acmod: u8) -> Self {
        match acmod & 7 {
            0 => Self::DualMono,
            1 => Self::Mono,
            2 => Self::Stereo,
            3 => Self::ThreeFront,
            4 => Self::TwoFrontOneRear,
            5 => Self::ThreeFrontOneRear,
            6 => Self::TwoFrontTwoRear,
            _ => Self::ThreeFrontTwoRear,
        }
    }

    pub fn acmod(self) -> u8 {
        self as u8
    }

    /// Centre channel present alongside left/right, so `cmixlev` is coded.
    pub fn has_center_mix(self) -> bool {
        let acmod = self.acmod();
        acmod & 1 != 0 && acmod != 1
    }

    /// Surround channels present, so `surmixlev` is coded.
    pub fn has_surround(self) -> bool {
        self.acmod() & 4 != 0
    }

    pub fn full_bandwidth_channels(self) -> usize {
        [2, 1, 2, 3, 3, 4, 4, 5][self as usize]
    }
}

impl Display for AudioCodingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DualMono => "1+1 (dual mono)",
            Self::Mono => "1/0 (mono)",
            Self::Stereo => "2/0 (stereo)",
            Self::ThreeFront => "3/0",
            Self::TwoFrontOneRear => "2/1",
            Self::ThreeFrontOneRear => "3/1",
            Self::TwoFrontTwoRear => "2/2",
            Self::ThreeFrontTwoRear => "3/2",
        };
        write!(f, "{name}")
    }
}

/// Channel configuration and mode bits exchanged with the decode engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputFlags(pub u32);

impl OutputFlags {
    pub const CHANNEL: Self = Self(0);
    pub const MONO: Self = Self(1);
    pub const STEREO: Self = Self(2);
    pub const THREE_F: Self = Self(3);
    pub const TWO_F_ONE_R: Self = Self(4);
    pub const THREE_F_ONE_R: Self = Self(5);
    pub const TWO_F_TWO_R: Self = Self(6);
    pub const THREE_F_TWO_R: Self = Self(7);
    pub const CHANNEL1: Self = Self(8);
    pub const CHANNEL2: Self = Self(9);
    pub const DOLBY: Self = Self(10);

    pub const CHANNEL_MASK: u32 = 15;
    pub const LFE: Self = Self(16);
    pub const ADJUST_LEVEL: Self = Self(32);

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Channel configuration with the LFE and mode bits stripped.
    pub fn channels(self) -> Self {
        Self(self.0 & Self::CHANNEL_MASK)
    }

    pub fn has_lfe(self) -> bool {
        self.0 & Self::LFE.0 != 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Number of channel blocks the engine delivers per audio block, LFE
    /// included. `None` for configuration values outside the known set.
    pub fn channel_count(self) -> Option<usize> {
        let full = match self.channels().0 {
            0 => 2,
            1 => 1,
            2 => 2,
            3 | 4 => 3,
            5 | 6 => 4,
            7 => 5,
            8 | 9 => 1,
            10 => 2,
            _ => return None,
        };

        Some(full + usize::from(self.has_lfe()))
    }
}

impl BitOr for OutputFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OutputFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Display for OutputFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.channels().0 {
            0 => "1+1",
            1 => "mono",
            2 => "stereo",
            3 => "3/0",
            4 => "2/1",
            5 => "3/1",
            6 => "2/2",
            7 => "3/2",
            8 => "channel 1",
            9 => "channel 2",
            10 => "Dolby Surround",
            _ => "unknown",
        };
        write!(f, "{name}")?;
        if self.has_lfe() {
            write!(f, " + LFE")?;
        }

        Ok(())
    }
}

#[test]
fn channel_counts() {
    assert_eq!(OutputFlags::STEREO.channel_count(), Some(2));
    assert_eq!(OutputFlags::DOLBY.channel_count(), Some(2));
    assert_eq!(
        (OutputFlags::THREE_F_TWO_R | OutputFlags::LFE).channel_count(),
        Some(6)
    );
    assert_eq!(
        (OutputFlags::STEREO | OutputFlags::ADJUST_LEVEL).channel_count(),
        Some(2)
    );
    assert_eq!(OutputFlags(11).channel_count(), None);

    assert_eq!(
        (OutputFlags::TWO_F_TWO_R | OutputFlags::LFE).to_string(),
        "2/2 + LFE"
    );
}

#[test]
fn coding_mode_fields() {
    assert!(!AudioCodingMode::Mono.has_center_mix());
    assert!(AudioCodingMode::ThreeFront.has_center_mix());
    assert!(!AudioCodingMode::ThreeFront.has_surround());
    assert!(AudioCodingMode::TwoFrontOneRear.has_surround());
    assert_eq!(AudioCodingMode::from_acmod(7).full_bandwidth_channels(), 5);
    assert_eq!(AudioCodingMode::from_acmod(2).acmod(), 2);
}
