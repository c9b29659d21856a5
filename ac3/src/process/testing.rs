//! Synthetic streams and collaborators for tests.

use crate::process::convert::BIAS_BITS;
use crate::process::engine::{DecodeEngine, PcmSink};
use crate::structs::channel::{AudioCodingMode, OutputFlags};
use crate::structs::header::{SAMPLES_PER_BLOCK, frame_len};
use crate::utils::crc::{CRC_SYNC_FRAME_ALG, Crc16, crc1_region_end};
use crate::utils::errors::{EngineError, SinkError};

/// Builds sync frames with valid headers and both CRC words.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    fscod: u8,
    frmsizecod: u8,
    bsid: u8,
    acmod: u8,
    dsurmod: u8,
    lfe: bool,
    seed: u8,
}

impl Default for FrameBuilder {
    /// 48 kHz, 128 kbps, 2/0: 512 bytes.
    fn default() -> Self {
        Self {
            fscod: 0,
            frmsizecod: 16,
            bsid: 8,
            acmod: 2,
            dsurmod: 0,
            lfe: false,
            seed: 0,
        }
    }
}

impl FrameBuilder {
    pub fn fscod(mut self, fscod: u8) -> Self {
        self.fscod = fscod;
        self
    }

    pub fn frmsizecod(mut self, frmsizecod: u8) -> Self {
        self.frmsizecod = frmsizecod;
        self
    }

    pub fn acmod(mut self, acmod: u8) -> Self {
        self.acmod = acmod;
        self
    }

    pub fn lfe(mut self, lfe: bool) -> Self {
        self.lfe = lfe;
        self
    }

    pub fn seed(mut self, seed: u8) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let len = frame_len(self.fscod, self.frmsizecod).unwrap();
        let mut frame = vec![0u8; len];

        frame[0] = 0x0B;
        frame[1] = 0x77;
        frame[4] = (self.fscod << 6) | self.frmsizecod;
        frame[5] = self.bsid << 3;

        let mode = AudioCodingMode::from_acmod(self.acmod);
        let (mut bits, mut n) = (self.acmod as u32, 3);
        if mode.has_center_mix() {
            (bits, n) = (bits << 2, n + 2);
        }
        if mode.has_surround() {
            (bits, n) = (bits << 2, n + 2);
        }
        if mode == AudioCodingMode::Stereo {
            (bits, n) = ((bits << 2) | self.dsurmod as u32, n + 2);
        }
        (bits, n) = ((bits << 1) | self.lfe as u32, n + 1);
        frame[6] = (bits << (8 - n)) as u8;

        for (i, byte) in frame[7..len - 2].iter_mut().enumerate() {
            let value = ((i * 7 + self.seed as usize * 13) % 251) as u8;
            *byte = if value == 0x0B { 0x0C } else { value };
        }

        let crc = Crc16::new(&CRC_SYNC_FRAME_ALG);

        // crc1 leads its region, so the remainder of the rest is divided
        // back by x once per following bit
        let end1 = crc1_region_end(len);
        let mut crc1 = crc.remainder(&frame[4..end1]);
        for _ in 0..(end1 - 4) * 8 {
            crc1 = if crc1 & 1 != 0 {
                ((crc1 ^ 0x8005) >> 1) | 0x8000
            } else {
                crc1 >> 1
            };
        }
        frame[2..4].copy_from_slice(&crc1.to_be_bytes());

        let crc2 = crc.update(crc.remainder(&frame[2..len - 2]), &[0, 0]);
        frame[len - 2..].copy_from_slice(&crc2.to_be_bytes());

        frame
    }
}

/// Bytes that never contain a sync word.
pub fn garbage(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 37 + 123) % 256) as u8).collect()
}

/// Engine that produces deterministic samples derived from the frame bytes.
#[derive(Debug, Default)]
pub struct MockEngine {
    pub frame_calls: usize,
    pub block_calls: usize,
    pub levels: Vec<f32>,
    pub flags_seen: Vec<OutputFlags>,

    /// Frame index (counting calls from 0) whose frame decode fails.
    pub fail_frame: Option<usize>,
    /// (frame index, block index) whose block decode fails.
    pub fail_block: Option<(usize, usize)>,
    /// Flags to report back instead of the requested ones.
    pub output_flags: Option<OutputFlags>,
    /// Samples per channel to expose, 256 when unset.
    pub samples_per_channel: Option<usize>,

    pub(crate) checksum: usize,
    pub(crate) block: usize,
    pub(crate) channels: usize,
    pub(crate) samples: Vec<f32>,
}

impl DecodeEngine for MockEngine {
    fn frame(
        &mut self,
        frame: &[u8],
        flags: &mut OutputFlags,
        level: &mut f32,
        _bias: f32,
    ) -> Result<(), EngineError> {
        let index = self.frame_calls;
        self.frame_calls += 1;
        self.flags_seen.push(*flags);
        self.levels.push(*level);

        if self.fail_frame == Some(index) {
            return Err(EngineError::Frame("bit allocation".into()));
        }

        if let Some(output) = self.output_flags {
            *flags = output | OutputFlags(flags.bits() & OutputFlags::ADJUST_LEVEL.bits());
        }
        self.channels = flags.channel_count().unwrap_or(2);

        self.checksum = frame.iter().map(|&b| b as usize).sum();
        self.block = 0;
        Ok(())
    }

    fn block(&mut self) -> Result<(), EngineError> {
        let block = self.block;
        self.block += 1;
        self.block_calls += 1;

        if self.fail_block == Some((self.frame_calls - 1, block)) {
            return Err(EngineError::Block {
                block,
                reason: "exponent out of range".into(),
            });
        }

        let per_channel = self.samples_per_channel.unwrap_or(SAMPLES_PER_BLOCK);
        self.samples = (0..self.channels * per_channel)
            .map(|i| {
                let value = ((self.checksum + block * 31 + i) % 2001) as i32 - 1000;
                f32::from_bits((BIAS_BITS + value) as u32)
            })
            .collect();
        Ok(())
    }

    fn samples(&self) -> &[f32] {
        &self.samples
    }
}

/// Sink that collects PCM and refuses one chosen block.
#[derive(Debug, Default)]
pub struct FlakySink {
    pub pcm: Vec<u8>,
    pub blocks: usize,
    pub fail_at: Option<usize>,
}

impl PcmSink for FlakySink {
    fn write_block(&mut self, _flags: OutputFlags, pcm: &[u8]) -> Result<(), SinkError> {
        let index = self.blocks;
        self.blocks += 1;

        if self.fail_at == Some(index) {
            return Err(SinkError::Rejected("queue full".into()));
        }

        self.pcm.extend_from_slice(pcm);
        Ok(())
    }
}

#[test]
fn built_frames_parse_and_check() {
    use crate::structs::header::FrameHeader;

    let crc = Crc16::new(&CRC_SYNC_FRAME_ALG);

    for builder in [
        FrameBuilder::default(),
        FrameBuilder::default().fscod(1).frmsizecod(3).seed(9),
        FrameBuilder::default().acmod(7).lfe(true),
        FrameBuilder::default().acmod(1).frmsizecod(0),
    ] {
        let frame = builder.build();
        let header = FrameHeader::parse(&frame).unwrap();

        assert_eq!(header.frame_len, frame.len());
        assert_eq!(header.lfe, builder.lfe);
        assert_eq!(header.acmod.acmod(), builder.acmod);
        assert_eq!(crc.remainder(&frame[2..crc1_region_end(frame.len())]), 0);
        assert_eq!(crc.remainder(&frame[2..]), 0);
    }
}
