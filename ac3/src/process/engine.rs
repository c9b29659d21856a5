//! Interfaces to the collaborators around the dispatcher: the decode engine,
//! the per-frame setup policy and the PCM sink.

use std::io::Write;

use crate::process::convert::BIAS;
use crate::structs::channel::OutputFlags;
use crate::structs::header::FrameHeader;
use crate::utils::errors::{EngineError, SetupError, SinkError};

/// Stateful decoder for whole sync frames.
///
/// One instance serves one stream. It is released by dropping it.
pub trait DecodeEngine {
    /// Decodes the frame-level side information of `frame`.
    ///
    /// `flags` and `level` carry the requested output and may be rewritten
    /// with what the engine will actually produce.
    fn frame(
        &mut self,
        frame: &[u8],
        flags: &mut OutputFlags,
        level: &mut f32,
        bias: f32,
    ) -> Result<(), EngineError>;

    /// Decodes the next of the six audio blocks.
    fn block(&mut self) -> Result<(), EngineError>;

    /// Samples of the block decoded last, channel-major, 256 per channel.
    fn samples(&self) -> &[f32];
}

impl<E: DecodeEngine + ?Sized> DecodeEngine for Box<E> {
    fn frame(
        &mut self,
        frame: &[u8],
        flags: &mut OutputFlags,
        level: &mut f32,
        bias: f32,
    ) -> Result<(), EngineError> {
        (**self).frame(frame, flags, level, bias)
    }

    fn block(&mut self) -> Result<(), EngineError> {
        (**self).block()
    }

    fn samples(&self) -> &[f32] {
        (**self).samples()
    }
}

/// Output parameters chosen for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputParams {
    pub flags: OutputFlags,
    pub level: f32,
    pub bias: f32,
}

impl Default for OutputParams {
    fn default() -> Self {
        Self {
            flags: OutputFlags::STEREO,
            level: 1.0,
            bias: BIAS,
        }
    }
}

/// Per-frame setup policy: channel mix and level normalization.
pub trait FrameSetup {
    fn setup(&mut self, header: &FrameHeader) -> Result<OutputParams, SetupError>;
}

impl<F> FrameSetup for F
where
    F: FnMut(&FrameHeader) -> Result<OutputParams, SetupError>,
{
    fn setup(&mut self, header: &FrameHeader) -> Result<OutputParams, SetupError> {
        self(header)
    }
}

/// Requests the same output for every frame, optionally pinned to one
/// sample rate.
#[derive(Debug, Clone, Default)]
pub struct FixedSetup {
    pub params: OutputParams,
    pub sample_rate: Option<u32>,
}

impl FixedSetup {
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate: Some(sample_rate),
            ..Default::default()
        }
    }
}

impl FrameSetup for FixedSetup {
    fn setup(&mut self, header: &FrameHeader) -> Result<OutputParams, SetupError> {
        match self.sample_rate {
            Some(rate) if rate != header.sample_rate => {
                Err(SetupError::UnsupportedSampleRate(header.sample_rate))
            }
            _ => Ok(self.params),
        }
    }
}

/// Destination for interleaved 16-bit little-endian PCM, one block at a time.
pub trait PcmSink {
    fn write_block(&mut self, flags: OutputFlags, pcm: &[u8]) -> Result<(), SinkError>;
}

impl PcmSink for Vec<u8> {
    fn write_block(&mut self, _flags: OutputFlags, pcm: &[u8]) -> Result<(), SinkError> {
        self.extend_from_slice(pcm);
        Ok(())
    }
}

/// Adapts any [`Write`] into a [`PcmSink`].
#[derive(Debug)]
pub struct WriteSink<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> WriteSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> PcmSink for WriteSink<W> {
    fn write_block(&mut self, _flags: OutputFlags, pcm: &[u8]) -> Result<(), SinkError> {
        self.writer.write_all(pcm)?;
        self.written += pcm.len() as u64;
        Ok(())
    }
}
