use log::{debug, error, warn};

use crate::process::StreamStats;
use crate::process::convert::interleave;
use crate::process::engine::{DecodeEngine, FrameSetup, PcmSink};
use crate::process::extract::{Extractor, SyncState};
use crate::process::session::StreamConfig;
use crate::structs::channel::OutputFlags;
use crate::structs::header::{BLOCKS_PER_FRAME, FrameHeader};
use crate::utils::errors::{EngineError, ErrorKind, FrameError};

/// Position of the dispatcher in the per-frame cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    SeekingHeader,
    HeaderParsed(FrameHeader),
    /// Index of the block being decoded.
    DecodingBlocks(usize),
    FrameComplete,
}

/// What became of one complete frame.
#[derive(Debug)]
pub enum FrameOutcome {
    Decoded(FrameHeader),
    Discarded(FrameError),
}

/// Drives the decode engine with frames extracted from a chunked stream and
/// hands the converted PCM to a sink.
///
/// Every per-frame failure is logged, counted and followed by a return to
/// header search. Nothing short of the caller dropping the dispatcher ends
/// the stream.
#[derive(Debug)]
pub struct Dispatcher<E, S, K> {
    extractor: Extractor,
    state: DispatchState,
    engine: E,
    setup: S,
    sink: K,
    pcm: Vec<u8>,
}

impl<E, S, K> Dispatcher<E, S, K>
where
    E: DecodeEngine,
    S: FrameSetup,
    K: PcmSink,
{
    pub fn new(engine: E, setup: S, sink: K, config: &StreamConfig) -> Self {
        Self {
            extractor: Extractor::new(config.capacity, config.verify_crc),
            state: DispatchState::SeekingHeader,
            engine,
            setup,
            sink,
            pcm: Vec::new(),
        }
    }

    /// Feeds one chunk of any size, dispatching every frame it completes.
    ///
    /// Returns the number of frames decoded from this chunk.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> usize {
        let mut input = chunk;
        let mut decoded = 0;

        while let Some(header) = self.extractor.next_frame(&mut input) {
            self.state = DispatchState::HeaderParsed(header);

            let outcome = match self.decode_frame(&header) {
                Ok(()) => FrameOutcome::Decoded(header),
                Err(e) => FrameOutcome::Discarded(e),
            };

            if let FrameOutcome::Decoded(_) = outcome {
                decoded += 1;
            }
            self.record(outcome);
            self.reset();
        }

        self.state = match self.extractor.state() {
            SyncState::HeaderParsed(header) => DispatchState::HeaderParsed(header),
            _ => DispatchState::SeekingHeader,
        };

        decoded
    }

    /// Ends the stream, dropping any partial frame. Returns the number of
    /// bytes dropped.
    pub fn finish(&mut self) -> usize {
        let residual = self.extractor.finish();
        self.state = DispatchState::SeekingHeader;
        residual
    }

    fn decode_frame(&mut self, header: &FrameHeader) -> Result<(), FrameError> {
        let params = self.setup.setup(header)?;

        let Some(frame) = self.extractor.frame() else {
            unreachable!("frame {header:?} announced but not buffered");
        };

        let mut flags = params.flags | OutputFlags::ADJUST_LEVEL;
        let mut level = params.level;

        self.state = DispatchState::DecodingBlocks(0);
        self.engine.frame(frame, &mut flags, &mut level, params.bias)?;

        let channels = flags.channel_count().ok_or_else(|| {
            EngineError::Frame(format!("unknown output configuration {}", flags.bits()))
        })?;

        for block in 0..BLOCKS_PER_FRAME {
            self.state = DispatchState::DecodingBlocks(block);
            self.engine.block()?;

            self.pcm.clear();
            interleave(self.engine.samples(), channels, &mut self.pcm)?;

            self.sink
                .write_block(flags, &self.pcm)
                .map_err(|source| FrameError::Sink { block, source })?;
        }

        self.state = DispatchState::FrameComplete;
        Ok(())
    }

    fn record(&mut self, outcome: FrameOutcome) {
        let stats = self.extractor.stats_mut();
        let index = stats.frames;

        let e = match outcome {
            FrameOutcome::Decoded(_) => {
                stats.frames_decoded += 1;
                return;
            }
            FrameOutcome::Discarded(e) => e,
        };

        // CRC failures never get this far, the extractor counts them
        match &e {
            FrameError::Setup(_) => stats.setup_failures += 1,
            FrameError::Sink { .. } => stats.sink_failures += 1,
            _ => stats.decode_failures += 1,
        }

        match (e.kind(), self.state) {
            (ErrorKind::Sink, _) => error!("Frame {index}: {e}"),
            (_, DispatchState::DecodingBlocks(block)) => {
                warn!("Frame {index}: {e} (block {block})")
            }
            _ => warn!("Frame {index}: {e}"),
        }
    }

    fn reset(&mut self) {
        if self.state == DispatchState::FrameComplete {
            debug!("Frame {} complete", self.extractor.stats().frames);
        }
        self.extractor.release();
        self.state = DispatchState::SeekingHeader;
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn stats(&self) -> &StreamStats {
        self.extractor.stats()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn setup(&self) -> &S {
        &self.setup
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn into_parts(self) -> (E, S, K, StreamStats) {
        let stats = *self.extractor.stats();
        (self.engine, self.setup, self.sink, stats)
    }
}
