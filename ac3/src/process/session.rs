//! Engine lifecycle around a [`Dispatcher`] and the read loop that feeds it.

use std::io::{self, Read};

use log::{debug, info};

use crate::process::StreamStats;
use crate::process::dispatch::Dispatcher;
use crate::process::engine::{DecodeEngine, FrameSetup, PcmSink};
use crate::structs::header::{MAX_FRAME_LEN, PREFIX_LEN};
use crate::utils::errors::{EngineError, SessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Frame buffer size. Frames longer than this are treated as no sync.
    pub capacity: usize,
    /// Bytes requested from the byte source per read.
    pub chunk_size: usize,
    pub verify_crc: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_FRAME_LEN,
            chunk_size: 4096,
            verify_crc: false,
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.chunk_size == 0 {
            return Err(SessionError::Config("chunk size must be non-zero".into()));
        }
        if self.capacity <= PREFIX_LEN {
            return Err(SessionError::Config(format!(
                "capacity {} cannot hold a frame",
                self.capacity
            )));
        }
        Ok(())
    }
}

/// One decoding pipeline: an initialized engine, its setup policy and a sink.
///
/// The engine lives exactly as long as the session and is released by
/// [`close`](Self::close) or by dropping the session.
#[derive(Debug)]
pub struct Session<E, S, K> {
    dispatcher: Dispatcher<E, S, K>,
    chunk: Vec<u8>,
}

impl<E, S, K> Session<E, S, K>
where
    E: DecodeEngine,
    S: FrameSetup,
    K: PcmSink,
{
    /// Initializes the engine and wires up the pipeline.
    pub fn open<I>(config: StreamConfig, init: I, setup: S, sink: K) -> Result<Self, SessionError>
    where
        I: FnOnce() -> Result<E, EngineError>,
    {
        config.validate()?;

        let engine = init().map_err(SessionError::EngineInit)?;
        debug!("Engine initialized, {config:?}");

        Ok(Self {
            dispatcher: Dispatcher::new(engine, setup, sink, &config),
            chunk: vec![0; config.chunk_size],
        })
    }

    /// Feeds the whole byte source through the pipeline.
    ///
    /// A chunk shorter than the configured size ends the stream. A read
    /// error is fatal: bytes read before it are still dispatched.
    pub fn run<R: Read>(&mut self, mut reader: R) -> Result<StreamStats, SessionError> {
        loop {
            let (filled, result) = fill_chunk(&mut reader, &mut self.chunk);
            self.dispatcher.push_bytes(&self.chunk[..filled]);

            if let Err(e) = result {
                return Err(SessionError::Read(e));
            }

            if filled < self.chunk.len() {
                break;
            }
        }

        self.dispatcher.finish();

        let stats = *self.dispatcher.stats();
        info!(
            "End of stream: {} frames decoded, {} bytes skipped, {} frames discarded",
            stats.frames_decoded,
            stats.bytes_skipped,
            stats.frame_errors()
        );
        Ok(stats)
    }

    /// Feeds one chunk directly, for callers that own the read loop.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> usize {
        self.dispatcher.push_bytes(chunk)
    }

    pub fn finish(&mut self) -> usize {
        self.dispatcher.finish()
    }

    pub fn stats(&self) -> &StreamStats {
        self.dispatcher.stats()
    }

    pub fn sink(&self) -> &K {
        self.dispatcher.sink()
    }

    /// Releases the engine and hands back the sink with the final counters.
    pub fn close(self) -> (K, StreamStats) {
        let (engine, _, sink, stats) = self.dispatcher.into_parts();
        drop(engine);
        debug!("Engine released");
        (sink, stats)
    }
}

/// Reads until `buf` is full, the source is exhausted or it fails.
///
/// Returns the bytes filled alongside the outcome, so data read before an
/// error is not lost.
pub fn fill_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> (usize, io::Result<()>) {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return (filled, Err(e)),
        }
    }
    (filled, Ok(()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use anyhow::Result;

    use super::*;
    use crate::process::engine::FixedSetup;
    use crate::process::testing::{FrameBuilder, MockEngine};

    /// Hands out data in small pieces, interrupting every other call, then
    /// optionally fails.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        calls: usize,
        fail_at_end: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls % 2 == 0 {
                return Err(io::ErrorKind::Interrupted.into());
            }

            if self.pos == self.data.len() {
                return if self.fail_at_end {
                    Err(io::Error::other("device gone"))
                } else {
                    Ok(0)
                };
            }

            let n = buf.len().min(self.data.len() - self.pos).min(97);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn open(config: StreamConfig) -> Result<Session<MockEngine, FixedSetup, Vec<u8>>> {
        Ok(Session::open(
            config,
            || Ok(MockEngine::default()),
            FixedSetup::default(),
            Vec::new(),
        )?)
    }

    #[test]
    fn decodes_whole_source() -> Result<()> {
        let stream = [
            FrameBuilder::default().seed(1).build(),
            FrameBuilder::default().seed(2).build(),
            FrameBuilder::default().seed(3).build()[..300].to_vec(),
        ]
        .concat();

        let mut session = open(StreamConfig::default())?;
        let stats = session.run(Cursor::new(stream))?;

        assert_eq!(stats.frames_decoded, 2);
        assert_eq!(stats.bytes_discarded, 300);

        let (pcm, closed) = session.close();
        assert_eq!(closed, stats);
        assert_eq!(pcm.len(), 2 * 6 * 1024);
        Ok(())
    }

    #[test]
    fn interrupted_reads_are_retried() -> Result<()> {
        let data = [
            FrameBuilder::default().seed(1).build(),
            FrameBuilder::default().seed(2).build(),
        ]
        .concat();
        let reader = Trickle {
            data,
            pos: 0,
            calls: 0,
            fail_at_end: false,
        };

        let mut session = open(StreamConfig {
            chunk_size: 700,
            ..Default::default()
        })?;
        let stats = session.run(reader)?;

        assert_eq!(stats.frames_decoded, 2);
        assert_eq!(stats.bytes_in, 1024);
        Ok(())
    }

    #[test]
    fn read_error_is_fatal_after_delivering_frames() -> Result<()> {
        let reader = Trickle {
            data: FrameBuilder::default().build(),
            pos: 0,
            calls: 0,
            fail_at_end: true,
        };

        let mut session = open(StreamConfig::default())?;
        let result = session.run(reader);

        assert!(matches!(result, Err(SessionError::Read(_))));
        assert_eq!(session.stats().frames_decoded, 1);
        assert_eq!(session.sink().len(), 6 * 1024);
        Ok(())
    }

    #[test]
    fn engine_init_failure_is_fatal() {
        let result = Session::<MockEngine, _, _>::open(
            StreamConfig::default(),
            || Err(EngineError::Init("out of memory".into())),
            FixedSetup::default(),
            Vec::new(),
        );

        assert!(matches!(
            result,
            Err(SessionError::EngineInit(EngineError::Init(_)))
        ));
    }

    #[test]
    fn rejects_unusable_config() {
        let config = StreamConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SessionError::Config(_))));

        let config = StreamConfig {
            capacity: PREFIX_LEN,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SessionError::Config(_))));
    }

    #[test]
    fn fill_chunk_stops_at_end_of_source() {
        let mut reader = Cursor::new(vec![7u8; 10]);
        let mut buf = [0u8; 16];

        let (filled, result) = fill_chunk(&mut reader, &mut buf);
        assert_eq!(filled, 10);
        assert!(result.is_ok());
        assert_eq!(buf[..10], [7; 10]);
    }
}
