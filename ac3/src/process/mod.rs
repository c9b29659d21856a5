/// Fixed-capacity window that collects headers and frames.
pub mod accumulate;

/// Float-to-PCM conversion and channel interleaving.
pub mod convert;

/// Frame dispatch to the decode engine and the PCM sink.
///
/// Provides the [`Dispatcher`](dispatch::Dispatcher), the stream state machine.
pub mod dispatch;

/// Decode engine, setup policy and sink interfaces.
pub mod engine;

/// Frame extraction from arbitrarily chunked input.
///
/// Provides the [`Extractor`](extract::Extractor) for finding sync patterns and
/// carving complete frames out of a continuous byte stream.
pub mod extract;

/// Engine lifecycle and the byte source read loop.
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

/// Counters kept while a stream is processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Bytes taken from the input.
    pub bytes_in: u64,
    /// Headers that parsed and fit the buffer.
    pub headers: u64,
    /// Complete frames collected, before CRC verification.
    pub frames: u64,
    /// Failed sync attempts, one skipped byte each.
    pub no_sync: u64,
    pub bytes_skipped: u64,
    pub crc_failures: u64,
    /// Partial frame bytes dropped at end of stream.
    pub bytes_discarded: u64,

    pub frames_decoded: u64,
    pub setup_failures: u64,
    pub decode_failures: u64,
    pub sink_failures: u64,
}

impl StreamStats {
    pub fn frame_errors(&self) -> u64 {
        self.crc_failures + self.setup_failures + self.decode_failures + self.sink_failures
    }
}
