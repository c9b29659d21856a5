use log::{debug, trace, warn};

use crate::process::StreamStats;
use crate::process::accumulate::{Accumulator, Event};
use crate::structs::header::{FrameHeader, MAX_FRAME_LEN};
use crate::utils::crc::{CRC_SYNC_FRAME_ALG, Crc16, crc1_region_end};
use crate::utils::errors::{CrcRegion, FrameError, SyncError};

/// Where the extractor stands between two frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    SeekingHeader,
    HeaderParsed(FrameHeader),
    /// A complete frame sits in the buffer until the next call.
    FrameReady(FrameHeader),
}

/// Carves sync frames out of a byte stream delivered in arbitrary chunks.
///
/// # Example
///
/// ```rust
/// use ac3::process::extract::Extractor;
///
/// let mut extractor = Extractor::default();
/// let stream: &[u8] = &[0xFF; 64]; // no sync word anywhere
///
/// let mut input = stream;
/// while let Some(header) = extractor.next_frame(&mut input) {
///     let frame = extractor.frame().unwrap();
///     assert_eq!(frame.len(), header.frame_len);
/// }
///
/// assert_eq!(extractor.stats().frames, 0);
/// assert_eq!(extractor.stats().bytes_skipped, 64 - 6);
/// ```
#[derive(Debug)]
pub struct Extractor {
    buffer: Accumulator,
    state: SyncState,
    verify_crc: bool,
    crc: Crc16,
    skipped: u64,
    stats: StreamStats,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(MAX_FRAME_LEN, false)
    }
}

impl Extractor {
    pub fn new(capacity: usize, verify_crc: bool) -> Self {
        Self {
            buffer: Accumulator::with_capacity(capacity),
            state: SyncState::SeekingHeader,
            verify_crc,
            crc: Crc16::new(&CRC_SYNC_FRAME_ALG),
            skipped: 0,
            stats: StreamStats::default(),
        }
    }

    /// Consumes input until the next complete frame.
    ///
    /// `input` is advanced past the bytes taken. The returned header
    /// describes the frame now available through [`frame`](Self::frame); it
    /// stays there until the next call. `None` means `input` is exhausted
    /// and more data is needed.
    pub fn next_frame(&mut self, input: &mut &[u8]) -> Option<FrameHeader> {
        if let SyncState::FrameReady(_) = self.state {
            self.release();
        }

        loop {
            let before = input.len();
            let event = self.buffer.fill(input);
            self.stats.bytes_in += (before - input.len()) as u64;

            match (event?, self.state) {
                (Event::HeaderReady, SyncState::SeekingHeader) => self.on_header(),
                (Event::FrameReady, SyncState::HeaderParsed(header)) => {
                    self.stats.frames += 1;

                    if let Err(e) = self.check_crc(&header) {
                        // The header may have been a false sync, so the rest
                        // of the window is searched again
                        warn!("Discarding frame: {e}");
                        self.stats.crc_failures += 1;
                        self.count_skip();
                        self.buffer.rescan();
                        self.state = SyncState::SeekingHeader;
                        continue;
                    }

                    self.state = SyncState::FrameReady(header);
                    return Some(header);
                }
                (event, state) => {
                    unreachable!("accumulator signalled {event:?} in state {state:?}")
                }
            }
        }
    }

    fn on_header(&mut self) {
        let parsed = FrameHeader::parse(self.buffer.prefix()).and_then(|header| {
            if self.buffer.expect_frame(header.frame_len) {
                Ok(header)
            } else {
                Err(SyncError::FrameTooLong {
                    len: header.frame_len,
                    capacity: self.buffer.capacity(),
                })
            }
        });

        match parsed {
            Ok(header) => {
                if self.skipped > 0 {
                    debug!("Resynchronized after skipping {} bytes", self.skipped);
                    self.skipped = 0;
                }

                trace!(
                    "Sync frame: {} Hz, {} kbps, {}, {} bytes",
                    header.sample_rate,
                    header.bit_rate_kbps(),
                    header.flags,
                    header.frame_len
                );

                self.stats.headers += 1;
                self.state = SyncState::HeaderParsed(header);
            }
            Err(e) => {
                if self.skipped == 0 {
                    warn!("Lost sync: {e}");
                } else {
                    trace!("No sync: {e}");
                }

                self.count_skip();
                self.buffer.shift_one();
            }
        }
    }

    fn count_skip(&mut self) {
        self.stats.no_sync += 1;
        self.stats.bytes_skipped += 1;
        self.skipped += 1;
    }

    fn check_crc(&self, header: &FrameHeader) -> Result<(), FrameError> {
        if !self.verify_crc {
            return Ok(());
        }

        let Some(frame) = self.buffer.frame() else {
            return Ok(());
        };

        let regions = [
            (CrcRegion::Crc1, crc1_region_end(header.frame_len)),
            (CrcRegion::Crc2, header.frame_len),
        ];

        for (region, end) in regions {
            let remainder = self.crc.remainder(&frame[2..end]);
            if remainder != 0 {
                return Err(FrameError::CrcMismatch { region, remainder });
            }
        }

        Ok(())
    }

    /// Bytes of the frame returned by the last [`next_frame`](Self::next_frame).
    pub fn frame(&self) -> Option<&[u8]> {
        match self.state {
            SyncState::FrameReady(_) => self.buffer.frame(),
            _ => None,
        }
    }

    /// Drops the current frame, or a half collected one, and returns to
    /// header search. Bytes queued for another search are kept.
    pub fn release(&mut self) {
        self.buffer.reset();
        self.state = SyncState::SeekingHeader;
    }

    /// Ends the stream. Whatever partial data is buffered is dropped.
    pub fn finish(&mut self) -> usize {
        let residual = match self.state {
            SyncState::FrameReady(_) => self.buffer.backlog(),
            _ => self.buffer.buffered(),
        };

        if residual > 0 {
            debug!("Discarding {residual} trailing bytes at end of stream");
            self.stats.bytes_discarded += residual as u64;
        }

        self.buffer.clear();
        self.state = SyncState::SeekingHeader;
        residual
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut StreamStats {
        &mut self.stats
    }
}
