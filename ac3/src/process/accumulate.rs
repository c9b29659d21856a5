use crate::structs::header::{MAX_FRAME_LEN, PREFIX_LEN};

/// Signal raised when the write cursor reaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The first [`PREFIX_LEN`] bytes are in place and can be parsed.
    HeaderReady,
    /// A whole frame of the announced length is in place.
    FrameReady,
}

/// Fixed-capacity window that collects one header or one frame at a time.
///
/// Input is copied in up to the current target and no further, so a single
/// chunk may need several [`fill`](Self::fill) calls, one per event.
///
/// Bytes handed back by [`rescan`](Self::rescan) sit in the window behind the
/// write cursor and are consumed before any new input.
#[derive(Debug)]
pub struct Accumulator {
    buffer: Box<[u8]>,
    write_cursor: usize,
    target_cursor: usize,
    backlog: usize,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::with_capacity(MAX_FRAME_LEN)
    }
}

impl Accumulator {
    /// Creates an accumulator holding frames of up to `capacity` bytes.
    ///
    /// The capacity never drops below [`PREFIX_LEN`].
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity.max(PREFIX_LEN)].into_boxed_slice(),
            write_cursor: 0,
            target_cursor: PREFIX_LEN,
            backlog: 0,
        }
    }

    /// Copies bytes from the front of `input` and advances it past them.
    ///
    /// Returns an event once the target is reached, or `None` when `input`
    /// ran dry first.
    pub fn fill(&mut self, input: &mut &[u8]) -> Option<Event> {
        let replayed = (self.target_cursor - self.write_cursor).min(self.backlog);
        self.write_cursor += replayed;
        self.backlog -= replayed;

        let wanted = self.target_cursor - self.write_cursor;
        let len = wanted.min(input.len());

        let (head, tail) = input.split_at(len);
        self.buffer[self.write_cursor..self.write_cursor + len].copy_from_slice(head);
        self.write_cursor += len;
        *input = tail;

        if self.write_cursor != self.target_cursor {
            return None;
        }

        if self.seeking_header() {
            Some(Event::HeaderReady)
        } else {
            Some(Event::FrameReady)
        }
    }

    /// Drops the byte at offset 0 and waits for one more prefix byte.
    pub fn shift_one(&mut self) {
        debug_assert!(self.seeking_header());

        if self.write_cursor == 0 {
            return;
        }

        self.buffer.copy_within(1..self.write_cursor + self.backlog, 0);
        self.write_cursor -= 1;
    }

    /// Gives up on the buffered frame: drops its first byte and replays the
    /// rest through header search.
    pub fn rescan(&mut self) {
        let held = self.write_cursor + self.backlog;
        if held > 0 {
            self.buffer.copy_within(1..held, 0);
        }

        self.backlog = held.saturating_sub(1);
        self.write_cursor = 0;
        self.target_cursor = PREFIX_LEN;
    }

    /// Switches to frame collection with `frame_len` as the new target.
    ///
    /// Returns `false` and leaves the state untouched when the frame would
    /// not fit or is shorter than what is already buffered.
    pub fn expect_frame(&mut self, frame_len: usize) -> bool {
        if frame_len > self.buffer.len()
            || frame_len < self.write_cursor
            || frame_len <= PREFIX_LEN
        {
            return false;
        }

        self.target_cursor = frame_len;
        true
    }

    /// Back to header search. Replayed bytes past the current target are
    /// kept.
    pub fn reset(&mut self) {
        if self.backlog > 0 {
            let start = self.write_cursor;
            self.buffer.copy_within(start..start + self.backlog, 0);
        }

        self.write_cursor = 0;
        self.target_cursor = PREFIX_LEN;
    }

    /// Back to header search with an empty window.
    pub fn clear(&mut self) {
        self.backlog = 0;
        self.reset();
    }

    pub fn seeking_header(&self) -> bool {
        self.target_cursor == PREFIX_LEN
    }

    pub fn prefix(&self) -> &[u8] {
        &self.buffer[..self.write_cursor.min(PREFIX_LEN)]
    }

    /// The complete frame, once [`Event::FrameReady`] was signalled.
    pub fn frame(&self) -> Option<&[u8]> {
        (!self.seeking_header() && self.write_cursor == self.target_cursor)
            .then(|| &self.buffer[..self.target_cursor])
    }

    /// Bytes held, replayed ones included.
    pub fn buffered(&self) -> usize {
        self.write_cursor + self.backlog
    }

    /// Bytes held past the current target.
    pub fn backlog(&self) -> usize {
        self.backlog
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_then_frame() {
        let mut acc = Accumulator::default();
        let data: Vec<u8> = (0..20).collect();
        let mut input = &data[..];

        assert_eq!(acc.fill(&mut input), Some(Event::HeaderReady));
        assert_eq!(input.len(), 13);
        assert_eq!(acc.prefix(), &data[..7]);

        // A header event leaves the window untouched
        assert!(acc.expect_frame(16));
        assert_eq!(acc.buffered(), 7);
        assert_eq!(acc.frame(), None);

        assert_eq!(acc.fill(&mut input), Some(Event::FrameReady));
        assert_eq!(input, &data[16..]);
        assert_eq!(acc.frame(), Some(&data[..16]));

        acc.reset();
        assert!(acc.seeking_header());
        assert_eq!(acc.fill(&mut input), None);
        assert_eq!(acc.buffered(), 4);
        assert!(input.is_empty());
    }

    #[test]
    fn byte_at_a_time() {
        let mut acc = Accumulator::default();
        let data = [9u8; PREFIX_LEN];

        for (i, byte) in data.iter().enumerate() {
            let mut input = std::slice::from_ref(byte);
            let event = acc.fill(&mut input);
            assert!(input.is_empty());

            if i + 1 < PREFIX_LEN {
                assert_eq!(event, None);
            } else {
                assert_eq!(event, Some(Event::HeaderReady));
            }
        }
    }

    #[test]
    fn shift_discards_exactly_one_byte() {
        let mut acc = Accumulator::default();
        let data: Vec<u8> = (1..=8).collect();
        let mut input = &data[..];

        assert_eq!(acc.fill(&mut input), Some(Event::HeaderReady));
        acc.shift_one();
        assert_eq!(acc.buffered(), PREFIX_LEN - 1);
        assert!(acc.seeking_header());

        assert_eq!(acc.fill(&mut input), Some(Event::HeaderReady));
        assert_eq!(acc.prefix(), &data[1..8]);
    }

    #[test]
    fn rejects_frames_beyond_capacity() {
        let mut acc = Accumulator::with_capacity(64);
        let mut input = &[0u8; PREFIX_LEN][..];

        assert_eq!(acc.fill(&mut input), Some(Event::HeaderReady));
        assert!(!acc.expect_frame(65));
        assert!(!acc.expect_frame(PREFIX_LEN));
        assert!(acc.seeking_header());
        assert!(acc.expect_frame(64));
        assert_eq!(acc.capacity(), 64);
    }

    #[test]
    fn rescan_replays_buffered_bytes() {
        let mut acc = Accumulator::default();
        let data: Vec<u8> = (0..30).collect();
        let mut input = &data[..];

        assert_eq!(acc.fill(&mut input), Some(Event::HeaderReady));
        assert!(acc.expect_frame(20));
        assert_eq!(acc.fill(&mut input), Some(Event::FrameReady));

        acc.rescan();
        assert!(acc.seeking_header());
        assert_eq!(acc.buffered(), 19);

        // The next header comes from the window, not from new input
        let mut empty: &[u8] = &[];
        assert_eq!(acc.fill(&mut empty), Some(Event::HeaderReady));
        assert_eq!(acc.prefix(), &data[1..8]);
        assert_eq!(acc.backlog(), 12);

        acc.shift_one();
        assert_eq!(acc.fill(&mut empty), Some(Event::HeaderReady));
        assert_eq!(acc.prefix(), &data[2..9]);

        // A frame shorter than the replayed run leaves the tail for later
        assert!(acc.expect_frame(10));
        assert_eq!(acc.fill(&mut empty), Some(Event::FrameReady));
        assert_eq!(acc.frame(), Some(&data[2..12]));
        assert_eq!(acc.backlog(), 8);

        acc.reset();
        assert_eq!(acc.fill(&mut empty), Some(Event::HeaderReady));
        assert_eq!(acc.prefix(), &data[12..19]);

        assert_eq!(acc.buffered(), 8);

        // The last replayed byte goes before any new input
        acc.shift_one();
        assert_eq!(acc.fill(&mut input), Some(Event::HeaderReady));
        assert_eq!(acc.prefix(), &data[13..20]);
        assert_eq!(input, &data[20..]);

        acc.shift_one();
        assert_eq!(acc.fill(&mut input), Some(Event::HeaderReady));
        assert_eq!(acc.prefix(), &data[14..21]);
        assert_eq!(input, &data[21..]);

        acc.clear();
        assert_eq!(acc.buffered(), 0);
    }
}
