//! CRC validation for AC-3 sync frames.
//!
//! A sync frame carries two CRC-16 words. `crc1` follows the sync word and
//! protects the first 5/8 of the frame, `crc2` closes the frame and protects
//! the remainder. Both are chosen so that the polynomial remainder of the
//! protected region, check word included, is zero.

/// CRC algorithm specification with polynomial and initial value.
pub struct Algorithm<T> {
    poly: T,
    init: T,
}

/// CRC-16 algorithm for sync frame validation (x^16 + x^15 + x^2 + 1).
pub const CRC_SYNC_FRAME_ALG: Algorithm<u16> = Algorithm {
    poly: 0x8005,
    init: 0x0000,
};

/// Computes CRC-16 checksum using specified polynomial.
#[inline(always)]
pub const fn crc16(poly: u16, mut value: u16, len: usize) -> u16 {
    value <<= 8;

    let mut i = 0;
    while i < len {
        value = (value << 1) ^ (((value >> 15) & 1) * poly);
        i += 1;
    }

    value
}

#[inline(always)]
const fn crc16_table(poly: u16) -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < table.len() {
        table[i] = crc16(poly, i as u16, 8);
        i += 1;
    }

    table
}

#[derive(Debug)]
pub struct Crc16 {
    pub poly: u16,
    pub init: u16,
    table: [u16; 256],
}

impl Crc16 {
    pub const fn new(algorithm: &Algorithm<u16>) -> Self {
        Self {
            poly: algorithm.poly,
            init: algorithm.init,
            table: crc16_table(algorithm.poly),
        }
    }

    const fn table_entry(&self, index: u16) -> u16 {
        self.table[(index & 0xFF) as usize]
    }

    /// Feeds `bytes` into the running remainder `crc`.
    ///
    /// Bytes are shifted in without augmentation, so the result is the plain
    /// polynomial remainder of everything fed so far. A region that ends with
    /// its own check word therefore yields zero.
    #[inline(always)]
    pub const fn update(&self, mut crc: u16, bytes: &[u8]) -> u16 {
        let mut i = 0;

        while i < bytes.len() {
            crc = self.table_entry(crc >> 8) ^ (crc << 8) ^ bytes[i] as u16;
            i += 1;
        }

        crc
    }

    #[inline(always)]
    pub const fn remainder(&self, bytes: &[u8]) -> u16 {
        self.update(self.init, bytes)
    }
}

/// Byte offset where the `crc1` region of a sync frame ends.
///
/// The region is 5/8 of the frame, rounded down to a whole 16-bit word.
#[inline]
pub const fn crc1_region_end(frame_len: usize) -> usize {
    ((frame_len >> 2) + (frame_len >> 4)) << 1
}
