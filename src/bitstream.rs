//! Bit-granular reader over an LSB-first packed bitstream
//!
//! Item records and the attribute block are stored as a packed bitstream:
//! stream-bit 0 is bit 0 of byte 0, and an N-bit field read at position `p`
//! has bit `i` equal to stream-bit `p + i`. Headers, lengths and timestamps are
//! byte aligned little-endian scalars instead; the `read_*_at` helpers at the
//! bottom of this module cover those.

use crate::{D2SaveError, Result};

/// Distance the cursor may run past the end of the data before it stops moving
const OVERRUN_LIMIT: usize = 63;

/// Cursor over a borrowed byte buffer, addressed in bits
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at stream-bit 0
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a reader positioned at the start of byte `offset`
    pub fn at_byte(data: &'a [u8], offset: usize) -> Self {
        let mut reader = Self::new(data);
        reader.advance(offset.saturating_mul(8));
        reader
    }

    /// Read an unsigned little-endian bit field of `n` bits (at most 32)
    ///
    /// Bits past the end of the buffer read as zero.
    pub fn read_uint(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 32, "bit field too wide: {n}");
        let n = n.min(32);

        let mut value = 0u32;
        let mut filled = 0u32;
        while filled < n {
            let byte = self.data.get(self.pos / 8).copied().unwrap_or(0);
            let shift = (self.pos % 8) as u32;
            let take = (8 - shift).min(n - filled);
            let chunk = (u32::from(byte) >> shift) & ((1u32 << take) - 1);

            value |= chunk << filled;
            filled += take;
            self.advance(take as usize);
        }
        value
    }

    /// Read `n` bits and reinterpret them as a signed value
    ///
    /// No sign extension happens; callers range-limit the result.
    pub fn read_int(&mut self, n: u32) -> i32 {
        self.read_uint(n) as i32
    }

    /// Read a single bit
    pub fn read_bit(&mut self) -> bool {
        self.read_uint(1) != 0
    }

    /// Move forward `n` bits without decoding them
    pub fn skip(&mut self, n: usize) {
        self.advance(n);
    }

    /// Round the position up to the next multiple of 8
    pub fn align_to_byte(&mut self) {
        let pad = self.bits_to_boundary();
        self.advance(pad as usize);
    }

    /// Number of bits until the next byte boundary (0 when already aligned)
    pub fn bits_to_boundary(&self) -> u32 {
        ((8 - self.pos % 8) % 8) as u32
    }

    /// Current position in bits
    pub fn bit_position(&self) -> usize {
        self.pos
    }

    /// Index of the byte holding the next bit
    pub fn byte_position(&self) -> usize {
        self.pos / 8
    }

    /// True once the cursor has moved past the last bit of the data
    pub fn is_exhausted(&self) -> bool {
        self.pos > self.data.len() * 8
    }

    fn advance(&mut self, bits: usize) {
        let limit = self.data.len() * 8 + OVERRUN_LIMIT;
        self.pos = self.pos.saturating_add(bits).min(limit);
    }
}

/// Read one byte at a byte offset
pub fn read_u8_at(data: &[u8], offset: usize) -> Result<u8> {
    data.get(offset)
        .copied()
        .ok_or(D2SaveError::UnexpectedEof { offset })
}

/// Read a little-endian u16 at a byte offset
pub fn read_u16_le_at(data: &[u8], offset: usize) -> Result<u16> {
    let bytes = field(data, offset, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Read a little-endian u32 at a byte offset
pub fn read_u32_le_at(data: &[u8], offset: usize) -> Result<u32> {
    let bytes = field(data, offset, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn field(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(D2SaveError::UnexpectedEof { offset })
}
