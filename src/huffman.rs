//! Huffman decoding of item base codes
//!
//! Base codes are stored one symbol at a time using the fixed prefix code in
//! [`ITEM_CODE_HUFFMAN`]. A space terminates the code and is not part of it.

use crate::bitstream::BitReader;
use crate::tables::ITEM_CODE_HUFFMAN;
use crate::{D2SaveError, Result};

/// Bits the decoder will consume before treating the stream as corrupt
pub const MAX_CODE_BITS: u32 = 100;

/// Longest code in the table
const MAX_SYMBOL_BITS: usize = 9;

/// Decode one space-terminated item code
pub fn decode_item_code(reader: &mut BitReader<'_>) -> Result<String> {
    let mut code = String::with_capacity(4);
    let mut pending = String::with_capacity(MAX_SYMBOL_BITS);

    for _ in 0..MAX_CODE_BITS {
        pending.push(if reader.read_bit() { '1' } else { '0' });

        if let Some(symbol) = lookup(&pending) {
            if symbol == ' ' {
                return Ok(code);
            }
            code.push(symbol);
            pending.clear();
        } else if pending.len() >= MAX_SYMBOL_BITS {
            // The one unused 9-bit leaf; nothing can match from here on.
            pending.clear();
        }
    }

    Err(D2SaveError::HuffmanOverrun {
        bits: MAX_CODE_BITS,
    })
}

fn lookup(bits: &str) -> Option<char> {
    ITEM_CODE_HUFFMAN
        .iter()
        .find(|(_, code)| *code == bits)
        .map(|(symbol, _)| *symbol)
}
