//! Variable-length unsigned integer encoding for packed length prefixes.
//!
//! Each byte carries 7 bits of data and a continuation bit in the most
//! significant position. Only the write side exists here: decoding the
//! packed format is a separate concern outside this crate.

use bytes::BufMut;

const DATA_BITS_PER_BYTE: usize = 7;
const CONTINUATION_BIT_MASK: u8 = 0x80;

/// Encodes an unsigned integer as a varint.
#[inline]
pub fn write(value: u64, buf: &mut impl BufMut) {
    if value < CONTINUATION_BIT_MASK as u64 {
        // Fast path for small values (common case for lengths).
        buf.put_u8(value as u8);
        return;
    }

    let mut val = value;
    while val >= CONTINUATION_BIT_MASK as u64 {
        buf.put_u8((val as u8) | CONTINUATION_BIT_MASK);
        val >>= DATA_BITS_PER_BYTE;
    }
    buf.put_u8(val as u8);
}

/// Calculates the number of bytes needed to encode a value as a varint.
#[inline]
pub fn size(value: u64) -> usize {
    let data_bits = (64 - value.leading_zeros() as usize).max(1);
    data_bits.div_ceil(DATA_BITS_PER_BYTE)
}
