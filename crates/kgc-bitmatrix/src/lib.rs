//! Cache-aligned bit-matrix and bit-vector primitives.
//!
//! A [`BitMatrix`] is a logical 2-D array of bits, physically a flat
//! row-major array of 64-bit words grouped into 64-byte-aligned blocks so
//! that a word-parallel (or wider-vector) backend can load whole cache
//! lines. Row stride is `ceil(cols / 64)` words, rounded up to a multiple of
//! 8 words (one 64-byte block) so every row starts on a block boundary.
//!
//! [`BitVector`] is the same geometry specialized to a single row — the
//! "result vector" the join kernel accumulates into, carrying its own
//! popcount so callers never need to rescan it.

mod bitmatrix;
mod bitvector;
mod cancellation;

pub use bitmatrix::BitMatrix;
pub use bitvector::BitVector;
pub use cancellation::CancellationToken;

/// Words per 64-byte-aligned block.
pub const BLOCK_WORDS: usize = 8;

/// Number of 64-bit words needed to hold `bits` bits.
#[inline]
pub const fn words_for_bits(bits: usize) -> usize {
    (bits + 63) / 64
}

/// Rounds a word count up to a whole number of 64-byte blocks.
#[inline]
pub const fn round_up_to_block(words: usize) -> usize {
    ((words + BLOCK_WORDS - 1) / BLOCK_WORDS) * BLOCK_WORDS
}
