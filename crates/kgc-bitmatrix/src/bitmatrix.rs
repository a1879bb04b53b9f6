use crate::{round_up_to_block, words_for_bits, BLOCK_WORDS};
use kgc_ids::KgError;

/// One 64-byte-aligned block of eight 64-bit words.
#[repr(align(64))]
#[derive(Clone, Copy)]
struct Block([u64; BLOCK_WORDS]);

impl Block {
    const ZERO: Block = Block([0u64; BLOCK_WORDS]);
}

/// A cache-aligned, row-major bit-matrix.
///
/// Row `r`, column `c` lives at word `r * stride_words + c / 64`, bit
/// `c % 64` of that word. Every row starts on a 64-byte block boundary.
pub struct BitMatrix {
    rows: usize,
    cols: usize,
    stride_words: usize,
    blocks: Vec<Block>,
}

impl BitMatrix {
    /// Allocates a zeroed `rows x cols` bit-matrix.
    ///
    /// Fails with [`KgError::AllocationFailed`] if the requested geometry
    /// would overflow address-space-sized arithmetic — the allocator-refusal
    /// case named in the store's `create` contract.
    pub fn try_new(rows: usize, cols: usize) -> Result<Self, KgError> {
        let row_words = round_up_to_block(words_for_bits(cols.max(1)));
        let total_words = row_words
            .checked_mul(rows.max(1))
            .ok_or_else(|| KgError::AllocationFailed {
                detail: format!("bit-matrix geometry {rows}x{cols} overflows word count"),
            })?;
        let total_blocks = total_words / BLOCK_WORDS;
        let blocks = vec![Block::ZERO; total_blocks];
        Ok(Self {
            rows,
            cols,
            stride_words: row_words,
            blocks,
        })
    }

    /// Allocates a zeroed `rows x cols` bit-matrix, panicking on overflow.
    /// Convenience for call sites that have already validated geometry.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::try_new(rows, cols).expect("bit-matrix allocation")
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Words per row (the row stride), always a multiple of [`BLOCK_WORDS`].
    #[inline]
    pub fn stride_words(&self) -> usize {
        self.stride_words
    }

    #[inline]
    fn word_index(&self, row: usize, word_in_row: usize) -> usize {
        row * self.stride_words + word_in_row
    }

    #[inline]
    fn word_at(&self, row: usize, word_in_row: usize) -> u64 {
        let idx = self.word_index(row, word_in_row);
        self.blocks[idx / BLOCK_WORDS].0[idx % BLOCK_WORDS]
    }

    #[inline]
    fn word_at_mut(&mut self, row: usize, word_in_row: usize) -> &mut u64 {
        let idx = self.word_index(row, word_in_row);
        &mut self.blocks[idx / BLOCK_WORDS].0[idx % BLOCK_WORDS]
    }

    /// Sets bit `(row, col)`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize) {
        debug_assert!(row < self.rows && col < self.cols);
        let word_in_row = col / 64;
        let bit = col % 64;
        *self.word_at_mut(row, word_in_row) |= 1u64 << bit;
    }

    /// Clears bit `(row, col)`.
    #[inline]
    pub fn clear(&mut self, row: usize, col: usize) {
        debug_assert!(row < self.rows && col < self.cols);
        let word_in_row = col / 64;
        let bit = col % 64;
        *self.word_at_mut(row, word_in_row) &= !(1u64 << bit);
    }

    /// Tests bit `(row, col)`. This is the hot path: one word load, one bit
    /// shift, one AND, one compare.
    #[inline]
    pub fn test(&self, row: usize, col: usize) -> bool {
        debug_assert!(row < self.rows && col < self.cols);
        let word_in_row = col / 64;
        let bit = col % 64;
        (self.word_at(row, word_in_row) >> bit) & 1 != 0
    }

    /// Copies `src_row` of `self` and ANDs it against `other_row` of `other`,
    /// writing the result into `dst_row` of `self`. Used by the join kernel
    /// for `predicate_row AND object_row`. `other` must have the same
    /// stride as `self`.
    pub fn and_rows_into(&mut self, dst_row: usize, src_row: usize, other: &BitMatrix, other_row: usize) -> u32 {
        debug_assert_eq!(self.stride_words, other.stride_words);
        let mut popcount = 0u32;
        for w in 0..self.stride_words {
            let a = self.word_at(src_row, w);
            let b = other.word_at(other_row, w);
            let v = a & b;
            popcount += v.count_ones();
            *self.word_at_mut(dst_row, w) = v;
        }
        popcount
    }

    /// ORs `src_row` into `dst_row`, both within `self`. The Warshall
    /// closure's inner step: `if bit(i, k) then row[i] |= row[k]`.
    /// Returns `true` if any bit changed (used to detect fixed points).
    pub fn or_row_into(&mut self, dst_row: usize, src_row: usize) -> bool {
        let mut changed = false;
        for w in 0..self.stride_words {
            let s = self.word_at(src_row, w);
            let d = self.word_at_mut(dst_row, w);
            let merged = *d | s;
            if merged != *d {
                changed = true;
                *d = merged;
            }
        }
        changed
    }

    /// ANDs `row` of `self` with `other_row` of `other` into a freshly
    /// allocated [`crate::BitVector`] over the same column universe — the
    /// join kernel's `subjects_with(p, o)` primitive, which must not
    /// mutate either source matrix.
    pub fn and_row_with(&self, row: usize, other: &BitMatrix, other_row: usize) -> crate::BitVector {
        debug_assert_eq!(self.stride_words, other.stride_words);
        let mut out = crate::BitVector::new(self.cols);
        for w in 0..self.stride_words {
            let a = self.word_at(row, w);
            let b = other.word_at(other_row, w);
            out.set_word(w, a & b);
        }
        out
    }

    /// Row-wise AND of `a` and `b` (bitmask rows within the same matrix
    /// geometry, e.g. a node-property row against a required-property
    /// mask row). Returns the popcount of the result and whether it equals
    /// `mask_row`'s popcount (used by the shape validator's subset test).
    pub fn row_and_equals(&self, row: usize, mask: &BitMatrix, mask_row: usize) -> bool {
        debug_assert_eq!(self.stride_words, mask.stride_words);
        for w in 0..self.stride_words {
            let a = self.word_at(row, w);
            let m = mask.word_at(mask_row, w);
            if (a & m) != m {
                return false;
            }
        }
        true
    }

    /// Returns `true` if ANDing `row` of `self` with `mask_row` of `mask`
    /// is non-zero (the shape validator's "is node targeted" test).
    pub fn row_intersects(&self, row: usize, mask: &BitMatrix, mask_row: usize) -> bool {
        debug_assert_eq!(self.stride_words, mask.stride_words);
        for w in 0..self.stride_words {
            if self.word_at(row, w) & mask.word_at(mask_row, w) != 0 {
                return true;
            }
        }
        false
    }

    /// Popcount of a whole row.
    pub fn popcount_row(&self, row: usize) -> u32 {
        let mut total = 0u32;
        for w in 0..self.stride_words {
            total += self.word_at(row, w).count_ones();
        }
        total
    }

    /// Iterates the set bit columns of `row` in ascending order, using the
    /// find-lowest-set-bit / clear-lowest-set-bit pattern named in the join
    /// kernel's contract.
    pub fn iter_set_bits(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.stride_words).flat_map(move |w| {
            let mut word = self.word_at(row, w);
            std::iter::from_fn(move || {
                if word == 0 {
                    None
                } else {
                    let bit = word.trailing_zeros() as usize;
                    word &= word - 1;
                    Some(w * 64 + bit)
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_test_clear_roundtrip() {
        let mut m = BitMatrix::new(4, 200);
        assert!(!m.test(2, 150));
        m.set(2, 150);
        assert!(m.test(2, 150));
        m.clear(2, 150);
        assert!(!m.test(2, 150));
    }

    #[test]
    fn rows_are_independent() {
        let mut m = BitMatrix::new(3, 70);
        m.set(0, 69);
        assert!(!m.test(1, 69));
        assert!(!m.test(2, 69));
    }

    #[test]
    fn popcount_matches_set_bits() {
        let mut m = BitMatrix::new(1, 300);
        for c in [0, 1, 63, 64, 127, 299] {
            m.set(0, c);
        }
        assert_eq!(m.popcount_row(0), 6);
    }

    #[test]
    fn iter_set_bits_is_sorted_and_exact() {
        let mut m = BitMatrix::new(1, 200);
        let cols = [5, 0, 199, 64, 63, 128];
        for &c in &cols {
            m.set(0, c);
        }
        let mut expected = cols.to_vec();
        expected.sort_unstable();
        let got: Vec<usize> = m.iter_set_bits(0).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn and_rows_into_computes_intersection_and_popcount() {
        let mut a = BitMatrix::new(2, 128);
        a.set(0, 1);
        a.set(0, 5);
        a.set(0, 70);
        let mut b = BitMatrix::new(1, 128);
        b.set(0, 5);
        b.set(0, 70);
        b.set(0, 100);
        let popcount = a.and_rows_into(1, 0, &b, 0);
        assert_eq!(popcount, 2);
        assert!(a.test(1, 5));
        assert!(a.test(1, 70));
        assert!(!a.test(1, 1));
        assert!(!a.test(1, 100));
    }

    #[test]
    fn or_row_into_reports_change() {
        let mut m = BitMatrix::new(2, 64);
        m.set(0, 3);
        assert!(m.or_row_into(1, 0));
        assert!(m.test(1, 3));
        assert!(!m.or_row_into(1, 0), "no new bits, no change");
    }

    #[test]
    fn row_and_equals_subset_test() {
        let mut nodes = BitMatrix::new(1, 16);
        nodes.set(0, 3);
        nodes.set(0, 7);
        let mut required = BitMatrix::new(1, 16);
        required.set(0, 3);
        assert!(nodes.row_and_equals(0, &required, 0));
        required.set(0, 12);
        assert!(!nodes.row_and_equals(0, &required, 0));
    }

    #[test]
    fn row_intersects_detects_overlap() {
        let mut a = BitMatrix::new(1, 16);
        a.set(0, 4);
        let mut b = BitMatrix::new(1, 16);
        assert!(!a.row_intersects(0, &b, 0));
        b.set(0, 4);
        assert!(a.row_intersects(0, &b, 0));
    }

    #[test]
    fn try_new_rejects_absurd_geometry() {
        let err = BitMatrix::try_new(usize::MAX / 2, usize::MAX / 2);
        assert!(err.is_err());
    }
}
