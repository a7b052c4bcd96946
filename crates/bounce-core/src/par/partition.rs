// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Work partitioning for the two tick phases.
//!
//! - Integration: static contiguous body ranges, one per worker. Per-body cost
//!   is uniform, so no coordination is needed.
//! - Pairs: the linear pair-index space `0..n·(n−1)/2` enumerates `(i, j)`
//!   with `i < j` in row-major order. Workers claim contiguous blocks from a
//!   shared atomic cursor and walk each block with [`PairRange`].

use core::ops::Range;

/// Splits `0..n` into exactly `workers` contiguous ranges whose sizes differ by
/// at most one. Trailing ranges are empty when `n < workers`.
///
/// # Panics
/// Panics if `workers == 0`.
///
/// # Examples
/// ```
/// use bounce_core::par::partition_ranges;
/// assert_eq!(partition_ranges(10, 3), vec![0..4, 4..7, 7..10]);
/// ```
pub fn partition_ranges(n: usize, workers: usize) -> Vec<Range<usize>> {
    assert!(workers > 0, "workers must be > 0");
    let base = n / workers;
    let extra = n % workers;
    let mut start = 0;
    (0..workers)
        .map(|w| {
            let len = base + usize::from(w < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// Number of unordered pairs among `n` bodies.
pub const fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Pair index of `(i, i + 1)`, the first entry of row `i`.
const fn row_start(i: usize, n: usize) -> usize {
    i * (2 * n - i - 1) / 2
}

/// Decodes pair index `k` into `(i, j)` with `i < j < n`.
///
/// # Panics
/// Panics if `k >= pair_count(n)`.
///
/// # Examples
/// ```
/// use bounce_core::par::decode_pair;
/// assert_eq!(decode_pair(0, 4), (0, 1));
/// assert_eq!(decode_pair(3, 4), (1, 2));
/// assert_eq!(decode_pair(5, 4), (2, 3));
/// ```
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn decode_pair(k: usize, n: usize) -> (usize, usize) {
    assert!(k < pair_count(n), "pair index {k} out of range for {n} bodies");
    // Closed-form row estimate, then exact integer correction.
    let b = 2.0 * n as f64 - 1.0;
    let disc = (b * b - 8.0 * k as f64).max(0.0);
    let mut i = (((b - disc.sqrt()) / 2.0).floor().max(0.0) as usize).min(n - 2);
    while i > 0 && row_start(i, n) > k {
        i -= 1;
    }
    while row_start(i + 1, n) <= k {
        i += 1;
    }
    (i, i + 1 + (k - row_start(i, n)))
}

/// Iterator over the pairs of a contiguous block of pair indices.
///
/// Only the first index is decoded; the rest are produced by stepping `j` and
/// wrapping to the next row.
#[derive(Debug, Clone)]
pub struct PairRange {
    n: usize,
    i: usize,
    j: usize,
    remaining: usize,
}

impl PairRange {
    /// Walks pair indices `range` for a store of `n` bodies.
    ///
    /// # Panics
    /// Panics if `range.end > pair_count(n)`.
    pub fn new(range: Range<usize>, n: usize) -> Self {
        assert!(range.end <= pair_count(n), "pair range {range:?} exceeds {n} bodies");
        if range.is_empty() {
            return Self { n, i: 0, j: 0, remaining: 0 };
        }
        let (i, j) = decode_pair(range.start, n);
        Self { n, i, j, remaining: range.len() }
    }
}

impl Iterator for PairRange {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let out = (self.i, self.j);
        self.j += 1;
        if self.j == self.n {
            self.i += 1;
            self.j = self.i + 1;
        }
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PairRange {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ranges_cover_everything_once() {
        for (n, w) in [(0, 1), (1, 4), (7, 3), (100, 8), (24, 24), (5, 9)] {
            let ranges = partition_ranges(n, w);
            assert_eq!(ranges.len(), w);
            assert_eq!(ranges.first().map(|r| r.start), Some(0));
            assert_eq!(ranges.last().map(|r| r.end), Some(n));
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
                assert!(pair[0].len().abs_diff(pair[1].len()) <= 1);
            }
        }
    }

    #[test]
    fn pair_range_matches_nested_loops() {
        let n = 9;
        let expected: Vec<_> = (0..n).flat_map(|i| (i + 1..n).map(move |j| (i, j))).collect();
        assert_eq!(expected.len(), pair_count(n));
        let walked: Vec<_> = PairRange::new(0..pair_count(n), n).collect();
        assert_eq!(walked, expected);
        // Blocks that start mid-row and cross row boundaries.
        for start in 0..pair_count(n) {
            for end in start..=pair_count(n) {
                let block: Vec<_> = PairRange::new(start..end, n).collect();
                assert_eq!(block, expected[start..end]);
            }
        }
    }

    #[test]
    fn tiny_stores_have_no_pairs() {
        assert_eq!(pair_count(0), 0);
        assert_eq!(pair_count(1), 0);
        assert_eq!(PairRange::new(0..0, 1).count(), 0);
    }

    proptest! {
        #[test]
        fn decode_lands_on_the_right_row(n in 2usize..5_000, seed in any::<u64>()) {
            let k = (seed as usize) % pair_count(n);
            let (i, j) = decode_pair(k, n);
            prop_assert!(i < j && j < n);
            prop_assert_eq!(row_start(i, n) + (j - i - 1), k);
        }
    }
}
