//! Sorted-hash lookup over an adapter's field units.
//!
//! Serves random-access callers (partial encode, merge) with O(log n)
//! name-hash lookup; full-object writes iterate declaration order and never
//! touch this structure.

use crate::fnv;

/// Maps a name hash back to a declaration-order position.
///
/// Holds the sorted copy of the unit hashes and a parallel array
/// translating a sorted position to its declaration-order position.
/// Distinct names hashing identically would corrupt the mapping; the
/// 64-bit hash space makes that an accepted risk and no chaining exists.
#[derive(Debug)]
pub struct HashIndex {
    sorted: Vec<u64>,
    mapping: Vec<u32>,
}

impl HashIndex {
    /// Builds the index over hashes listed in declaration order.
    pub fn new(hashes: &[u64]) -> Self {
        let mut sorted = hashes.to_vec();
        sorted.sort_unstable();

        let mut mapping = vec![0u32; sorted.len()];
        for (original, &hash) in hashes.iter().enumerate() {
            let pos = sorted
                .binary_search(&hash)
                .expect("hash came from the sorted source array");
            mapping[pos] = original as u32;
        }

        Self { sorted, mapping }
    }

    /// Looks up a name hash, returning the declaration-order position.
    #[inline]
    pub fn lookup(&self, hash: u64) -> Option<usize> {
        let pos = self.sorted.binary_search(&hash).ok()?;
        Some(self.mapping[pos] as usize)
    }

    /// Looks up by name, hashing it first.
    #[inline]
    pub fn lookup_name(&self, name: &str) -> Option<usize> {
        self.lookup(fnv::hash64(name))
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
}
