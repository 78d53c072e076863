//! Shared symbol tables for compact type-tag encoding.
//!
//! A symbol table maps a name's content hash to a small ordinal shared by
//! many encode calls, letting the packed format reference a repeated type
//! name by one small negative integer instead of the full string. Ordinal
//! assignment happens at table construction; this crate only consumes the
//! mapping.

use crate::fnv;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicU32, Ordering},
};

/// Read surface the adapter consumes.
///
/// `identity` keys the adapter's single-slot ordinal cache: a different
/// identity forces a re-resolve, the same identity reuses the cached
/// ordinal without touching the table.
pub trait SymbolTable: Send + Sync {
    /// Looks up the ordinal registered for a name hash. Ordinals are `>= 1`
    /// so their negation is distinguishable from inline lengths on the wire.
    fn ordinal(&self, hash: u64) -> Option<u32>;

    /// An opaque, nonzero identity distinguishing table instances.
    fn identity(&self) -> u32;
}

static NEXT_IDENTITY: AtomicU32 = AtomicU32::new(1);

/// A fixed symbol table built from an ordered name list.
pub struct Symbols {
    ordinals: HashMap<u64, u32>,
    identity: u32,
}

impl Symbols {
    /// Builds a table assigning ordinals 1, 2, ... in list order.
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let ordinals = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (fnv::hash64(name), i as u32 + 1))
            .collect();
        Self {
            ordinals,
            identity: NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl SymbolTable for Symbols {
    fn ordinal(&self, hash: u64) -> Option<u32> {
        self.ordinals.get(&hash).copied()
    }

    fn identity(&self) -> u32 {
        self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_start_at_one() {
        let table = Symbols::new(["com.example.Bean", "com.example.Other"]);
        assert_eq!(table.ordinal(fnv::hash64("com.example.Bean")), Some(1));
        assert_eq!(table.ordinal(fnv::hash64("com.example.Other")), Some(2));
        assert_eq!(table.ordinal(fnv::hash64("unregistered")), None);
    }

    #[test]
    fn test_identities_distinct() {
        let a = Symbols::new(["x"]);
        let b = Symbols::new(["x"]);
        assert_ne!(a.identity(), b.identity());
        assert_ne!(a.identity(), 0);
    }
}
