//! 64-bit FNV-1a hashing of field and type names.
//!
//! Every name-keyed lookup in this crate (field units, symbol tables, type
//! tags) is keyed by this hash rather than the name itself. Two distinct
//! names sharing a hash would corrupt an adapter's index; the 64-bit space
//! makes that practically negligible and no chaining is attempted.

const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hashes a name with FNV-1a over its UTF-8 bytes.
#[inline]
pub const fn hash64(name: &str) -> u64 {
    let bytes = name.as_bytes();
    let mut hash = OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(PRIME);
        i += 1;
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(hash64(""), OFFSET_BASIS);
    }

    #[test]
    fn test_known_vector() {
        // FNV-1a reference vector.
        assert_eq!(hash64("a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_distinct_names() {
        assert_ne!(hash64("id"), hash64("name"));
        assert_ne!(hash64("id"), hash64("Id"));
    }

    #[test]
    fn test_stable() {
        assert_eq!(hash64("@type"), hash64("@type"));
    }
}
