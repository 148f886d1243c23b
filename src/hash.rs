//! Hasher selection.
//!
//! Both tables reduce `hash(key)` modulo their capacity, so any stable,
//! well-distributed hasher works. The default is picked at compile time from
//! the enabled features.

use core::hash::Hasher;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Hash builder used when none is supplied.
        pub type DefaultHashBuilder = foldhash::fast::FixedState;
    } else if #[cfg(feature = "std")] {
        /// Hash builder used when none is supplied.
        pub type DefaultHashBuilder =
            core::hash::BuildHasherDefault<std::collections::hash_map::DefaultHasher>;
    } else {
        /// Hash builder used when none is supplied.
        pub type DefaultHashBuilder = core::hash::BuildHasherDefault<FnvHasher>;
    }
}

/// 64-bit Fowler–Noll–Vo (FNV-1a) hasher.
///
/// Always available, including without `std` and `foldhash`.
#[derive(Debug, Clone, Copy)]
pub struct FnvHasher {
    hash: u64,
}

impl FnvHasher {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self {
            hash: Self::OFFSET_BASIS,
        }
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.hash ^= u64::from(*byte);
            self.hash = self.hash.wrapping_mul(Self::PRIME);
        }
    }
}

#[cfg(test)]
mod tests {
    use core::hash::BuildHasher;
    use core::hash::BuildHasherDefault;

    use super::*;

    #[test]
    fn fnv_matches_published_vectors() {
        let mut empty = FnvHasher::default();
        empty.write(b"");
        assert_eq!(empty.finish(), 0xcbf2_9ce4_8422_2325);

        let mut a = FnvHasher::default();
        a.write(b"a");
        assert_eq!(a.finish(), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn default_builder_is_stable() {
        let builder = DefaultHashBuilder::default();
        assert_eq!(builder.hash_one("aaaaaaaa"), builder.hash_one("aaaaaaaa"));

        let fnv = BuildHasherDefault::<FnvHasher>::default();
        assert_eq!(fnv.hash_one("key"), fnv.hash_one("key"));
        assert_ne!(fnv.hash_one("key"), fnv.hash_one("kez"));
    }
}
