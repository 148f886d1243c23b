//! Key generation and table pre-filling.

use alloc::string::String;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::KeyTable;
use crate::config::TableConfig;
use crate::error::Result;

/// Table sizes swept by the reference benchmark.
pub const REFERENCE_TABLE_SIZES: &[usize] = &[100, 1_000, 10_000, 100_000, 1_000_000];

/// Load factors swept by the reference benchmark.
pub const REFERENCE_LOAD_FACTORS: &[f64] = &[0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

/// Produces fixed-length keys of uniformly random lowercase ASCII letters.
///
/// # Examples
///
/// ```rust
/// use collision_tables::KeyGenerator;
///
/// let mut keys = KeyGenerator::seeded(42, 8);
/// let key = keys.next_key();
/// assert_eq!(key.len(), 8);
/// assert!(key.bytes().all(|b| b.is_ascii_lowercase()));
/// ```
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    rng: SmallRng,
    key_length: usize,
}

impl KeyGenerator {
    /// Creates a deterministic generator.
    pub fn seeded(seed: u64, key_length: usize) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            key_length,
        }
    }

    /// Creates a generator seeded from operating-system entropy.
    #[cfg(feature = "std")]
    pub fn from_os_rng(key_length: usize) -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
            key_length,
        }
    }

    /// Creates the generator described by `config`: seeded when the
    /// configuration carries a seed, otherwise from OS entropy (or seed 0
    /// without `std`).
    pub fn for_config(config: &TableConfig) -> Self {
        match config.seed {
            Some(seed) => Self::seeded(seed, config.key_length),
            #[cfg(feature = "std")]
            None => Self::from_os_rng(config.key_length),
            #[cfg(not(feature = "std"))]
            None => Self::seeded(0, config.key_length),
        }
    }

    /// Length of the keys this generator produces.
    pub fn key_length(&self) -> usize {
        self.key_length
    }

    /// Generates the next key.
    pub fn next_key(&mut self) -> String {
        (0..self.key_length)
            .map(|_| char::from(self.rng.random_range(b'a'..=b'z')))
            .collect()
    }

    /// Mutable access to the underlying generator, for callers that want to
    /// sample with the same stream (for example [`KeyTable::random_key`]).
    pub fn rng_mut(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::for_config(&TableConfig::default())
    }
}

impl Iterator for KeyGenerator {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_key())
    }
}

/// Inserts `config.prefill_count()` generated keys into `table` through its
/// own `insert`, and returns how many were inserted.
///
/// # Examples
///
/// ```rust
/// use collision_tables::ChainedTable;
/// use collision_tables::KeyGenerator;
/// use collision_tables::TableConfig;
/// use collision_tables::prefill;
///
/// let config = TableConfig::new(20).load_factor(0.5);
/// let mut table = ChainedTable::<String>::with_capacity(config.capacity)?;
/// let inserted = prefill(&mut table, &config, &mut KeyGenerator::seeded(1, 8))?;
/// assert_eq!(inserted, 10);
/// assert_eq!(table.len(), 10);
/// # Ok::<(), collision_tables::TableError>(())
/// ```
pub fn prefill<K, T>(table: &mut T, config: &TableConfig, keys: &mut KeyGenerator) -> Result<usize>
where
    K: From<String>,
    T: KeyTable<K> + ?Sized,
{
    config.validate()?;

    let count = config.prefill_count();
    for _ in 0..count {
        table.insert(K::from(keys.next_key()))?;
    }

    log::debug!(
        "pre-filled {:?} table with {} keys (capacity {}, load factor {})",
        table.strategy(),
        count,
        config.capacity,
        config.load_factor
    );
    Ok(count)
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeSet;
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn keys_have_requested_shape() {
        let mut keys = KeyGenerator::seeded(7, 12);
        for _ in 0..100 {
            let key = keys.next_key();
            assert_eq!(key.len(), 12);
            assert!(key.bytes().all(|b| b.is_ascii_lowercase()), "{key}");
        }
    }

    #[test]
    fn seeded_generators_repeat() {
        let a: Vec<String> = KeyGenerator::seeded(99, 8).take(16).collect();
        let b: Vec<String> = KeyGenerator::seeded(99, 8).take(16).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn keys_cover_the_alphabet() {
        let seen: BTreeSet<u8> = KeyGenerator::seeded(3, 8)
            .take(200)
            .flat_map(String::into_bytes)
            .collect();
        assert_eq!(seen.len(), 26);
    }

    #[test]
    fn config_seed_selects_a_deterministic_stream() {
        let config = TableConfig::new(10).seed(5).key_length(4);
        let mut a = KeyGenerator::for_config(&config);
        let mut b = KeyGenerator::seeded(5, 4);
        assert_eq!(a.key_length(), 4);
        assert_eq!(a.next_key(), b.next_key());
    }

    #[cfg(not(feature = "std"))]
    #[test]
    fn unseeded_config_uses_seed_zero_without_std() {
        let mut unseeded = KeyGenerator::for_config(&TableConfig::new(10));
        let mut zero = KeyGenerator::seeded(0, unseeded.key_length());
        assert_eq!(unseeded.next_key(), zero.next_key());
    }

    #[test]
    fn reference_sweep_is_valid() {
        for &capacity in REFERENCE_TABLE_SIZES {
            for &load_factor in REFERENCE_LOAD_FACTORS {
                assert!(
                    TableConfig::new(capacity)
                        .load_factor(load_factor)
                        .validate()
                        .is_ok()
                );
            }
        }
    }
}
