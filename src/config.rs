//! Construction parameters.

use crate::error::Result;
use crate::error::TableError;

/// Array length used by the single-table driver the benchmarks grew out of.
pub const DEFAULT_CAPACITY: usize = 997;

/// Length of generated keys.
pub const DEFAULT_KEY_LENGTH: usize = 8;

/// How a [`ProbedTable`](crate::ProbedTable) carries its keys across a
/// capacity doubling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowthPolicy {
    /// Re-probe every live key into the doubled array.
    #[default]
    Rehash,
    /// Copy slot `i` of the old array to slot `i` of the new one without
    /// re-probing.
    ///
    /// Probe positions depend on the capacity, so a key copied this way can
    /// become unreachable through its own probe sequence. Keys inserted after
    /// the copy stay reachable. Only useful to reproduce the historical
    /// benchmark numbers.
    CopyByIndex,
}

/// Construction parameters shared by both table kinds.
///
/// # Examples
///
/// ```rust
/// use collision_tables::TableConfig;
///
/// let config = TableConfig::new(100).load_factor(0.5).seed(7);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.prefill_count(), 50);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TableConfig {
    /// Number of slots allocated up front.
    pub capacity: usize,
    /// Fraction of `capacity` filled with generated keys at construction.
    pub load_factor: f64,
    /// Length of the generated keys.
    pub key_length: usize,
    /// Seed for the key generator. When `None`, OS entropy is used under
    /// `std`; without `std` the seed is 0, so every unseeded pre-fill
    /// generates the same keys.
    pub seed: Option<u64>,
    /// Growth behaviour for open-addressed tables. Ignored by chaining.
    pub growth: GrowthPolicy,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            load_factor: 0.0,
            key_length: DEFAULT_KEY_LENGTH,
            seed: None,
            growth: GrowthPolicy::default(),
        }
    }
}

impl TableConfig {
    /// Creates a configuration for an empty table with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Sets the target load factor used to pre-fill the table.
    pub fn load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Sets the length of generated keys.
    pub fn key_length(mut self, key_length: usize) -> Self {
        self.key_length = key_length;
        self
    }

    /// Makes pre-filling deterministic.
    ///
    /// Without `std` an unseeded configuration already behaves as if seeded
    /// with 0.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the growth policy for open-addressed tables.
    pub fn growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Checks that the capacity is non-zero and the load factor lies in
    /// `[0, 1)`.
    pub fn validate(&self) -> Result<()> {
        validate_capacity(self.capacity)?;
        validate_load_factor(self.load_factor)
    }

    /// Number of keys inserted when the table is pre-filled.
    ///
    /// `round(load_factor * capacity)`, but never zero for a positive load
    /// factor.
    pub fn prefill_count(&self) -> usize {
        let target = self.load_factor * self.capacity as f64;
        if target.is_nan() || target <= 0.0 {
            return 0;
        }

        let whole = target as usize;
        let rounded = if target - whole as f64 >= 0.5 {
            whole + 1
        } else {
            whole
        };
        rounded.max(1)
    }
}

pub(crate) fn validate_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 {
        return Err(TableError::InvalidCapacity { capacity });
    }
    Ok(())
}

pub(crate) fn validate_load_factor(load_factor: f64) -> Result<()> {
    if !(0.0..1.0).contains(&load_factor) {
        return Err(TableError::InvalidLoadFactor { load_factor });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_an_empty_reference_table() {
        let config = TableConfig::default();
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.key_length, DEFAULT_KEY_LENGTH);
        assert_eq!(config.growth, GrowthPolicy::Rehash);
        assert_eq!(config.prefill_count(), 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_capacity() {
        assert_eq!(
            TableConfig::new(0).validate(),
            Err(TableError::InvalidCapacity { capacity: 0 })
        );
    }

    #[test]
    fn rejects_out_of_range_load_factors() {
        for lf in [-0.1, 1.0, 1.5] {
            assert_eq!(
                TableConfig::new(10).load_factor(lf).validate(),
                Err(TableError::InvalidLoadFactor { load_factor: lf })
            );
        }
        assert!(matches!(
            TableConfig::new(10).load_factor(f64::NAN).validate(),
            Err(TableError::InvalidLoadFactor { .. })
        ));
    }

    #[test]
    fn prefill_count_rounds_to_nearest() {
        assert_eq!(TableConfig::new(100).load_factor(0.5).prefill_count(), 50);
        assert_eq!(TableConfig::new(10).load_factor(0.25).prefill_count(), 3);
        assert_eq!(TableConfig::new(10).load_factor(0.24).prefill_count(), 2);
        assert_eq!(TableConfig::new(997).load_factor(0.9).prefill_count(), 897);
    }

    #[test]
    fn prefill_count_never_rounds_a_positive_factor_to_zero() {
        assert_eq!(TableConfig::new(3).load_factor(0.1).prefill_count(), 1);
        assert_eq!(TableConfig::new(1).load_factor(0.01).prefill_count(), 1);
        assert_eq!(TableConfig::new(3).load_factor(0.0).prefill_count(), 0);
    }
}
