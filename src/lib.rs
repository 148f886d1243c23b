#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use rand::Rng;

/// A separate-chaining table.
///
/// Each slot owns a singly linked chain of keys; the slot array is fixed at
/// construction.
pub mod chained_table;

pub mod config;

/// Byte accounting shared by both tables.
pub mod cost_model;

/// The crate's error type.
pub mod error;

pub mod hash;

/// An open-addressing table with key-seeded quadratic probing.
///
/// Grows by doubling when a probe sequence wraps without finding a free slot.
pub mod probed_table;

/// Chain-length and probe-length statistics.
#[cfg(feature = "stats")]
pub mod stats;

pub mod workload;

pub use chained_table::ChainedTable;
pub use config::GrowthPolicy;
pub use config::TableConfig;
pub use cost_model::CostModel;
pub use error::Result;
pub use error::TableError;
pub use hash::DefaultHashBuilder;
pub use probed_table::ProbedTable;
pub use workload::KeyGenerator;
pub use workload::prefill;

/// Collision-resolution strategy of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Separate chaining: [`ChainedTable`].
    Chaining,
    /// Open addressing with quadratic probing: [`ProbedTable`].
    OpenAddressing,
}

impl core::fmt::Display for Strategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Strategy::Chaining => "chaining",
            Strategy::OpenAddressing => "open addressing",
        })
    }
}

/// The contract both tables offer to benchmark harnesses.
///
/// `lookup` reports the slot index a key was found at, or `None`; a missing
/// key is never an error. `remove` of a missing key is a no-op.
pub trait KeyTable<K> {
    /// Which collision strategy backs this table.
    fn strategy(&self) -> Strategy;

    /// Inserts `key`.
    fn insert(&mut self, key: K) -> Result<()>;

    /// Slot index holding `key`, or `None` if it is absent.
    fn lookup<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Removes one occurrence of `key`. Returns whether anything was removed.
    fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Byte estimate of the table under `model`.
    fn memory_estimate(&self, model: &cost_model::CostModel) -> usize;

    /// A randomly chosen stored key. Fails with [`TableError::EmptyTable`]
    /// when the table holds no key.
    fn random_key<R>(&self, rng: &mut R) -> Result<&K>
    where
        R: Rng + ?Sized;

    /// Number of slots.
    fn capacity(&self) -> usize;

    /// Number of stored keys.
    fn len(&self) -> usize;

    /// Returns `true` if no key is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Running count of insertions minus successful removals.
    fn total_insertions(&self) -> usize;
}

/// A table of either kind, chosen once at construction.
///
/// # Examples
///
/// ```rust
/// use collision_tables::KeyTable;
/// use collision_tables::Strategy;
/// use collision_tables::Table;
///
/// for strategy in [Strategy::Chaining, Strategy::OpenAddressing] {
///     let mut table: Table = Table::new(strategy, 50, 0.2)?;
///     assert_eq!(table.len(), 10);
///
///     table.insert("needle".to_string())?;
///     assert!(table.lookup("needle").is_some());
///     assert!(table.remove("needle"));
///     assert_eq!(table.lookup("needle"), None);
/// }
/// # Ok::<(), collision_tables::TableError>(())
/// ```
#[derive(Clone)]
pub enum Table<K = String, S = DefaultHashBuilder> {
    /// Separate chaining.
    Chained(ChainedTable<K, S>),
    /// Open addressing.
    Probed(ProbedTable<K, S>),
}

impl<K, S> Table<K, S>
where
    K: Hash + Eq + From<String>,
    S: BuildHasher + Default,
{
    /// Creates a table of the given strategy with `capacity` slots,
    /// pre-filled to `load_factor`.
    pub fn new(strategy: Strategy, capacity: usize, load_factor: f64) -> Result<Self> {
        Self::with_config(
            strategy,
            &TableConfig::new(capacity).load_factor(load_factor),
        )
    }

    /// Creates a table of the given strategy as described by `config`.
    pub fn with_config(strategy: Strategy, config: &TableConfig) -> Result<Self> {
        Ok(match strategy {
            Strategy::Chaining => Table::Chained(ChainedTable::with_config(config)?),
            Strategy::OpenAddressing => Table::Probed(ProbedTable::with_config(config)?),
        })
    }
}

impl<K, S> Table<K, S> {
    /// Target load factor the table was pre-filled to.
    pub fn load_factor(&self) -> f64 {
        match self {
            Table::Chained(table) => table.load_factor(),
            Table::Probed(table) => table.load_factor(),
        }
    }

    /// The chained table, if this is one.
    pub fn as_chained(&self) -> Option<&ChainedTable<K, S>> {
        match self {
            Table::Chained(table) => Some(table),
            Table::Probed(_) => None,
        }
    }

    /// The probed table, if this is one.
    pub fn as_probed(&self) -> Option<&ProbedTable<K, S>> {
        match self {
            Table::Chained(_) => None,
            Table::Probed(table) => Some(table),
        }
    }

    /// Occupancy and cost summary.
    #[cfg(feature = "stats")]
    pub fn stats(&self, model: &CostModel) -> stats::TableStats {
        match self {
            Table::Chained(table) => table.stats(model),
            Table::Probed(table) => table.stats(model),
        }
    }
}

impl<K, S> From<ChainedTable<K, S>> for Table<K, S> {
    fn from(table: ChainedTable<K, S>) -> Self {
        Table::Chained(table)
    }
}

impl<K, S> From<ProbedTable<K, S>> for Table<K, S> {
    fn from(table: ProbedTable<K, S>) -> Self {
        Table::Probed(table)
    }
}

impl<K, S> Debug for Table<K, S>
where
    K: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Table::Chained(table) => Debug::fmt(table, f),
            Table::Probed(table) => Debug::fmt(table, f),
        }
    }
}

impl<K, S> KeyTable<K> for Table<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn strategy(&self) -> Strategy {
        match self {
            Table::Chained(_) => Strategy::Chaining,
            Table::Probed(_) => Strategy::OpenAddressing,
        }
    }

    fn insert(&mut self, key: K) -> Result<()> {
        match self {
            Table::Chained(table) => {
                table.insert(key);
                Ok(())
            }
            Table::Probed(table) => table.insert(key),
        }
    }

    fn lookup<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self {
            Table::Chained(table) => table.lookup(key),
            Table::Probed(table) => table.lookup(key),
        }
    }

    fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self {
            Table::Chained(table) => table.remove(key),
            Table::Probed(table) => table.remove(key),
        }
    }

    fn memory_estimate(&self, model: &CostModel) -> usize {
        match self {
            Table::Chained(table) => table.memory_estimate(model),
            Table::Probed(table) => table.memory_estimate(model),
        }
    }

    fn random_key<R>(&self, rng: &mut R) -> Result<&K>
    where
        R: Rng + ?Sized,
    {
        match self {
            Table::Chained(table) => table.random_key(rng),
            Table::Probed(table) => table.random_key(rng),
        }
    }

    fn capacity(&self) -> usize {
        match self {
            Table::Chained(table) => table.capacity(),
            Table::Probed(table) => table.capacity(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Table::Chained(table) => table.len(),
            Table::Probed(table) => table.len(),
        }
    }

    fn total_insertions(&self) -> usize {
        match self {
            Table::Chained(table) => table.total_insertions(),
            Table::Probed(table) => table.total_insertions(),
        }
    }
}

/// Allocates `len` slots, reporting allocation failure instead of aborting.
pub(crate) fn alloc_slots<T>(len: usize, fill: impl FnMut() -> T) -> Result<Vec<T>> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(len)
        .map_err(|_| TableError::out_of_memory(len))?;
    slots.resize_with(len, fill);
    Ok(slots)
}
