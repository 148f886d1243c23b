use thiserror::Error;

/// Errors raised by table construction, growth and random-key sampling.
///
/// Missing keys are not errors: [`lookup`](crate::KeyTable::lookup) reports
/// them as `None` and [`remove`](crate::KeyTable::remove) as `false`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    /// A table must have at least one slot.
    #[error("invalid capacity {capacity}: a table needs at least one slot")]
    InvalidCapacity {
        /// The rejected capacity.
        capacity: usize,
    },

    /// The target load factor must lie in `[0, 1)`.
    #[error("invalid load factor {load_factor}: expected a value in [0, 1)")]
    InvalidLoadFactor {
        /// The rejected load factor.
        load_factor: f64,
    },

    /// A random key was requested from a table that holds none.
    #[error("cannot sample a key from an empty table")]
    EmptyTable,

    /// The slot array could not be allocated, either at construction or while
    /// doubling.
    #[error("out of memory allocating {requested_slots} slots")]
    OutOfMemory {
        /// Number of slots that were requested.
        requested_slots: usize,
    },
}

impl TableError {
    pub(crate) fn out_of_memory(requested_slots: usize) -> Self {
        Self::OutOfMemory { requested_slots }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, TableError>;
