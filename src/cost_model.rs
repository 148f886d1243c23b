use core::mem::size_of;

use crate::ChainedTable;
use crate::ProbedTable;
use crate::Strategy;
use crate::chained_table;
use crate::probed_table;

/// Static byte accounting for a table.
///
/// This is not an allocator query. Each table walks its own slots and charges
/// the constants below, so the same model can be applied to both collision
/// strategies and to tables of any size.
///
/// The estimate is monotone under insertion as long as `per_node` and
/// `per_occupied_slot` are at least `per_empty_slot`, which holds for both
/// provided models.
///
/// # Examples
///
/// ```rust
/// use collision_tables::ChainedTable;
/// use collision_tables::CostModel;
///
/// let table = ChainedTable::<String>::with_capacity(10)?;
/// assert_eq!(
///     table.memory_estimate(&CostModel::REFERENCE),
///     48 + 10 * 8
/// );
/// # Ok::<(), collision_tables::TableError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostModel {
    /// Fixed cost of an empty table.
    pub table_overhead: usize,
    /// Cost of one chain node, key included.
    pub per_node: usize,
    /// Cost of a slot holding nothing.
    pub per_empty_slot: usize,
    /// Cost of an open-addressed slot holding a key.
    pub per_occupied_slot: usize,
}

impl CostModel {
    /// Constants measured for the interpreted implementation the benchmark
    /// tables were first published with.
    pub const REFERENCE: CostModel = CostModel {
        table_overhead: 48,
        per_node: 1064,
        per_empty_slot: 8,
        per_occupied_slot: 8,
    };

    /// Constants derived from the in-memory layout of this crate's tables
    /// for keys of type `K`. Heap data owned by the keys is not counted.
    ///
    /// The two layouts differ: a chained slot is a single head link, while a
    /// probed slot stores the key inline next to its pass counter, so empty
    /// and occupied probed slots cost the same.
    pub fn native<K>(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Chaining => {
                let link = chained_table::link_size::<K>();
                Self {
                    table_overhead: size_of::<ChainedTable<K>>(),
                    per_node: chained_table::node_size::<K>(),
                    per_empty_slot: link,
                    per_occupied_slot: link,
                }
            }
            Strategy::OpenAddressing => {
                let slot = probed_table::slot_size::<K>();
                Self {
                    table_overhead: size_of::<ProbedTable<K>>(),
                    per_node: slot,
                    per_empty_slot: slot,
                    per_occupied_slot: slot,
                }
            }
        }
    }

    pub(crate) fn chained(&self, slots: usize, empty_slots: usize, nodes: usize) -> usize {
        debug_assert!(empty_slots <= slots);
        self.table_overhead + nodes * self.per_node + empty_slots * self.per_empty_slot
    }

    pub(crate) fn probed(&self, slots: usize, occupied_slots: usize) -> usize {
        debug_assert!(occupied_slots <= slots);
        self.table_overhead
            + occupied_slots * self.per_occupied_slot
            + (slots - occupied_slots) * self.per_empty_slot
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::REFERENCE
    }
}
