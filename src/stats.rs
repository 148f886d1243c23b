use alloc::vec::Vec;

use crate::Strategy;

/// Counts per length bin. The last bin is an overflow bin collecting every
/// length at or beyond it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    label: &'static str,
    bins: Vec<usize>,
}

impl Histogram {
    pub(crate) fn new(label: &'static str, bins: Vec<usize>) -> Self {
        Self { label, bins }
    }

    /// What the bins measure, e.g. `"chain length"`.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Raw bin counts; the final entry is the overflow bin.
    pub fn bins(&self) -> &[usize] {
        &self.bins
    }

    /// Sum over all bins.
    pub fn total(&self) -> usize {
        self.bins.iter().sum()
    }

    /// Mean of the binned lengths, counting the overflow bin at its lower
    /// bound.
    pub fn mean(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weighted: usize = self
            .bins
            .iter()
            .enumerate()
            .map(|(length, &count)| length * count)
            .sum();
        weighted as f64 / total as f64
    }

    /// Pretty-prints the histogram as a horizontal bar chart on stdout, one
    /// row per bin plus an "OF" row for the overflow bin.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.bins.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("{} histogram: empty", self.label);
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("{} histogram ({} entries):", self.label, self.total());

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = match units % 8 {
                1 => Some('▏'),
                2 => Some('▎'),
                3 => Some('▍'),
                4 => Some('▌'),
                5 => Some('▋'),
                6 => Some('▊'),
                7 => Some('▉'),
                _ => None,
            };
            bar.extend(partial);
            bar
        };

        let Some((&overflow, regular)) = self.bins.split_last() else {
            return;
        };
        for (length, &count) in regular.iter().enumerate() {
            println!("{:>2} | {} ({})", length, make_bar(count), count);
        }
        println!("OF | {} ({})", make_bar(overflow), overflow);
    }
}

/// Occupancy and cost summary of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStats {
    /// Strategy of the table the summary was taken from.
    pub strategy: Strategy,
    /// Number of stored keys.
    pub len: usize,
    /// Number of slots.
    pub capacity: usize,
    /// Slots holding at least one key.
    pub occupied_slots: usize,
    /// Keys per slot (len / capacity). May exceed 1 for chaining.
    pub load: f64,
    /// Occupied slots per slot (occupied_slots / capacity).
    pub slot_utilization: f64,
    /// Byte estimate under the cost model the summary was taken with.
    pub memory_bytes: usize,
}

impl TableStats {
    pub(crate) fn new(
        strategy: Strategy,
        len: usize,
        capacity: usize,
        occupied_slots: usize,
        memory_bytes: usize,
    ) -> Self {
        let ratio = |n: usize| {
            if capacity == 0 {
                0.0
            } else {
                n as f64 / capacity as f64
            }
        };
        Self {
            strategy,
            len,
            capacity,
            occupied_slots,
            load: ratio(len),
            slot_utilization: ratio(occupied_slots),
            memory_bytes,
        }
    }

    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== {} table ===", self.strategy);
        println!(
            "Population: {}/{} ({:.2}% load)",
            self.len,
            self.capacity,
            self.load * 100.0
        );
        println!(
            "Slot Usage: {}/{} ({:.2}% utilization)",
            self.occupied_slots,
            self.capacity,
            self.slot_utilization * 100.0
        );
        println!("Estimated Memory: {} bytes", self.memory_bytes);
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::BuildHasherDefault;
    use core::hash::Hasher;

    use super::*;
    use crate::ChainedTable;
    use crate::CostModel;
    use crate::ProbedTable;

    #[derive(Default)]
    struct ZeroHasher;

    impl Hasher for ZeroHasher {
        fn finish(&self) -> u64 {
            0
        }

        fn write(&mut self, _bytes: &[u8]) {}
    }

    type Collide = BuildHasherDefault<ZeroHasher>;

    #[test]
    fn chain_lengths_are_binned() {
        let mut table = ChainedTable::<String, Collide>::with_capacity(4).unwrap();
        for key in ["a", "b", "c"] {
            table.insert(key.to_string());
        }

        let histogram = table.chain_length_histogram();
        assert_eq!(histogram.label(), "chain length");
        assert_eq!(histogram.bins().len(), 17);
        assert_eq!(histogram.bins()[0], 3);
        assert_eq!(histogram.bins()[3], 1);
        assert_eq!(histogram.total(), 4);
    }

    #[test]
    fn long_chains_land_in_overflow() {
        let mut table = ChainedTable::<String, Collide>::with_capacity(1).unwrap();
        for i in 0..40 {
            table.insert(i.to_string());
        }
        let histogram = table.chain_length_histogram();
        assert_eq!(histogram.bins().last(), Some(&1));
        assert_eq!(histogram.mean(), 16.0);
    }

    #[test]
    fn probe_lengths_follow_the_sequence() {
        let mut table = ProbedTable::<String, Collide>::with_capacity(16).unwrap();
        for key in ["a", "b", "c"] {
            table.insert(key.to_string()).unwrap();
        }

        let histogram = table.probe_histogram();
        assert_eq!(histogram.label(), "probe length");
        assert_eq!(&histogram.bins()[..3], &[1, 1, 1]);
        assert_eq!(histogram.total(), 3);
        assert_eq!(histogram.mean(), 1.0);
    }

    #[test]
    fn summaries_report_occupancy() {
        let mut chained = ChainedTable::<String, Collide>::with_capacity(4).unwrap();
        chained.insert("a".to_string());
        chained.insert("b".to_string());
        let stats = chained.stats(&CostModel::REFERENCE);
        assert_eq!(stats.strategy, Strategy::Chaining);
        assert_eq!(stats.len, 2);
        assert_eq!(stats.occupied_slots, 1);
        assert_eq!(stats.load, 0.5);
        assert_eq!(stats.slot_utilization, 0.25);
        assert_eq!(stats.memory_bytes, chained.memory_estimate(&CostModel::REFERENCE));

        let mut probed = ProbedTable::<String>::with_capacity(8).unwrap();
        probed.insert("a".to_string()).unwrap();
        let stats = probed.stats(&CostModel::REFERENCE);
        assert_eq!(stats.strategy, Strategy::OpenAddressing);
        assert_eq!(stats.occupied_slots, 1);
        assert_eq!(stats.slot_utilization, 0.125);
    }

    #[test]
    fn empty_histogram_has_zero_mean() {
        let histogram = Histogram::new("probe length", vec![0; 4]);
        assert_eq!(histogram.mean(), 0.0);
        assert_eq!(histogram.total(), 0);
    }
}
