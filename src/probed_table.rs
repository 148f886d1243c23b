use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::mem::size_of;

use rand::Rng;

use crate::KeyTable;
use crate::Strategy;
use crate::alloc_slots;
use crate::config::GrowthPolicy;
use crate::config::TableConfig;
use crate::config::validate_capacity;
use crate::cost_model::CostModel;
use crate::error::Result;
use crate::error::TableError;
use crate::hash::DefaultHashBuilder;
use crate::workload::KeyGenerator;
use crate::workload::prefill;

/// Slot visited at probe `attempt` for a key hashing to `hash`:
/// `(hash + attempt + 3 * attempt^2) mod capacity`.
///
/// The sequence is seeded by the key's hash alone, so it does not depend on
/// which slots earlier probes visited.
#[inline]
pub fn probe_slot(hash: u64, attempt: usize, capacity: usize) -> usize {
    let attempt = attempt as u128;
    ((u128::from(hash) + attempt + 3 * attempt * attempt) % capacity as u128) as usize
}

#[derive(Clone)]
struct Slot<K> {
    key: Option<K>,
    /// Live keys whose probe path crossed this slot before reaching their
    /// own. A lookup may only stop at an empty slot when this is zero.
    passes: usize,
}

impl<K> Slot<K> {
    fn empty() -> Self {
        Slot {
            key: None,
            passes: 0,
        }
    }
}

/// Bytes taken by one slot of the array, occupied or not.
pub(crate) fn slot_size<K>() -> usize {
    size_of::<Slot<K>>()
}

/// An open-addressing table of keys using quadratic probing.
///
/// Each slot holds at most one key. Colliding keys follow the probe sequence
/// of [`probe_slot`]; inserting an existing key overwrites it in place. When
/// a full cycle of `capacity` probes finds no free slot the table doubles.
///
/// Removal leaves a genuinely empty slot rather than a tombstone. Every slot
/// counts the live keys whose probe path crossed it, and lookups only stop at
/// empty slots that no live key crossed, so removing one key never hides
/// another.
///
/// ## Example
///
/// ```rust
/// use collision_tables::ProbedTable;
///
/// let mut table = ProbedTable::<String>::with_capacity(7)?;
/// table.insert("aaaaaaaa".to_string())?;
///
/// let index = table.lookup("aaaaaaaa").expect("present");
/// assert_eq!(table.slot(index).map(String::as_str), Some("aaaaaaaa"));
///
/// table.insert("aaaaaaaa".to_string())?;
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.lookup("aaaaaaaa"), Some(index));
/// # Ok::<(), collision_tables::TableError>(())
/// ```
#[derive(Clone)]
pub struct ProbedTable<K, S = DefaultHashBuilder> {
    slots: Vec<Slot<K>>,
    len: usize,
    total_insertions: usize,
    load_factor: f64,
    growth: GrowthPolicy,
    hash_builder: S,
}

impl<K, S> ProbedTable<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty table with `capacity` slots hashing with
    /// `hash_builder`.
    ///
    /// Fails with [`TableError::InvalidCapacity`] when `capacity` is zero and
    /// with [`TableError::OutOfMemory`] when the slots cannot be allocated.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self> {
        validate_capacity(capacity)?;

        let table = Self {
            slots: alloc_slots(capacity, Slot::empty)?,
            len: 0,
            total_insertions: 0,
            load_factor: 0.0,
            growth: GrowthPolicy::default(),
            hash_builder,
        };
        log::debug!("created probed table with {capacity} slots");
        Ok(table)
    }

    /// Sets how keys are carried across a doubling.
    pub fn with_growth_policy(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Inserts `key`, overwriting an equal key in place if one is stored.
    ///
    /// Doubles the table when the probe sequence of `key` wraps without
    /// finding a free slot, and fails with [`TableError::OutOfMemory`] if the
    /// doubled array cannot be allocated. The table is unchanged on failure.
    pub fn insert(&mut self, key: K) -> Result<()> {
        let hash = self.hash_builder.hash_one(&key);
        if let Some((_, index)) = self.find(hash, &key) {
            self.slots[index].key = Some(key);
        } else {
            let attempt = loop {
                match self.vacant_attempt(hash) {
                    Some(attempt) => break attempt,
                    None => self.grow()?,
                }
            };
            self.place(hash, attempt, key);
        }

        self.total_insertions += 1;
        Ok(())
    }

    /// Returns the slot index holding `key`, or `None` if it is absent.
    pub fn lookup<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(self.hash_builder.hash_one(key), key)
            .map(|(_, index)| index)
    }

    /// Returns `true` if `key` is present.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup(key).is_some()
    }

    /// Clears the slot holding `key`. Returns whether a key was removed.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.take(key).is_some()
    }

    /// Clears the slot holding `key` and returns the stored key.
    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        let (attempt, index) = self.find(hash, key)?;

        let capacity = self.slots.len();
        for earlier in 0..attempt {
            self.slots[probe_slot(hash, earlier, capacity)].passes -= 1;
        }
        log::trace!("cleared slot {index} (probe attempt {attempt})");

        self.len -= 1;
        self.total_insertions -= 1;
        self.slots[index].key.take()
    }

    /// Picks a uniformly random key by sampling slots until an occupied one
    /// is hit.
    ///
    /// Fails with [`TableError::EmptyTable`] when there is nothing to pick.
    pub fn random_key<R>(&self, rng: &mut R) -> Result<&K>
    where
        R: Rng + ?Sized,
    {
        if self.len == 0 {
            return Err(TableError::EmptyTable);
        }

        loop {
            let index = rng.random_range(0..self.slots.len());
            if let Some(key) = &self.slots[index].key {
                return Ok(key);
            }
        }
    }

    /// Walks the probe sequence of `key`. Returns the attempt and slot where
    /// it is stored.
    fn find<Q>(&self, hash: u64, key: &Q) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let capacity = self.slots.len();
        for attempt in 0..capacity {
            let index = probe_slot(hash, attempt, capacity);
            let slot = &self.slots[index];
            match &slot.key {
                Some(stored) if stored.borrow() == key => return Some((attempt, index)),
                Some(_) => {}
                None if slot.passes == 0 => return None,
                None => {}
            }
        }
        None
    }

    /// First attempt of the probe sequence that lands on an empty slot.
    fn vacant_attempt(&self, hash: u64) -> Option<usize> {
        let capacity = self.slots.len();
        (0..capacity)
            .find(|&attempt| self.slots[probe_slot(hash, attempt, capacity)].key.is_none())
    }

    fn place(&mut self, hash: u64, attempt: usize, key: K) {
        let capacity = self.slots.len();
        for earlier in 0..attempt {
            self.slots[probe_slot(hash, earlier, capacity)].passes += 1;
        }

        let slot = &mut self.slots[probe_slot(hash, attempt, capacity)];
        debug_assert!(slot.key.is_none());
        slot.key = Some(key);
        self.len += 1;
    }

    fn grow(&mut self) -> Result<()> {
        let old_capacity = self.slots.len();
        match self.growth {
            GrowthPolicy::Rehash => self.grow_rehash(doubled(old_capacity)?)?,
            GrowthPolicy::CopyByIndex => {
                let stranded = self.grow_copy_by_index(doubled(old_capacity)?)?;
                log::warn!(
                    "copied {} keys by index into {} slots without re-probing; {stranded} unreachable",
                    self.len,
                    self.slots.len()
                );
            }
        }

        log::debug!(
            "grew probed table from {old_capacity} to {} slots ({:?}, {} live keys)",
            self.slots.len(),
            self.growth,
            self.len
        );
        Ok(())
    }

    /// Copies slot `i` to slot `i` of a fresh array of `capacity` slots and
    /// recounts `passes` for the new probe sequences. A key whose sequence
    /// never reaches its copied slot is stranded and contributes no passes.
    /// Returns the number of stranded keys.
    fn grow_copy_by_index(&mut self, capacity: usize) -> Result<usize> {
        let mut slots = alloc_slots(capacity, Slot::empty)?;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slots[index].key = slot.key.take();
        }

        let mut stranded = 0;
        for index in 0..self.slots.len() {
            let Some(key) = &slots[index].key else {
                continue;
            };
            let hash = self.hash_builder.hash_one(key);
            match (0..capacity).find(|&attempt| probe_slot(hash, attempt, capacity) == index) {
                Some(attempt) => {
                    for earlier in 0..attempt {
                        slots[probe_slot(hash, earlier, capacity)].passes += 1;
                    }
                }
                None => stranded += 1,
            }
        }

        self.slots = slots;
        Ok(stranded)
    }

    /// Re-probes every live key into a fresh array of `capacity` slots,
    /// doubling further if some key finds no free slot. Keys are only moved
    /// once every key has a target.
    fn grow_rehash(&mut self, mut capacity: usize) -> Result<()> {
        loop {
            let mut slots = alloc_slots(capacity, Slot::empty)?;
            let mut taken = alloc_slots(capacity, || false)?;
            let mut plan = Vec::new();
            plan.try_reserve_exact(self.len)
                .map_err(|_| TableError::out_of_memory(self.len))?;

            for (from, slot) in self.slots.iter().enumerate() {
                let Some(key) = &slot.key else {
                    continue;
                };
                let hash = self.hash_builder.hash_one(key);
                let Some(attempt) =
                    (0..capacity).find(|&attempt| !taken[probe_slot(hash, attempt, capacity)])
                else {
                    break;
                };

                for earlier in 0..attempt {
                    slots[probe_slot(hash, earlier, capacity)].passes += 1;
                }
                let to = probe_slot(hash, attempt, capacity);
                taken[to] = true;
                plan.push((from, to));
            }

            if plan.len() == self.len {
                for (from, to) in plan {
                    slots[to].key = self.slots[from].key.take();
                }
                self.slots = slots;
                return Ok(());
            }

            log::trace!("rehash into {capacity} slots left keys unplaced; doubling again");
            capacity = doubled(capacity)?;
        }
    }

    /// Probe-length histogram: bin `i` counts keys stored at probe attempt
    /// `i`. The last bin collects every longer probe and every key that is
    /// unreachable from its own probe sequence.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> crate::stats::Histogram {
        const BINS: usize = 16;

        let mut bins = alloc::vec![0usize; BINS + 1];
        for key in self.iter() {
            let attempt = self
                .find(self.hash_builder.hash_one(key), key)
                .map_or(BINS, |(attempt, _)| attempt.min(BINS));
            bins[attempt] += 1;
        }
        crate::stats::Histogram::new("probe length", bins)
    }
}

impl<K, S> ProbedTable<K, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates an empty table with `capacity` slots and the default hasher.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, S> ProbedTable<K, S>
where
    K: Hash + Eq + From<String>,
    S: BuildHasher + Default,
{
    /// Creates a table with `capacity` slots, pre-filled with
    /// `round(load_factor * capacity)` random keys.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use collision_tables::ProbedTable;
    ///
    /// let table = ProbedTable::<String>::new(100, 0.25)?;
    /// assert_eq!(table.len(), 25);
    /// # Ok::<(), collision_tables::TableError>(())
    /// ```
    pub fn new(capacity: usize, load_factor: f64) -> Result<Self> {
        Self::with_config(&TableConfig::new(capacity).load_factor(load_factor))
    }

    /// Creates a table as described by `config`, pre-filled with generated
    /// keys.
    pub fn with_config(config: &TableConfig) -> Result<Self> {
        config.validate()?;

        let mut table = Self::with_capacity(config.capacity)?.with_growth_policy(config.growth);
        table.load_factor = config.load_factor;
        prefill(&mut table, config, &mut KeyGenerator::for_config(config))?;
        Ok(table)
    }
}

impl<K, S> ProbedTable<K, S> {
    /// Number of slots. Grows by doubling.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no key is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Running count of `insert` calls minus successful removals. Overwrites
    /// count as insertions.
    pub fn total_insertions(&self) -> usize {
        self.total_insertions
    }

    /// Target load factor the table was pre-filled to.
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// How keys are carried across a doubling.
    pub fn growth_policy(&self) -> GrowthPolicy {
        self.growth
    }

    /// Returns the hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// The key stored at `index`, if any.
    pub fn slot(&self, index: usize) -> Option<&K> {
        self.slots.get(index)?.key.as_ref()
    }

    /// Iterates every stored key in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.slots.iter().filter_map(|slot| slot.key.as_ref())
    }

    /// Byte estimate of the table under `model`: one occupied-slot cost per
    /// key plus one empty-slot cost per free slot.
    pub fn memory_estimate(&self, model: &CostModel) -> usize {
        model.probed(self.slots.len(), self.len)
    }

    /// Removes every key, keeping the current capacity.
    pub fn clear(&mut self) {
        self.slots.fill_with(Slot::empty);
        self.len = 0;
        self.total_insertions = 0;
    }

    /// Occupancy and cost summary.
    #[cfg(feature = "stats")]
    pub fn stats(&self, model: &CostModel) -> crate::stats::TableStats {
        crate::stats::TableStats::new(
            Strategy::OpenAddressing,
            self.len,
            self.slots.len(),
            self.len,
            self.memory_estimate(model),
        )
    }
}

fn doubled(capacity: usize) -> Result<usize> {
    capacity
        .checked_mul(2)
        .ok_or(TableError::out_of_memory(usize::MAX))
}

impl<K, S> Debug for ProbedTable<K, S>
where
    K: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProbedTable")
            .field(
                "slots",
                &self
                    .slots
                    .iter()
                    .enumerate()
                    .filter_map(|(index, slot)| {
                        slot.key.as_ref().map(|key| format!("[{index}]: {key:?}"))
                    })
                    .collect::<Vec<String>>(),
            )
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .field("total_insertions", &self.total_insertions)
            .field("growth", &self.growth)
            .finish()
    }
}

impl<K, S> KeyTable<K> for ProbedTable<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn strategy(&self) -> Strategy {
        Strategy::OpenAddressing
    }

    fn insert(&mut self, key: K) -> Result<()> {
        ProbedTable::insert(self, key)
    }

    fn lookup<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        ProbedTable::lookup(self, key)
    }

    fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        ProbedTable::remove(self, key)
    }

    fn memory_estimate(&self, model: &CostModel) -> usize {
        ProbedTable::memory_estimate(self, model)
    }

    fn random_key<R>(&self, rng: &mut R) -> Result<&K>
    where
        R: Rng + ?Sized,
    {
        ProbedTable::random_key(self, rng)
    }

    fn capacity(&self) -> usize {
        ProbedTable::capacity(self)
    }

    fn len(&self) -> usize {
        ProbedTable::len(self)
    }

    fn total_insertions(&self) -> usize {
        ProbedTable::total_insertions(self)
    }
}
