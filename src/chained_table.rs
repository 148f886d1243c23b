use alloc::boxed::Box;
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
use crate::config::TableConfig;
use crate::config::validate_capacity;
use crate::cost_model::CostModel;
use crate::error::Result;
use crate::error::TableError;
use crate::hash::DefaultHashBuilder;
use crate::workload::KeyGenerator;
use crate::workload::prefill;

type Link<K> = Option<Box<ChainNode<K>>>;

/// One entry of a collision chain. Owned by the previous node, or by the slot
/// for the head.
struct ChainNode<K> {
    key: K,
    next: Link<K>,
}

/// Bytes taken by one chain node, key included.
pub(crate) fn node_size<K>() -> usize {
    size_of::<ChainNode<K>>()
}

/// Bytes taken by one slot of the array, which is the head link.
pub(crate) fn link_size<K>() -> usize {
    size_of::<Link<K>>()
}

/// A separate-chaining table of keys.
///
/// Every slot owns a singly linked chain of the keys hashing to it. New keys
/// are pushed at the head of their chain and duplicates are kept, so a key
/// inserted twice occupies two nodes until it is removed twice. The slot
/// array never grows; chains absorb the load instead.
///
/// ## Example
///
/// ```rust
/// use collision_tables::ChainedTable;
///
/// let mut table = ChainedTable::<String>::with_capacity(7)?;
/// table.insert("aaaaaaaa".to_string());
/// table.insert("bbbbbbbb".to_string());
///
/// let index = table.lookup("aaaaaaaa").expect("present");
/// assert!(table.chain(index).any(|k| k == "aaaaaaaa"));
///
/// assert!(table.remove("bbbbbbbb"));
/// assert_eq!(table.lookup("bbbbbbbb"), None);
/// # Ok::<(), collision_tables::TableError>(())
/// ```
pub struct ChainedTable<K, S = DefaultHashBuilder> {
    slots: Vec<Link<K>>,
    len: usize,
    total_insertions: usize,
    load_factor: f64,
    hash_builder: S,
}

impl<K, S> ChainedTable<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty table with `capacity` slots hashing with
    /// `hash_builder`.
    ///
    /// Fails with [`TableError::InvalidCapacity`] when `capacity` is zero.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self> {
        validate_capacity(capacity)?;

        let table = Self {
            slots: alloc_slots(capacity, || None)?,
            len: 0,
            total_insertions: 0,
            load_factor: 0.0,
            hash_builder,
        };
        log::debug!("created chained table with {capacity} slots");
        Ok(table)
    }

    /// The slot `key` hashes to.
    #[inline]
    pub fn index_of<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        (self.hash_builder.hash_one(key) % self.slots.len() as u64) as usize
    }

    /// Pushes `key` onto the head of its chain.
    ///
    /// No duplicate check is made.
    pub fn insert(&mut self, key: K) {
        let index = self.index_of(&key);
        let slot = &mut self.slots[index];
        let next = slot.take();
        *slot = Some(Box::new(ChainNode { key, next }));

        self.len += 1;
        self.total_insertions += 1;
    }

    /// Returns the slot index holding `key`, or `None` if it is absent.
    pub fn lookup<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.index_of(key);
        self.chain(index)
            .any(|k| k.borrow() == key)
            .then_some(index)
    }

    /// Returns `true` if `key` is present.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup(key).is_some()
    }

    /// Unlinks the first node holding `key`. Returns whether a node was
    /// removed.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.take(key).is_some()
    }

    /// Unlinks the first node holding `key` and returns its key.
    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.index_of(key);
        let mut cursor = &mut self.slots[index];
        while cursor.as_ref().is_some_and(|node| node.key.borrow() != key) {
            cursor = &mut cursor.as_mut()?.next;
        }

        let node = cursor.take()?;
        let ChainNode { key, next } = *node;
        *cursor = next;

        self.len -= 1;
        self.total_insertions -= 1;
        Some(key)
    }

    /// Picks a random key: a uniformly random non-empty slot, then a uniformly
    /// random node of that slot's chain.
    ///
    /// Keys on short chains are therefore favoured over keys on long ones.
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
            let chain_len = self.chain_len(index);
            if chain_len == 0 {
                continue;
            }
            return self
                .chain(index)
                .nth(rng.random_range(0..chain_len))
                .ok_or(TableError::EmptyTable);
        }
    }
}

impl<K, S> ChainedTable<K, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates an empty table with `capacity` slots and the default hasher.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, S> ChainedTable<K, S>
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
    /// use collision_tables::ChainedTable;
    ///
    /// let table = ChainedTable::<String>::new(100, 0.5)?;
    /// assert_eq!(table.len(), 50);
    /// assert_eq!(table.load_factor(), 0.5);
    /// # Ok::<(), collision_tables::TableError>(())
    /// ```
    pub fn new(capacity: usize, load_factor: f64) -> Result<Self> {
        Self::with_config(&TableConfig::new(capacity).load_factor(load_factor))
    }

    /// Creates a table as described by `config`, pre-filled with generated
    /// keys.
    pub fn with_config(config: &TableConfig) -> Result<Self> {
        config.validate()?;

        let mut table = Self::with_capacity(config.capacity)?;
        table.load_factor = config.load_factor;
        prefill(&mut table, config, &mut KeyGenerator::for_config(config))?;
        Ok(table)
    }
}

impl<K, S> ChainedTable<K, S> {
    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of keys stored, duplicates included.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no key is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Running count of insertions minus successful removals.
    pub fn total_insertions(&self) -> usize {
        self.total_insertions
    }

    /// Target load factor the table was pre-filled to.
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Returns the hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Iterates the chain stored at `index`, head first. Out-of-range indices
    /// yield an empty chain.
    pub fn chain(&self, index: usize) -> Chain<'_, K> {
        Chain {
            next: self.slots.get(index).and_then(|link| link.as_deref()),
        }
    }

    /// Length of the chain stored at `index`.
    pub fn chain_len(&self, index: usize) -> usize {
        self.chain(index).count()
    }

    /// Number of slots holding at least one node.
    pub fn occupied_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterates every stored key, slot by slot.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            slots: self.slots.iter(),
            chain: Chain { next: None },
        }
    }

    /// Byte estimate of the table under `model`: one node cost per key plus
    /// one empty-slot cost per empty slot.
    pub fn memory_estimate(&self, model: &CostModel) -> usize {
        let empty = self.slots.len() - self.occupied_slots();
        model.chained(self.slots.len(), empty, self.len)
    }

    /// Removes every key, keeping the slot array.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            unlink_chain(slot.take());
        }
        self.len = 0;
        self.total_insertions = 0;
    }

    /// Chain-length histogram: bin `i` counts slots whose chain holds `i`
    /// nodes. The last bin collects every longer chain.
    #[cfg(feature = "stats")]
    pub fn chain_length_histogram(&self) -> crate::stats::Histogram {
        const BINS: usize = 16;

        let mut bins = alloc::vec![0usize; BINS + 1];
        for index in 0..self.slots.len() {
            bins[self.chain_len(index).min(BINS)] += 1;
        }
        crate::stats::Histogram::new("chain length", bins)
    }

    /// Occupancy and cost summary.
    #[cfg(feature = "stats")]
    pub fn stats(&self, model: &CostModel) -> crate::stats::TableStats {
        crate::stats::TableStats::new(
            Strategy::Chaining,
            self.len,
            self.slots.len(),
            self.occupied_slots(),
            self.memory_estimate(model),
        )
    }
}

/// Drops a chain node by node so long chains cannot exhaust the stack.
fn unlink_chain<K>(mut link: Link<K>) {
    while let Some(mut node) = link {
        link = node.next.take();
    }
}

impl<K, S> Drop for ChainedTable<K, S> {
    fn drop(&mut self) {
        for slot in &mut self.slots {
            unlink_chain(slot.take());
        }
    }
}

impl<K, S> Clone for ChainedTable<K, S>
where
    K: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        let slots = self
            .slots
            .iter()
            .map(|slot| {
                let keys: Vec<&K> = Chain {
                    next: slot.as_deref(),
                }
                .collect();
                keys.into_iter().rev().fold(None, |next, key| {
                    Some(Box::new(ChainNode {
                        key: key.clone(),
                        next,
                    }))
                })
            })
            .collect();

        Self {
            slots,
            len: self.len,
            total_insertions: self.total_insertions,
            load_factor: self.load_factor,
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, S> Debug for ChainedTable<K, S>
where
    K: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChainedTable")
            .field(
                "chains",
                &(0..self.slots.len())
                    .filter(|&index| self.slots[index].is_some())
                    .map(|index| {
                        let mut line = format!("[{index}]");
                        for key in self.chain(index) {
                            line.push_str(&format!("-->{key:?}"));
                        }
                        line
                    })
                    .collect::<Vec<String>>(),
            )
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .field("total_insertions", &self.total_insertions)
            .finish()
    }
}

impl<K, S> KeyTable<K> for ChainedTable<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn strategy(&self) -> Strategy {
        Strategy::Chaining
    }

    fn insert(&mut self, key: K) -> Result<()> {
        ChainedTable::insert(self, key);
        Ok(())
    }

    fn lookup<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        ChainedTable::lookup(self, key)
    }

    fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        ChainedTable::remove(self, key)
    }

    fn memory_estimate(&self, model: &CostModel) -> usize {
        ChainedTable::memory_estimate(self, model)
    }

    fn random_key<R>(&self, rng: &mut R) -> Result<&K>
    where
        R: Rng + ?Sized,
    {
        ChainedTable::random_key(self, rng)
    }

    fn capacity(&self) -> usize {
        ChainedTable::capacity(self)
    }

    fn len(&self) -> usize {
        ChainedTable::len(self)
    }

    fn total_insertions(&self) -> usize {
        ChainedTable::total_insertions(self)
    }
}

/// Iterator over one chain, head first.
pub struct Chain<'a, K> {
    next: Option<&'a ChainNode<K>>,
}

impl<'a, K> Iterator for Chain<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next.as_deref();
        Some(&node.key)
    }
}

/// Iterator over every key of a [`ChainedTable`]. The order is unspecified.
pub struct Iter<'a, K> {
    slots: core::slice::Iter<'a, Link<K>>,
    chain: Chain<'a, K>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.chain.next() {
                return Some(key);
            }
            self.chain = Chain {
                next: self.slots.next()?.as_deref(),
            };
        }
    }
}
