//! A fixed-capacity hash table with separate chaining, keyed by identity.
//!
//! Entries live in a slot arena and each bucket holds the index of the head
//! of its chain. Removed slots go onto a free list and are reused by later
//! inserts, so the arena only grows when every slot is occupied.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::error::Error;
use crate::error::Result;
use crate::strategy::HashStrategy;

/// Index of a slot in the arena, or the end of a chain / free list.
type Link = Option<usize>;

struct Node<'k, K: ?Sized, V> {
    key: &'k K,
    value: V,
    next: Link,
}

impl<K: ?Sized, V: Clone> Clone for Node<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            value: self.value.clone(),
            next: self.next,
        }
    }
}

enum Slot<'k, K: ?Sized, V> {
    Occupied(Node<'k, K, V>),
    Vacant { next_free: Link },
}

impl<K: ?Sized, V: Clone> Clone for Slot<'_, K, V> {
    fn clone(&self) -> Self {
        match self {
            Slot::Occupied(node) => Slot::Occupied(node.clone()),
            Slot::Vacant { next_free } => Slot::Vacant {
                next_free: *next_free,
            },
        }
    }
}

impl<'k, K: ?Sized, V> Slot<'k, K, V> {
    #[inline(always)]
    fn node(&self) -> &Node<'k, K, V> {
        match self {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("chain links only point at occupied slots"),
        }
    }

    #[inline(always)]
    fn node_mut(&mut self) -> &mut Node<'k, K, V> {
        match self {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("chain links only point at occupied slots"),
        }
    }
}

/// Walks one bucket's chain from head to tail.
struct Chain<'a, 'k, K: ?Sized, V> {
    slots: &'a [Slot<'k, K, V>],
    cursor: Link,
}

impl<'a, 'k, K: ?Sized, V> Iterator for Chain<'a, 'k, K, V> {
    type Item = (usize, &'a Node<'k, K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let node = self.slots[index].node();
        self.cursor = node.next;
        Some((index, node))
    }
}

/// A fixed-capacity hash table that resolves collisions by chaining.
///
/// `HashTable<'k, K, V, H>` maps borrowed keys `&'k K` to values `V`. Keys are
/// compared by address, never by contents: two keys that look the same but
/// live at different addresses are different keys. The borrow checker makes
/// every key outlive the table holding it. To leave the value payload with the
/// caller as well, store references (`V = &'k T`).
///
/// The number of buckets is chosen at construction and never changes. The
/// hash strategy `H` decides which bucket a key belongs to; the table checks
/// that answer but never hashes anything itself. Within a bucket, the most
/// recently inserted key is found first.
///
/// The table does no internal locking. To share one between threads, wrap it
/// in a single lock held for the duration of each operation.
///
/// ## Example
///
/// ```rust
/// # use chain_hash::AddressModulo;
/// # use chain_hash::HashTable;
/// #
/// let key1 = "key1";
/// let key2 = "key2";
///
/// let mut table = HashTable::with_capacity(5, AddressModulo).unwrap();
/// table.set(&key1, "val1").unwrap();
/// table.set(&key2, "val2").unwrap();
///
/// assert_eq!(table.size(), 5);
/// assert_eq!(table.get(&key1).unwrap(), Some(&"val1"));
///
/// table.set(&key1, "val2").unwrap();
/// assert_eq!(table.pop(&key1).unwrap(), Some("val2"));
/// assert_eq!(table.get(&key1).unwrap(), None);
/// assert_eq!(table.get(&key2).unwrap(), Some(&"val2"));
/// ```
pub struct HashTable<'k, K: ?Sized, V, H> {
    heads: Vec<Link>,
    slots: Vec<Slot<'k, K, V>>,
    free: Link,

    populated: usize,

    strategy: H,
}

impl<K, V, H> Debug for HashTable<'_, K, V, H>
where
    K: Debug + ?Sized,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct DebugChain<'t, 'k, K: ?Sized, V, H> {
            table: &'t HashTable<'k, K, V, H>,
            bucket: usize,
        }

        impl<K: Debug + ?Sized, V: Debug, H> Debug for DebugChain<'_, '_, K, V, H> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_list()
                    .entries(
                        self.table
                            .chain(self.bucket)
                            .map(|(_, node)| (node.key, &node.value)),
                    )
                    .finish()
            }
        }

        f.debug_struct("HashTable")
            .field("capacity", &self.size())
            .field("populated", &self.populated)
            .field(
                "buckets",
                &(0..self.size())
                    .map(|bucket| DebugChain {
                        table: self,
                        bucket,
                    })
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<K, V, H> Clone for HashTable<'_, K, V, H>
where
    K: ?Sized,
    V: Clone,
    H: Clone,
{
    fn clone(&self) -> Self {
        Self {
            heads: self.heads.clone(),
            slots: self.slots.clone(),
            free: self.free,
            populated: self.populated,
            strategy: self.strategy.clone(),
        }
    }
}

impl<'k, K: ?Sized, V, H> HashTable<'k, K, V, H> {
    /// Returns the number of buckets.
    ///
    /// This is the capacity given at construction, not the number of stored
    /// entries; see [`len`](Self::len) for that.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::AddressModulo;
    /// # use chain_hash::HashTable;
    /// #
    /// let key = 1u8;
    /// let mut table = HashTable::with_capacity(5, AddressModulo).unwrap();
    /// table.set(&key, ()).unwrap();
    /// assert_eq!(table.size(), 5);
    /// assert_eq!(table.len(), 1);
    /// ```
    #[inline]
    pub fn size(&self) -> usize {
        self.heads.len()
    }

    /// Returns the number of entries stored in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the hash strategy chosen at construction.
    pub fn strategy(&self) -> &H {
        &self.strategy
    }

    /// Removes every entry, keeping the bucket count and the entry storage.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::AddressModulo;
    /// # use chain_hash::HashTable;
    /// #
    /// let key = 'k';
    /// let mut table = HashTable::with_capacity(3, AddressModulo).unwrap();
    /// table.set(&key, 1).unwrap();
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.get(&key).unwrap(), None);
    /// ```
    pub fn clear(&mut self) {
        self.heads.fill(None);
        self.slots.clear();
        self.free = None;
        self.populated = 0;
    }

    #[inline]
    fn chain(&self, bucket: usize) -> Chain<'_, 'k, K, V> {
        Chain {
            slots: &self.slots,
            cursor: self.heads[bucket],
        }
    }

    /// Takes the value out of an unlinked slot and pushes the slot onto the
    /// free list.
    fn release(&mut self, index: usize) -> V {
        let slot = core::mem::replace(
            &mut self.slots[index],
            Slot::Vacant {
                next_free: self.free,
            },
        );
        self.free = Some(index);
        self.populated -= 1;

        match slot {
            Slot::Occupied(node) => node.value,
            Slot::Vacant { .. } => unreachable!("released a slot that was already vacant"),
        }
    }
}

impl<'k, K, V, H> HashTable<'k, K, V, H>
where
    K: ?Sized,
    H: HashStrategy<K>,
{
    /// Creates a table with `capacity` buckets that places keys with
    /// `strategy`.
    ///
    /// # Errors
    ///
    /// - [`Error::ZeroCapacity`] if `capacity` is zero.
    /// - [`Error::AllocationFailed`] if the bucket array cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::AddressModulo;
    /// # use chain_hash::Error;
    /// # use chain_hash::HashTable;
    /// #
    /// let table: HashTable<u64, &str, _> = HashTable::with_capacity(7, AddressModulo).unwrap();
    /// assert_eq!(table.size(), 7);
    ///
    /// let empty = HashTable::<u64, &str, _>::with_capacity(0, AddressModulo);
    /// assert_eq!(empty.unwrap_err(), Error::ZeroCapacity);
    /// ```
    pub fn with_capacity(capacity: usize, strategy: H) -> Result<Self> {
        if capacity == 0 {
            warn_event!("rejected hash table with zero buckets");
            return Err(Error::ZeroCapacity);
        }

        let mut heads = Vec::new();
        if let Err(err) = heads.try_reserve_exact(capacity) {
            warn_event!(capacity, "failed to allocate bucket array");
            return Err(err.into());
        }
        heads.resize(capacity, None);

        debug_event!(capacity, "hash table constructed");

        Ok(Self {
            heads,
            slots: Vec::new(),
            free: None,
            populated: 0,
            strategy,
        })
    }

    /// Associates `value` with `key`.
    ///
    /// If `key` is already present its value is replaced in place and the old
    /// value is returned; the entry keeps its position in the chain. Otherwise
    /// a new entry becomes the head of the key's chain and `None` is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::BucketOutOfRange`] if the strategy misplaces `key`.
    /// - [`Error::AllocationFailed`] if a new entry cannot be stored. `value`
    ///   is dropped and the table is unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::AddressModulo;
    /// # use chain_hash::HashTable;
    /// #
    /// let key = String::from("key");
    /// let mut table = HashTable::with_capacity(11, AddressModulo).unwrap();
    ///
    /// assert_eq!(table.set(&key, 1).unwrap(), None);
    /// assert_eq!(table.set(&key, 2).unwrap(), Some(1));
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn set(&mut self, key: &'k K, value: V) -> Result<Option<V>> {
        let bucket = self.bucket_for(key)?;

        if let Some(index) = self.find_in(bucket, key) {
            let node = self.slots[index].node_mut();
            return Ok(Some(core::mem::replace(&mut node.value, value)));
        }

        self.reserve_slot()?;
        let next = self.heads[bucket];
        let index = self.occupy(Node { key, value, next });
        self.heads[bucket] = Some(index);
        self.populated += 1;

        Ok(None)
    }

    /// Returns a reference to the value stored for `key`, or `None` if the key
    /// is absent.
    ///
    /// # Errors
    ///
    /// [`Error::BucketOutOfRange`] if the strategy misplaces `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::AddressModulo;
    /// # use chain_hash::HashTable;
    /// #
    /// let key = [1u8, 2, 3];
    /// let twin = [1u8, 2, 3];
    /// let mut table = HashTable::with_capacity(13, AddressModulo).unwrap();
    /// table.set(&key, "bytes").unwrap();
    ///
    /// assert_eq!(table.get(&key).unwrap(), Some(&"bytes"));
    /// // Equal contents, different key.
    /// assert_eq!(table.get(&twin).unwrap(), None);
    /// ```
    pub fn get(&self, key: &K) -> Result<Option<&V>> {
        let bucket = self.bucket_for(key)?;
        Ok(self
            .find_in(bucket, key)
            .map(|index| &self.slots[index].node().value))
    }

    /// Returns a mutable reference to the value stored for `key`, or `None`
    /// if the key is absent.
    ///
    /// # Errors
    ///
    /// [`Error::BucketOutOfRange`] if the strategy misplaces `key`.
    pub fn get_mut(&mut self, key: &K) -> Result<Option<&mut V>> {
        let bucket = self.bucket_for(key)?;
        Ok(self
            .find_in(bucket, key)
            .map(|index| &mut self.slots[index].node_mut().value))
    }

    /// Returns `true` if `key` is present.
    ///
    /// # Errors
    ///
    /// [`Error::BucketOutOfRange`] if the strategy misplaces `key`.
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        let bucket = self.bucket_for(key)?;
        Ok(self.find_in(bucket, key).is_some())
    }

    /// Removes `key` and returns the value it held at the time of the call,
    /// or `None` if the key is absent (the table is then unchanged).
    ///
    /// The entry is unlinked by pointing its predecessor (or the bucket) at
    /// its successor. No other entry moves, so references to the remaining
    /// entries stay valid.
    ///
    /// # Errors
    ///
    /// [`Error::BucketOutOfRange`] if the strategy misplaces `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::AddressModulo;
    /// # use chain_hash::HashTable;
    /// #
    /// let key = 10i64;
    /// let mut table = HashTable::with_capacity(3, AddressModulo).unwrap();
    /// table.set(&key, "ten").unwrap();
    ///
    /// assert_eq!(table.pop(&key).unwrap(), Some("ten"));
    /// assert_eq!(table.pop(&key).unwrap(), None);
    /// assert!(table.is_empty());
    /// ```
    pub fn pop(&mut self, key: &K) -> Result<Option<V>> {
        let bucket = self.bucket_for(key)?;

        let mut prev: Link = None;
        let mut cursor = self.heads[bucket];
        while let Some(index) = cursor {
            let node = self.slots[index].node();
            if core::ptr::eq(node.key, key) {
                let next = node.next;
                match prev {
                    Some(prev) => self.slots[prev].node_mut().next = next,
                    None => self.heads[bucket] = next,
                }
                return Ok(Some(self.release(index)));
            }

            prev = Some(index);
            cursor = node.next;
        }

        Ok(None)
    }

    /// Makes room for at least `additional` more entries, so that many
    /// inserts of new keys will not allocate.
    ///
    /// Slots freed by [`pop`](Self::pop) count towards the room already
    /// available. This never changes the number of buckets.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailed`] if the entry storage cannot grow; the table
    /// is unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::AddressModulo;
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table: HashTable<u32, u32, _> = HashTable::with_capacity(5, AddressModulo).unwrap();
    /// table.reserve(100).unwrap();
    /// assert!(table.reserve(usize::MAX).is_err());
    /// assert_eq!(table.size(), 5);
    /// ```
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let vacant = self.slots.len() - self.populated;
        let needed = additional.saturating_sub(vacant);
        if let Err(err) = self.slots.try_reserve(needed) {
            warn_event!(additional, "failed to reserve entry storage");
            return Err(err.into());
        }
        Ok(())
    }

    /// Asks the strategy for `key`'s bucket and checks the answer.
    #[inline]
    fn bucket_for(&self, key: &K) -> Result<usize> {
        let capacity = self.heads.len();
        let index = self.strategy.bucket_index(capacity, key);
        if index >= capacity {
            warn_event!(index, capacity, "hash strategy returned an out-of-range bucket");
            return Err(Error::BucketOutOfRange { index, capacity });
        }
        Ok(index)
    }

    #[inline]
    fn find_in(&self, bucket: usize, key: &K) -> Option<usize> {
        self.chain(bucket)
            .find(|(_, node)| core::ptr::eq(node.key, key))
            .map(|(index, _)| index)
    }

    /// Ensures the next [`occupy`](Self::occupy) will not allocate.
    fn reserve_slot(&mut self) -> Result<()> {
        if self.free.is_some() {
            return Ok(());
        }

        if let Err(err) = self.slots.try_reserve(1) {
            warn_event!(populated = self.populated, "failed to allocate entry");
            return Err(err.into());
        }
        Ok(())
    }

    /// Stores `node` in a free slot, or a new one, and returns its index.
    fn occupy(&mut self, node: Node<'k, K, V>) -> usize {
        match self.free {
            Some(index) => {
                let next_free = match self.slots[index] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
                };
                self.free = next_free;
                self.slots[index] = Slot::Occupied(node);
                index
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                self.slots.len() - 1
            }
        }
    }
}

/// Number of buckets per chain length.
///
/// `counts()[n]` is the number of buckets whose chain holds exactly `n`
/// entries.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHistogram {
    counts: Vec<usize>,
}

#[cfg(feature = "stats")]
impl ChainHistogram {
    /// Bucket counts indexed by chain length.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Length of the longest chain.
    pub fn longest(&self) -> usize {
        self.counts.len().saturating_sub(1)
    }

    /// Pretty-print the histogram.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let total: usize = self.counts.iter().sum();
        println!("=== Chain Length Histogram ===");
        for (length, &count) in self.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            println!(
                "{length:>4}: {count:>8} ({:.2}%)",
                if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64 * 100.0
                }
            );
        }
    }
}

/// Debug statistics for hash table analysis.
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries currently in the table
    pub populated: usize,
    /// Number of buckets
    pub capacity: usize,
    /// Number of buckets holding at least one entry
    pub occupied_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Load factor (populated / capacity)
    pub load_factor: f64,
    /// Entry slots allocated, occupied or not
    pub arena_slots: usize,
    /// Entry slots waiting on the free list
    pub free_slots: usize,
}

#[cfg(feature = "stats")]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {} in {} buckets ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Bucket Usage: {}/{} ({:.2}%)",
            self.occupied_buckets,
            self.capacity,
            self.occupied_buckets as f64 / self.capacity as f64 * 100.0
        );
        println!("Longest Chain: {}", self.longest_chain);
        println!(
            "Entry Slots: {} allocated, {} free",
            self.arena_slots, self.free_slots
        );
    }
}

#[cfg(feature = "stats")]
impl<K: ?Sized, V, H> HashTable<'_, K, V, H> {
    /// Counts buckets by chain length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let keys = [0u8; 3];
    /// let mut table = HashTable::with_capacity(4, |_: usize, _: &u8| 2usize).unwrap();
    /// for key in &keys {
    ///     table.set(key, ()).unwrap();
    /// }
    /// assert_eq!(table.chain_histogram().counts(), &[3, 0, 0, 1]);
    /// ```
    pub fn chain_histogram(&self) -> ChainHistogram {
        let mut counts = alloc::vec![0usize; 1];
        for bucket in 0..self.size() {
            let length = self.chain(bucket).count();
            if length >= counts.len() {
                counts.resize(length + 1, 0);
            }
            counts[length] += 1;
        }
        ChainHistogram { counts }
    }

    /// Collects occupancy statistics.
    pub fn debug_stats(&self) -> DebugStats {
        let histogram = self.chain_histogram();
        DebugStats {
            populated: self.populated,
            capacity: self.size(),
            occupied_buckets: self.size() - histogram.counts()[0],
            longest_chain: histogram.longest(),
            load_factor: self.populated as f64 / self.size() as f64,
            arena_slots: self.slots.len(),
            free_slots: self.slots.len() - self.populated,
        }
    }
}
