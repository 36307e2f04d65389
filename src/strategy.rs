use core::hash::BuildHasher;

/// Maps a key to the bucket that holds it.
///
/// Implementations must be pure: the same key and capacity always produce the
/// same index, and the index must lie in `0..capacity`. A [`HashTable`] checks
/// the index before using it and reports
/// [`Error::BucketOutOfRange`](crate::Error::BucketOutOfRange) instead of
/// indexing out of bounds.
///
/// Keys are compared by identity, so a strategy should derive the index from
/// the key's address (see [`address_of`]) rather than from its contents.
/// Hashing contents is allowed, but two equal-looking keys remain distinct
/// keys either way.
///
/// Any `Fn(usize, &K) -> usize` closure is a strategy:
///
/// ```rust
/// # use chain_hash::HashTable;
/// let key = 6;
/// let mut table = HashTable::with_capacity(4, |_capacity: usize, key: &u32| (*key % 4) as usize)
///     .unwrap();
/// table.set(&key, "six").unwrap();
/// assert_eq!(table.get(&key).unwrap(), Some(&"six"));
/// ```
///
/// [`HashTable`]: crate::HashTable
pub trait HashStrategy<K: ?Sized> {
    /// Returns the bucket index for `key` in a table with `capacity` buckets.
    fn bucket_index(&self, capacity: usize, key: &K) -> usize;
}

impl<K, F> HashStrategy<K> for F
where
    K: ?Sized,
    F: Fn(usize, &K) -> usize,
{
    #[inline]
    fn bucket_index(&self, capacity: usize, key: &K) -> usize {
        self(capacity, key)
    }
}

/// Returns the address a key reference points at, the quantity keys are
/// compared by.
#[inline(always)]
pub fn address_of<K: ?Sized>(key: &K) -> usize {
    core::ptr::from_ref(key).cast::<()>().addr()
}

/// Fixed-point reduction of a 64-bit hash into `0..capacity`.
#[inline(always)]
fn reduce(hash: u64, capacity: usize) -> usize {
    ((hash as u128 * capacity as u128) >> 64) as usize
}

/// The classic policy: the key's address modulo the capacity.
///
/// Addresses are aligned, so the low bits carry little entropy. This works
/// well with a prime bucket count and poorly with a power of two; prefer
/// [`BuildHasherStrategy`] when the capacity is not under your control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressModulo;

impl<K: ?Sized> HashStrategy<K> for AddressModulo {
    #[inline]
    fn bucket_index(&self, capacity: usize, key: &K) -> usize {
        address_of(key).checked_rem(capacity).unwrap_or(0)
    }
}

/// Hashes the key's address with a [`BuildHasher`] and spreads the result
/// across the buckets.
///
/// # Examples
///
/// ```rust
/// # use core::hash::BuildHasherDefault;
/// # use std::collections::hash_map::DefaultHasher;
/// #
/// # use chain_hash::BuildHasherStrategy;
/// # use chain_hash::HashStrategy;
/// #
/// let strategy = BuildHasherStrategy::new(BuildHasherDefault::<DefaultHasher>::default());
/// let key = String::from("key");
/// let index = strategy.bucket_index(16, &key);
/// assert!(index < 16);
/// assert_eq!(index, strategy.bucket_index(16, &key));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildHasherStrategy<S> {
    build_hasher: S,
}

impl<S> BuildHasherStrategy<S> {
    /// Creates a strategy hashing with `build_hasher`.
    pub const fn new(build_hasher: S) -> Self {
        Self { build_hasher }
    }

    /// Returns the hasher builder in use.
    pub fn build_hasher(&self) -> &S {
        &self.build_hasher
    }
}

impl<K, S> HashStrategy<K> for BuildHasherStrategy<S>
where
    K: ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn bucket_index(&self, capacity: usize, key: &K) -> usize {
        reduce(self.build_hasher.hash_one(address_of(key)), capacity)
    }
}

/// Address hashing with foldhash's fixed-seed hasher.
#[cfg(feature = "foldhash")]
pub type FoldHashStrategy = BuildHasherStrategy<foldhash::fast::FixedState>;

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec::Vec;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Clone)]
    struct SipHashBuilder {
        k0: u64,
        k1: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap_or(0),
                k1: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    #[test]
    fn address_tracks_identity_not_contents() {
        let a = Box::new(17u64);
        let b = Box::new(17u64);
        assert_eq!(a, b);
        assert_ne!(address_of(&*a), address_of(&*b));
        assert_eq!(address_of(&*a), address_of(&*a));
    }

    #[test]
    fn address_modulo_stays_in_range() {
        let keys: Vec<Box<u64>> = (0..64).map(Box::new).collect();
        for capacity in [1, 2, 5, 7, 31] {
            for key in &keys {
                let index = AddressModulo.bucket_index(capacity, &**key);
                assert!(index < capacity);
                assert_eq!(index, address_of(&**key) % capacity);
            }
        }
    }

    #[test]
    fn address_modulo_tolerates_zero_capacity() {
        let key = 3u8;
        assert_eq!(AddressModulo.bucket_index(0, &key), 0);
    }

    #[test]
    fn build_hasher_strategy_is_deterministic_and_in_range() {
        let strategy = BuildHasherStrategy::new(SipHashBuilder::default());
        let keys: Vec<Box<u64>> = (0..256).map(Box::new).collect();
        for capacity in [1, 3, 16, 1000] {
            for key in &keys {
                let index = strategy.bucket_index(capacity, &**key);
                assert!(index < capacity);
                assert_eq!(index, strategy.bucket_index(capacity, &**key));
            }
        }
    }

    #[test]
    fn build_hasher_strategy_spreads_keys() {
        let strategy = BuildHasherStrategy::new(SipHashBuilder::default());
        let keys: Vec<Box<u64>> = (0..1024).map(Box::new).collect();
        let mut counts = [0usize; 16];
        for key in &keys {
            counts[strategy.bucket_index(16, &**key)] += 1;
        }
        assert!(counts.iter().all(|&count| count > 0), "{counts:?}");
    }

    #[test]
    fn closures_are_strategies() {
        let strategy = |capacity: usize, key: &str| key.len() % capacity;
        assert_eq!(strategy.bucket_index(4, "hello"), 1);
        assert_eq!(strategy.bucket_index(4, "four"), 0);
    }

    #[cfg(feature = "foldhash")]
    #[test]
    fn foldhash_strategy_in_range() {
        let strategy = FoldHashStrategy::default();
        let keys: Vec<Box<u32>> = (0..128).map(Box::new).collect();
        for key in &keys {
            assert!(strategy.bucket_index(13, &**key) < 13);
        }
    }
}
