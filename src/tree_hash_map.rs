//! TreeHashMap: chained hash map with treeified buckets and an exposed
//! bucket array.

use crate::config::{TableConfig, MAXIMUM_CAPACITY};
use crate::error::ConfigError;
use crate::tree_bin::TreeBin;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use slotmap::{DefaultKey, SlotMap};

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
}

#[derive(Debug, Default)]
pub(crate) enum Bucket {
    #[default]
    Empty,
    Chain(Vec<DefaultKey>),
    Tree(TreeBin),
}

pub struct TreeHashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    config: TableConfig,
    // Allocated by the first insert.
    table: Option<Vec<Bucket>>,
    slots: SlotMap<DefaultKey, Entry<K, V>>, // entries; buckets hold their keys
    threshold: usize,
}

/// Fold the high half of the hash into the bits the index mask keeps.
#[inline]
fn spread(hash: u64) -> u64 {
    let h = hash ^ (hash >> 32);
    h ^ (h >> 16)
}

#[inline]
fn index_for(hash: u64, len: usize) -> usize {
    (spread(hash) as usize) & (len - 1)
}

fn empty_buckets(len: usize) -> Vec<Bucket> {
    let mut v = Vec::with_capacity(len);
    v.resize_with(len, Bucket::default);
    v
}

impl<K, V> TreeHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V> Default for TreeHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over immutable entries in `TreeHashMap`.
pub struct Iter<'a, K, V> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (&e.key, &e.value))
    }
}

/// Iterator over mutable entries in `TreeHashMap`.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (&e.key, &mut e.value))
    }
}

impl<K, V, S> TreeHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            config: TableConfig::default(),
            table: None,
            slots: SlotMap::with_key(),
            threshold: 0,
        }
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            hasher,
            config,
            table: None,
            slots: SlotMap::with_key(),
            threshold: 0,
        })
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Length of the bucket array; 0 until the first insert.
    pub fn capacity(&self) -> usize {
        self.table.as_ref().map_or(0, Vec::len)
    }

    pub(crate) fn buckets(&self) -> &[Bucket] {
        self.table.as_deref().unwrap_or(&[])
    }

    fn find_slot<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_slot_hashed(self.make_hash(q), q)
    }

    fn find_slot_hashed<Q>(&self, hash: u64, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let table = self.table.as_ref()?;
        let matches = |s: DefaultKey| {
            let e = &self.slots[s];
            e.hash == hash && e.key.borrow() == q
        };
        match &table[index_for(hash, table.len())] {
            Bucket::Empty => None,
            Bucket::Chain(chain) => chain.iter().copied().find(|&s| matches(s)),
            Bucket::Tree(tree) => tree.find(hash, matches),
        }
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_slot(q).map(|s| &self.slots[s].value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let s = self.find_slot(q)?;
        Some(&mut self.slots[s].value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_slot(q).is_some()
    }

    /// Insert or overwrite; returns the previous value for `key`.
    ///
    /// A chain that fills to the treeify threshold on an array smaller than
    /// the minimum treeify capacity grows the array. On a large enough
    /// array the chain is converted to a tree once it overflows the
    /// threshold. Independently, the array doubles when the entry count
    /// exceeds the load-factor threshold.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        if let Some(s) = self.find_slot_hashed(hash, &key) {
            return Some(core::mem::replace(&mut self.slots[s].value, value));
        }

        let slot = self.slots.insert(Entry { key, value, hash });
        let table = self.table_mut();
        let cap = table.len();
        let idx = index_for(hash, cap);
        let bucket = &mut table[idx];
        let chain_len = match bucket {
            Bucket::Chain(chain) => {
                chain.push(slot);
                Some(chain.len())
            }
            Bucket::Tree(tree) => {
                tree.insert(hash, slot);
                None
            }
            Bucket::Empty => {
                *bucket = Bucket::Chain(vec![slot]);
                Some(1)
            }
        };

        if let Some(n) = chain_len {
            let treeify_at = self.config.treeify_threshold();
            if cap < self.config.min_treeify_capacity() {
                if n >= treeify_at {
                    tracing::debug!(
                        bucket = idx,
                        chain = n,
                        "chain full on small table, growing"
                    );
                    self.resize();
                }
            } else if n > treeify_at {
                self.treeify(idx);
            }
        }
        if self.slots.len() > self.threshold {
            self.resize();
        }
        None
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.find_slot(q)?;
        let hash = self.slots[slot].hash;
        let untreeify_at = self.config.untreeify_threshold();
        let table = self.table.as_mut()?;
        let idx = index_for(hash, table.len());
        let bucket = &mut table[idx];
        match bucket {
            Bucket::Chain(chain) => {
                chain.retain(|&s| s != slot);
                if chain.is_empty() {
                    *bucket = Bucket::Empty;
                }
            }
            Bucket::Tree(tree) => {
                tree.remove(slot);
                if tree.len() <= untreeify_at {
                    let entries = tree.len();
                    let chain = core::mem::take(tree)
                        .into_slots()
                        .into_iter()
                        .map(|(_, s)| s)
                        .collect();
                    tracing::debug!(bucket = idx, entries, "untreeified bucket");
                    *bucket = Bucket::Chain(chain);
                }
            }
            Bucket::Empty => unreachable!("found entry must be linked from its bucket"),
        }
        self.slots.remove(slot).map(|e| e.value)
    }

    /// Remove every entry, keeping the bucket array at its current length.
    pub fn clear(&mut self) {
        if let Some(table) = self.table.as_mut() {
            table.iter_mut().for_each(|b| *b = Bucket::Empty);
        }
        self.slots.clear();
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.slots.iter_mut(),
        }
    }

    /// The bucket array, allocated at the initial capacity on first use.
    fn table_mut(&mut self) -> &mut Vec<Bucket> {
        let cap = self.config.initial_capacity();
        if self.table.is_none() {
            self.threshold = self.config.threshold_for(cap);
            tracing::debug!(len = cap, "allocated bucket array");
        }
        self.table.get_or_insert_with(|| empty_buckets(cap))
    }

    fn treeify(&mut self, idx: usize) {
        let Some(table) = self.table.as_mut() else {
            return;
        };
        let bucket = &mut table[idx];
        if let Bucket::Chain(chain) = bucket {
            let tree = TreeBin::from_slots(chain.iter().map(|&s| (self.slots[s].hash, s)));
            tracing::debug!(bucket = idx, entries = tree.len(), "treeified bucket");
            *bucket = Bucket::Tree(tree);
        }
    }

    /// Allocate the initial array, or double it and redistribute entries by
    /// their stored hash. Tree buckets that end up small become chains.
    fn resize(&mut self) {
        let old_cap = self.capacity();
        if old_cap >= MAXIMUM_CAPACITY {
            self.threshold = usize::MAX;
            return;
        }
        let new_cap = if old_cap == 0 {
            self.config.initial_capacity()
        } else {
            old_cap * 2
        };
        self.threshold = self.config.threshold_for(new_cap);

        let mut new_table = empty_buckets(new_cap);
        let old_table = self.table.take().unwrap_or_default();
        let untreeify_at = self.config.untreeify_threshold();
        for bucket in old_table {
            match bucket {
                Bucket::Empty => {}
                Bucket::Chain(chain) => {
                    for s in chain {
                        let dst = &mut new_table[index_for(self.slots[s].hash, new_cap)];
                        match dst {
                            Bucket::Chain(c) => c.push(s),
                            _ => *dst = Bucket::Chain(vec![s]),
                        }
                    }
                }
                Bucket::Tree(tree) => {
                    // Each old bucket splits into at most two new ones.
                    let mut parts: Vec<(usize, Vec<(u64, DefaultKey)>)> =
                        Vec::with_capacity(2);
                    for (hash, s) in tree.into_slots() {
                        let i = index_for(hash, new_cap);
                        match parts.iter_mut().find(|(pi, _)| *pi == i) {
                            Some((_, part)) => part.push((hash, s)),
                            None => parts.push((i, vec![(hash, s)])),
                        }
                    }
                    for (i, part) in parts {
                        new_table[i] = if part.len() <= untreeify_at {
                            tracing::debug!(bucket = i, entries = part.len(), "untreeified bucket");
                            Bucket::Chain(part.into_iter().map(|(_, s)| s).collect())
                        } else {
                            Bucket::Tree(TreeBin::from_slots(part))
                        };
                    }
                }
            }
        }
        self.table = Some(new_table);
        tracing::debug!(
            from = old_cap,
            to = new_cap,
            len = self.slots.len(),
            "resized bucket array"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::IdentityBuildHasher;
    use std::collections::BTreeSet;

    fn identity_map() -> TreeHashMap<i32, String, IdentityBuildHasher> {
        TreeHashMap::with_hasher(IdentityBuildHasher)
    }

    fn kinds(m: &TreeHashMap<i32, String, IdentityBuildHasher>) -> (usize, usize) {
        let trees = m
            .buckets()
            .iter()
            .filter(|b| matches!(b, Bucket::Tree(_)))
            .count();
        let linked: usize = m
            .buckets()
            .iter()
            .map(|b| match b {
                Bucket::Empty => 0,
                Bucket::Chain(c) => c.len(),
                Bucket::Tree(t) => t.len(),
            })
            .sum();
        (trees, linked)
    }

    /// Invariant: the bucket array is not allocated until the first insert.
    #[test]
    fn table_is_lazily_allocated() {
        let mut m = identity_map();
        assert_eq!(m.capacity(), 0);
        assert!(m.buckets().is_empty());
        m.insert(1, "a".into());
        assert_eq!(m.capacity(), 16);
        // First allocation also arms the load-factor threshold (12 of 16).
        for k in 2..=12 {
            m.insert(k, "b".into());
        }
        assert_eq!(m.capacity(), 16);
        m.insert(13, "c".into());
        assert_eq!(m.capacity(), 32);
    }

    /// Invariant: inserting an existing key overwrites and returns the old value.
    #[test]
    fn insert_overwrites_existing_key() {
        let mut m = identity_map();
        assert_eq!(m.insert(5, "a".into()), None);
        assert_eq!(m.insert(5, "b".into()), Some("a".to_string()));
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&5).map(String::as_str), Some("b"));
    }

    /// Invariant: a full chain on a table under 64 slots grows the table
    /// instead of converting the bucket.
    #[test]
    fn full_chain_grows_small_table() {
        let mut m = identity_map();
        for k in 1..=7 {
            m.insert(k * 16, String::new());
        }
        assert_eq!(m.capacity(), 16);
        m.insert(8 * 16, String::new());
        assert_eq!(m.capacity(), 32);
        assert_eq!(kinds(&m), (0, 8));
    }

    /// Invariant: on a 64-slot table a chain becomes a tree once it holds
    /// more than eight entries, and every entry stays reachable.
    #[test]
    fn overflowing_chain_is_treeified() {
        let cfg = TableConfig::new().with_initial_capacity(64);
        let mut m: TreeHashMap<i32, String, IdentityBuildHasher> =
            TreeHashMap::with_config_and_hasher(cfg, IdentityBuildHasher).unwrap();
        for k in 1..=8 {
            m.insert(k * 64, k.to_string());
        }
        assert_eq!(kinds(&m), (0, 8));
        m.insert(9 * 64, "9".into());
        assert_eq!(kinds(&m), (1, 9));
        assert_eq!(m.capacity(), 64);
        for k in 1..=9 {
            assert_eq!(m.get(&(k * 64)), Some(&k.to_string()));
        }
        // Tree buckets accept further colliding inserts.
        m.insert(10 * 64, "10".into());
        assert_eq!(kinds(&m), (1, 10));
        assert!(m.contains_key(&640));
    }

    /// Invariant: removing from a tree bucket down to the untreeify threshold
    /// reverts it to a chain.
    #[test]
    fn shrinking_tree_reverts_to_chain() {
        let cfg = TableConfig::new().with_initial_capacity(64);
        let mut m: TreeHashMap<i32, String, IdentityBuildHasher> =
            TreeHashMap::with_config_and_hasher(cfg, IdentityBuildHasher).unwrap();
        for k in 1..=9 {
            m.insert(k * 64, String::new());
        }
        assert_eq!(kinds(&m).0, 1);
        for k in 1..=2 {
            assert_eq!(m.remove(&(k * 64)), Some(String::new()));
            assert_eq!(kinds(&m).0, 1);
        }
        m.remove(&(3 * 64));
        assert_eq!(kinds(&m), (0, 6));
        assert!(m.contains_key(&(9 * 64)));
    }

    /// Invariant: a resize splits a tree bucket and re-chains halves at or
    /// below the untreeify threshold.
    #[test]
    fn resize_splits_tree_bucket() {
        let cfg = TableConfig::new()
            .with_initial_capacity(64)
            .with_load_factor(0.25);
        let mut m: TreeHashMap<i32, String, IdentityBuildHasher> =
            TreeHashMap::with_config_and_hasher(cfg, IdentityBuildHasher).unwrap();
        // Threshold is 16; nine keys collide in bucket 0 of 64 and split
        // evenly across buckets 0 and 64 of 128.
        for k in 1..=9 {
            m.insert(k * 64, String::new());
        }
        assert_eq!(kinds(&m), (1, 9));
        for k in 0..8 {
            m.insert(k * 2 + 1, String::new());
        }
        assert_eq!(m.capacity(), 128);
        assert_eq!(kinds(&m), (0, 17));
        for k in 1..=9 {
            assert!(m.contains_key(&(k * 64)));
        }
    }

    /// Invariant: load-factor growth doubles the table past 0.75 * capacity.
    #[test]
    fn load_factor_growth() {
        let mut m = identity_map();
        for k in 0..12 {
            m.insert(k, String::new());
        }
        assert_eq!(m.capacity(), 16);
        m.insert(12, String::new());
        assert_eq!(m.capacity(), 32);
    }

    /// Invariant: `clear` drops entries but keeps the bucket array length.
    #[test]
    fn clear_keeps_capacity() {
        let mut m = identity_map();
        for k in 0..20 {
            m.insert(k, String::new());
        }
        let cap = m.capacity();
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.capacity(), cap);
        assert_eq!(kinds(&m), (0, 0));
        assert!(!m.contains_key(&3));
    }

    /// Invariant: borrowed lookups work (store `String`, query with `&str`).
    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: TreeHashMap<String, i32> = TreeHashMap::new();
        m.insert("hello".to_string(), 1);
        assert!(m.contains_key("hello"));
        assert!(!m.contains_key("world"));
        *m.get_mut("hello").unwrap() += 1;
        assert_eq!(m.get("hello"), Some(&2));
        assert_eq!(m.remove("hello"), Some(2));
        assert!(m.is_empty());
    }

    /// Invariant: iteration yields each entry once; `iter_mut` updates values.
    #[test]
    fn iteration_and_mutation() {
        let mut m = identity_map();
        for k in [3, 19, 35] {
            m.insert(k, k.to_string());
        }
        let seen: BTreeSet<i32> = m.iter().map(|(k, _)| *k).collect();
        assert_eq!(seen, BTreeSet::from([3, 19, 35]));
        for (_, v) in m.iter_mut() {
            v.push('!');
        }
        assert_eq!(m.get(&19).map(String::as_str), Some("19!"));
    }

    /// Invariant: `insert` hashes its key once, whether it adds a new entry
    /// or overwrites an existing one.
    #[test]
    fn insert_hashes_key_once() {
        use std::cell::Cell;
        use std::rc::Rc;

        struct CountingBuildHasher(Rc<Cell<usize>>);
        impl BuildHasher for CountingBuildHasher {
            type Hasher = crate::hasher::IdentityHasher;
            fn build_hasher(&self) -> Self::Hasher {
                self.0.set(self.0.get() + 1);
                Default::default()
            }
        }

        let calls = Rc::new(Cell::new(0));
        let mut m: TreeHashMap<i32, &str, CountingBuildHasher> =
            TreeHashMap::with_hasher(CountingBuildHasher(calls.clone()));
        m.insert(1, "a");
        assert_eq!(calls.get(), 1);
        m.insert(1, "b");
        assert_eq!(calls.get(), 2);
        // The 8th colliding key grows the table; redistribution reuses stored hashes.
        for k in 1..=8 {
            m.insert(k * 16, "c");
        }
        assert_eq!(calls.get(), 10);
        assert_eq!(m.capacity(), 32);
    }

    /// Invariant: invalid configurations are rejected at construction.
    #[test]
    fn invalid_config_rejected() {
        let cfg = TableConfig::new().with_load_factor(-1.0);
        assert!(TreeHashMap::<i32, i32>::with_config(cfg).is_err());
    }
}
