use std::{marker::PhantomData, ops::Index};

use petgraph::graph::NodeIndex;

/// Key types for the dense, index-addressed collections below.
/// The index space must be compact, so implementers are wrapper types around
/// some integer type.
pub trait IndexKey: Copy {
    fn index(self) -> usize;
}

impl IndexKey for NodeIndex {
    fn index(self) -> usize {
        NodeIndex::index(self)
    }
}

/// A map keyed by a compact index space, backed by a plain [Vec].
/// Cheaper than hashing when the keys are graph indices.
pub struct IndexMap<K: IndexKey, V> {
    data: Vec<Option<V>>,
    _marker: PhantomData<K>,
}

impl<K: IndexKey, V> IndexMap<K, V> {
    pub fn new(capacity: usize) -> Self {
        let mut data = Vec::new();
        data.resize_with(capacity, || None);

        IndexMap {
            data,
            _marker: PhantomData,
        }
    }

    pub fn contains_key(&self, key: K) -> bool {
        self.data.get(key.index()).is_some_and(|slot| slot.is_some())
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.data.get(key.index()).and_then(|slot| slot.as_ref())
    }

    pub fn insert(&mut self, key: K, value: V) {
        let index = key.index();
        if index >= self.data.len() {
            self.data.resize_with(index + 1, || None);
        }
        self.data[index] = Some(value);
    }
}

impl<K: IndexKey, V> Index<K> for IndexMap<K, V> {
    type Output = V;

    fn index(&self, key: K) -> &V {
        self.get(key).expect("key not present in IndexMap")
    }
}

/// A set over a compact index space, backed by a plain [Vec] of flags.
pub struct IndexSet<K: IndexKey> {
    data: Vec<bool>,
    len: usize,
    _marker: PhantomData<K>,
}

impl<K: IndexKey> IndexSet<K> {
    pub fn new(capacity: usize) -> Self {
        IndexSet {
            data: vec![false; capacity],
            len: 0,
            _marker: PhantomData,
        }
    }

    pub fn contains(&self, key: K) -> bool {
        self.data.get(key.index()).copied().unwrap_or(false)
    }

    /// Inserts the key, returning true if it was not present before.
    pub fn insert(&mut self, key: K) -> bool {
        let index = key.index();
        if index >= self.data.len() {
            self.data.resize(index + 1, false);
        }
        if self.data[index] {
            return false;
        }
        self.data[index] = true;
        self.len += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
