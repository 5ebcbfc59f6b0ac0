//! Size-bounded LRU cache with absolute per-entry expiry.
//!
//! Not synchronized; callers that share an instance wrap it in a mutex (see
//! `cache::locked`). Recency is tracked with a monotonically increasing
//! sequence number indexed by a `BTreeMap`, so promotion and tail eviction
//! are both logarithmic.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

struct Entry<V> {
    value: V,
    size: u64,
    expiry: Instant,
    seq: u64,
}

pub struct SizedLru<V> {
    entries: HashMap<String, Entry<V>>,
    // seq -> key, oldest first
    recency: BTreeMap<u64, String>,
    next_seq: u64,
    size: u64,
    max_size: u64,
}

impl<V> SizedLru<V> {
    #[must_use]
    pub fn new(max_size: u64) -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            next_seq: 0,
            size: 0,
            max_size,
        }
    }

    /// Insert or replace an entry. An entry larger than the whole cache is
    /// dropped without disturbing what is already stored. Re-adding an
    /// existing key applies the size delta and promotes the entry.
    pub fn add(&mut self, key: &str, value: V, size: u64, expiry: Instant) {
        if size > self.max_size {
            // value is too big for this cache
            return;
        }

        let seq = self.bump_seq();
        if let Some(entry) = self.entries.get_mut(key) {
            self.recency.remove(&entry.seq);
            self.recency.insert(seq, key.to_string());
            self.size = self.size - entry.size + size;
            entry.value = value;
            entry.size = size;
            entry.expiry = expiry;
            entry.seq = seq;
        } else {
            self.recency.insert(seq, key.to_string());
            self.entries.insert(
                key.to_string(),
                Entry {
                    value,
                    size,
                    expiry,
                    seq,
                },
            );
            self.size += size;
        }

        self.prune();
    }

    /// Fetch the value for `key`, promoting it to most recently used.
    /// Entries whose expiry has passed are removed and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.expiry <= Instant::now(),
            None => return None,
        };
        if expired {
            self.remove(key);
            return None;
        }

        let seq = self.bump_seq();
        let entry = self.entries.get_mut(key).expect("entry checked above");
        self.recency.remove(&entry.seq);
        self.recency.insert(seq, key.to_string());
        entry.seq = seq;
        Some(&entry.value)
    }

    /// Total size of all stored entries.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn prune(&mut self) {
        while self.size > self.max_size {
            let oldest = match self.recency.iter().next() {
                Some((_, key)) => key.clone(),
                None => break,
            };
            self.remove(&oldest);
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.recency.remove(&entry.seq);
            self.size -= entry.size;
        }
    }
}
