//! Bounded harmonization cache with insertion-order (FIFO) eviction
//!
//! Reads never reorder the eviction queue: this is deliberately not an LRU.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use tracing::debug;

use crate::config::HarmonyStyle;
use crate::harmony::HarmonizedVoice;
use crate::key::KeyMode;

pub const DEFAULT_MAX_SIZE: usize = 1024;

/// Everything a cached voicing depends on besides the engine-wide
/// voice count and harmony type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub pitch: u8,
    pub key_tonic: u8,
    pub key_mode: KeyMode,
    pub style: HarmonyStyle,
}

impl CacheKey {
    pub fn new(pitch: u8, key_tonic: u8, key_mode: KeyMode, style: HarmonyStyle) -> Self {
        Self { pitch, key_tonic, key_mode, style }
    }
}

#[derive(Debug, Clone)]
pub struct FifoCache<K, V> {
    entries: HashMap<K, V>,
    order: VecDeque<K>,
    max_size: usize,
    hits: u64,
    misses: u64,
}

pub type HarmonizationCache = FifoCache<CacheKey, Vec<HarmonizedVoice>>;

impl<K: Eq + Hash + Clone, V> FifoCache<K, V> {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: HashMap::with_capacity(max_size + 1),
            order: VecDeque::with_capacity(max_size + 1),
            max_size,
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace. A replaced entry keeps its place in the queue.
    pub fn set(&mut self, key: K, value: V) {
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = value;
            return;
        }

        self.entries.insert(key.clone(), value);
        self.order.push_back(key);

        while self.entries.len() > self.max_size {
            let Some(oldest) = self.order.pop_front() else { break };
            self.entries.remove(&oldest);
            debug!(size = self.entries.len(), "Evicted oldest cache entry");
        }
    }

    /// Cached value for `key`, computing and inserting it on a miss
    pub fn get_or_insert_with<F>(&mut self, key: K, compute: F) -> &V
    where
        F: FnOnce() -> V,
    {
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
            self.set(key.clone(), compute());
        }
        // A fresh insert sits at the back of the queue and survives eviction
        &self.entries[&key]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
