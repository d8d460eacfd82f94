//! Content-hash dedup ring
//!
//! A probabilistic set of content hashes already processed this run. The
//! persistent cache already prevents re-downloads across runs; the ring
//! prevents re-processing identical bytes served under different URLs
//! (session-tagged URLs, mirrored pages) within one run. False positives
//! skip a genuinely new page at the configured error rate; false negatives
//! cannot occur. The ring is process-local and never persisted.

use bloom::{BloomFilter, ASMS};
use std::sync::Mutex;

/// Default capacity of the ring
pub const DEFAULT_CAPACITY: u32 = 1_000_000;

/// Default false-positive rate
pub const DEFAULT_ERROR_RATE: f32 = 0.00001;

/// Thread-safe bloom filter over content-hash digests
pub struct DedupRing {
    filter: Mutex<BloomFilter>,
}

impl DedupRing {
    /// Creates a ring with the given capacity and false-positive rate
    pub fn new(capacity: u32, error_rate: f32) -> Self {
        Self {
            filter: Mutex::new(BloomFilter::with_rate(error_rate, capacity)),
        }
    }

    /// Returns true if the hash has (probably) been seen
    pub fn contains(&self, hash: &str) -> bool {
        let filter = self.filter.lock().unwrap_or_else(|e| e.into_inner());
        filter.contains(&hash)
    }

    /// Adds a hash to the ring
    pub fn insert(&self, hash: &str) {
        let mut filter = self.filter.lock().unwrap_or_else(|e| e.into_inner());
        filter.insert(&hash);
    }

    /// Atomically tests and records a hash
    ///
    /// Returns true when the hash was already present (a dedup hit). The
    /// check and the insert happen under one lock so two workers holding
    /// identical content cannot both see a miss.
    pub fn check_and_insert(&self, hash: &str) -> bool {
        let mut filter = self.filter.lock().unwrap_or_else(|e| e.into_inner());
        if filter.contains(&hash) {
            return true;
        }
        filter.insert(&hash);
        false
    }
}

impl Default for DedupRing {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_ERROR_RATE)
    }
}
