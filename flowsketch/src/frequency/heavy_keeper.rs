//! HeavyKeeper: bounded-memory top-k estimation over a key stream
//!
//! HeavyKeeper tracks the k most frequent keys in an unbounded stream using
//! a `depth × width` grid of fingerprint-guarded counters plus a min-heap of
//! the current top-k candidates.
//!
//! # Algorithm Overview
//!
//! Every insertion hashes the key once per row to pick a bucket:
//! - A vacant cell is claimed with count 1.
//! - A cell already owned by this key's fingerprint is incremented, but only
//!   while the key is tracked in the heap or the cell count has not yet
//!   passed the heap's minimum. Untracked keys therefore cannot inflate a
//!   counter beyond the current admission bar.
//! - A cell owned by another fingerprint undergoes a decay trial: with
//!   probability `decay^count` the counter is decremented, and on reaching
//!   zero the cell is handed to the inserted key.
//!
//! The maximum count observed across rows becomes the key's new estimate.
//! A tracked key's heap entry is re-keyed in place; an untracked key is
//! admitted only when its estimate beats the heap minimum, evicting the
//! root. Exponential decay suppresses stream noise so genuine heavy hitters
//! end up owning their cells.
//!
//! # Determinism
//!
//! With a fixed seed both the bucket choices and the decay trials replay
//! exactly, so `rank` output is reproducible for a given insertion sequence.
//!
//! # Complexity
//!
//! - Insert: O(depth + k)
//! - `get` / `rank`: O(k log k)
//! - Space: O(depth × width + k), independent of stream length
//!
//! # Example
//!
//! ```
//! use flowsketch::frequency::HeavyKeeper;
//!
//! let mut topk = HeavyKeeper::new_with_seed(2, 64, 4, 0.9, 42).unwrap();
//! for _ in 0..6 {
//!     topk.insert(b"alpha");
//! }
//! for _ in 0..2 {
//!     topk.insert(b"beta");
//! }
//!
//! let counts = topk.get_bytes();
//! assert_eq!(counts[&b"alpha".to_vec()], 6);
//!
//! let (keys, counts) = topk.rank_bytes();
//! assert_eq!(keys[0], b"alpha");
//! assert_eq!(counts[0], 6);
//! ```
//!
//! # References
//!
//! - Gong et al. (2018). "HeavyKeeper: An Accurate Algorithm for Finding
//!   Top-k Elephant Flows", USENIX ATC 2018

use crate::common::hash::{random_seed, xxhash};
use crate::common::{validation, Result};
use crate::frequency::min_heap::{Candidate, MinHeap};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::net::IpAddr;

/// Salt mixed into the decay-trial RNG seed so trial outcomes do not share
/// a stream with the keyed hash.
const DECAY_RNG_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Scratch capacity covering the largest key the typed API produces:
/// a 16-byte IPv6 address plus the 4-byte row tag.
const SCRATCH_CAPACITY: usize = 16 + 4;

/// One grid cell: a fingerprint-guarded counter.
///
/// `(0, 0)` is the vacant cell; a zero count always means unowned.
#[derive(Clone, Copy, Default)]
struct Cell {
    fingerprint: u64,
    count: u64,
}

/// Probabilistic streaming top-k estimator
///
/// Tracks an approximation of the k most frequent keys (arbitrary byte
/// strings or IP addresses) in bounded memory. A single owner mutates the
/// sketch through [`insert`](HeavyKeeper::insert) /
/// [`insert_addr`](HeavyKeeper::insert_addr) and reads it through the
/// `get_*` / `rank_*` queries; there is no internal synchronisation.
#[derive(Clone)]
pub struct HeavyKeeper {
    /// Number of candidates tracked in the heap
    k: usize,
    /// Buckets per row
    width: usize,
    /// Number of rows
    depth: usize,
    /// Exponential-decay base for demotion trials, in (0, 1)
    decay: f64,
    /// Keyed-hash seed; never zero after construction
    seed: u64,
    /// Counter grid, depth × width
    rows: Vec<Vec<Cell>>,
    /// Current top-k candidates
    heap: MinHeap,
    /// Decay-trial source, seeded from `seed` so runs replay exactly
    rng: SmallRng,
    /// Reused `key ∥ le32(row)` composition buffer
    scratch: Vec<u8>,
}

impl HeavyKeeper {
    /// Create a sketch with a randomly chosen non-zero seed
    ///
    /// # Arguments
    /// * `k` - Number of top keys to track (must be > 0)
    /// * `width` - Buckets per row (must be > 0)
    /// * `depth` - Number of rows (must be > 0)
    /// * `decay` - Exponential-decay base, in (0, 1); 0.9 is a common choice
    ///
    /// # Errors
    /// Returns `InvalidParameter` when any dimension is zero or `decay` is
    /// outside (0, 1).
    pub fn new(k: usize, width: usize, depth: usize, decay: f64) -> Result<Self> {
        Self::new_with_seed(k, width, depth, decay, 0)
    }

    /// Create a sketch with an explicit seed
    ///
    /// A zero `seed` behaves like [`new`](HeavyKeeper::new) and picks a
    /// random non-zero seed. Two sketches built with the same non-zero seed
    /// produce identical estimates and identical rank output for the same
    /// insertion sequence.
    ///
    /// # Errors
    /// Returns `InvalidParameter` when any dimension is zero or `decay` is
    /// outside (0, 1).
    pub fn new_with_seed(
        k: usize,
        width: usize,
        depth: usize,
        decay: f64,
        seed: u64,
    ) -> Result<Self> {
        validation::validate_k(k)?;
        validation::validate_width_depth(width, depth)?;
        validation::validate_probability(decay, "decay")?;

        let seed = if seed == 0 { random_seed() } else { seed };

        Ok(HeavyKeeper {
            k,
            width,
            depth,
            decay,
            seed,
            rows: vec![vec![Cell::default(); width]; depth],
            heap: MinHeap::new(k),
            rng: SmallRng::seed_from_u64(seed ^ DECAY_RNG_SALT),
            scratch: Vec::with_capacity(SCRATCH_CAPACITY),
        })
    }

    /// Record one occurrence of a byte-string key
    ///
    /// Never fails; invalid configurations are rejected at construction.
    pub fn insert(&mut self, key: &[u8]) {
        self.insert_key(key, None);
    }

    /// Record one occurrence of an IP address
    ///
    /// The address is hashed in its canonical byte form (4 bytes for IPv4,
    /// 16 for IPv6, network byte order) and additionally retained for the
    /// typed [`get_addrs`](HeavyKeeper::get_addrs) /
    /// [`rank_addrs`](HeavyKeeper::rank_addrs) queries.
    pub fn insert_addr(&mut self, addr: IpAddr) {
        match addr {
            IpAddr::V4(v4) => self.insert_key(&v4.octets(), Some(addr)),
            IpAddr::V6(v6) => self.insert_key(&v6.octets(), Some(addr)),
        }
    }

    /// Current candidates as a key-bytes → estimated-count map
    ///
    /// Keys absent from the map have an estimated count of 0.
    pub fn get_bytes(&self) -> HashMap<Vec<u8>, u64> {
        self.heap
            .nodes()
            .iter()
            .map(|n| (n.key.clone(), n.count))
            .collect()
    }

    /// Current candidates as an address → estimated-count map
    ///
    /// Candidates inserted through the byte API carry no address tag and are
    /// skipped here.
    pub fn get_addrs(&self) -> HashMap<IpAddr, u64> {
        self.heap
            .nodes()
            .iter()
            .filter_map(|n| n.addr.map(|addr| (addr, n.count)))
            .collect()
    }

    /// Keys and counts in descending count order
    ///
    /// Both vectors have exactly length `k`; slots past the current
    /// candidate set hold an empty key and count 0. Count ties are broken by
    /// the key total order, so the output is deterministic for a fixed seed.
    pub fn rank_bytes(&self) -> (Vec<Vec<u8>>, Vec<u64>) {
        let mut keys = vec![Vec::new(); self.k];
        let mut counts = vec![0u64; self.k];
        for (i, node) in self.heap.sorted().into_iter().enumerate() {
            keys[i] = node.key.clone();
            counts[i] = node.count;
        }
        (keys, counts)
    }

    /// Addresses and counts in descending count order
    ///
    /// Both vectors have exactly length `k`; slots past the current
    /// candidate set (and candidates inserted through the byte API) hold
    /// `None`, with count 0 for the unfilled slots.
    pub fn rank_addrs(&self) -> (Vec<Option<IpAddr>>, Vec<u64>) {
        let mut addrs = vec![None; self.k];
        let mut counts = vec![0u64; self.k];
        for (i, node) in self.heap.sorted().into_iter().enumerate() {
            addrs[i] = node.addr;
            counts[i] = node.count;
        }
        (addrs, counts)
    }

    /// Number of top keys this sketch tracks
    pub fn k(&self) -> usize {
        self.k
    }

    /// The keyed-hash seed in use; never zero
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn insert_key(&mut self, key: &[u8], addr: Option<IpAddr>) {
        let found = self.heap.find(key);
        // Reuse the fingerprint recorded at first insertion when the key is
        // already tracked.
        let fingerprint = match found {
            Some(idx) => self.heap.fingerprint(idx),
            None => xxhash(key, self.seed),
        };
        let min_count = self.heap.min_count();
        let mut max_count = 0u64;

        // Compose `key ∥ le32(row)` in the reused scratch buffer. The key
        // part is written once; each row truncates back to it before
        // appending its own tag, so no caller memory is ever aliased.
        self.scratch.clear();
        self.scratch.extend_from_slice(key);

        for row in 0..self.depth {
            self.scratch.truncate(key.len());
            self.scratch.extend_from_slice(&(row as u32).to_le_bytes());
            let bucket = (xxhash(&self.scratch, self.seed) % self.width as u64) as usize;
            let cell = &mut self.rows[row][bucket];

            if cell.count == 0 {
                cell.fingerprint = fingerprint;
                cell.count = 1;
                max_count = max_count.max(1);
                continue;
            }

            if cell.fingerprint == fingerprint {
                // Tracked keys may always grow; untracked ones only while
                // the cell is still at or below the admission bar.
                if found.is_some() || cell.count <= min_count {
                    cell.count += 1;
                    max_count = max_count.max(cell.count);
                }
                continue;
            }

            // Mismatching owner: decay trial with probability decay^count.
            if self.rng.random::<f64>() < self.decay.powf(cell.count as f64) {
                cell.count -= 1;
                if cell.count == 0 {
                    cell.fingerprint = fingerprint;
                    cell.count = 1;
                    max_count = max_count.max(1);
                }
            }
        }

        match found {
            Some(idx) => self.heap.fix(idx, max_count),
            None => self.heap.offer(Candidate {
                key: key.to_vec(),
                addr,
                fingerprint,
                count: max_count,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_parameters() {
        assert!(HeavyKeeper::new(0, 10, 5, 0.9).is_err());
        assert!(HeavyKeeper::new(5, 0, 5, 0.9).is_err());
        assert!(HeavyKeeper::new(5, 10, 0, 0.9).is_err());
        assert!(HeavyKeeper::new(5, 10, 5, 0.0).is_err());
        assert!(HeavyKeeper::new(5, 10, 5, 1.0).is_err());
    }

    #[test]
    fn test_seed_is_never_zero() {
        let sketch = HeavyKeeper::new(5, 10, 5, 0.9).unwrap();
        assert_ne!(sketch.seed(), 0);
        let sketch = HeavyKeeper::new_with_seed(5, 10, 5, 0.9, 0).unwrap();
        assert_ne!(sketch.seed(), 0);
        let sketch = HeavyKeeper::new_with_seed(5, 10, 5, 0.9, 77).unwrap();
        assert_eq!(sketch.seed(), 77);
    }

    #[test]
    fn test_single_key_counts_exactly() {
        let mut sketch = HeavyKeeper::new_with_seed(3, 64, 4, 0.9, 99).unwrap();
        for _ in 0..25 {
            sketch.insert(b"only");
        }
        assert_eq!(sketch.get_bytes()[&b"only".to_vec()], 25);
    }

    #[test]
    fn test_reinsertion_keeps_one_candidate() {
        let mut sketch = HeavyKeeper::new_with_seed(4, 64, 4, 0.9, 99).unwrap();
        sketch.insert(b"dup");
        sketch.insert(b"dup");
        sketch.insert(b"dup");
        let counts = sketch.get_bytes();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&b"dup".to_vec()], 3);
    }

    #[test]
    fn test_rank_pads_to_k() {
        let mut sketch = HeavyKeeper::new_with_seed(5, 64, 4, 0.9, 7).unwrap();
        for _ in 0..3 {
            sketch.insert(b"a");
        }
        sketch.insert(b"b");

        let (keys, counts) = sketch.rank_bytes();
        assert_eq!(keys.len(), 5);
        assert_eq!(counts.len(), 5);
        assert_eq!(keys[0], b"a");
        assert_eq!(counts[0], 3);
        assert_eq!(keys[1], b"b");
        assert_eq!(counts[1], 1);
        for i in 2..5 {
            assert!(keys[i].is_empty());
            assert_eq!(counts[i], 0);
        }
    }

    #[test]
    fn test_byte_and_addr_forms_share_cells() {
        // The typed API hashes the canonical byte form, so a byte insert of
        // the same octets lands on the same candidate.
        let addr: IpAddr = "192.0.2.9".parse().unwrap();
        let mut sketch = HeavyKeeper::new_with_seed(4, 64, 4, 0.9, 11).unwrap();
        sketch.insert_addr(addr);
        sketch.insert(&[192, 0, 2, 9]);
        let counts = sketch.get_bytes();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&vec![192, 0, 2, 9]], 2);
        // The tag recorded at first insertion wins.
        assert_eq!(sketch.get_addrs()[&addr], 2);
    }
}
