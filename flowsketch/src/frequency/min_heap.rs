//! Candidate min-heap backing the HeavyKeeper top-k set.
//!
//! The root holds the smallest tracked count, so admission checks are O(1).
//! `fix` restores heap order in place after an existing candidate's count
//! changes, and `find` is a linear scan by key bytes (k is small; a
//! secondary index would not pay for itself).

use std::cmp::Ordering;
use std::net::IpAddr;

/// One tracked top-k record.
///
/// `key` is the exact byte sequence recorded at first insertion; `addr` is
/// set only when the record entered through the typed address API.
/// `fingerprint` caches the keyed hash of `key` so re-insertions skip the
/// hash.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub key: Vec<u8>,
    pub addr: Option<IpAddr>,
    pub fingerprint: u64,
    pub count: u64,
}

impl Candidate {
    /// Total order used to break count ties: address order when both sides
    /// carry an address tag, lexicographic key bytes otherwise.
    fn key_order(&self, other: &Self) -> Ordering {
        match (self.addr, other.addr) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.key.cmp(&other.key),
        }
    }

    fn heap_order(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| self.key_order(other))
    }
}

/// Binary min-heap of at most `k` candidates.
#[derive(Debug, Clone)]
pub(crate) struct MinHeap {
    nodes: Vec<Candidate>,
    k: usize,
}

impl MinHeap {
    pub fn new(k: usize) -> Self {
        MinHeap {
            nodes: Vec::with_capacity(k),
            k,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Candidate] {
        &self.nodes
    }

    /// Count at the heap root, or 0 when nothing is tracked yet.
    pub fn min_count(&self) -> u64 {
        self.nodes.first().map_or(0, |n| n.count)
    }

    /// Position of the candidate recorded under exactly these key bytes.
    pub fn find(&self, key: &[u8]) -> Option<usize> {
        self.nodes.iter().position(|n| n.key == key)
    }

    pub fn fingerprint(&self, idx: usize) -> u64 {
        self.nodes[idx].fingerprint
    }

    /// Admit a new candidate: push while below capacity, otherwise replace
    /// the root only when the new count beats it.
    pub fn offer(&mut self, candidate: Candidate) {
        if self.nodes.len() < self.k {
            self.nodes.push(candidate);
            self.sift_up(self.nodes.len() - 1);
        } else if candidate.count > self.nodes[0].count {
            self.nodes[0] = candidate;
            self.sift_down(0);
        }
    }

    /// Re-count the candidate at `idx` and restore heap order around it.
    pub fn fix(&mut self, idx: usize, count: u64) {
        self.nodes[idx].count = count;
        if !self.sift_down(idx) {
            self.sift_up(idx);
        }
    }

    /// Candidates in rank order: descending count, key order on ties.
    pub fn sorted(&self) -> Vec<&Candidate> {
        let mut ranked: Vec<&Candidate> = self.nodes.iter().collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key_order(b)));
        ranked
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.nodes[idx].heap_order(&self.nodes[parent]) == Ordering::Less {
                self.nodes.swap(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }

    /// Returns true when the node moved.
    fn sift_down(&mut self, mut idx: usize) -> bool {
        let len = self.nodes.len();
        let start = idx;
        loop {
            let left = 2 * idx + 1;
            if left >= len {
                break;
            }
            let mut child = left;
            let right = left + 1;
            if right < len && self.nodes[right].heap_order(&self.nodes[left]) == Ordering::Less {
                child = right;
            }
            if self.nodes[child].heap_order(&self.nodes[idx]) == Ordering::Less {
                self.nodes.swap(idx, child);
                idx = child;
            } else {
                break;
            }
        }
        idx != start
    }
}
