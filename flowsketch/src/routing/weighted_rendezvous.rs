//! Weighted rendezvous-hash assignment table
//!
//! Structurally identical to the unweighted table, but each member carries a
//! positive real weight and the per-slot contest compares
//! `|weight / -ln(u)|`, where `u` is a uniform derived from the member's
//! keyed hash. `1 / -ln(u)` is an exponential-style variate, so scaling it
//! by the weight gives each member a selection probability of
//! `weight / Σ weights`, independent of the key.
//!
//! # Example
//!
//! ```
//! use flowsketch::routing::WeightedRendezvousTable;
//! use std::net::IpAddr;
//!
//! let a: IpAddr = "192.0.2.111".parse().unwrap();
//! let c: IpAddr = "192.0.2.113".parse().unwrap();
//! let mut table =
//!     WeightedRendezvousTable::new(1234, &[(a, 10.0), (c, 70.0)]).unwrap();
//!
//! assert!(table.get("192.0.2.1".parse().unwrap()).is_some());
//! table.set_weight(a, 20.0).unwrap();
//! assert_eq!(table.assignments().len(), 200);
//! ```
//!
//! # References
//!
//! - Resch (2015). "New Hashing Algorithms for Data Storage", Storage
//!   Developer Conference

use crate::common::hash::{random_seed, xxhash};
use crate::common::{validation, Result};
use crate::routing::{addr_bytes, slot_index, SCRATCH_CAPACITY, TABLE_MULTIPLE};
use std::net::IpAddr;

/// 2^-53, the scale that maps the hash's top 54 bits onto `[0, 2)`.
const SCORE_SCALE: f64 = 1.0 / 9_007_199_254_740_992.0;

/// Weighted-HRW score for one member at one slot.
///
/// `u == 0` would send the score to zero through an infinite logarithm and
/// `u == 1` divides by zero; both endpoints are moved one scale step into
/// the open interval before the logarithm.
fn score(sum: u64, weight: f64) -> f64 {
    let mut uniform = (sum >> 10) as f64 * SCORE_SCALE;
    if uniform == 0.0 {
        uniform = SCORE_SCALE;
    } else if uniform == 1.0 {
        uniform = 1.0 - SCORE_SCALE;
    }
    (weight / -uniform.ln()).abs()
}

#[derive(Clone, Debug)]
struct Member {
    addr: IpAddr,
    weight: f64,
    /// Canonical network-order bytes, cached once at member addition
    bytes: Vec<u8>,
}

impl Member {
    fn new(addr: IpAddr, weight: f64) -> Self {
        Member {
            addr,
            weight,
            bytes: addr_bytes(addr),
        }
    }
}

/// Weighted rendezvous (highest-random-weight) lookup table
///
/// Expected share of the key space routed to a member is proportional to
/// its weight. Single-owner and not internally synchronised.
#[derive(Clone, Debug)]
pub struct WeightedRendezvousTable {
    members: Vec<Member>,
    table: Vec<IpAddr>,
    size: usize,
    key: u64,
}

impl WeightedRendezvousTable {
    /// Create a table sized at 100 slots per member
    ///
    /// A zero `key` picks a random non-zero seed.
    ///
    /// # Errors
    /// Returns `InvalidParameter` when `members` is empty or any weight is
    /// non-positive or non-finite.
    pub fn new(key: u64, members: &[(IpAddr, f64)]) -> Result<Self> {
        Self::new_with_table_size(key, members.len() * TABLE_MULTIPLE, members)
    }

    /// Create a table with an explicit slot count
    ///
    /// # Errors
    /// Returns `InvalidParameter` when `members` is empty, `size` is 0 or
    /// does not fit the 32-bit slot tag, or any weight is non-positive or
    /// non-finite.
    pub fn new_with_table_size(key: u64, size: usize, members: &[(IpAddr, f64)]) -> Result<Self> {
        validation::validate_member_count(members.len())?;
        validation::validate_table_size(size)?;
        for &(_, weight) in members {
            validation::validate_weight(weight)?;
        }

        let key = if key == 0 { random_seed() } else { key };

        let mut table = WeightedRendezvousTable {
            members: members
                .iter()
                .map(|&(addr, weight)| Member::new(addr, weight))
                .collect(),
            table: Vec::new(),
            size,
            key,
        };
        table.generate_table();

        Ok(table)
    }

    /// The keyed-hash seed in use; never zero
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Member assigned to this address's slot
    ///
    /// Returns `None` only when deletion has emptied the member set.
    pub fn get(&self, addr: IpAddr) -> Option<IpAddr> {
        let sum = match addr {
            IpAddr::V4(v4) => xxhash(&v4.octets(), self.key),
            IpAddr::V6(v6) => xxhash(&v6.octets(), self.key),
        };
        self.table.get(slot_index(sum, self.size)).copied()
    }

    /// Append a member with the given weight and regenerate the table
    ///
    /// Duplicates are not deduplicated; keeping the set unique is the
    /// caller's responsibility.
    ///
    /// # Errors
    /// Returns `InvalidParameter` when `weight` is non-positive or
    /// non-finite; the member set is unchanged in that case.
    pub fn add(&mut self, addr: IpAddr, weight: f64) -> Result<()> {
        validation::validate_weight(weight)?;
        self.members.push(Member::new(addr, weight));
        self.generate_table();
        Ok(())
    }

    /// Update the weight of the first member with this address and
    /// regenerate the table
    ///
    /// # Errors
    /// Returns `InvalidParameter` when `weight` is non-positive or
    /// non-finite; the member set is unchanged in that case.
    pub fn set_weight(&mut self, addr: IpAddr, weight: f64) -> Result<()> {
        validation::validate_weight(weight)?;
        if let Some(member) = self.members.iter_mut().find(|m| m.addr == addr) {
            member.weight = weight;
        }
        self.generate_table();
        Ok(())
    }

    /// Remove all members with this address and regenerate the table
    pub fn delete(&mut self, addr: IpAddr) {
        self.members.retain(|m| m.addr != addr);
        self.generate_table();
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the member set is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The full slot-to-member assignment
    pub fn assignments(&self) -> &[IpAddr] {
        &self.table
    }

    fn generate_table(&mut self) {
        self.table.clear();
        if self.members.is_empty() {
            return;
        }

        self.table.reserve(self.size);
        let mut scratch: Vec<u8> = Vec::with_capacity(SCRATCH_CAPACITY);

        for slot in 0..self.size {
            let tag = (slot as u32).to_le_bytes();
            let mut high_score = 0.0f64;
            let mut winner = self.members[0].addr;

            for member in &self.members {
                scratch.clear();
                scratch.extend_from_slice(&member.bytes);
                scratch.extend_from_slice(&tag);
                let sum = xxhash(&scratch, self.key);

                let member_score = score(sum, member.weight);
                // Strict comparison keeps the first member on a tie.
                if member_score > high_score {
                    high_score = member_score;
                    winner = member.addr;
                }
            }

            self.table.push(winner);
        }
    }
}
