//! Precomputed rendezvous-hash assignment table
//!
//! Maps any key to one member of a small dynamic node set. Each table slot
//! holds the winner of a highest-random-weight contest: the member whose
//! keyed hash of `member_bytes ∥ le32(slot)` is largest. Because every slot
//! contest depends only on the member set, removing a member disturbs only
//! the slots that member owned, and adding one disturbs only the slots it
//! now wins.
//!
//! The full table is regenerated after every membership change; lookups are
//! a single hash plus an index.
//!
//! # Example
//!
//! ```
//! use flowsketch::routing::RendezvousTable;
//! use std::net::IpAddr;
//!
//! let members: Vec<IpAddr> = vec![
//!     "192.0.2.111".parse().unwrap(),
//!     "192.0.2.112".parse().unwrap(),
//!     "192.0.2.113".parse().unwrap(),
//! ];
//! let table = RendezvousTable::new(1234, &members).unwrap();
//!
//! let target = table.get("192.0.2.1".parse().unwrap()).unwrap();
//! assert!(members.contains(&target));
//! assert_eq!(table.assignments().len(), 300);
//! ```
//!
//! # References
//!
//! - Thaler & Ravishankar (1998). "Using Name-Based Mappings to Increase
//!   Hit Rates", IEEE/ACM Transactions on Networking

use crate::common::hash::{random_seed, xxhash};
use crate::common::{validation, Result};
use crate::routing::{addr_bytes, slot_index, SCRATCH_CAPACITY, TABLE_MULTIPLE};
use std::net::IpAddr;

#[derive(Clone, Debug)]
struct Member {
    addr: IpAddr,
    /// Canonical network-order bytes, cached once at member addition
    bytes: Vec<u8>,
}

impl Member {
    fn new(addr: IpAddr) -> Self {
        Member {
            addr,
            bytes: addr_bytes(addr),
        }
    }
}

/// Rendezvous (highest-random-weight) lookup table
///
/// Single-owner and not internally synchronised; mutations regenerate the
/// whole table, lookups never mutate.
#[derive(Clone, Debug)]
pub struct RendezvousTable {
    members: Vec<Member>,
    table: Vec<IpAddr>,
    size: usize,
    key: u64,
}

impl RendezvousTable {
    /// Create a table sized at 100 slots per member
    ///
    /// A zero `key` picks a random non-zero seed.
    ///
    /// # Errors
    /// Returns `InvalidParameter` when `members` is empty.
    pub fn new(key: u64, members: &[IpAddr]) -> Result<Self> {
        Self::new_with_table_size(key, members.len() * TABLE_MULTIPLE, members)
    }

    /// Create a table with an explicit slot count
    ///
    /// A power-of-two `size` lets lookups reduce the hash with a bitmask;
    /// any other size falls back to modulo reduction.
    ///
    /// # Errors
    /// Returns `InvalidParameter` when `members` is empty or `size` is 0 or
    /// does not fit the 32-bit slot tag.
    pub fn new_with_table_size(key: u64, size: usize, members: &[IpAddr]) -> Result<Self> {
        validation::validate_member_count(members.len())?;
        validation::validate_table_size(size)?;

        let key = if key == 0 { random_seed() } else { key };

        let mut table = RendezvousTable {
            members: members.iter().copied().map(Member::new).collect(),
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

    /// Append a member and regenerate the table
    ///
    /// Duplicates are not deduplicated; keeping the set unique is the
    /// caller's responsibility.
    pub fn add(&mut self, addr: IpAddr) {
        self.members.push(Member::new(addr));
        self.generate_table();
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
            let mut high_score = 0u64;
            let mut winner = self.members[0].addr;

            for member in &self.members {
                scratch.clear();
                scratch.extend_from_slice(&member.bytes);
                scratch.extend_from_slice(&tag);
                let sum = xxhash(&scratch, self.key);

                // Strict comparison keeps the first member on a tie.
                if sum > high_score {
                    high_score = sum;
                    winner = member.addr;
                }
            }

            self.table.push(winner);
        }
    }
}
