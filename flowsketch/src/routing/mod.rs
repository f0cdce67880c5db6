//! Key-to-node assignment via rendezvous (highest-random-weight) hashing

mod rendezvous;
mod weighted_rendezvous;

pub use rendezvous::RendezvousTable;
pub use weighted_rendezvous::WeightedRendezvousTable;

use std::net::IpAddr;

/// Table-size multiplier applied when the caller does not pick a size:
/// `members × TABLE_MULTIPLE` slots.
pub(crate) const TABLE_MULTIPLE: usize = 100;

/// Scratch capacity for the `member_bytes ∥ le32(slot)` composition:
/// a 16-byte IPv6 address plus the 4-byte slot tag.
pub(crate) const SCRATCH_CAPACITY: usize = 16 + 4;

/// Canonical byte form of an address: 4 bytes for IPv4, 16 for IPv6,
/// network byte order, no zone.
pub(crate) fn addr_bytes(addr: IpAddr) -> Vec<u8> {
    match addr {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

/// Slot index for a hash: bitmask reduction when the table size is a power
/// of two, modulo otherwise. The default `members × 100` sizing is not a
/// power of two, and masking there would leave slots unreachable.
pub(crate) fn slot_index(sum: u64, size: usize) -> usize {
    if size.is_power_of_two() {
        (sum & (size as u64 - 1)) as usize
    } else {
        (sum % size as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_bytes_canonical_forms() {
        let v4: IpAddr = "192.0.2.1".parse().unwrap();
        assert_eq!(addr_bytes(v4), vec![192, 0, 2, 1]);

        let v6: IpAddr = "2001:db8::1".parse().unwrap();
        let bytes = addr_bytes(v6);
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..4], &[0x20, 0x01, 0x0d, 0xb8]);
    }

    #[test]
    fn test_slot_index_power_of_two_masks() {
        assert_eq!(slot_index(0x1234, 256), 0x34);
        assert_eq!(slot_index(u64::MAX, 1024), 1023);
    }

    #[test]
    fn test_slot_index_modulo_reaches_all_slots() {
        // 300 is the default size for three members; every slot must be
        // reachable, which a mask of 299 would not give.
        let mut seen = vec![false; 300];
        for sum in 0..3000u64 {
            seen[slot_index(sum, 300)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
