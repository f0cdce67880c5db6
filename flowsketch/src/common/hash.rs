//! Seeded hashing for the sketch and routing cores
//!
//! Both cores are built on a single keyed 64-bit hash. XXHash is used
//! throughout; its output for a given `(data, seed)` pair is bit-stable
//! across platforms and implementations, which keeps fingerprints, bucket
//! choices, and slot assignments comparable between peers that share a seed.

use std::hash::Hasher;
use twox_hash::XxHash64;

/// XXHash 64-bit with a caller-chosen seed
///
/// # Arguments
/// * `data` - The data to hash
/// * `seed` - The hash seed for independent hash functions
///
/// # Returns
/// A 64-bit hash value
///
/// # Examples
/// ```
/// use flowsketch::common::hash::xxhash;
///
/// let hash = xxhash(b"192.0.2.1", 42);
/// assert_eq!(hash, xxhash(b"192.0.2.1", 42));
/// assert_ne!(hash, xxhash(b"192.0.2.1", 43));
/// ```
pub fn xxhash(data: &[u8], seed: u64) -> u64 {
    let mut hasher = XxHash64::with_seed(seed);
    hasher.write(data);
    hasher.finish()
}

/// Non-zero random seed for keyed hashing. Zero is reserved as the
/// "pick one for me" sentinel in constructors.
pub(crate) fn random_seed() -> u64 {
    use rand::Rng;

    let mut rng = rand::rng();
    loop {
        let seed: u64 = rng.random();
        if seed != 0 {
            return seed;
        }
    }
}
