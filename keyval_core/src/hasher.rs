//! Key hashing for shard selection.
//!
//! A variant of Daniel J. Bernstein's string hash that uses xor instead of
//! addition, over the key's raw bytes with 32-bit wrapping arithmetic. Shard
//! placement is a pure function of the key bytes, so it must stay stable for
//! the lifetime of a running cluster.

const SEED: u32 = 5381;

/// Returns the 32-bit djb2a hash of `key`.
pub fn sum32(key: &str) -> u32 {
    let mut hash = SEED;
    for byte in key.bytes() {
        hash = hash.wrapping_mul(33) ^ u32::from(byte);
    }
    hash
}
