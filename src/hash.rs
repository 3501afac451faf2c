//! Hash functions for structural tree hashing and variable binding.
//!
//! Variable names are hashed once at bind time; all later lookups compare
//! 64-bit hashes. Structural tree hashes feed canonicalization
//! ([`crate::core::Tree::sort`]) and duplicate detection
//! ([`crate::core::Tree::reduce`]).

use std::hash::Hasher;

use metrohash::MetroHash64;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// FNV-1a 64-bit offset basis.
pub const FNV1A_OFFSET_BASIS_64: u64 = 0xcbf29ce484222325;

/// FNV-1a 64-bit prime.
pub const FNV1A_PRIME_64: u64 = 0x100000001b3;

/// Mixes `bytes` into an existing FNV-1a hash state.
#[inline]
pub const fn fnv1a64_mix(mut hash: u64, bytes: &[u8]) -> u64 {
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV1A_PRIME_64);
        i += 1;
    }
    hash
}

/// FNV-1a 64-bit hash of a byte slice.
#[inline]
pub const fn fnv1a64(bytes: &[u8]) -> u64 {
    fnv1a64_mix(FNV1A_OFFSET_BASIS_64, bytes)
}

/// Selects the byte-level hash function used for structural hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashFunction {
    /// XXH64. The default; also used for variable-name hashing.
    XxHash,
    /// MetroHash64.
    MetroHash,
    /// FNV-1a, 64-bit.
    Fnv1a,
}

impl Default for HashFunction {
    fn default() -> Self {
        HashFunction::XxHash
    }
}

/// Controls whether leaf identity participates in structural hashes.
///
/// In [`Strict`](HashMode::Strict) mode two variable leaves hash equal only
/// when bound to the same variable, and two constants only when their values
/// are bit-identical. In [`Relaxed`](HashMode::Relaxed) mode all leaves of
/// the same type hash equal, so trees are compared by shape alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashMode {
    Strict,
    Relaxed,
}

/// Hashes a byte slice with the selected function.
#[inline]
pub fn hash_bytes(function: HashFunction, bytes: &[u8]) -> u64 {
    match function {
        HashFunction::XxHash => xxh64(bytes, 0),
        HashFunction::MetroHash => {
            let mut h = MetroHash64::default();
            h.write(bytes);
            h.finish()
        }
        HashFunction::Fnv1a => fnv1a64(bytes),
    }
}

/// Hashes a string with the crate's default function.
///
/// Used for variable names at dataset bind time.
#[inline]
pub fn hash_name(name: &str) -> u64 {
    hash_bytes(HashFunction::XxHash, name.as_bytes())
}
