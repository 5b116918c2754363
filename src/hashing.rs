//! Deterministic hashing. The hashing data structures in the standard library are randomly
//! seeded per process, which would make iteration order, and therefore any random draws that
//! depend on it, differ between otherwise identical runs. Everything in this crate that hashes
//! uses the `rustc-hash` variants re-exported here.
//!
//! `hash_str` is used by `crate::random` to derive a per-stream seed offset from the stream's
//! name.

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use xxhash_rust::xxh3::xxh3_64;

/// A convenience method to compute the hash of a `&str`.
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}
