//! treeify-hashmap: a single-threaded chained hash map whose bucket array
//! can be inspected from the outside, and a probe that drives it through
//! resizing and per-bucket treeification.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: make the two interesting structural events of a chained table
//!   (doubling the bucket array, converting one long chain into a
//!   balanced tree) observable without reflection.
//! - Layers:
//!   - TreeBin: left-leaning red-black tree of entry slots ordered by
//!     stored hash; backs a treeified bucket.
//!   - TreeHashMap<K, V, S>: entries in a `SlotMap`, buckets holding slot
//!     keys as either a chain or a TreeBin; lazy allocation, load-factor
//!     growth, collision-driven growth on small arrays, treeify and
//!     untreeify.
//!   - TableInspect: read-only view of bucket-array length and the shape
//!     of each bucket.
//!   - Probe: inserts a fixed key script and writes one line per insert.
//!
//! Thresholds (see `config`)
//! - 16 initial slots, 0.75 load factor, chains longer than 8 become trees
//!   once the array has at least 64 slots. Below 64 slots a chain that
//!   reaches 8 grows the array instead. Trees of 6 or fewer entries
//!   revert to chains on removal or resize.
//!
//! Hasher and rehashing invariants
//! - Each entry stores a precomputed `u64` hash and indexing always uses
//!   the stored hash; `K: Hash` is never invoked after insertion.
//! - Bucket index is `spread(hash) & (len - 1)`; `len` is always a power
//!   of two.
//!
//! Notes and non-goals
//! - Single-threaded; no shrinking of the bucket array.
//! - Iteration order is unspecified.

pub mod config;
pub mod error;
pub mod hasher;
pub mod inspect;
pub mod probe;
mod tree_bin;
pub mod tree_hash_map;

// Public surface
pub use config::TableConfig;
pub use error::{ConfigError, InspectError};
pub use hasher::IdentityBuildHasher;
pub use inspect::{BucketKind, TableInspect};
pub use probe::{run_demo, Observation, Probe, ProbeTarget};
pub use tree_hash_map::TreeHashMap;
