//! Probe: scripted inserts that report bucket-array growth and tree use.
//!
//! Keys in each phase are multiples of the bucket-array length current at
//! that phase, so with the identity hasher they all land in bucket 0:
//!
//! 1. eight multiples of 16: the chain fills on a 16-slot array, which
//!    grows to 32;
//! 2. four multiples of 32: bucket 0 fills again, the array grows to 64;
//! 3. five multiples of 64: bucket 0 overflows on a 64-slot array and is
//!    converted to a red-black tree by the last insert.

use crate::hasher::IdentityBuildHasher;
use crate::inspect::TableInspect;
use crate::tree_hash_map::TreeHashMap;
use core::fmt::Display;
use core::hash::{BuildHasher, Hash};
use std::io::{self, Write};

/// A map the probe can insert into and look inside.
pub trait ProbeTarget: TableInspect {
    type Key: Clone + Display;
    type Value: Clone + Display;

    fn put(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;
}

impl<K, V, S> ProbeTarget for TreeHashMap<K, V, S>
where
    K: Eq + Hash + Clone + Display,
    V: Clone + Display,
    S: BuildHasher,
{
    type Key = K;
    type Value = V;

    fn put(&mut self, key: K, value: V) -> Option<V> {
        self.insert(key, value)
    }
}

/// What one insert-and-inspect step saw. `None` means inspection failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation<K, V> {
    pub key: K,
    pub value: V,
    pub bucket_len: Option<usize>,
    pub resized: bool,
    pub tree_used: Option<bool>,
}

/// Carries the last observed bucket-array length between steps.
#[derive(Clone, Debug)]
pub struct Probe {
    last_len: usize,
}

impl Probe {
    pub fn new(initial_len: usize) -> Self {
        Self {
            last_len: initial_len,
        }
    }

    pub fn last_len(&self) -> usize {
        self.last_len
    }

    /// Insert `key -> value`, then write one report line to `out`.
    ///
    /// Inspection failures are noted on the line and logged; they never
    /// stop the probe. Only write errors are returned.
    pub fn insert_and_report<M, W>(
        &mut self,
        map: &mut M,
        key: M::Key,
        value: M::Value,
        out: &mut W,
    ) -> io::Result<Observation<M::Key, M::Value>>
    where
        M: ProbeTarget + ?Sized,
        W: Write + ?Sized,
    {
        write!(out, "Adding Key: {key}\tValue: {value}\t")?;
        map.put(key.clone(), value.clone());

        let (bucket_len, resized) = match map.bucket_array_len() {
            Ok(len) => {
                let grew = len > self.last_len;
                if grew {
                    tracing::debug!(from = self.last_len, to = len, "observed resize");
                    self.last_len = len;
                    write!(out, " 🔄 Rehashing happened! New Table Size: {len}")?;
                }
                (Some(len), grew)
            }
            Err(err) => {
                tracing::warn!(%err, "could not read bucket array length");
                write!(out, " [bucket array length unavailable: {err}]")?;
                (None, false)
            }
        };

        let tree_used = if bucket_len == Some(0) {
            write!(out, " | HashMap bucket array not initialized yet.")?;
            Some(false)
        } else {
            match map.is_any_bucket_treeified() {
                Ok(used) => {
                    write!(out, " | Is Red-Black Tree used? {used}")?;
                    Some(used)
                }
                Err(err) => {
                    tracing::warn!(%err, "could not scan buckets for trees");
                    write!(out, " | tree inspection unavailable: {err}")?;
                    None
                }
            }
        };
        writeln!(out)?;

        Ok(Observation {
            key,
            value,
            bucket_len,
            resized,
            tree_used,
        })
    }
}

/// A named run of `(key, value)` inserts.
pub struct Phase {
    pub name: &'static str,
    pub steps: &'static [(i32, &'static str)],
}

/// Keys chosen so that, under the identity hasher, each phase piles into
/// bucket 0: resizes land on keys 128 and 256 and the tree on key 576.
pub const DEMO_SCRIPT: [Phase; 3] = [
    Phase {
        name: "fill bucket 0 of 16 slots",
        steps: &[
            (16, "Value1"),
            (32, "Value2"),
            (48, "Value3"),
            (64, "Value4"),
            (80, "Value5"),
            (96, "Value6"),
            (112, "Value7"),
            (128, "Value8"),
        ],
    },
    Phase {
        name: "refill bucket 0 of 32 slots",
        steps: &[
            (160, "Value10"),
            (192, "Value12"),
            (224, "Value14"),
            (256, "Value16"),
        ],
    },
    Phase {
        name: "overflow bucket 0 of 64 slots",
        steps: &[
            (320, "Value20"),
            (384, "Value24"),
            (448, "Value28"),
            (512, "Value32"),
            (576, "Value35"),
        ],
    },
];

/// Run `DEMO_SCRIPT` against a fresh identity-hashed map, writing the
/// report to `out`.
pub fn run_demo<W>(out: &mut W) -> io::Result<Vec<Observation<i32, String>>>
where
    W: Write + ?Sized,
{
    let mut map: TreeHashMap<i32, String, IdentityBuildHasher> =
        TreeHashMap::with_hasher(IdentityBuildHasher);
    let mut probe = Probe::new(map.config().initial_capacity());
    let mut observations = Vec::new();
    for phase in &DEMO_SCRIPT {
        tracing::info!(phase = phase.name, inserts = phase.steps.len(), "starting phase");
        for &(key, value) in phase.steps {
            let obs = probe.insert_and_report(&mut map, key, value.to_string(), out)?;
            observations.push(obs);
        }
    }
    out.flush()?;
    Ok(observations)
}
