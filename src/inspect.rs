//! Introspection of a table's bucket array.
//!
//! `TableInspect` is the seam the probe reads through. `TreeHashMap`
//! answers directly from its own layout and never fails; other
//! implementors may, and callers treat an `InspectError` as "unknown".

use crate::error::InspectError;
use crate::tree_hash_map::{Bucket, TreeHashMap};
use core::hash::{BuildHasher, Hash};

/// Shape of one bucket-array slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BucketKind {
    Empty,
    Chain { len: usize },
    Tree { len: usize },
}

impl BucketKind {
    pub fn is_tree(&self) -> bool {
        matches!(self, BucketKind::Tree { .. })
    }

    /// Number of entries held in this slot.
    pub fn len(&self) -> usize {
        match *self {
            BucketKind::Empty => 0,
            BucketKind::Chain { len } | BucketKind::Tree { len } => len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn of(b: &Bucket) -> Self {
        match b {
            Bucket::Empty => BucketKind::Empty,
            Bucket::Chain(chain) => BucketKind::Chain { len: chain.len() },
            Bucket::Tree(tree) => BucketKind::Tree { len: tree.len() },
        }
    }
}

pub trait TableInspect {
    /// Current bucket-array length, or 0 if the array is not allocated.
    fn bucket_array_len(&self) -> Result<usize, InspectError>;

    fn bucket_kind(&self, index: usize) -> Result<BucketKind, InspectError>;

    /// True iff at least one slot holds a tree. An unallocated array has
    /// no trees.
    fn is_any_bucket_treeified(&self) -> Result<bool, InspectError> {
        let len = self.bucket_array_len()?;
        for i in 0..len {
            if self.bucket_kind(i)?.is_tree() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn bucket_layout(&self) -> Result<Vec<BucketKind>, InspectError> {
        let len = self.bucket_array_len()?;
        (0..len).map(|i| self.bucket_kind(i)).collect()
    }
}

impl<K, V, S> TableInspect for TreeHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn bucket_array_len(&self) -> Result<usize, InspectError> {
        Ok(self.capacity())
    }

    fn bucket_kind(&self, index: usize) -> Result<BucketKind, InspectError> {
        let buckets = self.buckets();
        buckets
            .get(index)
            .map(BucketKind::of)
            .ok_or(InspectError::OutOfRange {
                index,
                len: buckets.len(),
            })
    }

    fn is_any_bucket_treeified(&self) -> Result<bool, InspectError> {
        Ok(self.buckets().iter().any(|b| matches!(b, Bucket::Tree(_))))
    }

    fn bucket_layout(&self) -> Result<Vec<BucketKind>, InspectError> {
        Ok(self.buckets().iter().map(BucketKind::of).collect())
    }
}
