//! Tuning constants for `TreeHashMap`.
//!
//! The defaults reproduce the classic chained-table behavior: a 16-slot
//! array allocated on first insert, doubling past a 0.75 load factor,
//! and per-bucket conversion to a red-black tree for long chains once
//! the array has at least 64 slots. Below that size a full chain grows
//! the array instead of being converted.

use crate::error::ConfigError;

pub const DEFAULT_INITIAL_CAPACITY: usize = 16;
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;
pub const TREEIFY_THRESHOLD: usize = 8;
pub const UNTREEIFY_THRESHOLD: usize = 6;
pub const MIN_TREEIFY_CAPACITY: usize = 64;
pub const MAXIMUM_CAPACITY: usize = 1 << 30;

#[derive(Clone, Debug, PartialEq)]
pub struct TableConfig {
    initial_capacity: usize,
    load_factor: f32,
    treeify_threshold: usize,
    untreeify_threshold: usize,
    min_treeify_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            treeify_threshold: TREEIFY_THRESHOLD,
            untreeify_threshold: UNTREEIFY_THRESHOLD,
            min_treeify_capacity: MIN_TREEIFY_CAPACITY,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Length of the bucket array allocated by the first insert. Rounded
    /// up to a power of two; zero is kept so `validate` can reject it.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = if capacity == 0 {
            0
        } else {
            capacity.checked_next_power_of_two().unwrap_or(usize::MAX)
        };
        self
    }

    pub fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// A chain holding more than this many entries is converted to a tree
    /// (or, on a small array, grows the array once it holds this many).
    pub fn with_treeify_threshold(mut self, threshold: usize) -> Self {
        self.treeify_threshold = threshold;
        self
    }

    /// A tree bucket shrinking to this many entries reverts to a chain.
    pub fn with_untreeify_threshold(mut self, threshold: usize) -> Self {
        self.untreeify_threshold = threshold;
        self
    }

    pub fn with_min_treeify_capacity(mut self, capacity: usize) -> Self {
        self.min_treeify_capacity = capacity;
        self
    }

    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }
    pub fn treeify_threshold(&self) -> usize {
        self.treeify_threshold
    }
    pub fn untreeify_threshold(&self) -> usize {
        self.untreeify_threshold
    }
    pub fn min_treeify_capacity(&self) -> usize {
        self.min_treeify_capacity
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cap = self.initial_capacity;
        if cap == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if cap > MAXIMUM_CAPACITY {
            return Err(ConfigError::CapacityTooLarge(cap));
        }
        if !cap.is_power_of_two() {
            return Err(ConfigError::CapacityNotPowerOfTwo(cap));
        }
        if !(self.load_factor.is_finite() && self.load_factor > 0.0) {
            return Err(ConfigError::InvalidLoadFactor(self.load_factor));
        }
        if self.treeify_threshold < 2 {
            return Err(ConfigError::TreeifyThreshold(self.treeify_threshold));
        }
        if self.untreeify_threshold >= self.treeify_threshold {
            return Err(ConfigError::UntreeifyThreshold {
                untreeify: self.untreeify_threshold,
                treeify: self.treeify_threshold,
            });
        }
        if !self.min_treeify_capacity.is_power_of_two() {
            return Err(ConfigError::MinTreeifyCapacity(self.min_treeify_capacity));
        }
        Ok(())
    }

    /// Entry count above which an array of `capacity` slots doubles.
    pub fn threshold_for(&self, capacity: usize) -> usize {
        if capacity >= MAXIMUM_CAPACITY {
            return usize::MAX;
        }
        (capacity as f64 * self.load_factor as f64) as usize
    }
}
