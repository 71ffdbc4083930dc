//! Identity hashing for integer keys.
//!
//! A lone integer key hashes to its own value, so its bucket index is
//! simply `key & (len - 1)` and collisions can be planned by hand.
//! Composite keys fold each written value in as `h = h * 31 + v`.

use core::hash::{BuildHasher, Hasher};

#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityBuildHasher;

impl BuildHasher for IdentityBuildHasher {
    type Hasher = IdentityHasher;

    fn build_hasher(&self) -> Self::Hasher {
        IdentityHasher::default()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityHasher {
    hash: u64,
}

impl IdentityHasher {
    #[inline]
    fn fold(&mut self, v: u64) {
        self.hash = self.hash.wrapping_mul(31).wrapping_add(v);
    }
}

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.fold(b as u64);
        }
    }

    fn write_u8(&mut self, i: u8) {
        self.fold(i as u64);
    }
    fn write_u16(&mut self, i: u16) {
        self.fold(i as u64);
    }
    fn write_u32(&mut self, i: u32) {
        self.fold(i as u64);
    }
    fn write_u64(&mut self, i: u64) {
        self.fold(i);
    }
    fn write_usize(&mut self, i: usize) {
        self.fold(i as u64);
    }
    // Signed values hash to their two's complement bit pattern at their own width.
    fn write_i8(&mut self, i: i8) {
        self.fold(i as u8 as u64);
    }
    fn write_i16(&mut self, i: i16) {
        self.fold(i as u16 as u64);
    }
    fn write_i32(&mut self, i: i32) {
        self.fold(i as u32 as u64);
    }
    fn write_i64(&mut self, i: i64) {
        self.fold(i as u64);
    }
    fn write_isize(&mut self, i: isize) {
        self.fold(i as usize as u64);
    }
}
