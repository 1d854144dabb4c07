use std::{
    cmp::Ordering,
    fmt,
    ops::{Add, BitAnd},
};

const LOW_32: u64 = 0xffff_ffff;

/// Unsigned 128-bit value held as two 64-bit words.
///
/// Arithmetic never relies on a native 128-bit type: additions propagate the
/// carry out of `lo` by comparing against the operand, and products are built
/// from 32-bit limbs. Addition wraps modulo 2^128.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Int128 {
    pub lo: u64,
    pub hi: u64,
}

impl Int128 {
    pub const ZERO: Self = Self::new(0, 0);

    pub const fn new(lo: u64, hi: u64) -> Self {
        Self { lo, hi }
    }

    pub const fn from_u64(lo: u64) -> Self {
        Self { lo, hi: 0 }
    }

    /// Exact 64x64 -> 128 product.
    pub fn mul64(a: u64, b: u64) -> Self {
        let (a_lo, a_hi) = (a & LOW_32, a >> 32);
        let (b_lo, b_hi) = (b & LOW_32, b >> 32);

        let t = a_lo * b_lo;
        let w0 = t & LOW_32;
        let k = t >> 32;

        let t = a_hi * b_lo + k;
        let k = t & LOW_32;
        let w1 = t >> 32;

        let t = a_lo * b_hi + k;
        let k = t >> 32;

        Self {
            lo: (t << 32) | w0,
            hi: a_hi * b_hi + w1 + k,
        }
    }

    /// Sum modulo 2^128 with the carry from `lo` folded into `hi`.
    pub fn wrapping_add(self, other: Self) -> Self {
        let lo = self.lo.wrapping_add(other.lo);
        let mut hi = self.hi.wrapping_add(other.hi);
        if lo < other.lo {
            hi = hi.wrapping_add(1);
        }
        Self { lo, hi }
    }

    pub fn and(self, mask: Self) -> Self {
        Self {
            lo: self.lo & mask.lo,
            hi: self.hi & mask.hi,
        }
    }
}

impl Add for Int128 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.wrapping_add(other)
    }
}

impl BitAnd for Int128 {
    type Output = Self;

    fn bitand(self, mask: Self) -> Self {
        self.and(mask)
    }
}

impl Ord for Int128 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hi.cmp(&other.hi).then(self.lo.cmp(&other.lo))
    }
}

impl PartialOrd for Int128 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Int128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}{:016x}", self.hi, self.lo)
    }
}
