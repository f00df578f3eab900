//! Modular sequence-number arithmetic.
//!
//! Sequence numbers live on a ring of `size` values.  Both windows are a
//! contiguous arc of that ring:
//!
//! ```text
//!            base                 base + width
//!             │                        │
//!  ───────────┼────────────────────────┼───────────▶ (mod size)
//!   behind    │ <──── in window ─────▶ │   ahead
//! ```
//!
//! Every membership test in the sender and receiver reduces to
//! [`SeqSpace::in_window`].

/// A sequence-number ring of fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqSpace {
    size: i64,
}

impl SeqSpace {
    /// Create a ring with `size` sequence numbers.
    ///
    /// `size` must be at least 1 and representable as `i32`;
    /// [`crate::config::ArqConfig`] validates both before calling this.
    pub fn new(size: usize) -> Self {
        debug_assert!(size >= 1 && size <= i32::MAX as usize);
        Self { size: size as i64 }
    }

    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// `true` when `x` is a canonical sequence number, i.e. in `[0, size)`.
    pub fn contains(&self, x: i32) -> bool {
        (0..self.size).contains(&i64::from(x))
    }

    /// Forward distance from `base` to `x`, in `[0, size)`.
    #[inline]
    pub fn offset(&self, x: i32, base: i32) -> usize {
        (i64::from(x) - i64::from(base)).rem_euclid(self.size) as usize
    }

    /// `true` when `x` lies in the arc `[base, base + width)`.
    #[inline]
    pub fn in_window(&self, x: i32, base: i32, width: usize) -> bool {
        self.offset(x, base) < width
    }

    /// `x + n`, wrapped around the ring.
    #[inline]
    pub fn add(&self, x: i32, n: usize) -> i32 {
        (i64::from(x) + n as i64).rem_euclid(self.size) as i32
    }

    /// Slot index for `x` in an arena of `size` entries.
    #[inline]
    pub fn index(&self, x: i32) -> usize {
        i64::from(x).rem_euclid(self.size) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_wraps_around() {
        let s = SeqSpace::new(10);
        assert_eq!(s.offset(2, 8), 4);
        assert_eq!(s.offset(8, 2), 6);
        assert_eq!(s.offset(5, 5), 0);
    }

    #[test]
    fn in_window_across_wrap() {
        let s = SeqSpace::new(10);
        // window [8, 9, 0, 1]
        for x in [8, 9, 0, 1] {
            assert!(s.in_window(x, 8, 4), "{x} should be inside");
        }
        for x in [2, 5, 7] {
            assert!(!s.in_window(x, 8, 4), "{x} should be outside");
        }
    }

    #[test]
    fn empty_window_contains_nothing() {
        let s = SeqSpace::new(12);
        assert!(!s.in_window(3, 3, 0));
    }

    #[test]
    fn add_wraps() {
        let s = SeqSpace::new(10);
        assert_eq!(s.add(9, 1), 0);
        assert_eq!(s.add(7, 5), 2);
    }

    #[test]
    fn contains_rejects_out_of_range() {
        let s = SeqSpace::new(10);
        assert!(s.contains(0));
        assert!(s.contains(9));
        assert!(!s.contains(10));
        assert!(!s.contains(-1));
        assert!(!s.contains(999_999));
    }

    #[test]
    fn extreme_values_do_not_overflow() {
        let s = SeqSpace::new(7);
        assert!(s.offset(i32::MIN, i32::MAX) < 7);
        assert!(s.index(i32::MIN) < 7);
    }
}
