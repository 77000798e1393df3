use crate::PhysicalAddress;
use core::fmt;

/// A half-open physical range `[start, start + len)`.
///
/// The end is saturated at `u64::MAX`, so a region never wraps.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct MemoryRegion {
    start: PhysicalAddress,
    len: u64,
}

impl MemoryRegion {
    #[must_use]
    pub const fn new(start: u64, len: u64) -> Self {
        Self {
            start: PhysicalAddress::new(start),
            len,
        }
    }

    #[must_use]
    pub const fn from_address(start: PhysicalAddress, len: u64) -> Self {
        Self { start, len }
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> PhysicalAddress {
        self.start
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exclusive end address.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.start.as_u64().saturating_add(self.len))
    }

    /// Whether the two regions share at least one byte. Empty regions overlap nothing.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.start.as_u64() < other.end().as_u64() && other.start.as_u64() < self.end().as_u64()
    }

    #[must_use]
    pub const fn contains(&self, addr: PhysicalAddress) -> bool {
        addr.as_u64() >= self.start.as_u64() && addr.as_u64() < self.end().as_u64()
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_half_open() {
        let a = MemoryRegion::new(0x1000, 0x1000);
        let b = MemoryRegion::new(0x2000, 0x1000);
        let c = MemoryRegion::new(0x1FFF, 2);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn empty_region_overlaps_nothing() {
        let a = MemoryRegion::new(0x1000, 0x1000);
        assert!(!a.overlaps(&MemoryRegion::new(0x1800, 0)));
    }

    #[test]
    fn end_saturates() {
        let r = MemoryRegion::new(u64::MAX - 1, 16);
        assert_eq!(r.end().as_u64(), u64::MAX);
        assert!(r.contains(PhysicalAddress::new(u64::MAX - 1)));
    }

    #[test]
    fn display() {
        let r = MemoryRegion::new(0x4000_0000, 0x10);
        assert_eq!(r.to_string(), "[0x0000000040000000, 0x0000000040000010)");
    }
}
