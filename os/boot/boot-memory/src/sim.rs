//! Heap-backed stand-in for physical memory, used by host tests.

use crate::{PhysMapRo, PhysMapRw};
use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::UnsafeCell;

struct Window {
    base: u64,
    bytes: Box<[UnsafeCell<u8>]>,
}

impl Window {
    fn offset_of(&self, paddr: u64, len: usize) -> Option<usize> {
        let offset = usize::try_from(paddr.checked_sub(self.base)?).ok()?;
        let end = offset.checked_add(len)?;
        (end <= self.bytes.len()).then_some(offset)
    }

    fn ptr_at(&self, offset: usize) -> *mut u8 {
        // The cells are contiguous; UnsafeCell<u8> has the layout of u8.
        UnsafeCell::raw_get(self.bytes.as_ptr().wrapping_add(offset))
    }
}

/// A set of disjoint physical windows, each backed by a zeroed heap buffer.
///
/// Any access that is not fully contained in one window is unmapped, which
/// mirrors how the loader treats firmware pointers into non-existent memory.
#[derive(Default)]
pub struct SimulatedMemory {
    windows: Vec<Window>,
}

impl SimulatedMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SimulatedMemory::add_window`].
    #[must_use]
    pub fn with_window(mut self, base: u64, len: usize) -> Self {
        self.add_window(base, len);
        self
    }

    pub fn add_window(&mut self, base: u64, len: usize) {
        let bytes: Vec<UnsafeCell<u8>> = vec![0u8; len].into_iter().map(UnsafeCell::new).collect();
        self.windows.push(Window {
            base,
            bytes: bytes.into_boxed_slice(),
        });
    }

    fn locate(&self, paddr: u64, len: usize) -> Option<*mut u8> {
        self.windows
            .iter()
            .find_map(|w| w.offset_of(paddr, len).map(|offset| w.ptr_at(offset)))
    }

    /// Write `data` at `paddr`.
    ///
    /// # Panics
    /// If the range is not backed by a single window.
    pub fn write(&mut self, paddr: u64, data: &[u8]) {
        let ptr = self
            .locate(paddr, data.len())
            .unwrap_or_else(|| panic!("write to unmapped {paddr:#x} (+{:#x})", data.len()));
        // SAFETY: range checked by `locate`; &mut self excludes other views.
        unsafe { core::ptr::copy_nonoverlapping(data.as_ptr(), ptr, data.len()) };
    }

    /// Copy `len` bytes starting at `paddr` out of the simulated memory.
    ///
    /// # Panics
    /// If the range is not backed by a single window.
    #[must_use]
    pub fn read(&self, paddr: u64, len: usize) -> Vec<u8> {
        let ptr = self
            .locate(paddr, len)
            .unwrap_or_else(|| panic!("read from unmapped {paddr:#x} (+{len:#x})"));
        // SAFETY: range checked by `locate`.
        unsafe { core::slice::from_raw_parts(ptr, len) }.to_vec()
    }

    #[must_use]
    pub fn is_mapped(&self, paddr: u64, len: usize) -> bool {
        self.locate(paddr, len).is_some()
    }
}

impl PhysMapRo for SimulatedMemory {
    unsafe fn map_ro<'a>(&self, paddr: u64, len: usize) -> Option<&'a [u8]> {
        let ptr = self.locate(paddr, len)?;
        // SAFETY: backed by a live window; lifetime is the caller's contract.
        Some(unsafe { core::slice::from_raw_parts(ptr, len) })
    }
}

impl PhysMapRw for SimulatedMemory {
    unsafe fn map_rw<'a>(&mut self, paddr: u64, len: usize) -> Option<&'a mut [u8]> {
        let ptr = self.locate(paddr, len)?;
        // SAFETY: backed by a live window; exclusivity is the caller's contract.
        Some(unsafe { core::slice::from_raw_parts_mut(ptr, len) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accesses_must_fit_one_window() {
        let mem = SimulatedMemory::new()
            .with_window(0x1000, 0x100)
            .with_window(0x1100, 0x100);
        assert!(mem.is_mapped(0x1000, 0x100));
        assert!(!mem.is_mapped(0x10F0, 0x20));
        assert!(!mem.is_mapped(0xFFF, 1));
    }

    #[test]
    fn write_is_visible_through_map() {
        let mut mem = SimulatedMemory::new().with_window(0x8000, 16);
        mem.write(0x8004, &[1, 2, 3]);
        let view = unsafe { mem.map_ro(0x8004, 3) }.unwrap();
        assert_eq!(view, &[1, 2, 3]);
    }
}
