//! # Raw Memory Primitives
//!
//! Byte-granular access to physical memory for the pre-boot environment.
//!
//! ## Overview
//!
//! The loader runs with the firmware's identity mapping in place: every
//! physical address is also a valid virtual address. Everything above this
//! crate (the firmware table walker, the PE loader and the hand-off sequencer)
//! still goes through the [`PhysMapRo`] / [`PhysMapRw`] traits instead of
//! dereferencing raw pointers, so that
//!
//! * untrusted firmware pointers become bounds-checked slice views, and
//! * the same code runs against [`sim::SimulatedMemory`] in host tests.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`PhysicalAddress`] | A typed 64-bit physical address. |
//! | [`MemoryRegion`] | A half-open `[start, start + len)` physical range. |
//! | [`IdentityMap`] | The production mapper (VA == PA). |
//!
//! ## Primitives
//!
//! [`copy_bytes`] and [`fill_bytes`] move bytes to arbitrary physical
//! addresses; [`verify_filled`] re-reads a filled region. None of them
//! allocate.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(any(test, feature = "sim"))]
extern crate alloc;

mod physical_address;
mod region;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use physical_address::PhysicalAddress;
pub use region::MemoryRegion;

/// Map a physical region and return a *read-only* byte slice for its contents.
pub trait PhysMapRo {
    /// Returns `None` if the range cannot be represented or is not backed by memory.
    ///
    /// # Safety
    /// The implementor must ensure the returned slice is valid for `len` bytes.
    /// The caller must not hold the slice across a write to the same range.
    unsafe fn map_ro<'a>(&self, paddr: u64, len: usize) -> Option<&'a [u8]>;
}

/// Map a physical region for writing.
pub trait PhysMapRw: PhysMapRo {
    /// Returns `None` if the range cannot be represented or is not backed by memory.
    ///
    /// # Safety
    /// The implementor must ensure the returned slice is valid for `len` bytes.
    /// The caller must ensure that nothing else (including the running loader
    /// itself) lives in the mapped range.
    unsafe fn map_rw<'a>(&mut self, paddr: u64, len: usize) -> Option<&'a mut [u8]>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("physical range {address} (+{len:#x}) is not mapped")]
    Unmapped { address: PhysicalAddress, len: u64 },
    #[error("expected {expected:#04x} at {address}, found {found:#04x}")]
    Mismatch {
        address: PhysicalAddress,
        expected: u8,
        found: u8,
    },
}

/// Identity mapping of the firmware environment (VA == PA).
///
/// Address zero is never handed out; neither are ranges that wrap around
/// the address space.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityMap;

impl IdentityMap {
    fn checked(paddr: u64, len: usize) -> Option<usize> {
        if paddr == 0 {
            return None;
        }
        let addr = usize::try_from(paddr).ok()?;
        addr.checked_add(len)?;
        Some(addr)
    }
}

impl PhysMapRo for IdentityMap {
    unsafe fn map_ro<'a>(&self, paddr: u64, len: usize) -> Option<&'a [u8]> {
        let addr = Self::checked(paddr, len)?;
        // SAFETY: identity-mapped; validity is the caller's contract.
        Some(unsafe { core::slice::from_raw_parts(addr as *const u8, len) })
    }
}

impl PhysMapRw for IdentityMap {
    unsafe fn map_rw<'a>(&mut self, paddr: u64, len: usize) -> Option<&'a mut [u8]> {
        let addr = Self::checked(paddr, len)?;
        // SAFETY: identity-mapped; exclusivity is the caller's contract.
        Some(unsafe { core::slice::from_raw_parts_mut(addr as *mut u8, len) })
    }
}

/// Copy `src` verbatim to the physical address `dst`.
///
/// # Errors
/// [`MemoryError::Unmapped`] if the destination cannot be mapped.
///
/// # Safety
/// The destination range must not hold live data, including the caller's own
/// code and the bytes of `src`.
pub unsafe fn copy_bytes(
    mem: &mut impl PhysMapRw,
    dst: PhysicalAddress,
    src: &[u8],
) -> Result<(), MemoryError> {
    if src.is_empty() {
        return Ok(());
    }

    let target = unsafe { mem.map_rw(dst.as_u64(), src.len()) }.ok_or(MemoryError::Unmapped {
        address: dst,
        len: src.len() as u64,
    })?;
    target.copy_from_slice(src);
    Ok(())
}

/// Fill `region` with `value`.
///
/// # Errors
/// [`MemoryError::Unmapped`] if the region cannot be mapped.
///
/// # Safety
/// The region must not hold live data.
pub unsafe fn fill_bytes(
    mem: &mut impl PhysMapRw,
    region: MemoryRegion,
    value: u8,
) -> Result<(), MemoryError> {
    let len = region_len(region)?;
    if len == 0 {
        return Ok(());
    }

    let target =
        unsafe { mem.map_rw(region.start().as_u64(), len) }.ok_or(MemoryError::Unmapped {
            address: region.start(),
            len: region.len(),
        })?;
    target.fill(value);
    Ok(())
}

/// Re-read `region` and check that every byte equals `value`.
///
/// # Errors
/// [`MemoryError::Mismatch`] for the first deviating byte,
/// [`MemoryError::Unmapped`] if the region cannot be mapped.
pub fn verify_filled(
    mem: &impl PhysMapRo,
    region: MemoryRegion,
    value: u8,
) -> Result<(), MemoryError> {
    let len = region_len(region)?;
    if len == 0 {
        return Ok(());
    }

    // SAFETY: read-only view, dropped before returning.
    let bytes = unsafe { mem.map_ro(region.start().as_u64(), len) }.ok_or(
        MemoryError::Unmapped {
            address: region.start(),
            len: region.len(),
        },
    )?;

    match bytes.iter().position(|&b| b != value) {
        None => Ok(()),
        Some(offset) => Err(MemoryError::Mismatch {
            address: region.start() + offset as u64,
            expected: value,
            found: bytes[offset],
        }),
    }
}

fn region_len(region: MemoryRegion) -> Result<usize, MemoryError> {
    usize::try_from(region.len()).map_err(|_| MemoryError::Unmapped {
        address: region.start(),
        len: region.len(),
    })
}
