//! # Firmware Table Walker
//!
//! A diagnostic-only walk through the ACPI tables the firmware publishes.
//!
//! ## Overview
//!
//! ```text
//! UEFI configuration table
//!     ↓  (ACPI 2.0 entry preferred over ACPI 1.0)
//! RSDP "RSD PTR "
//!     ↓  revision ≥ 2 → XSDT (64-bit entries), else RSDT (32-bit entries)
//! XSDT / RSDT
//!     ↓  first entry whose signature is "FACP"
//! FADT
//!     ↓  X_DSDT if non-zero, else DSDT
//! DSDT header + AML byte stream (hex-dumped, never interpreted)
//! ```
//!
//! Every pointer along the way is firmware-supplied and untrusted. Tables are
//! only ever accessed through [`PhysMapRo`] views whose lengths come from the
//! table headers, and every field read is bounds-checked against that view.
//!
//! ## Failure Policy
//!
//! Each step returns a [`WalkError`] when its target is missing or malformed,
//! and the walk stops there. None of these errors is fatal to the boot: the
//! caller logs them and carries on without the dump.
//!
//! ## Checksums
//!
//! The root pointer checksums are enforced (a root pointer failing them is
//! not trusted at all). Table checksums are only reported, matching what
//! firmware in the field actually ships.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod chain;
mod config;
mod dump;
mod fadt;
mod rsdp;
mod sdt;
mod walk;

pub use boot_memory::PhysMapRo;
pub use chain::{EntryWidth, TableOfTables, find_sibling, resolve_table_chain};
pub use config::{ConfigEntry, ConfigTableKind, locate_device_tree, select_root_entry};
pub use dump::AmlHexDump;
pub use fadt::{FixedTable, PayloadTable, extract_payload};
pub use rsdp::{RootPointer, locate_root};
pub use sdt::{SdtHeader, Signature, Table, TableSignature, load_table};
pub use walk::{WalkReport, walk};

use boot_memory::PhysicalAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WalkError {
    #[error("no ACPI root pointer in the firmware configuration table")]
    NoRootPointer,
    #[error("{address} (+{len:#x}) is not readable")]
    Unmapped { address: PhysicalAddress, len: usize },
    #[error("no \"RSD PTR \" at {address}, found \"{found}\"")]
    BadRootSignature {
        address: PhysicalAddress,
        found: Signature<8>,
    },
    #[error("bad signature at {address}: expected \"{expected}\", found \"{found}\"")]
    BadSignature {
        address: PhysicalAddress,
        expected: TableSignature,
        found: TableSignature,
    },
    #[error("checksum mismatch in {what} at {address}")]
    BadChecksum {
        what: &'static str,
        address: PhysicalAddress,
    },
    #[error("implausible length {length} at {address}")]
    BadLength { address: PhysicalAddress, length: u32 },
    #[error("{0} holds a null pointer")]
    NullPointer(TableSignature),
    #[error("no table with signature \"{0}\"")]
    SignatureNotFound(TableSignature),
}

/// Byte sum; a valid ACPI structure sums to zero.
pub(crate) fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |a, &b| a.wrapping_add(b))
}

#[inline]
pub(crate) fn read_u32_le(buf: &[u8], off: usize) -> Option<u32> {
    let end = off.checked_add(4)?;
    let s = buf.get(off..end)?;
    Some(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}

#[inline]
pub(crate) fn read_u64_le(buf: &[u8], off: usize) -> Option<u64> {
    let end = off.checked_add(8)?;
    let s = buf.get(off..end)?;
    Some(u64::from_le_bytes([
        s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7],
    ]))
}

/// Map `len` bytes at `address` or report them as unreadable.
///
/// # Safety
/// See [`PhysMapRo::map_ro`].
pub(crate) unsafe fn map<'a>(
    map: &impl PhysMapRo,
    address: u64,
    len: usize,
) -> Result<&'a [u8], WalkError> {
    unsafe { map.map_ro(address, len) }.ok_or(WalkError::Unmapped {
        address: PhysicalAddress::new(address),
        len,
    })
}
