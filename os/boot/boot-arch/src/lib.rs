//! # Architecture Operation Table
//!
//! One control flow, three unrelated instruction-set platforms.
//!
//! ## Overview
//!
//! Every platform-specific action the loader performs goes through the
//! [`ArchOps`] trait object owned by an [`ArchDescriptor`]. Exactly one
//! descriptor is compiled in per target and chosen once with [`select`];
//! everything above this crate is platform-neutral.
//!
//! | Platform | Serial | Early init | Pre-jump fix-up | Hand-off |
//! |----------|--------|------------|-----------------|----------|
//! | aarch64 | PL011 @ `0x0900_0000` | none | `ic iallu; dsb ish; isb` | `x0`, `x1` |
//! | loongarch64 | NS16550 @ `0x1fe0_01e0` | DMW0/DMW1 | `ibar 0` | `a0`, `a1`, `a2` |
//! | riscv64 | SBI legacy console | none | `satp = 0; sfence.vma; fence.i` | `a0`, `a1` |
//!
//! Hooks that touch hardware only run on their own target. Compiled for any
//! other target (host tests included) they fail with
//! [`ArchError::ForeignTarget`] instead of executing foreign instructions.
//! Hooks documented as no-ops succeed everywhere.
//!
//! ## Binding
//!
//! The hand-off sequencer threads the selected descriptor through its own
//! context. In addition the descriptor is [`publish`]ed into a single-assignment
//! cell so the [`serial_trace!`] sink can reach the UART from anywhere,
//! including the logger.
//!
//! ## Memory Clearing
//!
//! Platforms only *describe* the regions they want zeroed
//! ([`MemoryOps::clear_plan`]); [`clear_memory_regions`] executes a plan after
//! checking it against a caller-supplied list of protected regions.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod binding;
mod clear;
mod descriptor;
mod handoff;
mod ops;
pub mod platform;
mod sync_once_cell;

#[doc(hidden)]
pub mod serial_fmt;

pub use binding::{active, publish};
pub use boot_info::{ArchType, ClearPhase, HandoffConvention, HandoffParams};
pub use clear::clear_memory_regions;
pub use descriptor::{ArchDescriptor, select};
pub use handoff::{halt, jump};
pub use ops::{ArchOps, FirmwareCpuQuery, MemoryOps, SerialOps};

use boot_memory::{MemoryError, MemoryRegion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArchError {
    #[error("no architecture descriptor is bound")]
    Unbound,
    #[error("architecture descriptor {current} is already bound, refusing {requested}")]
    AlreadyBound {
        current: ArchType,
        requested: ArchType,
    },
    #[error("{0} hardware access is not available on this target")]
    ForeignTarget(ArchType),
    #[error("the boot CPU id could not be determined")]
    BootCpuUnavailable,
    #[error("refusing to clear {region}: overlaps protected {protected}")]
    UnsafeClear {
        region: MemoryRegion,
        protected: MemoryRegion,
    },
    #[error(transparent)]
    Memory(#[from] MemoryError),
}
