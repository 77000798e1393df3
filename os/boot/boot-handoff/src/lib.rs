//! # Hand-off Sequencer
//!
//! Ties the architecture table, the firmware table walker and the PE loader
//! into one ordered, fail-fast boot protocol.
//!
//! ## Overview
//!
//! ```text
//!            ┌──────────┐   config tables, memory map, ExitBootServices
//!            │ Firmware │◄──────────────────────────────────────────┐
//!            └──────────┘                                           │
//! ┌───────────────────────────────────────────────────────────────┐ │
//! │ Sequencer                                                     │─┘
//! │  Detect → EarlyArchInit → GeneralArchInit → DiagnosticDump    │
//! │  → AcquireMemoryMap → TerminateFirmwareServices               │
//! │  → CopyPayloads → ArchPreJumpFixup → Transfer                 │
//! └───────────────────────────────────────────────────────────────┘
//!     │ ArchOps            │ boot_acpi::walk      │ boot_pe / copy_bytes
//!     ▼                    ▼                      ▼
//!  platform hooks     diagnostic dump       physical memory (PhysMapRw)
//! ```
//!
//! The firmware is reached only through the [`Firmware`] trait and physical
//! memory only through [`PhysMapRw`](boot_memory::PhysMapRw), so the whole
//! sequence runs on the host against scripted firmware and simulated memory.
//!
//! ## Errors
//!
//! Every failure is a [`BootError`], classified by [`BootError::class`].
//! Diagnostic-only failures are logged and ignored; everything else stops the
//! sequence. [`Sequencer::run`] halts the CPU on a fatal error; the boot has
//! exactly one chance.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod config;
mod context;
mod error;
pub mod firmware;
pub mod memory_map;
mod sequencer;
mod trace;

pub use config::BootConfig;
pub use context::BootContext;
pub use error::{BootError, ConfigError, ErrorClass, FirmwareError};
pub use firmware::{Firmware, MapKey, MapLayout, MapQuery};
pub use memory_map::{DESCRIPTOR_MARGIN, MemoryMapInfo};
pub use sequencer::{BootState, Sequencer};
pub use trace::trace_handoff;
