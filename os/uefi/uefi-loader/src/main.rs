//! # UEFI Loader for hvisor
//!
//! A UEFI application that carries the hvisor hypervisor (and optionally a
//! zone0 kernel) inside its own image, places them at the platform's fixed
//! physical addresses and jumps into the hypervisor after terminating boot
//! services.
//!
//! ```text
//! UEFI firmware
//!         ↓
//! ┌─────────────────────────────────────────────┐
//! │  efi_main                                   │
//! │   • logger + pool allocator                 │
//! │   • UefiFirmware snapshot (tables, image)   │
//! │   • BootConfig from the embedded payloads   │
//! └─────────────────────────────────────────────┘
//!         ↓
//! boot_handoff::Sequencer::run
//!         ↓
//! hvisor (x0/a0 = boot cpu, x1/a1 = DTB or ACPI root)
//! ```
//!
//! ## Payloads
//!
//! `build.rs` embeds the file named by `HVISOR_BIN` and, with the `vmlinux`
//! feature, `HVISOR_VMLINUX`. Load addresses come from
//! [`boot_info::PlatformLayout`] for the architecture the loader is built for.
//!
//! ## Features
//! * `acpi-dump` (default): walk the ACPI tables and hex-dump the DSDT over serial.
//! * `vmlinux`: embed and place the zone0 kernel.
//! * `vmlinux-pe`: treat the kernel as a PE image (implies `vmlinux`).
//! * `verbose`: trace-level logging.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![cfg_attr(not(any(test, doctest)), no_main)]
#![allow(unsafe_code)]
extern crate alloc;

mod firmware;
mod logger;
mod memory;

mod payloads {
    include!(concat!(env!("OUT_DIR"), "/payloads.rs"));
}

use crate::firmware::UefiFirmware;
use crate::logger::BootLogger;
use boot_arch::select;
use boot_handoff::{BootConfig, Sequencer};
use boot_info::ArchType;
use boot_memory::IdentityMap;
use log::{LevelFilter, info};
use uefi::prelude::*;

const MAX_LEVEL: LevelFilter = if cfg!(feature = "verbose") {
    LevelFilter::Trace
} else {
    LevelFilter::Debug
};

#[entry]
fn efi_main() -> Status {
    let Ok(logger) = BootLogger::init(MAX_LEVEL) else {
        return Status::ABORTED;
    };

    info!(
        "hvisor UEFI loader {} ({} byte hypervisor image)",
        env!("CARGO_PKG_VERSION"),
        payloads::HVISOR.len()
    );

    let firmware = match UefiFirmware::new(logger) {
        Ok(firmware) => firmware,
        Err(status) => {
            uefi::println!("Failed to query the firmware: {status:?}");
            return status;
        }
    };

    let config = BootConfig::new(ArchType::configured().map(select), payloads::HVISOR)
        .with_diagnostic_dump(cfg!(feature = "acpi-dump"));
    let config = with_kernel(config);

    // SAFETY: physical memory is identity mapped while the loader runs.
    unsafe { Sequencer::new(firmware, IdentityMap, config).run() }
}

#[cfg(feature = "vmlinux")]
fn with_kernel(config: BootConfig) -> BootConfig {
    use boot_info::PayloadFormat;

    let format = if cfg!(feature = "vmlinux-pe") {
        PayloadFormat::Pe
    } else {
        PayloadFormat::Raw
    };
    config.with_kernel(payloads::VMLINUX, format)
}

#[cfg(not(feature = "vmlinux"))]
const fn with_kernel(config: BootConfig) -> BootConfig {
    config
}
