//! Built-in operation tables, one module per platform.

pub mod aarch64;
pub mod loongarch64;
pub mod riscv64;

#[cfg(test)]
pub(crate) mod testing;

use crate::{ArchError, ArchType};

/// `Ok` when compiled for `arch`, so hardware hooks never run on another target.
#[inline]
pub(crate) const fn native(arch: ArchType) -> Result<(), ArchError> {
    match ArchType::configured() {
        Some(configured) if configured as u8 == arch as u8 => Ok(()),
        _ => Err(ArchError::ForeignTarget(arch)),
    }
}
