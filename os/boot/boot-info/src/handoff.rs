//! # Hand-off Conventions
//!
//! How the payload entry point is invoked, described as data.

use core::fmt;

/// Register/parameter layout used to call a loaded image's entry point.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum HandoffConvention {
    /// No arguments, plain jump.
    Direct,
    /// CPU id and a context pointer.
    TwoWord,
    /// CPU id, a context pointer and a secondary context.
    ThreeWord,
}

impl HandoffConvention {
    #[must_use]
    pub const fn arg_count(self) -> usize {
        match self {
            Self::Direct => 0,
            Self::TwoWord => 2,
            Self::ThreeWord => 3,
        }
    }

    /// Values actually placed in argument registers, in order.
    #[must_use]
    pub fn args(self, words: &[u64; 3]) -> &[u64] {
        &words[..self.arg_count()]
    }
}

impl fmt::Display for HandoffConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::TwoWord => f.write_str("two-word"),
            Self::ThreeWord => f.write_str("three-word"),
        }
    }
}

/// Argument register names per platform, in argument order.
#[must_use]
pub const fn argument_registers(arch: crate::ArchType) -> [&'static str; 3] {
    match arch {
        crate::ArchType::Aarch64 => ["x0", "x1", "x2"],
        crate::ArchType::LoongArch64 | crate::ArchType::RiscV64 => ["a0", "a1", "a2"],
    }
}

/// Machine-word values passed to the payload.
///
/// Keep this `#[repr(C)]`: the loader traces it verbatim to the serial port.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct HandoffParams {
    /// Logical id of the boot CPU (hart id on RISC-V).
    pub cpu_id: u64,

    /// Device tree blob if the firmware published one, else the ACPI root pointer, else 0.
    pub context: u64,

    /// Secondary context (the UEFI system table), only for [`HandoffConvention::ThreeWord`].
    pub secondary: u64,
}

impl HandoffParams {
    #[must_use]
    pub const fn as_words(&self) -> [u64; 3] {
        [self.cpu_id, self.context, self.secondary]
    }
}

const _: () = {
    assert!(size_of::<HandoffParams>() == 24);
};
