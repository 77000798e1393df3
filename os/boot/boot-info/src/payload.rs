//! # Payload Descriptors
//!
//! The embedded images and where they are headed.

use boot_memory::{MemoryRegion, PhysicalAddress};
use core::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PayloadRole {
    Hypervisor,
    Kernel,
}

impl fmt::Display for PayloadRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hypervisor => f.write_str("hypervisor"),
            Self::Kernel => f.write_str("kernel"),
        }
    }
}

/// How the payload bytes are placed at the load address.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PayloadFormat {
    /// Flat binary, copied verbatim; the load address is its entry point.
    Raw,
    /// Position-independent PE/COFF image, copied section by section.
    Pe,
}

/// What happens when the optional kernel payload fails to load.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum OptionalPolicy {
    /// Log the error and boot without it.
    #[default]
    Skip,
    /// Treat it like a failure of the hypervisor payload.
    Require,
}

/// An embedded image together with its destination.
#[derive(Debug, Copy, Clone)]
pub struct Payload {
    pub role: PayloadRole,
    pub bytes: &'static [u8],
    pub load: PhysicalAddress,
    pub format: PayloadFormat,
}

impl Payload {
    #[must_use]
    pub const fn new(
        role: PayloadRole,
        bytes: &'static [u8],
        load: PhysicalAddress,
        format: PayloadFormat,
    ) -> Self {
        Self {
            role,
            bytes,
            load,
            format,
        }
    }

    /// Where the embedded bytes currently live (inside the loader image).
    #[must_use]
    pub fn source(&self) -> MemoryRegion {
        MemoryRegion::from_address(
            PhysicalAddress::from_ptr(self.bytes.as_ptr()),
            self.bytes.len() as u64,
        )
    }

    /// Where a raw copy of the bytes will be placed.
    #[must_use]
    pub const fn destination(&self) -> MemoryRegion {
        MemoryRegion::from_address(self.load, self.bytes.len() as u64)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
