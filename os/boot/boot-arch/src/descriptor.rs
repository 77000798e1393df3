use crate::platform;
use crate::{ArchOps, ArchType, HandoffConvention};
use boot_info::PlatformLayout;
use core::fmt;

/// A platform's operation table plus the static facts that go with it.
pub struct ArchDescriptor {
    arch: ArchType,
    ops: &'static dyn ArchOps,
}

impl ArchDescriptor {
    /// Pair an architecture identifier with its operation table.
    ///
    /// The built-in descriptors are reached through [`select`]; this
    /// constructor exists for substitute tables (e.g. recording test doubles).
    #[must_use]
    pub const fn new(arch: ArchType, ops: &'static dyn ArchOps) -> Self {
        Self { arch, ops }
    }

    #[inline]
    #[must_use]
    pub const fn arch(&self) -> ArchType {
        self.arch
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.arch.name()
    }

    #[inline]
    #[must_use]
    pub const fn ops(&self) -> &'static dyn ArchOps {
        self.ops
    }

    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &'static PlatformLayout {
        self.arch.layout()
    }

    #[inline]
    #[must_use]
    pub const fn convention(&self) -> HandoffConvention {
        self.arch.handoff_convention()
    }
}

impl fmt::Debug for ArchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchDescriptor")
            .field("arch", &self.arch)
            .field("convention", &self.convention())
            .finish_non_exhaustive()
    }
}

/// The compiled-in descriptor for `arch`.
#[must_use]
pub const fn select(arch: ArchType) -> &'static ArchDescriptor {
    match arch {
        ArchType::Aarch64 => &platform::aarch64::DESCRIPTOR,
        ArchType::LoongArch64 => &platform::loongarch64::DESCRIPTOR,
        ArchType::RiscV64 => &platform::riscv64::DESCRIPTOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_matches_request() {
        for arch in ArchType::ALL {
            let desc = select(arch);
            assert_eq!(desc.arch(), arch);
            assert_eq!(desc.name(), arch.name());
            assert_eq!(desc.ops().arch(), arch);
        }
    }
}
