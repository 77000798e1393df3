use crate::handoff::HandoffConvention;
use crate::layout::{self, PlatformLayout};
use core::fmt;

/// The closed set of supported instruction-set platforms.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ArchType {
    Aarch64,
    LoongArch64,
    RiscV64,
}

impl ArchType {
    pub const ALL: [Self; 3] = [Self::Aarch64, Self::LoongArch64, Self::RiscV64];

    /// The platform this binary was compiled for, if it is supported.
    #[must_use]
    pub const fn configured() -> Option<Self> {
        if cfg!(target_arch = "aarch64") {
            Some(Self::Aarch64)
        } else if cfg!(target_arch = "loongarch64") {
            Some(Self::LoongArch64)
        } else if cfg!(target_arch = "riscv64") {
            Some(Self::RiscV64)
        } else {
            None
        }
    }

    /// Resolve a Cargo `target_arch` string (as seen by build scripts).
    #[must_use]
    pub fn from_target_arch(target_arch: &str) -> Option<Self> {
        match target_arch {
            "aarch64" => Some(Self::Aarch64),
            "loongarch64" => Some(Self::LoongArch64),
            "riscv64" => Some(Self::RiscV64),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Aarch64 => "aarch64",
            Self::LoongArch64 => "loongarch64",
            Self::RiscV64 => "riscv64",
        }
    }

    #[must_use]
    pub const fn layout(self) -> &'static PlatformLayout {
        match self {
            Self::Aarch64 => &layout::AARCH64,
            Self::LoongArch64 => &layout::LOONGARCH64,
            Self::RiscV64 => &layout::RISCV64,
        }
    }

    #[must_use]
    pub const fn handoff_convention(self) -> HandoffConvention {
        match self {
            Self::Aarch64 | Self::RiscV64 => HandoffConvention::TwoWord,
            Self::LoongArch64 => HandoffConvention::ThreeWord,
        }
    }
}

impl fmt::Display for ArchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
