//! # Memory Layout
//!
//! Fixed physical load addresses and clear plans per platform.

use boot_memory::{MemoryRegion, PhysicalAddress};

const MIB: u64 = 1024 * 1024;
const KIB: u64 = 1024;

/// When a region is zeroed relative to the payload copy.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ClearPhase {
    /// After firmware termination, before any payload byte is placed.
    Preparation,
    /// After the payload copy, right before transfer.
    Cleanup,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PlatformLayout {
    /// Where the hypervisor image is copied; also its entry point for raw images.
    pub hypervisor_load: PhysicalAddress,

    /// Where the companion kernel image is copied.
    pub kernel_load: PhysicalAddress,

    pub preparation_clears: &'static [MemoryRegion],

    pub cleanup_clears: &'static [MemoryRegion],
}

impl PlatformLayout {
    #[must_use]
    pub const fn clears(&self, phase: ClearPhase) -> &'static [MemoryRegion] {
        match phase {
            ClearPhase::Preparation => self.preparation_clears,
            ClearPhase::Cleanup => self.cleanup_clears,
        }
    }
}

/// QEMU `virt`: RAM starts at 1 GiB.
pub const AARCH64: PlatformLayout = PlatformLayout {
    hypervisor_load: PhysicalAddress::new(0x4000_0000),
    kernel_load: PhysicalAddress::new(0x4020_0000),
    preparation_clears: &[],
    cleanup_clears: &[],
};

/// Addresses are in the cached direct-mapped window (DMW1, `0x9000_...`).
pub const LOONGARCH64: PlatformLayout = PlatformLayout {
    hypervisor_load: PhysicalAddress::new(0x9000_0001_0001_0000),
    kernel_load: PhysicalAddress::new(0x9000_0000_0020_0000),
    preparation_clears: &[
        MemoryRegion::new(0x9000_0001_0000_0000, 16 * MIB),
        MemoryRegion::new(0x9000_0000_0000_1000, 64 * KIB),
        MemoryRegion::new(0x9000_0000_0020_0000, 16 * MIB),
    ],
    cleanup_clears: &[],
};

/// OpenSBI occupies the first 2 MiB of RAM.
pub const RISCV64: PlatformLayout = PlatformLayout {
    hypervisor_load: PhysicalAddress::new(0x8020_0000),
    kernel_load: PhysicalAddress::new(0x9000_0000),
    preparation_clears: &[],
    cleanup_clears: &[],
};

const fn check(layout: &PlatformLayout) {
    assert!(layout.hypervisor_load.is_aligned(4 * KIB));
    assert!(layout.kernel_load.is_aligned(4 * KIB));
    assert!(layout.hypervisor_load.as_u64() != layout.kernel_load.as_u64());
}

const _: () = {
    check(&AARCH64);
    check(&LOONGARCH64);
    check(&RISCV64);

    // The kernel window follows the hypervisor on aarch64 and must leave it 2 MiB.
    assert!(AARCH64.kernel_load.as_u64() - AARCH64.hypervisor_load.as_u64() >= 2 * MIB);
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArchType;

    #[test]
    fn loongarch_preparation_plan() {
        let plan = ArchType::LoongArch64.layout().clears(ClearPhase::Preparation);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].end().as_u64(), 0x9000_0001_0100_0000);
        assert_eq!(plan[1].end().as_u64(), 0x9000_0000_0001_1000);
        assert!(plan.iter().any(|r| r.contains(LOONGARCH64.kernel_load)));
        assert!(plan.iter().any(|r| r.contains(LOONGARCH64.hypervisor_load)));
    }

    #[test]
    fn aarch64_clears_nothing() {
        let layout = ArchType::Aarch64.layout();
        assert!(layout.clears(ClearPhase::Preparation).is_empty());
        assert!(layout.clears(ClearPhase::Cleanup).is_empty());
    }
}
