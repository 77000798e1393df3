use crate::{ArchError, ArchOps, ArchType, ClearPhase, FirmwareCpuQuery, MemoryOps, SerialOps};
use boot_memory::MemoryRegion;

/// Inert operation table with a fixed clear plan.
pub struct PlannedOps {
    preparation: &'static [MemoryRegion],
    cleanup: &'static [MemoryRegion],
}

impl PlannedOps {
    pub const fn new(
        preparation: &'static [MemoryRegion],
        cleanup: &'static [MemoryRegion],
    ) -> Self {
        Self {
            preparation,
            cleanup,
        }
    }
}

impl SerialOps for PlannedOps {
    fn serial_init(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn put_char(&self, _c: u8) -> Result<(), ArchError> {
        Ok(())
    }

    fn get_char(&self) -> Result<Option<u8>, ArchError> {
        Ok(None)
    }
}

impl MemoryOps for PlannedOps {
    fn memory_init(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn setup_direct_mapping(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn clear_plan(&self, phase: ClearPhase) -> &'static [MemoryRegion] {
        match phase {
            ClearPhase::Preparation => self.preparation,
            ClearPhase::Cleanup => self.cleanup,
        }
    }
}

impl ArchOps for PlannedOps {
    fn arch(&self) -> ArchType {
        ArchType::LoongArch64
    }

    fn early_init(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn init(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn get_boot_cpu_id(&self, _firmware: &dyn FirmwareCpuQuery) -> Result<u64, ArchError> {
        Ok(0)
    }

    fn before_exit_boot_services(
        &self,
        _firmware: &dyn FirmwareCpuQuery,
    ) -> Result<(), ArchError> {
        Ok(())
    }

    fn pre_jump_fixup(&self) -> Result<(), ArchError> {
        Ok(())
    }
}
