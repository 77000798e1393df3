use crate::{ArchError, ArchType, ClearPhase, HandoffConvention, HandoffParams};
use boot_memory::{MemoryRegion, PhysicalAddress};

/// Firmware queries a platform may need while boot services are still up.
pub trait FirmwareCpuQuery {
    /// The boot hart id published through the RISC-V boot protocol, if any.
    fn boot_hart_id(&self) -> Option<u64>;
}

pub trait SerialOps {
    /// Bring the UART into a usable state.
    ///
    /// # Errors
    /// [`ArchError::ForeignTarget`] when running on another target.
    fn serial_init(&self) -> Result<(), ArchError>;

    /// Blocking write of one byte.
    ///
    /// # Errors
    /// [`ArchError::ForeignTarget`] when running on another target.
    fn put_char(&self, c: u8) -> Result<(), ArchError>;

    /// Non-blocking read of one byte.
    ///
    /// # Errors
    /// [`ArchError::ForeignTarget`] when running on another target.
    fn get_char(&self) -> Result<Option<u8>, ArchError>;
}

pub trait MemoryOps {
    /// # Errors
    /// Platform specific.
    fn memory_init(&self) -> Result<(), ArchError>;

    /// # Errors
    /// Platform specific.
    fn setup_direct_mapping(&self) -> Result<(), ArchError>;

    /// Regions this platform wants zeroed in `phase`.
    ///
    /// Executed by [`clear_memory_regions`](crate::clear_memory_regions), never
    /// directly by the platform.
    fn clear_plan(&self, phase: ClearPhase) -> &'static [MemoryRegion];

    /// The physical range behind `region`.
    ///
    /// Clear plans and load addresses may name memory through a translated
    /// window, while the firmware reports the loader image physically. Every
    /// overlap test compares both sides after this translation.
    fn to_physical(&self, region: MemoryRegion) -> MemoryRegion {
        region
    }
}

/// The operation table of one platform.
///
/// Hooks run in this order during a boot:
///
/// ```text
/// early_init → init → get_boot_cpu_id → before_exit_boot_services
///   → (firmware terminated) → pre_jump_fixup → transfer
/// ```
pub trait ArchOps: SerialOps + MemoryOps + Sync {
    fn arch(&self) -> ArchType;

    /// Runs before anything else, including logging to the console.
    ///
    /// # Errors
    /// Platform specific.
    fn early_init(&self) -> Result<(), ArchError>;

    /// # Errors
    /// Platform specific.
    fn init(&self) -> Result<(), ArchError>;

    /// Logical id of the CPU executing the loader.
    ///
    /// # Errors
    /// [`ArchError::BootCpuUnavailable`] if the platform cannot tell.
    fn get_boot_cpu_id(&self, firmware: &dyn FirmwareCpuQuery) -> Result<u64, ArchError>;

    /// Last hook with boot services available.
    ///
    /// # Errors
    /// Platform specific.
    fn before_exit_boot_services(&self, firmware: &dyn FirmwareCpuQuery)
    -> Result<(), ArchError>;

    /// Cache/translation maintenance after the payload copy.
    ///
    /// # Errors
    /// [`ArchError::ForeignTarget`] when running on another target.
    fn pre_jump_fixup(&self) -> Result<(), ArchError>;

    /// Call the payload entry point. Never returns.
    ///
    /// # Safety
    /// `entry` must point to executable code that accepts `convention`.
    unsafe fn transfer(
        &self,
        entry: PhysicalAddress,
        convention: HandoffConvention,
        params: &HandoffParams,
    ) -> ! {
        unsafe { crate::jump(entry, convention, params) }
    }
}
