use crate::memory_map::MemoryMapInfo;
use boot_arch::{ArchDescriptor, HandoffParams};
use boot_memory::{MemoryRegion, PhysicalAddress};

/// State accumulated on the way to the hand-off.
#[derive(Debug, Copy, Clone, Default)]
pub struct BootContext {
    /// Set by `Detect`; read-only afterwards.
    pub descriptor: Option<&'static ArchDescriptor>,
    pub loader_image: MemoryRegion,
    pub system_table: u64,
    /// Device tree if published, else the ACPI root pointer, else 0.
    pub context_pointer: u64,
    pub boot_cpu: Option<u64>,
    pub memory_map: Option<MemoryMapInfo>,
    pub entry: Option<PhysicalAddress>,
    pub kernel_entry: Option<PhysicalAddress>,
    pub bytes_cleared: u64,
}

impl BootContext {
    #[must_use]
    pub fn handoff_params(&self) -> HandoffParams {
        HandoffParams {
            cpu_id: self.boot_cpu.unwrap_or_default(),
            context: self.context_pointer,
            secondary: self.system_table,
        }
    }
}
