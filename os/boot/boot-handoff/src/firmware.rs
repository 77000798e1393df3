//! # Firmware Seam
//!
//! Everything the sequencer needs from the hosting firmware, and nothing more.
//! The UEFI application implements [`Firmware`] on top of the `uefi` crate;
//! tests script it.

use boot_acpi::ConfigEntry;
use boot_arch::FirmwareCpuQuery;
use boot_memory::MemoryRegion;
use uefi::Status;

/// Opaque token identifying one snapshot of the memory map.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MapKey(pub usize);

/// Shape of a memory map written into a caller buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MapLayout {
    pub map_size: usize,
    pub descriptor_size: usize,
    pub descriptor_version: u32,
}

/// Outcome of one `GetMemoryMap` call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MapQuery {
    Filled { key: MapKey, layout: MapLayout },
    BufferTooSmall {
        required: usize,
        descriptor_size: usize,
    },
    Failed(Status),
}

pub trait Firmware: FirmwareCpuQuery {
    /// The (identifier, pointer) pairs of the configuration table.
    fn config_tables(&self) -> &[ConfigEntry];

    /// Address of the system table, handed to platforms that want it.
    fn system_table_address(&self) -> u64;

    /// Where the running loader image lives.
    fn loader_image(&self) -> MemoryRegion;

    /// Write the current memory map into `buffer`.
    fn get_memory_map(&mut self, buffer: &mut [u8]) -> MapQuery;

    /// Allocate `size` bytes of loader data that outlive boot services.
    ///
    /// # Errors
    /// The firmware status of a failed allocation.
    fn allocate_pool(&mut self, size: usize) -> Result<&'static mut [u8], Status>;

    /// Stop using boot services for anything but the final map query and
    /// termination (console output in particular).
    fn quiesce(&mut self);

    /// Terminate boot services.
    ///
    /// # Errors
    /// The firmware status; there is no retry.
    fn exit_boot_services(&mut self, key: MapKey) -> Result<(), Status>;
}
