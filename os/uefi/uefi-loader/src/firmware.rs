//! [`Firmware`] on top of the `uefi` crate.
//!
//! Memory map retrieval and `ExitBootServices` go through the raw boot
//! services table: the sequencer owns the buffer and the exact call order,
//! which the safe wrappers would take away from it.

use crate::logger::BootLogger;
use crate::memory;
use alloc::vec::Vec;
use boot_acpi::{ConfigEntry, ConfigTableKind};
use boot_arch::FirmwareCpuQuery;
use boot_handoff::{Firmware, MapKey, MapLayout, MapQuery};
use boot_memory::MemoryRegion;
use core::ptr;
use log::{debug, warn};
use uefi::boot::{self, MemoryType};
use uefi::proto::loaded_image::LoadedImage;
use uefi::proto::unsafe_protocol;
use uefi::{Guid, Status, guid};

const ACPI1_GUID: Guid = guid!("eb9d2d30-2d88-11d3-9a16-0090273fc14d");
const ACPI2_GUID: Guid = guid!("8868e871-e4f1-11d3-bc22-0080c73c8881");
const DEVICE_TREE_GUID: Guid = guid!("b1b621d5-f19c-41a5-830b-d9152c69aae0");

/// `RISCV_EFI_BOOT_PROTOCOL`, as published by edk2 on RISC-V platforms.
#[repr(C)]
#[unsafe_protocol("ccd15fec-6f73-4eec-8395-3e69e4b940bf")]
struct RiscVBootProtocol {
    _revision: u64,
    get_boot_hartid: unsafe extern "efiapi" fn(this: *const Self, hart_id: *mut usize) -> Status,
}

pub struct UefiFirmware {
    tables: Vec<ConfigEntry>,
    loader: MemoryRegion,
    system_table: u64,
    logger: &'static BootLogger,
}

impl UefiFirmware {
    /// Snapshot what the sequencer reads while boot services are up.
    ///
    /// # Errors
    /// The status of a failed `LoadedImage` lookup, or `NOT_STARTED` when
    /// the system table was never published.
    pub fn new(logger: &'static BootLogger) -> Result<Self, Status> {
        let system_table = uefi::table::system_table_raw()
            .ok_or(Status::NOT_STARTED)?
            .as_ptr() as u64;

        let tables = uefi::system::with_config_table(|entries| {
            entries
                .iter()
                .map(|entry| ConfigEntry::new(classify(&entry.guid), entry.address as u64))
                .collect::<Vec<_>>()
        });
        debug!("Firmware publishes {} configuration tables", tables.len());

        let loader = {
            let image = boot::open_protocol_exclusive::<LoadedImage>(boot::image_handle())
                .map_err(|e| e.status())?;
            let (base, size) = image.info();
            MemoryRegion::new(base as u64, size)
        };

        Ok(Self {
            tables,
            loader,
            system_table,
            logger,
        })
    }
}

fn classify(guid: &Guid) -> ConfigTableKind {
    if *guid == ACPI2_GUID {
        ConfigTableKind::Acpi2
    } else if *guid == ACPI1_GUID {
        ConfigTableKind::Acpi1
    } else if *guid == DEVICE_TREE_GUID {
        ConfigTableKind::DeviceTree
    } else {
        ConfigTableKind::Other
    }
}

impl FirmwareCpuQuery for UefiFirmware {
    fn boot_hart_id(&self) -> Option<u64> {
        if !cfg!(target_arch = "riscv64") {
            return None;
        }

        let handle = boot::get_handle_for_protocol::<RiscVBootProtocol>()
            .inspect_err(|e| warn!("RISCV_EFI_BOOT_PROTOCOL not found: {:?}", e.status()))
            .ok()?;
        let protocol = boot::open_protocol_exclusive::<RiscVBootProtocol>(handle).ok()?;

        let this: &RiscVBootProtocol = &protocol;
        let mut hart_id = 0usize;
        // SAFETY: the function pointer comes from the firmware's protocol instance.
        let status = unsafe { (this.get_boot_hartid)(ptr::from_ref(this), &raw mut hart_id) };
        if status.is_error() {
            warn!("GetBootHartId failed: {status:?}");
            return None;
        }
        Some(hart_id as u64)
    }
}

impl Firmware for UefiFirmware {
    fn config_tables(&self) -> &[ConfigEntry] {
        &self.tables
    }

    fn system_table_address(&self) -> u64 {
        self.system_table
    }

    fn loader_image(&self) -> MemoryRegion {
        self.loader
    }

    fn get_memory_map(&mut self, buffer: &mut [u8]) -> MapQuery {
        let Some(st) = uefi::table::system_table_raw() else {
            return MapQuery::Failed(Status::NOT_STARTED);
        };
        // SAFETY: the firmware keeps the system table alive for the program's lifetime.
        let bs = unsafe { st.as_ref() }.boot_services;
        if bs.is_null() {
            return MapQuery::Failed(Status::NOT_STARTED);
        }

        let mut map_size = buffer.len();
        let mut key = 0usize;
        let mut descriptor_size = 0usize;
        let mut descriptor_version = 0u32;
        let map = if buffer.is_empty() {
            ptr::null_mut()
        } else {
            buffer.as_mut_ptr().cast()
        };

        // SAFETY: `map` is null or spans `map_size` writable bytes.
        let status = unsafe {
            ((*bs).get_memory_map)(
                &raw mut map_size,
                map,
                &raw mut key,
                &raw mut descriptor_size,
                &raw mut descriptor_version,
            )
        };

        if status == Status::BUFFER_TOO_SMALL {
            MapQuery::BufferTooSmall {
                required: map_size,
                descriptor_size,
            }
        } else if status.is_success() {
            MapQuery::Filled {
                key: MapKey(key),
                layout: MapLayout {
                    map_size,
                    descriptor_size,
                    descriptor_version,
                },
            }
        } else {
            MapQuery::Failed(status)
        }
    }

    fn allocate_pool(&mut self, size: usize) -> Result<&'static mut [u8], Status> {
        let ptr = boot::allocate_pool(MemoryType::LOADER_DATA, size).map_err(|e| e.status())?;
        // SAFETY: a fresh, never-freed pool block of `size` bytes.
        Ok(unsafe { core::slice::from_raw_parts_mut(ptr.as_ptr(), size) })
    }

    fn quiesce(&mut self) {
        self.logger.exit_boot_services();
    }

    fn exit_boot_services(&mut self, key: MapKey) -> Result<(), Status> {
        let st = uefi::table::system_table_raw().ok_or(Status::NOT_STARTED)?;
        // SAFETY: the firmware keeps the system table alive for the program's lifetime.
        let bs = unsafe { st.as_ref() }.boot_services;
        if bs.is_null() {
            return Err(Status::NOT_STARTED);
        }
        let image = boot::image_handle().as_ptr();

        // SAFETY: nothing touches boot services after a successful return.
        let status = unsafe { ((*bs).exit_boot_services)(image, key.0) };
        if status.is_error() {
            return Err(status);
        }
        memory::retire();
        Ok(())
    }
}
