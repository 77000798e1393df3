//! Scripted firmware and a recording platform.

#![allow(dead_code)]

use boot_acpi::ConfigEntry;
use boot_arch::{
    ArchDescriptor, ArchError, ArchOps, ArchType, ClearPhase, FirmwareCpuQuery, HandoffConvention,
    HandoffParams, MemoryOps, SerialOps,
};
use boot_handoff::{Firmware, MapKey, MapLayout, MapQuery};
use boot_memory::sim::SimulatedMemory;
use boot_memory::{MemoryRegion, PhysicalAddress};
use std::cell::RefCell;
use uefi::Status;

pub const WINDOW: u64 = 0x4000_0000;
pub const WINDOW_LEN: usize = 0x40_0000;
pub const SYSTEM_TABLE: u64 = 0x7E00_0000;
pub const DESCRIPTOR_SIZE: usize = 48;
pub const MAP_SIZE: usize = 40 * DESCRIPTOR_SIZE;

pub static PREPARATION: [MemoryRegion; 1] = [MemoryRegion::new(0x4030_0000, 0x1000)];
pub static CLEANUP: [MemoryRegion; 1] = [MemoryRegion::new(0x4031_0000, 0x100)];
/// Segment selector of the cached window.
pub const CACHED: u64 = 0x9000_0000_0000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    BootHartId,
    GetMemoryMap(usize),
    AllocatePool(usize),
    Quiesce,
    ExitBootServices(MapKey),
}

pub struct MockFirmware {
    calls: RefCell<Vec<Call>>,
    pub tables: Vec<ConfigEntry>,
    pub loader: MemoryRegion,
    pub hart: Option<u64>,
    pub map_size: usize,
    /// Replaces the answer to the first (empty) query.
    pub probe: Option<MapQuery>,
    /// Bytes the map grows by when the pool allocation happens.
    pub grow_on_alloc: usize,
    pub fail_allocation: bool,
    pub refuse_exit: bool,
    issued_key: Option<MapKey>,
}

impl MockFirmware {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            tables: Vec::new(),
            loader: MemoryRegion::new(0x7000_0000, 0x10_0000),
            hart: None,
            map_size: MAP_SIZE,
            probe: None,
            grow_on_alloc: 0,
            fail_allocation: false,
            refuse_exit: false,
            issued_key: None,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl FirmwareCpuQuery for MockFirmware {
    fn boot_hart_id(&self) -> Option<u64> {
        self.record(Call::BootHartId);
        self.hart
    }
}

impl Firmware for MockFirmware {
    fn config_tables(&self) -> &[ConfigEntry] {
        &self.tables
    }

    fn system_table_address(&self) -> u64 {
        SYSTEM_TABLE
    }

    fn loader_image(&self) -> MemoryRegion {
        self.loader
    }

    fn get_memory_map(&mut self, buffer: &mut [u8]) -> MapQuery {
        let first = self.calls.borrow().iter().all(|c| !matches!(c, Call::GetMemoryMap(_)));
        self.record(Call::GetMemoryMap(buffer.len()));
        self.issued_key = None;

        if first && let Some(probe) = self.probe {
            return probe;
        }
        if buffer.len() < self.map_size {
            return MapQuery::BufferTooSmall {
                required: self.map_size,
                descriptor_size: DESCRIPTOR_SIZE,
            };
        }

        buffer[..self.map_size].fill(0xD5);
        let key = MapKey(0x1000 + self.calls.borrow().len());
        self.issued_key = Some(key);
        MapQuery::Filled {
            key,
            layout: MapLayout {
                map_size: self.map_size,
                descriptor_size: DESCRIPTOR_SIZE,
                descriptor_version: 1,
            },
        }
    }

    fn allocate_pool(&mut self, size: usize) -> Result<&'static mut [u8], Status> {
        self.record(Call::AllocatePool(size));
        self.issued_key = None;
        if self.fail_allocation {
            return Err(Status::OUT_OF_RESOURCES);
        }
        self.map_size += self.grow_on_alloc;
        Ok(Box::leak(vec![0u8; size].into_boxed_slice()))
    }

    fn quiesce(&mut self) {
        self.record(Call::Quiesce);
    }

    fn exit_boot_services(&mut self, key: MapKey) -> Result<(), Status> {
        let valid = self.issued_key == Some(key);
        self.record(Call::ExitBootServices(key));
        if self.refuse_exit || !valid {
            return Err(Status::INVALID_PARAMETER);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub entry: PhysicalAddress,
    pub convention: HandoffConvention,
    pub params: HandoffParams,
}

thread_local! {
    static HOOKS: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    static SERIAL: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
    static TRANSFER: RefCell<Option<Transfer>> = const { RefCell::new(None) };
}

/// Hooks called on this thread, in order.
pub fn hooks() -> Vec<&'static str> {
    HOOKS.with_borrow(Clone::clone)
}

/// Everything written to the UART on this thread.
pub fn serial_output() -> String {
    SERIAL.with_borrow(|s| String::from_utf8_lossy(s).into_owned())
}

pub fn transferred() -> Option<Transfer> {
    TRANSFER.with_borrow(|t| *t)
}

fn hook(name: &'static str) {
    HOOKS.with_borrow_mut(|h| h.push(name));
}

/// An aarch64 stand-in that records instead of touching hardware. Its memory
/// is windowed like loongarch64's.
pub struct RecordingArch;

impl SerialOps for RecordingArch {
    fn serial_init(&self) -> Result<(), ArchError> {
        hook("serial_init");
        Ok(())
    }

    fn put_char(&self, c: u8) -> Result<(), ArchError> {
        SERIAL.with_borrow_mut(|s| s.push(c));
        Ok(())
    }

    fn get_char(&self) -> Result<Option<u8>, ArchError> {
        Ok(None)
    }
}

impl MemoryOps for RecordingArch {
    fn memory_init(&self) -> Result<(), ArchError> {
        hook("memory_init");
        Ok(())
    }

    fn setup_direct_mapping(&self) -> Result<(), ArchError> {
        hook("setup_direct_mapping");
        Ok(())
    }

    fn clear_plan(&self, phase: ClearPhase) -> &'static [MemoryRegion] {
        match phase {
            ClearPhase::Preparation => &PREPARATION,
            ClearPhase::Cleanup => &CLEANUP,
        }
    }

    /// RAM is also reachable through segment windows in bits 63:60.
    fn to_physical(&self, region: MemoryRegion) -> MemoryRegion {
        MemoryRegion::from_address(
            PhysicalAddress::new(region.start().as_u64() & !(0xF << 60)),
            region.len(),
        )
    }
}

impl ArchOps for RecordingArch {
    fn arch(&self) -> ArchType {
        ArchType::Aarch64
    }

    fn early_init(&self) -> Result<(), ArchError> {
        hook("early_init");
        Ok(())
    }

    fn init(&self) -> Result<(), ArchError> {
        hook("init");
        Ok(())
    }

    fn get_boot_cpu_id(&self, firmware: &dyn FirmwareCpuQuery) -> Result<u64, ArchError> {
        hook("get_boot_cpu_id");
        Ok(firmware.boot_hart_id().unwrap_or(0))
    }

    fn before_exit_boot_services(
        &self,
        _firmware: &dyn FirmwareCpuQuery,
    ) -> Result<(), ArchError> {
        hook("before_exit_boot_services");
        Ok(())
    }

    fn pre_jump_fixup(&self) -> Result<(), ArchError> {
        hook("pre_jump_fixup");
        Ok(())
    }

    unsafe fn transfer(
        &self,
        entry: PhysicalAddress,
        convention: HandoffConvention,
        params: &HandoffParams,
    ) -> ! {
        hook("transfer");
        TRANSFER.with_borrow_mut(|t| {
            *t = Some(Transfer {
                entry,
                convention,
                params: *params,
            });
        });
        panic!("control transferred to {entry}");
    }
}

static RECORDING: RecordingArch = RecordingArch;
pub static DESCRIPTOR: ArchDescriptor = ArchDescriptor::new(ArchType::Aarch64, &RECORDING);

pub fn memory() -> SimulatedMemory {
    SimulatedMemory::new().with_window(WINDOW, WINDOW_LEN)
}

pub fn leak(bytes: Vec<u8>) -> &'static [u8] {
    Box::leak(bytes.into_boxed_slice())
}
