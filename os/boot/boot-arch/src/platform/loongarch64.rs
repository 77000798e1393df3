//! # loongarch64
//!
//! * Early init programs the two direct-mapped configuration windows the rest
//!   of the loader relies on: `0x8000_...` uncached for MMIO and `0x9000_...`
//!   cached for RAM. All layout addresses for this platform live in the
//!   cached window.
//! * Serial: NS16550-compatible UART at physical [`UART_PHYS`], reached
//!   through the uncached window.
//! * Preparation clears wipe the hypervisor and kernel load areas plus the
//!   low boot page before anything is copied.
//! * Before transfer an `ibar 0` orders instruction fetch after the copy.

use super::native;
use crate::{ArchDescriptor, ArchError, ArchOps, ArchType, ClearPhase, FirmwareCpuQuery};
use crate::{MemoryOps, SerialOps};
use bitfield_struct::bitfield;
use boot_memory::{MemoryRegion, PhysicalAddress};

/// Physical address of the UART.
pub const UART_PHYS: u64 = 0x1fe0_01e0;

/// Direct-mapped configuration window register (`CSR.DMW0..3`).
#[bitfield(u64)]
pub struct DirectMapWindow {
    /// Bit 0 — Usable at privilege level 0.
    pub plv0: bool,
    /// Bit 1 — Usable at privilege level 1.
    pub plv1: bool,
    /// Bit 2 — Usable at privilege level 2.
    pub plv2: bool,
    /// Bit 3 — Usable at privilege level 3.
    pub plv3: bool,
    /// Bits 4–5 — Memory access type: 0 strongly-ordered uncached, 1 coherent cached.
    #[bits(2)]
    pub mat: u8,
    #[bits(54)]
    __: u64,
    /// Bits 60–63 — Virtual segment selected by this window.
    #[bits(4)]
    pub vseg: u8,
}

/// `DMW0`: `0x8000_...` uncached.
pub const DMW0: DirectMapWindow = DirectMapWindow::new().with_plv0(true).with_mat(0).with_vseg(0x8);

/// `DMW1`: `0x9000_...` coherent cached.
pub const DMW1: DirectMapWindow = DirectMapWindow::new().with_plv0(true).with_mat(1).with_vseg(0x9);

const WINDOW_SEGMENT_MASK: u64 = 0xF << 60;

const UNCACHED_BASE: u64 = (DMW0.vseg() as u64) << 60;

/// The UART as seen through [`DMW0`].
const UART_BASE: usize = (UNCACHED_BASE | UART_PHYS) as usize;

// NS16550 register offsets.
const RBR_THR: usize = 0;
const IER: usize = 1;
const FCR: usize = 2;
const LCR: usize = 3;
const LSR: usize = 5;

const LSR_DATA_READY: u8 = 1 << 0;
const LSR_THR_EMPTY: u8 = 1 << 5;

pub struct LoongArch64;

pub static DESCRIPTOR: ArchDescriptor = ArchDescriptor::new(ArchType::LoongArch64, &LoongArch64);

impl LoongArch64 {
    fn read(reg: usize) -> u8 {
        // SAFETY: UART register through the uncached window set up in `early_init`.
        unsafe { core::ptr::read_volatile((UART_BASE + reg) as *const u8) }
    }

    fn write(reg: usize, value: u8) {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile((UART_BASE + reg) as *mut u8, value) }
    }
}

impl SerialOps for LoongArch64 {
    /// 8N1, FIFOs enabled and flushed, interrupts off. The divisor set by the
    /// firmware is kept.
    fn serial_init(&self) -> Result<(), ArchError> {
        native(ArchType::LoongArch64)?;
        Self::write(IER, 0x00);
        Self::write(LCR, 0x03);
        Self::write(FCR, 0x07);
        Ok(())
    }

    fn put_char(&self, c: u8) -> Result<(), ArchError> {
        native(ArchType::LoongArch64)?;
        while Self::read(LSR) & LSR_THR_EMPTY == 0 {
            core::hint::spin_loop();
        }
        Self::write(RBR_THR, c);
        Ok(())
    }

    fn get_char(&self) -> Result<Option<u8>, ArchError> {
        native(ArchType::LoongArch64)?;
        if Self::read(LSR) & LSR_DATA_READY == 0 {
            return Ok(None);
        }
        Ok(Some(Self::read(RBR_THR)))
    }
}

impl MemoryOps for LoongArch64 {
    fn memory_init(&self) -> Result<(), ArchError> {
        Ok(())
    }

    /// The windows themselves are programmed in `early_init`.
    fn setup_direct_mapping(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn clear_plan(&self, phase: ClearPhase) -> &'static [MemoryRegion] {
        ArchType::LoongArch64.layout().clears(phase)
    }

    /// Strips the window segment (bits 63:60); both DMWs map onto the same
    /// physical memory.
    fn to_physical(&self, region: MemoryRegion) -> MemoryRegion {
        let start = region.start().as_u64() & !WINDOW_SEGMENT_MASK;
        MemoryRegion::from_address(PhysicalAddress::new(start), region.len())
    }
}

impl ArchOps for LoongArch64 {
    fn arch(&self) -> ArchType {
        ArchType::LoongArch64
    }

    fn early_init(&self) -> Result<(), ArchError> {
        native(ArchType::LoongArch64)?;

        #[cfg(target_arch = "loongarch64")]
        unsafe {
            core::arch::asm!(
                "csrwr {0}, 0x180",
                "csrwr {1}, 0x181",
                inout(reg) DMW0.into_bits() => _,
                inout(reg) DMW1.into_bits() => _,
                options(nostack)
            );
        }

        Ok(())
    }

    fn init(&self) -> Result<(), ArchError> {
        self.serial_init()
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
        native(ArchType::LoongArch64)?;

        #[cfg(target_arch = "loongarch64")]
        unsafe {
            core::arch::asm!("ibar 0", options(nostack, preserves_flags));
        }

        Ok(())
    }
}
