//! # aarch64 (QEMU `virt`)
//!
//! * Serial: PL011 at [`UART_BASE`], polled.
//! * Early init, init and the memory hooks are no-ops: the firmware leaves an
//!   identity map with the MMU and caches on, which is what the hypervisor
//!   expects to inherit.
//! * Boot CPU: the loader always runs on CPU 0.
//! * Before transfer the instruction cache is invalidated so the freshly
//!   copied payload is fetched from memory.

use super::native;
use crate::{ArchDescriptor, ArchError, ArchOps, ArchType, ClearPhase, FirmwareCpuQuery};
use crate::{MemoryOps, SerialOps};
use bitfield_struct::bitfield;
use boot_memory::MemoryRegion;

/// PL011 base address on QEMU `virt`.
pub const UART_BASE: usize = 0x0900_0000;

/// Data register.
const UART_DR: usize = 0x00;

/// Flag register.
const UART_FR: usize = 0x18;

/// PL011 flag register (`UARTFR`).
#[bitfield(u32)]
pub struct Pl011Flags {
    /// Bit 0 — Clear to send.
    pub cts: bool,
    /// Bit 1 — Data set ready.
    pub dsr: bool,
    /// Bit 2 — Data carrier detect.
    pub dcd: bool,
    /// Bit 3 — UART busy transmitting.
    pub busy: bool,
    /// Bit 4 — Receive FIFO empty.
    pub rxfe: bool,
    /// Bit 5 — Transmit FIFO full.
    pub txff: bool,
    /// Bit 6 — Receive FIFO full.
    pub rxff: bool,
    /// Bit 7 — Transmit FIFO empty.
    pub txfe: bool,
    /// Bit 8 — Ring indicator.
    pub ri: bool,
    #[bits(23)]
    __: u32,
}

pub struct Aarch64;

pub static DESCRIPTOR: ArchDescriptor = ArchDescriptor::new(ArchType::Aarch64, &Aarch64);

impl Aarch64 {
    fn flags() -> Pl011Flags {
        // SAFETY: MMIO register of the UART, identity-mapped by the firmware.
        Pl011Flags::from_bits(unsafe { core::ptr::read_volatile((UART_BASE + UART_FR) as *const u32) })
    }
}

impl SerialOps for Aarch64 {
    /// No-op: the firmware already configured the PL011.
    fn serial_init(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn put_char(&self, c: u8) -> Result<(), ArchError> {
        native(ArchType::Aarch64)?;
        while Self::flags().txff() {
            core::hint::spin_loop();
        }
        // SAFETY: see `flags`.
        unsafe { core::ptr::write_volatile((UART_BASE + UART_DR) as *mut u32, u32::from(c)) };
        Ok(())
    }

    fn get_char(&self) -> Result<Option<u8>, ArchError> {
        native(ArchType::Aarch64)?;
        if Self::flags().rxfe() {
            return Ok(None);
        }
        // SAFETY: see `flags`.
        let data = unsafe { core::ptr::read_volatile((UART_BASE + UART_DR) as *const u32) };
        Ok(Some((data & 0xFF) as u8))
    }
}

impl MemoryOps for Aarch64 {
    fn memory_init(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn setup_direct_mapping(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn clear_plan(&self, phase: ClearPhase) -> &'static [MemoryRegion] {
        ArchType::Aarch64.layout().clears(phase)
    }
}

impl ArchOps for Aarch64 {
    fn arch(&self) -> ArchType {
        ArchType::Aarch64
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
        native(ArchType::Aarch64)?;

        #[cfg(target_arch = "aarch64")]
        unsafe {
            core::arch::asm!("ic iallu", "dsb ish", "isb", options(nostack, preserves_flags));
        }

        Ok(())
    }
}
