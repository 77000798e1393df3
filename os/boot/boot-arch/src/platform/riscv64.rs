//! # riscv64
//!
//! * Serial: SBI legacy console (`ecall` extension 1 put, 2 get).
//! * The boot hart id comes from the firmware's RISC-V boot protocol and must
//!   be queried while boot services are still available; it is cached on the
//!   first successful query.
//! * Before transfer, translation is switched off (`satp = 0`) and the TLB and
//!   instruction cache are flushed. The firmware runs with VA == PA, so the
//!   loader keeps executing across the switch.

use super::native;
use crate::{ArchDescriptor, ArchError, ArchOps, ArchType, ClearPhase, FirmwareCpuQuery};
use crate::{MemoryOps, SerialOps};
use boot_memory::MemoryRegion;
use core::sync::atomic::{AtomicU64, Ordering};

const UNKNOWN_HART: u64 = u64::MAX;

pub struct RiscV64 {
    boot_hart: AtomicU64,
}

static OPS: RiscV64 = RiscV64 {
    boot_hart: AtomicU64::new(UNKNOWN_HART),
};

pub static DESCRIPTOR: ArchDescriptor = ArchDescriptor::new(ArchType::RiscV64, &OPS);

impl RiscV64 {
    fn query_hart(&self, firmware: &dyn FirmwareCpuQuery) -> Result<u64, ArchError> {
        let cached = self.boot_hart.load(Ordering::Acquire);
        if cached != UNKNOWN_HART {
            return Ok(cached);
        }

        let hart = firmware
            .boot_hart_id()
            .ok_or(ArchError::BootCpuUnavailable)?;
        self.boot_hart.store(hart, Ordering::Release);
        log::info!("Boot hart id: {hart}");
        Ok(hart)
    }
}

#[cfg(target_arch = "riscv64")]
mod sbi {
    const CONSOLE_PUTCHAR: usize = 0x1;
    const CONSOLE_GETCHAR: usize = 0x2;

    /// Legacy SBI call; returns `a0`.
    fn legacy(eid: usize, arg0: usize) -> isize {
        let ret: isize;
        unsafe {
            core::arch::asm!(
                "ecall",
                inlateout("a0") arg0 => ret,
                lateout("a1") _,
                in("a7") eid,
                options(nostack)
            );
        }
        ret
    }

    pub fn put(c: u8) {
        legacy(CONSOLE_PUTCHAR, usize::from(c));
    }

    /// `-1` means nothing pending.
    pub fn get() -> Option<u8> {
        u8::try_from(legacy(CONSOLE_GETCHAR, 0)).ok()
    }
}

#[cfg(not(target_arch = "riscv64"))]
mod sbi {
    pub fn put(_c: u8) {}

    pub fn get() -> Option<u8> {
        None
    }
}

impl SerialOps for RiscV64 {
    /// No-op: the SBI console needs no setup.
    fn serial_init(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn put_char(&self, c: u8) -> Result<(), ArchError> {
        native(ArchType::RiscV64)?;
        sbi::put(c);
        Ok(())
    }

    fn get_char(&self) -> Result<Option<u8>, ArchError> {
        native(ArchType::RiscV64)?;
        Ok(sbi::get())
    }
}

impl MemoryOps for RiscV64 {
    fn memory_init(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn setup_direct_mapping(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn clear_plan(&self, phase: ClearPhase) -> &'static [MemoryRegion] {
        ArchType::RiscV64.layout().clears(phase)
    }
}

impl ArchOps for RiscV64 {
    fn arch(&self) -> ArchType {
        ArchType::RiscV64
    }

    fn early_init(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn init(&self) -> Result<(), ArchError> {
        Ok(())
    }

    fn get_boot_cpu_id(&self, firmware: &dyn FirmwareCpuQuery) -> Result<u64, ArchError> {
        self.query_hart(firmware)
    }

    /// Makes sure the hart id is cached before the protocol disappears.
    fn before_exit_boot_services(
        &self,
        firmware: &dyn FirmwareCpuQuery,
    ) -> Result<(), ArchError> {
        self.query_hart(firmware).map(|_| ())
    }

    fn pre_jump_fixup(&self) -> Result<(), ArchError> {
        native(ArchType::RiscV64)?;

        #[cfg(target_arch = "riscv64")]
        unsafe {
            core::arch::asm!(
                "csrw satp, zero",
                "sfence.vma zero, zero",
                "fence.i",
                options(nostack)
            );
        }

        Ok(())
    }
}
