use crate::{HandoffConvention, HandoffParams};
use boot_memory::PhysicalAddress;

/// Call `entry` with the arguments `convention` prescribes.
///
/// If the payload ever returns, the CPU is parked with [`halt`].
///
/// # Safety
/// `entry` must be the address of executable code following the C calling
/// convention with the argument count of `convention`. Nothing the loader
/// still needs may live in memory the payload owns.
#[cfg(any(target_arch = "aarch64", target_arch = "loongarch64", target_arch = "riscv64"))]
pub unsafe fn jump(
    entry: PhysicalAddress,
    convention: HandoffConvention,
    params: &HandoffParams,
) -> ! {
    #[allow(clippy::cast_possible_truncation)]
    let addr = entry.as_u64() as usize;

    // SAFETY: the caller vouches for the entry point.
    unsafe {
        match convention {
            HandoffConvention::Direct => {
                let f = core::mem::transmute::<usize, extern "C" fn()>(addr);
                f();
            }
            HandoffConvention::TwoWord => {
                let f = core::mem::transmute::<usize, extern "C" fn(u64, u64)>(addr);
                f(params.cpu_id, params.context);
            }
            HandoffConvention::ThreeWord => {
                let f = core::mem::transmute::<usize, extern "C" fn(u64, u64, u64)>(addr);
                f(params.cpu_id, params.context, params.secondary);
            }
        }
    }

    log::error!("Payload at {entry} returned");
    halt()
}

/// There is no payload this target could run; park the CPU.
///
/// # Safety
/// Always safe; kept `unsafe` to match the native signature.
#[cfg(not(any(target_arch = "aarch64", target_arch = "loongarch64", target_arch = "riscv64")))]
pub unsafe fn jump(
    entry: PhysicalAddress,
    convention: HandoffConvention,
    _params: &HandoffParams,
) -> ! {
    log::error!("Cannot transfer to {entry} ({convention}) on this target");
    halt()
}

/// Park the CPU forever.
pub fn halt() -> ! {
    loop {
        #[cfg(any(target_arch = "aarch64", target_arch = "riscv64"))]
        unsafe {
            core::arch::asm!("wfi", options(nomem, nostack, preserves_flags));
        }

        #[cfg(target_arch = "loongarch64")]
        unsafe {
            core::arch::asm!("idle 0", options(nomem, nostack, preserves_flags));
        }

        core::hint::spin_loop();
    }
}
