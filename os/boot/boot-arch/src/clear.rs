use crate::{ArchDescriptor, ArchError, ClearPhase};
use boot_memory::{MemoryRegion, PhysMapRw, fill_bytes, verify_filled};

/// Zero the regions `descriptor` plans for `phase`, then read them back.
///
/// Every planned region is checked against `protected` before the first
/// byte is written. Both sides are compared as physical ranges, so a
/// protected region is also found through a windowed alias. Returns the number of bytes cleared.
///
/// # Errors
/// - [`ArchError::UnsafeClear`] if a planned region overlaps a protected one
///   (nothing has been written in that case).
/// - [`ArchError::Memory`] if a region is unmapped or does not read back as zero.
///
/// # Safety
/// The planned regions must not hold live data other than what is listed
/// in `protected`.
pub unsafe fn clear_memory_regions(
    descriptor: &ArchDescriptor,
    phase: ClearPhase,
    mem: &mut impl PhysMapRw,
    protected: &[MemoryRegion],
) -> Result<u64, ArchError> {
    let ops = descriptor.ops();
    let plan = ops.clear_plan(phase);

    for region in plan {
        let target = ops.to_physical(*region);
        if let Some(hit) = protected
            .iter()
            .find(|p| ops.to_physical(**p).overlaps(&target))
        {
            return Err(ArchError::UnsafeClear {
                region: *region,
                protected: *hit,
            });
        }
    }

    let mut cleared = 0;
    for region in plan {
        log::info!("Clearing {region} ({phase:?})");
        unsafe { fill_bytes(mem, *region, 0) }?;
        verify_filled(mem, *region, 0)?;
        cleared += region.len();
    }

    Ok(cleared)
}
