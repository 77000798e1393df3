//! # Memory Map Acquisition
//!
//! Two phases, split over two sequencer states:
//!
//! 1. [`probe_and_allocate`]: query with an empty buffer (must report
//!    `BUFFER_TOO_SMALL`), then allocate the reported size plus
//!    [`DESCRIPTOR_MARGIN`] descriptors, since the allocation itself may grow
//!    the map.
//! 2. [`fill_and_exit`]: the final query, immediately followed by
//!    `ExitBootServices` with its key. Nothing may run in between.

use crate::firmware::{Firmware, MapKey, MapLayout, MapQuery};
use crate::{BootError, FirmwareError};
use boot_memory::PhysicalAddress;
use uefi::Status;

/// Extra descriptors reserved on top of the probed size.
pub const DESCRIPTOR_MARGIN: usize = 20;

/// The buffer reserved for the final memory map.
#[derive(Debug)]
pub struct MapBuffer {
    buffer: &'static mut [u8],
    descriptor_size: usize,
}

impl MapBuffer {
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub const fn descriptor_size(&self) -> usize {
        self.descriptor_size
    }
}

/// The memory map as it was when boot services ended.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MemoryMapInfo {
    pub address: PhysicalAddress,
    pub capacity: usize,
    pub layout: MapLayout,
    pub key: MapKey,
}

impl MemoryMapInfo {
    #[must_use]
    pub const fn descriptor_count(&self) -> usize {
        if self.layout.descriptor_size == 0 {
            0
        } else {
            self.layout.map_size / self.layout.descriptor_size
        }
    }
}

/// Learn the map size and reserve a padded buffer for it.
///
/// # Errors
/// - [`FirmwareError::UnexpectedProbe`] / [`FirmwareError::ProbeFilled`] if the
///   empty probe does not report `BUFFER_TOO_SMALL`.
/// - [`FirmwareError::AllocationFailed`] if the pool allocation fails.
pub fn probe_and_allocate<F: Firmware>(firmware: &mut F) -> Result<MapBuffer, BootError> {
    let (required, descriptor_size) = match firmware.get_memory_map(&mut []) {
        MapQuery::BufferTooSmall {
            required,
            descriptor_size,
        } => (required, descriptor_size),
        MapQuery::Filled { .. } => return Err(FirmwareError::ProbeFilled.into()),
        MapQuery::Failed(status) => return Err(FirmwareError::UnexpectedProbe(status).into()),
    };
    log::info!("GetMemoryMap (probe): {required} bytes in {descriptor_size}-byte descriptors");

    let size = descriptor_size
        .checked_mul(DESCRIPTOR_MARGIN)
        .and_then(|margin| margin.checked_add(required))
        .ok_or(FirmwareError::AllocationFailed {
            size: usize::MAX,
            status: Status::BAD_BUFFER_SIZE,
        })?;

    let buffer = firmware
        .allocate_pool(size)
        .map_err(|status| FirmwareError::AllocationFailed { size, status })?;
    log::debug!("Reserved {size} bytes for the memory map at {:p}", buffer.as_ptr());

    Ok(MapBuffer {
        buffer,
        descriptor_size,
    })
}

/// Take the final map and terminate boot services with its key.
///
/// # Errors
/// - [`FirmwareError::MapGrew`] if the map outgrew the reserved buffer.
/// - [`FirmwareError::MapQueryFailed`] for any other query failure.
/// - [`FirmwareError::ExitFailed`] if termination is refused.
pub fn fill_and_exit<F: Firmware>(
    firmware: &mut F,
    map: MapBuffer,
) -> Result<MemoryMapInfo, BootError> {
    let capacity = map.buffer.len();
    let address = PhysicalAddress::from_ptr(map.buffer.as_ptr());

    let (key, layout) = match firmware.get_memory_map(map.buffer) {
        MapQuery::Filled { key, layout } => (key, layout),
        MapQuery::BufferTooSmall { required, .. } => {
            return Err(FirmwareError::MapGrew {
                required,
                available: capacity,
            }
            .into());
        }
        MapQuery::Failed(status) => return Err(FirmwareError::MapQueryFailed(status).into()),
    };

    // The key is only valid until the next firmware call.
    firmware
        .exit_boot_services(key)
        .map_err(FirmwareError::ExitFailed)?;

    Ok(MemoryMapInfo {
        address,
        capacity,
        layout,
        key,
    })
}
