use crate::sync_once_cell::SyncOnceCell;
use crate::{ArchDescriptor, ArchError};

static ACTIVE: SyncOnceCell<&'static ArchDescriptor> = SyncOnceCell::new();

/// Make `descriptor` the process-wide active descriptor.
///
/// Publishing the same descriptor again is accepted; publishing a different
/// one after the first is refused.
///
/// # Errors
/// [`ArchError::AlreadyBound`] if another descriptor was published first.
pub fn publish(descriptor: &'static ArchDescriptor) -> Result<(), ArchError> {
    match ACTIVE.set(descriptor) {
        Ok(()) => {
            log::debug!("Bound architecture descriptor {}", descriptor.arch());
            Ok(())
        }
        Err(_) => match ACTIVE.wait() {
            Some(current) if core::ptr::eq(*current, descriptor) => Ok(()),
            Some(current) => Err(ArchError::AlreadyBound {
                current: current.arch(),
                requested: descriptor.arch(),
            }),
            None => Err(ArchError::Unbound),
        },
    }
}

/// The published descriptor.
///
/// # Errors
/// [`ArchError::Unbound`] before [`publish`] succeeded.
pub fn active() -> Result<&'static ArchDescriptor, ArchError> {
    ACTIVE.get().copied().ok_or(ArchError::Unbound)
}
