use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull, null_mut};
use core::sync::atomic::{AtomicBool, Ordering};
use uefi::boot::{self, MemoryType};

static RETIRED: AtomicBool = AtomicBool::new(false);

/// Boot Services pool allocations backing Rust's global allocator.
///
/// # Notes
/// - Over-allocates to satisfy alignment and stores the original pointer
///   just before the returned block for deallocation.
/// - Once [`retire`] ran, allocation reports OOM and deallocation leaks.
pub struct PoolAllocator;

#[cfg_attr(not(test), global_allocator)]
static GLOBAL_ALLOC: PoolAllocator = PoolAllocator;

/// Boot services are gone; the pool must not be touched again.
pub fn retire() {
    RETIRED.store(true, Ordering::Release);
}

fn retired() -> bool {
    RETIRED.load(Ordering::Acquire)
}

unsafe impl GlobalAlloc for PoolAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if retired() {
            return null_mut();
        }

        let align = layout.align().max(size_of::<usize>());
        let size = layout.size().max(1);
        let Some(total) = size
            .checked_add(align)
            .and_then(|v| v.checked_add(size_of::<usize>()))
        else {
            return null_mut();
        };

        let Ok(raw) = boot::allocate_pool(MemoryType::LOADER_DATA, total) else {
            return null_mut();
        };

        let raw_ptr = raw.as_ptr();
        let addr = raw_ptr as usize + size_of::<usize>();
        let aligned = (addr + (align - 1)) & !(align - 1);
        let header_ptr = (aligned - size_of::<usize>()) as *mut usize;

        unsafe {
            ptr::write(header_ptr, raw_ptr as usize);
        }
        aligned as *mut u8
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        if ptr.is_null() || retired() {
            return;
        }

        let header_ptr = (ptr as usize - size_of::<usize>()) as *const usize;
        let orig_ptr = unsafe { ptr::read(header_ptr) as *mut u8 };

        // SAFETY: `orig_ptr` was returned by `allocate_pool` and stored by `alloc`.
        if let Some(orig) = NonNull::new(orig_ptr) {
            let _ = unsafe { boot::free_pool(orig) };
        }
    }
}
