//! # Portable-Executable Loader
//!
//! Copies a position-independent PE/COFF image section by section into a
//! physical load window and returns its absolute entry point.
//!
//! ## Header Chain
//!
//! ```text
//! offset 0            DOS header     "MZ", e_lfanew @ 0x3C
//! e_lfanew            NT signature   "PE\0\0"
//! e_lfanew + 4        file header    NumberOfSections, SizeOfOptionalHeader
//! e_lfanew + 24       optional hdr   magic 0x10B (PE32) / 0x20B (PE32+), entry RVA
//! + SizeOfOptionalHeader
//!                     section table  40-byte records
//! ```
//!
//! ## What This Loader Does Not Do
//!
//! The image is assumed position-independent. There is no import
//! resolution and no base-relocation processing; an image with a non-empty
//! base-relocation directory is rejected ([`PeError::RelocationsPresent`])
//! instead of being run at the wrong base. The virtual-size tail of a section
//! beyond its raw data is *not* zero-filled; pre-zero the load window if the
//! image relies on it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use boot_memory::IdentityMap;
//! # fn image() -> &'static [u8] { &[] }
//!
//! let loaded = unsafe { boot_pe::parse_and_load(image(), 0x4000_0000, &mut IdentityMap) }?;
//! println!("entry at {}", loaded.entry);
//! # Ok::<(), boot_pe::PeError>(())
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod headers;
mod image;
mod loader;

pub use headers::{FileCharacteristics, FileHeader, SectionFlags, SectionHeader};
pub use image::{OptionalHeaderKind, PeImage, Section};
pub use loader::{LoadedImage, parse_and_load};

use boot_memory::MemoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PeError {
    #[error("missing DOS header magic \"MZ\"")]
    BadDosHeader,
    #[error("missing NT signature \"PE\\0\\0\" at offset {offset:#x}")]
    BadNtHeader { offset: usize },
    #[error("unsupported optional header magic {magic:#06x}")]
    BadOptionalHeader { magic: u16 },
    #[error("{what} at offset {offset:#x} lies beyond the image")]
    Truncated { what: &'static str, offset: usize },
    #[error("address arithmetic overflowed")]
    AddressOverflow,
    #[error("section {index} raw data ends at {end:#x}, beyond the {image_len:#x}-byte image")]
    SectionOutOfRange {
        index: usize,
        end: u64,
        image_len: usize,
    },
    #[error("image carries base relocations (RVA {rva:#x}, {size:#x} bytes)")]
    RelocationsPresent { rva: u32, size: u32 },
    #[error("cannot place section: {0}")]
    Destination(#[from] MemoryError),
}
