//! # PE Section Loader

use crate::PeError;
use crate::image::{OptionalHeaderKind, PeImage, Section};
use boot_memory::{PhysMapRw, PhysicalAddress, copy_bytes};

/// Summary of a completed load.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LoadedImage {
    /// `load_window_base + entry_rva`.
    pub entry: PhysicalAddress,
    /// The image's link-time base, for diagnostics only.
    pub image_base: u64,
    pub load_base: PhysicalAddress,
    pub kind: OptionalHeaderKind,
    pub sections: usize,
    pub bytes_copied: u64,
}

/// Validate `image` and copy its sections into the window at `load_window_base`.
///
/// Sections are copied in table order. The first section whose raw data lies
/// outside `image` stops the load; it and every later section are left
/// uncopied.
///
/// # Errors
/// Any header error from [`PeImage::parse`], [`PeError::SectionOutOfRange`],
/// [`PeError::AddressOverflow`], or [`PeError::Destination`] if the target
/// range is not mapped.
///
/// # Safety
/// The load window must be free: neither the running loader nor `image`
/// may live inside any section destination.
pub unsafe fn parse_and_load(
    image: &[u8],
    load_window_base: u64,
    mem: &mut impl PhysMapRw,
) -> Result<LoadedImage, PeError> {
    let pe = PeImage::parse(image)?;
    let load_base = PhysicalAddress::new(load_window_base);
    let entry = load_base
        .checked_add(u64::from(pe.entry_rva()))
        .ok_or(PeError::AddressOverflow)?;

    log::debug!(
        "PE{} image: {} sections, entry RVA {:#x}, image base {:#x}, machine {:#06x}",
        match pe.kind() {
            OptionalHeaderKind::Pe32 => "32",
            OptionalHeaderKind::Pe32Plus => "32+",
        },
        pe.section_count(),
        pe.entry_rva(),
        pe.image_base(),
        pe.file_header().machine,
    );

    let mut bytes_copied = 0u64;
    for section in pe.sections() {
        bytes_copied += unsafe { load_section(image, &section?, load_base, mem) }?;
    }

    let loaded = LoadedImage {
        entry,
        image_base: pe.image_base(),
        load_base,
        kind: pe.kind(),
        sections: pe.section_count(),
        bytes_copied,
    };
    log::info!(
        "Loaded {} sections ({} bytes) at {load_base}, entry {entry}",
        loaded.sections,
        loaded.bytes_copied
    );
    Ok(loaded)
}

unsafe fn load_section(
    image: &[u8],
    section: &Section,
    load_base: PhysicalAddress,
    mem: &mut impl PhysMapRw,
) -> Result<u64, PeError> {
    let header = &section.header;
    let start = u64::from(header.pointer_to_raw_data);
    let end = start
        .checked_add(u64::from(header.size_of_raw_data))
        .ok_or(PeError::AddressOverflow)?;

    if end > image.len() as u64 {
        return Err(PeError::SectionOutOfRange {
            index: section.index,
            end,
            image_len: image.len(),
        });
    }

    let dest = load_base
        .checked_add(u64::from(header.virtual_address))
        .ok_or(PeError::AddressOverflow)?;

    log::debug!(
        "section {} {} [{}] vsize {:#x} vaddr {:#x} raw {:#x} bytes [{start:#x}..{end:#x}) -> {dest}",
        section.index,
        header.name(),
        header.characteristics,
        header.virtual_size,
        header.virtual_address,
        header.size_of_raw_data,
    );

    // Both bounds were checked against `image.len()` above.
    #[allow(clippy::cast_possible_truncation)]
    let raw = &image[start as usize..end as usize];
    unsafe { copy_bytes(mem, dest, raw) }?;
    Ok(end - start)
}
