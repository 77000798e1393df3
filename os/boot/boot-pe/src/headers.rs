//! # On-disk PE/COFF records

use core::fmt;
use core::mem::size_of;
use core::ptr::read_unaligned;

pub(crate) const DOS_MAGIC: u16 = 0x5A4D; // "MZ"
pub(crate) const DOS_LFANEW_OFFSET: usize = 0x3C;
pub(crate) const NT_SIGNATURE: u32 = 0x0000_4550; // "PE\0\0"

/// COFF file header, directly after the NT signature.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct FileHeader {
    pub machine: u16,
    pub number_of_sections: u16,
    pub time_date_stamp: u32,
    pub pointer_to_symbol_table: u32,
    pub number_of_symbols: u32,
    pub size_of_optional_header: u16,
    pub characteristics: FileCharacteristics,
}

/// Section table record.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct SectionHeader {
    pub name: [u8; 8],
    pub virtual_size: u32,
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
    pub pointer_to_relocations: u32,
    pub pointer_to_linenumbers: u32,
    pub number_of_relocations: u16,
    pub number_of_linenumbers: u16,
    pub characteristics: SectionFlags,
}

const _: () = {
    assert!(size_of::<FileHeader>() == 20);
    assert!(size_of::<SectionHeader>() == 40);
};

impl SectionHeader {
    pub const SIZE: usize = size_of::<Self>();

    /// Name up to the first NUL.
    #[must_use]
    pub fn name(&self) -> SectionName<'_> {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        SectionName(&self.name[..end])
    }
}

pub struct SectionName<'a>(&'a [u8]);

impl fmt::Display for SectionName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.0 {
            let c = if b.is_ascii_graphic() { char::from(b) } else { '?' };
            fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}

/// Read a `T` at `offset`, or `None` if it does not fit.
pub(crate) fn read_record<T: Copy>(bytes: &[u8], offset: usize) -> Option<T> {
    let end = offset.checked_add(size_of::<T>())?;
    if end > bytes.len() {
        return None;
    }
    // SAFETY: We just checked bounds; using read_unaligned to avoid alignment assumptions.
    Some(unsafe { read_unaligned(bytes.as_ptr().add(offset).cast::<T>()) })
}

#[inline]
pub(crate) fn read_u16_le(buf: &[u8], off: usize) -> Option<u16> {
    let s = buf.get(off..off.checked_add(2)?)?;
    Some(u16::from_le_bytes([s[0], s[1]]))
}

#[inline]
pub(crate) fn read_u32_le(buf: &[u8], off: usize) -> Option<u32> {
    let s = buf.get(off..off.checked_add(4)?)?;
    Some(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}

#[inline]
pub(crate) fn read_u64_le(buf: &[u8], off: usize) -> Option<u64> {
    let s = buf.get(off..off.checked_add(8)?)?;
    Some(u64::from_le_bytes([
        s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7],
    ]))
}

/// `IMAGE_FILE_HEADER.Characteristics`
#[bitfield_struct::bitfield(u16)]
pub struct FileCharacteristics {
    /// Bit 0 — Base relocations have been removed.
    pub relocs_stripped: bool,
    /// Bit 1 — The image is executable.
    pub executable_image: bool,
    pub line_nums_stripped: bool,
    pub local_syms_stripped: bool,
    pub aggressive_ws_trim: bool,
    /// Bit 5 — Can handle addresses above 2 GiB.
    pub large_address_aware: bool,
    __: bool,
    pub bytes_reversed_lo: bool,
    /// Bit 8 — 32-bit word machine.
    pub machine_32bit: bool,
    pub debug_stripped: bool,
    pub removable_run_from_swap: bool,
    pub net_run_from_swap: bool,
    pub system: bool,
    /// Bit 13 — The image is a DLL.
    pub dll: bool,
    pub up_system_only: bool,
    pub bytes_reversed_hi: bool,
}

/// `IMAGE_SECTION_HEADER.Characteristics`
#[bitfield_struct::bitfield(u32)]
pub struct SectionFlags {
    #[bits(5)]
    __: u8,
    /// Bit 5 — Executable code.
    pub code: bool,
    /// Bit 6 — Initialized data.
    pub initialized_data: bool,
    /// Bit 7 — Uninitialized data (BSS).
    pub uninitialized_data: bool,
    #[bits(17)]
    __: u32,
    /// Bit 25 — Can be discarded after loading.
    pub discardable: bool,
    #[bits(3)]
    __: u8,
    pub execute: bool,
    pub read: bool,
    pub write: bool,
}

impl fmt::Display for SectionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool, c: char| if on { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.read(), 'r'),
            flag(self.write(), 'w'),
            flag(self.execute(), 'x')
        )
    }
}
