//! # PE Header Chain

use crate::PeError;
use crate::headers::{
    DOS_LFANEW_OFFSET, DOS_MAGIC, FileHeader, NT_SIGNATURE, SectionHeader, read_record,
    read_u16_le, read_u32_le, read_u64_le,
};
use core::mem::size_of;

/// Which optional header layout the image uses.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OptionalHeaderKind {
    Pe32,
    Pe32Plus,
}

impl OptionalHeaderKind {
    const PE32_MAGIC: u16 = 0x10B;
    const PE32_PLUS_MAGIC: u16 = 0x20B;

    const fn from_magic(magic: u16) -> Option<Self> {
        match magic {
            Self::PE32_MAGIC => Some(Self::Pe32),
            Self::PE32_PLUS_MAGIC => Some(Self::Pe32Plus),
            _ => None,
        }
    }

    /// Offset of `NumberOfRvaAndSizes` in the optional header.
    const fn rva_count_offset(self) -> usize {
        match self {
            Self::Pe32 => 92,
            Self::Pe32Plus => 108,
        }
    }

    /// Offset of the first data directory in the optional header.
    const fn data_directory_offset(self) -> usize {
        match self {
            Self::Pe32 => 96,
            Self::Pe32Plus => 112,
        }
    }
}

/// Index of the base relocation table in the data directory.
const BASE_RELOCATION_DIRECTORY: u32 = 5;

/// Offset of `AddressOfEntryPoint` in the optional header.
const ENTRY_RVA_OFFSET: usize = 16;

/// A validated header chain over an in-memory image.
#[derive(Debug, Clone, Copy)]
pub struct PeImage<'a> {
    bytes: &'a [u8],
    file_header: FileHeader,
    kind: OptionalHeaderKind,
    entry_rva: u32,
    image_base: u64,
    section_table: usize,
}

/// A section record together with its index in the section table.
#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub index: usize,
    pub header: SectionHeader,
}

impl<'a> PeImage<'a> {
    /// Validate the header chain of `bytes`.
    ///
    /// # Errors
    /// - [`PeError::BadDosHeader`] without the `"MZ"` magic at offset 0.
    /// - [`PeError::BadNtHeader`] without `"PE\0\0"` at `e_lfanew`.
    /// - [`PeError::BadOptionalHeader`] for an unknown optional header magic.
    /// - [`PeError::Truncated`] if any header lies beyond the image.
    /// - [`PeError::RelocationsPresent`] for a non-empty base-relocation directory.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, PeError> {
        if read_u16_le(bytes, 0) != Some(DOS_MAGIC) {
            return Err(PeError::BadDosHeader);
        }
        let lfanew = read_u32_le(bytes, DOS_LFANEW_OFFSET).ok_or(PeError::Truncated {
            what: "DOS header",
            offset: 0,
        })? as usize;

        if read_u32_le(bytes, lfanew) != Some(NT_SIGNATURE) {
            return Err(PeError::BadNtHeader { offset: lfanew });
        }

        let file_header_at = lfanew.checked_add(4).ok_or(PeError::AddressOverflow)?;
        let file_header: FileHeader =
            read_record(bytes, file_header_at).ok_or(PeError::Truncated {
                what: "file header",
                offset: file_header_at,
            })?;

        let optional_at = file_header_at
            .checked_add(size_of::<FileHeader>())
            .ok_or(PeError::AddressOverflow)?;
        let optional_len = usize::from(file_header.size_of_optional_header);
        let optional_end = optional_at
            .checked_add(optional_len)
            .ok_or(PeError::AddressOverflow)?;
        let optional = bytes
            .get(optional_at..optional_end)
            .ok_or(PeError::Truncated {
                what: "optional header",
                offset: optional_at,
            })?;

        let truncated_optional = PeError::Truncated {
            what: "optional header",
            offset: optional_at,
        };
        let magic = read_u16_le(optional, 0).ok_or(truncated_optional)?;
        let kind =
            OptionalHeaderKind::from_magic(magic).ok_or(PeError::BadOptionalHeader { magic })?;

        let entry_rva = read_u32_le(optional, ENTRY_RVA_OFFSET).ok_or(truncated_optional)?;
        let image_base = match kind {
            OptionalHeaderKind::Pe32Plus => read_u64_le(optional, 24),
            OptionalHeaderKind::Pe32 => read_u32_le(optional, 28).map(u64::from),
        }
        .ok_or(truncated_optional)?;

        Self::reject_relocations(optional, kind)?;

        Ok(Self {
            bytes,
            file_header,
            kind,
            entry_rva,
            image_base,
            section_table: optional_end,
        })
    }

    /// Absent directories (short optional header or small `NumberOfRvaAndSizes`) count as empty.
    fn reject_relocations(optional: &[u8], kind: OptionalHeaderKind) -> Result<(), PeError> {
        let Some(count) = read_u32_le(optional, kind.rva_count_offset()) else {
            return Ok(());
        };
        if count <= BASE_RELOCATION_DIRECTORY {
            return Ok(());
        }

        let at = kind.data_directory_offset() + BASE_RELOCATION_DIRECTORY as usize * 8;
        let (Some(rva), Some(size)) = (read_u32_le(optional, at), read_u32_le(optional, at + 4))
        else {
            return Ok(());
        };

        if size == 0 {
            Ok(())
        } else {
            Err(PeError::RelocationsPresent { rva, size })
        }
    }

    #[must_use]
    pub const fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[must_use]
    pub const fn kind(&self) -> OptionalHeaderKind {
        self.kind
    }

    #[must_use]
    pub const fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    #[must_use]
    pub const fn entry_rva(&self) -> u32 {
        self.entry_rva
    }

    /// The link-time base. Informational only: nothing is rebased.
    #[must_use]
    pub const fn image_base(&self) -> u64 {
        self.image_base
    }

    #[must_use]
    pub fn section_count(&self) -> usize {
        usize::from(self.file_header.number_of_sections)
    }

    /// Offset of the section table: optional header start + `SizeOfOptionalHeader`.
    #[must_use]
    pub const fn section_table_offset(&self) -> usize {
        self.section_table
    }

    /// The section table in order; a record beyond the image ends it with `Truncated`.
    pub fn sections(&self) -> impl Iterator<Item = Result<Section, PeError>> + '_ {
        (0..self.section_count()).map(move |index| -> Result<Section, PeError> {
            let offset = index
                .checked_mul(SectionHeader::SIZE)
                .and_then(|o| o.checked_add(self.section_table))
                .ok_or(PeError::AddressOverflow)?;
            let header: SectionHeader = read_record(self.bytes, offset).ok_or(PeError::Truncated {
                what: "section header",
                offset,
            })?;
            Ok(Section { index, header })
        })
    }

    /// Bytes from the load base to the end of the furthest section, counting
    /// each section at the larger of its virtual and raw size.
    ///
    /// Stops at the first unreadable section record, like the loader does.
    #[must_use]
    pub fn footprint(&self) -> u64 {
        self.sections()
            .map_while(Result::ok)
            .map(|s| {
                let size = s.header.virtual_size.max(s.header.size_of_raw_data);
                u64::from(s.header.virtual_address) + u64::from(size)
            })
            .max()
            .unwrap_or(0)
    }
}
