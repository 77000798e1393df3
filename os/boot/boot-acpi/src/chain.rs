//! RSDT/XSDT: the table of tables.

use crate::{PhysMapRo, RootPointer, Signature, Table, TableSignature, WalkError, load_table, map};
use crate::{read_u32_le, read_u64_le};

/// Pointer width of the table-of-tables entries.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EntryWidth {
    /// RSDT: 32-bit entries.
    Legacy = 4,
    /// XSDT: 64-bit entries.
    Extended = 8,
}

impl EntryWidth {
    #[must_use]
    pub const fn bytes(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn signature(self) -> TableSignature {
        match self {
            Self::Legacy => Signature::new(b"RSDT"),
            Self::Extended => Signature::new(b"XSDT"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TableOfTables<'a> {
    pub table: Table<'a>,
    pub width: EntryWidth,
}

impl<'a> TableOfTables<'a> {
    /// `(length − header size) / pointer width`; a trailing partial entry is ignored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.body().len() / self.width.bytes()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sibling table addresses in table order.
    pub fn entries(&self) -> impl Iterator<Item = u64> + 'a {
        let width = self.width;
        self.table
            .body()
            .chunks_exact(width.bytes())
            .filter_map(move |chunk| match width {
                EntryWidth::Legacy => read_u32_le(chunk, 0).map(u64::from),
                EntryWidth::Extended => read_u64_le(chunk, 0),
            })
    }
}

/// Follow the root pointer to the XSDT (revision ≥ 2) or the RSDT.
///
/// # Errors
/// [`WalkError::NullPointer`] if the selected address is zero, otherwise
/// whatever [`load_table`] reports.
///
/// # Safety
/// See [`PhysMapRo::map_ro`].
pub unsafe fn resolve_table_chain<'a>(
    mapper: &impl PhysMapRo,
    root: &RootPointer,
) -> Result<TableOfTables<'a>, WalkError> {
    let (address, width) = if root.uses_xsdt() {
        (root.xsdt_address.unwrap_or(0), EntryWidth::Extended)
    } else {
        (u64::from(root.rsdt_address), EntryWidth::Legacy)
    };

    if address == 0 {
        return Err(WalkError::NullPointer(width.signature()));
    }

    let table = unsafe { load_table(mapper, address, Some(width.signature())) }?;
    Ok(TableOfTables { table, width })
}

/// The first sibling table whose signature equals `signature` (case-exact).
///
/// Null or unreadable entries are skipped.
///
/// # Errors
/// [`WalkError::SignatureNotFound`] if no entry matches, or whatever
/// [`load_table`] reports for the matching entry.
///
/// # Safety
/// See [`PhysMapRo::map_ro`].
pub unsafe fn find_sibling<'a>(
    mapper: &impl PhysMapRo,
    tables: &TableOfTables<'_>,
    signature: TableSignature,
) -> Result<Table<'a>, WalkError> {
    let what = tables.width.signature();

    for (i, address) in tables.entries().enumerate() {
        if address == 0 {
            log::warn!("{what} entry {i}: null");
            continue;
        }

        let head = match unsafe { map(mapper, address, 4) } {
            Ok(head) => head,
            Err(e) => {
                log::warn!("{what} entry {i}: {e}");
                continue;
            }
        };

        let found = Signature::<4>::read(head).unwrap_or(Signature([0; 4]));
        log::info!("{what} entry {i}: {address:#x}, signature: {found}");

        if found == signature {
            return unsafe { load_table(mapper, address, Some(signature)) };
        }
    }

    Err(WalkError::SignatureNotFound(signature))
}
