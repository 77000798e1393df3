//! FADT (signature `"FACP"`) and the DSDT it points to.

use crate::{PhysMapRo, SdtHeader, Signature, Table, TableSignature, WalkError, load_table};
use crate::{read_u32_le, read_u64_le};

/// The Fixed ACPI Description Table.
#[derive(Debug, Clone, Copy)]
pub struct FixedTable<'a> {
    pub table: Table<'a>,
}

impl<'a> FixedTable<'a> {
    pub const SIGNATURE: TableSignature = Signature::new(b"FACP");

    /// Offset of the 32-bit `DSDT` field.
    const DSDT_OFFSET: usize = 40;

    /// Offset of the 64-bit `X_DSDT` field (ACPI 2.0+ FADTs only).
    const X_DSDT_OFFSET: usize = 140;

    /// Wrap a table found under [`FixedTable::SIGNATURE`].
    ///
    /// # Errors
    /// [`WalkError::BadSignature`] for another table, [`WalkError::BadLength`]
    /// if it is too short to hold the `DSDT` field.
    pub fn new(table: Table<'a>) -> Result<Self, WalkError> {
        if table.header.signature != Self::SIGNATURE {
            return Err(WalkError::BadSignature {
                address: table.address,
                expected: Self::SIGNATURE,
                found: table.header.signature,
            });
        }
        if table.bytes.len() < Self::DSDT_OFFSET + 4 {
            return Err(WalkError::BadLength {
                address: table.address,
                length: table.header.length,
            });
        }
        Ok(Self { table })
    }

    /// The legacy 32-bit payload pointer.
    #[must_use]
    pub fn legacy_pointer(&self) -> u32 {
        read_u32_le(self.table.bytes, Self::DSDT_OFFSET).unwrap_or(0)
    }

    /// The extended 64-bit payload pointer, if the table is long enough to carry one.
    #[must_use]
    pub fn extended_pointer(&self) -> Option<u64> {
        read_u64_le(self.table.bytes, Self::X_DSDT_OFFSET)
    }

    /// The extended pointer when non-zero, else the legacy one; `None` if both are zero.
    #[must_use]
    pub fn payload_pointer(&self) -> Option<u64> {
        match self.extended_pointer() {
            Some(x) if x != 0 => Some(x),
            _ => Some(u64::from(self.legacy_pointer())).filter(|&p| p != 0),
        }
    }
}

/// The DSDT: a header followed by AML byte code.
#[derive(Debug, Clone, Copy)]
pub struct PayloadTable<'a> {
    pub table: Table<'a>,
}

impl<'a> PayloadTable<'a> {
    pub const SIGNATURE: TableSignature = Signature::new(b"DSDT");

    /// The AML byte stream after the header.
    #[must_use]
    pub fn aml(&self) -> &'a [u8] {
        self.table.body()
    }

    #[must_use]
    pub fn code_size(&self) -> usize {
        self.table.bytes.len().saturating_sub(SdtHeader::SIZE)
    }
}

/// Follow the FADT's payload pointer to the DSDT.
///
/// # Errors
/// [`WalkError::NullPointer`] if both pointer fields are zero, otherwise
/// whatever [`load_table`] reports.
///
/// # Safety
/// See [`PhysMapRo::map_ro`].
pub unsafe fn extract_payload<'a>(
    mapper: &impl PhysMapRo,
    fixed: &FixedTable<'_>,
) -> Result<PayloadTable<'a>, WalkError> {
    let legacy = fixed.legacy_pointer();
    let extended = fixed.extended_pointer().unwrap_or(0);
    if legacy != 0 && extended != 0 && u64::from(legacy) != extended {
        log::warn!("FADT DSDT pointers disagree: {legacy:#x} vs X_DSDT {extended:#x}, using X_DSDT");
    }

    let address = fixed
        .payload_pointer()
        .ok_or(WalkError::NullPointer(FixedTable::SIGNATURE))?;
    log::info!("DSDT address: {address:#x}");

    let table = unsafe { load_table(mapper, address, Some(PayloadTable::SIGNATURE)) }?;
    Ok(PayloadTable { table })
}
