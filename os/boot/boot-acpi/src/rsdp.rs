//! # RSDP/XSDP (Root System Description Pointer)

use crate::{
    ConfigEntry, ConfigTableKind, PhysMapRo, Signature, WalkError, map, read_u32_le, read_u64_le,
    select_root_entry, sum,
};
use boot_memory::PhysicalAddress;

/// The validated root pointer.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RootPointer {
    pub address: PhysicalAddress,
    /// 0 for ACPI 1.0, 2 or later for ACPI 2.0+.
    pub revision: u8,
    pub oem_id: Signature<6>,
    pub rsdt_address: u32,
    /// Only read for revision 2 and later.
    pub xsdt_address: Option<u64>,
}

impl RootPointer {
    pub const SIGNATURE: Signature<8> = Signature::new(b"RSD PTR ");

    /// Size of the ACPI 1.0 structure, covered by the first checksum.
    pub const V1_SIZE: usize = 20;

    /// Size of the ACPI 2.0 structure.
    pub const V2_SIZE: usize = 36;

    /// Validate the root pointer at `address`.
    ///
    /// The signature and the checksum over the first 20 bytes are always
    /// checked; for revision 2 and later also the extended checksum over
    /// `length` bytes.
    ///
    /// # Errors
    /// [`WalkError::BadRootSignature`], [`WalkError::BadChecksum`],
    /// [`WalkError::BadLength`] or [`WalkError::Unmapped`].
    ///
    /// # Safety
    /// See [`PhysMapRo::map_ro`].
    pub unsafe fn parse(mapper: &impl PhysMapRo, address: u64) -> Result<Self, WalkError> {
        let at = PhysicalAddress::new(address);
        let v1: &[u8] = unsafe { map(mapper, address, Self::V1_SIZE) }?;

        let found = Signature::<8>::read(v1).ok_or(WalkError::Unmapped {
            address: at,
            len: Self::V1_SIZE,
        })?;
        if found != Self::SIGNATURE {
            return Err(WalkError::BadRootSignature { address: at, found });
        }
        if sum(v1) != 0 {
            return Err(WalkError::BadChecksum {
                what: "RSDP",
                address: at,
            });
        }

        let revision = v1[15];
        let truncated = WalkError::Unmapped {
            address: at,
            len: Self::V1_SIZE,
        };
        let oem_id = Signature::<6>::read(&v1[9..]).ok_or(truncated)?;
        let rsdt_address = read_u32_le(v1, 16).ok_or(truncated)?;

        let mut root = Self {
            address: at,
            revision,
            oem_id,
            rsdt_address,
            xsdt_address: None,
        };

        if revision >= 2 {
            let v2: &[u8] = unsafe { map(mapper, address, Self::V2_SIZE) }?;
            let length = read_u32_le(v2, 20).unwrap_or(0);
            if (length as usize) < Self::V2_SIZE || length > 4096 {
                return Err(WalkError::BadLength {
                    address: at,
                    length,
                });
            }

            let full: &[u8] = unsafe { map(mapper, address, length as usize) }?;
            if sum(full) != 0 {
                return Err(WalkError::BadChecksum {
                    what: "XSDP",
                    address: at,
                });
            }
            root.xsdt_address = read_u64_le(v2, 24);
        }

        Ok(root)
    }

    /// Whether the 64-bit table-of-tables pointer is authoritative.
    #[must_use]
    pub const fn uses_xsdt(&self) -> bool {
        self.revision >= 2
    }
}

/// Find and validate the root pointer among the configuration entries.
///
/// # Errors
/// [`WalkError::NoRootPointer`] if neither ACPI entry is present, otherwise
/// whatever [`RootPointer::parse`] reports.
///
/// # Safety
/// See [`PhysMapRo::map_ro`].
pub unsafe fn locate_root(
    mapper: &impl PhysMapRo,
    entries: &[ConfigEntry],
) -> Result<RootPointer, WalkError> {
    let entry = select_root_entry(entries).ok_or(WalkError::NoRootPointer)?;
    let version = if entry.kind == ConfigTableKind::Acpi2 { 2 } else { 1 };
    log::info!("ACPI table found, version={version}, address: {}", entry.address);

    unsafe { RootPointer::parse(mapper, entry.address.as_u64()) }
}
