//! System Description Table header and table loading.

use crate::{PhysMapRo, WalkError, map, read_u32_le, sum};
use boot_memory::PhysicalAddress;
use core::fmt;

/// Fixed-width ASCII signature as found in firmware tables.
///
/// Displays non-printable bytes as `?`.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Signature<const N: usize>(pub [u8; N]);

/// 4-byte SDT signature such as `"FACP"`.
pub type TableSignature = Signature<4>;

impl<const N: usize> Signature<N> {
    #[must_use]
    pub const fn new(bytes: &[u8; N]) -> Self {
        Self(*bytes)
    }

    /// First `N` bytes of `bytes`, if there are that many.
    #[must_use]
    pub fn read(bytes: &[u8]) -> Option<Self> {
        bytes.get(..N)?.try_into().ok().map(Self)
    }
}

impl<const N: usize> fmt::Display for Signature<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                char::from(b)
            } else {
                '?'
            };
            f.write_char(c)?;
        }
        Ok(())
    }
}

impl<const N: usize> fmt::Debug for Signature<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// Standard 36-byte header at the start of every ACPI table.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SdtHeader {
    pub signature: TableSignature,
    /// Total length of the table, header included.
    pub length: u32,
    pub revision: u8,
    pub checksum: u8,
    pub oem_id: Signature<6>,
    pub oem_table_id: Signature<8>,
    pub oem_revision: u32,
    pub creator_id: Signature<4>,
    pub creator_revision: u32,
}

impl SdtHeader {
    pub const SIZE: usize = 36;

    /// Returns `None` if `data` is shorter than [`SdtHeader::SIZE`].
    #[must_use]
    pub fn read_from_bytes(data: &[u8]) -> Option<Self> {
        let data = data.get(..Self::SIZE)?;
        Some(Self {
            signature: Signature::read(data)?,
            length: read_u32_le(data, 4)?,
            revision: data[8],
            checksum: data[9],
            oem_id: Signature::read(&data[10..])?,
            oem_table_id: Signature::read(&data[16..])?,
            oem_revision: read_u32_le(data, 24)?,
            creator_id: Signature::read(&data[28..])?,
            creator_revision: read_u32_le(data, 32)?,
        })
    }
}

/// Tables larger than this are treated as corrupt.
const MAX_TABLE_LEN: u32 = 16 * 1024 * 1024;

/// A mapped table: header plus its full byte range (header included).
#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    pub address: PhysicalAddress,
    pub header: SdtHeader,
    pub bytes: &'a [u8],
}

impl<'a> Table<'a> {
    /// Bytes following the header.
    #[must_use]
    pub fn body(&self) -> &'a [u8] {
        self.bytes.get(SdtHeader::SIZE..).unwrap_or_default()
    }

    #[must_use]
    pub fn checksum_valid(&self) -> bool {
        sum(self.bytes) == 0
    }

    /// Log every header field.
    pub fn log_header(&self, what: &str) {
        let h = &self.header;
        log::info!("{what} address: {}", self.address);
        log::info!("{what} signature: {}", h.signature);
        log::info!("{what} length: {}", h.length);
        log::info!("{what} revision: {}", h.revision);
        log::info!(
            "{what} checksum: {:#04x} ({})",
            h.checksum,
            if self.checksum_valid() { "valid" } else { "INVALID" }
        );
        log::info!("{what} OEM ID: {}", h.oem_id);
        log::info!("{what} OEM Table ID: {}", h.oem_table_id);
        log::info!("{what} OEM Revision: {}", h.oem_revision);
        log::info!("{what} Creator ID: {}", h.creator_id);
        log::info!("{what} Creator Revision: {}", h.creator_revision);
    }
}

/// Map and sanity-check the table at `address`.
///
/// 1. Map the header and learn the table length.
/// 2. Compare the signature against `expected`, if given.
/// 3. Bound the length: at least a header, at most 16 MiB.
/// 4. Map the full table.
///
/// The checksum is *not* enforced; see [`Table::checksum_valid`].
///
/// # Errors
/// [`WalkError::Unmapped`], [`WalkError::BadSignature`] or [`WalkError::BadLength`].
///
/// # Safety
/// See [`PhysMapRo::map_ro`].
pub unsafe fn load_table<'a>(
    mapper: &impl PhysMapRo,
    address: u64,
    expected: Option<TableSignature>,
) -> Result<Table<'a>, WalkError> {
    let at = PhysicalAddress::new(address);
    let head: &[u8] = unsafe { map(mapper, address, SdtHeader::SIZE) }?;
    let header = SdtHeader::read_from_bytes(head).ok_or(WalkError::Unmapped {
        address: at,
        len: SdtHeader::SIZE,
    })?;

    if let Some(expected) = expected
        && header.signature != expected
    {
        return Err(WalkError::BadSignature {
            address: at,
            expected,
            found: header.signature,
        });
    }

    if (header.length as usize) < SdtHeader::SIZE || header.length > MAX_TABLE_LEN {
        return Err(WalkError::BadLength {
            address: at,
            length: header.length,
        });
    }

    let bytes = unsafe { map(mapper, address, header.length as usize) }?;
    Ok(Table {
        address: at,
        header,
        bytes,
    })
}
