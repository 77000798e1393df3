use crate::{
    ConfigEntry, FixedTable, PayloadTable, PhysMapRo, RootPointer, TableOfTables, WalkError,
    extract_payload, find_sibling, locate_device_tree, locate_root, resolve_table_chain,
};
use boot_memory::PhysicalAddress;

/// Everything the walk found, root to payload.
#[derive(Debug, Clone, Copy)]
pub struct WalkReport<'a> {
    pub root: RootPointer,
    pub tables: TableOfTables<'a>,
    pub fixed: FixedTable<'a>,
    pub payload: PayloadTable<'a>,
    pub device_tree: Option<PhysicalAddress>,
}

/// Walk root pointer → table of tables → FADT → DSDT, logging every step.
///
/// # Errors
/// The first [`WalkError`] along the chain; the walk stops there.
///
/// # Safety
/// See [`PhysMapRo::map_ro`].
pub unsafe fn walk<'a>(
    mapper: &impl PhysMapRo,
    entries: &[ConfigEntry],
) -> Result<WalkReport<'a>, WalkError> {
    let device_tree = locate_device_tree(entries);
    if let Some(dtb) = device_tree {
        log::info!("EFI DTB table address: {dtb}");
    }

    let root = unsafe { locate_root(mapper, entries) }?;
    log::info!("RSDP address: {}, revision {}, OEM {}", root.address, root.revision, root.oem_id);
    if root.uses_xsdt() {
        log::info!("XSDT address: {:#x}", root.xsdt_address.unwrap_or(0));
    } else {
        log::info!("RSDT address: {:#x}", root.rsdt_address);
    }

    let tables: TableOfTables<'a> = unsafe { resolve_table_chain(mapper, &root) }?;
    tables.table.log_header(if root.uses_xsdt() { "XSDT" } else { "RSDT" });
    log::info!("{} entries", tables.len());

    let fadt = unsafe { find_sibling(mapper, &tables, FixedTable::SIGNATURE) }?;
    let fixed = FixedTable::new(fadt)?;
    log::info!("FADT address: {}", fixed.table.address);

    let payload = unsafe { extract_payload(mapper, &fixed) }?;
    let h = &payload.table.header;
    log::info!("DSDT signature: {}", h.signature);
    log::info!("DSDT length: {}", h.length);
    log::info!("DSDT revision: {}", h.revision);
    log::info!(
        "DSDT checksum: {:#04x} ({})",
        h.checksum,
        if payload.table.checksum_valid() { "valid" } else { "INVALID" }
    );
    log::info!("DSDT code size: {}", payload.code_size());

    Ok(WalkReport {
        root,
        tables,
        fixed,
        payload,
        device_tree,
    })
}
