mod common;

use boot_acpi::{
    AmlHexDump, ConfigEntry, ConfigTableKind, EntryWidth, FixedTable, RootPointer, Signature,
    WalkError, extract_payload, find_sibling, locate_root, resolve_table_chain, walk,
};
use boot_memory::PhysicalAddress;
use common::*;

const AML: &[u8] = &[0x10, 0x4A, 0x04, 0x5C, 0x5F, 0x53, 0x42, 0x5F];

fn acpi2_entries() -> [ConfigEntry; 1] {
    [ConfigEntry::new(ConfigTableKind::Acpi2, RSDP)]
}

#[test]
fn full_walk_reaches_payload() {
    let mem = acpi2_machine(AML);
    let report = unsafe { walk(&mem, &acpi2_entries()) }.unwrap();

    assert_eq!(report.root.revision, 2);
    assert_eq!(report.tables.width, EntryWidth::Extended);
    assert_eq!(report.tables.len(), 2);
    assert_eq!(report.fixed.table.address, PhysicalAddress::new(FACP));
    assert_eq!(report.payload.table.address, PhysicalAddress::new(DSDT));
    assert_eq!(report.payload.aml(), AML);
    assert_eq!(report.payload.code_size(), AML.len());
    assert!(report.payload.table.checksum_valid());
    assert_eq!(report.device_tree, None);
}

#[test]
fn extended_pointer_beats_legacy_pointer() {
    let mut mem = acpi2_machine(AML);
    // A decoy DSDT reachable only through the legacy field.
    mem.write(DSDT_LEGACY, &dsdt(b"decoy"));
    mem.write(FACP, &fadt(u32::try_from(DSDT_LEGACY).unwrap(), DSDT));

    let root = unsafe { locate_root(&mem, &acpi2_entries()) }.unwrap();
    let tables = unsafe { resolve_table_chain(&mem, &root) }.unwrap();
    let sibling = unsafe { find_sibling(&mem, &tables, FixedTable::SIGNATURE) }.unwrap();
    let fixed = FixedTable::new(sibling).unwrap();
    let payload = unsafe { extract_payload(&mem, &fixed) }.unwrap();

    assert_eq!(payload.table.address, PhysicalAddress::new(DSDT));
    assert_eq!(payload.aml(), AML);
}

#[test]
fn zero_extended_pointer_falls_back_to_legacy() {
    let mut mem = acpi2_machine(AML);
    mem.write(DSDT_LEGACY, &dsdt(b"legacy"));
    mem.write(FACP, &fadt(u32::try_from(DSDT_LEGACY).unwrap(), 0));

    let report = unsafe { walk(&mem, &acpi2_entries()) }.unwrap();
    assert_eq!(report.payload.aml(), b"legacy");
}

#[test]
fn short_fadt_only_has_legacy_pointer() {
    let mut mem = acpi2_machine(AML);
    mem.write(FACP, &fadt_v1(u32::try_from(DSDT).unwrap()));

    let report = unsafe { walk(&mem, &acpi2_entries()) }.unwrap();
    assert_eq!(report.fixed.extended_pointer(), None);
    assert_eq!(report.payload.aml(), AML);
}

#[test]
fn both_pointers_zero() {
    let mut mem = acpi2_machine(AML);
    mem.write(FACP, &fadt(0, 0));
    let err = unsafe { walk(&mem, &acpi2_entries()) }.unwrap_err();
    assert_eq!(err, WalkError::NullPointer(Signature::new(b"FACP")));
}

#[test]
fn acpi2_entry_preferred_over_acpi1() {
    let mut mem = acpi2_machine(AML);
    // ACPI 1.0 root pointer listed first, leading to an RSDT without a FADT.
    let v1_at = BASE + 0x500;
    mem.write(v1_at, &rsdp_v1(u32::try_from(RSDT).unwrap()));
    mem.write(RSDT, &rsdt(&[u32::try_from(APIC).unwrap()]));

    let entries = [
        ConfigEntry::new(ConfigTableKind::Acpi1, v1_at),
        ConfigEntry::new(ConfigTableKind::Acpi2, RSDP),
    ];
    let root = unsafe { locate_root(&mem, &entries) }.unwrap();
    assert_eq!(root.address, PhysicalAddress::new(RSDP));
    assert!(root.uses_xsdt());
}

#[test]
fn revision_zero_walks_the_rsdt() {
    let mut mem = acpi2_machine(AML);
    mem.write(RSDP, &rsdp_v1(u32::try_from(RSDT).unwrap()));
    mem.write(
        RSDT,
        &rsdt(&[u32::try_from(APIC).unwrap(), u32::try_from(FACP).unwrap()]),
    );

    let entries = [ConfigEntry::new(ConfigTableKind::Acpi1, RSDP)];
    let report = unsafe { walk(&mem, &entries) }.unwrap();
    assert_eq!(report.root.xsdt_address, None);
    assert_eq!(report.tables.width, EntryWidth::Legacy);
    assert_eq!(report.tables.entries().collect::<Vec<_>>(), vec![APIC, FACP]);
    assert_eq!(report.payload.aml(), AML);
}

#[test]
fn missing_root_pointer() {
    let mem = acpi2_machine(AML);
    let entries = [ConfigEntry::new(ConfigTableKind::DeviceTree, 0x4800_0000)];
    assert_eq!(
        unsafe { walk(&mem, &entries) }.unwrap_err(),
        WalkError::NoRootPointer
    );
}

#[test]
fn corrupt_root_pointer_is_rejected() {
    let mut mem = acpi2_machine(AML);
    mem.write(RSDP + 9, b"X"); // OEM id byte, breaks both checksums
    assert!(matches!(
        unsafe { RootPointer::parse(&mem, RSDP) },
        Err(WalkError::BadChecksum { what: "RSDP", .. })
    ));

    mem.write(RSDP, b"RSD_PTR_");
    assert!(matches!(
        unsafe { RootPointer::parse(&mem, RSDP) },
        Err(WalkError::BadRootSignature { .. })
    ));
}

#[test]
fn wrong_table_of_tables_signature() {
    let mut mem = acpi2_machine(AML);
    mem.write(XSDT, b"RSDT");
    let err = unsafe { walk(&mem, &acpi2_entries()) }.unwrap_err();
    assert_eq!(
        err,
        WalkError::BadSignature {
            address: PhysicalAddress::new(XSDT),
            expected: Signature::new(b"XSDT"),
            found: Signature::new(b"RSDT"),
        }
    );
}

#[test]
fn fadt_missing_from_table_of_tables() {
    let mut mem = acpi2_machine(AML);
    mem.write(XSDT, &xsdt(&[APIC]));
    let err = unsafe { walk(&mem, &acpi2_entries()) }.unwrap_err();
    assert_eq!(err, WalkError::SignatureNotFound(Signature::new(b"FACP")));
}

#[test]
fn unreadable_and_null_entries_are_skipped() {
    let mut mem = acpi2_machine(AML);
    mem.write(XSDT, &xsdt(&[0, 0xDEAD_0000, FACP]));
    let report = unsafe { walk(&mem, &acpi2_entries()) }.unwrap();
    assert_eq!(report.fixed.table.address, PhysicalAddress::new(FACP));
}

#[test]
fn device_tree_is_reported() {
    let mem = acpi2_machine(AML);
    let entries = [
        ConfigEntry::new(ConfigTableKind::DeviceTree, 0x4800_0000),
        ConfigEntry::new(ConfigTableKind::Acpi2, RSDP),
    ];
    let report = unsafe { walk(&mem, &entries) }.unwrap();
    assert_eq!(report.device_tree, Some(PhysicalAddress::new(0x4800_0000)));
}

#[test]
fn hex_dump_of_payload_table() {
    let mem = acpi2_machine(AML);
    let report = unsafe { walk(&mem, &acpi2_entries()) }.unwrap();
    let dump = AmlHexDump::new(report.payload.table.bytes).to_string();
    // 36-byte header + 8 bytes of AML = one full line and a 12-byte remainder.
    assert!(dump.starts_with("44534454"));
    assert_eq!(dump.matches("\n\r").count(), 2);
    assert!(dump.ends_with("104A045C5F53425F\n\r"));
}
