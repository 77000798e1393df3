#![allow(dead_code)]

use boot_memory::sim::SimulatedMemory;

pub const BASE: u64 = 0x7F00_0000;
pub const RSDP: u64 = BASE;
pub const XSDT: u64 = BASE + 0x100;
pub const RSDT: u64 = BASE + 0x200;
pub const FACP: u64 = BASE + 0x1000;
pub const APIC: u64 = BASE + 0x2000;
pub const DSDT: u64 = BASE + 0x3000;
pub const DSDT_LEGACY: u64 = BASE + 0x4000;

/// Set `bytes[at]` so that the whole slice sums to zero.
pub fn fix_checksum(bytes: &mut [u8], at: usize) {
    bytes[at] = 0;
    let sum = bytes.iter().fold(0u8, |a, &b| a.wrapping_add(b));
    bytes[at] = 0u8.wrapping_sub(sum);
}

pub fn sdt(signature: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut t = Vec::with_capacity(36 + body.len());
    t.extend_from_slice(signature);
    t.extend_from_slice(&u32::try_from(36 + body.len()).unwrap().to_le_bytes());
    t.push(2); // revision
    t.push(0); // checksum
    t.extend_from_slice(b"HVISOR");
    t.extend_from_slice(b"HVLOADER");
    t.extend_from_slice(&1u32.to_le_bytes());
    t.extend_from_slice(b"RUST");
    t.extend_from_slice(&0x2025u32.to_le_bytes());
    t.extend_from_slice(body);
    fix_checksum(&mut t, 9);
    t
}

pub fn rsdp_v1(rsdt: u32) -> Vec<u8> {
    let mut r = Vec::new();
    r.extend_from_slice(b"RSD PTR ");
    r.push(0);
    r.extend_from_slice(b"HVISOR");
    r.push(0); // revision
    r.extend_from_slice(&rsdt.to_le_bytes());
    fix_checksum(&mut r, 8);
    r
}

pub fn rsdp_v2(rsdt: u32, xsdt: u64) -> Vec<u8> {
    let mut r = Vec::new();
    r.extend_from_slice(b"RSD PTR ");
    r.push(0);
    r.extend_from_slice(b"HVISOR");
    r.push(2);
    r.extend_from_slice(&rsdt.to_le_bytes());
    r.extend_from_slice(&36u32.to_le_bytes());
    r.extend_from_slice(&xsdt.to_le_bytes());
    r.extend_from_slice(&[0, 0, 0, 0]);
    fix_checksum(&mut r[..20], 8);
    fix_checksum(&mut r, 32);
    r
}

pub fn xsdt(entries: &[u64]) -> Vec<u8> {
    let body: Vec<u8> = entries.iter().flat_map(|e| e.to_le_bytes()).collect();
    sdt(b"XSDT", &body)
}

pub fn rsdt(entries: &[u32]) -> Vec<u8> {
    let body: Vec<u8> = entries.iter().flat_map(|e| e.to_le_bytes()).collect();
    sdt(b"RSDT", &body)
}

/// ACPI 2.0+ FADT (244 bytes).
pub fn fadt(dsdt: u32, x_dsdt: u64) -> Vec<u8> {
    let mut body = vec![0u8; 244 - 36];
    body[40 - 36..44 - 36].copy_from_slice(&dsdt.to_le_bytes());
    body[140 - 36..148 - 36].copy_from_slice(&x_dsdt.to_le_bytes());
    sdt(b"FACP", &body)
}

/// ACPI 1.0 FADT (116 bytes), no `X_DSDT` field.
pub fn fadt_v1(dsdt: u32) -> Vec<u8> {
    let mut body = vec![0u8; 116 - 36];
    body[40 - 36..44 - 36].copy_from_slice(&dsdt.to_le_bytes());
    sdt(b"FACP", &body)
}

pub fn dsdt(aml: &[u8]) -> Vec<u8> {
    sdt(b"DSDT", aml)
}

/// A revision-2 chain: RSDP → XSDT → [APIC, FACP] → DSDT (via X_DSDT).
pub fn acpi2_machine(aml: &[u8]) -> SimulatedMemory {
    let mut mem = SimulatedMemory::new().with_window(BASE, 0x10000);
    mem.write(RSDP, &rsdp_v2(0, XSDT));
    mem.write(XSDT, &xsdt(&[APIC, FACP]));
    mem.write(APIC, &sdt(b"APIC", &[0; 8]));
    mem.write(FACP, &fadt(0, DSDT));
    mem.write(DSDT, &dsdt(aml));
    mem
}
