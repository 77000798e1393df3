use boot_memory::PhysicalAddress;

/// The configuration-table identifiers the loader cares about.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ConfigTableKind {
    /// ACPI 1.0 root pointer.
    Acpi1,
    /// ACPI 2.0+ root pointer.
    Acpi2,
    /// Flattened device tree blob.
    DeviceTree,
    Other,
}

/// One (identifier, pointer) pair from the firmware configuration table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ConfigEntry {
    pub kind: ConfigTableKind,
    pub address: PhysicalAddress,
}

impl ConfigEntry {
    #[must_use]
    pub const fn new(kind: ConfigTableKind, address: u64) -> Self {
        Self {
            kind,
            address: PhysicalAddress::new(address),
        }
    }
}

/// The ACPI root pointer entry, preferring ACPI 2.0+ over ACPI 1.0
/// regardless of their order in the list.
#[must_use]
pub fn select_root_entry(entries: &[ConfigEntry]) -> Option<&ConfigEntry> {
    entries
        .iter()
        .find(|e| e.kind == ConfigTableKind::Acpi2)
        .or_else(|| entries.iter().find(|e| e.kind == ConfigTableKind::Acpi1))
}

/// The device tree blob, if the firmware published one.
#[must_use]
pub fn locate_device_tree(entries: &[ConfigEntry]) -> Option<PhysicalAddress> {
    entries
        .iter()
        .find(|e| e.kind == ConfigTableKind::DeviceTree)
        .map(|e| e.address)
}
