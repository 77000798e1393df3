//! # Hand-off Trace
//!
//! A compact record written straight to the platform UART right before the
//! jump, when the console is long gone.

use crate::memory_map::MemoryMapInfo;
use boot_arch::{ArchDescriptor, HandoffParams, serial_trace};
use boot_info::handoff::argument_registers;
use boot_memory::PhysicalAddress;

pub fn trace_handoff(
    descriptor: &ArchDescriptor,
    entry: PhysicalAddress,
    params: &HandoffParams,
    memory_map: Option<&MemoryMapInfo>,
) {
    let convention = descriptor.convention();
    serial_trace!("Hand-off in UEFI loader:\n");
    serial_trace!("   arch = {}, convention = {}\n", descriptor.name(), convention);
    serial_trace!("  entry = {:018x}\n", entry.as_u64());

    let words = params.as_words();
    let registers = argument_registers(descriptor.arch());
    for (register, value) in registers.iter().zip(convention.args(&words)) {
        serial_trace!("  {register:>5} = {value:018x}\n");
    }

    if let Some(map) = memory_map {
        serial_trace!(" MMAP ptr = {:018x}", map.address.as_u64());
        serial_trace!(", MMAP len = {}", map.layout.map_size);
        serial_trace!(", MMAP desc size = {}", map.layout.descriptor_size);
        serial_trace!(", MMAP desc version = {}", map.layout.descriptor_version);
        serial_trace!(", MMAP key = {:#x}\n", map.key.0);
    }
}
