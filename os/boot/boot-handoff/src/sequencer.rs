//! # Hand-off Sequencer
//!
//! ```text
//! Detect → EarlyArchInit → GeneralArchInit → DiagnosticDump → AcquireMemoryMap
//!   → TerminateFirmwareServices → CopyPayloads → ArchPreJumpFixup → Transfer
//! ```
//!
//! Each call to [`Sequencer::step`] performs exactly one state. There are no
//! retries: the first error ends the boot, except in `DiagnosticDump` where
//! failures are only logged.

use crate::firmware::Firmware;
use crate::memory_map::{self, MapBuffer};
use crate::trace::trace_handoff;
use crate::{BootConfig, BootContext, BootError, ConfigError, ErrorClass};
use boot_acpi::{AmlHexDump, locate_device_tree, select_root_entry};
use boot_arch::{ArchDescriptor, ClearPhase, clear_memory_regions, halt, serial_trace};
use boot_info::{OptionalPolicy, Payload, PayloadFormat, PayloadRole};
use boot_memory::{MemoryRegion, PhysMapRw, PhysicalAddress, copy_bytes};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum BootState {
    Detect,
    EarlyArchInit,
    GeneralArchInit,
    DiagnosticDump,
    AcquireMemoryMap,
    TerminateFirmwareServices,
    CopyPayloads,
    ArchPreJumpFixup,
    /// Terminal: only [`Sequencer::transfer`] is left.
    Transfer,
}

impl BootState {
    const fn next(self) -> Self {
        match self {
            Self::Detect => Self::EarlyArchInit,
            Self::EarlyArchInit => Self::GeneralArchInit,
            Self::GeneralArchInit => Self::DiagnosticDump,
            Self::DiagnosticDump => Self::AcquireMemoryMap,
            Self::AcquireMemoryMap => Self::TerminateFirmwareServices,
            Self::TerminateFirmwareServices => Self::CopyPayloads,
            Self::CopyPayloads => Self::ArchPreJumpFixup,
            Self::ArchPreJumpFixup | Self::Transfer => Self::Transfer,
        }
    }

    /// Boot services are gone once this state has run.
    #[must_use]
    pub const fn firmware_terminated(self) -> bool {
        matches!(
            self,
            Self::CopyPayloads | Self::ArchPreJumpFixup | Self::Transfer
        )
    }
}

/// Loader image, payload sources and (for cleanup) payload destinations.
const MAX_PROTECTED: usize = 5;

pub struct Sequencer<F, M> {
    firmware: F,
    memory: M,
    config: BootConfig,
    state: BootState,
    context: BootContext,
    map_buffer: Option<MapBuffer>,
}

impl<F: Firmware, M: PhysMapRw> Sequencer<F, M> {
    pub fn new(firmware: F, memory: M, config: BootConfig) -> Self {
        Self {
            firmware,
            memory,
            config,
            state: BootState::Detect,
            context: BootContext::default(),
            map_buffer: None,
        }
    }

    /// The state the next [`step`](Self::step) will run.
    #[must_use]
    pub const fn state(&self) -> BootState {
        self.state
    }

    #[must_use]
    pub const fn context(&self) -> &BootContext {
        &self.context
    }

    #[must_use]
    pub const fn firmware(&self) -> &F {
        &self.firmware
    }

    #[must_use]
    pub const fn memory(&self) -> &M {
        &self.memory
    }

    /// Run the current state and advance; returns the new state.
    ///
    /// # Errors
    /// The error of the current state. The state does not advance.
    ///
    /// # Safety
    /// `CopyPayloads` and `ArchPreJumpFixup` write to the physical addresses
    /// named by the platform layout through `M`.
    pub unsafe fn step(&mut self) -> Result<BootState, BootError> {
        log::debug!("Boot state: {:?}", self.state);
        match self.state {
            BootState::Detect => self.detect()?,
            BootState::EarlyArchInit => self.descriptor()?.ops().early_init()?,
            BootState::GeneralArchInit => self.general_init()?,
            BootState::DiagnosticDump => self.diagnostic_dump(),
            BootState::AcquireMemoryMap => self.acquire_memory_map()?,
            BootState::TerminateFirmwareServices => self.terminate_firmware_services()?,
            BootState::CopyPayloads => unsafe { self.copy_payloads() }?,
            BootState::ArchPreJumpFixup => unsafe { self.pre_jump_fixup() }?,
            BootState::Transfer => return Err(BootError::OutOfOrder(BootState::Transfer)),
        }
        self.state = self.state.next();
        Ok(self.state)
    }

    /// Step until only the transfer is left.
    ///
    /// # Errors
    /// The first error of any state.
    ///
    /// # Safety
    /// See [`step`](Self::step).
    pub unsafe fn run_until_transfer(&mut self) -> Result<&BootContext, BootError> {
        while self.state != BootState::Transfer {
            unsafe { self.step() }?;
        }
        Ok(&self.context)
    }

    /// Jump to the hypervisor entry point. Never returns.
    ///
    /// Halts if called before the sequence reached [`BootState::Transfer`].
    ///
    /// # Safety
    /// The hypervisor image must have been placed by this sequencer.
    pub unsafe fn transfer(self) -> ! {
        let (descriptor, entry) = match (self.state, self.descriptor(), self.context.entry) {
            (BootState::Transfer, Ok(descriptor), Some(entry)) => (descriptor, entry),
            (state, ..) => fail(&BootError::OutOfOrder(state)),
        };

        let params = self.context.handoff_params();
        trace_handoff(descriptor, entry, &params, self.context.memory_map.as_ref());
        log::info!("Jumping to the hypervisor at {entry}");

        unsafe {
            descriptor
                .ops()
                .transfer(entry, descriptor.convention(), &params)
        }
    }

    /// Run the whole sequence. Never returns; any fatal error halts the CPU.
    ///
    /// # Safety
    /// See [`step`](Self::step) and [`transfer`](Self::transfer).
    pub unsafe fn run(mut self) -> ! {
        match unsafe { self.run_until_transfer() } {
            Ok(_) => unsafe { self.transfer() },
            Err(e) => fail(&e),
        }
    }

    fn descriptor(&self) -> Result<&'static ArchDescriptor, BootError> {
        self.context
            .descriptor
            .ok_or(BootError::OutOfOrder(self.state))
    }

    fn detect(&mut self) -> Result<(), BootError> {
        let descriptor = self.config.descriptor.ok_or(ConfigError::UnsupportedArch)?;
        boot_arch::publish(descriptor)?;

        self.context.descriptor = Some(descriptor);
        self.context.loader_image = self.firmware.loader_image();
        self.context.system_table = self.firmware.system_table_address();
        log::info!(
            "Detected {}, loader image at {}",
            descriptor.name(),
            self.context.loader_image
        );

        self.validate_payloads()
    }

    fn validate_payloads(&mut self) -> Result<(), BootError> {
        if self.config.hypervisor.is_empty() {
            return Err(ConfigError::MissingPayload(PayloadRole::Hypervisor).into());
        }

        if let Some(kernel) = self.config.kernel
            && kernel.is_empty()
        {
            match self.config.kernel_policy {
                OptionalPolicy::Require => {
                    return Err(ConfigError::MissingPayload(PayloadRole::Kernel).into());
                }
                OptionalPolicy::Skip => {
                    log::warn!("Kernel payload is empty; booting without it");
                    self.config.kernel = None;
                }
            }
        }

        let ops = self.descriptor()?.ops();
        let aliases =
            |a: MemoryRegion, b: MemoryRegion| ops.to_physical(a).overlaps(&ops.to_physical(b));

        let loader = self.context.loader_image;
        for payload in self.payloads() {
            let destination = footprint(&payload);
            if aliases(destination, loader) {
                return Err(ConfigError::PayloadOverlapsLoader {
                    role: payload.role,
                    destination,
                    loader,
                }
                .into());
            }
        }

        if let Some(kernel) = self.config.kernel {
            let hypervisor = footprint(&self.config.hypervisor);
            let kernel = footprint(&kernel);
            if aliases(hypervisor, kernel) {
                return Err(ConfigError::PayloadsOverlap { hypervisor, kernel }.into());
            }
        }

        Ok(())
    }

    fn general_init(&self) -> Result<(), BootError> {
        let descriptor = self.descriptor()?;
        let ops = descriptor.ops();
        ops.init()?;
        ops.memory_init()?;
        ops.setup_direct_mapping()?;
        ops.serial_init()?;

        serial_trace!("\n[INFO] {} platform initialised\n", descriptor.name());
        self.log_overview(descriptor);
        Ok(())
    }

    fn log_overview(&self, descriptor: &ArchDescriptor) {
        log::info!("========================================================");
        log::info!("hvisor UEFI loader, target arch: {}", descriptor.name());
        for payload in self.payloads() {
            log::info!(
                "{} embedded {} -> load {} ({:?})",
                payload.role,
                payload.source(),
                payload.destination(),
                payload.format
            );
        }
        log::info!("system table: {:#x}", self.context.system_table);
        for entry in self.firmware.config_tables() {
            log::info!("config table {:?} at {}", entry.kind, entry.address);
        }
        log::info!("========================================================");
    }

    fn diagnostic_dump(&mut self) {
        let entries = self.firmware.config_tables();
        self.context.context_pointer = locate_device_tree(entries)
            .or_else(|| select_root_entry(entries).map(|e| e.address))
            .map_or(0, PhysicalAddress::as_u64);

        if !self.config.diagnostic_dump {
            log::debug!("Firmware table dump disabled");
            return;
        }

        // SAFETY: the firmware tables are identity-mapped and read-only.
        match unsafe { boot_acpi::walk(&self.memory, entries) } {
            Ok(report) => {
                log::info!("Dumping AML code to UART");
                serial_trace!("{}", AmlHexDump::new(report.payload.table.bytes));
            }
            Err(e) => {
                let e = BootError::from(e);
                debug_assert_eq!(e.class(), ErrorClass::DiagnosticOnly);
                log::warn!("{e}; skipping the dump");
            }
        }
    }

    fn acquire_memory_map(&mut self) -> Result<(), BootError> {
        let ops = self.descriptor()?.ops();
        ops.before_exit_boot_services(&self.firmware)?;

        let cpu = ops.get_boot_cpu_id(&self.firmware)?;
        log::info!("Boot CPU id: {cpu}");
        self.context.boot_cpu = Some(cpu);

        self.map_buffer = Some(memory_map::probe_and_allocate(&mut self.firmware)?);
        Ok(())
    }

    fn terminate_firmware_services(&mut self) -> Result<(), BootError> {
        let buffer = self
            .map_buffer
            .take()
            .ok_or(BootError::OutOfOrder(self.state))?;

        log::info!("Exiting boot services ...");
        self.firmware.quiesce();
        let map = memory_map::fill_and_exit(&mut self.firmware, buffer)?;
        log::info!(
            "Boot services exited with {} descriptors, we're now flying by instruments.",
            map.descriptor_count()
        );

        self.context.memory_map = Some(map);
        Ok(())
    }

    unsafe fn copy_payloads(&mut self) -> Result<(), BootError> {
        self.context.bytes_cleared += unsafe { self.clear(ClearPhase::Preparation) }?;

        let hypervisor = self.config.hypervisor;
        let entry = unsafe { self.place(&hypervisor) }?;
        self.context.entry = Some(entry);

        if let Some(kernel) = self.config.kernel {
            match unsafe { self.place(&kernel) } {
                Ok(entry) => self.context.kernel_entry = Some(entry),
                Err(e @ BootError::Payload { .. })
                    if self.config.kernel_policy == OptionalPolicy::Skip =>
                {
                    log::warn!("{e}; booting without the kernel");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    unsafe fn place(&mut self, payload: &Payload) -> Result<PhysicalAddress, BootError> {
        log::info!(
            "Copying {} ({} bytes) {} -> {}",
            payload.role,
            payload.bytes.len(),
            payload.source(),
            payload.load
        );

        match payload.format {
            PayloadFormat::Raw => {
                unsafe { copy_bytes(&mut self.memory, payload.load, payload.bytes) }?;
                Ok(payload.load)
            }
            PayloadFormat::Pe => {
                let loaded = unsafe {
                    boot_pe::parse_and_load(payload.bytes, payload.load.as_u64(), &mut self.memory)
                }
                .map_err(|source| BootError::Payload {
                    role: payload.role,
                    source,
                })?;
                Ok(loaded.entry)
            }
        }
    }

    unsafe fn pre_jump_fixup(&mut self) -> Result<(), BootError> {
        self.context.bytes_cleared += unsafe { self.clear(ClearPhase::Cleanup) }?;
        self.descriptor()?.ops().pre_jump_fixup()?;
        log::info!("Ok, ready to jump to hvisor entry...");
        Ok(())
    }

    unsafe fn clear(&mut self, phase: ClearPhase) -> Result<u64, BootError> {
        let descriptor = self.descriptor()?;
        let protected = self.protected(phase);
        Ok(unsafe { clear_memory_regions(descriptor, phase, &mut self.memory, &protected) }?)
    }

    fn protected(&self, phase: ClearPhase) -> [MemoryRegion; MAX_PROTECTED] {
        let mut protected = [MemoryRegion::default(); MAX_PROTECTED];
        protected[0] = self.context.loader_image;
        for (i, payload) in self.payloads().enumerate() {
            protected[1 + i] = payload.source();
            if phase == ClearPhase::Cleanup {
                protected[3 + i] = footprint(&payload);
            }
        }
        protected
    }

    fn payloads(&self) -> impl Iterator<Item = Payload> + use<F, M> {
        core::iter::once(self.config.hypervisor).chain(self.config.kernel)
    }
}

/// Everything placing `payload` may write, starting at its load address.
///
/// A PE image spans its furthest section; one that does not parse is
/// measured by its raw length and refused again when it is placed.
fn footprint(payload: &Payload) -> MemoryRegion {
    let len = match payload.format {
        PayloadFormat::Raw => None,
        PayloadFormat::Pe => boot_pe::PeImage::parse(payload.bytes)
            .ok()
            .map(|image| image.footprint()),
    };
    len.map_or_else(
        || payload.destination(),
        |len| MemoryRegion::from_address(payload.load, len),
    )
}

/// Log a fatal error and spin forever.
fn fail(error: &BootError) -> ! {
    log::error!("Boot failed ({:?}): {error}", error.class());
    serial_trace!("[ERROR] boot failed: {error}\n");
    halt()
}
