use boot_arch::ArchDescriptor;
use boot_info::{OptionalPolicy, Payload, PayloadFormat, PayloadRole};
use boot_memory::PhysicalAddress;

/// What to boot, decided at build time.
#[derive(Debug, Copy, Clone)]
pub struct BootConfig {
    /// `None` when no platform is compiled in for the target.
    pub descriptor: Option<&'static ArchDescriptor>,
    pub hypervisor: Payload,
    pub kernel: Option<Payload>,
    pub kernel_policy: OptionalPolicy,
    /// Run the firmware table walk before terminating boot services.
    pub diagnostic_dump: bool,
}

impl BootConfig {
    /// A raw hypervisor image headed to the platform's hypervisor load address.
    #[must_use]
    pub fn new(descriptor: Option<&'static ArchDescriptor>, hypervisor: &'static [u8]) -> Self {
        let load = descriptor.map_or(PhysicalAddress::zero(), |d| d.layout().hypervisor_load);
        Self {
            descriptor,
            hypervisor: Payload::new(PayloadRole::Hypervisor, hypervisor, load, PayloadFormat::Raw),
            kernel: None,
            kernel_policy: OptionalPolicy::default(),
            diagnostic_dump: true,
        }
    }

    /// Add the companion kernel, headed to the platform's kernel load address.
    #[must_use]
    pub fn with_kernel(mut self, bytes: &'static [u8], format: PayloadFormat) -> Self {
        let load = self
            .descriptor
            .map_or(PhysicalAddress::zero(), |d| d.layout().kernel_load);
        self.kernel = Some(Payload::new(PayloadRole::Kernel, bytes, load, format));
        self
    }

    #[must_use]
    pub const fn with_kernel_policy(mut self, policy: OptionalPolicy) -> Self {
        self.kernel_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_diagnostic_dump(mut self, enabled: bool) -> Self {
        self.diagnostic_dump = enabled;
        self
    }
}
