use crate::BootState;
use boot_acpi::WalkError;
use boot_arch::ArchError;
use boot_info::PayloadRole;
use boot_memory::{MemoryError, MemoryRegion};
use boot_pe::PeError;
use uefi::Status;

/// How a failure is handled.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorClass {
    /// Wrong build or platform configuration, found before firmware state changed.
    Configuration,
    /// The firmware (or the machine) did not behave as documented.
    FirmwareContract,
    /// A payload image is malformed.
    FormatValidation,
    /// Only the diagnostic dump is affected.
    DiagnosticOnly,
}

impl ErrorClass {
    /// Every class except [`ErrorClass::DiagnosticOnly`] ends the boot.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::DiagnosticOnly)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("no architecture descriptor is compiled in for this target")]
    UnsupportedArch,
    #[error("the {0} payload is empty")]
    MissingPayload(PayloadRole),
    #[error("{role} payload destination {destination} overlaps the loader image {loader}")]
    PayloadOverlapsLoader {
        role: PayloadRole,
        destination: MemoryRegion,
        loader: MemoryRegion,
    },
    #[error("payload destinations {hypervisor} and {kernel} overlap")]
    PayloadsOverlap {
        hypervisor: MemoryRegion,
        kernel: MemoryRegion,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FirmwareError {
    #[error("memory map probe returned {0:?} instead of BUFFER_TOO_SMALL")]
    UnexpectedProbe(Status),
    #[error("memory map probe succeeded with an empty buffer")]
    ProbeFilled,
    #[error("pool allocation of {size} bytes failed: {status:?}")]
    AllocationFailed { size: usize, status: Status },
    #[error("memory map query failed: {0:?}")]
    MapQueryFailed(Status),
    #[error("memory map needs {required} bytes, only {available} were reserved")]
    MapGrew { required: usize, available: usize },
    #[error("ExitBootServices failed: {0:?}")]
    ExitFailed(Status),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BootError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Firmware(#[from] FirmwareError),
    #[error(transparent)]
    Arch(ArchError),
    #[error("{role} payload: {source}")]
    Payload {
        role: PayloadRole,
        #[source]
        source: PeError,
    },
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error("refusing to clear {region}: overlaps protected {protected}")]
    UnsafeClear {
        region: MemoryRegion,
        protected: MemoryRegion,
    },
    #[error("firmware table walk: {0}")]
    Diagnostic(#[from] WalkError),
    #[error("{0:?} cannot be reached in the current state")]
    OutOfOrder(BootState),
}

impl From<ArchError> for BootError {
    fn from(value: ArchError) -> Self {
        match value {
            ArchError::UnsafeClear { region, protected } => Self::UnsafeClear { region, protected },
            ArchError::Memory(e) => Self::Memory(e),
            other => Self::Arch(other),
        }
    }
}

impl BootError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Config(_)
            | Self::UnsafeClear { .. }
            | Self::OutOfOrder(_)
            | Self::Arch(
                ArchError::Unbound | ArchError::AlreadyBound { .. } | ArchError::ForeignTarget(_),
            ) => ErrorClass::Configuration,
            Self::Firmware(_) | Self::Memory(_) | Self::Arch(_) => ErrorClass::FirmwareContract,
            Self::Payload { .. } => ErrorClass::FormatValidation,
            Self::Diagnostic(_) => ErrorClass::DiagnosticOnly,
        }
    }
}

impl From<BootError> for Status {
    fn from(value: BootError) -> Self {
        match value {
            BootError::Config(ConfigError::MissingPayload(_)) | BootError::Diagnostic(_) => {
                Self::NOT_FOUND
            }
            BootError::Config(_) | BootError::Arch(_) | BootError::OutOfOrder(_) => {
                Self::UNSUPPORTED
            }
            BootError::Firmware(
                FirmwareError::UnexpectedProbe(status)
                | FirmwareError::MapQueryFailed(status)
                | FirmwareError::ExitFailed(status),
            ) => status,
            BootError::Firmware(FirmwareError::AllocationFailed { .. }) => Self::OUT_OF_RESOURCES,
            BootError::Firmware(FirmwareError::ProbeFilled | FirmwareError::MapGrew { .. }) => {
                Self::BUFFER_TOO_SMALL
            }
            BootError::Payload { .. } => Self::LOAD_ERROR,
            BootError::Memory(MemoryError::Unmapped { .. }) => Self::NO_MAPPING,
            BootError::Memory(MemoryError::Mismatch { .. }) => Self::DEVICE_ERROR,
            BootError::UnsafeClear { .. } => Self::ACCESS_DENIED,
        }
    }
}
