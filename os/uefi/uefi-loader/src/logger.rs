use boot_arch::serial_trace;
use core::sync::atomic::{AtomicBool, Ordering};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

static LOGGER: BootLogger = BootLogger {
    console: AtomicBool::new(true),
};

/// Mirrors every record to the platform UART and, while boot services
/// last, to the firmware console.
pub struct BootLogger {
    console: AtomicBool,
}

impl BootLogger {
    /// Call this once during early init.
    #[allow(clippy::missing_errors_doc)]
    pub fn init(max_level: LevelFilter) -> Result<&'static Self, SetLoggerError> {
        log::set_logger(&LOGGER)?;
        log::set_max_level(max_level);
        Ok(&LOGGER)
    }

    /// Stop touching the firmware console. Must run before `ExitBootServices`.
    pub fn exit_boot_services(&self) {
        self.console.store(false, Ordering::Release);
    }
}

impl Log for BootLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Silently dropped until the platform serial is published.
        serial_trace!(
            "[{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        );

        if self.console.load(Ordering::Acquire) {
            uefi::println!(
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}
