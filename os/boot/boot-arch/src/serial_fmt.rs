//! Best-effort formatted output to the bound platform UART.

use crate::SerialOps;
use core::fmt::{self, Write};

/// `fmt::Write` adapter over a platform UART. Line feeds become CR LF.
pub struct SerialSink<'a> {
    serial: &'a dyn SerialOps,
}

impl<'a> SerialSink<'a> {
    #[must_use]
    pub const fn new(serial: &'a dyn SerialOps) -> Self {
        Self { serial }
    }
}

impl Write for SerialSink<'_> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            if b == b'\n' {
                self.serial.put_char(b'\r').map_err(|_| fmt::Error)?;
            }
            self.serial.put_char(b).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}

#[doc(hidden)]
#[inline]
pub fn serial_write(args: fmt::Arguments) {
    let Ok(descriptor) = crate::active() else {
        return;
    };
    // Ignore errors; this is best-effort debug output.
    let _ = fmt::write(&mut SerialSink::new(descriptor.ops()), args);
}

/// Formatted output to the published platform UART, dropped silently while
/// nothing is published.
#[macro_export]
macro_rules! serial_trace {
    ($($arg:tt)*) => {{
        // No allocation: `format_args!` builds a lightweight `Arguments`.
        $crate::serial_fmt::serial_write(core::format_args!($($arg)*));
    }};
}
