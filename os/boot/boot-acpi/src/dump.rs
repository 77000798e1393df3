use core::fmt;

/// Uppercase hex dump, 32 bytes per line, each line terminated with `"\n\r"`.
///
/// A trailing partial line is terminated as well; an empty input prints nothing.
///
/// ```rust
/// # use boot_acpi::AmlHexDump;
/// let dump = AmlHexDump::new(&[0x44, 0x53, 0x44, 0x54, 0xAB]).to_string();
/// assert_eq!(dump, "44534454AB\n\r");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AmlHexDump<'a> {
    bytes: &'a [u8],
}

impl<'a> AmlHexDump<'a> {
    pub const BYTES_PER_LINE: usize = 32;

    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl fmt::Display for AmlHexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.bytes.chunks(Self::BYTES_PER_LINE) {
            for b in line {
                write!(f, "{b:02X}")?;
            }
            f.write_str("\n\r")?;
        }
        Ok(())
    }
}
