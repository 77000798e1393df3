//! Synthetic PE images.

#![allow(dead_code)]

pub const LFANEW: usize = 0x40;
const FILE_ALIGN: usize = 0x200;
const FIRST_RAW: usize = 0x400;

pub struct SectionSpec {
    pub name: &'static [u8],
    pub virtual_address: u32,
    pub data: Vec<u8>,
    /// Overrides `SizeOfRawData`; the bytes written stay `data`.
    pub raw_size: Option<u32>,
    /// Overrides `VirtualSize`.
    pub virtual_size: Option<u32>,
}

impl SectionSpec {
    pub fn new(name: &'static [u8], virtual_address: u32, data: Vec<u8>) -> Self {
        Self {
            name,
            virtual_address,
            data,
            raw_size: None,
            virtual_size: None,
        }
    }
}

pub struct PeBuilder {
    pub magic: u16,
    pub entry_rva: u32,
    pub image_base: u64,
    pub relocations: Option<(u32, u32)>,
    pub sections: Vec<SectionSpec>,
}

impl PeBuilder {
    pub fn pe32_plus() -> Self {
        Self {
            magic: 0x20B,
            entry_rva: 0x1000,
            image_base: 0x1_4000_0000,
            relocations: None,
            sections: Vec::new(),
        }
    }

    pub fn pe32() -> Self {
        Self {
            magic: 0x10B,
            image_base: 0x0040_0000,
            ..Self::pe32_plus()
        }
    }

    pub fn section(mut self, spec: SectionSpec) -> Self {
        self.sections.push(spec);
        self
    }

    fn optional_header_size(&self) -> usize {
        if self.magic == 0x10B { 224 } else { 240 }
    }

    pub fn optional_header_offset() -> usize {
        LFANEW + 4 + 20
    }

    pub fn build(&self) -> Vec<u8> {
        let opt = Self::optional_header_offset();
        let opt_size = self.optional_header_size();
        let table = opt + opt_size;

        let mut raw_offsets = Vec::new();
        let mut next = FIRST_RAW;
        for s in &self.sections {
            raw_offsets.push(next);
            next += s.data.len().div_ceil(FILE_ALIGN).max(1) * FILE_ALIGN;
        }

        let mut image = vec![0u8; next];
        put16(&mut image, 0, 0x5A4D);
        put32(&mut image, 0x3C, LFANEW as u32);
        image[LFANEW..LFANEW + 4].copy_from_slice(b"PE\0\0");

        let fh = LFANEW + 4;
        put16(&mut image, fh, 0xAA64);
        put16(&mut image, fh + 2, self.sections.len() as u16);
        put16(&mut image, fh + 16, opt_size as u16);
        put16(&mut image, fh + 18, 0x0022);

        put16(&mut image, opt, self.magic);
        put32(&mut image, opt + 16, self.entry_rva);
        let (count_at, dirs_at) = if self.magic == 0x10B {
            put32(&mut image, opt + 28, self.image_base as u32);
            (opt + 92, opt + 96)
        } else {
            put64(&mut image, opt + 24, self.image_base);
            (opt + 108, opt + 112)
        };
        put32(&mut image, count_at, 16);
        if let Some((rva, size)) = self.relocations {
            put32(&mut image, dirs_at + 5 * 8, rva);
            put32(&mut image, dirs_at + 5 * 8 + 4, size);
        }

        for (i, (s, &raw)) in self.sections.iter().zip(&raw_offsets).enumerate() {
            let rec = table + i * 40;
            image[rec..rec + s.name.len()].copy_from_slice(s.name);
            put32(
                &mut image,
                rec + 8,
                s.virtual_size.unwrap_or(s.data.len() as u32),
            );
            put32(&mut image, rec + 12, s.virtual_address);
            put32(
                &mut image,
                rec + 16,
                s.raw_size.unwrap_or(s.data.len() as u32),
            );
            put32(&mut image, rec + 20, raw as u32);
            put32(&mut image, rec + 36, 0x6000_0020);
            image[raw..raw + s.data.len()].copy_from_slice(&s.data);
        }

        image
    }
}

pub fn pattern(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| seed.wrapping_add(i as u8)).collect()
}

fn put16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

fn put32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn put64(buf: &mut [u8], at: usize, v: u64) {
    buf[at..at + 8].copy_from_slice(&v.to_le_bytes());
}
