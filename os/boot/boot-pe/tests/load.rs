mod common;

use boot_memory::sim::SimulatedMemory;
use boot_memory::{MemoryError, PhysicalAddress};
use boot_pe::{OptionalHeaderKind, PeError, PeImage, parse_and_load};
use common::{LFANEW, PeBuilder, SectionSpec, pattern};

const WINDOW: u64 = 0x4000_0000;

fn window() -> SimulatedMemory {
    SimulatedMemory::new().with_window(WINDOW, 0x10000)
}

fn three_sections() -> PeBuilder {
    PeBuilder::pe32_plus()
        .section(SectionSpec::new(b".text", 0x1000, pattern(0x10, 0x300)))
        .section(SectionSpec::new(b".rdata", 0x2000, pattern(0x80, 0x45)))
        .section(SectionSpec::new(b".data", 0x3000, pattern(0xC0, 0x200)))
}

#[test]
fn sections_land_at_window_plus_virtual_address() {
    let builder = three_sections();
    let image = builder.build();
    let mut mem = window();

    let loaded = unsafe { parse_and_load(&image, WINDOW, &mut mem) }.unwrap();

    assert_eq!(loaded.entry, PhysicalAddress::new(WINDOW + 0x1000));
    assert_eq!(loaded.load_base, PhysicalAddress::new(WINDOW));
    assert_eq!(loaded.image_base, 0x1_4000_0000);
    assert_eq!(loaded.kind, OptionalHeaderKind::Pe32Plus);
    assert_eq!(loaded.sections, 3);
    assert_eq!(loaded.bytes_copied, 0x300 + 0x45 + 0x200);

    for s in &builder.sections {
        let at = WINDOW + u64::from(s.virtual_address);
        assert_eq!(mem.read(at, s.data.len()), s.data);
    }
    // Nothing between sections is touched.
    assert_eq!(mem.read(WINDOW + 0x2045, 0x10), vec![0u8; 0x10]);
}

#[test]
fn entry_is_relative_to_load_window_not_image_base() {
    let mut builder = three_sections();
    builder.entry_rva = 0x1234;
    let image = builder.build();
    let mut mem = window();

    let loaded = unsafe { parse_and_load(&image, WINDOW, &mut mem) }.unwrap();
    assert_eq!(loaded.entry.as_u64(), WINDOW + 0x1234);
}

#[test]
fn pe32_images_load() {
    let builder = PeBuilder::pe32().section(SectionSpec::new(b".text", 0x1000, pattern(1, 0x40)));
    let image = builder.build();
    let mut mem = window();

    let loaded = unsafe { parse_and_load(&image, WINDOW, &mut mem) }.unwrap();
    assert_eq!(loaded.kind, OptionalHeaderKind::Pe32);
    assert_eq!(loaded.image_base, 0x0040_0000);
    assert_eq!(mem.read(WINDOW + 0x1000, 0x40), pattern(1, 0x40));
}

#[test]
fn missing_dos_magic_is_rejected() {
    let mut image = three_sections().build();
    image[0] = b'Z';
    let err = unsafe { parse_and_load(&image, WINDOW, &mut window()) }.unwrap_err();
    assert_eq!(err, PeError::BadDosHeader);
}

#[test]
fn wrong_nt_signature_is_rejected() {
    let mut image = three_sections().build();
    image[LFANEW + 1] = b'X';
    let err = unsafe { parse_and_load(&image, WINDOW, &mut window()) }.unwrap_err();
    assert_eq!(err, PeError::BadNtHeader { offset: LFANEW });
}

#[test]
fn lfanew_beyond_image_is_a_bad_nt_header() {
    let mut image = three_sections().build();
    image[0x3C..0x40].copy_from_slice(&0x00FF_0000u32.to_le_bytes());
    let err = unsafe { parse_and_load(&image, WINDOW, &mut window()) }.unwrap_err();
    assert_eq!(err, PeError::BadNtHeader { offset: 0x00FF_0000 });
}

#[test]
fn unknown_optional_header_magic_is_rejected() {
    let mut builder = three_sections();
    builder.magic = 0x107;
    let image = builder.build();
    let err = unsafe { parse_and_load(&image, WINDOW, &mut window()) }.unwrap_err();
    assert_eq!(err, PeError::BadOptionalHeader { magic: 0x107 });
}

#[test]
fn truncated_file_header_is_reported() {
    let image = three_sections().build();
    let err = unsafe { parse_and_load(&image[..0x50], WINDOW, &mut window()) }.unwrap_err();
    assert_eq!(
        err,
        PeError::Truncated {
            what: "file header",
            offset: LFANEW + 4
        }
    );
}

#[test]
fn out_of_range_section_stops_the_copy() {
    let mut builder = three_sections();
    builder.sections[1].raw_size = Some(0x10_0000);
    let image = builder.build();
    let mut mem = window();

    let err = unsafe { parse_and_load(&image, WINDOW, &mut mem) }.unwrap_err();
    match err {
        PeError::SectionOutOfRange {
            index, image_len, ..
        } => {
            assert_eq!(index, 1);
            assert_eq!(image_len, image.len());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(mem.read(WINDOW + 0x1000, 0x300), builder.sections[0].data);
    assert_eq!(mem.read(WINDOW + 0x2000, 0x45), vec![0u8; 0x45]);
    assert_eq!(mem.read(WINDOW + 0x3000, 0x200), vec![0u8; 0x200]);
}

#[test]
fn base_relocations_are_refused() {
    let mut builder = three_sections();
    builder.relocations = Some((0x5000, 0x0C));
    let image = builder.build();
    let mut mem = window();

    let err = unsafe { parse_and_load(&image, WINDOW, &mut mem) }.unwrap_err();
    assert_eq!(
        err,
        PeError::RelocationsPresent {
            rva: 0x5000,
            size: 0x0C
        }
    );
    assert_eq!(mem.read(WINDOW + 0x1000, 0x10), vec![0u8; 0x10]);
}

#[test]
fn empty_relocation_directory_is_accepted() {
    let mut builder = three_sections();
    builder.relocations = Some((0x5000, 0));
    let image = builder.build();
    assert!(unsafe { parse_and_load(&image, WINDOW, &mut window()) }.is_ok());
}

#[test]
fn unmapped_destination_is_a_destination_error() {
    let image = three_sections().build();
    let mut mem = SimulatedMemory::new().with_window(WINDOW, 0x2000);

    let err = unsafe { parse_and_load(&image, WINDOW, &mut mem) }.unwrap_err();
    assert_eq!(
        err,
        PeError::Destination(MemoryError::Unmapped {
            address: PhysicalAddress::new(WINDOW + 0x2000),
            len: 0x45,
        })
    );
}

#[test]
fn section_table_follows_the_optional_header() {
    let image = three_sections().build();
    let pe = PeImage::parse(&image).unwrap();

    assert_eq!(
        pe.section_table_offset(),
        PeBuilder::optional_header_offset() + 240
    );
    let names: Vec<String> = pe
        .sections()
        .map(|s| s.unwrap().header.name().to_string())
        .collect();
    assert_eq!(names, [".text", ".rdata", ".data"]);
}

#[test]
fn truncated_section_table_is_reported() {
    let image = three_sections().build();
    let table = PeBuilder::optional_header_offset() + 240;
    let short = &image[..table + 40 + 8];
    let pe = PeImage::parse(short).unwrap();

    let results: Vec<_> = pe.sections().collect();
    assert!(results[0].is_ok());
    assert_eq!(
        results[1].as_ref().unwrap_err(),
        &PeError::Truncated {
            what: "section header",
            offset: table + 40
        }
    );
}

#[test]
fn footprint_reaches_the_end_of_the_largest_section() {
    let mut bss = SectionSpec::new(b".bss", 0x4000, pattern(0, 0x10));
    bss.virtual_size = Some(0x8000);
    let image = three_sections().section(bss).build();
    let pe = PeImage::parse(&image).unwrap();

    assert_eq!(pe.footprint(), 0xC000);
    assert_eq!(PeImage::parse(&three_sections().build()).unwrap().footprint(), 0x3200);
}

#[test]
fn footprint_stops_at_an_unreadable_section_record() {
    let image = three_sections().build();
    let table = PeBuilder::optional_header_offset() + 240;
    let pe = PeImage::parse(&image[..table + 40 + 8]).unwrap();
    assert_eq!(pe.footprint(), 0x1300);
}
