use boot_info::ArchType;
use std::fmt::Write as _;
use std::{env, fs, path::PathBuf};

const PAGE_MASK: u64 = 0xfff;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap();
    let firmware_build = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "uefi");

    println!("cargo:rerun-if-env-changed=HVISOR_BIN");
    println!("cargo:rerun-if-env-changed=HVISOR_VMLINUX");

    let hvisor = payload("HVISOR_BIN", firmware_build);
    let vmlinux = if env::var_os("CARGO_FEATURE_VMLINUX").is_some() {
        payload("HVISOR_VMLINUX", firmware_build)
    } else {
        None
    };

    match ArchType::from_target_arch(&target_arch) {
        Some(arch) => check_layout(arch, file_len(hvisor.as_ref()), file_len(vmlinux.as_ref())),
        None => assert!(
            !firmware_build,
            "no platform layout for target architecture {target_arch}"
        ),
    }

    let mut source = String::from("// Generated by build.rs.\n");
    for (name, path) in [("HVISOR", &hvisor), ("VMLINUX", &vmlinux)] {
        match path {
            Some(path) => writeln!(
                source,
                "pub static {name}: &[u8] = include_bytes!({:?});",
                path.display().to_string()
            ),
            None => writeln!(source, "pub static {name}: &[u8] = &[];"),
        }
        .unwrap();
    }
    fs::write(out_dir.join("payloads.rs"), source).unwrap();
}

/// The file named by `var`; mandatory for firmware builds.
fn payload(var: &str, required: bool) -> Option<PathBuf> {
    let Some(path) = env::var_os(var).map(PathBuf::from) else {
        assert!(!required, "{var} must name the payload to embed");
        println!("cargo:warning={var} is not set, embedding an empty placeholder");
        return None;
    };
    assert!(path.is_file(), "{var}={} is not a file", path.display());
    println!("cargo:rerun-if-changed={}", path.display());
    Some(path)
}

fn file_len(path: Option<&PathBuf>) -> u64 {
    path.map_or(0, |p| fs::metadata(p).unwrap().len())
}

/// Sanity checks (fail fast during build).
fn check_layout(arch: ArchType, hvisor_len: u64, vmlinux_len: u64) {
    let layout = arch.layout();
    let hvisor = layout.hypervisor_load.as_u64();
    let kernel = layout.kernel_load.as_u64();

    assert_eq!(hvisor & PAGE_MASK, 0, "{arch}: hypervisor load address {hvisor:#x} must be 4 KiB aligned");
    assert_eq!(kernel & PAGE_MASK, 0, "{arch}: kernel load address {kernel:#x} must be 4 KiB aligned");

    let hvisor_end = hvisor + hvisor_len;
    let kernel_end = kernel + vmlinux_len;
    assert!(
        vmlinux_len == 0 || hvisor_end <= kernel || kernel_end <= hvisor,
        "{arch}: hypervisor [{hvisor:#x}, {hvisor_end:#x}) overlaps kernel [{kernel:#x}, {kernel_end:#x})"
    );
}
