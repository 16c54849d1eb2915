fn main() {
    // The linker script only applies to the bare-metal image. Host builds
    // (unit tests) link normally.
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "none" {
        let manifest_dir = env!("CARGO_MANIFEST_DIR");
        println!("cargo:rustc-link-arg=-T{manifest_dir}/linker.ld");
        println!("cargo:rerun-if-changed=linker.ld");
    }
}
