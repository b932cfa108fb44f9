/// EmberOS image build script.
///
/// Links the image at its fixed load address when building for the
/// EmberOS target. Host builds (unit tests) link normally.
fn main() {
    let target = std::env::var("TARGET").unwrap_or_default();
    if !target.contains("emberos") {
        return;
    }

    let dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_default();
    println!("cargo:rustc-link-arg-bins=-T{}/linker.ld", dir);
    println!("cargo:rerun-if-changed=linker.ld");
}
