//! Build script for the cmdlint CLI binary.
//!
//! Embeds `data/catalog.json` into the binary so that `cmdlint lint` works
//! out of the box with no `--catalog` flag.
//!
//! If the file is missing the binary is built without a catalog; `lint` and
//! `rules` then require `--catalog <PATH>` at runtime.

use std::path::Path;

fn main() {
    // Declare the custom cfg so cargo check-cfg doesn't warn.
    println!("cargo::rustc-check-cfg=cfg(has_embedded_catalog)");

    let catalog = Path::new("data/catalog.json");
    println!("cargo:rerun-if-changed=data/catalog.json");
    if !catalog.exists() {
        return;
    }

    println!("cargo:rustc-cfg=has_embedded_catalog");

    // Copy into OUT_DIR so include_str! has a stable, absolute path.
    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR not set");
    let dest = Path::new(&out_dir).join("catalog.json");
    std::fs::copy(catalog, &dest).expect("failed to copy catalog.json to OUT_DIR");
}
