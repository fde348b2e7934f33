/// Generates `include/quibble_rs.h` from the exported Rust types.
///
/// The header covers this crate (`quibble_rs_init`) and every `extern "C"`
/// item in `quibble-config`, so the loader's view of `QuibbleOptions`,
/// `OperatingSystem` and `QuibbleStatus` always matches the Rust layout.
use std::env;
use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);

    println!("cargo:rerun-if-changed=cbindgen.toml");
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=../config/src");

    let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml"))?;
    cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()?
        .write_to_file(crate_dir.join("include/quibble_rs.h"));

    Ok(())
}
