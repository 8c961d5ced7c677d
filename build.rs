// build.rs

use std::env;
use std::path::PathBuf;

use tensor_operants_gen::{generate_from_files, GenConfig};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let spec = manifest_dir.join("ops/ops.yaml");
    let allow_list = manifest_dir.join("ops/tensor_operants.yaml");
    println!("cargo:rerun-if-changed={}", spec.display());
    println!("cargo:rerun-if-changed={}", allow_list.display());

    let artifacts = match generate_from_files(&[&spec], Some(allow_list.as_path()), GenConfig::default()) {
        Ok(artifacts) => artifacts,
        Err(e) => panic!("failed to generate tensor operants: {e}"),
    };
    artifacts
        .publish(&out_dir)
        .expect("Failed to write generated tensor operants");
}
