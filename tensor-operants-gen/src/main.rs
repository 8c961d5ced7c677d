//! Tensor operants generator binary.
//!
//! Usage:
//!   tensor-operants-gen --api-yaml-path ops/ops.yaml --allow-list ops/tensor_operants.yaml
//!   tensor-operants-gen --api-yaml-path ops/ops.yaml --out-dir generated --check

use std::path::PathBuf;

use clap::Parser;

use tensor_operants_gen::{generate_from_files, GenConfig, GenError};

/// Generate the tensor operants sources from operation spec files.
#[derive(Parser, Debug)]
#[command(name = "tensor-operants-gen")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Operation spec files, processed in the order given
    #[arg(long = "api-yaml-path", value_name = "FILE", num_args = 1.., required = true)]
    api_yaml_paths: Vec<PathBuf>,

    /// Names of the operations to generate; every operation when omitted
    #[arg(long, value_name = "FILE")]
    allow_list: Option<PathBuf>,

    /// Directory receiving the generated files
    #[arg(long, value_name = "DIR", default_value = "generated")]
    out_dir: PathBuf,

    /// Module path of the kernels called by the backend
    #[arg(long, value_name = "PATH")]
    kernels_path: Option<String>,

    /// Broadcast scalar multiplication instead of calling the scale kernel
    #[arg(long)]
    no_scale_kernel: bool,

    /// Verify the files in the output directory are current and write nothing
    #[arg(long)]
    check: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = GenConfig::default();
    if let Some(path) = args.kernels_path {
        config.kernels_path = path;
    }
    config.scale_kernel = !args.no_scale_kernel;

    let artifacts = generate_from_files(&args.api_yaml_paths, args.allow_list.as_deref(), config)?;

    if args.check {
        match artifacts.check(&args.out_dir) {
            Ok(()) => Ok(()),
            Err(GenError::Stale(files)) => {
                for file in &files {
                    eprintln!("stale: {}", args.out_dir.join(file).display());
                }
                std::process::exit(1);
            }
            Err(e) => Err(e.into()),
        }
    } else {
        let written = artifacts.publish(&args.out_dir)?;
        println!("{} of 6 files written to {}", written.len(), args.out_dir.display());
        Ok(())
    }
}
