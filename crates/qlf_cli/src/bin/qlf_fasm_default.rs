//! `qlf_fasm_default`: writes a FASM file asserting the given features.

use clap::Parser;
use qlf_cli::args::DefaultArgs;
use std::process;

fn main() {
    let args = DefaultArgs::parse();
    if let Err(e) = qlf_cli::default::run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
