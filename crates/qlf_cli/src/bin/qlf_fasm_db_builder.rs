//! `qlf_fasm_db_builder`: builds a feature database from a description.

use clap::Parser;
use qlf_cli::args::BuildArgs;
use std::process;

fn main() {
    let args = BuildArgs::parse();
    if let Err(e) = qlf_cli::build::run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
