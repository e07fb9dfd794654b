//! `qlf_fasm`: converts between FASM and bitstream images.

use clap::Parser;
use qlf_cli::args::ConvertArgs;
use std::process;

fn main() {
    let args = ConvertArgs::parse();
    if let Err(e) = qlf_cli::convert::run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
