//! Command-line arguments of the three tools.

use clap::{Parser, ValueEnum};
use qlf_bitstream::Layout;
use qlf_common::LogLevel;
use std::path::PathBuf;

/// Converts between FASM and binary bitstream images.
///
/// The direction follows the file extensions (`.fasm` to `.bit`, `.bin` or
/// `.hex` assembles, the reverse disassembles) unless `-a` or `-d` is given.
#[derive(Parser, Debug)]
#[command(name = "qlf_fasm", version)]
pub struct ConvertArgs {
    /// Input file (FASM or bitstream).
    pub input: PathBuf,

    /// Output file (FASM or bitstream).
    pub output: PathBuf,

    /// Binary bitstream layout [default: packed-binary].
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<LayoutArg>,

    /// Force FASM to bitstream conversion regardless of file extensions.
    #[arg(short, long, conflicts_with = "disassemble")]
    pub assemble: bool,

    /// Force bitstream to FASM conversion regardless of file extensions.
    #[arg(short, long)]
    pub disassemble: bool,

    /// FASM database root path.
    #[arg(long)]
    pub db_root: Option<PathBuf>,

    /// Device to select when the database root holds several.
    #[arg(long)]
    pub device: Option<String>,

    /// When disassembling, write cleared features as well.
    #[arg(long)]
    pub unset_features: bool,

    /// When disassembling, also write a `.force_bit` listing next to the output.
    #[arg(long)]
    pub force_bit: bool,

    /// Base image to assemble on top of, in the selected layout.
    #[arg(long)]
    pub base: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error) [default: warn].
    #[arg(long)]
    pub log_level: Option<LogLevel>,

    /// Path to a `qlf_fasm.toml` configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Builds a FASM feature database from a bitstream-definition description.
#[derive(Parser, Debug)]
#[command(name = "qlf_fasm_db_builder", version)]
pub struct BuildArgs {
    /// Bitstream-definition description (JSON).
    #[arg(long)]
    pub description: PathBuf,

    /// Database root; the database is written to `<db-root>/<device>/`.
    #[arg(long, default_value = "database")]
    pub db_root: PathBuf,

    /// Write the feature table as a binary artifact instead of text.
    #[arg(long)]
    pub binary: bool,

    /// Log level (trace, debug, info, warn, error) [default: warn].
    #[arg(long)]
    pub log_level: Option<LogLevel>,
}

/// Writes a FASM file setting the given features in every instance.
#[derive(Parser, Debug)]
#[command(name = "qlf_fasm_default", version)]
pub struct DefaultArgs {
    /// Comma-separated feature names; tile-relative names match every instance.
    #[arg(long)]
    pub features: String,

    /// FASM database root path.
    #[arg(long)]
    pub db_root: PathBuf,

    /// Device to select when the database root holds several.
    #[arg(long)]
    pub device: Option<String>,

    /// Output FASM file.
    #[arg(short, default_value = "default_bitstream.fasm")]
    pub output: PathBuf,

    /// Log level (trace, debug, info, warn, error) [default: warn].
    #[arg(long)]
    pub log_level: Option<LogLevel>,
}

/// Binary bitstream layout choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    /// One hex line per word.
    TextHex,
    /// Little-endian words.
    PackedBinary,
    /// One `0`/`1` character per bit.
    TextBits,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::TextHex => Layout::TextHex,
            LayoutArg::PackedBinary => Layout::PackedBinary,
            LayoutArg::TextBits => Layout::TextBits,
        }
    }
}
