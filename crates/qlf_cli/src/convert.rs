//! `qlf_fasm`: FASM to bitstream and back.
//!
//! 1. Load the configuration and set up logging
//! 2. Resolve options (flags over configuration)
//! 3. Pick the direction from the flags or file extensions
//! 4. Load the device database
//! 5. Convert in memory and write the output files last

use crate::args::ConvertArgs;
use crate::error::CliError;
use crate::log_level;
use qlf_asm::{Assembler, Disassembler};
use qlf_bitstream::{BitstreamImage, Layout};
use qlf_config::ToolConfig;
use qlf_db::{DatabaseRoot, FeatureDatabase};
use qlf_fasm::{parse_assignments, write_fasm, write_force_bit};
use std::path::{Path, PathBuf};
use tracing::info;

/// Extensions recognized as binary bitstream images.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["bit", "bin", "hex"];

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// FASM to bitstream.
    Assemble,
    /// Bitstream to FASM.
    Disassemble,
}

/// Settings of one conversion after merging flags and configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Database root.
    pub db_root: PathBuf,
    /// Device under the root, if selected.
    pub device: Option<String>,
    /// Binary image layout.
    pub layout: Layout,
    /// Emit zero-valued features when disassembling.
    pub unset_features: bool,
    /// Write a force-bit listing when disassembling.
    pub force_bit: bool,
    /// Explicit base image for assembly.
    pub base: Option<PathBuf>,
}

impl ConvertOptions {
    /// Merges command-line flags over the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Usage`] when neither names a database root.
    pub fn resolve(args: &ConvertArgs, config: &ToolConfig) -> Result<Self, CliError> {
        let convert = &config.convert;
        let db_root = args
            .db_root
            .clone()
            .or_else(|| convert.db_root.clone())
            .ok_or_else(|| {
                CliError::Usage("no database root given; pass --db-root or set convert.db_root".to_string())
            })?;
        Ok(Self {
            db_root,
            device: args.device.clone().or_else(|| convert.device.clone()),
            layout: args
                .format
                .map(Layout::from)
                .or(convert.layout)
                .unwrap_or_default(),
            unset_features: args.unset_features || convert.unset_features,
            force_bit: args.force_bit || convert.force_bit,
            base: args.base.clone(),
        })
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Picks the conversion direction.
///
/// `-a`/`-d` win; otherwise `.fasm` to an image extension assembles and an
/// image extension to `.fasm` disassembles. Extensions compare
/// case-insensitively.
///
/// # Errors
///
/// Returns [`CliError::Usage`] when the extensions name no known conversion.
pub fn infer_direction(
    input: &Path,
    output: &Path,
    assemble: bool,
    disassemble: bool,
) -> Result<Direction, CliError> {
    if assemble && disassemble {
        return Err(CliError::Usage("specify either -a or -d, not both".to_string()));
    }
    if assemble {
        return Ok(Direction::Assemble);
    }
    if disassemble {
        return Ok(Direction::Disassemble);
    }

    let (inp, out) = (extension(input), extension(output));
    let is_image = |ext: &str| IMAGE_EXTENSIONS.contains(&ext);
    if inp == "fasm" && is_image(&out) {
        Ok(Direction::Assemble)
    } else if out == "fasm" && is_image(&inp) {
        Ok(Direction::Disassemble)
    } else {
        Err(CliError::Usage(format!(
            "no known conversion between '.{inp}' and '.{out}'; use -a or -d"
        )))
    }
}

/// Returns the force-bit listing path for a FASM output path.
pub fn force_bit_path(output: &Path) -> PathBuf {
    output.with_extension("force_bit")
}

/// Runs the `qlf_fasm` command.
///
/// # Errors
///
/// Any [`CliError`]; no output file is written when one is returned.
pub fn run(args: &ConvertArgs) -> Result<(), CliError> {
    let cwd = std::env::current_dir().map_err(|e| CliError::io(".", e))?;
    let config = qlf_config::discover_config(args.config.as_deref(), &cwd)?;
    qlf_common::logging::init(log_level(args.log_level, &config));

    let options = ConvertOptions::resolve(args, &config)?;
    let direction = infer_direction(&args.input, &args.output, args.assemble, args.disassemble)?;
    convert(&args.input, &args.output, direction, &options)
}

/// Converts `input` into `output`.
///
/// # Errors
///
/// Any [`CliError`]; no output file is written when one is returned.
pub fn convert(
    input: &Path,
    output: &Path,
    direction: Direction,
    options: &ConvertOptions,
) -> Result<(), CliError> {
    let root = DatabaseRoot::new(&options.db_root);
    let device_dir = root.resolve(options.device.as_deref())?;
    let db = FeatureDatabase::load(&device_dir)?;
    info!(device = db.device(), features = db.len(), layout = %options.layout, ?direction, "loaded database");

    let outputs = match direction {
        Direction::Assemble => vec![(output.to_path_buf(), assemble_file(input, &db, &device_dir, options)?)],
        Direction::Disassemble => disassemble_file(input, output, &db, options)?,
    };

    for (path, bytes) in outputs {
        std::fs::write(&path, bytes).map_err(|e| CliError::io(&path, e))?;
        info!(path = %path.display(), "wrote output");
    }
    Ok(())
}

fn read_image(path: &Path, layout: Layout, db: &FeatureDatabase) -> Result<BitstreamImage, CliError> {
    let data = std::fs::read(path).map_err(|e| CliError::io(path, e))?;
    Ok(layout.codec().decode(&data, db.geometry())?)
}

/// Returns the image to assemble on: `--base`, else the database's default
/// image, else all zero.
fn base_image(db: &FeatureDatabase, device_dir: &Path, options: &ConvertOptions) -> Result<BitstreamImage, CliError> {
    if let Some(base) = &options.base {
        return read_image(base, options.layout, db);
    }
    if let Some(default) = db.default_image() {
        let layout: Layout = default.layout.parse()?;
        info!(file = %default.file, %layout, "assembling on the default image");
        return read_image(&device_dir.join(&default.file), layout, db);
    }
    Ok(BitstreamImage::new(db.geometry()))
}

fn assemble_file(
    input: &Path,
    db: &FeatureDatabase,
    device_dir: &Path,
    options: &ConvertOptions,
) -> Result<Vec<u8>, CliError> {
    let source = std::fs::read_to_string(input).map_err(|e| CliError::io(input, e))?;
    let assignments = parse_assignments(&source, |name| db.declared_width(name))?;
    let base = base_image(db, device_dir, options)?;
    let image = Assembler::new(db).assemble_onto(base, &assignments)?;
    Ok(options.layout.codec().encode(&image))
}

fn disassemble_file(
    input: &Path,
    output: &Path,
    db: &FeatureDatabase,
    options: &ConvertOptions,
) -> Result<Vec<(PathBuf, Vec<u8>)>, CliError> {
    let image = read_image(input, options.layout, db)?;
    let assignments = Disassembler::new(db).disassemble(&image, options.unset_features)?;

    let mut outputs = vec![(output.to_path_buf(), write_fasm(&assignments).into_bytes())];
    if options.force_bit {
        outputs.push((force_bit_path(output), write_force_bit(&assignments).into_bytes()));
    }
    Ok(outputs)
}
