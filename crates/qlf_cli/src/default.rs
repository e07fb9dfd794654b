//! `qlf_fasm_default`: feature names to a default FASM file.

use crate::args::DefaultArgs;
use crate::error::CliError;
use qlf_asm::default_assignments;
use qlf_db::DatabaseRoot;
use qlf_fasm::write_fasm;
use tracing::info;

/// Splits a comma-separated feature list, dropping empty entries.
pub fn split_features(list: &str) -> Vec<&str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Runs the `qlf_fasm_default` command.
pub fn run(args: &DefaultArgs) -> Result<(), CliError> {
    qlf_common::logging::init(args.log_level.unwrap_or_default());

    let names = split_features(&args.features);
    if names.is_empty() {
        return Err(CliError::Usage("--features lists no feature names".to_string()));
    }
    let db = DatabaseRoot::new(&args.db_root).load(args.device.as_deref())?;
    let assignments = default_assignments(&db, &names)?;

    std::fs::write(&args.output, write_fasm(&assignments)).map_err(|e| CliError::io(&args.output, e))?;
    info!(features = assignments.len(), path = %args.output.display(), "wrote default FASM");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use qlf_db::{BitAddress, DeviceGeometry, Feature, FeatureDatabase, TableEncoding, Zone};

    #[test]
    fn split_trims_and_drops_empty() {
        assert_eq!(split_features(" FF_EN, MODE ,,"), ["FF_EN", "MODE"]);
    }

    #[test]
    fn writes_every_instance() {
        let dir = tempfile::tempdir().unwrap();
        let geometry = DeviceGeometry::new(vec![Zone {
            name: "t0".to_string(),
            words: 1,
            word_width: 8,
            order: 0,
        }])
        .unwrap();
        let t0 = geometry.zone_id("t0").unwrap();
        FeatureDatabase::new(
            "dev",
            geometry,
            vec![
                Feature::new("top.clb_0_.FF_EN", vec![BitAddress::new(t0, 0, 0)]),
                Feature::new("top.clb_1_.FF_EN", vec![BitAddress::new(t0, 0, 1)]),
            ],
        )
        .unwrap()
        .save(dir.path(), TableEncoding::Text)
        .unwrap();

        let output = dir.path().join("default.fasm");
        let args = DefaultArgs::parse_from([
            "qlf_fasm_default",
            "--features",
            "FF_EN",
            "--db-root",
            dir.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]);
        run(&args).unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "top.clb_0_.FF_EN\ntop.clb_1_.FF_EN\n"
        );
    }
}
