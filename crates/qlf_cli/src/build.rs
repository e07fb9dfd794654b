//! `qlf_fasm_db_builder`: description to device database.

use crate::args::BuildArgs;
use crate::error::CliError;
use qlf_db::TableEncoding;

/// Runs the `qlf_fasm_db_builder` command.
///
/// Prints the device directory and build statistics to stderr on success.
pub fn run(args: &BuildArgs) -> Result<(), CliError> {
    qlf_common::logging::init(args.log_level.unwrap_or_default());

    let encoding = if args.binary {
        TableEncoding::Binary
    } else {
        TableEncoding::Text
    };
    let (dir, report) = qlf_builder::build_database(&args.description, &args.db_root, encoding)?;
    eprintln!("    Built {} ({report})", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn builds_binary_table() {
        let dir = tempfile::tempdir().unwrap();
        let description = dir.path().join("d.json");
        std::fs::write(
            &description,
            r#"{
                "device": "dev",
                "geometry": { "zones": [ { "name": "r0", "words": 1, "word_width": 8, "order": 0 } ] },
                "chains": [ { "name": "cfg", "segments": [ { "zone": "r0" } ] } ],
                "top": { "name": "top", "chain": "cfg", "cells": [ { "name": "EN", "bit": 3 } ] }
            }"#,
        )
        .unwrap();
        let root = dir.path().join("db");
        let args = BuildArgs::parse_from([
            "qlf_fasm_db_builder",
            "--description",
            description.to_str().unwrap(),
            "--db-root",
            root.to_str().unwrap(),
            "--binary",
        ]);
        run(&args).unwrap();
        assert!(root.join("dev").join("features.bin").is_file());
        let db = qlf_db::FeatureDatabase::load(&root.join("dev")).unwrap();
        assert_eq!(db.declared_width("top.EN"), Some(1));
    }

    #[test]
    fn missing_description() {
        let dir = tempfile::tempdir().unwrap();
        let args = BuildArgs::parse_from([
            "qlf_fasm_db_builder",
            "--description",
            dir.path().join("none.json").to_str().unwrap(),
        ]);
        assert!(matches!(run(&args), Err(CliError::Database(_))));
    }
}
