use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use protolens_core::decode::DecodeOptions;
use protolens_core::{inspect_file, load_schema_file};

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<(), String> {
    let root = PathBuf::from("tests").join("golden");
    let entries =
        fs::read_dir(&root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;

    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let case = entry.path();
        if !case.is_dir() {
            continue;
        }
        let schema = case.join("schema.json");
        let input = case.join("input.bin");
        if !schema.exists() || !input.exists() {
            continue;
        }
        regenerate_one(&schema, &input, &case.join("expected_report.json"))?;
    }

    Ok(())
}

fn regenerate_one(schema_path: &Path, input: &Path, output: &Path) -> Result<(), String> {
    let schema = load_schema_file(schema_path)
        .map_err(|err| format!("schema {} is invalid: {}", schema_path.display(), err))?;
    let report = inspect_file(&schema, None, input, DecodeOptions::default())
        .map_err(|err| format!("decode failed for {}: {}", input.display(), err))?;
    let json = serde_json::to_string(&report)
        .map_err(|err| format!("JSON serialization failed: {}", err))?;
    fs::write(output, json)
        .map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    Ok(())
}
