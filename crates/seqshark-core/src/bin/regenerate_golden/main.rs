use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use seqshark_core::{AnalysisOptions, Engine, EngineConfig, analyze_capture_file};

mod case;

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<(), String> {
    let engine = Engine::new(EngineConfig::default())
        .map_err(|err| format!("invalid default configuration: {}", err))?;
    let root = PathBuf::from("tests").join("golden");
    let entries =
        fs::read_dir(&root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;

    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let input = path.join("input.csv");
        if !input.exists() {
            continue;
        }
        let options = case::load_case_options(&path)?;
        let output = path.join("expected_report.json");
        regenerate_one(&input, &output, &engine, &options)?;
    }

    Ok(())
}

fn regenerate_one(
    input: &Path,
    output: &Path,
    engine: &Engine,
    options: &AnalysisOptions,
) -> Result<(), String> {
    let report = analyze_capture_file(input, engine, options)
        .map_err(|err| format!("analysis failed for {}: {}", input.display(), err))?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|err| format!("JSON serialization failed: {}", err))?;
    fs::write(output, json)
        .map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    Ok(())
}
