//! Per-case analysis options for the golden fixtures.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use seqshark_core::{AnalysisOptions, GroupSelection};

const OPTIONS_FILE: &str = "options.json";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CaseOptions {
    groups: Vec<String>,
    keep_malformed: bool,
}

impl From<CaseOptions> for AnalysisOptions {
    fn from(case: CaseOptions) -> Self {
        let selection = if case.groups.is_empty() {
            GroupSelection::All
        } else {
            GroupSelection::only(case.groups)
        };
        AnalysisOptions {
            selection,
            keep_malformed: case.keep_malformed,
            ..AnalysisOptions::default()
        }
    }
}

/// Reads `options.json` from a case directory. A case without one uses defaults.
pub fn load_case_options(dir: &Path) -> Result<AnalysisOptions, String> {
    let path = dir.join(OPTIONS_FILE);
    if !path.exists() {
        return Ok(CaseOptions::default().into());
    }
    let json = fs::read_to_string(&path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    let case: CaseOptions =
        serde_json::from_str(&json).map_err(|err| format!("invalid {}: {}", path.display(), err))?;
    Ok(case.into())
}
