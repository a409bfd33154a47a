// src/commands/check.rs

use std::path::Path;
use std::process::ExitCode;

use murre_memo::{MemoOptions, checked_stage};

use super::common::load_unit;
use crate::report;

/// Check memo usage in a unit (parse + classify + check, no output)
pub fn check_file(path: &Path) -> ExitCode {
    let Ok(mut unit) = load_unit(path) else {
        return ExitCode::FAILURE; // diagnostics already rendered
    };

    match checked_stage(
        &mut unit.program,
        &mut unit.interner,
        &unit.file,
        &MemoOptions::default(),
    ) {
        Ok(output) => {
            report::render_memo_diagnostics(&output.diagnostics, &unit.file, &unit.source);
            ExitCode::SUCCESS
        }
        Err(error) => {
            report::render_memo_error(error, &unit.file, &unit.source);
            ExitCode::FAILURE
        }
    }
}
