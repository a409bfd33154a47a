// src/commands/transform.rs

use std::path::Path;
use std::process::ExitCode;

use murre_frontend::printer::print_program;
use murre_memo::{MemoOptions, checked_stage, parsed_stage};

use super::common::load_unit;
use crate::report;

/// Run both plugin stages over one unit and print the rewritten source.
pub fn transform_file(path: &Path, options: &MemoOptions) -> ExitCode {
    let Ok(mut unit) = load_unit(path) else {
        return ExitCode::FAILURE;
    };

    parsed_stage(&mut unit.program, &mut unit.interner, options);
    let output = match checked_stage(&mut unit.program, &mut unit.interner, &unit.file, options) {
        Ok(output) => output,
        Err(error) => {
            report::render_memo_error(error, &unit.file, &unit.source);
            return ExitCode::FAILURE;
        }
    };
    report::render_memo_diagnostics(&output.diagnostics, &unit.file, &unit.source);

    let printed = print_program(&unit.program, &unit.interner);
    println!("{}", printed.trim_start_matches('\n'));
    ExitCode::SUCCESS
}
