// src/report.rs
//! Renders diagnostics to stderr through miette, attaching the unit source
//! so labels point into the file.

use miette::{Diagnostic, NamedSource, Report};

use murre_frontend::errors::{LexerError, ParseError};
use murre_memo::{MemoDiagnostic, MemoError};

fn render<D>(error: D, file: &str, source: &str)
where
    D: Diagnostic + Send + Sync + 'static,
{
    let report =
        Report::new(error).with_source_code(NamedSource::new(file, source.to_string()));
    eprintln!("{report:?}");
}

pub fn render_lexer_errors(errors: &[LexerError], file: &str, source: &str) {
    for error in errors {
        render(error.clone(), file, source);
    }
}

pub fn render_parse_errors(errors: &[ParseError], file: &str, source: &str) {
    for error in errors {
        render(error.error.clone(), file, source);
    }
}

pub fn render_memo_error(error: MemoError, file: &str, source: &str) {
    render(error, file, source);
}

pub fn render_memo_diagnostics(diagnostics: &[MemoDiagnostic], file: &str, source: &str) {
    for diagnostic in diagnostics {
        render(diagnostic.clone(), file, source);
    }
}
