// src/commands/common.rs
//! Shared utilities for CLI commands.

use std::fs;
use std::path::Path;

use murre_frontend::Parser;
use murre_frontend::ast::Program;
use murre_frontend::intern::Interner;

use crate::report;

/// A parsed compilation unit plus everything the later stages need to
/// report against it.
pub struct ParsedUnit {
    pub program: Program,
    pub interner: Interner,
    pub source: String,
    pub file: String,
}

/// Read and parse one unit, rendering any diagnostics on error.
///
/// Returns `Err(())` if the file could not be read or parsed; diagnostics
/// are rendered to stderr before returning.
pub fn load_unit(path: &Path) -> Result<ParsedUnit, ()> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("error: could not read '{}': {}", path.display(), error);
            return Err(());
        }
    };
    let file = path.to_string_lossy().into_owned();

    let mut parser = Parser::new(&source);
    let program = match parser.parse_program() {
        Ok(program) => program,
        Err(errors) => {
            // Lexer errors usually cause the parse errors downstream of
            // them; when both exist, report only the lexer ones.
            let lexer_errors = parser.take_lexer_errors();
            if lexer_errors.is_empty() {
                report::render_parse_errors(&errors, &file, &source);
            } else {
                report::render_lexer_errors(&lexer_errors, &file, &source);
            }
            return Err(());
        }
    };

    let lexer_errors = parser.take_lexer_errors();
    if !lexer_errors.is_empty() {
        report::render_lexer_errors(&lexer_errors, &file, &source);
        return Err(());
    }

    Ok(ParsedUnit {
        program,
        interner: parser.into_interner(),
        source,
        file,
    })
}
