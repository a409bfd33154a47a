// src/errors.rs
//! Plugin errors: fatal invalid-usage errors (E2xxx) abort the stage;
//! reported contract violations (W2xxx) accumulate and compilation continues.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Fatal errors. Raising one unwinds the checked stage with no output for
/// the unit.
#[derive(Error, Debug, Diagnostic)]
pub enum MemoError {
    #[error("invalid @memo usage: '{callee}' is called from non-memo context '{scope}'")]
    #[diagnostic(
        code(E2001),
        help("annotate the enclosing function with @memo, or stop calling '{callee}' from it")
    )]
    OutOfContextCall {
        callee: String,
        scope: String,
        #[label("memoized function called here")]
        span: SourceSpan,
    },

    #[error("invalid @memo usage: conflicting memo annotations on '{name}'")]
    #[diagnostic(
        code(E2002),
        help("a declaration carries at most one of @memo, @memo_intrinsic, @memo_entry")
    )]
    ConflictingAnnotations {
        name: String,
        #[label("second memo annotation here")]
        span: SourceSpan,
    },

    #[error("failed to write transformed output to {path}")]
    #[diagnostic(code(E2003))]
    DumpFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Non-fatal contract violations, collected into the diagnostic sink.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum MemoDiagnostic {
    #[error("memoized function '{name}' has no explicit return type")]
    #[diagnostic(
        code(W2101),
        severity(Warning),
        help("memo and intrinsic functions must declare their return type")
    )]
    MissingReturnType {
        name: String,
        #[label("declared here")]
        span: SourceSpan,
    },

    #[error("parameter '{name}' is reassigned inside a memoized function")]
    #[diagnostic(
        code(W2102),
        severity(Warning),
        help("memoized parameters are cache keys and must not be reassigned")
    )]
    ParameterReassignment {
        name: String,
        #[label("assignment here")]
        span: SourceSpan,
    },

    #[error("memoized function '{callee}' is called in a parameter default value")]
    #[diagnostic(
        code(W2103),
        severity(Warning),
        help("move the call into the function body")
    )]
    DefaultValueMemoCall {
        callee: String,
        #[label("default value evaluates this call")]
        span: SourceSpan,
    },
}
