// src/lib.rs
//
// The memoization rewrite: classifies @memo annotations across a unit,
// checks usage contracts, and rewrites memoized functions and their call
// sites to thread cache state through hidden parameters.

pub mod analysis;
pub mod call_id;
pub mod catalog;
pub mod diagnostics;
pub mod errors;
pub mod factory;
pub mod function;
pub mod internals;
pub mod kinds;
pub mod names;
pub mod params;
pub mod pipeline;
pub mod returns;
pub mod signature;
pub mod tables;
pub mod walk;

pub use errors::{MemoDiagnostic, MemoError};
pub use kinds::MemoKind;
pub use pipeline::{
    CheckedOutput, DEFAULT_CONTEXT_IMPORT, MemoOptions, checked_stage, parsed_stage,
};
