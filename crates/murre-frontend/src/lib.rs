// src/lib.rs
//
// Frontend for the murre dialect: lexer, recursive-descent parser,
// default-parameter lowering, lexical name resolution, and a printer that
// turns rewritten ASTs back into source text.

pub mod ast;
pub mod desugar;
pub mod errors;
pub mod intern;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod resolve;
pub mod span;
pub mod token;

pub use intern::{Interner, Symbol};
pub use lexer::Lexer;
pub use parser::Parser;
pub use span::Span;
pub use token::{Token, TokenType};
