// src/errors.rs
//! Frontend errors: lexer (E0xxx) and parser (E1xxx).

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::Span;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum LexerError {
    #[error("unexpected character '{ch}'")]
    #[diagnostic(code(E0001))]
    UnexpectedCharacter {
        ch: char,
        #[label("this character")]
        span: SourceSpan,
    },

    #[error("unterminated string literal")]
    #[diagnostic(code(E0002), help("string literals must close before the end of the line"))]
    UnterminatedString {
        #[label("string starts here")]
        span: SourceSpan,
    },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParserError {
    #[error("expected expression, found '{found}'")]
    #[diagnostic(code(E1001))]
    ExpectedExpression {
        found: String,
        #[label("expected expression")]
        span: SourceSpan,
    },

    #[error("expected '{expected}', found '{found}'")]
    #[diagnostic(code(E1002))]
    ExpectedToken {
        expected: String,
        found: String,
        #[label("unexpected token")]
        span: SourceSpan,
    },

    #[error("unexpected token '{token}'")]
    #[diagnostic(code(E1003))]
    UnexpectedToken {
        token: String,
        #[label("unexpected")]
        span: SourceSpan,
    },

    #[error("expected type annotation")]
    #[diagnostic(code(E1004))]
    ExpectedType {
        #[label("expected type")]
        span: SourceSpan,
    },

    #[error("expected identifier")]
    #[diagnostic(code(E1005))]
    ExpectedIdentifier {
        #[label("expected identifier")]
        span: SourceSpan,
    },

    #[error("expected annotation name after '@'")]
    #[diagnostic(code(E1006))]
    ExpectedAnnotationName {
        #[label("expected a name here")]
        span: SourceSpan,
    },

    #[error("invalid assignment target")]
    #[diagnostic(
        code(E1007),
        help("only identifiers and member accesses can be assigned to")
    )]
    InvalidAssignmentTarget {
        #[label("cannot assign to this expression")]
        span: SourceSpan,
    },

    #[error("rest parameter cannot have a default value")]
    #[diagnostic(code(E1008))]
    RestParamDefault {
        #[label("rest parameter")]
        span: SourceSpan,
    },

    #[error("receiver parameter must come first")]
    #[diagnostic(code(E1009), help("move the 'this' parameter to the front of the list"))]
    ReceiverNotFirst {
        #[label("'this' declared here")]
        span: SourceSpan,
    },
}

/// A parser error paired with the span where recovery resumed.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub error: ParserError,
    pub span: Span,
}

impl ParseError {
    pub fn new(error: ParserError, span: Span) -> Self {
        Self { error, span }
    }
}
