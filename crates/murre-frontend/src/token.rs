// src/token.rs

use crate::Span;

/// Single source of truth for keyword-to-token mapping.
///
/// Each entry `"text" => Variant` generates:
/// - A match arm in `TokenType::keyword_type`: `"text" => Some(TokenType::Variant)`
/// - A match arm in `TokenType::as_str`:       `Self::Variant => "text"`
macro_rules! define_keywords {
    ( $( $text:literal => $variant:ident ),+ $(,)? ) => {
        impl TokenType {
            /// Check if a string is a keyword and return its token type.
            pub fn keyword_type(text: &str) -> Option<TokenType> {
                match text {
                    $( $text => Some(TokenType::$variant), )+
                    _ => None,
                }
            }

            /// String representation for keyword tokens (used by `as_str`).
            fn keyword_as_str(&self) -> Option<&'static str> {
                match self {
                    $( Self::$variant => Some($text), )+
                    _ => None,
                }
            }
        }
    };
}

define_keywords! {
    "function"  => KwFunction,
    "const"     => KwConst,
    "let"       => KwLet,
    "return"    => KwReturn,
    "if"        => KwIf,
    "else"      => KwElse,
    "while"     => KwWhile,
    "throw"     => KwThrow,
    "class"     => KwClass,
    "type"      => KwType,
    "import"    => KwImport,
    "from"      => KwFrom,
    "this"      => KwThis,
    "true"      => KwTrue,
    "false"     => KwFalse,
    "undefined" => KwUndefined,
    "as"        => KwAs,
    "void"      => KwVoid,
    "static"    => KwStatic,
}

/// All token types in the murre dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Literals
    NumberLiteral,
    StringLiteral,
    Identifier,

    // Keywords
    KwFunction,
    KwConst,
    KwLet,
    KwReturn,
    KwIf,
    KwElse,
    KwWhile,
    KwThrow,
    KwClass,
    KwType,
    KwImport,
    KwFrom,
    KwThis,
    KwTrue,
    KwFalse,
    KwUndefined,
    KwAs,
    KwVoid,
    KwStatic,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,       // ==
    EqEqEq,     // ===
    BangEq,     // !=
    BangEqEq,   // !==
    Bang,       // !
    AmpAmp,     // &&
    PipePipe,   // ||
    Pipe,       // | (union types)
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    Question,   // ?
    At,         // @ (annotations)

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    DotDotDot, // ... (rest parameters)
    FatArrow,  // =>

    // Special
    Newline,
    Eof,
    Error,
}

impl TokenType {
    /// Get string representation for error messages
    pub fn as_str(&self) -> &'static str {
        // Keywords are defined once in `define_keywords!`; delegate to the
        // generated helper so they never diverge from `keyword_type()`.
        if let Some(s) = self.keyword_as_str() {
            return s;
        }
        match self {
            Self::NumberLiteral => "number",
            Self::StringLiteral => "string",
            Self::Identifier => "identifier",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::EqEq => "==",
            Self::EqEqEq => "===",
            Self::BangEq => "!=",
            Self::BangEqEq => "!==",
            Self::Bang => "!",
            Self::AmpAmp => "&&",
            Self::PipePipe => "||",
            Self::Pipe => "|",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Eq => "=",
            Self::Question => "?",
            Self::At => "@",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::Dot => ".",
            Self::DotDotDot => "...",
            Self::FatArrow => "=>",
            Self::Newline => "newline",
            Self::Eof => "end of file",
            Self::Error => "error",
            _ => "keyword",
        }
    }
}

/// A token with its type, source text, and location
#[derive(Debug, Clone)]
pub struct Token<'src> {
    pub ty: TokenType,
    pub lexeme: std::borrow::Cow<'src, str>,
    pub span: Span,
}

impl<'src> Token<'src> {
    pub fn new(ty: TokenType, lexeme: impl Into<std::borrow::Cow<'src, str>>, span: Span) -> Self {
        Self {
            ty,
            lexeme: lexeme.into(),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_type_matches_as_str() {
        for text in ["function", "const", "return", "this", "undefined", "as"] {
            let ty = TokenType::keyword_type(text).unwrap();
            assert_eq!(ty.as_str(), text);
        }
    }

    #[test]
    fn non_keyword_is_none() {
        assert!(TokenType::keyword_type("memo").is_none());
        assert!(TokenType::keyword_type("gensym$_1").is_none());
    }
}
