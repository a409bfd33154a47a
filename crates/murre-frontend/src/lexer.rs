// src/lexer.rs

use crate::errors::LexerError;
use crate::{Span, Token, TokenType};

/// Smallest byte value that starts a multi-byte UTF-8 sequence (non-ASCII).
const UTF8_MULTIBYTE: u8 = 0x80;

#[derive(Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    current: usize,
    start: usize,
    line: u32,
    column: u32,
    start_column: u32,
    start_line: u32,
    errors: Vec<LexerError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_column: 1,
            start_line: 1,
            errors: Vec::new(),
        }
    }

    /// Take all collected errors, leaving the internal list empty.
    pub fn take_errors(&mut self) -> Vec<LexerError> {
        std::mem::take(&mut self.errors)
    }

    /// Check if any errors have been collected.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get the source string being lexed.
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Token<'src> {
        self.skip_whitespace();

        self.start = self.current;
        self.start_column = self.column;
        self.start_line = self.line;

        let Some(c) = self.advance() else {
            return self.make_token(TokenType::Eof);
        };

        match c {
            '(' => self.make_token(TokenType::LParen),
            ')' => self.make_token(TokenType::RParen),
            '{' => self.make_token(TokenType::LBrace),
            '}' => self.make_token(TokenType::RBrace),
            '[' => self.make_token(TokenType::LBracket),
            ']' => self.make_token(TokenType::RBracket),
            ',' => self.make_token(TokenType::Comma),
            ';' => self.make_token(TokenType::Semicolon),
            ':' => self.make_token(TokenType::Colon),
            '@' => self.make_token(TokenType::At),
            '+' => self.make_token(TokenType::Plus),
            '-' => self.make_token(TokenType::Minus),
            '*' => self.make_token(TokenType::Star),
            '%' => self.make_token(TokenType::Percent),
            '?' => self.make_token(TokenType::Question),

            '=' => {
                if self.match_byte(b'=') {
                    if self.match_byte(b'=') {
                        self.make_token(TokenType::EqEqEq)
                    } else {
                        self.make_token(TokenType::EqEq)
                    }
                } else if self.match_byte(b'>') {
                    self.make_token(TokenType::FatArrow)
                } else {
                    self.make_token(TokenType::Eq)
                }
            }
            '!' => {
                if self.match_byte(b'=') {
                    if self.match_byte(b'=') {
                        self.make_token(TokenType::BangEqEq)
                    } else {
                        self.make_token(TokenType::BangEq)
                    }
                } else {
                    self.make_token(TokenType::Bang)
                }
            }
            '&' => {
                if self.match_byte(b'&') {
                    self.make_token(TokenType::AmpAmp)
                } else {
                    self.error_unexpected_char(c)
                }
            }
            '|' => {
                if self.match_byte(b'|') {
                    self.make_token(TokenType::PipePipe)
                } else {
                    self.make_token(TokenType::Pipe)
                }
            }
            '<' => {
                if self.match_byte(b'=') {
                    self.make_token(TokenType::LtEq)
                } else {
                    self.make_token(TokenType::Lt)
                }
            }
            '>' => {
                if self.match_byte(b'=') {
                    self.make_token(TokenType::GtEq)
                } else {
                    self.make_token(TokenType::Gt)
                }
            }

            // Slash or comment
            '/' => {
                if self.match_byte(b'/') {
                    self.skip_line_comment();
                    // Don't consume the newline, let next_token handle it
                    self.next_token()
                } else {
                    self.make_token(TokenType::Slash)
                }
            }

            '\n' => {
                let token = self.make_token(TokenType::Newline);
                self.line += 1;
                self.column = 1;
                token
            }

            '"' => self.string(),

            '.' => {
                if self.peek_byte() == Some(b'.') && self.peek_next_byte() == Some(b'.') {
                    self.current += 2;
                    self.column += 2;
                    self.make_token(TokenType::DotDotDot)
                } else {
                    self.make_token(TokenType::Dot)
                }
            }

            c if c.is_ascii_digit() => self.number(),

            // `$` is an identifier character so compiler-synthesized names
            // (gensym$_N, runtime accessors) lex as plain identifiers.
            c if c == '_' || c == '$' || unicode_ident::is_xid_start(c) => self.identifier(),

            _ => self.error_unexpected_char(c),
        }
    }

    /// Skip whitespace (spaces, tabs, carriage returns) using direct byte access
    #[inline]
    fn skip_whitespace(&mut self) {
        while self.current < self.bytes.len() {
            match self.bytes[self.current] {
                b' ' | b'\t' | b'\r' => {
                    self.current += 1;
                    self.column += 1;
                }
                _ => break,
            }
        }
    }

    /// Advance to the next character and return it.
    /// Fast path for ASCII bytes (no UTF-8 decoding needed).
    #[inline]
    fn advance(&mut self) -> Option<char> {
        if self.current >= self.bytes.len() {
            return None;
        }
        let b = self.bytes[self.current];
        if b < UTF8_MULTIBYTE {
            self.current += 1;
            self.column += 1;
            Some(b as char)
        } else {
            let remaining = &self.source[self.current..];
            let c = remaining.chars().next()?;
            self.current += c.len_utf8();
            self.column += 1;
            Some(c)
        }
    }

    /// Peek at the next byte directly (for ASCII-only comparisons).
    #[inline]
    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.current).copied()
    }

    #[inline]
    fn peek_next_byte(&self) -> Option<u8> {
        self.bytes.get(self.current + 1).copied()
    }

    /// Consume the next character if it matches the expected byte.
    /// All callers use ASCII characters, so we compare bytes directly.
    #[inline]
    fn match_byte(&mut self, expected: u8) -> bool {
        debug_assert!(expected < UTF8_MULTIBYTE, "match_byte only works for ASCII");
        if self.current < self.bytes.len() && self.bytes[self.current] == expected {
            self.current += 1;
            self.column += 1;
            true
        } else {
            false
        }
    }

    /// Create a token from start to current position
    fn make_token(&self, ty: TokenType) -> Token<'src> {
        let lexeme = &self.source[self.start..self.current];
        Token::new(
            ty,
            lexeme,
            Span::new_with_end(
                self.start,
                self.current,
                self.start_line,
                self.start_column,
                self.line,
                self.column,
            ),
        )
    }

    fn current_span(&self) -> Span {
        Span::new_with_end(
            self.start,
            self.current,
            self.start_line,
            self.start_column,
            self.line,
            self.column,
        )
    }

    /// Create an error token and collect an error for an unexpected character.
    fn error_unexpected_char(&mut self, c: char) -> Token<'src> {
        let span = self.current_span();
        tracing::debug!(char = %c, line = self.start_line, col = self.start_column, "lexer error: unexpected character");
        self.errors.push(LexerError::UnexpectedCharacter {
            ch: c,
            span: span.into(),
        });
        let message = format!("unexpected character '{}'", c);
        Token::new(TokenType::Error, message, span)
    }

    /// Scan an identifier or keyword.
    /// Uses a byte-level fast path for ASCII identifier characters.
    fn identifier(&mut self) -> Token<'src> {
        while self.current < self.bytes.len() {
            let b = self.bytes[self.current];
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' {
                self.current += 1;
                self.column += 1;
            } else if b >= UTF8_MULTIBYTE {
                let remaining = &self.source[self.current..];
                let Some(c) = remaining.chars().next() else {
                    break;
                };
                if unicode_ident::is_xid_continue(c) {
                    self.current += c.len_utf8();
                    self.column += 1;
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        let text = &self.source[self.start..self.current];
        let ty = TokenType::keyword_type(text).unwrap_or(TokenType::Identifier);
        self.make_token(ty)
    }

    /// Scan a number literal: digits with an optional fraction part.
    fn number(&mut self) -> Token<'src> {
        while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
            self.current += 1;
            self.column += 1;
        }
        if self.peek_byte() == Some(b'.') && self.peek_next_byte().is_some_and(|b| b.is_ascii_digit())
        {
            self.current += 1;
            self.column += 1;
            while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
                self.current += 1;
                self.column += 1;
            }
        }
        self.make_token(TokenType::NumberLiteral)
    }

    /// Scan a string literal. The token's lexeme is the unescaped content
    /// (without the surrounding quotes).
    fn string(&mut self) -> Token<'src> {
        let mut value = String::new();
        loop {
            let Some(c) = self.advance() else {
                let span = self.current_span();
                self.errors.push(LexerError::UnterminatedString { span: span.into() });
                return Token::new(TokenType::Error, "unterminated string", span);
            };
            match c {
                '"' => break,
                '\\' => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => {
                        let span = self.current_span();
                        self.errors.push(LexerError::UnterminatedString { span: span.into() });
                        return Token::new(TokenType::Error, "unterminated string", span);
                    }
                },
                '\n' => {
                    let span = self.current_span();
                    self.errors.push(LexerError::UnterminatedString { span: span.into() });
                    self.line += 1;
                    self.column = 1;
                    return Token::new(TokenType::Error, "unterminated string", span);
                }
                other => value.push(other),
            }
        }
        Token::new(TokenType::StringLiteral, value, self.current_span())
    }

    /// Skip a line comment (everything until newline or EOF) using byte scanning.
    #[inline]
    fn skip_line_comment(&mut self) {
        while self.current < self.bytes.len() && self.bytes[self.current] != b'\n' {
            self.current += 1;
            self.column += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_types(source: &str) -> Vec<TokenType> {
        let mut lexer = Lexer::new(source);
        let mut types = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.ty == TokenType::Eof {
                break;
            }
            if token.ty != TokenType::Newline {
                types.push(token.ty);
            }
        }
        types
    }

    #[test]
    fn lexes_function_declaration() {
        let types = token_types("function f(): void {}");
        assert_eq!(
            types,
            vec![
                TokenType::KwFunction,
                TokenType::Identifier,
                TokenType::LParen,
                TokenType::RParen,
                TokenType::Colon,
                TokenType::KwVoid,
                TokenType::LBrace,
                TokenType::RBrace,
            ]
        );
    }

    #[test]
    fn lexes_annotation_marker() {
        let types = token_types("@memo");
        assert_eq!(types, vec![TokenType::At, TokenType::Identifier]);
    }

    #[test]
    fn gensym_names_are_single_identifiers() {
        let mut lexer = Lexer::new("gensym$_1");
        let token = lexer.next_token();
        assert_eq!(token.ty, TokenType::Identifier);
        assert_eq!(token.lexeme, "gensym$_1");
    }

    #[test]
    fn strict_equality_operators() {
        let types = token_types("a !== undefined === b");
        assert_eq!(
            types,
            vec![
                TokenType::Identifier,
                TokenType::BangEqEq,
                TokenType::KwUndefined,
                TokenType::EqEqEq,
                TokenType::Identifier,
            ]
        );
    }

    #[test]
    fn string_lexeme_is_unescaped_content() {
        let mut lexer = Lexer::new(r#""a\"b""#);
        let token = lexer.next_token();
        assert_eq!(token.ty, TokenType::StringLiteral);
        assert_eq!(token.lexeme, "a\"b");
    }

    #[test]
    fn rest_parameter_ellipsis() {
        let types = token_types("...args");
        assert_eq!(types, vec![TokenType::DotDotDot, TokenType::Identifier]);
    }

    #[test]
    fn comments_are_skipped() {
        let types = token_types("a // comment\nb");
        assert_eq!(types, vec![TokenType::Identifier, TokenType::Identifier]);
    }
}
