// src/parser/types.rs
//
// Type annotation parsing: named types with arguments, function types
// (optionally annotated), unions, and the `this`/`void`/`undefined` leaves.

use super::Parser;
use crate::ast::*;
use crate::errors::{ParseError, ParserError};
use crate::TokenType;

impl<'src> Parser<'src> {
    /// Parse a type annotation, including `A | B` unions.
    pub(crate) fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let first = self.primary_type()?;
        if !self.check(TokenType::Pipe) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.match_token(TokenType::Pipe) {
            members.push(self.primary_type()?);
        }
        let span = members[0].span.merge(members[members.len() - 1].span);
        Ok(TypeExpr {
            id: self.next_id(),
            kind: TypeKind::Union(members),
            span,
        })
    }

    fn primary_type(&mut self) -> Result<TypeExpr, ParseError> {
        match self.current.ty {
            // `@memo (content: string) => void`
            TokenType::At => {
                let annotations = self.annotations()?;
                if !self.check(TokenType::LParen) {
                    return Err(self.error_expected("("));
                }
                self.function_type(annotations)
            }
            TokenType::LParen => {
                if self.function_type_ahead() {
                    self.function_type(Vec::new())
                } else {
                    // Parenthesised type: `(A | B)`.
                    self.advance();
                    let inner = self.parse_type()?;
                    self.consume(TokenType::RParen, ")")?;
                    Ok(inner)
                }
            }
            TokenType::KwVoid => {
                let span = self.advance().span;
                Ok(TypeExpr {
                    id: self.next_id(),
                    kind: TypeKind::Void,
                    span,
                })
            }
            TokenType::KwUndefined => {
                let span = self.advance().span;
                Ok(TypeExpr {
                    id: self.next_id(),
                    kind: TypeKind::Undefined,
                    span,
                })
            }
            TokenType::KwThis => {
                let span = self.advance().span;
                Ok(TypeExpr {
                    id: self.next_id(),
                    kind: TypeKind::This,
                    span,
                })
            }
            TokenType::Identifier => {
                let token = self.advance();
                let name = self.interner.intern(&token.lexeme);
                let start = token.span;
                let mut type_args = Vec::new();
                // In type position `<` always opens type arguments.
                if self.match_token(TokenType::Lt) {
                    type_args.push(self.parse_type()?);
                    while self.match_token(TokenType::Comma) {
                        type_args.push(self.parse_type()?);
                    }
                    self.consume(TokenType::Gt, ">")?;
                }
                Ok(TypeExpr {
                    id: self.next_id(),
                    kind: TypeKind::Named { name, type_args },
                    span: start.merge(self.previous_span),
                })
            }
            _ => Err(ParseError::new(
                ParserError::ExpectedType {
                    span: self.current.span.into(),
                },
                self.current.span,
            )),
        }
    }

    /// `(params) => ReturnType`, annotations already parsed by the caller.
    fn function_type(&mut self, annotations: Vec<Annotation>) -> Result<TypeExpr, ParseError> {
        let start = if let Some(first) = annotations.first() {
            first.span
        } else {
            self.current.span
        };
        self.consume(TokenType::LParen, "(")?;
        let id = self.next_id();
        let params = self.param_list(false)?;
        self.consume(TokenType::FatArrow, "=>")?;
        let return_type = self.parse_type()?;
        let span = start.merge(return_type.span);
        Ok(TypeExpr {
            id: self.next_id(),
            kind: TypeKind::Function(Box::new(FunctionType {
                id,
                annotations,
                params,
                return_type,
                span,
            })),
            span,
        })
    }

    /// Distinguish `(a: T) => R` from a parenthesised type by scanning a
    /// cloned lexer to the matching `)` and checking for `=>`.
    fn function_type_ahead(&self) -> bool {
        let mut lexer_copy = self.lexer.clone();
        let mut depth: u32 = 1;
        loop {
            let mut token = lexer_copy.next_token();
            while token.ty == TokenType::Newline {
                token = lexer_copy.next_token();
            }
            match token.ty {
                TokenType::LParen => depth += 1,
                TokenType::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        let mut after = lexer_copy.next_token();
                        while after.ty == TokenType::Newline {
                            after = lexer_copy.next_token();
                        }
                        return after.ty == TokenType::FatArrow;
                    }
                }
                TokenType::Eof => return false,
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Stmt, TypeKind};

    fn parse_alias(source: &str) -> TypeExpr {
        let mut parser = Parser::new(source);
        let program = parser.parse_program().unwrap();
        let Stmt::TypeAlias(alias) = program.statements.into_iter().next().unwrap() else {
            panic!("expected type alias");
        };
        alias.ty
    }

    #[test]
    fn parses_union_of_named_and_undefined() {
        let ty = parse_alias("type T = string | undefined");
        let TypeKind::Union(members) = &ty.kind else {
            panic!("expected union");
        };
        assert_eq!(members.len(), 2);
        assert!(matches!(members[1].kind, TypeKind::Undefined));
    }

    #[test]
    fn parses_named_type_arguments() {
        let ty = parse_alias("type T = Array<Array<string>>");
        let TypeKind::Named { type_args, .. } = &ty.kind else {
            panic!("expected named type");
        };
        assert_eq!(type_args.len(), 1);
        assert!(matches!(type_args[0].kind, TypeKind::Named { .. }));
    }

    #[test]
    fn parses_parenthesised_function_type_in_union() {
        let ty = parse_alias("type T = ((s: string) => void) | undefined");
        assert!(ty.function_type().is_some());
    }

    #[test]
    fn function_type_keeps_its_annotations() {
        let ty = parse_alias("type Content = @memo () => void");
        let ft = ty.function_type().unwrap();
        assert_eq!(ft.annotations.len(), 1);
    }
}
