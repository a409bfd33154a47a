// src/parser/decl.rs
//
// Declaration parsing: annotations, functions, parameters, classes,
// variable declarations, type aliases, imports.

use super::Parser;
use crate::ast::*;
use crate::errors::{ParseError, ParserError};
use crate::TokenType;

impl<'src> Parser<'src> {
    /// Parse a leading `@name ...` annotation list.
    pub(crate) fn annotations(&mut self) -> Result<Vec<Annotation>, ParseError> {
        let mut annotations = Vec::new();
        while self.check(TokenType::At) {
            let at_span = self.advance().span;
            if !self.check(TokenType::Identifier) {
                return Err(ParseError::new(
                    ParserError::ExpectedAnnotationName {
                        span: self.current.span.into(),
                    },
                    self.current.span,
                ));
            }
            let token = self.advance();
            let name = self.interner.intern(&token.lexeme);
            annotations.push(Annotation {
                id: self.next_id(),
                name,
                span: at_span.merge(token.span),
            });
        }
        Ok(annotations)
    }

    /// Parse a declaration that may carry annotations: function, class,
    /// variable declaration, or type alias.
    pub(crate) fn annotated_declaration(&mut self) -> Result<Stmt, ParseError> {
        let annotations = self.annotations()?;
        match self.current.ty {
            TokenType::KwFunction => {
                let func = self.function_declaration(annotations)?;
                Ok(Stmt::Function(Box::new(func)))
            }
            TokenType::KwConst | TokenType::KwLet => self.variable_declaration(annotations),
            TokenType::KwClass => self.class_declaration(annotations),
            TokenType::KwType => self.type_alias(annotations),
            _ => Err(self.error_unexpected()),
        }
    }

    /// `function name(params): ret { ... }`
    fn function_declaration(&mut self, annotations: Vec<Annotation>) -> Result<Function, ParseError> {
        let start = self.consume(TokenType::KwFunction, "function")?.span;
        let (name, _) = self.consume_identifier()?;
        let id = self.next_id();
        self.consume(TokenType::LParen, "(")?;
        let params = self.param_list(true)?;
        let return_type = if self.match_token(TokenType::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = FuncBody::Block(self.block()?);
        let span = start.merge(self.previous_span);
        Ok(Function {
            id,
            annotations,
            name: Some(name),
            params,
            return_type,
            body,
            is_arrow: false,
            span,
        })
    }

    /// Parse a parameter list up to and including the closing `)`.
    /// `allow_defaults` is false inside function types, which have no bodies
    /// for a default to desugar into.
    pub(crate) fn param_list(&mut self, allow_defaults: bool) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();
        if !self.check(TokenType::RParen) {
            loop {
                params.push(self.param(allow_defaults, params.is_empty())?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RParen, ")")?;
        Ok(params)
    }

    fn param(&mut self, allow_defaults: bool, is_first: bool) -> Result<Param, ParseError> {
        let annotations = self.annotations()?;
        let start = self.current.span;

        let is_rest = self.match_token(TokenType::DotDotDot);

        let (name, is_receiver) = if self.check(TokenType::KwThis) {
            let token = self.advance();
            if !is_first {
                return Err(ParseError::new(
                    ParserError::ReceiverNotFirst {
                        span: token.span.into(),
                    },
                    token.span,
                ));
            }
            (self.interner.intern("this"), true)
        } else {
            let (sym, _) = self.consume_identifier()?;
            (sym, false)
        };

        let ty = if self.match_token(TokenType::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let default = if self.check(TokenType::Eq) {
            if is_rest {
                return Err(ParseError::new(
                    ParserError::RestParamDefault {
                        span: self.current.span.into(),
                    },
                    self.current.span,
                ));
            }
            self.advance();
            if !allow_defaults {
                return Err(self.error_unexpected());
            }
            Some(self.expression()?)
        } else {
            None
        };

        Ok(Param {
            id: self.next_id(),
            annotations,
            name,
            ty,
            default,
            is_rest,
            is_receiver,
            span: start.merge(self.previous_span),
        })
    }

    /// `const a: T = init, b = init` / `let ...`
    fn variable_declaration(&mut self, annotations: Vec<Annotation>) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let kind = match keyword.ty {
            TokenType::KwConst => VarKind::Const,
            _ => VarKind::Let,
        };
        let id = self.next_id();
        let mut declarators = Vec::new();
        loop {
            let (name, name_span) = self.consume_identifier()?;
            let ty = if self.match_token(TokenType::Colon) {
                Some(self.parse_type()?)
            } else {
                None
            };
            let init = if self.match_token(TokenType::Eq) {
                Some(self.expression()?)
            } else {
                None
            };
            declarators.push(VarDeclarator {
                id: self.next_id(),
                name,
                ty,
                init,
                span: name_span.merge(self.previous_span),
            });
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        self.terminate_stmt();
        Ok(Stmt::Variable(VariableDecl {
            id,
            annotations,
            kind,
            declarators,
            span: keyword.span.merge(self.previous_span),
        }))
    }

    /// `class Name { members }`
    fn class_declaration(&mut self, annotations: Vec<Annotation>) -> Result<Stmt, ParseError> {
        let start = self.consume(TokenType::KwClass, "class")?.span;
        let (name, _) = self.consume_identifier()?;
        let id = self.next_id();
        self.consume(TokenType::LBrace, "{")?;

        let mut members = Vec::new();
        while !self.check(TokenType::RBrace) && !self.check(TokenType::Eof) {
            members.push(self.class_member()?);
        }
        self.consume(TokenType::RBrace, "}")?;

        Ok(Stmt::Class(ClassDecl {
            id,
            annotations,
            name,
            members,
            span: start.merge(self.previous_span),
        }))
    }

    fn class_member(&mut self) -> Result<ClassMember, ParseError> {
        let annotations = self.annotations()?;
        let start = self.current.span;
        let is_static = self.match_token(TokenType::KwStatic);

        // `get name()` / `set name()` accessors: contextual keywords, so peek
        // past the identifier with a cloned lexer before committing.
        let accessor_kind = if self.check(TokenType::Identifier)
            && matches!(&*self.current.lexeme, "get" | "set")
        {
            let mut lexer_copy = self.lexer.clone();
            let mut next = lexer_copy.next_token();
            while next.ty == TokenType::Newline {
                next = lexer_copy.next_token();
            }
            if next.ty == TokenType::Identifier {
                let kind = if &*self.current.lexeme == "get" {
                    MethodKind::Get
                } else {
                    MethodKind::Set
                };
                self.advance();
                Some(kind)
            } else {
                None
            }
        } else {
            None
        };

        let (name, name_span) = self.consume_identifier()?;

        if self.check(TokenType::LParen) {
            // Method or accessor.
            let id = self.next_id();
            let func_id = self.next_id();
            self.advance();
            let params = self.param_list(true)?;
            let return_type = if self.match_token(TokenType::Colon) {
                Some(self.parse_type()?)
            } else {
                None
            };
            let body = FuncBody::Block(self.block()?);
            let span = start.merge(self.previous_span);
            return Ok(ClassMember::Method(MethodDef {
                id,
                kind: accessor_kind.unwrap_or(MethodKind::Method),
                is_static,
                func: Function {
                    id: func_id,
                    annotations,
                    name: Some(name),
                    params,
                    return_type,
                    body,
                    is_arrow: false,
                    span,
                },
                span,
            }));
        }

        // Property: `name: T = init`
        let ty = if self.match_token(TokenType::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let init = if self.match_token(TokenType::Eq) {
            Some(self.expression()?)
        } else {
            None
        };
        self.terminate_stmt();
        Ok(ClassMember::Property(PropertyDef {
            id: self.next_id(),
            annotations,
            name,
            ty,
            init,
            span: name_span.merge(self.previous_span),
        }))
    }

    /// `type Name = TypeExpr`
    fn type_alias(&mut self, annotations: Vec<Annotation>) -> Result<Stmt, ParseError> {
        let start = self.consume(TokenType::KwType, "type")?.span;
        let (name, _) = self.consume_identifier()?;
        let id = self.next_id();
        self.consume(TokenType::Eq, "=")?;
        let ty = self.parse_type()?;
        self.terminate_stmt();
        Ok(Stmt::TypeAlias(TypeAliasDecl {
            id,
            annotations,
            name,
            ty,
            span: start.merge(self.previous_span),
        }))
    }

    /// `import { a, b } from "module"`
    pub(crate) fn import_declaration(&mut self) -> Result<Stmt, ParseError> {
        let start = self.consume(TokenType::KwImport, "import")?.span;
        let id = self.next_id();
        self.consume(TokenType::LBrace, "{")?;
        let mut names = Vec::new();
        if !self.check(TokenType::RBrace) {
            loop {
                let (name, _) = self.consume_identifier()?;
                names.push(name);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RBrace, "}")?;
        self.consume(TokenType::KwFrom, "from")?;
        let module_token = self.consume(TokenType::StringLiteral, "module path")?;
        let module = module_token.lexeme.to_string();
        self.terminate_stmt();
        Ok(Stmt::Import(ImportDecl {
            id,
            names,
            module,
            span: start.merge(self.previous_span),
        }))
    }
}
