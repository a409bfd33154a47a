// src/parser/expr.rs
//
// Expression parsing: Pratt binary operators, conditionals, assignment,
// call/member suffixes, arrow functions, and literals.

use super::Parser;
use crate::ast::*;
use crate::errors::{ParseError, ParserError};
use crate::TokenType;

/// Binding powers for the Pratt loop. Zero means "not a binary operator".
fn precedence(ty: TokenType) -> u8 {
    match ty {
        TokenType::PipePipe => 1,
        TokenType::AmpAmp => 2,
        TokenType::EqEq | TokenType::BangEq | TokenType::EqEqEq | TokenType::BangEqEq => 3,
        TokenType::Lt | TokenType::Gt | TokenType::LtEq | TokenType::GtEq => 4,
        TokenType::Plus | TokenType::Minus => 5,
        TokenType::Star | TokenType::Slash | TokenType::Percent => 6,
        _ => 0,
    }
}

fn binary_op(ty: TokenType) -> BinaryOp {
    match ty {
        TokenType::PipePipe => BinaryOp::Or,
        TokenType::AmpAmp => BinaryOp::And,
        TokenType::EqEq => BinaryOp::Eq,
        TokenType::BangEq => BinaryOp::Ne,
        TokenType::EqEqEq => BinaryOp::StrictEq,
        TokenType::BangEqEq => BinaryOp::StrictNe,
        TokenType::Lt => BinaryOp::Lt,
        TokenType::Gt => BinaryOp::Gt,
        TokenType::LtEq => BinaryOp::Le,
        TokenType::GtEq => BinaryOp::Ge,
        TokenType::Plus => BinaryOp::Add,
        TokenType::Minus => BinaryOp::Sub,
        TokenType::Star => BinaryOp::Mul,
        TokenType::Slash => BinaryOp::Div,
        TokenType::Percent => BinaryOp::Mod,
        _ => unreachable!("not a binary operator"),
    }
}

impl<'src> Parser<'src> {
    /// Parse a full expression, including assignment.
    pub(crate) fn expression(&mut self) -> Result<Expr, ParseError> {
        let left = self.conditional()?;

        if self.check(TokenType::Eq) {
            if !matches!(left.kind, ExprKind::Identifier(_) | ExprKind::Member(_)) {
                return Err(ParseError::new(
                    ParserError::InvalidAssignmentTarget {
                        span: left.span.into(),
                    },
                    left.span,
                ));
            }
            self.advance();
            let value = self.expression()?;
            let span = left.span.merge(value.span);
            return Ok(Expr {
                id: self.next_id(),
                kind: ExprKind::Assign(Box::new(AssignExpr {
                    target: left,
                    value,
                })),
                span,
            });
        }

        Ok(left)
    }

    /// `test ? consequent : alternate`
    fn conditional(&mut self) -> Result<Expr, ParseError> {
        let test = self.binary(0)?;
        if !self.match_token(TokenType::Question) {
            return Ok(test);
        }
        let consequent = self.expression()?;
        self.consume(TokenType::Colon, ":")?;
        let alternate = self.expression()?;
        let span = test.span.merge(alternate.span);
        Ok(Expr {
            id: self.next_id(),
            kind: ExprKind::Conditional(Box::new(ConditionalExpr {
                test,
                consequent,
                alternate,
            })),
            span,
        })
    }

    /// Pratt loop over binary operators.
    fn binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;
        while precedence(self.current.ty) > min_prec {
            let op_ty = self.current.ty;
            self.advance();
            let right = self.binary(precedence(op_ty))?;
            let span = left.span.merge(right.span);
            left = Expr {
                id: self.next_id(),
                kind: ExprKind::Binary(Box::new(BinaryExpr {
                    op: binary_op(op_ty),
                    left,
                    right,
                })),
                span,
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current.ty {
            TokenType::Bang => Some(UnaryOp::Not),
            TokenType::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span;
            let operand = self.unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr {
                id: self.next_id(),
                kind: ExprKind::Unary(Box::new(UnaryExpr { op, operand })),
                span,
            });
        }
        self.cast_chain()
    }

    /// Postfix expression followed by any number of `as Type` casts.
    fn cast_chain(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.postfix()?;
        while self.match_token(TokenType::KwAs) {
            let ty = self.parse_type()?;
            let span = expr.span.merge(ty.span);
            expr = Expr {
                id: self.next_id(),
                kind: ExprKind::As(Box::new(AsExpr { expr, ty })),
                span,
            };
        }
        Ok(expr)
    }

    /// Member accesses and call suffixes, including `callee<T>(args)`.
    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            match self.current.ty {
                TokenType::Dot => {
                    self.advance();
                    let (property, property_span) = self.consume_identifier()?;
                    let span = expr.span.merge(property_span);
                    expr = Expr {
                        id: self.next_id(),
                        kind: ExprKind::Member(Box::new(MemberExpr {
                            object: expr,
                            property,
                            property_span,
                        })),
                        span,
                    };
                }
                // A suffix on a new line starts a new statement instead.
                TokenType::LParen if !self.newline_before => {
                    self.advance();
                    let args = self.call_args()?;
                    let span = expr.span.merge(self.previous_span);
                    expr = Expr {
                        id: self.next_id(),
                        kind: ExprKind::Call(Box::new(CallExpr {
                            callee: expr,
                            type_args: Vec::new(),
                            args,
                        })),
                        span,
                    };
                }
                TokenType::Lt if !self.newline_before && self.type_args_ahead() => {
                    self.advance();
                    let mut type_args = vec![self.parse_type()?];
                    while self.match_token(TokenType::Comma) {
                        type_args.push(self.parse_type()?);
                    }
                    self.consume(TokenType::Gt, ">")?;
                    self.consume(TokenType::LParen, "(")?;
                    let args = self.call_args()?;
                    let span = expr.span.merge(self.previous_span);
                    expr = Expr {
                        id: self.next_id(),
                        kind: ExprKind::Call(Box::new(CallExpr {
                            callee: expr,
                            type_args,
                            args,
                        })),
                        span,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if !self.check(TokenType::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
                if self.check(TokenType::RParen) {
                    break; // trailing comma
                }
            }
        }
        self.consume(TokenType::RParen, ")")?;
        Ok(args)
    }

    /// Decide whether `<` after an expression opens a type-argument list.
    /// Scans ahead with a cloned lexer for a balanced `<...>` made of
    /// type-level tokens, followed by `(`.
    fn type_args_ahead(&self) -> bool {
        let mut lexer_copy = self.lexer.clone();
        let mut depth: u32 = 1;
        for _ in 0..64 {
            let mut token = lexer_copy.next_token();
            while token.ty == TokenType::Newline {
                token = lexer_copy.next_token();
            }
            match token.ty {
                TokenType::Lt => depth += 1,
                TokenType::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        let mut after = lexer_copy.next_token();
                        while after.ty == TokenType::Newline {
                            after = lexer_copy.next_token();
                        }
                        return after.ty == TokenType::LParen;
                    }
                }
                TokenType::Identifier
                | TokenType::KwVoid
                | TokenType::KwThis
                | TokenType::KwUndefined
                | TokenType::Comma
                | TokenType::Pipe
                | TokenType::Dot
                | TokenType::At
                | TokenType::Colon
                | TokenType::FatArrow
                | TokenType::LParen
                | TokenType::RParen
                | TokenType::LBracket
                | TokenType::RBracket => {}
                _ => return false,
            }
        }
        false
    }

    /// Decide whether `(` opens an arrow function's parameter list: scan to
    /// the matching `)` and look for `=>` or a `:` return annotation.
    fn arrow_ahead(&self) -> bool {
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
                        return matches!(after.ty, TokenType::FatArrow | TokenType::Colon);
                    }
                }
                TokenType::Eof => return false,
                _ => {}
            }
        }
    }

    /// Parse an arrow function starting at `(`.
    fn arrow_function(&mut self, annotations: Vec<Annotation>) -> Result<Expr, ParseError> {
        let start = self.consume(TokenType::LParen, "(")?.span;
        let id = self.next_id();
        let params = self.param_list(true)?;
        let return_type = if self.match_token(TokenType::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.consume(TokenType::FatArrow, "=>")?;
        let body = if self.check(TokenType::LBrace) {
            FuncBody::Block(self.block()?)
        } else {
            FuncBody::Expr(Box::new(self.expression()?))
        };
        let span = start.merge(self.previous_span);
        Ok(Expr {
            id: self.next_id(),
            kind: ExprKind::Arrow(Box::new(Function {
                id,
                annotations,
                name: None,
                params,
                return_type,
                body,
                is_arrow: true,
                span,
            })),
            span,
        })
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.current.ty {
            TokenType::NumberLiteral => {
                let token = self.advance();
                let value: f64 = token.lexeme.parse().unwrap_or_default();
                Ok(Expr {
                    id: self.next_id(),
                    kind: ExprKind::NumberLiteral(value),
                    span: token.span,
                })
            }
            TokenType::StringLiteral => {
                let token = self.advance();
                Ok(Expr {
                    id: self.next_id(),
                    kind: ExprKind::StringLiteral(token.lexeme.to_string()),
                    span: token.span,
                })
            }
            TokenType::KwTrue | TokenType::KwFalse => {
                let token = self.advance();
                Ok(Expr {
                    id: self.next_id(),
                    kind: ExprKind::BoolLiteral(token.ty == TokenType::KwTrue),
                    span: token.span,
                })
            }
            TokenType::KwUndefined => {
                let token = self.advance();
                Ok(Expr {
                    id: self.next_id(),
                    kind: ExprKind::Undefined,
                    span: token.span,
                })
            }
            TokenType::KwThis => {
                let token = self.advance();
                Ok(Expr {
                    id: self.next_id(),
                    kind: ExprKind::This,
                    span: token.span,
                })
            }
            TokenType::Identifier => {
                let token = self.advance();
                let sym = self.interner.intern(&token.lexeme);
                Ok(Expr {
                    id: self.next_id(),
                    kind: ExprKind::Identifier(sym),
                    span: token.span,
                })
            }
            // `@memo (x) => ...` in expression position.
            TokenType::At => {
                let annotations = self.annotations()?;
                if self.check(TokenType::LParen) {
                    self.arrow_function(annotations)
                } else {
                    Err(self.error_unexpected())
                }
            }
            TokenType::LParen => {
                if self.arrow_ahead() {
                    return self.arrow_function(Vec::new());
                }
                self.advance();
                let inner = self.expression()?;
                self.consume(TokenType::RParen, ")")?;
                let span = inner.span;
                Ok(Expr {
                    id: self.next_id(),
                    kind: ExprKind::Paren(Box::new(inner)),
                    span,
                })
            }
            TokenType::LBrace => self.object_literal(),
            TokenType::LBracket => {
                let start = self.advance().span;
                let mut elements = Vec::new();
                if !self.check(TokenType::RBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.match_token(TokenType::Comma) {
                            break;
                        }
                        if self.check(TokenType::RBracket) {
                            break;
                        }
                    }
                }
                self.consume(TokenType::RBracket, "]")?;
                Ok(Expr {
                    id: self.next_id(),
                    kind: ExprKind::ArrayLiteral(elements),
                    span: start.merge(self.previous_span),
                })
            }
            _ => Err(ParseError::new(
                ParserError::ExpectedExpression {
                    found: self.current.lexeme.to_string(),
                    span: self.current.span.into(),
                },
                self.current.span,
            )),
        }
    }

    fn object_literal(&mut self) -> Result<Expr, ParseError> {
        let start = self.consume(TokenType::LBrace, "{")?.span;
        let mut fields = Vec::new();
        while !self.check(TokenType::RBrace) && !self.check(TokenType::Eof) {
            let (name, name_span) = self.consume_identifier()?;
            self.consume(TokenType::Colon, ":")?;
            let value = self.expression()?;
            let span = name_span.merge(value.span);
            fields.push(ObjectField {
                id: self.next_id(),
                name,
                value,
                span,
            });
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        self.consume(TokenType::RBrace, "}")?;
        Ok(Expr {
            id: self.next_id(),
            kind: ExprKind::ObjectLiteral(ObjectLiteral { fields }),
            span: start.merge(self.previous_span),
        })
    }
}
