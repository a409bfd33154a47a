// src/parser/stmt.rs
//
// Statement and block parsing.

use super::Parser;
use crate::ast::*;
use crate::errors::ParseError;
use crate::TokenType;

impl<'src> Parser<'src> {
    pub(crate) fn statement(&mut self) -> Result<Stmt, ParseError> {
        match self.current.ty {
            TokenType::KwImport => self.import_declaration(),
            TokenType::At
            | TokenType::KwFunction
            | TokenType::KwConst
            | TokenType::KwLet
            | TokenType::KwClass
            | TokenType::KwType => self.annotated_declaration(),
            TokenType::KwReturn => self.return_statement(),
            TokenType::KwIf => self.if_statement(),
            TokenType::KwWhile => self.while_statement(),
            TokenType::KwThrow => self.throw_statement(),
            TokenType::LBrace => Ok(Stmt::Block(self.block()?)),
            TokenType::Semicolon => {
                // Stray terminator: consume and parse the next statement.
                self.advance();
                self.statement()
            }
            _ => self.expression_statement(),
        }
    }

    pub(crate) fn block(&mut self) -> Result<Block, ParseError> {
        let start = self.consume(TokenType::LBrace, "{")?.span;
        let id = self.next_id();
        let mut stmts = Vec::new();
        while !self.check(TokenType::RBrace) && !self.check(TokenType::Eof) {
            if self.match_token(TokenType::Semicolon) {
                continue;
            }
            stmts.push(self.statement()?);
        }
        self.consume(TokenType::RBrace, "}")?;
        Ok(Block {
            id,
            stmts,
            span: start.merge(self.previous_span),
        })
    }

    fn return_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.consume(TokenType::KwReturn, "return")?.span;
        let id = self.next_id();
        let value = if self.at_stmt_boundary() {
            None
        } else {
            Some(self.expression()?)
        };
        self.terminate_stmt();
        Ok(Stmt::Return(ReturnStmt {
            id,
            value,
            span: start.merge(self.previous_span),
        }))
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.consume(TokenType::KwIf, "if")?.span;
        let id = self.next_id();
        self.consume(TokenType::LParen, "(")?;
        let test = self.expression()?;
        self.consume(TokenType::RParen, ")")?;
        let consequent = self.block()?;

        let alternate = if self.match_token(TokenType::KwElse) {
            if self.check(TokenType::KwIf) {
                // `else if` nests inside a synthesized block.
                let nested = self.if_statement()?;
                let span = nested.span();
                Some(Block {
                    id: self.next_id(),
                    stmts: vec![nested],
                    span,
                })
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };

        Ok(Stmt::If(IfStmt {
            id,
            test,
            consequent,
            alternate,
            span: start.merge(self.previous_span),
        }))
    }

    fn while_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.consume(TokenType::KwWhile, "while")?.span;
        let id = self.next_id();
        self.consume(TokenType::LParen, "(")?;
        let test = self.expression()?;
        self.consume(TokenType::RParen, ")")?;
        let body = self.block()?;
        Ok(Stmt::While(WhileStmt {
            id,
            test,
            body,
            span: start.merge(self.previous_span),
        }))
    }

    fn throw_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.consume(TokenType::KwThrow, "throw")?.span;
        let id = self.next_id();
        let value = self.expression()?;
        self.terminate_stmt();
        Ok(Stmt::Throw(ThrowStmt {
            id,
            value,
            span: start.merge(self.previous_span),
        }))
    }

    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let id = self.next_id();
        let expr = self.expression()?;
        let span = expr.span;
        self.terminate_stmt();
        Ok(Stmt::Expr(ExprStmt { id, expr, span }))
    }
}
