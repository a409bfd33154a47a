// src/parser/mod.rs
//
// Recursive-descent parser for the murre dialect. Declaration, statement,
// expression, and type parsing live in the sibling files; this module owns
// the parser state and the token-level helpers.

mod decl;
mod expr;
mod stmt;
mod types;

use crate::ast::*;
use crate::errors::{LexerError, ParseError, ParserError};
use crate::lexer::Lexer;
use crate::{Interner, Span, Symbol, Token, TokenType};

pub struct Parser<'src> {
    pub(crate) lexer: Lexer<'src>,
    pub(crate) current: Token<'src>,
    /// Span of the most recently consumed token.
    pub(crate) previous_span: Span,
    /// True when a newline separated the previous token from `current`.
    /// Drives statement termination (`return` with no value) and keeps a
    /// call suffix on a new line from attaching to the previous expression.
    pub(crate) newline_before: bool,
    pub(crate) interner: Interner,
    next_node_id: u32,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let mut newline_before = false;
        let mut current = lexer.next_token();
        while current.ty == TokenType::Newline {
            newline_before = true;
            current = lexer.next_token();
        }
        Self {
            lexer,
            current,
            previous_span: Span::default(),
            newline_before,
            interner: Interner::new(),
            next_node_id: 0,
            errors: Vec::new(),
        }
    }

    /// Parse a whole compilation unit. All recoverable errors are collected;
    /// any error fails the parse.
    pub fn parse_program(&mut self) -> Result<Program, Vec<ParseError>> {
        let mut statements = Vec::new();
        while !self.check(TokenType::Eof) {
            match self.statement() {
                Ok(stmt) => statements.push(stmt),
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize();
                }
            }
        }
        if !self.errors.is_empty() {
            return Err(std::mem::take(&mut self.errors));
        }
        Ok(Program {
            statements,
            next_node_id: self.next_node_id,
        })
    }

    /// Lexer-level errors collected while scanning (unterminated strings etc).
    pub fn take_lexer_errors(&mut self) -> Vec<LexerError> {
        self.lexer.take_errors()
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn into_interner(self) -> Interner {
        self.interner
    }

    // -----------------------------------------------------------------------
    // Token helpers
    // -----------------------------------------------------------------------

    pub(crate) fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    /// Move to the next token, skipping newlines but remembering that one
    /// was crossed. Returns the consumed token.
    pub(crate) fn advance(&mut self) -> Token<'src> {
        self.previous_span = self.current.span;
        let mut next = self.lexer.next_token();
        let mut crossed_newline = false;
        while next.ty == TokenType::Newline {
            crossed_newline = true;
            next = self.lexer.next_token();
        }
        self.newline_before = crossed_newline;
        std::mem::replace(&mut self.current, next)
    }

    pub(crate) fn check(&self, ty: TokenType) -> bool {
        self.current.ty == ty
    }

    /// Consume the current token if it matches.
    pub(crate) fn match_token(&mut self, ty: TokenType) -> bool {
        if self.check(ty) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn consume(
        &mut self,
        ty: TokenType,
        expected: &str,
    ) -> Result<Token<'src>, ParseError> {
        if self.check(ty) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(expected))
        }
    }

    pub(crate) fn consume_identifier(&mut self) -> Result<(Symbol, Span), ParseError> {
        if self.check(TokenType::Identifier) {
            let token = self.advance();
            let sym = self.interner.intern(&token.lexeme);
            Ok((sym, token.span))
        } else {
            Err(ParseError::new(
                ParserError::ExpectedIdentifier {
                    span: self.current.span.into(),
                },
                self.current.span,
            ))
        }
    }

    pub(crate) fn error_expected(&self, expected: &str) -> ParseError {
        ParseError::new(
            ParserError::ExpectedToken {
                expected: expected.to_string(),
                found: self.current.lexeme.to_string(),
                span: self.current.span.into(),
            },
            self.current.span,
        )
    }

    pub(crate) fn error_unexpected(&self) -> ParseError {
        ParseError::new(
            ParserError::UnexpectedToken {
                token: self.current.lexeme.to_string(),
                span: self.current.span.into(),
            },
            self.current.span,
        )
    }

    /// Skip an optional statement terminator (`;`).
    pub(crate) fn terminate_stmt(&mut self) {
        while self.match_token(TokenType::Semicolon) {}
    }

    /// True when the current token ends a statement without an expression:
    /// a newline was crossed, or a closer/terminator is next.
    pub(crate) fn at_stmt_boundary(&self) -> bool {
        self.newline_before
            || self.check(TokenType::Semicolon)
            || self.check(TokenType::RBrace)
            || self.check(TokenType::Eof)
    }

    /// Skip forward to a likely statement start after a parse error.
    fn synchronize(&mut self) {
        while !self.check(TokenType::Eof) {
            if self.newline_before || self.check(TokenType::Semicolon) {
                if self.check(TokenType::Semicolon) {
                    self.advance();
                }
                return;
            }
            match self.current.ty {
                TokenType::KwFunction
                | TokenType::KwConst
                | TokenType::KwLet
                | TokenType::KwClass
                | TokenType::KwType
                | TokenType::KwImport
                | TokenType::KwReturn
                | TokenType::KwIf
                | TokenType::KwWhile
                | TokenType::RBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        let mut parser = Parser::new(source);
        parser.parse_program().unwrap()
    }

    fn parse_err(source: &str) -> Vec<ParseError> {
        let mut parser = Parser::new(source);
        parser.parse_program().unwrap_err()
    }

    #[test]
    fn parses_annotated_function() {
        let program = parse("@memo function render(count: number): void { count }");
        assert_eq!(program.statements.len(), 1);
        let Stmt::Function(func) = &program.statements[0] else {
            panic!("expected function declaration");
        };
        assert_eq!(func.annotations.len(), 1);
        assert_eq!(func.params.len(), 1);
        assert!(func.return_type.as_ref().unwrap().is_void());
        assert!(!func.is_arrow);
    }

    #[test]
    fn parses_param_annotations_and_rest() {
        let program = parse("function f(@memo_skip a: number, ...rest: number): void {}");
        let Stmt::Function(func) = &program.statements[0] else {
            panic!("expected function");
        };
        assert_eq!(func.params[0].annotations.len(), 1);
        assert!(func.params[1].is_rest);
    }

    #[test]
    fn parses_receiver_parameter() {
        let program = parse("function style(this: Chip, width: number): this { return this }");
        let Stmt::Function(func) = &program.statements[0] else {
            panic!("expected function");
        };
        assert!(func.has_receiver());
        assert!(func.return_type.as_ref().unwrap().is_this());
    }

    #[test]
    fn parses_arrow_with_expression_body() {
        let program = parse("const double = (x: number) => x + x");
        let Stmt::Variable(decl) = &program.statements[0] else {
            panic!("expected variable declaration");
        };
        let init = decl.declarators[0].init.as_ref().unwrap();
        let ExprKind::Arrow(arrow) = &init.kind else {
            panic!("expected arrow function");
        };
        assert!(arrow.is_arrow);
        assert!(matches!(arrow.body, FuncBody::Expr(_)));
    }

    #[test]
    fn parses_class_with_accessor_and_method() {
        let program = parse(
            "@memo_stable class Chip {\n  get label(): string { return \"x\" }\n  @memo build(): void {}\n}",
        );
        let Stmt::Class(class) = &program.statements[0] else {
            panic!("expected class");
        };
        assert_eq!(class.annotations.len(), 1);
        assert_eq!(class.members.len(), 2);
        let ClassMember::Method(getter) = &class.members[0] else {
            panic!("expected method");
        };
        assert!(getter.kind.is_accessor());
        let ClassMember::Method(method) = &class.members[1] else {
            panic!("expected method");
        };
        assert_eq!(method.kind, MethodKind::Method);
        assert_eq!(method.func.annotations.len(), 1);
    }

    #[test]
    fn parses_memo_function_type_alias() {
        let program = parse("type Builder = @memo (content: string) => void");
        let Stmt::TypeAlias(alias) = &program.statements[0] else {
            panic!("expected type alias");
        };
        let TypeKind::Function(ft) = &alias.ty.kind else {
            panic!("expected function type");
        };
        assert_eq!(ft.annotations.len(), 1);
        assert_eq!(ft.params.len(), 1);
    }

    #[test]
    fn parses_call_with_type_arguments() {
        let program = parse("const s = __memo_context.scope<void>(__memo_id + 7, 2)");
        let Stmt::Variable(decl) = &program.statements[0] else {
            panic!("expected variable declaration");
        };
        let init = decl.declarators[0].init.as_ref().unwrap();
        let ExprKind::Call(call) = &init.kind else {
            panic!("expected call");
        };
        assert_eq!(call.type_args.len(), 1);
        assert_eq!(call.args.len(), 2);
        assert!(matches!(call.callee.kind, ExprKind::Member(_)));
    }

    #[test]
    fn type_argument_scan_does_not_break_comparison() {
        let program = parse("const c = a < b");
        let Stmt::Variable(decl) = &program.statements[0] else {
            panic!("expected variable declaration");
        };
        let init = decl.declarators[0].init.as_ref().unwrap();
        assert!(matches!(init.kind, ExprKind::Binary(_)));
    }

    #[test]
    fn parses_default_parameter_value() {
        let program = parse("function f(x: number = 1): void {}");
        let Stmt::Function(func) = &program.statements[0] else {
            panic!("expected function");
        };
        assert!(func.params[0].default.is_some());
    }

    #[test]
    fn parses_import_declaration() {
        let program = parse("import { __memo_context_type, __memo_id_type } from \"@memo/runtime\"");
        let Stmt::Import(import) = &program.statements[0] else {
            panic!("expected import");
        };
        assert_eq!(import.names.len(), 2);
        assert_eq!(import.module, "@memo/runtime");
    }

    #[test]
    fn return_without_value_stops_at_newline() {
        let program = parse("function f(): void {\n  return\n  f()\n}");
        let Stmt::Function(func) = &program.statements[0] else {
            panic!("expected function");
        };
        let FuncBody::Block(block) = &func.body else {
            panic!("expected block body");
        };
        assert!(matches!(&block.stmts[0], Stmt::Return(r) if r.value.is_none()));
        assert!(matches!(&block.stmts[1], Stmt::Expr(_)));
    }

    #[test]
    fn reports_error_for_bad_assignment_target() {
        let errors = parse_err("function f(): void { 1 = 2 }");
        assert!(errors
            .iter()
            .any(|e| matches!(e.error, ParserError::InvalidAssignmentTarget { .. })));
    }

    #[test]
    fn node_ids_are_unique_and_dense() {
        let program = parse("function f(a: number): number { return a + 1 }");
        assert!(program.next_node_id > 0);
    }

    #[test]
    fn parses_conditional_with_strict_inequality() {
        let program = parse("const x = gensym$_1 !== undefined ? gensym$_1 : compute()");
        let Stmt::Variable(decl) = &program.statements[0] else {
            panic!("expected variable declaration");
        };
        let init = decl.declarators[0].init.as_ref().unwrap();
        let ExprKind::Conditional(cond) = &init.kind else {
            panic!("expected conditional");
        };
        assert!(matches!(
            &cond.test.kind,
            ExprKind::Binary(b) if b.op == BinaryOp::StrictNe
        ));
    }

    #[test]
    fn parses_object_literal_and_as_cast() {
        let program = parse("f({ width: 10, label: \"hi\" } as ChipOptions)");
        let Stmt::Expr(stmt) = &program.statements[0] else {
            panic!("expected expression statement");
        };
        let ExprKind::Call(call) = &stmt.expr.kind else {
            panic!("expected call");
        };
        assert!(matches!(call.args[0].kind, ExprKind::As(_)));
    }
}
