// src/diagnostics.rs
//
// Read-only contract checks over the classified unit. One structured walk
// maintains the scope stack and evaluates every check: an out-of-context
// memo call is fatal and unwinds the stage, everything else accumulates
// into the returned sink and compilation continues.

use miette::SourceSpan;

use murre_frontend::ast::*;
use murre_frontend::desugar::is_gensym_name;
use murre_frontend::resolve::{Bindings, DeclSite};
use murre_frontend::{Interner, Span, Symbol};

use crate::catalog::DeclCatalog;
use crate::errors::{MemoDiagnostic, MemoError};
use crate::kinds::MemoKind;
use crate::tables::ClassifierTables;
use crate::walk::any_expr;

pub fn check_program(
    program: &Program,
    tables: &ClassifierTables,
    catalog: &DeclCatalog,
    bindings: &Bindings,
    interner: &Interner,
) -> Result<Vec<MemoDiagnostic>, MemoError> {
    let mut checker = Checker {
        tables,
        catalog,
        bindings,
        interner,
        current_class: None,
        frames: Vec::new(),
        sink: Vec::new(),
    };
    for stmt in &program.statements {
        checker.stmt(stmt)?;
    }
    Ok(checker.sink)
}

/// One frame per function-like node currently being walked. The kind is the
/// classification of the frame's function, so each check can ask the exact
/// question it needs of the innermost scope.
#[derive(Clone, Copy)]
struct Frame {
    name: Option<Symbol>,
    kind: MemoKind,
}

struct Checker<'a> {
    tables: &'a ClassifierTables,
    catalog: &'a DeclCatalog,
    bindings: &'a Bindings,
    interner: &'a Interner,
    current_class: Option<NodeId>,
    frames: Vec<Frame>,
    sink: Vec<MemoDiagnostic>,
}

impl Checker<'_> {
    fn name_string(&self, name: Option<Symbol>) -> String {
        match name {
            Some(sym) => self.interner.resolve(sym).to_string(),
            None => "anonymous".to_string(),
        }
    }

    fn scope_name(&self) -> String {
        self.name_string(self.frames.last().and_then(|f| f.name))
    }

    /// Hidden arguments are in scope here: memo and intrinsic bodies carry
    /// them as parameters, entry bodies declare them by hand.
    fn in_memo_context(&self) -> bool {
        self.frames.last().is_some_and(|f| f.kind.in_memo_context())
    }

    /// The innermost function's parameters are cache keys.
    fn in_memo_function(&self) -> bool {
        self.frames.last().is_some_and(|f| f.kind.is_memo())
    }

    fn function(&mut self, func: &Function) -> Result<(), MemoError> {
        let kind = self.tables.function_kind(func.id);
        if kind.rewrites_signature() && func.return_type.is_none() {
            self.sink.push(MemoDiagnostic::MissingReturnType {
                name: self.name_string(func.name),
                span: func.span.into(),
            });
        }
        self.frames.push(Frame {
            name: func.name,
            kind,
        });
        let result = self.function_children(func);
        self.frames.pop();
        result
    }

    fn function_children(&mut self, func: &Function) -> Result<(), MemoError> {
        for param in &func.params {
            if let Some(default) = &param.default {
                self.expr(default)?;
            }
        }
        match &func.body {
            FuncBody::Block(block) => self.block(block),
            FuncBody::Expr(expr) => self.expr(expr),
        }
    }

    /// A memo call to a signature-extended callee is only legal where the
    /// hidden arguments exist to forward.
    fn check_call(&self, call: &CallExpr, span: Span) -> Result<(), MemoError> {
        let Some(callable) =
            self.catalog
                .resolve_call(&call.callee, self.bindings, self.current_class)
        else {
            return Ok(());
        };
        if !callable.kind(self.tables).rewrites_signature() || self.in_memo_context() {
            return Ok(());
        }
        Err(MemoError::OutOfContextCall {
            callee: self.name_string(callable.name),
            scope: self.scope_name(),
            span: span.into(),
        })
    }

    fn check_assignment(&mut self, assign: &AssignExpr, span: Span) {
        if !self.in_memo_function() {
            return;
        }
        let ExprKind::Identifier(name) = &assign.target.kind else {
            return;
        };
        // Resolving through the default-value lowering catches reassignment
        // of a parameter the desugarer renamed.
        let resolved = self.bindings.resolve_through(assign.target.id).site();
        if matches!(resolved, Some(DeclSite::Param(_))) {
            self.sink.push(MemoDiagnostic::ParameterReassignment {
                name: self.interner.resolve(*name).to_string(),
                span: span.into(),
            });
        }
    }

    /// Forwarding declarations produced from parameter defaults have the
    /// shape `gensym !== undefined ? gensym : <default>`. A memo call in the
    /// default branch would run only when the caller omits the argument.
    fn check_forwarding_declarator(&mut self, declarator: &VarDeclarator) {
        let Some(init) = &declarator.init else {
            return;
        };
        let ExprKind::Conditional(cond) = &init.kind else {
            return;
        };
        if !self.references_gensym(&cond.test) {
            return;
        }
        if let Some((callee, span)) = self.find_memo_call(&cond.alternate) {
            self.sink
                .push(MemoDiagnostic::DefaultValueMemoCall { callee, span });
        }
    }

    fn references_gensym(&self, expr: &Expr) -> bool {
        let interner = self.interner;
        any_expr(expr, &mut |e| match &e.kind {
            ExprKind::Identifier(name) => is_gensym_name(interner.resolve(*name)),
            _ => false,
        })
    }

    fn find_memo_call(&self, expr: &Expr) -> Option<(String, SourceSpan)> {
        let catalog = self.catalog;
        let bindings = self.bindings;
        let tables = self.tables;
        let interner = self.interner;
        let class = self.current_class;
        let mut found: Option<(String, SourceSpan)> = None;
        any_expr(expr, &mut |e| {
            if found.is_some() {
                return true;
            }
            let ExprKind::Call(call) = &e.kind else {
                return false;
            };
            let Some(callable) = catalog.resolve_call(&call.callee, bindings, class) else {
                return false;
            };
            if !callable.kind(tables).is_memo() {
                return false;
            }
            let name = match callable.name {
                Some(sym) => interner.resolve(sym).to_string(),
                None => "anonymous".to_string(),
            };
            found = Some((name, e.span.into()));
            true
        });
        found
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), MemoError> {
        match stmt {
            Stmt::Function(func) => self.function(func),
            Stmt::Variable(decl) => {
                for declarator in &decl.declarators {
                    self.check_forwarding_declarator(declarator);
                    if let Some(init) = &declarator.init {
                        self.expr(init)?;
                    }
                }
                Ok(())
            }
            Stmt::Class(class) => {
                let previous = self.current_class.replace(class.id);
                for member in &class.members {
                    match member {
                        ClassMember::Method(method) => self.function(&method.func)?,
                        ClassMember::Property(prop) => {
                            if let Some(init) = &prop.init {
                                self.expr(init)?;
                            }
                        }
                    }
                }
                self.current_class = previous;
                Ok(())
            }
            Stmt::Return(ret) => match &ret.value {
                Some(value) => self.expr(value),
                None => Ok(()),
            },
            Stmt::If(stmt) => {
                self.expr(&stmt.test)?;
                self.block(&stmt.consequent)?;
                match &stmt.alternate {
                    Some(alternate) => self.block(alternate),
                    None => Ok(()),
                }
            }
            Stmt::While(stmt) => {
                self.expr(&stmt.test)?;
                self.block(&stmt.body)
            }
            Stmt::Throw(stmt) => self.expr(&stmt.value),
            Stmt::Expr(stmt) => self.expr(&stmt.expr),
            Stmt::Block(block) => self.block(block),
            Stmt::TypeAlias(_) | Stmt::Import(_) => Ok(()),
        }
    }

    fn block(&mut self, block: &Block) -> Result<(), MemoError> {
        for stmt in &block.stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), MemoError> {
        match &expr.kind {
            ExprKind::Arrow(func) => self.function(func),
            ExprKind::Call(call) => {
                self.expr(&call.callee)?;
                for arg in &call.args {
                    self.expr(arg)?;
                }
                self.check_call(call, expr.span)
            }
            ExprKind::Assign(assign) => {
                self.expr(&assign.target)?;
                self.expr(&assign.value)?;
                self.check_assignment(assign, expr.span);
                Ok(())
            }
            ExprKind::Member(member) => self.expr(&member.object),
            ExprKind::Conditional(cond) => {
                self.expr(&cond.test)?;
                self.expr(&cond.consequent)?;
                self.expr(&cond.alternate)
            }
            ExprKind::Binary(binary) => {
                self.expr(&binary.left)?;
                self.expr(&binary.right)
            }
            ExprKind::Unary(unary) => self.expr(&unary.operand),
            ExprKind::ObjectLiteral(object) => {
                for field in &object.fields {
                    self.expr(&field.value)?;
                }
                Ok(())
            }
            ExprKind::ArrayLiteral(elements) => {
                for element in elements {
                    self.expr(element)?;
                }
                Ok(())
            }
            ExprKind::As(cast) => self.expr(&cast.expr),
            ExprKind::Paren(inner) => self.expr(inner),
            ExprKind::Identifier(_)
            | ExprKind::This
            | ExprKind::Undefined
            | ExprKind::NumberLiteral(_)
            | ExprKind::StringLiteral(_)
            | ExprKind::BoolLiteral(_) => Ok(()),
        }
    }
}
