// src/params.rs
//
// Routes parameter access inside a memoized body through the cache cells:
// identifier reads become `<cell>.value`, calls through a cached callback
// become `<cell>.value(...)`, and `this` goes through the synthesized this
// slot. Rewriting is resolution-driven, so synthesized nodes (which have no
// binding entries) are never self-rewritten.

use murre_frontend::ast::*;
use murre_frontend::resolve::{Bindings, DeclSite};
use murre_frontend::Symbol;
use rustc_hash::FxHashMap;

use crate::factory::Factory;

/// One trackable parameter's cache cell.
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    pub name: Symbol,
    /// Function-typed parameters are called through the cell rather than
    /// read from it.
    pub callable: bool,
}

/// Per-function rewrite configuration, built by the function transformer
/// and discarded with it. Keys are binding sites: the parameter node, or
/// the forwarding declarator for a lowered default parameter.
#[derive(Debug, Default)]
pub struct CellMap {
    pub cells: FxHashMap<NodeId, Cell>,
    /// The `this` slot, when the function caches its receiver.
    pub this_cell: Option<Symbol>,
}

impl CellMap {
    fn target(&self, site: DeclSite) -> Option<Cell> {
        let node = match site {
            DeclSite::Param(id) | DeclSite::Declarator(id) => id,
            DeclSite::Function(_) => return None,
        };
        self.cells.get(&node).copied()
    }
}

pub fn rewrite_params(
    block: &mut Block,
    map: &CellMap,
    bindings: &Bindings,
    factory: &mut Factory,
) {
    let mut pass = ParamRewrite {
        map,
        bindings,
        factory,
    };
    for stmt in &mut block.stmts {
        pass.stmt(stmt);
    }
}

struct ParamRewrite<'a, 'f> {
    map: &'a CellMap,
    bindings: &'a Bindings,
    factory: &'a mut Factory<'f>,
}

impl ParamRewrite<'_, '_> {
    fn block(&mut self, block: &mut Block) {
        for stmt in &mut block.stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Variable(decl) => {
                // A declaration whose first declarator is itself a rewrite
                // target is a forwarding declaration left by default-parameter
                // lowering. It runs before the cache cells exist, so its
                // initializer keeps raw parameter access.
                if decl
                    .declarators
                    .first()
                    .is_some_and(|d| self.map.cells.contains_key(&d.id))
                {
                    return;
                }
                for declarator in &mut decl.declarators {
                    if let Some(init) = &mut declarator.init {
                        self.expr(init);
                    }
                }
            }
            Stmt::Return(ret) => {
                // A bare `return this` is the return transformer's business.
                if let Some(value) = &mut ret.value {
                    if !value.is_this() {
                        self.expr(value);
                    }
                }
            }
            Stmt::Function(func) => self.function(func),
            Stmt::Class(class) => {
                for member in &mut class.members {
                    match member {
                        ClassMember::Method(method) => self.function(&mut method.func),
                        ClassMember::Property(prop) => {
                            if let Some(init) = &mut prop.init {
                                self.expr(init);
                            }
                        }
                    }
                }
            }
            Stmt::If(stmt) => {
                self.expr(&mut stmt.test);
                self.block(&mut stmt.consequent);
                if let Some(alternate) = &mut stmt.alternate {
                    self.block(alternate);
                }
            }
            Stmt::While(stmt) => {
                self.expr(&mut stmt.test);
                self.block(&mut stmt.body);
            }
            Stmt::Throw(stmt) => self.expr(&mut stmt.value),
            Stmt::Expr(stmt) => self.expr(&mut stmt.expr),
            Stmt::Block(block) => self.block(block),
            Stmt::Import(_) | Stmt::TypeAlias(_) => {}
        }
    }

    fn function(&mut self, func: &mut Function) {
        for param in &mut func.params {
            if let Some(default) = &mut param.default {
                self.expr(default);
            }
        }
        match &mut func.body {
            FuncBody::Block(block) => self.block(block),
            FuncBody::Expr(expr) => self.expr(expr),
        }
    }

    fn expr(&mut self, expr: &mut Expr) {
        // Calling a cached callback rewrites the call as a whole; the callee
        // identifier is never rewritten in isolation.
        if let ExprKind::Call(call) = &mut expr.kind {
            if matches!(call.callee.kind, ExprKind::Identifier(_)) {
                let target = self
                    .bindings
                    .resolve(call.callee.id)
                    .and_then(|site| self.map.target(site));
                if let Some(cell) = target {
                    if cell.callable {
                        for arg in &mut call.args {
                            self.expr(arg);
                        }
                        let span = expr.span;
                        let type_args = std::mem::take(&mut call.type_args);
                        let args = std::mem::take(&mut call.args);
                        *expr = self.factory.cache_call(cell.name, type_args, args, span);
                        return;
                    }
                }
            }
        }
        match &mut expr.kind {
            ExprKind::Arrow(func) => self.function(func),
            ExprKind::Call(call) => {
                self.expr(&mut call.callee);
                for arg in &mut call.args {
                    self.expr(arg);
                }
            }
            ExprKind::Member(member) => self.expr(&mut member.object),
            ExprKind::Conditional(cond) => {
                self.expr(&mut cond.test);
                self.expr(&mut cond.consequent);
                self.expr(&mut cond.alternate);
            }
            ExprKind::Binary(binary) => {
                self.expr(&mut binary.left);
                self.expr(&mut binary.right);
            }
            ExprKind::Unary(unary) => self.expr(&mut unary.operand),
            ExprKind::Assign(assign) => {
                self.expr(&mut assign.target);
                self.expr(&mut assign.value);
            }
            ExprKind::ObjectLiteral(object) => {
                for field in &mut object.fields {
                    self.expr(&mut field.value);
                }
            }
            ExprKind::ArrayLiteral(elements) => {
                for element in elements {
                    self.expr(element);
                }
            }
            ExprKind::As(cast) => self.expr(&mut cast.expr),
            ExprKind::Paren(inner) => self.expr(inner),
            ExprKind::Identifier(_)
            | ExprKind::This
            | ExprKind::Undefined
            | ExprKind::NumberLiteral(_)
            | ExprKind::StringLiteral(_)
            | ExprKind::BoolLiteral(_) => {}
        }
        match &expr.kind {
            ExprKind::Identifier(_) => {
                let target = self
                    .bindings
                    .resolve(expr.id)
                    .and_then(|site| self.map.target(site));
                if let Some(cell) = target {
                    *expr = self.factory.cache_read(cell.name, expr.span);
                }
            }
            ExprKind::This => {
                if let Some(this_cell) = self.map.this_cell {
                    *expr = self.factory.cache_read(this_cell, expr.span);
                }
            }
            _ => {}
        }
    }
}
