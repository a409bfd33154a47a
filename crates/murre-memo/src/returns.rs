// src/returns.rs
//
// Wraps every return path of a memoized body in a recache call that commits
// the freshly produced value: `return E` becomes
// `return __memo_scope.recache(E)`, and a bare `return` (or `return this`)
// becomes a two-statement block committing first. The synthesized
// early-return guard is skipped by node id, already-wrapped returns are
// recognized structurally, and nested function bodies are left alone —
// their returns belong to their own rewrite.

use murre_frontend::ast::*;
use murre_frontend::Symbol;

use crate::factory::Factory;

pub fn rewrite_returns(block: &mut Block, guard: NodeId, factory: &mut Factory) {
    let scope = factory.names().scope;
    let recache = factory.names().recache;
    let mut pass = ReturnRewrite {
        guard,
        scope,
        recache,
        factory,
    };
    pass.block(block);
}

struct ReturnRewrite<'a, 'f> {
    guard: NodeId,
    scope: Symbol,
    recache: Symbol,
    factory: &'a mut Factory<'f>,
}

enum Wrap {
    /// Already wrapped, or not a return path.
    Done,
    /// `return E` with a real value.
    Value,
    /// Bare `return` or `return this`: commit, then return.
    Commit,
}

impl ReturnRewrite<'_, '_> {
    fn block(&mut self, block: &mut Block) {
        for stmt in &mut block.stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &mut Stmt) {
        if stmt.id() == self.guard {
            return;
        }
        match stmt {
            Stmt::If(s) => {
                self.block(&mut s.consequent);
                if let Some(alternate) = &mut s.alternate {
                    self.block(alternate);
                }
                return;
            }
            Stmt::While(s) => {
                self.block(&mut s.body);
                return;
            }
            Stmt::Block(b) => {
                if !self.is_commit_block(b) {
                    self.block(b);
                }
                return;
            }
            Stmt::Return(_) => {}
            _ => return,
        }
        let wrap = match stmt {
            Stmt::Return(ret) => match &ret.value {
                Some(value) if self.is_recache_call(value) => Wrap::Done,
                Some(value) if !value.is_this() => Wrap::Value,
                _ => Wrap::Commit,
            },
            _ => Wrap::Done,
        };
        match wrap {
            Wrap::Done => {}
            Wrap::Value => {
                if let Stmt::Return(ret) = stmt {
                    if let Some(value) = ret.value.take() {
                        let span = ret.span;
                        ret.value = Some(self.factory.recache_value(value, span));
                    }
                }
            }
            Wrap::Commit => {
                let span = stmt.span();
                let recache = self.factory.recache_void(span);
                let commit = self.factory.expr_stmt(recache, span);
                let empty = Stmt::Block(self.factory.block(Vec::new(), span));
                let original = std::mem::replace(stmt, empty);
                let wrapped = self.factory.block(vec![commit, original], span);
                *stmt = Stmt::Block(wrapped);
            }
        }
    }

    fn is_recache_call(&self, expr: &Expr) -> bool {
        let ExprKind::Call(call) = &expr.kind else {
            return false;
        };
        let ExprKind::Member(member) = &call.callee.kind else {
            return false;
        };
        member.property == self.recache
            && matches!(member.object.kind, ExprKind::Identifier(name) if name == self.scope)
    }

    /// The two-statement shape this pass itself produces for void/this
    /// returns. Recognizing it keeps a second run from re-wrapping.
    fn is_commit_block(&self, block: &Block) -> bool {
        let [Stmt::Expr(first), Stmt::Return(ret)] = block.stmts.as_slice() else {
            return false;
        };
        self.is_recache_call(&first.expr)
            && ret.value.as_ref().is_none_or(|value| value.is_this())
    }
}
