// src/walk.rs
//
// Shared traversal helpers. The rewrite passes that just substitute
// expressions use the deep pre-order walk; passes with skip rules or
// statement-level rewrites carry their own recursion.

use murre_frontend::ast::*;

/// Apply `f` to every expression under the block, pre-order, descending
/// into nested function bodies. `f` may replace the node wholesale; the
/// replacement's children are visited afterwards.
pub fn walk_block<F: FnMut(&mut Expr)>(block: &mut Block, f: &mut F) {
    for stmt in &mut block.stmts {
        walk_stmt(stmt, f);
    }
}

pub fn walk_stmt<F: FnMut(&mut Expr)>(stmt: &mut Stmt, f: &mut F) {
    match stmt {
        Stmt::Variable(decl) => {
            for declarator in &mut decl.declarators {
                if let Some(init) = &mut declarator.init {
                    walk_expr(init, f);
                }
            }
        }
        Stmt::Function(func) => walk_function(func, f),
        Stmt::Class(class) => {
            for member in &mut class.members {
                match member {
                    ClassMember::Method(method) => walk_function(&mut method.func, f),
                    ClassMember::Property(prop) => {
                        if let Some(init) = &mut prop.init {
                            walk_expr(init, f);
                        }
                    }
                }
            }
        }
        Stmt::Return(ret) => {
            if let Some(value) = &mut ret.value {
                walk_expr(value, f);
            }
        }
        Stmt::If(stmt) => {
            walk_expr(&mut stmt.test, f);
            walk_block(&mut stmt.consequent, f);
            if let Some(alternate) = &mut stmt.alternate {
                walk_block(alternate, f);
            }
        }
        Stmt::While(stmt) => {
            walk_expr(&mut stmt.test, f);
            walk_block(&mut stmt.body, f);
        }
        Stmt::Throw(stmt) => walk_expr(&mut stmt.value, f),
        Stmt::Expr(stmt) => walk_expr(&mut stmt.expr, f),
        Stmt::Block(block) => walk_block(block, f),
        Stmt::Import(_) | Stmt::TypeAlias(_) => {}
    }
}

fn walk_function<F: FnMut(&mut Expr)>(func: &mut Function, f: &mut F) {
    for param in &mut func.params {
        if let Some(default) = &mut param.default {
            walk_expr(default, f);
        }
    }
    match &mut func.body {
        FuncBody::Block(block) => walk_block(block, f),
        FuncBody::Expr(expr) => walk_expr(expr, f),
    }
}

pub fn walk_expr<F: FnMut(&mut Expr)>(expr: &mut Expr, f: &mut F) {
    f(expr);
    match &mut expr.kind {
        ExprKind::Arrow(func) => walk_function(func, f),
        ExprKind::Call(call) => {
            walk_expr(&mut call.callee, f);
            for arg in &mut call.args {
                walk_expr(arg, f);
            }
        }
        ExprKind::Member(member) => walk_expr(&mut member.object, f),
        ExprKind::Conditional(cond) => {
            walk_expr(&mut cond.test, f);
            walk_expr(&mut cond.consequent, f);
            walk_expr(&mut cond.alternate, f);
        }
        ExprKind::Binary(binary) => {
            walk_expr(&mut binary.left, f);
            walk_expr(&mut binary.right, f);
        }
        ExprKind::Unary(unary) => walk_expr(&mut unary.operand, f),
        ExprKind::Assign(assign) => {
            walk_expr(&mut assign.target, f);
            walk_expr(&mut assign.value, f);
        }
        ExprKind::ObjectLiteral(object) => {
            for field in &mut object.fields {
                walk_expr(&mut field.value, f);
            }
        }
        ExprKind::ArrayLiteral(elements) => {
            for element in elements {
                walk_expr(element, f);
            }
        }
        ExprKind::As(cast) => walk_expr(&mut cast.expr, f),
        ExprKind::Paren(inner) => walk_expr(inner, f),
        ExprKind::Identifier(_)
        | ExprKind::This
        | ExprKind::Undefined
        | ExprKind::NumberLiteral(_)
        | ExprKind::StringLiteral(_)
        | ExprKind::BoolLiteral(_) => {}
    }
}

/// True when any expression in the subtree satisfies the predicate,
/// descending into nested function bodies.
pub fn any_expr<F: FnMut(&Expr) -> bool>(expr: &Expr, f: &mut F) -> bool {
    if f(expr) {
        return true;
    }
    match &expr.kind {
        ExprKind::Arrow(func) => {
            func.params
                .iter()
                .filter_map(|p| p.default.as_ref())
                .any(|d| any_expr(d, f))
                || match &func.body {
                    FuncBody::Block(block) => any_expr_in_block(block, f),
                    FuncBody::Expr(expr) => any_expr(expr, f),
                }
        }
        ExprKind::Call(call) => {
            any_expr(&call.callee, f) || call.args.iter().any(|a| any_expr(a, f))
        }
        ExprKind::Member(member) => any_expr(&member.object, f),
        ExprKind::Conditional(cond) => {
            any_expr(&cond.test, f) || any_expr(&cond.consequent, f) || any_expr(&cond.alternate, f)
        }
        ExprKind::Binary(binary) => any_expr(&binary.left, f) || any_expr(&binary.right, f),
        ExprKind::Unary(unary) => any_expr(&unary.operand, f),
        ExprKind::Assign(assign) => any_expr(&assign.target, f) || any_expr(&assign.value, f),
        ExprKind::ObjectLiteral(object) => object.fields.iter().any(|p| any_expr(&p.value, f)),
        ExprKind::ArrayLiteral(elements) => elements.iter().any(|e| any_expr(e, f)),
        ExprKind::As(cast) => any_expr(&cast.expr, f),
        ExprKind::Paren(inner) => any_expr(inner, f),
        ExprKind::Identifier(_)
        | ExprKind::This
        | ExprKind::Undefined
        | ExprKind::NumberLiteral(_)
        | ExprKind::StringLiteral(_)
        | ExprKind::BoolLiteral(_) => false,
    }
}

fn any_expr_in_block<F: FnMut(&Expr) -> bool>(block: &Block, f: &mut F) -> bool {
    block.stmts.iter().any(|stmt| any_expr_in_stmt(stmt, f))
}

fn any_expr_in_stmt<F: FnMut(&Expr) -> bool>(stmt: &Stmt, f: &mut F) -> bool {
    match stmt {
        Stmt::Variable(decl) => decl
            .declarators
            .iter()
            .filter_map(|d| d.init.as_ref())
            .any(|init| any_expr(init, f)),
        Stmt::Return(ret) => ret.value.as_ref().is_some_and(|v| any_expr(v, f)),
        Stmt::If(stmt) => {
            any_expr(&stmt.test, f)
                || any_expr_in_block(&stmt.consequent, f)
                || stmt.alternate.as_ref().is_some_and(|b| any_expr_in_block(b, f))
        }
        Stmt::While(stmt) => any_expr(&stmt.test, f) || any_expr_in_block(&stmt.body, f),
        Stmt::Throw(stmt) => any_expr(&stmt.value, f),
        Stmt::Expr(stmt) => any_expr(&stmt.expr, f),
        Stmt::Block(block) => any_expr_in_block(block, f),
        Stmt::Function(_) | Stmt::Class(_) | Stmt::Import(_) | Stmt::TypeAlias(_) => false,
    }
}
