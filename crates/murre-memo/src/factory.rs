// src/factory.rs
//
// Builders for every synthetic fragment the rewrite injects: scope and
// cache-cell declarations, the early-return guard, recache and compute
// wrapping, hidden parameters, and the runtime import. All nodes are minted
// with fresh ids continuing the parser's sequence, so side tables keyed by
// NodeId never collide with synthesized code.

use murre_frontend::ast::*;
use murre_frontend::{Interner, Span, Symbol};

use crate::call_id::PositionalId;
use crate::names::RuntimeNames;

/// How a memoized function's value leaves the body. Decides the shape of
/// the early-return guard and of wrapped returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    Void,
    Value,
    This,
}

impl ReturnShape {
    pub fn of(return_type: Option<&TypeExpr>) -> Self {
        match return_type {
            None => ReturnShape::Void,
            Some(ty) if ty.is_void() => ReturnShape::Void,
            Some(ty) if ty.is_this() => ReturnShape::This,
            Some(_) => ReturnShape::Value,
        }
    }
}

pub struct Factory<'a> {
    names: &'a RuntimeNames,
    interner: &'a mut Interner,
    next_node_id: u32,
}

impl<'a> Factory<'a> {
    pub fn new(names: &'a RuntimeNames, interner: &'a mut Interner, next_node_id: u32) -> Self {
        Self {
            names,
            interner,
            next_node_id,
        }
    }

    /// Hand the id sequence back for the program header.
    pub fn finish(self) -> u32 {
        self.next_node_id
    }

    pub fn names(&self) -> &RuntimeNames {
        self.names
    }

    pub fn interner(&self) -> &Interner {
        self.interner
    }

    pub fn node(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    /// `__memo_parameter_<name>`.
    pub fn cell_name(&mut self, param: Symbol) -> Symbol {
        self.names.cache_cell(self.interner, param)
    }

    // -----------------------------------------------------------------------
    // Leaf builders
    // -----------------------------------------------------------------------

    pub fn ident(&mut self, name: Symbol, span: Span) -> Expr {
        Expr {
            id: self.node(),
            kind: ExprKind::Identifier(name),
            span,
        }
    }

    pub fn this(&mut self, span: Span) -> Expr {
        Expr {
            id: self.node(),
            kind: ExprKind::This,
            span,
        }
    }

    pub fn number(&mut self, value: f64, span: Span) -> Expr {
        Expr {
            id: self.node(),
            kind: ExprKind::NumberLiteral(value),
            span,
        }
    }

    pub fn string(&mut self, value: &str, span: Span) -> Expr {
        Expr {
            id: self.node(),
            kind: ExprKind::StringLiteral(value.to_string()),
            span,
        }
    }

    pub fn member(&mut self, object: Expr, property: Symbol, span: Span) -> Expr {
        Expr {
            id: self.node(),
            kind: ExprKind::Member(Box::new(MemberExpr {
                object,
                property,
                property_span: span,
            })),
            span,
        }
    }

    pub fn call(
        &mut self,
        callee: Expr,
        type_args: Vec<TypeExpr>,
        args: Vec<Expr>,
        span: Span,
    ) -> Expr {
        Expr {
            id: self.node(),
            kind: ExprKind::Call(Box::new(CallExpr {
                callee,
                type_args,
                args,
            })),
            span,
        }
    }

    fn paren(&mut self, inner: Expr, span: Span) -> Expr {
        Expr {
            id: self.node(),
            kind: ExprKind::Paren(Box::new(inner)),
            span,
        }
    }

    fn add(&mut self, left: Expr, right: Expr, span: Span) -> Expr {
        Expr {
            id: self.node(),
            kind: ExprKind::Binary(Box::new(BinaryExpr {
                op: BinaryOp::Add,
                left,
                right,
            })),
            span,
        }
    }

    fn void_type(&mut self, span: Span) -> TypeExpr {
        TypeExpr {
            id: self.node(),
            kind: TypeKind::Void,
            span,
        }
    }

    fn named_type(&mut self, name: Symbol, span: Span) -> TypeExpr {
        TypeExpr {
            id: self.node(),
            kind: TypeKind::Named {
                name,
                type_args: Vec::new(),
            },
            span,
        }
    }

    pub fn expr_stmt(&mut self, expr: Expr, span: Span) -> Stmt {
        Stmt::Expr(ExprStmt {
            id: self.node(),
            expr,
            span,
        })
    }

    pub fn return_stmt(&mut self, value: Option<Expr>, span: Span) -> Stmt {
        Stmt::Return(ReturnStmt {
            id: self.node(),
            value,
            span,
        })
    }

    pub fn block(&mut self, stmts: Vec<Stmt>, span: Span) -> Block {
        Block {
            id: self.node(),
            stmts,
            span,
        }
    }

    // -----------------------------------------------------------------------
    // Positional ids and hidden arguments
    // -----------------------------------------------------------------------

    /// The positional id as an embedded literal.
    pub fn pos_id(&mut self, pos: &PositionalId, span: Span) -> Expr {
        match pos {
            PositionalId::Hashed(value) => self.number(f64::from(*value), span),
            PositionalId::Stable(value) => {
                let value = value.clone();
                self.string(&value, span)
            }
        }
    }

    /// `__memo_context`, the hidden context value at a call site.
    pub fn context_argument(&mut self, span: Span) -> Expr {
        self.ident(self.names.context, span)
    }

    /// `__memo_id + <pos>`, the hidden id value at a call site.
    pub fn hidden_id_argument(&mut self, pos: &PositionalId, span: Span) -> Expr {
        let id = self.ident(self.names.id, span);
        let pos = self.pos_id(pos, span);
        self.add(id, pos, span)
    }

    /// The two hidden parameters prepended to memoized signatures.
    pub fn hidden_params(&mut self, span: Span) -> [Param; 2] {
        let context_ty = self.named_type(self.names.context_type, span);
        let id_ty = self.named_type(self.names.id_type, span);
        [
            Param {
                id: self.node(),
                annotations: Vec::new(),
                name: self.names.context,
                ty: Some(context_ty),
                default: None,
                is_rest: false,
                is_receiver: false,
                span,
            },
            Param {
                id: self.node(),
                annotations: Vec::new(),
                name: self.names.id,
                ty: Some(id_ty),
                default: None,
                is_rest: false,
                is_receiver: false,
                span,
            },
        ]
    }

    // -----------------------------------------------------------------------
    // Body scaffolding
    // -----------------------------------------------------------------------

    /// `const __memo_scope = __memo_context.scope<R>(__memo_id + <pos>, <count>)`
    pub fn scope_declaration(
        &mut self,
        return_type: Option<&TypeExpr>,
        pos: &PositionalId,
        param_count: usize,
        span: Span,
    ) -> Stmt {
        let type_arg = match return_type {
            Some(ty) => ty.clone(),
            None => self.void_type(span),
        };
        let context = self.ident(self.names.context, span);
        let callee = self.member(context, self.names.scope_method, span);
        let id_arg = self.hidden_id_argument(pos, span);
        let count = self.number(param_count as f64, span);
        let init = self.call(callee, vec![type_arg], vec![id_arg, count], span);
        self.const_decl(self.names.scope, init, span)
    }

    /// One `const` with a declarator per cache cell:
    /// `const __memo_parameter_x = __memo_scope.param(0, x), ...`
    pub fn param_cache_declaration(&mut self, cells: Vec<(Symbol, Expr)>, span: Span) -> Stmt {
        let declarators = cells
            .into_iter()
            .enumerate()
            .map(|(index, (cell, source))| {
                let scope = self.ident(self.names.scope, span);
                let callee = self.member(scope, self.names.param_method, span);
                let index = self.number(index as f64, span);
                let init = self.call(callee, Vec::new(), vec![index, source], span);
                VarDeclarator {
                    id: self.node(),
                    name: cell,
                    ty: None,
                    init: Some(init),
                    span,
                }
            })
            .collect();
        Stmt::Variable(VariableDecl {
            id: self.node(),
            annotations: Vec::new(),
            kind: VarKind::Const,
            declarators,
            span,
        })
    }

    /// `if (__memo_scope.unchanged) { ... }` with a body matching the
    /// function's return shape.
    pub fn early_return_guard(&mut self, shape: ReturnShape, span: Span) -> Stmt {
        let scope = self.ident(self.names.scope, span);
        let test = self.member(scope, self.names.unchanged, span);
        let cached = {
            let scope = self.ident(self.names.scope, span);
            self.member(scope, self.names.cached, span)
        };
        let stmts = match shape {
            ReturnShape::Value => vec![self.return_stmt(Some(cached), span)],
            ReturnShape::Void => {
                let read = self.expr_stmt(cached, span);
                let ret = self.return_stmt(None, span);
                vec![read, ret]
            }
            ReturnShape::This => {
                let read = self.expr_stmt(cached, span);
                let this = self.this(span);
                let ret = self.return_stmt(Some(this), span);
                vec![read, ret]
            }
        };
        let consequent = self.block(stmts, span);
        Stmt::If(IfStmt {
            id: self.node(),
            test,
            consequent,
            alternate: None,
            span,
        })
    }

    /// `__memo_parameter_this.value` as a statement, re-subscribing the
    /// `this` slot before the body runs.
    pub fn this_subscription(&mut self, this_cell: Symbol, span: Span) -> Stmt {
        let cell = self.ident(this_cell, span);
        let read = self.member(cell, self.names.value, span);
        self.expr_stmt(read, span)
    }

    /// `console.log("<label>", <value>)`
    pub fn console_log(&mut self, label: &str, value: Expr, span: Span) -> Stmt {
        let console = self.ident(self.names.console, span);
        let callee = self.member(console, self.names.log, span);
        let label = self.string(label, span);
        let call = self.call(callee, Vec::new(), vec![label, value], span);
        self.expr_stmt(call, span)
    }

    // -----------------------------------------------------------------------
    // Cache and recache accessors
    // -----------------------------------------------------------------------

    /// `<cell>.value`
    pub fn cache_read(&mut self, cell: Symbol, span: Span) -> Expr {
        let cell = self.ident(cell, span);
        self.member(cell, self.names.value, span)
    }

    /// `<cell>.value(<args>)` for calls through a cached callback parameter.
    pub fn cache_call(
        &mut self,
        cell: Symbol,
        type_args: Vec<TypeExpr>,
        args: Vec<Expr>,
        span: Span,
    ) -> Expr {
        let callee = self.cache_read(cell, span);
        self.call(callee, type_args, args, span)
    }

    /// `__memo_scope.recache(<value>)`
    pub fn recache_value(&mut self, value: Expr, span: Span) -> Expr {
        let scope = self.ident(self.names.scope, span);
        let callee = self.member(scope, self.names.recache, span);
        self.call(callee, Vec::new(), vec![value], span)
    }

    /// `__memo_scope.recache()`
    pub fn recache_void(&mut self, span: Span) -> Expr {
        let scope = self.ident(self.names.scope, span);
        let callee = self.member(scope, self.names.recache, span);
        self.call(callee, Vec::new(), Vec::new(), span)
    }

    /// `__memo_context.compute(<pos>, () => <arg>)`, casting object-literal
    /// arguments to the declared parameter type so literal typing survives
    /// the closure.
    pub fn compute_wrap(
        &mut self,
        pos: &PositionalId,
        arg: Expr,
        cast_ty: Option<TypeExpr>,
        span: Span,
    ) -> Expr {
        let body = match cast_ty {
            Some(ty) => {
                let cast = Expr {
                    id: self.node(),
                    kind: ExprKind::As(Box::new(AsExpr { expr: arg, ty })),
                    span,
                };
                self.paren(cast, span)
            }
            // A bare object literal would reparse as a block body.
            None if matches!(arg.kind, ExprKind::ObjectLiteral(_)) => self.paren(arg, span),
            None => arg,
        };
        let closure = Expr {
            id: self.node(),
            kind: ExprKind::Arrow(Box::new(Function {
                id: self.node(),
                annotations: Vec::new(),
                name: None,
                params: Vec::new(),
                return_type: None,
                body: FuncBody::Expr(Box::new(body)),
                is_arrow: true,
                span,
            })),
            span,
        };
        let context = self.ident(self.names.context, span);
        let callee = self.member(context, self.names.compute, span);
        let pos = self.pos_id(pos, span);
        self.call(callee, Vec::new(), vec![pos, closure], span)
    }

    // -----------------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------------

    fn const_decl(&mut self, name: Symbol, init: Expr, span: Span) -> Stmt {
        let declarator = VarDeclarator {
            id: self.node(),
            name,
            ty: None,
            init: Some(init),
            span,
        };
        Stmt::Variable(VariableDecl {
            id: self.node(),
            annotations: Vec::new(),
            kind: VarKind::Const,
            declarators: vec![declarator],
            span,
        })
    }

    /// `import { __memo_context_type, __memo_id_type } from "<module>"`
    pub fn runtime_import(&mut self, module: &str, span: Span) -> Stmt {
        Stmt::Import(ImportDecl {
            id: self.node(),
            names: vec![self.names.context_type, self.names.id_type],
            module: module.to_string(),
            span,
        })
    }

    /// Normalize an expression body to a block body ending in a return, so
    /// the body rewrites have a statement list to work with.
    pub fn expr_body_to_block(&mut self, func: &mut Function) {
        if !matches!(func.body, FuncBody::Expr(_)) {
            return;
        }
        let span = func.span;
        let empty = FuncBody::Block(self.block(Vec::new(), span));
        let FuncBody::Expr(expr) = std::mem::replace(&mut func.body, empty) else {
            unreachable!("checked above");
        };
        let ret = self.return_stmt(Some(*expr), span);
        if let FuncBody::Block(block) = &mut func.body {
            block.stmts.push(ret);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murre_frontend::printer::print_program;

    fn print_one(stmt: Stmt, interner: &Interner) -> String {
        let program = Program {
            statements: vec![stmt],
            next_node_id: 1000,
        };
        print_program(&program, interner)
    }

    #[test]
    fn scope_declaration_shape() {
        let mut interner = Interner::new();
        let names = RuntimeNames::new(&mut interner);
        let mut factory = Factory::new(&names, &mut interner, 100);
        let stmt =
            factory.scope_declaration(None, &PositionalId::Hashed(37), 2, Span::default());
        factory.finish();
        assert_eq!(
            print_one(stmt, &interner),
            "\nconst __memo_scope = __memo_context.scope<void>(__memo_id + 37, 2)"
        );
    }

    #[test]
    fn early_return_guard_shapes() {
        let mut interner = Interner::new();
        let names = RuntimeNames::new(&mut interner);
        let mut factory = Factory::new(&names, &mut interner, 100);
        let value = factory.early_return_guard(ReturnShape::Value, Span::default());
        let void = factory.early_return_guard(ReturnShape::Void, Span::default());
        factory.finish();
        assert_eq!(
            print_one(value, &interner),
            "\nif (__memo_scope.unchanged) {\n  return __memo_scope.cached\n}"
        );
        assert_eq!(
            print_one(void, &interner),
            "\nif (__memo_scope.unchanged) {\n  __memo_scope.cached\n  return\n}"
        );
    }

    #[test]
    fn cache_declaration_numbers_cells_in_order() {
        let mut interner = Interner::new();
        let names = RuntimeNames::new(&mut interner);
        let label = interner.intern("label");
        let mut factory = Factory::new(&names, &mut interner, 100);
        let label_cell = factory.cell_name(label);
        let label_source = factory.ident(label, Span::default());
        let this_cell = factory.cell_name(factory.names().this_name);
        let this_source = factory.this(Span::default());
        let stmt = factory.param_cache_declaration(
            vec![(label_cell, label_source), (this_cell, this_source)],
            Span::default(),
        );
        factory.finish();
        assert_eq!(
            print_one(stmt, &interner),
            "\nconst __memo_parameter_label = __memo_scope.param(0, label), \
             __memo_parameter_this = __memo_scope.param(1, this)"
        );
    }

    #[test]
    fn compute_wrap_parenthesises_cast_object_literals() {
        let mut interner = Interner::new();
        let names = RuntimeNames::new(&mut interner);
        let style = interner.intern("Style");
        let width = interner.intern("width");
        let mut factory = Factory::new(&names, &mut interner, 100);
        let literal = Expr {
            id: factory.node(),
            kind: ExprKind::ObjectLiteral(ObjectLiteral {
                fields: vec![ObjectField {
                    id: factory.node(),
                    name: width,
                    value: factory.number(10.0, Span::default()),
                    span: Span::default(),
                }],
            }),
            span: Span::default(),
        };
        let cast_ty = TypeExpr {
            id: factory.node(),
            kind: TypeKind::Named {
                name: style,
                type_args: Vec::new(),
            },
            span: Span::default(),
        };
        let wrapped = factory.compute_wrap(
            &PositionalId::Stable("id_chip_demo.uis".to_string()),
            literal,
            Some(cast_ty),
            Span::default(),
        );
        let stmt = factory.expr_stmt(wrapped, Span::default());
        factory.finish();
        assert_eq!(
            print_one(stmt, &interner),
            "\n__memo_context.compute(\"id_chip_demo.uis\", () => ({ width: 10 } as Style))"
        );
    }

    #[test]
    fn runtime_import_names_both_hidden_types() {
        let mut interner = Interner::new();
        let names = RuntimeNames::new(&mut interner);
        let mut factory = Factory::new(&names, &mut interner, 100);
        let stmt = factory.runtime_import("@memo/runtime", Span::default());
        factory.finish();
        assert_eq!(
            print_one(stmt, &interner),
            "\nimport { __memo_context_type, __memo_id_type } from \"@memo/runtime\""
        );
    }

    #[test]
    fn return_shape_classification() {
        let this_ty = TypeExpr {
            id: NodeId::new_for_test(1),
            kind: TypeKind::This,
            span: Span::default(),
        };
        let void_ty = TypeExpr {
            id: NodeId::new_for_test(2),
            kind: TypeKind::Void,
            span: Span::default(),
        };
        assert_eq!(ReturnShape::of(None), ReturnShape::Void);
        assert_eq!(ReturnShape::of(Some(&void_ty)), ReturnShape::Void);
        assert_eq!(ReturnShape::of(Some(&this_ty)), ReturnShape::This);
    }
}
