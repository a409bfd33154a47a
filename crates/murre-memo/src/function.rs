// src/function.rs
//
// The transform orchestrator: one post-order walk that restructures memo
// function bodies, extends signatures, and rewrites calls to memoized
// callees. Children are rewritten before their enclosing function, so by
// the time a body is restructured every call inside it already carries its
// hidden arguments and every nested function is fully transformed.

use std::mem;

use rustc_hash::FxHashMap;

use murre_frontend::ast::*;
use murre_frontend::resolve::{Bindings, DeclSite};
use murre_frontend::Symbol;

use crate::call_id::CallIdTracker;
use crate::catalog::DeclCatalog;
use crate::factory::{Factory, ReturnShape};
use crate::internals::rewrite_markers;
use crate::kinds::MemoKind;
use crate::params::{rewrite_params, Cell, CellMap};
use crate::pipeline::MemoOptions;
use crate::returns::rewrite_returns;
use crate::signature::{extend_function, extend_function_type};
use crate::tables::ClassifierTables;

/// Rewrite the unit in place. Returns whether anything changed, so the
/// caller can skip serialization of untouched units.
#[allow(clippy::too_many_arguments)]
pub fn transform_program(
    program: &mut Program,
    tables: &ClassifierTables,
    catalog: &DeclCatalog,
    bindings: &Bindings,
    options: &MemoOptions,
    tracker: &mut CallIdTracker,
    factory: &mut Factory,
) -> bool {
    let mut pass = FunctionTransformer {
        tables,
        catalog,
        bindings,
        options,
        tracker,
        factory,
        stable_depth: 0,
        current_class: None,
        modified: false,
    };
    for stmt in &mut program.statements {
        pass.stmt(stmt);
    }
    pass.modified
}

struct FunctionTransformer<'a, 'f> {
    tables: &'a ClassifierTables,
    catalog: &'a DeclCatalog,
    bindings: &'a Bindings,
    options: &'a MemoOptions,
    tracker: &'a mut CallIdTracker,
    factory: &'a mut Factory<'f>,
    /// Nesting depth of classes whose instances are identity-stable;
    /// nonzero suppresses the `this` cache slot.
    stable_depth: u32,
    current_class: Option<NodeId>,
    modified: bool,
}

impl FunctionTransformer<'_, '_> {
    /// `is_method` is true only when the immediate parent is a class
    /// member, never inherited by nested functions.
    fn function(&mut self, func: &mut Function, is_method: bool) {
        for param in &mut func.params {
            if let Some(ty) = &mut param.ty {
                self.type_expr(ty);
            }
            if let Some(default) = &mut param.default {
                self.expr(default);
            }
        }
        if let Some(ret) = &mut func.return_type {
            self.type_expr(ret);
        }
        match &mut func.body {
            FuncBody::Block(block) => {
                for stmt in &mut block.stmts {
                    self.stmt(stmt);
                }
            }
            FuncBody::Expr(expr) => self.expr(expr),
        }

        match self.tables.function_kind(func.id) {
            MemoKind::None => {}
            MemoKind::Memo => {
                self.memo_function(func, is_method);
                extend_function(func, self.factory);
                self.modified = true;
            }
            MemoKind::Intrinsic => {
                self.marker_fixup(func);
                extend_function(func, self.factory);
                self.modified = true;
            }
            // Entry functions declare the hidden parameters themselves, so
            // the body fix-up is all they get.
            MemoKind::Entry => {
                self.marker_fixup(func);
                self.modified = true;
            }
        }
    }

    fn marker_fixup(&mut self, func: &mut Function) {
        self.factory.expr_body_to_block(func);
        if let FuncBody::Block(body) = &mut func.body {
            rewrite_markers(body, self.factory, self.tracker);
        }
    }

    /// The full memo rewrite: internals fix-up, then the caching prologue
    /// spliced in after any forwarding declarations, then the parameter and
    /// return rewrites over the finished body.
    fn memo_function(&mut self, func: &mut Function, is_method: bool) {
        let span = func.span;
        self.factory.expr_body_to_block(func);

        let names = self.factory.names();
        let this_name = names.this_name;
        let scope_name = names.scope;
        let content = names.content;
        let skip = names.memo_skip;
        let changed = names.changed;
        let unchanged = names.unchanged;

        let name = func
            .name
            .map(|s| self.factory.interner().resolve(s).to_string());
        let pos = self.tracker.fresh(name.as_deref());

        let needs_this = func.return_type.as_ref().is_some_and(|t| t.is_this())
            && self.stable_depth == 0
            && (is_method || func.has_receiver());

        let FuncBody::Block(body) = &mut func.body else {
            return;
        };
        rewrite_markers(body, self.factory, self.tracker);

        // Leading forwarding declarations from lowered parameter defaults.
        // The cache keys off the re-declared name, and the synthesized
        // prologue goes in after them.
        let mut forwarded: FxHashMap<NodeId, (NodeId, Symbol)> = FxHashMap::default();
        let mut lead = 0;
        for stmt in &body.stmts {
            let Stmt::Variable(decl) = stmt else { break };
            let Some(declarator) = decl.declarators.first() else {
                break;
            };
            let Some(DeclSite::Param(param)) = self.bindings.indirection(declarator.id) else {
                break;
            };
            forwarded.insert(param, (declarator.id, declarator.name));
            lead += 1;
        }

        let mut map = CellMap::default();
        let mut cells: Vec<(Symbol, Expr)> = Vec::new();
        let total = func.params.len();
        for (index, param) in func.params.iter().enumerate() {
            let (key, name) = match forwarded.get(&param.id) {
                Some(&(declarator, name)) => (declarator, name),
                None => (param.id, param.name),
            };
            if param.is_receiver || param.is_rest {
                continue;
            }
            if param.annotations.iter().any(|a| a.name == skip) {
                continue;
            }
            if index + 1 == total && name == content && !self.options.track_content_params {
                continue;
            }
            let callable = param
                .ty
                .as_ref()
                .is_some_and(|t| t.function_type().is_some());
            let cell = self.factory.cell_name(name);
            map.cells.insert(key, Cell { name: cell, callable });
            let source = self.factory.ident(name, span);
            cells.push((cell, source));
        }
        if needs_this {
            let cell = self.factory.cell_name(this_name);
            map.this_cell = Some(cell);
            let source = self.factory.this(span);
            cells.push((cell, source));
        }

        let shape = ReturnShape::of(func.return_type.as_ref());
        let scope_decl =
            self.factory
                .scope_declaration(func.return_type.as_ref(), &pos, cells.len(), span);

        let cell_names: Vec<Symbol> = cells.iter().map(|(cell, _)| *cell).collect();
        let mut inject = vec![scope_decl];
        if !cells.is_empty() {
            inject.push(self.factory.param_cache_declaration(cells, span));
        }
        if self.options.debug_log {
            for cell in cell_names {
                let read = self.factory.ident(cell, span);
                let value = self.factory.member(read, changed, span);
                let label = format!("{} changed", self.factory.interner().resolve(cell));
                inject.push(self.factory.console_log(&label, value, span));
            }
            let scope_read = self.factory.ident(scope_name, span);
            let value = self.factory.member(scope_read, unchanged, span);
            inject.push(self.factory.console_log("unchanged", value, span));
        }
        let guard = self.factory.early_return_guard(shape, span);
        let guard_id = guard.id();
        inject.push(guard);
        if let Some(cell) = map.this_cell {
            inject.push(self.factory.this_subscription(cell, span));
        }

        let ends_in_jump = matches!(body.stmts.last(), Some(Stmt::Return(_) | Stmt::Throw(_)));
        body.stmts.splice(lead..lead, inject);
        if !ends_in_jump {
            let trailing = self.factory.return_stmt(None, span);
            body.stmts.push(trailing);
        }

        rewrite_params(body, &map, self.bindings, self.factory);
        rewrite_returns(body, guard_id, self.factory);
    }

    /// Calls rewrite on the callee's classification alone; the enclosing
    /// function's kind is irrelevant here.
    fn rewrite_call(&mut self, expr: &mut Expr) {
        let span = expr.span;
        let ExprKind::Call(call) = &mut expr.kind else {
            return;
        };
        let catalog = self.catalog;
        let Some(callable) = catalog.resolve_call(&call.callee, self.bindings, self.current_class)
        else {
            return;
        };
        if !callable.kind(self.tables).rewrites_signature() {
            return;
        }

        let name = match &call.callee.kind {
            ExprKind::Identifier(sym) => Some(self.factory.interner().resolve(*sym).to_string()),
            ExprKind::Member(member) => {
                Some(self.factory.interner().resolve(member.property).to_string())
            }
            _ => None,
        };
        let pos = self.tracker.fresh(name.as_deref());
        let content = self.factory.names().content;

        let total = callable.params.len();
        for (index, arg) in call.args.iter_mut().enumerate() {
            let Some(param) = callable.params.get(index) else {
                break;
            };
            if param.has_skip || param.is_rest || param.is_receiver {
                continue;
            }
            if index + 1 == total
                && param.name == content
                && !self.options.track_content_params
            {
                continue;
            }
            let is_object = matches!(arg.kind, ExprKind::ObjectLiteral(_));
            if !param.is_function_typed() && !is_object {
                continue;
            }
            let cast = if is_object { param.ty.clone() } else { None };
            let arg_pos = self.tracker.fresh(name.as_deref());
            let dummy = self.factory.node();
            let taken = mem::replace(
                arg,
                Expr {
                    id: dummy,
                    kind: ExprKind::Undefined,
                    span,
                },
            );
            *arg = self.factory.compute_wrap(&arg_pos, taken, cast, span);
        }

        let context = self.factory.context_argument(span);
        let id = self.factory.hidden_id_argument(&pos, span);
        call.args.insert(0, id);
        call.args.insert(0, context);
        if callable.has_receiver && call.args.len() >= 3 {
            // (context, id, receiver, ...) -> (receiver, context, id, ...)
            call.args[..3].rotate_right(1);
        }
        self.modified = true;
    }

    fn function_type(&mut self, ft: &mut FunctionType) {
        for param in &mut ft.params {
            if let Some(ty) = &mut param.ty {
                self.type_expr(ty);
            }
        }
        self.type_expr(&mut ft.return_type);
        if self.tables.function_type_kind(ft.id).rewrites_signature() {
            extend_function_type(ft, self.factory);
            self.modified = true;
        }
    }

    fn type_expr(&mut self, ty: &mut TypeExpr) {
        match &mut ty.kind {
            TypeKind::Function(ft) => self.function_type(ft),
            TypeKind::Union(members) => {
                for member in members {
                    self.type_expr(member);
                }
            }
            TypeKind::Named { type_args, .. } => {
                for arg in type_args {
                    self.type_expr(arg);
                }
            }
            TypeKind::This | TypeKind::Void | TypeKind::Undefined => {}
        }
    }

    fn stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Function(func) => self.function(func, false),
            Stmt::Variable(decl) => {
                for declarator in &mut decl.declarators {
                    if let Some(ty) = &mut declarator.ty {
                        self.type_expr(ty);
                    }
                    if let Some(init) = &mut declarator.init {
                        self.expr(init);
                    }
                }
            }
            Stmt::Class(class) => {
                let stable_sym = self.factory.names().memo_stable;
                let stable = class.annotations.iter().any(|a| a.name == stable_sym);
                if stable {
                    self.stable_depth += 1;
                }
                let previous = self.current_class.replace(class.id);
                for member in &mut class.members {
                    match member {
                        ClassMember::Method(method) => self.function(&mut method.func, true),
                        ClassMember::Property(prop) => {
                            if let Some(ty) = &mut prop.ty {
                                self.type_expr(ty);
                            }
                            if let Some(init) = &mut prop.init {
                                self.expr(init);
                            }
                        }
                    }
                }
                self.current_class = previous;
                if stable {
                    self.stable_depth -= 1;
                }
            }
            Stmt::TypeAlias(alias) => self.type_expr(&mut alias.ty),
            Stmt::Return(ret) => {
                if let Some(value) = &mut ret.value {
                    self.expr(value);
                }
            }
            Stmt::If(stmt) => {
                self.expr(&mut stmt.test);
                for stmt in &mut stmt.consequent.stmts {
                    self.stmt(stmt);
                }
                if let Some(alternate) = &mut stmt.alternate {
                    for stmt in &mut alternate.stmts {
                        self.stmt(stmt);
                    }
                }
            }
            Stmt::While(stmt) => {
                self.expr(&mut stmt.test);
                for stmt in &mut stmt.body.stmts {
                    self.stmt(stmt);
                }
            }
            Stmt::Throw(stmt) => self.expr(&mut stmt.value),
            Stmt::Expr(stmt) => self.expr(&mut stmt.expr),
            Stmt::Block(block) => {
                for stmt in &mut block.stmts {
                    self.stmt(stmt);
                }
            }
            Stmt::Import(_) => {}
        }
    }

    fn expr(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Arrow(func) => self.function(func, false),
            ExprKind::Call(call) => {
                self.expr(&mut call.callee);
                for ty in &mut call.type_args {
                    self.type_expr(ty);
                }
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
            ExprKind::As(cast) => {
                self.expr(&mut cast.expr);
                self.type_expr(&mut cast.ty);
            }
            ExprKind::Paren(inner) => self.expr(inner),
            ExprKind::Identifier(_)
            | ExprKind::This
            | ExprKind::Undefined
            | ExprKind::NumberLiteral(_)
            | ExprKind::StringLiteral(_)
            | ExprKind::BoolLiteral(_) => {}
        }
        if matches!(expr.kind, ExprKind::Call(_)) {
            self.rewrite_call(expr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_program;
    use crate::catalog::build_catalog;
    use crate::names::RuntimeNames;
    use murre_frontend::desugar::desugar_program;
    use murre_frontend::printer::print_program;
    use murre_frontend::resolve::resolve_program;
    use murre_frontend::Parser;

    fn transform_with(source: &str, options: &MemoOptions) -> String {
        let mut parser = Parser::new(source);
        let mut program = parser.parse_program().unwrap();
        let mut interner = parser.into_interner();
        desugar_program(&mut program, &mut interner);
        let names = RuntimeNames::new(&mut interner);
        let bindings = resolve_program(&program, &interner);
        let catalog = build_catalog(&program, &names, &interner).unwrap();
        let tables = analyze_program(&program, &catalog, &bindings, &names, &interner).unwrap();
        let mut tracker = CallIdTracker::new("demo.uis", true);
        let mut factory = Factory::new(&names, &mut interner, program.next_node_id);
        transform_program(
            &mut program,
            &tables,
            &catalog,
            &bindings,
            options,
            &mut tracker,
            &mut factory,
        );
        program.next_node_id = factory.finish();
        print_program(&program, &interner)
    }

    fn transform(source: &str) -> String {
        transform_with(source, &MemoOptions::default())
    }

    #[test]
    fn memo_function_grows_scope_cache_guard_and_signature() {
        let out = transform("@memo function chip(label: string): string { return label }");
        assert!(
            out.contains(
                "function chip(__memo_context: __memo_context_type, \
                 __memo_id: __memo_id_type, label: string): string"
            ),
            "{out}"
        );
        assert!(
            out.contains(
                "const __memo_scope = \
                 __memo_context.scope<string>(__memo_id + \"id_chip_demo.uis\", 1)"
            ),
            "{out}"
        );
        assert!(
            out.contains("const __memo_parameter_label = __memo_scope.param(0, label)"),
            "{out}"
        );
        assert!(out.contains("if (__memo_scope.unchanged) {"), "{out}");
        assert!(out.contains("return __memo_scope.cached"), "{out}");
        assert!(
            out.contains("return __memo_scope.recache(__memo_parameter_label.value)"),
            "{out}"
        );
    }

    #[test]
    fn void_memo_function_commits_before_the_trailing_return() {
        let out = transform("@memo function page(): void { render() }");
        assert!(
            out.contains("__memo_context.scope<void>(__memo_id + \"id_page_demo.uis\", 0)"),
            "{out}"
        );
        assert!(!out.contains("__memo_scope.param("), "{out}");
        // The synthesized trailing return commits the scope first.
        assert!(out.contains("__memo_scope.recache()"), "{out}");
        assert!(out.contains("render()"), "{out}");
    }

    #[test]
    fn calls_to_memo_functions_get_hidden_arguments() {
        let out = transform(
            "@memo function chip(label: string): void {}\n\
             @memo function page(): void { chip(\"a\") }",
        );
        assert!(
            out.contains("chip(__memo_context, __memo_id + \"id_chip_demo.uis\", \"a\")"),
            "{out}"
        );
        assert!(!out.contains("compute"), "{out}");
    }

    #[test]
    fn object_literal_arguments_are_computed_with_a_cast() {
        let out = transform(
            "@memo function chip(style: Style): void {}\n\
             @memo function page(): void { chip({ width: 10 }) }",
        );
        assert!(
            out.contains(
                "__memo_context.compute(\"id_chip_demo.uis\", () => ({ width: 10 } as Style))"
            ),
            "{out}"
        );
    }

    #[test]
    fn untracked_content_parameter_is_passed_through() {
        let out = transform(
            "@memo function page(content: @memo () => void): void { content() }",
        );
        // No cache slot for the trailing content parameter.
        assert!(
            out.contains("__memo_context.scope<void>(__memo_id + \"id_page_demo.uis\", 0)"),
            "{out}"
        );
        // But the call through it still forwards the hidden arguments.
        assert!(
            out.contains("content(__memo_context, __memo_id + \"id_content_demo.uis\")"),
            "{out}"
        );
        assert!(!out.contains("compute"), "{out}");
    }

    #[test]
    fn tracked_callback_parameters_route_calls_through_their_cell() {
        let out = transform(
            "@memo function page(body: @memo () => void): void { body() }",
        );
        assert!(
            out.contains("const __memo_parameter_body = __memo_scope.param(0, body)"),
            "{out}"
        );
        assert!(
            out.contains(
                "__memo_parameter_body.value(__memo_context, __memo_id + \"id_body_demo.uis\")"
            ),
            "{out}"
        );
    }

    #[test]
    fn receiver_calls_rotate_the_receiver_ahead_of_hidden_arguments() {
        let out = transform(
            "@memo function style(this: Chip, width: number): this { return this }\n\
             @memo function page(c: Chip): void { style(c, 10) }",
        );
        assert!(
            out.contains(
                "function style(this: Chip, __memo_context: __memo_context_type, \
                 __memo_id: __memo_id_type, width: number): this"
            ),
            "{out}"
        );
        assert!(
            out.contains(
                "style(__memo_parameter_c.value, __memo_context, \
                 __memo_id + \"id_style_demo.uis\", 10)"
            ),
            "{out}"
        );
        assert!(
            out.contains("__memo_parameter_this = __memo_scope.param(1, this)"),
            "{out}"
        );
        // Subscription fires after the guard.
        assert!(out.contains("__memo_parameter_this.value\n"), "{out}");
    }

    #[test]
    fn entry_functions_keep_their_declared_signature() {
        let out = transform(
            "@memo function chip(): void {}\n\
             @memo_entry function boot(__memo_context: Context, __memo_id: number): void \
             { chip() }",
        );
        assert!(
            out.contains("function boot(__memo_context: Context, __memo_id: number): void"),
            "{out}"
        );
        assert!(
            out.contains("chip(__memo_context, __memo_id + \"id_chip_demo.uis\")"),
            "{out}"
        );
    }

    #[test]
    fn intrinsic_functions_extend_the_signature_and_fix_markers_only() {
        let out = transform("@memo_intrinsic function raw(): number { return __id() }");
        assert!(
            out.contains(
                "function raw(__memo_context: __memo_context_type, \
                 __memo_id: __memo_id_type): number"
            ),
            "{out}"
        );
        assert!(out.contains("return __memo_id"), "{out}");
        assert!(!out.contains("__memo_scope"), "{out}");
    }

    #[test]
    fn stable_classes_skip_the_this_slot() {
        let out = transform(
            "@memo_stable class Chip {\n  @memo size(): this { return this }\n}\n\
             class Panel {\n  @memo grow(): this { return this }\n}",
        );
        let chip = out.find("size").unwrap();
        let panel = out.find("grow").unwrap();
        assert!(!out[chip..panel].contains("__memo_parameter_this"), "{out}");
        assert!(out[panel..].contains("__memo_parameter_this"), "{out}");
    }

    #[test]
    fn lowered_defaults_cache_the_declared_name() {
        let out = transform("@memo function chip(count: number = 1): void { show(count) }");
        // The forwarding declaration stays ahead of the caching prologue
        // and keeps its untouched gensym conditional.
        assert!(
            out.contains("const count: number = gensym$_1 !== undefined ? gensym$_1 : 1"),
            "{out}"
        );
        let forwarding = out.find("const count").unwrap();
        let scope = out.find("const __memo_scope").unwrap();
        assert!(forwarding < scope, "{out}");
        assert!(
            out.contains("const __memo_parameter_count = __memo_scope.param(0, count)"),
            "{out}"
        );
        assert!(out.contains("show(__memo_parameter_count.value)"), "{out}");
    }

    #[test]
    fn annotated_variable_arrows_and_their_types_are_extended() {
        let out = transform("@memo const chip: () => number = () => 100");
        assert!(
            out.contains(
                "const chip: (__memo_context: __memo_context_type, \
                 __memo_id: __memo_id_type) => number = \
                 (__memo_context: __memo_context_type, __memo_id: __memo_id_type) =>"
            ),
            "{out}"
        );
        assert!(
            out.contains("scope<void>(__memo_id + \"id_anonymous0_demo.uis\", 0)"),
            "{out}"
        );
    }

    #[test]
    fn debug_logging_dumps_cell_changes_and_scope_state() {
        let options = MemoOptions {
            debug_log: true,
            ..MemoOptions::default()
        };
        let out = transform_with("@memo function chip(label: string): void {}", &options);
        assert!(
            out.contains(
                "console.log(\"__memo_parameter_label changed\", \
                 __memo_parameter_label.changed)"
            ),
            "{out}"
        );
        assert!(
            out.contains("console.log(\"unchanged\", __memo_scope.unchanged)"),
            "{out}"
        );
    }

    #[test]
    fn plain_functions_are_left_alone() {
        let out = transform("function add(a: number, b: number): number { return a + b }");
        assert_eq!(
            out,
            "\nfunction add(a: number, b: number): number {\n  return a + b\n}"
        );
    }
}
