// src/analysis.rs
//
// The classification pass. One top-down walk over the unit assigns every
// function and function type its memo kind, threading inherited kinds from
// annotatable owners (variable declarations, class properties, type aliases,
// parameters, accessors) down to the function-shaped nodes inside them. The
// walk is read-only on the tree; its only output is the side tables.

use murre_frontend::ast::*;
use murre_frontend::resolve::Bindings;
use murre_frontend::{Interner, Symbol};

use crate::catalog::DeclCatalog;
use crate::errors::MemoError;
use crate::kinds::{kind_of_annotations, MemoKind};
use crate::names::RuntimeNames;
use crate::tables::ClassifierTables;

pub fn analyze_program(
    program: &Program,
    catalog: &DeclCatalog,
    bindings: &Bindings,
    names: &RuntimeNames,
    interner: &Interner,
) -> Result<ClassifierTables, MemoError> {
    let mut analyzer = Analyzer {
        catalog,
        bindings,
        names,
        interner,
        tables: ClassifierTables::default(),
        current_class: None,
    };
    for stmt in &program.statements {
        analyzer.stmt(stmt, MemoKind::None)?;
    }
    Ok(analyzer.tables)
}

struct Analyzer<'a> {
    catalog: &'a DeclCatalog,
    bindings: &'a Bindings,
    names: &'a RuntimeNames,
    interner: &'a Interner,
    tables: ClassifierTables,
    current_class: Option<NodeId>,
}

impl<'a> Analyzer<'a> {
    fn owner(&self, name: Option<Symbol>) -> &'a str {
        match name {
            Some(sym) => self.interner.resolve(sym),
            None => "anonymous",
        }
    }

    /// Register a function with its own kind, falling back to the inherited
    /// one. Children classify from scratch: a nested function does not
    /// become memo just because its enclosing function is.
    fn function(&mut self, func: &Function, inherited: MemoKind) -> Result<(), MemoError> {
        let own = kind_of_annotations(&func.annotations, self.names, self.owner(func.name))?;
        self.tables.record_function(func.id, own.or_inherited(inherited));
        self.function_children(func, MemoKind::None)
    }

    /// Accessors forward classification to whatever function values they
    /// produce without becoming rewrite targets themselves.
    fn accessor(&mut self, func: &Function, inherited: MemoKind) -> Result<(), MemoError> {
        let own = kind_of_annotations(&func.annotations, self.names, self.owner(func.name))?;
        self.function_children(func, own.or_inherited(inherited))
    }

    fn function_children(&mut self, func: &Function, inherited: MemoKind) -> Result<(), MemoError> {
        for param in &func.params {
            self.param(param, inherited)?;
        }
        if let Some(ret) = &func.return_type {
            self.type_expr(ret, inherited)?;
        }
        match &func.body {
            FuncBody::Block(block) => self.block(block, inherited),
            FuncBody::Expr(expr) => self.expr(expr, inherited),
        }
    }

    fn param(&mut self, param: &Param, inherited: MemoKind) -> Result<(), MemoError> {
        let owner = self.interner.resolve(param.name);
        let own = kind_of_annotations(&param.annotations, self.names, owner)?;
        let kind = own.or_inherited(inherited);
        if let Some(ty) = &param.ty {
            self.type_expr(ty, kind)?;
        }
        if let Some(default) = &param.default {
            self.expr(default, kind)?;
        }
        Ok(())
    }

    fn function_type(&mut self, ft: &FunctionType, inherited: MemoKind) -> Result<(), MemoError> {
        let own = kind_of_annotations(&ft.annotations, self.names, "anonymous")?;
        self.tables
            .record_function_type(ft.id, own.or_inherited(inherited));
        for param in &ft.params {
            self.param(param, MemoKind::None)?;
        }
        self.type_expr(&ft.return_type, MemoKind::None)
    }

    fn type_expr(&mut self, ty: &TypeExpr, inherited: MemoKind) -> Result<(), MemoError> {
        match &ty.kind {
            TypeKind::Function(ft) => self.function_type(ft, inherited),
            TypeKind::Union(members) => {
                for member in members {
                    self.type_expr(member, inherited)?;
                }
                Ok(())
            }
            TypeKind::Named { type_args, .. } => {
                for arg in type_args {
                    self.type_expr(arg, inherited)?;
                }
                Ok(())
            }
            TypeKind::This | TypeKind::Void | TypeKind::Undefined => Ok(()),
        }
    }

    fn stmt(&mut self, stmt: &Stmt, inherited: MemoKind) -> Result<(), MemoError> {
        match stmt {
            Stmt::Function(func) => self.function(func, inherited),
            Stmt::Variable(decl) => {
                let owner = self.owner(decl.declarators.first().map(|d| d.name));
                let own = kind_of_annotations(&decl.annotations, self.names, owner)?;
                let kind = own.or_inherited(inherited);
                for declarator in &decl.declarators {
                    if let Some(ty) = &declarator.ty {
                        self.type_expr(ty, kind)?;
                    }
                    if let Some(init) = &declarator.init {
                        self.expr(init, kind)?;
                    }
                }
                Ok(())
            }
            Stmt::Class(class) => {
                let previous = self.current_class.replace(class.id);
                for member in &class.members {
                    match member {
                        ClassMember::Method(method) => {
                            if method.kind.is_accessor() {
                                self.accessor(&method.func, MemoKind::None)?;
                            } else {
                                self.function(&method.func, MemoKind::None)?;
                            }
                        }
                        ClassMember::Property(prop) => {
                            let owner = self.interner.resolve(prop.name);
                            let own =
                                kind_of_annotations(&prop.annotations, self.names, owner)?;
                            if let Some(ty) = &prop.ty {
                                self.type_expr(ty, own)?;
                            }
                            if let Some(init) = &prop.init {
                                self.expr(init, own)?;
                            }
                        }
                    }
                }
                self.current_class = previous;
                Ok(())
            }
            Stmt::TypeAlias(alias) => {
                let owner = self.interner.resolve(alias.name);
                let own = kind_of_annotations(&alias.annotations, self.names, owner)?;
                self.type_expr(&alias.ty, own.or_inherited(inherited))
            }
            Stmt::Return(ret) => match &ret.value {
                Some(value) => self.expr(value, inherited),
                None => Ok(()),
            },
            Stmt::If(stmt) => {
                self.expr(&stmt.test, inherited)?;
                self.block(&stmt.consequent, inherited)?;
                match &stmt.alternate {
                    Some(alternate) => self.block(alternate, inherited),
                    None => Ok(()),
                }
            }
            Stmt::While(stmt) => {
                self.expr(&stmt.test, inherited)?;
                self.block(&stmt.body, inherited)
            }
            Stmt::Throw(stmt) => self.expr(&stmt.value, inherited),
            Stmt::Expr(stmt) => self.expr(&stmt.expr, inherited),
            Stmt::Block(block) => self.block(block, inherited),
            Stmt::Import(_) => Ok(()),
        }
    }

    fn block(&mut self, block: &Block, inherited: MemoKind) -> Result<(), MemoError> {
        for stmt in &block.stmts {
            self.stmt(stmt, inherited)?;
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr, inherited: MemoKind) -> Result<(), MemoError> {
        match &expr.kind {
            ExprKind::Arrow(func) => self.function(func, inherited),
            ExprKind::Call(call) => {
                self.expr(&call.callee, MemoKind::None)?;
                for ty in &call.type_args {
                    self.type_expr(ty, MemoKind::None)?;
                }
                // A call boundary discards the ambient inherited kind; each
                // argument inherits from its formal parameter instead.
                let catalog = self.catalog;
                let callable =
                    catalog.resolve_call(&call.callee, self.bindings, self.current_class);
                for (index, arg) in call.args.iter().enumerate() {
                    let inherit = callable
                        .and_then(|c| c.args_params().get(index))
                        .map(|p| p.inherit)
                        .unwrap_or_default();
                    self.expr(arg, inherit)?;
                }
                Ok(())
            }
            ExprKind::Member(member) => self.expr(&member.object, inherited),
            ExprKind::Conditional(cond) => {
                self.expr(&cond.test, inherited)?;
                self.expr(&cond.consequent, inherited)?;
                self.expr(&cond.alternate, inherited)
            }
            ExprKind::Binary(binary) => {
                self.expr(&binary.left, inherited)?;
                self.expr(&binary.right, inherited)
            }
            ExprKind::Unary(unary) => self.expr(&unary.operand, inherited),
            ExprKind::Assign(assign) => {
                self.expr(&assign.target, inherited)?;
                self.expr(&assign.value, inherited)
            }
            ExprKind::ObjectLiteral(object) => {
                for field in &object.fields {
                    self.expr(&field.value, inherited)?;
                }
                Ok(())
            }
            ExprKind::ArrayLiteral(elements) => {
                for element in elements {
                    self.expr(element, inherited)?;
                }
                Ok(())
            }
            ExprKind::As(cast) => {
                self.expr(&cast.expr, inherited)?;
                self.type_expr(&cast.ty, inherited)
            }
            ExprKind::Paren(inner) => self.expr(inner, inherited),
            ExprKind::Identifier(_)
            | ExprKind::This
            | ExprKind::Undefined
            | ExprKind::NumberLiteral(_)
            | ExprKind::StringLiteral(_)
            | ExprKind::BoolLiteral(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_catalog;
    use murre_frontend::desugar::desugar_program;
    use murre_frontend::resolve::resolve_program;
    use murre_frontend::Parser;

    fn analyze(source: &str) -> (Program, Interner, ClassifierTables) {
        let mut parser = Parser::new(source);
        let mut program = parser.parse_program().unwrap();
        let mut interner = parser.into_interner();
        desugar_program(&mut program, &mut interner);
        let names = RuntimeNames::new(&mut interner);
        let bindings = resolve_program(&program, &interner);
        let catalog = build_catalog(&program, &names, &interner).unwrap();
        let tables =
            analyze_program(&program, &catalog, &bindings, &names, &interner).unwrap();
        (program, interner, tables)
    }

    fn function_id(stmt: &Stmt) -> NodeId {
        let Stmt::Function(func) = stmt else {
            panic!("expected function statement");
        };
        func.id
    }

    #[test]
    fn explicit_annotations_classify() {
        let (program, _, tables) = analyze(
            "@memo function a(): void {}\n\
             @memo_intrinsic function b(): void {}\n\
             @memo_entry function c(): void {}\n\
             function d(): void {}",
        );
        assert_eq!(tables.function_kind(function_id(&program.statements[0])), MemoKind::Memo);
        assert_eq!(
            tables.function_kind(function_id(&program.statements[1])),
            MemoKind::Intrinsic
        );
        assert_eq!(
            tables.function_kind(function_id(&program.statements[2])),
            MemoKind::Entry
        );
        assert_eq!(tables.function_kind(function_id(&program.statements[3])), MemoKind::None);
    }

    #[test]
    fn call_arguments_inherit_from_their_formal_parameter() {
        let (program, _, tables) = analyze(
            "function page(@memo content: () => void): void {}\n\
             function app(): void { page(() => {}, () => {}) }",
        );
        let Stmt::Function(app) = &program.statements[1] else {
            panic!("expected function");
        };
        let FuncBody::Block(body) = &app.body else {
            panic!("expected block body");
        };
        let Stmt::Expr(stmt) = &body.stmts[0] else {
            panic!("expected expression statement");
        };
        let ExprKind::Call(call) = &stmt.expr.kind else {
            panic!("expected call");
        };
        let ExprKind::Arrow(first) = &call.args[0].kind else {
            panic!("expected arrow argument");
        };
        let ExprKind::Arrow(second) = &call.args[1].kind else {
            panic!("expected arrow argument");
        };
        assert_eq!(tables.function_kind(first.id), MemoKind::Memo);
        // Beyond the formals there is nothing to inherit from.
        assert_eq!(tables.function_kind(second.id), MemoKind::None);
    }

    #[test]
    fn accessors_propagate_without_registering() {
        let (program, _, tables) = analyze(
            "class Panel {\n  @memo get content(): () => void { return () => {} }\n}",
        );
        let Stmt::Class(class) = &program.statements[0] else {
            panic!("expected class");
        };
        let ClassMember::Method(getter) = &class.members[0] else {
            panic!("expected method");
        };
        let FuncBody::Block(body) = &getter.func.body else {
            panic!("expected block body");
        };
        let Stmt::Return(ret) = &body.stmts[0] else {
            panic!("expected return");
        };
        let ExprKind::Arrow(arrow) = &ret.value.as_ref().unwrap().kind else {
            panic!("expected arrow");
        };
        assert_eq!(tables.function_kind(getter.func.id), MemoKind::None);
        assert_eq!(tables.function_kind(arrow.id), MemoKind::Memo);
    }

    #[test]
    fn variable_annotations_flow_into_the_initializer() {
        let (program, _, tables) = analyze(
            "@memo const header = () => {}\nconst plain = () => {}",
        );
        let arrow_of = |stmt: &Stmt| -> NodeId {
            let Stmt::Variable(decl) = stmt else {
                panic!("expected variable declaration");
            };
            let ExprKind::Arrow(arrow) = &decl.declarators[0].init.as_ref().unwrap().kind else {
                panic!("expected arrow initializer");
            };
            arrow.id
        };
        assert_eq!(
            tables.function_kind(arrow_of(&program.statements[0])),
            MemoKind::Memo
        );
        assert_eq!(
            tables.function_kind(arrow_of(&program.statements[1])),
            MemoKind::None
        );
    }

    #[test]
    fn function_types_classify_into_their_own_table() {
        let (program, _, tables) = analyze("type Content = @memo () => void");
        let Stmt::TypeAlias(alias) = &program.statements[0] else {
            panic!("expected type alias");
        };
        let ft = alias.ty.function_type().unwrap();
        assert_eq!(tables.function_type_kind(ft.id), MemoKind::Memo);
        assert_eq!(tables.function_kind(ft.id), MemoKind::None);
    }

    #[test]
    fn conflicting_annotations_are_rejected() {
        let mut parser = Parser::new("@memo @memo_intrinsic function f(): void {}");
        let mut program = parser.parse_program().unwrap();
        let mut interner = parser.into_interner();
        desugar_program(&mut program, &mut interner);
        let names = RuntimeNames::new(&mut interner);
        let bindings = resolve_program(&program, &interner);
        let catalog = build_catalog(&program, &names, &interner).unwrap();
        let err = analyze_program(&program, &catalog, &bindings, &names, &interner).unwrap_err();
        assert!(err.to_string().contains('f'));
    }
}
