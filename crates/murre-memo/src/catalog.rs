// src/catalog.rs
//
// Pre-collected summaries of every callable declaration in the unit:
// functions, methods, function types, and parameters. Calls resolve against
// these summaries instead of the live tree, which keeps the transformers
// free to rebuild nodes while still answering "what does this call target"
// for hoisted and not-yet-visited declarations.

use murre_frontend::ast::*;
use murre_frontend::resolve::{Bindings, DeclSite};
use murre_frontend::{Interner, Symbol};
use rustc_hash::FxHashMap;

use crate::errors::MemoError;
use crate::kinds::{kind_of_annotations, MemoKind};
use crate::names::RuntimeNames;
use crate::tables::ClassifierTables;

/// What the rewrite needs to know about one declared parameter.
#[derive(Debug, Clone)]
pub struct ParamSummary {
    pub id: NodeId,
    pub name: Symbol,
    pub has_skip: bool,
    pub is_rest: bool,
    pub is_receiver: bool,
    /// Declared type, kept for the `as`-cast on object-literal arguments.
    pub ty: Option<TypeExpr>,
    /// The function-type node when the declared type is a function type,
    /// directly or behind one union level.
    pub fn_type: Option<NodeId>,
    /// Kind a callback argument in this position inherits.
    pub inherit: MemoKind,
}

impl ParamSummary {
    pub fn is_function_typed(&self) -> bool {
        self.fn_type.is_some()
    }
}

/// A callable target: a script function or a function type.
#[derive(Debug, Clone)]
pub struct Callable {
    pub node: NodeId,
    pub name: Option<Symbol>,
    pub params: Vec<ParamSummary>,
    pub has_receiver: bool,
    /// True for function-type targets, which classify through the
    /// function-type table.
    pub is_type: bool,
}

impl Callable {
    pub fn kind(&self, tables: &ClassifierTables) -> MemoKind {
        if self.is_type {
            tables.function_type_kind(self.node)
        } else {
            tables.function_kind(self.node)
        }
    }

    /// Formal parameters that match positional call arguments: a receiver
    /// is passed as the member object or leading argument, never matched
    /// positionally.
    pub fn args_params(&self) -> &[ParamSummary] {
        if self.has_receiver {
            &self.params[1..]
        } else {
            &self.params
        }
    }
}

#[derive(Debug, Default)]
pub struct DeclCatalog {
    functions: FxHashMap<NodeId, Callable>,
    types: FxHashMap<NodeId, Callable>,
    params: FxHashMap<NodeId, ParamSummary>,
    /// Declarator initialized with an arrow function.
    declarator_arrows: FxHashMap<NodeId, NodeId>,
    /// Declarator whose declared type is a function type.
    declarator_types: FxHashMap<NodeId, NodeId>,
    /// (class, method name) -> method function node.
    methods: FxHashMap<(NodeId, Symbol), NodeId>,
}

impl DeclCatalog {
    pub fn param_summary(&self, param: NodeId) -> Option<&ParamSummary> {
        self.params.get(&param)
    }

    pub fn function(&self, node: NodeId) -> Option<&Callable> {
        self.functions.get(&node)
    }

    /// The callable a resolved declaration site designates, if any.
    pub fn callable_for_site(&self, site: DeclSite) -> Option<&Callable> {
        match site {
            DeclSite::Function(id) => self.functions.get(&id),
            DeclSite::Param(id) => self
                .params
                .get(&id)
                .and_then(|p| p.fn_type)
                .and_then(|ty| self.types.get(&ty)),
            DeclSite::Declarator(id) => self
                .declarator_arrows
                .get(&id)
                .and_then(|f| self.functions.get(f))
                .or_else(|| {
                    self.declarator_types
                        .get(&id)
                        .and_then(|ty| self.types.get(ty))
                }),
        }
    }

    /// Resolve a call's callee to a callable: identifier callees through the
    /// lexical bindings (gensym-aware), `this.m(...)` against the enclosing
    /// class's methods. Anything else is a silent non-target.
    pub fn resolve_call(
        &self,
        callee: &Expr,
        bindings: &Bindings,
        enclosing_class: Option<NodeId>,
    ) -> Option<&Callable> {
        match &callee.kind {
            ExprKind::Identifier(_) => bindings
                .resolve_through(callee.id)
                .site()
                .and_then(|site| self.callable_for_site(site)),
            ExprKind::Member(member) if member.object.is_this() => {
                let class = enclosing_class?;
                let func = self.methods.get(&(class, member.property))?;
                self.functions.get(func)
            }
            _ => None,
        }
    }
}

pub fn build_catalog(
    program: &Program,
    names: &RuntimeNames,
    interner: &Interner,
) -> Result<DeclCatalog, MemoError> {
    let mut builder = CatalogBuilder {
        names,
        interner,
        catalog: DeclCatalog::default(),
    };
    for stmt in &program.statements {
        builder.stmt(stmt)?;
    }
    Ok(builder.catalog)
}

struct CatalogBuilder<'a> {
    names: &'a RuntimeNames,
    interner: &'a Interner,
    catalog: DeclCatalog,
}

impl CatalogBuilder<'_> {
    fn param_summary(&self, param: &Param) -> Result<ParamSummary, MemoError> {
        let owner = self.interner.resolve(param.name);
        let own = kind_of_annotations(&param.annotations, self.names, owner)?;
        let fn_type = param.ty.as_ref().and_then(|t| t.function_type());
        let inherit = match fn_type {
            Some(ft) => own.or_inherited(kind_of_annotations(&ft.annotations, self.names, owner)?),
            None => own,
        };
        Ok(ParamSummary {
            id: param.id,
            name: param.name,
            has_skip: param
                .annotations
                .iter()
                .any(|a| a.name == self.names.memo_skip),
            is_rest: param.is_rest,
            is_receiver: param.is_receiver,
            ty: param.ty.clone(),
            fn_type: fn_type.map(|ft| ft.id),
            inherit,
        })
    }

    fn function(&mut self, func: &Function) -> Result<(), MemoError> {
        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            let summary = self.param_summary(param)?;
            self.catalog.params.insert(param.id, summary.clone());
            params.push(summary);
            if let Some(ty) = &param.ty {
                self.type_expr(ty)?;
            }
        }
        self.catalog.functions.insert(
            func.id,
            Callable {
                node: func.id,
                name: func.name,
                params,
                has_receiver: func.has_receiver(),
                is_type: false,
            },
        );
        if let Some(ret) = &func.return_type {
            self.type_expr(ret)?;
        }
        match &func.body {
            FuncBody::Block(block) => self.block(block)?,
            FuncBody::Expr(expr) => self.expr(expr)?,
        }
        Ok(())
    }

    fn function_type(&mut self, ft: &FunctionType) -> Result<(), MemoError> {
        let mut params = Vec::with_capacity(ft.params.len());
        for param in &ft.params {
            let summary = self.param_summary(param)?;
            self.catalog.params.insert(param.id, summary.clone());
            params.push(summary);
            if let Some(ty) = &param.ty {
                self.type_expr(ty)?;
            }
        }
        let has_receiver = params.first().is_some_and(|p| p.is_receiver);
        self.catalog.types.insert(
            ft.id,
            Callable {
                node: ft.id,
                name: None,
                params,
                has_receiver,
                is_type: true,
            },
        );
        self.type_expr(&ft.return_type)
    }

    fn type_expr(&mut self, ty: &TypeExpr) -> Result<(), MemoError> {
        match &ty.kind {
            TypeKind::Function(ft) => self.function_type(ft),
            TypeKind::Union(members) => {
                for member in members {
                    self.type_expr(member)?;
                }
                Ok(())
            }
            TypeKind::Named { type_args, .. } => {
                for arg in type_args {
                    self.type_expr(arg)?;
                }
                Ok(())
            }
            TypeKind::This | TypeKind::Void | TypeKind::Undefined => Ok(()),
        }
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), MemoError> {
        match stmt {
            Stmt::Function(func) => self.function(func),
            Stmt::Variable(decl) => {
                for declarator in &decl.declarators {
                    if let Some(ty) = &declarator.ty {
                        self.type_expr(ty)?;
                        if let Some(ft) = ty.function_type() {
                            self.catalog
                                .declarator_types
                                .insert(declarator.id, ft.id);
                        }
                    }
                    if let Some(init) = &declarator.init {
                        let mut target = init;
                        while let ExprKind::Paren(inner) = &target.kind {
                            target = inner;
                        }
                        if let ExprKind::Arrow(arrow) = &target.kind {
                            self.catalog.declarator_arrows.insert(declarator.id, arrow.id);
                        }
                        self.expr(init)?;
                    }
                }
                Ok(())
            }
            Stmt::Class(class) => {
                for member in &class.members {
                    match member {
                        ClassMember::Method(method) => {
                            if method.kind == MethodKind::Method {
                                if let Some(name) = method.func.name {
                                    self.catalog.methods.insert((class.id, name), method.func.id);
                                }
                            }
                            self.function(&method.func)?;
                        }
                        ClassMember::Property(prop) => {
                            if let Some(ty) = &prop.ty {
                                self.type_expr(ty)?;
                            }
                            if let Some(init) = &prop.init {
                                self.expr(init)?;
                            }
                        }
                    }
                }
                Ok(())
            }
            Stmt::TypeAlias(alias) => self.type_expr(&alias.ty),
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
            Stmt::Import(_) => Ok(()),
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
                for ty in &call.type_args {
                    self.type_expr(ty)?;
                }
                for arg in &call.args {
                    self.expr(arg)?;
                }
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
            ExprKind::Assign(assign) => {
                self.expr(&assign.target)?;
                self.expr(&assign.value)
            }
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
            ExprKind::As(cast) => {
                self.expr(&cast.expr)?;
                self.type_expr(&cast.ty)
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use murre_frontend::desugar::desugar_program;
    use murre_frontend::Parser;

    fn catalog_for(source: &str) -> (Program, Interner, DeclCatalog) {
        let mut parser = Parser::new(source);
        let mut program = parser.parse_program().unwrap();
        let mut interner = parser.into_interner();
        desugar_program(&mut program, &mut interner);
        let names = RuntimeNames::new(&mut interner);
        let catalog = build_catalog(&program, &names, &interner).unwrap();
        (program, interner, catalog)
    }

    #[test]
    fn function_summary_captures_receiver_and_skip() {
        let (program, interner, catalog) = catalog_for(
            "function style(this: Chip, @memo_skip width: number): this { return this }",
        );
        let Stmt::Function(func) = &program.statements[0] else {
            panic!("expected function");
        };
        let callable = catalog.function(func.id).unwrap();
        assert!(callable.has_receiver);
        assert_eq!(callable.args_params().len(), 1);
        assert!(callable.args_params()[0].has_skip);
        assert_eq!(interner.resolve(callable.name.unwrap()), "style");
    }

    #[test]
    fn function_typed_param_links_its_type_node() {
        let (program, _, catalog) =
            catalog_for("function page(content: @memo () => void): void { content() }");
        let Stmt::Function(func) = &program.statements[0] else {
            panic!("expected function");
        };
        let callable = catalog.function(func.id).unwrap();
        let param = &callable.params[0];
        assert!(param.is_function_typed());
        assert_eq!(param.inherit, MemoKind::Memo);
        let ty_callable = catalog.callable_for_site(DeclSite::Param(param.id)).unwrap();
        assert!(ty_callable.is_type);
    }

    #[test]
    fn method_calls_on_this_resolve_in_the_enclosing_class() {
        let (program, interner, catalog) = catalog_for(
            "class Chip {\n  @memo build(): void { this.part() }\n  @memo part(): void {}\n}",
        );
        let Stmt::Class(class) = &program.statements[0] else {
            panic!("expected class");
        };
        let ClassMember::Method(build) = &class.members[0] else {
            panic!("expected method");
        };
        let FuncBody::Block(block) = &build.func.body else {
            panic!("expected block");
        };
        let Stmt::Expr(call_stmt) = &block.stmts[0] else {
            panic!("expected call statement");
        };
        let ExprKind::Call(call) = &call_stmt.expr.kind else {
            panic!("expected call");
        };
        let bindings = Bindings::default();
        let callable = catalog
            .resolve_call(&call.callee, &bindings, Some(class.id))
            .unwrap();
        assert_eq!(interner.resolve(callable.name.unwrap()), "part");
        assert!(
            catalog
                .resolve_call(&call.callee, &bindings, None)
                .is_none()
        );
    }

    #[test]
    fn arrow_initializer_makes_the_declarator_callable() {
        let (program, _, catalog) = catalog_for("const render = (count: number) => count");
        let Stmt::Variable(decl) = &program.statements[0] else {
            panic!("expected variable declaration");
        };
        let site = DeclSite::Declarator(decl.declarators[0].id);
        let callable = catalog.callable_for_site(site).unwrap();
        assert!(!callable.is_type);
        assert_eq!(callable.params.len(), 1);
    }
}
