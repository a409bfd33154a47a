// src/resolve.rs
//
// Lexical name resolution. Produces a side table from identifier uses to
// their declaration sites; no type information is involved. Function
// declarations hoist within their enclosing block, `const`/`let` do not.

use rustc_hash::FxHashMap;

use crate::ast::*;
use crate::desugar::is_gensym_name;
use crate::{Interner, Symbol};

/// Where a name was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclSite {
    /// A `function` declaration; the id is the `Function` node.
    Function(NodeId),
    /// A `const`/`let` declarator.
    Declarator(NodeId),
    /// A declared parameter.
    Param(NodeId),
}

/// A declaration lookup that may pass through one level of synthesized
/// indirection: `Indirect` means the name resolved to a declarator that
/// merely forwards a gensym parameter, and the site is that parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Direct(DeclSite),
    Indirect(DeclSite),
    Unresolved,
}

impl Resolution {
    pub fn site(self) -> Option<DeclSite> {
        match self {
            Resolution::Direct(site) | Resolution::Indirect(site) => Some(site),
            Resolution::Unresolved => None,
        }
    }
}

/// Resolution results for one compilation unit.
#[derive(Debug, Default)]
pub struct Bindings {
    /// Identifier expression id -> declaration site.
    refs: FxHashMap<NodeId, DeclSite>,
    /// Declarator id -> the gensym parameter it forwards. Set for the
    /// synthesized `const x = gensym$_k !== undefined ? gensym$_k : E`
    /// declarations that default-parameter lowering leaves behind.
    gensym_indirections: FxHashMap<NodeId, DeclSite>,
}

impl Bindings {
    pub fn resolve(&self, use_site: NodeId) -> Option<DeclSite> {
        self.refs.get(&use_site).copied()
    }

    /// The gensym parameter a synthesized declarator forwards, if any.
    pub fn indirection(&self, declarator: NodeId) -> Option<DeclSite> {
        self.gensym_indirections.get(&declarator).copied()
    }

    /// Resolve a use site, unwrapping one level of gensym indirection.
    pub fn resolve_through(&self, use_site: NodeId) -> Resolution {
        match self.resolve(use_site) {
            None => Resolution::Unresolved,
            Some(DeclSite::Declarator(declarator)) => match self.indirection(declarator) {
                Some(param) => Resolution::Indirect(param),
                None => Resolution::Direct(DeclSite::Declarator(declarator)),
            },
            Some(site) => Resolution::Direct(site),
        }
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

pub fn resolve_program(program: &Program, interner: &Interner) -> Bindings {
    let mut resolver = Resolver {
        interner,
        scopes: vec![FxHashMap::default()],
        bindings: Bindings::default(),
    };
    resolver.stmts(&program.statements);
    resolver.bindings
}

struct Resolver<'a> {
    interner: &'a Interner,
    scopes: Vec<FxHashMap<Symbol, DeclSite>>,
    bindings: Bindings,
}

impl Resolver<'_> {
    fn declare(&mut self, name: Symbol, site: DeclSite) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, site);
        }
    }

    fn lookup(&self, name: Symbol) -> Option<DeclSite> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name).copied())
    }

    /// Visit a statement list with function declarations hoisted.
    fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if let Stmt::Function(func) = stmt {
                if let Some(name) = func.name {
                    self.declare(name, DeclSite::Function(func.id));
                }
            }
        }
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Function(func) => self.function(func),
            Stmt::Variable(decl) => {
                for declarator in &decl.declarators {
                    if let Some(init) = &declarator.init {
                        self.expr(init);
                        self.detect_indirection(declarator, init);
                    }
                    self.declare(declarator.name, DeclSite::Declarator(declarator.id));
                }
            }
            Stmt::Class(class) => {
                for member in &class.members {
                    match member {
                        ClassMember::Method(method) => self.function(&method.func),
                        ClassMember::Property(prop) => {
                            if let Some(init) = &prop.init {
                                self.expr(init);
                            }
                        }
                    }
                }
            }
            Stmt::Return(ret) => {
                if let Some(value) = &ret.value {
                    self.expr(value);
                }
            }
            Stmt::If(stmt) => {
                self.expr(&stmt.test);
                self.block(&stmt.consequent);
                if let Some(alternate) = &stmt.alternate {
                    self.block(alternate);
                }
            }
            Stmt::While(stmt) => {
                self.expr(&stmt.test);
                self.block(&stmt.body);
            }
            Stmt::Throw(stmt) => self.expr(&stmt.value),
            Stmt::Expr(stmt) => self.expr(&stmt.expr),
            Stmt::Block(block) => self.block(block),
            Stmt::Import(_) | Stmt::TypeAlias(_) => {}
        }
    }

    fn block(&mut self, block: &Block) {
        self.scopes.push(FxHashMap::default());
        self.stmts(&block.stmts);
        self.scopes.pop();
    }

    fn function(&mut self, func: &Function) {
        self.scopes.push(FxHashMap::default());
        for param in &func.params {
            // A default sees the parameters declared before it.
            if let Some(default) = &param.default {
                self.expr(default);
            }
            self.declare(param.name, DeclSite::Param(param.id));
        }
        match &func.body {
            FuncBody::Block(block) => self.stmts(&block.stmts),
            FuncBody::Expr(expr) => self.expr(expr),
        }
        self.scopes.pop();
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Identifier(name) => {
                if let Some(site) = self.lookup(*name) {
                    self.bindings.refs.insert(expr.id, site);
                }
            }
            ExprKind::Arrow(func) => self.function(func),
            ExprKind::Call(call) => {
                self.expr(&call.callee);
                for arg in &call.args {
                    self.expr(arg);
                }
            }
            // The property is a name, not a binding.
            ExprKind::Member(member) => self.expr(&member.object),
            ExprKind::Conditional(cond) => {
                self.expr(&cond.test);
                self.expr(&cond.consequent);
                self.expr(&cond.alternate);
            }
            ExprKind::Binary(binary) => {
                self.expr(&binary.left);
                self.expr(&binary.right);
            }
            ExprKind::Unary(unary) => self.expr(&unary.operand),
            ExprKind::Assign(assign) => {
                self.expr(&assign.target);
                self.expr(&assign.value);
            }
            ExprKind::ObjectLiteral(object) => {
                for field in &object.fields {
                    self.expr(&field.value);
                }
            }
            ExprKind::ArrayLiteral(elements) => {
                for element in elements {
                    self.expr(element);
                }
            }
            ExprKind::As(cast) => self.expr(&cast.expr),
            ExprKind::Paren(inner) => self.expr(inner),
            ExprKind::This
            | ExprKind::Undefined
            | ExprKind::NumberLiteral(_)
            | ExprKind::StringLiteral(_)
            | ExprKind::BoolLiteral(_) => {}
        }
    }

    /// Recognise `const x = gensym$_k !== undefined ? gensym$_k : E` and link
    /// the declarator to the gensym parameter it forwards.
    fn detect_indirection(&mut self, declarator: &VarDeclarator, init: &Expr) {
        let mut init = init;
        while let ExprKind::Paren(inner) = &init.kind {
            init = inner;
        }
        let ExprKind::Conditional(cond) = &init.kind else {
            return;
        };
        let ExprKind::Binary(test) = &cond.test.kind else {
            return;
        };
        if test.op != BinaryOp::StrictNe || !matches!(test.right.kind, ExprKind::Undefined) {
            return;
        }
        let (ExprKind::Identifier(tested), ExprKind::Identifier(taken)) =
            (&test.left.kind, &cond.consequent.kind)
        else {
            return;
        };
        if tested != taken || !is_gensym_name(self.interner.resolve(*tested)) {
            return;
        }
        if let Some(site @ DeclSite::Param(_)) = self.lookup(*tested) {
            self.bindings
                .gensym_indirections
                .insert(declarator.id, site);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desugar::desugar_program;
    use crate::parser::Parser;

    fn resolved(source: &str) -> (Program, Bindings) {
        let mut parser = Parser::new(source);
        let mut program = parser.parse_program().unwrap();
        let mut interner = parser.into_interner();
        desugar_program(&mut program, &mut interner);
        let bindings = resolve_program(&program, &interner);
        (program, bindings)
    }

    fn callee_id(program: &Program, stmt_index: usize) -> NodeId {
        let func = match &program.statements[stmt_index] {
            Stmt::Function(f) => f,
            other => panic!("expected function, got {other:?}"),
        };
        let FuncBody::Block(block) = &func.body else {
            panic!("expected block");
        };
        for stmt in &block.stmts {
            if let Stmt::Expr(e) = stmt {
                if let ExprKind::Call(call) = &e.expr.kind {
                    return call.callee.id;
                }
            }
        }
        panic!("no call statement found");
    }

    #[test]
    fn call_resolves_to_hoisted_function() {
        let (program, bindings) =
            resolved("function f(): void { g() }\nfunction g(): void {}");
        let callee = callee_id(&program, 0);
        assert!(matches!(
            bindings.resolve(callee),
            Some(DeclSite::Function(_))
        ));
    }

    #[test]
    fn inner_declaration_shadows_outer_function() {
        let (program, bindings) = resolved(
            "function g(): void {}\nfunction f(g: Builder): void { g() }",
        );
        let callee = callee_id(&program, 1);
        assert!(matches!(bindings.resolve(callee), Some(DeclSite::Param(_))));
    }

    #[test]
    fn lowered_default_forwards_through_gensym() {
        let (program, bindings) =
            resolved("function f(content: Builder = empty): void { content() }");
        let callee = callee_id(&program, 0);
        let Some(DeclSite::Declarator(declarator)) = bindings.resolve(callee) else {
            panic!("expected declarator binding");
        };
        assert!(matches!(
            bindings.indirection(declarator),
            Some(DeclSite::Param(_))
        ));
        assert!(matches!(
            bindings.resolve_through(callee),
            Resolution::Indirect(DeclSite::Param(_))
        ));
    }

    #[test]
    fn unknown_names_stay_unresolved() {
        let (program, bindings) = resolved("function f(): void { missing() }");
        let callee = callee_id(&program, 0);
        assert!(bindings.resolve(callee).is_none());
    }
}
