// src/desugar.rs
//
// Default-parameter lowering. A parameter `x: T = E` becomes a fresh
// `gensym$_k: T | undefined` parameter plus a leading declaration
// `const x: T = gensym$_k !== undefined ? gensym$_k : E` in the body, so
// later passes see a single canonical parameter shape. The memo rewrite
// recognises the synthesized declarations structurally and redirects the
// parameter cache to them.

use crate::ast::*;
use crate::{Interner, Span, Symbol};

/// Prefix for synthesized parameter names. `$` keeps them out of the way of
/// ordinary user identifiers while still lexing as one token.
pub const GENSYM_PREFIX: &str = "gensym$_";

pub fn is_gensym_name(name: &str) -> bool {
    name.starts_with(GENSYM_PREFIX)
}

/// Lower all default parameter values in the program, in place.
pub fn desugar_program(program: &mut Program, interner: &mut Interner) {
    let mut pass = Desugar {
        next_node_id: program.next_node_id,
        next_gensym: 1,
        interner,
    };
    for stmt in &mut program.statements {
        pass.stmt(stmt);
    }
    program.next_node_id = pass.next_node_id;
}

struct Desugar<'a> {
    next_node_id: u32,
    /// Program-wide counter, so every synthesized name is unique in the unit.
    next_gensym: u32,
    interner: &'a mut Interner,
}

impl Desugar<'_> {
    fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    fn ident(&mut self, name: Symbol, span: Span) -> Expr {
        Expr {
            id: self.next_id(),
            kind: ExprKind::Identifier(name),
            span,
        }
    }

    fn stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
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
            Stmt::Variable(decl) => {
                for declarator in &mut decl.declarators {
                    if let Some(init) = &mut declarator.init {
                        self.expr(init);
                    }
                }
            }
            Stmt::Return(ret) => {
                if let Some(value) = &mut ret.value {
                    self.expr(value);
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

    fn block(&mut self, block: &mut Block) {
        for stmt in &mut block.stmts {
            self.stmt(stmt);
        }
    }

    fn expr(&mut self, expr: &mut Expr) {
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
    }

    fn function(&mut self, func: &mut Function) {
        let mut lead: Vec<Stmt> = Vec::new();
        for param in &mut func.params {
            let Some(default) = param.default.take() else {
                continue;
            };
            lead.push(self.lower_param(param, default));
        }

        if !lead.is_empty() {
            // An expression body grows a block so the declarations have
            // somewhere to live.
            if matches!(func.body, FuncBody::Expr(_)) {
                let placeholder = FuncBody::Block(Block {
                    id: self.next_id(),
                    stmts: Vec::new(),
                    span: func.span,
                });
                let FuncBody::Expr(expr) = std::mem::replace(&mut func.body, placeholder) else {
                    unreachable!()
                };
                let span = expr.span;
                lead.push(Stmt::Return(ReturnStmt {
                    id: self.next_id(),
                    value: Some(*expr),
                    span,
                }));
            }
            let FuncBody::Block(block) = &mut func.body else {
                unreachable!()
            };
            block.stmts.splice(0..0, lead);
        }

        // Nested functions, including arrows that were default values and now
        // live inside the synthesized declarations.
        match &mut func.body {
            FuncBody::Block(block) => self.block(block),
            FuncBody::Expr(expr) => self.expr(expr),
        }
    }

    /// Rewrite one defaulted parameter and return its leading declaration.
    fn lower_param(&mut self, param: &mut Param, default: Expr) -> Stmt {
        let k = self.next_gensym;
        self.next_gensym += 1;
        let gensym = self.interner.intern(&format!("{GENSYM_PREFIX}{k}"));

        let original_name = param.name;
        let declared_ty = param.ty.clone();
        let span = param.span;

        param.name = gensym;
        if let Some(ty) = param.ty.take() {
            let ty_span = ty.span;
            let undefined = TypeExpr {
                id: self.next_id(),
                kind: TypeKind::Undefined,
                span: ty_span,
            };
            param.ty = Some(TypeExpr {
                id: self.next_id(),
                kind: TypeKind::Union(vec![ty, undefined]),
                span: ty_span,
            });
        }

        let test = Expr {
            id: self.next_id(),
            kind: ExprKind::Binary(Box::new(BinaryExpr {
                op: BinaryOp::StrictNe,
                left: self.ident(gensym, span),
                right: Expr {
                    id: self.next_id(),
                    kind: ExprKind::Undefined,
                    span,
                },
            })),
            span,
        };
        let consequent = self.ident(gensym, span);
        let init = Expr {
            id: self.next_id(),
            kind: ExprKind::Conditional(Box::new(ConditionalExpr {
                test,
                consequent,
                alternate: default,
            })),
            span,
        };
        Stmt::Variable(VariableDecl {
            id: self.next_id(),
            annotations: Vec::new(),
            kind: VarKind::Const,
            declarators: vec![VarDeclarator {
                id: self.next_id(),
                name: original_name,
                ty: declared_ty,
                init: Some(init),
                span,
            }],
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn desugared(source: &str) -> (Program, Interner) {
        let mut parser = Parser::new(source);
        let mut program = parser.parse_program().unwrap();
        let mut interner = parser.into_interner();
        desugar_program(&mut program, &mut interner);
        (program, interner)
    }

    fn first_function(program: &Program) -> &Function {
        let Stmt::Function(func) = &program.statements[0] else {
            panic!("expected function");
        };
        func
    }

    #[test]
    fn defaulted_param_becomes_gensym_with_leading_const() {
        let (program, interner) = desugared("function f(x: number = 1): void { g(x) }");
        let func = first_function(&program);

        let param = &func.params[0];
        assert!(is_gensym_name(interner.resolve(param.name)));
        assert!(param.default.is_none());
        assert!(matches!(
            param.ty.as_ref().unwrap().kind,
            TypeKind::Union(_)
        ));

        let FuncBody::Block(block) = &func.body else {
            panic!("expected block body");
        };
        let Stmt::Variable(decl) = &block.stmts[0] else {
            panic!("expected synthesized declaration first");
        };
        assert_eq!(decl.kind, VarKind::Const);
        let declarator = &decl.declarators[0];
        assert_eq!(interner.resolve(declarator.name), "x");
        let ExprKind::Conditional(cond) = &declarator.init.as_ref().unwrap().kind else {
            panic!("expected conditional initializer");
        };
        assert!(matches!(
            &cond.test.kind,
            ExprKind::Binary(b) if b.op == BinaryOp::StrictNe
        ));
    }

    #[test]
    fn gensym_numbering_is_unique_across_functions() {
        let (program, interner) =
            desugared("function f(a: number = 1): void {}\nfunction g(b: number = 2): void {}");
        let Stmt::Function(f) = &program.statements[0] else {
            panic!();
        };
        let Stmt::Function(g) = &program.statements[1] else {
            panic!();
        };
        assert_eq!(interner.resolve(f.params[0].name), "gensym$_1");
        assert_eq!(interner.resolve(g.params[0].name), "gensym$_2");
    }

    #[test]
    fn arrow_expression_body_grows_a_block() {
        let (program, _) = desugared("const f = (x: number = 1) => x + x");
        let Stmt::Variable(decl) = &program.statements[0] else {
            panic!("expected variable declaration");
        };
        let ExprKind::Arrow(arrow) = &decl.declarators[0].init.as_ref().unwrap().kind else {
            panic!("expected arrow");
        };
        let FuncBody::Block(block) = &arrow.body else {
            panic!("expected block body after lowering");
        };
        assert_eq!(block.stmts.len(), 2);
        assert!(matches!(&block.stmts[1], Stmt::Return(r) if r.value.is_some()));
    }

    #[test]
    fn untouched_params_keep_their_names() {
        let (program, interner) = desugared("function f(a: number, b: number = 2): void {}");
        let func = first_function(&program);
        assert_eq!(interner.resolve(func.params[0].name), "a");
        assert!(is_gensym_name(interner.resolve(func.params[1].name)));
    }
}
