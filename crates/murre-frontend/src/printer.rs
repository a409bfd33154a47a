// src/printer.rs
//
// Turns an AST back into source text. Output is re-parseable: operator
// precedence decides where parentheses are required, and parenthesised
// expressions from the source keep their parens.

use crate::ast::*;
use crate::Interner;

const INDENT: &str = "  ";

// Precedence levels for expression printing, loosest binding first.
const PREC_NONE: u8 = 0;
const PREC_ASSIGN: u8 = 1;
const PREC_COND: u8 = 2;
const PREC_OR: u8 = 3;
const PREC_AND: u8 = 4;
const PREC_EQ: u8 = 5;
const PREC_CMP: u8 = 6;
const PREC_ADD: u8 = 7;
const PREC_MUL: u8 = 8;
const PREC_UNARY: u8 = 9;
const PREC_AS: u8 = 10;
const PREC_POSTFIX: u8 = 11;
const PREC_PRIMARY: u8 = 12;

fn binary_prec(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => PREC_OR,
        BinaryOp::And => PREC_AND,
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::StrictEq | BinaryOp::StrictNe => PREC_EQ,
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => PREC_CMP,
        BinaryOp::Add | BinaryOp::Sub => PREC_ADD,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => PREC_MUL,
    }
}

pub fn print_program(program: &Program, interner: &Interner) -> String {
    let mut printer = Printer {
        interner,
        out: String::new(),
        indent: 0,
    };
    for stmt in &program.statements {
        printer.stmt(stmt);
    }
    printer.out
}

struct Printer<'a> {
    interner: &'a Interner,
    out: String,
    indent: usize,
}

impl Printer<'_> {
    fn word(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn name(&mut self, sym: crate::Symbol) {
        let text = self.interner.resolve(sym);
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn stmt(&mut self, stmt: &Stmt) {
        self.newline();
        match stmt {
            Stmt::Import(import) => {
                self.word("import { ");
                for (i, name) in import.names.iter().enumerate() {
                    if i > 0 {
                        self.word(", ");
                    }
                    self.name(*name);
                }
                self.word(" } from ");
                self.string_literal(&import.module);
            }
            Stmt::Variable(decl) => self.variable(decl),
            Stmt::Function(func) => self.function(func),
            Stmt::Class(class) => self.class(class),
            Stmt::TypeAlias(alias) => {
                self.annotations(&alias.annotations);
                self.word("type ");
                self.name(alias.name);
                self.word(" = ");
                self.type_expr(&alias.ty);
            }
            Stmt::Return(ret) => {
                self.word("return");
                if let Some(value) = &ret.value {
                    self.word(" ");
                    self.expr(value, PREC_NONE);
                }
            }
            Stmt::If(stmt) => self.if_stmt(stmt),
            Stmt::While(stmt) => {
                self.word("while (");
                self.expr(&stmt.test, PREC_NONE);
                self.word(") ");
                self.block(&stmt.body);
            }
            Stmt::Throw(stmt) => {
                self.word("throw ");
                self.expr(&stmt.value, PREC_NONE);
            }
            Stmt::Expr(stmt) => self.expr(&stmt.expr, PREC_NONE),
            Stmt::Block(block) => self.block(block),
        }
    }

    fn variable(&mut self, decl: &VariableDecl) {
        self.annotations(&decl.annotations);
        self.word(match decl.kind {
            VarKind::Const => "const ",
            VarKind::Let => "let ",
        });
        for (i, declarator) in decl.declarators.iter().enumerate() {
            if i > 0 {
                self.word(", ");
            }
            self.name(declarator.name);
            if let Some(ty) = &declarator.ty {
                self.word(": ");
                self.type_expr(ty);
            }
            if let Some(init) = &declarator.init {
                self.word(" = ");
                self.expr(init, PREC_ASSIGN);
            }
        }
    }

    fn if_stmt(&mut self, stmt: &IfStmt) {
        self.word("if (");
        self.expr(&stmt.test, PREC_NONE);
        self.word(") ");
        self.block(&stmt.consequent);
        if let Some(alternate) = &stmt.alternate {
            self.word(" else ");
            // Re-sugar `else { if ... }` to `else if ...`.
            if let [Stmt::If(nested)] = alternate.stmts.as_slice() {
                self.if_stmt(nested);
            } else {
                self.block(alternate);
            }
        }
    }

    fn class(&mut self, class: &ClassDecl) {
        self.annotations(&class.annotations);
        self.word("class ");
        self.name(class.name);
        self.word(" {");
        self.indent += 1;
        for member in &class.members {
            self.newline();
            match member {
                ClassMember::Method(method) => {
                    self.annotations(&method.func.annotations);
                    if method.is_static {
                        self.word("static ");
                    }
                    match method.kind {
                        MethodKind::Get => self.word("get "),
                        MethodKind::Set => self.word("set "),
                        MethodKind::Method => {}
                    }
                    if let Some(name) = method.func.name {
                        self.name(name);
                    }
                    self.signature_and_body(&method.func);
                }
                ClassMember::Property(prop) => {
                    self.annotations(&prop.annotations);
                    self.name(prop.name);
                    if let Some(ty) = &prop.ty {
                        self.word(": ");
                        self.type_expr(ty);
                    }
                    if let Some(init) = &prop.init {
                        self.word(" = ");
                        self.expr(init, PREC_ASSIGN);
                    }
                }
            }
        }
        self.indent -= 1;
        self.newline();
        self.word("}");
    }

    fn function(&mut self, func: &Function) {
        self.annotations(&func.annotations);
        self.word("function ");
        if let Some(name) = func.name {
            self.name(name);
        }
        self.signature_and_body(func);
    }

    fn signature_and_body(&mut self, func: &Function) {
        self.params(&func.params);
        if let Some(ret) = &func.return_type {
            self.word(": ");
            self.type_expr(ret);
        }
        self.word(" ");
        match &func.body {
            FuncBody::Block(block) => self.block(block),
            FuncBody::Expr(expr) => {
                self.word("=> ");
                self.expr(expr, PREC_ASSIGN);
            }
        }
    }

    fn params(&mut self, params: &[Param]) {
        self.word("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.word(", ");
            }
            for annotation in &param.annotations {
                self.word("@");
                self.name(annotation.name);
                self.word(" ");
            }
            if param.is_rest {
                self.word("...");
            }
            self.name(param.name);
            if let Some(ty) = &param.ty {
                self.word(": ");
                self.type_expr(ty);
            }
            if let Some(default) = &param.default {
                self.word(" = ");
                self.expr(default, PREC_ASSIGN);
            }
        }
        self.word(")");
    }

    fn block(&mut self, block: &Block) {
        if block.stmts.is_empty() {
            self.word("{}");
            return;
        }
        self.word("{");
        self.indent += 1;
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.newline();
        self.word("}");
    }

    fn annotations(&mut self, annotations: &[Annotation]) {
        for annotation in annotations {
            self.word("@");
            self.name(annotation.name);
            self.word(" ");
        }
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn expr(&mut self, expr: &Expr, parent: u8) {
        let prec = match &expr.kind {
            ExprKind::Assign(_) => PREC_ASSIGN,
            ExprKind::Arrow(_) => PREC_ASSIGN,
            ExprKind::Conditional(_) => PREC_COND,
            ExprKind::Binary(binary) => binary_prec(binary.op),
            ExprKind::Unary(_) => PREC_UNARY,
            ExprKind::As(_) => PREC_AS,
            ExprKind::Call(_) | ExprKind::Member(_) => PREC_POSTFIX,
            _ => PREC_PRIMARY,
        };
        let parens = prec < parent;
        if parens {
            self.word("(");
        }
        match &expr.kind {
            ExprKind::Identifier(name) => self.name(*name),
            ExprKind::This => self.word("this"),
            ExprKind::Undefined => self.word("undefined"),
            ExprKind::NumberLiteral(value) => self.number(*value),
            ExprKind::StringLiteral(value) => {
                let escaped = escape_string(value);
                self.word("\"");
                self.word(&escaped);
                self.word("\"");
            }
            ExprKind::BoolLiteral(value) => self.word(if *value { "true" } else { "false" }),
            ExprKind::Arrow(func) => {
                self.annotations(&func.annotations);
                self.params(&func.params);
                if let Some(ret) = &func.return_type {
                    self.word(": ");
                    self.type_expr(ret);
                }
                self.word(" => ");
                match &func.body {
                    FuncBody::Block(block) => self.block(block),
                    FuncBody::Expr(body) => self.expr(body, PREC_ASSIGN),
                }
            }
            ExprKind::Call(call) => {
                self.expr(&call.callee, PREC_POSTFIX);
                if !call.type_args.is_empty() {
                    self.word("<");
                    for (i, arg) in call.type_args.iter().enumerate() {
                        if i > 0 {
                            self.word(", ");
                        }
                        self.type_expr(arg);
                    }
                    self.word(">");
                }
                self.word("(");
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        self.word(", ");
                    }
                    self.expr(arg, PREC_ASSIGN);
                }
                self.word(")");
            }
            ExprKind::Member(member) => {
                self.expr(&member.object, PREC_POSTFIX);
                self.word(".");
                self.name(member.property);
            }
            ExprKind::Conditional(cond) => {
                self.expr(&cond.test, PREC_OR);
                self.word(" ? ");
                self.expr(&cond.consequent, PREC_COND);
                self.word(" : ");
                self.expr(&cond.alternate, PREC_COND);
            }
            ExprKind::Binary(binary) => {
                let prec = binary_prec(binary.op);
                self.expr(&binary.left, prec);
                self.word(" ");
                self.word(binary.op.as_str());
                self.word(" ");
                self.expr(&binary.right, prec + 1);
            }
            ExprKind::Unary(unary) => {
                self.word(unary.op.as_str());
                self.expr(&unary.operand, PREC_UNARY);
            }
            ExprKind::Assign(assign) => {
                self.expr(&assign.target, PREC_POSTFIX);
                self.word(" = ");
                self.expr(&assign.value, PREC_ASSIGN);
            }
            ExprKind::ObjectLiteral(object) => {
                if object.fields.is_empty() {
                    self.word("{}");
                } else {
                    self.word("{ ");
                    for (i, field) in object.fields.iter().enumerate() {
                        if i > 0 {
                            self.word(", ");
                        }
                        self.name(field.name);
                        self.word(": ");
                        self.expr(&field.value, PREC_ASSIGN);
                    }
                    self.word(" }");
                }
            }
            ExprKind::ArrayLiteral(elements) => {
                self.word("[");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.word(", ");
                    }
                    self.expr(element, PREC_ASSIGN);
                }
                self.word("]");
            }
            ExprKind::As(cast) => {
                self.expr(&cast.expr, PREC_AS);
                self.word(" as ");
                self.type_expr(&cast.ty);
            }
            ExprKind::Paren(inner) => {
                self.word("(");
                self.expr(inner, PREC_NONE);
                self.word(")");
            }
        }
        if parens {
            self.word(")");
        }
    }

    fn number(&mut self, value: f64) {
        if value.fract() == 0.0 && value.abs() < 1e15 {
            self.word(&format!("{}", value as i64));
        } else {
            self.word(&format!("{value}"));
        }
    }

    fn string_literal(&mut self, value: &str) {
        let escaped = escape_string(value);
        self.word("\"");
        self.word(&escaped);
        self.word("\"");
    }

    // -----------------------------------------------------------------------
    // Types
    // -----------------------------------------------------------------------

    fn type_expr(&mut self, ty: &TypeExpr) {
        match &ty.kind {
            TypeKind::Named { name, type_args } => {
                self.name(*name);
                if !type_args.is_empty() {
                    self.word("<");
                    for (i, arg) in type_args.iter().enumerate() {
                        if i > 0 {
                            self.word(", ");
                        }
                        self.type_expr(arg);
                    }
                    self.word(">");
                }
            }
            TypeKind::Function(ft) => self.function_type(ft),
            TypeKind::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        self.word(" | ");
                    }
                    // A function type inside a union needs parens to parse.
                    if matches!(member.kind, TypeKind::Function(_)) {
                        self.word("(");
                        self.type_expr(member);
                        self.word(")");
                    } else {
                        self.type_expr(member);
                    }
                }
            }
            TypeKind::This => self.word("this"),
            TypeKind::Void => self.word("void"),
            TypeKind::Undefined => self.word("undefined"),
        }
    }

    fn function_type(&mut self, ft: &FunctionType) {
        self.annotations(&ft.annotations);
        self.params(&ft.params);
        self.word(" => ");
        self.type_expr(&ft.return_type);
    }
}

fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn round_trip(source: &str) -> String {
        let mut parser = Parser::new(source);
        let program = parser.parse_program().unwrap();
        print_program(&program, parser.interner())
    }

    #[test]
    fn prints_annotated_function() {
        let out = round_trip("@memo function f(x: number): void { g(x) }");
        assert_eq!(out, "\n@memo function f(x: number): void {\n  g(x)\n}");
    }

    #[test]
    fn printed_output_reparses_to_same_shape() {
        let source = "@memo function chip(label: string, @memo_skip width: number): void {\n  draw(label, width)\n}";
        let printed = round_trip(source);
        let reparsed = round_trip(&printed);
        assert_eq!(printed, reparsed);
    }

    #[test]
    fn synthesized_binary_keeps_needed_parens() {
        let out = round_trip("const x = (a + b) * c");
        assert!(out.contains("(a + b) * c"));
    }

    #[test]
    fn union_with_function_type_is_parenthesised() {
        let out = round_trip("type T = ((s: string) => void) | undefined");
        assert!(out.contains("((s: string) => void) | undefined"));
    }

    #[test]
    fn else_if_chain_resugars() {
        let out = round_trip("function f(a: boolean): void { if (a) { g() } else if (a) { h() } else { k() } }");
        assert!(out.contains("} else if (a) {"));
    }
}
