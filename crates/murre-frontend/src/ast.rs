// src/ast.rs

use crate::{Span, Symbol};

/// Unique identifier for AST nodes (expressions, statements, declarations).
///
/// Assigned sequentially by the parser. Transform passes that synthesize new
/// nodes continue the sequence from `Program::next_node_id`, so an id never
/// refers to two nodes within one compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a NodeId from a raw index. Only the parser and transforms should use this.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Return the underlying index.
    pub fn index(self) -> u32 {
        self.0
    }

    /// Create a NodeId with an arbitrary index in test code.
    #[cfg(any(test, feature = "testing"))]
    pub fn new_for_test(index: u32) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A complete compilation unit
#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
    /// The next available node ID (one past the highest ID used).
    /// Used by transforms that need to create new AST nodes.
    pub next_node_id: u32,
}

/// A single `@name` annotation.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub id: NodeId,
    pub name: Symbol,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// A function-like node: named declaration, class method, accessor, or arrow.
///
/// All four share one shape so the rewrite passes treat them uniformly; the
/// `is_arrow` flag and `name` distinguish the syntactic forms.
#[derive(Debug, Clone)]
pub struct Function {
    pub id: NodeId,
    pub annotations: Vec<Annotation>,
    /// None for anonymous arrow functions.
    pub name: Option<Symbol>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: FuncBody,
    pub is_arrow: bool,
    pub span: Span,
}

impl Function {
    /// True when the first declared parameter is a receiver (`this: T`).
    pub fn has_receiver(&self) -> bool {
        self.params.first().is_some_and(|p| p.is_receiver)
    }
}

/// Function body - either a block or a single expression (arrows only)
#[derive(Debug, Clone)]
pub enum FuncBody {
    /// Block body: `{ statements }`
    Block(Block),
    /// Expression body: `=> expr`
    Expr(Box<Expr>),
}

/// A declared parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub id: NodeId,
    pub annotations: Vec<Annotation>,
    pub name: Symbol,
    pub ty: Option<TypeExpr>,
    pub default: Option<Expr>,
    /// Rest parameter: `...args`
    pub is_rest: bool,
    /// Receiver parameter: literally named `this`.
    pub is_receiver: bool,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Stmt {
    Import(ImportDecl),
    Variable(VariableDecl),
    Function(Box<Function>),
    Class(ClassDecl),
    TypeAlias(TypeAliasDecl),
    Return(ReturnStmt),
    If(IfStmt),
    While(WhileStmt),
    Throw(ThrowStmt),
    Expr(ExprStmt),
    Block(Block),
}

impl Stmt {
    pub fn id(&self) -> NodeId {
        match self {
            Stmt::Import(s) => s.id,
            Stmt::Variable(s) => s.id,
            Stmt::Function(f) => f.id,
            Stmt::Class(s) => s.id,
            Stmt::TypeAlias(s) => s.id,
            Stmt::Return(s) => s.id,
            Stmt::If(s) => s.id,
            Stmt::While(s) => s.id,
            Stmt::Throw(s) => s.id,
            Stmt::Expr(s) => s.id,
            Stmt::Block(b) => b.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Stmt::Import(s) => s.span,
            Stmt::Variable(s) => s.span,
            Stmt::Function(f) => f.span,
            Stmt::Class(s) => s.span,
            Stmt::TypeAlias(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::Throw(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::Block(b) => b.span,
        }
    }
}

/// `import { a, b } from "module"`
#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub id: NodeId,
    pub names: Vec<Symbol>,
    pub module: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Const,
    Let,
}

/// `const a = 1, b = 2` - one declaration, one or more declarators.
#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub id: NodeId,
    pub annotations: Vec<Annotation>,
    pub kind: VarKind,
    pub declarators: Vec<VarDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VarDeclarator {
    pub id: NodeId,
    pub name: Symbol,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub id: NodeId,
    pub annotations: Vec<Annotation>,
    pub name: Symbol,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ClassMember {
    Method(MethodDef),
    Property(PropertyDef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Get,
    Set,
}

impl MethodKind {
    /// Property accessors propagate memo classification without registering.
    pub fn is_accessor(self) -> bool {
        matches!(self, MethodKind::Get | MethodKind::Set)
    }
}

#[derive(Debug, Clone)]
pub struct MethodDef {
    pub id: NodeId,
    pub kind: MethodKind,
    pub is_static: bool,
    /// Annotations and the method name live on the function itself.
    pub func: Function,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub id: NodeId,
    pub annotations: Vec<Annotation>,
    pub name: Symbol,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub span: Span,
}

/// `type Name = TypeExpr`
#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub id: NodeId,
    pub annotations: Vec<Annotation>,
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub id: NodeId,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub id: NodeId,
    pub test: Expr,
    pub consequent: Block,
    /// `else` branch; `else if` parses as a block wrapping the nested if.
    pub alternate: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub id: NodeId,
    pub test: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ThrowStmt {
    pub id: NodeId,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub id: NodeId,
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub id: NodeId,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Identifier(Symbol),
    This,
    Undefined,
    NumberLiteral(f64),
    StringLiteral(String),
    BoolLiteral(bool),
    Arrow(Box<Function>),
    Call(Box<CallExpr>),
    Member(Box<MemberExpr>),
    Conditional(Box<ConditionalExpr>),
    Binary(Box<BinaryExpr>),
    Unary(Box<UnaryExpr>),
    Assign(Box<AssignExpr>),
    ObjectLiteral(ObjectLiteral),
    ArrayLiteral(Vec<Expr>),
    As(Box<AsExpr>),
    Paren(Box<Expr>),
}

impl Expr {
    /// True for a bare `this` expression (not a member access on this).
    pub fn is_this(&self) -> bool {
        matches!(self.kind, ExprKind::This)
    }
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Expr,
    pub type_args: Vec<TypeExpr>,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct MemberExpr {
    pub object: Expr,
    pub property: Symbol,
    pub property_span: Span,
}

#[derive(Debug, Clone)]
pub struct ConditionalExpr {
    pub test: Expr,
    pub consequent: Expr,
    pub alternate: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNe => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Expr,
    pub right: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Expr,
}

/// `target = value` where the target is an identifier or member access.
#[derive(Debug, Clone)]
pub struct AssignExpr {
    pub target: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct ObjectLiteral {
    pub fields: Vec<ObjectField>,
}

#[derive(Debug, Clone)]
pub struct ObjectField {
    pub id: NodeId,
    pub name: Symbol,
    pub value: Expr,
    pub span: Span,
}

/// `expr as Type`
#[derive(Debug, Clone)]
pub struct AsExpr {
    pub expr: Expr,
    pub ty: TypeExpr,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub id: NodeId,
    pub kind: TypeKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    /// `Foo` or `Array<T>`
    Named {
        name: Symbol,
        type_args: Vec<TypeExpr>,
    },
    /// `(a: T) => R`, optionally annotated: `@memo () => void`
    Function(Box<FunctionType>),
    /// `A | B`
    Union(Vec<TypeExpr>),
    /// `this` in return position
    This,
    Void,
    Undefined,
}

impl TypeExpr {
    pub fn is_this(&self) -> bool {
        matches!(self.kind, TypeKind::This)
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeKind::Void)
    }

    /// The function type directly at this type, or behind one union level.
    /// Used to decide whether a parameter accepts a memo-wrappable callback.
    pub fn function_type(&self) -> Option<&FunctionType> {
        match &self.kind {
            TypeKind::Function(ft) => Some(ft),
            TypeKind::Union(members) => members.iter().find_map(|t| match &t.kind {
                TypeKind::Function(ft) => Some(&**ft),
                _ => None,
            }),
            _ => None,
        }
    }
}

/// A function-shaped type annotation. Carries its own annotation list so a
/// parameter typed `@memo () => void` classifies independently.
#[derive(Debug, Clone)]
pub struct FunctionType {
    pub id: NodeId,
    pub annotations: Vec<Annotation>,
    pub params: Vec<Param>,
    pub return_type: TypeExpr,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId::new(42).to_string(), "node#42");
    }

    #[test]
    fn function_type_found_behind_union() {
        let fn_ty = TypeExpr {
            id: NodeId::new_for_test(1),
            kind: TypeKind::Function(Box::new(FunctionType {
                id: NodeId::new_for_test(2),
                annotations: vec![],
                params: vec![],
                return_type: TypeExpr {
                    id: NodeId::new_for_test(3),
                    kind: TypeKind::Void,
                    span: Span::default(),
                },
                span: Span::default(),
            })),
            span: Span::default(),
        };
        let undef = TypeExpr {
            id: NodeId::new_for_test(4),
            kind: TypeKind::Undefined,
            span: Span::default(),
        };
        let union = TypeExpr {
            id: NodeId::new_for_test(5),
            kind: TypeKind::Union(vec![undef, fn_ty]),
            span: Span::default(),
        };
        assert!(union.function_type().is_some());
    }
}
