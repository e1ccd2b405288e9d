//! Syntax tree definitions.
//!
//! Every expression, identifier and type expression carries a unique id.
//! The checker keys its results (types, uses, definitions, inferred type
//! arguments) by these ids, and a rewritten node always gets a fresh id so
//! its annotations never clash with the node it was copied from.

use std::cell::Cell;
use std::rc::Rc;

use gomono_common::span::Span;
use gomono_common::symbol::Symbol;

/// Shared pointer to a child node.
pub type P<T> = Rc<T>;

macro_rules! define_node_id {
    ($($(#[$attr:meta])* $name:ident;)*) => {
        $(
            $(#[$attr])*
            #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
            pub struct $name(pub u32);
        )*
    };
}

define_node_id! {
    /// Identifies an [`Expr`].
    ExprId;
    /// Identifies an [`Ident`] occurrence.
    IdentId;
    /// Identifies a [`TypeExpr`].
    TypeExprId;
}

/// Hands out node ids. One generator is shared by everything that creates
/// nodes for the same session.
#[derive(Debug, Default)]
pub struct NodeIdGen {
    next_expr: Cell<u32>,
    next_ident: Cell<u32>,
    next_type_expr: Cell<u32>,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expr(&self) -> ExprId {
        ExprId(bump(&self.next_expr))
    }

    pub fn ident(&self) -> IdentId {
        IdentId(bump(&self.next_ident))
    }

    pub fn type_expr(&self) -> TypeExprId {
        TypeExprId(bump(&self.next_type_expr))
    }
}

fn bump(counter: &Cell<u32>) -> u32 {
    let id = counter.get();
    counter.set(id + 1);
    id
}

/// An identifier occurrence.
#[derive(Clone, Copy, Debug)]
pub struct Ident {
    pub id: IdentId,
    pub symbol: Symbol,
    pub span: Span,
}

/// A source file.
#[derive(Clone, Debug)]
pub struct File {
    pub package: Ident,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// A top-level declaration.
#[derive(Clone, Debug)]
pub enum Decl {
    Var(P<VarDecl>),
    Type(P<TypeDecl>),
    Func(P<FuncDecl>),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Var(d) => d.span,
            Decl::Type(d) => d.span,
            Decl::Func(d) => d.span,
        }
    }

    /// True for declarations with a type parameter list. Methods count as
    /// generic when their receiver names type parameters.
    pub fn is_generic(&self) -> bool {
        match self {
            Decl::Var(_) => false,
            Decl::Type(d) => !d.tparams.is_empty(),
            Decl::Func(d) => !d.tparams.is_empty() || d.recv.as_ref().is_some_and(|r| r.is_generic()),
        }
    }
}

/// `var a, b T = x, y`
#[derive(Clone, Debug)]
pub struct VarDecl {
    pub names: Vec<Ident>,
    pub ty: Option<P<TypeExpr>>,
    pub values: Vec<P<Expr>>,
    pub span: Span,
}

/// One group of a type parameter list: `K, V comparable`.
#[derive(Clone, Debug)]
pub struct TypeParamField {
    pub names: Vec<Ident>,
    pub constraint: P<TypeExpr>,
    pub span: Span,
}

/// `type Name[tparams] ty`
#[derive(Clone, Debug)]
pub struct TypeDecl {
    pub name: Ident,
    pub tparams: Vec<TypeParamField>,
    pub ty: P<TypeExpr>,
    pub span: Span,
}

/// Method receiver. The type is `T`, `*T`, `T[A, B]` or `*T[A, B]`; in
/// the last two forms the bracketed identifiers declare the receiver's
/// type parameters.
#[derive(Clone, Debug)]
pub struct Receiver {
    pub name: Option<Ident>,
    pub ty: P<TypeExpr>,
    pub span: Span,
}

impl Receiver {
    /// Splits the receiver type into (pointer, base name, type parameter names).
    pub fn unpack(&self) -> Option<(bool, Ident, Vec<Ident>)> {
        let (ptr, ty) = match &self.ty.kind {
            TypeExprKind::Pointer(inner) => (true, inner),
            _ => (false, &self.ty),
        };
        match &ty.kind {
            TypeExprKind::Ident(name) => Some((ptr, *name, Vec::new())),
            TypeExprKind::Instance { base, args } => {
                let params = args
                    .iter()
                    .map(|arg| match &arg.kind {
                        TypeExprKind::Ident(id) => Some(*id),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some((ptr, *base, params))
            }
            _ => None,
        }
    }

    pub fn is_generic(&self) -> bool {
        self.unpack().is_some_and(|(_, _, params)| !params.is_empty())
    }
}

/// `func (recv) name[tparams](params) results { body }`
#[derive(Clone, Debug)]
pub struct FuncDecl {
    pub recv: Option<Receiver>,
    pub name: Ident,
    pub tparams: Vec<TypeParamField>,
    pub sig: P<FuncSig>,
    pub body: Option<P<Block>>,
    pub span: Span,
}

/// A parameter group: `a, b int`. Unnamed parameters have no names.
#[derive(Clone, Debug)]
pub struct Param {
    pub names: Vec<Ident>,
    pub ty: P<TypeExpr>,
    pub span: Span,
}

/// Function signature. When `variadic` is set the last parameter's type is
/// the element type of the variadic slice.
#[derive(Clone, Debug)]
pub struct FuncSig {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub variadic: bool,
    pub span: Span,
}

// ============================================================================
// Type expressions
// ============================================================================

#[derive(Clone, Debug)]
pub struct TypeExpr {
    pub id: TypeExprId,
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Clone, Debug)]
pub enum TypeExprKind {
    Ident(Ident),
    /// Application of a generic type: `List[int]`.
    Instance { base: Ident, args: Vec<P<TypeExpr>> },
    Array { len: P<Expr>, elem: P<TypeExpr> },
    Slice(P<TypeExpr>),
    Map { key: P<TypeExpr>, value: P<TypeExpr> },
    Chan { dir: ChanDir, elem: P<TypeExpr> },
    Func(P<FuncSig>),
    Struct(Vec<Field>),
    Pointer(P<TypeExpr>),
    Interface(Vec<InterfaceElem>),
}

/// A struct field group. An embedded field has no names.
#[derive(Clone, Debug)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: P<TypeExpr>,
    pub tag: Option<String>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum InterfaceElem {
    Method { name: Ident, sig: P<FuncSig>, span: Span },
    Embedded(P<TypeExpr>),
    /// `type int, string`: restricts the permitted type arguments.
    TypeList(Vec<P<TypeExpr>>),
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Clone, Debug)]
pub struct Block {
    pub stmts: Vec<P<Stmt>>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    Empty,
    Block(P<Block>),
    Var(P<VarDecl>),
    ShortVar { names: Vec<Ident>, values: Vec<P<Expr>> },
    Expr(P<Expr>),
    /// `lhs = rhs`, or `lhs op= rhs` when `op` is set.
    Assign { lhs: Vec<P<Expr>>, op: Option<BinaryOp>, rhs: Vec<P<Expr>> },
    IncDec { expr: P<Expr>, inc: bool },
    Return(Vec<P<Expr>>),
    If { init: Option<P<Stmt>>, cond: P<Expr>, then: P<Block>, els: Option<P<Stmt>> },
    For { init: Option<P<Stmt>>, cond: Option<P<Expr>>, post: Option<P<Stmt>>, body: P<Block> },
    /// `for key, value := range expr`
    Range { key: Option<Ident>, value: Option<Ident>, expr: P<Expr>, body: P<Block> },
    Go(P<Expr>),
    Defer(P<Expr>),
    Break,
    Continue,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Clone, Debug)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LitKind {
    Int,
    Float,
    Rune,
    String,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Ident(Ident),
    BasicLit { kind: LitKind, value: String },
    Binary { op: BinaryOp, left: P<Expr>, right: P<Expr> },
    Unary { op: UnaryOp, expr: P<Expr> },
    Call(CallExpr),
    /// Indexing, or explicit instantiation `f[int, string]`.
    Index { expr: P<Expr>, indices: Vec<P<Expr>> },
    Slice { expr: P<Expr>, low: Option<P<Expr>>, high: Option<P<Expr>> },
    Selector { expr: P<Expr>, sel: Ident },
    TypeAssert { expr: P<Expr>, ty: P<TypeExpr> },
    CompositeLit(CompositeLit),
    FuncLit { sig: P<FuncSig>, body: P<Block> },
    Paren(P<Expr>),
    /// A type used in expression position, e.g. the callee of a conversion.
    TypeAsExpr(P<TypeExpr>),
}

#[derive(Clone, Debug)]
pub struct CallExpr {
    pub func: P<Expr>,
    pub args: Vec<P<Expr>>,
    /// `f(xs...)`
    pub spread: bool,
}

#[derive(Clone, Debug)]
pub struct CompositeLit {
    pub ty: P<TypeExpr>,
    pub elems: Vec<KeyedElement>,
}

#[derive(Clone, Debug)]
pub struct KeyedElement {
    pub key: Option<P<Expr>>,
    pub value: P<Expr>,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    AndNot,
    Shl,
    Shr,
    LogAnd,
    LogOr,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq
        )
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::AndNot => "&^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::LogAnd => "&&",
            BinaryOp::LogOr => "||",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
    BitNot,
    Addr,
    Deref,
}
