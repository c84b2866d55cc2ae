//! Expression nodes.

use crate::error::SourceLocation;

use super::pattern::Pattern;
use super::ty::TypeExpr;

/// Binary operators, lowest-level opcode form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

/// A formal parameter: a name and an optional type annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
}

/// One arm of a `match`: `pattern [if guard] => body`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
}

/// A piece of an interpolated string: literal text or an embedded
/// expression rendered at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpolatedPart {
    Text(String),
    Expr(Expr),
}

/// Every expression form in the language.
///
/// Everything is an expression: `let` and `fn` bind in the enclosing block
/// scope and evaluate to the bound value, loops evaluate to their final
/// body value, blocks evaluate to their last expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64, SourceLocation),
    Float(f64, SourceLocation),
    Str(String, SourceLocation),
    InterpolatedStr(Vec<InterpolatedPart>, SourceLocation),
    Bool(bool, SourceLocation),
    Ident(String, SourceLocation),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },
    Let {
        name: String,
        ty: Option<TypeExpr>,
        value: Box<Expr>,
        is_const: bool,
        location: SourceLocation,
    },
    Assign {
        name: String,
        value: Box<Expr>,
        location: SourceLocation,
    },
    /// A named function definition. The name is bound in the current frame
    /// after the closure is constructed, so recursion resolves through the
    /// environment at call time.
    FnDef {
        name: String,
        params: Vec<Param>,
        return_ty: Option<TypeExpr>,
        body: Box<Expr>,
        location: SourceLocation,
    },
    Lambda {
        params: Vec<Param>,
        body: Box<Expr>,
        location: SourceLocation,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        location: SourceLocation,
    },
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
        location: SourceLocation,
    },
    While {
        condition: Box<Expr>,
        body: Box<Expr>,
        location: SourceLocation,
    },
    For {
        var: String,
        iterable: Box<Expr>,
        body: Box<Expr>,
        location: SourceLocation,
    },
    List(Vec<Expr>, SourceLocation),
    Tuple(Vec<Expr>, SourceLocation),
    /// Field order is the source order and is preserved through evaluation.
    Record(Vec<(String, Expr)>, SourceLocation),
    Map(Vec<(Expr, Expr)>, SourceLocation),
    FieldAccess {
        object: Box<Expr>,
        field: String,
        location: SourceLocation,
    },
    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
        location: SourceLocation,
    },
    Block(Vec<Expr>, SourceLocation),
    /// Direct construction of an ADT value: type name, constructor name,
    /// field expressions.
    Constructor {
        type_name: String,
        ctor_name: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
    /// Module-qualified member access.
    ModuleAccess {
        module: String,
        member: String,
        location: SourceLocation,
    },
}

impl Expr {
    /// The location of the node's first significant character.
    pub fn location(&self) -> &SourceLocation {
        match self {
            Expr::Int(_, loc)
            | Expr::Float(_, loc)
            | Expr::Str(_, loc)
            | Expr::InterpolatedStr(_, loc)
            | Expr::Bool(_, loc)
            | Expr::Ident(_, loc)
            | Expr::List(_, loc)
            | Expr::Tuple(_, loc)
            | Expr::Record(_, loc)
            | Expr::Map(_, loc)
            | Expr::Block(_, loc) => loc,
            Expr::Binary { location, .. }
            | Expr::Unary { location, .. }
            | Expr::Let { location, .. }
            | Expr::Assign { location, .. }
            | Expr::FnDef { location, .. }
            | Expr::Lambda { location, .. }
            | Expr::Call { location, .. }
            | Expr::If { location, .. }
            | Expr::While { location, .. }
            | Expr::For { location, .. }
            | Expr::FieldAccess { location, .. }
            | Expr::Match { location, .. }
            | Expr::Constructor { location, .. }
            | Expr::ModuleAccess { location, .. } => location,
        }
    }
}
