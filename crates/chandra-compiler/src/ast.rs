//! The syntax tree consumed by the compiler.
//!
//! The tree is produced externally: a parser builds the nodes, and a capture
//! analyzer annotates every function body with its [`FuncInfo`] before the
//! tree reaches [`compile`](crate::compiler::compile). Statement nodes carry
//! the source line they start on, for error reporting.

use chandra_core::runtime::{BinOp, UnOp};
use std::rc::Rc;

/// An interned-enough name. Cloning shares the allocation.
pub type Name = Rc<str>;

/// A sequence of statements forming one lexical block.
#[derive(Clone, Debug, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Block { stmts }
    }
}

/// Statement forms.
#[derive(Clone, Debug)]
pub enum Stmt {
    /// `a, t[k] = e1, e2` or `local a, b = e1, e2`.
    Assign(Assign),
    /// A call in statement position; its results are discarded.
    Call(Call),
    /// `do ... end`.
    Do(Block),
    While {
        cond: Expr,
        body: Block,
        line: u32,
    },
    /// Body runs at least once; the loop exits when `cond` becomes true.
    Repeat {
        body: Block,
        cond: Expr,
        line: u32,
    },
    If(If),
    NumericFor(NumericFor),
    GenericFor(GenericFor),
    /// A function declaration statement (named, method, or local).
    Function(FunctionDecl),
    Return {
        values: Vec<Expr>,
        line: u32,
    },
    Break {
        line: u32,
    },
    Label {
        name: Name,
        line: u32,
    },
    Goto {
        name: Name,
        line: u32,
    },
}

/// Multi-target assignment. When `local` is set every target must be a plain
/// name and the statement declares new bindings in the current block.
#[derive(Clone, Debug)]
pub struct Assign {
    pub targets: Vec<Expr>,
    pub values: Vec<Expr>,
    pub local: bool,
    pub line: u32,
}

#[derive(Clone, Debug)]
pub struct If {
    pub cond: Expr,
    pub body: Block,
    pub elseifs: Vec<(Expr, Block)>,
    pub else_body: Option<Block>,
    pub line: u32,
}

#[derive(Clone, Debug)]
pub struct NumericFor {
    pub var: Name,
    pub start: Expr,
    pub limit: Expr,
    /// Defaults to 1 when absent.
    pub step: Option<Expr>,
    pub body: Block,
    pub line: u32,
}

#[derive(Clone, Debug)]
pub struct GenericFor {
    pub names: Vec<Name>,
    pub exprs: Vec<Expr>,
    pub body: Block,
    pub line: u32,
}

/// `function a.b()`, `function a:m()`, or `local function f()`.
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    /// Where the function value is stored: a name or an indexer chain.
    pub target: Expr,
    /// Method name for `function a:m()`; binds an implicit `self` parameter.
    pub method: Option<Name>,
    pub local: bool,
    pub body: FuncBody,
    pub line: u32,
}

/// Expression forms.
#[derive(Clone, Debug)]
pub enum Expr {
    Nil,
    True,
    False,
    Number(f64),
    Str(Name),
    Name(Name),
    /// `...`: the trailing arguments of the enclosing vararg function.
    Vararg,
    Index {
        prefix: Box<Expr>,
        key: Box<Expr>,
        line: u32,
    },
    Bin {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        line: u32,
    },
    Un {
        op: UnOp,
        operand: Box<Expr>,
        line: u32,
    },
    Call(Box<Call>),
    /// An anonymous function expression.
    Function(Box<FuncBody>),
    /// Table constructor; each field is an explicit key/value pair.
    Table {
        fields: Vec<(Expr, Expr)>,
        line: u32,
    },
    /// A parenthesized expression: adjusts a multi-value to one value.
    Paren(Box<Expr>),
}

impl Expr {
    pub fn name(n: impl Into<Name>) -> Expr {
        Expr::Name(n.into())
    }

    pub fn string(s: impl Into<Name>) -> Expr {
        Expr::Str(s.into())
    }

    pub fn index(prefix: Expr, key: Expr) -> Expr {
        Expr::Index {
            prefix: Box::new(prefix),
            key: Box::new(key),
            line: 0,
        }
    }

    pub fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Bin {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            line: 0,
        }
    }

    pub fn un(op: UnOp, operand: Expr) -> Expr {
        Expr::Un {
            op,
            operand: Box::new(operand),
            line: 0,
        }
    }

    pub fn paren(e: Expr) -> Expr {
        Expr::Paren(Box::new(e))
    }

    /// Whether the expression can produce more than one value, i.e. whether
    /// it expands when it appears last in an expression list.
    pub fn is_multi(&self) -> bool {
        matches!(self, Expr::Call(_) | Expr::Vararg)
    }
}

/// One call, in expression or statement position.
#[derive(Clone, Debug)]
pub struct Call {
    pub prefix: Expr,
    /// Method name for `prefix:m(...)`; the prefix value becomes the receiver.
    pub method: Option<Name>,
    pub args: Vec<CallArg>,
    /// Host-interop overload selector; `None` means unspecified.
    pub overload: Option<u32>,
    pub line: u32,
}

impl Call {
    pub fn new(prefix: Expr, args: Vec<Expr>) -> Call {
        Call {
            prefix,
            method: None,
            args: args.into_iter().map(CallArg::plain).collect(),
            overload: None,
            line: 0,
        }
    }
}

/// One call argument. A by-ref argument's post-call value is written back to
/// the argument expression, which must then be a name or an indexer.
#[derive(Clone, Debug)]
pub struct CallArg {
    pub value: Expr,
    pub by_ref: bool,
}

impl CallArg {
    pub fn plain(value: Expr) -> CallArg {
        CallArg {
            value,
            by_ref: false,
        }
    }

    pub fn by_ref(value: Expr) -> CallArg {
        CallArg {
            value,
            by_ref: true,
        }
    }
}

/// A function body with its declared parameters and capture metadata. A
/// trailing `...` parameter makes the function vararg.
#[derive(Clone, Debug)]
pub struct FuncBody {
    pub params: Vec<Name>,
    pub body: Block,
    pub info: FuncInfo,
    pub line: u32,
}

/// Capture metadata attached by the external analyzer.
#[derive(Clone, Debug, Default)]
pub struct FuncInfo {
    /// Locals of this function captured by some nested function.
    pub captured: Vec<Name>,
    /// Whether this function contains nested function definitions. Exactly
    /// the functions with nested definitions own a capture record.
    pub has_nested: bool,
    /// Whether this function (or a descendant, through it) reaches captured
    /// variables of an enclosing function, so its capture record needs a
    /// parent back-reference.
    pub captures_parent: bool,
}

impl FuncInfo {
    /// Metadata for a leaf function that captures nothing and owns nothing.
    pub fn leaf() -> Self {
        FuncInfo::default()
    }
}
