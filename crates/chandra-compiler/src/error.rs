//! Compile-time error types.

use std::fmt;
use std::rc::Rc;

/// What went wrong. Every kind is fatal for the enclosing chunk: compilation
/// is abandoned and no partial chunk is returned.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    /// `local function a:m()` — a local function cannot have a method name.
    LocalInstanceName,
    /// `local function t.k()` — a local function target must be a plain name.
    LocalMethodIndexer,
    /// A `goto` whose label is still unknown after the whole function body.
    UnresolvedGoto(Rc<str>),
    /// The same label defined twice in one function.
    DuplicateLabel(Rc<str>),
    /// `break` outside of any loop.
    BreakOutsideLoop,
    /// A name was found as a plain (non-captured) local across a function
    /// boundary. The upstream capture analyzer guarantees this cannot
    /// happen; seeing it means the capture metadata is inconsistent.
    InconsistentCapture(Rc<str>),
    /// An assignment or by-ref target that is neither a name nor an indexer.
    InvalidAssignTarget,
    /// A `...` parameter that is not last in the parameter list.
    VarargNotLast,
}

/// A fatal compile error with its source line.
#[derive(Clone, Debug, PartialEq)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub line: u32,
}

impl CompileError {
    pub fn new(kind: ErrorKind, line: u32) -> Self {
        CompileError { kind, line }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.line)?;
        match &self.kind {
            ErrorKind::LocalInstanceName => {
                write!(f, "local function cannot have an instance name")
            }
            ErrorKind::LocalMethodIndexer => {
                write!(f, "local function target must be a name")
            }
            ErrorKind::UnresolvedGoto(l) => write!(f, "no visible label '{l}' for goto"),
            ErrorKind::DuplicateLabel(l) => write!(f, "label '{l}' already defined"),
            ErrorKind::BreakOutsideLoop => write!(f, "break outside a loop"),
            ErrorKind::InconsistentCapture(n) => {
                write!(f, "'{n}' crosses a function boundary but is not captured")
            }
            ErrorKind::InvalidAssignTarget => write!(f, "cannot assign to this expression"),
            ErrorKind::VarargNotLast => {
                write!(f, "'...' is only valid as the last parameter")
            }
        }
    }
}

impl std::error::Error for CompileError {}
