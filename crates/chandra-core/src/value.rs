//! The Lua value representation shared by the compiler output and the
//! executor. Tables, closures, and native functions are reference values;
//! cloning a `Value` clones the handle, not the contents.

use crate::capture::CaptureState;
use crate::error::RuntimeError;
use crate::multi::MultiValue;
use crate::runtime::{Environment, Table};
use std::fmt;
use std::rc::Rc;

/// A single Lua value.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Table(Rc<dyn Table>),
    Function(Rc<LuaClosure>),
    Native(Rc<NativeFunction>),
    /// A multi-value result flowing through an expression context. Collapsed
    /// to its first value wherever a single value is required.
    Multi(MultiValue),
}

impl Value {
    /// Create a string value.
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Create a table value from a table implementation.
    pub fn table(t: Rc<dyn Table>) -> Self {
        Value::Table(t)
    }

    /// Create a native function value.
    pub fn native(f: NativeFunction) -> Self {
        Value::Native(Rc::new(f))
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Lua truthiness: everything except nil and false is truthy. A
    /// multi-value tests its first value.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil | Value::Bool(false) => false,
            Value::Multi(m) => m.first().is_truthy(),
            _ => true,
        }
    }

    /// Collapse to a single value: a multi-value yields its first element
    /// (nil when empty), anything else yields itself.
    pub fn first(&self) -> Value {
        match self {
            Value::Multi(m) => m.first(),
            other => other.clone(),
        }
    }

    /// Numeric coercion with failure signal. Numbers pass through; strings
    /// are parsed the way Lua's arithmetic coercion parses them.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// The Lua-facing type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Table(_) => "table",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Multi(_) => "multi",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Table(t) => write!(f, "table({:p})", Rc::as_ptr(t)),
            Value::Function(c) => match &c.name {
                Some(n) => write!(f, "function({n})"),
                None => write!(f, "function({:p})", Rc::as_ptr(c)),
            },
            Value::Native(n) => write!(f, "native({})", n.name),
            Value::Multi(m) => write!(f, "{m:?}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Multi(a), Value::Multi(b)) => a == b,
            _ => false,
        }
    }
}

/// A compiled closure: a function prototype bound to the capture-state
/// instance that was current where the closure was created. The prototype is
/// referenced by index into the owning chunk's proto table.
pub struct LuaClosure {
    /// Index into the chunk's proto table.
    pub proto: usize,
    /// Capture-state instance the closure was bound with, if any.
    pub upcx: Option<Rc<CaptureState>>,
    /// Declared name, for diagnostics.
    pub name: Option<Rc<str>>,
}

/// Arguments for a native (host) call: the argument multi-value (writable,
/// so by-reference outputs land back in it), the overload selector, and the
/// by-reference argument positions.
pub struct CallContext {
    pub args: MultiValue,
    pub selector: Option<u32>,
    pub by_ref: Vec<usize>,
}

impl CallContext {
    /// A plain call: no selector, no by-reference positions.
    pub fn plain(args: MultiValue) -> Self {
        CallContext {
            args,
            selector: None,
            by_ref: Vec::new(),
        }
    }
}

type NativeFn = Box<dyn Fn(&Environment, &CallContext) -> Result<MultiValue, RuntimeError>>;

/// A host function callable from compiled code.
pub struct NativeFunction {
    pub name: Rc<str>,
    func: NativeFn,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<Rc<str>>,
        func: impl Fn(&Environment, &CallContext) -> Result<MultiValue, RuntimeError> + 'static,
    ) -> Self {
        NativeFunction {
            name: name.into(),
            func: Box::new(func),
        }
    }

    pub fn call(&self, env: &Environment, cx: &CallContext) -> Result<MultiValue, RuntimeError> {
        (self.func)(env, cx)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native({})", self.name)
    }
}
