//! Service contracts between compiled code and the hosting runtime.
//!
//! The compiler never implements arithmetic, table access, or iteration
//! itself; emitted code calls into these traits. A host embeds compiled
//! chunks by supplying a `LuaRuntime` implementation and a globals table.

use crate::error::RuntimeError;
use crate::multi::MultiValue;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

/// Binary operator kinds dispatched to the runtime. `And`/`Or` never reach
/// the runtime: the compiler lowers them to short-circuit jumps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Unary operator kinds dispatched to the runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    Len,
}

/// A table as compiled code sees it: keyed storage behind a narrow get/set
/// surface. Metatable behavior, if any, lives entirely in the implementation.
pub trait Table: fmt::Debug {
    fn get(&self, key: &Value) -> Value;
    fn set(&self, key: Value, value: Value) -> Result<(), RuntimeError>;
}

/// The iterator resource driving one generic-for loop. `dispose` is invoked
/// exactly once when the loop is left, on every exit path.
pub trait LoopResource {
    fn iterator(&self) -> Value;
    fn state(&self) -> Value;
    fn control(&self) -> Value;
    fn set_control(&mut self, value: Value);
    fn dispose(&mut self);
}

/// Vanilla `(iterator, state, control)` resource with an optional dispose
/// hook.
pub struct LoopTriple {
    iterator: Value,
    state: Value,
    control: Value,
    on_dispose: Option<Box<dyn FnMut()>>,
}

impl LoopTriple {
    pub fn new(iterator: Value, state: Value, control: Value) -> Self {
        LoopTriple {
            iterator,
            state,
            control,
            on_dispose: None,
        }
    }

    pub fn with_dispose(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_dispose = Some(Box::new(hook));
        self
    }
}

impl LoopResource for LoopTriple {
    fn iterator(&self) -> Value {
        self.iterator.clone()
    }

    fn state(&self) -> Value {
        self.state.clone()
    }

    fn control(&self) -> Value {
        self.control.clone()
    }

    fn set_control(&mut self, value: Value) {
        self.control = value;
    }

    fn dispose(&mut self) {
        if let Some(hook) = self.on_dispose.as_mut() {
            hook();
        }
    }
}

/// The runtime services compiled code depends on.
pub trait LuaRuntime {
    /// Resolve and apply a binary operator.
    fn binary_op(&self, op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError>;

    /// Resolve and apply a unary operator.
    fn unary_op(&self, op: UnOp, operand: &Value) -> Result<Value, RuntimeError>;

    /// Create a fresh, empty table value.
    fn new_table(&self) -> Value;

    /// `container[key]` read.
    fn get_index(&self, container: &Value, key: &Value) -> Result<Value, RuntimeError>;

    /// `container[key] = value` write.
    fn set_index(&self, container: &Value, key: Value, value: Value) -> Result<(), RuntimeError>;

    /// Truthiness predicate used by conditionals.
    fn is_truthy(&self, value: &Value) -> bool {
        value.is_truthy()
    }

    /// Numeric coercion with failure signal.
    fn to_number(&self, value: &Value) -> Option<f64> {
        value.as_number()
    }

    /// Begin a generic-for loop over the adjusted control-expression list,
    /// producing the iterator resource that drives it.
    fn begin_generic_loop(
        &self,
        env: &Environment,
        args: MultiValue,
    ) -> Result<Box<dyn LoopResource>, RuntimeError>;
}

/// The environment handle passed to a chunk invocation: the runtime services
/// plus the globals table.
pub struct Environment {
    pub runtime: Rc<dyn LuaRuntime>,
    /// The globals table value. Global reads and writes index into it by
    /// name string.
    pub globals: Value,
}

impl Environment {
    pub fn new(runtime: Rc<dyn LuaRuntime>) -> Self {
        let globals = runtime.new_table();
        Environment { runtime, globals }
    }

    pub fn get_global(&self, name: &str) -> Result<Value, RuntimeError> {
        self.runtime.get_index(&self.globals, &Value::str(name))
    }

    pub fn set_global(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        self.runtime
            .set_index(&self.globals, Value::str(name), value)
    }
}
