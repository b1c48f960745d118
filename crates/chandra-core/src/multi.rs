//! Multi-value results and the expression-list fixup rule.
//!
//! A `MultiValue` carries the zero-or-more values produced by a call or a
//! return statement. The slot array is shared and writable so that a host
//! callee can store by-reference outputs where the calling code will read
//! them back.

use crate::value::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The aggregate of zero or more values returned from a call or built from
/// an expression list.
#[derive(Clone)]
pub struct MultiValue {
    values: Rc<RefCell<Box<[Value]>>>,
}

impl MultiValue {
    /// A multi-value with no elements. Reads yield nil.
    pub fn empty() -> Self {
        MultiValue {
            values: Rc::new(RefCell::new(Box::new([]))),
        }
    }

    /// Build a multi-value from an expression list, applying the fixup rule:
    /// every element but the last collapses to its first value, and a
    /// trailing multi-value expands in place.
    pub fn new(values: Vec<Value>) -> Self {
        let n = values.len();
        let mut out = Vec::with_capacity(n);
        for (i, v) in values.into_iter().enumerate() {
            if i + 1 < n {
                out.push(v.first());
            } else {
                match v {
                    Value::Multi(m) => out.extend(m.to_vec()),
                    other => out.push(other),
                }
            }
        }
        Self::from_values(out)
    }

    /// Wrap already-adjusted values without applying the fixup rule.
    pub fn from_values(values: Vec<Value>) -> Self {
        MultiValue {
            values: Rc::new(RefCell::new(values.into_boxed_slice())),
        }
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    /// The value at `index`, or nil when out of range.
    pub fn get(&self, index: usize) -> Value {
        self.values
            .borrow()
            .get(index)
            .cloned()
            .unwrap_or(Value::Nil)
    }

    /// Store a value at `index`. Out-of-range stores are ignored.
    pub fn set(&self, index: usize, value: Value) {
        if let Some(slot) = self.values.borrow_mut().get_mut(index) {
            *slot = value;
        }
    }

    /// The first value, or nil when empty.
    pub fn first(&self) -> Value {
        self.get(0)
    }

    /// The values from `start` on, as a fresh multi-value. Used to bind a
    /// trailing `...` parameter.
    pub fn tail(&self, start: usize) -> MultiValue {
        let values = self.values.borrow();
        let rest = values.get(start..).unwrap_or(&[]).to_vec();
        Self::from_values(rest)
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.values.borrow().to_vec()
    }
}

impl fmt::Debug for MultiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values.borrow();
        write!(f, "(")?;
        for (i, v) in values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v:?}")?;
        }
        write!(f, ")")
    }
}

impl PartialEq for MultiValue {
    fn eq(&self, other: &Self) -> bool {
        *self.values.borrow() == *other.values.borrow()
    }
}
