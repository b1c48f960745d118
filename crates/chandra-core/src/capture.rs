//! Per-invocation capture records.
//!
//! Each invocation of a function that owns captured variables allocates one
//! `CaptureState`: a fixed-size record whose fields are exactly the captured
//! names, laid out at compile time. Nested closures hold a reference to the
//! instance that was current where they were created; reads and writes of a
//! variable owned by a further ancestor walk the `parent` back-reference
//! chain a compile-time-known number of hops.

use crate::error::RuntimeError;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// One invocation's captured-variable record. Shared by every closure that
/// reaches into it; the instance lives as long as its longest-lived holder.
pub struct CaptureState {
    parent: Option<Rc<CaptureState>>,
    fields: Box<[RefCell<Value>]>,
}

impl CaptureState {
    /// Allocate a record with `field_count` nil fields and the given
    /// back-reference to the nearest material ancestor record.
    pub fn new(field_count: usize, parent: Option<Rc<CaptureState>>) -> Rc<Self> {
        let fields = (0..field_count)
            .map(|_| RefCell::new(Value::Nil))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Rc::new(CaptureState { parent, fields })
    }

    pub fn parent(&self) -> Option<&Rc<CaptureState>> {
        self.parent.as_ref()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Read a field. Field indices are assigned at compile time and are
    /// always in range for a record built from the sealed layout.
    pub fn get(&self, index: usize) -> Value {
        self.fields[index].borrow().clone()
    }

    /// Write a field.
    pub fn set(&self, index: usize, value: Value) {
        *self.fields[index].borrow_mut() = value;
    }

    /// Follow the parent back-reference chain `hops` times.
    pub fn ancestor(self: &Rc<Self>, hops: usize) -> Result<Rc<CaptureState>, RuntimeError> {
        let mut cur = Rc::clone(self);
        for _ in 0..hops {
            let next = cur
                .parent
                .as_ref()
                .ok_or_else(|| RuntimeError::Runtime("broken capture chain".into()))?;
            cur = Rc::clone(next);
        }
        Ok(cur)
    }
}
