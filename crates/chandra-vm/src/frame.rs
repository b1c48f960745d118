//! Invocation frames.

use chandra_compiler::code::Proto;
use chandra_core::capture::CaptureState;
use chandra_core::error::RuntimeError;
use chandra_core::multi::MultiValue;
use chandra_core::runtime::LoopResource;
use chandra_core::value::Value;
use smallvec::SmallVec;
use std::rc::Rc;

/// The generic-for iterator resources of one frame. A resource still live
/// when the frame unwinds (an error leaving the loop early) is disposed by
/// `Drop`, so every resource's dispose hook runs exactly once regardless of
/// how the loop is left.
pub(crate) struct IterSlots {
    slots: Vec<Option<Box<dyn LoopResource>>>,
}

impl IterSlots {
    fn new(count: usize) -> Self {
        IterSlots {
            slots: (0..count).map(|_| None).collect(),
        }
    }

    pub fn put(&mut self, index: usize, resource: Box<dyn LoopResource>) {
        if let Some(mut old) = self.slots[index].take() {
            old.dispose();
        }
        self.slots[index] = Some(resource);
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Box<dyn LoopResource>> {
        self.slots.get_mut(index).and_then(|s| s.as_mut())
    }

    pub fn take(&mut self, index: usize) -> Option<Box<dyn LoopResource>> {
        self.slots.get_mut(index).and_then(|s| s.take())
    }
}

impl Drop for IterSlots {
    fn drop(&mut self) {
        for slot in &mut self.slots {
            if let Some(mut resource) = slot.take() {
                resource.dispose();
            }
        }
    }
}

/// One invocation of a compiled function.
pub(crate) struct Frame {
    pub proto: Rc<Proto>,
    pub pc: usize,
    pub stack: SmallVec<[Value; 16]>,
    pub locals: Vec<Value>,
    pub lists: Vec<Vec<Value>>,
    pub iters: IterSlots,
    /// The raw incoming arguments.
    pub args: MultiValue,
    /// This invocation's own capture record, once allocated by the prologue.
    pub capture: Option<Rc<CaptureState>>,
    /// The capture record this closure was bound with.
    pub upcx: Option<Rc<CaptureState>>,
}

impl Frame {
    pub fn new(proto: Rc<Proto>, args: MultiValue, upcx: Option<Rc<CaptureState>>) -> Self {
        Frame {
            pc: 0,
            stack: SmallVec::new(),
            locals: vec![Value::Nil; proto.num_slots as usize],
            lists: vec![Vec::new(); proto.num_lists as usize],
            iters: IterSlots::new(proto.num_iters as usize),
            args,
            capture: None,
            upcx,
            proto,
        }
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack
            .pop()
            .ok_or_else(|| RuntimeError::Runtime("operand stack underflow".into()))
    }

    pub fn top(&self) -> Result<&Value, RuntimeError> {
        self.stack
            .last()
            .ok_or_else(|| RuntimeError::Runtime("operand stack underflow".into()))
    }
}
