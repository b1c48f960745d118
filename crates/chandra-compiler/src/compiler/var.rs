//! Variable accessors.
//!
//! Resolution classifies every name reference into one of four storage
//! kinds; each kind emits code through the same three-phase protocol so call
//! sites can evaluate sub-expressions between acquiring an assignment target
//! and committing the value:
//!
//! - `start_set` emits whatever must precede the value on the operand stack
//!   (the globals table and key for a global; nothing for the others, whose
//!   commit instructions address their storage directly),
//! - `end_set` commits the value,
//! - `get` pushes the current value.

use crate::code::{Instr, Proto};
use std::rc::Rc;

/// A resolved variable, with enough compile-time information to emit reads
/// and writes.
#[derive(Clone, Debug, PartialEq)]
pub enum VarDef {
    /// A plain function-local: a private frame slot.
    Local { slot: u16 },
    /// A captured local of the current function: a field of this
    /// invocation's own capture record.
    Captured { field: u16 },
    /// A captured variable owned by an enclosing function: `hops` parent
    /// back-references from the bound capture record, then a field access.
    CapturedAncestor { hops: u8, field: u16 },
    /// Not found in any enclosing function: reads and writes go through the
    /// environment's globals table, keyed by the name string.
    Global { name: Rc<str> },
}

impl VarDef {
    /// Begin an assignment to this variable.
    pub fn start_set(&self, proto: &mut Proto) {
        if let VarDef::Global { name } = self {
            let k = proto.add_string(name);
            proto.emit(Instr::Globals);
            proto.emit(Instr::Str(k));
        }
    }

    /// Commit a previously produced value into this variable.
    pub fn end_set(&self, proto: &mut Proto) {
        match self {
            VarDef::Local { slot } => {
                proto.emit(Instr::SetLocal(*slot));
            }
            VarDef::Captured { field } => {
                proto.emit(Instr::SetField(*field));
            }
            VarDef::CapturedAncestor { hops, field } => {
                proto.emit(Instr::SetUpField {
                    hops: *hops,
                    field: *field,
                });
            }
            VarDef::Global { .. } => {
                proto.emit(Instr::SetIndex);
            }
        }
    }

    /// Push the variable's current value.
    pub fn get(&self, proto: &mut Proto) {
        match self {
            VarDef::Local { slot } => {
                proto.emit(Instr::GetLocal(*slot));
            }
            VarDef::Captured { field } => {
                proto.emit(Instr::GetField(*field));
            }
            VarDef::CapturedAncestor { hops, field } => {
                proto.emit(Instr::GetUpField {
                    hops: *hops,
                    field: *field,
                });
            }
            VarDef::Global { name } => {
                let k = proto.add_string(name);
                proto.emit(Instr::Globals);
                proto.emit(Instr::Str(k));
                proto.emit(Instr::GetIndex);
            }
        }
    }
}
