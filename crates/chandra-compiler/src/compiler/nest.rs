//! Lexical scope state for one function being compiled.
//!
//! A `Nest` owns the LIFO stack of block frames of the function currently
//! being generated, the capture-record layout being materialized (when the
//! function has nested functions), the scratch slot pool, and the function's
//! labels and pending gotos. The compiler keeps a stack of nests, one per
//! function on the compilation path; the stack order is the lexical parent
//! chain used for ancestor capture resolution.

use crate::ast::FuncInfo;
use crate::code::CaptureInfo;
use crate::compiler::temp::SlotPool;
use crate::compiler::var::VarDef;
use crate::error::{CompileError, ErrorKind};
use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

/// The capture-record layout of a function, grown as captured locals are
/// defined and sealed when the function finishes compiling.
#[derive(Debug)]
pub struct CaptureLayout {
    fields: IndexSet<Rc<str>>,
    store_parent: bool,
    id: u32,
}

impl CaptureLayout {
    fn new(id: u32, store_parent: bool) -> Self {
        CaptureLayout {
            fields: IndexSet::new(),
            store_parent,
            id,
        }
    }

    /// Materialize a field for `name`, deduplicating collisions with a
    /// numeric suffix (a name shadowed within the function gets `name_0`,
    /// `name_1`, ...).
    pub fn add_field(&mut self, name: &str) -> u16 {
        if !self.fields.contains(name) {
            let (i, _) = self.fields.insert_full(name.into());
            return i as u16;
        }
        let mut n = 0usize;
        loop {
            let candidate = format!("{name}_{n}");
            if !self.fields.contains(candidate.as_str()) {
                let (i, _) = self.fields.insert_full(candidate.into());
                return i as u16;
            }
            n += 1;
        }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn seal(self) -> CaptureInfo {
        CaptureInfo {
            fields: self.fields.into_iter().collect(),
            store_parent: self.store_parent,
            id: self.id,
        }
    }
}

/// One block frame: the bindings visible in it, and, for loop blocks, the
/// break jumps waiting to be patched to the loop exit.
#[derive(Debug, Default)]
struct BlockFrame {
    vars: FxHashMap<Rc<str>, VarDef>,
    is_loop: bool,
    break_jumps: Vec<usize>,
}

/// A forward goto awaiting its label.
#[derive(Debug)]
struct PendingGoto {
    name: Rc<str>,
    pc: usize,
    line: u32,
}

/// Scope state for one function being compiled.
pub struct Nest {
    blocks: Vec<BlockFrame>,
    capture: Option<CaptureLayout>,
    captured_names: FxHashSet<Rc<str>>,
    pub pool: SlotPool,
    labels: FxHashMap<Rc<str>, usize>,
    pending_gotos: Vec<PendingGoto>,
}

impl Nest {
    /// Create the nest for a function with the given capture metadata. A
    /// capture-record layout is allocated iff the function has nested
    /// functions; `descriptor_id` names it uniquely within the compilation.
    pub fn new(info: &FuncInfo, descriptor_id: u32) -> Self {
        let capture = info
            .has_nested
            .then(|| CaptureLayout::new(descriptor_id, info.captures_parent));
        Nest {
            // the root frame holds the parameters
            blocks: vec![BlockFrame::default()],
            capture,
            captured_names: info.captured.iter().cloned().collect(),
            pool: SlotPool::new(),
            labels: FxHashMap::default(),
            pending_gotos: Vec::new(),
        }
    }

    /// Whether this function owns a capture record.
    pub fn has_capture(&self) -> bool {
        self.capture.is_some()
    }

    pub fn open_block(&mut self, is_loop: bool) {
        self.blocks.push(BlockFrame {
            is_loop,
            ..BlockFrame::default()
        });
    }

    /// Pop the innermost block, returning the break jumps collected in it
    /// (empty unless it was a loop block).
    pub fn close_block(&mut self) -> Vec<usize> {
        match self.blocks.pop() {
            Some(frame) => frame.break_jumps,
            None => Vec::new(),
        }
    }

    /// Define a local in the innermost block. Captured names become fields
    /// of the capture record; the rest get private frame slots. Re-defining
    /// a name shadows the previous binding going forward.
    pub fn define_local(&mut self, name: &Rc<str>) -> VarDef {
        let def = match (&mut self.capture, self.captured_names.contains(name)) {
            (Some(layout), true) => VarDef::Captured {
                field: layout.add_field(name),
            },
            _ => VarDef::Local {
                slot: self.pool.alloc_local(),
            },
        };
        if let Some(block) = self.blocks.last_mut() {
            block.vars.insert(Rc::clone(name), def.clone());
        }
        def
    }

    /// Look up a name in this function's open blocks, innermost first.
    pub fn find_local(&self, name: &str) -> Option<&VarDef> {
        self.blocks.iter().rev().find_map(|b| b.vars.get(name))
    }

    /// Record a break jump to be patched at the nearest loop's exit.
    /// Returns false when no loop block is open.
    pub fn add_break(&mut self, pc: usize) -> bool {
        match self.blocks.iter_mut().rev().find(|b| b.is_loop) {
            Some(block) => {
                block.break_jumps.push(pc);
                true
            }
            None => false,
        }
    }

    /// Define a label at the given pc.
    pub fn define_label(&mut self, name: &Rc<str>, pc: usize, line: u32) -> Result<(), CompileError> {
        if self.labels.contains_key(name) {
            return Err(CompileError::new(
                ErrorKind::DuplicateLabel(Rc::clone(name)),
                line,
            ));
        }
        self.labels.insert(Rc::clone(name), pc);
        Ok(())
    }

    /// Record a goto emitted as a placeholder jump at `pc`.
    pub fn add_goto(&mut self, name: &Rc<str>, pc: usize, line: u32) {
        self.pending_gotos.push(PendingGoto {
            name: Rc::clone(name),
            pc,
            line,
        });
    }

    /// Resolve every pending goto against the labels now that the whole
    /// function body has been generated. Returns (jump pc, target pc) pairs
    /// to patch, or the first unresolved goto as a fatal error.
    pub fn resolve_gotos(&self) -> Result<Vec<(usize, usize)>, CompileError> {
        let mut patches = Vec::with_capacity(self.pending_gotos.len());
        for goto in &self.pending_gotos {
            match self.labels.get(&goto.name) {
                Some(&target) => patches.push((goto.pc, target)),
                None => {
                    return Err(CompileError::new(
                        ErrorKind::UnresolvedGoto(Rc::clone(&goto.name)),
                        goto.line,
                    ))
                }
            }
        }
        Ok(patches)
    }

    /// Seal the capture layout into its final form.
    pub fn seal_capture(self) -> Option<CaptureInfo> {
        self.capture.map(CaptureLayout::seal)
    }
}
