//! The code generator: a syntax-tree visitor that drives scope management,
//! variable resolution, and temporary allocation while emitting chunk code.
//!
//! Generation is a single depth-first pass. The compiler keeps a stack of
//! per-function states (the active function last); the stack order is the
//! lexical parent chain that ancestor capture resolution walks.

pub mod nest;
pub mod temp;
pub mod var;

use crate::ast::{
    Assign, Block, Call, Expr, FuncBody, FunctionDecl, GenericFor, If, NumericFor, Stmt,
};
use crate::code::{CallSite, Chunk, Instr, Proto};
use crate::error::{CompileError, ErrorKind};
use chandra_core::runtime::BinOp;
use nest::Nest;
use temp::{Shape, Slot};
use var::VarDef;
use std::rc::Rc;

/// State for a single function being compiled.
struct FuncState {
    proto: Proto,
    nest: Nest,
}

/// The compiler: the function state stack and the per-compilation counter
/// used to name capture-state descriptors.
struct Compiler {
    func_stack: Vec<FuncState>,
    /// Finished prototypes, in compilation-completion order.
    protos: Vec<Rc<Proto>>,
    next_id: u32,
    /// Source line of the construct being generated, for error reporting.
    line: u32,
}

/// Compile a chunk from its top-level function body. The body's capture
/// metadata must come from the same analysis pass as every nested
/// function's. On error the chunk is abandoned; no partial chunk escapes.
pub fn compile(main: &FuncBody, name: &str) -> Result<Chunk, CompileError> {
    let mut compiler = Compiler {
        func_stack: Vec::new(),
        protos: Vec::new(),
        next_id: 0,
        line: 0,
    };
    let entry = compiler.compile_function(main, false, Some(name.into()))?;
    Ok(Chunk {
        protos: compiler.protos,
        entry: entry as usize,
        name: name.into(),
    })
}

impl Compiler {
    fn fs(&self) -> &FuncState {
        self.func_stack.last().unwrap()
    }

    fn fs_mut(&mut self) -> &mut FuncState {
        self.func_stack.last_mut().unwrap()
    }

    fn error(&self, kind: ErrorKind) -> CompileError {
        CompileError::new(kind, self.line)
    }

    // ---- Emission helpers ----

    fn emit(&mut self, instr: Instr) -> usize {
        self.fs_mut().proto.emit(instr)
    }

    fn current_pc(&self) -> usize {
        self.fs().proto.code_len()
    }

    fn add_string(&mut self, s: &str) -> u16 {
        self.fs_mut().proto.add_string(s)
    }

    /// Point the branch at `pc` to the current position.
    fn patch_jump(&mut self, pc: usize) {
        let target = self.current_pc() as u32;
        self.fs_mut().proto.get_mut(pc).set_jump_target(target);
    }

    fn patch_jump_to(&mut self, pc: usize, target: usize) {
        self.fs_mut().proto.get_mut(pc).set_jump_target(target as u32);
    }

    fn acquire(&mut self, shape: Shape) -> Slot {
        self.fs_mut().nest.pool.acquire(shape)
    }

    fn release(&mut self, slot: Slot) {
        self.fs_mut().nest.pool.release(slot);
    }

    // ---- Scope helpers ----

    /// Run `f` inside a fresh block. The block is popped on every exit path;
    /// the collected break jumps (for loop blocks) are returned for
    /// patching.
    fn with_block<R>(
        &mut self,
        is_loop: bool,
        f: impl FnOnce(&mut Self) -> Result<R, CompileError>,
    ) -> Result<(R, Vec<usize>), CompileError> {
        self.fs_mut().nest.open_block(is_loop);
        let result = f(self);
        let breaks = self.fs_mut().nest.close_block();
        Ok((result?, breaks))
    }

    fn define_local(&mut self, name: &Rc<str>) -> VarDef {
        self.fs_mut().nest.define_local(name)
    }

    /// Classify a name reference. Searches the current function's blocks
    /// innermost-first, then walks the lexical parent chain; a hit in an
    /// ancestor must be a captured field, reached through one back-reference
    /// hop per intervening function. Anything unresolved is a global.
    fn find_variable(&mut self, name: &str) -> Result<VarDef, CompileError> {
        if let Some(def) = self.fs().nest.find_local(name) {
            return Ok(def.clone());
        }
        let depth = self.func_stack.len();
        for (hops, fs) in self.func_stack[..depth - 1].iter().rev().enumerate() {
            match fs.nest.find_local(name) {
                Some(VarDef::Captured { field }) => {
                    return Ok(VarDef::CapturedAncestor {
                        hops: hops as u8,
                        field: *field,
                    });
                }
                Some(_) => {
                    return Err(self.error(ErrorKind::InconsistentCapture(name.into())));
                }
                None => {}
            }
        }
        Ok(VarDef::Global { name: name.into() })
    }

    // ---- Functions ----

    /// Compile one function body into a prototype, returning its index in
    /// the chunk's proto table. The caller emits the closure creation.
    fn compile_function(
        &mut self,
        body: &FuncBody,
        method: bool,
        name: Option<Rc<str>>,
    ) -> Result<u16, CompileError> {
        let id = self.next_id;
        self.next_id += 1;
        self.func_stack.push(FuncState {
            proto: Proto::new(name),
            nest: Nest::new(&body.info, id),
        });

        if self.fs().nest.has_capture() {
            self.emit(Instr::NewCapture);
        }

        // Bind parameters from the adjusted argument array. An instance
        // method gets an implicit leading `self`.
        let mut params: Vec<Rc<str>> = Vec::with_capacity(body.params.len() + 1);
        if method {
            params.push("self".into());
        }
        params.extend(body.params.iter().cloned());
        for (i, param) in params.iter().enumerate() {
            let vararg = &**param == "...";
            if vararg && i + 1 != params.len() {
                return Err(CompileError::new(ErrorKind::VarargNotLast, body.line));
            }
            let def = self.define_local(param);
            def.start_set(&mut self.fs_mut().proto);
            if vararg {
                self.emit(Instr::ArgTail(i as u16));
            } else {
                self.emit(Instr::Arg(i as u16));
            }
            def.end_set(&mut self.fs_mut().proto);
        }

        self.gen_block(&body.body)?;
        self.emit(Instr::ReturnEmpty);

        for (pc, target) in self.fs().nest.resolve_gotos()? {
            self.patch_jump_to(pc, target);
        }

        let fs = self.func_stack.pop().unwrap();
        let mut proto = fs.proto;
        proto.num_slots = fs.nest.pool.value_slots();
        proto.num_lists = fs.nest.pool.list_slots();
        proto.num_iters = fs.nest.pool.iter_slots();
        proto.capture = fs.nest.seal_capture();
        let index = self.protos.len() as u16;
        self.protos.push(Rc::new(proto));
        Ok(index)
    }

    // ---- Statements ----

    fn gen_block(&mut self, block: &Block) -> Result<(), CompileError> {
        let ((), _) = self.with_block(false, |c| c.gen_stmts(block))?;
        Ok(())
    }

    fn gen_stmts(&mut self, block: &Block) -> Result<(), CompileError> {
        for stmt in &block.stmts {
            self.gen_stmt(stmt)?;
        }
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Assign(assign) => self.gen_assign(assign),
            Stmt::Call(call) => self.gen_call(call, false, true),
            Stmt::Do(block) => self.gen_block(block),
            Stmt::While { cond, body, line } => self.gen_while(cond, body, *line),
            Stmt::Repeat { body, cond, line } => self.gen_repeat(body, cond, *line),
            Stmt::If(stmt) => self.gen_if(stmt),
            Stmt::NumericFor(stmt) => self.gen_numeric_for(stmt),
            Stmt::GenericFor(stmt) => self.gen_generic_for(stmt),
            Stmt::Function(decl) => self.gen_function_decl(decl),
            Stmt::Return { values, line } => self.gen_return(values, *line),
            Stmt::Break { line } => {
                self.line = *line;
                let pc = self.emit(Instr::Jump(0));
                if !self.fs_mut().nest.add_break(pc) {
                    return Err(self.error(ErrorKind::BreakOutsideLoop));
                }
                Ok(())
            }
            Stmt::Label { name, line } => {
                self.line = *line;
                let pc = self.current_pc();
                self.fs_mut().nest.define_label(name, pc, *line)
            }
            Stmt::Goto { name, line } => {
                self.line = *line;
                let pc = self.emit(Instr::Jump(0));
                self.fs_mut().nest.add_goto(name, pc, *line);
                Ok(())
            }
        }
    }

    /// Multi-target assignment. Indexer keys are evaluated and cached before
    /// any right-hand side runs, so side effects in the values cannot change
    /// which slot a target addresses (`i, t[i] = i+1, 20` stores into the
    /// old `t[i]`). Containers are evaluated at store time.
    fn gen_assign(&mut self, assign: &Assign) -> Result<(), CompileError> {
        self.line = assign.line;
        let keys = self.acquire(Shape::List);
        self.emit(Instr::NewList {
            slot: keys.index,
            len: assign.targets.len() as u16,
        });
        for (i, target) in assign.targets.iter().enumerate() {
            if let Expr::Index { key, .. } = target {
                self.gen_expr(key)?;
                self.emit(Instr::ListSet {
                    slot: keys.index,
                    index: i as u16,
                });
            }
        }

        let values = self.acquire(Shape::List);
        self.emit(Instr::NewList {
            slot: values.index,
            len: assign.values.len() as u16,
        });
        for (i, value) in assign.values.iter().enumerate() {
            self.gen_expr(value)?;
            self.emit(Instr::ListSet {
                slot: values.index,
                index: i as u16,
            });
        }
        self.emit(Instr::NewMulti { slot: values.index });
        self.release(values);
        let exp = self.acquire(Shape::Value);
        self.emit(Instr::SetLocal(exp.index));

        for (i, target) in assign.targets.iter().enumerate() {
            match target {
                Expr::Name(name) => {
                    // a local declaration binds after the values ran, so
                    // `local x = x` reads the outer x
                    let def = if assign.local {
                        self.define_local(name)
                    } else {
                        self.find_variable(name)?
                    };
                    def.start_set(&mut self.fs_mut().proto);
                    self.emit(Instr::GetLocal(exp.index));
                    self.emit(Instr::MultiAt(i as u16));
                    def.end_set(&mut self.fs_mut().proto);
                }
                Expr::Index { prefix, .. } if !assign.local => {
                    self.gen_expr_single(prefix)?;
                    self.emit(Instr::ListGet {
                        slot: keys.index,
                        index: i as u16,
                    });
                    self.emit(Instr::GetLocal(exp.index));
                    self.emit(Instr::MultiAt(i as u16));
                    self.emit(Instr::SetIndex);
                }
                _ => return Err(self.error(ErrorKind::InvalidAssignTarget)),
            }
        }
        self.release(exp);
        self.release(keys);
        Ok(())
    }

    fn gen_while(&mut self, cond: &Expr, body: &Block, line: u32) -> Result<(), CompileError> {
        self.line = line;
        let start = self.current_pc();
        let (exit, breaks) = self.with_block(true, |c| {
            c.gen_expr_single(cond)?;
            let exit = c.emit(Instr::JumpIfFalse(0));
            c.gen_stmts(body)?;
            c.emit(Instr::Jump(start as u32));
            Ok(exit)
        })?;
        self.patch_jump(exit);
        for pc in breaks {
            self.patch_jump(pc);
        }
        Ok(())
    }

    fn gen_repeat(&mut self, body: &Block, cond: &Expr, line: u32) -> Result<(), CompileError> {
        self.line = line;
        let start = self.current_pc();
        let ((), breaks) = self.with_block(true, |c| {
            c.gen_stmts(body)?;
            // the condition sees the body's locals and repeats while false
            c.gen_expr_single(cond)?;
            c.emit(Instr::JumpIfFalse(start as u32));
            Ok(())
        })?;
        for pc in breaks {
            self.patch_jump(pc);
        }
        Ok(())
    }

    fn gen_if(&mut self, stmt: &If) -> Result<(), CompileError> {
        self.line = stmt.line;
        let mut end_jumps = Vec::new();
        self.gen_expr_single(&stmt.cond)?;
        let mut next = self.emit(Instr::JumpIfFalse(0));
        self.gen_block(&stmt.body)?;
        end_jumps.push(self.emit(Instr::Jump(0)));
        self.patch_jump(next);
        for (cond, block) in &stmt.elseifs {
            self.gen_expr_single(cond)?;
            next = self.emit(Instr::JumpIfFalse(0));
            self.gen_block(block)?;
            end_jumps.push(self.emit(Instr::Jump(0)));
            self.patch_jump(next);
        }
        if let Some(block) = &stmt.else_body {
            self.gen_block(block)?;
        }
        for pc in end_jumps {
            self.patch_jump(pc);
        }
        Ok(())
    }

    fn gen_numeric_for(&mut self, stmt: &NumericFor) -> Result<(), CompileError> {
        self.line = stmt.line;
        let val = self.acquire(Shape::Value);
        let step = self.acquire(Shape::Value);
        let limit = self.acquire(Shape::Value);
        let (test, breaks) = self.with_block(true, |c| {
            c.gen_expr_single(&stmt.start)?;
            c.emit(Instr::CoerceNum);
            c.emit(Instr::SetLocal(val.index));
            match &stmt.step {
                Some(expr) => {
                    c.gen_expr_single(expr)?;
                    c.emit(Instr::CoerceNum);
                }
                None => {
                    c.emit(Instr::Number(1.0));
                }
            }
            c.emit(Instr::SetLocal(step.index));
            c.gen_expr_single(&stmt.limit)?;
            c.emit(Instr::CoerceNum);
            c.emit(Instr::SetLocal(limit.index));

            let start_pc = c.current_pc();
            let test = c.emit(Instr::ForTest {
                val: val.index,
                limit: limit.index,
                step: step.index,
                exit: 0,
            });
            // the loop variable is re-bound every iteration
            let def = c.define_local(&stmt.var);
            def.start_set(&mut c.fs_mut().proto);
            c.emit(Instr::GetLocal(val.index));
            def.end_set(&mut c.fs_mut().proto);
            c.gen_stmts(&stmt.body)?;
            c.emit(Instr::ForIncr {
                val: val.index,
                step: step.index,
            });
            c.emit(Instr::Jump(start_pc as u32));
            Ok(test)
        })?;
        self.patch_jump(test);
        for pc in breaks {
            self.patch_jump(pc);
        }
        self.release(limit);
        self.release(step);
        self.release(val);
        Ok(())
    }

    fn gen_generic_for(&mut self, stmt: &GenericFor) -> Result<(), CompileError> {
        self.line = stmt.line;
        let (end_pc, breaks) = self.with_block(true, |c| {
            let list = c.acquire(Shape::List);
            c.emit(Instr::NewList {
                slot: list.index,
                len: stmt.exprs.len() as u16,
            });
            for (i, expr) in stmt.exprs.iter().enumerate() {
                c.gen_expr(expr)?;
                c.emit(Instr::ListSet {
                    slot: list.index,
                    index: i as u16,
                });
            }
            c.emit(Instr::NewMulti { slot: list.index });
            c.release(list);

            let iter = c.acquire(Shape::Iter);
            c.emit(Instr::IterBegin { slot: iter.index });
            let start_pc = c.current_pc();
            let next = c.emit(Instr::IterNext {
                slot: iter.index,
                exit: 0,
            });
            let ret = c.acquire(Shape::Value);
            c.emit(Instr::SetLocal(ret.index));
            for (i, name) in stmt.names.iter().enumerate() {
                let def = c.define_local(name);
                def.start_set(&mut c.fs_mut().proto);
                c.emit(Instr::GetLocal(ret.index));
                c.emit(Instr::MultiAt(i as u16));
                def.end_set(&mut c.fs_mut().proto);
            }
            c.release(ret);
            c.gen_stmts(&stmt.body)?;
            c.emit(Instr::Jump(start_pc as u32));

            // every exit lands on the dispose: normal completion and break
            // jump here, an error unwinds through the frame guard instead
            c.patch_jump(next);
            let end_pc = c.current_pc();
            c.emit(Instr::IterEnd { slot: iter.index });
            c.release(iter);
            Ok(end_pc)
        })?;
        for pc in breaks {
            self.patch_jump_to(pc, end_pc);
        }
        Ok(())
    }

    fn gen_function_decl(&mut self, decl: &FunctionDecl) -> Result<(), CompileError> {
        self.line = decl.line;
        if decl.local {
            if decl.method.is_some() {
                return Err(self.error(ErrorKind::LocalInstanceName));
            }
            let Expr::Name(name) = &decl.target else {
                return Err(self.error(ErrorKind::LocalMethodIndexer));
            };
            // defined before the body compiles so the function can capture
            // itself for recursion
            let def = self.define_local(name);
            def.start_set(&mut self.fs_mut().proto);
            let index = self.compile_function(&decl.body, false, Some(Rc::clone(name)))?;
            self.emit(Instr::MakeClosure(index));
            def.end_set(&mut self.fs_mut().proto);
            return Ok(());
        }

        if let Some(method) = &decl.method {
            let name: Rc<str> = match &decl.target {
                Expr::Name(n) => format!("{n}:{method}").into(),
                _ => Rc::clone(method),
            };
            self.gen_expr_single(&decl.target)?;
            let k = self.add_string(method);
            self.emit(Instr::Str(k));
            let index = self.compile_function(&decl.body, true, Some(name))?;
            self.emit(Instr::MakeClosure(index));
            self.emit(Instr::SetIndex);
            return Ok(());
        }

        match &decl.target {
            Expr::Name(name) => {
                let def = self.find_variable(name)?;
                def.start_set(&mut self.fs_mut().proto);
                let index = self.compile_function(&decl.body, false, Some(Rc::clone(name)))?;
                self.emit(Instr::MakeClosure(index));
                def.end_set(&mut self.fs_mut().proto);
            }
            Expr::Index { prefix, key, .. } => {
                let name = match &**key {
                    Expr::Str(s) => Some(Rc::clone(s)),
                    _ => None,
                };
                self.gen_expr_single(prefix)?;
                self.gen_expr(key)?;
                let index = self.compile_function(&decl.body, false, name)?;
                self.emit(Instr::MakeClosure(index));
                self.emit(Instr::SetIndex);
            }
            _ => return Err(self.error(ErrorKind::InvalidAssignTarget)),
        }
        Ok(())
    }

    fn gen_return(&mut self, values: &[Expr], line: u32) -> Result<(), CompileError> {
        self.line = line;
        // a lone direct call forwards as a tail call, with no aggregation
        if values.len() == 1 {
            if let Expr::Call(call) = &values[0] {
                self.gen_call(call, true, false)?;
                self.emit(Instr::Return);
                return Ok(());
            }
        }
        let list = self.acquire(Shape::List);
        self.emit(Instr::NewList {
            slot: list.index,
            len: values.len() as u16,
        });
        for (i, value) in values.iter().enumerate() {
            self.gen_expr(value)?;
            self.emit(Instr::ListSet {
                slot: list.index,
                index: i as u16,
            });
        }
        self.emit(Instr::NewMulti { slot: list.index });
        self.release(list);
        self.emit(Instr::Return);
        Ok(())
    }

    // ---- Calls ----

    /// Emit a call. Stack protocol: receiver, callee, adjusted argument
    /// multi-value; the call instruction consumes all three.
    fn gen_call(&mut self, call: &Call, tail: bool, statement: bool) -> Result<(), CompileError> {
        self.line = call.line;
        match (&call.method, &call.prefix) {
            (Some(method), _) => {
                // the receiver is evaluated once and doubles as the lookup base
                self.gen_expr_single(&call.prefix)?;
                self.emit(Instr::Dup);
                let k = self.add_string(method);
                self.emit(Instr::Str(k));
                self.emit(Instr::GetIndex);
            }
            (None, Expr::Index { prefix, key, .. }) => {
                self.gen_expr_single(prefix)?;
                self.emit(Instr::Dup);
                self.gen_expr(key)?;
                self.emit(Instr::GetIndex);
            }
            (None, _) => {
                self.emit(Instr::Nil);
                self.gen_expr_single(&call.prefix)?;
            }
        }

        let list = self.acquire(Shape::List);
        self.emit(Instr::NewList {
            slot: list.index,
            len: call.args.len() as u16,
        });
        for (i, arg) in call.args.iter().enumerate() {
            self.gen_expr(&arg.value)?;
            self.emit(Instr::ListSet {
                slot: list.index,
                index: i as u16,
            });
        }
        self.emit(Instr::NewMulti { slot: list.index });
        self.release(list);

        let by_ref: Vec<u16> = call
            .args
            .iter()
            .enumerate()
            .filter(|(_, a)| a.by_ref)
            .map(|(i, _)| i as u16)
            .collect();

        // keep the argument multi-value for by-ref writeback after the call
        let rargs = if by_ref.is_empty() {
            None
        } else {
            let slot = self.acquire(Shape::Value);
            self.emit(Instr::SetLocal(slot.index));
            self.emit(Instr::GetLocal(slot.index));
            Some(slot)
        };

        let method = call.method.is_some();
        if call.overload.is_none() && by_ref.is_empty() {
            self.emit(Instr::Call { method, tail });
        } else {
            let site = CallSite {
                method,
                tail,
                overload: call.overload,
                by_ref: by_ref.clone(),
            };
            let index = self.fs_mut().proto.add_call_site(site);
            self.emit(Instr::CallEx(index));
        }

        if statement {
            self.emit(Instr::Pop);
        }

        if let Some(slot) = rargs {
            for &i in &by_ref {
                let target = &call.args[i as usize].value;
                match target {
                    Expr::Name(name) => {
                        let def = self.find_variable(name)?;
                        def.start_set(&mut self.fs_mut().proto);
                        self.emit(Instr::GetLocal(slot.index));
                        self.emit(Instr::MultiAt(i));
                        def.end_set(&mut self.fs_mut().proto);
                    }
                    Expr::Index { prefix, key, .. } => {
                        self.gen_expr_single(prefix)?;
                        self.gen_expr(key)?;
                        self.emit(Instr::GetLocal(slot.index));
                        self.emit(Instr::MultiAt(i));
                        self.emit(Instr::SetIndex);
                    }
                    _ => return Err(self.error(ErrorKind::InvalidAssignTarget)),
                }
            }
            self.release(slot);
        }
        Ok(())
    }

    // ---- Expressions ----

    /// Emit an expression, collapsed to exactly one value.
    fn gen_expr_single(&mut self, expr: &Expr) -> Result<(), CompileError> {
        self.gen_expr(expr)?;
        if expr.is_multi() {
            self.emit(Instr::First);
        }
        Ok(())
    }

    fn gen_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Nil => {
                self.emit(Instr::Nil);
            }
            Expr::True => {
                self.emit(Instr::True);
            }
            Expr::False => {
                self.emit(Instr::False);
            }
            Expr::Number(n) => {
                self.emit(Instr::Number(*n));
            }
            Expr::Str(s) => {
                let k = self.add_string(s);
                self.emit(Instr::Str(k));
            }
            Expr::Name(name) => {
                let def = self.find_variable(name)?;
                def.get(&mut self.fs_mut().proto);
            }
            Expr::Vararg => {
                let def = self.find_variable("...")?;
                def.get(&mut self.fs_mut().proto);
            }
            Expr::Paren(inner) => {
                self.gen_expr_single(inner)?;
            }
            Expr::Index { prefix, key, line } => {
                self.line = *line;
                self.gen_expr_single(prefix)?;
                self.gen_expr(key)?;
                self.emit(Instr::GetIndex);
            }
            Expr::Bin { op, lhs, rhs, line } => {
                self.line = *line;
                match op {
                    BinOp::And | BinOp::Or => {
                        self.gen_expr_single(lhs)?;
                        let short = if *op == BinOp::And {
                            self.emit(Instr::JumpIfFalsePeek(0))
                        } else {
                            self.emit(Instr::JumpIfTruePeek(0))
                        };
                        self.emit(Instr::Pop);
                        self.gen_expr_single(rhs)?;
                        self.patch_jump(short);
                    }
                    _ => {
                        self.gen_expr(lhs)?;
                        self.gen_expr(rhs)?;
                        self.emit(Instr::Bin(*op));
                    }
                }
            }
            Expr::Un { op, operand, line } => {
                self.line = *line;
                self.gen_expr(operand)?;
                self.emit(Instr::Un(*op));
            }
            Expr::Call(call) => {
                self.gen_call(call, false, false)?;
            }
            Expr::Function(body) => {
                let index = self.compile_function(body, false, None)?;
                self.emit(Instr::MakeClosure(index));
            }
            Expr::Table { fields, line } => {
                self.line = *line;
                self.emit(Instr::NewTable);
                for (key, value) in fields {
                    self.emit(Instr::Dup);
                    self.gen_expr(key)?;
                    self.gen_expr(value)?;
                    self.emit(Instr::SetIndex);
                }
            }
        }
        Ok(())
    }
}
