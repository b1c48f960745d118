//! Instruction dispatch and the call trampoline.

use crate::frame::Frame;
use chandra_compiler::code::{Chunk, Instr};
use chandra_core::capture::CaptureState;
use chandra_core::error::RuntimeError;
use chandra_core::multi::MultiValue;
use chandra_core::runtime::Environment;
use chandra_core::value::{CallContext, LuaClosure, Value};
use std::rc::Rc;

/// Non-tail call nesting limit.
const MAX_CALL_DEPTH: usize = 200;

/// How a frame finished: a result, or a tail call to run in its place.
enum Control {
    Return(MultiValue),
    Tail {
        callee: Value,
        args: MultiValue,
        overload: Option<u32>,
        by_ref: Vec<usize>,
    },
}

/// Executes compiled chunks. Tail calls are trampolined here, so tail
/// recursion runs in constant stack; everything else recurses and is bounded
/// by a depth guard.
pub struct Vm {
    depth: usize,
}

impl Vm {
    pub fn new() -> Self {
        Vm { depth: 0 }
    }

    /// Invoke a chunk with positional arguments, returning its multi-value
    /// result.
    pub fn invoke(
        &mut self,
        chunk: &Chunk,
        env: &Environment,
        args: &[Value],
    ) -> Result<MultiValue, RuntimeError> {
        self.invoke_overload(chunk, env, None, MultiValue::from_values(args.to_vec()), &[])
    }

    /// Overload-aware invocation for host-interop call sites: an explicit
    /// overload selector and by-reference positions, both forwarded to
    /// native callees. By-ref outputs land in `args`, which the caller can
    /// read back.
    pub fn invoke_overload(
        &mut self,
        chunk: &Chunk,
        env: &Environment,
        selector: Option<u32>,
        args: MultiValue,
        by_ref: &[usize],
    ) -> Result<MultiValue, RuntimeError> {
        let entry = Value::Function(Rc::new(LuaClosure {
            proto: chunk.entry,
            upcx: None,
            name: Some(Rc::clone(&chunk.name)),
        }));
        self.call_value(chunk, env, entry, args, selector, by_ref.to_vec())
    }

    /// Invoke any callable value. Script closures run on an internal frame;
    /// a tail continuation replaces the frame without growing the stack.
    fn call_value(
        &mut self,
        chunk: &Chunk,
        env: &Environment,
        mut callee: Value,
        mut args: MultiValue,
        mut selector: Option<u32>,
        mut by_ref: Vec<usize>,
    ) -> Result<MultiValue, RuntimeError> {
        self.depth += 1;
        if self.depth > MAX_CALL_DEPTH {
            self.depth -= 1;
            return Err(RuntimeError::StackOverflow);
        }
        let result = loop {
            match callee {
                Value::Function(ref closure) => {
                    let proto = match chunk.protos.get(closure.proto) {
                        Some(p) => Rc::clone(p),
                        None => {
                            break Err(RuntimeError::Runtime("invalid function prototype".into()))
                        }
                    };
                    let mut frame = Frame::new(proto, args, closure.upcx.clone());
                    match self.run_frame(chunk, env, &mut frame) {
                        Ok(Control::Return(result)) => break Ok(result),
                        Ok(Control::Tail {
                            callee: next_callee,
                            args: next_args,
                            overload,
                            by_ref: next_by_ref,
                        }) => {
                            callee = next_callee;
                            args = next_args;
                            selector = overload;
                            by_ref = next_by_ref;
                        }
                        Err(e) => break Err(e),
                    }
                }
                Value::Native(ref native) => {
                    let cx = CallContext {
                        args,
                        selector,
                        by_ref,
                    };
                    break native.call(env, &cx);
                }
                ref other => break Err(RuntimeError::NotCallable(other.type_name())),
            }
        };
        self.depth -= 1;
        result
    }

    fn run_frame(
        &mut self,
        chunk: &Chunk,
        env: &Environment,
        frame: &mut Frame,
    ) -> Result<Control, RuntimeError> {
        let proto = Rc::clone(&frame.proto);
        loop {
            let Some(instr) = proto.code.get(frame.pc) else {
                return Ok(Control::Return(MultiValue::empty()));
            };
            frame.pc += 1;
            match instr {
                // ---- constants ----
                Instr::Nil => frame.push(Value::Nil),
                Instr::True => frame.push(Value::Bool(true)),
                Instr::False => frame.push(Value::Bool(false)),
                Instr::Number(n) => frame.push(Value::Number(*n)),
                Instr::Str(k) => {
                    frame.push(Value::Str(Rc::clone(&proto.strings[*k as usize])));
                }

                // ---- operand stack ----
                Instr::Pop => {
                    frame.pop()?;
                }
                Instr::Dup => {
                    let v = frame.top()?.clone();
                    frame.push(v);
                }
                Instr::First => {
                    let v = frame.pop()?;
                    frame.push(v.first());
                }

                // ---- variables ----
                Instr::GetLocal(i) => {
                    let v = frame.locals[*i as usize].clone();
                    frame.push(v);
                }
                Instr::SetLocal(i) => {
                    let v = frame.pop()?;
                    frame.locals[*i as usize] = v;
                }
                Instr::GetField(i) => {
                    let v = own_capture(frame)?.get(*i as usize);
                    frame.push(v);
                }
                Instr::SetField(i) => {
                    let v = frame.pop()?.first();
                    own_capture(frame)?.set(*i as usize, v);
                }
                Instr::GetUpField { hops, field } => {
                    let record = bound_capture(frame)?.ancestor(*hops as usize)?;
                    frame.push(record.get(*field as usize));
                }
                Instr::SetUpField { hops, field } => {
                    let v = frame.pop()?.first();
                    let record = bound_capture(frame)?.ancestor(*hops as usize)?;
                    record.set(*field as usize, v);
                }
                Instr::Globals => frame.push(env.globals.clone()),

                // ---- invocation prologue ----
                Instr::NewCapture => {
                    let info = proto.capture.as_ref().ok_or_else(|| {
                        RuntimeError::Runtime("missing capture layout".into())
                    })?;
                    let parent = if info.store_parent {
                        frame.upcx.clone()
                    } else {
                        None
                    };
                    frame.capture = Some(CaptureState::new(info.fields.len(), parent));
                }
                Instr::Arg(i) => {
                    let v = frame.args.get(*i as usize);
                    frame.push(v);
                }
                Instr::ArgTail(i) => {
                    let rest = frame.args.tail(*i as usize);
                    frame.push(Value::Multi(rest));
                }

                // ---- scratch lists and multi-values ----
                Instr::NewList { slot, len } => {
                    frame.lists[*slot as usize] = vec![Value::Nil; *len as usize];
                }
                Instr::ListSet { slot, index } => {
                    let v = frame.pop()?;
                    frame.lists[*slot as usize][*index as usize] = v;
                }
                Instr::ListGet { slot, index } => {
                    let v = frame.lists[*slot as usize][*index as usize].clone();
                    frame.push(v);
                }
                Instr::NewMulti { slot } => {
                    let values = std::mem::take(&mut frame.lists[*slot as usize]);
                    frame.push(Value::Multi(MultiValue::new(values)));
                }
                Instr::MultiAt(i) => {
                    let v = frame.pop()?;
                    let element = match v {
                        Value::Multi(m) => m.get(*i as usize),
                        single if *i == 0 => single,
                        _ => Value::Nil,
                    };
                    frame.push(element);
                }

                // ---- tables ----
                Instr::NewTable => frame.push(env.runtime.new_table()),
                Instr::GetIndex => {
                    let key = frame.pop()?.first();
                    let container = frame.pop()?.first();
                    let v = env.runtime.get_index(&container, &key)?;
                    frame.push(v);
                }
                Instr::SetIndex => {
                    let value = frame.pop()?.first();
                    let key = frame.pop()?.first();
                    let container = frame.pop()?.first();
                    env.runtime.set_index(&container, key, value)?;
                }

                // ---- operators ----
                Instr::Bin(op) => {
                    let rhs = frame.pop()?.first();
                    let lhs = frame.pop()?.first();
                    let v = env.runtime.binary_op(*op, &lhs, &rhs)?;
                    frame.push(v);
                }
                Instr::Un(op) => {
                    let operand = frame.pop()?.first();
                    let v = env.runtime.unary_op(*op, &operand)?;
                    frame.push(v);
                }

                // ---- control flow ----
                Instr::Jump(t) => frame.pc = *t as usize,
                Instr::JumpIfFalse(t) => {
                    let v = frame.pop()?;
                    if !env.runtime.is_truthy(&v.first()) {
                        frame.pc = *t as usize;
                    }
                }
                Instr::JumpIfTruePeek(t) => {
                    if env.runtime.is_truthy(&frame.top()?.first()) {
                        frame.pc = *t as usize;
                    }
                }
                Instr::JumpIfFalsePeek(t) => {
                    if !env.runtime.is_truthy(&frame.top()?.first()) {
                        frame.pc = *t as usize;
                    }
                }

                // ---- numeric for ----
                Instr::CoerceNum => {
                    let v = frame.pop()?.first();
                    match env.runtime.to_number(&v) {
                        Some(n) => frame.push(Value::Number(n)),
                        None => {
                            return Err(RuntimeError::Runtime(
                                "loop control values must be numbers".into(),
                            ))
                        }
                    }
                }
                Instr::ForTest {
                    val,
                    limit,
                    step,
                    exit,
                } => {
                    let val = num_slot(frame, *val)?;
                    let limit = num_slot(frame, *limit)?;
                    let step = num_slot(frame, *step)?;
                    let cont = (step > 0.0 && val <= limit) || (step <= 0.0 && val >= limit);
                    if !cont {
                        frame.pc = *exit as usize;
                    }
                }
                Instr::ForIncr { val, step } => {
                    let next = num_slot(frame, *val)? + num_slot(frame, *step)?;
                    frame.locals[*val as usize] = Value::Number(next);
                }

                // ---- generic for ----
                Instr::IterBegin { slot } => {
                    let v = frame.pop()?;
                    let args = as_multi(v);
                    let resource = env.runtime.begin_generic_loop(env, args)?;
                    frame.iters.put(*slot as usize, resource);
                }
                Instr::IterNext { slot, exit } => {
                    let (iterator, state, control) = {
                        let resource = frame.iters.get_mut(*slot as usize).ok_or_else(|| {
                            RuntimeError::Runtime("generic-for resource missing".into())
                        })?;
                        (resource.iterator(), resource.state(), resource.control())
                    };
                    let call_args = MultiValue::from_values(vec![state, control]);
                    let result =
                        self.call_value(chunk, env, iterator, call_args, None, Vec::new())?;
                    if result.first().is_nil() {
                        frame.pc = *exit as usize;
                    } else {
                        if let Some(resource) = frame.iters.get_mut(*slot as usize) {
                            resource.set_control(result.first());
                        }
                        frame.push(Value::Multi(result));
                    }
                }
                Instr::IterEnd { slot } => {
                    if let Some(mut resource) = frame.iters.take(*slot as usize) {
                        resource.dispose();
                    }
                }

                // ---- functions ----
                Instr::MakeClosure(i) => {
                    let index = *i as usize;
                    let name = chunk.protos.get(index).and_then(|p| p.name.clone());
                    // bind this function's own record if it has one, the
                    // inherited one otherwise
                    let upcx = frame.capture.clone().or_else(|| frame.upcx.clone());
                    frame.push(Value::Function(Rc::new(LuaClosure {
                        proto: index,
                        upcx,
                        name,
                    })));
                }
                Instr::Call { method, tail } => {
                    if let Some(control) =
                        self.do_call(chunk, env, frame, *method, *tail, None, Vec::new())?
                    {
                        return Ok(control);
                    }
                }
                Instr::CallEx(site) => {
                    let site = proto.call_sites[*site as usize].clone();
                    let by_ref = site.by_ref.iter().map(|&i| i as usize).collect();
                    if let Some(control) = self.do_call(
                        chunk,
                        env,
                        frame,
                        site.method,
                        site.tail,
                        site.overload,
                        by_ref,
                    )? {
                        return Ok(control);
                    }
                }
                Instr::Return => {
                    let v = frame.pop()?;
                    return Ok(Control::Return(as_multi(v)));
                }
                Instr::ReturnEmpty => return Ok(Control::Return(MultiValue::empty())),
            }
        }
    }

    /// Pop receiver, callee, and arguments, then dispatch. Returns the tail
    /// continuation instead of calling when `tail` is set.
    #[allow(clippy::too_many_arguments)]
    fn do_call(
        &mut self,
        chunk: &Chunk,
        env: &Environment,
        frame: &mut Frame,
        method: bool,
        tail: bool,
        overload: Option<u32>,
        by_ref: Vec<usize>,
    ) -> Result<Option<Control>, RuntimeError> {
        let args_value = frame.pop()?;
        let callee = frame.pop()?.first();
        let receiver = frame.pop()?.first();
        let mut args = as_multi(args_value);
        if method {
            let mut with_receiver = Vec::with_capacity(args.len() + 1);
            with_receiver.push(receiver);
            with_receiver.extend(args.to_vec());
            args = MultiValue::from_values(with_receiver);
        }
        if tail {
            return Ok(Some(Control::Tail {
                callee,
                args,
                overload,
                by_ref,
            }));
        }
        let result = self.call_value(chunk, env, callee, args, overload, by_ref)?;
        frame.push(Value::Multi(result));
        Ok(None)
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

fn as_multi(value: Value) -> MultiValue {
    match value {
        Value::Multi(m) => m,
        single => MultiValue::from_values(vec![single]),
    }
}

fn num_slot(frame: &Frame, slot: u16) -> Result<f64, RuntimeError> {
    match frame.locals[slot as usize] {
        Value::Number(n) => Ok(n),
        _ => Err(RuntimeError::Runtime("corrupted loop control slot".into())),
    }
}

fn own_capture(frame: &Frame) -> Result<&Rc<CaptureState>, RuntimeError> {
    frame
        .capture
        .as_ref()
        .ok_or_else(|| RuntimeError::Runtime("missing capture record".into()))
}

fn bound_capture(frame: &Frame) -> Result<&Rc<CaptureState>, RuntimeError> {
    frame
        .upcx
        .as_ref()
        .ok_or_else(|| RuntimeError::Runtime("missing bound capture record".into()))
}
