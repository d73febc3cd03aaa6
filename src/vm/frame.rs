//! Concrete execution state: an explicit stack of register frames.

use std::fmt;

use super::error::VmError;
use super::instr::Instr;
use super::state::State;
use super::value::Val;

/// One activation record.
#[derive(Debug, Clone, PartialEq)]
struct Frame {
    pc: usize,
    regs: Vec<Val>,
    last: Val,
}

impl Frame {
    fn new(pc: usize, args: Vec<Val>) -> Frame {
        Frame {
            pc,
            regs: args,
            last: Val::bottom(),
        }
    }

    fn get(&self, reg: usize) -> Val {
        self.regs.get(reg).cloned().unwrap_or_else(Val::bottom)
    }

    fn set(&mut self, reg: usize, value: Val) {
        if reg >= self.regs.len() {
            self.regs.resize(reg + 1, Val::bottom());
        }
        self.last = value.clone();
        self.regs[reg] = value;
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in self.regs.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{i}={v}")?;
        }
        f.write_str("]")
    }
}

/// The concrete machine state: a stack of frames over a shared program.
/// The base frame is never popped; reaching the program exit ends the run
/// with the stack height at one.
#[derive(Debug, Clone)]
pub(crate) struct ConcreteState<'p> {
    code: &'p [Instr],
    stack: Vec<Frame>,
}

impl<'p> ConcreteState<'p> {
    pub(crate) fn new(code: &'p [Instr], entry_pc: usize) -> ConcreteState<'p> {
        ConcreteState {
            code,
            stack: vec![Frame::new(entry_pc, Vec::new())],
        }
    }

    // The stack is never empty: `pop` refuses to drop past the base frame.
    fn top(&self) -> &Frame {
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Frame {
        let i = self.stack.len() - 1;
        &mut self.stack[i]
    }

    /// Registers of the active frame.
    pub(crate) fn registers(&self) -> &[Val] {
        &self.top().regs
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl State for ConcreteState<'_> {
    fn pc(&self) -> usize {
        self.top().pc
    }

    fn last(&self) -> Val {
        self.top().last.clone()
    }

    fn get_register(&self, reg: usize) -> Val {
        self.top().get(reg)
    }

    fn set(mut self, reg: usize, value: Val) -> Result<Self, VmError> {
        if !value.is_concrete() {
            return Err(VmError::NotConcrete(value.to_string()));
        }
        self.top_mut().set(reg, value);
        Ok(self)
    }

    fn push(mut self, entry_pc: usize, args: Vec<Val>) -> Result<Self, VmError> {
        for v in &args {
            if !v.is_concrete() {
                return Err(VmError::NotConcrete(v.to_string()));
            }
        }
        self.stack.push(Frame::new(entry_pc, args));
        Ok(self)
    }

    fn pop(mut self, ret: Val) -> Result<Self, VmError> {
        self.stack.pop();
        let caller = self
            .stack
            .last()
            .ok_or_else(|| VmError::Miscompilation("return past the base frame".into()))?;
        let caller_pc = caller.pc;
        match self.code.get(caller_pc) {
            Some(Instr::Call { target, .. }) => {
                let target = *target;
                let mut st = self.set(target, ret)?;
                st.top_mut().pc = caller_pc + 1;
                Ok(st)
            }
            _ => Err(VmError::Miscompilation(format!(
                "pc {caller_pc}: return into a non-call instruction"
            ))),
        }
    }

    fn next(mut self, pcs: &[usize]) -> Result<Self, VmError> {
        match pcs {
            [pc] => {
                self.top_mut().pc = *pc;
                Ok(self)
            }
            _ => Err(VmError::MultipleTargets { pc: self.pc() }),
        }
    }
}

impl fmt::Display for ConcreteState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} depth={}", self.top(), self.stack.len())
    }
}
