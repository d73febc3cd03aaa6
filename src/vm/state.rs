//! The execution-state contract shared by both interpreters, and the
//! single instruction dispatch that drives any implementation of it.

use super::builtins::eval_builtin;
use super::error::VmError;
use super::instr::{Arg, Instr};
use super::value::{Truth, Val};

/// Computational state as seen by one instruction step.
///
/// The contract is deliberately narrow: seven operations, each consuming
/// the state and returning its successor, so the same [`step`] drives the
/// concrete frame stack and the abstract per-pc environments alike.
pub trait State: Sized {
    /// Program counter of the active frame (or program point).
    fn pc(&self) -> usize;

    /// Last value assigned in the active frame; Bottom before any write.
    fn last(&self) -> Val;

    /// Value of register `reg`; Bottom when the register was never written.
    fn get_register(&self, reg: usize) -> Val;

    /// Write `value` into register `reg`.
    fn set(self, reg: usize, value: Val) -> Result<Self, VmError>;

    /// Enter the function whose `Entry` sits at `entry_pc`, its parameter
    /// registers holding `args`.
    fn push(self, entry_pc: usize, args: Vec<Val>) -> Result<Self, VmError>;

    /// Leave the current function, handing `ret` back to the call site(s).
    fn pop(self, ret: Val) -> Result<Self, VmError>;

    /// Continue at the given successor pc(s). Concrete states accept
    /// exactly one successor; abstract states merge into all of them.
    fn next(self, pcs: &[usize]) -> Result<Self, VmError>;
}

/// Resolve call operands: registers are read from the state, literals
/// pass through.
pub(crate) fn marshal<S: State>(st: &S, args: &[Arg]) -> Vec<Val> {
    args.iter()
        .map(|a| match a {
            Arg::Reg(r) => st.get_register(*r),
            Arg::Lit(v) => v.clone(),
        })
        .collect()
}

/// Execute the instruction at the state's pc and return the successor
/// state. This is the whole per-variant semantics; both interpreters
/// differ only in their [`State`] implementation.
pub(crate) fn step<S: State>(code: &[Instr], st: S) -> Result<S, VmError> {
    let pc = st.pc();
    let instr = code
        .get(pc)
        .ok_or_else(|| VmError::Miscompilation(format!("pc {pc} outside the instruction array")))?;
    match instr {
        Instr::Nop | Instr::Merge | Instr::Entry(_) => st.next(&[pc + 1]),
        Instr::Exit(_) => {
            let ret = st.last();
            st.pop(ret)
        }
        Instr::Jump(target) => st.next(&[*target]),
        Instr::Branch { guard, else_target } => {
            let first = st.get_register(*guard).first()?;
            match first.eq_val(&Val::num(0)) {
                Truth::Yes => st.next(&[*else_target]),
                Truth::No => st.next(&[pc + 1]),
                Truth::Maybe => st.next(&[pc + 1, *else_target]),
            }
        }
        Instr::Call { args, entry_pc, .. } => {
            let vals = marshal(&st, args);
            st.push(*entry_pc, vals)
        }
        Instr::CallBuiltin {
            target,
            builtin,
            args,
        } => {
            let vals = marshal(&st, args);
            let result = eval_builtin(*builtin, &vals)?;
            st.set(*target, result)?.next(&[pc + 1])
        }
    }
}
