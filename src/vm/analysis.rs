//! The abstract interpreter: a worklist fixpoint over per-pc merged states.
//!
//! One [`AbstractState`] per instruction, all starting at Bottom. A sweep
//! visits every reachable pc at most once, merging each instruction's
//! effect into its successors; sweeps repeat until the whole array stops
//! changing. Termination follows from merge being a monotone, idempotent
//! join over a finite-height lattice.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::error::VmError;
use super::instr::Instr;
use super::state::{step, State};
use super::value::Val;
use crate::program::Program;

/// The merged register environment observed at one program point.
///
/// There is no call stack: callers of a function are correlated only by
/// name, so one state per pc is the whole analysis domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbstractState {
    pc: usize,
    regs: Vec<Val>,
    last: Val,
}

impl AbstractState {
    fn bottom(pc: usize) -> AbstractState {
        AbstractState {
            pc,
            regs: Vec::new(),
            last: Val::bottom(),
        }
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Value of register `reg`; Bottom when nothing has merged into it yet.
    pub fn reg(&self, reg: usize) -> Val {
        self.regs.get(reg).cloned().unwrap_or_else(Val::bottom)
    }

    /// Last value assigned on any path reaching this point.
    pub fn last(&self) -> &Val {
        &self.last
    }

    fn assign(&mut self, reg: usize, value: Val) {
        if reg >= self.regs.len() {
            self.regs.resize(reg + 1, Val::bottom());
        }
        self.last = value.clone();
        self.regs[reg] = value;
    }

    /// Pointwise join; the result covers both inputs. Keeps the receiver's
    /// pc.
    pub fn merge(&self, other: &AbstractState) -> AbstractState {
        let n = self.regs.len().max(other.regs.len());
        AbstractState {
            pc: self.pc,
            regs: (0..n).map(|i| self.reg(i).merge(&other.reg(i))).collect(),
            last: self.last.merge(&other.last),
        }
    }

    /// Soundness check: does this state already cover every given concrete
    /// register value?
    pub fn covers(&self, regs: &[Val]) -> bool {
        regs.iter().enumerate().all(|(i, v)| {
            let a = self.reg(i);
            a.merge(v) == a
        })
    }
}

impl fmt::Display for AbstractState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in self.regs.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{i}={v}")?;
        }
        write!(f, "] last={}", self.last)
    }
}

/// Worklist fixpoint driver over a program's abstract states.
#[derive(Debug)]
pub struct Analyzer<'p> {
    prog: &'p Program,
    astates: Vec<AbstractState>,
    worklist: VecDeque<usize>,
    seen: HashSet<usize>,
    max_sweeps: Option<usize>,
}

impl<'p> Analyzer<'p> {
    pub fn new(prog: &'p Program) -> Analyzer<'p> {
        Analyzer {
            prog,
            astates: (0..prog.code.len()).map(AbstractState::bottom).collect(),
            worklist: VecDeque::new(),
            seen: HashSet::new(),
            max_sweeps: None,
        }
    }

    /// Abort with [`VmError::SweepLimitExceeded`] when a fixpoint has not
    /// been reached after `limit` sweeps. Off by default.
    pub fn with_max_sweeps(mut self, limit: usize) -> Analyzer<'p> {
        self.max_sweeps = Some(limit);
        self
    }

    /// Run sweeps until the state array stops changing.
    pub fn analyze(&mut self) -> Result<(), VmError> {
        let mut sweeps = 0usize;
        loop {
            if let Some(limit) = self.max_sweeps {
                if sweeps >= limit {
                    return Err(VmError::SweepLimitExceeded { limit });
                }
            }
            let before = self.astates.clone();
            self.sweep()?;
            sweeps += 1;
            if self.astates == before {
                debug!("fixpoint after {sweeps} sweep(s)");
                return Ok(());
            }
        }
    }

    fn sweep(&mut self) -> Result<(), VmError> {
        // seen is sweep-scoped; the state array persists across sweeps
        self.seen.clear();
        // seeding merges Bottom into the entry, which is just scheduling it
        self.schedule(self.prog.entry);
        while let Some(pc) = self.worklist.pop_front() {
            trace!("{:>4}  {:<20} {}", pc, self.prog.code[pc].to_string(), self.astates[pc]);
            self.transfer(pc)?;
        }
        Ok(())
    }

    /// Execute the instruction at `pc` against its current state, merging
    /// the effects into the successor states, and return the transformed
    /// state itself. Idempotent once the fixpoint is reached.
    pub(crate) fn transfer(&mut self, pc: usize) -> Result<AbstractState, VmError> {
        let scratch = self.astates[pc].clone();
        let prog = self.prog;
        let out = step(
            &prog.code,
            Transfer {
                an: self,
                state: scratch,
            },
        )?;
        Ok(out.state)
    }

    fn schedule(&mut self, pc: usize) {
        // a successor past the final instruction has no state to update
        if pc >= self.prog.code.len() {
            return;
        }
        if self.seen.insert(pc) {
            self.worklist.push_back(pc);
        }
    }

    fn merge_into(&mut self, pc: usize, st: &AbstractState) {
        if let Some(slot) = self.astates.get_mut(pc) {
            *slot = slot.merge(st);
        }
    }

    /// Per-pc states computed so far; a sound fixpoint once [`analyze`]
    /// has returned successfully.
    ///
    /// [`analyze`]: Analyzer::analyze
    pub fn states(&self) -> &[AbstractState] {
        &self.astates
    }

    /// State at one pc, or `None` outside the instruction array.
    pub fn state_at(&self, pc: usize) -> Option<&AbstractState> {
        self.astates.get(pc)
    }
}

/// Adapter implementing the state contract for the analyzer: successor
/// effects merge into the per-pc array and schedule work instead of
/// moving a program counter.
struct Transfer<'a, 'p> {
    an: &'a mut Analyzer<'p>,
    state: AbstractState,
}

impl State for Transfer<'_, '_> {
    fn pc(&self) -> usize {
        self.state.pc
    }

    fn last(&self) -> Val {
        self.state.last.clone()
    }

    fn get_register(&self, reg: usize) -> Val {
        self.state.reg(reg)
    }

    fn set(mut self, reg: usize, value: Val) -> Result<Self, VmError> {
        self.state.assign(reg, value);
        Ok(self)
    }

    fn push(self, entry_pc: usize, args: Vec<Val>) -> Result<Self, VmError> {
        // context-insensitive: every call site joins its arguments into
        // the callee's entry state
        let entry = AbstractState {
            pc: entry_pc,
            regs: args,
            last: Val::bottom(),
        };
        self.an.merge_into(entry_pc, &entry);
        self.an.schedule(entry_pc);
        Ok(self)
    }

    fn pop(self, ret: Val) -> Result<Self, VmError> {
        let pc = self.state.pc;
        let name = match self.an.prog.code.get(pc) {
            Some(Instr::Exit(name)) => name.clone(),
            _ => {
                return Err(VmError::Miscompilation(format!(
                    "pc {pc}: return outside an exit instruction"
                )))
            }
        };
        // correlation is by name only: one exit feeds the successor of
        // every call site naming this function
        let prog = self.an.prog;
        for (site, instr) in prog.code.iter().enumerate() {
            if let Instr::Call {
                target,
                name: callee,
                ..
            } = instr
            {
                if *callee == name {
                    let mut succ = self.an.astates[site].clone();
                    succ.pc = site + 1;
                    succ.assign(*target, ret.clone());
                    self.an.merge_into(site + 1, &succ);
                    self.an.schedule(site + 1);
                }
            }
        }
        Ok(self)
    }

    fn next(self, pcs: &[usize]) -> Result<Self, VmError> {
        for &pc in pcs {
            let mut succ = self.state.clone();
            succ.pc = pc;
            self.an.merge_into(pc, &succ);
            self.an.schedule(pc);
        }
        Ok(self)
    }
}
