//! Dynamic execution: a concrete run cross-checked against the fixpoint.

use log::debug;

use super::analysis::{AbstractState, Analyzer};
use super::error::VmError;
use super::frame::ConcreteState;
use super::instr::Instr;
use super::state::{step, State};
use super::value::Val;
use crate::program::Program;

/// One cross-check record: the instruction executed concretely at `pc`,
/// the abstract successor obtained by replaying it against the fixpoint
/// state, and whether that state covers the concrete registers.
#[derive(Debug, Clone)]
pub struct Observation {
    pub pc: usize,
    pub instr: Instr,
    pub abstract_out: AbstractState,
    pub covered: bool,
}

/// Couples the two interpreters. Purely diagnostic: control flow belongs
/// to the concrete interpreter alone, and replaying instructions against
/// the fixpoint cannot change it because merge is idempotent there.
#[derive(Debug)]
pub struct Hybrid<'p> {
    prog: &'p Program,
    analyzer: Analyzer<'p>,
}

impl<'p> Hybrid<'p> {
    pub fn new(prog: &'p Program) -> Hybrid<'p> {
        Hybrid {
            prog,
            analyzer: Analyzer::new(prog),
        }
    }

    /// Analyze to fixpoint, then run concretely, observing every step.
    pub fn run(&mut self) -> Result<(Val, Vec<Observation>), VmError> {
        self.analyzer.analyze()?;
        let mut st = ConcreteState::new(&self.prog.code, self.prog.entry);
        let mut observations = Vec::new();
        while st.pc() != self.prog.exit {
            let pc = st.pc();
            let instr = self
                .prog
                .code
                .get(pc)
                .cloned()
                .ok_or_else(|| {
                    VmError::Miscompilation(format!("pc {pc} outside the instruction array"))
                })?;
            let covered = self
                .analyzer
                .state_at(pc)
                .is_some_and(|astate| astate.covers(st.registers()));
            let abstract_out = self.analyzer.transfer(pc)?;
            debug!(
                "{:>4}  {:<20} concrete {}  abstract {}",
                pc,
                instr.to_string(),
                st,
                abstract_out
            );
            observations.push(Observation {
                pc,
                instr,
                abstract_out,
                covered,
            });
            st = step(&self.prog.code, st)?;
        }
        Ok((st.last(), observations))
    }

    /// The fixpoint states backing the observations.
    pub fn analyzer(&self) -> &Analyzer<'p> {
        &self.analyzer
    }
}
