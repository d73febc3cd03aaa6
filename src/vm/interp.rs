//! The concrete interpreter: drives one program path to completion.

use log::trace;

use super::error::VmError;
use super::frame::ConcreteState;
use super::state::{step, State};
use super::value::Val;
use crate::program::Program;

/// Executes a program from its entry pc until its exit pc and returns the
/// final value, the last value assigned in the main frame.
#[derive(Debug)]
pub struct Interp<'p> {
    prog: &'p Program,
    max_steps: Option<usize>,
}

impl<'p> Interp<'p> {
    pub fn new(prog: &'p Program) -> Interp<'p> {
        Interp {
            prog,
            max_steps: None,
        }
    }

    /// Abort with [`VmError::StepLimitExceeded`] after `limit` instruction
    /// steps. Off by default.
    pub fn with_max_steps(mut self, limit: usize) -> Interp<'p> {
        self.max_steps = Some(limit);
        self
    }

    pub fn run(&self) -> Result<Val, VmError> {
        let mut st = ConcreteState::new(&self.prog.code, self.prog.entry);
        let mut steps = 0usize;
        while st.pc() != self.prog.exit {
            if let Some(limit) = self.max_steps {
                if steps >= limit {
                    return Err(VmError::StepLimitExceeded { limit });
                }
            }
            if let Some(instr) = self.prog.code.get(st.pc()) {
                trace!("{:>4}  {:<20} {}", st.pc(), instr.to_string(), st);
            }
            st = step(&self.prog.code, st)?;
            steps += 1;
        }
        Ok(st.last())
    }
}
