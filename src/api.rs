//! Ergonomic entry points for embedding the interpreters.

use crate::program::Program;
use crate::vm::analysis::{AbstractState, Analyzer};
use crate::vm::error::VmError;
use crate::vm::hybrid::{Hybrid, Observation};
use crate::vm::interp::Interp;
use crate::vm::value::Val;

/// Run the concrete interpreter over a validated program and return the
/// final value.
pub fn run_concrete(prog: &Program) -> Result<Val, VmError> {
    Interp::new(prog).run()
}

/// Compute the abstract fixpoint: one sound state per instruction.
pub fn run_abstract(prog: &Program) -> Result<Vec<AbstractState>, VmError> {
    let mut analyzer = Analyzer::new(prog);
    analyzer.analyze()?;
    Ok(analyzer.states().to_vec())
}

/// Run concretely while cross-checking each step against the fixpoint.
pub fn run_hybrid(prog: &Program) -> Result<(Val, Vec<Observation>), VmError> {
    let mut hybrid = Hybrid::new(prog);
    hybrid.run()
}

/// Serialize a program to the JSON bytecode format.
pub fn program_to_json(prog: &Program) -> Result<String, String> {
    serde_json::to_string_pretty(prog).map_err(|e| format!("serialization error: {e}"))
}

/// Load a program from the JSON bytecode format, revalidating it.
pub fn program_from_json(json: &str) -> Result<Program, String> {
    let prog: Program =
        serde_json::from_str(json).map_err(|e| format!("parse error: {e}"))?;
    prog.validate().map_err(|e| format!("invalid program: {e}"))?;
    Ok(prog)
}

/// Parse JSON bytecode and run it with the concrete interpreter.
pub fn run_concrete_json(json: &str) -> Result<Val, String> {
    let prog = program_from_json(json)?;
    run_concrete(&prog).map_err(|e| format!("runtime error: {e}"))
}

/// Parse JSON bytecode and analyze it to fixpoint.
pub fn run_abstract_json(json: &str) -> Result<Vec<AbstractState>, String> {
    let prog = program_from_json(json)?;
    run_abstract(&prog).map_err(|e| format!("analysis error: {e}"))
}
