// Prevent accidental debug output in library code; diagnostics go
// through the `log` facade.
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

//! Dual-mode interpreter for a compiled R-subset vector bytecode.
//!
//! Programs in a small vector scripting language (scalars, 1-indexed
//! vectors, functions, `if`/`while`) arrive here as a flat instruction
//! array and run through two interchangeable execution strategies over
//! one shared value lattice: a concrete interpreter that follows a
//! single path, and an abstract interpreter that computes a sound
//! fixpoint over every reachable program state. A hybrid runner couples
//! the two, cross-checking each concrete step against the fixpoint.

// Core modules
pub mod program;
pub mod vm;

// Rust API for programmatic use
pub mod api;
pub use api::{
    program_from_json, program_to_json, run_abstract, run_abstract_json, run_concrete,
    run_concrete_json, run_hybrid,
};

pub use program::{Program, ProgramBuilder};
pub use vm::{
    AbstractState, Analyzer, Arg, BuiltinId, Hybrid, Instr, Interp, Observation, State, Truth,
    Val, VmError,
};
