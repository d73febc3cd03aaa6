//! The virtual machine: the value lattice, the instruction set, and the
//! three execution modes built over one shared [`State`] contract.

pub mod analysis;
pub mod builtins;
pub mod error;
mod frame;
pub mod hybrid;
pub mod instr;
pub mod interp;
mod state;
pub mod value;

pub use analysis::{AbstractState, Analyzer};
pub use builtins::BuiltinId;
pub use error::VmError;
pub use hybrid::{Hybrid, Observation};
pub use instr::{Arg, Instr};
pub use interp::Interp;
pub use state::State;
pub use value::{Const, Range, Truth, Ty, Val};
