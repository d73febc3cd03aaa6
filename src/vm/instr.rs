//! The closed instruction set of the bytecode language.
//!
//! One instruction array, indexed by a dense program counter, is shared
//! read-only by every execution. Per-variant semantics live in
//! [`super::state::step`], which pattern-matches exhaustively so adding a
//! variant is a compile error until both interpreters handle it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::builtins::BuiltinId;
use super::value::Val;

/// A call operand: a register reference resolved at execution time, or a
/// literal passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arg {
    Reg(usize),
    Lit(Val),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Reg(r) => write!(f, "@{r}"),
            Arg::Lit(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instr {
    /// Fall through to pc+1.
    Nop,
    /// Same as `Nop`; marks a control-flow join point.
    Merge,
    /// First instruction of a function; merge target for all its callers.
    Entry(String),
    /// Last instruction of a function; hands the frame's last assigned
    /// value back to the caller(s).
    Exit(String),
    /// Call a user-defined function. `entry_pc` points at the matching
    /// `Entry` and is resolved before execution.
    Call {
        target: usize,
        name: String,
        args: Vec<Arg>,
        entry_pc: usize,
    },
    /// Call one of the fixed builtins in place; control falls through.
    CallBuiltin {
        target: usize,
        builtin: BuiltinId,
        args: Vec<Arg>,
    },
    /// Unconditional transfer.
    Jump(usize),
    /// Transfer to `else_target` when the guard register's first element
    /// is zero, fall through otherwise.
    Branch { guard: usize, else_target: usize },
}

fn write_call(
    f: &mut fmt::Formatter<'_>,
    target: usize,
    name: &str,
    args: &[Arg],
) -> fmt::Result {
    write!(f, "r{target} <- {name}(")?;
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{a}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Nop => f.write_str("nop"),
            Instr::Merge => f.write_str("merge"),
            Instr::Entry(name) => write!(f, "enter_{name}"),
            Instr::Exit(name) => write!(f, "exit_{name}"),
            Instr::Call {
                target, name, args, ..
            } => write_call(f, *target, name, args),
            Instr::CallBuiltin {
                target,
                builtin,
                args,
            } => write_call(f, *target, builtin.name(), args),
            Instr::Jump(pc) => write!(f, "jmp {pc}"),
            Instr::Branch { guard, else_target } => {
                write!(f, "if @{guard} goto {else_target}")
            }
        }
    }
}
