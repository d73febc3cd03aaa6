//! The fixed builtin set of the surface language.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::VmError;
use super::value::Val;

/// Builtins execute in place at the call site; control falls through
/// instead of transferring to a callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuiltinId {
    Get,
    Set,
    C,
    Add,
    Sub,
    Length,
}

impl BuiltinId {
    pub fn from_name(name: &str) -> Option<BuiltinId> {
        match name {
            "get" => Some(BuiltinId::Get),
            "set" => Some(BuiltinId::Set),
            "c" => Some(BuiltinId::C),
            "add" => Some(BuiltinId::Add),
            "sub" => Some(BuiltinId::Sub),
            "length" => Some(BuiltinId::Length),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinId::Get => "get",
            BuiltinId::Set => "set",
            BuiltinId::C => "c",
            BuiltinId::Add => "add",
            BuiltinId::Sub => "sub",
            BuiltinId::Length => "length",
        }
    }
}

impl fmt::Display for BuiltinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn arg(args: &[Val], i: usize, builtin: BuiltinId) -> Result<&Val, VmError> {
    args.get(i).ok_or_else(|| {
        VmError::Miscompilation(format!("{builtin} expects at least {} arguments", i + 1))
    })
}

/// Evaluate a builtin over marshalled operands. Shared by both execution
/// modes: operand handling follows the lattice, so concrete operands give
/// concrete results and abstract operands give sound approximations.
pub(crate) fn eval_builtin(builtin: BuiltinId, args: &[Val]) -> Result<Val, VmError> {
    match builtin {
        BuiltinId::Get => arg(args, 0, builtin)?.get_val(arg(args, 1, builtin)?),
        BuiltinId::Set => arg(args, 0, builtin)?.set_val(arg(args, 1, builtin)?, arg(args, 2, builtin)?),
        BuiltinId::C => Val::from_vals(args.to_vec()),
        BuiltinId::Add => Ok(arg(args, 0, builtin)?.add(arg(args, 1, builtin)?)),
        BuiltinId::Sub => Ok(arg(args, 0, builtin)?.sub(arg(args, 1, builtin)?)),
        BuiltinId::Length => Ok(arg(args, 0, builtin)?.size()),
    }
}
