//! The bytecode container: the instruction array plus the program's
//! designated entry and exit pcs, with structural validation, and a
//! builder mirroring the compiler's linearization contract.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::vm::builtins::BuiltinId;
use crate::vm::error::VmError;
use crate::vm::instr::{Arg, Instr};

// Placeholder for targets patched later; out of range for any real program.
const UNRESOLVED: usize = usize::MAX;

/// A compiled program. `entry`/`exit` point at `main`'s `Entry`/`Exit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub code: Vec<Instr>,
    pub entry: usize,
    pub exit: usize,
}

impl Program {
    /// Wrap and validate an externally compiled instruction array.
    pub fn new(code: Vec<Instr>, entry: usize, exit: usize) -> Result<Program, VmError> {
        let prog = Program { code, entry, exit };
        prog.validate()?;
        Ok(prog)
    }

    /// Check the structural invariants the interpreters rely on: entry and
    /// exit name-matched, every call resolved to a matching `Entry`, one
    /// `Exit` per function, all jump targets in range.
    pub fn validate(&self) -> Result<(), VmError> {
        let err = |msg: String| Err(VmError::Miscompilation(msg));
        if self.code.is_empty() {
            return err("empty instruction array".into());
        }
        let main = match self.code.get(self.entry) {
            Some(Instr::Entry(name)) => name.clone(),
            _ => return err(format!("entry pc {} is not an entry instruction", self.entry)),
        };
        match self.code.get(self.exit) {
            Some(Instr::Exit(name)) if *name == main => {}
            _ => {
                return err(format!(
                    "exit pc {} is not the exit of `{main}`",
                    self.exit
                ))
            }
        }
        let mut entries: HashMap<&str, usize> = HashMap::new();
        let mut exits: HashMap<&str, usize> = HashMap::new();
        for (pc, instr) in self.code.iter().enumerate() {
            match instr {
                Instr::Entry(name) => {
                    if entries.insert(name, pc).is_some() {
                        return err(format!("function `{name}` defined twice"));
                    }
                }
                Instr::Exit(name) => {
                    if exits.insert(name, pc).is_some() {
                        return err(format!("function `{name}` has two exits"));
                    }
                }
                _ => {}
            }
        }
        for name in entries.keys() {
            if !exits.contains_key(name) {
                return err(format!("function `{name}` has no exit"));
            }
        }
        for name in exits.keys() {
            if !entries.contains_key(name) {
                return err(format!("exit of `{name}` has no matching entry"));
            }
        }
        for (pc, instr) in self.code.iter().enumerate() {
            match instr {
                Instr::Call { name, entry_pc, .. } => match self.code.get(*entry_pc) {
                    Some(Instr::Entry(n)) if n == name => {}
                    _ => {
                        return err(format!(
                            "call to `{name}` at pc {pc} has an unresolved entry"
                        ))
                    }
                },
                Instr::Jump(target) => {
                    if *target >= self.code.len() {
                        return err(format!("jump target {target} at pc {pc} out of range"));
                    }
                }
                Instr::Branch { else_target, .. } => {
                    if *else_target >= self.code.len() {
                        return err(format!(
                            "branch target {else_target} at pc {pc} out of range"
                        ));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Render a listing, one instruction per line.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (pc, instr) in self.code.iter().enumerate() {
            let _ = writeln!(out, "{pc:>4}  {instr}");
        }
        out
    }
}

/// Assembles instruction arrays the way the surface compiler emits them:
/// instructions appended in order, branch targets patched once the join
/// point is known, call entry pcs resolved by function name at [`build`].
///
/// [`build`]: ProgramBuilder::build
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    code: Vec<Instr>,
    current: Option<String>,
}

impl ProgramBuilder {
    pub fn new() -> ProgramBuilder {
        ProgramBuilder::default()
    }

    /// The pc the next emitted instruction will occupy.
    pub fn here(&self) -> usize {
        self.code.len()
    }

    /// Open a function: emits its `Entry` and returns its pc.
    pub fn begin_function(&mut self, name: &str) -> usize {
        let pc = self.here();
        self.code.push(Instr::Entry(name.to_string()));
        self.current = Some(name.to_string());
        pc
    }

    /// Close the current function: emits its `Exit`.
    pub fn end_function(&mut self) {
        if let Some(name) = self.current.take() {
            self.code.push(Instr::Exit(name));
        }
    }

    /// `target <- name(args)`. Builtin names dispatch in place; anything
    /// else becomes a user call resolved at [`build`].
    ///
    /// [`build`]: ProgramBuilder::build
    pub fn call(&mut self, target: usize, name: &str, args: Vec<Arg>) {
        match BuiltinId::from_name(name) {
            Some(builtin) => self.code.push(Instr::CallBuiltin {
                target,
                builtin,
                args,
            }),
            None => self.code.push(Instr::Call {
                target,
                name: name.to_string(),
                args,
                entry_pc: UNRESOLVED,
            }),
        }
    }

    pub fn nop(&mut self) {
        self.code.push(Instr::Nop);
    }

    pub fn merge(&mut self) {
        self.code.push(Instr::Merge);
    }

    pub fn jump(&mut self, target: usize) {
        self.code.push(Instr::Jump(target));
    }

    /// Emit a branch whose else-target is not yet known; returns its pc
    /// for a later [`patch_branch`].
    ///
    /// [`patch_branch`]: ProgramBuilder::patch_branch
    pub fn branch_hole(&mut self, guard: usize) -> usize {
        let pc = self.here();
        self.code.push(Instr::Branch {
            guard,
            else_target: UNRESOLVED,
        });
        pc
    }

    pub fn patch_branch(&mut self, hole: usize, else_target: usize) {
        if let Some(Instr::Branch { else_target: t, .. }) = self.code.get_mut(hole) {
            *t = else_target;
        }
    }

    /// Resolve call entries by function name, locate `main`, and validate.
    pub fn build(mut self) -> Result<Program, VmError> {
        let mut entries: HashMap<String, usize> = HashMap::new();
        let mut exits: HashMap<String, usize> = HashMap::new();
        for (pc, instr) in self.code.iter().enumerate() {
            match instr {
                Instr::Entry(name) => {
                    entries.insert(name.clone(), pc);
                }
                Instr::Exit(name) => {
                    exits.insert(name.clone(), pc);
                }
                _ => {}
            }
        }
        for instr in &mut self.code {
            if let Instr::Call { name, entry_pc, .. } = instr {
                match entries.get(name) {
                    Some(pc) => *entry_pc = *pc,
                    None => return Err(VmError::UnknownBuiltin(name.clone())),
                }
            }
        }
        let entry = *entries
            .get("main")
            .ok_or_else(|| VmError::Miscompilation("program has no main function".into()))?;
        let exit = *exits
            .get("main")
            .ok_or_else(|| VmError::Miscompilation("main has no exit".into()))?;
        Program::new(self.code, entry, exit)
    }
}
