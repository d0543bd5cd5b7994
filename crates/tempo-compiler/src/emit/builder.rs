//! Code under construction.
//!
//! A [`CodeBuilder`] exists for every open body: the unit's main code, each
//! function, each class initializer and each spawned body. It owns the
//! frame and the pending branch lists of that body, so nested bodies never
//! see each other's state.

use tempo_core::{CompilationError, TypeHash};

use super::jumps::JumpManager;
use super::labels::LabelTable;
use crate::bytecode::{Code, CodeFlags, Extra, Instr};
use crate::frame::Frame;
use crate::pending::PendingBranches;

type Result<T> = std::result::Result<T, CompilationError>;

/// What a function body needs to know about itself.
#[derive(Debug, Clone)]
pub struct FuncContext {
    /// Function identity (specialization key for template instances).
    pub hash: TypeHash,
    /// Hash of the definition, compared against callees for tail calls.
    pub def_hash: TypeHash,
    /// Source name.
    pub name: String,
    /// Parameter slots as `(offset, size)`, in declaration order.
    pub params: Vec<(u32, u32)>,
    /// First instruction of the body proper, the tail-call target.
    pub entry: usize,
    /// Frame depth of the function scope.
    pub body_depth: usize,
    /// Return value size.
    pub ret_size: u32,
    /// Concrete type arguments when emitting a specialization.
    pub template_args: Vec<TypeHash>,
    /// Slot 0 holds a receiver.
    pub is_member: bool,
    /// Vararg slot, for variadic functions.
    pub vararg_slot: Option<u32>,
}

/// An open code body.
#[derive(Debug)]
pub struct CodeBuilder {
    name: String,
    instrs: Vec<Instr>,
    /// Slot layout.
    pub frame: Frame,
    /// Open loops and switches.
    pub jumps: JumpManager,
    /// Jump labels.
    pub labels: LabelTable,
    /// Pending `return` jumps to the epilogue.
    pub returns: PendingBranches,
    /// Flags for the finished code.
    pub flags: CodeFlags,
    /// Bytes expected on entry.
    pub stack_depth: u32,
    /// Set while emitting a function body.
    pub func: Option<FuncContext>,
    line: u32,
}

impl CodeBuilder {
    /// Open a body.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instrs: Vec::new(),
            frame: Frame::new(),
            jumps: JumpManager::new(),
            labels: LabelTable::new(),
            returns: PendingBranches::new(),
            flags: CodeFlags::empty(),
            stack_depth: 0,
            func: None,
            line: 0,
        }
    }

    /// Name of the code.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the source line attached to following instructions.
    pub fn set_line(&mut self, line: u32) {
        self.line = line;
    }

    /// Append an instruction and return its pc.
    pub fn emit(&mut self, mut instr: Instr) -> usize {
        instr.line = self.line;
        self.instrs.push(instr);
        self.instrs.len() - 1
    }

    /// Index the next instruction will get.
    pub fn pc(&self) -> usize {
        self.instrs.len()
    }

    /// Instructions so far.
    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    fn at(&mut self, pc: usize) -> Result<&mut Instr> {
        let len = self.instrs.len();
        self.instrs
            .get_mut(pc)
            .ok_or_else(|| CompilationError::internal(format!("patch at {pc} past end {len}")))
    }

    /// Write a jump target into the branch at `pc`.
    pub fn patch(&mut self, pc: usize, target: usize) -> Result<()> {
        let instr = self.at(pc)?;
        if !instr.op.is_branch() {
            return Err(CompilationError::internal(format!(
                "patch target of non-branch {} at {pc}",
                instr.op
            )));
        }
        instr.val = target as u64;
        Ok(())
    }

    /// Rewrite the second operand word at `pc`.
    pub fn patch_val2(&mut self, pc: usize, val2: u64) -> Result<()> {
        self.at(pc)?.val2 = val2;
        Ok(())
    }

    /// Attach or replace the auxiliary operand at `pc`.
    pub fn patch_extra(&mut self, pc: usize, extra: Extra) -> Result<()> {
        self.at(pc)?.extra = Some(extra);
        Ok(())
    }

    /// Resolve every pending `return` to the current pc.
    pub fn resolve_returns(&mut self) -> Result<()> {
        let target = self.pc();
        let patches: Vec<_> = self.returns.drain_to(target).collect();
        for (pc, target) in patches {
            self.patch(pc, target)?;
        }
        Ok(())
    }

    /// Seal the body into finished code.
    pub fn finish(self) -> Result<Code> {
        if !self.returns.is_empty() {
            return Err(CompilationError::internal(format!(
                "{} unresolved return jumps in '{}'",
                self.returns.len(),
                self.name
            )));
        }
        if self.jumps.in_breakable() {
            return Err(CompilationError::internal(format!(
                "open loop or switch at end of '{}'",
                self.name
            )));
        }
        self.labels.finish()?;
        if self.frame.depth() != 0 {
            return Err(CompilationError::internal(format!(
                "{} open scopes at end of '{}'",
                self.frame.depth(),
                self.name
            )));
        }
        Ok(Code {
            name: self.name,
            instrs: self.instrs,
            frame_size: self.frame.size(),
            stack_depth: self.stack_depth,
            flags: self.flags,
            native: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::OpCode;

    #[test]
    fn emit_tags_lines() {
        let mut builder = CodeBuilder::new("f");
        builder.set_line(4);
        let pc = builder.emit(Instr::new(OpCode::RegPushImm).with(1, 8));
        assert_eq!(pc, 0);
        assert_eq!(builder.instrs()[0].line, 4);
        assert_eq!(builder.pc(), 1);
    }

    #[test]
    fn patch_rejects_non_branch() {
        let mut builder = CodeBuilder::new("f");
        builder.emit(Instr::new(OpCode::RegPop).with(8, 0));
        assert!(builder.patch(0, 3).is_err());
        assert!(builder.patch(7, 3).is_err());
    }

    #[test]
    fn returns_resolve_to_epilogue() {
        let mut builder = CodeBuilder::new("f");
        let pc = builder.emit(Instr::new(OpCode::Goto));
        builder.returns.push(pc);
        builder.emit(Instr::new(OpCode::RegPop).with(8, 0));
        builder.resolve_returns().unwrap();
        builder.emit(Instr::new(OpCode::FuncReturn));

        let code = builder.finish().unwrap();
        assert_eq!(code.instrs[0].val, 2);
    }

    #[test]
    fn finish_with_pending_return_fails() {
        let mut builder = CodeBuilder::new("f");
        let pc = builder.emit(Instr::new(OpCode::Goto));
        builder.returns.push(pc);
        assert!(matches!(
            builder.finish(),
            Err(CompilationError::Internal { .. })
        ));
    }

    #[test]
    fn frame_size_is_high_water() {
        let mut builder = CodeBuilder::new("f");
        builder.frame.enter_scope();
        builder.frame.allocate(16, false);
        builder.frame.exit_scope();
        let code = builder.finish().unwrap();
        assert_eq!(code.frame_size, 16);
    }
}
