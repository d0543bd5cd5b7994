//! Instructions and their auxiliary operands.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tempo_core::TypeHash;

use super::code::SharedCode;
use super::opcode::OpCode;
use crate::ticket::Ticket;

/// Constant case value to target pc.
///
/// Ordered so that two emissions of one switch compare equal.
pub type JumpTable = BTreeMap<i64, usize>;

/// The target of a call or function value.
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// Finished code.
    Code(SharedCode),
    /// Code still being emitted; filled once.
    Pending(Ticket),
    /// Host callback.
    Native(TypeHash),
}

impl Callee {
    /// The interpreted code, once available.
    pub fn code(&self) -> Option<SharedCode> {
        match self {
            Callee::Code(code) => Some(code.clone()),
            Callee::Pending(ticket) => ticket.get(),
            Callee::Native(_) => None,
        }
    }
}

/// Auxiliary operand attached to an instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Extra {
    /// Switch dispatch table.
    JumpTable(Arc<JumpTable>),
    /// Nested code: spawn bodies and parent initializers.
    Code(SharedCode),
    /// Call target.
    Callee(Callee),
    /// A type operand.
    Type(TypeHash),
    /// A list of types.
    Types(Arc<[TypeHash]>),
    /// A string constant.
    Str(Arc<str>),
    /// Per-argument byte sizes of a variadic pack.
    ArgSizes(Arc<[u32]>),
}

/// One instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instr {
    /// Operation.
    pub op: OpCode,
    /// First operand word.
    pub val: u64,
    /// Second operand word.
    pub val2: u64,
    /// Auxiliary operand.
    pub extra: Option<Extra>,
    /// Source line, for runtime diagnostics.
    pub line: u32,
}

impl Instr {
    /// An instruction with zero operands.
    pub fn new(op: OpCode) -> Self {
        Self {
            op,
            val: 0,
            val2: 0,
            extra: None,
            line: 0,
        }
    }

    /// Set both operand words.
    pub fn with(mut self, val: u64, val2: u64) -> Self {
        self.val = val;
        self.val2 = val2;
        self
    }

    /// Attach an auxiliary operand.
    pub fn with_extra(mut self, extra: Extra) -> Self {
        self.extra = Some(extra);
        self
    }

    /// The jump table, for `SwitchBranch`.
    pub fn jump_table(&self) -> Option<&JumpTable> {
        match &self.extra {
            Some(Extra::JumpTable(table)) => Some(table),
            _ => None,
        }
    }

    /// The callee, for `RegPushCode`.
    pub fn callee(&self) -> Option<&Callee> {
        match &self.extra {
            Some(Extra::Callee(callee)) => Some(callee),
            _ => None,
        }
    }

    /// The nested code, for spawn and parent-initializer instructions.
    pub fn code(&self) -> Option<&SharedCode> {
        match &self.extra {
            Some(Extra::Code(code)) => Some(code),
            _ => None,
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<20} {:>6} {:>6}", self.op.name(), self.val, self.val2)?;
        match &self.extra {
            None => Ok(()),
            Some(Extra::JumpTable(table)) => {
                let cases: Vec<String> = table.iter().map(|(v, pc)| format!("{v}->{pc}")).collect();
                write!(f, "  [{}]", cases.join(", "))
            }
            Some(Extra::Code(code)) => write!(f, "  <{}>", code.name),
            Some(Extra::Callee(Callee::Code(code))) => write!(f, "  <{}>", code.name),
            Some(Extra::Callee(Callee::Pending(ticket))) => write!(f, "  <{}?>", ticket.name()),
            Some(Extra::Callee(Callee::Native(hash))) => write!(f, "  <native {hash}>"),
            Some(Extra::Type(ty)) => write!(f, "  {ty}"),
            Some(Extra::Types(types)) => write!(f, "  {} types", types.len()),
            Some(Extra::Str(s)) => write!(f, "  {s:?}"),
            Some(Extra::ArgSizes(sizes)) => write!(f, "  {sizes:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_operands() {
        let instr = Instr::new(OpCode::RegPushMem).with(16, 8);
        assert_eq!(instr.val, 16);
        assert_eq!(instr.val2, 8);
        assert!(instr.extra.is_none());
    }

    #[test]
    fn jump_table_accessor() {
        let mut table = JumpTable::new();
        table.insert(2, 7);
        let instr = Instr::new(OpCode::SwitchBranch).with_extra(Extra::JumpTable(Arc::new(table)));
        assert_eq!(instr.jump_table().and_then(|t| t.get(&2)), Some(&7));
        assert!(instr.callee().is_none());
    }

    #[test]
    fn display_lists_string_operand() {
        let instr = Instr::new(OpCode::RegPushStr).with_extra(Extra::Str(Arc::from("hi")));
        assert!(instr.to_string().contains("\"hi\""));
    }
}
