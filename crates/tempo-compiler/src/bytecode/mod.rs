//! Bytecode model.
//!
//! - [`OpCode`] - the instruction set
//! - [`Instr`] and [`Extra`] - one instruction and its auxiliary operand
//! - [`Code`] - a finished, immutable compiled unit

mod code;
mod instr;
mod opcode;

pub use code::{Code, CodeFlags, SharedCode};
pub use instr::{Callee, Extra, Instr, JumpTable};
pub use opcode::OpCode;
