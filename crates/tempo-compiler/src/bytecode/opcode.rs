//! Bytecode operation codes.
//!
//! The VM is a register-stack machine: most instructions push to or pop from
//! the register stack, and `Mem` instructions address the current frame.
//! Every instruction carries two operand words (`val`, `val2`); the comment
//! on each opcode lists what they hold.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bytecode operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Register pushes
    // =========================================================================
    /// Push an integer immediate. val: value, val2: width in bytes.
    RegPushImm = 0,
    /// Push a float immediate. val: `f64` bits.
    RegPushFloat,
    /// Push a string constant. extra: the string.
    RegPushStr,
    /// Push a frame slot. val: offset, val2: size.
    RegPushMem,
    /// Push the address of a frame slot. val: offset.
    RegPushMemAddr,
    /// Push a slot of the global segment. val: offset, val2: size.
    RegPushGlobal,
    /// Push the address of a slot of the global segment. val: offset.
    RegPushGlobalAddr,
    /// Push a class-static field. val: offset, val2: size, extra: owner type.
    RegPushStatic,
    /// Push the address of a class-static field. val: offset, extra: owner type.
    RegPushStaticAddr,
    /// Push a function value. extra: callee.
    RegPushCode,
    /// Push a type value. extra: type.
    RegPushType,
    /// Push the running shred.
    RegPushMe,
    /// Push the current virtual time.
    RegPushNow,
    /// Push a random 0 or 1.
    RegPushMaybe,
    /// Drop bytes from the register stack. val: size.
    RegPop,
    /// Retain the object on top of the register stack.
    RegAddRef,
    /// Pop into a frame slot. val: offset, val2: size.
    RegToMem,
    /// Pop into a slot of the global segment. val: offset, val2: size.
    RegToGlobal,

    // =========================================================================
    // Frame
    // =========================================================================
    /// Fill a frame slot with an immediate. val: offset, val2: size.
    MemSetImm,
    /// Fill a slot of the global segment with an immediate. val: offset, val2: size.
    GlobalSetImm,
    /// Release the object held in a frame slot. val: offset.
    ObjectRelease,

    // =========================================================================
    // Control flow
    // =========================================================================
    /// Unconditional jump. val: target pc.
    Goto,
    /// Pop an int and jump if it is zero. val: target pc.
    BranchEqInt,
    /// Pop an int and jump if it is non-zero. val: target pc.
    BranchNeqInt,
    /// Pop a float and jump if it is zero. val: target pc.
    BranchEqFloat,
    /// Pop a float and jump if it is non-zero. val: target pc.
    BranchNeqFloat,
    /// Compare the selector with popped non-constant case values in order
    /// and jump to the first match. val: number of values, extra: value index
    /// to target pc.
    SwitchIni,
    /// Pop the selector and dispatch. val: fallback pc, extra: jump table.
    SwitchBranch,
    /// Decrement a hidden counter and push whether it was positive. val: offset.
    LoopDecrement,
    /// Advance an iteration cursor and push whether it is valid. The
    /// collection is in the slot before the cursor and the element is copied
    /// to the slot after it. val: cursor offset, val2: element size.
    AutoLoop,
    /// Like [`OpCode::AutoLoop`], binding a reference to the element.
    AutoLoopPtr,
    /// Return from a function.
    FuncReturn,
    /// End of a top-level or spawned code.
    Eoc,
    /// End of a destructor body.
    DtorEoc,

    // =========================================================================
    // Calls
    // =========================================================================
    /// Call an interpreted function. val: argument frame size.
    PreludeScript,
    /// Call a host callback. val: argument frame size.
    PreludeNative,
    /// Call a function value popped from the stack. val: argument frame size.
    PreludeIndirect,
    /// Stack overflow guard. val: argument frame size, val2: return size.
    Overflow,
    /// Pack variadic arguments. val: total bytes, extra: per-argument sizes.
    VarargIni,
    /// Start walking the variadic block. val: slot, val2: exit pc.
    VarargTop,
    /// Advance or finish the variadic walk. val: slot, val2: loop pc.
    VarargEnd,
    /// Read the current variadic argument. val: slot, val2: size.
    VarargMember,
    /// Return a cached result if the arguments were seen before. val: argument size.
    MemoizeCall,
    /// Cache the result for the current arguments. val: return size.
    MemoizeStore,

    // =========================================================================
    // Spawning
    // =========================================================================
    /// Create a shred for a compiled code. val2: 1 for fork, extra: code.
    SporkIni,
    /// Copy the receiver into slot 0 of the new shred.
    SporkThis,
    /// Copy captured values into the new frame. val: bytes.
    SporkExp,
    /// Copy call arguments into the new frame. val: bytes.
    SporkFunc,
    /// Schedule a spork and push its shred.
    SporkEnd,
    /// Schedule a fork and push its handle. val: result size.
    ForkEnd,

    // =========================================================================
    // Objects
    // =========================================================================
    /// Allocate an object. extra: type.
    ObjectInstantiate,
    /// Run a class initializer on the object on top of the stack, leaving it
    /// there. extra: code.
    PreCtor,
    /// Initialize an instance field of the receiver. Object and array fields
    /// pop their fresh value; other fields are zeroed.
    /// val: offset, val2: size, extra: stored type.
    MemberInit,
    /// Initialize a class-static field, like [`OpCode::MemberInit`].
    /// val: offset, val2: size, extra: owner and stored type.
    StaticInit,
    /// Store an immediate in a class-static field. val: offset, val2: value, extra: owner.
    StaticSetImm,
    /// Read an instance field. val: offset, val2: size.
    DotMember,
    /// Address of an instance field. val: offset.
    DotMemberAddr,
    /// Look up a virtual method. val: table index, val2: receiver depth.
    DotFunc,
    /// Read a fixed-offset tuple element. val: offset, val2: size.
    DotTuple,
    /// Address of a fixed-offset tuple element. val: offset.
    DotTupleAddr,
    /// Read a vector component. val: index, val2: 1 to push its address.
    VecMember,

    // =========================================================================
    // Arrays and aggregates
    // =========================================================================
    /// Allocate an array from popped dimension sizes. val: dimensions, val2: 1 for
    /// object elements, extra: element type.
    ArrayAlloc,
    /// Push the next element of the array on top of the stack, or jump once
    /// every element was visited. val: exit target, extra: element type.
    ArrayTop,
    /// Drop the element and step to the next one.
    ArrayBottom,
    /// End the element walk, leaving the array on top of the stack.
    ArrayPost,
    /// Build an array from popped items. val: count, val2: item size, extra: type.
    ArrayInit,
    /// Trap unless the index is in bounds. val: dimension.
    ArrayCheck,
    /// Replace array and index with the sub-array.
    ArrayFetch,
    /// Replace array and index with the element. val: element size.
    ArrayGet,
    /// Replace array and index with the element address. val: element size.
    ArrayAddr,
    /// Build a tuple from popped items. val: bytes, extra: item types.
    TupleCtor,
    /// Print popped values. val: count, extra: their types.
    Gack,

    // =========================================================================
    // Operators
    // =========================================================================
    /// Integer arithmetic: `+ - * / %`.
    IntPlus,
    IntMinus,
    IntMul,
    IntDiv,
    IntMod,
    /// Integer comparison and logic.
    IntEq,
    IntNe,
    IntLt,
    IntLe,
    IntGt,
    IntGe,
    IntAnd,
    IntOr,
    IntNot,
    IntNegate,
    /// Integer assignment `=>`: pops value and address.
    IntAssign,
    /// Integer pre/post increment through an address.
    IntPreInc,
    IntPreDec,
    IntPostInc,
    IntPostDec,
    /// Float arithmetic.
    FloatPlus,
    FloatMinus,
    FloatMul,
    FloatDiv,
    /// Float comparison.
    FloatEq,
    FloatNe,
    FloatLt,
    FloatGt,
    FloatNegate,
    /// Float assignment `=>`.
    FloatAssign,
    /// Conversions.
    CastIntToFloat,
    CastFloatToInt,
    /// Object handle assignment `@=>`.
    ObjectAssign,
    /// Handle comparison.
    ObjectEq,
    ObjectNe,
    /// Time advance `=> now`.
    TimeAdvance,
    /// Wait for the fork to finish and push its result.
    ForkJoin,
}

impl OpCode {
    /// Get the name of this opcode for debugging.
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::RegPushImm => "REG_PUSH_IMM",
            OpCode::RegPushFloat => "REG_PUSH_FLOAT",
            OpCode::RegPushStr => "REG_PUSH_STR",
            OpCode::RegPushMem => "REG_PUSH_MEM",
            OpCode::RegPushMemAddr => "REG_PUSH_MEM_ADDR",
            OpCode::RegPushGlobal => "REG_PUSH_GLOBAL",
            OpCode::RegPushGlobalAddr => "REG_PUSH_GLOBAL_ADDR",
            OpCode::RegPushStatic => "REG_PUSH_STATIC",
            OpCode::RegPushStaticAddr => "REG_PUSH_STATIC_ADDR",
            OpCode::RegPushCode => "REG_PUSH_CODE",
            OpCode::RegPushType => "REG_PUSH_TYPE",
            OpCode::RegPushMe => "REG_PUSH_ME",
            OpCode::RegPushNow => "REG_PUSH_NOW",
            OpCode::RegPushMaybe => "REG_PUSH_MAYBE",
            OpCode::RegPop => "REG_POP",
            OpCode::RegAddRef => "REG_ADD_REF",
            OpCode::RegToMem => "REG_TO_MEM",
            OpCode::RegToGlobal => "REG_TO_GLOBAL",
            OpCode::MemSetImm => "MEM_SET_IMM",
            OpCode::GlobalSetImm => "GLOBAL_SET_IMM",
            OpCode::ObjectRelease => "OBJECT_RELEASE",
            OpCode::Goto => "GOTO",
            OpCode::BranchEqInt => "BRANCH_EQ_INT",
            OpCode::BranchNeqInt => "BRANCH_NEQ_INT",
            OpCode::BranchEqFloat => "BRANCH_EQ_FLOAT",
            OpCode::BranchNeqFloat => "BRANCH_NEQ_FLOAT",
            OpCode::SwitchIni => "SWITCH_INI",
            OpCode::SwitchBranch => "SWITCH_BRANCH",
            OpCode::LoopDecrement => "LOOP_DECREMENT",
            OpCode::AutoLoop => "AUTO_LOOP",
            OpCode::AutoLoopPtr => "AUTO_LOOP_PTR",
            OpCode::FuncReturn => "FUNC_RETURN",
            OpCode::Eoc => "EOC",
            OpCode::DtorEoc => "DTOR_EOC",
            OpCode::PreludeScript => "PRELUDE_SCRIPT",
            OpCode::PreludeNative => "PRELUDE_NATIVE",
            OpCode::PreludeIndirect => "PRELUDE_INDIRECT",
            OpCode::Overflow => "OVERFLOW",
            OpCode::VarargIni => "VARARG_INI",
            OpCode::VarargTop => "VARARG_TOP",
            OpCode::VarargEnd => "VARARG_END",
            OpCode::VarargMember => "VARARG_MEMBER",
            OpCode::MemoizeCall => "MEMOIZE_CALL",
            OpCode::MemoizeStore => "MEMOIZE_STORE",
            OpCode::SporkIni => "SPORK_INI",
            OpCode::SporkThis => "SPORK_THIS",
            OpCode::SporkExp => "SPORK_EXP",
            OpCode::SporkFunc => "SPORK_FUNC",
            OpCode::SporkEnd => "SPORK_END",
            OpCode::ForkEnd => "FORK_END",
            OpCode::ObjectInstantiate => "OBJECT_INSTANTIATE",
            OpCode::PreCtor => "PRE_CTOR",
            OpCode::MemberInit => "MEMBER_INIT",
            OpCode::StaticInit => "STATIC_INIT",
            OpCode::StaticSetImm => "STATIC_SET_IMM",
            OpCode::DotMember => "DOT_MEMBER",
            OpCode::DotMemberAddr => "DOT_MEMBER_ADDR",
            OpCode::DotFunc => "DOT_FUNC",
            OpCode::DotTuple => "DOT_TUPLE",
            OpCode::DotTupleAddr => "DOT_TUPLE_ADDR",
            OpCode::VecMember => "VEC_MEMBER",
            OpCode::ArrayAlloc => "ARRAY_ALLOC",
            OpCode::ArrayTop => "ARRAY_TOP",
            OpCode::ArrayBottom => "ARRAY_BOTTOM",
            OpCode::ArrayPost => "ARRAY_POST",
            OpCode::ArrayInit => "ARRAY_INIT",
            OpCode::ArrayCheck => "ARRAY_CHECK",
            OpCode::ArrayFetch => "ARRAY_FETCH",
            OpCode::ArrayGet => "ARRAY_GET",
            OpCode::ArrayAddr => "ARRAY_ADDR",
            OpCode::TupleCtor => "TUPLE_CTOR",
            OpCode::Gack => "GACK",
            OpCode::IntPlus => "INT_PLUS",
            OpCode::IntMinus => "INT_MINUS",
            OpCode::IntMul => "INT_MUL",
            OpCode::IntDiv => "INT_DIV",
            OpCode::IntMod => "INT_MOD",
            OpCode::IntEq => "INT_EQ",
            OpCode::IntNe => "INT_NE",
            OpCode::IntLt => "INT_LT",
            OpCode::IntLe => "INT_LE",
            OpCode::IntGt => "INT_GT",
            OpCode::IntGe => "INT_GE",
            OpCode::IntAnd => "INT_AND",
            OpCode::IntOr => "INT_OR",
            OpCode::IntNot => "INT_NOT",
            OpCode::IntNegate => "INT_NEGATE",
            OpCode::IntAssign => "INT_ASSIGN",
            OpCode::IntPreInc => "INT_PRE_INC",
            OpCode::IntPreDec => "INT_PRE_DEC",
            OpCode::IntPostInc => "INT_POST_INC",
            OpCode::IntPostDec => "INT_POST_DEC",
            OpCode::FloatPlus => "FLOAT_PLUS",
            OpCode::FloatMinus => "FLOAT_MINUS",
            OpCode::FloatMul => "FLOAT_MUL",
            OpCode::FloatDiv => "FLOAT_DIV",
            OpCode::FloatEq => "FLOAT_EQ",
            OpCode::FloatNe => "FLOAT_NE",
            OpCode::FloatLt => "FLOAT_LT",
            OpCode::FloatGt => "FLOAT_GT",
            OpCode::FloatNegate => "FLOAT_NEGATE",
            OpCode::FloatAssign => "FLOAT_ASSIGN",
            OpCode::CastIntToFloat => "CAST_I2F",
            OpCode::CastFloatToInt => "CAST_F2I",
            OpCode::ObjectAssign => "OBJECT_ASSIGN",
            OpCode::ObjectEq => "OBJECT_EQ",
            OpCode::ObjectNe => "OBJECT_NE",
            OpCode::TimeAdvance => "TIME_ADVANCE",
            OpCode::ForkJoin => "FORK_JOIN",
        }
    }

    /// Whether `val` holds a jump target that is patched after emission.
    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            OpCode::Goto
                | OpCode::BranchEqInt
                | OpCode::BranchNeqInt
                | OpCode::BranchEqFloat
                | OpCode::BranchNeqFloat
                | OpCode::SwitchBranch
                | OpCode::ArrayTop
        )
    }

    /// Whether this instruction ends a code body.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OpCode::FuncReturn | OpCode::Eoc | OpCode::DtorEoc)
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_byte_roundtrip() {
        let byte: u8 = OpCode::SwitchBranch.into();
        assert_eq!(OpCode::try_from(byte), Ok(OpCode::SwitchBranch));
        assert!(OpCode::try_from(u8::MAX).is_err());
    }

    #[test]
    fn first_opcode_is_zero() {
        assert_eq!(u8::from(OpCode::RegPushImm), 0);
    }

    #[test]
    fn branch_classification() {
        assert!(OpCode::Goto.is_branch());
        assert!(OpCode::BranchEqFloat.is_branch());
        assert!(!OpCode::RegPop.is_branch());
        assert!(OpCode::DtorEoc.is_terminal());
        assert!(!OpCode::Goto.is_terminal());
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(OpCode::RegPushImm.to_string(), "REG_PUSH_IMM");
    }
}
