//! Operators every program starts with.

use tempo_core::primitives::{ARRAY, DUR, FLOAT, FORK, INT, NULL, OBJECT, STRING, TIME};
use tempo_core::{TypeHash, sizes::SZ_INT};

use super::{EXPLICIT_CAST, IMPLICIT_CAST, OperatorImpl, OperatorKey, OperatorTable};
use crate::bytecode::OpCode;

impl OperatorTable {
    /// Create a table with the built-in numeric, time and object operators.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table.register_int();
        table.register_float();
        table.register_time();
        table.register_object();
        table.register_members();
        table
    }

    fn register_int(&mut self) {
        let binary = [
            ("+", OpCode::IntPlus),
            ("-", OpCode::IntMinus),
            ("*", OpCode::IntMul),
            ("/", OpCode::IntDiv),
            ("%", OpCode::IntMod),
            ("==", OpCode::IntEq),
            ("!=", OpCode::IntNe),
            ("<", OpCode::IntLt),
            ("<=", OpCode::IntLe),
            (">", OpCode::IntGt),
            (">=", OpCode::IntGe),
            ("&&", OpCode::IntAnd),
            ("||", OpCode::IntOr),
            ("=>", OpCode::IntAssign),
        ];
        for (op, opcode) in binary {
            self.register_instr(op, INT, INT, opcode);
        }

        self.register(OperatorKey::prefix("-", INT), OperatorImpl::Instr(OpCode::IntNegate, 0));
        self.register(OperatorKey::prefix("!", INT), OperatorImpl::Instr(OpCode::IntNot, 0));
        self.register(OperatorKey::prefix("+", INT), OperatorImpl::Identity);
        self.register(OperatorKey::prefix("++", INT), OperatorImpl::Instr(OpCode::IntPreInc, 0));
        self.register(OperatorKey::prefix("--", INT), OperatorImpl::Instr(OpCode::IntPreDec, 0));
        self.register(OperatorKey::postfix("++", INT), OperatorImpl::Instr(OpCode::IntPostInc, 0));
        self.register(OperatorKey::postfix("--", INT), OperatorImpl::Instr(OpCode::IntPostDec, 0));
    }

    fn register_float(&mut self) {
        let binary = [
            ("+", OpCode::FloatPlus),
            ("-", OpCode::FloatMinus),
            ("*", OpCode::FloatMul),
            ("/", OpCode::FloatDiv),
            ("==", OpCode::FloatEq),
            ("!=", OpCode::FloatNe),
            ("<", OpCode::FloatLt),
            (">", OpCode::FloatGt),
            ("=>", OpCode::FloatAssign),
        ];
        for (op, opcode) in binary {
            self.register_instr(op, FLOAT, FLOAT, opcode);
        }
        self.register(OperatorKey::prefix("-", FLOAT), OperatorImpl::Instr(OpCode::FloatNegate, 0));

        let i2f = OperatorImpl::Instr(OpCode::CastIntToFloat, 0);
        let f2i = OperatorImpl::Instr(OpCode::CastFloatToInt, 0);
        self.register(OperatorKey::cast(IMPLICIT_CAST, INT, FLOAT), i2f);
        self.register(OperatorKey::cast(EXPLICIT_CAST, INT, FLOAT), i2f);
        self.register(OperatorKey::cast(EXPLICIT_CAST, FLOAT, INT), f2i);
    }

    fn register_time(&mut self) {
        // dur and time share the float representation.
        for (lhs, rhs) in [(DUR, DUR), (TIME, DUR), (DUR, TIME)] {
            self.register_instr("+", lhs, rhs, OpCode::FloatPlus);
        }
        self.register_instr("-", DUR, DUR, OpCode::FloatMinus);
        self.register_instr("-", TIME, TIME, OpCode::FloatMinus);
        self.register_instr("*", FLOAT, DUR, OpCode::FloatMul);
        self.register_instr("=>", DUR, DUR, OpCode::FloatAssign);
        self.register_instr("=>", TIME, TIME, OpCode::FloatAssign);
        self.register_instr("=>", DUR, TIME, OpCode::TimeAdvance);
        self.register_instr("<", TIME, TIME, OpCode::FloatLt);
        self.register_instr(">", TIME, TIME, OpCode::FloatGt);
        for (from, to) in [(FLOAT, DUR), (DUR, FLOAT), (DUR, TIME)] {
            self.register(OperatorKey::cast(IMPLICIT_CAST, from, to), OperatorImpl::Identity);
        }
    }

    fn register_object(&mut self) {
        self.register_instr("@=>", OBJECT, OBJECT, OpCode::ObjectAssign);
        self.register_instr("==", OBJECT, OBJECT, OpCode::ObjectEq);
        self.register_instr("!=", OBJECT, OBJECT, OpCode::ObjectNe);
        self.register_instr("@=>", NULL, OBJECT, OpCode::ObjectAssign);
        // Upcasts and null conversions keep the handle as is.
        self.register(OperatorKey::cast(IMPLICIT_CAST, OBJECT, OBJECT), OperatorImpl::Identity);
        self.register(OperatorKey::cast(IMPLICIT_CAST, NULL, OBJECT), OperatorImpl::Identity);
        self.register(OperatorKey::cast(EXPLICIT_CAST, OBJECT, OBJECT), OperatorImpl::Identity);
    }

    fn register_members(&mut self) {
        self.register_member(FORK, "join", OperatorImpl::Instr(OpCode::ForkJoin, 0));
        for owner in [ARRAY, STRING] {
            self.register_member(
                owner,
                "size",
                OperatorImpl::Native {
                    func: TypeHash::from_member(owner, "size"),
                    ret: INT,
                },
            );
        }
        self.register_member(
            STRING,
            "length",
            OperatorImpl::Instr(OpCode::DotMember, u64::from(SZ_INT)),
        );
    }
}
