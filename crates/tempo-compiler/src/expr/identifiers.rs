//! Identifier emission.
//!
//! The checker binds every identifier, so the emitter only picks the
//! addressing mode:
//!
//! ```text
//! local / captured value    RegPushMem{offset, size}       or RegPushMemAddr
//! global                    RegPushGlobal{offset, size}    or RegPushGlobalAddr
//! field (this.x)            RegPushMem{0} DotMember{offset, size}
//! static (Class.x)          RegPushStatic{offset, size}    extra: owner
//! constant                  its literal
//! function                  RegPushCode                    extra: code or ticket
//! ```

use std::sync::Arc;

use tempo_ast::{Binding, ConstValue, Expr, Ident, SpecialId, Storage, Value};
use tempo_core::sizes::SZ_INT;
use tempo_core::{CompilationError, Span, TypeHash};

use crate::bytecode::{Extra, Instr, OpCode};
use crate::emit::Emitter;

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    pub(super) fn emit_ident(&mut self, ident: &Ident<'ast>, expr: &Expr<'ast>) -> Result<()> {
        match ident.binding {
            Binding::Value(value) => self.emit_value(value, expr.info.addr, expr.span),
            Binding::Func(func) => {
                let callee = self.callee_for(&func, expr.span)?;
                self.emit(Instr::new(OpCode::RegPushCode).with_extra(Extra::Callee(callee)));
                Ok(())
            }
            Binding::Special(id) => {
                self.emit_special(id, expr.span);
                Ok(())
            }
            Binding::Type(ty) => {
                let ty = self.resolve_type(ty);
                self.emit(Instr::new(OpCode::RegPushType).with_extra(Extra::Type(ty)));
                Ok(())
            }
        }
    }

    /// Push a declared value, or its address when `addr` is set.
    pub(crate) fn emit_value(&mut self, value: &Value<'ast>, addr: bool, span: Span) -> Result<()> {
        if !addr {
            if let Some(constant) = value.constant {
                match constant {
                    ConstValue::Int(v) => {
                        self.emit_op(OpCode::RegPushImm, v as u64, u64::from(SZ_INT));
                    }
                    ConstValue::Float(v) => {
                        self.emit_op(OpCode::RegPushFloat, v.to_bits(), 0);
                    }
                }
                return Ok(());
            }
        }

        let size = if value.is_ref {
            SZ_INT
        } else {
            self.size_of(value.ty, span)?
        };
        match value.storage {
            Storage::Local | Storage::Global => {
                if let Some(offset) = self.code.frame.lookup(value.id) {
                    let offset = u64::from(offset);
                    if addr {
                        self.emit_op(OpCode::RegPushMemAddr, offset, 0);
                    } else {
                        self.emit_op(OpCode::RegPushMem, offset, u64::from(size));
                    }
                } else if let Some(&offset) = self.globals.get(&value.id) {
                    let offset = u64::from(offset);
                    if addr {
                        self.emit_op(OpCode::RegPushGlobalAddr, offset, 0);
                    } else {
                        self.emit_op(OpCode::RegPushGlobal, offset, u64::from(size));
                    }
                } else {
                    return Err(CompilationError::internal(format!(
                        "no slot for '{}' at {span}",
                        value.name
                    )));
                }
            }
            Storage::Member { offset } => {
                self.emit_op(OpCode::RegPushMem, 0, u64::from(SZ_INT));
                self.emit_field(offset, size, addr);
            }
            Storage::Static { offset } => {
                let owner = value.owner.unwrap_or(TypeHash::EMPTY);
                self.emit_static(owner, offset, size, addr);
            }
        }
        Ok(())
    }

    /// Read a field of the object on top of the stack.
    pub(crate) fn emit_field(&mut self, offset: u32, size: u32, addr: bool) {
        if addr {
            self.emit_op(OpCode::DotMemberAddr, u64::from(offset), 0);
        } else {
            self.emit_op(OpCode::DotMember, u64::from(offset), u64::from(size));
        }
    }

    pub(crate) fn emit_static(&mut self, owner: TypeHash, offset: u32, size: u32, addr: bool) {
        let owner = self.resolve_type(owner);
        let instr = if addr {
            Instr::new(OpCode::RegPushStaticAddr).with(u64::from(offset), 0)
        } else {
            Instr::new(OpCode::RegPushStatic).with(u64::from(offset), u64::from(size))
        };
        self.emit(instr.with_extra(Extra::Type(owner)));
    }

    fn emit_special(&mut self, id: SpecialId, span: Span) {
        match id {
            SpecialId::This => {
                self.emit_op(OpCode::RegPushMem, 0, u64::from(SZ_INT));
            }
            SpecialId::Me => {
                self.emit_op(OpCode::RegPushMe, 0, 0);
            }
            SpecialId::Now => {
                self.emit_op(OpCode::RegPushNow, 0, 0);
            }
            SpecialId::Maybe => {
                self.emit_op(OpCode::RegPushMaybe, 0, 0);
            }
            SpecialId::Line => {
                self.emit_op(OpCode::RegPushImm, u64::from(span.line), u64::from(SZ_INT));
            }
            SpecialId::File => {
                let name: Arc<str> = Arc::from(self.unit_name.as_str());
                self.emit(Instr::new(OpCode::RegPushStr).with_extra(Extra::Str(name)));
            }
            SpecialId::Func => {
                let name = match &self.code.func {
                    Some(func) => func.name.clone(),
                    None => self.unit_name.clone(),
                };
                self.emit(Instr::new(OpCode::RegPushStr).with_extra(Extra::Str(name.into())));
            }
        }
    }
}
