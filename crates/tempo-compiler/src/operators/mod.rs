//! Operator dispatch table.
//!
//! Built-in numeric operators, casts, built-in members and user overloads
//! all live in one [`OperatorTable`] keyed by operator symbol and operand
//! types. The expression emitter pushes operands and hands the key to the
//! bridge ([`Emitter::emit_operator`](crate::Emitter::emit_operator)); it
//! never special-cases a type.

mod bridge;
mod builtin;

use rustc_hash::FxHashMap;
use tempo_core::TypeHash;
use tempo_registry::TypeRegistry;

use crate::bytecode::OpCode;

/// Operator symbol for implicit conversions attached by the checker.
pub const IMPLICIT_CAST: &str = "@implicit";

/// Operator symbol for explicit casts.
pub const EXPLICIT_CAST: &str = "$";

/// Lookup key: operator symbol and operand types.
///
/// A missing operand (prefix or postfix operators) is [`TypeHash::EMPTY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperatorKey {
    /// Hash of the operator symbol.
    pub op: TypeHash,
    /// Left operand type.
    pub lhs: TypeHash,
    /// Right operand type.
    pub rhs: TypeHash,
}

impl OperatorKey {
    /// Key for a binary operator.
    pub fn new(op: &str, lhs: TypeHash, rhs: TypeHash) -> Self {
        Self {
            op: TypeHash::from_name(op),
            lhs,
            rhs,
        }
    }

    /// Key for a prefix operator.
    pub fn prefix(op: &str, operand: TypeHash) -> Self {
        Self::new(op, TypeHash::EMPTY, operand)
    }

    /// Key for a postfix operator.
    pub fn postfix(op: &str, operand: TypeHash) -> Self {
        Self::new(op, operand, TypeHash::EMPTY)
    }

    /// Key for a conversion.
    pub fn cast(op: &str, from: TypeHash, to: TypeHash) -> Self {
        Self::new(op, from, to)
    }

    /// Key for a built-in member of `owner`.
    pub fn member(owner: TypeHash, name: &str) -> Self {
        Self {
            op: TypeHash::from_member(owner, name),
            lhs: owner,
            rhs: TypeHash::EMPTY,
        }
    }

    fn with_operands(self, lhs: TypeHash, rhs: TypeHash) -> Self {
        Self { lhs, rhs, ..self }
    }
}

/// How an operator is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorImpl {
    /// One built-in instruction with an operand word.
    Instr(OpCode, u64),
    /// A script-defined overload, called like any function.
    Overload {
        /// The overload.
        func: TypeHash,
        /// Its return type.
        ret: TypeHash,
    },
    /// A host callback.
    Native {
        /// The callback.
        func: TypeHash,
        /// Its return type.
        ret: TypeHash,
    },
    /// No code; the value is already in the right representation.
    Identity,
}

/// Operators and built-in members registered before emission.
#[derive(Debug, Default, Clone)]
pub struct OperatorTable {
    entries: FxHashMap<OperatorKey, OperatorImpl>,
}

impl OperatorTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation, replacing any previous one for the key.
    pub fn register(&mut self, key: OperatorKey, imp: OperatorImpl) {
        self.entries.insert(key, imp);
    }

    /// Register a binary operator backed by one instruction.
    pub fn register_instr(&mut self, op: &str, lhs: TypeHash, rhs: TypeHash, opcode: OpCode) {
        self.register(OperatorKey::new(op, lhs, rhs), OperatorImpl::Instr(opcode, 0));
    }

    /// Register a built-in member.
    pub fn register_member(&mut self, owner: TypeHash, name: &str, imp: OperatorImpl) {
        self.register(OperatorKey::member(owner, name), imp);
    }

    /// Exact lookup.
    pub fn get(&self, key: &OperatorKey) -> Option<&OperatorImpl> {
        self.entries.get(key)
    }

    /// Look up a key, falling back to inherited implementations.
    ///
    /// Tries the exact operand types first, then each ancestor of the left
    /// operand (nearest first) against each ancestor of the right operand.
    pub fn resolve(&self, registry: &TypeRegistry, key: OperatorKey) -> Option<OperatorImpl> {
        if let Some(imp) = self.entries.get(&key) {
            return Some(*imp);
        }
        let lhs_chain = type_chain(registry, key.lhs);
        let rhs_chain = type_chain(registry, key.rhs);
        for &lhs in &lhs_chain {
            for &rhs in &rhs_chain {
                if let Some(imp) = self.entries.get(&key.with_operands(lhs, rhs)) {
                    return Some(*imp);
                }
            }
        }
        None
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A type followed by its ancestors, nearest first.
fn type_chain(registry: &TypeRegistry, ty: TypeHash) -> Vec<TypeHash> {
    let mut chain = vec![ty];
    if !ty.is_empty() {
        chain.extend(registry.ancestors(ty).into_iter().rev());
    }
    chain
}
