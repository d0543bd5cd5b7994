//! The emitted result of one compilation unit.

use rustc_hash::FxHashMap;
use tempo_core::TypeHash;

use crate::bytecode::SharedCode;

/// What the VM needs to know about one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRecord {
    /// Class name.
    pub name: String,
    /// Class identity (the instance hash for specializations).
    pub ty: TypeHash,
    /// Field initializer, run on every instantiation after the parent's.
    pub initializer: SharedCode,
    /// Destructor body, if the class declares one.
    pub dtor: Option<SharedCode>,
    /// Bytes of instance field storage.
    pub instance_size: u32,
    /// Bytes of class-level static storage.
    pub static_size: u32,
}

/// Finished codes of one unit.
#[derive(Debug, Clone)]
pub struct Program {
    /// Unit name.
    pub name: String,
    /// Top-level code.
    pub main: SharedCode,
    /// Functions by hash.
    pub functions: FxHashMap<TypeHash, SharedCode>,
    /// Classes by type.
    pub classes: FxHashMap<TypeHash, ClassRecord>,
    /// Generic function specializations by `(template, args)` key.
    pub specializations: FxHashMap<TypeHash, SharedCode>,
    /// Bytes of global segment needed once this unit runs, earlier units
    /// included.
    pub globals_size: u32,
}

impl Program {
    /// Code of a function defined in this unit.
    pub fn function(&self, hash: TypeHash) -> Option<&SharedCode> {
        self.functions.get(&hash)
    }

    /// Record of a class defined in this unit.
    pub fn class(&self, ty: TypeHash) -> Option<&ClassRecord> {
        self.classes.get(&ty)
    }

    /// Code of a specialization emitted for this unit.
    pub fn specialization(&self, key: TypeHash) -> Option<&SharedCode> {
        self.specializations.get(&key)
    }

    /// Look up a function or specialization by key.
    pub fn code(&self, key: TypeHash) -> Option<&SharedCode> {
        self.function(key).or_else(|| self.specialization(key))
    }
}
