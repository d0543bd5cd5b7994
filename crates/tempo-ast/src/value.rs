//! Declared values and identifier bindings.
//!
//! The type checker assigns every declaration a [`Value`] with a unique
//! [`ValueId`]. Identifiers refer back to it through a [`Binding`], so the
//! emitter never resolves names itself.

use tempo_core::TypeHash;

/// Unique identity of a declared value within one compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

/// Where a value lives at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// A slot in the current frame, allocated at its declaration.
    Local,
    /// An instance field at a fixed offset in its owner's object layout.
    Member {
        /// Byte offset in the object.
        offset: u32,
    },
    /// A class-level field in its owner's static storage.
    Static {
        /// Byte offset in the owner's static data.
        offset: u32,
    },
    /// A top-level value of the unit. Emitted as a slot of the unit's main frame.
    Global,
}

/// Compile-time constant value of a builtin, enum or union constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    /// Integer constant.
    Int(i64),
    /// Float constant.
    Float(f64),
}

/// A declared value: local, parameter, field, static or constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Value<'ast> {
    /// Unique identity.
    pub id: ValueId,
    /// Source name.
    pub name: &'ast str,
    /// Resolved type.
    pub ty: TypeHash,
    /// Storage kind.
    pub storage: Storage,
    /// Reference binding (`@`): holds a handle, never instantiates.
    pub is_ref: bool,
    /// Class owning this value (fields and statics).
    pub owner: Option<TypeHash>,
    /// Compile-time constant, if the value is one.
    pub constant: Option<ConstValue>,
}

impl<'ast> Value<'ast> {
    /// A plain local of the given type.
    pub fn local(id: u32, name: &'ast str, ty: TypeHash) -> Self {
        Self {
            id: ValueId(id),
            name,
            ty,
            storage: Storage::Local,
            is_ref: false,
            owner: None,
            constant: None,
        }
    }

    /// Whether the value is owned by a class (field or static).
    pub fn is_class_owned(&self) -> bool {
        matches!(self.storage, Storage::Member { .. } | Storage::Static { .. })
    }
}

/// Identifiers the language gives a fixed meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialId {
    /// The receiver of the enclosing method.
    This,
    /// The running shred.
    Me,
    /// The current virtual time.
    Now,
    /// A random 0 or 1.
    Maybe,
    /// Source line of the identifier.
    Line,
    /// Name of the compilation unit.
    File,
    /// Name of the enclosing function.
    Func,
}

/// How a callee is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalleeKind {
    /// A function defined in script; runs interpreted code.
    Script,
    /// A host callback.
    Native,
    /// A function pointer value read from the stack.
    Indirect,
}

/// A resolved reference to a function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuncRef<'ast> {
    /// Function identity.
    pub hash: TypeHash,
    /// Source name, for diagnostics and code names.
    pub name: &'ast str,
    /// Invocation kind.
    pub kind: CalleeKind,
    /// Whether the callee is marked pure.
    pub is_pure: bool,
    /// Concrete type arguments when the callee is a generic function.
    pub template_args: &'ast [TypeHash],
}

impl<'ast> FuncRef<'ast> {
    /// A non-generic script function.
    pub fn script(hash: TypeHash, name: &'ast str) -> Self {
        Self {
            hash,
            name,
            kind: CalleeKind::Script,
            is_pure: false,
            template_args: &[],
        }
    }

    /// Whether the callee needs a specialization before it can be called.
    pub fn is_template_use(&self) -> bool {
        !self.template_args.is_empty()
    }
}

/// What an identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding<'ast> {
    /// A declared value.
    Value(&'ast Value<'ast>),
    /// A function value.
    Func(FuncRef<'ast>),
    /// A special identifier.
    Special(SpecialId),
    /// A type used as a value (`Class.x`, `typeof`).
    Type(TypeHash),
}

