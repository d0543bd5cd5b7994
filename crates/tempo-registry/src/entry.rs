//! Registry entries for types and functions.

use tempo_core::{FuncFlags, TypeFlags, TypeHash, sizes::SZ_INT};

/// The template and arguments a type was specialized from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateInstance {
    /// The generic type.
    pub template: TypeHash,
    /// Concrete type arguments in order.
    pub args: Vec<TypeHash>,
}

/// A registered type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeEntry {
    /// Qualified name.
    pub name: String,
    /// Identity.
    pub hash: TypeHash,
    /// Size of a value of this type on the VM stack.
    ///
    /// Object types are handles and always occupy [`SZ_INT`].
    pub size: u32,
    /// Flags.
    pub flags: TypeFlags,
    /// Parent class.
    pub parent: Option<TypeHash>,
    /// Byte size of an instance's field storage (classes only).
    pub instance_size: u32,
    /// Byte size of the class-level static storage.
    pub static_size: u32,
    /// Origin when this type is a template specialization.
    pub template: Option<TemplateInstance>,
}

impl TypeEntry {
    /// A value type with the given stack size.
    pub fn value(name: impl Into<String>, size: u32) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_name(&name),
            name,
            size,
            flags: TypeFlags::BUILTIN,
            parent: None,
            instance_size: 0,
            static_size: 0,
            template: None,
        }
    }

    /// A reference-counted class.
    pub fn class(name: impl Into<String>, parent: Option<TypeHash>) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_name(&name),
            name,
            size: SZ_INT,
            flags: TypeFlags::OBJECT,
            parent,
            instance_size: 0,
            static_size: 0,
            template: None,
        }
    }

    /// Add flags.
    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the instance and static storage sizes.
    pub fn with_layout(mut self, instance_size: u32, static_size: u32) -> Self {
        self.instance_size = instance_size;
        self.static_size = static_size;
        self
    }

    /// Whether values are reference-counted objects.
    pub fn is_object(&self) -> bool {
        self.flags.contains(TypeFlags::OBJECT)
    }

    /// Whether this is the execution-unit type (or derives from it).
    pub fn is_shred(&self) -> bool {
        self.flags.contains(TypeFlags::SHRED)
    }
}

/// A registered function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionEntry {
    /// Function name.
    pub name: String,
    /// Identity.
    pub hash: TypeHash,
    /// Flags.
    pub flags: FuncFlags,
    /// Owning class for methods.
    pub owner: Option<TypeHash>,
    /// Return type.
    pub ret: TypeHash,
}

impl FunctionEntry {
    /// A host-provided function.
    pub fn native(name: impl Into<String>, hash: TypeHash, ret: TypeHash) -> Self {
        Self {
            name: name.into(),
            hash,
            flags: FuncFlags::BUILTIN,
            owner: None,
            ret,
        }
    }

    /// Whether calls to this function keep the caller pure.
    pub fn is_pure(&self) -> bool {
        self.flags.contains(FuncFlags::PURE)
    }
}
