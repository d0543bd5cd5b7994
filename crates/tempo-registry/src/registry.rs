//! TypeRegistry - type and function registry read by the emitter.
//!
//! The registry is populated before emission (host builtins first, then the
//! type checker's declarations) and is only read while a unit is emitted.
//!
//! # Example
//!
//! ```
//! use tempo_registry::{TypeEntry, TypeRegistry};
//! use tempo_core::primitives;
//!
//! let mut registry = TypeRegistry::with_builtins();
//! registry.register_type(TypeEntry::class("Osc", Some(primitives::OBJECT))).unwrap();
//!
//! let osc = tempo_core::TypeHash::from_name("Osc");
//! assert!(registry.is_object(osc));
//! assert_eq!(registry.ancestors(osc), vec![primitives::OBJECT]);
//! ```

use rustc_hash::FxHashMap;
use tempo_core::sizes::{SZ_COMPLEX, SZ_FLOAT, SZ_INT, SZ_VEC3, SZ_VEC4};
use tempo_core::{RegistrationError, TypeFlags, TypeHash, primitives};

use crate::entry::{FunctionEntry, TemplateInstance, TypeEntry};
use crate::hierarchy::ClassHierarchy;

/// Registry of types and functions.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: FxHashMap<TypeHash, TypeEntry>,
    functions: FxHashMap<TypeHash, FunctionEntry>,
    hierarchy: ClassHierarchy,
    /// (template, args) -> instance type
    instances: FxHashMap<(TypeHash, Vec<TypeHash>), TypeHash>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in types registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        let vector = TypeFlags::BUILTIN | TypeFlags::VECTOR;
        let values = [
            TypeEntry::value("void", 0),
            TypeEntry::value("int", SZ_INT),
            TypeEntry::value("float", SZ_FLOAT),
            TypeEntry::value("dur", SZ_FLOAT),
            TypeEntry::value("time", SZ_FLOAT),
            TypeEntry::value("complex", SZ_COMPLEX).with_flags(vector),
            TypeEntry::value("polar", SZ_COMPLEX).with_flags(vector),
            TypeEntry::value("vec3", SZ_VEC3).with_flags(vector),
            TypeEntry::value("vec4", SZ_VEC4).with_flags(vector),
            TypeEntry::value("@function", SZ_INT).with_flags(TypeFlags::FUNCTION),
            TypeEntry::value("@null", SZ_INT),
            TypeEntry::value("@Vararg", SZ_INT),
        ];
        for entry in values {
            self.types.insert(entry.hash, entry);
        }

        let builtin = TypeFlags::BUILTIN;
        let object = primitives::OBJECT;
        let classes = [
            TypeEntry::class("Object", None).with_flags(builtin),
            TypeEntry::class("string", Some(object)).with_flags(builtin),
            TypeEntry::class("Shred", Some(object)).with_flags(builtin | TypeFlags::SHRED),
            TypeEntry::class("Fork", Some(primitives::SHRED))
                .with_flags(builtin | TypeFlags::SHRED),
            TypeEntry::class("Array", Some(object)).with_flags(builtin | TypeFlags::ARRAY),
            TypeEntry::class("Tuple", Some(object)).with_flags(builtin | TypeFlags::TUPLE),
            TypeEntry::class("Class", Some(object)).with_flags(builtin),
        ];
        for entry in classes {
            if let Some(parent) = entry.parent {
                // Built-in chain is acyclic by construction.
                let _ = self.hierarchy.add(entry.hash, parent);
            }
            self.types.insert(entry.hash, entry);
        }
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a type.
    pub fn register_type(&mut self, entry: TypeEntry) -> Result<TypeHash, RegistrationError> {
        if self.types.contains_key(&entry.hash) {
            return Err(RegistrationError::DuplicateType(entry.name));
        }
        if let Some(parent) = entry.parent {
            if !self.types.contains_key(&parent) {
                return Err(RegistrationError::TypeNotFound(parent.to_string()));
            }
            self.hierarchy
                .add(entry.hash, parent)
                .map_err(|_| RegistrationError::CircularInheritance(entry.name.clone()))?;
        }
        let hash = entry.hash;
        self.types.insert(hash, entry);
        Ok(hash)
    }

    /// Register a function.
    pub fn register_function(&mut self, entry: FunctionEntry) -> Result<TypeHash, RegistrationError> {
        if self.functions.contains_key(&entry.hash) {
            return Err(RegistrationError::DuplicateType(entry.name));
        }
        let hash = entry.hash;
        self.functions.insert(hash, entry);
        Ok(hash)
    }

    /// Register (or look up) the specialization of a generic type.
    ///
    /// The instance copies the template's layout and drops its `TEMPLATE` flag.
    pub fn instantiate(
        &mut self,
        template: TypeHash,
        args: &[TypeHash],
    ) -> Result<TypeHash, RegistrationError> {
        let key = (template, args.to_vec());
        if let Some(&existing) = self.instances.get(&key) {
            return Ok(existing);
        }
        let base = self
            .types
            .get(&template)
            .ok_or_else(|| RegistrationError::TypeNotFound(template.to_string()))?
            .clone();
        let arg_names: Vec<String> = args.iter().map(|a| self.name_of(*a)).collect();
        let name = format!("{}<{}>", base.name, arg_names.join(", "));
        let hash = TypeHash::from_template_instance(template, args);
        let entry = TypeEntry {
            name,
            hash,
            flags: base.flags - TypeFlags::TEMPLATE,
            template: Some(TemplateInstance {
                template,
                args: args.to_vec(),
            }),
            ..base
        };
        if let Some(parent) = entry.parent {
            self.hierarchy
                .add(hash, parent)
                .map_err(|_| RegistrationError::CircularInheritance(entry.name.clone()))?;
        }
        self.types.insert(hash, entry);
        self.instances.insert(key, hash);
        Ok(hash)
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Get a type by hash.
    pub fn get(&self, hash: TypeHash) -> Option<&TypeEntry> {
        self.types.get(&hash)
    }

    /// Get a function by hash.
    pub fn function(&self, hash: TypeHash) -> Option<&FunctionEntry> {
        self.functions.get(&hash)
    }

    /// Stack size of a value of this type.
    pub fn size_of(&self, hash: TypeHash) -> Option<u32> {
        self.types.get(&hash).map(|t| t.size)
    }

    /// Whether values of this type are reference-counted objects.
    pub fn is_object(&self, hash: TypeHash) -> bool {
        self.types.get(&hash).is_some_and(TypeEntry::is_object)
    }

    /// Whether this is the execution-unit type or one of its descendants.
    pub fn is_shred(&self, hash: TypeHash) -> bool {
        self.types.get(&hash).is_some_and(TypeEntry::is_shred)
            || self.hierarchy.is_a(hash, primitives::SHRED)
    }

    /// Whether the type carries the given flags.
    pub fn has_flags(&self, hash: TypeHash, flags: TypeFlags) -> bool {
        self.types.get(&hash).is_some_and(|t| t.flags.contains(flags))
    }

    /// Direct parent of a class.
    pub fn parent_of(&self, hash: TypeHash) -> Option<TypeHash> {
        self.hierarchy.parent(hash)
    }

    /// Ancestors from the root down to the direct parent.
    pub fn ancestors(&self, hash: TypeHash) -> Vec<TypeHash> {
        self.hierarchy.ancestors(hash)
    }

    /// Specialization origin of a type.
    pub fn template_of(&self, hash: TypeHash) -> Option<&TemplateInstance> {
        self.types.get(&hash).and_then(|t| t.template.as_ref())
    }

    /// Human-readable name for diagnostics.
    pub fn name_of(&self, hash: TypeHash) -> String {
        self.types
            .get(&hash)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| format!("{:?}", hash))
    }

    /// Number of registered types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
