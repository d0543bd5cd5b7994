//! Flag sets attached to types and functions by the type checker.

use bitflags::bitflags;

bitflags! {
    /// Properties of a registered type that change how values are emitted.
    ///
    /// ```
    /// use tempo_core::TypeFlags;
    ///
    /// let event = TypeFlags::OBJECT | TypeFlags::BUILTIN;
    /// assert!(event.contains(TypeFlags::OBJECT));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u32 {
        /// Reference-counted heap object.
        const OBJECT = 1 << 0;
        /// The execution unit type. Never reference-counted by emitted code.
        const SHRED = 1 << 1;
        /// Registered by the host rather than declared in script.
        const BUILTIN = 1 << 2;
        /// Enumeration; values are compile-time constants.
        const ENUM = 1 << 3;
        /// Tagged storage sized to its largest member.
        const UNION = 1 << 4;
        /// Generic type that still has unbound parameters.
        const TEMPLATE = 1 << 5;
        /// Cannot be instantiated.
        const ABSTRACT = 1 << 6;
        /// Function pointer type.
        const FUNCTION = 1 << 7;
        /// Tuple with a statically known shape.
        const TUPLE = 1 << 8;
        /// Array type.
        const ARRAY = 1 << 9;
        /// complex, polar, vec3 or vec4.
        const VECTOR = 1 << 10;
    }
}

bitflags! {
    /// Properties of a function definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FuncFlags: u32 {
        /// Instance method; slot 0 holds the receiver.
        const MEMBER = 1 << 0;
        /// Static method of a class.
        const STATIC = 1 << 1;
        /// No observable side effects (conservative).
        const PURE = 1 << 2;
        /// Takes a variadic tail.
        const VARIADIC = 1 << 3;
        /// Generic function with unbound parameters.
        const TEMPLATE = 1 << 4;
        /// Constructor.
        const CTOR = 1 << 5;
        /// Destructor.
        const DTOR = 1 << 6;
        /// Host-provided callback.
        const BUILTIN = 1 << 7;
    }
}
