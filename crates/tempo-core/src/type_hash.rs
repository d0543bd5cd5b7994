//! Deterministic hash-based type identity.
//!
//! [`TypeHash`] is a 64-bit hash identifying a type, function or template
//! instance. Hashes are computed from names, so a reference can be resolved
//! before its target is registered and the same name always maps to the
//! same identity.
//!
//! # Examples
//!
//! ```
//! use tempo_core::TypeHash;
//!
//! let int_hash = TypeHash::from_name("int");
//! assert_eq!(int_hash, tempo_core::primitives::INT);
//!
//! let f1 = TypeHash::from_function("play", &[TypeHash::from_name("int")]);
//! let f2 = TypeHash::from_function("play", &[TypeHash::from_name("float")]);
//! assert_ne!(f1, f2);
//! ```

use std::fmt;
use xxhash_rust::const_xxh64::xxh64 as const_xxh64;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants.
///
/// Types, functions and template instances that share a name still hash apart.
pub mod hash_constants {
    /// Separator constant for chained components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for function hashes.
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for member hashes (fields, methods, built-in members).
    pub const MEMBER: u64 = 0x7d3c8b4a92e15f6d;

    /// Parameter position mixing constants.
    pub const PARAM_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

/// A deterministic 64-bit hash identifying a type, function, or member.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

#[inline]
fn param_marker(i: usize) -> u64 {
    hash_constants::PARAM_MARKERS
        .get(i)
        .copied()
        .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64))
}

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a qualified type name.
    ///
    /// Usable in const context so primitive hashes are computed at compile time.
    #[inline]
    pub const fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ const_xxh64(name.as_bytes(), 0))
    }

    /// Create a function hash from its name and parameter types.
    ///
    /// Parameter order matters.
    pub fn from_function(name: &str, param_hashes: &[TypeHash]) -> Self {
        let mut hash = hash_constants::FUNCTION ^ xxh64(name.as_bytes(), 0);
        for (i, param) in param_hashes.iter().enumerate() {
            hash = hash
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(param_marker(i) ^ param.0);
        }
        TypeHash(hash)
    }

    /// Create a member hash from its owner type and member name.
    pub fn from_member(owner: TypeHash, name: &str) -> Self {
        TypeHash(hash_constants::MEMBER ^ owner.0.rotate_left(17) ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a template instance hash from a template and its type arguments.
    ///
    /// `Pair<int, float>` and `Pair<float, int>` hash apart.
    pub fn from_template_instance(template: TypeHash, args: &[TypeHash]) -> Self {
        let mut hash = template.0;
        for (i, arg) in args.iter().enumerate() {
            hash = hash
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(param_marker(i) ^ arg.0);
        }
        TypeHash(hash)
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Well-known hashes for the built-in types.
pub mod primitives {
    use super::TypeHash;

    /// `void`
    pub const VOID: TypeHash = TypeHash::from_name("void");
    /// `int`, also used for booleans and chars.
    pub const INT: TypeHash = TypeHash::from_name("int");
    /// `float`
    pub const FLOAT: TypeHash = TypeHash::from_name("float");
    /// `dur`, a span of virtual time.
    pub const DUR: TypeHash = TypeHash::from_name("dur");
    /// `time`, a point on the virtual clock.
    pub const TIME: TypeHash = TypeHash::from_name("time");
    /// `complex` (re, im)
    pub const COMPLEX: TypeHash = TypeHash::from_name("complex");
    /// `polar` (mod, phase)
    pub const POLAR: TypeHash = TypeHash::from_name("polar");
    /// `vec3`
    pub const VEC3: TypeHash = TypeHash::from_name("vec3");
    /// `vec4`
    pub const VEC4: TypeHash = TypeHash::from_name("vec4");
    /// `string`
    pub const STRING: TypeHash = TypeHash::from_name("string");
    /// `Object`, the root of all reference-counted types.
    pub const OBJECT: TypeHash = TypeHash::from_name("Object");
    /// `Shred`, the execution unit. Its lifetime belongs to the scheduler.
    pub const SHRED: TypeHash = TypeHash::from_name("Shred");
    /// `Fork`, the handle returned by a spawn-and-join.
    pub const FORK: TypeHash = TypeHash::from_name("Fork");
    /// `Array`
    pub const ARRAY: TypeHash = TypeHash::from_name("Array");
    /// `Tuple`
    pub const TUPLE: TypeHash = TypeHash::from_name("Tuple");
    /// `@function`, the type of function values.
    pub const FUNCTION: TypeHash = TypeHash::from_name("@function");
    /// `@null`
    pub const NULL: TypeHash = TypeHash::from_name("@null");
    /// `Class`, the type of type-of queries.
    pub const CLASS: TypeHash = TypeHash::from_name("Class");
    /// `@Vararg`
    pub const VARARG: TypeHash = TypeHash::from_name("@Vararg");
}

/// Byte sizes of built-in values on the VM stack.
pub mod sizes {
    /// Integers, pointers, object references and code addresses.
    pub const SZ_INT: u32 = 8;
    /// Floats, durations and times.
    pub const SZ_FLOAT: u32 = 8;
    /// complex and polar.
    pub const SZ_COMPLEX: u32 = 2 * SZ_FLOAT;
    /// vec3
    pub const SZ_VEC3: u32 = 3 * SZ_FLOAT;
    /// vec4
    pub const SZ_VEC4: u32 = 4 * SZ_FLOAT;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_hash_determinism() {
        assert_eq!(TypeHash::from_name("int"), TypeHash::from_name("int"));
        assert_eq!(
            TypeHash::from_name("Synth::Osc"),
            TypeHash::from_name("Synth::Osc")
        );
    }

    #[test]
    fn primitives_match_from_name() {
        assert_eq!(primitives::INT, TypeHash::from_name("int"));
        assert_eq!(primitives::SHRED, TypeHash::from_name("Shred"));
        assert_ne!(primitives::INT, primitives::FLOAT);
    }

    #[test]
    fn function_hash_overload_distinction() {
        let a = TypeHash::from_function("f", &[primitives::INT, primitives::FLOAT]);
        let b = TypeHash::from_function("f", &[primitives::FLOAT, primitives::INT]);
        let c = TypeHash::from_function("f", &[primitives::INT]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn function_and_type_domains_differ() {
        assert_ne!(
            TypeHash::from_name("osc"),
            TypeHash::from_function("osc", &[])
        );
    }

    #[test]
    fn template_instance_order_matters() {
        let pair = TypeHash::from_name("Pair");
        let a = TypeHash::from_template_instance(pair, &[primitives::INT, primitives::FLOAT]);
        let b = TypeHash::from_template_instance(pair, &[primitives::FLOAT, primitives::INT]);
        assert_ne!(a, b);
    }

    #[test]
    fn member_hash_depends_on_owner() {
        let a = TypeHash::from_member(primitives::COMPLEX, "re");
        let b = TypeHash::from_member(primitives::POLAR, "re");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_hash() {
        assert!(TypeHash::EMPTY.is_empty());
        assert!(!primitives::INT.is_empty());
    }
}
