//! Core types shared by the tempo compiler crates.
//!
//! - [`Span`] source locations
//! - [`TypeHash`] deterministic identities, plus [`primitives`] and [`sizes`]
//! - [`TypeFlags`] and [`FuncFlags`]
//! - [`CompilationError`] and [`RegistrationError`]

mod error;
mod flags;
mod span;
mod type_hash;

pub use error::{CompilationError, RegistrationError};
pub use flags::{FuncFlags, TypeFlags};
pub use span::Span;
pub use type_hash::{TypeHash, hash_constants, primitives, sizes};
