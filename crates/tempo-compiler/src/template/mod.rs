//! Lazy specialization of generic functions and classes.
//!
//! Generic definitions are collected before emission and never emitted at
//! their definition. The first concrete use emits the body under a type
//! substitution:
//!
//! ```text
//! fun T id<T>(T x) { return x; }     collected, no code
//! id<int>(1);                        key = (id, [int]) -> emit once, fill ticket
//! id<int>(2);                        key seen -> reuse code
//! ```

mod cache;
mod instantiation;

pub use cache::SpecializationCache;

use rustc_hash::FxHashMap;
use tempo_ast::{ClassDef, FuncDef, Section};
use tempo_core::TypeHash;

/// Generic definitions and the substitutions active while emitting them.
#[derive(Debug, Default)]
pub struct Templates<'ast> {
    funcs: FxHashMap<TypeHash, &'ast FuncDef<'ast>>,
    classes: FxHashMap<TypeHash, &'ast ClassDef<'ast>>,
    /// Type parameter to argument, innermost last.
    substitutions: Vec<FxHashMap<TypeHash, TypeHash>>,
    /// Method definition hash to specialized code key, innermost last.
    method_keys: Vec<FxHashMap<TypeHash, TypeHash>>,
    /// Emitted specializations.
    pub cache: SpecializationCache,
    /// Definitions collected since the last commit.
    staged_funcs: Vec<TypeHash>,
    staged_classes: Vec<TypeHash>,
}

impl<'ast> Templates<'ast> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every generic definition in `sections`, including class members.
    pub fn collect(&mut self, sections: &'ast [Section<'ast>]) {
        for section in sections {
            match *section {
                Section::Func(def) if def.is_template() => {
                    if self.funcs.insert(def.hash, def).is_none() {
                        self.staged_funcs.push(def.hash);
                    }
                }
                Section::Class(def) => {
                    if def.is_template() {
                        self.collect_class(def);
                    }
                    self.collect(def.body);
                }
                Section::TypeAlias(alias) => {
                    if let Some(def) = alias.class.filter(|c| c.is_template()) {
                        self.collect_class(def);
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_class(&mut self, def: &'ast ClassDef<'ast>) {
        if self.classes.insert(def.ty, def).is_none() {
            self.staged_classes.push(def.ty);
        }
    }

    /// Generic function definition by hash.
    pub fn func(&self, hash: TypeHash) -> Option<&'ast FuncDef<'ast>> {
        self.funcs.get(&hash).copied()
    }

    /// Generic class definition by template type.
    pub fn class(&self, ty: TypeHash) -> Option<&'ast ClassDef<'ast>> {
        self.classes.get(&ty).copied()
    }

    /// Bind `params` to `args` for the duration of a specialization.
    pub fn push_substitution(&mut self, params: &[TypeHash], args: &[TypeHash]) {
        let map = params.iter().copied().zip(args.iter().copied()).collect();
        self.substitutions.push(map);
    }

    /// Drop the innermost substitution.
    pub fn pop_substitution(&mut self) {
        self.substitutions.pop();
    }

    /// Apply the innermost substitution to `ty`.
    pub fn resolve(&self, ty: TypeHash) -> TypeHash {
        self.substitutions
            .last()
            .and_then(|map| map.get(&ty))
            .copied()
            .unwrap_or(ty)
    }

    /// Map the methods of a class specialization to their own code keys.
    pub fn push_method_keys(&mut self, body: &[Section<'_>], args: &[TypeHash]) {
        let map = body
            .iter()
            .filter_map(|section| match section {
                Section::Func(def) => Some((
                    def.hash,
                    TypeHash::from_template_instance(def.hash, args),
                )),
                _ => None,
            })
            .collect();
        self.method_keys.push(map);
    }

    /// Drop the innermost method key map.
    pub fn pop_method_keys(&mut self) {
        self.method_keys.pop();
    }

    /// Code key of a method inside the class specialization being emitted.
    pub fn method_key(&self, hash: TypeHash) -> Option<TypeHash> {
        self.method_keys
            .iter()
            .rev()
            .find_map(|map| map.get(&hash))
            .copied()
    }

    /// Keep the definitions and specializations of the last unit.
    pub fn commit(&mut self) {
        self.staged_funcs.clear();
        self.staged_classes.clear();
        self.cache.commit();
    }

    /// Drop everything the last uncommitted unit added.
    pub fn reset(&mut self) {
        self.substitutions.clear();
        self.method_keys.clear();
        for hash in self.staged_funcs.drain(..) {
            self.funcs.remove(&hash);
        }
        for ty in self.staged_classes.drain(..) {
            self.classes.remove(&ty);
        }
        self.cache.rollback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use tempo_core::{FuncFlags, Span, primitives};

    fn generic<'a>(arena: &'a Bump, name: &str, param: TypeHash) -> &'a FuncDef<'a> {
        arena.alloc(FuncDef {
            name: arena.alloc_str(name),
            hash: TypeHash::from_function(name, &[]),
            params: &[],
            ret: param,
            body: Some(&[]),
            flags: FuncFlags::TEMPLATE,
            owner: None,
            template_params: arena.alloc_slice_copy(&[param]),
            span: Span::default(),
        })
    }

    #[test]
    fn collect_skips_plain_functions() {
        let arena = Bump::new();
        let t = TypeHash::from_name("T");
        let id = generic(&arena, "id", t);
        let plain = arena.alloc(FuncDef {
            template_params: &[],
            flags: FuncFlags::empty(),
            ..*generic(&arena, "plain", t)
        });
        let sections = arena.alloc_slice_copy(&[Section::Func(id), Section::Func(plain)]);

        let mut templates = Templates::new();
        templates.collect(sections);
        assert!(templates.func(id.hash).is_some());
        assert!(templates.func(plain.hash).is_none());
    }

    #[test]
    fn substitution_is_scoped() {
        let t = TypeHash::from_name("T");
        let mut templates = Templates::new();
        assert_eq!(templates.resolve(t), t);

        templates.push_substitution(&[t], &[primitives::FLOAT]);
        assert_eq!(templates.resolve(t), primitives::FLOAT);
        assert_eq!(templates.resolve(primitives::INT), primitives::INT);

        templates.push_substitution(&[t], &[primitives::INT]);
        assert_eq!(templates.resolve(t), primitives::INT);
        templates.pop_substitution();
        assert_eq!(templates.resolve(t), primitives::FLOAT);
    }

    #[test]
    fn method_keys_depend_on_args() {
        let arena = Bump::new();
        let t = TypeHash::from_name("T");
        let get = generic(&arena, "get", t);
        let body = [Section::Func(get)];

        let mut templates = Templates::new();
        templates.push_method_keys(&body, &[primitives::INT]);
        let int_key = templates.method_key(get.hash);
        templates.pop_method_keys();
        templates.push_method_keys(&body, &[primitives::FLOAT]);
        let float_key = templates.method_key(get.hash);

        assert!(int_key.is_some());
        assert_ne!(int_key, float_key);
        templates.reset();
        assert_eq!(templates.method_key(get.hash), None);
    }

    #[test]
    fn reset_drops_uncommitted_definitions() {
        let arena = Bump::new();
        let t = TypeHash::from_name("T");
        let kept = generic(&arena, "kept", t);
        let dropped = generic(&arena, "dropped", t);

        let mut templates = Templates::new();
        templates.collect(arena.alloc_slice_copy(&[Section::Func(kept)]));
        templates.commit();
        templates.collect(arena.alloc_slice_copy(&[Section::Func(kept), Section::Func(dropped)]));
        templates.reset();

        assert!(templates.func(kept.hash).is_some());
        assert!(templates.func(dropped.hash).is_none());
    }
}
