//! Specialization bookkeeping.
//!
//! Records which `(template, args)` keys were specialized, and which are
//! being emitted right now so a recursive use waits on a ticket instead of
//! starting a second emission. Entries added by a unit are staged until the
//! unit is committed and dropped if it is not.

use rustc_hash::{FxHashMap, FxHashSet};
use tempo_core::TypeHash;

/// Cache of template specializations.
///
/// Maps (template, args) → instance key.
#[derive(Debug, Default, Clone)]
pub struct SpecializationCache {
    /// Function specializations: (template, args) → key
    functions: FxHashMap<(TypeHash, Vec<TypeHash>), TypeHash>,
    /// Class specializations: (template, args) → instance
    classes: FxHashMap<(TypeHash, Vec<TypeHash>), TypeHash>,
    /// Keys whose emission has started but not finished.
    in_progress: FxHashSet<TypeHash>,
    /// Function entries added since the last commit.
    staged_functions: Vec<(TypeHash, Vec<TypeHash>)>,
    /// Class entries added since the last commit.
    staged_classes: Vec<(TypeHash, Vec<TypeHash>)>,
}

impl SpecializationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished function specialization.
    pub fn cache_function(&mut self, template: TypeHash, args: Vec<TypeHash>, key: TypeHash) {
        let entry = (template, args);
        if self.functions.insert(entry.clone(), key).is_none() {
            self.staged_functions.push(entry);
        }
    }

    /// Key of a finished function specialization.
    pub fn function(&self, template: TypeHash, args: &[TypeHash]) -> Option<TypeHash> {
        self.functions.get(&(template, args.to_vec())).copied()
    }

    /// Record a finished class specialization.
    pub fn cache_class(&mut self, template: TypeHash, args: Vec<TypeHash>, instance: TypeHash) {
        let entry = (template, args);
        if self.classes.insert(entry.clone(), instance).is_none() {
            self.staged_classes.push(entry);
        }
    }

    /// Instance of a finished class specialization.
    pub fn class(&self, template: TypeHash, args: &[TypeHash]) -> Option<TypeHash> {
        self.classes.get(&(template, args.to_vec())).copied()
    }

    /// Mark `key` as being emitted. Returns `false` if it already was.
    pub fn begin(&mut self, key: TypeHash) -> bool {
        self.in_progress.insert(key)
    }

    /// Mark `key` as done.
    pub fn end(&mut self, key: TypeHash) {
        self.in_progress.remove(&key);
    }

    /// Whether `key` is being emitted.
    pub fn is_in_progress(&self, key: TypeHash) -> bool {
        self.in_progress.contains(&key)
    }

    /// Number of function specializations.
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Number of class specializations.
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Keep every staged entry.
    pub fn commit(&mut self) {
        self.staged_functions.clear();
        self.staged_classes.clear();
    }

    /// Drop the staged entries and the in-progress set.
    pub fn rollback(&mut self) {
        for entry in self.staged_functions.drain(..) {
            self.functions.remove(&entry);
        }
        for entry in self.staged_classes.drain(..) {
            self.classes.remove(&entry);
        }
        self.in_progress.clear();
    }
}
