//! Class hierarchy graph.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: class type hashes
//! - Edges: child -> parent

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use tempo_core::{RegistrationError, TypeHash};

/// Inheritance relation between registered classes.
#[derive(Debug, Default, Clone)]
pub struct ClassHierarchy {
    graph: DiGraph<TypeHash, ()>,
    nodes: FxHashMap<TypeHash, NodeIndex>,
}

impl ClassHierarchy {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, ty: TypeHash) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&ty) {
            return idx;
        }
        let idx = self.graph.add_node(ty);
        self.nodes.insert(ty, idx);
        idx
    }

    /// Record that `child` derives from `parent`.
    ///
    /// Rejects the edge if it would close a cycle.
    pub fn add(&mut self, child: TypeHash, parent: TypeHash) -> Result<(), RegistrationError> {
        let c = self.node(child);
        let p = self.node(parent);
        let edge = self.graph.add_edge(c, p, ());
        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(RegistrationError::CircularInheritance(child.to_string()));
        }
        Ok(())
    }

    /// Direct parent of a class.
    pub fn parent(&self, ty: TypeHash) -> Option<TypeHash> {
        let idx = *self.nodes.get(&ty)?;
        self.graph
            .neighbors(idx)
            .next()
            .map(|p| self.graph[p])
    }

    /// Ancestors from the root down to the direct parent (excludes `ty`).
    pub fn ancestors(&self, ty: TypeHash) -> Vec<TypeHash> {
        let mut chain = Vec::new();
        let mut current = self.parent(ty);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.parent(parent);
        }
        chain.reverse();
        chain
    }

    /// Whether `ty` is `ancestor` or derives from it.
    pub fn is_a(&self, ty: TypeHash, ancestor: TypeHash) -> bool {
        let mut current = Some(ty);
        while let Some(t) = current {
            if t == ancestor {
                return true;
            }
            current = self.parent(t);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(name: &str) -> TypeHash {
        TypeHash::from_name(name)
    }

    #[test]
    fn ancestors_root_first() {
        let mut tree = ClassHierarchy::new();
        tree.add(h("Osc"), h("UGen")).unwrap();
        tree.add(h("SinOsc"), h("Osc")).unwrap();
        tree.add(h("UGen"), h("Object")).unwrap();

        assert_eq!(
            tree.ancestors(h("SinOsc")),
            vec![h("Object"), h("UGen"), h("Osc")]
        );
        assert!(tree.ancestors(h("Object")).is_empty());
    }

    #[test]
    fn is_a_walks_chain() {
        let mut tree = ClassHierarchy::new();
        tree.add(h("B"), h("A")).unwrap();
        tree.add(h("C"), h("B")).unwrap();
        assert!(tree.is_a(h("C"), h("A")));
        assert!(tree.is_a(h("C"), h("C")));
        assert!(!tree.is_a(h("A"), h("C")));
    }

    #[test]
    fn cycle_rejected() {
        let mut tree = ClassHierarchy::new();
        tree.add(h("B"), h("A")).unwrap();
        let err = tree.add(h("A"), h("B")).unwrap_err();
        assert!(matches!(err, RegistrationError::CircularInheritance(_)));
        assert_eq!(tree.parent(h("A")), None);
    }
}
