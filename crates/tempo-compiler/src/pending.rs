//! Branches waiting for their target.

/// Instruction indices whose jump target is not known yet.
///
/// Each construct owns its lists; draining writes one resolution pc into
/// every entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingBranches {
    entries: Vec<usize>,
}

impl PendingBranches {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the instruction at `pc`.
    pub fn push(&mut self, pc: usize) {
        self.entries.push(pc);
    }

    /// Take every entry, leaving the list empty.
    ///
    /// The caller patches each returned index with `target`.
    pub fn drain_to(&mut self, target: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries.drain(..).map(move |pc| (pc, target))
    }

    /// Number of unresolved entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether every entry was resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
