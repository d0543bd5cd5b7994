//! Jump labels and `goto`.
//!
//! Labels are function-scoped. A backward `goto` resolves immediately; a
//! forward one stays pending until its label is defined. Each side records
//! the owned slots live at that point so a jump never skips a release.

use rustc_hash::FxHashMap;
use tempo_core::{CompilationError, Span};

use crate::pending::PendingBranches;

type Result<T> = std::result::Result<T, CompilationError>;

/// Owned slots live at a program point, as `(serial, offset)`.
pub type LiveOwned = Vec<(u32, u32)>;

#[derive(Debug)]
struct Label {
    pc: usize,
    live: LiveOwned,
    used: bool,
    span: Span,
}

#[derive(Debug)]
struct PendingGoto {
    branches: PendingBranches,
    live: Vec<LiveOwned>,
    span: Span,
}

/// Labels of one code.
#[derive(Debug, Default)]
pub struct LabelTable {
    labels: FxHashMap<String, Label>,
    pending: FxHashMap<String, PendingGoto>,
}

/// How a `goto` should be emitted.
#[derive(Debug, PartialEq, Eq)]
pub enum GotoTarget {
    /// Target known: release these offsets (innermost first) then jump.
    Backward {
        /// Label pc.
        pc: usize,
        /// Offsets to release before jumping.
        release: Vec<u32>,
    },
    /// Target unknown: emit a pending jump.
    Forward,
}

impl LabelTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan a `goto` from a point where `live` owned slots exist.
    pub fn plan_goto(&mut self, name: &str, live: &LiveOwned) -> GotoTarget {
        match self.labels.get_mut(name) {
            Some(label) => {
                label.used = true;
                let common = label
                    .live
                    .iter()
                    .zip(live)
                    .take_while(|(a, b)| a == b)
                    .count();
                let release = live[common..].iter().rev().map(|(_, off)| *off).collect();
                GotoTarget::Backward {
                    pc: label.pc,
                    release,
                }
            }
            None => GotoTarget::Forward,
        }
    }

    /// Record a forward `goto` emitted at `pc`.
    pub fn add_forward(&mut self, name: &str, pc: usize, live: LiveOwned, span: Span) {
        let entry = self
            .pending
            .entry(name.to_string())
            .or_insert_with(|| PendingGoto {
                branches: PendingBranches::new(),
                live: Vec::new(),
                span,
            });
        entry.branches.push(pc);
        entry.live.push(live);
    }

    /// Define a label at `pc` and return the forward jumps to patch.
    pub fn define(
        &mut self,
        name: &str,
        pc: usize,
        live: LiveOwned,
        span: Span,
    ) -> Result<Vec<(usize, usize)>> {
        let mut patches = Vec::new();
        let mut used = false;
        if let Some(mut pending) = self.pending.remove(name) {
            if pending.live.iter().any(|at_goto| *at_goto != live) {
                return Err(CompilationError::GotoCrossesScope {
                    name: name.to_string(),
                    span: pending.span,
                });
            }
            patches.extend(pending.branches.drain_to(pc));
            used = true;
        }
        self.labels.insert(
            name.to_string(),
            Label {
                pc,
                live,
                used,
                span,
            },
        );
        Ok(patches)
    }

    /// Check the table when its code is finished.
    pub fn finish(&self) -> Result<()> {
        let earliest = self.pending.iter().min_by_key(|(_, goto)| goto.span);
        if let Some((name, goto)) = earliest {
            return Err(CompilationError::UndefinedLabel {
                name: name.to_string(),
                span: goto.span,
            });
        }
        let unused = self
            .labels
            .iter()
            .filter(|(_, l)| !l.used)
            .min_by_key(|(_, label)| label.span);
        if let Some((name, label)) = unused {
            return Err(CompilationError::UnusedLabel {
                name: name.to_string(),
                span: label.span,
            });
        }
        Ok(())
    }
}
