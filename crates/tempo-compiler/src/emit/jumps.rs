//! Break and continue bookkeeping.
//!
//! Each loop or switch pushes a context holding its pending break and
//! continue branches and the frame depth at entry. A non-local exit releases
//! every owned slot opened since that depth before jumping.

use std::fmt;

use crate::pending::PendingBranches;

/// Kind of construct a context belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakableKind {
    /// Accepts break and continue.
    Loop,
    /// Accepts break only.
    Switch,
}

/// One open loop or switch.
#[derive(Debug)]
pub struct BreakableContext {
    /// Loop or switch.
    pub kind: BreakableKind,
    /// Frame scope depth when the construct was entered.
    pub depth: usize,
    /// Pending `break` jumps.
    pub breaks: PendingBranches,
    /// Pending `continue` jumps (loops only).
    pub continues: PendingBranches,
}

/// Stack of open loops and switches, innermost last.
#[derive(Debug, Default)]
pub struct JumpManager {
    contexts: Vec<BreakableContext>,
}

impl JumpManager {
    /// Create a new jump manager.
    pub fn new() -> Self {
        Self::default()
    }

    fn enter(&mut self, kind: BreakableKind, depth: usize) {
        self.contexts.push(BreakableContext {
            kind,
            depth,
            breaks: PendingBranches::new(),
            continues: PendingBranches::new(),
        });
    }

    /// Enter a loop opened at frame depth `depth`.
    pub fn enter_loop(&mut self, depth: usize) {
        self.enter(BreakableKind::Loop, depth);
    }

    /// Enter a switch opened at frame depth `depth`.
    pub fn enter_switch(&mut self, depth: usize) {
        self.enter(BreakableKind::Switch, depth);
    }

    /// Close the innermost context and hand back its pending branches.
    pub fn exit(&mut self) -> Option<BreakableContext> {
        self.contexts.pop()
    }

    /// Depth to unwind to for a `break`.
    pub fn break_depth(&self) -> Result<usize, BreakError> {
        self.contexts
            .last()
            .map(|ctx| ctx.depth)
            .ok_or(BreakError::NotInBreakable)
    }

    /// Record a `break` jump on the innermost context.
    pub fn add_break(&mut self, pc: usize) {
        if let Some(ctx) = self.contexts.last_mut() {
            ctx.breaks.push(pc);
        }
    }

    /// Depth to unwind to for a `continue`.
    ///
    /// Switches are transparent: the innermost enclosing loop is targeted.
    pub fn continue_depth(&self) -> Result<usize, BreakError> {
        self.innermost_loop()
            .map(|idx| self.contexts[idx].depth)
            .ok_or(BreakError::NotInLoop)
    }

    /// Record a `continue` jump on the innermost loop.
    pub fn add_continue(&mut self, pc: usize) {
        if let Some(idx) = self.innermost_loop() {
            self.contexts[idx].continues.push(pc);
        }
    }

    fn innermost_loop(&self) -> Option<usize> {
        self.contexts
            .iter()
            .rposition(|ctx| ctx.kind == BreakableKind::Loop)
    }

    /// Whether a loop is open.
    pub fn in_loop(&self) -> bool {
        self.innermost_loop().is_some()
    }

    /// Whether the innermost context is a switch.
    pub fn in_switch(&self) -> bool {
        self.contexts
            .last()
            .is_some_and(|ctx| ctx.kind == BreakableKind::Switch)
    }

    /// Whether any loop or switch is open.
    pub fn in_breakable(&self) -> bool {
        !self.contexts.is_empty()
    }

    /// Number of open loops.
    pub fn loop_depth(&self) -> usize {
        self.contexts
            .iter()
            .filter(|ctx| ctx.kind == BreakableKind::Loop)
            .count()
    }

    /// Number of open loops and switches.
    pub fn breakable_depth(&self) -> usize {
        self.contexts.len()
    }
}

/// Error from break/continue statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakError {
    /// Continue used outside of a loop (switches don't support continue).
    NotInLoop,
    /// Break used outside of a breakable context (loop or switch).
    NotInBreakable,
}

impl fmt::Display for BreakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakError::NotInLoop => write!(f, "continue statement not inside a loop"),
            BreakError::NotInBreakable => {
                write!(f, "break statement not inside a loop or switch")
            }
        }
    }
}

impl std::error::Error for BreakError {}
