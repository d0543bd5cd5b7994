//! Placeholder callees.
//!
//! A call to a function whose code does not exist yet (a forward reference,
//! recursion, or a generic specialization still being emitted) carries a
//! [`Ticket`]. The ticket is filled exactly once when the target finishes;
//! the instruction holding it is never rewritten.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use rustc_hash::FxHashMap;
use tempo_core::{CompilationError, Span, TypeHash};

use crate::bytecode::{Code, SharedCode};

/// A handle to code that will exist once its definition is emitted.
///
/// Tickets hold a weak reference so a recursive function does not keep
/// itself alive; the [`Program`](crate::Program) owns every code strongly.
#[derive(Clone)]
pub struct Ticket {
    key: TypeHash,
    name: Arc<str>,
    slot: Arc<OnceLock<Weak<Code>>>,
}

impl Ticket {
    fn new(key: TypeHash, name: &str) -> Self {
        Self {
            key,
            name: Arc::from(name),
            slot: Arc::new(OnceLock::new()),
        }
    }

    /// Identity of the awaited code: a function hash or specialization key.
    pub fn key(&self) -> TypeHash {
        self.key
    }

    /// Name of the awaited function.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the target has been emitted.
    pub fn is_resolved(&self) -> bool {
        self.slot.get().is_some()
    }

    /// The target code, if it was emitted and is still alive.
    pub fn get(&self) -> Option<SharedCode> {
        self.slot.get().and_then(Weak::upgrade)
    }

    /// Whether two tickets share one slot.
    pub fn same_slot(&self, other: &Ticket) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    fn fill(&self, code: &SharedCode) -> bool {
        self.slot.set(Arc::downgrade(code)).is_ok()
    }
}

impl PartialEq for Ticket {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket")
            .field("name", &self.name)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// All tickets handed out while emitting one unit.
#[derive(Debug, Default)]
pub struct TicketBook {
    tickets: FxHashMap<TypeHash, (Ticket, Span)>,
}

impl TicketBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// The ticket for `key`, created on first request.
    ///
    /// Every request for the same key shares one slot.
    pub fn ticket(&mut self, key: TypeHash, name: &str, span: Span) -> Ticket {
        self.tickets
            .entry(key)
            .or_insert_with(|| (Ticket::new(key, name), span))
            .0
            .clone()
    }

    /// Fill the ticket for `key`, if one was handed out.
    ///
    /// Returns `false` when no ticket exists or it was already filled.
    pub fn resolve(&mut self, key: TypeHash, code: &SharedCode) -> bool {
        match self.tickets.get(&key) {
            Some((ticket, _)) => ticket.fill(code),
            None => false,
        }
    }

    /// The first ticket that was never filled, as an error.
    pub fn check_resolved(&self) -> Result<(), CompilationError> {
        let earliest = self
            .tickets
            .values()
            .filter(|(ticket, _)| !ticket.is_resolved())
            .min_by_key(|(_, span)| *span);
        match earliest {
            Some((ticket, span)) => Err(CompilationError::UnknownFunction {
                name: ticket.name().to_string(),
                span: *span,
            }),
            None => Ok(()),
        }
    }

    /// Number of tickets handed out.
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// Whether no ticket was handed out.
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Forget every ticket.
    pub fn clear(&mut self) {
        self.tickets.clear();
    }
}
