//! Frame layout for one code.
//!
//! Slots are bump-allocated in declaration order and reclaimed in LIFO order
//! when their scope closes. Reference-counted ("owned") slots are reported on
//! exit so the emitter can release them.
//!
//! ```text
//! { int a; Osc o; { Osc p; } }
//!
//! offset:  0      8      16
//!          a      o*     p*       (* owned)
//!
//! inner scope exit  -> release 16
//! outer scope exit  -> release 8
//! ```

use rustc_hash::FxHashMap;
use tempo_ast::ValueId;

// ============================================================================
// Types
// ============================================================================

/// One allocated slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Local {
    /// Declared value living in the slot, if any.
    pub id: Option<ValueId>,
    /// Byte size.
    pub size: u32,
    /// Byte offset in the frame.
    pub offset: u32,
    /// Holds a reference-counted object released on scope exit.
    pub owned: bool,
    /// Allocation number, unique within the frame even when offsets are reused.
    pub serial: u32,
}

/// Slot allocator with nested scopes.
#[derive(Debug, Default, Clone)]
pub struct Frame {
    /// Live slots in allocation order.
    locals: Vec<Local>,
    /// Index into `locals` where each open scope starts.
    markers: Vec<usize>,
    /// Next free offset.
    offset: u32,
    /// Largest offset ever reached.
    high_water: u32,
    /// Declared values to their live slot.
    by_value: FxHashMap<ValueId, u32>,
    /// Serial for the next slot.
    next_serial: u32,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Allocation
    // ==========================================================================

    /// Allocate an anonymous slot and return its offset.
    pub fn allocate(&mut self, size: u32, owned: bool) -> u32 {
        self.push(None, size, owned)
    }

    /// Allocate the slot for a declared value.
    pub fn declare(&mut self, id: ValueId, size: u32, owned: bool) -> u32 {
        let offset = self.push(Some(id), size, owned);
        self.by_value.insert(id, offset);
        offset
    }

    fn push(&mut self, id: Option<ValueId>, size: u32, owned: bool) -> u32 {
        let offset = self.offset;
        self.locals.push(Local {
            id,
            size,
            offset,
            owned,
            serial: self.next_serial,
        });
        self.next_serial += 1;
        self.offset += size;
        self.high_water = self.high_water.max(self.offset);
        offset
    }

    /// Offset of a declared value that is still in scope.
    pub fn lookup(&self, id: ValueId) -> Option<u32> {
        self.by_value.get(&id).copied()
    }

    // ==========================================================================
    // Scopes
    // ==========================================================================

    /// Open a scope.
    pub fn enter_scope(&mut self) {
        self.markers.push(self.locals.len());
    }

    /// Close the innermost scope.
    ///
    /// Returns the offsets of its owned slots, most recent first, or `None`
    /// when no scope is open.
    pub fn exit_scope(&mut self) -> Option<Vec<u32>> {
        let marker = self.markers.pop()?;
        let popped = self.locals.split_off(marker);
        if let Some(first) = popped.first() {
            self.offset = first.offset;
        }
        for local in &popped {
            if let Some(id) = local.id {
                self.by_value.remove(&id);
            }
        }
        Some(
            popped
                .iter()
                .rev()
                .filter(|l| l.owned)
                .map(|l| l.offset)
                .collect(),
        )
    }

    /// Owned slots of every scope opened at or after `depth`, innermost first.
    ///
    /// Used by non-local exits, which release without closing the scopes.
    pub fn owned_since(&self, depth: usize) -> Vec<u32> {
        let start = self
            .markers
            .get(depth)
            .copied()
            .unwrap_or(self.locals.len());
        self.locals[start..]
            .iter()
            .rev()
            .filter(|l| l.owned)
            .map(|l| l.offset)
            .collect()
    }

    /// Live owned slots in allocation order, as `(serial, offset)`.
    pub fn live_owned(&self) -> Vec<(u32, u32)> {
        self.locals
            .iter()
            .filter(|l| l.owned)
            .map(|l| (l.serial, l.offset))
            .collect()
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.markers.len()
    }

    /// Next free offset.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Frame size to reserve: the high-water mark.
    pub fn size(&self) -> u32 {
        self.high_water
    }

    /// Live slots.
    pub fn locals(&self) -> &[Local] {
        &self.locals
    }
}
