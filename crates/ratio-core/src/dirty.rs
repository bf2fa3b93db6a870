use crate::id::TableId;
use std::collections::BTreeSet;

/// Tracks which tables were edited since they were last solved.
///
/// Row setters mark the owning table and every ancestor dirty, since a nested
/// table's aggregate feeds its parent's system. A solve cleans the subtree it
/// actually solved.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    dirty_tables: BTreeSet<TableId>,
}

impl DirtyTracker {
    /// Create a new tracker with nothing dirty.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_table(&mut self, table: TableId) {
        self.dirty_tables.insert(table);
    }

    pub fn is_table_dirty(&self, table: TableId) -> bool {
        self.dirty_tables.contains(&table)
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty_tables.is_empty()
    }

    pub fn dirty_tables(&self) -> &BTreeSet<TableId> {
        &self.dirty_tables
    }

    /// Mark a single table clean.
    pub fn mark_clean(&mut self, table: TableId) {
        self.dirty_tables.remove(&table);
    }

    /// Forget a removed table.
    pub fn forget(&mut self, table: TableId) {
        self.dirty_tables.remove(&table);
    }
}
