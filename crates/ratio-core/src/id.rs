use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a production table in a [`TableArena`](crate::table::TableArena).
    pub struct TableId;

    /// Identifies a recipe row within its owning table.
    pub struct RowId;

    /// Identifies a production link within its owning table.
    pub struct LinkId;

    /// Identifies a page (a root table and its nested tree) in the planner.
    pub struct PageId;
}

/// Identifies a good (item, fluid variant, or special good) in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GoodId(pub u32);

/// Identifies a recipe in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

/// Identifies an entity (crafter, beacon, or container) in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Identifies a module in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

/// Identifies a quality tier in the catalog. `QualityId(0)` is always "normal".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QualityId(pub u32);

impl QualityId {
    pub const NORMAL: QualityId = QualityId(0);
}

impl Default for QualityId {
    fn default() -> Self {
        Self::NORMAL
    }
}
