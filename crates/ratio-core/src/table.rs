//! Production tables, recipe rows and production links.
//!
//! All tables of a page live in one [`TableArena`]. Rows and links are stored
//! arena-wide in `SlotMap`s and referenced by their owning table in order.
//! A nested table is only ever created together with the row that owns it,
//! so the ownership graph is a tree by construction.

use crate::catalog::Catalog;
use crate::constraint::{FixedConstraint, RowSelection};
use crate::dirty::DirtyTracker;
use crate::id::*;
use crate::projector::{ProductionTableFlow, RowGoodAmount, RowResults};
use crate::quality::WithQuality;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("table not found: {0:?}")]
    TableNotFound(TableId),
    #[error("row not found: {0:?}")]
    RowNotFound(RowId),
    #[error("link not found: {0:?}")]
    LinkNotFound(LinkId),
    #[error("table already links good {0:?}")]
    DuplicateLink(GoodId),
    #[error("nested-table rows must be created with add_nested_row")]
    NestedTableRecipe,
    #[error("good {0:?} is not an ingredient of the row")]
    NotAnIngredient(GoodId),
    #[error("good {0:?} is not a product of the row")]
    NotAProduct(GoodId),
    #[error("row has no resolved fuel")]
    NoFuel,
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// What a row executes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RowRecipe {
    /// A catalog recipe run in a crafter.
    Recipe(WithQuality<RecipeId>),
    /// A synthetic catalog recipe with no physical building.
    Mechanic(WithQuality<RecipeId>),
    /// A nested table summarized as one row.
    NestedTable(TableId),
}

/// A number of identical modules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleSlot {
    pub module: WithQuality<ModuleId>,
    pub count: u32,
}

/// Beacons affecting each building of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconConfig {
    pub beacon: WithQuality<EntityId>,
    /// Modules inside each beacon.
    pub modules: Vec<ModuleSlot>,
    /// Beacons reaching each building.
    pub count: u32,
}

/// A fully specified module configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleSet {
    /// Modules inserted directly into the building.
    pub modules: Vec<ModuleSlot>,
    pub beacon: Option<BeaconConfig>,
}

/// Row module configuration. An explicit set fully shadows table defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum RowModules {
    #[default]
    Inherit,
    Explicit(ModuleSet),
}

/// Table-wide module defaults applied to rows that inherit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleFillParameters {
    pub beacon: Option<WithQuality<EntityId>>,
    pub beacon_module: Option<WithQuality<ModuleId>>,
    pub beacons_per_building: u32,
    /// Maximum payback time in seconds for auto-filled productivity modules.
    /// Zero disables auto-fill.
    pub autofill_payback: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFlags {
    /// The last solve could not satisfy a constraint involving this row.
    pub solve_failed: bool,
    /// The row references a recipe, entity or good missing from the catalog.
    pub broken: bool,
}

/// One placed recipe instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRow {
    pub(crate) table: TableId,
    pub(crate) recipe: RowRecipe,
    pub(crate) entity: Option<WithQuality<EntityId>>,
    pub(crate) fuel: Option<WithQuality<GoodId>>,
    /// Chosen concrete goods for ambiguous ingredients/products.
    pub(crate) variants: Vec<GoodId>,
    pub(crate) modules: RowModules,
    pub(crate) fixed: FixedConstraint,
    pub(crate) enabled: bool,
    pub(crate) results: RowResults,
    /// Selection recorded by the last successful solve.
    pub(crate) selection: Option<RowSelection>,
    pub(crate) flags: RowFlags,
}

impl RecipeRow {
    fn new(table: TableId, recipe: RowRecipe) -> Self {
        Self {
            table,
            recipe,
            entity: None,
            fuel: None,
            variants: Vec::new(),
            modules: RowModules::Inherit,
            fixed: FixedConstraint::None,
            enabled: true,
            results: RowResults::default(),
            selection: None,
            flags: RowFlags::default(),
        }
    }

    pub fn table(&self) -> TableId {
        self.table
    }

    pub fn recipe(&self) -> RowRecipe {
        self.recipe
    }

    pub fn entity(&self) -> Option<WithQuality<EntityId>> {
        self.entity
    }

    pub fn fuel(&self) -> Option<WithQuality<GoodId>> {
        self.fuel
    }

    pub fn variants(&self) -> &[GoodId] {
        &self.variants
    }

    pub fn modules(&self) -> &RowModules {
        &self.modules
    }

    pub fn fixed(&self) -> FixedConstraint {
        self.fixed
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn results(&self) -> &RowResults {
        &self.results
    }

    pub fn ingredients(&self) -> &[RowGoodAmount] {
        &self.results.ingredients
    }

    pub fn products(&self) -> &[RowGoodAmount] {
        &self.results.products
    }

    pub fn fuel_usage(&self) -> Option<&RowGoodAmount> {
        self.results.fuel.as_ref()
    }

    pub fn buildings(&self) -> f64 {
        self.results.buildings
    }

    pub fn recipes_per_second(&self) -> f64 {
        self.results.recipes_per_second
    }

    pub fn flags(&self) -> RowFlags {
        self.flags
    }

    pub fn selection(&self) -> Option<&RowSelection> {
        self.selection.as_ref()
    }

    pub fn nested_table(&self) -> Option<TableId> {
        match self.recipe {
            RowRecipe::NestedTable(t) => Some(t),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// How a link compares the net amount against the requested amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkAlgorithm {
    /// Net amount equals the requested amount.
    #[default]
    Match,
    /// Net amount may exceed the requested amount.
    AllowOverProduction,
    /// Net amount may fall below the requested amount.
    AllowOverConsumption,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFlags {
    pub has_production: bool,
    pub has_consumption: bool,
    pub solve_failed: bool,
}

/// A per-good balance constraint scoped to one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionLink {
    pub(crate) table: TableId,
    pub(crate) good: WithQuality<GoodId>,
    /// Requested net amount per second (production minus consumption).
    pub(crate) amount: f64,
    pub(crate) algorithm: LinkAlgorithm,
    pub(crate) flags: LinkFlags,
}

impl ProductionLink {
    pub fn table(&self) -> TableId {
        self.table
    }

    pub fn good(&self) -> WithQuality<GoodId> {
        self.good
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn algorithm(&self) -> LinkAlgorithm {
        self.algorithm
    }

    pub fn flags(&self) -> LinkFlags {
        self.flags
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Who owns a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableOwner {
    /// The root table of a page.
    Page,
    /// A nested table summarized by `row` of `table`.
    Row { table: TableId, row: RowId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionTable {
    pub(crate) owner: TableOwner,
    pub(crate) rows: Vec<RowId>,
    pub(crate) links: Vec<LinkId>,
    pub(crate) module_defaults: ModuleFillParameters,
    pub(crate) flows: Vec<ProductionTableFlow>,
}

impl ProductionTable {
    fn new(owner: TableOwner) -> Self {
        Self {
            owner,
            rows: Vec::new(),
            links: Vec::new(),
            module_defaults: ModuleFillParameters::default(),
            flows: Vec::new(),
        }
    }

    pub fn owner(&self) -> TableOwner {
        self.owner
    }

    /// Rows in display order.
    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    pub fn module_defaults(&self) -> &ModuleFillParameters {
        &self.module_defaults
    }

    /// Net flows of unlinked goods computed by the last solve.
    pub fn flows(&self) -> &[ProductionTableFlow] {
        &self.flows
    }
}

// ---------------------------------------------------------------------------
// TableArena
// ---------------------------------------------------------------------------

/// Owns every table, row and link of one page.
#[derive(Debug, Clone, Default)]
pub struct TableArena {
    tables: SlotMap<TableId, ProductionTable>,
    rows: SlotMap<RowId, RecipeRow>,
    links: SlotMap<LinkId, ProductionLink>,
    dirty: DirtyTracker,
}

impl TableArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root table owned by a page.
    pub fn add_root_table(&mut self) -> TableId {
        let id = self.tables.insert(ProductionTable::new(TableOwner::Page));
        self.dirty.mark_table(id);
        id
    }

    /// Append a recipe or mechanic row to `table`.
    pub fn add_row(&mut self, table: TableId, recipe: RowRecipe) -> Result<RowId, TableError> {
        if matches!(recipe, RowRecipe::NestedTable(_)) {
            return Err(TableError::NestedTableRecipe);
        }
        self.table(table)?;
        let row = self.rows.insert(RecipeRow::new(table, recipe));
        self.table_mut(table)?.rows.push(row);
        self.mark_dirty(table);
        Ok(row)
    }

    /// Append a row summarizing a fresh nested table. Returns both ids.
    pub fn add_nested_row(&mut self, table: TableId) -> Result<(RowId, TableId), TableError> {
        self.table(table)?;
        let child = self.tables.insert(ProductionTable::new(TableOwner::Page));
        let row = self
            .rows
            .insert(RecipeRow::new(table, RowRecipe::NestedTable(child)));
        self.table_mut(child)?.owner = TableOwner::Row { table, row };
        self.table_mut(table)?.rows.push(row);
        self.dirty.mark_table(child);
        self.mark_dirty(table);
        Ok((row, child))
    }

    /// Remove a row. A nested table owned by the row is removed with it.
    pub fn remove_row(&mut self, row: RowId) -> Result<(), TableError> {
        let removed = self.rows.remove(row).ok_or(TableError::RowNotFound(row))?;
        if let Some(table) = self.tables.get_mut(removed.table) {
            table.rows.retain(|r| *r != row);
        }
        if let RowRecipe::NestedTable(child) = removed.recipe {
            self.remove_subtree(child);
        }
        self.mark_dirty(removed.table);
        Ok(())
    }

    fn remove_subtree(&mut self, table: TableId) {
        let Some(removed) = self.tables.remove(table) else {
            return;
        };
        self.dirty.forget(table);
        for link in removed.links {
            self.links.remove(link);
        }
        for row in removed.rows {
            if let Some(r) = self.rows.remove(row)
                && let RowRecipe::NestedTable(child) = r.recipe
            {
                self.remove_subtree(child);
            }
        }
    }

    /// Add a balance link for `good` to `table`.
    pub fn add_link(
        &mut self,
        table: TableId,
        good: WithQuality<GoodId>,
    ) -> Result<LinkId, TableError> {
        if self.find_link(table, good).is_some() {
            return Err(TableError::DuplicateLink(good.target));
        }
        self.table(table)?;
        let link = self.links.insert(ProductionLink {
            table,
            good,
            amount: 0.0,
            algorithm: LinkAlgorithm::Match,
            flags: LinkFlags::default(),
        });
        self.table_mut(table)?.links.push(link);
        self.mark_dirty(table);
        Ok(link)
    }

    pub fn remove_link(&mut self, link: LinkId) -> Result<(), TableError> {
        let removed = self.links.remove(link).ok_or(TableError::LinkNotFound(link))?;
        if let Some(table) = self.tables.get_mut(removed.table) {
            table.links.retain(|l| *l != link);
        }
        self.mark_dirty(removed.table);
        Ok(())
    }

    pub fn find_link(&self, table: TableId, good: WithQuality<GoodId>) -> Option<LinkId> {
        self.tables
            .get(table)?
            .links
            .iter()
            .copied()
            .find(|l| self.links.get(*l).is_some_and(|link| link.good == good))
    }

    pub fn set_link_amount(&mut self, link: LinkId, amount: f64) -> Result<(), TableError> {
        let l = self.link_mut(link)?;
        l.amount = amount;
        let table = l.table;
        self.mark_dirty(table);
        Ok(())
    }

    pub fn set_link_algorithm(
        &mut self,
        link: LinkId,
        algorithm: LinkAlgorithm,
    ) -> Result<(), TableError> {
        let l = self.link_mut(link)?;
        l.algorithm = algorithm;
        let table = l.table;
        self.mark_dirty(table);
        Ok(())
    }

    pub fn set_module_defaults(
        &mut self,
        table: TableId,
        params: ModuleFillParameters,
    ) -> Result<(), TableError> {
        self.table_mut(table)?.module_defaults = params;
        self.mark_dirty(table);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Row setters. Each marks the table dirty without solving.
    // -----------------------------------------------------------------------

    pub fn set_entity(
        &mut self,
        row: RowId,
        entity: Option<WithQuality<EntityId>>,
    ) -> Result<(), TableError> {
        self.edit_row(row, |r| r.entity = entity)
    }

    pub fn set_fuel(
        &mut self,
        row: RowId,
        fuel: Option<WithQuality<GoodId>>,
    ) -> Result<(), TableError> {
        self.edit_row(row, |r| r.fuel = fuel)
    }

    /// Choose `good` for whichever ambiguous slot accepts its base name,
    /// replacing the previous choice for that base name.
    pub fn set_variant(
        &mut self,
        catalog: &Catalog,
        row: RowId,
        good: GoodId,
    ) -> Result<(), TableError> {
        let siblings = catalog.variants_of(good).to_vec();
        self.edit_row(row, |r| {
            r.variants.retain(|v| !siblings.contains(v));
            r.variants.push(good);
        })
    }

    pub fn set_modules(&mut self, row: RowId, modules: RowModules) -> Result<(), TableError> {
        self.edit_row(row, |r| r.modules = modules)
    }

    pub fn set_enabled(&mut self, row: RowId, enabled: bool) -> Result<(), TableError> {
        self.edit_row(row, |r| r.enabled = enabled)
    }

    /// Replace the row's fixed constraint, clearing any other.
    pub fn set_fixed(&mut self, row: RowId, fixed: FixedConstraint) -> Result<(), TableError> {
        self.edit_row(row, |r| r.fixed = fixed)
    }

    pub fn set_fixed_buildings(&mut self, row: RowId, buildings: f64) -> Result<(), TableError> {
        self.set_fixed(row, FixedConstraint::Buildings(buildings))
    }

    /// Lock the row's current fuel consumption.
    pub fn set_fixed_fuel(&mut self, row: RowId) -> Result<(), TableError> {
        let r = self.row(row)?;
        let amount = r.fuel_usage().ok_or(TableError::NoFuel)?.amount.abs();
        self.set_fixed(row, FixedConstraint::Fuel(amount))
    }

    /// Lock the row's current consumption of `good`.
    pub fn set_fixed_ingredient(&mut self, row: RowId, good: GoodId) -> Result<(), TableError> {
        let r = self.row(row)?;
        let amount = r
            .ingredients()
            .iter()
            .find(|i| i.good.target == good)
            .ok_or(TableError::NotAnIngredient(good))?
            .amount
            .abs();
        self.set_fixed(row, FixedConstraint::Ingredient { good, amount })
    }

    /// Lock the row's current production of `good`.
    pub fn set_fixed_product(&mut self, row: RowId, good: GoodId) -> Result<(), TableError> {
        let r = self.row(row)?;
        let amount = r
            .products()
            .iter()
            .find(|p| p.good.target == good)
            .ok_or(TableError::NotAProduct(good))?
            .amount
            .abs();
        self.set_fixed(row, FixedConstraint::Product { good, amount })
    }

    /// Set a fuel lock to an explicit amount per second.
    pub fn set_fixed_fuel_amount(&mut self, row: RowId, amount: f64) -> Result<(), TableError> {
        self.set_fixed(row, FixedConstraint::Fuel(amount))
    }

    fn edit_row<F>(&mut self, row: RowId, f: F) -> Result<(), TableError>
    where
        F: FnOnce(&mut RecipeRow),
    {
        let r = self.row_mut(row)?;
        f(r);
        let table = r.table;
        self.mark_dirty(table);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn table(&self, id: TableId) -> Result<&ProductionTable, TableError> {
        self.tables.get(id).ok_or(TableError::TableNotFound(id))
    }

    pub fn row(&self, id: RowId) -> Result<&RecipeRow, TableError> {
        self.rows.get(id).ok_or(TableError::RowNotFound(id))
    }

    pub fn link(&self, id: LinkId) -> Result<&ProductionLink, TableError> {
        self.links.get(id).ok_or(TableError::LinkNotFound(id))
    }

    pub fn contains_table(&self, id: TableId) -> bool {
        self.tables.contains_key(id)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows of `table` in display order.
    pub fn rows_of(&self, table: TableId) -> impl Iterator<Item = (RowId, &RecipeRow)> {
        self.tables
            .get(table)
            .into_iter()
            .flat_map(|t| t.rows.iter())
            .filter_map(|&id| self.rows.get(id).map(|r| (id, r)))
    }

    pub fn links_of(&self, table: TableId) -> impl Iterator<Item = (LinkId, &ProductionLink)> {
        self.tables
            .get(table)
            .into_iter()
            .flat_map(|t| t.links.iter())
            .filter_map(|&id| self.links.get(id).map(|l| (id, l)))
    }

    pub fn parent_of(&self, table: TableId) -> Option<TableId> {
        match self.tables.get(table)?.owner {
            TableOwner::Page => None,
            TableOwner::Row { table, .. } => Some(table),
        }
    }

    pub fn is_dirty(&self, table: TableId) -> bool {
        self.dirty.is_table_dirty(table)
    }

    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    /// Mark `table` and every ancestor dirty.
    pub fn mark_dirty(&mut self, table: TableId) {
        let mut current = Some(table);
        while let Some(t) = current {
            self.dirty.mark_table(t);
            current = self.parent_of(t);
        }
    }

    pub(crate) fn mark_clean(&mut self, table: TableId) {
        self.dirty.mark_clean(table);
    }

    pub(crate) fn table_mut(&mut self, id: TableId) -> Result<&mut ProductionTable, TableError> {
        self.tables.get_mut(id).ok_or(TableError::TableNotFound(id))
    }

    pub(crate) fn row_mut(&mut self, id: RowId) -> Result<&mut RecipeRow, TableError> {
        self.rows.get_mut(id).ok_or(TableError::RowNotFound(id))
    }

    pub(crate) fn link_mut(&mut self, id: LinkId) -> Result<&mut ProductionLink, TableError> {
        self.links.get_mut(id).ok_or(TableError::LinkNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(n: u32) -> RowRecipe {
        RowRecipe::Recipe(WithQuality::normal(RecipeId(n)))
    }

    #[test]
    fn rows_keep_insertion_order() {
        let mut arena = TableArena::new();
        let t = arena.add_root_table();
        let a = arena.add_row(t, recipe(0)).unwrap();
        let b = arena.add_row(t, recipe(1)).unwrap();
        let ids: Vec<RowId> = arena.rows_of(t).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(arena.row(a).unwrap().table(), t);
    }

    #[test]
    fn nested_table_row_cannot_be_added_directly() {
        let mut arena = TableArena::new();
        let t = arena.add_root_table();
        let other = arena.add_root_table();
        assert!(matches!(
            arena.add_row(t, RowRecipe::NestedTable(other)),
            Err(TableError::NestedTableRecipe)
        ));
    }

    #[test]
    fn nested_row_owns_fresh_table() {
        let mut arena = TableArena::new();
        let root = arena.add_root_table();
        let (row, child) = arena.add_nested_row(root).unwrap();
        assert_eq!(arena.row(row).unwrap().nested_table(), Some(child));
        assert_eq!(arena.parent_of(child), Some(root));
        assert_eq!(arena.table(child).unwrap().owner(), TableOwner::Row { table: root, row });
    }

    #[test]
    fn removing_nested_row_removes_subtree() {
        let mut arena = TableArena::new();
        let root = arena.add_root_table();
        let (row, child) = arena.add_nested_row(root).unwrap();
        let (_, grandchild) = arena.add_nested_row(child).unwrap();
        arena.add_row(grandchild, recipe(0)).unwrap();
        arena.add_link(grandchild, WithQuality::normal(GoodId(0))).unwrap();
        assert_eq!(arena.table_count(), 3);

        arena.remove_row(row).unwrap();
        assert_eq!(arena.table_count(), 1);
        assert_eq!(arena.row_count(), 0);
        assert!(!arena.contains_table(child));
        assert!(!arena.contains_table(grandchild));
    }

    #[test]
    fn duplicate_link_rejected() {
        let mut arena = TableArena::new();
        let t = arena.add_root_table();
        let good = WithQuality::normal(GoodId(3));
        let link = arena.add_link(t, good).unwrap();
        assert_eq!(arena.find_link(t, good), Some(link));
        assert!(matches!(arena.add_link(t, good), Err(TableError::DuplicateLink(GoodId(3)))));

        let other_quality = WithQuality::new(GoodId(3), QualityId(1));
        assert!(arena.add_link(t, other_quality).is_ok());
    }

    #[test]
    fn setters_mark_ancestors_dirty() {
        let mut arena = TableArena::new();
        let root = arena.add_root_table();
        let (_, child) = arena.add_nested_row(root).unwrap();
        let row = arena.add_row(child, recipe(0)).unwrap();
        arena.mark_clean(root);
        arena.mark_clean(child);
        assert!(!arena.dirty().is_dirty());

        arena.set_enabled(row, false).unwrap();
        assert!(arena.is_dirty(child));
        assert!(arena.is_dirty(root));
        assert!(!arena.row(row).unwrap().enabled());
    }

    #[test]
    fn setting_one_fixed_constraint_clears_the_other() {
        let mut arena = TableArena::new();
        let t = arena.add_root_table();
        let row = arena.add_row(t, recipe(0)).unwrap();
        arena.set_fixed_buildings(row, 2.0).unwrap();
        arena.set_fixed_fuel_amount(row, 5.0).unwrap();
        assert_eq!(arena.row(row).unwrap().fixed(), FixedConstraint::Fuel(5.0));
    }

    #[test]
    fn fixed_ingredient_requires_current_ingredient() {
        let mut arena = TableArena::new();
        let t = arena.add_root_table();
        let row = arena.add_row(t, recipe(0)).unwrap();
        assert!(matches!(
            arena.set_fixed_ingredient(row, GoodId(1)),
            Err(TableError::NotAnIngredient(GoodId(1)))
        ));
        assert!(matches!(arena.set_fixed_fuel(row), Err(TableError::NoFuel)));
    }

    #[test]
    fn missing_ids_are_errors() {
        let mut arena = TableArena::new();
        let t = arena.add_root_table();
        let row = arena.add_row(t, recipe(0)).unwrap();
        arena.remove_row(row).unwrap();
        assert!(matches!(arena.row(row), Err(TableError::RowNotFound(_))));
        assert!(matches!(arena.remove_row(row), Err(TableError::RowNotFound(_))));
        assert!(arena.set_entity(row, None).is_err());
    }
}
