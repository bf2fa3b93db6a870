//! Shared setup for the cross-crate scenarios.

#![allow(dead_code)]

use ratio_core::catalog::Catalog;
use ratio_core::id::*;
use ratio_core::selector::Preferences;
use ratio_core::settings::SolverSettings;
use ratio_core::solver::{SolveContext, SolveSummary, solve_table};
use ratio_core::table::{RecipeRow, TableArena};
use ratio_core::test_utils::*;

/// One page worth of tables over the fixture catalog.
pub struct Sheet {
    pub catalog: Catalog,
    pub preferences: Preferences,
    pub settings: SolverSettings,
    pub arena: TableArena,
    pub root: TableId,
}

impl Sheet {
    pub fn new() -> Self {
        init_tracing();
        let mut arena = TableArena::new();
        let root = arena.add_root_table();
        Self {
            catalog: fixture_catalog(),
            preferences: Preferences::default(),
            settings: SolverSettings::default(),
            arena,
            root,
        }
    }

    pub fn row(&mut self, recipe: &str) -> RowId {
        self.row_in(self.root, recipe)
    }

    pub fn row_in(&mut self, table: TableId, recipe: &str) -> RowId {
        add_recipe_row(&mut self.arena, &self.catalog, table, recipe)
    }

    pub fn link_in(&mut self, table: TableId, good_name: &str, amount: f64) -> LinkId {
        let g = good(&self.catalog, good_name);
        let link = self.arena.add_link(table, g).unwrap();
        self.arena.set_link_amount(link, amount).unwrap();
        link
    }

    pub fn link(&mut self, good_name: &str, amount: f64) -> LinkId {
        self.link_in(self.root, good_name, amount)
    }

    pub fn solve(&mut self) -> SolveSummary {
        let ctx = SolveContext {
            catalog: &self.catalog,
            preferences: &self.preferences,
            settings: &self.settings,
        };
        solve_table(&mut self.arena, self.root, &ctx).unwrap()
    }

    pub fn get(&self, row: RowId) -> &RecipeRow {
        self.arena.row(row).unwrap()
    }

    pub fn entity(&self, name: &str) -> ratio_core::quality::WithQuality<EntityId> {
        entity(&self.catalog, name)
    }

    pub fn good_id(&self, name: &str) -> GoodId {
        self.catalog.good_id(name).unwrap()
    }
}
