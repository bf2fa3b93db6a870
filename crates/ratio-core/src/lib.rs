//! Ratio Core -- the production-table solving engine.
//!
//! A page holds a tree of production tables. Each table is an ordered list
//! of recipe rows plus per-good balance links. Solving a table turns its rows
//! into a linear system over recipes-per-second, solves it, and projects the
//! rates back into per-row display quantities.
//!
//! # Solve Pipeline
//!
//! 1. **Nested tables** -- Solved first, recursively; each one's net flows
//!    become the effective recipe of the row that owns it.
//! 2. **Selection** -- Resolve entity, fuel and ambiguous variants per row.
//! 3. **Modifiers** -- Fold entity, quality, module and beacon effects.
//! 4. **Constraints** -- Decide whether each fixed value still applies or
//!    must be relocked through a transient buildings pin.
//! 5. **System** -- Build and solve the LP, diagnosing infeasibility.
//! 6. **Projection** -- Write results, flows and flags back.
//!
//! # Key Types
//!
//! - [`catalog::Catalog`] -- Immutable goods, recipes, entities, modules and
//!   qualities, built once by [`catalog::CatalogBuilder`].
//! - [`table::TableArena`] -- Tables, rows and links of one page.
//! - [`constraint::FixedConstraint`] -- The single pinned value of a row.
//! - [`solver::compute_table`] / [`solver::apply_solution`] -- The two solve
//!   phases.
//! - [`planner::Planner`] -- Async, per-page serialized solving.

pub mod catalog;
pub mod constraint;
pub mod dirty;
pub mod id;
pub mod modifiers;
pub mod planner;
pub mod projector;
pub mod quality;
pub mod selector;
pub mod settings;
pub mod solver;
pub mod system;
pub mod table;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
