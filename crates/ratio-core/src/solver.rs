//! Solving a production table and its nested tables.
//!
//! Solving is split in two phases. [`compute_table`] reads the arena and
//! produces a [`TableSolution`] without mutating anything; nested tables are
//! computed first and their aggregate flows become the effective recipe of
//! the owning row. [`apply_solution`] then writes results, resolved
//! selections, relocked constraints and flags back into the arena. Callers
//! that may need to discard a result (the page was removed while computing)
//! simply drop the solution.

use crate::catalog::Catalog;
use crate::constraint::{
    ConstraintPlan, FixedConstraint, RowSelection, capture_constraint, resolve_constraint,
};
use crate::id::{EntityId, GoodId, LinkId, RecipeId, RowId, TableId};
use crate::modifiers::{compute_modifiers, effective_modules};
use crate::projector::{ProductionTableFlow, RowResults, project_row, table_flows};
use crate::quality::WithQuality;
use crate::selector::{Preferences, resolve_row};
use crate::settings::SolverSettings;
use crate::system::{LinearSystem, LinkTerm, RowTerm, SystemError, SystemOutcome};
use crate::table::{
    LinkFlags, ModuleFillParameters, RecipeRow, RowFlags, RowRecipe, TableArena, TableError,
};

// ---------------------------------------------------------------------------
// Context, errors, outcomes
// ---------------------------------------------------------------------------

/// Read-only inputs shared by every solve.
#[derive(Debug, Clone, Copy)]
pub struct SolveContext<'a> {
    pub catalog: &'a Catalog,
    pub preferences: &'a Preferences,
    pub settings: &'a SolverSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    System(#[from] SystemError),
}

/// What a solve decided for one row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Solved {
        results: RowResults,
        selection: RowSelection,
        entity: Option<WithQuality<EntityId>>,
        fuel: Option<WithQuality<GoodId>>,
        fixed: FixedConstraint,
    },
    /// Excluded from the system: disabled, broken, or no usable
    /// entity/fuel pairing. Displays zeros.
    Idle { broken: bool },
    /// The system was infeasible. Prior results stay.
    Failed { conflict: bool },
}

/// Computed, not yet applied, result of solving one table.
#[derive(Debug, Clone)]
pub struct TableSolution {
    pub table: TableId,
    pub feasible: bool,
    pub rows: Vec<(RowId, RowOutcome)>,
    pub links: Vec<(LinkId, LinkFlags)>,
    /// Unlinked flows. `None` keeps the previous flows.
    pub flows: Option<Vec<ProductionTableFlow>>,
    pub nested: Vec<TableSolution>,
    /// Rows whose fixed constraint was re-captured.
    pub relocked: usize,
}

/// Counters describing an applied solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveSummary {
    pub tables_solved: usize,
    pub rows_solved: usize,
    pub infeasible_tables: usize,
    pub relocked_rows: usize,
}

// ---------------------------------------------------------------------------
// Compute phase
// ---------------------------------------------------------------------------

/// A row taking part in the table's system.
struct Participant {
    term: RowTerm,
    selection: RowSelection,
    entity: Option<WithQuality<EntityId>>,
    fuel: Option<WithQuality<GoodId>>,
    fixed: FixedConstraint,
}

enum Prepared {
    Participant(Box<Participant>),
    Idle { broken: bool },
}

fn is_broken(catalog: &Catalog, row: &RecipeRow) -> bool {
    let recipe_missing = match row.recipe() {
        RowRecipe::Recipe(r) | RowRecipe::Mechanic(r) => catalog.recipe(r.target).is_none(),
        RowRecipe::NestedTable(_) => false,
    };
    recipe_missing
        || row.entity().is_some_and(|e| catalog.entity(e.target).is_none())
        || row.fuel().is_some_and(|f| catalog.good(f.target).is_none())
        || row.variants().iter().any(|v| catalog.good(*v).is_none())
}

fn prior_buildings(row: &RecipeRow) -> Option<f64> {
    row.selection().map(|_| row.buildings())
}

fn prepare_recipe_row(
    ctx: &SolveContext<'_>,
    defaults: &ModuleFillParameters,
    id: RowId,
    row: &RecipeRow,
    recipe: WithQuality<RecipeId>,
) -> Prepared {
    let catalog = ctx.catalog;
    let Some(def) = catalog.recipe(recipe.target) else {
        return Prepared::Idle { broken: true };
    };
    let resolved = resolve_row(
        catalog,
        ctx.preferences,
        def,
        row.entity(),
        row.fuel(),
        row.variants(),
    );
    if !resolved.enabled {
        tracing::debug!(?id, recipe = %def.name, "entity cannot run recipe");
        return Prepared::Idle { broken: false };
    }

    let products: Vec<GoodId> = resolved.products.iter().map(|p| p.good).collect();
    let modules = effective_modules(
        catalog,
        def,
        resolved.entity,
        &products,
        row.modules(),
        defaults,
    );
    let modifiers = compute_modifiers(catalog, def, resolved.entity, &modules);
    let mut term = RowTerm::from_recipe(catalog, id, def, recipe.quality, &resolved, &modifiers);
    let selection = resolved.selection();
    term.plan = resolve_constraint(
        &row.fixed(),
        row.selection(),
        &selection,
        prior_buildings(row),
        ctx.settings.default_pin_buildings,
    );
    Prepared::Participant(Box::new(Participant {
        term,
        selection,
        entity: resolved.entity,
        fuel: resolved.fuel,
        fixed: row.fixed(),
    }))
}

fn prepare_nested_row(
    ctx: &SolveContext<'_>,
    id: RowId,
    row: &RecipeRow,
    aggregate: &[ProductionTableFlow],
) -> Prepared {
    let mut term = RowTerm::from_aggregate(id, aggregate);
    let selection = RowSelection {
        fuel: None,
        ingredients: term.ingredients.iter().map(|g| g.good.target).collect(),
        products: term.products.iter().map(|g| g.good.target).collect(),
    };
    // The row's rate scales the nested solve; the child rows keep showing
    // that solve at one recipe.
    term.plan = resolve_constraint(
        &row.fixed(),
        row.selection(),
        &selection,
        prior_buildings(row),
        ctx.settings.default_pin_buildings,
    );
    Prepared::Participant(Box::new(Participant {
        term,
        selection,
        entity: None,
        fuel: None,
        fixed: row.fixed(),
    }))
}

/// Net flows of a solved table as seen from its owning row: every good with
/// a nonzero net amount, linked or not.
pub fn aggregate_flows(
    arena: &TableArena,
    solution: &TableSolution,
    settings: &SolverSettings,
) -> Vec<ProductionTableFlow> {
    let mut flows: Vec<ProductionTableFlow> = Vec::new();
    let mut add = |good: WithQuality<GoodId>, amount: f64| {
        match flows.iter_mut().find(|f| f.good == good) {
            Some(f) => f.amount += amount,
            None => flows.push(ProductionTableFlow { good, amount }),
        }
    };
    for (id, outcome) in &solution.rows {
        let results = match outcome {
            RowOutcome::Solved { results, .. } => results,
            RowOutcome::Failed { .. } => match arena.row(*id) {
                Ok(row) => row.results(),
                Err(_) => continue,
            },
            RowOutcome::Idle { .. } => continue,
        };
        for amount in results
            .ingredients
            .iter()
            .chain(&results.products)
            .chain(&results.fuel)
        {
            add(amount.good, amount.amount);
        }
    }
    flows
        .into_iter()
        .map(|f| ProductionTableFlow {
            amount: settings.clean(f.amount),
            ..f
        })
        .filter(|f| f.amount != 0.0)
        .collect()
}

/// Compute the solution of `table` and, first, of every nested table.
pub fn compute_table(
    arena: &TableArena,
    table: TableId,
    ctx: &SolveContext<'_>,
) -> Result<TableSolution, SolveError> {
    let t = arena.table(table)?;
    let settings = ctx.settings;
    let mut nested = Vec::new();
    let mut idle: Vec<(RowId, RowOutcome)> = Vec::new();
    let mut participants: Vec<Participant> = Vec::new();

    for &id in t.rows() {
        let row = arena.row(id)?;
        let prepared = match row.recipe() {
            RowRecipe::NestedTable(child) => {
                let child_solution = compute_table(arena, child, ctx)?;
                let aggregate = aggregate_flows(arena, &child_solution, settings);
                nested.push(child_solution);
                if row.enabled() {
                    prepare_nested_row(ctx, id, row, &aggregate)
                } else {
                    Prepared::Idle { broken: false }
                }
            }
            RowRecipe::Recipe(recipe) | RowRecipe::Mechanic(recipe) => {
                if is_broken(ctx.catalog, row) {
                    tracing::warn!(?id, "row references missing catalog data");
                    Prepared::Idle { broken: true }
                } else if !row.enabled() {
                    Prepared::Idle { broken: false }
                } else {
                    prepare_recipe_row(ctx, t.module_defaults(), id, row, recipe)
                }
            }
        };
        match prepared {
            Prepared::Participant(p) => participants.push(*p),
            Prepared::Idle { broken } => idle.push((id, RowOutcome::Idle { broken })),
        }
    }

    let links: Vec<LinkTerm> = arena
        .links_of(table)
        .map(|(id, l)| LinkTerm {
            link: id,
            good: l.good(),
            amount: l.amount(),
            algorithm: l.algorithm(),
        })
        .collect();
    let mut system = LinearSystem {
        terms: participants.iter().map(|p| p.term.clone()).collect(),
        links,
    };
    tracing::debug!(
        ?table,
        rows = system.terms.len(),
        links = system.links.len(),
        "solving table"
    );

    let link_flags = |system: &LinearSystem, failed: &[LinkId]| -> Vec<(LinkId, LinkFlags)> {
        system
            .links
            .iter()
            .map(|l| {
                let coefficients = system.terms.iter().map(|t| t.coefficient(l.good));
                LinkFlags {
                    has_production: coefficients.clone().any(|c| c > 0.0),
                    has_consumption: coefficients.clone().any(|c| c < 0.0),
                    solve_failed: failed.contains(&l.link),
                }
            })
            .zip(&system.links)
            .map(|(flags, l)| (l.link, flags))
            .collect()
    };

    let mut values = match system.solve(settings)? {
        SystemOutcome::Solved(values) => values,
        SystemOutcome::Infeasible(conflicts) => {
            tracing::warn!(
                ?table,
                rows = conflicts.rows.len(),
                links = conflicts.links.len(),
                "table infeasible, keeping previous results"
            );
            let mut rows = idle;
            rows.extend(participants.iter().map(|p| {
                (
                    p.term.row,
                    RowOutcome::Failed {
                        conflict: conflicts.rows.contains(&p.term.row),
                    },
                )
            }));
            return Ok(TableSolution {
                table,
                feasible: false,
                rows,
                links: link_flags(&system, &conflicts.links),
                flows: None,
                nested,
                relocked: 0,
            });
        }
    };

    // Re-capture constraints whose locked good disappeared.
    let mut relocked = 0;
    for (i, p) in participants.iter_mut().enumerate() {
        let term = &mut system.terms[i];
        if let ConstraintPlan::Relock {
            pin_buildings,
            capture,
        } = term.plan
        {
            let solved = capture
                .and_then(|slot| term.slot_per_recipe(slot))
                .map(|per_recipe| settings.clean(per_recipe * values[i]));
            p.fixed = capture_constraint(capture, &p.selection, solved, pin_buildings);
            term.plan = resolve_constraint(
                &p.fixed,
                Some(&p.selection),
                &p.selection,
                Some(pin_buildings),
                settings.default_pin_buildings,
            );
            tracing::debug!(row = ?term.row, fixed = ?p.fixed, "relocked fixed value");
            relocked += 1;
        }
    }
    if relocked > 0 {
        match system.solve(settings)? {
            SystemOutcome::Solved(confirmed) => values = confirmed,
            SystemOutcome::Infeasible(_) => {
                tracing::warn!(?table, "relock confirmation pass infeasible");
            }
        }
    }

    let link_of = |good: WithQuality<GoodId>| arena.find_link(table, good);
    let mut rows = idle;
    for (p, &rps) in participants.into_iter().zip(&values) {
        let results = project_row(&p.term, rps, settings, link_of);
        rows.push((
            p.term.row,
            RowOutcome::Solved {
                results,
                selection: p.selection,
                entity: p.entity,
                fuel: p.fuel,
                fixed: p.fixed,
            },
        ));
    }
    let flows = table_flows(&system.terms, &values, settings, |g| {
        arena.find_link(table, g).is_some()
    });

    tracing::info!(?table, rows = rows.len(), relocked, "table solved");
    Ok(TableSolution {
        table,
        feasible: true,
        rows,
        links: link_flags(&system, &[]),
        flows: Some(flows),
        nested,
        relocked,
    })
}

// ---------------------------------------------------------------------------
// Apply phase
// ---------------------------------------------------------------------------

/// Write a computed solution back. Rows, links and tables removed since the
/// computation are skipped.
pub fn apply_solution(arena: &mut TableArena, solution: TableSolution) -> SolveSummary {
    let mut summary = SolveSummary::default();
    apply_into(arena, solution, &mut summary);
    summary
}

fn apply_into(arena: &mut TableArena, solution: TableSolution, summary: &mut SolveSummary) {
    for child in solution.nested {
        apply_into(arena, child, summary);
    }
    if !arena.contains_table(solution.table) {
        return;
    }

    for (id, outcome) in solution.rows {
        let Ok(row) = arena.row_mut(id) else {
            continue;
        };
        match outcome {
            RowOutcome::Solved {
                results,
                selection,
                entity,
                fuel,
                fixed,
            } => {
                row.results = results;
                row.selection = Some(selection);
                if !matches!(row.recipe, RowRecipe::NestedTable(_)) {
                    row.entity = entity;
                    row.fuel = fuel;
                }
                row.fixed = fixed;
                row.flags = RowFlags::default();
                summary.rows_solved += 1;
            }
            RowOutcome::Idle { broken } => {
                row.results = RowResults::default();
                row.flags = RowFlags {
                    solve_failed: false,
                    broken,
                };
            }
            RowOutcome::Failed { conflict } => {
                row.flags = RowFlags {
                    solve_failed: conflict,
                    broken: false,
                };
            }
        }
    }

    for (id, flags) in solution.links {
        if let Ok(link) = arena.link_mut(id) {
            link.flags = flags;
        }
    }

    if let Some(flows) = solution.flows
        && let Ok(table) = arena.table_mut(solution.table)
    {
        table.flows = flows;
    }

    summary.tables_solved += 1;
    summary.relocked_rows += solution.relocked;
    if solution.feasible {
        arena.mark_clean(solution.table);
    } else {
        summary.infeasible_tables += 1;
    }
}

/// Compute and apply in one step.
pub fn solve_table(
    arena: &mut TableArena,
    table: TableId,
    ctx: &SolveContext<'_>,
) -> Result<SolveSummary, SolveError> {
    let solution = compute_table(arena, table, ctx)?;
    Ok(apply_solution(arena, solution))
}

/// Solve independent pages in parallel. Each entry is a page's arena and
/// the table to solve in it.
#[cfg(feature = "parallel")]
pub fn solve_pages(
    pages: Vec<(&mut TableArena, TableId)>,
    ctx: &SolveContext<'_>,
) -> Vec<Result<SolveSummary, SolveError>> {
    use rayon::prelude::*;

    pages
        .into_par_iter()
        .map(|(arena, table)| solve_table(arena, table, ctx))
        .collect()
}
