//! Linear system construction and solution for one production table.
//!
//! Every participating row contributes one unknown, its recipes per second.
//! Links become balance constraints over the per-recipe coefficients of
//! their good; fixed rows become equalities. The objective minimizes total
//! activity with a small per-row weight increment so that ties resolve
//! toward earlier rows.

use crate::catalog::{Catalog, RecipeDef, RecipeEntry};
use crate::constraint::{ConstraintPlan, Slot};
use crate::id::{GoodId, LinkId, QualityId, RowId};
use crate::modifiers::{Modifiers, fuel_per_recipe};
use crate::projector::ProductionTableFlow;
use crate::quality::WithQuality;
use crate::selector::{ResolvedGood, ResolvedRow, entry_candidates, fuel_candidates};
use crate::settings::SolverSettings;
use crate::table::LinkAlgorithm;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    microlp, variable,
};

// ---------------------------------------------------------------------------
// Row terms
// ---------------------------------------------------------------------------

/// A good in one slot of a row with its per-recipe amount (a magnitude).
#[derive(Debug, Clone, PartialEq)]
pub struct TermGood {
    pub good: WithQuality<GoodId>,
    pub per_recipe: f64,
    /// Alternatives the user could pick for this slot.
    pub variants: Vec<GoodId>,
}

/// A row's contribution to its table's system.
#[derive(Debug, Clone, PartialEq)]
pub struct RowTerm {
    pub row: RowId,
    pub ingredients: Vec<TermGood>,
    /// Products including the productivity bonus.
    pub products: Vec<TermGood>,
    pub fuel: Option<TermGood>,
    pub spent: Option<TermGood>,
    /// Buildings needed per recipe per second.
    pub seconds_per_recipe: f64,
    pub plan: ConstraintPlan,
    /// Net signed amount per recipe for each distinct good.
    pub coefficients: Vec<(WithQuality<GoodId>, f64)>,
}

impl RowTerm {
    pub fn empty(row: RowId) -> Self {
        Self {
            row,
            ingredients: Vec::new(),
            products: Vec::new(),
            fuel: None,
            spent: None,
            seconds_per_recipe: 0.0,
            plan: ConstraintPlan::Free,
            coefficients: Vec::new(),
        }
    }

    /// Term for a catalog recipe resolved by the selector.
    pub fn from_recipe(
        catalog: &Catalog,
        row: RowId,
        recipe: &RecipeDef,
        quality: QualityId,
        resolved: &ResolvedRow,
        modifiers: &Modifiers,
    ) -> Self {
        let slot_goods = |entries: &[RecipeEntry], chosen: &[ResolvedGood], scale: f64| {
            entries
                .iter()
                .zip(chosen)
                .map(|(entry, chosen)| {
                    let candidates = entry_candidates(catalog, entry);
                    TermGood {
                        good: WithQuality::new(chosen.good, quality),
                        per_recipe: chosen.amount * scale,
                        variants: if candidates.len() > 1 {
                            candidates.to_vec()
                        } else {
                            Vec::new()
                        },
                    }
                })
                .collect::<Vec<_>>()
        };

        let mut term = Self::empty(row);
        term.ingredients = slot_goods(&recipe.ingredients, &resolved.ingredients, 1.0);
        term.products = slot_goods(
            &recipe.products,
            &resolved.products,
            1.0 + modifiers.productivity,
        );
        term.seconds_per_recipe = if modifiers.speed > 0.0 {
            recipe.time / modifiers.speed
        } else {
            0.0
        };

        if let (Some(entity), Some(fuel)) = (resolved.entity, resolved.fuel)
            && let Some(crafter) = catalog.crafter(entity.target)
        {
            let per_recipe = fuel_per_recipe(catalog, crafter, modifiers, recipe.time, fuel);
            if per_recipe > 0.0 {
                let candidates = fuel_candidates(catalog, entity.target);
                term.fuel = Some(TermGood {
                    good: fuel,
                    per_recipe,
                    variants: if candidates.len() > 1 {
                        candidates
                    } else {
                        Vec::new()
                    },
                });
                term.spent = catalog
                    .good(fuel.target)
                    .and_then(|g| g.spent_result)
                    .map(|spent| TermGood {
                        good: WithQuality::new(spent, fuel.quality),
                        per_recipe,
                        variants: Vec::new(),
                    });
            }
        }

        term.rebuild_coefficients();
        term
    }

    /// Term for a nested table summarized by its net flows. One recipe is the
    /// nested table as solved.
    pub fn from_aggregate(row: RowId, aggregate: &[ProductionTableFlow]) -> Self {
        let mut term = Self::empty(row);
        for flow in aggregate {
            let entry = TermGood {
                good: flow.good,
                per_recipe: flow.amount.abs(),
                variants: Vec::new(),
            };
            if flow.amount < 0.0 {
                term.ingredients.push(entry);
            } else {
                term.products.push(entry);
            }
        }
        term.seconds_per_recipe = 1.0;
        term.rebuild_coefficients();
        term
    }

    /// Recompute the merged per-good coefficients from the slots.
    pub fn rebuild_coefficients(&mut self) {
        let mut coefficients: Vec<(WithQuality<GoodId>, f64)> = Vec::new();
        let mut add = |good: WithQuality<GoodId>, amount: f64| {
            match coefficients.iter_mut().find(|(g, _)| *g == good) {
                Some((_, c)) => *c += amount,
                None => coefficients.push((good, amount)),
            }
        };
        for i in &self.ingredients {
            add(i.good, -i.per_recipe);
        }
        for p in &self.products {
            add(p.good, p.per_recipe);
        }
        if let Some(f) = &self.fuel {
            add(f.good, -f.per_recipe);
        }
        if let Some(s) = &self.spent {
            add(s.good, s.per_recipe);
        }
        self.coefficients = coefficients;
    }

    pub fn coefficient(&self, good: WithQuality<GoodId>) -> f64 {
        self.coefficients
            .iter()
            .find(|(g, _)| *g == good)
            .map_or(0.0, |(_, c)| *c)
    }

    /// Per-recipe amount flowing through a selection slot.
    pub fn slot_per_recipe(&self, slot: Slot) -> Option<f64> {
        match slot {
            Slot::Fuel => self.fuel.as_ref().map(|f| f.per_recipe),
            Slot::Ingredient(i) => self.ingredients.get(i).map(|g| g.per_recipe),
            Slot::Product(i) => self.products.get(i).map(|g| g.per_recipe),
        }
    }

    /// Linear factor and right-hand side of this row's fixed equality.
    fn equality(&self) -> Option<(f64, f64)> {
        match self.plan {
            ConstraintPlan::Free => None,
            ConstraintPlan::Buildings(b) => Some((self.seconds_per_recipe, b)),
            ConstraintPlan::Relock { pin_buildings, .. } => {
                Some((self.seconds_per_recipe, pin_buildings))
            }
            ConstraintPlan::Amount { slot, amount } => {
                Some((self.slot_per_recipe(slot).unwrap_or(0.0), amount))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// A link's balance requirement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkTerm {
    pub link: LinkId,
    pub good: WithQuality<GoodId>,
    pub amount: f64,
    pub algorithm: LinkAlgorithm,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearSystem {
    pub terms: Vec<RowTerm>,
    pub links: Vec<LinkTerm>,
}

/// Constraints found in conflict by the infeasibility diagnosis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conflicts {
    pub rows: Vec<RowId>,
    pub links: Vec<LinkId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SystemOutcome {
    /// Recipes per second, one per term.
    Solved(Vec<f64>),
    Infeasible(Conflicts),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("solver failure: {0}")]
    Solver(String),
}

enum Relation {
    Eq,
    Geq,
    Leq,
}

impl From<LinkAlgorithm> for Relation {
    fn from(algorithm: LinkAlgorithm) -> Self {
        match algorithm {
            LinkAlgorithm::Match => Relation::Eq,
            LinkAlgorithm::AllowOverProduction => Relation::Geq,
            LinkAlgorithm::AllowOverConsumption => Relation::Leq,
        }
    }
}

/// A constraint row before it is handed to the LP backend.
struct Row {
    coefficients: Vec<(usize, f64)>,
    relation: Relation,
    rhs: f64,
    source: Source,
}

#[derive(Clone, Copy)]
enum Source {
    Link(LinkId),
    Fixed(RowId),
}

impl LinearSystem {
    fn constraint_rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        for link in &self.links {
            let coefficients: Vec<(usize, f64)> = self
                .terms
                .iter()
                .enumerate()
                .map(|(i, t)| (i, t.coefficient(link.good)))
                .filter(|(_, c)| *c != 0.0)
                .collect();
            rows.push(Row {
                coefficients,
                relation: link.algorithm.into(),
                rhs: link.amount,
                source: Source::Link(link.link),
            });
        }
        for (i, term) in self.terms.iter().enumerate() {
            if let Some((factor, rhs)) = term.equality() {
                rows.push(Row {
                    coefficients: vec![(i, factor)],
                    relation: Relation::Eq,
                    rhs,
                    source: Source::Fixed(term.row),
                });
            }
        }
        rows
    }

    fn objective(&self, vars: &[Variable], epsilon: f64) -> Expression {
        let mut objective = Expression::from(0.0);
        for (i, var) in vars.iter().enumerate() {
            objective += (1.0 + i as f64 * epsilon) * *var;
        }
        objective
    }

    /// Solve the system. Infeasible systems are diagnosed, never errors.
    pub fn solve(&self, settings: &SolverSettings) -> Result<SystemOutcome, SystemError> {
        let rows = self.constraint_rows();

        // A constraint with no variables is decided without the backend.
        let trivially_violated: Vec<&Row> = rows
            .iter()
            .filter(|r| r.coefficients.iter().all(|(_, c)| *c == 0.0))
            .filter(|r| !relation_holds(&r.relation, 0.0, r.rhs, settings))
            .collect();
        if !trivially_violated.is_empty() {
            return self.diagnose(&rows, settings);
        }
        if self.terms.is_empty() {
            return Ok(SystemOutcome::Solved(Vec::new()));
        }

        let mut vars = ProblemVariables::new();
        let x: Vec<Variable> = self
            .terms
            .iter()
            .map(|_| vars.add(variable().min(0.0)))
            .collect();
        let objective = self.objective(&x, settings.tie_break_epsilon);
        let mut model = vars.minimise(objective).using(microlp);
        for row in rows.iter().filter(|r| !r.coefficients.is_empty()) {
            let lhs = linear(&row.coefficients, &x);
            model = model.with(relate(lhs, &row.relation, row.rhs));
        }

        match model.solve() {
            Ok(solution) => Ok(SystemOutcome::Solved(
                x.iter()
                    .map(|v| settings.clean(solution.value(*v)).max(0.0))
                    .collect(),
            )),
            Err(ResolutionError::Infeasible) => self.diagnose(&rows, settings),
            Err(ResolutionError::Unbounded) => {
                tracing::warn!(terms = self.terms.len(), "unbounded system, reporting zero");
                Ok(SystemOutcome::Solved(vec![0.0; self.terms.len()]))
            }
            Err(e) => Err(SystemError::Solver(e.to_string())),
        }
    }

    /// Re-solve with penalized slack on every link and fixed row, and report
    /// the constraints whose slack is in use.
    fn diagnose(&self, rows: &[Row], settings: &SolverSettings) -> Result<SystemOutcome, SystemError> {
        let mut vars = ProblemVariables::new();
        let x: Vec<Variable> = self
            .terms
            .iter()
            .map(|_| vars.add(variable().min(0.0)))
            .collect();
        let slack: Vec<(Variable, Variable)> = rows
            .iter()
            .map(|_| (vars.add(variable().min(0.0)), vars.add(variable().min(0.0))))
            .collect();

        let mut objective = self.objective(&x, settings.tie_break_epsilon);
        for (over, under) in &slack {
            objective += settings.slack_penalty * *over;
            objective += settings.slack_penalty * *under;
        }
        let mut model = vars.minimise(objective).using(microlp);
        for (row, (over, under)) in rows.iter().zip(&slack) {
            let lhs = linear(&row.coefficients, &x) + *over - *under;
            model = model.with(relate(lhs, &row.relation, row.rhs));
        }

        let solution = model
            .solve()
            .map_err(|e| SystemError::Solver(e.to_string()))?;
        let mut conflicts = Conflicts::default();
        for (row, (over, under)) in rows.iter().zip(&slack) {
            let used = solution.value(*over) + solution.value(*under);
            if used.abs() <= settings.zero_threshold.max(1e-7) {
                continue;
            }
            match row.source {
                Source::Link(link) => conflicts.links.push(link),
                Source::Fixed(r) => {
                    if !conflicts.rows.contains(&r) {
                        conflicts.rows.push(r);
                    }
                }
            }
        }
        tracing::warn!(
            rows = conflicts.rows.len(),
            links = conflicts.links.len(),
            "infeasible system"
        );
        Ok(SystemOutcome::Infeasible(conflicts))
    }
}

fn linear(coefficients: &[(usize, f64)], x: &[Variable]) -> Expression {
    let mut expr = Expression::from(0.0);
    for &(i, c) in coefficients {
        expr += c * x[i];
    }
    expr
}

fn relate(lhs: Expression, relation: &Relation, rhs: f64) -> good_lp::Constraint {
    match relation {
        Relation::Eq => constraint!(lhs == rhs),
        Relation::Geq => constraint!(lhs >= rhs),
        Relation::Leq => constraint!(lhs <= rhs),
    }
}

fn relation_holds(relation: &Relation, lhs: f64, rhs: f64, settings: &SolverSettings) -> bool {
    let tolerance = settings.zero_threshold;
    match relation {
        Relation::Eq => (lhs - rhs).abs() <= tolerance,
        Relation::Geq => lhs >= rhs - tolerance,
        Relation::Leq => lhs <= rhs + tolerance,
    }
}
