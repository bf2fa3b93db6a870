//! User-pinned row values and their survival across configuration changes.
//!
//! A row holds at most one [`FixedConstraint`]. Fuel, ingredient and product
//! locks remember an absolute amount from a prior solve. Before each solve
//! [`resolve_constraint`] compares the row's selection at the previous solve
//! with its current selection and decides whether the remembered amount still
//! applies, or whether the row must be held by a transient buildings pin while
//! the new amount for the same slot is captured.

use crate::id::GoodId;
use serde::{Deserialize, Serialize};

/// The single pinned quantity of a row.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum FixedConstraint {
    #[default]
    None,
    /// Number of buildings.
    Buildings(f64),
    /// Fuel consumed per second.
    Fuel(f64),
    /// Amount of one ingredient consumed per second.
    Ingredient { good: GoodId, amount: f64 },
    /// Amount of one product produced per second.
    Product { good: GoodId, amount: f64 },
}

impl FixedConstraint {
    pub fn is_none(&self) -> bool {
        matches!(self, FixedConstraint::None)
    }

    /// The pinned building count, if the row is pinned by buildings.
    pub fn buildings(&self) -> Option<f64> {
        match self {
            FixedConstraint::Buildings(b) => Some(*b),
            _ => None,
        }
    }
}

/// Concrete goods a row resolved to, captured at solve time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RowSelection {
    pub fuel: Option<GoodId>,
    pub ingredients: Vec<GoodId>,
    pub products: Vec<GoodId>,
}

/// A position in a row's selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Fuel,
    Ingredient(usize),
    Product(usize),
}

/// What a row's fixed constraint contributes to the next solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintPlan {
    /// No equality for this row.
    Free,
    /// Pin the building count.
    Buildings(f64),
    /// Pin the per-second amount flowing through `slot`.
    Amount { slot: Slot, amount: f64 },
    /// The locked good disappeared. Pin buildings for this solve, then capture
    /// the solved amount of `capture` as the new remembered value. With no
    /// capture slot the pin itself becomes permanent.
    Relock {
        pin_buildings: f64,
        capture: Option<Slot>,
    },
}

/// Decide how a row's fixed constraint enters the next solve.
///
/// `prior` is the selection recorded at the previous solve (if any),
/// `current` the freshly resolved one, and `prior_buildings` the building
/// count that solve produced.
pub fn resolve_constraint(
    fixed: &FixedConstraint,
    prior: Option<&RowSelection>,
    current: &RowSelection,
    prior_buildings: Option<f64>,
    default_pin: f64,
) -> ConstraintPlan {
    let pin_buildings = prior_buildings
        .filter(|b| b.is_finite() && *b > 0.0)
        .unwrap_or(default_pin);

    match *fixed {
        FixedConstraint::None => ConstraintPlan::Free,
        FixedConstraint::Buildings(b) => ConstraintPlan::Buildings(b),
        FixedConstraint::Fuel(amount) => {
            let unchanged = prior.is_none_or(|p| p.fuel == current.fuel);
            if current.fuel.is_some() && unchanged {
                ConstraintPlan::Amount {
                    slot: Slot::Fuel,
                    amount,
                }
            } else {
                ConstraintPlan::Relock {
                    pin_buildings,
                    capture: current.fuel.map(|_| Slot::Fuel),
                }
            }
        }
        FixedConstraint::Ingredient { good, amount } => resolve_good_lock(
            good,
            amount,
            prior.map(|p| p.ingredients.as_slice()),
            &current.ingredients,
            pin_buildings,
            Slot::Ingredient,
        ),
        FixedConstraint::Product { good, amount } => resolve_good_lock(
            good,
            amount,
            prior.map(|p| p.products.as_slice()),
            &current.products,
            pin_buildings,
            Slot::Product,
        ),
    }
}

fn resolve_good_lock(
    good: GoodId,
    amount: f64,
    prior: Option<&[GoodId]>,
    current: &[GoodId],
    pin_buildings: f64,
    slot: fn(usize) -> Slot,
) -> ConstraintPlan {
    if let Some(index) = current.iter().position(|g| *g == good) {
        return ConstraintPlan::Amount {
            slot: slot(index),
            amount,
        };
    }
    // Follow the slot the good used to occupy, e.g. steam@165 -> steam@500.
    let capture = prior
        .and_then(|p| p.iter().position(|g| *g == good))
        .filter(|&index| index < current.len())
        .map(slot);
    ConstraintPlan::Relock {
        pin_buildings,
        capture,
    }
}

/// Build the new remembered constraint after a relock solve.
///
/// `solved_amount` is the per-second amount the solve produced for the
/// capture slot. Without a capture slot or amount, the pin stays.
pub fn capture_constraint(
    capture: Option<Slot>,
    current: &RowSelection,
    solved_amount: Option<f64>,
    pin_buildings: f64,
) -> FixedConstraint {
    let (Some(slot), Some(amount)) = (capture, solved_amount) else {
        return FixedConstraint::Buildings(pin_buildings);
    };
    match slot {
        Slot::Fuel => FixedConstraint::Fuel(amount),
        Slot::Ingredient(i) => match current.ingredients.get(i) {
            Some(&good) => FixedConstraint::Ingredient { good, amount },
            None => FixedConstraint::Buildings(pin_buildings),
        },
        Slot::Product(i) => match current.products.get(i) {
            Some(&good) => FixedConstraint::Product { good, amount },
            None => FixedConstraint::Buildings(pin_buildings),
        },
    }
}
