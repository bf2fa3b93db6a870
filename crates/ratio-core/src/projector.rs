//! Solved rates projected into per-row display quantities and table flows.

use crate::constraint::Slot;
use crate::id::{GoodId, LinkId};
use crate::quality::WithQuality;
use crate::settings::SolverSettings;
use crate::system::{RowTerm, TermGood};
use serde::{Deserialize, Serialize};

/// One displayed ingredient, product or fuel of a row.
///
/// `amount` is signed per second: consumption is negative, production
/// positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowGoodAmount {
    pub good: WithQuality<GoodId>,
    pub amount: f64,
    /// Goods the user may switch this slot to. Empty when unambiguous.
    pub variants: Vec<GoodId>,
    /// The table link balancing this good, if any.
    pub link: Option<LinkId>,
}

/// Cached display results of a row, recomputed by every solve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowResults {
    pub recipes_per_second: f64,
    pub buildings: f64,
    pub fuel: Option<RowGoodAmount>,
    pub ingredients: Vec<RowGoodAmount>,
    /// Recipe products followed by the spent fuel result, if any.
    pub products: Vec<RowGoodAmount>,
}

impl RowResults {
    /// Per-second amount flowing through a selection slot, as a magnitude.
    pub fn slot_amount(&self, slot: Slot) -> Option<f64> {
        let amount = match slot {
            Slot::Fuel => self.fuel.as_ref()?.amount,
            Slot::Ingredient(i) => self.ingredients.get(i)?.amount,
            Slot::Product(i) => self.products.get(i)?.amount,
        };
        Some(amount.abs())
    }
}

/// Net amount of a good no link balances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionTableFlow {
    pub good: WithQuality<GoodId>,
    /// Positive for surplus, negative for demand.
    pub amount: f64,
}

fn display(
    entry: &TermGood,
    rps: f64,
    sign: f64,
    settings: &SolverSettings,
    link_of: &impl Fn(WithQuality<GoodId>) -> Option<LinkId>,
) -> RowGoodAmount {
    RowGoodAmount {
        good: entry.good,
        amount: settings.clean(sign * entry.per_recipe * rps),
        variants: entry.variants.clone(),
        link: link_of(entry.good),
    }
}

/// Display results for a row solved at `rps` recipes per second.
pub fn project_row(
    term: &RowTerm,
    rps: f64,
    settings: &SolverSettings,
    link_of: impl Fn(WithQuality<GoodId>) -> Option<LinkId>,
) -> RowResults {
    let rps = settings.clean(rps).max(0.0);
    let mut products: Vec<RowGoodAmount> = term
        .products
        .iter()
        .map(|p| display(p, rps, 1.0, settings, &link_of))
        .collect();
    if let Some(spent) = &term.spent {
        products.push(display(spent, rps, 1.0, settings, &link_of));
    }
    RowResults {
        recipes_per_second: rps,
        buildings: settings.clean(rps * term.seconds_per_recipe),
        fuel: term
            .fuel
            .as_ref()
            .map(|f| display(f, rps, -1.0, settings, &link_of)),
        ingredients: term
            .ingredients
            .iter()
            .map(|i| display(i, rps, -1.0, settings, &link_of))
            .collect(),
        products,
    }
}

/// Net flows of every unlinked good, in first-seen order.
pub fn table_flows(
    terms: &[RowTerm],
    values: &[f64],
    settings: &SolverSettings,
    is_linked: impl Fn(WithQuality<GoodId>) -> bool,
) -> Vec<ProductionTableFlow> {
    let mut flows: Vec<ProductionTableFlow> = Vec::new();
    for (term, &rps) in terms.iter().zip(values) {
        for &(good, coefficient) in &term.coefficients {
            if is_linked(good) {
                continue;
            }
            match flows.iter_mut().find(|f| f.good == good) {
                Some(flow) => flow.amount += coefficient * rps,
                None => flows.push(ProductionTableFlow {
                    good,
                    amount: coefficient * rps,
                }),
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintPlan;
    use crate::id::RowId;

    fn good(n: u32) -> WithQuality<GoodId> {
        WithQuality::normal(GoodId(n))
    }

    fn entry(n: u32, per_recipe: f64) -> TermGood {
        TermGood {
            good: good(n),
            per_recipe,
            variants: Vec::new(),
        }
    }

    fn burner_term() -> RowTerm {
        let mut term = RowTerm::empty(RowId::default());
        term.ingredients = vec![entry(0, 2.0)];
        term.products = vec![entry(1, 1.5)];
        term.fuel = Some(entry(2, 0.25));
        term.spent = Some(entry(3, 0.25));
        term.seconds_per_recipe = 4.0;
        term.plan = ConstraintPlan::Free;
        term.rebuild_coefficients();
        term
    }

    #[test]
    fn amounts_scale_with_rate() {
        let term = burner_term();
        let res = project_row(&term, 2.0, &SolverSettings::default(), |_| None);
        assert_eq!(res.recipes_per_second, 2.0);
        assert_eq!(res.buildings, 8.0);
        assert_eq!(res.ingredients[0].amount, -4.0);
        assert_eq!(res.products[0].amount, 3.0);
        assert_eq!(res.fuel.as_ref().unwrap().amount, -0.5);
    }

    #[test]
    fn spent_fuel_appended_to_products() {
        let term = burner_term();
        let res = project_row(&term, 2.0, &SolverSettings::default(), |_| None);
        assert_eq!(res.products.len(), 2);
        assert_eq!(res.products[1].good, good(3));
        assert_eq!(res.products[1].amount, 0.5);
    }

    #[test]
    fn slot_amount_is_magnitude() {
        let term = burner_term();
        let res = project_row(&term, 2.0, &SolverSettings::default(), |_| None);
        assert_eq!(res.slot_amount(Slot::Fuel), Some(0.5));
        assert_eq!(res.slot_amount(Slot::Ingredient(0)), Some(4.0));
        assert_eq!(res.slot_amount(Slot::Product(5)), None);
    }

    #[test]
    fn links_attached_to_display_rows() {
        let term = burner_term();
        let link = LinkId::default();
        let res = project_row(&term, 1.0, &SolverSettings::default(), |g| {
            (g == good(1)).then_some(link)
        });
        assert_eq!(res.products[0].link, Some(link));
        assert_eq!(res.ingredients[0].link, None);
    }

    #[test]
    fn flows_skip_linked_and_balanced_goods() {
        let a = burner_term();
        let mut b = RowTerm::empty(RowId::default());
        b.ingredients = vec![entry(1, 3.0)];
        b.rebuild_coefficients();

        // a at 2/s produces 3 of good 1, b at 1/s consumes 3 of it.
        let flows = table_flows(&[a, b], &[2.0, 1.0], &SolverSettings::default(), |g| {
            g == good(0)
        });
        let goods: Vec<_> = flows.iter().map(|f| f.good).collect();
        assert_eq!(goods, vec![good(2), good(3)]);
        assert_eq!(flows[0].amount, -0.5);
        assert_eq!(flows[1].amount, 0.5);
    }
}
