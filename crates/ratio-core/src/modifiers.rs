//! Speed, productivity, energy and pollution multipliers for a row.
//!
//! Effects are collected from direct and beacon-delivered modules and folded
//! once per row. Table defaults (auto-filled productivity modules plus a
//! default beacon) apply only to rows that inherit them; an explicit row set
//! replaces them entirely.

use crate::catalog::{Catalog, CrafterDef, ModuleEffects, RecipeDef};
use crate::id::{EntityId, GoodId, ModuleId};
use crate::quality::WithQuality;
use crate::table::{BeaconConfig, ModuleFillParameters, ModuleSet, ModuleSlot, RowModules};

/// Lower bound for the speed and energy multipliers.
pub const MIN_MULTIPLIER: f64 = 0.2;

/// Resolved multipliers for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modifiers {
    /// Crafting speed including entity quality and module effects.
    pub speed: f64,
    /// Additive productivity bonus, never negative.
    pub productivity: f64,
    pub energy: f64,
    pub pollution: f64,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            speed: 1.0,
            productivity: 0.0,
            energy: 1.0,
            pollution: 1.0,
        }
    }
}

/// Summed module effects, split by delivery path.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct EffectSum {
    direct: ModuleEffects,
    beacon: ModuleEffects,
}

impl EffectSum {
    fn total(&self) -> ModuleEffects {
        ModuleEffects {
            speed: self.direct.speed + self.beacon.speed,
            productivity: self.direct.productivity + self.beacon.productivity,
            consumption: self.direct.consumption + self.beacon.consumption,
            pollution: self.direct.pollution + self.beacon.pollution,
        }
    }
}

/// One module's effects with its quality applied to the beneficial ones.
pub fn module_effects(catalog: &Catalog, module: WithQuality<ModuleId>) -> ModuleEffects {
    let Some(def) = catalog.module(module.target) else {
        return ModuleEffects::default();
    };
    let q = catalog.quality_multiplier(module.quality);
    let e = def.effects;
    // Beneficial: positive speed and productivity, negative consumption and pollution.
    ModuleEffects {
        speed: if e.speed > 0.0 { e.speed * q } else { e.speed },
        productivity: if e.productivity > 0.0 {
            e.productivity * q
        } else {
            e.productivity
        },
        consumption: if e.consumption < 0.0 {
            e.consumption * q
        } else {
            e.consumption
        },
        pollution: if e.pollution < 0.0 {
            e.pollution * q
        } else {
            e.pollution
        },
    }
}

fn accumulate(into: &mut ModuleEffects, effects: ModuleEffects, scale: f64) {
    into.speed += effects.speed * scale;
    into.productivity += effects.productivity * scale;
    into.consumption += effects.consumption * scale;
    into.pollution += effects.pollution * scale;
}

fn sum_effects(catalog: &Catalog, set: &ModuleSet) -> EffectSum {
    let mut sum = EffectSum::default();
    for slot in &set.modules {
        accumulate(&mut sum.direct, module_effects(catalog, slot.module), slot.count as f64);
    }
    if let Some(beacon) = &set.beacon
        && let Some(def) = catalog.beacon(beacon.beacon.target)
    {
        let scale = beacon.count as f64
            * def.efficiency
            * catalog.quality_multiplier(beacon.beacon.quality);
        for slot in &beacon.modules {
            accumulate(
                &mut sum.beacon,
                module_effects(catalog, slot.module),
                slot.count as f64 * scale,
            );
        }
    }
    sum
}

/// Fold entity, quality and module effects into row multipliers.
pub fn compute_modifiers(
    catalog: &Catalog,
    recipe: &RecipeDef,
    entity: Option<WithQuality<EntityId>>,
    modules: &ModuleSet,
) -> Modifiers {
    let crafter = entity.and_then(|e| catalog.crafter(e.target));
    let (base_speed, base_productivity) = match (entity, crafter) {
        (Some(e), Some(c)) => (
            c.crafting_speed * catalog.quality_multiplier(e.quality),
            c.base_productivity,
        ),
        _ => (1.0, 0.0),
    };

    let effects = sum_effects(catalog, modules).total();
    let module_productivity = if recipe.allow_productivity {
        effects.productivity
    } else {
        0.0
    };
    let energy = (1.0 + effects.consumption).max(MIN_MULTIPLIER);

    Modifiers {
        speed: base_speed * (1.0 + effects.speed).max(MIN_MULTIPLIER),
        productivity: (base_productivity + module_productivity).max(0.0),
        energy,
        pollution: (1.0 + effects.pollution) * energy,
    }
}

/// The module set a row actually uses.
pub fn effective_modules(
    catalog: &Catalog,
    recipe: &RecipeDef,
    entity: Option<WithQuality<EntityId>>,
    products: &[GoodId],
    row: &RowModules,
    defaults: &ModuleFillParameters,
) -> ModuleSet {
    match row {
        RowModules::Explicit(set) => set.clone(),
        RowModules::Inherit => default_modules(catalog, recipe, entity, products, defaults),
    }
}

/// Table defaults expanded for one row.
pub fn default_modules(
    catalog: &Catalog,
    recipe: &RecipeDef,
    entity: Option<WithQuality<EntityId>>,
    products: &[GoodId],
    defaults: &ModuleFillParameters,
) -> ModuleSet {
    let crafter = entity.and_then(|e| catalog.crafter(e.target));
    let modules = match (entity, crafter) {
        (Some(e), Some(c)) if c.module_slots > 0 && recipe.allow_productivity => {
            let speed = c.crafting_speed * catalog.quality_multiplier(e.quality);
            autofill_module(catalog, recipe, speed, products, defaults.autofill_payback)
                .map(|module| {
                    vec![ModuleSlot {
                        module: WithQuality::normal(module),
                        count: c.module_slots,
                    }]
                })
                .unwrap_or_default()
        }
        _ => Vec::new(),
    };

    let beacon = match (defaults.beacon, defaults.beacon_module) {
        (Some(beacon), Some(module)) if defaults.beacons_per_building > 0 => {
            catalog.beacon(beacon.target).map(|def| BeaconConfig {
                beacon,
                modules: vec![ModuleSlot {
                    module,
                    count: def.module_slots,
                }],
                count: defaults.beacons_per_building,
            })
        }
        _ => None,
    };

    ModuleSet { modules, beacon }
}

/// Seconds for a productivity module to pay for itself through extra output.
///
/// `speed` is the building's crafting speed before modules. Infinite when the
/// module adds no productivity or the products have no cost.
pub fn payback_seconds(
    catalog: &Catalog,
    recipe: &RecipeDef,
    speed: f64,
    products: &[GoodId],
    module: ModuleId,
) -> f64 {
    let Some(def) = catalog.module(module) else {
        return f64::INFINITY;
    };
    let productivity = def.effects.productivity;
    let product_cost: f64 = recipe
        .products
        .iter()
        .zip(products)
        .map(|(entry, good)| entry.amount * catalog.good(*good).map_or(0.0, |g| g.cost))
        .sum();
    let crafts_per_second = if recipe.time > 0.0 {
        speed / recipe.time
    } else {
        0.0
    };
    let gain = productivity * crafts_per_second * product_cost;
    if gain <= 0.0 {
        return f64::INFINITY;
    }
    let module_cost = def
        .item
        .and_then(|item| catalog.good(item))
        .map_or(0.0, |g| g.cost);
    module_cost / gain
}

/// Best productivity module whose payback is within `threshold` seconds.
/// A threshold of zero disables auto-fill.
pub fn autofill_module(
    catalog: &Catalog,
    recipe: &RecipeDef,
    speed: f64,
    products: &[GoodId],
    threshold: f64,
) -> Option<ModuleId> {
    if threshold <= 0.0 {
        return None;
    }
    catalog
        .modules()
        .filter(|(_, m)| m.effects.productivity > 0.0)
        .filter(|(id, _)| payback_seconds(catalog, recipe, speed, products, *id) <= threshold)
        .max_by(|(a_id, a), (b_id, b)| {
            a.effects
                .productivity
                .total_cmp(&b.effects.productivity)
                // Earlier module wins a tie.
                .then(b_id.cmp(a_id))
        })
        .map(|(id, _)| id)
}

/// Fuel units burned per recipe execution. Fuel quality raises the energy
/// each unit carries.
///
/// Zero when the fuel has no energy value, so electric and void entities
/// without a real fuel good contribute nothing.
pub fn fuel_per_recipe(
    catalog: &Catalog,
    crafter: &CrafterDef,
    modifiers: &Modifiers,
    recipe_time: f64,
    fuel: WithQuality<GoodId>,
) -> f64 {
    let Some(good) = catalog.good(fuel.target) else {
        return 0.0;
    };
    let denominator =
        good.fuel_value * catalog.quality_multiplier(fuel.quality) * crafter.energy.effectivity;
    if denominator <= 0.0 || modifiers.speed <= 0.0 {
        return 0.0;
    }
    crafter.energy.usage * modifiers.energy * (recipe_time / modifiers.speed) / denominator
}
