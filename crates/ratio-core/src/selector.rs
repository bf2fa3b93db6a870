//! Resolution of fuel choice and ambiguous ingredient/product variants.
//!
//! The selector never fails. A choice that is no longer a candidate falls
//! back to the default, and fixed-value continuity is handled by
//! [`crate::constraint::resolve_constraint`].

use crate::catalog::{Catalog, RecipeDef, RecipeEntry, RecipeKind};
use crate::constraint::RowSelection;
use crate::id::{EntityId, GoodId};
use crate::quality::WithQuality;
use serde::{Deserialize, Serialize};

/// User preferences consulted during resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Favorite goods, highest priority first.
    pub favorites: Vec<GoodId>,
}

impl Preferences {
    pub fn with_favorites(favorites: Vec<GoodId>) -> Self {
        Self { favorites }
    }
}

/// Fuels an entity accepts: its declared fuels, each expanded by every
/// variant sharing its base name. Declaration order, no duplicates.
pub fn fuel_candidates(catalog: &Catalog, entity: EntityId) -> Vec<GoodId> {
    let mut out = Vec::new();
    for &fuel in catalog.fuels_of(entity) {
        let variants = catalog.variants_of(fuel);
        let expanded: &[GoodId] = if variants.is_empty() {
            std::slice::from_ref(&fuel)
        } else {
            variants
        };
        for &good in std::iter::once(&fuel).chain(expanded) {
            if !out.contains(&good) {
                out.push(good);
            }
        }
    }
    out
}

/// The highest-priority favorite among the candidates, else the first
/// declared candidate.
pub fn default_fuel(catalog: &Catalog, prefs: &Preferences, entity: EntityId) -> Option<GoodId> {
    let candidates = fuel_candidates(catalog, entity);
    prefs
        .favorites
        .iter()
        .find(|f| candidates.contains(f))
        .or_else(|| candidates.first())
        .copied()
}

/// Keep `current` if the entity still accepts it, else use the default.
pub fn resolve_fuel(
    catalog: &Catalog,
    prefs: &Preferences,
    entity: EntityId,
    current: Option<GoodId>,
) -> Option<GoodId> {
    match current {
        Some(fuel) if fuel_candidates(catalog, entity).contains(&fuel) => Some(fuel),
        _ => default_fuel(catalog, prefs, entity),
    }
}

/// Concrete goods acceptable for a recipe entry.
pub fn entry_candidates<'a>(catalog: &'a Catalog, entry: &'a RecipeEntry) -> &'a [GoodId] {
    if entry.ambiguous {
        let variants = catalog.variants_of(entry.good);
        if !variants.is_empty() {
            return variants;
        }
    }
    std::slice::from_ref(&entry.good)
}

/// Pick the concrete good for an entry: a chosen variant if it is a
/// candidate, else the recipe-declared good. Favorites are not consulted.
pub fn resolve_entry(catalog: &Catalog, entry: &RecipeEntry, chosen: &[GoodId]) -> GoodId {
    let candidates = entry_candidates(catalog, entry);
    chosen
        .iter()
        .find(|g| candidates.contains(g))
        .copied()
        .unwrap_or(entry.good)
}

/// Whether the recipe can run with this entity and fuel.
pub fn is_recipe_enabled(
    catalog: &Catalog,
    recipe: &RecipeDef,
    entity: Option<EntityId>,
    fuel: Option<GoodId>,
) -> bool {
    if recipe.kind == RecipeKind::Mechanic {
        return true;
    }
    let Some(entity) = entity else {
        return false;
    };
    if !recipe.crafters.contains(&entity) {
        return false;
    }
    let candidates = fuel_candidates(catalog, entity);
    match fuel {
        Some(f) => candidates.contains(&f),
        None => candidates.is_empty(),
    }
}

/// A resolved concrete good with its per-recipe base amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedGood {
    pub good: GoodId,
    pub amount: f64,
}

/// Everything the selector decides for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRow {
    pub entity: Option<WithQuality<EntityId>>,
    pub fuel: Option<WithQuality<GoodId>>,
    /// False when the entity cannot craft the recipe or rejects the fuel.
    pub enabled: bool,
    /// Empty when disabled.
    pub ingredients: Vec<ResolvedGood>,
    /// Empty when disabled.
    pub products: Vec<ResolvedGood>,
}

impl ResolvedRow {
    pub fn selection(&self) -> RowSelection {
        RowSelection {
            fuel: self.fuel.map(|f| f.target),
            ingredients: self.ingredients.iter().map(|g| g.good).collect(),
            products: self.products.iter().map(|g| g.good).collect(),
        }
    }
}

/// Resolve a catalog recipe row.
///
/// A missing entity defaults to the recipe's first crafter. Mechanic
/// recipes run without an entity and without fuel.
pub fn resolve_row(
    catalog: &Catalog,
    prefs: &Preferences,
    recipe: &RecipeDef,
    entity: Option<WithQuality<EntityId>>,
    fuel: Option<WithQuality<GoodId>>,
    variants: &[GoodId],
) -> ResolvedRow {
    let (entity, fuel) = if recipe.kind == RecipeKind::Mechanic {
        (None, None)
    } else {
        let entity = entity.or_else(|| recipe.crafters.first().map(|&e| WithQuality::normal(e)));
        let fuel = entity.and_then(|e| {
            let current = fuel.map(|f| f.target);
            let resolved = resolve_fuel(catalog, prefs, e.target, current)?;
            let quality = fuel
                .filter(|f| f.target == resolved)
                .map(|f| f.quality)
                .unwrap_or_default();
            Some(WithQuality::new(resolved, quality))
        });
        (entity, fuel)
    };

    let enabled = is_recipe_enabled(
        catalog,
        recipe,
        entity.map(|e| e.target),
        fuel.map(|f| f.target),
    );
    let resolve = |entries: &[RecipeEntry]| -> Vec<ResolvedGood> {
        if !enabled {
            return Vec::new();
        }
        entries
            .iter()
            .map(|e| ResolvedGood {
                good: resolve_entry(catalog, e, variants),
                amount: e.amount,
            })
            .collect()
    };

    ResolvedRow {
        entity,
        fuel,
        enabled,
        ingredients: resolve(&recipe.ingredients),
        products: resolve(&recipe.products),
    }
}
