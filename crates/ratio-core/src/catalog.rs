use crate::id::*;
use crate::quality::QualityDef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What kind of good this is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GoodKind {
    Item,
    /// A fluid at a specific temperature. Variants of one fluid share a base name.
    Fluid { temperature: f64 },
    /// Non-physical goods such as electricity or heat.
    Special,
}

/// A good definition in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodDef {
    pub name: String,
    /// Goods sharing a base name are variants of each other.
    pub base_name: String,
    pub kind: GoodKind,
    /// Joules released per unit when burned. Zero for non-fuels.
    pub fuel_value: f64,
    /// Good left over after burning one unit (spent fuel cells, etc.).
    pub spent_result: Option<GoodId>,
    /// Abstract cost per unit, used for module payback estimates.
    pub cost: f64,
}

impl GoodDef {
    pub fn item(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base_name: name.to_string(),
            kind: GoodKind::Item,
            fuel_value: 0.0,
            spent_result: None,
            cost: 0.0,
        }
    }

    pub fn fluid(name: &str, base_name: &str, temperature: f64) -> Self {
        Self {
            name: name.to_string(),
            base_name: base_name.to_string(),
            kind: GoodKind::Fluid { temperature },
            fuel_value: 0.0,
            spent_result: None,
            cost: 0.0,
        }
    }

    pub fn special(name: &str) -> Self {
        Self {
            kind: GoodKind::Special,
            ..Self::item(name)
        }
    }

    pub fn with_fuel_value(mut self, joules: f64) -> Self {
        self.fuel_value = joules;
        self
    }

    pub fn with_spent_result(mut self, spent: GoodId) -> Self {
        self.spent_result = Some(spent);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn is_fuel(&self) -> bool {
        self.fuel_value > 0.0
    }
}

/// A recipe ingredient or product entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeEntry {
    /// The declared (default) concrete good.
    pub good: GoodId,
    pub amount: f64,
    /// When set, any variant sharing the declared good's base name is accepted.
    pub ambiguous: bool,
}

impl RecipeEntry {
    pub fn new(good: GoodId, amount: f64) -> Self {
        Self {
            good,
            amount,
            ambiguous: false,
        }
    }

    pub fn ambiguous(good: GoodId, amount: f64) -> Self {
        Self {
            good,
            amount,
            ambiguous: true,
        }
    }
}

/// Whether a recipe runs in a physical building or is a synthetic mechanic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipeKind {
    Recipe,
    Mechanic,
}

/// A recipe definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDef {
    pub name: String,
    pub kind: RecipeKind,
    pub ingredients: Vec<RecipeEntry>,
    pub products: Vec<RecipeEntry>,
    /// Seconds per craft at crafting speed 1.
    pub time: f64,
    /// Crafters able to execute this recipe, in catalog preference order.
    pub crafters: Vec<EntityId>,
    pub allow_productivity: bool,
}

/// How an energy-consuming entity is powered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyKind {
    Electric,
    Burner,
    FluidBurner,
    Heat,
    /// Needs no energy at all.
    Void,
}

/// Energy source of a crafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySource {
    pub kind: EnergyKind,
    /// Watts drawn while working, before module modifiers.
    pub usage: f64,
    /// Fraction of fuel energy converted into work.
    pub effectivity: f64,
    /// Goods this entity accepts as fuel. For electric entities this holds the
    /// electricity special good.
    pub fuels: Vec<GoodId>,
}

impl EnergySource {
    pub fn void() -> Self {
        Self {
            kind: EnergyKind::Void,
            usage: 0.0,
            effectivity: 1.0,
            fuels: Vec::new(),
        }
    }
}

/// A building that executes recipes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrafterDef {
    pub crafting_speed: f64,
    pub base_productivity: f64,
    pub energy: EnergySource,
    pub module_slots: u32,
}

/// A building that projects module effects onto neighbouring crafters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconDef {
    /// Effect-transmission factor.
    pub efficiency: f64,
    pub module_slots: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Crafter(CrafterDef),
    Beacon(BeaconDef),
    /// Logistic storage. Only relevant to blueprint export.
    Container { slots: u32 },
}

/// An entity definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    pub size: u32,
    pub kind: EntityKind,
}

/// Additive module effects. Positive productivity is a bonus, positive
/// consumption/pollution are penalties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleEffects {
    pub speed: f64,
    pub productivity: f64,
    pub consumption: f64,
    pub pollution: f64,
}

/// A module definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDef {
    pub name: String,
    /// The item good backing this module, if any. Used for cost lookups.
    pub item: Option<GoodId>,
    pub effects: ModuleEffects,
}

/// Builder for constructing an immutable [`Catalog`].
/// Three-phase lifecycle: registration -> mutation -> finalization.
#[derive(Debug)]
pub struct CatalogBuilder {
    goods: Vec<GoodDef>,
    good_name_to_id: HashMap<String, GoodId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    entities: Vec<EntityDef>,
    entity_name_to_id: HashMap<String, EntityId>,
    modules: Vec<ModuleDef>,
    module_name_to_id: HashMap<String, ModuleId>,
    qualities: Vec<QualityDef>,
    quality_name_to_id: HashMap<String, QualityId>,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    /// Create a builder with the "normal" quality pre-registered as `QualityId(0)`.
    pub fn new() -> Self {
        let mut builder = Self {
            goods: Vec::new(),
            good_name_to_id: HashMap::new(),
            recipes: Vec::new(),
            recipe_name_to_id: HashMap::new(),
            entities: Vec::new(),
            entity_name_to_id: HashMap::new(),
            modules: Vec::new(),
            module_name_to_id: HashMap::new(),
            qualities: Vec::new(),
            quality_name_to_id: HashMap::new(),
        };
        builder.register_quality("normal", 0);
        builder
    }

    /// Phase 1: Register a good. Returns its ID.
    pub fn register_good(&mut self, def: GoodDef) -> GoodId {
        let id = GoodId(self.goods.len() as u32);
        self.good_name_to_id.insert(def.name.clone(), id);
        self.goods.push(def);
        id
    }

    /// Phase 1: Register a recipe. Returns its ID.
    pub fn register_recipe(&mut self, def: RecipeDef) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipe_name_to_id.insert(def.name.clone(), id);
        self.recipes.push(def);
        id
    }

    /// Phase 1: Register an entity. Returns its ID.
    pub fn register_entity(&mut self, def: EntityDef) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entity_name_to_id.insert(def.name.clone(), id);
        self.entities.push(def);
        id
    }

    /// Phase 1: Register a module. Returns its ID.
    pub fn register_module(&mut self, def: ModuleDef) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.module_name_to_id.insert(def.name.clone(), id);
        self.modules.push(def);
        id
    }

    /// Phase 1: Register a quality tier. Re-registering "normal" replaces its level.
    pub fn register_quality(&mut self, name: &str, level: u32) -> QualityId {
        if let Some(&id) = self.quality_name_to_id.get(name) {
            self.qualities[id.0 as usize].level = level;
            return id;
        }
        let id = QualityId(self.qualities.len() as u32);
        self.qualities.push(QualityDef {
            name: name.to_string(),
            level,
        });
        self.quality_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Phase 2: Mutate an existing recipe by name.
    pub fn mutate_recipe<F>(&mut self, name: &str, f: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut RecipeDef),
    {
        let id = self
            .recipe_name_to_id
            .get(name)
            .ok_or(CatalogError::NotFound(name.to_string()))?;
        f(&mut self.recipes[id.0 as usize]);
        Ok(())
    }

    /// Phase 2: Mutate an existing good by name.
    pub fn mutate_good<F>(&mut self, name: &str, f: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut GoodDef),
    {
        let id = self
            .good_name_to_id
            .get(name)
            .ok_or(CatalogError::NotFound(name.to_string()))?;
        f(&mut self.goods[id.0 as usize]);
        Ok(())
    }

    pub fn good_id(&self, name: &str) -> Option<GoodId> {
        self.good_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn entity_id(&self, name: &str) -> Option<EntityId> {
        self.entity_name_to_id.get(name).copied()
    }

    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.module_name_to_id.get(name).copied()
    }

    pub fn quality_id(&self, name: &str) -> Option<QualityId> {
        self.quality_name_to_id.get(name).copied()
    }

    /// Phase 3: Validate every cross-reference and freeze the catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let good_ok = |id: GoodId| (id.0 as usize) < self.goods.len();

        for good in &self.goods {
            if let Some(spent) = good.spent_result
                && !good_ok(spent)
            {
                return Err(CatalogError::InvalidGoodRef(spent));
            }
        }

        for recipe in &self.recipes {
            for entry in recipe.ingredients.iter().chain(recipe.products.iter()) {
                if !good_ok(entry.good) {
                    return Err(CatalogError::InvalidGoodRef(entry.good));
                }
            }
            for &crafter in &recipe.crafters {
                match self.entities.get(crafter.0 as usize) {
                    None => return Err(CatalogError::InvalidEntityRef(crafter)),
                    Some(EntityDef {
                        kind: EntityKind::Crafter(_),
                        ..
                    }) => {}
                    Some(other) => return Err(CatalogError::NotACrafter(other.name.clone())),
                }
            }
        }

        for entity in &self.entities {
            if let EntityKind::Crafter(crafter) = &entity.kind {
                for &fuel in &crafter.energy.fuels {
                    if !good_ok(fuel) {
                        return Err(CatalogError::InvalidGoodRef(fuel));
                    }
                }
            }
        }

        for module in &self.modules {
            if let Some(item) = module.item
                && !good_ok(item)
            {
                return Err(CatalogError::InvalidGoodRef(item));
            }
        }

        let mut variants: HashMap<String, Vec<GoodId>> = HashMap::new();
        for (index, good) in self.goods.iter().enumerate() {
            variants
                .entry(good.base_name.clone())
                .or_default()
                .push(GoodId(index as u32));
        }

        Ok(Catalog {
            goods: self.goods,
            good_name_to_id: self.good_name_to_id,
            recipes: self.recipes,
            recipe_name_to_id: self.recipe_name_to_id,
            entities: self.entities,
            entity_name_to_id: self.entity_name_to_id,
            modules: self.modules,
            module_name_to_id: self.module_name_to_id,
            qualities: self.qualities,
            quality_name_to_id: self.quality_name_to_id,
            variants,
        })
    }
}

/// Immutable catalog snapshot. Frozen after build(); share it behind an `Arc`.
#[derive(Debug)]
pub struct Catalog {
    goods: Vec<GoodDef>,
    good_name_to_id: HashMap<String, GoodId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    entities: Vec<EntityDef>,
    entity_name_to_id: HashMap<String, EntityId>,
    modules: Vec<ModuleDef>,
    module_name_to_id: HashMap<String, ModuleId>,
    qualities: Vec<QualityDef>,
    quality_name_to_id: HashMap<String, QualityId>,
    /// Base name -> concrete goods sharing it, in registration order.
    variants: HashMap<String, Vec<GoodId>>,
}

impl Catalog {
    pub fn good(&self, id: GoodId) -> Option<&GoodDef> {
        self.goods.get(id.0 as usize)
    }

    pub fn recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityDef> {
        self.entities.get(id.0 as usize)
    }

    pub fn module(&self, id: ModuleId) -> Option<&ModuleDef> {
        self.modules.get(id.0 as usize)
    }

    pub fn quality(&self, id: QualityId) -> Option<&QualityDef> {
        self.qualities.get(id.0 as usize)
    }

    /// Quality multiplier, treating unknown qualities as normal.
    pub fn quality_multiplier(&self, id: QualityId) -> f64 {
        self.quality(id).map(QualityDef::multiplier).unwrap_or(1.0)
    }

    pub fn crafter(&self, id: EntityId) -> Option<&CrafterDef> {
        match &self.entity(id)?.kind {
            EntityKind::Crafter(crafter) => Some(crafter),
            _ => None,
        }
    }

    pub fn beacon(&self, id: EntityId) -> Option<&BeaconDef> {
        match &self.entity(id)?.kind {
            EntityKind::Beacon(beacon) => Some(beacon),
            _ => None,
        }
    }

    /// Fuels declared by an entity's energy source. Empty for non-crafters.
    pub fn fuels_of(&self, entity: EntityId) -> &[GoodId] {
        self.crafter(entity)
            .map(|c| c.energy.fuels.as_slice())
            .unwrap_or(&[])
    }

    /// All concrete goods sharing `base_name`, in registration order.
    pub fn variants(&self, base_name: &str) -> &[GoodId] {
        self.variants
            .get(base_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All variants of the given good, including itself.
    pub fn variants_of(&self, good: GoodId) -> &[GoodId] {
        self.good(good)
            .map(|g| self.variants(&g.base_name))
            .unwrap_or(&[])
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &ModuleDef)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i as u32), m))
    }

    pub fn good_id(&self, name: &str) -> Option<GoodId> {
        self.good_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn entity_id(&self, name: &str) -> Option<EntityId> {
        self.entity_name_to_id.get(name).copied()
    }

    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.module_name_to_id.get(name).copied()
    }

    pub fn quality_id(&self, name: &str) -> Option<QualityId> {
        self.quality_name_to_id.get(name).copied()
    }

    pub fn good_count(&self) -> usize {
        self.goods.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn quality_count(&self) -> usize {
        self.qualities.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid good reference: {0:?}")]
    InvalidGoodRef(GoodId),
    #[error("invalid entity reference: {0:?}")]
    InvalidEntityRef(EntityId),
    #[error("entity is not a crafter: {0}")]
    NotACrafter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_builder() -> CatalogBuilder {
        let mut b = CatalogBuilder::new();
        let ore = b.register_good(GoodDef::item("iron-ore"));
        let plate = b.register_good(GoodDef::item("iron-plate"));
        b.register_good(GoodDef::item("coal").with_fuel_value(4e6));
        let coal = b.good_id("coal").unwrap();
        let furnace = b.register_entity(EntityDef {
            name: "stone-furnace".into(),
            size: 2,
            kind: EntityKind::Crafter(CrafterDef {
                crafting_speed: 1.0,
                base_productivity: 0.0,
                energy: EnergySource {
                    kind: EnergyKind::Burner,
                    usage: 90e3,
                    effectivity: 1.0,
                    fuels: vec![coal],
                },
                module_slots: 0,
            }),
        });
        b.register_recipe(RecipeDef {
            name: "iron-plate".into(),
            kind: RecipeKind::Recipe,
            ingredients: vec![RecipeEntry::new(ore, 1.0)],
            products: vec![RecipeEntry::new(plate, 1.0)],
            time: 3.2,
            crafters: vec![furnace],
            allow_productivity: true,
        });
        b
    }

    #[test]
    fn register_and_build() {
        let cat = setup_builder().build().unwrap();
        assert_eq!(cat.good_count(), 3);
        assert_eq!(cat.recipe_count(), 1);
        assert_eq!(cat.entity_count(), 1);
        assert_eq!(cat.quality_count(), 1);
    }

    #[test]
    fn lookup_by_name() {
        let cat = setup_builder().build().unwrap();
        assert!(cat.good_id("iron-ore").is_some());
        assert!(cat.good_id("nonexistent").is_none());
        assert_eq!(cat.quality_id("normal"), Some(QualityId::NORMAL));
    }

    #[test]
    fn fuels_of_crafter() {
        let cat = setup_builder().build().unwrap();
        let furnace = cat.entity_id("stone-furnace").unwrap();
        assert_eq!(cat.fuels_of(furnace), &[cat.good_id("coal").unwrap()]);
        assert!(cat.fuels_of(EntityId(99)).is_empty());
    }

    #[test]
    fn variants_grouped_by_base_name() {
        let mut b = CatalogBuilder::new();
        let s165 = b.register_good(GoodDef::fluid("steam@165", "steam", 165.0));
        let s500 = b.register_good(GoodDef::fluid("steam@500", "steam", 500.0));
        let water = b.register_good(GoodDef::fluid("water", "water", 15.0));
        let cat = b.build().unwrap();
        assert_eq!(cat.variants("steam"), &[s165, s500]);
        assert_eq!(cat.variants_of(s500), &[s165, s500]);
        assert_eq!(cat.variants_of(water), &[water]);
        assert!(cat.variants("lava").is_empty());
    }

    #[test]
    fn mutate_recipe() {
        let mut builder = setup_builder();
        builder
            .mutate_recipe("iron-plate", |recipe| recipe.time = 1.6)
            .unwrap();
        let cat = builder.build().unwrap();
        let recipe = cat.recipe(cat.recipe_id("iron-plate").unwrap()).unwrap();
        assert_eq!(recipe.time, 1.6);
    }

    #[test]
    fn mutate_nonexistent_fails() {
        let mut builder = setup_builder();
        let result = builder.mutate_good("nonexistent", |_| {});
        match result {
            Err(CatalogError::NotFound(name)) => assert_eq!(name, "nonexistent"),
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn invalid_good_ref_in_recipe_fails() {
        let mut b = CatalogBuilder::new();
        b.register_recipe(RecipeDef {
            name: "bad".into(),
            kind: RecipeKind::Recipe,
            ingredients: vec![RecipeEntry::new(GoodId(999), 1.0)],
            products: vec![],
            time: 1.0,
            crafters: vec![],
            allow_productivity: false,
        });
        match b.build() {
            Err(CatalogError::InvalidGoodRef(id)) => {
                assert_eq!(id, GoodId(999));
                let msg = format!("{}", CatalogError::InvalidGoodRef(id));
                assert!(msg.contains("invalid good reference"), "got: {msg}");
            }
            other => panic!("expected InvalidGoodRef, got: {other:?}"),
        }
    }

    #[test]
    fn beacon_as_crafter_fails() {
        let mut b = CatalogBuilder::new();
        let beacon = b.register_entity(EntityDef {
            name: "beacon".into(),
            size: 3,
            kind: EntityKind::Beacon(BeaconDef {
                efficiency: 1.5,
                module_slots: 2,
            }),
        });
        b.register_recipe(RecipeDef {
            name: "nothing".into(),
            kind: RecipeKind::Recipe,
            ingredients: vec![],
            products: vec![],
            time: 1.0,
            crafters: vec![beacon],
            allow_productivity: false,
        });
        assert!(matches!(b.build(), Err(CatalogError::NotACrafter(name)) if name == "beacon"));
    }

    #[test]
    fn register_quality_levels() {
        let mut b = CatalogBuilder::new();
        let rare = b.register_quality("rare", 2);
        let cat = b.build().unwrap();
        assert_eq!(rare, QualityId(1));
        assert!((cat.quality_multiplier(rare) - 1.6).abs() < 1e-12);
        assert_eq!(cat.quality_multiplier(QualityId(42)), 1.0);
    }

    #[test]
    fn catalog_get_nonexistent_returns_none() {
        let cat = setup_builder().build().unwrap();
        assert!(cat.good(GoodId(999)).is_none());
        assert!(cat.recipe(RecipeId(999)).is_none());
        assert!(cat.entity(EntityId(999)).is_none());
        assert!(cat.module(ModuleId(999)).is_none());
        assert!(cat.crafter(EntityId(999)).is_none());
    }

    #[test]
    fn empty_catalog_builds_successfully() {
        let cat = CatalogBuilder::new().build().unwrap();
        assert_eq!(cat.good_count(), 0);
        assert_eq!(cat.recipe_count(), 0);
        assert_eq!(cat.quality_count(), 1);
    }
}
