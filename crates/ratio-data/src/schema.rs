//! Serde data file structs for catalog content.
//!
//! These structs define the on-disk format for goods, recipes, entities,
//! modules and quality tiers. They are deserialized from RON, JSON, or TOML
//! data files and then resolved into catalog definitions by
//! [`crate::catalog_config`]. References between files are by name.

use serde::Deserialize;

fn default_true() -> bool {
    true
}

fn default_one() -> f64 {
    1.0
}

fn default_size() -> u32 {
    1
}

// ===========================================================================
// Goods
// ===========================================================================

/// What kind of good a data entry describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodKindData {
    #[default]
    Item,
    Fluid,
    Special,
}

/// A good definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct GoodData {
    pub name: String,
    #[serde(default)]
    pub kind: GoodKindData,
    /// Shared by all variants of one good. Defaults to `name`.
    #[serde(default)]
    pub base_name: Option<String>,
    /// Fluid temperature. Ignored for other kinds.
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub fuel_value: f64,
    #[serde(default)]
    pub spent_result: Option<String>,
    #[serde(default)]
    pub cost: f64,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe ingredient or product, either as a short `("good", amount)` tuple
/// or in full form with the `ambiguous` flag for variant slots.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeEntryData {
    Short(String, f64),
    Full {
        good: String,
        amount: f64,
        #[serde(default)]
        ambiguous: bool,
    },
}

impl RecipeEntryData {
    pub fn good(&self) -> &str {
        match self {
            RecipeEntryData::Short(good, _) | RecipeEntryData::Full { good, .. } => good,
        }
    }

    pub fn amount(&self) -> f64 {
        match self {
            RecipeEntryData::Short(_, amount) | RecipeEntryData::Full { amount, .. } => *amount,
        }
    }

    pub fn ambiguous(&self) -> bool {
        matches!(
            self,
            RecipeEntryData::Full {
                ambiguous: true,
                ..
            }
        )
    }
}

/// A recipe definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    /// Synthetic recipes (mining, pumping) that run without a building.
    #[serde(default)]
    pub mechanic: bool,
    #[serde(default)]
    pub ingredients: Vec<RecipeEntryData>,
    pub products: Vec<RecipeEntryData>,
    #[serde(default = "default_one")]
    pub time: f64,
    /// Crafter names in preference order.
    #[serde(default)]
    pub crafters: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_productivity: bool,
}

// ===========================================================================
// Entities
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyKindData {
    Electric,
    Burner,
    FluidBurner,
    Heat,
    Void,
}

/// The energy source of a crafter.
#[derive(Debug, Clone, Deserialize)]
pub struct EnergyData {
    pub kind: EnergyKindData,
    /// Watts drawn while working.
    #[serde(default)]
    pub usage: f64,
    #[serde(default = "default_one")]
    pub effectivity: f64,
    /// Accepted fuel goods. Electric entities name the electricity good here.
    #[serde(default)]
    pub fuels: Vec<String>,
}

/// What an entity does.
#[derive(Debug, Clone, Deserialize)]
pub enum EntityKindData {
    Crafter {
        crafting_speed: f64,
        #[serde(default)]
        base_productivity: f64,
        energy: EnergyData,
        #[serde(default)]
        module_slots: u32,
    },
    Beacon {
        efficiency: f64,
        module_slots: u32,
    },
    Container {
        slots: u32,
    },
}

/// An entity definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityData {
    pub name: String,
    #[serde(default = "default_size")]
    pub size: u32,
    pub kind: EntityKindData,
}

// ===========================================================================
// Modules and qualities
// ===========================================================================

/// A module definition in a data file. Effects default to zero.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleData {
    pub name: String,
    /// The item good backing this module, used for payback costs.
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub productivity: f64,
    #[serde(default)]
    pub consumption: f64,
    #[serde(default)]
    pub pollution: f64,
}

/// A quality tier in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct QualityData {
    pub name: String,
    pub level: u32,
}

// ===========================================================================
// TOML wrappers (TOML does not support top-level arrays)
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TomlGoods {
    pub goods: Vec<GoodData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlRecipes {
    pub recipes: Vec<RecipeData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlEntities {
    pub entities: Vec<EntityData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlModules {
    pub modules: Vec<ModuleData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlQualities {
    pub qualities: Vec<QualityData>,
}

// ===========================================================================
// Tests
// ===========================================================================
