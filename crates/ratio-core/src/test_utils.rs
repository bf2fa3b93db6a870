//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::*;
use crate::id::*;
use crate::quality::WithQuality;
use crate::table::{RowRecipe, TableArena};

// ===========================================================================
// Names
// ===========================================================================

pub mod names {
    // Goods
    pub const IRON_ORE: &str = "iron-ore";
    pub const IRON_PLATE: &str = "iron-plate";
    pub const GEAR: &str = "iron-gear-wheel";
    pub const COAL: &str = "coal";
    pub const WATER: &str = "water";
    pub const STEAM_165: &str = "steam@165";
    pub const STEAM_500: &str = "steam@500";
    pub const HEAVY_OIL: &str = "heavy-oil";
    pub const LIGHT_OIL: &str = "light-oil";
    pub const ELECTRICITY: &str = "electricity";
    pub const FUEL_CELL: &str = "uranium-fuel-cell";
    pub const DEPLETED_CELL: &str = "depleted-uranium-fuel-cell";
    pub const HEAT: &str = "heat";

    // Recipes (the gear recipe shares its product's name)
    pub const IRON_PLATE_RECIPE: &str = "iron-plate";
    pub const MINING: &str = "mine-iron-ore";
    pub const BOIL_WATER: &str = "boil-water";
    pub const TURBINE_POWER: &str = "turbine-power";
    pub const REACTOR_HEAT: &str = "reactor-heat";

    // Entities
    pub const ASSEMBLER_1: &str = "assembling-machine-1";
    pub const ASSEMBLER_2: &str = "assembling-machine-2";
    pub const ASSEMBLER_3: &str = "assembling-machine-3";
    pub const FURNACE: &str = "stone-furnace";
    pub const OIL_BOILER: &str = "oil-boiler";
    pub const LIGHT_OIL_BOILER: &str = "light-oil-boiler";
    pub const TURBINE: &str = "steam-turbine";
    pub const REACTOR: &str = "nuclear-reactor";
    pub const BEACON: &str = "beacon";
    pub const CHEST: &str = "wooden-chest";

    // Modules
    pub const SPEED_MODULE: &str = "speed-module";
    pub const PROD_MODULE: &str = "productivity-module";
    pub const EFFICIENCY_MODULE: &str = "efficiency-module";
}

// ===========================================================================
// Fixture catalog
// ===========================================================================

fn crafter(name: &str, speed: f64, energy: EnergySource, slots: u32) -> EntityDef {
    EntityDef {
        name: name.to_string(),
        size: 3,
        kind: EntityKind::Crafter(CrafterDef {
            crafting_speed: speed,
            base_productivity: 0.0,
            energy,
            module_slots: slots,
        }),
    }
}

fn energy(kind: EnergyKind, usage: f64, fuels: Vec<GoodId>) -> EnergySource {
    EnergySource {
        kind,
        usage,
        effectivity: 1.0,
        fuels,
    }
}

fn recipe(
    name: &str,
    ingredients: Vec<RecipeEntry>,
    products: Vec<RecipeEntry>,
    time: f64,
    crafters: Vec<EntityId>,
) -> RecipeDef {
    RecipeDef {
        name: name.to_string(),
        kind: RecipeKind::Recipe,
        ingredients,
        products,
        time,
        crafters,
        allow_productivity: true,
    }
}

/// A small catalog covering burner, electric, fluid-burner and void
/// crafters, temperature variants, spent fuel, beacons and modules.
pub fn fixture_builder() -> CatalogBuilder {
    use names::*;

    let mut b = CatalogBuilder::new();
    b.register_quality("uncommon", 1);
    b.register_quality("rare", 2);

    let ore = b.register_good(GoodDef::item(IRON_ORE).with_cost(1.0));
    let plate = b.register_good(GoodDef::item(IRON_PLATE).with_cost(2.0));
    let gear = b.register_good(GoodDef::item(GEAR).with_cost(5.0));
    let coal = b.register_good(GoodDef::item(COAL).with_fuel_value(4e6).with_cost(1.0));
    let water = b.register_good(GoodDef::fluid(WATER, WATER, 15.0));
    let steam_165 = b.register_good(GoodDef::fluid(STEAM_165, "steam", 165.0));
    b.register_good(GoodDef::fluid(STEAM_500, "steam", 500.0));
    let heavy = b.register_good(GoodDef::fluid(HEAVY_OIL, HEAVY_OIL, 25.0).with_fuel_value(1e6));
    let light = b.register_good(GoodDef::fluid(LIGHT_OIL, LIGHT_OIL, 25.0).with_fuel_value(1.5e6));
    let electricity = b.register_good(GoodDef::special(ELECTRICITY).with_fuel_value(1.0));
    let depleted = b.register_good(GoodDef::item(DEPLETED_CELL));
    let cell = b.register_good(
        GoodDef::item(FUEL_CELL)
            .with_fuel_value(8e9)
            .with_spent_result(depleted),
    );
    let heat = b.register_good(GoodDef::special(HEAT));
    let speed_item = b.register_good(GoodDef::item(SPEED_MODULE).with_cost(50.0));
    let prod_item = b.register_good(GoodDef::item(PROD_MODULE).with_cost(50.0));
    let efficiency_item = b.register_good(GoodDef::item(EFFICIENCY_MODULE).with_cost(50.0));

    let electric = |usage| energy(EnergyKind::Electric, usage, vec![electricity]);
    let asm1 = b.register_entity(crafter(ASSEMBLER_1, 0.5, electric(75e3), 0));
    let asm2 = b.register_entity(crafter(ASSEMBLER_2, 0.75, electric(150e3), 2));
    let asm3 = b.register_entity(crafter(ASSEMBLER_3, 1.25, electric(375e3), 4));
    let furnace = b.register_entity(crafter(
        FURNACE,
        1.0,
        energy(EnergyKind::Burner, 90e3, vec![coal]),
        0,
    ));
    let oil_boiler = b.register_entity(crafter(
        OIL_BOILER,
        1.0,
        energy(EnergyKind::FluidBurner, 1.8e6, vec![heavy, light]),
        0,
    ));
    let light_boiler = b.register_entity(crafter(
        LIGHT_OIL_BOILER,
        1.0,
        energy(EnergyKind::FluidBurner, 1.8e6, vec![light]),
        0,
    ));
    let turbine = b.register_entity(crafter(TURBINE, 1.0, EnergySource::void(), 0));
    let reactor = b.register_entity(crafter(
        REACTOR,
        1.0,
        energy(EnergyKind::Burner, 40e6, vec![cell]),
        0,
    ));
    b.register_entity(EntityDef {
        name: BEACON.to_string(),
        size: 3,
        kind: EntityKind::Beacon(BeaconDef {
            efficiency: 1.5,
            module_slots: 2,
        }),
    });
    b.register_entity(EntityDef {
        name: CHEST.to_string(),
        size: 1,
        kind: EntityKind::Container { slots: 16 },
    });

    b.register_module(ModuleDef {
        name: SPEED_MODULE.to_string(),
        item: Some(speed_item),
        effects: ModuleEffects {
            speed: 0.5,
            consumption: 0.7,
            ..Default::default()
        },
    });
    b.register_module(ModuleDef {
        name: PROD_MODULE.to_string(),
        item: Some(prod_item),
        effects: ModuleEffects {
            speed: -0.15,
            productivity: 0.1,
            consumption: 0.8,
            pollution: 0.1,
        },
    });
    b.register_module(ModuleDef {
        name: EFFICIENCY_MODULE.to_string(),
        item: Some(efficiency_item),
        effects: ModuleEffects {
            consumption: -0.3,
            ..Default::default()
        },
    });

    b.register_recipe(RecipeDef {
        kind: RecipeKind::Mechanic,
        ..recipe(MINING, vec![], vec![RecipeEntry::new(ore, 1.0)], 1.0, vec![])
    });
    b.register_recipe(recipe(
        IRON_PLATE_RECIPE,
        vec![RecipeEntry::new(ore, 1.0)],
        vec![RecipeEntry::new(plate, 1.0)],
        3.2,
        vec![furnace],
    ));
    b.register_recipe(recipe(
        GEAR,
        vec![RecipeEntry::new(plate, 2.0)],
        vec![RecipeEntry::new(gear, 1.0)],
        0.5,
        vec![asm1, asm2, asm3],
    ));
    b.register_recipe(recipe(
        BOIL_WATER,
        vec![RecipeEntry::new(water, 60.0)],
        vec![RecipeEntry::ambiguous(steam_165, 60.0)],
        1.0,
        vec![oil_boiler, light_boiler],
    ));
    b.register_recipe(recipe(
        TURBINE_POWER,
        vec![RecipeEntry::ambiguous(steam_165, 60.0)],
        vec![RecipeEntry::new(electricity, 5.4e6)],
        1.0,
        vec![turbine],
    ));
    b.register_recipe(recipe(
        REACTOR_HEAT,
        vec![],
        vec![RecipeEntry::new(heat, 40e6)],
        1.0,
        vec![reactor],
    ));
    b
}

pub fn fixture_catalog() -> Catalog {
    fixture_builder()
        .build()
        .expect("fixture catalog is consistent")
}

// ===========================================================================
// Table helpers
// ===========================================================================

/// Append a normal-quality recipe row by recipe name.
pub fn add_recipe_row(
    arena: &mut TableArena,
    catalog: &Catalog,
    table: TableId,
    recipe: &str,
) -> RowId {
    let id = catalog
        .recipe_id(recipe)
        .unwrap_or_else(|| panic!("unknown recipe {recipe}"));
    let source = match catalog.recipe(id).map(|r| r.kind) {
        Some(RecipeKind::Mechanic) => RowRecipe::Mechanic(WithQuality::normal(id)),
        _ => RowRecipe::Recipe(WithQuality::normal(id)),
    };
    arena
        .add_row(table, source)
        .expect("table exists")
}

pub fn entity(catalog: &Catalog, name: &str) -> WithQuality<EntityId> {
    WithQuality::normal(
        catalog
            .entity_id(name)
            .unwrap_or_else(|| panic!("unknown entity {name}")),
    )
}

pub fn good(catalog: &Catalog, name: &str) -> WithQuality<GoodId> {
    WithQuality::normal(
        catalog
            .good_id(name)
            .unwrap_or_else(|| panic!("unknown good {name}")),
    )
}

/// Relative comparison with the 0.01% display tolerance.
pub fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-4 * expected.abs().max(1e-9);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

// ===========================================================================
// Tracing
// ===========================================================================

/// Install a test-writer subscriber once. Later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
