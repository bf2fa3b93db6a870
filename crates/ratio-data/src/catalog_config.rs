//! Builds a [`Catalog`] and [`SolverSettings`] from a data directory.
//!
//! Required files: `goods`, `entities`, `recipes`. Optional: `qualities`,
//! `modules`, `solver`. Goods are registered first so every other file can
//! reference them by name; entities come before recipes for crafter lists.

use ratio_core::catalog::*;
use ratio_core::id::*;
use ratio_core::settings::SolverSettings;
use std::collections::HashMap;
use std::path::Path;

use crate::loader::{
    DataLoadError, check_duplicate, deserialize_file, deserialize_list, find_data_file,
    require_data_file, require_positive, resolve_name,
};
use crate::schema::*;

/// Everything loaded from one data directory.
#[derive(Debug)]
pub struct GameData {
    pub catalog: Catalog,
    pub settings: SolverSettings,
}

/// Load every data file in `dir` and build the catalog.
pub fn load_catalog(dir: &Path) -> Result<GameData, DataLoadError> {
    let mut builder = CatalogBuilder::new();

    let goods = load_goods(&mut builder, &require_data_file(dir, "goods")?)?;

    if let Some(path) = find_data_file(dir, "qualities")? {
        load_qualities(&mut builder, &path)?;
    }

    let entities = load_entities(&mut builder, &require_data_file(dir, "entities")?, &goods)?;

    if let Some(path) = find_data_file(dir, "modules")? {
        load_modules(&mut builder, &path, &goods)?;
    }

    load_recipes(
        &mut builder,
        &require_data_file(dir, "recipes")?,
        &goods,
        &entities,
    )?;

    let settings = match find_data_file(dir, "solver")? {
        Some(path) => deserialize_file(&path)?,
        None => SolverSettings::default(),
    };

    let catalog = builder.build()?;
    tracing::info!(
        dir = %dir.display(),
        goods = catalog.good_count(),
        recipes = catalog.recipe_count(),
        entities = catalog.entity_count(),
        modules = catalog.module_count(),
        qualities = catalog.quality_count(),
        "catalog loaded"
    );
    Ok(GameData { catalog, settings })
}

// ===========================================================================
// Per-file loaders
// ===========================================================================

fn load_goods(
    builder: &mut CatalogBuilder,
    path: &Path,
) -> Result<HashMap<String, GoodId>, DataLoadError> {
    let data: Vec<GoodData> = deserialize_list(path, "goods")?;
    let mut names = HashMap::new();

    for good in &data {
        check_duplicate(&names, &good.name, path)?;
        let base_name = good.base_name.as_deref().unwrap_or(&good.name);
        let mut def = match good.kind {
            GoodKindData::Item => GoodDef::item(&good.name),
            GoodKindData::Fluid => GoodDef::fluid(&good.name, base_name, good.temperature),
            GoodKindData::Special => GoodDef::special(&good.name),
        };
        def.base_name = base_name.to_string();
        let id = builder.register_good(def.with_fuel_value(good.fuel_value).with_cost(good.cost));
        names.insert(good.name.clone(), id);
    }

    // Spent results may point forward in the file.
    for good in &data {
        if let Some(spent) = &good.spent_result {
            let spent = resolve_name(&names, spent, path, "good")?;
            builder.mutate_good(&good.name, |g| g.spent_result = Some(spent))?;
        }
    }

    Ok(names)
}

fn load_qualities(builder: &mut CatalogBuilder, path: &Path) -> Result<(), DataLoadError> {
    let data: Vec<QualityData> = deserialize_list(path, "qualities")?;
    let mut seen = HashMap::new();
    for quality in data {
        check_duplicate(&seen, &quality.name, path)?;
        let id = builder.register_quality(&quality.name, quality.level);
        seen.insert(quality.name, id);
    }
    Ok(())
}

fn load_entities(
    builder: &mut CatalogBuilder,
    path: &Path,
    goods: &HashMap<String, GoodId>,
) -> Result<HashMap<String, EntityId>, DataLoadError> {
    let data: Vec<EntityData> = deserialize_list(path, "entities")?;
    let mut names = HashMap::new();

    for entity in data {
        check_duplicate(&names, &entity.name, path)?;
        let kind = match entity.kind {
            EntityKindData::Crafter {
                crafting_speed,
                base_productivity,
                energy,
                module_slots,
            } => {
                require_positive(crafting_speed, &entity.name, path, "crafting speed")?;
                let fuels = energy
                    .fuels
                    .iter()
                    .map(|f| resolve_name(goods, f, path, "good"))
                    .collect::<Result<Vec<_>, _>>()?;
                EntityKind::Crafter(CrafterDef {
                    crafting_speed,
                    base_productivity,
                    energy: EnergySource {
                        kind: energy_kind(energy.kind),
                        usage: energy.usage,
                        effectivity: energy.effectivity,
                        fuels,
                    },
                    module_slots,
                })
            }
            EntityKindData::Beacon {
                efficiency,
                module_slots,
            } => EntityKind::Beacon(BeaconDef {
                efficiency,
                module_slots,
            }),
            EntityKindData::Container { slots } => EntityKind::Container { slots },
        };
        let id = builder.register_entity(EntityDef {
            name: entity.name.clone(),
            size: entity.size,
            kind,
        });
        names.insert(entity.name, id);
    }

    Ok(names)
}

fn energy_kind(kind: EnergyKindData) -> EnergyKind {
    match kind {
        EnergyKindData::Electric => EnergyKind::Electric,
        EnergyKindData::Burner => EnergyKind::Burner,
        EnergyKindData::FluidBurner => EnergyKind::FluidBurner,
        EnergyKindData::Heat => EnergyKind::Heat,
        EnergyKindData::Void => EnergyKind::Void,
    }
}

fn load_modules(
    builder: &mut CatalogBuilder,
    path: &Path,
    goods: &HashMap<String, GoodId>,
) -> Result<(), DataLoadError> {
    let data: Vec<ModuleData> = deserialize_list(path, "modules")?;
    let mut seen = HashMap::new();

    for module in data {
        check_duplicate(&seen, &module.name, path)?;
        let item = module
            .item
            .as_deref()
            .map(|item| resolve_name(goods, item, path, "good"))
            .transpose()?;
        let id = builder.register_module(ModuleDef {
            name: module.name.clone(),
            item,
            effects: ModuleEffects {
                speed: module.speed,
                productivity: module.productivity,
                consumption: module.consumption,
                pollution: module.pollution,
            },
        });
        seen.insert(module.name, id);
    }
    Ok(())
}

fn load_recipes(
    builder: &mut CatalogBuilder,
    path: &Path,
    goods: &HashMap<String, GoodId>,
    entities: &HashMap<String, EntityId>,
) -> Result<(), DataLoadError> {
    let data: Vec<RecipeData> = deserialize_list(path, "recipes")?;
    let mut seen = HashMap::new();

    let entries = |list: &[RecipeEntryData]| {
        list.iter()
            .map(|e| {
                let good = resolve_name(goods, e.good(), path, "good")?;
                Ok(if e.ambiguous() {
                    RecipeEntry::ambiguous(good, e.amount())
                } else {
                    RecipeEntry::new(good, e.amount())
                })
            })
            .collect::<Result<Vec<_>, DataLoadError>>()
    };

    for recipe in data {
        check_duplicate(&seen, &recipe.name, path)?;
        require_positive(recipe.time, &recipe.name, path, "time")?;
        let crafters = recipe
            .crafters
            .iter()
            .map(|c| resolve_name(entities, c, path, "entity"))
            .collect::<Result<Vec<_>, _>>()?;
        let id = builder.register_recipe(RecipeDef {
            name: recipe.name.clone(),
            kind: if recipe.mechanic {
                RecipeKind::Mechanic
            } else {
                RecipeKind::Recipe
            },
            ingredients: entries(&recipe.ingredients)?,
            products: entries(&recipe.products)?,
            time: recipe.time,
            crafters,
            allow_productivity: recipe.allow_productivity,
        });
        seen.insert(recipe.name, id);
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::{cleanup, make_test_dir};
    use std::fs;

    const GOODS: &str = r#"[
        (name: "iron-ore", cost: 1.0),
        (name: "iron-plate", cost: 2.0),
        (name: "coal", fuel_value: 4000000.0),
        (name: "uranium-fuel-cell", fuel_value: 8000000000.0,
            spent_result: Some("depleted-uranium-fuel-cell")),
        (name: "depleted-uranium-fuel-cell"),
        (name: "steam@165", kind: fluid, base_name: Some("steam"), temperature: 165.0),
        (name: "steam@500", kind: fluid, base_name: Some("steam"), temperature: 500.0),
    ]"#;

    const ENTITIES: &str = r#"[
        (name: "stone-furnace", size: 2, kind: Crafter(
            crafting_speed: 1.0,
            energy: (kind: burner, usage: 90000.0, fuels: ["coal"]),
        )),
        (name: "beacon", size: 3, kind: Beacon(efficiency: 1.5, module_slots: 2)),
    ]"#;

    const RECIPES: &str = r#"[
        (name: "mine-iron-ore", mechanic: true, products: [("iron-ore", 1.0)]),
        (name: "iron-plate", ingredients: [("iron-ore", 1.0)],
            products: [("iron-plate", 1.0)], time: 3.2, crafters: ["stone-furnace"]),
    ]"#;

    fn write_base(dir: &Path) {
        fs::write(dir.join("goods.ron"), GOODS).unwrap();
        fs::write(dir.join("entities.ron"), ENTITIES).unwrap();
        fs::write(dir.join("recipes.ron"), RECIPES).unwrap();
    }

    #[test]
    fn loads_required_files() {
        let dir = make_test_dir("catalog_required");
        write_base(&dir);

        let data = load_catalog(&dir).unwrap();
        let cat = &data.catalog;
        assert_eq!(cat.good_count(), 7);
        assert_eq!(cat.recipe_count(), 2);
        assert_eq!(cat.entity_count(), 2);
        assert_eq!(cat.quality_count(), 1);
        assert_eq!(data.settings, SolverSettings::default());

        let furnace = cat.entity_id("stone-furnace").unwrap();
        assert_eq!(cat.fuels_of(furnace), &[cat.good_id("coal").unwrap()]);
        let mining = cat.recipe(cat.recipe_id("mine-iron-ore").unwrap()).unwrap();
        assert_eq!(mining.kind, RecipeKind::Mechanic);

        cleanup(&dir);
    }

    #[test]
    fn spent_results_and_variants_resolve() {
        let dir = make_test_dir("catalog_spent");
        write_base(&dir);

        let cat = load_catalog(&dir).unwrap().catalog;
        let cell = cat.good(cat.good_id("uranium-fuel-cell").unwrap()).unwrap();
        assert_eq!(cell.spent_result, cat.good_id("depleted-uranium-fuel-cell"));
        assert_eq!(cat.variants("steam").len(), 2);

        cleanup(&dir);
    }

    #[test]
    fn optional_files_in_other_formats() {
        let dir = make_test_dir("catalog_optional");
        write_base(&dir);
        fs::write(
            dir.join("qualities.toml"),
            "[[qualities]]\nname = \"uncommon\"\nlevel = 1\n",
        )
        .unwrap();
        fs::write(
            dir.join("modules.json"),
            r#"[{"name": "productivity-module", "item": "iron-plate", "productivity": 0.1}]"#,
        )
        .unwrap();
        fs::write(dir.join("solver.toml"), "tie_break_epsilon = 0.001\n").unwrap();

        let data = load_catalog(&dir).unwrap();
        assert_eq!(data.catalog.quality_count(), 2);
        assert_eq!(data.catalog.module_count(), 1);
        assert_eq!(data.settings.tie_break_epsilon, 0.001);
        assert_eq!(data.settings.default_pin_buildings, 1.0);

        cleanup(&dir);
    }

    #[test]
    fn missing_recipes_file_is_an_error() {
        let dir = make_test_dir("catalog_missing");
        fs::write(dir.join("goods.ron"), GOODS).unwrap();
        fs::write(dir.join("entities.ron"), ENTITIES).unwrap();

        assert!(matches!(
            load_catalog(&dir),
            Err(DataLoadError::MissingRequired { ref file, .. }) if file == "recipes"
        ));

        cleanup(&dir);
    }

    #[test]
    fn unknown_crafter_is_unresolved() {
        let dir = make_test_dir("catalog_unknown_crafter");
        write_base(&dir);
        fs::write(
            dir.join("recipes.ron"),
            r#"[(name: "gear", products: [("iron-plate", 1.0)], crafters: ["assembler"])]"#,
        )
        .unwrap();

        assert!(matches!(
            load_catalog(&dir),
            Err(DataLoadError::UnresolvedRef { ref name, expected_kind: "entity", .. })
                if name == "assembler"
        ));

        cleanup(&dir);
    }

    #[test]
    fn beacon_as_crafter_fails_validation() {
        let dir = make_test_dir("catalog_not_crafter");
        write_base(&dir);
        fs::write(
            dir.join("recipes.ron"),
            r#"[(name: "gear", products: [("iron-plate", 1.0)], crafters: ["beacon"])]"#,
        )
        .unwrap();

        assert!(matches!(
            load_catalog(&dir),
            Err(DataLoadError::Catalog(CatalogError::NotACrafter(_)))
        ));

        cleanup(&dir);
    }

    #[test]
    fn duplicate_goods_rejected() {
        let dir = make_test_dir("catalog_duplicate");
        write_base(&dir);
        fs::write(
            dir.join("goods.ron"),
            r#"[(name: "iron-ore"), (name: "iron-ore")]"#,
        )
        .unwrap();

        assert!(matches!(
            load_catalog(&dir),
            Err(DataLoadError::DuplicateName { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn zero_time_rejected() {
        let dir = make_test_dir("catalog_zero_time");
        write_base(&dir);
        fs::write(
            dir.join("recipes.ron"),
            r#"[(name: "instant", products: [("iron-ore", 1.0)], time: 0.0)]"#,
        )
        .unwrap();

        assert!(matches!(
            load_catalog(&dir),
            Err(DataLoadError::InvalidValue { .. })
        ));

        cleanup(&dir);
    }
}
