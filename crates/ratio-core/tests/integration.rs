//! Integration tests for the Ratio solving engine.
//!
//! These tests exercise the full pipeline on the fixture catalog: selection,
//! modifiers, linear system, relocking, projection and write-back.

use ratio_core::catalog::Catalog;
use ratio_core::constraint::FixedConstraint;
use ratio_core::id::*;
use ratio_core::quality::WithQuality;
use ratio_core::selector::Preferences;
use ratio_core::settings::SolverSettings;
use ratio_core::solver::{SolveContext, solve_table};
use ratio_core::table::*;
use ratio_core::test_utils::*;

struct Fixture {
    catalog: Catalog,
    preferences: Preferences,
    settings: SolverSettings,
    arena: TableArena,
    root: TableId,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        let mut arena = TableArena::new();
        let root = arena.add_root_table();
        Self {
            catalog: fixture_catalog(),
            preferences: Preferences::default(),
            settings: SolverSettings::default(),
            arena,
            root,
        }
    }

    fn row(&mut self, recipe: &str) -> RowId {
        add_recipe_row(&mut self.arena, &self.catalog, self.root, recipe)
    }

    fn link(&mut self, good_name: &str, amount: f64) -> LinkId {
        let g = good(&self.catalog, good_name);
        let link = self.arena.add_link(self.root, g).unwrap();
        self.arena.set_link_amount(link, amount).unwrap();
        link
    }

    fn solve(&mut self) {
        let ctx = SolveContext {
            catalog: &self.catalog,
            preferences: &self.preferences,
            settings: &self.settings,
        };
        solve_table(&mut self.arena, self.root, &ctx).unwrap();
    }

    fn get(&self, row: RowId) -> &RecipeRow {
        self.arena.row(row).unwrap()
    }
}

// ===========================================================================
// Test 1: Mine -> smelt -> assemble chain
// ===========================================================================

#[test]
fn mining_smelting_assembly_chain() {
    let mut f = Fixture::new();
    let mine = f.row(names::MINING);
    let smelt = f.row(names::IRON_PLATE_RECIPE);
    let assemble = f.row(names::GEAR);
    f.link(names::IRON_ORE, 0.0);
    f.link(names::IRON_PLATE, 0.0);
    f.link(names::GEAR, 1.0);
    f.solve();

    // One gear per second needs two plates and two ore.
    assert_close(f.get(assemble).recipes_per_second(), 1.0);
    assert_close(f.get(smelt).recipes_per_second(), 2.0);
    assert_close(f.get(mine).recipes_per_second(), 2.0);

    // Stone furnace at speed 1, 3.2 s per plate.
    assert_close(f.get(smelt).buildings(), 6.4);
    // Assembler 1 at speed 0.5, 0.5 s per gear.
    assert_close(f.get(assemble).buildings(), 1.0);
    // Mechanics run at speed 1.
    assert_close(f.get(mine).buildings(), 2.0);
    assert!(f.get(mine).fuel_usage().is_none());
}

#[test]
fn unlinked_goods_become_flows() {
    let mut f = Fixture::new();
    f.row(names::MINING);
    f.row(names::IRON_PLATE_RECIPE);
    f.link(names::IRON_ORE, 0.0);
    f.link(names::IRON_PLATE, 2.0);
    f.solve();

    let flows = f.arena.table(f.root).unwrap().flows();
    let coal = good(&f.catalog, names::COAL);
    let coal_flow = flows.iter().find(|fl| fl.good == coal).unwrap();
    // 90 kW * 3.2 s / 4 MJ per plate, 2 plates per second.
    assert_close(coal_flow.amount, -0.144);
    assert!(flows.iter().all(|fl| fl.good != good(&f.catalog, names::IRON_PLATE)));
}

// ===========================================================================
// Test 2: Display round-trip
// ===========================================================================

#[test]
fn displayed_amounts_are_per_recipe_times_rate() {
    let mut f = Fixture::new();
    let smelt = f.row(names::IRON_PLATE_RECIPE);
    f.arena.set_fixed_buildings(smelt, 3.0).unwrap();
    f.solve();

    let row = f.get(smelt);
    let rps = row.recipes_per_second();
    assert_close(rps, 3.0 / 3.2);
    assert_close(row.ingredients()[0].amount, -rps);
    assert_close(row.products()[0].amount, rps);
    assert_close(row.fuel_usage().unwrap().amount, -0.072 * rps);
}

#[test]
fn spent_fuel_listed_after_products() {
    let mut f = Fixture::new();
    let reactor = f.row(names::REACTOR_HEAT);
    f.arena.set_fixed_buildings(reactor, 2.0).unwrap();
    f.solve();

    let row = f.get(reactor);
    let products = row.products();
    assert_eq!(products.len(), 2);
    assert_eq!(products[1].good, good(&f.catalog, names::DEPLETED_CELL));
    // 40 MW for 1 s from an 8 GJ cell, two reactors.
    assert_close(row.fuel_usage().unwrap().amount, -0.01);
    assert_close(products[1].amount, 0.01);
}

// ===========================================================================
// Test 3: Variants
// ===========================================================================

#[test]
fn variant_switch_affects_only_that_row() {
    let mut f = Fixture::new();
    let a = f.row(names::TURBINE_POWER);
    let b = f.row(names::TURBINE_POWER);
    f.arena.set_fixed_buildings(a, 1.0).unwrap();
    f.arena.set_fixed_buildings(b, 1.0).unwrap();
    let s165 = f.catalog.good_id(names::STEAM_165).unwrap();
    let s500 = f.catalog.good_id(names::STEAM_500).unwrap();

    f.solve();
    assert_eq!(f.get(a).ingredients()[0].good.target, s165);
    assert_eq!(f.get(b).ingredients()[0].good.target, s165);
    assert_eq!(f.get(a).ingredients()[0].variants, vec![s165, s500]);

    f.arena.set_variant(&f.catalog, b, s500).unwrap();
    f.solve();
    assert_eq!(f.get(a).ingredients()[0].good.target, s165);
    assert_eq!(f.get(b).ingredients()[0].good.target, s500);
    assert_close(f.get(a).ingredients()[0].amount, -60.0);
    assert_close(f.get(b).ingredients()[0].amount, -60.0);
}

#[test]
fn linked_variant_balances_producer_and_consumer() {
    let mut f = Fixture::new();
    let boil = f.row(names::BOIL_WATER);
    let turbine = f.row(names::TURBINE_POWER);
    let s500 = f.catalog.good_id(names::STEAM_500).unwrap();
    f.arena.set_variant(&f.catalog, boil, s500).unwrap();
    f.arena.set_variant(&f.catalog, turbine, s500).unwrap();
    f.arena.set_fixed_buildings(turbine, 2.0).unwrap();
    f.link(names::STEAM_500, 0.0);
    f.solve();

    assert_close(f.get(boil).recipes_per_second(), 2.0);
    assert_close(f.get(boil).products()[0].amount, 120.0);
}

// ===========================================================================
// Test 4: Modules, beacons, quality
// ===========================================================================

#[test]
fn table_defaults_autofill_productivity() {
    let mut f = Fixture::new();
    let gears = f.row(names::GEAR);
    let asm3 = entity(&f.catalog, names::ASSEMBLER_3);
    f.arena.set_entity(gears, Some(asm3)).unwrap();
    f.arena
        .set_module_defaults(
            f.root,
            ModuleFillParameters {
                autofill_payback: 3600.0,
                ..Default::default()
            },
        )
        .unwrap();
    f.arena.set_fixed_buildings(gears, 1.0).unwrap();
    f.solve();

    // Four productivity modules: +40% output, speed 1.25 * 0.4 = 0.5.
    let row = f.get(gears);
    assert_close(row.recipes_per_second(), 1.0);
    assert_close(row.products()[0].amount, 1.4);
    assert_close(row.ingredients()[0].amount, -2.0);
}

#[test]
fn explicit_modules_shadow_defaults() {
    let mut f = Fixture::new();
    let gears = f.row(names::GEAR);
    f.arena
        .set_entity(gears, Some(entity(&f.catalog, names::ASSEMBLER_3)))
        .unwrap();
    f.arena
        .set_module_defaults(
            f.root,
            ModuleFillParameters {
                autofill_payback: 3600.0,
                ..Default::default()
            },
        )
        .unwrap();
    f.arena
        .set_modules(gears, RowModules::Explicit(ModuleSet::default()))
        .unwrap();
    f.arena.set_fixed_buildings(gears, 1.0).unwrap();
    f.solve();

    let row = f.get(gears);
    assert_close(row.recipes_per_second(), 2.5);
    assert_close(row.products()[0].amount, 2.5);
}

#[test]
fn beacon_speeds_up_row() {
    let mut f = Fixture::new();
    let gears = f.row(names::GEAR);
    let speed = f.catalog.module_id(names::SPEED_MODULE).unwrap();
    f.arena
        .set_modules(
            gears,
            RowModules::Explicit(ModuleSet {
                modules: vec![],
                beacon: Some(BeaconConfig {
                    beacon: entity(&f.catalog, names::BEACON),
                    modules: vec![ModuleSlot {
                        module: WithQuality::normal(speed),
                        count: 2,
                    }],
                    count: 1,
                }),
            }),
        )
        .unwrap();
    f.arena.set_fixed_buildings(gears, 1.0).unwrap();
    f.solve();

    // 1 beacon * 1.5 * 2 * 0.5 = +150% speed on assembler 1.
    assert_close(f.get(gears).recipes_per_second(), 2.5);
}

#[test]
fn entity_quality_raises_speed() {
    let mut f = Fixture::new();
    let gears = f.row(names::GEAR);
    let rare = f.catalog.quality_id("rare").unwrap();
    let asm2 = f.catalog.entity_id(names::ASSEMBLER_2).unwrap();
    f.arena
        .set_entity(gears, Some(WithQuality::new(asm2, rare)))
        .unwrap();
    f.arena.set_fixed_buildings(gears, 1.0).unwrap();
    f.solve();

    assert_close(f.get(gears).recipes_per_second(), 0.75 * 1.6 / 0.5);
}

#[test]
fn fuel_quality_stretches_burn_time() {
    let mut f = Fixture::new();
    let plates = f.row(names::IRON_PLATE_RECIPE);
    f.arena.set_fixed_buildings(plates, 1.0).unwrap();
    f.solve();
    // 90 kW from 4 MJ coal.
    assert_close(f.get(plates).fuel_usage().unwrap().amount, -0.0225);

    let rare = f.catalog.quality_id("rare").unwrap();
    let coal = f.catalog.good_id(names::COAL).unwrap();
    f.arena
        .set_fuel(plates, Some(WithQuality::new(coal, rare)))
        .unwrap();
    f.solve();

    let row = f.get(plates);
    assert_eq!(row.fuel(), Some(WithQuality::new(coal, rare)));
    assert_close(row.buildings(), 1.0);
    assert_close(row.fuel_usage().unwrap().amount, -0.0225 / 1.6);
}

#[test]
fn recipe_quality_tags_goods() {
    let mut f = Fixture::new();
    let uncommon = f.catalog.quality_id("uncommon").unwrap();
    let recipe = f.catalog.recipe_id(names::GEAR).unwrap();
    let gears = f
        .arena
        .add_row(f.root, RowRecipe::Recipe(WithQuality::new(recipe, uncommon)))
        .unwrap();
    f.arena.set_fixed_buildings(gears, 1.0).unwrap();
    f.solve();

    let row = f.get(gears);
    assert_eq!(row.products()[0].good.quality, uncommon);
    assert_eq!(row.ingredients()[0].good.quality, uncommon);
}

// ===========================================================================
// Test 5: Links
// ===========================================================================

#[test]
fn link_flags_report_participants() {
    let mut f = Fixture::new();
    f.row(names::IRON_PLATE_RECIPE);
    let gears = f.row(names::GEAR);
    f.arena.set_fixed_buildings(gears, 1.0).unwrap();
    let plates = f.link(names::IRON_PLATE, 0.0);
    let ore = f.link(names::IRON_ORE, -2.0);
    let heat = f.link(names::HEAT, 0.0);
    f.solve();

    let flags = f.arena.link(plates).unwrap().flags();
    assert!(flags.has_production && flags.has_consumption && !flags.solve_failed);
    let flags = f.arena.link(ore).unwrap().flags();
    assert!(!flags.has_production && flags.has_consumption);
    let flags = f.arena.link(heat).unwrap().flags();
    assert!(!flags.has_production && !flags.has_consumption);
}

#[test]
fn overproduction_link_accepts_surplus() {
    let mut f = Fixture::new();
    let gears = f.row(names::GEAR);
    f.arena.set_fixed_buildings(gears, 3.0).unwrap();
    let link = f.link(names::GEAR, 1.0);
    f.arena
        .set_link_algorithm(link, LinkAlgorithm::AllowOverProduction)
        .unwrap();
    f.solve();

    assert!(!f.get(gears).flags().solve_failed);
    assert_close(f.get(gears).products()[0].amount, 3.0);
    assert_eq!(f.get(gears).products()[0].link, Some(link));
}

#[test]
fn fixed_product_sets_rate() {
    let mut f = Fixture::new();
    let gears = f.row(names::GEAR);
    f.arena.set_fixed_buildings(gears, 1.0).unwrap();
    f.solve();

    let gear = f.catalog.good_id(names::GEAR).unwrap();
    f.arena.set_fixed_product(gears, gear).unwrap();
    assert_eq!(
        f.get(gears).fixed(),
        FixedConstraint::Product {
            good: gear,
            amount: 1.0
        }
    );
    f.arena
        .set_fixed(
            gears,
            FixedConstraint::Product {
                good: gear,
                amount: 4.0,
            },
        )
        .unwrap();
    f.solve();
    assert_close(f.get(gears).products()[0].amount, 4.0);
    assert_close(f.get(gears).buildings(), 4.0);
}

// ===========================================================================
// Test 6: Dirty tracking
// ===========================================================================

#[test]
fn edits_dirty_and_solve_cleans() {
    let mut f = Fixture::new();
    let gears = f.row(names::GEAR);
    assert!(f.arena.is_dirty(f.root));
    f.solve();
    assert!(!f.arena.is_dirty(f.root));

    f.arena
        .set_entity(gears, Some(entity(&f.catalog, names::ASSEMBLER_2)))
        .unwrap();
    assert!(f.arena.is_dirty(f.root));
    // Setters never solve.
    assert_eq!(f.get(gears).entity(), Some(entity(&f.catalog, names::ASSEMBLER_2)));
    assert_eq!(f.get(gears).buildings(), 0.0);
}
