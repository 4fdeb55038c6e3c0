//! Chain attack scenarios, run both against bare closures and against a
//! real battle map with walls and unit placement.

use elementails_core::{
    battlefield::Battlefield,
    chain::{resolve_chain, ChainAttack, ChainQueries, FnQueries},
    context::{BattleMapContext, MapSource},
    elements::ElementMultiplierTable,
    grid::Grid,
    hex::{AxialCoord, HexLayout, PixelPoint},
    terrain::TerrainType,
    unit::{Unit, UnitPlacement},
};
use std::collections::HashMap;

// =============================================================================
// Test Helpers
// =============================================================================

/// Units on hex tiles with full six-way adjacency and no obstacles.
fn open_field(units: &[(AxialCoord, &str, &str)]) -> impl ChainQueries<Tile = AxialCoord> {
    let units: HashMap<AxialCoord, Unit> = units
        .iter()
        .map(|(tile, id, element)| (*tile, Unit::new(*id, *element)))
        .collect();
    FnQueries::new(
        |t: &AxialCoord| t.neighbors().to_vec(),
        move |t: &AxialCoord| units.get(t).cloned(),
    )
}

fn fire_table() -> ElementMultiplierTable {
    ElementMultiplierTable::from_json(
        r#"{ "Fire": { "Water": 0.5, "Fire": 1, "Plant": 2, "Stone": 0 } }"#,
    )
    .unwrap()
}

fn map(rows: usize, cols: usize) -> BattleMapContext {
    let layout = HexLayout::new(20.0, PixelPoint::new(20.0, 20.0)).unwrap();
    BattleMapContext::from_grid(
        layout,
        Grid::filled(rows, cols, &layout, TerrainType::Ground),
        MapSource::Authored,
    )
}

// =============================================================================
// 1. Core Scenarios
// =============================================================================

mod core_scenarios {
    use super::*;

    #[test]
    fn test_simple_chain() {
        let queries = open_field(&[
            (AxialCoord::new(0, 0), "U1", "Fire"),
            (AxialCoord::new(1, 0), "U2", "Water"),
        ]);
        let attack = ChainAttack::new(AxialCoord::new(0, 0), "U1", 5, "Fire");
        let result = resolve_chain(&attack, &fire_table(), &queries);

        assert_eq!(result.len(), 2);
        let first = &result.sequence[0];
        assert_eq!(
            (
                first.target_id.as_str(),
                first.base_damage,
                first.multiplier,
                first.final_damage
            ),
            ("U1", 5, 1.0, 5)
        );
        let second = &result.sequence[1];
        assert_eq!(
            (
                second.target_id.as_str(),
                second.base_damage,
                second.multiplier,
                second.final_damage
            ),
            ("U2", 4, 0.5, 2)
        );
        assert_eq!(second.distance_from_previous, 1);
        assert_eq!(result.total_damage, 7);
    }

    #[test]
    fn test_immunity_short_circuit() {
        let queries = open_field(&[
            (AxialCoord::new(0, 0), "U1", "Fire"),
            (AxialCoord::new(1, 0), "leafy", "Plant"),
            (AxialCoord::new(0, 1), "rocky", "Stone"),
            (AxialCoord::new(2, 0), "far", "Plant"),
        ]);
        let attack = ChainAttack::new(AxialCoord::new(0, 0), "U1", 6, "Fire");
        let result = resolve_chain(&attack, &fire_table(), &queries);

        assert_eq!(result.target_ids(), vec!["U1", "rocky"]);
        assert_eq!(result.sequence[1].final_damage, 0);
        assert_eq!(result.total_damage, 6);
    }

    #[test]
    fn test_non_positive_damage_is_empty() {
        let queries = open_field(&[(AxialCoord::new(0, 0), "U1", "Fire")]);
        for damage in [0, -3] {
            let attack = ChainAttack::new(AxialCoord::new(0, 0), "U1", damage, "Fire");
            let result = resolve_chain(&attack, &fire_table(), &queries);
            assert!(result.is_empty());
            assert_eq!(result.total_damage, 0);
        }
    }

    #[test]
    fn test_wrong_origin_target_is_empty() {
        let queries = open_field(&[(AxialCoord::new(0, 0), "U1", "Fire")]);
        let attack = ChainAttack::new(AxialCoord::new(0, 0), "someone-else", 5, "Fire");
        assert!(resolve_chain(&attack, &fire_table(), &queries).is_empty());

        let attack = ChainAttack::new(AxialCoord::new(4, 4), "U1", 5, "Fire");
        assert!(resolve_chain(&attack, &fire_table(), &queries).is_empty());
    }

    #[test]
    fn test_damage_runs_out() {
        let units: Vec<(AxialCoord, String, &str)> = (0..10)
            .map(|q| (AxialCoord::new(q, 0), format!("u{q}"), "Fire"))
            .collect();
        let borrowed: Vec<(AxialCoord, &str, &str)> =
            units.iter().map(|(t, id, e)| (*t, id.as_str(), *e)).collect();
        let queries = open_field(&borrowed);

        let attack = ChainAttack::new(AxialCoord::new(0, 0), "u0", 3, "Fire");
        let result = resolve_chain(&attack, &fire_table(), &queries);

        assert_eq!(result.target_ids(), vec!["u0", "u1", "u2"]);
        assert_eq!(result.total_damage, 3 + 2 + 1);
    }

    #[test]
    fn test_no_unit_hit_twice() {
        let queries = open_field(&[
            (AxialCoord::new(0, 0), "a", "Fire"),
            (AxialCoord::new(1, 0), "b", "Fire"),
        ]);
        let attack = ChainAttack::new(AxialCoord::new(0, 0), "a", 9, "Fire");
        let result = resolve_chain(&attack, &fire_table(), &queries);
        assert_eq!(result.target_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_nearest_beats_stronger() {
        let queries = open_field(&[
            (AxialCoord::new(0, 0), "U1", "Fire"),
            (AxialCoord::new(1, 0), "near", "Water"),
            (AxialCoord::new(-2, 0), "far", "Plant"),
        ]);
        let attack = ChainAttack::new(AxialCoord::new(0, 0), "U1", 5, "Fire");
        let result = resolve_chain(&attack, &fire_table(), &queries);

        assert_eq!(result.sequence[1].target_id, "near");
        // From "near", "far" is three steps away: out of the default range
        assert_eq!(result.target_ids(), vec!["U1", "near"]);
    }

    #[test]
    fn test_range_extends_reach() {
        let queries = open_field(&[
            (AxialCoord::new(0, 0), "U1", "Fire"),
            (AxialCoord::new(3, 0), "far", "Plant"),
        ]);
        let attack = ChainAttack::new(AxialCoord::new(0, 0), "U1", 5, "Fire");
        assert_eq!(resolve_chain(&attack, &fire_table(), &queries).len(), 1);

        let result = resolve_chain(&attack.clone().with_range(3), &fire_table(), &queries);
        assert_eq!(result.target_ids(), vec!["U1", "far"]);
        assert_eq!(result.sequence[1].distance_from_previous, 3);
        assert_eq!(result.sequence[1].final_damage, 8);
    }

    #[test]
    fn test_ties_break_by_damage_then_id() {
        let queries = open_field(&[
            (AxialCoord::new(0, 0), "U1", "Fire"),
            (AxialCoord::new(1, 0), "b-water", "Water"),
            (AxialCoord::new(0, 1), "z-plant", "Plant"),
            (AxialCoord::new(-1, 0), "a-plant", "Plant"),
        ]);
        let attack = ChainAttack::new(AxialCoord::new(0, 0), "U1", 5, "Fire").with_range(1);
        let result = resolve_chain(&attack, &fire_table(), &queries);

        assert_eq!(result.sequence[1].target_id, "a-plant");
    }

    #[test]
    fn test_long_chain_decays_one_per_hit() {
        let elements = ["Fire", "Water", "Plant"];
        let units: Vec<(AxialCoord, String, &str)> = (0..14)
            .map(|q| (AxialCoord::new(q, 0), format!("u{q:02}"), elements[q as usize % 3]))
            .collect();
        let borrowed: Vec<(AxialCoord, &str, &str)> =
            units.iter().map(|(t, id, e)| (*t, id.as_str(), *e)).collect();
        let queries = open_field(&borrowed);

        for damage in [1, 4, 10, 20] {
            let attack = ChainAttack::new(AxialCoord::new(0, 0), "u00", damage, "Fire");
            let result = resolve_chain(&attack, &fire_table(), &queries);

            assert!(result.len() <= units.len());
            assert_eq!(result.len(), (damage as usize).min(units.len()));
            assert_eq!(result.sequence[0].base_damage, damage as u32);
            for pair in result.sequence.windows(2) {
                assert_eq!(pair[1].base_damage, pair[0].base_damage - 1);
            }

            let mut ids = result.target_ids();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), result.len());
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let queries = open_field(&[
            (AxialCoord::new(0, 0), "U1", "Fire"),
            (AxialCoord::new(1, 0), "x", "Water"),
            (AxialCoord::new(0, 1), "y", "Water"),
            (AxialCoord::new(1, 1), "z", "Plant"),
        ]);
        let attack = ChainAttack::new(AxialCoord::new(0, 0), "U1", 7, "Fire");
        let first = resolve_chain(&attack, &fire_table(), &queries);
        for _ in 0..10 {
            assert_eq!(resolve_chain(&attack, &fire_table(), &queries), first);
        }
    }
}

// =============================================================================
// 2. Battlefield Scenarios
// =============================================================================

mod battlefield_scenarios {
    use super::*;

    #[test]
    fn test_chain_routes_around_walls() {
        let mut map = map(5, 5);
        // Wall between the two units on row 2; the chain must step around it
        map.paint(&AxialCoord::new(2, 2), TerrainType::Wall);

        let mut units = UnitPlacement::new();
        units.place(AxialCoord::new(1, 2), Unit::new("U1", "Fire"));
        units.place(AxialCoord::new(3, 2), Unit::new("U2", "Plant"));

        let attack = ChainAttack::new(AxialCoord::new(1, 2), "U1", 5, "Fire");
        let result = Battlefield::new(&map, &units).resolve_chain(&attack, &fire_table());
        assert_eq!(result.target_ids(), vec!["U1"]);

        let farther = attack.clone().with_range(3);
        let result = Battlefield::new(&map, &units).resolve_chain(&farther, &fire_table());
        assert_eq!(result.target_ids(), vec!["U1", "U2"]);
        assert_eq!(result.sequence[1].distance_from_previous, 3);
    }

    #[test]
    fn test_void_isolates_units() {
        let mut map = map(1, 3);
        map.paint(&AxialCoord::new(1, 0), TerrainType::Void);

        let mut units = UnitPlacement::new();
        units.place(AxialCoord::new(0, 0), Unit::new("U1", "Fire"));
        units.place(AxialCoord::new(2, 0), Unit::new("U2", "Water"));

        let attack = ChainAttack::new(AxialCoord::new(0, 0), "U1", 5, "Fire").with_range(10);
        let result = Battlefield::new(&map, &units).resolve_chain(&attack, &fire_table());
        assert_eq!(result.target_ids(), vec!["U1"]);
    }

    #[test]
    fn test_units_move_between_attacks() {
        let map = map(4, 4);
        let mut units = UnitPlacement::new();
        units.place(AxialCoord::new(0, 0), Unit::new("U1", "Fire"));
        units.place(AxialCoord::new(3, 3), Unit::new("U2", "Water"));

        let attack = ChainAttack::new(AxialCoord::new(0, 0), "U1", 5, "Fire");
        assert_eq!(Battlefield::new(&map, &units).resolve_chain(&attack, &fire_table()).len(), 1);

        assert!(units.move_unit(&AxialCoord::new(3, 3), AxialCoord::new(1, 1)));
        let result = Battlefield::new(&map, &units).resolve_chain(&attack, &fire_table());
        assert_eq!(result.target_ids(), vec!["U1", "U2"]);
        assert_eq!(result.total_damage, 5 + 2);
    }
}
