//! Chain attack resolution.
//!
//! A chain attack hits its declared target, then bounces from unit to unit
//! across the battle map. Each hit costs the chain one point of damage, no
//! unit is hit twice, and hitting an immune unit ends the chain.
//!
//! Resolution is a pure function of the attack, the multiplier table and
//! the answers of the [`ChainQueries`] collaborator: no randomness, no
//! hidden state.

use crate::elements::ElementMultiplierTable;
use crate::unit::Unit;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use tracing::debug;

/// Default bounce range in hex steps.
pub const DEFAULT_CHAIN_RANGE: u32 = 2;

/// Read-only view of live battle state needed to resolve a chain.
pub trait ChainQueries {
    type Tile: Copy + Eq + Hash + Debug;

    /// Tiles adjacent to `tile`.
    fn neighbors(&self, tile: &Self::Tile) -> Vec<Self::Tile>;

    /// The unit standing on `tile`, if any.
    fn unit_at(&self, tile: &Self::Tile) -> Option<Unit>;
}

/// Adapts a pair of closures into [`ChainQueries`].
pub struct FnQueries<T, N, U> {
    neighbors: N,
    unit_at: U,
    _tile: PhantomData<fn() -> T>,
}

impl<T, N, U> FnQueries<T, N, U>
where
    N: Fn(&T) -> Vec<T>,
    U: Fn(&T) -> Option<Unit>,
{
    pub fn new(neighbors: N, unit_at: U) -> Self {
        Self {
            neighbors,
            unit_at,
            _tile: PhantomData,
        }
    }
}

impl<T, N, U> ChainQueries for FnQueries<T, N, U>
where
    T: Copy + Eq + Hash + Debug,
    N: Fn(&T) -> Vec<T>,
    U: Fn(&T) -> Option<Unit>,
{
    type Tile = T;

    fn neighbors(&self, tile: &T) -> Vec<T> {
        (self.neighbors)(tile)
    }

    fn unit_at(&self, tile: &T) -> Option<Unit> {
        (self.unit_at)(tile)
    }
}

/// Parameters of one chain attack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainAttack<T> {
    /// Tile of the first target.
    pub origin_tile: T,
    /// Id of the unit expected on `origin_tile`.
    pub origin_target: String,
    /// Damage dealt by the first hit; must be positive.
    pub initial_damage: i32,
    /// Attack element, as keyed in the multiplier table.
    pub element: String,
    /// Maximum bounce distance in hex steps.
    pub max_range: u32,
}

impl<T> ChainAttack<T> {
    pub fn new(
        origin_tile: T,
        origin_target: impl Into<String>,
        initial_damage: i32,
        element: impl Into<String>,
    ) -> Self {
        Self {
            origin_tile,
            origin_target: origin_target.into(),
            initial_damage,
            element: element.into(),
            max_range: DEFAULT_CHAIN_RANGE,
        }
    }

    pub fn with_range(mut self, max_range: u32) -> Self {
        self.max_range = max_range;
        self
    }
}

/// One hit of a chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainHit<T> {
    pub target_id: String,
    pub tile_id: T,
    /// Damage pool before the multiplier, never negative.
    pub base_damage: u32,
    pub multiplier: f64,
    /// `floor(base_damage * multiplier)`.
    pub final_damage: u32,
    /// Hex steps from the previous hit (0 for the first).
    pub distance_from_previous: u32,
}

/// Ordered hits of a chain and their summed damage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainResult<T> {
    pub sequence: Vec<ChainHit<T>>,
    pub total_damage: u32,
}

impl<T> ChainResult<T> {
    /// The well-typed "nothing happened" result.
    pub fn empty() -> Self {
        Self {
            sequence: Vec::new(),
            total_damage: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Ids of the units hit, in order.
    pub fn target_ids(&self) -> Vec<&str> {
        self.sequence.iter().map(|h| h.target_id.as_str()).collect()
    }
}

impl<T> Default for ChainResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// A unit the chain could bounce to next.
struct Candidate<T> {
    tile: T,
    unit: Unit,
    distance: u32,
    multiplier: f64,
    predicted: u32,
}

/// Running state of a chain while it is being resolved.
struct ChainRun<'a, T> {
    element: &'a str,
    table: &'a ElementMultiplierTable,
    damage: i32,
    already_hit: HashSet<String>,
    sequence: Vec<ChainHit<T>>,
    ended: bool,
}

impl<T> ChainRun<'_, T> {
    fn base_damage(&self) -> u32 {
        self.damage.max(0) as u32
    }

    fn predict(&self, multiplier: f64) -> u32 {
        (f64::from(self.base_damage()) * multiplier).floor() as u32
    }

    /// Record a hit, spend one point of damage, and decide whether the chain ends.
    fn hit(&mut self, tile: T, unit: &Unit, distance_from_previous: u32) {
        let multiplier = self.table.multiplier(self.element, &unit.element);
        let base_damage = self.base_damage();
        let final_damage = self.predict(multiplier);

        debug!(
            unit = %unit.id,
            base_damage,
            multiplier,
            final_damage,
            distance_from_previous,
            "chain hit"
        );
        self.sequence.push(ChainHit {
            target_id: unit.id.clone(),
            tile_id: tile,
            base_damage,
            multiplier,
            final_damage,
            distance_from_previous,
        });
        self.already_hit.insert(unit.id.clone());
        self.damage -= 1;

        if multiplier == 0.0 || self.damage <= 0 {
            self.ended = true;
        }
    }
}

/// Hop distances from `start`, expanding no further than `max_range`.
///
/// Returned in breadth-first discovery order.
fn distances_from<Q: ChainQueries>(
    queries: &Q,
    start: Q::Tile,
    max_range: u32,
) -> Vec<(Q::Tile, u32)> {
    let mut seen: HashMap<Q::Tile, u32> = HashMap::from([(start, 0)]);
    let mut order = vec![(start, 0)];
    let mut frontier = VecDeque::from([start]);

    while let Some(current) = frontier.pop_front() {
        let d = seen[&current];
        if d >= max_range {
            continue;
        }
        for next in queries.neighbors(&current) {
            if !seen.contains_key(&next) {
                seen.insert(next, d + 1);
                order.push((next, d + 1));
                frontier.push_back(next);
            }
        }
    }

    order
}

/// Pick the next target.
///
/// Nearest first; among the nearest, an immune unit wins outright; otherwise
/// the highest predicted damage; any remaining tie goes to the smallest id.
fn select_target<T>(candidates: Vec<Candidate<T>>) -> Option<Candidate<T>> {
    let nearest = candidates.iter().map(|c| c.distance).min()?;
    let nearest: Vec<Candidate<T>> = candidates
        .into_iter()
        .filter(|c| c.distance == nearest)
        .collect();

    let any_immune = nearest.iter().any(|c| c.multiplier == 0.0);
    nearest
        .into_iter()
        .filter(|c| !any_immune || c.multiplier == 0.0)
        .min_by(|a, b| {
            b.predicted
                .cmp(&a.predicted)
                .then_with(|| a.unit.id.cmp(&b.unit.id))
        })
}

/// Resolve a chain attack.
///
/// Returns an empty result when the initial damage isn't positive or the
/// declared target isn't standing on the origin tile.
pub fn resolve_chain<Q: ChainQueries>(
    attack: &ChainAttack<Q::Tile>,
    table: &ElementMultiplierTable,
    queries: &Q,
) -> ChainResult<Q::Tile> {
    if attack.initial_damage <= 0 {
        return ChainResult::empty();
    }

    let origin_unit = match queries.unit_at(&attack.origin_tile) {
        Some(unit) if unit.id == attack.origin_target => unit,
        _ => {
            debug!(
                tile = ?attack.origin_tile,
                expected = %attack.origin_target,
                "chain origin target missing, nothing resolved"
            );
            return ChainResult::empty();
        }
    };

    let mut run = ChainRun {
        element: &attack.element,
        table,
        damage: attack.initial_damage,
        already_hit: HashSet::new(),
        sequence: Vec::new(),
        ended: false,
    };

    let mut current = attack.origin_tile;
    run.hit(current, &origin_unit, 0);

    while !run.ended {
        let candidates: Vec<Candidate<Q::Tile>> = distances_from(queries, current, attack.max_range)
            .into_iter()
            .filter(|(_, d)| *d > 0)
            .filter_map(|(tile, distance)| {
                let unit = queries.unit_at(&tile)?;
                if run.already_hit.contains(&unit.id) {
                    return None;
                }
                let multiplier = table.multiplier(&attack.element, &unit.element);
                Some(Candidate {
                    tile,
                    predicted: run.predict(multiplier),
                    unit,
                    distance,
                    multiplier,
                })
            })
            .collect();

        let Some(next) = select_target(candidates) else {
            break;
        };
        run.hit(next.tile, &next.unit, next.distance);
        current = next.tile;
    }

    let total_damage = run
        .sequence
        .iter()
        .fold(0u32, |total, h| total.saturating_add(h.final_damage));
    ChainResult {
        sequence: run.sequence,
        total_damage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Units on a straight line of tiles `0..len`; neighbors are `i - 1` and `i + 1`.
    fn line(len: i32, units: &[(i32, &str, &str)]) -> impl ChainQueries<Tile = i32> {
        let units: HashMap<i32, Unit> = units
            .iter()
            .map(|(tile, id, element)| (*tile, Unit::new(*id, *element)))
            .collect();
        FnQueries::new(
            move |t: &i32| {
                [*t - 1, *t + 1]
                    .into_iter()
                    .filter(|n| (0..len).contains(n))
                    .collect::<Vec<_>>()
            },
            move |t: &i32| units.get(t).cloned(),
        )
    }

    fn fire_table() -> ElementMultiplierTable {
        ElementMultiplierTable::new()
            .with("Fire", "Water", 0.5)
            .and_then(|t| t.with("Fire", "Fire", 1.0))
            .and_then(|t| t.with("Fire", "Plant", 2.0))
            .and_then(|t| t.with("Fire", "Earth", 0.0))
            .unwrap()
    }

    #[test]
    fn test_simple_chain() {
        let queries = line(5, &[(0, "U1", "Fire"), (1, "U2", "Water")]);
        let attack = ChainAttack::new(0, "U1", 5, "Fire");
        let result = resolve_chain(&attack, &fire_table(), &queries);

        assert_eq!(result.target_ids(), vec!["U1", "U2"]);
        assert_eq!(result.sequence[0].base_damage, 5);
        assert_eq!(result.sequence[0].final_damage, 5);
        assert_eq!(result.sequence[0].distance_from_previous, 0);
        assert_eq!(result.sequence[1].base_damage, 4);
        assert_eq!(result.sequence[1].multiplier, 0.5);
        assert_eq!(result.sequence[1].final_damage, 2);
        assert_eq!(result.sequence[1].distance_from_previous, 1);
        assert_eq!(result.total_damage, 7);
    }

    #[test]
    fn test_non_positive_damage_is_empty() {
        let queries = line(3, &[(0, "U1", "Fire"), (1, "U2", "Water")]);
        for damage in [0, -3] {
            let attack = ChainAttack::new(0, "U1", damage, "Fire");
            let result = resolve_chain(&attack, &fire_table(), &queries);
            assert!(result.is_empty());
            assert_eq!(result.total_damage, 0);
        }
    }

    #[test]
    fn test_origin_mismatch_is_empty() {
        let queries = line(3, &[(0, "U1", "Fire"), (1, "U2", "Water")]);
        let wrong_target = ChainAttack::new(0, "U2", 5, "Fire");
        assert!(resolve_chain(&wrong_target, &fire_table(), &queries).is_empty());

        let empty_tile = ChainAttack::new(2, "U1", 5, "Fire");
        assert!(resolve_chain(&empty_tile, &fire_table(), &queries).is_empty());
    }

    #[test]
    fn test_immune_origin_ends_chain() {
        let queries = line(3, &[(0, "rock", "Earth"), (1, "U2", "Water")]);
        let attack = ChainAttack::new(0, "rock", 5, "Fire");
        let result = resolve_chain(&attack, &fire_table(), &queries);
        assert_eq!(result.target_ids(), vec!["rock"]);
        assert_eq!(result.total_damage, 0);
    }

    #[test]
    fn test_damage_pool_runs_out() {
        let queries = line(
            6,
            &[(0, "a", "Fire"), (1, "b", "Fire"), (2, "c", "Fire"), (3, "d", "Fire")],
        );
        let attack = ChainAttack::new(0, "a", 2, "Fire");
        let result = resolve_chain(&attack, &fire_table(), &queries);
        assert_eq!(result.target_ids(), vec!["a", "b"]);
        assert_eq!(result.total_damage, 3);
    }

    #[test]
    fn test_nearest_beats_higher_damage() {
        // Plant takes double damage but sits two steps away
        let queries = line(5, &[(2, "o", "Fire"), (3, "w", "Water"), (0, "p", "Plant")]);
        let attack = ChainAttack::new(2, "o", 6, "Fire");
        let result = resolve_chain(&attack, &fire_table(), &queries);
        assert_eq!(result.target_ids()[1], "w");
    }

    #[test]
    fn test_highest_damage_among_nearest() {
        let queries = line(5, &[(2, "o", "Fire"), (1, "w", "Water"), (3, "p", "Plant")]);
        let attack = ChainAttack::new(2, "o", 6, "Fire").with_range(1);
        let result = resolve_chain(&attack, &fire_table(), &queries);
        assert_eq!(result.target_ids(), vec!["o", "p"]);
        assert_eq!(result.sequence[1].final_damage, 10);
    }

    #[test]
    fn test_id_breaks_ties() {
        let queries = line(5, &[(2, "o", "Fire"), (1, "zed", "Water"), (3, "amy", "Water")]);
        let attack = ChainAttack::new(2, "o", 6, "Fire").with_range(1);
        let result = resolve_chain(&attack, &fire_table(), &queries);
        assert_eq!(result.target_ids()[1], "amy");
    }

    #[test]
    fn test_range_limits_bounces() {
        let queries = line(8, &[(0, "a", "Fire"), (3, "b", "Fire")]);
        let attack = ChainAttack::new(0, "a", 9, "Fire");
        let result = resolve_chain(&attack, &fire_table(), &queries);
        assert_eq!(result.target_ids(), vec!["a"]);

        let result = resolve_chain(&attack.with_range(3), &fire_table(), &queries);
        assert_eq!(result.target_ids(), vec!["a", "b"]);
        assert_eq!(result.sequence[1].distance_from_previous, 3);
    }

    #[test]
    fn test_never_hits_same_unit_twice() {
        let queries = line(3, &[(0, "a", "Fire"), (1, "b", "Fire")]);
        let attack = ChainAttack::new(0, "a", 10, "Fire");
        let result = resolve_chain(&attack, &fire_table(), &queries);
        assert_eq!(result.target_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_extreme_damage_saturates() {
        let queries = line(3, &[(0, "a", "Plant"), (1, "b", "Plant")]);
        let attack = ChainAttack::new(0, "a", i32::MAX, "Fire");
        let result = resolve_chain(&attack, &fire_table(), &queries);
        assert_eq!(result.target_ids(), vec!["a", "b"]);
        assert_eq!(result.total_damage, u32::MAX);
    }

    #[test]
    fn test_hit_serializes_tile_id() {
        let queries = line(2, &[(1, "a", "Fire")]);
        let attack = ChainAttack::new(1, "a", 3, "Fire");
        let result = resolve_chain(&attack, &fire_table(), &queries);
        let json = serde_json::to_value(&result.sequence[0]).unwrap();
        assert_eq!(json["tileId"], 1);
        assert_eq!(json["targetId"], "a");
        assert_eq!(json["finalDamage"], 3);
    }

    #[test]
    fn test_select_target_prefers_immune() {
        let candidate = |id: &str, distance, multiplier: f64, predicted| Candidate {
            tile: 0,
            unit: Unit::new(id, "x"),
            distance,
            multiplier,
            predicted,
        };
        let picked = select_target(vec![
            candidate("strong", 1, 2.0, 8),
            candidate("zz-immune", 1, 0.0, 0),
            candidate("a-immune", 1, 0.0, 0),
            candidate("far-immune", 2, 0.0, 0),
        ])
        .unwrap();
        assert_eq!(picked.unit.id, "a-immune");
        assert!(select_target::<i32>(Vec::new()).is_none());
    }
}
