//! Downhill path finding.
//!
//! Before spreading horizontally, the engine looks for the nearest reachable
//! drop-off within a bounded diamond of candidate offsets. The search is
//! deliberately not a general shortest-path: the worst case is the fixed
//! offset count times a small breadth-first frontier, never unbounded grid
//! exploration.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tarn_registry::{ContentRegistry, DISPLACEABLE_MIN, MAX_LIQUID_LEVEL};
use tarn_utils::{BlockPos, Direction, Layer};

use crate::grid::GridReads;

use super::cell::FluidCell;

/// A reachable lower cell discovered by the path finder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownhillCandidate {
    /// The starting offset position (at the origin's height; the drop is
    /// directly below it).
    pub pos: BlockPos,
    /// Horizontal Manhattan distance from the origin.
    pub distance: i32,
}

/// Precomputed (dx, dz) candidate offsets sorted by increasing Manhattan
/// distance. Built once at startup and passed by reference into every
/// invocation.
pub struct SearchOffsets {
    offsets: Vec<(i32, i32)>,
}

impl SearchOffsets {
    /// Builds the offset table for a maximum search radius.
    #[must_use]
    pub fn new(radius: u8) -> Self {
        let r = i32::from(radius);
        let mut offsets = Vec::new();
        for dx in -r..=r {
            for dz in -r..=r {
                let distance = dx.abs() + dz.abs();
                if (1..=r).contains(&distance) {
                    offsets.push((dx, dz));
                }
            }
        }
        // Distance first for the nearest-drop scan order; the rest of the
        // key only pins a stable, deterministic ordering.
        offsets.sort_by_key(|&(dx, dz)| (dx.abs() + dz.abs(), dx, dz));
        Self { offsets }
    }

    /// Builds a table covering the largest search radius any registered
    /// family uses.
    #[must_use]
    pub fn for_registry(registry: &ContentRegistry) -> Self {
        let radius = registry
            .families()
            .map(|family| family.search_radius)
            .max()
            .unwrap_or(0);
        Self::new(radius)
    }

    /// Offsets within the given radius, nearest first.
    pub fn within(&self, radius: u8) -> impl Iterator<Item = (i32, i32)> + '_ {
        let r = i32::from(radius);
        self.offsets
            .iter()
            .copied()
            .take_while(move |&(dx, dz)| dx.abs() + dz.abs() <= r)
    }
}

/// Finds the nearest reachable drop-offs for a cell.
///
/// Returns only minimum-distance candidates. If a drop sits at distance 1
/// and the origin is not a source, that single candidate wins outright.
#[must_use]
pub fn find_downward_paths(
    registry: &ContentRegistry,
    reads: &dyn GridReads,
    offsets: &SearchOffsets,
    origin: BlockPos,
    cell: &FluidCell,
) -> SmallVec<[DownhillCandidate; 4]> {
    let radius = registry.family(cell.family).search_radius;
    let mut found: SmallVec<[DownhillCandidate; 4]> = SmallVec::new();

    for (dx, dz) in offsets.within(radius) {
        let start = origin.offset(dx, 0, dz);
        let below = start.down();

        // The drop must be open on the candidate's own layer and below it,
        // and the fluid below must sit lower than us.
        if registry.replaceable(reads.get_effective_solid(start)) < DISPLACEABLE_MIN {
            continue;
        }
        if registry.replaceable(reads.get_effective_solid(below)) < DISPLACEABLE_MIN {
            continue;
        }
        if registry.liquid_level(reads.get_block(below, Layer::Fluid)) >= cell.level {
            continue;
        }

        if !reaches_origin(registry, reads, origin, start, cell.level) {
            continue;
        }

        let distance = dx.abs() + dz.abs();
        if distance == 1 && cell.level < MAX_LIQUID_LEVEL {
            // Closest drop wins outright for non-source cells.
            found.clear();
            found.push(DownhillCandidate {
                pos: start,
                distance,
            });
            return found;
        }
        found.push(DownhillCandidate {
            pos: start,
            distance,
        });
    }

    if let Some(min) = found.iter().map(|c| c.distance).min() {
        found.retain(|c| c.distance == min);
    }
    found
}

/// Bounded breadth-first search from a candidate offset back toward the
/// origin's column.
///
/// Moves are horizontal only and may never increase the Manhattan distance
/// to the origin, which confines the frontier to the diamond between the
/// two columns. Each step must clear the barrier on the entering face of
/// the most solid block with the pressure remaining after the distance
/// already traveled: `(level - traveled) / 7`.
fn reaches_origin(
    registry: &ContentRegistry,
    reads: &dyn GridReads,
    origin: BlockPos,
    start: BlockPos,
    level: u8,
) -> bool {
    let mut visited: FxHashSet<(i32, i32)> = FxHashSet::default();
    let mut queue: VecDeque<(BlockPos, i32)> = VecDeque::new();
    visited.insert((start.x, start.z));
    queue.push_back((start, 0));

    while let Some((pos, traveled)) = queue.pop_front() {
        if pos.same_column(origin) {
            return true;
        }

        for dir in Direction::HORIZONTALS {
            let npos = pos.relative(dir);
            if npos.horizontal_manhattan(origin) > pos.horizontal_manhattan(origin) {
                continue;
            }
            if !visited.insert((npos.x, npos.z)) {
                continue;
            }

            let pressure = (f32::from(level) - (traveled + 1) as f32) / 7.0;
            let barrier = registry.liquid_barrier_height(
                reads.get_effective_solid(npos),
                dir.opposite(),
                npos,
            );
            if barrier >= pressure {
                continue;
            }
            queue.push_back((npos, traveled + 1));
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluid::cell::fluid_cell_at;
    use crate::grid::{GridAccessor, MemoryGrid};
    use tarn_registry::{BarrierProfile, FamilySpec};

    struct Setup {
        registry: ContentRegistry,
        grid: MemoryGrid,
        offsets: SearchOffsets,
    }

    fn setup() -> Setup {
        let mut builder = ContentRegistry::builder();
        builder.register_solid("granite", 500, BarrierProfile::FULL);
        builder.register_solid("fence", 500, BarrierProfile::uniform(0.4));
        builder.register_fluid(&FamilySpec {
            name: "water".to_owned(),
            tick_delay_ms: 150,
            search_radius: 4,
            replaceable: 9500,
        });
        let registry = builder.freeze();
        let offsets = SearchOffsets::for_registry(&registry);
        Setup {
            registry,
            grid: MemoryGrid::new(),
            offsets,
        }
    }

    fn solid(setup: &Setup, code: &str, pos: BlockPos) {
        let id = setup.registry.get_by_code(code).expect("registered");
        setup.grid.set_block(id, pos, Layer::Solid);
    }

    /// Granite floor at y=-1 for |x|,|z| <= half, around (0,0).
    fn floor(setup: &Setup, half: i32) {
        for x in -half..=half {
            for z in -half..=half {
                solid(setup, "granite", BlockPos::new(x, -1, z));
            }
        }
    }

    fn water_at(setup: &Setup, pos: BlockPos, level: u8) -> FluidCell {
        let id = setup
            .registry
            .get_by_code(&format!("water-still-{level}"))
            .expect("registered");
        setup.grid.set_block(id, pos, Layer::Fluid);
        fluid_cell_at(&setup.registry, &setup.grid, pos).expect("fluid")
    }

    #[test]
    fn test_offsets_sorted_by_distance() {
        let offsets = SearchOffsets::new(3);
        let distances: Vec<i32> = offsets.within(3).map(|(dx, dz)| dx.abs() + dz.abs()).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(distances.first(), Some(&1));
        assert_eq!(distances.last(), Some(&3));
        // Radius filter trims the same table.
        assert!(offsets.within(2).all(|(dx, dz)| dx.abs() + dz.abs() <= 2));
    }

    #[test]
    fn test_adjacent_drop_short_circuits() {
        let setup = setup();
        floor(&setup, 6);
        // Open a hole at distance 1 east and another at distance 2 west.
        setup.grid.set_block(
            tarn_utils::ContentId::EMPTY,
            BlockPos::new(1, -1, 0),
            Layer::Solid,
        );
        setup.grid.set_block(
            tarn_utils::ContentId::EMPTY,
            BlockPos::new(-2, -1, 0),
            Layer::Solid,
        );
        let origin = BlockPos::new(0, 0, 0);
        let cell = water_at(&setup, origin, 4);

        let found = find_downward_paths(&setup.registry, &setup.grid, &setup.offsets, origin, &cell);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pos, BlockPos::new(1, 0, 0));
        assert_eq!(found[0].distance, 1);
    }

    #[test]
    fn test_keeps_only_minimum_distance() {
        let setup = setup();
        floor(&setup, 6);
        // Two holes at distance 2, one at distance 3.
        for pos in [
            BlockPos::new(2, -1, 0),
            BlockPos::new(0, -1, 2),
            BlockPos::new(3, -1, 0),
        ] {
            setup
                .grid
                .set_block(tarn_utils::ContentId::EMPTY, pos, Layer::Solid);
        }
        let origin = BlockPos::new(0, 0, 0);
        let cell = water_at(&setup, origin, 5);

        let found = find_downward_paths(&setup.registry, &setup.grid, &setup.offsets, origin, &cell);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| c.distance == 2));
    }

    #[test]
    fn test_wall_blocks_path() {
        let setup = setup();
        floor(&setup, 6);
        setup.grid.set_block(
            tarn_utils::ContentId::EMPTY,
            BlockPos::new(2, -1, 0),
            Layer::Solid,
        );
        // Wall off the straight path and both flanking detours.
        for z in -1..=1 {
            solid(&setup, "granite", BlockPos::new(1, 0, z));
        }
        let origin = BlockPos::new(0, 0, 0);
        let cell = water_at(&setup, origin, 5);

        let found = find_downward_paths(&setup.registry, &setup.grid, &setup.offsets, origin, &cell);
        assert!(found.is_empty());
    }

    #[test]
    fn test_partial_barrier_gates_on_remaining_pressure() {
        let setup = setup();
        floor(&setup, 6);
        setup.grid.set_block(
            tarn_utils::ContentId::EMPTY,
            BlockPos::new(2, -1, 0),
            Layer::Solid,
        );
        // A 0.4-high fence sits on the path; flanking detours are walled.
        solid(&setup, "fence", BlockPos::new(1, 0, 0));
        for z in [-1, 1] {
            solid(&setup, "granite", BlockPos::new(1, 0, z));
            solid(&setup, "granite", BlockPos::new(2, 0, z));
        }

        let origin = BlockPos::new(0, 0, 0);
        // Level 5: pressure after one step is 4/7 > 0.4, the fence is
        // crossable.
        let cell = water_at(&setup, origin, 5);
        let found = find_downward_paths(&setup.registry, &setup.grid, &setup.offsets, origin, &cell);
        assert_eq!(found.len(), 1);

        // Level 3: pressure after one step is 2/7 < 0.4, blocked.
        let cell = water_at(&setup, origin, 3);
        let found = find_downward_paths(&setup.registry, &setup.grid, &setup.offsets, origin, &cell);
        assert!(found.is_empty());
    }

    #[test]
    fn test_higher_fluid_below_disqualifies_offset() {
        let setup = setup();
        floor(&setup, 6);
        setup.grid.set_block(
            tarn_utils::ContentId::EMPTY,
            BlockPos::new(1, -1, 0),
            Layer::Solid,
        );
        // The hole is already holding water at our level.
        let water4 = setup.registry.get_by_code("water-still-4").expect("id");
        setup
            .grid
            .set_block(water4, BlockPos::new(1, -1, 0), Layer::Fluid);

        let origin = BlockPos::new(0, 0, 0);
        let cell = water_at(&setup, origin, 4);
        let found = find_downward_paths(&setup.registry, &setup.grid, &setup.offsets, origin, &cell);
        assert!(found.is_empty());
    }
}
