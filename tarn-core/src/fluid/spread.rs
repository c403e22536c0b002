//! Per-position tick orchestration.
//!
//! Every invocation re-derives its state from the grid, runs the settle
//! state machine, commits one batch of staged writes, and re-arms the
//! delayed callback for every touched position and its fluid neighbors.
//! Nothing here surfaces an error: the worst outcome of any step is "this
//! tick did nothing", which the rescheduling invariant makes self-correcting.

use tarn_registry::{DISPLACEABLE_MIN, FamilyId, MAX_LIQUID_LEVEL};
use tarn_utils::pos::DIAGONAL_OFFSETS;
use tarn_utils::{BlockPos, Direction, Layer};

use crate::grid::{GridReads, StagedWrites};

use super::cell::{FluidCell, fluid_cell_at};
use super::context::SimContext;
use super::{collision, downhill, flow_direction};

/// The spread engine. Stateless; all inputs arrive through [`SimContext`].
pub struct SpreadEngine;

impl SpreadEngine {
    /// Runs one settle step for the position.
    ///
    /// Step order is load-bearing: contact resolution, shrink check,
    /// straight-down flow, funnel toward a found drop (which forgoes
    /// horizontal spread for the tick), horizontal spread, source promotion.
    pub fn tick(&self, ctx: &SimContext<'_>, pos: BlockPos) {
        let mut staged = StagedWrites::new(ctx.grid);
        let Some(cell) = fluid_cell_at(ctx.registry, &staged, pos) else {
            return;
        };

        // Contact with the family this cell collides with consumes the cell
        // before any diffusion happens.
        if collision::try_contact(ctx, &mut staged, pos) {
            self.commit(ctx, staged, cell.family);
            return;
        }

        // Shrink check: without a higher same-family neighbor the cell is
        // unsupported and loses one level. Sources never self-decay.
        if !cell.is_source() && self.max_neighbour_level(ctx, &staged, pos, &cell) <= cell.level {
            self.write_level(ctx, &mut staged, pos, &cell, cell.level - 1);
            for dir in Direction::ALL {
                ctx.schedule_family(pos.relative(dir), cell.family);
            }
            self.commit(ctx, staged, cell.family);
            return;
        }

        // Straight down, when nothing blocks the shared face.
        let below = pos.down();
        let our_solid = staged.get_effective_solid(pos);
        let below_solid = staged.get_effective_solid(below);
        if ctx
            .registry
            .liquid_barrier_height(below_solid, Direction::Up, below)
            == 0.0
            && ctx
                .registry
                .liquid_barrier_height(our_solid, Direction::Down, pos)
                == 0.0
        {
            // Falling columns keep their level; drop-off applies only to
            // horizontal movement.
            self.try_flow_into(ctx, &mut staged, below, &cell, cell.level, None);
            if cell.level <= 1 {
                self.commit(ctx, staged, cell.family);
                return;
            }
        }

        // Funnel toward the nearest reachable drop; this forgoes plain
        // horizontal spread for the tick.
        let candidates =
            downhill::find_downward_paths(ctx.registry, &staged, ctx.offsets, pos, &cell);
        if !candidates.is_empty() {
            for candidate in &candidates {
                self.try_flow_into(
                    ctx,
                    &mut staged,
                    candidate.pos,
                    &cell,
                    cell.level - 1,
                    None,
                );
            }
            self.commit(ctx, staged, cell.family);
            return;
        }

        // Horizontal spread into the four cardinals.
        for dir in Direction::HORIZONTALS {
            self.try_flow_into(
                ctx,
                &mut staged,
                pos.relative(dir),
                &cell,
                cell.level.saturating_sub(1),
                Some(dir),
            );
        }

        // Source promotion: enough surrounding sources regenerate one here.
        if !cell.is_source() {
            let cardinals = Direction::HORIZONTALS
                .iter()
                .filter(|&&dir| self.is_source_of(ctx, &staged, pos.relative(dir), cell.family))
                .count();
            let diagonals = DIAGONAL_OFFSETS
                .iter()
                .filter(|&&(dx, dz)| {
                    self.is_source_of(ctx, &staged, pos.offset(dx, 0, dz), cell.family)
                })
                .count();
            if cardinals >= 3 || (cardinals == 2 && diagonals >= 3) {
                self.write_level(ctx, &mut staged, pos, &cell, MAX_LIQUID_LEVEL);
                for dir in Direction::HORIZONTALS {
                    ctx.schedule_family(pos.relative(dir), cell.family);
                }
            }
        }

        self.commit(ctx, staged, cell.family);
    }

    /// Inbound neighbor-change signal: re-arm this position through the same
    /// coalescing path as a natural tick.
    pub fn on_neighbour_changed(
        &self,
        ctx: &SimContext<'_>,
        pos: BlockPos,
        _changed: BlockPos,
    ) {
        if let Some(cell) = fluid_cell_at(ctx.registry, &StagedWrites::new(ctx.grid), pos) {
            ctx.schedule_family(pos, cell.family);
        }
    }

    /// The highest same-family neighbor level feeding this cell.
    ///
    /// The cell above merges fully (counts as the maximum) when no barrier
    /// blocks the shared face; horizontal neighbors count only when their
    /// level clears the tallest barrier between the two columns.
    fn max_neighbour_level(
        &self,
        ctx: &SimContext<'_>,
        staged: &StagedWrites<'_>,
        pos: BlockPos,
        cell: &FluidCell,
    ) -> u8 {
        let registry = ctx.registry;
        let our_solid = staged.get_effective_solid(pos);

        let up = pos.up();
        let up_solid = staged.get_effective_solid(up);
        if registry.liquid_barrier_height(our_solid, Direction::Up, pos) == 0.0
            && registry.liquid_barrier_height(up_solid, Direction::Down, up) == 0.0
            && registry.liquid_code(staged.get_block(up, Layer::Fluid)) == Some(cell.family)
        {
            return MAX_LIQUID_LEVEL;
        }

        let mut max = 0;
        for dir in Direction::HORIZONTALS {
            let npos = pos.relative(dir);
            let Some(ntag) = registry.fluid_tag(staged.get_block(npos, Layer::Fluid)) else {
                continue;
            };
            if ntag.family != cell.family {
                continue;
            }
            let exit = registry.liquid_barrier_height(
                staged.get_effective_solid(npos),
                dir.opposite(),
                npos,
            );
            let enter = registry.liquid_barrier_height(our_solid, dir, pos);
            if f32::from(ntag.level) / 7.0 > exit.max(enter) {
                max = max.max(ntag.level);
            }
        }
        max
    }

    /// Stages `cell`'s family at `pos` with the given level (clamped to 7;
    /// below 1 removes the cell) through the flow direction resolver.
    fn write_level(
        &self,
        ctx: &SimContext<'_>,
        staged: &mut StagedWrites<'_>,
        pos: BlockPos,
        cell: &FluidCell,
        target_level: u8,
    ) {
        let target_level = target_level.min(MAX_LIQUID_LEVEL);
        if let Some(id) = flow_direction::resolve(ctx.registry, staged, pos, cell, target_level) {
            staged.set_block(id, pos, Layer::Fluid);
            ctx.schedule_family(pos, cell.family);
        }
    }

    /// Attempts to flow `cell`'s family into `target` at `new_level`.
    ///
    /// Cross-family contact goes to the collision resolver first; failing
    /// that, the replaceable score arbitrates whether the flow may overwrite
    /// what is there. `via` carries the movement direction for horizontal
    /// flows so face barriers can gate the move.
    fn try_flow_into(
        &self,
        ctx: &SimContext<'_>,
        staged: &mut StagedWrites<'_>,
        target: BlockPos,
        cell: &FluidCell,
        new_level: u8,
        via: Option<Direction>,
    ) -> bool {
        if new_level < 1 {
            return false;
        }
        let new_level = new_level.min(MAX_LIQUID_LEVEL);
        let registry = ctx.registry;

        let existing = staged.get_block(target, Layer::Fluid);
        if let Some(etag) = registry.fluid_tag(existing) {
            if etag.family == cell.family {
                // Never overwrite an equal or higher cell of the same fluid.
                if etag.level >= new_level {
                    return false;
                }
            } else {
                if collision::try_replace(ctx, staged, cell.family, target) {
                    return true;
                }
                // No configured reaction: only strictly softer content may
                // be displaced.
                if registry.replaceable(existing) <= registry.replaceable(cell.id) {
                    return false;
                }
            }
        }

        if registry.replaceable(staged.get_effective_solid(target)) < DISPLACEABLE_MIN {
            return false;
        }

        if let Some(dir) = via {
            let from = target.relative(dir.opposite());
            let exit =
                registry.liquid_barrier_height(staged.get_effective_solid(from), dir, from);
            let enter = registry.liquid_barrier_height(
                staged.get_effective_solid(target),
                dir.opposite(),
                target,
            );
            if exit.max(enter) >= f32::from(cell.level) / 7.0 {
                return false;
            }
        }

        let Some(id) = flow_direction::resolve(ctx.registry, staged, target, cell, new_level)
        else {
            return false;
        };
        staged.set_block(id, target, Layer::Fluid);
        ctx.schedule_family(target, cell.family);
        true
    }

    fn is_source_of(
        &self,
        ctx: &SimContext<'_>,
        staged: &StagedWrites<'_>,
        pos: BlockPos,
        family: FamilyId,
    ) -> bool {
        ctx.registry
            .fluid_tag(staged.get_block(pos, Layer::Fluid))
            .is_some_and(|tag| tag.family == family && tag.is_source())
    }

    /// Commits the invocation's staged writes and re-arms every written
    /// position plus its fluid-bearing neighbors. Required invariant, not an
    /// optimization: without it the automaton can silently stop converging.
    fn commit(&self, ctx: &SimContext<'_>, staged: StagedWrites<'_>, family: FamilyId) {
        let delay = ctx.registry.family(family).tick_delay_ms;
        let written = staged.commit();
        for (pos, _layer) in written {
            ctx.schedule(pos, delay);
            for dir in Direction::ALL {
                let npos = pos.relative(dir);
                if ctx
                    .registry
                    .fluid_tag(ctx.grid.get_block(npos, Layer::Fluid))
                    .is_some()
                {
                    ctx.schedule(npos, delay);
                }
            }
        }
    }
}
