//! Flow direction resolution.
//!
//! Given a liquid cell and a target level, decides which flow-shape variant
//! the written content should carry by weighing the 8 horizontal neighbors,
//! then composes the concrete content id through the registry.

use tarn_registry::{ContentRegistry, DISPLACEABLE_MIN, FlowVariant};
use tarn_utils::pos::HORIZONTAL_OFFSETS;
use tarn_utils::{BlockPos, ContentId, Direction, Layer};

use crate::grid::GridReads;

use super::cell::FluidCell;

/// Resolves the content id for writing `cell`'s family at `pos` with
/// `target_level`.
///
/// A target level below 1 resolves to [`ContentId::EMPTY`] (remove the
/// cell). `None` means the registry has no content for the composed code;
/// the caller leaves the previous content unchanged.
///
/// The resolution is a pure function of the neighbor snapshot: re-invoking
/// it with unchanged state yields the same id.
#[must_use]
pub fn resolve(
    registry: &ContentRegistry,
    reads: &dyn GridReads,
    pos: BlockPos,
    cell: &FluidCell,
    target_level: u8,
) -> Option<ContentId> {
    if target_level < 1 {
        return Some(ContentId::EMPTY);
    }

    let mut vx = 0i32;
    let mut vz = 0i32;
    let mut tilted_floor = false;

    let below = pos.down();
    let floor_here =
        registry.liquid_barrier_height(reads.get_effective_solid(below), Direction::Up, below);

    for (dx, dz) in HORIZONTAL_OFFSETS {
        let npos = pos.offset(dx, 0, dz);
        let nid = reads.get_block(npos, Layer::Fluid);
        let Some(ntag) = registry.fluid_tag(nid) else {
            continue;
        };
        if ntag.family != cell.family || ntag.level == target_level {
            continue;
        }
        if registry.replaceable(nid) < DISPLACEABLE_MIN {
            continue;
        }

        if ntag.level < target_level {
            // Flow moves toward the lower neighbor.
            vx += dx;
            vz += dz;
        } else {
            // Flow recedes from a higher neighbor.
            vx -= dx;
            vz -= dz;
        }

        // Diagonals contribute direction but never floor asymmetry.
        if dx == 0 || dz == 0 {
            let nbelow = npos.down();
            let floor_there = registry.liquid_barrier_height(
                reads.get_effective_solid(nbelow),
                Direction::Up,
                nbelow,
            );
            tilted_floor |= (floor_there - floor_here).abs() > f32::EPSILON;
        }
    }

    // Dominant axis wins; x was accumulated first and takes ties.
    if vx.abs() >= vz.abs() {
        vz = 0;
    } else {
        vx = 0;
    }

    let token = match Direction::from_flow_vector(vx.signum(), vz.signum()) {
        Some(dir) => FlowVariant::Side(dir).token(),
        None => {
            if tilted_floor || touches_down_flow(registry, reads, pos, cell) {
                FlowVariant::Down.token()
            } else {
                FlowVariant::Still.token()
            }
        }
    };

    let id = registry.code_with_parts(cell.id, token, target_level);
    if id.is_none() {
        log::warn!("no content registered for {} as `{token}` level {target_level}", cell.id);
    }
    id
}

/// True if the cell directly above or below is the same family and already
/// flagged as part of a falling column.
fn touches_down_flow(
    registry: &ContentRegistry,
    reads: &dyn GridReads,
    pos: BlockPos,
    cell: &FluidCell,
) -> bool {
    [pos.up(), pos.down()].into_iter().any(|p| {
        registry
            .fluid_tag(reads.get_block(p, Layer::Fluid))
            .is_some_and(|tag| tag.family == cell.family && tag.variant == FlowVariant::Down)
    })
}
