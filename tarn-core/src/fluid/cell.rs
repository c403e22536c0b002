//! Derived view of a liquid-bearing grid cell.
//!
//! A `FluidCell` is never stored; it is re-derived from the grid's fluid
//! layer through the registry on every read, so the grid stays the single
//! source of truth.

use tarn_registry::{ContentRegistry, FamilyId, FlowVariant, MAX_LIQUID_LEVEL};
use tarn_utils::{BlockPos, ContentId, Layer};

use crate::grid::GridReads;

/// Snapshot of one liquid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FluidCell {
    /// The content occupying the fluid layer.
    pub id: ContentId,
    /// Fluid family of the content.
    pub family: FamilyId,
    /// Liquid level, 1..=7.
    pub level: u8,
    /// Flow shape encoded in the content.
    pub variant: FlowVariant,
}

impl FluidCell {
    /// True for source cells: infinite supply, never self-decays.
    #[must_use]
    pub const fn is_source(&self) -> bool {
        self.level >= MAX_LIQUID_LEVEL
    }
}

/// Reads the fluid cell at a position, if the fluid layer holds liquid.
#[must_use]
pub fn fluid_cell_at(
    registry: &ContentRegistry,
    reads: &dyn GridReads,
    pos: BlockPos,
) -> Option<FluidCell> {
    let id = reads.get_block(pos, Layer::Fluid);
    let tag = registry.fluid_tag(id)?;
    Some(FluidCell {
        id,
        family: tag.family,
        level: tag.level,
        variant: tag.variant,
    })
}
