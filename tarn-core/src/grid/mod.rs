//! Grid accessor capability and the staged bulk-write buffer.

mod memory;

pub use memory::MemoryGrid;

use rustc_hash::FxHashMap;
use tarn_utils::{BlockPos, ContentId, Layer};

/// Read side of the voxel grid.
///
/// Positions outside the loaded area return [`ContentId::EMPTY`] rather than
/// erroring; the registry treats absent content as level 0 and maximally
/// replaceable, so the engine degrades to "nothing to do" at world edges.
pub trait GridReads {
    /// Content at a position on one of the two logical layers.
    fn get_block(&self, pos: BlockPos, layer: Layer) -> ContentId;

    /// The most solid content at a position across both layers. Barrier
    /// queries go through this, so a waterlogged fence still obstructs flow.
    fn get_effective_solid(&self, pos: BlockPos) -> ContentId;
}

/// Full grid accessor: reads plus direct writes.
pub trait GridAccessor: GridReads {
    /// Writes content at a position on the given layer.
    fn set_block(&self, id: ContentId, pos: BlockPos, layer: Layer);
}

/// Per-invocation bulk-write buffer.
///
/// All writes of one engine invocation are staged here and committed once.
/// The buffer is read-through: reads observe earlier staged writes before
/// falling back to the grid. The collision cascade depends on this - it
/// stages a solid product and immediately probes the neighborhood through
/// the same buffer.
pub struct StagedWrites<'a> {
    grid: &'a dyn GridAccessor,
    staged: FxHashMap<(BlockPos, Layer), ContentId>,
    order: Vec<(BlockPos, Layer)>,
}

impl<'a> StagedWrites<'a> {
    /// Creates an empty buffer over the grid.
    #[must_use]
    pub fn new(grid: &'a dyn GridAccessor) -> Self {
        Self {
            grid,
            staged: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Stages a write. A later write to the same position and layer
    /// supersedes an earlier one but keeps its place in the commit order.
    pub fn set_block(&mut self, id: ContentId, pos: BlockPos, layer: Layer) {
        if self.staged.insert((pos, layer), id).is_none() {
            self.order.push((pos, layer));
        }
    }

    /// Number of distinct (position, layer) slots staged so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.order.len()
    }

    /// Applies all staged writes to the grid in first-write order and
    /// returns the written positions for reschedule fan-out.
    #[must_use]
    pub fn commit(self) -> Vec<(BlockPos, Layer)> {
        for &(pos, layer) in &self.order {
            let id = self.staged[&(pos, layer)];
            self.grid.set_block(id, pos, layer);
        }
        self.order
    }
}

impl GridReads for StagedWrites<'_> {
    fn get_block(&self, pos: BlockPos, layer: Layer) -> ContentId {
        self.staged
            .get(&(pos, layer))
            .copied()
            .unwrap_or_else(|| self.grid.get_block(pos, layer))
    }

    fn get_effective_solid(&self, pos: BlockPos) -> ContentId {
        if let Some(&id) = self.staged.get(&(pos, Layer::Solid)) {
            if !id.is_empty() {
                return id;
            }
            // Solid staged away; the fluid layer (staged or not) is all
            // that remains at this position.
            return self.get_block(pos, Layer::Fluid);
        }
        if let Some(&id) = self.staged.get(&(pos, Layer::Fluid)) {
            let solid = self.grid.get_block(pos, Layer::Solid);
            if !solid.is_empty() {
                return solid;
            }
            return id;
        }
        self.grid.get_effective_solid(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_through() {
        let grid = MemoryGrid::new();
        let pos = BlockPos::new(0, 0, 0);
        grid.set_block(ContentId(1), pos, Layer::Fluid);

        let mut staged = StagedWrites::new(&grid);
        assert_eq!(staged.get_block(pos, Layer::Fluid), ContentId(1));

        staged.set_block(ContentId(2), pos, Layer::Fluid);
        assert_eq!(staged.get_block(pos, Layer::Fluid), ContentId(2));
        // Grid untouched until commit.
        assert_eq!(grid.get_block(pos, Layer::Fluid), ContentId(1));

        let written = staged.commit();
        assert_eq!(written, vec![(pos, Layer::Fluid)]);
        assert_eq!(grid.get_block(pos, Layer::Fluid), ContentId(2));
    }

    #[test]
    fn test_supersede_keeps_single_slot() {
        let grid = MemoryGrid::new();
        let pos = BlockPos::new(1, 2, 3);

        let mut staged = StagedWrites::new(&grid);
        staged.set_block(ContentId(5), pos, Layer::Solid);
        staged.set_block(ContentId(6), pos, Layer::Solid);
        assert_eq!(staged.write_count(), 1);

        let written = staged.commit();
        assert_eq!(written.len(), 1);
        assert_eq!(grid.get_block(pos, Layer::Solid), ContentId(6));
    }

    #[test]
    fn test_effective_solid_tracks_staged_solid() {
        let grid = MemoryGrid::new();
        let pos = BlockPos::new(0, 0, 0);
        grid.set_block(ContentId(9), pos, Layer::Fluid);

        let mut staged = StagedWrites::new(&grid);
        assert_eq!(staged.get_effective_solid(pos), ContentId(9));

        staged.set_block(ContentId(4), pos, Layer::Solid);
        assert_eq!(staged.get_effective_solid(pos), ContentId(4));

        staged.set_block(ContentId::EMPTY, pos, Layer::Solid);
        assert_eq!(staged.get_effective_solid(pos), ContentId(9));
    }
}
