//! In-memory grid double.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tarn_utils::{BlockPos, ContentId, Layer};

use super::{GridAccessor, GridReads};

/// Sparse in-memory grid.
///
/// Backs every engine test and doubles as a scratch world for headless
/// experiments. Unset positions read as [`ContentId::EMPTY`], matching the
/// accessor contract for unloaded cells.
#[derive(Default)]
pub struct MemoryGrid {
    cells: RwLock<FxHashMap<(BlockPos, Layer), ContentId>>,
}

impl MemoryGrid {
    /// Creates an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-empty cells across both layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    /// True if no cell was ever written (or all were cleared).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }
}

impl GridReads for MemoryGrid {
    fn get_block(&self, pos: BlockPos, layer: Layer) -> ContentId {
        self.cells
            .read()
            .get(&(pos, layer))
            .copied()
            .unwrap_or(ContentId::EMPTY)
    }

    fn get_effective_solid(&self, pos: BlockPos) -> ContentId {
        let solid = self.get_block(pos, Layer::Solid);
        if !solid.is_empty() {
            return solid;
        }
        self.get_block(pos, Layer::Fluid)
    }
}

impl GridAccessor for MemoryGrid {
    fn set_block(&self, id: ContentId, pos: BlockPos, layer: Layer) {
        let mut cells = self.cells.write();
        if id.is_empty() {
            cells.remove(&(pos, layer));
        } else {
            cells.insert((pos, layer), id);
        }
    }
}
