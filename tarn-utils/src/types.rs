// Wrapper types making it harder to accidentally use the wrong underlying type.

use std::fmt;

/// A raw content id. Using the registry this id can be derived into the block
/// it names and that block's fluid/barrier properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentId(pub u32);

impl ContentId {
    /// The absent/air content. The grid returns this for unloaded or empty cells.
    pub const EMPTY: ContentId = ContentId(0);

    /// Returns true if this is the empty content.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two logical layers the grid exposes at one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Layer {
    /// The solid layer (terrain, placed blocks, collision products).
    Solid = 1,
    /// The fluid layer (liquid cells live here).
    Fluid = 2,
}
