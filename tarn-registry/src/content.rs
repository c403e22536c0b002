//! Content entry and fluid family data.

use tarn_utils::{ContentId, Direction};

/// Maximum liquid level. A cell at this level is a source: infinite supply,
/// never decays on its own.
pub const MAX_LIQUID_LEVEL: u8 = 7;

/// Replaceable scores at or above this value mark content soft enough for
/// liquid to displace (air, plants, other liquid). Solid terrain sits far
/// below it.
pub const DISPLACEABLE_MIN: i32 = 6000;

/// Fluid family id - an opaque token naming a fluid kind (water, lava, ...).
///
/// Two cells are the "same fluid" iff their families match. Cross-family
/// contact is handled exclusively by the collision resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FamilyId(pub u16);

/// The flow shape of a liquid cell, encoded into its content code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowVariant {
    /// No dominant horizontal direction.
    Still,
    /// Part of a falling column or sitting on a tilted floor.
    Down,
    /// Dominant horizontal flow toward one cardinal.
    Side(Direction),
}

impl FlowVariant {
    /// All variants a family registers content for.
    pub const ALL: [FlowVariant; 6] = [
        FlowVariant::Still,
        FlowVariant::Down,
        FlowVariant::Side(Direction::North),
        FlowVariant::Side(Direction::South),
        FlowVariant::Side(Direction::West),
        FlowVariant::Side(Direction::East),
    ];

    /// The code token for this variant, used by `code_with_parts`.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            FlowVariant::Still => "still",
            FlowVariant::Down => "down",
            FlowVariant::Side(Direction::North) => "north",
            FlowVariant::Side(Direction::South) => "south",
            FlowVariant::Side(Direction::West) => "west",
            FlowVariant::Side(Direction::East) => "east",
            // Side() is only constructed with horizontals.
            FlowVariant::Side(_) => "still",
        }
    }
}

/// Fluid data attached to a content id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FluidTag {
    /// The family this content belongs to.
    pub family: FamilyId,
    /// Liquid level, 1..=7.
    pub level: u8,
    /// Flow shape encoded in the content code.
    pub variant: FlowVariant,
}

impl FluidTag {
    /// True for source cells (level 7).
    #[must_use]
    pub const fn is_source(&self) -> bool {
        self.level >= MAX_LIQUID_LEVEL
    }
}

/// Per-face partial-solidity profile, values in [0, 1].
///
/// 1.0 fully blocks flow through that face; a fractional value still blocks
/// flow whose `level / 7` is at or below it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierProfile(pub [f32; 6]);

impl BarrierProfile {
    /// No barrier on any face.
    pub const NONE: BarrierProfile = BarrierProfile([0.0; 6]);
    /// Every face fully blocked.
    pub const FULL: BarrierProfile = BarrierProfile([1.0; 6]);

    /// Same barrier height on all six faces.
    #[must_use]
    pub const fn uniform(height: f32) -> Self {
        BarrierProfile([height; 6])
    }

    /// Barrier height on the given face.
    #[must_use]
    pub fn height(&self, face: Direction) -> f32 {
        self.0[face.index()]
    }
}

/// One registered content id.
#[derive(Debug, Clone)]
pub struct ContentEntry {
    /// The id this entry describes.
    pub id: ContentId,
    /// Unique textual code, e.g. `granite` or `water-still-7`.
    pub code: String,
    /// How easily liquid displaces this content; see [`DISPLACEABLE_MIN`].
    pub replaceable: i32,
    /// Per-face obstruction profile.
    pub barrier: BarrierProfile,
    /// Present iff this content participates in the liquid simulation.
    pub fluid: Option<FluidTag>,
}

/// Per-family simulation tuning and collision configuration.
#[derive(Debug, Clone)]
pub struct FluidFamily {
    /// The family's id.
    pub id: FamilyId,
    /// Code prefix for all content of this family.
    pub name: String,
    /// Delay between a mutation and the follow-up settle callback.
    pub tick_delay_ms: u32,
    /// Bound for the downhill search, in blocks.
    pub search_radius: u8,
    /// Family this fluid reacts with on contact. Asymmetric and config
    /// driven: water may collide with lava while lava ignores water.
    pub collides_with: Option<FamilyId>,
    /// Solid product when the colliding cell was a source.
    pub source_product: Option<ContentId>,
    /// Solid product when the colliding cell was flowing.
    pub flowing_product: Option<ContentId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_tokens_unique() {
        let tokens: Vec<_> = FlowVariant::ALL.iter().map(|v| v.token()).collect();
        for (i, a) in tokens.iter().enumerate() {
            for b in &tokens[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_source_threshold() {
        let tag = FluidTag {
            family: FamilyId(0),
            level: 7,
            variant: FlowVariant::Still,
        };
        assert!(tag.is_source());
        assert!(!FluidTag { level: 6, ..tag }.is_source());
    }
}
