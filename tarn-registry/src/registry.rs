//! The content registry and its builder.

use rustc_hash::FxHashMap;
use tarn_utils::{BlockPos, ContentId, Direction};

use crate::content::{
    BarrierProfile, ContentEntry, FamilyId, FlowVariant, FluidFamily, FluidTag, MAX_LIQUID_LEVEL,
};

/// Everything needed to register one fluid family.
#[derive(Debug, Clone)]
pub struct FamilySpec {
    /// Code prefix, e.g. `water`.
    pub name: String,
    /// Delay between a mutation and the follow-up settle callback.
    pub tick_delay_ms: u32,
    /// Bound for the downhill search, in blocks.
    pub search_radius: u8,
    /// Replaceable score for this family's liquid content.
    pub replaceable: i32,
}

/// Immutable content registry. Build with [`ContentRegistryBuilder`], then
/// pass by reference into every simulation invocation.
pub struct ContentRegistry {
    by_id: FxHashMap<ContentId, ContentEntry>,
    by_code: FxHashMap<String, ContentId>,
    families: Vec<FluidFamily>,
}

impl ContentRegistry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> ContentRegistryBuilder {
        ContentRegistryBuilder::new()
    }

    /// Looks up an entry. Absent for [`ContentId::EMPTY`] and unknown ids.
    #[must_use]
    pub fn get(&self, id: ContentId) -> Option<&ContentEntry> {
        self.by_id.get(&id)
    }

    /// Resolves a code back to its content id.
    #[must_use]
    pub fn get_by_code(&self, code: &str) -> Option<ContentId> {
        self.by_code.get(code).copied()
    }

    /// Composes a sibling content id of `id`'s family with the given flow
    /// variant token and level, e.g. (`water-still-7`, "east", 4) ->
    /// `water-east-4`. Returns `None` if `id` is not a fluid or the composed
    /// code was never registered.
    #[must_use]
    pub fn code_with_parts(&self, id: ContentId, variant: &str, level: u8) -> Option<ContentId> {
        let tag = self.fluid_tag(id)?;
        let family = self.family(tag.family);
        self.get_by_code(&format!("{}-{}-{}", family.name, variant, level))
    }

    /// Liquid level of the content, 0 for non-fluids and absent cells.
    #[must_use]
    pub fn liquid_level(&self, id: ContentId) -> u8 {
        self.fluid_tag(id).map_or(0, |tag| tag.level)
    }

    /// The fluid family token, if the content is a fluid.
    #[must_use]
    pub fn liquid_code(&self, id: ContentId) -> Option<FamilyId> {
        self.fluid_tag(id).map(|tag| tag.family)
    }

    /// How easily liquid displaces this content. Absent cells (outside the
    /// loaded area, or simply empty) read as maximally replaceable.
    #[must_use]
    pub fn replaceable(&self, id: ContentId) -> i32 {
        self.get(id).map_or(i32::MAX, |entry| entry.replaceable)
    }

    /// Barrier height of the content on the given face, in [0, 1]. Absent and
    /// unknown content obstructs nothing.
    ///
    /// The position is part of the query surface so profiles may vary by
    /// placement; the table-backed registry ignores it.
    #[must_use]
    pub fn liquid_barrier_height(&self, id: ContentId, face: Direction, _pos: BlockPos) -> f32 {
        self.get(id).map_or(0.0, |entry| entry.barrier.height(face))
    }

    /// The fluid tag, if the content participates in the liquid simulation.
    #[must_use]
    pub fn fluid_tag(&self, id: ContentId) -> Option<&FluidTag> {
        self.get(id).and_then(|entry| entry.fluid.as_ref())
    }

    /// Family data for a registered family id.
    ///
    /// # Panics
    /// Panics if the id did not come from this registry's builder.
    #[must_use]
    pub fn family(&self, id: FamilyId) -> &FluidFamily {
        &self.families[id.0 as usize]
    }

    /// All registered fluid families.
    pub fn families(&self) -> impl Iterator<Item = &FluidFamily> {
        self.families.iter()
    }

    /// Looks up a family by its registered name.
    #[must_use]
    pub fn family_by_name(&self, name: &str) -> Option<FamilyId> {
        self.families
            .iter()
            .find(|family| family.name == name)
            .map(|family| family.id)
    }
}

/// Builder for [`ContentRegistry`]. Registration is only possible before
/// [`freeze`](Self::freeze); afterwards the registry is immutable.
pub struct ContentRegistryBuilder {
    by_id: FxHashMap<ContentId, ContentEntry>,
    by_code: FxHashMap<String, ContentId>,
    families: Vec<FluidFamily>,
    next_id: u32,
}

impl ContentRegistryBuilder {
    /// Creates an empty builder. Id 0 stays reserved for absent content.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_id: FxHashMap::default(),
            by_code: FxHashMap::default(),
            families: Vec::new(),
            next_id: 1,
        }
    }

    fn insert(&mut self, entry: ContentEntry) -> ContentId {
        let id = entry.id;
        debug_assert!(
            !self.by_code.contains_key(&entry.code),
            "duplicate content code {}",
            entry.code
        );
        self.by_code.insert(entry.code.clone(), id);
        self.by_id.insert(id, entry);
        id
    }

    fn allocate(&mut self) -> ContentId {
        let id = ContentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Registers a solid content with a uniform barrier profile shortcut.
    pub fn register_solid(
        &mut self,
        code: &str,
        replaceable: i32,
        barrier: BarrierProfile,
    ) -> ContentId {
        let id = self.allocate();
        self.insert(ContentEntry {
            id,
            code: code.to_owned(),
            replaceable,
            barrier,
            fluid: None,
        })
    }

    /// Registers a fluid family and content for every flow variant and level
    /// combination (`{name}-{variant}-{level}` for levels 1..=7).
    pub fn register_fluid(&mut self, spec: &FamilySpec) -> FamilyId {
        let family = FamilyId(self.families.len() as u16);
        self.families.push(FluidFamily {
            id: family,
            name: spec.name.clone(),
            tick_delay_ms: spec.tick_delay_ms,
            search_radius: spec.search_radius,
            collides_with: None,
            source_product: None,
            flowing_product: None,
        });

        for variant in FlowVariant::ALL {
            for level in 1..=MAX_LIQUID_LEVEL {
                let id = self.allocate();
                self.insert(ContentEntry {
                    id,
                    code: format!("{}-{}-{}", spec.name, variant.token(), level),
                    replaceable: spec.replaceable,
                    barrier: BarrierProfile::NONE,
                    fluid: Some(FluidTag {
                        family,
                        level,
                        variant,
                    }),
                });
            }
        }

        family
    }

    /// Configures the collision reaction for a family: which family it reacts
    /// with and the solid products for source/flowing contact.
    pub fn set_collision(
        &mut self,
        family: FamilyId,
        collides_with: FamilyId,
        source_product: ContentId,
        flowing_product: ContentId,
    ) {
        let entry = &mut self.families[family.0 as usize];
        entry.collides_with = Some(collides_with);
        entry.source_product = Some(source_product);
        entry.flowing_product = Some(flowing_product);
    }

    /// Looks up an already-registered family by name.
    #[must_use]
    pub fn family_by_name(&self, name: &str) -> Option<FamilyId> {
        self.families
            .iter()
            .find(|family| family.name == name)
            .map(|family| family.id)
    }

    /// Resolves a code registered so far.
    #[must_use]
    pub fn get_by_code(&self, code: &str) -> Option<ContentId> {
        self.by_code.get(code).copied()
    }

    /// Freezes the builder into an immutable registry.
    #[must_use]
    pub fn freeze(self) -> ContentRegistry {
        ContentRegistry {
            by_id: self.by_id,
            by_code: self.by_code,
            families: self.families,
        }
    }
}

impl Default for ContentRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_utils::BlockPos;

    fn water_spec() -> FamilySpec {
        FamilySpec {
            name: "water".to_owned(),
            tick_delay_ms: 150,
            search_radius: 4,
            replaceable: 9000,
        }
    }

    #[test]
    fn test_fluid_registration_covers_all_levels() {
        let mut builder = ContentRegistry::builder();
        builder.register_fluid(&water_spec());
        let registry = builder.freeze();

        for level in 1..=MAX_LIQUID_LEVEL {
            for token in ["still", "down", "north", "south", "west", "east"] {
                let code = format!("water-{token}-{level}");
                let id = registry.get_by_code(&code).expect("registered");
                assert_eq!(registry.liquid_level(id), level);
            }
        }
    }

    #[test]
    fn test_code_with_parts_composes_within_family() {
        let mut builder = ContentRegistry::builder();
        builder.register_fluid(&water_spec());
        let registry = builder.freeze();

        let still7 = registry.get_by_code("water-still-7").expect("registered");
        let east4 = registry
            .code_with_parts(still7, "east", 4)
            .expect("composable");
        assert_eq!(registry.get(east4).expect("entry").code, "water-east-4");
        // Level 0 was never registered; composition reports that rather
        // than inventing content.
        assert!(registry.code_with_parts(still7, "still", 0).is_none());
    }

    #[test]
    fn test_absent_content_defaults() {
        let registry = ContentRegistry::builder().freeze();
        let pos = BlockPos::new(0, 0, 0);

        assert_eq!(registry.liquid_level(ContentId::EMPTY), 0);
        assert_eq!(registry.replaceable(ContentId::EMPTY), i32::MAX);
        assert_eq!(
            registry.liquid_barrier_height(ContentId::EMPTY, Direction::Up, pos),
            0.0
        );
        assert!(registry.fluid_tag(ContentId(999)).is_none());
    }
}
