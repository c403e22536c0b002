//! Cross-family collision resolution.
//!
//! Collision is asymmetric and config-driven: a family's `collides_with`
//! names the one family it reacts to. The reaction fires on two paths:
//!
//! - **Contact** ([`try_contact`]): a ticking cell whose own family collides
//!   with an adjacent fluid is itself replaced by its configured solid
//!   product.
//! - **Flow** ([`try_replace`]): liquid flowing into a cell of the family it
//!   collides with replaces that cell instead of merging.
//!
//! Either way the replaced cell becomes a solid product (a different one for
//! source vs flowing cells), with a floating check that may consume the cell
//! below, and a cascade pass that lets the rest of the touching pool react
//! within the same invocation.

use tarn_registry::{DISPLACEABLE_MIN, FamilyId, FluidFamily, FluidTag};
use tarn_utils::{BlockPos, ContentId, Direction, Layer};

use crate::grid::{GridReads, StagedWrites};

use super::context::SimContext;

/// Reacts the fluid at `pos` against its own collision configuration.
///
/// Fires when the cell's family has `collides_with` set and a cell of that
/// family touches any of the six faces; the cell at `pos` is then replaced by
/// its family's configured product. Returns false when there is no fluid, no
/// configuration, or no touching collidable neighbor.
pub fn try_contact(ctx: &SimContext<'_>, staged: &mut StagedWrites<'_>, pos: BlockPos) -> bool {
    let registry = ctx.registry;
    let Some(&tag) = registry.fluid_tag(staged.get_block(pos, Layer::Fluid)) else {
        return false;
    };
    let behavior = registry.family(tag.family);
    let Some(collides_with) = behavior.collides_with else {
        return false;
    };
    let touching = Direction::ALL.iter().any(|&dir| {
        registry.liquid_code(staged.get_block(pos.relative(dir), Layer::Fluid))
            == Some(collides_with)
    });
    if !touching {
        return false;
    }

    if !stage_product(ctx, staged, pos, tag, behavior) {
        return false;
    }

    // Cascade: pool-mates next to the new solid may themselves be touching
    // the colliding family now. Reads go through the staged buffer, so
    // already-replaced cells report no fluid and the pool shrinks
    // monotonically.
    for dir in Direction::ALL {
        let npos = pos.relative(dir);
        let Some(ntag) = registry.fluid_tag(staged.get_block(npos, Layer::Fluid)) else {
            continue;
        };
        ctx.schedule_family(npos, ntag.family);
        if ntag.family == tag.family {
            try_contact(ctx, staged, npos);
        }
    }

    true
}

/// Attempts the replacement reaction of liquid of `incoming` flowing into
/// the fluid at `pos`.
///
/// Fires when the incoming behavior's `collides_with` names the existing
/// cell's family; the existing cell is replaced by the incoming family's
/// configured product. Returns false when the cell holds no fluid or the
/// families do not collide - normal "no interaction" outcomes; ordinary flow
/// logic proceeds instead.
pub fn try_replace(
    ctx: &SimContext<'_>,
    staged: &mut StagedWrites<'_>,
    incoming: FamilyId,
    pos: BlockPos,
) -> bool {
    let registry = ctx.registry;
    let Some(&tag) = registry.fluid_tag(staged.get_block(pos, Layer::Fluid)) else {
        return false;
    };
    let behavior = registry.family(incoming);
    if behavior.collides_with != Some(tag.family) {
        return false;
    }

    if !stage_product(ctx, staged, pos, tag, behavior) {
        return false;
    }

    // Cascade: liquid of the incoming family next to the new solid may now
    // touch more of the colliding pool.
    for dir in Direction::ALL {
        let npos = pos.relative(dir);
        let Some(ntag) = registry.fluid_tag(staged.get_block(npos, Layer::Fluid)) else {
            continue;
        };
        ctx.schedule_family(npos, ntag.family);
        if ntag.family == incoming {
            for probe in Direction::ALL {
                try_replace(ctx, staged, incoming, npos.relative(probe));
            }
        }
    }

    true
}

/// Stages the solid product for the replaced cell at `pos`, runs the
/// floating check, and emits the reaction effects. `behavior` is the family
/// whose configuration drives the reaction; `tag` is the replaced cell.
fn stage_product(
    ctx: &SimContext<'_>,
    staged: &mut StagedWrites<'_>,
    pos: BlockPos,
    tag: FluidTag,
    behavior: &FluidFamily,
) -> bool {
    let registry = ctx.registry;
    let product = if tag.is_source() {
        behavior.source_product
    } else {
        behavior.flowing_product
    };
    let Some(product) = product else {
        log::trace!("no replacement product for contact at {pos:?}");
        return false;
    };

    staged.set_block(ContentId::EMPTY, pos, Layer::Fluid);
    staged.set_block(product, pos, Layer::Solid);
    ctx.schedule_family(pos, tag.family);

    // Floating check: a product with nothing firm around it may consume the
    // liquid directly below as well.
    if product_unsupported(ctx, staged, pos) {
        let below = pos.down();
        if registry.liquid_code(staged.get_block(below, Layer::Fluid)) == Some(tag.family) {
            staged.set_block(ContentId::EMPTY, below, Layer::Fluid);
            staged.set_block(product, below, Layer::Solid);
            ctx.schedule_family(below, tag.family);
        }
    }

    ctx.effects.reaction_particles(pos);
    ctx.effects.reaction_sound(pos);
    true
}

/// True when the solids below and on every cardinal side are softer than the
/// displacement threshold, i.e. the product would sit on nothing.
fn product_unsupported(
    ctx: &SimContext<'_>,
    staged: &StagedWrites<'_>,
    pos: BlockPos,
) -> bool {
    let registry = ctx.registry;
    if registry.replaceable(staged.get_effective_solid(pos.down())) < DISPLACEABLE_MIN {
        return false;
    }
    Direction::HORIZONTALS.iter().all(|&dir| {
        registry.replaceable(staged.get_effective_solid(pos.relative(dir))) >= DISPLACEABLE_MIN
    })
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use tarn_registry::{BarrierProfile, ContentRegistry, FamilySpec};

    use super::*;
    use crate::fluid::context::SimContext;
    use crate::fluid::downhill::SearchOffsets;
    use crate::fluid::effects::NoEffects;
    use crate::grid::{GridAccessor, MemoryGrid};
    use crate::scheduler::LiquidScheduler;

    struct Setup {
        registry: ContentRegistry,
        grid: MemoryGrid,
        scheduler: Mutex<LiquidScheduler>,
        offsets: SearchOffsets,
    }

    fn setup() -> Setup {
        let mut builder = ContentRegistry::builder();
        builder.register_solid("granite", 500, BarrierProfile::FULL);
        let obsidian = builder.register_solid("obsidian", 500, BarrierProfile::FULL);
        let basalt = builder.register_solid("basalt", 500, BarrierProfile::FULL);
        let water = builder.register_fluid(&FamilySpec {
            name: "water".to_owned(),
            tick_delay_ms: 150,
            search_radius: 4,
            replaceable: 9500,
        });
        let lava = builder.register_fluid(&FamilySpec {
            name: "lava".to_owned(),
            tick_delay_ms: 500,
            search_radius: 2,
            replaceable: 9000,
        });
        builder.set_collision(water, lava, obsidian, basalt);
        let registry = builder.freeze();
        let offsets = SearchOffsets::for_registry(&registry);
        Setup {
            registry,
            grid: MemoryGrid::new(),
            scheduler: Mutex::new(LiquidScheduler::new()),
            offsets,
        }
    }

    impl Setup {
        fn ctx(&self) -> SimContext<'_> {
            SimContext {
                registry: &self.registry,
                grid: &self.grid,
                scheduler: &self.scheduler,
                effects: &NoEffects,
                offsets: &self.offsets,
                now_ms: 0,
            }
        }

        fn put(&self, code: &str, pos: BlockPos, layer: Layer) {
            let id = self.registry.get_by_code(code).expect("registered");
            self.grid.set_block(id, pos, layer);
        }

        fn water_family(&self) -> FamilyId {
            let id = self.registry.get_by_code("water-still-7").expect("id");
            self.registry.liquid_code(id).expect("fluid")
        }
    }

    #[test]
    fn test_flow_replaces_colliding_target_by_sourceness() {
        let setup = setup();
        let source_pos = BlockPos::new(0, 0, 0);
        let flowing_pos = BlockPos::new(5, 0, 0);
        setup.put("granite", source_pos.down(), Layer::Solid);
        setup.put("granite", flowing_pos.down(), Layer::Solid);
        setup.put("lava-still-7", source_pos, Layer::Fluid);
        setup.put("lava-still-3", flowing_pos, Layer::Fluid);

        let ctx = setup.ctx();
        let water = setup.water_family();

        let mut staged = StagedWrites::new(&setup.grid);
        assert!(try_replace(&ctx, &mut staged, water, source_pos));
        assert!(try_replace(&ctx, &mut staged, water, flowing_pos));
        let _ = staged.commit();

        let obsidian = setup.registry.get_by_code("obsidian").expect("id");
        let basalt = setup.registry.get_by_code("basalt").expect("id");
        assert_eq!(setup.grid.get_block(source_pos, Layer::Solid), obsidian);
        assert_eq!(setup.grid.get_block(flowing_pos, Layer::Solid), basalt);
        assert!(setup.grid.get_block(source_pos, Layer::Fluid).is_empty());
    }

    #[test]
    fn test_flow_without_configured_reaction_is_noop() {
        let setup = setup();
        let pos = BlockPos::new(0, 0, 0);
        setup.put("water-still-4", pos, Layer::Fluid);

        let ctx = setup.ctx();
        let lava = {
            let id = setup.registry.get_by_code("lava-still-7").expect("id");
            setup.registry.liquid_code(id).expect("fluid")
        };

        // Lava has no collides_with entry; flowing into water must report
        // "no interaction" and leave the cell alone.
        let mut staged = StagedWrites::new(&setup.grid);
        assert!(!try_replace(&ctx, &mut staged, lava, pos));
        assert_eq!(staged.write_count(), 0);
    }

    #[test]
    fn test_contact_requires_touching_collidable() {
        let setup = setup();
        let pos = BlockPos::new(0, 0, 0);
        setup.put("granite", pos.down(), Layer::Solid);
        setup.put("water-still-4", pos, Layer::Fluid);

        let ctx = setup.ctx();
        let mut staged = StagedWrites::new(&setup.grid);
        assert!(!try_contact(&ctx, &mut staged, pos));

        setup.put("lava-still-2", pos.offset(0, 0, 1), Layer::Fluid);
        let mut staged = StagedWrites::new(&setup.grid);
        assert!(try_contact(&ctx, &mut staged, pos));
        let _ = staged.commit();

        let basalt = setup.registry.get_by_code("basalt").expect("id");
        assert_eq!(setup.grid.get_block(pos, Layer::Solid), basalt);
        assert!(setup.grid.get_block(pos, Layer::Fluid).is_empty());
    }

    #[test]
    fn test_floating_product_consumes_cell_below() {
        let setup = setup();
        // A lava column with nothing solid anywhere near it.
        let top = BlockPos::new(0, 5, 0);
        setup.put("lava-still-4", top, Layer::Fluid);
        setup.put("lava-still-4", top.down(), Layer::Fluid);

        let ctx = setup.ctx();
        let water = setup.water_family();
        let mut staged = StagedWrites::new(&setup.grid);
        assert!(try_replace(&ctx, &mut staged, water, top));
        let _ = staged.commit();

        let basalt = setup.registry.get_by_code("basalt").expect("id");
        assert_eq!(setup.grid.get_block(top, Layer::Solid), basalt);
        assert_eq!(setup.grid.get_block(top.down(), Layer::Solid), basalt);
        assert!(setup.grid.get_block(top.down(), Layer::Fluid).is_empty());
    }

    #[test]
    fn test_contact_cascades_through_the_pool() {
        let setup = setup();
        // Three water cells in a row, lava touching the middle one from the
        // side; all three touch the pool once their neighbor solidifies.
        for x in 0..3 {
            let pos = BlockPos::new(x, 0, 0);
            setup.put("granite", pos.down(), Layer::Solid);
            setup.put("water-still-3", pos, Layer::Fluid);
        }
        setup.put("lava-still-5", BlockPos::new(1, 0, 1), Layer::Fluid);

        let ctx = setup.ctx();
        let mut staged = StagedWrites::new(&setup.grid);
        assert!(try_contact(&ctx, &mut staged, BlockPos::new(1, 0, 0)));
        let _ = staged.commit();

        // Only the touching cell reacts; its pool-mates no longer touch lava
        // once it has solidified, so they stay liquid.
        let basalt = setup.registry.get_by_code("basalt").expect("id");
        assert_eq!(setup.grid.get_block(BlockPos::new(1, 0, 0), Layer::Solid), basalt);
        assert!(!setup.grid.get_block(BlockPos::new(0, 0, 0), Layer::Fluid).is_empty());
        assert!(!setup.grid.get_block(BlockPos::new(2, 0, 0), Layer::Fluid).is_empty());
    }
}
