//! Effect sink capability.
//!
//! The collision resolver reports a steam burst and a reaction sound when two
//! incompatible fluids touch. Rendering and audio live outside this core, so
//! both are emitted through this trait.

use tarn_utils::BlockPos;

/// Receiver for collision side effects.
pub trait EffectSink {
    /// A steam/extinguish particle burst at the replaced cell.
    fn reaction_particles(&self, pos: BlockPos);

    /// The sizzle/extinguish sound at the replaced cell.
    fn reaction_sound(&self, pos: BlockPos);
}

/// Sink that drops all effects, for headless simulation.
pub struct NoEffects;

impl EffectSink for NoEffects {
    fn reaction_particles(&self, _pos: BlockPos) {}
    fn reaction_sound(&self, _pos: BlockPos) {}
}
