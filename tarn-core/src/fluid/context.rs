//! Per-invocation simulation context.

use parking_lot::Mutex;
use tarn_registry::{ContentRegistry, FamilyId};
use tarn_utils::BlockPos;

use crate::grid::GridAccessor;
use crate::scheduler::LiquidScheduler;

use super::downhill::SearchOffsets;
use super::effects::EffectSink;

/// Borrowed capabilities for one engine invocation.
///
/// Everything here is immutable configuration or an external capability;
/// the engine itself keeps no state between invocations. The scheduler sits
/// behind a mutex only so the context can be shared by `&` like the rest of
/// the accessor surface - the simulation is single-threaded by contract.
pub struct SimContext<'a> {
    /// Content registry, built once at startup.
    pub registry: &'a ContentRegistry,
    /// The voxel grid accessor.
    pub grid: &'a dyn GridAccessor,
    /// Coalescing delayed-callback scheduler.
    pub scheduler: &'a Mutex<LiquidScheduler>,
    /// Sink for collision particles and sounds.
    pub effects: &'a dyn EffectSink,
    /// Precomputed downhill search offsets.
    pub offsets: &'a SearchOffsets,
    /// Current wall-clock of the simulation, in milliseconds.
    pub now_ms: u64,
}

impl SimContext<'_> {
    /// Re-arms the delayed callback for a position.
    pub fn schedule(&self, pos: BlockPos, delay_ms: u32) {
        self.scheduler.lock().schedule(pos, self.now_ms, delay_ms);
    }

    /// Re-arms a position using the family's configured tick delay.
    pub fn schedule_family(&self, pos: BlockPos, family: FamilyId) {
        self.schedule(pos, self.registry.family(family).tick_delay_ms);
    }
}
