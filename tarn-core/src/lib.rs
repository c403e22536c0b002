//! Finite-level liquid spreading simulation.
//!
//! A cellular-automaton engine that propagates discretely-leveled fluid
//! (levels 0-7) through a sparse 3D voxel grid: it decides flow direction,
//! funnels toward reachable drops, resolves collisions between incompatible
//! fluid families, and re-arms a coalescing per-position callback so the
//! automaton keeps settling.
//!
//! The engine owns no state of its own. Each invocation re-derives everything
//! from the grid, stages its writes into a bulk buffer, commits once, and
//! re-schedules every touched position. World storage, the content registry
//! and the callback clock are external capabilities passed in through
//! [`fluid::SimContext`].

pub mod fluid;
pub mod grid;
pub mod scheduler;

pub use grid::{GridAccessor, GridReads, MemoryGrid, StagedWrites};
pub use scheduler::LiquidScheduler;
