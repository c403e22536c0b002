//! The liquid automaton: cell model, flow direction resolution, downhill
//! path finding, per-tick spreading and cross-family collision.

pub mod cell;
pub mod collision;
pub mod context;
pub mod downhill;
pub mod effects;
pub mod flow_direction;
pub mod spread;

pub use cell::{FluidCell, fluid_cell_at};
pub use context::SimContext;
pub use downhill::{DownhillCandidate, SearchOffsets};
pub use effects::{EffectSink, NoEffects};
pub use spread::SpreadEngine;
