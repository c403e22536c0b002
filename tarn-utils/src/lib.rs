//! Shared newtypes and grid geometry for the tarn workspace.

pub mod pos;
pub mod types;

pub use pos::{BlockPos, Direction};
pub use types::{ContentId, Layer};
