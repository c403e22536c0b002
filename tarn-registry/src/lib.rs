//! Content registry for the tarn liquid simulation.
//!
//! Resolves opaque [`ContentId`](tarn_utils::ContentId)s into replaceable
//! scores, per-face barrier profiles and fluid tags, and composes fluid codes
//! back into content ids. Built once at startup (from code or from a JSON5
//! config) and passed around by reference; nothing here is mutable after
//! [`registry::ContentRegistryBuilder::freeze`].

pub mod config;
pub mod content;
pub mod registry;

pub use content::{
    BarrierProfile, ContentEntry, DISPLACEABLE_MIN, FamilyId, FlowVariant, FluidFamily, FluidTag,
    MAX_LIQUID_LEVEL,
};
pub use registry::{ContentRegistry, ContentRegistryBuilder, FamilySpec};
