//! JSON5 content configuration.
//!
//! A world declares its solids and fluid families in a JSON5 document; this
//! module deserializes it and feeds the registry builder. Collision products
//! reference solid codes, `collides_with` references fluid names, so both are
//! resolved after all registrations.

use serde::Deserialize;
use thiserror::Error;

use crate::content::BarrierProfile;
use crate::registry::{ContentRegistry, ContentRegistryBuilder, FamilySpec};

/// Errors raised while turning a config document into a registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON5 or does not match the schema.
    #[error("invalid content config: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A `collides_with` entry names a fluid that was not declared.
    #[error("unknown fluid family `{0}` in collides_with")]
    UnknownFamily(String),
    /// A collision product names a content code that was not declared.
    #[error("unknown content code `{0}` in collision products")]
    UnknownContent(String),
    /// A collision block names a family but omits one of its products.
    #[error("fluid `{0}` declares collides_with without both products")]
    IncompleteCollision(String),
}

/// Top-level config document.
#[derive(Debug, Deserialize)]
pub struct ContentConfig {
    /// Solid content declarations.
    #[serde(default)]
    pub solids: Vec<SolidConfig>,
    /// Fluid family declarations.
    #[serde(default)]
    pub fluids: Vec<FluidConfig>,
}

/// One solid content declaration.
#[derive(Debug, Deserialize)]
pub struct SolidConfig {
    /// Unique content code.
    pub code: String,
    /// Replaceable score; low for terrain, high for soft cover.
    pub replaceable: i32,
    /// Uniform barrier height on all faces.
    #[serde(default = "full_barrier")]
    pub barrier: f32,
}

/// One fluid family declaration.
#[derive(Debug, Deserialize)]
pub struct FluidConfig {
    /// Code prefix for the family's content.
    pub name: String,
    /// Settle callback delay in milliseconds.
    pub tick_delay_ms: u32,
    /// Downhill search radius in blocks.
    #[serde(default = "default_search_radius")]
    pub search_radius: u8,
    /// Replaceable score for the family's liquid content.
    pub replaceable: i32,
    /// Name of the family this fluid reacts with on contact.
    #[serde(default)]
    pub collides_with: Option<String>,
    /// Solid code produced when the touched cell is a source.
    #[serde(default)]
    pub source_product: Option<String>,
    /// Solid code produced when the touched cell is flowing.
    #[serde(default)]
    pub flowing_product: Option<String>,
}

fn full_barrier() -> f32 {
    1.0
}

const fn default_search_radius() -> u8 {
    4
}

/// Parses a JSON5 document and builds a frozen registry from it.
pub fn load_registry(source: &str) -> Result<ContentRegistry, ConfigError> {
    let config: ContentConfig = serde_json5::from_str(source)?;
    build_registry(&config)
}

/// Builds a frozen registry from an already-parsed config.
pub fn build_registry(config: &ContentConfig) -> Result<ContentRegistry, ConfigError> {
    let mut builder = ContentRegistryBuilder::new();

    for solid in &config.solids {
        builder.register_solid(
            &solid.code,
            solid.replaceable,
            BarrierProfile::uniform(solid.barrier),
        );
    }

    for fluid in &config.fluids {
        builder.register_fluid(&FamilySpec {
            name: fluid.name.clone(),
            tick_delay_ms: fluid.tick_delay_ms,
            search_radius: fluid.search_radius,
            replaceable: fluid.replaceable,
        });
    }

    // Second pass: collision wiring, now that every name resolves.
    for fluid in &config.fluids {
        let Some(other) = &fluid.collides_with else {
            continue;
        };
        let family = builder
            .family_by_name(&fluid.name)
            .ok_or_else(|| ConfigError::UnknownFamily(fluid.name.clone()))?;
        let collides_with = builder
            .family_by_name(other)
            .ok_or_else(|| ConfigError::UnknownFamily(other.clone()))?;

        let (Some(source_code), Some(flowing_code)) =
            (&fluid.source_product, &fluid.flowing_product)
        else {
            return Err(ConfigError::IncompleteCollision(fluid.name.clone()));
        };
        let source_product = builder
            .get_by_code(source_code)
            .ok_or_else(|| ConfigError::UnknownContent(source_code.clone()))?;
        let flowing_product = builder
            .get_by_code(flowing_code)
            .ok_or_else(|| ConfigError::UnknownContent(flowing_code.clone()))?;

        builder.set_collision(family, collides_with, source_product, flowing_product);
        log::debug!(
            "fluid `{}` collides with `{}` -> {source_code}/{flowing_code}",
            fluid.name,
            other
        );
    }

    Ok(builder.freeze())
}
