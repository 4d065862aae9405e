//! Block catalog: block types, materials, color palette and biome table.
#![forbid(unsafe_code)]

pub mod config;
pub mod material;
pub mod registry;
pub mod types;

pub use material::MaterialCatalog;
pub use registry::{Biome, BlockRegistry, BlockType, RegistryError};
pub use types::{AIR, BiomeId, BlockId, MaterialId, Rgba};
