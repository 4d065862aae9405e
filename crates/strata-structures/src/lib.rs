//! Voxel structures in the `x y z colorHex` text format: parsing, placement,
//! terrain decoration and region export.
#![forbid(unsafe_code)]

mod decorate;
mod format;

pub use decorate::{Decorations, decorate_chunk, decoration_anchor};
pub use format::{StructureCell, StructureDef, StructureError, export_region, load_dir};
