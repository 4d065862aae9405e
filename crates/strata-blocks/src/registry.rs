use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::BlocksConfig;
use crate::material::MaterialCatalog;
use crate::types::{AIR, BiomeId, BlockId, MaterialId, Rgba};

const BUILTIN_BLOCKS: &str = include_str!("../../../assets/voxels/blocks.toml");

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read block catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse block catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("block id {0} defined twice")]
    DuplicateId(BlockId),
    #[error("block name `{0}` defined twice")]
    DuplicateName(String),
    #[error("block `{name}` has invalid color `{value}`")]
    BadColor { name: String, value: String },
    #[error("biome `{biome}` names unknown surface block `{block}`")]
    UnknownSurface { biome: String, block: String },
}

#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    /// Palette color used by the structure text format.
    pub color: Rgba,
    pub material: MaterialId,
    /// Render layer; faces between different layers are always drawn.
    pub layer: u8,
    /// Emitted light. `a == 0` means the block doesn't emit.
    pub emission: Rgba,
    /// Falls when the cell below is empty.
    pub granular: bool,
    /// Seconds a granular block hangs before dropping one cell.
    pub fall_delay: f32,
    pub liquid: bool,
}

impl BlockType {
    #[inline]
    pub fn is_emissive(&self) -> bool {
        self.emission.a != 0
    }
}

#[derive(Clone, Debug)]
pub struct Biome {
    pub id: BiomeId,
    pub name: String,
    pub position: f32,
    pub surface: BlockId,
}

/// Resolved block catalog. Lookups by id are dense over `0..=255`.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    pub materials: MaterialCatalog,
    blocks: Vec<Option<BlockType>>,
    by_name: HashMap<String, BlockId>,
    palette: HashMap<u32, BlockId>,
    biomes: Vec<Biome>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// Registry holding only air.
    pub fn new() -> Self {
        let mut reg = Self {
            materials: MaterialCatalog::new(),
            blocks: vec![None; 256],
            by_name: HashMap::new(),
            palette: HashMap::new(),
            biomes: Vec::new(),
        };
        reg.insert_air();
        reg
    }

    fn insert_air(&mut self) {
        self.blocks[AIR as usize] = Some(BlockType {
            id: AIR,
            name: "air".to_string(),
            color: Rgba::new(255, 255, 255, 255),
            material: MaterialId(0),
            layer: 0,
            emission: Rgba::ZERO,
            granular: false,
            fall_delay: 0.0,
            liquid: false,
        });
        self.by_name.insert("air".to_string(), AIR);
    }

    /// The catalog shipped with the engine.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_toml_str(BUILTIN_BLOCKS)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, RegistryError> {
        let cfg: BlocksConfig = toml::from_str(s)?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, RegistryError> {
        let mut reg = BlockRegistry::new();
        // Declared materials first, in key order, so MaterialId assignment is stable.
        let mut declared: Vec<_> = cfg.materials.into_iter().collect();
        declared.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, def) in declared {
            reg.materials.intern(&key, def.render_tag);
        }

        for def in cfg.blocks {
            let explicit_air = def.id == AIR;
            if !explicit_air && reg.blocks[def.id as usize].is_some() {
                return Err(RegistryError::DuplicateId(def.id));
            }
            if !explicit_air && reg.by_name.contains_key(&def.name) {
                return Err(RegistryError::DuplicateName(def.name));
            }
            let color = Rgba::from_hex(&def.color).ok_or_else(|| RegistryError::BadColor {
                name: def.name.clone(),
                value: def.color.clone(),
            })?;
            let material = match def.material.as_deref() {
                Some(key) => reg.materials.intern(key, None),
                None => MaterialId(0),
            };
            if explicit_air {
                // Air can be renamed and recolored, but never emits or falls.
                reg.by_name.remove("air");
            }
            let ty = BlockType {
                id: def.id,
                name: def.name.clone(),
                color,
                material,
                layer: def.layer,
                emission: if explicit_air {
                    Rgba::ZERO
                } else {
                    def.emission.map(Rgba::from).unwrap_or(Rgba::ZERO)
                },
                granular: def.granular && !explicit_air,
                fall_delay: def.fall_delay.max(0.0),
                liquid: def.liquid,
            };
            reg.palette.entry(color.rgb_key()).or_insert(def.id);
            reg.by_name.insert(def.name, def.id);
            reg.blocks[def.id as usize] = Some(ty);
        }

        for (i, b) in cfg.biomes.into_iter().enumerate() {
            let surface = reg
                .id_by_name(&b.surface)
                .ok_or_else(|| RegistryError::UnknownSurface {
                    biome: b.name.clone(),
                    block: b.surface.clone(),
                })?;
            reg.biomes.push(Biome {
                id: i as BiomeId,
                name: b.name,
                position: b.position,
                surface,
            });
        }
        log::debug!(
            "block registry: {} blocks, {} materials, {} biomes",
            reg.len(),
            reg.materials.len(),
            reg.biomes.len()
        );
        Ok(reg)
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks[id as usize].as_ref()
    }

    #[inline]
    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks[id as usize].is_some()
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Palette lookup by rgb; alpha is ignored.
    pub fn id_for_color(&self, color: Rgba) -> Option<BlockId> {
        self.palette.get(&color.rgb_key()).copied()
    }

    /// Palette color of a block, white for unknown ids.
    pub fn color_of(&self, id: BlockId) -> Rgba {
        self.get(id).map(|b| b.color).unwrap_or(Rgba::WHITE)
    }

    pub fn material_of(&self, id: BlockId) -> MaterialId {
        self.get(id).map(|b| b.material).unwrap_or_default()
    }

    /// Largest light range of any emissive block.
    pub fn max_emission(&self) -> u8 {
        self.iter().map(|b| b.emission.a).max().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockType> {
        self.blocks.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn biomes(&self) -> &[Biome] {
        &self.biomes
    }

    pub fn biome(&self, id: BiomeId) -> Option<&Biome> {
        self.biomes.get(id as usize)
    }

    pub fn biome_by_name(&self, name: &str) -> Option<&Biome> {
        self.biomes.iter().find(|b| b.name == name)
    }
}
