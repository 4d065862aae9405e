use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use strata_blocks::BiomeId;

use crate::coord::CHUNK_SIZE;
use crate::worldgen::WorldGenConfig;

/// Column sampling contract for terrain generation.
///
/// Both functions must be pure in `(x, z)` for a given seed so that a peer
/// can rebuild identical terrain from the seed alone.
pub trait TerrainSource: Send + Sync {
    fn height(&self, x: i32, z: i32) -> f32;
    fn biome(&self, x: i32, z: i32) -> BiomeId;

    /// First empty row above the column.
    fn surface_level(&self, x: i32, z: i32) -> i32 {
        self.height(x, z).floor() as i32 + 1
    }
}

/// Two-layer height noise plus a low-frequency biome axis.
pub struct NoiseTerrain {
    seed: i32,
    height_fbm: FastNoiseLite,
    height_cells: FastNoiseLite,
    biome_axis: FastNoiseLite,
    scale: f32,
    biome_positions: Vec<f32>,
}

impl NoiseTerrain {
    /// `biome_positions` are the biome anchors on the `[-1, 1]` biome axis,
    /// indexed by [`BiomeId`].
    pub fn new(seed: i32, cfg: &WorldGenConfig, biome_positions: Vec<f32>) -> Self {
        let mut height_fbm = FastNoiseLite::with_seed(seed);
        height_fbm.set_noise_type(Some(NoiseType::OpenSimplex2));
        height_fbm.set_fractal_type(Some(FractalType::FBm));
        height_fbm.set_frequency(Some(cfg.height_frequency));

        let mut height_cells = FastNoiseLite::with_seed(seed);
        height_cells.set_noise_type(Some(NoiseType::Cellular));
        height_cells.set_frequency(Some(cfg.cellular_frequency));

        let mut biome_axis = FastNoiseLite::with_seed(seed.wrapping_add(1));
        biome_axis.set_noise_type(Some(NoiseType::OpenSimplex2));
        biome_axis.set_fractal_type(Some(FractalType::FBm));
        biome_axis.set_frequency(Some(cfg.biome_frequency));

        Self {
            seed,
            height_fbm,
            height_cells,
            biome_axis,
            scale: (CHUNK_SIZE * cfg.height_span.max(1)) as f32 / 2.0,
            biome_positions,
        }
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }
}

impl TerrainSource for NoiseTerrain {
    fn height(&self, x: i32, z: i32) -> f32 {
        let (fx, fz) = (x as f32, z as f32);
        let a = self.height_fbm.get_noise_2d(fx, fz) * 0.5 + 0.5;
        let b = self.height_cells.get_noise_2d(fx, fz) * 0.5 + 0.5;
        (a + b * 2.0) * self.scale
    }

    fn biome(&self, x: i32, z: i32) -> BiomeId {
        let v = self.biome_axis.get_noise_2d(x as f32, z as f32);
        let mut best = 0usize;
        let mut best_d = f32::INFINITY;
        for (i, p) in self.biome_positions.iter().enumerate() {
            let d = (p - v).abs();
            // Strict less keeps the first anchor on ties.
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        best as BiomeId
    }
}
