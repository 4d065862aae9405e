use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use strata_blocks::{AIR, BlockId, BlockRegistry, Rgba};
use strata_chunk::{Voxel, VoxelStore};
use strata_geom::IVec3;
use strata_world::{ChunkCoord, floor_chunk_coord};
use thiserror::Error;

const DEFAULT_DENSITY: i32 = 8;

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("failed to read structure: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: malformed voxel `{text}`")]
    Malformed { line: usize, text: String },
    #[error("line {line}: bad header `{text}`")]
    BadHeader { line: usize, text: String },
}

/// One cell of a structure, offset in world axes (y up).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StructureCell {
    pub offset: IVec3,
    pub block: BlockId,
}

#[derive(Clone, Debug)]
pub struct StructureDef {
    pub name: String,
    /// Biome name the structure is restricted to; `None` places anywhere.
    pub biome: Option<String>,
    /// Grid spacing for decoration anchors, in cells.
    pub density: i32,
    pub cells: Vec<StructureCell>,
}

enum Line {
    Blank,
    Header(String, String),
    Comment,
    Cell(StructureCell),
}

fn parse_line(raw: &str, reg: &BlockRegistry) -> Option<Line> {
    let line = raw.trim_end_matches('\r').trim();
    if line.is_empty() {
        return Some(Line::Blank);
    }
    if let Some(rest) = line.strip_prefix('#') {
        return Some(match rest.trim().split_once('=') {
            Some((k, v)) => Line::Header(k.trim().to_ascii_lowercase(), v.trim().to_string()),
            None => Line::Comment,
        });
    }
    let mut parts = line.split_whitespace();
    let x = parts.next()?.parse::<i32>().ok()?;
    let y = parts.next()?.parse::<i32>().ok()?;
    let z = parts.next()?.parse::<i32>().ok()?;
    let color = Rgba::from_hex(parts.next()?)?;
    // File z is height.
    Some(Line::Cell(StructureCell {
        offset: IVec3::new(x, z, y),
        block: reg.id_for_color(color).unwrap_or(AIR),
    }))
}

impl StructureDef {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            biome: None,
            density: DEFAULT_DENSITY,
            cells: Vec::new(),
        }
    }

    fn apply_header(&mut self, key: &str, value: &str) -> bool {
        match key {
            "biome" => {
                self.biome = (!value.is_empty() && value != "any").then(|| value.to_string());
                true
            }
            "density" => match value.parse::<i32>() {
                Ok(d) if d > 0 => {
                    self.density = d;
                    true
                }
                _ => false,
            },
            _ => true,
        }
    }

    /// Lenient read: malformed lines and bad headers are skipped.
    /// Colors missing from the palette become air.
    pub fn parse(name: &str, text: &str, reg: &BlockRegistry) -> Self {
        let mut def = Self::empty(name);
        let mut skipped = 0usize;
        for raw in text.lines() {
            match parse_line(raw, reg) {
                Some(Line::Cell(c)) => def.cells.push(c),
                Some(Line::Header(k, v)) => {
                    if !def.apply_header(&k, &v) {
                        skipped += 1;
                    }
                }
                Some(Line::Blank | Line::Comment) => {}
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            log::warn!("structure `{}`: skipped {} malformed line(s)", name, skipped);
        }
        def
    }

    /// Like [`StructureDef::parse`] but fails on the first malformed line.
    pub fn parse_strict(name: &str, text: &str, reg: &BlockRegistry) -> Result<Self, StructureError> {
        let mut def = Self::empty(name);
        for (i, raw) in text.lines().enumerate() {
            match parse_line(raw, reg) {
                Some(Line::Cell(c)) => def.cells.push(c),
                Some(Line::Header(k, v)) => {
                    if !def.apply_header(&k, &v) {
                        return Err(StructureError::BadHeader {
                            line: i + 1,
                            text: raw.to_string(),
                        });
                    }
                }
                Some(Line::Blank | Line::Comment) => {}
                None => {
                    return Err(StructureError::Malformed {
                        line: i + 1,
                        text: raw.to_string(),
                    });
                }
            }
        }
        Ok(def)
    }

    pub fn load_from_path(path: impl AsRef<Path>, reg: &BlockRegistry) -> Result<Self, StructureError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("structure");
        Ok(Self::parse(name, &text, reg))
    }

    /// Writes every cell at `anchor + offset` through the decorated path and
    /// records the chunks written into `touched`. Cells in unloaded chunks
    /// are dropped. Returns the number written.
    pub fn place(
        &self,
        store: &mut VoxelStore,
        anchor: IVec3,
        touched: &mut BTreeSet<ChunkCoord>,
    ) -> usize {
        let mut written = 0;
        for cell in &self.cells {
            let p = anchor + cell.offset;
            if store.set_voxel_with_data(p, Voxel::of(cell.block)) {
                touched.insert(floor_chunk_coord(p));
                written += 1;
            }
        }
        written
    }
}

/// Loads every `*.txt` structure in `dir`, sorted by file name.
pub fn load_dir(dir: impl AsRef<Path>, reg: &BlockRegistry) -> Result<Vec<StructureDef>, StructureError> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|e| e == "txt"))
        .collect();
    paths.sort();
    let mut out = Vec::with_capacity(paths.len());
    for p in paths {
        let def = StructureDef::load_from_path(&p, reg)?;
        log::debug!(
            "loaded structure `{}` ({} cells, biome={:?}, density={})",
            def.name,
            def.cells.len(),
            def.biome,
            def.density
        );
        out.push(def);
    }
    Ok(out)
}

/// Serializes the active voxels in `[min, max)` relative to `min`, in the
/// same line format [`StructureDef::parse`] reads.
pub fn export_region(store: &VoxelStore, min: IVec3, max: IVec3) -> String {
    let reg = store.registry();
    let mut out = String::new();
    for x in min.x..max.x {
        for z in min.z..max.z {
            for y in min.y..max.y {
                let p = IVec3::new(x, y, z);
                let Some(v) = store.get_voxel(p) else { continue };
                if !v.is_active() {
                    continue;
                }
                let d = p - min;
                let hex = reg.color_of(v.id).to_hex_rgb();
                out.push_str(&format!("{} {} {} {}\n", d.x, d.z, d.y, hex));
            }
        }
    }
    out
}
