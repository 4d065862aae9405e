use serde::{Deserialize, Serialize};

/// Block type id. `0` is air and is never active.
pub type BlockId = u8;

pub const AIR: BlockId = 0;

/// Index into the biome table of a [`crate::BlockRegistry`].
pub type BiomeId = u16;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MaterialId(pub u16);

/// 8-bit RGBA. For emission and light values `a` carries intensity/range.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const ZERO: Rgba = Rgba::new(0, 0, 0, 0);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub fn rgb_is_zero(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    #[inline]
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parses `rrggbb`, `rrggbbaa` or either with a leading `#`. Missing alpha is opaque.
    pub fn from_hex(s: &str) -> Option<Rgba> {
        let s = s.trim().trim_start_matches('#');
        if !(s.len() == 6 || s.len() == 8) || !s.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        let a = if s.len() == 8 { byte(6)? } else { 255 };
        Some(Rgba::new(byte(0)?, byte(2)?, byte(4)?, a))
    }

    /// Lowercase `rrggbb`, alpha dropped.
    pub fn to_hex_rgb(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Packed 24-bit rgb, used as the palette key.
    #[inline]
    pub fn rgb_key(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(v: [u8; 4]) -> Self {
        Rgba::new(v[0], v[1], v[2], v[3])
    }
}
