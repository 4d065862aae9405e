use strata_blocks::{AIR, BlockId, Rgba};

/// Per-voxel simulation payload, stored inline.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum BehaviorState {
    #[default]
    None,
    /// Granular block waiting to drop; seconds left.
    Falling { timer: f32 },
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Voxel {
    pub id: BlockId,
    /// Light emitted from this cell. An inactive voxel may keep `(0,0,0,a)`
    /// while its old light is being removed.
    pub emission: Rgba,
    pub layer: u8,
    pub behavior: BehaviorState,
}

impl Voxel {
    pub const AIR: Voxel = Voxel {
        id: AIR,
        emission: Rgba::ZERO,
        layer: 0,
        behavior: BehaviorState::None,
    };

    /// Bare voxel of the given type; emission, layer and behavior come from decoration.
    #[inline]
    pub const fn of(id: BlockId) -> Voxel {
        Voxel {
            id,
            emission: Rgba::ZERO,
            layer: 0,
            behavior: BehaviorState::None,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.id != AIR
    }

    /// Emission retained only to clear light this cell used to cast.
    #[inline]
    pub fn is_fading_light(&self) -> bool {
        self.emission.a != 0 && self.emission.rgb_is_zero()
    }
}
