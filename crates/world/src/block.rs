//! Packed per-voxel records and the immutable block catalog.

use serde::{Deserialize, Serialize};

/// Maximum stored light level.
pub const MAX_LIGHT: u8 = 15;

const KIND_MASK: u8 = 0x0F;
const LIGHT_SHIFT: u8 = 4;

/// Block types known to the engine. Discriminants fit in a nibble.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum BlockType {
    #[default]
    Air = 0,
    Dirt = 1,
    Grass = 2,
    Stone = 3,
    Sand = 4,
    Leaves = 5,
    Log = 6,
    Bedrock = 7,
}

impl BlockType {
    /// Every block type, in discriminant order.
    pub const ALL: [BlockType; 8] = [
        BlockType::Air,
        BlockType::Dirt,
        BlockType::Grass,
        BlockType::Stone,
        BlockType::Sand,
        BlockType::Leaves,
        BlockType::Log,
        BlockType::Bedrock,
    ];

    /// Decode a nibble; unknown ids are `None`.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn is_air(self) -> bool {
        self == BlockType::Air
    }
}

/// Linear RGB multiplier applied to tinted faces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tint(pub [f32; 3]);

impl Tint {
    pub const WHITE: Tint = Tint([1.0, 1.0, 1.0]);
    pub const ZERO: Tint = Tint([0.0, 0.0, 0.0]);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b])
    }

    /// Accumulate `other * weight` into `self`.
    pub fn add_weighted(&mut self, other: Tint, weight: f32) {
        for (dst, src) in self.0.iter_mut().zip(other.0) {
            *dst += src * weight;
        }
    }

    pub fn scaled(self, factor: f32) -> Self {
        let [r, g, b] = self.0;
        Self([r * factor, g * factor, b * factor])
    }
}

impl Default for Tint {
    fn default() -> Self {
        Tint::WHITE
    }
}

/// Packed voxel state: block type in the low nibble, light in the high nibble, plus tint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    data: u8,
    pub tint: Tint,
}

impl BlockRecord {
    /// The universal empty record returned for anything out of range or unloaded.
    pub const AIR: BlockRecord = BlockRecord {
        data: 0,
        tint: Tint::WHITE,
    };

    pub fn new(kind: BlockType, tint: Tint, light: u8) -> Self {
        Self {
            data: kind.id() | (light.min(MAX_LIGHT) << LIGHT_SHIFT),
            tint,
        }
    }

    /// Untinted record at full light.
    pub fn solid(kind: BlockType) -> Self {
        Self::new(kind, Tint::WHITE, MAX_LIGHT)
    }

    #[inline]
    pub fn kind(&self) -> BlockType {
        BlockType::from_id(self.data & KIND_MASK).unwrap_or(BlockType::Air)
    }

    #[inline]
    pub fn light(&self) -> u8 {
        self.data >> LIGHT_SHIFT
    }

    #[inline]
    pub fn is_air(&self) -> bool {
        self.data & KIND_MASK == 0
    }

    pub fn with_light(self, light: u8) -> Self {
        Self {
            data: (self.data & KIND_MASK) | (light.min(MAX_LIGHT) << LIGHT_SHIFT),
            tint: self.tint,
        }
    }
}

impl Default for BlockRecord {
    fn default() -> Self {
        BlockRecord::AIR
    }
}

/// Cube face identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockFace {
    /// +Y
    Top,
    /// -Y
    Bottom,
    /// -Z
    North,
    /// +Z
    South,
    /// +X
    East,
    /// -X
    West,
}

impl BlockFace {
    pub const ALL: [BlockFace; 6] = [
        BlockFace::Top,
        BlockFace::Bottom,
        BlockFace::North,
        BlockFace::South,
        BlockFace::East,
        BlockFace::West,
    ];

    /// Unit offset towards the neighbor this face looks at.
    pub const fn normal(self) -> [i32; 3] {
        match self {
            BlockFace::Top => [0, 1, 0],
            BlockFace::Bottom => [0, -1, 0],
            BlockFace::North => [0, 0, -1],
            BlockFace::South => [0, 0, 1],
            BlockFace::East => [1, 0, 0],
            BlockFace::West => [-1, 0, 0],
        }
    }
}

/// Which faces of a block receive the biome tint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TintRule {
    Never,
    TopOnly,
    AllFaces,
}

/// Immutable per-type rendering record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDefinition {
    pub kind: BlockType,
    pub top_tile: u16,
    pub bottom_tile: u16,
    pub side_tile: u16,
    pub tint_rule: TintRule,
}

impl BlockDefinition {
    const fn uniform(kind: BlockType, tile: u16) -> Self {
        Self {
            kind,
            top_tile: tile,
            bottom_tile: tile,
            side_tile: tile,
            tint_rule: TintRule::Never,
        }
    }

    pub fn tile_for(&self, face: BlockFace) -> u16 {
        match face {
            BlockFace::Top => self.top_tile,
            BlockFace::Bottom => self.bottom_tile,
            _ => self.side_tile,
        }
    }

    pub fn is_tinted(&self, face: BlockFace) -> bool {
        match self.tint_rule {
            TintRule::Never => false,
            TintRule::TopOnly => face == BlockFace::Top,
            TintRule::AllFaces => true,
        }
    }
}

/// Table of block definitions indexed by [`BlockType`].
///
/// Built once and shared by reference; nothing mutates it after construction.
#[derive(Debug, Clone)]
pub struct BlockCatalog {
    definitions: [BlockDefinition; BlockType::ALL.len()],
}

impl BlockCatalog {
    /// Default tile layout for a 16x16 terrain atlas.
    pub fn standard() -> Self {
        Self {
            definitions: [
                BlockDefinition::uniform(BlockType::Air, 0),
                BlockDefinition::uniform(BlockType::Dirt, 2),
                BlockDefinition {
                    kind: BlockType::Grass,
                    top_tile: 0,
                    bottom_tile: 2,
                    side_tile: 3,
                    tint_rule: TintRule::TopOnly,
                },
                BlockDefinition::uniform(BlockType::Stone, 1),
                BlockDefinition::uniform(BlockType::Sand, 18),
                BlockDefinition {
                    tint_rule: TintRule::AllFaces,
                    ..BlockDefinition::uniform(BlockType::Leaves, 52)
                },
                BlockDefinition {
                    kind: BlockType::Log,
                    top_tile: 21,
                    bottom_tile: 21,
                    side_tile: 20,
                    tint_rule: TintRule::Never,
                },
                BlockDefinition::uniform(BlockType::Bedrock, 17),
            ],
        }
    }

    /// Replace the definition for one block type.
    pub fn with_definition(mut self, definition: BlockDefinition) -> Self {
        self.definitions[definition.kind.id() as usize] = definition;
        self
    }

    pub fn definition(&self, kind: BlockType) -> &BlockDefinition {
        &self.definitions[kind.id() as usize]
    }
}

impl Default for BlockCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Read-only access to blocks by absolute world coordinates.
///
/// Implementations must return [`BlockRecord::AIR`] for unloaded chunks and for `y`
/// outside the chunk height.
pub trait BlockLookup {
    fn block_at(&self, world_x: i32, world_y: i32, world_z: i32) -> BlockRecord;

    fn is_solid(&self, world_x: i32, world_y: i32, world_z: i32) -> bool {
        !self.block_at(world_x, world_y, world_z).is_air()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_packs_kind_and_light() {
        let record = BlockRecord::new(BlockType::Log, Tint::WHITE, 9);
        assert_eq!(record.kind(), BlockType::Log);
        assert_eq!(record.light(), 9);
        assert!(!record.is_air());
    }

    #[test]
    fn light_is_clamped_to_nibble() {
        let record = BlockRecord::new(BlockType::Stone, Tint::WHITE, 200);
        assert_eq!(record.light(), MAX_LIGHT);
        assert_eq!(record.kind(), BlockType::Stone);
    }

    #[test]
    fn with_light_keeps_kind() {
        let record = BlockRecord::solid(BlockType::Sand).with_light(3);
        assert_eq!(record.kind(), BlockType::Sand);
        assert_eq!(record.light(), 3);
    }

    #[test]
    fn air_constant_is_air() {
        assert!(BlockRecord::AIR.is_air());
        assert_eq!(BlockRecord::default(), BlockRecord::AIR);
        assert!(BlockRecord::new(BlockType::Air, Tint::WHITE, 15).is_air());
    }

    #[test]
    fn every_type_round_trips_through_id() {
        for kind in BlockType::ALL {
            assert_eq!(BlockType::from_id(kind.id()), Some(kind));
        }
        assert_eq!(BlockType::from_id(15), None);
    }

    #[test]
    fn grass_tints_only_top() {
        let catalog = BlockCatalog::standard();
        let grass = catalog.definition(BlockType::Grass);
        assert!(grass.is_tinted(BlockFace::Top));
        assert!(!grass.is_tinted(BlockFace::East));
        assert_eq!(grass.tile_for(BlockFace::Top), 0);
        assert_eq!(grass.tile_for(BlockFace::South), 3);
        assert_eq!(grass.tile_for(BlockFace::Bottom), 2);
    }

    #[test]
    fn leaves_tint_every_face() {
        let catalog = BlockCatalog::standard();
        let leaves = catalog.definition(BlockType::Leaves);
        assert!(BlockFace::ALL.iter().all(|&face| leaves.is_tinted(face)));
        assert!(!catalog.definition(BlockType::Stone).is_tinted(BlockFace::Top));
    }

    #[test]
    fn catalog_override_replaces_entry() {
        let catalog = BlockCatalog::standard().with_definition(BlockDefinition {
            kind: BlockType::Stone,
            top_tile: 7,
            bottom_tile: 7,
            side_tile: 7,
            tint_rule: TintRule::Never,
        });
        assert_eq!(catalog.definition(BlockType::Stone).top_tile, 7);
    }

    #[test]
    fn weighted_tint_accumulates() {
        let mut tint = Tint::ZERO;
        tint.add_weighted(Tint::new(1.0, 0.5, 0.0), 0.5);
        tint.add_weighted(Tint::new(0.0, 0.5, 1.0), 0.5);
        assert_eq!(tint, Tint::new(0.5, 0.5, 0.5));
    }
}
