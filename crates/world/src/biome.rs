//! Biome catalog, classification and blending.

use serde::{Deserialize, Serialize};

use crate::block::{BlockType, Tint};
use crate::noise::{NoiseConfig, NoiseGenerator};

/// Distance (in blocks) over which neighboring biomes influence a column.
pub const BLEND_RADIUS: f32 = 32.0;
/// Spacing (in blocks) between blend sample points.
pub const BLEND_STEP: i32 = 8;
/// Samples at or below this weight are ignored.
const MIN_SAMPLE_WEIGHT: f32 = 0.01;

/// Biome identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BiomeKind {
    Plains,
    Forest,
    Tundra,
    Mountains,
    Desert,
    Swamp,
}

impl BiomeKind {
    pub const COUNT: usize = 6;

    pub const ALL: [BiomeKind; Self::COUNT] = [
        BiomeKind::Plains,
        BiomeKind::Forest,
        BiomeKind::Tundra,
        BiomeKind::Mountains,
        BiomeKind::Desert,
        BiomeKind::Swamp,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Pick a biome from temperature and humidity, both in `[0, 1]`.
    pub fn classify(temperature: f64, humidity: f64) -> BiomeKind {
        if temperature < 0.3 {
            if humidity < 0.35 {
                BiomeKind::Mountains
            } else {
                BiomeKind::Tundra
            }
        } else if temperature > 0.4 && temperature < 0.7 && humidity > 0.5 {
            if humidity > 0.7 {
                BiomeKind::Swamp
            } else {
                BiomeKind::Forest
            }
        } else if temperature >= 0.7 && humidity < 0.4 {
            BiomeKind::Desert
        } else {
            BiomeKind::Plains
        }
    }
}

/// Canopy style used by the tree planter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeShape {
    /// Round blob canopy.
    Broadleaf,
    /// Tapering layered canopy.
    Conifer,
}

/// Static biome parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomeDefinition {
    pub kind: BiomeKind,
    pub name: &'static str,
    /// Minimum surface height in blocks.
    pub base_height: f32,
    /// Height added at noise = 1.
    pub height_variation: f32,
    /// Base frequency of the height noise.
    pub frequency: f64,
    pub surface: BlockType,
    pub subsurface: BlockType,
    pub deep: BlockType,
    pub subsurface_depth: i32,
    pub grass_tint: Tint,
    /// Probability that a gated column grows a tree.
    pub tree_density: f32,
    pub tree_shape: TreeShape,
}

/// Immutable table of biome definitions, indexed by [`BiomeKind`].
#[derive(Debug, Clone)]
pub struct BiomeTable {
    definitions: Vec<BiomeDefinition>,
}

impl BiomeTable {
    pub fn standard() -> Self {
        let grassland = |kind: BiomeKind,
                         name: &'static str,
                         base_height: f32,
                         height_variation: f32,
                         frequency: f64| BiomeDefinition {
            kind,
            name,
            base_height,
            height_variation,
            frequency,
            surface: BlockType::Grass,
            subsurface: BlockType::Dirt,
            deep: BlockType::Stone,
            subsurface_depth: 3,
            grass_tint: Tint::new(0.55, 0.80, 0.35),
            tree_density: 0.05,
            tree_shape: TreeShape::Broadleaf,
        };

        let definitions = vec![
            grassland(BiomeKind::Plains, "Plains", 40.0, 30.0, 0.008),
            BiomeDefinition {
                grass_tint: Tint::new(0.35, 0.65, 0.25),
                tree_density: 0.3,
                ..grassland(BiomeKind::Forest, "Forest", 50.0, 40.0, 0.006)
            },
            BiomeDefinition {
                subsurface_depth: 2,
                grass_tint: Tint::new(0.60, 0.75, 0.65),
                tree_density: 0.02,
                tree_shape: TreeShape::Conifer,
                ..grassland(BiomeKind::Tundra, "Tundra", 40.0, 20.0, 0.007)
            },
            BiomeDefinition {
                surface: BlockType::Stone,
                subsurface: BlockType::Stone,
                subsurface_depth: 1,
                grass_tint: Tint::new(0.50, 0.65, 0.45),
                tree_density: 0.01,
                tree_shape: TreeShape::Conifer,
                ..grassland(BiomeKind::Mountains, "Mountains", 70.0, 50.0, 0.003)
            },
            BiomeDefinition {
                surface: BlockType::Sand,
                subsurface: BlockType::Sand,
                subsurface_depth: 4,
                grass_tint: Tint::new(0.75, 0.72, 0.40),
                tree_density: 0.0,
                ..grassland(BiomeKind::Desert, "Desert", 30.0, 40.0, 0.008)
            },
            BiomeDefinition {
                subsurface_depth: 2,
                grass_tint: Tint::new(0.40, 0.50, 0.25),
                tree_density: 0.15,
                ..grassland(BiomeKind::Swamp, "Swamp", 20.0, 20.0, 0.01)
            },
        ];
        Self { definitions }
    }

    pub fn get(&self, kind: BiomeKind) -> &BiomeDefinition {
        &self.definitions[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &BiomeDefinition> {
        self.definitions.iter()
    }
}

impl Default for BiomeTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Normalized biome weights for one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomeBlend {
    /// Weight per biome, indexed by [`BiomeKind::index`]; sums to 1.
    pub weights: [f32; BiomeKind::COUNT],
    /// Biome with the largest weight (first in table order on ties).
    pub dominant: BiomeKind,
}

impl BiomeBlend {
    /// Biomes with non-zero weight.
    pub fn contributors(&self) -> impl Iterator<Item = (BiomeKind, f32)> + '_ {
        BiomeKind::ALL
            .iter()
            .map(|&kind| (kind, self.weights[kind.index()]))
            .filter(|&(_, w)| w > 0.0)
    }

    pub fn weight(&self, kind: BiomeKind) -> f32 {
        self.weights[kind.index()]
    }
}

/// Maps world columns to biomes using temperature and humidity noise.
#[derive(Debug, Clone)]
pub struct BiomeAssigner {
    temperature_noise: NoiseGenerator,
    humidity_noise: NoiseGenerator,
}

impl BiomeAssigner {
    /// Create a new biome assigner from world seed.
    pub fn new(world_seed: u64) -> Self {
        let seed = world_seed as u32;

        Self {
            temperature_noise: NoiseGenerator::new(NoiseConfig::temperature(seed)),
            humidity_noise: NoiseGenerator::new(NoiseConfig::humidity(seed)),
        }
    }

    /// Get biome at world coordinates.
    pub fn get_biome(&self, world_x: i32, world_z: i32) -> BiomeKind {
        let x = world_x as f64;
        let z = world_z as f64;
        let temperature = self.temperature_noise.sample_2d_unit(x, z);
        let humidity = self.humidity_noise.sample_2d_unit(x, z);
        BiomeKind::classify(temperature, humidity)
    }

    /// Blend biomes sampled on a grid around the column.
    ///
    /// Each sample is weighted by `max(0, 1 - d / BLEND_RADIUS)^2`.
    pub fn blend(&self, world_x: i32, world_z: i32) -> BiomeBlend {
        let radius = (BLEND_RADIUS / 16.0) as i32;
        let mut weights = [0.0f32; BiomeKind::COUNT];
        let mut total = 0.0f32;

        for dx in -radius..=radius {
            for dz in -radius..=radius {
                let ox = (dx * BLEND_STEP) as f32;
                let oz = (dz * BLEND_STEP) as f32;
                let distance = (ox * ox + oz * oz).sqrt();
                let weight = (1.0 - distance / BLEND_RADIUS).max(0.0).powi(2);
                if weight <= MIN_SAMPLE_WEIGHT {
                    continue;
                }
                let kind = self.get_biome(world_x + dx * BLEND_STEP, world_z + dz * BLEND_STEP);
                weights[kind.index()] += weight;
                total += weight;
            }
        }

        // The centre sample always has weight 1, so total is never zero.
        for w in &mut weights {
            *w /= total;
        }

        let mut dominant = BiomeKind::Plains;
        let mut best = f32::MIN;
        for kind in BiomeKind::ALL {
            if weights[kind.index()] > best {
                best = weights[kind.index()];
                dominant = kind;
            }
        }

        BiomeBlend { weights, dominant }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_kind() {
        let table = BiomeTable::standard();
        for kind in BiomeKind::ALL {
            assert_eq!(table.get(kind).kind, kind);
        }
        assert_eq!(table.iter().count(), BiomeKind::COUNT);
    }

    #[test]
    fn heights_fit_in_chunk() {
        let table = BiomeTable::standard();
        for def in table.iter() {
            assert!(def.base_height + def.height_variation < crate::CHUNK_HEIGHT as f32);
        }
    }

    #[test]
    fn classification_covers_climate_extremes() {
        assert_eq!(BiomeKind::classify(0.1, 0.6), BiomeKind::Tundra);
        assert_eq!(BiomeKind::classify(0.1, 0.1), BiomeKind::Mountains);
        assert_eq!(BiomeKind::classify(0.5, 0.6), BiomeKind::Forest);
        assert_eq!(BiomeKind::classify(0.5, 0.9), BiomeKind::Swamp);
        assert_eq!(BiomeKind::classify(0.9, 0.1), BiomeKind::Desert);
        assert_eq!(BiomeKind::classify(0.5, 0.3), BiomeKind::Plains);
    }

    #[test]
    fn blend_weights_are_normalized() {
        let assigner = BiomeAssigner::new(12345);
        for (x, z) in [(0, 0), (-100, 250), (1000, -1000), (37, 5)] {
            let blend = assigner.blend(x, z);
            let sum: f32 = blend.weights.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4, "weights sum to {sum}");
            assert!(blend.weight(blend.dominant) > 0.0);
            assert!(blend
                .contributors()
                .all(|(_, w)| w <= blend.weight(blend.dominant)));
        }
    }

    #[test]
    fn blend_is_deterministic() {
        let a = BiomeAssigner::new(9);
        let b = BiomeAssigner::new(9);
        assert_eq!(a.blend(-33, 71), b.blend(-33, 71));
        assert_eq!(a.get_biome(500, 500), b.get_biome(500, 500));
    }
}
