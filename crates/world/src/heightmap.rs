//! Per-column generator output kept alongside a chunk.

use crate::biome::BiomeKind;
use crate::chunk::CHUNK_SIZE;

/// Blended surface height and dominant biome for each column of one chunk.
///
/// Heights are the generator's pre-feature surface, so caves and trees do not change them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heightmap {
    /// Indexed as heights[z][x] for cache-friendly iteration.
    heights: [[i32; CHUNK_SIZE]; CHUNK_SIZE],
    biomes: [[BiomeKind; CHUNK_SIZE]; CHUNK_SIZE],
}

impl Heightmap {
    pub fn new() -> Self {
        Self {
            heights: [[0; CHUNK_SIZE]; CHUNK_SIZE],
            biomes: [[BiomeKind::Plains; CHUNK_SIZE]; CHUNK_SIZE],
        }
    }

    pub(crate) fn set(&mut self, local_x: usize, local_z: usize, height: i32, biome: BiomeKind) {
        self.heights[local_z][local_x] = height;
        self.biomes[local_z][local_x] = biome;
    }

    /// Surface height at a local column.
    pub fn get(&self, local_x: usize, local_z: usize) -> i32 {
        self.heights[local_z][local_x]
    }

    /// Dominant biome at a local column.
    pub fn biome(&self, local_x: usize, local_z: usize) -> BiomeKind {
        self.biomes[local_z][local_x]
    }

    pub fn min_height(&self) -> i32 {
        self.heights.iter().flatten().copied().min().unwrap_or(0)
    }

    pub fn max_height(&self) -> i32 {
        self.heights.iter().flatten().copied().max().unwrap_or(0)
    }
}

impl Default for Heightmap {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest height step between two heightmaps along their shared edge.
///
/// `east` must be the chunk at +X of `west`.
pub fn seam_delta_x(west: &Heightmap, east: &Heightmap) -> i32 {
    (0..CHUNK_SIZE)
        .map(|z| (west.get(CHUNK_SIZE - 1, z) - east.get(0, z)).abs())
        .max()
        .unwrap_or(0)
}
