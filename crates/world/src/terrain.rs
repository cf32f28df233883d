//! Terrain generation pipeline.
//!
//! Generates complete chunks with blended biome heights, caves and trees.

use tracing::{debug, instrument};

use crate::biome::{BiomeAssigner, BiomeKind, BiomeTable};
use crate::block::{BlockRecord, BlockType, Tint, MAX_LIGHT};
use crate::caves::CaveGenerator;
use crate::chunk::{Chunk, ChunkPos, CHUNK_HEIGHT, CHUNK_SIZE};
use crate::heightmap::Heightmap;
use crate::noise::{NoiseConfig, NoiseGenerator};
use crate::pending::DeferredWrite;
use crate::trees::TreePlanter;

/// Skylight lost per block below the topmost solid block of a column.
const SKYLIGHT_FALLOFF: u8 = 2;

/// Blended generator state for one world column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSample {
    /// Surface y, clamped to the chunk height.
    pub height: i32,
    pub dominant: BiomeKind,
    /// Blended grass tint.
    pub tint: Tint,
}

/// Output of [`TerrainGenerator::generate`].
#[derive(Debug, Clone)]
pub struct GeneratedChunk {
    pub chunk: Chunk,
    pub heightmap: Heightmap,
    /// Tree blocks that fall outside `chunk`, each tagged with its owning chunk.
    pub deferred: Vec<DeferredWrite>,
}

/// Terrain generator: a pure function of chunk coordinate and world seed.
pub struct TerrainGenerator {
    world_seed: u64,
    biomes: BiomeTable,
    assigner: BiomeAssigner,
    /// Height noise per biome, indexed by [`BiomeKind::index`].
    height_noise: Vec<NoiseGenerator>,
    caves: CaveGenerator,
    trees: TreePlanter,
}

impl TerrainGenerator {
    /// Create a new terrain generator with the given world seed and biome table.
    pub fn new(world_seed: u64, biomes: BiomeTable) -> Self {
        let seed = world_seed as u32;
        let height_noise = BiomeKind::ALL
            .iter()
            .map(|&kind| {
                let frequency = biomes.get(kind).frequency;
                NoiseGenerator::new(NoiseConfig::biome_height(seed, kind.index() as u32, frequency))
            })
            .collect();

        Self {
            world_seed,
            biomes,
            assigner: BiomeAssigner::new(world_seed),
            height_noise,
            caves: CaveGenerator::new(world_seed),
            trees: TreePlanter::new(world_seed),
        }
    }

    pub fn world_seed(&self) -> u64 {
        self.world_seed
    }

    pub fn biomes(&self) -> &BiomeTable {
        &self.biomes
    }

    /// Blend biomes and sample height and tint for a world column.
    pub fn column(&self, world_x: i32, world_z: i32) -> ColumnSample {
        let blend = self.assigner.blend(world_x, world_z);
        let mut height = 0.0f64;
        let mut tint = Tint::ZERO;

        for (kind, weight) in blend.contributors() {
            let def = self.biomes.get(kind);
            let n = self.height_noise[kind.index()].sample_2d_unit(world_x as f64, world_z as f64);
            let biome_height = def.base_height as f64 + n * def.height_variation as f64;
            height += biome_height * weight as f64;
            tint.add_weighted(def.grass_tint, weight);
        }

        ColumnSample {
            height: (height.floor() as i32).clamp(0, CHUNK_HEIGHT as i32 - 1),
            dominant: blend.dominant,
            tint,
        }
    }

    /// Generator surface height before caves and trees.
    pub fn surface_height(&self, world_x: i32, world_z: i32) -> i32 {
        self.column(world_x, world_z).height
    }

    /// Dominant biome at a world column.
    pub fn biome_at(&self, world_x: i32, world_z: i32) -> BiomeKind {
        self.assigner.blend(world_x, world_z).dominant
    }

    /// Generate a complete chunk at the given position.
    ///
    /// Identical inputs always produce identical output, independent of call order.
    #[instrument(skip(self), fields(chunk = %chunk_pos, world_seed = self.world_seed))]
    pub fn generate(&self, chunk_pos: ChunkPos) -> GeneratedChunk {
        let mut chunk = Chunk::new(chunk_pos);
        let mut heightmap = Heightmap::new();
        let (origin_x, origin_z) = chunk_pos.world_origin();

        for local_z in 0..CHUNK_SIZE {
            for local_x in 0..CHUNK_SIZE {
                let sample = self.column(origin_x + local_x as i32, origin_z + local_z as i32);
                heightmap.set(local_x, local_z, sample.height, sample.dominant);
                self.fill_column(&mut chunk, local_x as i32, local_z as i32, sample);
            }
        }

        let carved = self.caves.carve(&mut chunk);
        let deferred = self.trees.plant(&mut chunk, &self.biomes, &heightmap);
        seed_skylight(&mut chunk);

        debug!(
            carved,
            deferred = deferred.len(),
            min_height = heightmap.min_height(),
            max_height = heightmap.max_height(),
            "generated chunk"
        );

        GeneratedChunk {
            chunk,
            heightmap,
            deferred,
        }
    }

    fn fill_column(&self, chunk: &mut Chunk, x: i32, z: i32, sample: ColumnSample) {
        let biome = self.biomes.get(sample.dominant);
        for y in 0..=sample.height {
            let kind = if y == 0 {
                BlockType::Bedrock
            } else if y == sample.height {
                biome.surface
            } else if y >= sample.height - biome.subsurface_depth {
                biome.subsurface
            } else {
                biome.deep
            };
            let tint = if kind == BlockType::Grass {
                sample.tint
            } else {
                Tint::WHITE
            };
            chunk.set_record(x, y, z, BlockRecord::new(kind, tint, 0));
        }
    }
}

/// Full skylight on the topmost solid block of each column, fading by
/// [`SKYLIGHT_FALLOFF`] per block below it. Air keeps its default record.
fn seed_skylight(chunk: &mut Chunk) {
    for x in 0..CHUNK_SIZE as i32 {
        for z in 0..CHUNK_SIZE as i32 {
            let Some(top) = chunk.top_solid_y(x, z) else {
                continue;
            };
            for y in 0..=top {
                let record = chunk.get_block(x, y, z);
                if record.is_air() {
                    continue;
                }
                let depth = (top - y).min(MAX_LIGHT as i32) as u8;
                let light = MAX_LIGHT.saturating_sub(depth.saturating_mul(SKYLIGHT_FALLOFF));
                chunk.set_record(x, y, z, record.with_light(light));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(seed: u64) -> TerrainGenerator {
        TerrainGenerator::new(seed, BiomeTable::standard())
    }

    #[test]
    fn test_terrain_generation() {
        let gen = generator(12345);
        let out = gen.generate(ChunkPos::new(0, 0));
        for x in 0..CHUNK_SIZE as i32 {
            for z in 0..CHUNK_SIZE as i32 {
                assert_eq!(out.chunk.get_block(x, 0, z).kind(), BlockType::Bedrock);
            }
        }
        assert!(out.heightmap.max_height() > 0);
    }

    #[test]
    fn test_deterministic_generation() {
        let gen = generator(42);
        let a = gen.generate(ChunkPos::new(-2, 5));
        let b = gen.generate(ChunkPos::new(-2, 5));
        assert_eq!(a.chunk, b.chunk);
        assert_eq!(a.heightmap, b.heightmap);
        assert_eq!(a.deferred, b.deferred);
    }

    #[test]
    fn test_generation_independent_of_order() {
        let gen = generator(77);
        let first = gen.generate(ChunkPos::new(1, 1));
        for x in -2..2 {
            gen.generate(ChunkPos::new(x, -x));
        }
        let again = gen.generate(ChunkPos::new(1, 1));
        assert_eq!(first.chunk, again.chunk);

        let fresh = generator(77).generate(ChunkPos::new(1, 1));
        assert_eq!(first.chunk, fresh.chunk);
    }

    #[test]
    fn test_different_seeds() {
        let a = generator(1).generate(ChunkPos::new(0, 0));
        let b = generator(2).generate(ChunkPos::new(0, 0));
        assert_ne!(a.heightmap, b.heightmap);
    }

    #[test]
    fn test_negative_coordinates() {
        let gen = generator(5);
        let out = gen.generate(ChunkPos::new(-4, -9));
        assert_eq!(out.chunk.position(), ChunkPos::new(-4, -9));
        assert!(out.chunk.get_block(0, 0, 0).kind() == BlockType::Bedrock);
    }

    #[test]
    fn test_heightmap_matches_column_samples() {
        let gen = generator(31);
        let pos = ChunkPos::new(3, -1);
        let out = gen.generate(pos);
        let (ox, oz) = pos.world_origin();
        for i in 0..CHUNK_SIZE {
            assert_eq!(out.heightmap.get(i, i), gen.surface_height(ox + i as i32, oz + i as i32));
            assert_eq!(out.heightmap.biome(i, 0), gen.column(ox + i as i32, oz).dominant);
        }
    }

    #[test]
    fn test_surface_block_light() {
        let gen = generator(8);
        let out = gen.generate(ChunkPos::new(0, 0));
        for x in 0..CHUNK_SIZE as i32 {
            for z in 0..CHUNK_SIZE as i32 {
                let top = out.chunk.top_solid_y(x, z).expect("bedrock is solid");
                assert_eq!(out.chunk.get_block(x, top, z).light(), MAX_LIGHT);
                if top > 10 {
                    assert_eq!(out.chunk.get_block(x, top - 10, z).light(), 0);
                }
            }
        }
    }

    #[test]
    fn test_only_grass_is_tinted() {
        let gen = generator(3);
        let out = gen.generate(ChunkPos::new(2, 2));
        for x in 0..CHUNK_SIZE as i32 {
            for z in 0..CHUNK_SIZE as i32 {
                for y in 0..CHUNK_HEIGHT as i32 {
                    let record = out.chunk.get_block(x, y, z);
                    if !matches!(record.kind(), BlockType::Grass | BlockType::Leaves) {
                        assert_eq!(record.tint, Tint::WHITE);
                    }
                }
            }
        }
    }

    #[test]
    fn test_deferred_writes_leave_chunk() {
        let gen = generator(2024);
        for cx in -6..6 {
            let pos = ChunkPos::new(cx, 3);
            for write in gen.generate(pos).deferred {
                assert_ne!(write.owner(), pos);
            }
        }
    }
}
