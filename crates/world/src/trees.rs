//! Tree placement with cross-chunk spill-over.
//!
//! Trees are rooted only in columns of the chunk being generated. Blocks that land in a
//! neighboring chunk are returned as [`DeferredWrite`]s for that chunk.

use rand::Rng;
use voxelstream_core::{position_hash, scoped_rng, unit_hash, unit_hash_alt, SimTick};

use crate::biome::{BiomeTable, TreeShape};
use crate::block::{BlockRecord, BlockType, Tint, MAX_LIGHT};
use crate::chunk::{Chunk, CHUNK_HEIGHT, CHUNK_SIZE};
use crate::heightmap::Heightmap;
use crate::pending::DeferredWrite;

/// Columns whose position hash exceeds this never grow a tree.
const TREE_GATE: f32 = 0.01;
const LARGE_VARIANT_CHANCE: f64 = 0.1;
const MIN_GROUND_Y: i32 = 5;
const TOP_CLEARANCE: i32 = 20;

/// A tree rooted at a world position (the first trunk block).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tree {
    pub world_x: i32,
    pub world_y: i32,
    pub world_z: i32,
    pub shape: TreeShape,
    pub large: bool,
    pub trunk_height: i32,
}

impl Tree {
    /// Every block of the tree, trunk first, in a fixed order.
    pub fn blocks(&self) -> Vec<(i32, i32, i32, BlockType)> {
        let mut out = Vec::new();
        let trunk_width = if self.large { 2 } else { 1 };

        for dy in 0..self.trunk_height {
            for tx in 0..trunk_width {
                for tz in 0..trunk_width {
                    out.push((
                        self.world_x + tx,
                        self.world_y + dy,
                        self.world_z + tz,
                        BlockType::Log,
                    ));
                }
            }
        }

        match self.shape {
            TreeShape::Broadleaf => self.broadleaf_canopy(&mut out),
            TreeShape::Conifer => self.conifer_canopy(&mut out),
        }
        out
    }

    fn broadleaf_canopy(&self, out: &mut Vec<(i32, i32, i32, BlockType)>) {
        let radius: i32 = if self.large { 3 } else { 2 };
        let top = self.world_y + self.trunk_height;
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                for dz in -radius..=radius {
                    if dx.abs() + dy.abs() + dz.abs() > radius + 1 {
                        continue;
                    }
                    out.push((
                        self.world_x + dx,
                        top + dy,
                        self.world_z + dz,
                        BlockType::Leaves,
                    ));
                }
            }
        }
    }

    fn conifer_canopy(&self, out: &mut Vec<(i32, i32, i32, BlockType)>) {
        let max_radius = if self.large { 3 } else { 2 };
        let top = self.world_y + self.trunk_height;
        // Layers taper from the crown down to two blocks above the ground.
        for y in (self.world_y + 2..=top).rev() {
            let depth = top - y;
            let radius = ((depth + 1) / 2).min(max_radius);
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    if dx.abs() + dz.abs() > radius {
                        continue;
                    }
                    out.push((self.world_x + dx, y, self.world_z + dz, BlockType::Leaves));
                }
            }
        }
    }
}

/// Decides which columns of a chunk grow trees and writes them.
#[derive(Debug, Clone)]
pub struct TreePlanter {
    world_seed: u64,
}

impl TreePlanter {
    pub fn new(world_seed: u64) -> Self {
        Self { world_seed }
    }

    fn hash_seed(&self) -> i32 {
        self.world_seed as i32
    }

    /// Tree rooted at the world column, if one grows there.
    ///
    /// `ground` is the topmost solid block of the column and `above` the block on top of it.
    #[allow(clippy::too_many_arguments)]
    pub fn tree_at(
        &self,
        world_x: i32,
        world_z: i32,
        ground_y: i32,
        ground: BlockType,
        above: BlockType,
        biomes: &BiomeTable,
        heights: &Heightmap,
    ) -> Option<Tree> {
        let seed = self.hash_seed();
        if unit_hash(world_x, world_z, seed) > TREE_GATE {
            return None;
        }

        let lx = world_x.rem_euclid(CHUNK_SIZE as i32) as usize;
        let lz = world_z.rem_euclid(CHUNK_SIZE as i32) as usize;
        let biome = biomes.get(heights.biome(lx, lz));
        if biome.tree_density <= 0.0 || unit_hash_alt(world_x, world_z, seed) > biome.tree_density {
            return None;
        }

        if !(MIN_GROUND_Y..=CHUNK_HEIGHT as i32 - TOP_CLEARANCE).contains(&ground_y) {
            return None;
        }
        if !matches!(ground, BlockType::Grass | BlockType::Dirt) || !above.is_air() {
            return None;
        }

        let mut rng = scoped_rng(
            self.world_seed,
            position_hash(world_x, world_z, seed) as u64,
            SimTick::ZERO,
        );
        let large = rng.gen_bool(LARGE_VARIANT_CHANCE);
        let trunk_height = match (biome.tree_shape, large) {
            (TreeShape::Broadleaf, false) => rng.gen_range(5..8),
            (TreeShape::Broadleaf, true) => rng.gen_range(7..10),
            (TreeShape::Conifer, false) => rng.gen_range(6..10),
            (TreeShape::Conifer, true) => rng.gen_range(9..13),
        };

        Some(Tree {
            world_x,
            world_y: ground_y + 1,
            world_z,
            shape: biome.tree_shape,
            large,
            trunk_height,
        })
    }

    /// Plant every tree rooted in `chunk`. Writes outside the chunk are returned.
    ///
    /// Leaves take the tint of the grass they grow from.
    pub fn plant(
        &self,
        chunk: &mut Chunk,
        biomes: &BiomeTable,
        heights: &Heightmap,
    ) -> Vec<DeferredWrite> {
        let (origin_x, origin_z) = chunk.position().world_origin();
        let mut deferred = Vec::new();

        for lx in 0..CHUNK_SIZE as i32 {
            for lz in 0..CHUNK_SIZE as i32 {
                let Some(ground_y) = chunk.top_solid_y(lx, lz) else {
                    continue;
                };
                let ground = chunk.get_block(lx, ground_y, lz);
                let above = chunk.get_block(lx, ground_y + 1, lz);
                let world_x = origin_x + lx;
                let world_z = origin_z + lz;

                let Some(tree) = self.tree_at(
                    world_x,
                    world_z,
                    ground_y,
                    ground.kind(),
                    above.kind(),
                    biomes,
                    heights,
                ) else {
                    continue;
                };

                let leaf_tint = if ground.kind() == BlockType::Grass {
                    ground.tint
                } else {
                    biomes.get(heights.biome(lx as usize, lz as usize)).grass_tint
                };

                for (x, y, z, kind) in tree.blocks() {
                    let tint = if kind == BlockType::Leaves {
                        leaf_tint
                    } else {
                        Tint::WHITE
                    };
                    place(chunk, &mut deferred, x, y, z, kind, tint);
                }
            }
        }

        deferred
    }
}

/// Write into the chunk when the target is inside it (only onto Air), else defer.
fn place(
    chunk: &mut Chunk,
    deferred: &mut Vec<DeferredWrite>,
    world_x: i32,
    world_y: i32,
    world_z: i32,
    kind: BlockType,
    tint: Tint,
) {
    if !(0..CHUNK_HEIGHT as i32).contains(&world_y) {
        return;
    }
    let (origin_x, origin_z) = chunk.position().world_origin();
    let lx = world_x - origin_x;
    let lz = world_z - origin_z;

    if Chunk::is_inside(lx, world_y, lz) {
        if chunk.get_block(lx, world_y, lz).is_air() {
            chunk.set_record(lx, world_y, lz, BlockRecord::new(kind, tint, MAX_LIGHT));
        }
    } else {
        deferred.push(DeferredWrite::new(world_x, world_y, world_z, kind, tint));
    }
}
