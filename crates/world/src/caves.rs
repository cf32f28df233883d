//! Cave carving: room clusters and branching tunnels.
//!
//! Every origin chunk within [`CAVE_REACH`] seeds its own RNG from its world position, and
//! the whole cave is replayed for each target chunk with carving clipped to that chunk. The
//! result does not depend on which chunk is generated first.

use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};

use rand::rngs::StdRng;
use rand::Rng;
use voxelstream_core::{origin_seed, scoped_rng, SimTick};

use crate::block::BlockRecord;
use crate::chunk::{Chunk, ChunkPos, CHUNK_HEIGHT, CHUNK_SIZE};

/// Radius (in chunks) of origins whose caves may reach a target chunk.
pub const CAVE_REACH: i32 = 3;

const MAX_ATTEMPTS: u32 = 5;
const ATTEMPT_CHANCE: f64 = 0.14;
const ROOM_CLUSTER_CHANCE: f64 = 0.25;
const BRANCH_CHANCE: f64 = 0.05;
const MAX_BRANCHES: usize = 3;
const MAIN_AMPLITUDE: f32 = 1.5;
const BRANCH_AMPLITUDE: f32 = 1.0;
/// Tunnels never descend below this y, keeping the bedrock floor intact.
const MIN_CARVE_Y: i32 = 1;

/// One tunnel walk waiting to run.
#[derive(Debug, Clone, Copy)]
struct Walk {
    x: f32,
    y: f32,
    z: f32,
    yaw: f32,
    pitch: f32,
    nodes: u32,
    amplitude: f32,
    may_branch: bool,
}

/// Carves caves into freshly filled chunks.
#[derive(Debug, Clone)]
pub struct CaveGenerator {
    world_seed: u64,
}

impl CaveGenerator {
    pub fn new(world_seed: u64) -> Self {
        Self { world_seed }
    }

    /// Carve every cave that reaches `chunk`. Returns the number of blocks turned to Air.
    pub fn carve(&self, chunk: &mut Chunk) -> usize {
        let target = chunk.position();
        let mut carved = 0;

        for dx in -CAVE_REACH..=CAVE_REACH {
            for dz in -CAVE_REACH..=CAVE_REACH {
                let origin = ChunkPos::new(target.x + dx, target.z + dz);
                carved += self.carve_from_origin(chunk, origin);
            }
        }

        carved
    }

    fn origin_rng(&self, origin: ChunkPos) -> StdRng {
        let (ox, oz) = origin.world_origin();
        scoped_rng(
            self.world_seed,
            origin_seed(ox, oz, self.world_seed as i32),
            SimTick::ZERO,
        )
    }

    fn carve_from_origin(&self, chunk: &mut Chunk, origin: ChunkPos) -> usize {
        let mut rng = self.origin_rng(origin);
        let (ox, oz) = origin.world_origin();
        let attempts = rng.gen_range(0..MAX_ATTEMPTS);
        let mut carved = 0;

        for _ in 0..attempts {
            if rng.gen::<f64>() >= ATTEMPT_CHANCE {
                continue;
            }
            let x = (ox + rng.gen_range(0..CHUNK_SIZE as i32)) as f32;
            let y = rng.gen_range(8..CHUNK_HEIGHT as i32 - 8) as f32;
            let z = (oz + rng.gen_range(0..CHUNK_SIZE as i32)) as f32;

            if rng.gen::<f64>() < ROOM_CLUSTER_CHANCE {
                carved += carve_room_cluster(chunk, x, y, z, &mut rng);
            } else {
                let walk = Walk {
                    x,
                    y,
                    z,
                    yaw: rng.gen::<f32>() * TAU,
                    pitch: (rng.gen::<f32>() - 0.5) * PI * 0.5,
                    nodes: rng.gen_range(40..80),
                    amplitude: MAIN_AMPLITUDE,
                    may_branch: true,
                };
                carved += carve_tunnel(chunk, walk, &mut rng).0;
            }
        }

        carved
    }
}

/// A few overlapping rooms joined by short jumps.
fn carve_room_cluster(
    chunk: &mut Chunk,
    mut x: f32,
    mut y: f32,
    mut z: f32,
    rng: &mut StdRng,
) -> usize {
    let rooms = rng.gen_range(2..5);
    let mut carved = 0;

    for i in 0..rooms {
        let radius = 3.0 + rng.gen::<f32>() * 4.0;
        carved += carve_sphere(chunk, x, y, z, radius);

        if i < rooms - 1 {
            let angle = rng.gen::<f32>() * TAU;
            let distance = 10.0 + rng.gen::<f32>() * 15.0;
            x += angle.cos() * distance;
            z += angle.sin() * distance;
            y += (rng.gen::<f32>() - 0.5) * 5.0;
        }
    }

    carved
}

/// Run a tunnel and its branches from an explicit work-list.
///
/// Only the main walk may spawn branches, and at most [`MAX_BRANCHES`] of them.
/// Returns `(blocks carved, branches spawned)`.
fn carve_tunnel(chunk: &mut Chunk, main: Walk, rng: &mut StdRng) -> (usize, usize) {
    let mut work = VecDeque::from([main]);
    let mut branches = 0;
    let mut carved = 0;

    while let Some(mut walk) = work.pop_front() {
        let nodes = walk.nodes.max(1);
        for node in 0..nodes {
            let envelope = 1.5 + (node as f32 * PI / nodes as f32).sin() * walk.amplitude;
            let radius = envelope * (0.75 + rng.gen::<f32>() * 0.5);

            let horizontal = walk.pitch.cos();
            walk.x += walk.yaw.cos() * horizontal;
            walk.y += walk.pitch.sin();
            walk.z += walk.yaw.sin() * horizontal;
            walk.y = walk
                .y
                .clamp(MIN_CARVE_Y as f32, CHUNK_HEIGHT as f32 - 5.0);

            carved += carve_sphere(chunk, walk.x, walk.y, walk.z, radius);

            walk.yaw += (rng.gen::<f32>() - 0.5) * 0.3;
            walk.pitch *= 0.92;
            walk.pitch += (rng.gen::<f32>() - 0.5) * 0.2;
            walk.pitch = walk.pitch.clamp(-1.2, 1.2);

            if walk.may_branch && rng.gen::<f64>() < BRANCH_CHANCE && branches < MAX_BRANCHES {
                branches += 1;
                work.push_back(Walk {
                    yaw: walk.yaw + (rng.gen::<f32>() - 0.5) * PI,
                    pitch: (rng.gen::<f32>() - 0.5) * 0.5,
                    nodes: nodes / 4,
                    amplitude: BRANCH_AMPLITUDE,
                    may_branch: false,
                    ..walk
                });
            }
        }
    }

    (carved, branches)
}

/// Set every block within `radius` of the centre to Air, clipped to the chunk and to y >= 1.
fn carve_sphere(chunk: &mut Chunk, cx: f32, cy: f32, cz: f32, radius: f32) -> usize {
    let (base_x, base_z) = chunk.position().world_origin();

    let min_x = ((cx - radius).floor() as i32 - base_x).max(0);
    let max_x = ((cx + radius).ceil() as i32 - base_x).min(CHUNK_SIZE as i32 - 1);
    let min_z = ((cz - radius).floor() as i32 - base_z).max(0);
    let max_z = ((cz + radius).ceil() as i32 - base_z).min(CHUNK_SIZE as i32 - 1);
    let min_y = ((cy - radius).floor() as i32).max(MIN_CARVE_Y);
    let max_y = ((cy + radius).ceil() as i32).min(CHUNK_HEIGHT as i32 - 1);

    if min_x > max_x || min_z > max_z || min_y > max_y {
        return 0;
    }

    let radius_sq = radius * radius;
    let mut carved = 0;

    for lx in min_x..=max_x {
        for lz in min_z..=max_z {
            let dx = (base_x + lx) as f32 - cx;
            let dz = (base_z + lz) as f32 - cz;
            for y in min_y..=max_y {
                let dy = y as f32 - cy;
                if dx * dx + dy * dy + dz * dz > radius_sq {
                    continue;
                }
                if !chunk.get_block(lx, y, lz).is_air()
                    && chunk.set_record(lx, y, lz, BlockRecord::AIR)
                {
                    carved += 1;
                }
            }
        }
    }

    carved
}
