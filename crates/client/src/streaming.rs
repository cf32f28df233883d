//! Chunk streaming around a moving viewer.
//!
//! [`World`] owns every active chunk, the generation and mesh-rebuild queues and the store of
//! deferred writes waiting for chunks that do not exist yet. One call to [`World::update`] is
//! one tick: it enqueues what the viewer needs, generates and meshes within the configured
//! budgets and evicts what fell out of range.

use std::collections::{BTreeMap, HashSet, VecDeque};

use glam::{IVec3, Vec3};
use tracing::{debug, instrument, trace, warn};
use voxelstream_render::{
    build_chunk_mesh, raycast_blocks, AtlasLookup, MeshHash, MeshResources, RaycastHit,
};
use voxelstream_world::{
    merge_writes, world_to_local, BiomeKind, BlockCatalog, BlockLookup, BlockRecord, BlockType,
    Chunk, ChunkPos, ConfigError, DeferredWrite, DirtyFlags, GeneratedChunk, Heightmap,
    PendingWrites, StreamingConfig, TerrainGenerator, Tint, CHUNK_HEIGHT, CHUNK_SIZE, MAX_LIGHT,
};

/// De-duplicating FIFO of chunk coordinates.
#[derive(Debug, Default)]
struct WorkQueue {
    order: VecDeque<ChunkPos>,
    queued: HashSet<ChunkPos>,
}

impl WorkQueue {
    fn push_back(&mut self, pos: ChunkPos) -> bool {
        if !self.queued.insert(pos) {
            return false;
        }
        self.order.push_back(pos);
        true
    }

    /// Move `pos` to the front, inserting it if absent.
    fn push_front(&mut self, pos: ChunkPos) {
        if !self.queued.insert(pos) {
            self.order.retain(|queued| *queued != pos);
        }
        self.order.push_front(pos);
    }

    fn pop_front(&mut self) -> Option<ChunkPos> {
        let pos = self.order.pop_front()?;
        self.queued.remove(&pos);
        Some(pos)
    }

    fn contains(&self, pos: ChunkPos) -> bool {
        self.queued.contains(&pos)
    }

    fn retain<F: FnMut(ChunkPos) -> bool>(&mut self, mut keep: F) {
        let queued = &mut self.queued;
        self.order.retain(|pos| {
            let kept = keep(*pos);
            if !kept {
                queued.remove(pos);
            }
            kept
        });
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Counters accumulated across ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamingStats {
    /// Ticks run.
    pub ticks: u64,
    /// Chunks generated.
    pub chunks_generated: u64,
    /// Mesh builds handed to the resource layer.
    pub meshes_built: u64,
    /// Mesh handles released, on rebuild or eviction.
    pub meshes_released: u64,
    /// Chunks evicted.
    pub chunks_evicted: u64,
    /// Deferred writes that landed in a chunk.
    pub deferred_applied: u64,
    /// Deferred writes dropped because their chunk left the retention radius.
    pub discarded_pending_writes: u64,
}

/// Triangle count and hash of the mesh currently bound to a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshSummary {
    /// Triangles in the mesh.
    pub triangles: usize,
    /// Hash of the mesh buffers.
    pub hash: MeshHash,
}

struct ActiveChunk<H> {
    chunk: Chunk,
    heightmap: Heightmap,
    /// Writes this chunk's features spilled into neighbors, replayed when a neighbor regenerates.
    spilled: Vec<DeferredWrite>,
    mesh: Option<(H, MeshSummary)>,
}

/// Active chunks keyed by coordinate; the world-space block lookup used by meshing and raycasts.
struct ChunkMap<H> {
    chunks: BTreeMap<ChunkPos, ActiveChunk<H>>,
}

impl<H> BlockLookup for ChunkMap<H> {
    fn block_at(&self, x: i32, y: i32, z: i32) -> BlockRecord {
        if !(0..CHUNK_HEIGHT as i32).contains(&y) {
            return BlockRecord::AIR;
        }
        let (pos, lx, lz) = world_to_local(x, z);
        self.chunks
            .get(&pos)
            .map_or(BlockRecord::AIR, |active| active.chunk.get_block(lx, y, lz))
    }
}

/// Chunk ready to draw.
#[derive(Debug)]
pub struct RenderChunk<'a, H> {
    /// Chunk coordinate.
    pub position: ChunkPos,
    /// World-space origin of the chunk's local coordinates.
    pub origin: IVec3,
    /// Mesh handle issued by the resource layer.
    pub handle: &'a H,
    /// Mesh metadata.
    pub summary: MeshSummary,
}

/// Streaming voxel world.
pub struct World<R: MeshResources, A: AtlasLookup> {
    generator: TerrainGenerator,
    catalog: BlockCatalog,
    atlas: A,
    resources: R,
    config: StreamingConfig,
    active: ChunkMap<R::Handle>,
    generation_queue: WorkQueue,
    mesh_queue: WorkQueue,
    pending: PendingWrites,
    viewer_chunk: ChunkPos,
    stats: StreamingStats,
}

impl<R: MeshResources, A: AtlasLookup> World<R, A> {
    /// Create an empty world. Nothing is generated until the first [`World::update`].
    pub fn new(
        generator: TerrainGenerator,
        catalog: BlockCatalog,
        atlas: A,
        resources: R,
        config: StreamingConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            generator,
            catalog,
            atlas,
            resources,
            config,
            active: ChunkMap {
                chunks: BTreeMap::new(),
            },
            generation_queue: WorkQueue::default(),
            mesh_queue: WorkQueue::default(),
            pending: PendingWrites::new(),
            viewer_chunk: ChunkPos::new(0, 0),
            stats: StreamingStats::default(),
        })
    }

    /// Run one streaming tick for a viewer at `viewer` (world space).
    #[instrument(skip(self), fields(world_seed = self.generator.world_seed()))]
    pub fn update(&mut self, viewer: Vec3) {
        self.stats.ticks += 1;
        self.viewer_chunk =
            ChunkPos::containing(viewer.x.floor() as i32, viewer.z.floor() as i32);

        self.enqueue_needed();
        self.run_generation();
        self.run_mesh_rebuilds();
        self.evict_unneeded();

        trace!(
            viewer_chunk = %self.viewer_chunk,
            active = self.active.chunks.len(),
            generation_queue = self.generation_queue.len(),
            mesh_queue = self.mesh_queue.len(),
            pending = self.pending.len(),
            pending_chunks = self.pending.chunk_count(),
            "tick finished"
        );
    }

    fn is_needed(&self, pos: ChunkPos) -> bool {
        pos.chebyshev_distance(self.viewer_chunk) <= self.config.view_radius
    }

    /// Queue every needed, inactive coordinate, nearest rings first.
    fn enqueue_needed(&mut self) {
        let center = self.viewer_chunk;
        for ring in 0..=self.config.view_radius {
            for dz in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs().max(dz.abs()) != ring {
                        continue;
                    }
                    let pos = ChunkPos::new(center.x + dx, center.z + dz);
                    if !self.active.chunks.contains_key(&pos) {
                        self.generation_queue.push_back(pos);
                    }
                }
            }
        }
    }

    fn run_generation(&mut self) {
        let mut generated = 0;
        while generated < self.config.max_generations_per_tick {
            let Some(pos) = self.generation_queue.pop_front() else {
                break;
            };
            if !self.is_needed(pos) || self.active.chunks.contains_key(&pos) {
                continue;
            }
            self.generate_chunk(pos);
            generated += 1;
        }
    }

    fn generate_chunk(&mut self, pos: ChunkPos) {
        let GeneratedChunk {
            mut chunk,
            heightmap,
            deferred,
        } = self.generator.generate(pos);

        for write in &deferred {
            self.route_deferred(*write);
        }

        let held = self.pending.take(pos);
        chunk.queue_pending(merge_writes(held.into_iter().chain(self.spilled_into(pos))));
        let applied = chunk.apply_pending_writes();
        self.stats.deferred_applied += applied as u64;
        chunk.mark_dirty(DirtyFlags::BLOCKS);

        assert!(
            !self.active.chunks.contains_key(&pos),
            "chunk {pos} generated while already active"
        );
        self.active.chunks.insert(
            pos,
            ActiveChunk {
                chunk,
                heightmap,
                spilled: deferred,
                mesh: None,
            },
        );
        self.mesh_queue.push_back(pos);
        for neighbor in pos.neighbors() {
            self.dirty_neighbor(neighbor, false);
        }

        self.stats.chunks_generated += 1;
        debug!(chunk = %pos, deferred_applied = applied, "chunk activated");
    }

    /// Writes owned by `pos` that active neighbors emitted when they were generated.
    fn spilled_into(&self, pos: ChunkPos) -> Vec<DeferredWrite> {
        let mut writes = Vec::new();
        for dz in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                let source = ChunkPos::new(pos.x + dx, pos.z + dz);
                if let Some(active) = self.active.chunks.get(&source) {
                    writes.extend(active.spilled.iter().filter(|w| w.owner() == pos).copied());
                }
            }
        }
        writes
    }

    /// Apply a deferred write to its active owner, or hold it until the owner is generated.
    fn route_deferred(&mut self, write: DeferredWrite) {
        let owner = write.owner();
        match self.active.chunks.get_mut(&owner) {
            Some(target) => {
                target.chunk.queue_pending([write]);
                if target.chunk.apply_pending_writes() > 0 {
                    self.stats.deferred_applied += 1;
                    self.mesh_queue.push_back(owner);
                }
            }
            None => {
                self.pending.push(write);
            }
        }
    }

    fn dirty_neighbor(&mut self, pos: ChunkPos, urgent: bool) {
        let Some(active) = self.active.chunks.get_mut(&pos) else {
            return;
        };
        active.chunk.mark_dirty(DirtyFlags::NEIGHBOR);
        if urgent {
            self.mesh_queue.push_front(pos);
        } else {
            self.mesh_queue.push_back(pos);
        }
    }

    fn run_mesh_rebuilds(&mut self) {
        let mut rebuilt = 0;
        while rebuilt < self.config.max_mesh_rebuilds_per_tick {
            let Some(pos) = self.mesh_queue.pop_front() else {
                break;
            };
            let dirty = self
                .active
                .chunks
                .get(&pos)
                .is_some_and(|active| active.chunk.is_dirty());
            if !dirty {
                continue;
            }
            self.rebuild_mesh(pos);
            rebuilt += 1;
        }
    }

    fn rebuild_mesh(&mut self, pos: ChunkPos) {
        let Some(active) = self.active.chunks.get(&pos) else {
            return;
        };
        let buffers = build_chunk_mesh(&active.chunk, &self.active, &self.catalog, &self.atlas);
        let summary = MeshSummary {
            triangles: buffers.triangle_count(),
            hash: buffers.hash,
        };

        let Some(active) = self.active.chunks.get_mut(&pos) else {
            return;
        };
        let reasons = active.chunk.take_dirty();
        if let Some((old, _)) = active.mesh.take() {
            self.resources.release_mesh(old);
            self.stats.meshes_released += 1;
        }
        let handle = self.resources.build_mesh(&buffers);
        active.mesh = Some((handle, summary));
        self.stats.meshes_built += 1;
        debug!(chunk = %pos, triangles = summary.triangles, ?reasons, "chunk meshed");
    }

    fn evict_unneeded(&mut self) {
        let center = self.viewer_chunk;
        let radius = self.config.view_radius;
        let evicted: Vec<ChunkPos> = self
            .active
            .chunks
            .keys()
            .copied()
            .filter(|pos| pos.chebyshev_distance(center) > radius)
            .collect();

        for pos in evicted {
            let Some(active) = self.active.chunks.remove(&pos) else {
                continue;
            };
            if let Some((handle, _)) = active.mesh {
                self.resources.release_mesh(handle);
                self.stats.meshes_released += 1;
            }
            self.stats.chunks_evicted += 1;
            debug!(chunk = %pos, "chunk evicted");
        }

        self.mesh_queue.retain(|pos| pos.chebyshev_distance(center) <= radius);
        self.generation_queue
            .retain(|pos| pos.chebyshev_distance(center) <= radius);

        let discarded = self
            .pending
            .retain_within(center, self.config.retention_radius());
        if discarded > 0 {
            self.stats.discarded_pending_writes += discarded as u64;
            warn!(
                discarded,
                viewer_chunk = %center,
                "deferred writes dropped outside retention radius"
            );
        }
    }

    /// Drawable chunks with their mesh handles, in coordinate order.
    pub fn active_chunks_for_render(&self) -> impl Iterator<Item = RenderChunk<'_, R::Handle>> {
        self.active.chunks.iter().filter_map(|(pos, active)| {
            let (handle, summary) = active.mesh.as_ref()?;
            let (ox, oz) = pos.world_origin();
            Some(RenderChunk {
                position: *pos,
                origin: IVec3::new(ox, 0, oz),
                handle,
                summary: *summary,
            })
        })
    }

    /// Block at a world position; Air when unloaded or outside the height range.
    pub fn block_global(&self, x: i32, y: i32, z: i32) -> BlockRecord {
        self.active.block_at(x, y, z)
    }

    /// Edit a block in an active chunk. Returns whether anything changed.
    ///
    /// Edits against inactive chunks or out-of-range local positions are dropped. The chunk is
    /// moved to the front of the mesh queue; edits on a border also dirty the adjacent chunk.
    pub fn set_block(&mut self, chunk_pos: ChunkPos, local: IVec3, kind: BlockType) -> bool {
        if !Chunk::is_inside(local.x, local.y, local.z) {
            return false;
        }
        let (ox, oz) = chunk_pos.world_origin();
        let tint = self.tint_for(kind, ox + local.x, oz + local.z);
        let record = if kind.is_air() {
            BlockRecord::AIR
        } else {
            BlockRecord::new(kind, tint, MAX_LIGHT)
        };

        let Some(active) = self.active.chunks.get_mut(&chunk_pos) else {
            return false;
        };
        if !active.chunk.set_record(local.x, local.y, local.z, record) {
            return false;
        }
        self.mesh_queue.push_front(chunk_pos);

        let edge = CHUNK_SIZE as i32 - 1;
        if local.x == 0 {
            self.dirty_neighbor(ChunkPos::new(chunk_pos.x - 1, chunk_pos.z), true);
        } else if local.x == edge {
            self.dirty_neighbor(ChunkPos::new(chunk_pos.x + 1, chunk_pos.z), true);
        }
        if local.z == 0 {
            self.dirty_neighbor(ChunkPos::new(chunk_pos.x, chunk_pos.z - 1), true);
        } else if local.z == edge {
            self.dirty_neighbor(ChunkPos::new(chunk_pos.x, chunk_pos.z + 1), true);
        }
        true
    }

    /// [`World::set_block`] addressed by world coordinates.
    pub fn set_block_world(&mut self, pos: IVec3, kind: BlockType) -> bool {
        let (chunk_pos, lx, lz) = world_to_local(pos.x, pos.z);
        self.set_block(chunk_pos, IVec3::new(lx, pos.y, lz), kind)
    }

    fn tint_for(&self, kind: BlockType, world_x: i32, world_z: i32) -> Tint {
        match kind {
            BlockType::Grass | BlockType::Leaves => self.generator.column(world_x, world_z).tint,
            _ => Tint::WHITE,
        }
    }

    /// Topmost solid y of a column.
    ///
    /// Loaded columns reflect edits (and report -1 once dug out completely); unloaded columns
    /// fall back to the generator's surface height.
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        let (pos, lx, lz) = world_to_local(x, z);
        match self.active.chunks.get(&pos) {
            Some(active) => active.chunk.top_solid_y(lx, lz).unwrap_or(-1),
            None => self.generator.surface_height(x, z),
        }
    }

    /// Dominant biome of a column, from the cached heightmap when the chunk is loaded.
    pub fn biome_at(&self, x: i32, z: i32) -> BiomeKind {
        let (pos, lx, lz) = world_to_local(x, z);
        match self.active.chunks.get(&pos) {
            Some(active) => active.heightmap.biome(lx as usize, lz as usize),
            None => self.generator.biome_at(x, z),
        }
    }

    /// Cast a ray against the loaded blocks.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        raycast_blocks(&self.active, origin, direction, max_distance)
    }

    /// Whether `pos` is currently active.
    pub fn is_active(&self, pos: ChunkPos) -> bool {
        self.active.chunks.contains_key(&pos)
    }

    /// Whether `pos` is waiting for generation.
    pub fn is_queued_for_generation(&self, pos: ChunkPos) -> bool {
        self.generation_queue.contains(pos)
    }

    /// Whether the chunk at `pos` has changes not yet reflected in its mesh.
    pub fn is_dirty(&self, pos: ChunkPos) -> bool {
        self.active
            .chunks
            .get(&pos)
            .is_some_and(|active| active.chunk.is_dirty())
    }

    /// Coordinates of every active chunk, in order.
    pub fn active_positions(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.active.chunks.keys().copied()
    }

    /// Number of active chunks.
    pub fn active_count(&self) -> usize {
        self.active.chunks.len()
    }

    /// Deferred writes still waiting for their chunk.
    pub fn pending_writes(&self) -> &PendingWrites {
        &self.pending
    }

    /// Chunk containing the viewer as of the last update.
    pub fn viewer_chunk(&self) -> ChunkPos {
        self.viewer_chunk
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> StreamingStats {
        self.stats
    }

    /// Streaming parameters in use.
    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Generator driving this world.
    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    /// Mesh resource layer.
    pub fn resources(&self) -> &R {
        &self.resources
    }
}

impl<R: MeshResources, A: AtlasLookup> BlockLookup for World<R, A> {
    fn block_at(&self, x: i32, y: i32, z: i32) -> BlockRecord {
        self.block_global(x, y, z)
    }
}
