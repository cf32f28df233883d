use std::fmt;

use crate::block::{BlockRecord, BlockType, Tint};
use crate::pending::DeferredWrite;

/// Chunk width and depth (X and Z axes) in voxels.
pub const CHUNK_SIZE: usize = 16;
/// Chunk height (Y axis) in voxels.
pub const CHUNK_HEIGHT: usize = 128;
/// Total voxel count per chunk.
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_HEIGHT * CHUNK_SIZE;

/// Chunk coordinate (X,Z) in chunk space.
/// Implements Ord for deterministic iteration in BTreeMap/BTreeSet (sorts by x, then z).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk that owns the given world column.
    pub fn containing(world_x: i32, world_z: i32) -> Self {
        Self {
            x: world_x.div_euclid(CHUNK_SIZE as i32),
            z: world_z.div_euclid(CHUNK_SIZE as i32),
        }
    }

    /// World coordinates of local `(0, 0)`.
    pub fn world_origin(self) -> (i32, i32) {
        (self.x * CHUNK_SIZE as i32, self.z * CHUNK_SIZE as i32)
    }

    /// The four orthogonal neighbors (-X, +X, -Z, +Z).
    pub fn neighbors(self) -> [ChunkPos; 4] {
        [
            ChunkPos::new(self.x - 1, self.z),
            ChunkPos::new(self.x + 1, self.z),
            ChunkPos::new(self.x, self.z - 1),
            ChunkPos::new(self.x, self.z + 1),
        ]
    }

    /// Square-neighborhood distance in chunks.
    pub fn chebyshev_distance(self, other: ChunkPos) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Split a world column into its owning chunk and local offsets.
pub fn world_to_local(world_x: i32, world_z: i32) -> (ChunkPos, i32, i32) {
    (
        ChunkPos::containing(world_x, world_z),
        world_x.rem_euclid(CHUNK_SIZE as i32),
        world_z.rem_euclid(CHUNK_SIZE as i32),
    )
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    /// Reasons a chunk mesh is stale.
    pub struct DirtyFlags: u8 {
        /// The chunk's own blocks changed.
        const BLOCKS = 0b0000_0001;
        /// A neighbor changed along the shared border.
        const NEIGHBOR = 0b0000_0010;
    }
}

impl Default for DirtyFlags {
    fn default() -> Self {
        DirtyFlags::empty()
    }
}

/// Dense voxel storage for one chunk coordinate.
#[derive(Debug, Clone)]
pub struct Chunk {
    position: ChunkPos,
    blocks: Vec<BlockRecord>,
    dirty: DirtyFlags,
    pending: Vec<DeferredWrite>,
}

impl Chunk {
    pub fn new(position: ChunkPos) -> Self {
        Self {
            position,
            blocks: vec![BlockRecord::AIR; CHUNK_VOLUME],
            dirty: DirtyFlags::empty(),
            pending: Vec::new(),
        }
    }

    pub fn position(&self) -> ChunkPos {
        self.position
    }

    /// Bounds predicate over local coordinates.
    #[inline]
    pub fn is_inside(x: i32, y: i32, z: i32) -> bool {
        (0..CHUNK_SIZE as i32).contains(&x)
            && (0..CHUNK_HEIGHT as i32).contains(&y)
            && (0..CHUNK_SIZE as i32).contains(&z)
    }

    #[inline]
    fn index(x: i32, y: i32, z: i32) -> usize {
        debug_assert!(Self::is_inside(x, y, z));
        ((y as usize * CHUNK_SIZE) + z as usize) * CHUNK_SIZE + x as usize
    }

    /// Read a block; anything outside the chunk reads as Air.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockRecord {
        if !Self::is_inside(x, y, z) {
            return BlockRecord::AIR;
        }
        self.blocks[Self::index(x, y, z)]
    }

    /// Write a block; out-of-range writes are ignored. Returns whether anything changed.
    pub fn set_block(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        kind: BlockType,
        tint: Tint,
        light: u8,
    ) -> bool {
        self.set_record(x, y, z, BlockRecord::new(kind, tint, light))
    }

    /// Record-level variant of [`Chunk::set_block`].
    pub fn set_record(&mut self, x: i32, y: i32, z: i32, record: BlockRecord) -> bool {
        if !Self::is_inside(x, y, z) {
            return false;
        }
        let idx = Self::index(x, y, z);
        if self.blocks[idx] == record {
            return false;
        }
        self.blocks[idx] = record;
        self.dirty.insert(DirtyFlags::BLOCKS);
        true
    }

    /// Topmost non-Air `y` in a local column.
    pub fn top_solid_y(&self, x: i32, z: i32) -> Option<i32> {
        (0..CHUNK_HEIGHT as i32)
            .rev()
            .find(|&y| !self.get_block(x, y, z).is_air())
    }

    /// Deferred writes waiting to be applied to this chunk.
    pub fn pending_writes(&self) -> &[DeferredWrite] {
        &self.pending
    }

    pub fn queue_pending<I>(&mut self, writes: I)
    where
        I: IntoIterator<Item = DeferredWrite>,
    {
        self.pending.extend(writes);
    }

    /// Drain the pending list, writing each entry only where the target is still Air.
    ///
    /// Returns the number of blocks actually placed.
    pub fn apply_pending_writes(&mut self) -> usize {
        let (origin_x, origin_z) = self.position.world_origin();
        let mut applied = 0;
        for write in std::mem::take(&mut self.pending) {
            let lx = write.world_x - origin_x;
            let lz = write.world_z - origin_z;
            if !Self::is_inside(lx, write.world_y, lz) {
                continue;
            }
            if self.get_block(lx, write.world_y, lz).is_air()
                && self.set_record(lx, write.world_y, lz, write.record())
            {
                applied += 1;
            }
        }
        applied
    }

    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty.insert(flags);
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Clear and return the dirty flags.
    pub fn take_dirty(&mut self) -> DirtyFlags {
        std::mem::take(&mut self.dirty)
    }

    #[cfg(test)]
    pub(crate) fn records(&self) -> &[BlockRecord] {
        &self.blocks
    }
}

impl PartialEq for Chunk {
    /// Chunks compare by coordinate and block content; bookkeeping is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position && self.blocks == other.blocks
    }
}
