//! Cross-chunk block writes waiting for their owning chunk.

use std::collections::{btree_map::Entry, BTreeMap};

use tracing::debug;

use crate::block::{BlockRecord, BlockType, Tint, MAX_LIGHT};
use crate::chunk::ChunkPos;

/// A block write whose target lies outside the chunk that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredWrite {
    pub world_x: i32,
    pub world_y: i32,
    pub world_z: i32,
    pub kind: BlockType,
    pub tint: Tint,
}

impl DeferredWrite {
    pub fn new(world_x: i32, world_y: i32, world_z: i32, kind: BlockType, tint: Tint) -> Self {
        Self {
            world_x,
            world_y,
            world_z,
            kind,
            tint,
        }
    }

    /// Chunk that owns the target column.
    pub fn owner(&self) -> ChunkPos {
        ChunkPos::containing(self.world_x, self.world_z)
    }

    /// Record written into the owning chunk.
    pub fn record(&self) -> BlockRecord {
        BlockRecord::new(self.kind, self.tint, MAX_LIGHT)
    }

    fn key(&self) -> (i32, i32, i32) {
        (self.world_x, self.world_y, self.world_z)
    }

    /// Whether `self` wins over `other` when both target the same position.
    ///
    /// Higher block kinds win (a log beats leaves); equal kinds fall back to the tint.
    pub fn outranks(&self, other: &DeferredWrite) -> bool {
        self.precedence() > other.precedence()
    }

    fn precedence(&self) -> (BlockType, [u32; 3]) {
        let [r, g, b] = self.tint.0;
        (self.kind, [r.to_bits(), g.to_bits(), b.to_bits()])
    }
}

type Bucket = BTreeMap<(i32, i32, i32), DeferredWrite>;

/// Store `write` in `bucket`, resolving a position clash by rank. Returns true for a new position.
fn insert_ranked(bucket: &mut Bucket, write: DeferredWrite) -> bool {
    match bucket.entry(write.key()) {
        Entry::Occupied(mut slot) => {
            if write.outranks(slot.get()) {
                slot.insert(write);
            }
            false
        }
        Entry::Vacant(slot) => {
            slot.insert(write);
            true
        }
    }
}

/// Collapse writes to one per position, in world-position order.
///
/// The result does not depend on the input order, so a chunk receives the same blocks no
/// matter which neighbor was generated first.
pub fn merge_writes<I>(writes: I) -> Vec<DeferredWrite>
where
    I: IntoIterator<Item = DeferredWrite>,
{
    let mut bucket = Bucket::new();
    for write in writes {
        insert_ranked(&mut bucket, write);
    }
    bucket.into_values().collect()
}

/// Deferred writes keyed by owning chunk, de-duplicated by world position.
///
/// One write is kept per position (see [`DeferredWrite::outranks`]), so a source chunk that is
/// evicted and regenerated re-emits the same writes without stacking duplicates.
#[derive(Debug, Default)]
pub struct PendingWrites {
    by_chunk: BTreeMap<ChunkPos, Bucket>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a write under its owning chunk. Returns false if the position was already taken.
    pub fn push(&mut self, write: DeferredWrite) -> bool {
        insert_ranked(self.by_chunk.entry(write.owner()).or_default(), write)
    }

    /// Remove and return every write owned by `pos`, in world-position order.
    pub fn take(&mut self, pos: ChunkPos) -> Vec<DeferredWrite> {
        self.by_chunk
            .remove(&pos)
            .map(|bucket| bucket.into_values().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.by_chunk.contains_key(&pos)
    }

    /// Number of writes waiting for `pos`.
    pub fn count_for(&self, pos: ChunkPos) -> usize {
        self.by_chunk.get(&pos).map_or(0, BTreeMap::len)
    }

    /// Total number of stored writes.
    pub fn len(&self) -> usize {
        self.by_chunk.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_chunk.is_empty()
    }

    /// Number of chunks with at least one waiting write.
    pub fn chunk_count(&self) -> usize {
        self.by_chunk.len()
    }

    /// Drop buckets further than `radius` (Chebyshev, in chunks) from `center`.
    ///
    /// Returns the number of discarded writes.
    pub fn retain_within(&mut self, center: ChunkPos, radius: i32) -> usize {
        let mut discarded = 0;
        self.by_chunk.retain(|pos, bucket| {
            let keep = pos.chebyshev_distance(center) <= radius;
            if !keep {
                debug!(chunk = %pos, writes = bucket.len(), "discarding deferred writes");
                discarded += bucket.len();
            }
            keep
        });
        discarded
    }
}
