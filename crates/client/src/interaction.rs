//! Block breaking and placing driven by pointer button edges.

use glam::{IVec3, Vec3};
use tracing::debug;
use voxelstream_render::{AtlasLookup, MeshResources};
use voxelstream_world::BlockType;

use crate::World;

/// Maximum edit distance from the eye, in blocks.
pub const DEFAULT_REACH: f32 = 5.0;

/// Button edges sampled for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerInput {
    /// Break button went down this frame.
    pub break_pressed: bool,
    /// Place button went down this frame.
    pub place_pressed: bool,
}

/// What an interaction did to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// No button edge this frame.
    Idle,
    /// A button was pressed but nothing editable was in reach.
    Missed,
    /// The block at this position became Air.
    Broke(IVec3),
    /// A block was placed at this position.
    Placed(IVec3),
}

/// Turns pointer edges plus a view ray into world edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockInteractor {
    /// Maximum distance of an editable block.
    pub reach: f32,
    /// Block type used for placement.
    pub place_kind: BlockType,
}

impl Default for BlockInteractor {
    fn default() -> Self {
        Self {
            reach: DEFAULT_REACH,
            place_kind: BlockType::Stone,
        }
    }
}

impl BlockInteractor {
    /// Apply this frame's edges. Breaking wins when both edges arrive together.
    pub fn apply<R, A>(
        &self,
        world: &mut World<R, A>,
        input: PointerInput,
        eye: Vec3,
        look: Vec3,
    ) -> InteractionOutcome
    where
        R: MeshResources,
        A: AtlasLookup,
    {
        if !input.break_pressed && !input.place_pressed {
            return InteractionOutcome::Idle;
        }
        let Some(hit) = world.raycast(eye, look, self.reach) else {
            return InteractionOutcome::Missed;
        };

        if input.break_pressed {
            if world.set_block_world(hit.block_pos, BlockType::Air) {
                debug!(pos = ?hit.block_pos, "block broken");
                return InteractionOutcome::Broke(hit.block_pos);
            }
            return InteractionOutcome::Missed;
        }

        let target = hit.place_pos();
        if !world.block_global(target.x, target.y, target.z).is_air() {
            return InteractionOutcome::Missed;
        }
        if world.set_block_world(target, self.place_kind) {
            debug!(pos = ?target, kind = ?self.place_kind, "block placed");
            InteractionOutcome::Placed(target)
        } else {
            InteractionOutcome::Missed
        }
    }
}
