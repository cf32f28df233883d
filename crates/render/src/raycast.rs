//! Voxel raycasting using DDA (Digital Differential Analyzer) grid traversal.

use glam::{IVec3, Vec3};
use voxelstream_world::BlockLookup;

/// Origin nudge along the ray so rays starting on a grid line do not hit the boundary they sit on.
pub const RAY_EPSILON: f32 = 1e-5;

/// Result of a raycast against the voxel world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The position of the block that was hit (in block coordinates).
    pub block_pos: IVec3,
    /// The normal of the face the ray entered through.
    pub face_normal: IVec3,
    /// The distance from the ray origin to the entry point.
    pub distance: f32,
    /// World-space position of the entry point.
    pub hit_pos: Vec3,
}

impl RaycastHit {
    /// Cell adjacent to the hit face, where a placed block would go.
    pub fn place_pos(&self) -> IVec3 {
        self.block_pos + self.face_normal
    }
}

/// Performs a DDA raycast through the voxel world.
///
/// The starting voxel is never tested; each newly entered voxel is passed to `is_solid` and
/// the first solid one is returned. Returns `None` when the next boundary lies beyond
/// `max_distance`, or when `direction` is zero or not finite.
pub fn raycast<F>(
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    mut is_solid: F,
) -> Option<RaycastHit>
where
    F: FnMut(IVec3) -> bool,
{
    let direction = direction.try_normalize()?;
    let start = origin + direction * RAY_EPSILON;

    let mut voxel = start.floor().as_ivec3();

    // Direction to step in each axis (-1, 0, or 1)
    let step = IVec3::new(
        axis_step(direction.x),
        axis_step(direction.y),
        axis_step(direction.z),
    );

    // Distance along ray to cross one voxel in each axis
    let delta = Vec3::new(
        axis_delta(direction.x),
        axis_delta(direction.y),
        axis_delta(direction.z),
    );

    // Distance from origin to the first boundary in each axis
    let mut t_max = Vec3::new(
        first_boundary(start.x, voxel.x, direction.x),
        first_boundary(start.y, voxel.y, direction.y),
        first_boundary(start.z, voxel.z, direction.z),
    );

    loop {
        let t = t_max.min_element();
        if t > max_distance {
            return None;
        }

        let face_normal = if t_max.x <= t_max.y && t_max.x <= t_max.z {
            voxel.x += step.x;
            t_max.x += delta.x;
            IVec3::new(-step.x, 0, 0)
        } else if t_max.y <= t_max.z {
            voxel.y += step.y;
            t_max.y += delta.y;
            IVec3::new(0, -step.y, 0)
        } else {
            voxel.z += step.z;
            t_max.z += delta.z;
            IVec3::new(0, 0, -step.z)
        };

        if is_solid(voxel) {
            let distance = t + RAY_EPSILON;
            return Some(RaycastHit {
                block_pos: voxel,
                face_normal,
                distance,
                hit_pos: origin + direction * distance,
            });
        }
    }
}

/// [`raycast`] against a block lookup, treating every non-Air block as solid.
pub fn raycast_blocks<L: BlockLookup + ?Sized>(
    lookup: &L,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
) -> Option<RaycastHit> {
    raycast(origin, direction, max_distance, |pos| {
        lookup.is_solid(pos.x, pos.y, pos.z)
    })
}

fn axis_step(d: f32) -> i32 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}

fn axis_delta(d: f32) -> f32 {
    if d != 0.0 {
        (1.0 / d).abs()
    } else {
        f32::INFINITY
    }
}

fn first_boundary(start: f32, voxel: i32, d: f32) -> f32 {
    if d > 0.0 {
        ((voxel + 1) as f32 - start) / d
    } else if d < 0.0 {
        (voxel as f32 - start) / d
    } else {
        f32::INFINITY
    }
}
