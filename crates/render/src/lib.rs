#![warn(missing_docs)]
//! Chunk meshing, atlas mapping and voxel raycasting.
//!
//! Nothing here touches a GPU: meshes come out as plain vertex/index buffers and are handed to a
//! [`MeshResources`] implementation owned by the caller.

mod mesh;
mod raycast;
mod resources;
mod texture_atlas;

pub use mesh::{
    build_chunk_mesh, MeshBuffers, MeshHash, MeshVertex, AO_STEPS, LIGHT_BOTTOM, LIGHT_TOP,
    LIGHT_X, LIGHT_Z, SKYLIGHT_FLOOR,
};
pub use raycast::{raycast, raycast_blocks, RaycastHit, RAY_EPSILON};
pub use resources::{HeadlessMeshResources, LiveMesh, MeshHandle, MeshResources};
pub use texture_atlas::{AtlasError, AtlasLookup, GridAtlas, UvRect};
