use std::collections::HashMap;

use tracing::{debug, warn};

use crate::mesh::{MeshBuffers, MeshHash};

/// Build/release primitives supplied by whatever owns drawable geometry.
///
/// Handles are moved into [`MeshResources::release_mesh`], so a handle can only be released once.
pub trait MeshResources {
    /// Opaque handle to a built mesh.
    type Handle;

    /// Upload `buffers` and return a handle to the drawable.
    fn build_mesh(&mut self, buffers: &MeshBuffers) -> Self::Handle;

    /// Free the drawable behind `handle`.
    fn release_mesh(&mut self, handle: Self::Handle);
}

/// Handle issued by [`HeadlessMeshResources`]. Deliberately not `Clone`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(u64);

impl MeshHandle {
    /// Numeric id of the handle.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Bookkeeping for one live headless mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveMesh {
    /// Triangle count at upload.
    pub triangles: usize,
    /// Mesh hash at upload.
    pub hash: MeshHash,
}

/// Mesh resources that keep buffer metadata instead of uploading to a GPU.
#[derive(Debug, Default)]
pub struct HeadlessMeshResources {
    next_id: u64,
    live: HashMap<u64, LiveMesh>,
    built: u64,
    released: u64,
}

impl HeadlessMeshResources {
    /// Create an empty resource tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of meshes currently alive.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total meshes built.
    pub fn built_count(&self) -> u64 {
        self.built
    }

    /// Total meshes released.
    pub fn released_count(&self) -> u64 {
        self.released
    }

    /// Metadata for a live handle.
    pub fn get(&self, handle: &MeshHandle) -> Option<&LiveMesh> {
        self.live.get(&handle.0)
    }
}

impl MeshResources for HeadlessMeshResources {
    type Handle = MeshHandle;

    fn build_mesh(&mut self, buffers: &MeshBuffers) -> MeshHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.built += 1;
        self.live.insert(
            id,
            LiveMesh {
                triangles: buffers.triangle_count(),
                hash: buffers.hash,
            },
        );
        debug!(handle = id, triangles = buffers.triangle_count(), "mesh built");
        MeshHandle(id)
    }

    fn release_mesh(&mut self, handle: MeshHandle) {
        if self.live.remove(&handle.0).is_some() {
            self.released += 1;
            debug!(handle = handle.0, "mesh released");
        } else {
            warn!(handle = handle.0, "release of unknown mesh handle");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_release_track_counts() {
        let mut resources = HeadlessMeshResources::new();
        let a = resources.build_mesh(&MeshBuffers::empty());
        let b = resources.build_mesh(&MeshBuffers::empty());
        assert_ne!(a, b);
        assert_eq!(resources.live_count(), 2);
        assert_eq!(resources.get(&a).map(|m| m.triangles), Some(0));

        resources.release_mesh(a);
        assert_eq!(resources.live_count(), 1);
        assert_eq!(resources.built_count(), 2);
        assert_eq!(resources.released_count(), 1);
        assert!(resources.get(&b).is_some());
    }

    #[test]
    fn ids_are_never_reused() {
        let mut resources = HeadlessMeshResources::new();
        let a = resources.build_mesh(&MeshBuffers::empty());
        let first = a.id();
        resources.release_mesh(a);
        let b = resources.build_mesh(&MeshBuffers::empty());
        assert!(b.id() > first);
    }
}
