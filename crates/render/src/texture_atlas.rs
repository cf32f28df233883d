use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxelstream_world::{BlockCatalog, BlockFace, BlockType};

/// Invalid atlas layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AtlasError {
    /// The grid has no cells.
    #[error("atlas grid must have at least one column and one row (got {columns}x{rows})")]
    EmptyGrid {
        /// Columns requested.
        columns: u16,
        /// Rows requested.
        rows: u16,
    },
    /// A block definition references a tile the atlas does not contain.
    #[error("{kind:?} {face:?} uses tile {tile}, but the atlas only holds {capacity} tiles")]
    TileOutOfRange {
        /// Block type whose definition is at fault.
        kind: BlockType,
        /// Face referencing the tile.
        face: BlockFace,
        /// Offending tile index.
        tile: u16,
        /// Number of tiles in the atlas.
        capacity: u32,
    },
}

/// Normalized texture rectangle inside the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvRect {
    /// Left edge.
    pub u0: f32,
    /// Top edge.
    pub v0: f32,
    /// Right edge.
    pub u1: f32,
    /// Bottom edge.
    pub v1: f32,
}

/// Maps an atlas tile index to its UV rectangle.
///
/// Implemented by whatever owns the loaded texture; the mesher only needs the lookup.
pub trait AtlasLookup {
    /// UV bounds of `tile`.
    fn tile_uv(&self, tile: u16) -> UvRect;
}

/// Uniform grid atlas, tiles numbered row-major from the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridAtlas {
    columns: u16,
    rows: u16,
}

impl GridAtlas {
    /// Create a grid atlas with the given layout.
    pub fn new(columns: u16, rows: u16) -> Result<Self, AtlasError> {
        if columns == 0 || rows == 0 {
            return Err(AtlasError::EmptyGrid { columns, rows });
        }
        Ok(Self { columns, rows })
    }

    /// The classic 16x16 terrain atlas.
    pub fn standard() -> Self {
        Self {
            columns: 16,
            rows: 16,
        }
    }

    /// Number of tiles in the grid.
    pub fn capacity(&self) -> u32 {
        self.columns as u32 * self.rows as u32
    }

    /// Check that every face of every block maps to a tile inside the grid.
    pub fn validate_catalog(&self, catalog: &BlockCatalog) -> Result<(), AtlasError> {
        for kind in BlockType::ALL.into_iter().filter(|k| !k.is_air()) {
            let def = catalog.definition(kind);
            for face in BlockFace::ALL {
                let tile = def.tile_for(face);
                if tile as u32 >= self.capacity() {
                    return Err(AtlasError::TileOutOfRange {
                        kind,
                        face,
                        tile,
                        capacity: self.capacity(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for GridAtlas {
    fn default() -> Self {
        Self::standard()
    }
}

impl AtlasLookup for GridAtlas {
    fn tile_uv(&self, tile: u16) -> UvRect {
        // Out-of-range tiles wrap instead of sampling outside the texture.
        let tile = tile as u32 % self.capacity();
        let col = tile % self.columns as u32;
        let row = tile / self.columns as u32;
        let w = 1.0 / self.columns as f32;
        let h = 1.0 / self.rows as f32;
        UvRect {
            u0: col as f32 * w,
            v0: row as f32 * h,
            u1: (col + 1) as f32 * w,
            v1: (row + 1) as f32 * h,
        }
    }
}
