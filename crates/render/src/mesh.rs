use blake3::Hasher;
use voxelstream_world::{
    BlockCatalog, BlockFace, BlockLookup, BlockRecord, Chunk, Tint, CHUNK_HEIGHT, CHUNK_SIZE,
    MAX_LIGHT,
};

use crate::texture_atlas::{AtlasLookup, UvRect};

/// Directional light factor for the top face.
pub const LIGHT_TOP: f32 = 1.0;
/// Directional light factor for the bottom face.
pub const LIGHT_BOTTOM: f32 = 0.5;
/// Directional light factor for the north/south faces.
pub const LIGHT_Z: f32 = 0.8;
/// Directional light factor for the east/west faces.
pub const LIGHT_X: f32 = 0.7;
/// Lower bound on the skylight multiplier so unlit faces stay visible.
pub const SKYLIGHT_FLOOR: f32 = 0.2;
/// Ambient occlusion factor by number of solid occluders (0, 1, 2, 3+).
pub const AO_STEPS: [f32; 4] = [1.0, 0.85, 0.70, 0.55];

/// Triangle winding of every quad, relative to its first vertex.
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Hash of the combined vertex/index buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHash(pub [u8; 32]);

impl MeshHash {
    /// Lowercase hex rendering for logs and metrics.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Packed vertex layout produced by the mesher (8 floats).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Position in chunk-local coordinates.
    pub position: [f32; 3],
    /// Texture coordinates for atlas sampling.
    pub uv: [f32; 2],
    /// Tint x directional light x skylight x ambient occlusion.
    pub color: [f32; 3],
}

/// Output mesh buffers per chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuffers {
    /// Vertex buffer used for draw submission.
    pub vertices: Vec<MeshVertex>,
    /// Index buffer (triangle list).
    pub indices: Vec<u32>,
    /// Stable hash of the vertex + index buffers for cache comparisons.
    pub hash: MeshHash,
}

impl MeshBuffers {
    /// Construct an empty mesh (useful for initialization).
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            hash: MeshHash([0; 32]),
        }
    }

    /// Number of emitted quads.
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Number of emitted triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True when nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Build the mesh for `chunk`.
///
/// Neighbor visibility is resolved through `lookup`, so faces on the chunk border are culled
/// against loaded neighbors and emitted against unloaded ones.
pub fn build_chunk_mesh<L, A>(
    chunk: &Chunk,
    lookup: &L,
    catalog: &BlockCatalog,
    atlas: &A,
) -> MeshBuffers
where
    L: BlockLookup + ?Sized,
    A: AtlasLookup + ?Sized,
{
    let sampler = Sampler { chunk, lookup };
    let mut builder = MeshBuilder::new(catalog, atlas);

    for y in 0..CHUNK_HEIGHT as i32 {
        for z in 0..CHUNK_SIZE as i32 {
            for x in 0..CHUNK_SIZE as i32 {
                let record = chunk.get_block(x, y, z);
                if record.is_air() {
                    continue;
                }
                for face in BlockFace::ALL {
                    let [nx, ny, nz] = face.normal();
                    if sampler.solid(x + nx, y + ny, z + nz) {
                        continue;
                    }
                    let ao = match face {
                        BlockFace::Top => top_face_ao(&sampler, x, y, z),
                        _ => [side_face_ao(&sampler, face, x, y, z); 4],
                    };
                    builder.push_face(record, face, [x, y, z], ao);
                }
            }
        }
    }

    builder.finish()
}

/// Chunk-local block access that falls back to the global lookup across borders.
struct Sampler<'a, L: ?Sized> {
    chunk: &'a Chunk,
    lookup: &'a L,
}

impl<L: BlockLookup + ?Sized> Sampler<'_, L> {
    fn solid(&self, x: i32, y: i32, z: i32) -> bool {
        !self.block(x, y, z).is_air()
    }

    fn block(&self, x: i32, y: i32, z: i32) -> BlockRecord {
        if !(0..CHUNK_HEIGHT as i32).contains(&y) {
            return BlockRecord::AIR;
        }
        if Chunk::is_inside(x, y, z) {
            return self.chunk.get_block(x, y, z);
        }
        let (ox, oz) = self.chunk.position().world_origin();
        self.lookup.block_at(ox + x, y, oz + z)
    }
}

fn ao_factor(occluders: usize) -> f32 {
    AO_STEPS[occluders.min(AO_STEPS.len() - 1)]
}

/// Three fixed occluder offsets per non-top face, relative to the block.
fn side_occluders(face: BlockFace) -> [[i32; 3]; 3] {
    match face {
        BlockFace::Bottom => [[1, -1, 0], [-1, -1, 0], [0, -1, 1]],
        BlockFace::North => [[0, 1, -1], [1, 0, -1], [-1, 0, -1]],
        BlockFace::South => [[0, 1, 1], [1, 0, 1], [-1, 0, 1]],
        BlockFace::East => [[1, 1, 0], [1, 0, 1], [1, 0, -1]],
        BlockFace::West => [[-1, 1, 0], [-1, 0, 1], [-1, 0, -1]],
        BlockFace::Top => [[0, 2, 0]; 3],
    }
}

fn side_face_ao<L: BlockLookup + ?Sized>(
    sampler: &Sampler<'_, L>,
    face: BlockFace,
    x: i32,
    y: i32,
    z: i32,
) -> f32 {
    let count = side_occluders(face)
        .iter()
        .filter(|[dx, dy, dz]| sampler.solid(x + dx, y + dy, z + dz))
        .count();
    ao_factor(count)
}

/// Per-vertex AO for the top face, in corner order of [`face_corners`].
///
/// Each corner looks at its two edge neighbors and the diagonal one layer above the block.
/// Two solid edges fully occlude the corner whatever the diagonal holds.
fn top_face_ao<L: BlockLookup + ?Sized>(
    sampler: &Sampler<'_, L>,
    x: i32,
    y: i32,
    z: i32,
) -> [f32; 4] {
    let above = y + 1;
    face_corners(BlockFace::Top).map(|[cx, _, cz]| {
        let sx = if cx > 0.5 { 1 } else { -1 };
        let sz = if cz > 0.5 { 1 } else { -1 };
        let side1 = sampler.solid(x + sx, above, z);
        let side2 = sampler.solid(x, above, z + sz);
        if side1 && side2 {
            return AO_STEPS[3];
        }
        let corner = sampler.solid(x + sx, above, z + sz);
        ao_factor(side1 as usize + side2 as usize + corner as usize)
    })
}

/// Unit-cube corners of a face, counter-clockwise seen from outside.
fn face_corners(face: BlockFace) -> [[f32; 3]; 4] {
    match face {
        BlockFace::Top => [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]],
        BlockFace::Bottom => [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
        BlockFace::North => [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
        BlockFace::South => [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
        BlockFace::East => [[1.0, 0.0, 1.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0]],
        BlockFace::West => [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
    }
}

fn face_light(face: BlockFace) -> f32 {
    match face {
        BlockFace::Top => LIGHT_TOP,
        BlockFace::Bottom => LIGHT_BOTTOM,
        BlockFace::North | BlockFace::South => LIGHT_Z,
        BlockFace::East | BlockFace::West => LIGHT_X,
    }
}

struct MeshBuilder<'a, A: ?Sized> {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    catalog: &'a BlockCatalog,
    atlas: &'a A,
}

impl<'a, A: AtlasLookup + ?Sized> MeshBuilder<'a, A> {
    fn new(catalog: &'a BlockCatalog, atlas: &'a A) -> Self {
        Self {
            vertices: Vec::with_capacity(1024),
            indices: Vec::with_capacity(1024 * 6 / 4),
            catalog,
            atlas,
        }
    }

    fn push_face(&mut self, record: BlockRecord, face: BlockFace, origin: [i32; 3], ao: [f32; 4]) {
        let def = self.catalog.definition(record.kind());
        let tint = if def.is_tinted(face) {
            record.tint
        } else {
            Tint::WHITE
        };
        let skylight = (record.light() as f32 / MAX_LIGHT as f32).max(SKYLIGHT_FLOOR);
        let base = tint.scaled(face_light(face) * skylight);
        let uvs = corner_uvs(self.atlas.tile_uv(def.tile_for(face)));

        let first = self.vertices.len() as u32;
        for ((corner, uv), occlusion) in face_corners(face).into_iter().zip(uvs).zip(ao) {
            let [r, g, b] = base.scaled(occlusion).0;
            self.vertices.push(MeshVertex {
                position: [
                    origin[0] as f32 + corner[0],
                    origin[1] as f32 + corner[1],
                    origin[2] as f32 + corner[2],
                ],
                uv,
                color: [r, g, b],
            });
        }
        self.indices.extend(QUAD_INDICES.iter().map(|i| first + i));
    }

    fn finish(self) -> MeshBuffers {
        let MeshBuilder {
            vertices, indices, ..
        } = self;
        let mut hasher = Hasher::new();
        hasher.update(bytemuck::cast_slice(&vertices));
        hasher.update(bytemuck::cast_slice(&indices));
        MeshBuffers {
            vertices,
            indices,
            hash: MeshHash(*hasher.finalize().as_bytes()),
        }
    }
}

/// Corner UVs matching [`face_corners`]: the first two corners sit on the tile's bottom edge.
fn corner_uvs(rect: UvRect) -> [[f32; 2]; 4] {
    [
        [rect.u0, rect.v1],
        [rect.u1, rect.v1],
        [rect.u1, rect.v0],
        [rect.u0, rect.v0],
    ]
}
