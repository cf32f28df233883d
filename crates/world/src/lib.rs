//! Voxel world data model and deterministic procedural generation.

mod biome;
mod block;
mod caves;
mod chunk;
mod config;
mod heightmap;
mod noise;
mod pending;
mod terrain;
mod trees;

pub use crate::noise::{NoiseConfig, NoiseGenerator};
pub use biome::*;
pub use block::*;
pub use caves::*;
pub use chunk::*;
pub use config::*;
pub use heightmap::*;
pub use pending::*;
pub use terrain::*;
pub use trees::*;
