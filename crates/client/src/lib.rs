#![warn(missing_docs)]
//! World streaming controller and block interaction.

mod interaction;
mod streaming;

pub use interaction::{BlockInteractor, InteractionOutcome, PointerInput, DEFAULT_REACH};
pub use streaming::{MeshSummary, RenderChunk, StreamingStats, World};
