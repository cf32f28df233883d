//! Newline-delimited JSON log of what happened during a streaming run.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use voxelstream_core::SimTick;

/// Something worth recording while a world streams or gets edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WorldEvent {
    /// A generated chunk spilled feature blocks into its neighbors.
    SpillFound {
        /// Chunk coordinate `[x, z]` of the source.
        chunk: [i32; 2],
        /// Deferred writes it emitted.
        writes: usize,
    },
    /// Deferred writes were claimed by their owning chunk.
    WritesApplied {
        /// Chunk coordinate `[x, z]` of the owner.
        chunk: [i32; 2],
        /// Writes that landed on Air.
        applied: usize,
        /// Writes claimed.
        claimed: usize,
    },
    /// Every needed chunk around the viewer is generated and meshed.
    DeferredSettled {
        /// Viewer chunk `[x, z]`.
        viewer_chunk: [i32; 2],
        /// Deferred writes applied so far.
        deferred_applied: u64,
    },
    /// A block was broken through a raycast.
    BlockBroken {
        /// World position of the removed block.
        position: [i32; 3],
    },
    /// A block was placed against a hit face.
    BlockPlaced {
        /// World position of the new block.
        position: [i32; 3],
    },
    /// An edit found nothing within reach.
    EditMissed,
}

impl WorldEvent {
    /// Tag written in the `kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            WorldEvent::SpillFound { .. } => "SpillFound",
            WorldEvent::WritesApplied { .. } => "WritesApplied",
            WorldEvent::DeferredSettled { .. } => "DeferredSettled",
            WorldEvent::BlockBroken { .. } => "BlockBroken",
            WorldEvent::BlockPlaced { .. } => "BlockPlaced",
            WorldEvent::EditMissed => "EditMissed",
        }
    }
}

/// One line of an event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Tick the event happened on.
    pub tick: SimTick,
    /// What happened.
    #[serde(flatten)]
    pub event: WorldEvent,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    writer: BufWriter<File>,
    written: usize,
}

impl JsonlSink {
    /// Create a new log at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
            written: 0,
        })
    }

    /// Append `event` at `tick`.
    pub fn record(&mut self, tick: SimTick, event: WorldEvent) -> Result<()> {
        let line = serde_json::to_string(&EventRecord { tick, event })?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Events written so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

/// Parse an event log written by [`JsonlSink`].
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<EventRecord>> {
    fs::read_to_string(path)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str::<EventRecord>(line).map_err(anyhow::Error::from))
        .collect()
}
