//! Mesh snapshots and run reports exported by headless flights for CI comparison.
//!
//! A report captures the streaming counters and per-chunk mesh hashes of one run, so two runs
//! with the same seed and script can be diffed field by field.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Mesh snapshot of one active chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeshMetric {
    /// Chunk coordinate `[x, z]`.
    pub chunk: [i32; 2],
    /// Triangles in the chunk mesh.
    pub triangles: usize,
    /// Hex mesh hash.
    pub hash: String,
}

/// Top-level report written at the end of a headless run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier.
    pub run_name: String,

    /// World seed the run was generated from.
    pub world_seed: u64,

    /// Ticks simulated.
    pub ticks: u64,

    /// Overall outcome.
    pub result: RunResult,

    /// Streaming controller counters.
    pub streaming: StreamingMetrics,

    /// Block edits performed through raycasts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edits: Option<EditMetrics>,

    /// Final mesh snapshot of every active chunk.
    pub meshes: Vec<ChunkMeshMetric>,
}

/// Overall run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunResult {
    /// Every check passed.
    Pass,
    /// At least one check failed.
    Fail,
}

/// Counters accumulated by the streaming controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingMetrics {
    /// Chunks generated.
    pub chunks_generated: u64,

    /// Mesh builds performed.
    pub meshes_built: u64,

    /// Mesh handles released.
    pub meshes_released: u64,

    /// Chunks evicted.
    pub chunks_evicted: u64,

    /// Deferred writes dropped by the retention policy.
    pub discarded_pending_writes: u64,

    /// Chunks active at the end of the run.
    pub active_chunks: usize,
}

/// Edit counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditMetrics {
    /// Blocks broken.
    pub broken: u64,

    /// Blocks placed.
    pub placed: u64,

    /// Raycasts that found nothing in reach.
    pub misses: u64,
}

/// Builder for run reports.
pub struct RunReportBuilder {
    report: RunReport,
}

impl RunReportBuilder {
    /// Start a report for `run_name`.
    pub fn new(run_name: impl Into<String>, world_seed: u64) -> Self {
        Self {
            report: RunReport {
                run_name: run_name.into(),
                world_seed,
                ticks: 0,
                result: RunResult::Pass,
                streaming: StreamingMetrics::default(),
                edits: None,
                meshes: Vec::new(),
            },
        }
    }

    /// Set the tick count.
    pub fn ticks(mut self, ticks: u64) -> Self {
        self.report.ticks = ticks;
        self
    }

    /// Set the result.
    pub fn result(mut self, result: RunResult) -> Self {
        self.report.result = result;
        self
    }

    /// Set streaming counters.
    pub fn streaming(mut self, metrics: StreamingMetrics) -> Self {
        self.report.streaming = metrics;
        self
    }

    /// Set edit counters.
    pub fn edits(mut self, metrics: EditMetrics) -> Self {
        self.report.edits = Some(metrics);
        self
    }

    /// Set the mesh snapshot.
    pub fn meshes(mut self, meshes: Vec<ChunkMeshMetric>) -> Self {
        self.report.meshes = meshes;
        self
    }

    /// Finish the report.
    pub fn build(self) -> RunReport {
        self.report
    }
}

fn create_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

/// Writes the final per-chunk mesh snapshot as a JSON array.
pub struct MeshMetricSink {
    path: PathBuf,
}

impl MeshMetricSink {
    /// Create a sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        create_parent_dirs(&path)?;
        Ok(Self { path })
    }

    /// Write `metrics`, replacing any previous file.
    pub fn write(&self, metrics: &[ChunkMeshMetric]) -> Result<()> {
        write_pretty(&self.path, metrics)
    }

    /// Read a snapshot written by [`MeshMetricSink::write`].
    pub fn read(&self) -> Result<Vec<ChunkMeshMetric>> {
        Ok(serde_json::from_str(&fs::read_to_string(&self.path)?)?)
    }
}

/// Sink for writing run reports to JSON files.
pub struct ReportSink {
    path: PathBuf,
}

impl ReportSink {
    /// Create a sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        create_parent_dirs(&path)?;
        Ok(Self { path })
    }

    /// Write `report` as pretty JSON, replacing any previous file.
    pub fn write(&self, report: &RunReport) -> Result<()> {
        write_pretty(&self.path, report)
    }

    /// Location of the report file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
