use anyhow::{Context, Result};
use glam::Vec3;
use tracing::{debug, info};
use voxelstream_client::{BlockInteractor, InteractionOutcome, PointerInput, World};
use voxelstream_core::SimTick;
use voxelstream_render::{GridAtlas, HeadlessMeshResources};
use voxelstream_testkit::{
    ChunkMeshMetric, EditMetrics, JsonlSink, MeshMetricSink, ReportSink, RunReport,
    RunReportBuilder, RunResult, StreamingMetrics, WorldEvent,
};
use voxelstream_world::{BiomeTable, BlockCatalog, TerrainGenerator};

use crate::config::AppConfig;

/// Eye height above the top face of the ground block.
const EYE_HEIGHT: f32 = 1.6;

type HeadlessWorld = World<HeadlessMeshResources, GridAtlas>;

/// Fly a viewer across the world, editing blocks along the way, and write metrics.
pub fn run(cfg: &AppConfig) -> Result<RunReport> {
    let atlas = GridAtlas::new(cfg.atlas.columns, cfg.atlas.rows).context("invalid atlas grid")?;
    let catalog = BlockCatalog::standard();
    atlas
        .validate_catalog(&catalog)
        .context("block catalog does not fit the atlas")?;

    let generator = TerrainGenerator::new(cfg.world.seed, BiomeTable::standard());
    let mut world = World::new(
        generator,
        catalog,
        atlas,
        HeadlessMeshResources::new(),
        cfg.streaming.clone(),
    )
    .context("invalid streaming config")?;

    let mut events = JsonlSink::create(&cfg.headless.events_path)
        .with_context(|| format!("failed to open {}", cfg.headless.events_path.display()))?;
    let interactor = BlockInteractor::default();
    let mut edits = EditMetrics::default();
    let mut tick = SimTick::ZERO;

    info!(
        seed = cfg.world.seed,
        ticks = cfg.headless.ticks,
        view_radius = cfg.streaming.view_radius,
        "starting headless flight"
    );

    for _ in 0..cfg.headless.ticks {
        let viewer = flight_position(&world, tick, cfg.headless.speed);
        world.update(viewer);

        let interval = cfg.headless.edit_interval;
        if interval > 0 && tick.0 > 0 && tick.0 % interval == 0 {
            let input = if (tick.0 / interval) % 2 == 1 {
                PointerInput {
                    break_pressed: true,
                    ..PointerInput::default()
                }
            } else {
                PointerInput {
                    place_pressed: true,
                    ..PointerInput::default()
                }
            };
            let look = Vec3::new(1.0, -1.0, 0.0);
            let outcome = interactor.apply(&mut world, input, viewer, look);
            record_edit(&mut events, &mut edits, tick, outcome)?;
        }

        tick = tick.advance(1);
    }

    let meshes = mesh_metrics(&world);
    MeshMetricSink::create(&cfg.headless.metrics_path)?.write(&meshes)?;

    let stats = world.stats();
    let streaming = StreamingMetrics {
        chunks_generated: stats.chunks_generated,
        meshes_built: stats.meshes_built,
        meshes_released: stats.meshes_released,
        chunks_evicted: stats.chunks_evicted,
        discarded_pending_writes: stats.discarded_pending_writes,
        active_chunks: world.active_count(),
    };
    let resources = world.resources();
    let balanced = resources.built_count() - resources.released_count()
        == resources.live_count() as u64;

    let report = RunReportBuilder::new("headless_flight", cfg.world.seed)
        .ticks(tick.0)
        .result(if balanced {
            RunResult::Pass
        } else {
            RunResult::Fail
        })
        .streaming(streaming)
        .edits(edits)
        .meshes(meshes)
        .build();
    ReportSink::create(&cfg.headless.report_path)?.write(&report)?;

    info!(
        generated = stats.chunks_generated,
        evicted = stats.chunks_evicted,
        meshes_built = stats.meshes_built,
        discarded_pending_writes = stats.discarded_pending_writes,
        "headless flight finished"
    );
    Ok(report)
}

/// Viewer position at `tick`: a straight eastward flight with a slow north-south weave,
/// hovering above the terrain.
fn flight_position(world: &HeadlessWorld, tick: SimTick, speed: f32) -> Vec3 {
    let t = tick.0 as f32;
    let x = 8.5 + t * speed;
    let z = 8.5 + (t * 0.01).sin() * 24.0;
    let ground = world.height_at(x.floor() as i32, z.floor() as i32);
    Vec3::new(x, ground as f32 + 1.0 + EYE_HEIGHT, z)
}

fn record_edit(
    events: &mut JsonlSink,
    edits: &mut EditMetrics,
    tick: SimTick,
    outcome: InteractionOutcome,
) -> Result<()> {
    let event = match outcome {
        InteractionOutcome::Broke(pos) => {
            edits.broken += 1;
            WorldEvent::BlockBroken {
                position: pos.to_array(),
            }
        }
        InteractionOutcome::Placed(pos) => {
            edits.placed += 1;
            WorldEvent::BlockPlaced {
                position: pos.to_array(),
            }
        }
        InteractionOutcome::Missed => {
            edits.misses += 1;
            WorldEvent::EditMissed
        }
        InteractionOutcome::Idle => return Ok(()),
    };
    debug!(tick = tick.0, kind = event.kind(), "edit");
    events.record(tick, event)
}

fn mesh_metrics(world: &HeadlessWorld) -> Vec<ChunkMeshMetric> {
    world
        .active_chunks_for_render()
        .map(|chunk| ChunkMeshMetric {
            chunk: [chunk.position.x, chunk.position.z],
            triangles: chunk.summary.triangles,
            hash: chunk.summary.hash.to_hex(),
        })
        .collect()
}
