//! Entry point for the tarot table demo.
//! Loads card art from disk, lays out a few stacks and runs a headless frame loop.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use asset::{AssetCatalog, AssetQuality, CardKind, FsAssetLoader};
use cache::ResourceCache;
use corelib::camera::Camera;
use corelib::{Vec2, Vec3, vec3};
use renderer::HeadlessRenderer;
use table::{CardInstance, StackSpec, Table, TableConfig, TableError, TickOutcome};

struct Args {
    assets: PathBuf,
    config: Option<PathBuf>,
    quality: AssetQuality,
    ticks: u32,
    seed: u64,
}

fn parse_args() -> Args {
    // Accept: --assets=DIR --config=FILE --quality=low|high --ticks=N --seed=N
    let mut args = Args {
        assets: PathBuf::from("public"),
        config: None,
        quality: AssetQuality::default(),
        ticks: 240,
        seed: 0x7a_2074,
    };
    for arg in std::env::args().skip(1) {
        if let Some(v) = arg.strip_prefix("--assets=") {
            args.assets = PathBuf::from(v);
        } else if let Some(v) = arg.strip_prefix("--config=") {
            args.config = Some(PathBuf::from(v));
        } else if let Some(v) = arg.strip_prefix("--quality=") {
            args.quality = AssetQuality::parse(v).unwrap_or_else(|| {
                log::warn!("Unknown quality '{}', falling back to high.", v);
                AssetQuality::High
            });
        } else if let Some(v) = arg.strip_prefix("--ticks=") {
            match v.parse::<u32>() {
                Ok(n) => args.ticks = n,
                Err(_) => log::warn!("Ignoring bad --ticks value '{}'.", v),
            }
        } else if let Some(v) = arg.strip_prefix("--seed=") {
            match v.parse::<u64>() {
                Ok(n) => args.seed = n,
                Err(_) => log::warn!("Ignoring bad --seed value '{}'.", v),
            }
        } else {
            log::warn!("Unknown argument '{}'.", arg);
        }
    }
    args
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args();
    let config = match &args.config {
        Some(path) => TableConfig::load(path)?,
        None => TableConfig::default(),
    };
    log::info!(
        "Starting tarot table. Assets: {} ({}), ticks={}, seed={}",
        args.assets.display(),
        args.quality.dir_name(),
        args.ticks,
        args.seed
    );

    let catalog = AssetCatalog::standard(&args.assets, args.quality);
    let cache = ResourceCache::new(FsAssetLoader::new(), catalog);
    let mut table = Table::new(cache, config, args.seed)?;
    let mut renderer = HeadlessRenderer::new();

    let deck = table.spawn_standard_deck("deck", CardKind::Tarot);
    let discard = table.spawn(
        StackSpec::deck("discard", CardKind::Tarot, Vec::new())
            .with_face_down(false)
            .with_position(vec3(1.0, 0.0, 0.0)),
    );
    table.spawn(
        StackSpec::single("reading", CardInstance::tarot(0))
            .with_position(vec3(-1.0, 0.0, 0.0)),
    );
    table.spawn(StackSpec::decorative("shelf", CardKind::Tarot).with_position(vec3(0.0, 0.0, -1.5)));

    let camera = Camera::new_perspective(
        vec3(0.0, 4.0, 3.0),
        Vec3::ZERO,
        Vec3::Y,
        45f32.to_radians(),
        0.1,
        100.0,
        16.0 / 9.0,
    );

    for frame in 0..args.ticks {
        for (id, outcome) in table.tick(&mut renderer) {
            match outcome {
                TickOutcome::Applied { generation } => {
                    log::debug!("{:?} applied update #{}", id, generation)
                }
                TickOutcome::Failed { generation, error } => {
                    log::warn!("{:?} update #{} failed: {}", id, generation, error)
                }
                TickOutcome::Waiting { .. } | TickOutcome::Idle => {}
            }
        }

        // Sweep the cursor across the table.
        let t = frame as f32 / args.ticks.max(1) as f32;
        let ray = camera.ray_from_ndc(Vec2::new(t * 2.0 - 1.0, -0.2));
        let hovered = table.hover(&ray);
        if !hovered.is_empty() {
            log::trace!("frame {}: hovering {:?}", frame, hovered);
        }

        if frame % 30 == 29 {
            match table.transfer_top(deck, discard) {
                Ok(()) => log::info!("Dealt a card onto the discard pile."),
                Err(TableError::Stack(err)) => log::debug!("Deal skipped: {}", err),
                Err(err) => return Err(err.into()),
            }
        }

        std::thread::sleep(Duration::from_millis(16));
    }

    let stats = table.cache().stats();
    log::info!(
        "Cache: {} resident, {} loads started, {} completed, {} failed, {} evictions",
        table.cache().len(),
        stats.loads_started,
        stats.loads_completed,
        stats.loads_failed,
        stats.evictions
    );
    log::info!(
        "Scene: {} primitives, {} triangles",
        renderer.attached_count(),
        renderer.triangle_count()
    );

    table.clear(&mut renderer);
    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
