use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use strata::assets;
use strata::{LocalRoom, StrataConfig, export_world};
use strata_blocks::BlockRegistry;
use strata_structures::{StructureDef, load_dir};

#[derive(Parser, Debug)]
#[command(name = "strata", about = "Headless chunked voxel world with peer sync")]
struct Cli {
    /// Path to strata.toml. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `[world] seed`.
    #[arg(long)]
    seed: Option<i32>,
    #[arg(long, default_value_t = 600)]
    frames: u32,
    /// Seconds per frame.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,
    /// Peers joined to the in-process room.
    #[arg(long, default_value_t = 1)]
    peers: usize,
    /// Write the first peer's world in the structure text format.
    #[arg(long)]
    export: Option<PathBuf>,
    /// Directory holding `assets/`.
    #[arg(long)]
    assets: Option<PathBuf>,
    /// Log filter, e.g. `debug` or `strata=trace,net=debug`.
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(level: Option<&str>) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    builder.init();
}

fn load_structures(root: &std::path::Path, reg: &BlockRegistry) -> Arc<[StructureDef]> {
    let dir = assets::structures_dir(root);
    if !dir.exists() {
        return Arc::from(Vec::new());
    }
    match load_dir(&dir, reg) {
        Ok(defs) => Arc::from(defs),
        Err(e) => {
            log::warn!("structures unavailable ({}): {}", dir.display(), e);
            Arc::from(Vec::new())
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = match &cli.config {
        Some(path) => StrataConfig::load(path)?,
        None => StrataConfig::default(),
    };
    if let Some(seed) = cli.seed {
        cfg.world.seed = seed;
    }

    let root = assets::resolve_assets_root(cli.assets.as_deref());
    let blocks = assets::blocks_path(&root);
    let reg = if blocks.exists() {
        BlockRegistry::load_from_path(&blocks)?
    } else {
        log::info!("no {}, using built-in blocks", blocks.display());
        BlockRegistry::builtin()?
    };
    let structures = load_structures(&root, &reg);
    log::info!(
        "seed {} render distance {} structures {}",
        cfg.world.seed,
        cfg.world.render_distance,
        structures.len()
    );

    let mut room = LocalRoom::new(cli.peers, &cfg, Arc::new(reg), structures)?;
    room.run_frames(cli.frames, cli.dt);
    for peer in room.peers() {
        log::info!(
            "peer {} seed {} owner {:?} {:?}",
            peer.id(),
            peer.seed(),
            peer.session().owner(),
            peer.scheduler().stats()
        );
    }

    if let Some(path) = &cli.export {
        if let Some(peer) = room.peers().first() {
            let text = export_world(peer);
            std::fs::write(path, text)?;
            log::info!("exported world to {}", path.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
