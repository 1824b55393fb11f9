//! Landscape generator binary: runs the full pipeline for one seed.
//!
//! Usage: cargo run --release --bin generate_landscape -- [OPTIONS]
//!
//! Options:
//!   --config <FILE>       JSON GenerationConfig (defaults used when absent)
//!   --seed <SEED>         Override the run seed
//!   --size <CELLS>        Override grid width and height
//!   --mountain            Use the edge mountain base instead of fractal noise
//!   --output <FILE>       Write the entity ledger as JSON
//!   --save-config <FILE>  Write the effective configuration as JSON

use std::process::ExitCode;
use std::time::Instant;

use settlegen::grid::GridCoord;
use settlegen::generation::{ElevationSource, GenerationConfig, GenerationPipeline};
use settlegen::placement::EntityKind;
use settlegen::terrain::MountainParams;

fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Generation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> settlegen::core::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => GenerationConfig::load(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(seed) = parse_u64_arg(&args, "--seed") {
        config.seed = seed;
    }
    if let Some(size) = parse_usize_arg(&args, "--size") {
        resize(&mut config, size);
    }
    if args.iter().any(|a| a == "--mountain") {
        config.elevation = ElevationSource::Mountain(MountainParams::default());
    }
    if let Some(path) = parse_str_arg(&args, "--save-config") {
        config.save(&path)?;
        println!("Config written to {}", path);
    }

    println!("=== Settlegen Landscape Generator ===");
    println!("Grid:  {} x {}", config.width, config.height);
    println!("World: {:?}", config.world_size);
    println!("Seed:  {}", config.seed);
    println!();

    let start = Instant::now();
    let landscape = GenerationPipeline::new(config)?.run()?;

    if let Some(path) = &landscape.primary_path {
        println!("Primary road: {} cells, cost {:.1}", path.len(), path.cost);
    }
    if let Some(river) = &landscape.river {
        println!("River: {} nodes, {:.1} cells long", river.nodes.len(), river.total_length());
    }
    if let Some(roads) = &landscape.roads {
        println!("Roads: {} nodes, {:.1} cells long", roads.nodes.len(), roads.total_length());
    }
    for kind in EntityKind::ALL {
        println!("  {:<6} {}", kind.name(), landscape.entities.count(kind));
    }
    for warning in &landscape.warnings {
        println!(
            "  warning: {} placed {}/{} ({:.0}%)",
            warning.stage,
            warning.achieved,
            warning.requested,
            warning.fulfillment() * 100.0
        );
    }
    println!("Done in {:.2}s", start.elapsed().as_secs_f64());

    if let Some(path) = parse_str_arg(&args, "--output") {
        landscape.entities.save_json(&path)?;
        println!("Entities written to {}", path);
    }
    Ok(())
}

/// Square grid of `size` cells; the primary road is pulled inside it.
fn resize(config: &mut GenerationConfig, size: usize) {
    config.width = size;
    config.height = size;
    if let Some(road) = config.primary_road.as_mut() {
        let last = size.saturating_sub(1) as i32;
        let far = (size.saturating_sub(16) as i32).max(last / 2);
        road.start = GridCoord::new(road.start.x.clamp(0, last), road.start.y.clamp(0, last));
        road.end = GridCoord::new(far, far);
    }
}

fn parse_u64_arg(args: &[String], flag: &str) -> Option<u64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
