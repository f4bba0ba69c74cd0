//! Arena Generator entry point
//!
//! Builds an arena into an in-memory sink and prints what was placed.
//!
//! Usage: `arena-generator [CONFIG.json] [--dump PLACEMENTS.json]`
//! Without a config the default three-piece arena is built.

use std::process::ExitCode;

use arena_generator::arena::ThreePieceArena;
use arena_generator::sink::MemorySink;
use arena_generator::{ArenaConfig, ArenaGenerator};

fn main() -> ExitCode {
    env_logger::init();

    let mut config_path = None;
    let mut dump_path = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dump" => dump_path = args.next(),
            _ => config_path = Some(arg),
        }
    }

    let config = match &config_path {
        Some(path) => match ArenaConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            log::info!("No config given, building the default three-piece arena");
            ThreePieceArena::default().to_config()
        }
    };

    let mut generator = ArenaGenerator::new(config, MemorySink::new());
    let report = generator.generate_arena();

    if let Some(params) = generator.params() {
        println!(
            "{:?}: {} sides, radius {:.1}, apothem {:.1}, side {:.1}, {} tiles/side, {}x{} grid",
            params.policy,
            params.arena_sides,
            params.inscribed_radius,
            params.apothem,
            params.side_length,
            params.tiles_per_arena_side,
            params.arena_dimensions,
            params.arena_dimensions
        );
    }
    let ctx = generator.context();
    log::debug!(
        "origin {} last mesh {:?} last tiles/side {:?} last position {:?} groups {:?}",
        ctx.origin_offset,
        ctx.previous_mesh_size,
        ctx.previous_tiles_per_side,
        ctx.previous_last_position,
        ctx.used_groups.groups().collect::<Vec<_>>()
    );
    println!(
        "Placed {} ({} instanced, {} spawned), skipped {}, {} errors, {} warnings",
        report.placed,
        generator.sink().instance_count(),
        generator.sink().objects.len(),
        report.skipped,
        report.errors.len(),
        report.warnings.len()
    );

    if let Some(path) = dump_path {
        let dump = serde_json::to_string_pretty(generator.sink());
        match dump.map_err(|e| e.to_string()).and_then(|json| std::fs::write(&path, json).map_err(|e| e.to_string())) {
            Ok(()) => log::info!("Placements written to {path}"),
            Err(err) => {
                log::error!("Failed to write {path}: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    if report.is_clean() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
