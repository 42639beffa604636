#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a vector race from a TOML race file.

mod input;
mod race_file;
mod report;
mod track_file;

use std::{
    io::{self, Write},
    path::PathBuf,
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use vector_race_core::{Command, Controller, TurnPhase};
use vector_race_system_pilot::Pilot;
use vector_race_system_turns::TurnEngine;
use vector_race_world::{self as world, query, World};

use crate::race_file::RaceFile;

/// Runs a turn-based vector race on a grid track.
#[derive(Debug, Parser)]
#[command(name = "vector-race", version, about)]
struct Cli {
    /// Race description in TOML.
    race: PathBuf,
    /// Overrides the track named by the race file.
    #[arg(long)]
    track: Option<PathBuf>,
    /// Overrides the race file's turn limit.
    #[arg(long)]
    turn_limit: Option<u64>,
    /// Pause between turns, in milliseconds.
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
    /// Prints the board after every turn.
    #[arg(long)]
    show_board: bool,
    /// Prints the final race state as JSON.
    #[arg(long)]
    snapshot: bool,
}

/// Entry point for the vector race command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let race = RaceFile::load(&cli.race)?;
    let track_path = cli.track.clone().unwrap_or_else(|| race.track.clone());
    let track = race.prepare_track(track_file::load(&track_path)?)?;
    let setups = race.setups(&track)?;
    let mut world = World::new(track, setups, race.race).context("failed to set up the race")?;
    let mut engine = TurnEngine::new(Pilot::new(race.pilot));
    let turn_limit = cli.turn_limit.unwrap_or(race.turn_limit);

    info!(
        "{} competitors on a {}x{} track, {} turns at most",
        query::competitor_view(&world).len(),
        query::track(&world).width(),
        query::track(&world).height(),
        turn_limit
    );

    run(&cli, &mut world, &mut engine, turn_limit)?;

    let snapshot = query::race_snapshot(&world);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "{}", report::board(&world))?;
    writeln!(out, "{}", report::summary(&snapshot))?;
    if cli.snapshot {
        writeln!(
            out,
            "{}",
            serde_json::to_string_pretty(&snapshot).context("failed to encode snapshot")?
        )?;
    }
    Ok(())
}

fn run(cli: &Cli, world: &mut World, engine: &mut TurnEngine, turn_limit: u64) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut prompt = io::stdout();
    let mut events = Vec::new();

    while query::turns_resolved(world) < turn_limit && query::phase(world) != TurnPhase::Finished
    {
        let current = query::current_competitor(world);
        if current.controller == Controller::Human {
            let acceleration = input::read_acceleration(&mut input, &mut prompt, &current)?;
            world::apply(
                world,
                Command::SelectAcceleration {
                    competitor: current.id,
                    acceleration,
                },
                &mut events,
            );
        }

        if !engine.advance_turn(world, &mut events) {
            break;
        }
        report::log_events(world, &events);
        events.clear();

        if cli.show_board {
            print!("{}", report::board(world));
        }
        if cli.delay_ms > 0 {
            thread::sleep(Duration::from_millis(cli.delay_ms));
        }
    }
    Ok(())
}
