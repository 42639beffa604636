#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative race state management for the vector race engine.
//!
//! The [`World`] owns the track, the ordered list of competitors and the turn
//! state machine. Systems observe it through the [`query`] module and request
//! mutations exclusively through [`apply`].

mod checkpoints;
pub mod raster;
mod track;
mod turns;
mod validation;

pub use checkpoints::{select_target, CheckpointProgress, TargetWeights};
pub use track::{CheckpointInfo, Track, TrackError};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vector_race_core::{
    Acceleration, Command, CompetitorColor, CompetitorId, Controller, Event, Position, TurnPhase,
    Vector,
};

/// Tunable race rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Requires every checkpoint group to be crossed before a finish cell wins.
    pub finish_requires_all_checkpoints: bool,
}

/// Validated description of a competitor handed over when the race is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompetitorSetup {
    /// Display name.
    pub name: String,
    /// Appearance, opaque to the race rules.
    pub color: CompetitorColor,
    /// Who decides the competitor's accelerations.
    pub controller: Controller,
    /// Cell the competitor starts on.
    pub start: Position,
}

/// Reasons a race could not be assembled.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RaceError {
    /// A race needs at least one competitor.
    #[error("a race needs at least one competitor")]
    NoCompetitors,
    /// The competitor starts outside the grid.
    #[error("{name} starts at ({x}, {y}), outside of the track")]
    StartOutsideTrack {
        /// Name of the competitor.
        name: String,
        /// Requested start column.
        x: i32,
        /// Requested start row.
        y: i32,
    },
    /// The competitor starts on a wall.
    #[error("{name} starts on a wall at ({x}, {y})")]
    StartOnWall {
        /// Name of the competitor.
        name: String,
        /// Requested start column.
        x: i32,
        /// Requested start row.
        y: i32,
    },
    /// Two competitors share a start cell.
    #[error("{first} and {second} both start at ({x}, {y})")]
    SharedStart {
        /// Competitor listed first.
        first: String,
        /// Competitor listed second.
        second: String,
        /// Shared column.
        x: i32,
        /// Shared row.
        y: i32,
    },
}

#[derive(Clone, Debug)]
struct Competitor {
    id: CompetitorId,
    name: String,
    color: CompetitorColor,
    controller: Controller,
    position: Position,
    velocity: Vector,
    progress: CheckpointProgress,
    history: Vec<Position>,
    pending: Option<Acceleration>,
}

impl Competitor {
    fn from_setup(id: CompetitorId, setup: CompetitorSetup) -> Self {
        Self {
            id,
            name: setup.name,
            color: setup.color,
            controller: setup.controller,
            position: setup.start,
            velocity: Vector::ZERO,
            progress: CheckpointProgress::new(),
            history: vec![setup.start],
            pending: None,
        }
    }

    fn is_parked(&self) -> bool {
        self.velocity.is_zero()
    }
}

/// Represents the authoritative state of a single race.
#[derive(Clone, Debug)]
pub struct World {
    track: Track,
    config: RaceConfig,
    competitors: Vec<Competitor>,
    current: usize,
    phase: TurnPhase,
    winner: Option<CompetitorId>,
    turns_resolved: u64,
}

impl World {
    /// Assembles a race from a validated track and competitor list.
    ///
    /// Competitors take turns in the order provided and receive identifiers
    /// matching their index.
    pub fn new(
        track: Track,
        setups: Vec<CompetitorSetup>,
        config: RaceConfig,
    ) -> Result<Self, RaceError> {
        if setups.is_empty() {
            return Err(RaceError::NoCompetitors);
        }

        let mut starts: BTreeMap<Position, String> = BTreeMap::new();
        for setup in &setups {
            let (x, y) = (setup.start.x(), setup.start.y());
            if !track.contains(setup.start) {
                return Err(RaceError::StartOutsideTrack {
                    name: setup.name.clone(),
                    x,
                    y,
                });
            }
            if track.is_wall(setup.start) {
                return Err(RaceError::StartOnWall {
                    name: setup.name.clone(),
                    x,
                    y,
                });
            }
            if let Some(first) = starts.insert(setup.start, setup.name.clone()) {
                return Err(RaceError::SharedStart {
                    first,
                    second: setup.name.clone(),
                    x,
                    y,
                });
            }
        }

        let competitors = setups
            .into_iter()
            .enumerate()
            .map(|(index, setup)| Competitor::from_setup(CompetitorId::new(index as u32), setup))
            .collect();

        Ok(Self {
            track,
            config,
            competitors,
            current: 0,
            phase: TurnPhase::AwaitingMove,
            winner: None,
            turns_resolved: 0,
        })
    }

    fn competitor_index(&self, id: CompetitorId) -> Option<usize> {
        self.competitors
            .iter()
            .position(|competitor| competitor.id == id)
    }

    fn is_parked_obstacle(&self, cell: Position, mover: Option<CompetitorId>) -> bool {
        self.competitors.iter().any(|competitor| {
            Some(competitor.id) != mover && competitor.position == cell && competitor.is_parked()
        })
    }

    fn occupant_other_than(&self, cell: Position, mover: CompetitorId) -> Option<CompetitorId> {
        self.competitors
            .iter()
            .find(|competitor| competitor.id != mover && competitor.position == cell)
            .map(|competitor| competitor.id)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SelectAcceleration {
            competitor,
            acceleration,
        } => world.select_acceleration(competitor, acceleration, out_events),
        Command::ResolveTurn {
            competitor,
            acceleration,
        } => world.resolve_turn(competitor, acceleration, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use vector_race_core::{
        CompetitorId, CompetitorSnapshot, CompetitorView, Position, RaceSnapshot, TurnPhase,
    };

    use super::{validation, CheckpointProgress, Competitor, RaceConfig, Track, World};

    /// Provides read-only access to the track.
    #[must_use]
    pub fn track(world: &World) -> &Track {
        &world.track
    }

    /// Rules the race was assembled with.
    #[must_use]
    pub fn config(world: &World) -> RaceConfig {
        world.config
    }

    /// Current phase of the turn state machine.
    #[must_use]
    pub fn phase(world: &World) -> TurnPhase {
        world.phase
    }

    /// Winner of the race, once decided.
    #[must_use]
    pub fn winner(world: &World) -> Option<CompetitorId> {
        world.winner
    }

    /// Number of turns resolved so far.
    #[must_use]
    pub fn turns_resolved(world: &World) -> u64 {
        world.turns_resolved
    }

    /// Snapshot of the competitor owning the current turn.
    #[must_use]
    pub fn current_competitor(world: &World) -> CompetitorSnapshot {
        snapshot(&world.competitors[world.current])
    }

    /// Snapshot of the competitor with the provided identifier.
    #[must_use]
    pub fn competitor(world: &World, id: CompetitorId) -> Option<CompetitorSnapshot> {
        world
            .competitor_index(id)
            .map(|index| snapshot(&world.competitors[index]))
    }

    /// Captures a read-only view of all competitors in turn order.
    #[must_use]
    pub fn competitor_view(world: &World) -> CompetitorView {
        CompetitorView::from_snapshots(world.competitors.iter().map(snapshot).collect())
    }

    /// Captures the state handed to presentation layers.
    #[must_use]
    pub fn race_snapshot(world: &World) -> RaceSnapshot {
        RaceSnapshot {
            competitors: competitor_view(world),
            current_turn_index: world.current,
            turns_resolved: world.turns_resolved,
            phase: world.phase,
            winner: world.winner,
        }
    }

    /// Cells occupied by the competitor after each of its turns, start first.
    #[must_use]
    pub fn history(world: &World, id: CompetitorId) -> Option<&[Position]> {
        world
            .competitor_index(id)
            .map(|index| world.competitors[index].history.as_slice())
    }

    /// Checkpoints crossed by the competitor.
    #[must_use]
    pub fn checkpoint_progress(world: &World, id: CompetitorId) -> Option<&CheckpointProgress> {
        world
            .competitor_index(id)
            .map(|index| &world.competitors[index].progress)
    }

    /// Full-context legality of a move: walls plus parked competitors other than `mover`.
    #[must_use]
    pub fn is_legal_move(
        world: &World,
        start: Position,
        end: Position,
        mover: Option<CompetitorId>,
    ) -> bool {
        validation::is_legal(&world.track, start, end, |cell| {
            world.is_parked_obstacle(cell, mover)
        })
    }

    /// Competitor other than `mover` standing on the provided cell, if any.
    #[must_use]
    pub fn occupant(world: &World, cell: Position, mover: CompetitorId) -> Option<CompetitorId> {
        world.occupant_other_than(cell, mover)
    }

    fn snapshot(competitor: &Competitor) -> CompetitorSnapshot {
        CompetitorSnapshot {
            id: competitor.id,
            name: competitor.name.clone(),
            color: competitor.color,
            controller: competitor.controller,
            position: competitor.position,
            velocity: competitor.velocity,
            next_checkpoint: competitor.progress.next(),
            pending_acceleration: competitor.pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_race_core::{CellKind, StrategyKind};

    fn open_track() -> Track {
        Track::from_rows(vec![vec![CellKind::Road; 4]; 3]).expect("valid track")
    }

    fn setup(name: &str, x: i32, y: i32) -> CompetitorSetup {
        CompetitorSetup {
            name: name.to_owned(),
            color: CompetitorColor::from_rgb(0, 0, 0),
            controller: Controller::Bot(StrategyKind::BreadthFirst),
            start: Position::new(x, y),
        }
    }

    #[test]
    fn race_without_competitors_is_rejected() {
        let result = World::new(open_track(), Vec::new(), RaceConfig::default());
        assert!(matches!(result, Err(RaceError::NoCompetitors)));
    }

    #[test]
    fn shared_start_is_rejected() {
        let result = World::new(
            open_track(),
            vec![setup("a", 1, 1), setup("b", 1, 1)],
            RaceConfig::default(),
        );
        assert!(matches!(result, Err(RaceError::SharedStart { .. })));
    }

    #[test]
    fn start_outside_or_on_wall_is_rejected() {
        let outside = World::new(open_track(), vec![setup("a", 9, 0)], RaceConfig::default());
        assert!(matches!(outside, Err(RaceError::StartOutsideTrack { .. })));

        let walled = Track::from_rows(vec![vec![CellKind::Wall, CellKind::Road]]).expect("valid");
        let on_wall = World::new(walled, vec![setup("a", 0, 0)], RaceConfig::default());
        assert!(matches!(on_wall, Err(RaceError::StartOnWall { .. })));
    }

    #[test]
    fn competitors_receive_identifiers_in_turn_order() {
        let world = World::new(
            open_track(),
            vec![setup("a", 0, 0), setup("b", 3, 2)],
            RaceConfig::default(),
        )
        .expect("valid race");

        let view = query::competitor_view(&world);
        let ids: Vec<_> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(query::current_competitor(&world).name, "a");
        assert_eq!(query::phase(&world), TurnPhase::AwaitingMove);
        assert!(view.iter().all(|snapshot| snapshot.velocity.is_zero()));
        assert!(view.iter().all(|snapshot| snapshot.next_checkpoint == 1));
    }

    #[test]
    fn parked_competitors_block_the_path_but_not_the_mover_itself() {
        let world = World::new(
            open_track(),
            vec![setup("a", 0, 1), setup("b", 2, 1)],
            RaceConfig::default(),
        )
        .expect("valid race");
        let a = CompetitorId::new(0);

        assert!(!query::is_legal_move(
            &world,
            Position::new(0, 1),
            Position::new(3, 1),
            Some(a)
        ));
        assert!(query::is_legal_move(
            &world,
            Position::new(0, 1),
            Position::new(1, 1),
            Some(a)
        ));
        assert!(query::is_legal_move(
            &world,
            Position::new(1, 1),
            Position::new(0, 1),
            Some(a)
        ));
        assert!(!query::is_legal_move(
            &world,
            Position::new(1, 1),
            Position::new(0, 1),
            None
        ));
    }

    #[test]
    fn every_move_from_every_cell_gets_a_verdict() {
        let track = Track::from_rows(vec![
            vec![CellKind::Road, CellKind::Wall, CellKind::Road, CellKind::Road],
            vec![CellKind::Road, CellKind::Road, CellKind::Road, CellKind::Wall],
            vec![CellKind::Wall, CellKind::Road, CellKind::Road, CellKind::Road],
        ])
        .expect("valid track");
        let world = World::new(track, vec![setup("parked", 2, 1)], RaceConfig::default())
            .expect("valid race");
        let mover = CompetitorId::new(1);

        for y in 0..3 {
            for x in 0..4 {
                let start = Position::new(x, y);
                for dx in -2..=2 {
                    for dy in -2..=2 {
                        for acceleration in Acceleration::ALL {
                            let velocity = Vector::new(dx, dy) + acceleration.vector();
                            let end = start.translated(velocity);
                            let legal = query::is_legal_move(&world, start, end, Some(mover));

                            let inside = (0..4).contains(&end.x()) && (0..3).contains(&end.y());
                            if end == start {
                                assert!(legal, "staying on {start:?} must be legal");
                            } else if !inside {
                                assert!(!legal, "{start:?} -> {end:?} leaves the grid");
                            } else if legal {
                                assert!(!query::track(&world).is_wall(end));
                                assert_ne!(end, Position::new(2, 1));
                            }
                        }
                    }
                }
            }
        }
    }
}
