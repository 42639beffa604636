#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn driver that decides the current competitor's acceleration and submits it.
//!
//! Human competitors use the acceleration queued through
//! [`Command::SelectAcceleration`], or zero when nothing was queued. Bots ask
//! the [`Pilot`]. The resolved command goes through [`world::apply`] and the
//! resulting events are fed back to the pilot so cached targets follow
//! checkpoint progress.

use log::trace;
use vector_race_core::{Acceleration, Command, Controller, Event, TurnPhase};
use vector_race_system_pilot::Pilot;
use vector_race_world::{self as world, query, World};

/// Drives the race one turn at a time.
#[derive(Debug, Default)]
pub struct TurnEngine {
    pilot: Pilot,
}

impl TurnEngine {
    /// Creates a driver that delegates bot decisions to the provided pilot.
    #[must_use]
    pub fn new(pilot: Pilot) -> Self {
        Self { pilot }
    }

    /// Pilot used for bot competitors.
    #[must_use]
    pub fn pilot(&self) -> &Pilot {
        &self.pilot
    }

    /// Emits the command resolving the current competitor's turn.
    ///
    /// Nothing is emitted once the race is finished.
    pub fn plan(&mut self, world: &World, out: &mut Vec<Command>) {
        if query::phase(world) == TurnPhase::Finished {
            return;
        }

        let current = query::current_competitor(world);
        let acceleration = match current.controller {
            Controller::Human => current.pending_acceleration.unwrap_or(Acceleration::ZERO),
            Controller::Bot(strategy) => self.pilot.next_acceleration(world, current.id, strategy),
        };
        trace!("{} accelerates by {:?}", current.name, acceleration.vector());
        out.push(Command::ResolveTurn {
            competitor: current.id,
            acceleration,
        });
    }

    /// Forwards world events to the pilot.
    pub fn handle(&mut self, events: &[Event]) {
        self.pilot.handle(events);
    }

    /// Resolves the current competitor's turn against the world.
    ///
    /// Returns `false` without touching the world when the race is already
    /// finished.
    pub fn advance_turn(&mut self, world: &mut World, out_events: &mut Vec<Event>) -> bool {
        let mut commands = Vec::new();
        self.plan(world, &mut commands);
        if commands.is_empty() {
            return false;
        }

        let first_event = out_events.len();
        for command in commands {
            world::apply(world, command, out_events);
        }
        self.handle(&out_events[first_event..]);
        true
    }
}
