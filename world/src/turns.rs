//! Turn resolution state machine.

use log::{debug, info};
use vector_race_core::{
    Acceleration, CellKind, CompetitorId, Controller, Event, Position, TurnPhase, TurnRejection,
    Vector,
};

use crate::{checkpoints, validation, World};

/// Result of validating and applying a single move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MoveOutcome {
    Collided,
    Blocked,
    Committed { won: bool },
}

impl World {
    pub(crate) fn select_acceleration(
        &mut self,
        id: CompetitorId,
        acceleration: Acceleration,
        out_events: &mut Vec<Event>,
    ) {
        let Some(index) = self.competitor_index(id) else {
            out_events.push(rejected(id, TurnRejection::UnknownCompetitor));
            return;
        };
        if self.phase == TurnPhase::Finished {
            out_events.push(rejected(id, TurnRejection::RaceFinished));
            return;
        }
        let competitor = &mut self.competitors[index];
        if competitor.controller != Controller::Human {
            out_events.push(rejected(id, TurnRejection::NotHuman));
            return;
        }
        competitor.pending = Some(acceleration);
    }

    /// Drives one full pass of the state machine for the current competitor.
    pub(crate) fn resolve_turn(
        &mut self,
        id: CompetitorId,
        acceleration: Acceleration,
        out_events: &mut Vec<Event>,
    ) {
        if self.phase == TurnPhase::Finished {
            out_events.push(rejected(id, TurnRejection::RaceFinished));
            return;
        }
        let Some(index) = self.competitor_index(id) else {
            out_events.push(rejected(id, TurnRejection::UnknownCompetitor));
            return;
        };
        if index != self.current {
            out_events.push(rejected(id, TurnRejection::NotCurrentCompetitor));
            return;
        }

        self.turns_resolved += 1;
        out_events.push(Event::TurnStarted {
            competitor: id,
            turn: self.turns_resolved,
        });
        self.competitors[index].pending = None;

        let mut phase = TurnPhase::Resolving;
        loop {
            phase = match phase {
                TurnPhase::Resolving => match self.resolve_move(index, acceleration, out_events) {
                    MoveOutcome::Committed { won: true } => TurnPhase::Finished,
                    _ => TurnPhase::Advancing,
                },
                TurnPhase::Advancing => {
                    self.current = (self.current + 1) % self.competitors.len();
                    TurnPhase::AwaitingMove
                }
                TurnPhase::AwaitingMove | TurnPhase::Finished => break,
            };
        }
        self.phase = phase;
    }

    fn resolve_move(
        &mut self,
        index: usize,
        acceleration: Acceleration,
        out_events: &mut Vec<Event>,
    ) -> MoveOutcome {
        let id = self.competitors[index].id;
        let start = self.competitors[index].position;
        let velocity = self.competitors[index].velocity + acceleration.vector();
        let end = start.translated(velocity);

        let legal = validation::is_legal(&self.track, start, end, |cell| {
            self.is_parked_obstacle(cell, Some(id))
        });
        if !legal {
            debug!("competitor {} collided moving {start:?} -> {end:?}", id.get());
            self.halt(index, start);
            out_events.push(Event::CompetitorCollided {
                competitor: id,
                at: start,
                attempted: end,
            });
            return MoveOutcome::Collided;
        }

        if let Some(occupant) = self.occupant_other_than(end, id) {
            debug!("competitor {} blocked by {} at {end:?}", id.get(), occupant.get());
            self.halt(index, start);
            out_events.push(Event::CompetitorBlocked {
                competitor: id,
                at: start,
                attempted: end,
                occupant,
            });
            return MoveOutcome::Blocked;
        }

        let competitor = &mut self.competitors[index];
        competitor.position = end;
        competitor.velocity = velocity;
        competitor.history.push(end);
        out_events.push(Event::CompetitorMoved {
            competitor: id,
            from: start,
            to: end,
            velocity,
        });

        let crossed =
            checkpoints::record_crossings(&self.track, &mut competitor.progress, start, end);
        for (sequence, position) in crossed {
            debug!("competitor {} passed checkpoint {sequence} at {position:?}", id.get());
            let _ = self.track.mark_reached(position);
            out_events.push(Event::CheckpointPassed {
                competitor: id,
                sequence,
                position,
            });
        }

        let on_finish = self.track.cell(end) == CellKind::Finish;
        let eligible = !self.config.finish_requires_all_checkpoints
            || self.competitors[index].progress.completed(&self.track);
        if on_finish && eligible {
            info!("{} wins after {} turns", self.competitors[index].name, self.turns_resolved);
            self.winner = Some(id);
            out_events.push(Event::RaceWon { competitor: id });
            return MoveOutcome::Committed { won: true };
        }

        MoveOutcome::Committed { won: false }
    }

    fn halt(&mut self, index: usize, at: Position) {
        let competitor = &mut self.competitors[index];
        competitor.velocity = Vector::ZERO;
        competitor.history.push(at);
    }
}

fn rejected(competitor: CompetitorId, reason: TurnRejection) -> Event {
    Event::TurnRejected { competitor, reason }
}
