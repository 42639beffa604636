//! Turns race events and state into human readable notices.

use log::{debug, info, warn};
use vector_race_core::{CompetitorId, Event, Position, RaceSnapshot, TurnRejection};
use vector_race_world::{query, World};

use crate::track_file;

/// Logs the events of a resolved turn.
pub(crate) fn log_events(world: &World, events: &[Event]) {
    let name = |id: CompetitorId| {
        query::competitor(world, id).map_or_else(|| format!("#{}", id.get()), |c| c.name)
    };

    for event in events {
        match *event {
            Event::TurnStarted { competitor, turn } => {
                debug!("turn {turn}: {}", name(competitor));
            }
            Event::CompetitorMoved {
                competitor,
                from,
                to,
                velocity,
            } => debug!(
                "{} moved {} -> {} at ({}, {})",
                name(competitor),
                cell(from),
                cell(to),
                velocity.dx(),
                velocity.dy()
            ),
            Event::CompetitorCollided {
                competitor,
                at,
                attempted,
            } => info!(
                "{} crashed trying {} -> {}",
                name(competitor),
                cell(at),
                cell(attempted)
            ),
            Event::CompetitorBlocked {
                competitor,
                attempted,
                occupant,
                ..
            } => info!(
                "{} was blocked at {} by {}",
                name(competitor),
                cell(attempted),
                name(occupant)
            ),
            Event::CheckpointPassed {
                competitor,
                sequence,
                position,
            } => info!(
                "{} passed checkpoint {sequence} at {}",
                name(competitor),
                cell(position)
            ),
            Event::RaceWon { competitor } => info!("{} wins the race", name(competitor)),
            Event::TurnRejected { competitor, reason } => {
                warn!("{} was refused: {}", name(competitor), describe(reason));
            }
        }
    }
}

/// Renders the track with competitors drawn by their initials.
pub(crate) fn board(world: &World) -> String {
    let view = query::competitor_view(world);
    track_file::render(query::track(world), |position| {
        view.occupant(position)
            .map(|competitor| competitor.name.chars().next().unwrap_or('@'))
    })
}

/// One-line summary of the final race state.
pub(crate) fn summary(snapshot: &RaceSnapshot) -> String {
    let winner = snapshot
        .winner
        .and_then(|id| snapshot.competitors.get(id))
        .map(|competitor| competitor.name.as_str());
    match winner {
        Some(name) => format!("{name} won after {} turns", snapshot.turns_resolved),
        None => format!("no winner after {} turns", snapshot.turns_resolved),
    }
}

fn cell(position: Position) -> String {
    format!("({}, {})", position.x(), position.y())
}

fn describe(reason: TurnRejection) -> &'static str {
    match reason {
        TurnRejection::RaceFinished => "the race is over",
        TurnRejection::NotCurrentCompetitor => "it is not their turn",
        TurnRejection::UnknownCompetitor => "no such competitor",
        TurnRejection::NotHuman => "only humans queue accelerations",
    }
}
