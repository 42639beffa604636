//! Per-competitor checkpoint targets with caching and reservations.

use std::collections::BTreeMap;

use vector_race_core::{CompetitorId, CompetitorSnapshot, Position};
use vector_race_world::{select_target, TargetWeights, Track};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CachedTarget {
    position: Position,
    group: u32,
}

/// Chooses and remembers the cell each competitor is aiming for.
///
/// A cached target is reused for as long as it belongs to the competitor's
/// current checkpoint group, so the aim does not flicker between equally
/// good cells. Checkpoint targets are reserved so that other competitors
/// prefer the remaining cells of a shared group.
#[derive(Clone, Debug, Default)]
pub struct TargetFinder {
    weights: TargetWeights,
    cache: BTreeMap<CompetitorId, CachedTarget>,
    reservations: BTreeMap<Position, CompetitorId>,
}

impl TargetFinder {
    /// Creates a finder ranking candidates with the provided weights.
    #[must_use]
    pub fn new(weights: TargetWeights) -> Self {
        Self {
            weights,
            cache: BTreeMap::new(),
            reservations: BTreeMap::new(),
        }
    }

    /// Returns the target for the competitor, recomputing it when stale.
    pub fn find_target(
        &mut self,
        track: &Track,
        competitor: &CompetitorSnapshot,
    ) -> Option<Position> {
        let group = competitor.next_checkpoint;
        if let Some(cached) = self.cache.get(&competitor.id) {
            if cached.group == group && belongs_to_group(track, cached.position, group) {
                return Some(cached.position);
            }
        }

        self.invalidate(competitor.id);
        let reservations = &self.reservations;
        let target = select_target(
            track,
            competitor.position,
            competitor.velocity,
            group,
            self.weights,
            |cell| reservations.get(&cell).is_some_and(|owner| *owner != competitor.id),
        )?;

        let _ = self.cache.insert(
            competitor.id,
            CachedTarget {
                position: target,
                group,
            },
        );
        if track.checkpoint(target).is_some() {
            let _ = self.reservations.insert(target, competitor.id);
        }
        Some(target)
    }

    /// Drops the competitor's cached target and releases its reservation.
    pub fn invalidate(&mut self, competitor: CompetitorId) {
        let _ = self.cache.remove(&competitor);
        self.reservations.retain(|_, owner| *owner != competitor);
    }

    /// Competitor holding a reservation on the provided checkpoint cell.
    #[must_use]
    pub fn reserved_by(&self, cell: Position) -> Option<CompetitorId> {
        self.reservations.get(&cell).copied()
    }
}

fn belongs_to_group(track: &Track, position: Position, group: u32) -> bool {
    let members = track.checkpoint_group(group);
    if members.is_empty() || group > track.max_checkpoint() {
        track.cell(position) == vector_race_core::CellKind::Finish
    } else {
        members.binary_search(&position).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_race_core::{
        CellKind::{Checkpoint, Finish, Road},
        CompetitorColor, Controller, Vector,
    };

    fn snapshot(id: u32, x: i32, y: i32, next_checkpoint: u32) -> CompetitorSnapshot {
        CompetitorSnapshot {
            id: CompetitorId::new(id),
            name: format!("bot-{id}"),
            color: CompetitorColor::from_rgb(0, 0, 0),
            controller: Controller::Human,
            position: Position::new(x, y),
            velocity: Vector::ZERO,
            next_checkpoint,
            pending_acceleration: None,
        }
    }

    fn shared_group_track() -> Track {
        Track::from_rows(vec![
            vec![Checkpoint(1), Road, Road, Road, Checkpoint(1)],
            vec![Road, Road, Road, Road, Road],
            vec![Road, Road, Finish, Road, Road],
        ])
        .expect("valid track")
    }

    #[test]
    fn cached_target_is_kept_while_the_group_is_unchanged() {
        let track = shared_group_track();
        let mut finder = TargetFinder::new(TargetWeights::NEAREST);

        let first = finder.find_target(&track, &snapshot(0, 1, 1, 1));
        assert_eq!(first, Some(Position::new(0, 0)));

        let moved_closer_to_other = finder.find_target(&track, &snapshot(0, 4, 1, 1));
        assert_eq!(moved_closer_to_other, first);
    }

    #[test]
    fn advancing_the_group_recomputes_the_target() {
        let track = shared_group_track();
        let mut finder = TargetFinder::new(TargetWeights::NEAREST);

        let _ = finder.find_target(&track, &snapshot(0, 1, 1, 1));
        let next = finder.find_target(&track, &snapshot(0, 1, 1, 2));

        assert_eq!(next, Some(Position::new(2, 2)));
        assert_eq!(finder.reserved_by(Position::new(0, 0)), None);
    }

    #[test]
    fn second_competitor_avoids_a_reserved_checkpoint() {
        let track = shared_group_track();
        let mut finder = TargetFinder::new(TargetWeights::NEAREST);

        let first = finder.find_target(&track, &snapshot(0, 1, 1, 1));
        let second = finder.find_target(&track, &snapshot(1, 1, 2, 1));

        assert_eq!(first, Some(Position::new(0, 0)));
        assert_eq!(second, Some(Position::new(4, 0)));
        assert_eq!(
            finder.reserved_by(Position::new(4, 0)),
            Some(CompetitorId::new(1))
        );
    }

    #[test]
    fn invalidation_releases_the_reservation() {
        let track = shared_group_track();
        let mut finder = TargetFinder::new(TargetWeights::NEAREST);

        let _ = finder.find_target(&track, &snapshot(0, 1, 1, 1));
        finder.invalidate(CompetitorId::new(0));

        assert_eq!(finder.reserved_by(Position::new(0, 0)), None);
        let other = finder.find_target(&track, &snapshot(1, 1, 2, 1));
        assert_eq!(other, Some(Position::new(0, 0)));
    }
}
