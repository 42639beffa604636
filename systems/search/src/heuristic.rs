//! Remaining-cost estimates for the A* engine.

use serde::{Deserialize, Serialize};
use vector_race_core::Position;

use crate::SearchState;

/// Penalty applied by [`Heuristic::Smoothed`] when a move drifts away from the target.
const DRIFT_PENALTY: u32 = 5;

/// Estimate used to order the A* frontier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    /// Chebyshev distance measured in turns.
    ///
    /// Each axis is bounded independently by the fewest turns that could cover
    /// its remaining offset when accelerating every turn up to the speed
    /// limit; the larger axis wins. The bound never overestimates and never
    /// drops by more than one across an edge, so A* returns minimum-turn
    /// routes.
    #[default]
    Kinematic,
    /// [`Heuristic::Kinematic`] plus penalties for drifting away from the
    /// target and for speed. Produces steadier driving at the cost of route
    /// optimality.
    Smoothed,
}

impl Heuristic {
    pub(crate) fn estimate(
        self,
        parent: Option<SearchState>,
        state: SearchState,
        target: Position,
        max_speed: i32,
    ) -> u32 {
        let kinematic = turns_to_cover(state, target, max_speed);
        match self {
            Self::Kinematic => kinematic,
            Self::Smoothed => {
                let drifted = parent.is_some_and(|parent| {
                    state.position.chebyshev_distance(target)
                        > parent.position.chebyshev_distance(target)
                });
                let drift = if drifted { DRIFT_PENALTY } else { 0 };
                let speed = state.velocity.speed().unsigned_abs() / 2;
                kinematic.saturating_add(drift).saturating_add(speed)
            }
        }
    }
}

fn turns_to_cover(state: SearchState, target: Position, max_speed: i32) -> u32 {
    let offset = state.position.offset_to(target);
    let horizontal = axis_turns(offset.dx(), state.velocity.dx(), max_speed);
    let vertical = axis_turns(offset.dy(), state.velocity.dy(), max_speed);
    horizontal.max(vertical)
}

/// Fewest turns whose best-case displacement along one axis reaches `offset`.
fn axis_turns(offset: i32, velocity: i32, max_speed: i32) -> u32 {
    if offset == 0 || max_speed <= 0 {
        return 0;
    }

    let (remaining, mut speed) = if offset > 0 {
        (i64::from(offset), i64::from(velocity))
    } else {
        (-i64::from(offset), -i64::from(velocity))
    };
    let cap = i64::from(max_speed);

    let mut covered = 0;
    let mut turns = 0;
    while covered < remaining {
        speed = (speed + 1).min(cap);
        covered += speed;
        turns += 1;
    }
    turns
}
