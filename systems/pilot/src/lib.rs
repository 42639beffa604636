#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bot pilots that choose an acceleration for computer-controlled competitors.
//!
//! A pilot picks a target with the [`TargetFinder`], asks the search engine for
//! the first acceleration of a route towards it, then revalidates that move
//! against the live race. Anything the search could not see (competitors
//! parked on the path, a competitor standing on the destination) makes the
//! pilot fall back to the zero acceleration. Competitors that keep failing
//! are nudged out with a seeded random legal acceleration.

mod targets;

pub use targets::TargetFinder;

use std::collections::BTreeMap;

use log::{debug, trace};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use vector_race_core::{
    Acceleration, CompetitorId, CompetitorSnapshot, Event, Position, StrategyKind,
};
use vector_race_system_search::{Heuristic, SearchEngine, SearchLimits, SearchOutcome, SearchState};
use vector_race_world::{query, TargetWeights, World};

/// Tunables shared by every bot in a race.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    /// Speed limit and expansion cap handed to the search engines.
    pub limits: SearchLimits,
    /// Estimate used by the A* strategy.
    pub heuristic: Heuristic,
    /// Consecutive turns without progress before a random escape is tried.
    pub stuck_threshold: u32,
    /// Seed for the escape generators; each competitor derives its own stream.
    pub seed: u64,
    /// Ranking applied when choosing between candidate targets.
    pub targeting: TargetWeights,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            limits: SearchLimits::default(),
            heuristic: Heuristic::default(),
            stuck_threshold: 3,
            seed: 0x5eed_7ac3,
            targeting: TargetWeights::default(),
        }
    }
}

/// How the pilot arrived at its most recent acceleration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// No checkpoint or finish cell is left to aim for.
    NoTarget,
    /// The competitor already stands on its target.
    AlreadyThere,
    /// The first move of a route passed revalidation.
    Planned {
        /// Turns the route needs to reach the target.
        turns: usize,
    },
    /// The search gave up.
    NotFound {
        /// Expansions performed before giving up.
        expansions: usize,
    },
    /// The planned move is blocked by another competitor.
    Refused,
    /// A random legal acceleration chosen after repeated failures.
    Escaped,
}

/// State a pilot keeps for a single competitor between turns.
#[derive(Clone, Debug)]
pub struct PilotMemory {
    target: Option<Position>,
    stuck_turns: u32,
    /// Whether the current turn already counts towards `stuck_turns`.
    failure_counted: bool,
    last_decision: Option<Decision>,
    rng: ChaCha8Rng,
}

impl PilotMemory {
    fn new(seed: u64, competitor: CompetitorId) -> Self {
        let stream = seed ^ u64::from(competitor.get()).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            target: None,
            stuck_turns: 0,
            failure_counted: false,
            last_decision: None,
            rng: ChaCha8Rng::seed_from_u64(stream),
        }
    }

    /// Cell the competitor aimed for on its latest turn.
    #[must_use]
    pub fn target(&self) -> Option<Position> {
        self.target
    }

    /// Consecutive turns without progress. A turn counts once, however it failed.
    #[must_use]
    pub fn stuck_turns(&self) -> u32 {
        self.stuck_turns
    }

    /// Outcome of the latest decision.
    #[must_use]
    pub fn last_decision(&self) -> Option<Decision> {
        self.last_decision
    }
}

/// Chooses accelerations for bot competitors.
#[derive(Debug)]
pub struct Pilot {
    config: PilotConfig,
    engine: SearchEngine,
    targets: TargetFinder,
    memories: BTreeMap<CompetitorId, PilotMemory>,
}

impl Default for Pilot {
    fn default() -> Self {
        Self::new(PilotConfig::default())
    }
}

impl Pilot {
    /// Creates a pilot with the provided configuration.
    #[must_use]
    pub fn new(config: PilotConfig) -> Self {
        Self {
            config,
            engine: SearchEngine::new(),
            targets: TargetFinder::new(config.targeting),
            memories: BTreeMap::new(),
        }
    }

    /// Configuration the pilot was created with.
    #[must_use]
    pub fn config(&self) -> &PilotConfig {
        &self.config
    }

    /// Memory kept for the competitor, once it has taken a turn.
    #[must_use]
    pub fn memory(&self, competitor: CompetitorId) -> Option<&PilotMemory> {
        self.memories.get(&competitor)
    }

    /// Cell the competitor should currently aim for.
    pub fn find_target(&mut self, world: &World, competitor: CompetitorId) -> Option<Position> {
        let snapshot = query::competitor(world, competitor)?;
        self.targets.find_target(query::track(world), &snapshot)
    }

    /// Chooses the competitor's acceleration for this turn.
    ///
    /// The result is always legal to submit; when no safe move towards the
    /// target exists the zero acceleration is returned.
    pub fn next_acceleration(
        &mut self,
        world: &World,
        competitor: CompetitorId,
        strategy: StrategyKind,
    ) -> Acceleration {
        let Some(me) = query::competitor(world, competitor) else {
            return Acceleration::ZERO;
        };
        let track = query::track(world);
        let target = self.targets.find_target(track, &me);
        let seed = self.config.seed;
        let memory = self
            .memories
            .entry(competitor)
            .or_insert_with(|| PilotMemory::new(seed, competitor));
        memory.target = target;
        memory.failure_counted = false;

        let Some(target) = target else {
            trace!("competitor {} has nothing left to aim for", competitor.get());
            memory.last_decision = Some(Decision::NoTarget);
            return Acceleration::ZERO;
        };

        let start = SearchState::new(me.position, me.velocity);
        let limits = self.config.limits;
        let outcome = match strategy {
            StrategyKind::BreadthFirst => self.engine.breadth_first(track, start, target, limits),
            StrategyKind::AStar => {
                self.engine.a_star(track, start, target, limits, self.config.heuristic)
            }
        };
        trace!(
            "competitor {} {strategy:?} towards {target:?}: {:?}",
            competitor.get(),
            outcome.turns()
        );

        let decision = match outcome {
            SearchOutcome::Found(plan) if is_safe(world, &me, plan.first) => {
                memory.last_decision = Some(Decision::Planned {
                    turns: plan.turns(),
                });
                return plan.first;
            }
            SearchOutcome::Found(_) => Decision::Refused,
            SearchOutcome::AlreadyThere => Decision::AlreadyThere,
            SearchOutcome::NotFound { expansions } => Decision::NotFound { expansions },
        };

        memory.stuck_turns = memory.stuck_turns.saturating_add(1);
        memory.failure_counted = true;
        if memory.stuck_turns >= self.config.stuck_threshold {
            if let Some(escape) = escape(world, &me, limits.max_speed, &mut memory.rng) {
                debug!(
                    "competitor {} stuck for {} turns, escaping with {:?}",
                    competitor.get(),
                    memory.stuck_turns,
                    escape.vector()
                );
                memory.last_decision = Some(Decision::Escaped);
                return escape;
            }
        }

        memory.last_decision = Some(decision);
        Acceleration::ZERO
    }

    /// Updates memories from the events of a resolved turn.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match *event {
                Event::CheckpointPassed { competitor, .. } => {
                    self.targets.invalidate(competitor);
                }
                Event::CompetitorMoved {
                    competitor,
                    from,
                    to,
                    ..
                } if from != to => {
                    if let Some(memory) = self.memories.get_mut(&competitor) {
                        memory.stuck_turns = 0;
                    }
                }
                Event::CompetitorCollided { competitor, .. }
                | Event::CompetitorBlocked { competitor, .. } => {
                    if let Some(memory) = self.memories.get_mut(&competitor) {
                        if !memory.failure_counted {
                            memory.stuck_turns = memory.stuck_turns.saturating_add(1);
                            memory.failure_counted = true;
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// Whether the move is legal and its destination free in the live race.
fn is_safe(world: &World, me: &CompetitorSnapshot, acceleration: Acceleration) -> bool {
    let end = me.position.translated(me.velocity + acceleration.vector());
    if end == me.position {
        return true;
    }
    query::is_legal_move(world, me.position, end, Some(me.id))
        && query::occupant(world, end, me.id).is_none()
}

fn escape(
    world: &World,
    me: &CompetitorSnapshot,
    max_speed: i32,
    rng: &mut ChaCha8Rng,
) -> Option<Acceleration> {
    let candidates: Vec<Acceleration> = Acceleration::ALL
        .into_iter()
        .filter(|acceleration| {
            let velocity = me.velocity + acceleration.vector();
            velocity.speed() <= max_speed
                && me.position.translated(velocity) != me.position
                && is_safe(world, me, *acceleration)
        })
        .collect();
    candidates.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_race_core::Vector;

    #[test]
    fn competitors_draw_from_distinct_streams() {
        use rand::RngCore;

        let mut first = PilotMemory::new(7, CompetitorId::new(0));
        let mut second = PilotMemory::new(7, CompetitorId::new(1));
        let mut replay = PilotMemory::new(7, CompetitorId::new(0));

        let value = first.rng.next_u64();
        assert_ne!(value, second.rng.next_u64());
        assert_eq!(value, replay.rng.next_u64());
    }

    #[test]
    fn movement_resets_and_a_failed_turn_counts_once() {
        let id = CompetitorId::new(0);
        let mut pilot = Pilot::default();
        let _ = pilot
            .memories
            .insert(id, PilotMemory::new(pilot.config.seed, id));

        pilot.handle(&[
            Event::CompetitorCollided {
                competitor: id,
                at: Position::new(0, 0),
                attempted: Position::new(3, 0),
            },
            Event::CompetitorCollided {
                competitor: id,
                at: Position::new(0, 0),
                attempted: Position::new(3, 0),
            },
        ]);
        assert_eq!(pilot.memory(id).map(PilotMemory::stuck_turns), Some(1));

        pilot.handle(&[Event::CompetitorMoved {
            competitor: id,
            from: Position::new(0, 0),
            to: Position::new(0, 0),
            velocity: Vector::ZERO,
        }]);
        assert_eq!(pilot.memory(id).map(PilotMemory::stuck_turns), Some(1));

        pilot.handle(&[Event::CompetitorMoved {
            competitor: id,
            from: Position::new(0, 0),
            to: Position::new(1, 0),
            velocity: Vector::new(1, 0),
        }]);
        assert_eq!(pilot.memory(id).map(PilotMemory::stuck_turns), Some(0));
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = PilotConfig::default();
        assert_eq!(config.limits.max_speed, 5);
        assert_eq!(config.limits.max_expansions, 100_000);
        assert_eq!(config.stuck_threshold, 3);
        assert_eq!(config.heuristic, Heuristic::Kinematic);
    }
}
