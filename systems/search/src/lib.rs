#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Breadth-first and A* search over the (position, velocity) state space.
//!
//! Both engines expand the nine accelerations of every state, discard
//! velocities faster than the configured limit and reject segments that cross
//! a wall. Competitors are ignored here; the caller revalidates the chosen
//! move against the live race before committing to it. Every edge costs one
//! turn, so both engines minimise the number of turns to the target.

mod heuristic;

pub use heuristic::Heuristic;

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, HashSet, VecDeque},
};

use log::trace;
use serde::{Deserialize, Serialize};
use vector_race_core::{Acceleration, Position, Vector};
use vector_race_world::Track;

/// Node identity shared by both engines. Costs are bookkeeping, not identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SearchState {
    /// Cell occupied in this state.
    pub position: Position,
    /// Velocity carried into the next turn.
    pub velocity: Vector,
}

impl SearchState {
    /// Creates a new search state.
    #[must_use]
    pub const fn new(position: Position, velocity: Vector) -> Self {
        Self { position, velocity }
    }
}

/// Bounds applied to every search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    /// Largest velocity component a successor may carry.
    pub max_speed: i32,
    /// Number of node expansions after which the search gives up.
    pub max_expansions: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_speed: 5,
            max_expansions: 100_000,
        }
    }
}

/// Route found by a search, from the start state to the goal state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    /// Acceleration to apply on the current turn.
    pub first: Acceleration,
    /// States visited along the route, start and goal included.
    pub states: Vec<SearchState>,
    /// Number of expansions performed.
    pub expansions: usize,
}

impl Plan {
    /// Number of turns the route takes.
    #[must_use]
    pub fn turns(&self) -> usize {
        self.states.len().saturating_sub(1)
    }
}

/// Result of a single search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The start state already sits on the target.
    AlreadyThere,
    /// A route to the target exists.
    Found(Plan),
    /// The frontier emptied or the expansion cap was hit.
    NotFound {
        /// Number of expansions performed before giving up.
        expansions: usize,
    },
}

impl SearchOutcome {
    /// Acceleration to apply now; zero unless a route was found.
    #[must_use]
    pub fn first_acceleration(&self) -> Acceleration {
        match self {
            Self::Found(plan) => plan.first,
            Self::AlreadyThere | Self::NotFound { .. } => Acceleration::ZERO,
        }
    }

    /// Number of turns to the target, if reachable.
    #[must_use]
    pub fn turns(&self) -> Option<usize> {
        match self {
            Self::AlreadyThere => Some(0),
            Self::Found(plan) => Some(plan.turns()),
            Self::NotFound { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Node {
    state: SearchState,
    parent: Option<usize>,
    acceleration: Acceleration,
    cost: u32,
}

/// Search engine that reuses scratch buffers between searches.
#[derive(Debug, Default)]
pub struct SearchEngine {
    nodes: Vec<Node>,
    visited: HashSet<SearchState>,
    frontier: VecDeque<usize>,
    best_cost: HashMap<SearchState, u32>,
    closed: HashSet<SearchState>,
    open: BinaryHeap<Reverse<(u32, u32, u64, usize)>>,
}

impl SearchEngine {
    /// Creates a new engine with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a minimum-turn route with a FIFO frontier.
    pub fn breadth_first(
        &mut self,
        track: &Track,
        start: SearchState,
        target: Position,
        limits: SearchLimits,
    ) -> SearchOutcome {
        self.reset();
        if start.position == target {
            return SearchOutcome::AlreadyThere;
        }

        self.nodes.push(Node {
            state: start,
            parent: None,
            acceleration: Acceleration::ZERO,
            cost: 0,
        });
        let _ = self.visited.insert(start);
        self.frontier.push_back(0);

        let mut expansions = 0;
        while let Some(index) = self.frontier.pop_front() {
            let node = self.nodes[index];
            if node.state.position == target {
                return self.found(index, expansions);
            }

            if expansions >= limits.max_expansions {
                break;
            }
            expansions += 1;

            for (acceleration, next) in successors(track, node.state, limits.max_speed) {
                if !self.visited.insert(next) {
                    continue;
                }
                self.nodes.push(Node {
                    state: next,
                    parent: Some(index),
                    acceleration,
                    cost: node.cost + 1,
                });
                self.frontier.push_back(self.nodes.len() - 1);
            }
        }

        trace!("breadth-first search exhausted after {expansions} expansions");
        SearchOutcome::NotFound { expansions }
    }

    /// Finds a route with a priority queue ordered by `cost + estimate`.
    ///
    /// States are closed once popped and never reopened; a cheaper path to an
    /// open state is recorded by pushing a fresh queue entry, and outdated
    /// entries are skipped when they surface.
    pub fn a_star(
        &mut self,
        track: &Track,
        start: SearchState,
        target: Position,
        limits: SearchLimits,
        heuristic: Heuristic,
    ) -> SearchOutcome {
        self.reset();
        if start.position == target {
            return SearchOutcome::AlreadyThere;
        }

        let start_estimate = heuristic.estimate(None, start, target, limits.max_speed);
        self.nodes.push(Node {
            state: start,
            parent: None,
            acceleration: Acceleration::ZERO,
            cost: 0,
        });
        let _ = self.best_cost.insert(start, 0);
        let mut sequence: u64 = 0;
        self.open
            .push(Reverse((start_estimate, start_estimate, sequence, 0)));

        let mut expansions = 0;
        while let Some(Reverse((_, _, _, index))) = self.open.pop() {
            let node = self.nodes[index];
            if self.closed.contains(&node.state)
                || self.best_cost.get(&node.state) != Some(&node.cost)
            {
                continue;
            }
            if node.state.position == target {
                return self.found(index, expansions);
            }

            if expansions >= limits.max_expansions {
                break;
            }
            expansions += 1;
            let _ = self.closed.insert(node.state);

            let cost = node.cost + 1;
            for (acceleration, next) in successors(track, node.state, limits.max_speed) {
                if self.closed.contains(&next) {
                    continue;
                }
                if self
                    .best_cost
                    .get(&next)
                    .is_some_and(|&known| known <= cost)
                {
                    continue;
                }
                let _ = self.best_cost.insert(next, cost);
                self.nodes.push(Node {
                    state: next,
                    parent: Some(index),
                    acceleration,
                    cost,
                });

                let estimate = heuristic.estimate(Some(node.state), next, target, limits.max_speed);
                sequence += 1;
                self.open.push(Reverse((
                    cost.saturating_add(estimate),
                    estimate,
                    sequence,
                    self.nodes.len() - 1,
                )));
            }
        }

        trace!("a* search exhausted after {expansions} expansions");
        SearchOutcome::NotFound { expansions }
    }

    fn reset(&mut self) {
        self.nodes.clear();
        self.visited.clear();
        self.frontier.clear();
        self.best_cost.clear();
        self.closed.clear();
        self.open.clear();
    }

    fn found(&self, goal: usize, expansions: usize) -> SearchOutcome {
        let mut chain = vec![goal];
        let mut cursor = goal;
        while let Some(parent) = self.nodes[cursor].parent {
            chain.push(parent);
            cursor = parent;
        }
        chain.reverse();

        let first = chain
            .get(1)
            .map_or(Acceleration::ZERO, |&index| self.nodes[index].acceleration);
        let states = chain.iter().map(|&index| self.nodes[index].state).collect();
        trace!(
            "route found after {expansions} expansions, {} turns",
            chain.len() - 1
        );
        SearchOutcome::Found(Plan {
            first,
            states,
            expansions,
        })
    }
}

/// States reachable in one turn, in the fixed order of [`Acceleration::ALL`].
pub fn successors(
    track: &Track,
    state: SearchState,
    max_speed: i32,
) -> impl Iterator<Item = (Acceleration, SearchState)> + '_ {
    Acceleration::ALL.into_iter().filter_map(move |acceleration| {
        let velocity = state.velocity + acceleration.vector();
        if velocity.speed() > max_speed {
            return None;
        }
        let position = state.position.translated(velocity);
        if !track.path_is_clear(state.position, position) {
            return None;
        }
        Some((acceleration, SearchState::new(position, velocity)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_race_core::CellKind::{Road, Wall};

    #[test]
    fn successors_respect_speed_limit_and_walls() {
        let track = Track::from_rows(vec![vec![Road; 4]; 4]).expect("valid track");
        let state = SearchState::new(Position::new(0, 0), Vector::ZERO);

        let reachable: Vec<_> = successors(&track, state, 5)
            .map(|(_, next)| next.position)
            .collect();

        assert_eq!(
            reachable,
            vec![
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(0, 1),
                Position::new(1, 1),
            ]
        );

        let capped: Vec<_> = successors(
            &track,
            SearchState::new(Position::new(0, 0), Vector::new(1, 1)),
            1,
        )
        .map(|(_, next)| next.velocity)
        .collect();
        assert!(capped.iter().all(|velocity| velocity.speed() <= 1));
    }

    #[test]
    fn breadth_first_counts_turns_not_cells() {
        let track = Track::from_rows(vec![vec![Road; 7]]).expect("valid track");
        let mut engine = SearchEngine::new();

        let outcome = engine.breadth_first(
            &track,
            SearchState::new(Position::new(0, 0), Vector::ZERO),
            Position::new(6, 0),
            SearchLimits::default(),
        );

        // 1 + 2 + 3 cells in three turns.
        assert_eq!(outcome.turns(), Some(3));
        assert_eq!(outcome.first_acceleration(), Acceleration::new(1, 0).expect("valid"));
    }

    #[test]
    fn expansion_cap_stops_the_search() {
        let track = Track::from_rows(vec![vec![Road; 30]; 30]).expect("valid track");
        let mut engine = SearchEngine::new();
        let limits = SearchLimits {
            max_speed: 5,
            max_expansions: 3,
        };
        let start = SearchState::new(Position::new(0, 0), Vector::ZERO);

        let bfs = engine.breadth_first(&track, start, Position::new(29, 29), limits);
        let astar = engine.a_star(
            &track,
            start,
            Position::new(29, 29),
            limits,
            Heuristic::Kinematic,
        );

        assert_eq!(bfs, SearchOutcome::NotFound { expansions: 3 });
        assert_eq!(astar, SearchOutcome::NotFound { expansions: 3 });
    }

    #[test]
    fn walled_in_start_finds_nothing() {
        let track = Track::from_rows(vec![
            vec![Wall, Wall, Wall, Road],
            vec![Wall, Road, Wall, Road],
            vec![Wall, Wall, Wall, Road],
        ])
        .expect("valid track");
        let mut engine = SearchEngine::new();
        let start = SearchState::new(Position::new(1, 1), Vector::ZERO);

        let bfs = engine.breadth_first(&track, start, Position::new(3, 0), SearchLimits::default());
        assert!(matches!(bfs, SearchOutcome::NotFound { .. }));
        assert_eq!(bfs.first_acceleration(), Acceleration::ZERO);

        let astar = engine.a_star(
            &track,
            start,
            Position::new(3, 0),
            SearchLimits::default(),
            Heuristic::Kinematic,
        );
        assert!(matches!(astar, SearchOutcome::NotFound { .. }));
    }

    #[test]
    fn start_on_target_needs_no_search() {
        let track = Track::from_rows(vec![vec![Road; 2]]).expect("valid track");
        let mut engine = SearchEngine::new();
        let start = SearchState::new(Position::new(1, 0), Vector::new(-1, 0));

        let outcome =
            engine.breadth_first(&track, start, Position::new(1, 0), SearchLimits::default());
        assert_eq!(outcome, SearchOutcome::AlreadyThere);
        assert_eq!(outcome.first_acceleration(), Acceleration::ZERO);
    }
}
