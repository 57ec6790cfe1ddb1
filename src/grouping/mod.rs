//! Round-by-round assignment of players to groups.
//!
//! Each policy turns a [`GroupingContext`] into a [`GroupingPlan`]: the full
//! set of heats and memberships for a round range. Planning is pure; the
//! engine commits a plan as one transaction that replaces exactly that range.

mod fixed_schedule;
mod per_round;
mod random_seed;
mod rank_repair;

use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::error::{EngineError, EngineResult};
use crate::model::{Event, EventId, Group, GroupMembership, Heat, PlayerId, Standing};
use crate::store::{Mutation, Store, Transaction};

pub use fixed_schedule::FixedSchedule;
pub use per_round::PerRoundRandom;
pub use random_seed::RandomSeed;
pub use rank_repair::RankRepair;

/// Everything a policy may read about an event.
#[derive(Clone, Debug)]
pub struct GroupingContext {
    pub event: Event,
    /// Sorted by name
    pub groups: Vec<Group>,
    /// Active enrollments, sorted by player id
    pub players: Vec<PlayerId>,
    /// Sorted by rank
    pub standings: Vec<Standing>,
    /// Highest round with a heat, if any
    pub last_round: Option<u32>,
}

impl GroupingContext {
    pub fn load<S: Store + ?Sized>(store: &S, event: EventId) -> EngineResult<Self> {
        let event = store.event(event)?.ok_or(EngineError::UnknownEvent(event))?;
        let groups = store.groups(event.id)?;
        let mut players: Vec<PlayerId> = store
            .enrollments(event.id)?
            .into_iter()
            .filter(|e| e.is_active())
            .map(|e| e.player)
            .collect();
        players.sort_unstable();
        players.dedup();
        let standings = store.standings(event.id)?;
        let last_round = store.heats(event.id)?.iter().map(|h| h.key.round).max();

        Ok(GroupingContext {
            event,
            groups,
            players,
            standings,
            last_round,
        })
    }

    pub(crate) fn group_named(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Heats and memberships replacing one round range.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupingPlan {
    pub event: EventId,
    pub rounds: RangeInclusive<u32>,
    pub heats: Vec<Heat>,
    pub memberships: Vec<GroupMembership>,
    /// Serial number to player, only for the fixed schedule
    pub serials: Option<BTreeMap<u8, PlayerId>>,
}

impl GroupingPlan {
    pub(crate) fn new(event: EventId, rounds: RangeInclusive<u32>) -> Self {
        GroupingPlan {
            event,
            rounds,
            heats: Vec::new(),
            memberships: Vec::new(),
            serials: None,
        }
    }

    /// Record `players` as the members of `group` in `round`, with its heat.
    pub(crate) fn seat(&mut self, round: u32, group: &Group, players: &[PlayerId]) {
        self.heats.push(Heat::new(self.event, round, group.id));
        self.memberships.extend(players.iter().map(|&player| GroupMembership {
            event: self.event,
            round,
            group: group.id,
            player,
        }));
    }

    /// Distinct players seated anywhere in the plan.
    pub fn players_placed(&self) -> usize {
        let mut players: Vec<PlayerId> = self.memberships.iter().map(|m| m.player).collect();
        players.sort_unstable();
        players.dedup();
        players.len()
    }

    /// Members of one (round, group) cell.
    pub fn members(&self, round: u32, group: &Group) -> Vec<PlayerId> {
        self.memberships
            .iter()
            .filter(|m| m.round == round && m.group == group.id)
            .map(|m| m.player)
            .collect()
    }

    pub fn into_transaction(self) -> Transaction {
        Mutation::ReplaceRounds {
            event: self.event,
            rounds: self.rounds,
            heats: self.heats,
            memberships: self.memberships,
        }
        .into()
    }
}

/// A way of filling rounds with groups.
pub trait GroupingPolicy {
    fn name(&self) -> &'static str;

    fn plan(&self, ctx: &GroupingContext, rng: &mut ChaCha8Rng) -> EngineResult<GroupingPlan>;
}

/// Caller-selected grouping policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupingStrategy {
    /// Shuffle active players round-robin into every group for round 1
    RandomSeed,
    /// Seat the top twelve of the standings into groups A and B for the next round
    RankRepair,
    /// Map 36 players onto the fixed five-round schedule
    FixedSchedule,
    /// Reshuffle every round independently into the configured group count
    PerRoundRandom,
}

impl GroupingStrategy {
    pub fn policy(self) -> &'static dyn GroupingPolicy {
        match self {
            GroupingStrategy::RandomSeed => &RandomSeed,
            GroupingStrategy::RankRepair => &RankRepair,
            GroupingStrategy::FixedSchedule => &FixedSchedule,
            GroupingStrategy::PerRoundRandom => &PerRoundRandom,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::model::Format;

    pub fn make_context(players: usize, group_names: &[&str], format: Format, rounds: u32) -> GroupingContext {
        let groups = group_names
            .iter()
            .enumerate()
            .map(|(i, name)| Group {
                id: 10 + i as i64,
                event: 1,
                name: name.to_string(),
            })
            .collect();

        GroupingContext {
            event: Event::new(1, "Cup", format, rounds, group_names.len() as u32),
            groups,
            players: (1..=players as i64).collect(),
            standings: Vec::new(),
            last_round: None,
        }
    }

    pub fn make_standings(players: usize) -> Vec<Standing> {
        (1..=players)
            .map(|i| Standing {
                event: 1,
                player: 1000 + i as i64,
                total_score: 10 + i as u32,
                rank: i as u32,
                qualified: false,
                notes: String::new(),
            })
            .collect()
    }
}
