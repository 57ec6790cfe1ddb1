//! Storage seam.
//!
//! The engine never talks to a database directly. It reads rows through
//! [`Store`] and writes every change of one operation as a single
//! [`Transaction`], which the store must apply all-or-nothing.

pub mod memory;

use std::ops::RangeInclusive;

use crate::error::StoreResult;
use crate::model::{
    Enrollment, Event, EventId, Group, GroupMembership, Heat, HeatKey, Payout, Placement, Player,
    PlayerId, SelfReport, Standing,
};

pub use memory::MemoryStore;

/// Read access plus atomic commit.
///
/// Listing methods return rows in a stable order: groups by name, heats and
/// memberships by round, standings by rank.
pub trait Store {
    fn event(&self, event: EventId) -> StoreResult<Option<Event>>;

    fn player(&self, player: PlayerId) -> StoreResult<Option<Player>>;

    fn enrollments(&self, event: EventId) -> StoreResult<Vec<Enrollment>>;

    fn groups(&self, event: EventId) -> StoreResult<Vec<Group>>;

    fn heats(&self, event: EventId) -> StoreResult<Vec<Heat>>;

    fn memberships(&self, event: EventId) -> StoreResult<Vec<GroupMembership>>;

    fn placements(&self, event: EventId) -> StoreResult<Vec<Placement>>;

    fn self_reports(&self, event: EventId) -> StoreResult<Vec<SelfReport>>;

    fn standings(&self, event: EventId) -> StoreResult<Vec<Standing>>;

    fn payouts(&self, event: EventId) -> StoreResult<Vec<Payout>>;

    /// Apply every mutation of `tx` or none of them.
    fn commit(&mut self, tx: Transaction) -> StoreResult<()>;
}

/// One change inside a [`Transaction`].
#[derive(Clone, Debug)]
pub enum Mutation {
    /// Delete heats and memberships of `rounds`, then insert the given rows.
    ReplaceRounds {
        event: EventId,
        rounds: RangeInclusive<u32>,
        heats: Vec<Heat>,
        memberships: Vec<GroupMembership>,
    },
    ReplaceStandings { event: EventId, rows: Vec<Standing> },
    ReplacePayouts { event: EventId, rows: Vec<Payout> },
    /// Insert or overwrite the row keyed by (heat, player, horse_no).
    UpsertPlacement(Placement),
    /// Insert or overwrite the row keyed by (event, player, round, horse_index).
    UpsertSelfReport(SelfReport),
    /// Mark the listed horses' self-reports for (event, player, round) verified.
    MarkVerified {
        event: EventId,
        player: PlayerId,
        round: u32,
        horses: Vec<u8>,
    },
    SetRoomCode { heat: HeatKey, code: String },
}

/// Ordered batch of mutations committed atomically.
#[derive(Clone, Debug, Default)]
pub struct Transaction {
    mutations: Vec<Mutation>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mutation: Mutation) -> &mut Self {
        self.mutations.push(mutation);
        self
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }
}

impl From<Mutation> for Transaction {
    fn from(mutation: Mutation) -> Self {
        Transaction {
            mutations: vec![mutation],
        }
    }
}
