//! Error types for the scheduling and scoring engine.

use thiserror::Error;

use crate::model::{EventId, HeatKey, PlayerId};

/// Coarse classification of an [`EngineError`].
///
/// Callers use this to decide how to surface a failure: precondition errors are
/// usage mistakes, lookup errors are per-item and never abort a batch, and
/// consistency errors mean the stored input is corrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Precondition,
    Lookup,
    Consistency,
    Store,
    Config,
}

/// Engine error
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown event {0}")]
    UnknownEvent(EventId),

    #[error("unknown event format: {0}")]
    UnknownFormat(String),

    #[error("event {0} has no groups")]
    NoGroups(EventId),

    #[error("event {event} is configured for {needed} groups but has {found}")]
    NotEnoughGroups {
        event: EventId,
        needed: usize,
        found: usize,
    },

    #[error("event {0} has no active enrollments")]
    NoActiveEnrollments(EventId),

    #[error("event {0} has no standings; recompute standings first")]
    NoStandings(EventId),

    #[error("event {event} needs groups named {needed:?} to pair from standings")]
    MissingRepairGroups {
        event: EventId,
        needed: Vec<&'static str>,
    },

    #[error("event {0} has no rounds yet; seed round 1 before pairing from standings")]
    RepairWouldSeedFirstRound(EventId),

    #[error("fixed schedule needs exactly {expected} enrolled players, found {found}")]
    WrongCohortSize { expected: usize, found: usize },

    #[error("fixed schedule needs group {0:?}")]
    MissingScheduleGroup(&'static str),

    #[error("place {place} is outside {min}..={max}")]
    InvalidPlace { place: u32, min: u32, max: u32 },

    #[error("horse index {index} is invalid, event allows {allowed} per round")]
    InvalidHorseIndex { index: u8, allowed: u8 },

    #[error("player {player} has no group in round {round}")]
    NotInRound { player: PlayerId, round: u32 },

    #[error("only the heat host (player {host}) may set the room code")]
    NotRoomHost { host: PlayerId },

    #[error("invalid room code: {0}")]
    InvalidRoomCode(String),

    #[error("no membership for player {player} in round {round} of event {event}")]
    MissingMembership {
        event: EventId,
        player: PlayerId,
        round: u32,
    },

    #[error("no heat for {0:?}")]
    MissingHeat(HeatKey),

    #[error("schedule cell round {round} group {group} resolved to {found} players, expected {expected}")]
    ScheduleCellMismatch {
        round: u32,
        group: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::MissingMembership { .. } | EngineError::MissingHeat(_) => ErrorKind::Lookup,
            EngineError::ScheduleCellMismatch { .. } => ErrorKind::Consistency,
            EngineError::Store(_) => ErrorKind::Store,
            EngineError::ConfigIo(_) | EngineError::ConfigParse(_) => ErrorKind::Config,
            _ => ErrorKind::Precondition,
        }
    }
}

/// Engine result type
pub type EngineResult<T> = Result<T, EngineError>;

/// Failure raised by a [`Store`](crate::store::Store) while applying a transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("duplicate {table} row: {key}")]
    Duplicate { table: &'static str, key: String },

    #[error("{table} row references missing {target}: {key}")]
    Dangling {
        table: &'static str,
        target: &'static str,
        key: String,
    },

    #[error("backend error: {0}")]
    Backend(String),
}

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;
