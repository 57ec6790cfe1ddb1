//! Records exchanged between the engine and the surrounding application.
//!
//! Identity rows (players, events, groups, enrollments) are supplied by the
//! caller. Heats, memberships, placements, standings and payouts are produced
//! or replaced by the engine.

#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

pub type PlayerId = i64;
pub type EventId = i64;
pub type GroupId = i64;

/// Competitor identity.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Player { id, name: name.into() }
    }
}

/// Event format. Selects horses per round and the payout bonus overlay.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Prelim,
    Qualifier,
    Settlement,
    FinalPre,
    Final,
}

impl Format {
    /// Entries each player runs per round: two in settlement and final events.
    pub fn horses_per_round(self) -> u8 {
        match self {
            Format::Settlement | Format::Final => 2,
            _ => 1,
        }
    }

    pub fn has_final_bonus(self) -> bool {
        self == Format::Final
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Prelim => "prelim",
            Format::Qualifier => "qualifier",
            Format::Settlement => "settlement",
            Format::FinalPre => "final_pre",
            Format::Final => "final",
        }
    }
}

impl FromStr for Format {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "prelim" => Ok(Format::Prelim),
            "qualifier" => Ok(Format::Qualifier),
            "settlement" => Ok(Format::Settlement),
            "final_pre" => Ok(Format::FinalPre),
            "final" => Ok(Format::Final),
            other => Err(EngineError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event configuration.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub format: Format,
    /// Configured round count `R`
    pub rounds: u32,
    pub group_count: u32,
}

impl Event {
    pub fn new(id: EventId, name: impl Into<String>, format: Format, rounds: u32, group_count: u32) -> Self {
        Event {
            id,
            name: name.into(),
            format,
            rounds,
            group_count,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Inactive,
}

impl EnrollmentStatus {
    /// Anything other than `active` counts as inactive.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("active") {
            EnrollmentStatus::Active
        } else {
            EnrollmentStatus::Inactive
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub event: EventId,
    pub player: PlayerId,
    pub status: EnrollmentStatus,
}

impl Enrollment {
    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Active
    }
}

/// Named group of an event, reused every round.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub event: EventId,
    pub name: String,
}

/// Identity of a heat: one group's session within one round.
#[cfg_attr(feature = "python", pyclass(get_all, eq, hash, frozen))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HeatKey {
    pub event: EventId,
    pub round: u32,
    pub group: GroupId,
}

#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heat {
    pub key: HeatKey,
    pub room_code: String,
}

impl Heat {
    pub fn new(event: EventId, round: u32, group: GroupId) -> Self {
        Heat {
            key: HeatKey { event, round, group },
            room_code: String::new(),
        }
    }
}

#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub event: EventId,
    pub round: u32,
    pub group: GroupId,
    pub player: PlayerId,
}

impl GroupMembership {
    pub fn heat_key(&self) -> HeatKey {
        HeatKey {
            event: self.event,
            round: self.round,
            group: self.group,
        }
    }
}

/// Authoritative placement for one entry in one heat.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub heat: HeatKey,
    pub player: PlayerId,
    /// 1, or 2 for the second entry in double-entry formats
    pub horse_no: u8,
    pub place: u32,
    /// NPC placeholder rows never count towards standings
    pub is_npc: bool,
}

/// Player-submitted placement awaiting verification.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfReport {
    pub event: EventId,
    pub player: PlayerId,
    pub round: u32,
    pub horse_index: u8,
    pub place: u32,
    pub verified: bool,
}

#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub event: EventId,
    pub player: PlayerId,
    /// Sum of places across rounds, lower is better
    pub total_score: u32,
    pub rank: u32,
    pub qualified: bool,
    pub notes: String,
}

#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub event: EventId,
    pub player: PlayerId,
    pub base_pool: u32,
    pub base_amount: f64,
    pub extra_bonus: f64,
    pub total_amount: f64,
}
