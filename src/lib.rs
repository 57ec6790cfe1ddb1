//! Heat Core - scheduling and scoring engine for multi-round racing events.
//!
//! Players are seated into groups round by round, their placements roll up into
//! cumulative standings, and the top six share a prize pool on a decay curve.
//! Optional Python bindings are built with the `python` feature.

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod model;
pub mod payout;
pub mod reconcile;
pub mod schedule;
pub mod standings;
pub mod store;

#[cfg(feature = "python")]
mod python;

pub use config::EngineConfig;
pub use constants::{DEFAULT_POOL, FINAL_BONUSES, PAYOUT_PLACES};
pub use engine::Engine;
pub use error::{EngineError, EngineResult, ErrorKind, StoreError, StoreResult};
pub use grouping::{GroupingContext, GroupingPlan, GroupingPolicy, GroupingStrategy};
pub use model::{
    Enrollment, EnrollmentStatus, Event, EventId, Format, Group, GroupId, GroupMembership, Heat,
    HeatKey, Payout, Placement, Player, PlayerId, SelfReport, Standing,
};
pub use payout::{base_shares, build_payouts, PayoutParams};
pub use reconcile::{ReconcileFailure, ReconcileReport};
pub use schedule::ScheduleTable;
pub use standings::aggregate;
pub use store::{MemoryStore, Mutation, Store, Transaction};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module definition
#[cfg(feature = "python")]
#[pymodule]
fn heat_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Classes
    m.add_class::<python::PyEngine>()?;
    m.add_class::<Format>()?;
    m.add_class::<Player>()?;
    m.add_class::<Event>()?;
    m.add_class::<Group>()?;
    m.add_class::<HeatKey>()?;
    m.add_class::<Heat>()?;
    m.add_class::<GroupMembership>()?;
    m.add_class::<Placement>()?;
    m.add_class::<SelfReport>()?;
    m.add_class::<Standing>()?;
    m.add_class::<Payout>()?;

    // Constants
    m.add("DEFAULT_POOL", DEFAULT_POOL)?;
    m.add("PAYOUT_PLACES", PAYOUT_PLACES)?;
    m.add("FINAL_BONUSES", FINAL_BONUSES.to_vec())?;
    m.add("ROOM_CODE_MAX_LEN", constants::ROOM_CODE_MAX_LEN)?;

    Ok(())
}
