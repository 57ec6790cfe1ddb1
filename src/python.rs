//! Python bindings over an in-memory engine.

use pyo3::exceptions::{PyIOError, PyLookupError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{EngineError, ErrorKind};
use crate::model::{
    EnrollmentStatus, Event, EventId, Format, Group, GroupId, GroupMembership, Heat, Payout,
    Placement, Player, PlayerId, SelfReport, Standing,
};
use crate::store::{MemoryStore, Store};

impl From<EngineError> for PyErr {
    fn from(err: EngineError) -> PyErr {
        let msg = err.to_string();
        match err.kind() {
            ErrorKind::Precondition => PyValueError::new_err(msg),
            ErrorKind::Lookup => PyLookupError::new_err(msg),
            ErrorKind::Consistency | ErrorKind::Store => PyRuntimeError::new_err(msg),
            ErrorKind::Config => PyIOError::new_err(msg),
        }
    }
}

#[pymethods]
impl SelfReport {
    #[new]
    #[pyo3(signature = (event, player, round, place, horse_index = 1, verified = false))]
    fn py_new(
        event: EventId,
        player: PlayerId,
        round: u32,
        place: u32,
        horse_index: u8,
        verified: bool,
    ) -> Self {
        SelfReport {
            event,
            player,
            round,
            horse_index,
            place,
            verified,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SelfReport(event={}, player={}, round={}, horse={}, place={}, verified={})",
            self.event, self.player, self.round, self.horse_index, self.place, self.verified
        )
    }
}

/// Engine bound to an in-memory store that Python fills with its own rows.
#[pyclass(name = "Engine")]
pub struct PyEngine {
    inner: Engine<MemoryStore>,
}

#[pymethods]
impl PyEngine {
    #[new]
    #[pyo3(signature = (seed = None, config_path = None))]
    pub fn new(seed: Option<u64>, config_path: Option<&str>) -> PyResult<Self> {
        let mut config = match config_path {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };
        if let Some(seed) = seed {
            config = config.with_seed(seed);
        }
        Ok(PyEngine {
            inner: Engine::new(MemoryStore::new(), config),
        })
    }

    pub fn add_player(&mut self, id: PlayerId, name: String) {
        self.inner.store_mut().insert_player(Player::new(id, name));
    }

    #[pyo3(signature = (id, name, format, rounds = 5, group_count = 3))]
    pub fn add_event(
        &mut self,
        id: EventId,
        name: String,
        format: &str,
        rounds: u32,
        group_count: u32,
    ) -> PyResult<()> {
        let format: Format = format.parse()?;
        self.inner
            .store_mut()
            .insert_event(Event::new(id, name, format, rounds, group_count));
        Ok(())
    }

    pub fn add_group(&mut self, id: GroupId, event: EventId, name: String) {
        self.inner.store_mut().insert_group(Group { id, event, name });
    }

    #[pyo3(signature = (event, player, status = "active"))]
    pub fn enroll(&mut self, event: EventId, player: PlayerId, status: &str) {
        self.inner
            .store_mut()
            .enroll(event, player, EnrollmentStatus::from_label(status));
    }

    pub fn recompute_standings(&mut self, event: EventId) -> PyResult<Vec<(PlayerId, u32)>> {
        Ok(self.inner.recompute_standings(event)?)
    }

    /// Payouts for the top six. Unset parameters fall back to the engine config.
    #[pyo3(signature = (event, pool = None, decay = None, min_last_share = None))]
    pub fn compute_payouts(
        &mut self,
        event: EventId,
        pool: Option<u32>,
        decay: Option<f64>,
        min_last_share: Option<f64>,
    ) -> PyResult<Vec<Payout>> {
        let mut params = self.inner.config().payout.clone();
        if let Some(pool) = pool {
            params.pool = pool;
        }
        if let Some(decay) = decay {
            params.decay = decay;
        }
        if let Some(floor) = min_last_share {
            params.min_last_share = floor;
        }
        Ok(self.inner.compute_payouts(event, Some(&params))?)
    }

    pub fn seed_first_round(&mut self, event: EventId) -> PyResult<usize> {
        Ok(self.inner.seed_first_round(event)?)
    }

    pub fn repair_next_round(&mut self, event: EventId) -> PyResult<usize> {
        Ok(self.inner.repair_next_round(event)?)
    }

    pub fn seed_fixed_schedule(&mut self, event: EventId) -> PyResult<BTreeMap<u8, PlayerId>> {
        Ok(self.inner.seed_fixed_schedule(event)?)
    }

    pub fn seed_per_round_random(&mut self, event: EventId) -> PyResult<usize> {
        Ok(self.inner.seed_per_round_random(event)?)
    }

    #[pyo3(signature = (event, player, round, place, horse_index = 1))]
    pub fn submit_self_report(
        &mut self,
        event: EventId,
        player: PlayerId,
        round: u32,
        place: u32,
        horse_index: u8,
    ) -> PyResult<SelfReport> {
        Ok(self
            .inner
            .submit_self_report(event, player, round, horse_index, place)?)
    }

    /// Reconcile `reports`, or every pending report of `event` when none are given.
    ///
    /// Returns `(rounds_written, failures, events_recomputed)` where each
    /// failure is `(event, player, round, message)`.
    #[pyo3(signature = (event = None, reports = None))]
    #[allow(clippy::type_complexity)]
    pub fn reconcile_self_reports(
        &mut self,
        event: Option<EventId>,
        reports: Option<Vec<SelfReport>>,
    ) -> PyResult<(usize, Vec<(EventId, PlayerId, u32, String)>, Vec<EventId>)> {
        let batch = match (reports, event) {
            (Some(reports), _) => reports,
            (None, Some(event)) => self.inner.pending_self_reports(event)?,
            (None, None) => {
                return Err(PyValueError::new_err("pass an event or a list of reports"));
            }
        };
        let report = self.inner.reconcile_self_reports(&batch)?;
        let failures = report
            .failures
            .into_iter()
            .map(|f| (f.event, f.player, f.round, f.error.to_string()))
            .collect();
        Ok((report.rounds_written, failures, report.events_recomputed))
    }

    pub fn set_room_code(
        &mut self,
        event: EventId,
        round: u32,
        group: GroupId,
        player: PlayerId,
        code: &str,
    ) -> PyResult<String> {
        Ok(self.inner.set_room_code(event, round, group, player, code)?)
    }

    #[pyo3(signature = (event, round, group, player, place, horse_no = 1, is_npc = false))]
    #[allow(clippy::too_many_arguments)]
    pub fn record_result(
        &mut self,
        event: EventId,
        round: u32,
        group: GroupId,
        player: PlayerId,
        place: u32,
        horse_no: u8,
        is_npc: bool,
    ) -> PyResult<Placement> {
        Ok(self
            .inner
            .record_result(event, round, group, player, horse_no, place, is_npc)?)
    }

    pub fn standings(&self, event: EventId) -> PyResult<Vec<Standing>> {
        Ok(self.inner.store().standings(event).map_err(EngineError::from)?)
    }

    pub fn payouts(&self, event: EventId) -> PyResult<Vec<Payout>> {
        Ok(self.inner.store().payouts(event).map_err(EngineError::from)?)
    }

    pub fn heats(&self, event: EventId) -> PyResult<Vec<Heat>> {
        Ok(self.inner.store().heats(event).map_err(EngineError::from)?)
    }

    pub fn memberships(&self, event: EventId) -> PyResult<Vec<GroupMembership>> {
        Ok(self.inner.store().memberships(event).map_err(EngineError::from)?)
    }

    pub fn placements(&self, event: EventId) -> PyResult<Vec<Placement>> {
        Ok(self.inner.store().placements(event).map_err(EngineError::from)?)
    }

    pub fn self_reports(&self, event: EventId) -> PyResult<Vec<SelfReport>> {
        Ok(self.inner.store().self_reports(event).map_err(EngineError::from)?)
    }

    fn __repr__(&self) -> String {
        let stats = self.inner.store().stats();
        format!(
            "Engine(heats={}, memberships={}, placements={}, standings={})",
            stats.heats, stats.memberships, stats.placements, stats.standings
        )
    }
}
