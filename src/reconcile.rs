//! Turning player self-reports into authoritative placements.
//!
//! Unverified reports are summed per (event, player, round) and written as a
//! single placement with horse number 1. In double-entry formats the round
//! score is therefore the sum of both horses' places. Only the reports in the
//! batch are marked verified. Reports whose player has no group or heat in
//! that round are reported back individually and left unverified; the rest of
//! the batch still goes through.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::model::{Event, EventId, GroupMembership, HeatKey, Placement, PlayerId, SelfReport};
use crate::standings::aggregate;
use crate::store::{Mutation, Store, Transaction};

/// One (event, player, round) that could not be reconciled.
#[derive(Debug)]
pub struct ReconcileFailure {
    pub event: EventId,
    pub player: PlayerId,
    pub round: u32,
    pub error: EngineError,
}

/// Outcome of a reconciliation batch
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// (event, player, round) groups written as placements
    pub rounds_written: usize,
    pub failures: Vec<ReconcileFailure>,
    /// Events whose standings were regenerated
    pub events_recomputed: Vec<EventId>,
}

struct EventView {
    memberships: HashMap<(u32, PlayerId), HeatKey>,
    heats: BTreeSet<HeatKey>,
    placements: BTreeMap<(HeatKey, PlayerId, u8), Placement>,
    touched: bool,
}

impl EventView {
    fn load<S: Store + ?Sized>(store: &S, event: EventId) -> EngineResult<Self> {
        let memberships = store
            .memberships(event)?
            .iter()
            .map(|m: &GroupMembership| ((m.round, m.player), m.heat_key()))
            .collect();
        let heats = store.heats(event)?.into_iter().map(|h| h.key).collect();
        let placements = store
            .placements(event)?
            .into_iter()
            .map(|p| ((p.heat, p.player, p.horse_no), p))
            .collect();
        Ok(EventView {
            memberships,
            heats,
            placements,
            touched: false,
        })
    }
}

/// Build the transaction that reconciles `batch`, including the standings
/// regeneration for every event that received a placement.
pub fn plan_reconcile<S: Store + ?Sized>(
    store: &S,
    batch: &[SelfReport],
) -> EngineResult<(Transaction, ReconcileReport)> {
    // A report listed twice in the batch counts once; the last copy wins
    let mut entries: BTreeMap<(EventId, PlayerId, u32, u8), u32> = BTreeMap::new();
    for report in batch.iter().filter(|r| !r.verified) {
        entries.insert(
            (report.event, report.player, report.round, report.horse_index),
            report.place,
        );
    }
    let mut sums: BTreeMap<(EventId, PlayerId, u32), (u32, Vec<u8>)> = BTreeMap::new();
    for ((event, player, round, horse), place) in entries {
        let (sum, horses) = sums.entry((event, player, round)).or_default();
        *sum += place;
        horses.push(horse);
    }

    let mut views: BTreeMap<EventId, EventView> = BTreeMap::new();
    let mut tx = Transaction::new();
    let mut report = ReconcileReport::default();

    for ((event, player, round), (place, horses)) in sums {
        if !views.contains_key(&event) {
            views.insert(event, EventView::load(store, event)?);
        }
        let Some(view) = views.get_mut(&event) else {
            continue;
        };

        let heat = match view.memberships.get(&(round, player)) {
            Some(heat) if view.heats.contains(heat) => *heat,
            Some(heat) => {
                warn!(event, player, round, "self-report heat is missing");
                report.failures.push(ReconcileFailure {
                    event,
                    player,
                    round,
                    error: EngineError::MissingHeat(*heat),
                });
                continue;
            }
            None => {
                warn!(event, player, round, "self-report has no group membership");
                report.failures.push(ReconcileFailure {
                    event,
                    player,
                    round,
                    error: EngineError::MissingMembership { event, player, round },
                });
                continue;
            }
        };

        let placement = Placement {
            heat,
            player,
            horse_no: 1,
            place,
            is_npc: false,
        };
        view.placements.insert((heat, player, 1), placement.clone());
        view.touched = true;
        tx.push(Mutation::UpsertPlacement(placement));
        tx.push(Mutation::MarkVerified {
            event,
            player,
            round,
            horses,
        });
        report.rounds_written += 1;
    }

    for (event, view) in views.into_iter().filter(|(_, v)| v.touched) {
        let placements: Vec<Placement> = view.placements.into_values().collect();
        tx.push(Mutation::ReplaceStandings {
            event,
            rows: aggregate(event, &placements),
        });
        report.events_recomputed.push(event);
    }

    info!(
        written = report.rounds_written,
        failed = report.failures.len(),
        events = report.events_recomputed.len(),
        "planned self-report reconciliation"
    );
    Ok((tx, report))
}

/// Check a self-report before it is stored.
pub fn validate_submission(
    event: &Event,
    memberships: &[GroupMembership],
    report: &SelfReport,
    place_range: (u32, u32),
) -> EngineResult<()> {
    let (min, max) = place_range;
    if report.place < min || report.place > max {
        return Err(EngineError::InvalidPlace {
            place: report.place,
            min,
            max,
        });
    }
    let allowed = event.format.horses_per_round();
    if report.horse_index == 0 || report.horse_index > allowed {
        return Err(EngineError::InvalidHorseIndex {
            index: report.horse_index,
            allowed,
        });
    }
    if !memberships
        .iter()
        .any(|m| m.player == report.player && m.round == report.round)
    {
        return Err(EngineError::NotInRound {
            player: report.player,
            round: report.round,
        });
    }
    Ok(())
}
