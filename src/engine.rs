//! The engine facade: every operation the host application calls.
//!
//! Each operation reads what it needs from the store, computes the new rows
//! and commits them as one transaction. Nothing is written when an operation
//! returns an error.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::constants::{PAYOUT_PLACES, ROOM_CODE_MAX_LEN};
use crate::error::{EngineError, EngineResult};
use crate::grouping::{GroupingContext, GroupingPlan, GroupingStrategy};
use crate::model::{Event, EventId, GroupId, HeatKey, Payout, Placement, PlayerId, SelfReport};
use crate::payout::{build_payouts, PayoutParams};
use crate::reconcile::{plan_reconcile, validate_submission, ReconcileReport};
use crate::standings::{aggregate, ranked_totals};
use crate::store::{Mutation, Store};

/// Scheduling and scoring engine over a [`Store`].
pub struct Engine<S: Store> {
    store: S,
    config: EngineConfig,
    rng: ChaCha8Rng,
}

impl<S: Store> Engine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Engine { store, config, rng }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct access for loading players, events, groups and enrollments.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn require_event(&self, event: EventId) -> EngineResult<Event> {
        self.store.event(event)?.ok_or(EngineError::UnknownEvent(event))
    }

    /// Rebuild the event's standings from its non-NPC placements.
    ///
    /// Returns `(player, total)` in rank order.
    pub fn recompute_standings(&mut self, event: EventId) -> EngineResult<Vec<(PlayerId, u32)>> {
        let event = self.require_event(event)?;
        let rows = aggregate(event.id, &self.store.placements(event.id)?);
        let ranked = ranked_totals(&rows);

        self.store
            .commit(Mutation::ReplaceStandings { event: event.id, rows }.into())?;
        info!(event = event.id, players = ranked.len(), "recomputed standings");
        Ok(ranked)
    }

    /// Replace the event's payouts from its current standings.
    ///
    /// With fewer than six ranked players nothing is written and the result is empty.
    pub fn compute_payouts(
        &mut self,
        event: EventId,
        params: Option<&PayoutParams>,
    ) -> EngineResult<Vec<Payout>> {
        let event = self.require_event(event)?;
        let params = params.unwrap_or(&self.config.payout);
        let standings = self.store.standings(event.id)?;
        if standings.len() < PAYOUT_PLACES {
            warn!(
                event = event.id,
                ranked = standings.len(),
                "fewer than {PAYOUT_PLACES} standings, payouts left unchanged"
            );
            return Ok(Vec::new());
        }

        let rows = build_payouts(&event, &standings, params);
        self.store.commit(
            Mutation::ReplacePayouts {
                event: event.id,
                rows: rows.clone(),
            }
            .into(),
        )?;
        info!(event = event.id, pool = params.pool, format = %event.format, "computed payouts");
        Ok(rows)
    }

    /// Plan and commit one grouping run, returning the committed plan.
    pub fn run_grouping(
        &mut self,
        event: EventId,
        strategy: GroupingStrategy,
    ) -> EngineResult<GroupingPlan> {
        let ctx = GroupingContext::load(&self.store, event)?;
        let policy = strategy.policy();
        let plan = policy.plan(&ctx, &mut self.rng)?;

        self.store.commit(plan.clone().into_transaction())?;
        info!(
            event,
            policy = policy.name(),
            rounds = ?plan.rounds,
            heats = plan.heats.len(),
            players = plan.players_placed(),
            "committed grouping"
        );
        Ok(plan)
    }

    /// Shuffle active players into round 1. Returns the number of players placed.
    pub fn seed_first_round(&mut self, event: EventId) -> EngineResult<usize> {
        Ok(self.run_grouping(event, GroupingStrategy::RandomSeed)?.players_placed())
    }

    /// Seat the top twelve of the standings into the next round.
    pub fn repair_next_round(&mut self, event: EventId) -> EngineResult<usize> {
        Ok(self.run_grouping(event, GroupingStrategy::RankRepair)?.players_placed())
    }

    /// Seat exactly 36 players by the fixed schedule. Returns serial -> player.
    pub fn seed_fixed_schedule(&mut self, event: EventId) -> EngineResult<BTreeMap<u8, PlayerId>> {
        let plan = self.run_grouping(event, GroupingStrategy::FixedSchedule)?;
        Ok(plan.serials.unwrap_or_default())
    }

    pub fn seed_per_round_random(&mut self, event: EventId) -> EngineResult<usize> {
        Ok(self.run_grouping(event, GroupingStrategy::PerRoundRandom)?.players_placed())
    }

    /// Unverified self-reports of an event.
    pub fn pending_self_reports(&self, event: EventId) -> EngineResult<Vec<SelfReport>> {
        Ok(self
            .store
            .self_reports(event)?
            .into_iter()
            .filter(|r| !r.verified)
            .collect())
    }

    /// Turn a batch of self-reports into placements and refresh standings.
    ///
    /// Lookup failures are returned in the report; they do not fail the call.
    pub fn reconcile_self_reports(&mut self, batch: &[SelfReport]) -> EngineResult<ReconcileReport> {
        let (tx, report) = plan_reconcile(&self.store, batch)?;
        if !tx.is_empty() {
            self.store.commit(tx)?;
        }
        info!(
            written = report.rounds_written,
            failed = report.failures.len(),
            events = ?report.events_recomputed,
            "reconciled self-reports"
        );
        Ok(report)
    }

    /// Store a player's own report of one horse's place, pending verification.
    pub fn submit_self_report(
        &mut self,
        event: EventId,
        player: PlayerId,
        round: u32,
        horse_index: u8,
        place: u32,
    ) -> EngineResult<SelfReport> {
        let event = self.require_event(event)?;
        let report = SelfReport {
            event: event.id,
            player,
            round,
            horse_index,
            place,
            verified: false,
        };
        let memberships = self.store.memberships(event.id)?;
        validate_submission(&event, &memberships, &report, self.config.place_range)?;

        self.store.commit(Mutation::UpsertSelfReport(report.clone()).into())?;
        info!(event = event.id, player, round, horse_index, place, "stored self-report");
        Ok(report)
    }

    /// The member of a heat whose name sorts first, ignoring case.
    pub fn heat_host(&self, heat: HeatKey) -> EngineResult<Option<PlayerId>> {
        let mut members: Vec<(String, PlayerId)> = Vec::new();
        for m in self.store.memberships(heat.event)? {
            if m.heat_key() != heat {
                continue;
            }
            let name = match self.store.player(m.player)? {
                Some(p) => p.name.to_lowercase(),
                None => m.player.to_string(),
            };
            members.push((name, m.player));
        }
        Ok(members.into_iter().min().map(|(_, player)| player))
    }

    /// Set a heat's room code on behalf of `player`, who must be the host.
    pub fn set_room_code(
        &mut self,
        event: EventId,
        round: u32,
        group: GroupId,
        player: PlayerId,
        code: &str,
    ) -> EngineResult<String> {
        let key = HeatKey { event, round, group };
        if !self.store.heats(event)?.iter().any(|h| h.key == key) {
            return Err(EngineError::MissingHeat(key));
        }
        let is_member = self
            .store
            .memberships(event)?
            .iter()
            .any(|m| m.heat_key() == key && m.player == player);
        if !is_member {
            return Err(EngineError::NotInRound { player, round });
        }
        let host = self
            .heat_host(key)?
            .ok_or(EngineError::NotInRound { player, round })?;
        if host != player {
            return Err(EngineError::NotRoomHost { host });
        }

        let code = code.trim();
        if code.is_empty() {
            return Err(EngineError::InvalidRoomCode("code is empty".to_string()));
        }
        if code.chars().count() > ROOM_CODE_MAX_LEN {
            return Err(EngineError::InvalidRoomCode(format!(
                "code is longer than {ROOM_CODE_MAX_LEN} characters"
            )));
        }

        self.store.commit(
            Mutation::SetRoomCode {
                heat: key,
                code: code.to_string(),
            }
            .into(),
        )?;
        info!(event, round, group, player, "room code set");
        Ok(code.to_string())
    }

    /// Record a placement directly, as staff would after a heat.
    ///
    /// Standings are not refreshed; call [`Engine::recompute_standings`] once
    /// the round is entered.
    #[allow(clippy::too_many_arguments)]
    pub fn record_result(
        &mut self,
        event: EventId,
        round: u32,
        group: GroupId,
        player: PlayerId,
        horse_no: u8,
        place: u32,
        is_npc: bool,
    ) -> EngineResult<Placement> {
        let ev = self.require_event(event)?;
        let (min, max) = self.config.place_range;
        if place < min || place > max {
            return Err(EngineError::InvalidPlace { place, min, max });
        }
        let allowed = ev.format.horses_per_round();
        if horse_no == 0 || horse_no > allowed {
            return Err(EngineError::InvalidHorseIndex {
                index: horse_no,
                allowed,
            });
        }
        let heat = HeatKey { event, round, group };
        if !self.store.heats(event)?.iter().any(|h| h.key == heat) {
            return Err(EngineError::MissingHeat(heat));
        }

        let placement = Placement {
            heat,
            player,
            horse_no,
            place,
            is_npc,
        };
        self.store.commit(Mutation::UpsertPlacement(placement.clone()).into())?;
        info!(event, round, group, player, horse_no, place, is_npc, "recorded result");
        Ok(placement)
    }
}
