//! In-memory store.
//!
//! Reference [`Store`] used by tests, benches and the Python bindings. A commit
//! stages all mutations on a copy of the tables and swaps it in only when every
//! mutation succeeded.

use std::collections::BTreeMap;

use super::{Mutation, Store, Transaction};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    Enrollment, EnrollmentStatus, Event, EventId, Group, GroupId, GroupMembership, Heat, HeatKey,
    Payout, Placement, Player, PlayerId, SelfReport, Standing,
};

#[derive(Clone, Debug, Default)]
struct Tables {
    players: BTreeMap<PlayerId, Player>,
    events: BTreeMap<EventId, Event>,
    groups: BTreeMap<GroupId, Group>,
    enrollments: BTreeMap<(EventId, PlayerId), Enrollment>,
    heats: BTreeMap<HeatKey, Heat>,
    // (event, round, player)
    memberships: BTreeMap<(EventId, u32, PlayerId), GroupMembership>,
    // (heat, player, horse_no)
    placements: BTreeMap<(HeatKey, PlayerId, u8), Placement>,
    // (event, player, round, horse_index)
    self_reports: BTreeMap<(EventId, PlayerId, u32, u8), SelfReport>,
    standings: BTreeMap<(EventId, PlayerId), Standing>,
    payouts: BTreeMap<(EventId, PlayerId), Payout>,
}

/// In-memory store
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_player(&mut self, player: Player) {
        self.tables.players.insert(player.id, player);
    }

    pub fn insert_event(&mut self, event: Event) {
        self.tables.events.insert(event.id, event);
    }

    pub fn insert_group(&mut self, group: Group) {
        self.tables.groups.insert(group.id, group);
    }

    pub fn enroll(&mut self, event: EventId, player: PlayerId, status: EnrollmentStatus) {
        self.tables
            .enrollments
            .insert((event, player), Enrollment { event, player, status });
    }

    /// Row counts per table, for diagnostics.
    pub fn stats(&self) -> StoreStats {
        let t = &self.tables;
        StoreStats {
            heats: t.heats.len(),
            memberships: t.memberships.len(),
            placements: t.placements.len(),
            self_reports: t.self_reports.len(),
            standings: t.standings.len(),
            payouts: t.payouts.len(),
        }
    }
}

/// Row counts of the engine-owned tables
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub heats: usize,
    pub memberships: usize,
    pub placements: usize,
    pub self_reports: usize,
    pub standings: usize,
    pub payouts: usize,
}

impl Tables {
    fn apply(&mut self, mutation: Mutation) -> StoreResult<()> {
        match mutation {
            Mutation::ReplaceRounds {
                event,
                rounds,
                heats,
                memberships,
            } => {
                let old_heats: BTreeMap<HeatKey, Heat> = self
                    .heats
                    .iter()
                    .filter(|(k, _)| k.event == event && rounds.contains(&k.round))
                    .map(|(k, h)| (*k, h.clone()))
                    .collect();
                self.heats.retain(|k, _| !(k.event == event && rounds.contains(&k.round)));
                self.memberships
                    .retain(|(e, r, _), _| !(*e == event && rounds.contains(r)));

                for mut heat in heats {
                    self.check_group(event, heat.key.group, "heat")?;
                    if heat.key.event != event || !rounds.contains(&heat.key.round) {
                        return Err(outside_range("heat", format!("{:?}", heat.key)));
                    }
                    if self.heats.contains_key(&heat.key) {
                        return Err(duplicate("heat", format!("{:?}", heat.key)));
                    }
                    // recreated heats keep the code their host already shared
                    if heat.room_code.is_empty() {
                        if let Some(old) = old_heats.get(&heat.key) {
                            heat.room_code = old.room_code.clone();
                        }
                    }
                    self.heats.insert(heat.key, heat);
                }

                for membership in memberships {
                    self.check_group(event, membership.group, "membership")?;
                    if membership.event != event || !rounds.contains(&membership.round) {
                        return Err(outside_range("membership", format!("{membership:?}")));
                    }
                    let key = (membership.event, membership.round, membership.player);
                    if self.memberships.contains_key(&key) {
                        return Err(duplicate("membership", format!("{key:?}")));
                    }
                    self.memberships.insert(key, membership);
                }

                let heats = &self.heats;
                self.placements.retain(|(heat, _, _), _| {
                    heat.event != event || !rounds.contains(&heat.round) || heats.contains_key(heat)
                });
            }
            Mutation::ReplaceStandings { event, rows } => {
                self.standings.retain(|(e, _), _| *e != event);
                for row in rows {
                    let key = (event, row.player);
                    if self.standings.contains_key(&key) {
                        return Err(duplicate("standing", format!("{key:?}")));
                    }
                    self.standings.insert(key, Standing { event, ..row });
                }
            }
            Mutation::ReplacePayouts { event, rows } => {
                self.payouts.retain(|(e, _), _| *e != event);
                for row in rows {
                    let key = (event, row.player);
                    if self.payouts.contains_key(&key) {
                        return Err(duplicate("payout", format!("{key:?}")));
                    }
                    self.payouts.insert(key, Payout { event, ..row });
                }
            }
            Mutation::UpsertPlacement(placement) => {
                if !self.heats.contains_key(&placement.heat) {
                    return Err(dangling("placement", "heat", format!("{:?}", placement.heat)));
                }
                self.placements.insert(
                    (placement.heat, placement.player, placement.horse_no),
                    placement,
                );
            }
            Mutation::UpsertSelfReport(report) => {
                self.self_reports.insert(
                    (report.event, report.player, report.round, report.horse_index),
                    report,
                );
            }
            Mutation::MarkVerified {
                event,
                player,
                round,
                horses,
            } => {
                for horse in horses {
                    if let Some(report) = self.self_reports.get_mut(&(event, player, round, horse)) {
                        report.verified = true;
                    }
                }
            }
            Mutation::SetRoomCode { heat, code } => match self.heats.get_mut(&heat) {
                Some(row) => row.room_code = code,
                None => return Err(dangling("room code", "heat", format!("{heat:?}"))),
            },
        }
        Ok(())
    }

    fn check_group(&self, event: EventId, group: GroupId, table: &'static str) -> StoreResult<()> {
        match self.groups.get(&group) {
            Some(g) if g.event == event => Ok(()),
            _ => Err(dangling(table, "group", group.to_string())),
        }
    }
}

fn duplicate(table: &'static str, key: String) -> StoreError {
    StoreError::Duplicate { table, key }
}

fn dangling(table: &'static str, target: &'static str, key: String) -> StoreError {
    StoreError::Dangling { table, target, key }
}

fn outside_range(table: &'static str, key: String) -> StoreError {
    StoreError::Backend(format!("{table} row outside replaced range: {key}"))
}

impl Store for MemoryStore {
    fn event(&self, event: EventId) -> StoreResult<Option<Event>> {
        Ok(self.tables.events.get(&event).cloned())
    }

    fn player(&self, player: PlayerId) -> StoreResult<Option<Player>> {
        Ok(self.tables.players.get(&player).cloned())
    }

    fn enrollments(&self, event: EventId) -> StoreResult<Vec<Enrollment>> {
        Ok(self
            .tables
            .enrollments
            .range((event, PlayerId::MIN)..=(event, PlayerId::MAX))
            .map(|(_, e)| e.clone())
            .collect())
    }

    fn groups(&self, event: EventId) -> StoreResult<Vec<Group>> {
        let mut groups: Vec<Group> = self
            .tables
            .groups
            .values()
            .filter(|g| g.event == event)
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    fn heats(&self, event: EventId) -> StoreResult<Vec<Heat>> {
        Ok(self
            .tables
            .heats
            .values()
            .filter(|h| h.key.event == event)
            .cloned()
            .collect())
    }

    fn memberships(&self, event: EventId) -> StoreResult<Vec<GroupMembership>> {
        Ok(self
            .tables
            .memberships
            .range((event, u32::MIN, PlayerId::MIN)..=(event, u32::MAX, PlayerId::MAX))
            .map(|(_, m)| m.clone())
            .collect())
    }

    fn placements(&self, event: EventId) -> StoreResult<Vec<Placement>> {
        Ok(self
            .tables
            .placements
            .values()
            .filter(|p| p.heat.event == event)
            .cloned()
            .collect())
    }

    fn self_reports(&self, event: EventId) -> StoreResult<Vec<SelfReport>> {
        Ok(self
            .tables
            .self_reports
            .values()
            .filter(|r| r.event == event)
            .cloned()
            .collect())
    }

    fn standings(&self, event: EventId) -> StoreResult<Vec<Standing>> {
        let mut rows: Vec<Standing> = self
            .tables
            .standings
            .range((event, PlayerId::MIN)..=(event, PlayerId::MAX))
            .map(|(_, s)| s.clone())
            .collect();
        rows.sort_by_key(|s| s.rank);
        Ok(rows)
    }

    fn payouts(&self, event: EventId) -> StoreResult<Vec<Payout>> {
        Ok(self
            .tables
            .payouts
            .range((event, PlayerId::MIN)..=(event, PlayerId::MAX))
            .map(|(_, p)| p.clone())
            .collect())
    }

    fn commit(&mut self, tx: Transaction) -> StoreResult<()> {
        let mut staged = self.tables.clone();
        for mutation in tx.into_mutations() {
            staged.apply(mutation)?;
        }
        self.tables = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Format;

    fn make_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_event(Event::new(1, "Cup", Format::Prelim, 5, 2));
        store.insert_group(Group { id: 10, event: 1, name: "A".to_string() });
        store.insert_group(Group { id: 11, event: 1, name: "B".to_string() });
        store
    }

    fn membership(round: u32, group: GroupId, player: PlayerId) -> GroupMembership {
        GroupMembership { event: 1, round, group, player }
    }

    #[test]
    fn test_replace_rounds_is_scoped_to_range() {
        let mut store = make_store();
        for round in 1..=2 {
            store
                .commit(
                    Mutation::ReplaceRounds {
                        event: 1,
                        rounds: round..=round,
                        heats: vec![Heat::new(1, round, 10)],
                        memberships: vec![membership(round, 10, 100)],
                    }
                    .into(),
                )
                .unwrap();
        }

        store
            .commit(
                Mutation::ReplaceRounds {
                    event: 1,
                    rounds: 2..=2,
                    heats: vec![Heat::new(1, 2, 11)],
                    memberships: vec![membership(2, 11, 100)],
                }
                .into(),
            )
            .unwrap();

        let memberships = store.memberships(1).unwrap();
        assert_eq!(memberships, vec![membership(1, 10, 100), membership(2, 11, 100)]);
        assert_eq!(store.heats(1).unwrap().len(), 2);
    }

    #[test]
    fn test_failed_commit_leaves_tables_untouched() {
        let mut store = make_store();
        let mut tx = Transaction::new();
        tx.push(Mutation::ReplaceRounds {
            event: 1,
            rounds: 1..=1,
            heats: vec![Heat::new(1, 1, 10)],
            memberships: vec![membership(1, 10, 100), membership(1, 11, 100)],
        });

        let err = store.commit(tx).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { table: "membership", .. }));
        assert_eq!(store.stats(), StoreStats::default());
    }

    #[test]
    fn test_room_code_survives_recreated_heat_and_placements_cascade() {
        let mut store = make_store();
        store
            .commit(
                Mutation::ReplaceRounds {
                    event: 1,
                    rounds: 1..=1,
                    heats: vec![Heat::new(1, 1, 10), Heat::new(1, 1, 11)],
                    memberships: vec![membership(1, 10, 100), membership(1, 11, 101)],
                }
                .into(),
            )
            .unwrap();

        let key_a = HeatKey { event: 1, round: 1, group: 10 };
        let key_b = HeatKey { event: 1, round: 1, group: 11 };
        let mut tx = Transaction::new();
        tx.push(Mutation::SetRoomCode { heat: key_a, code: "ROOM-1".to_string() });
        for (heat, player) in [(key_a, 100), (key_b, 101)] {
            tx.push(Mutation::UpsertPlacement(Placement {
                heat,
                player,
                horse_no: 1,
                place: 3,
                is_npc: false,
            }));
        }
        store.commit(tx).unwrap();

        store
            .commit(
                Mutation::ReplaceRounds {
                    event: 1,
                    rounds: 1..=1,
                    heats: vec![Heat::new(1, 1, 10)],
                    memberships: vec![membership(1, 10, 100), membership(1, 10, 101)],
                }
                .into(),
            )
            .unwrap();

        let heats = store.heats(1).unwrap();
        assert_eq!(heats.len(), 1);
        assert_eq!(heats[0].room_code, "ROOM-1");
        let placements = store.placements(1).unwrap();
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].heat, key_a);
    }

    #[test]
    fn test_placement_requires_heat() {
        let mut store = make_store();
        let err = store
            .commit(
                Mutation::UpsertPlacement(Placement {
                    heat: HeatKey { event: 1, round: 1, group: 10 },
                    player: 100,
                    horse_no: 1,
                    place: 1,
                    is_npc: false,
                })
                .into(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Dangling { target: "heat", .. }));
    }
}
