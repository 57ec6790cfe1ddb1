use std::collections::BTreeSet;

use heat_core::{
    Engine, EngineConfig, EngineError, EnrollmentStatus, ErrorKind, Event, Format, Group,
    MemoryStore, Player, PlayerId, Store,
};

const EVENT: i64 = 1;

fn make_engine(players: usize, groups: &[&str], format: Format, rounds: u32) -> Engine<MemoryStore> {
    let mut store = MemoryStore::new();
    store.insert_event(Event::new(EVENT, "Spring Cup", format, rounds, groups.len() as u32));
    for (i, name) in groups.iter().enumerate() {
        store.insert_group(Group {
            id: 10 + i as i64,
            event: EVENT,
            name: name.to_string(),
        });
    }
    for id in 1..=players as i64 {
        store.insert_player(Player::new(id, format!("player{id:02}")));
        store.enroll(EVENT, id, EnrollmentStatus::Active);
    }
    Engine::new(store, EngineConfig::default().with_seed(2024))
}

fn round_members(engine: &Engine<MemoryStore>, round: u32) -> Vec<(i64, PlayerId)> {
    engine
        .store()
        .memberships(EVENT)
        .unwrap()
        .into_iter()
        .filter(|m| m.round == round)
        .map(|m| (m.group, m.player))
        .collect()
}

#[test]
fn test_fixed_schedule_seats_36() {
    let mut engine = make_engine(36, &["A", "B", "C"], Format::Settlement, 5);
    let serials = engine.seed_fixed_schedule(EVENT).unwrap();

    assert_eq!(serials.len(), 36);
    let players: BTreeSet<PlayerId> = serials.values().copied().collect();
    assert_eq!(players, (1..=36).collect());

    for round in 1..=5 {
        let members = round_members(&engine, round);
        assert_eq!(members.len(), 36);
        for group in 10..13 {
            assert_eq!(members.iter().filter(|(g, _)| *g == group).count(), 12);
        }
        let distinct: BTreeSet<PlayerId> = members.iter().map(|(_, p)| *p).collect();
        assert_eq!(distinct.len(), 36);
    }
    assert_eq!(engine.store().heats(EVENT).unwrap().len(), 15);
}

#[test]
fn test_fixed_schedule_wrong_cohort_writes_nothing() {
    for players in [35, 37] {
        let mut engine = make_engine(players, &["A", "B", "C"], Format::Settlement, 5);
        let err = engine.seed_fixed_schedule(EVENT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(engine.store().stats().heats, 0);
        assert_eq!(engine.store().stats().memberships, 0);
    }
}

#[test]
fn test_fixed_schedule_ignores_inactive_enrollments() {
    let mut engine = make_engine(36, &["A", "B", "C"], Format::Settlement, 5);
    engine.store_mut().enroll(EVENT, 99, EnrollmentStatus::Inactive);
    assert_eq!(engine.seed_fixed_schedule(EVENT).unwrap().len(), 36);
}

#[test]
fn test_per_round_random_28_players() {
    let mut engine = make_engine(28, &["A", "B", "C"], Format::Prelim, 5);
    assert_eq!(engine.seed_per_round_random(EVENT).unwrap(), 28);

    let mut rounds = Vec::new();
    for round in 1..=5 {
        let members = round_members(&engine, round);
        let mut sizes: Vec<usize> = (10..13)
            .map(|g| members.iter().filter(|(group, _)| *group == g).count())
            .collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![9, 9, 10]);
        rounds.push(members);
    }
    assert!(rounds.iter().skip(1).any(|r| *r != rounds[0]));
}

#[test]
fn test_repair_requires_standings() {
    let mut engine = make_engine(12, &["A", "B"], Format::Qualifier, 5);
    engine.seed_first_round(EVENT).unwrap();
    let before = engine.store().stats();

    let err = engine.repair_next_round(EVENT).unwrap_err();
    assert!(matches!(err, EngineError::NoStandings(EVENT)));
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert_eq!(engine.store().stats(), before);
}

#[test]
fn test_seed_record_and_repair() {
    let mut engine = make_engine(14, &["A", "B"], Format::Qualifier, 5);
    assert_eq!(engine.seed_first_round(EVENT).unwrap(), 14);

    // Player n finishes n-th overall; NPC rows never count
    for (group, player) in round_members(&engine, 1) {
        let place = ((player - 1) % 12 + 1) as u32;
        engine.record_result(EVENT, 1, group, player, 1, place, false).unwrap();
    }
    engine.record_result(EVENT, 1, 10, 500, 1, 1, true).unwrap();

    let ranked = engine.recompute_standings(EVENT).unwrap();
    assert_eq!(ranked.len(), 14);
    assert!(ranked.iter().all(|(player, _)| *player != 500));
    let ranks: Vec<u32> = engine.store().standings(EVENT).unwrap().iter().map(|s| s.rank).collect();
    assert_eq!(ranks, (1..=14).collect::<Vec<_>>());

    assert_eq!(engine.repair_next_round(EVENT).unwrap(), 12);
    let round2 = round_members(&engine, 2);
    let top: Vec<PlayerId> = ranked.iter().map(|(p, _)| *p).collect();
    let group_a: BTreeSet<PlayerId> = round2.iter().filter(|(g, _)| *g == 10).map(|(_, p)| *p).collect();
    let group_b: BTreeSet<PlayerId> = round2.iter().filter(|(g, _)| *g == 11).map(|(_, p)| *p).collect();
    assert_eq!(group_a, top[..6].iter().copied().collect());
    assert_eq!(group_b, top[6..12].iter().copied().collect());

    // Reseeding round 1 leaves round 2 and the round 1 results in place
    engine.seed_first_round(EVENT).unwrap();
    assert_eq!(round_members(&engine, 2), round2);
    assert_eq!(engine.store().placements(EVENT).unwrap().len(), 15);
}

#[test]
fn test_self_report_reconciliation() {
    let mut engine = make_engine(4, &["A"], Format::Settlement, 3);
    engine.seed_first_round(EVENT).unwrap();

    engine.submit_self_report(EVENT, 1, 1, 1, 3).unwrap();
    engine.submit_self_report(EVENT, 1, 1, 2, 5).unwrap();
    engine.submit_self_report(EVENT, 2, 1, 1, 1).unwrap();
    let err = engine.submit_self_report(EVENT, 2, 1, 3, 1).unwrap_err();
    assert!(matches!(err, EngineError::InvalidHorseIndex { index: 3, allowed: 2 }));
    let err = engine.submit_self_report(EVENT, 2, 2, 1, 1).unwrap_err();
    assert!(matches!(err, EngineError::NotInRound { player: 2, round: 2 }));

    let pending = engine.pending_self_reports(EVENT).unwrap();
    assert_eq!(pending.len(), 3);
    let report = engine.reconcile_self_reports(&pending).unwrap();

    assert_eq!(report.rounds_written, 2);
    assert!(report.failures.is_empty());
    assert_eq!(report.events_recomputed, vec![EVENT]);
    assert!(engine.pending_self_reports(EVENT).unwrap().is_empty());

    let placements = engine.store().placements(EVENT).unwrap();
    let p1: Vec<u32> = placements.iter().filter(|p| p.player == 1).map(|p| p.place).collect();
    assert_eq!(p1, vec![8]);

    let standings = engine.store().standings(EVENT).unwrap();
    assert_eq!(standings[0].player, 2);
    assert_eq!(standings[1].player, 1);
    assert_eq!(standings[1].total_score, 8);
}

#[test]
fn test_tied_final_payouts() {
    let mut engine = make_engine(6, &["A"], Format::Final, 1);
    engine.seed_first_round(EVENT).unwrap();
    for player in 1..=6 {
        engine.record_result(EVENT, 1, 10, player, 1, 3, false).unwrap();
    }
    engine.recompute_standings(EVENT).unwrap();

    let payouts = engine.compute_payouts(EVENT, None).unwrap();
    assert_eq!(payouts.len(), 6);
    assert!(payouts.iter().all(|p| p.base_amount == 100.0 && p.base_pool == 600));
    let totals: Vec<f64> = payouts.iter().map(|p| p.total_amount).collect();
    assert_eq!(totals, vec![300.0, 200.0, 200.0, 100.0, 100.0, 100.0]);
    assert_eq!(engine.store().payouts(EVENT).unwrap(), payouts);
}

#[test]
fn test_room_code_survives_regrouping() {
    let mut engine = make_engine(3, &["A"], Format::Prelim, 1);
    engine.seed_first_round(EVENT).unwrap();
    engine.set_room_code(EVENT, 1, 10, 1, "HORSE-42").unwrap();

    engine.seed_first_round(EVENT).unwrap();
    let heats = engine.store().heats(EVENT).unwrap();
    assert_eq!(heats.len(), 1);
    assert_eq!(heats[0].room_code, "HORSE-42");
}

#[test]
fn test_same_seed_same_grouping() {
    let mut a = make_engine(20, &["A", "B", "C"], Format::Prelim, 4);
    let mut b = make_engine(20, &["A", "B", "C"], Format::Prelim, 4);
    a.seed_per_round_random(EVENT).unwrap();
    b.seed_per_round_random(EVENT).unwrap();
    assert_eq!(
        a.store().memberships(EVENT).unwrap(),
        b.store().memberships(EVENT).unwrap()
    );
}
