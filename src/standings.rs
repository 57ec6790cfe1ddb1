//! Cumulative standings from raw placements.

use std::collections::{BTreeMap, HashMap};

use crate::model::{EventId, Placement, PlayerId, Standing};

/// Aggregate non-NPC placements into ranked standings.
///
/// Each player's total is the sum of their places across every round they have
/// a recorded result in. Players without a counted result are left out. Lower
/// totals rank first; equal totals are ordered by ascending player id so the
/// top-six payout cutoff never depends on input order.
pub fn aggregate(event: EventId, placements: &[Placement]) -> Vec<Standing> {
    let mut per_round: HashMap<PlayerId, BTreeMap<u32, u32>> = HashMap::new();
    for placement in placements.iter().filter(|p| !p.is_npc && p.heat.event == event) {
        *per_round
            .entry(placement.player)
            .or_default()
            .entry(placement.heat.round)
            .or_insert(0) += placement.place;
    }

    let mut totals: Vec<(PlayerId, u32)> = per_round
        .into_iter()
        .map(|(player, rounds)| (player, rounds.values().sum()))
        .collect();
    totals.sort_by_key(|&(player, total)| (total, player));

    totals
        .into_iter()
        .enumerate()
        .map(|(i, (player, total_score))| Standing {
            event,
            player,
            total_score,
            rank: i as u32 + 1,
            qualified: false,
            notes: String::new(),
        })
        .collect()
}

/// (player, total) pairs in rank order.
pub fn ranked_totals(standings: &[Standing]) -> Vec<(PlayerId, u32)> {
    standings.iter().map(|s| (s.player, s.total_score)).collect()
}
