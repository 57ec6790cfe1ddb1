use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::{GroupingContext, GroupingPlan, GroupingPolicy};
use crate::error::{EngineError, EngineResult};
use crate::model::PlayerId;

/// Independent shuffle for every round `1..=R`, sliced into the configured
/// group count. The first `n % g` groups take one extra player.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerRoundRandom;

/// Split `players` into `groups` contiguous slices whose sizes differ by at most one.
pub fn balanced_slices(players: &[PlayerId], groups: usize) -> Vec<&[PlayerId]> {
    let base = players.len() / groups;
    let extra = players.len() % groups;
    let mut slices = Vec::with_capacity(groups);
    let mut start = 0;
    for g in 0..groups {
        let len = base + usize::from(g < extra);
        slices.push(&players[start..start + len]);
        start += len;
    }
    slices
}

impl GroupingPolicy for PerRoundRandom {
    fn name(&self) -> &'static str {
        "per_round_random"
    }

    fn plan(&self, ctx: &GroupingContext, rng: &mut ChaCha8Rng) -> EngineResult<GroupingPlan> {
        let needed = ctx.event.group_count as usize;
        if needed == 0 || ctx.groups.is_empty() {
            return Err(EngineError::NoGroups(ctx.event.id));
        }
        if ctx.groups.len() < needed {
            return Err(EngineError::NotEnoughGroups {
                event: ctx.event.id,
                needed,
                found: ctx.groups.len(),
            });
        }
        if ctx.players.is_empty() {
            return Err(EngineError::NoActiveEnrollments(ctx.event.id));
        }

        let rounds = ctx.event.rounds.max(1);
        let groups = &ctx.groups[..needed];

        // One sub-seed per round keeps the result independent of thread scheduling
        let seeds: Vec<u64> = (0..rounds).map(|_| rng.gen::<u64>()).collect();
        let shuffled: Vec<Vec<PlayerId>> = seeds
            .par_iter()
            .map(|&seed| {
                let mut round_rng = ChaCha8Rng::seed_from_u64(seed);
                let mut players = ctx.players.clone();
                players.shuffle(&mut round_rng);
                players
            })
            .collect();

        let mut plan = GroupingPlan::new(ctx.event.id, 1..=rounds);
        for (round, players) in (1..=rounds).zip(&shuffled) {
            for (group, members) in groups.iter().zip(balanced_slices(players, needed)) {
                plan.seat(round, group, members);
            }
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::test_support::make_context;
    use crate::model::Format;

    #[test]
    fn test_balanced_slices() {
        let players: Vec<PlayerId> = (1..=28).collect();
        let sizes: Vec<usize> = balanced_slices(&players, 3).iter().map(|s| s.len()).collect();
        assert_eq!(sizes, vec![10, 9, 9]);

        let sizes: Vec<usize> = balanced_slices(&players[..2], 3).iter().map(|s| s.len()).collect();
        assert_eq!(sizes, vec![1, 1, 0]);
    }

    #[test]
    fn test_28_players_three_groups() {
        let ctx = make_context(28, &["A", "B", "C"], Format::Prelim, 5);
        let plan = PerRoundRandom.plan(&ctx, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();

        assert_eq!(plan.rounds, 1..=5);
        assert_eq!(plan.heats.len(), 15);
        for round in 1..=5 {
            let mut sizes: Vec<usize> = ctx.groups.iter().map(|g| plan.members(round, g).len()).collect();
            sizes.sort_unstable();
            assert_eq!(sizes, vec![9, 9, 10]);

            let mut seen: Vec<PlayerId> = plan
                .memberships
                .iter()
                .filter(|m| m.round == round)
                .map(|m| m.player)
                .collect();
            seen.sort_unstable();
            assert_eq!(seen, ctx.players);
        }

        let first: Vec<PlayerId> = plan.members(1, &ctx.groups[0]);
        assert!((2..=5).any(|round| plan.members(round, &ctx.groups[0]) != first));
    }

    #[test]
    fn test_uses_configured_group_count() {
        let mut ctx = make_context(10, &["A", "B", "C"], Format::Prelim, 2);
        ctx.event.group_count = 2;
        let plan = PerRoundRandom.plan(&ctx, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        assert!(plan.members(1, &ctx.groups[2]).is_empty());
        assert_eq!(plan.members(1, &ctx.groups[0]).len(), 5);

        ctx.event.group_count = 4;
        let err = PerRoundRandom.plan(&ctx, &mut ChaCha8Rng::seed_from_u64(3)).unwrap_err();
        assert!(matches!(err, EngineError::NotEnoughGroups { needed: 4, found: 3, .. }));
    }

    #[test]
    fn test_deterministic_for_seed() {
        let ctx = make_context(20, &["A", "B"], Format::Prelim, 7);
        let a = PerRoundRandom.plan(&ctx, &mut ChaCha8Rng::seed_from_u64(11)).unwrap();
        let b = PerRoundRandom.plan(&ctx, &mut ChaCha8Rng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);
    }
}
