use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use super::{GroupingContext, GroupingPlan, GroupingPolicy};
use crate::error::{EngineError, EngineResult};
use crate::model::PlayerId;

/// Round 1 bootstrap: shuffle every active player and deal them round-robin
/// across the event's groups in name order.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSeed;

impl GroupingPolicy for RandomSeed {
    fn name(&self) -> &'static str {
        "random_seed"
    }

    fn plan(&self, ctx: &GroupingContext, rng: &mut ChaCha8Rng) -> EngineResult<GroupingPlan> {
        if ctx.groups.is_empty() {
            return Err(EngineError::NoGroups(ctx.event.id));
        }
        if ctx.players.is_empty() {
            return Err(EngineError::NoActiveEnrollments(ctx.event.id));
        }

        let mut players = ctx.players.clone();
        players.shuffle(rng);

        let mut seats: Vec<Vec<PlayerId>> = vec![Vec::new(); ctx.groups.len()];
        for (i, player) in players.into_iter().enumerate() {
            seats[i % ctx.groups.len()].push(player);
        }

        let mut plan = GroupingPlan::new(ctx.event.id, 1..=1);
        for (group, members) in ctx.groups.iter().zip(&seats) {
            plan.seat(1, group, members);
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::test_support::make_context;
    use crate::model::Format;
    use rand::SeedableRng;

    #[test]
    fn test_round_robin_sizes() {
        let ctx = make_context(11, &["A", "B", "C"], Format::Prelim, 5);
        let plan = RandomSeed.plan(&ctx, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();

        assert_eq!(plan.rounds, 1..=1);
        assert_eq!(plan.heats.len(), 3);
        let sizes: Vec<usize> = ctx.groups.iter().map(|g| plan.members(1, g).len()).collect();
        assert_eq!(sizes, vec![4, 4, 3]);
        assert_eq!(plan.players_placed(), 11);
    }

    #[test]
    fn test_same_seed_same_plan() {
        let ctx = make_context(12, &["A", "B"], Format::Prelim, 5);
        let a = RandomSeed.plan(&ctx, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        let b = RandomSeed.plan(&ctx, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_preconditions() {
        let ctx = make_context(4, &[], Format::Prelim, 5);
        let err = RandomSeed.plan(&ctx, &mut ChaCha8Rng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, EngineError::NoGroups(1)));

        let ctx = make_context(0, &["A"], Format::Prelim, 5);
        let err = RandomSeed.plan(&ctx, &mut ChaCha8Rng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, EngineError::NoActiveEnrollments(1)));
    }
}
