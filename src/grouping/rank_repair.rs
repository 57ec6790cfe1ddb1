use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::{GroupingContext, GroupingPlan, GroupingPolicy};
use crate::constants::{REPAIR_GROUPS, REPAIR_SEATS};
use crate::error::{EngineError, EngineResult};
use crate::model::{PlayerId, Standing};

/// Swiss-style pairing for the round after the last one played: ranks 1-6
/// go to group A, ranks 7-12 to group B. Anyone ranked lower sits the round out.
#[derive(Clone, Copy, Debug, Default)]
pub struct RankRepair;

impl GroupingPolicy for RankRepair {
    fn name(&self) -> &'static str {
        "rank_repair"
    }

    fn plan(&self, ctx: &GroupingContext, _rng: &mut ChaCha8Rng) -> EngineResult<GroupingPlan> {
        if ctx.standings.is_empty() {
            return Err(EngineError::NoStandings(ctx.event.id));
        }
        let groups: Vec<_> = REPAIR_GROUPS.iter().filter_map(|name| ctx.group_named(name)).collect();
        if groups.len() != REPAIR_GROUPS.len() {
            return Err(EngineError::MissingRepairGroups {
                event: ctx.event.id,
                needed: REPAIR_GROUPS.to_vec(),
            });
        }
        let next = ctx.last_round.unwrap_or(0) + 1;
        if next == 1 {
            return Err(EngineError::RepairWouldSeedFirstRound(ctx.event.id));
        }

        let mut ranked: Vec<&Standing> = ctx.standings.iter().collect();
        ranked.sort_by_key(|s| (s.rank, s.player));
        let seated: Vec<PlayerId> = ranked
            .iter()
            .take(REPAIR_SEATS * groups.len())
            .map(|s| s.player)
            .collect();
        if ranked.len() > seated.len() {
            debug!(
                event = ctx.event.id,
                excluded = ranked.len() - seated.len(),
                "players ranked below the repair seats sit out"
            );
        }

        let mut plan = GroupingPlan::new(ctx.event.id, next..=next);
        // Both groups get a heat for the round, even when B has nobody to seat
        for (i, group) in groups.into_iter().enumerate() {
            let start = (i * REPAIR_SEATS).min(seated.len());
            let end = ((i + 1) * REPAIR_SEATS).min(seated.len());
            plan.seat(next, group, &seated[start..end]);
        }
        Ok(plan)
    }
}
