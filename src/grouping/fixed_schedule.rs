use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

use super::{GroupingContext, GroupingPlan, GroupingPolicy};
use crate::constants::{FIXED_COHORT, FIXED_GROUPS, FIXED_GROUP_SIZE, FIXED_ROUNDS};
use crate::error::{EngineError, EngineResult};
use crate::model::{Group, PlayerId};
use crate::schedule::ScheduleTable;

/// Draws a random serial 1-36 for each of exactly 36 players and seats them
/// by the static schedule for rounds 1-5 in groups A, B and C.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedSchedule;

impl FixedSchedule {
    fn plan_with_table(
        &self,
        ctx: &GroupingContext,
        table: &ScheduleTable,
        rng: &mut ChaCha8Rng,
    ) -> EngineResult<GroupingPlan> {
        if ctx.players.len() != FIXED_COHORT {
            return Err(EngineError::WrongCohortSize {
                expected: FIXED_COHORT,
                found: ctx.players.len(),
            });
        }
        let groups: Vec<(&'static str, &Group)> = FIXED_GROUPS
            .iter()
            .map(|&name| {
                ctx.group_named(name)
                    .map(|g| (name, g))
                    .ok_or(EngineError::MissingScheduleGroup(name))
            })
            .collect::<EngineResult<_>>()?;

        let mut players = ctx.players.clone();
        players.shuffle(rng);
        let serials: BTreeMap<u8, PlayerId> = players
            .into_iter()
            .enumerate()
            .map(|(i, player)| (i as u8 + 1, player))
            .collect();

        let mut plan = GroupingPlan::new(ctx.event.id, 1..=FIXED_ROUNDS);
        for round in 1..=FIXED_ROUNDS {
            for &(name, group) in &groups {
                let members: Vec<PlayerId> = table
                    .cell(round, name)
                    .into_iter()
                    .flatten()
                    .filter_map(|serial| serials.get(serial).copied())
                    .collect();
                if members.len() != FIXED_GROUP_SIZE {
                    return Err(EngineError::ScheduleCellMismatch {
                        round,
                        group: name,
                        expected: FIXED_GROUP_SIZE,
                        found: members.len(),
                    });
                }
                plan.seat(round, group, &members);
            }
        }
        plan.serials = Some(serials);
        Ok(plan)
    }
}

impl GroupingPolicy for FixedSchedule {
    fn name(&self) -> &'static str {
        "fixed_schedule"
    }

    fn plan(&self, ctx: &GroupingContext, rng: &mut ChaCha8Rng) -> EngineResult<GroupingPlan> {
        self.plan_with_table(ctx, ScheduleTable::global(), rng)
    }
}
