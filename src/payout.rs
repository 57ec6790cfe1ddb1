//! Prize pool distribution over the top six standings.
//!
//! Shares follow an exponential decay over min-max normalized scores: large
//! gaps between finishers produce a steep curve, near-equal scores flatten it,
//! and a spread below `tie_epsilon` splits the pool evenly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{
    DEFAULT_DECAY, DEFAULT_EPSILON, DEFAULT_MIN_LAST_SHARE, DEFAULT_POOL, DEFAULT_TIE_EPSILON,
    FINAL_BONUSES, PAYOUT_PLACES,
};
use crate::model::{Event, Payout, Standing};

/// Tunables of the payout curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutParams {
    /// Decay rate `k` in `exp(-k * z)`
    pub decay: f64,
    pub epsilon: f64,
    pub tie_epsilon: f64,
    /// Pool size shared by the paid places
    pub pool: u32,
    /// Floor for each base share; normally only binds for the last place
    pub min_last_share: f64,
    /// Per-place bonus, only paid in `final` events
    pub final_bonuses: [f64; PAYOUT_PLACES],
}

impl Default for PayoutParams {
    fn default() -> Self {
        PayoutParams {
            decay: DEFAULT_DECAY,
            epsilon: DEFAULT_EPSILON,
            tie_epsilon: DEFAULT_TIE_EPSILON,
            pool: DEFAULT_POOL,
            min_last_share: DEFAULT_MIN_LAST_SHARE,
            final_bonuses: FINAL_BONUSES,
        }
    }
}

/// Raise every share below `floor` to it, taking the shortfall from the
/// shares above the floor in proportion to their size.
///
/// Normally only the last place needs it. Each pass floors at least one more
/// share, so the loop settles within `PAYOUT_PLACES` passes and rank order
/// is preserved.
fn apply_floor(shares: &mut [f64; PAYOUT_PLACES], floor: f64) {
    for _ in 0..PAYOUT_PLACES {
        let shortfall: f64 = shares.iter().filter(|&&s| s < floor).map(|s| floor - s).sum();
        if shortfall <= 1e-9 {
            return;
        }
        let donors: f64 = shares.iter().filter(|&&s| s > floor).sum();
        if donors <= 0.0 {
            return;
        }
        for share in shares.iter_mut() {
            if *share < floor {
                *share = floor;
            } else if *share > floor {
                *share -= shortfall * (*share / donors);
            }
        }
        debug!(shortfall, "raised shares to floor");
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Base shares for six ranked totals, rounded to cents.
///
/// `totals` must be in rank order. Returns `None` unless exactly six totals
/// are given.
pub fn base_shares(totals: &[u32], rounds: u32, params: &PayoutParams) -> Option<[f64; PAYOUT_PLACES]> {
    if totals.len() != PAYOUT_PLACES {
        return None;
    }
    let pool = params.pool as f64;
    let rounds = rounds.max(1) as f64;

    let per_round: Vec<f64> = totals.iter().map(|&t| t as f64 / rounds).collect();
    let lo = per_round.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = per_round.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let denom = (hi - lo).max(params.epsilon);
    let z: Vec<f64> = per_round.iter().map(|v| (v - lo) / denom).collect();

    let spread = z.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        - z.iter().copied().fold(f64::INFINITY, f64::min);

    let mut shares = [pool / PAYOUT_PLACES as f64; PAYOUT_PLACES];
    if spread < params.tie_epsilon {
        debug!(spread, "payout treated as a tie");
    } else {
        let weights: Vec<f64> = z.iter().map(|zi| (-params.decay * zi).exp()).collect();
        let weight_sum: f64 = weights.iter().sum();
        for (share, w) in shares.iter_mut().zip(&weights) {
            *share = pool * w / weight_sum;
        }
        debug!(?z, ?shares, "payout weights");

        apply_floor(&mut shares, params.min_last_share);
    }

    Some(shares.map(round2))
}

/// Payout rows for the top six of `standings` (assumed sorted by rank).
///
/// Returns an empty list when fewer than six players are ranked.
pub fn build_payouts(event: &Event, standings: &[Standing], params: &PayoutParams) -> Vec<Payout> {
    let top: Vec<&Standing> = standings.iter().take(PAYOUT_PLACES).collect();
    let totals: Vec<u32> = top.iter().map(|s| s.total_score).collect();
    let Some(shares) = base_shares(&totals, event.rounds, params) else {
        return Vec::new();
    };

    let bonuses = if event.format.has_final_bonus() {
        params.final_bonuses
    } else {
        [0.0; PAYOUT_PLACES]
    };

    top.iter()
        .zip(shares.iter().zip(bonuses.iter()))
        .map(|(standing, (&base_amount, &extra_bonus))| Payout {
            event: event.id,
            player: standing.player,
            base_pool: params.pool,
            base_amount,
            extra_bonus,
            total_amount: round2(base_amount + extra_bonus),
        })
        .collect()
}
