/// Prize pool shared by the top finishers of an event
pub const DEFAULT_POOL: u32 = 600;

/// Exponential decay applied to normalized scores when weighting payouts
pub const DEFAULT_DECAY: f64 = 2.0;

/// Lower bound on the min-max spread to avoid dividing by zero
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Normalized spread under which the top finishers are treated as tied
pub const DEFAULT_TIE_EPSILON: f64 = 0.02;

/// Minimum base share guaranteed to the last paid place
pub const DEFAULT_MIN_LAST_SHARE: f64 = 30.0;

/// Number of places that receive a payout
pub const PAYOUT_PLACES: usize = 6;

/// Bonus overlay paid on top of the base share in `final` events
pub const FINAL_BONUSES: [f64; PAYOUT_PLACES] = [200.0, 100.0, 100.0, 0.0, 0.0, 0.0];

/// Enrollment size required by the fixed schedule
pub const FIXED_COHORT: usize = 36;

/// Rounds covered by the fixed schedule
pub const FIXED_ROUNDS: u32 = 5;

/// Group names used by the fixed schedule, in table order
pub const FIXED_GROUPS: [&str; 3] = ["A", "B", "C"];

/// Players per group in the fixed schedule
pub const FIXED_GROUP_SIZE: usize = 12;

/// Seats per group when pairing a round from standings
pub const REPAIR_SEATS: usize = 6;

/// Group names used when pairing a round from standings
pub const REPAIR_GROUPS: [&str; 2] = ["A", "B"];

/// Inclusive bounds of a place a player may self-report
pub const PLACE_RANGE: (u32, u32) = (1, 12);

/// Longest room code a heat host may set
pub const ROOM_CODE_MAX_LEN: usize = 50;

