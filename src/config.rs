use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::constants::PLACE_RANGE;
use crate::error::EngineResult;
use crate::payout::PayoutParams;

/// Engine-wide settings.
///
/// Every field has a default, so a config file only needs the values it
/// overrides:
///
/// ```json
/// { "seed": 42, "payout": { "pool": 900, "min_last_share": 45.0 } }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default payout parameters used when a call does not pass its own
    pub payout: PayoutParams,

    /// Fixed seed for every shuffle; `None` seeds from OS entropy
    pub seed: Option<u64>,

    /// Inclusive bounds accepted for self-reported places
    pub place_range: (u32, u32),
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            payout: PayoutParams::default(),
            seed: None,
            place_range: PLACE_RANGE,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let file = File::open(path.as_ref())?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
