//! Static five-round seating table for a 36-player cohort.
//!
//! Each round is an exact partition of serials 1-36 into groups A, B and C of
//! twelve. Across the five rounds no pair of serials shares a group more than
//! three times. Five rounds of three groups cannot keep every pair at two
//! meetings or fewer for 36 players, so three is the floor.

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::FIXED_GROUPS;

const SCHEDULE: [[[u8; 12]; 3]; 5] = [
    [
        [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
        [13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24],
        [25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36],
    ],
    [
        [1, 7, 9, 11, 14, 16, 22, 24, 28, 29, 30, 32],
        [3, 4, 8, 12, 15, 17, 18, 20, 31, 33, 34, 36],
        [2, 5, 6, 10, 13, 19, 21, 23, 25, 26, 27, 35],
    ],
    [
        [1, 2, 7, 8, 16, 18, 20, 21, 26, 27, 28, 36],
        [3, 4, 6, 11, 13, 17, 23, 24, 30, 31, 32, 35],
        [5, 9, 10, 12, 14, 15, 19, 22, 25, 29, 33, 34],
    ],
    [
        [7, 8, 10, 11, 12, 13, 14, 16, 17, 27, 30, 34],
        [2, 3, 9, 20, 21, 22, 23, 25, 28, 31, 32, 33],
        [1, 4, 5, 6, 15, 18, 19, 24, 26, 29, 35, 36],
    ],
    [
        [6, 7, 9, 12, 17, 19, 20, 24, 25, 27, 32, 36],
        [1, 3, 5, 8, 13, 14, 15, 21, 28, 30, 33, 35],
        [2, 4, 10, 11, 16, 18, 22, 23, 26, 29, 31, 34],
    ],
];

static GLOBAL: Lazy<ScheduleTable> = Lazy::new(|| {
    let rows: Vec<(u32, &'static str, Vec<u8>)> = SCHEDULE
        .iter()
        .enumerate()
        .flat_map(|(r, groups)| {
            FIXED_GROUPS
                .iter()
                .zip(groups.iter())
                .map(move |(&name, serials)| (r as u32 + 1, name, serials.to_vec()))
        })
        .collect();
    ScheduleTable::from_rows(&rows)
});

/// Round -> group name -> serials seated there.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScheduleTable {
    cells: BTreeMap<u32, BTreeMap<&'static str, BTreeSet<u8>>>,
}

impl ScheduleTable {
    /// The built-in table.
    pub fn global() -> &'static ScheduleTable {
        &GLOBAL
    }

    pub fn from_rows(rows: &[(u32, &'static str, Vec<u8>)]) -> Self {
        let mut cells: BTreeMap<u32, BTreeMap<&'static str, BTreeSet<u8>>> = BTreeMap::new();
        for (round, group, serials) in rows {
            cells
                .entry(*round)
                .or_default()
                .entry(*group)
                .or_default()
                .extend(serials.iter().copied());
        }
        ScheduleTable { cells }
    }

    pub fn cell(&self, round: u32, group: &str) -> Option<&BTreeSet<u8>> {
        self.cells.get(&round)?.get(group)
    }

    /// Flattened `(round, group, serials)` rows, ordered by round then group.
    pub fn rows(&self) -> Vec<(u32, &'static str, Vec<u8>)> {
        self.cells
            .iter()
            .flat_map(|(&round, groups)| {
                groups
                    .iter()
                    .map(move |(&group, serials)| (round, group, serials.iter().copied().collect()))
            })
            .collect()
    }

    pub fn rounds(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.keys().copied()
    }

    /// How many times each pair of serials (lower first) shares a group.
    pub fn pair_meetings(&self) -> BTreeMap<(u8, u8), u32> {
        let mut meetings = BTreeMap::new();
        for serials in self.cells.values().flat_map(|groups| groups.values()) {
            let serials: Vec<u8> = serials.iter().copied().collect();
            for (i, &a) in serials.iter().enumerate() {
                for &b in &serials[i + 1..] {
                    *meetings.entry((a, b)).or_insert(0) += 1;
                }
            }
        }
        meetings
    }

    pub fn max_meetings(&self) -> u32 {
        self.pair_meetings().values().copied().max().unwrap_or(0)
    }
}
