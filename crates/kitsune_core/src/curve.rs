//! Level curve and tail-stage thresholds.
//!
//! Both are plain lookup tables built once and shared. Nothing here touches
//! persistence or the UI, so the exact thresholds are testable in isolation.

use serde::{Deserialize, Serialize};

use crate::error::{CompanionError, Result};

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 99;
pub const MIN_TAIL_STAGE: u8 = 1;
pub const MAX_TAIL_STAGE: u8 = 9;

/// Experience ceiling per skill. Grants past this point are absorbed.
pub const MAX_EXPERIENCE: u64 = 200_000_000;

/// Total-level thresholds for tail stages 2..=9.
pub const DEFAULT_TAIL_THRESHOLDS: [u32; 8] = [50, 100, 200, 350, 500, 650, 800, 891];

/// Total experience required to reach `level` under the RuneScape curve.
///
/// `xp(L) = floor( sum_{l=1}^{L-1} floor(l + 300 * 2^(l/7)) / 4 )`
pub fn runescape_experience_for(level: u8) -> u64 {
    let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
    let mut points = 0.0f64;
    for l in 1..level {
        let l = f64::from(l);
        points += (l + 300.0 * 2f64.powf(l / 7.0)).floor();
    }
    (points / 4.0).floor() as u64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionTable {
    /// `level_thresholds[i]` is the experience needed for level `i + 1`.
    level_thresholds: Vec<u64>,
    /// `tail_thresholds[i]` is the total level needed for tail stage `i + 2`.
    tail_thresholds: Vec<u32>,
}

impl Default for ProgressionTable {
    fn default() -> Self {
        Self::runescape()
    }
}

impl ProgressionTable {
    /// The classic 99-level curve with the default tail thresholds.
    pub fn runescape() -> Self {
        let level_thresholds = (MIN_LEVEL..=MAX_LEVEL)
            .map(runescape_experience_for)
            .collect();
        Self {
            level_thresholds,
            tail_thresholds: DEFAULT_TAIL_THRESHOLDS.to_vec(),
        }
    }

    /// Build a table from configuration data.
    ///
    /// `level_thresholds` must start at 0, be strictly increasing and contain
    /// between 1 and 99 entries. `tail_thresholds` must contain exactly eight
    /// strictly increasing values.
    pub fn new(level_thresholds: Vec<u64>, tail_thresholds: Vec<u32>) -> Result<Self> {
        if level_thresholds.is_empty() || level_thresholds.len() > usize::from(MAX_LEVEL) {
            return Err(CompanionError::invalid(format!(
                "level table must have 1..={} entries, got {}",
                MAX_LEVEL,
                level_thresholds.len()
            )));
        }
        if level_thresholds[0] != 0 {
            return Err(CompanionError::invalid("level 1 must require 0 experience"));
        }
        if level_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CompanionError::invalid("level thresholds must be strictly increasing"));
        }
        if tail_thresholds.len() != usize::from(MAX_TAIL_STAGE - MIN_TAIL_STAGE) {
            return Err(CompanionError::invalid(format!(
                "tail table must have {} entries, got {}",
                MAX_TAIL_STAGE - MIN_TAIL_STAGE,
                tail_thresholds.len()
            )));
        }
        if tail_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CompanionError::invalid("tail thresholds must be strictly increasing"));
        }
        Ok(Self {
            level_thresholds,
            tail_thresholds,
        })
    }

    /// Highest level this table can reach.
    pub fn max_level(&self) -> u8 {
        self.level_thresholds.len() as u8
    }

    pub fn level_thresholds(&self) -> &[u64] {
        &self.level_thresholds
    }

    pub fn tail_thresholds(&self) -> &[u32] {
        &self.tail_thresholds
    }

    /// Level reached with `experience` total XP. Monotonic in `experience`.
    pub fn level_for(&self, experience: u64) -> u8 {
        // thresholds[0] == 0, so the count is always >= 1
        self.level_thresholds.partition_point(|&t| t <= experience) as u8
    }

    /// Experience needed for `level`; `None` past the top of the table.
    pub fn experience_for(&self, level: u8) -> Option<u64> {
        let idx = usize::from(level.checked_sub(1)?);
        self.level_thresholds.get(idx).copied()
    }

    /// Tail stage for a total level across all skills.
    pub fn tail_stage_for(&self, total_level: u32) -> u8 {
        let reached = self.tail_thresholds.partition_point(|&t| t <= total_level) as u8;
        MIN_TAIL_STAGE + reached
    }

    /// Total level required for the next tail stage, if any.
    pub fn next_tail_threshold(&self, total_level: u32) -> Option<u32> {
        self.tail_thresholds
            .iter()
            .copied()
            .find(|&t| t > total_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runescape_known_values() {
        assert_eq!(runescape_experience_for(1), 0);
        assert_eq!(runescape_experience_for(2), 83);
        assert_eq!(runescape_experience_for(10), 1_154);
        assert_eq!(runescape_experience_for(50), 101_333);
        assert_eq!(runescape_experience_for(92), 6_517_253);
        assert_eq!(runescape_experience_for(99), 13_034_431);
    }

    #[test]
    fn test_level_for_boundaries() {
        let t = ProgressionTable::runescape();
        assert_eq!(t.level_for(0), 1);
        assert_eq!(t.level_for(82), 1);
        assert_eq!(t.level_for(83), 2);
        assert_eq!(t.level_for(13_034_430), 98);
        assert_eq!(t.level_for(13_034_431), 99);
        assert_eq!(t.level_for(MAX_EXPERIENCE), 99);
    }

    #[test]
    fn test_experience_for_round_trips_level_for() {
        let t = ProgressionTable::runescape();
        for level in MIN_LEVEL..=MAX_LEVEL {
            let xp = t.experience_for(level).unwrap();
            assert_eq!(t.level_for(xp), level);
        }
        assert_eq!(t.experience_for(0), None);
        assert_eq!(t.experience_for(100), None);
    }

    #[test]
    fn test_tail_stages() {
        let t = ProgressionTable::runescape();
        // Nine fresh skills sit at total level 9.
        assert_eq!(t.tail_stage_for(9), 1);
        assert_eq!(t.tail_stage_for(49), 1);
        assert_eq!(t.tail_stage_for(50), 2);
        assert_eq!(t.tail_stage_for(200), 4);
        assert_eq!(t.tail_stage_for(890), 8);
        assert_eq!(t.tail_stage_for(891), 9);
        assert_eq!(t.next_tail_threshold(9), Some(50));
        assert_eq!(t.next_tail_threshold(891), None);
    }

    #[test]
    fn test_custom_table() {
        let t = ProgressionTable::new(vec![0, 10, 30], DEFAULT_TAIL_THRESHOLDS.to_vec()).unwrap();
        assert_eq!(t.max_level(), 3);
        assert_eq!(t.level_for(9), 1);
        assert_eq!(t.level_for(10), 2);
        assert_eq!(t.level_for(1_000), 3);
    }

    #[test]
    fn test_invalid_tables_rejected() {
        let tails = DEFAULT_TAIL_THRESHOLDS.to_vec();
        assert!(ProgressionTable::new(vec![], tails.clone()).is_err());
        assert!(ProgressionTable::new(vec![5, 10], tails.clone()).is_err());
        assert!(ProgressionTable::new(vec![0, 10, 10], tails.clone()).is_err());
        assert!(ProgressionTable::new(vec![0; 100], tails).is_err());
        assert!(ProgressionTable::new(vec![0, 10], vec![1, 2, 3]).is_err());
        assert!(ProgressionTable::new(vec![0, 10], vec![8, 7, 6, 5, 4, 3, 2, 1]).is_err());
    }
}
