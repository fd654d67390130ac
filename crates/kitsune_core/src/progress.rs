//! The single user's complete progression state.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::achievements::AchievementId;
use crate::curve::ProgressionTable;
use crate::ledger::SkillLedger;
use crate::mood::{Emote, Mood};

/// Everything that survives between sessions. Tail stage and total level are
/// computed from the ledger on demand and have no stored copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionProgress {
    pub ledger: SkillLedger,
    /// Unlocked achievements with their unlock time. Entries are never removed.
    pub unlocked: BTreeMap<AchievementId, DateTime<Utc>>,
    /// Completed turns.
    pub total_interactions: u64,
    pub mood: Mood,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl CompanionProgress {
    /// First-run state: all skills at level 1, nothing unlocked.
    pub fn new(table: Arc<ProgressionTable>, now: DateTime<Utc>) -> Self {
        Self {
            ledger: SkillLedger::new(table),
            unlocked: BTreeMap::new(),
            total_interactions: 0,
            mood: Mood::default(),
            created_at: now,
            last_updated_at: now,
        }
    }

    pub fn fresh() -> Self {
        Self::new(Arc::new(ProgressionTable::default()), Utc::now())
    }

    pub fn tail_stage(&self) -> u8 {
        self.ledger.tail_stage()
    }

    pub fn total_level(&self) -> u32 {
        self.ledger.total_level()
    }

    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.unlocked.contains_key(&id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    /// Record an unlock. Returns false if it was already present; the
    /// original unlock time is kept.
    pub fn record_unlock(&mut self, id: AchievementId, at: DateTime<Utc>) -> bool {
        if self.unlocked.contains_key(&id) {
            return false;
        }
        self.unlocked.insert(id, at);
        true
    }

    pub fn available_emotes(&self) -> Vec<Emote> {
        Emote::available(self.total_level())
    }

    /// Total level needed for the next tail, if one remains.
    pub fn next_tail_threshold(&self) -> Option<u32> {
        self.ledger.table().next_tail_threshold(self.total_level())
    }
}
