//! Achievement diary.
//!
//! The rule set is a fixed, ordered table of predicates. Each evaluation pass
//! reads one immutable snapshot of the progress, so unlocks from the current
//! pass are invisible to the other rules until the next pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::curve::{MAX_LEVEL, MAX_TAIL_STAGE};
use crate::progress::CompanionProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstInteraction,
    #[serde(rename = "helpful_100")]
    Helpful100,
    #[serde(rename = "level_10_all")]
    Level10All,
    #[serde(rename = "level_50_any")]
    Level50Any,
    #[serde(rename = "total_level_200")]
    TotalLevel200,
    #[serde(rename = "level_99_any")]
    Level99Any,
    AllTails,
    AchievementHunter,
}

impl AchievementId {
    pub fn as_str(self) -> &'static str {
        match self {
            AchievementId::FirstInteraction => "first_interaction",
            AchievementId::Helpful100 => "helpful_100",
            AchievementId::Level10All => "level_10_all",
            AchievementId::Level50Any => "level_50_any",
            AchievementId::TotalLevel200 => "total_level_200",
            AchievementId::Level99Any => "level_99_any",
            AchievementId::AllTails => "all_tails",
            AchievementId::AchievementHunter => "achievement_hunter",
        }
    }

    /// The declared rule for this id. `RULES` is laid out in enum order.
    pub fn rule(self) -> &'static AchievementRule {
        &RULES[self as usize]
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule().name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Dragon,
}

pub struct AchievementRule {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub tier: Tier,
    pub predicate: fn(&CompanionProgress) -> bool,
}

impl fmt::Debug for AchievementRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AchievementRule")
            .field("id", &self.id)
            .field("tier", &self.tier)
            .finish()
    }
}

/// Declaration order is evaluation order.
pub static RULES: &[AchievementRule] = &[
    AchievementRule {
        id: AchievementId::FirstInteraction,
        name: "First Steps",
        description: "Have your first conversation",
        tier: Tier::Bronze,
        predicate: |p| p.total_interactions >= 1,
    },
    AchievementRule {
        id: AchievementId::Helpful100,
        name: "Helpful Fox",
        description: "Complete 100 conversations",
        tier: Tier::Bronze,
        predicate: |p| p.total_interactions >= 100,
    },
    AchievementRule {
        id: AchievementId::Level10All,
        name: "Balanced Growth",
        description: "Reach level 10 in all skills",
        tier: Tier::Silver,
        predicate: |p| p.ledger.iter().all(|s| s.level >= 10),
    },
    AchievementRule {
        id: AchievementId::Level50Any,
        name: "Adept",
        description: "Reach level 50 in any skill",
        tier: Tier::Silver,
        predicate: |p| p.ledger.iter().any(|s| s.level >= 50),
    },
    AchievementRule {
        id: AchievementId::TotalLevel200,
        name: "Rising Star",
        description: "Reach total level 200",
        tier: Tier::Gold,
        predicate: |p| p.total_level() >= 200,
    },
    AchievementRule {
        id: AchievementId::Level99Any,
        name: "Master",
        description: "Reach level 99 in any skill",
        tier: Tier::Dragon,
        predicate: |p| p.ledger.iter().any(|s| s.level >= MAX_LEVEL),
    },
    AchievementRule {
        id: AchievementId::AllTails,
        name: "Nine-Tailed Legend",
        description: "Unlock all 9 tails",
        tier: Tier::Dragon,
        predicate: |p| p.tail_stage() >= MAX_TAIL_STAGE,
    },
    AchievementRule {
        id: AchievementId::AchievementHunter,
        name: "Achievement Hunter",
        description: "Unlock 5 other achievements",
        tier: Tier::Gold,
        predicate: |p| p.unlocked_count() >= 5,
    },
];

#[derive(Debug, Clone, Copy)]
pub struct AchievementEngine {
    rules: &'static [AchievementRule],
}

impl Default for AchievementEngine {
    fn default() -> Self {
        Self { rules: RULES }
    }
}

impl AchievementEngine {
    pub fn rules(&self) -> &'static [AchievementRule] {
        self.rules
    }

    /// Ids whose predicate holds and that are not yet unlocked, in
    /// declaration order. Does not modify anything.
    pub fn pending(&self, progress: &CompanionProgress) -> Vec<AchievementId> {
        self.rules
            .iter()
            .filter(|r| !progress.is_unlocked(r.id))
            .filter(|r| (r.predicate)(progress))
            .map(|r| r.id)
            .collect()
    }

    /// Unlock everything that holds and return the newly unlocked ids.
    ///
    /// Each pass reads its own snapshot through [`AchievementEngine::pending`];
    /// passes repeat until one unlocks nothing, so rules that depend on other
    /// unlocks settle in the same call. Running it again on unchanged
    /// progress returns an empty list.
    pub fn evaluate(
        &self,
        progress: &mut CompanionProgress,
        now: DateTime<Utc>,
    ) -> Vec<AchievementId> {
        let mut newly = Vec::new();
        loop {
            let pass = self.pending(progress);
            if pass.is_empty() {
                break;
            }
            for id in &pass {
                progress.record_unlock(*id, now);
                tracing::info!("Achievement unlocked: {} ({})", id, id.as_str());
            }
            newly.extend(pass);
        }
        newly
    }
}
