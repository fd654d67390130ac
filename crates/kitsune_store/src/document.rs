//! On-disk shape of the progress document.
//!
//! Every field is required: a missing or malformed field is corruption, not a
//! reason to fall back to a default.

use chrono::{DateTime, Utc};
use kitsune_core::{
    AchievementId, CompanionProgress, Mood, ProgressionTable, SkillId, SkillLedger,
    MAX_EXPERIENCE, MAX_LEVEL,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillRecord {
    pub experience: u64,
    /// Recomputed from `experience` on load. Must still lie in 1..=99.
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgressDocument {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub total_interactions: u64,
    pub mood: Mood,
    pub skills: BTreeMap<SkillId, SkillRecord>,
    pub achievements: BTreeMap<AchievementId, DateTime<Utc>>,
}

impl ProgressDocument {
    pub fn from_progress(progress: &CompanionProgress) -> Self {
        let skills = progress
            .ledger
            .iter()
            .map(|s| {
                (
                    s.skill,
                    SkillRecord {
                        experience: s.experience,
                        level: s.level,
                    },
                )
            })
            .collect();

        Self {
            version: DOCUMENT_VERSION,
            created_at: progress.created_at,
            last_updated_at: progress.last_updated_at,
            total_interactions: progress.total_interactions,
            mood: progress.mood,
            skills,
            achievements: progress.unlocked.clone(),
        }
    }

    /// Convert back into live progress. The error string explains what made
    /// the document unusable.
    pub fn into_progress(self, table: Arc<ProgressionTable>) -> Result<CompanionProgress, String> {
        if self.version != DOCUMENT_VERSION {
            return Err(format!(
                "unsupported document version {} (expected {})",
                self.version, DOCUMENT_VERSION
            ));
        }
        if self.last_updated_at < self.created_at {
            return Err("last_updated_at precedes created_at".to_string());
        }

        let mut experience = [0u64; SkillId::COUNT];
        for skill in SkillId::ALL {
            let record = self
                .skills
                .get(&skill)
                .ok_or_else(|| format!("missing skill `{}`", skill.as_str()))?;
            if record.experience > MAX_EXPERIENCE {
                return Err(format!(
                    "skill `{}` has {} experience, above the cap of {}",
                    skill.as_str(),
                    record.experience,
                    MAX_EXPERIENCE
                ));
            }
            if !(1..=MAX_LEVEL).contains(&record.level) {
                return Err(format!(
                    "skill `{}` has impossible level {}",
                    skill.as_str(),
                    record.level
                ));
            }
            experience[skill.index()] = record.experience;
        }

        let ledger = SkillLedger::from_experience(table, experience);
        for state in ledger.iter() {
            let stored = self.skills[&state.skill].level;
            if stored != state.level {
                tracing::warn!(
                    "Stored level {} for {} does not match {} xp (level {}); \
                     using the computed level",
                    stored,
                    state.skill,
                    state.experience,
                    state.level
                );
            }
        }

        Ok(CompanionProgress {
            ledger,
            unlocked: self.achievements,
            total_interactions: self.total_interactions,
            mood: self.mood,
            created_at: self.created_at,
            last_updated_at: self.last_updated_at,
        })
    }
}
