//! Per-skill experience totals and the levels derived from them.

use std::sync::Arc;

use crate::curve::{ProgressionTable, MAX_EXPERIENCE};
use crate::skills::{SkillId, SkillState};

/// A level change produced by a single grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub skill: SkillId,
    pub old_level: u8,
    pub new_level: u8,
}

/// Holds all nine skills. Levels are always recomputed from experience
/// through the shared table, never set directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillLedger {
    table: Arc<ProgressionTable>,
    skills: [SkillState; SkillId::COUNT],
}

impl SkillLedger {
    /// Fresh ledger: every skill at 0 experience, level 1.
    pub fn new(table: Arc<ProgressionTable>) -> Self {
        Self {
            table,
            skills: SkillId::ALL.map(SkillState::new),
        }
    }

    /// Rebuild a ledger from stored experience totals, deriving levels.
    /// Totals above the cap are clamped.
    pub fn from_experience(
        table: Arc<ProgressionTable>,
        experience: [u64; SkillId::COUNT],
    ) -> Self {
        let mut ledger = Self::new(table);
        for (state, xp) in ledger.skills.iter_mut().zip(experience) {
            state.experience = xp.min(MAX_EXPERIENCE);
            state.level = ledger.table.level_for(state.experience);
        }
        ledger
    }

    pub fn table(&self) -> &Arc<ProgressionTable> {
        &self.table
    }

    /// Add `amount` experience to `skill` and recompute its level.
    ///
    /// Experience saturates at [`MAX_EXPERIENCE`], so splitting a grant across
    /// several calls always lands on the same level as one combined call.
    pub fn apply_experience(&mut self, skill: SkillId, amount: u64) -> Option<LevelUp> {
        let state = &mut self.skills[skill.index()];
        let old_level = state.level;
        state.experience = state.experience.saturating_add(amount).min(MAX_EXPERIENCE);
        state.level = self.table.level_for(state.experience);

        if state.level > old_level {
            tracing::info!(
                "{} leveled up: {} -> {} ({} xp)",
                skill,
                old_level,
                state.level,
                state.experience
            );
            Some(LevelUp {
                skill,
                old_level,
                new_level: state.level,
            })
        } else {
            None
        }
    }

    pub fn skill(&self, skill: SkillId) -> &SkillState {
        &self.skills[skill.index()]
    }

    pub fn level(&self, skill: SkillId) -> u8 {
        self.skill(skill).level
    }

    pub fn experience(&self, skill: SkillId) -> u64 {
        self.skill(skill).experience
    }

    /// All skills in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &SkillState> {
        self.skills.iter()
    }

    /// Sum of all nine levels (9..=891 on the default curve).
    pub fn total_level(&self) -> u32 {
        self.skills.iter().map(|s| u32::from(s.level)).sum()
    }

    pub fn total_experience(&self) -> u64 {
        self.skills.iter().map(|s| s.experience).sum()
    }

    /// Aggregate tail stage in [1, 9]. Pure function of the current levels.
    pub fn tail_stage(&self) -> u8 {
        self.table.tail_stage_for(self.total_level())
    }

    /// `(experience gained inside the current level, experience span of the
    /// current level)`. `None` once the skill is at the top of the table.
    pub fn progress_to_next(&self, skill: SkillId) -> Option<(u64, u64)> {
        let state = self.skill(skill);
        let floor = self.table.experience_for(state.level)?;
        let ceiling = self.table.experience_for(state.level.checked_add(1)?)?;
        Some((state.experience - floor, ceiling - floor))
    }
}
