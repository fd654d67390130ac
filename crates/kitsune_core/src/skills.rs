//! The nine skill categories the companion grows in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CompanionError;

/// One of the nine fixed skills. Declaration order is the canonical order:
/// it drives grant ordering, document key ordering and UI listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillId {
    Wisdom,
    Helpfulness,
    Creativity,
    Analysis,
    Learning,
    Patience,
    Empathy,
    ProblemSolving,
    Communication,
}

impl SkillId {
    pub const COUNT: usize = 9;

    pub const ALL: [SkillId; Self::COUNT] = [
        SkillId::Wisdom,
        SkillId::Helpfulness,
        SkillId::Creativity,
        SkillId::Analysis,
        SkillId::Learning,
        SkillId::Patience,
        SkillId::Empathy,
        SkillId::ProblemSolving,
        SkillId::Communication,
    ];

    /// Position in `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable machine name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            SkillId::Wisdom => "wisdom",
            SkillId::Helpfulness => "helpfulness",
            SkillId::Creativity => "creativity",
            SkillId::Analysis => "analysis",
            SkillId::Learning => "learning",
            SkillId::Patience => "patience",
            SkillId::Empathy => "empathy",
            SkillId::ProblemSolving => "problem_solving",
            SkillId::Communication => "communication",
        }
    }

    /// Human-facing label.
    pub fn display_name(self) -> &'static str {
        match self {
            SkillId::Wisdom => "Wisdom",
            SkillId::Helpfulness => "Helpfulness",
            SkillId::Creativity => "Creativity",
            SkillId::Analysis => "Analysis",
            SkillId::Learning => "Learning",
            SkillId::Patience => "Patience",
            SkillId::Empathy => "Empathy",
            SkillId::ProblemSolving => "Problem-Solving",
            SkillId::Communication => "Communication",
        }
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SkillId {
    type Err = CompanionError;

    /// Accepts the machine name or the display label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace(['-', ' '], "_");
        SkillId::ALL
            .into_iter()
            .find(|id| id.as_str() == needle)
            .ok_or_else(|| CompanionError::invalid(format!("unknown skill `{}`", s)))
    }
}

/// Experience and derived level for one skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillState {
    pub skill: SkillId,
    pub experience: u64,
    pub level: u8,
}

impl SkillState {
    pub fn new(skill: SkillId) -> Self {
        Self {
            skill,
            experience: 0,
            level: 1,
        }
    }
}
