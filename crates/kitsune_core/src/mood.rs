//! Cosmetic disposition and emotes. Both are derived, deterministic views
//! for the UI layer; neither feeds back into progression.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classifier::XpGrant;
use crate::ledger::LevelUp;
use crate::skills::SkillId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    #[default]
    Curious,
    Helpful,
    Playful,
    Wise,
    Content,
    Excited,
    Focused,
}

impl Mood {
    /// Mood after a turn. A level-up always excites; otherwise the skill that
    /// received the most experience decides, ties going to canonical order.
    ///
    /// `baseline` is what every turn earns regardless of content (see
    /// [`ActivityClassifier::baseline`](crate::ActivityClassifier::baseline)).
    /// A grant no larger than its skill's baseline says nothing about the
    /// turn, so a turn that only earns the baseline keeps the previous mood.
    pub fn after_turn(
        previous: Mood,
        grants: &[XpGrant],
        baseline: &[XpGrant],
        level_ups: &[LevelUp],
    ) -> Mood {
        if !level_ups.is_empty() {
            return Mood::Excited;
        }
        let floor = |skill: SkillId| {
            baseline
                .iter()
                .find(|b| b.skill == skill)
                .map_or(0, |b| b.amount)
        };
        let dominant = grants
            .iter()
            .filter(|g| g.amount > floor(g.skill))
            .fold(None::<&XpGrant>, |best, g| match best {
                Some(b) if b.amount >= g.amount => Some(b),
                _ => Some(g),
            });

        match dominant.map(|g| g.skill) {
            Some(SkillId::ProblemSolving) => Mood::Focused,
            Some(SkillId::Creativity) => Mood::Playful,
            Some(SkillId::Analysis | SkillId::Learning | SkillId::Helpfulness) => Mood::Helpful,
            Some(SkillId::Empathy | SkillId::Patience) => Mood::Content,
            Some(SkillId::Communication) => Mood::Curious,
            Some(SkillId::Wisdom) => Mood::Wise,
            None => previous,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Curious => "curious",
            Mood::Helpful => "helpful",
            Mood::Playful => "playful",
            Mood::Wise => "wise",
            Mood::Content => "content",
            Mood::Excited => "excited",
            Mood::Focused => "focused",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emote {
    TailWag,
    FoxDance,
    WiseNod,
    MagicSparkle,
    NineTailFlourish,
}

impl Emote {
    pub const ALL: [Emote; 5] = [
        Emote::TailWag,
        Emote::FoxDance,
        Emote::WiseNod,
        Emote::MagicSparkle,
        Emote::NineTailFlourish,
    ];

    /// Total level at which the emote becomes available.
    pub fn unlock_level(self) -> u32 {
        match self {
            Emote::TailWag => 1,
            Emote::FoxDance => 10,
            Emote::WiseNod => 25,
            Emote::MagicSparkle => 50,
            Emote::NineTailFlourish => 99,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Emote::TailWag => "Tail Wag",
            Emote::FoxDance => "Fox Dance",
            Emote::WiseNod => "Wise Nod",
            Emote::MagicSparkle => "Magic Sparkle",
            Emote::NineTailFlourish => "Nine Tail Flourish",
        }
    }

    pub fn available(total_level: u32) -> Vec<Emote> {
        Self::ALL
            .into_iter()
            .filter(|e| total_level >= e.unlock_level())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(skill: SkillId, amount: u64) -> XpGrant {
        XpGrant { skill, amount }
    }

    const BASELINE: [XpGrant; 1] = [XpGrant {
        skill: SkillId::Wisdom,
        amount: 5,
    }];

    #[test]
    fn test_level_up_excites() {
        let up = LevelUp {
            skill: SkillId::Wisdom,
            old_level: 1,
            new_level: 2,
        };
        assert_eq!(Mood::after_turn(Mood::Curious, &[], &BASELINE, &[up]), Mood::Excited);
    }

    #[test]
    fn test_dominant_skill_decides() {
        let grants = [grant(SkillId::Wisdom, 5), grant(SkillId::ProblemSolving, 45)];
        assert_eq!(Mood::after_turn(Mood::Curious, &grants, &BASELINE, &[]), Mood::Focused);

        let grants = [grant(SkillId::Wisdom, 5), grant(SkillId::Creativity, 30)];
        assert_eq!(Mood::after_turn(Mood::Focused, &grants, &BASELINE, &[]), Mood::Playful);
    }

    #[test]
    fn test_tie_goes_to_canonical_order() {
        let grants = [grant(SkillId::Analysis, 20), grant(SkillId::Helpfulness, 20)];
        assert_eq!(Mood::after_turn(Mood::Curious, &grants, &BASELINE, &[]), Mood::Helpful);
        let grants = [grant(SkillId::Creativity, 25), grant(SkillId::ProblemSolving, 25)];
        assert_eq!(Mood::after_turn(Mood::Curious, &grants, &BASELINE, &[]), Mood::Playful);
    }

    #[test]
    fn test_baseline_keeps_previous_mood() {
        let grants = [grant(SkillId::Wisdom, 5)];
        assert_eq!(Mood::after_turn(Mood::Playful, &grants, &BASELINE, &[]), Mood::Playful);
        let grants = [grant(SkillId::Wisdom, 25)];
        assert_eq!(Mood::after_turn(Mood::Playful, &grants, &BASELINE, &[]), Mood::Wise);
    }

    #[test]
    fn test_baseline_follows_the_classifier() {
        let grants = [grant(SkillId::Wisdom, 5), grant(SkillId::Empathy, 3)];
        // Without a baseline even the five wisdom points count.
        assert_eq!(Mood::after_turn(Mood::Playful, &grants, &[], &[]), Mood::Wise);

        let baseline = [grant(SkillId::Empathy, 3), grant(SkillId::Wisdom, 5)];
        assert_eq!(Mood::after_turn(Mood::Playful, &grants, &baseline, &[]), Mood::Playful);

        let grants = [grant(SkillId::Wisdom, 5), grant(SkillId::Empathy, 10)];
        assert_eq!(Mood::after_turn(Mood::Playful, &grants, &baseline, &[]), Mood::Content);
    }

    #[test]
    fn test_emotes_by_total_level() {
        assert_eq!(Emote::available(9), vec![Emote::TailWag]);
        assert_eq!(Emote::available(50).len(), 4);
        assert_eq!(Emote::available(891).len(), 5);
    }
}
