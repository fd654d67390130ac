//! Maps a conversation turn to experience grants.
//!
//! Purely rule-driven: an ordered list of [`XpRule`]s, each gated on message
//! length and/or keywords, either setting or adding to a skill's running
//! amount. No randomness, so identical text always yields identical grants.

use serde::{Deserialize, Serialize};

use crate::skills::SkillId;

/// One completed exchange. Only the user side is scored today; the reply is
/// carried so rules over it can be added without changing the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub user_message: String,
    pub assistant_reply: String,
}

impl ConversationTurn {
    pub fn new(user_message: impl Into<String>, assistant_reply: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            assistant_reply: assistant_reply.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpGrant {
    pub skill: SkillId,
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOp {
    /// Replace the amount accumulated so far for the skill.
    Set,
    #[default]
    Add,
}

/// A single scoring rule.
///
/// Matches when the user message is longer than `min_chars` (if given) and
/// contains at least one of `keywords` (if any are given). A rule with
/// neither condition always matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpRule {
    pub skill: SkillId,
    pub amount: u64,
    #[serde(default)]
    pub op: RuleOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_chars: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl XpRule {
    fn keywords(skill: SkillId, op: RuleOp, amount: u64, words: &[&str]) -> Self {
        Self {
            skill,
            amount,
            op,
            min_chars: None,
            keywords: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    fn longer_than(skill: SkillId, amount: u64, chars: usize) -> Self {
        Self {
            skill,
            amount,
            op: RuleOp::Set,
            min_chars: Some(chars),
            keywords: Vec::new(),
        }
    }

    fn is_unconditional(&self) -> bool {
        self.min_chars.is_none() && self.keywords.is_empty()
    }

    fn matches(&self, lowered: &str, char_count: usize) -> bool {
        let long_enough = self.min_chars.map_or(true, |n| char_count > n);
        let has_keyword =
            self.keywords.is_empty() || self.keywords.iter().any(|k| lowered.contains(k.as_str()));
        long_enough && has_keyword
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub rules: Vec<XpRule>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        use RuleOp::{Add, Set};
        use SkillId::*;

        Self {
            rules: vec![
                XpRule::keywords(Analysis, Set, 10, &["?"]),
                XpRule::keywords(
                    Analysis,
                    Add,
                    15,
                    &["analyze", "data", "pattern", "study", "research"],
                ),
                XpRule::longer_than(Communication, 15, 100),
                XpRule::longer_than(Communication, 25, 200),
                XpRule::keywords(Helpfulness, Set, 20, &["help", "please", "thanks", "thank you"]),
                XpRule::keywords(
                    ProblemSolving,
                    Set,
                    25,
                    &["code", "debug", "error", "fix", "solve", "problem"],
                ),
                XpRule::keywords(
                    ProblemSolving,
                    Add,
                    20,
                    &["function", "python", "javascript", "html", "css"],
                ),
                XpRule::keywords(
                    Creativity,
                    Set,
                    30,
                    &["create", "story", "poem", "write", "creative", "art"],
                ),
                XpRule::keywords(Creativity, Add, 15, &["design", "imagine", "invent", "original"]),
                XpRule::keywords(
                    Learning,
                    Set,
                    18,
                    &["learn", "teach", "explain", "understand", "how"],
                ),
                XpRule::keywords(Learning, Add, 12, &["why", "what", "when", "where", "tutorial"]),
                XpRule::longer_than(Patience, 10, 300),
                XpRule::keywords(Patience, Add, 8, &["wait", "slowly", "careful", "detail"]),
                XpRule::keywords(Empathy, Set, 22, &["feel", "emotion", "sad", "happy", "worried"]),
                XpRule::keywords(Empathy, Add, 15, &["understand", "support", "comfort", "listen"]),
                // Every turn is worth a little wisdom.
                XpRule::keywords(Wisdom, Set, 5, &[]),
                XpRule::keywords(Wisdom, Set, 25, &["wise", "advice", "guidance", "insight"]),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActivityClassifier {
    rules: Vec<XpRule>,
    baseline: Vec<XpGrant>,
}

impl Default for ActivityClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl ActivityClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        let rules = config
            .rules
            .into_iter()
            .map(|mut rule| {
                rule.keywords = rule
                    .keywords
                    .into_iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                rule
            })
            .collect::<Vec<XpRule>>();
        let mut totals = [0u64; SkillId::COUNT];
        for rule in rules.iter().filter(|r| r.is_unconditional()) {
            accumulate(&mut totals, rule);
        }
        let baseline = grants_from(totals);
        Self { rules, baseline }
    }

    /// What any non-empty turn earns from the rules that always match.
    pub fn baseline(&self) -> &[XpGrant] {
        &self.baseline
    }

    /// Grants for a turn, in canonical skill order, zero amounts omitted.
    /// An empty or whitespace-only user message earns nothing.
    pub fn classify(&self, turn: &ConversationTurn) -> Vec<XpGrant> {
        let text = turn.user_message.trim();
        if text.is_empty() {
            return Vec::new();
        }
        let lowered = text.to_lowercase();
        let char_count = text.chars().count();

        let mut totals = [0u64; SkillId::COUNT];
        for rule in self.rules.iter().filter(|r| r.matches(&lowered, char_count)) {
            accumulate(&mut totals, rule);
        }

        let grants = grants_from(totals);
        tracing::debug!("Classified turn ({} chars): {:?}", char_count, grants);
        grants
    }
}

fn accumulate(totals: &mut [u64; SkillId::COUNT], rule: &XpRule) {
    let slot = &mut totals[rule.skill.index()];
    *slot = match rule.op {
        RuleOp::Set => rule.amount,
        RuleOp::Add => slot.saturating_add(rule.amount),
    };
}

fn grants_from(totals: [u64; SkillId::COUNT]) -> Vec<XpGrant> {
    SkillId::ALL
        .into_iter()
        .zip(totals)
        .filter(|(_, amount)| *amount > 0)
        .map(|(skill, amount)| XpGrant { skill, amount })
        .collect()
}
