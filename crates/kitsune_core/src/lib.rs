//! Headless progression core for the Kitsune companion.
//!
//! Nothing in this crate does I/O beyond reading the config file: the skill
//! ledger, level curve, achievement rules and XP classifier are all pure
//! computations over [`CompanionProgress`].

pub mod achievements;
pub mod classifier;
pub mod config;
pub mod curve;
pub mod error;
pub mod ledger;
pub mod mood;
pub mod progress;
pub mod skills;

pub use achievements::{AchievementEngine, AchievementId, AchievementRule, Tier, RULES};
pub use classifier::{
    ActivityClassifier, ClassifierConfig, ConversationTurn, RuleOp, XpGrant, XpRule,
};
pub use config::{KitsuneConfig, LlmConfig, ProgressionConfig, RetrySettings, StorageConfig};
pub use curve::{ProgressionTable, MAX_EXPERIENCE, MAX_LEVEL, MAX_TAIL_STAGE};
pub use error::CompanionError;
pub use ledger::{LevelUp, SkillLedger};
pub use mood::{Emote, Mood};
pub use progress::CompanionProgress;
pub use skills::{SkillId, SkillState};
