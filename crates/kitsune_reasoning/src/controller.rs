//! One conversational turn end to end: send the message to the model, score
//! the exchange, grow the companion and persist the result.

use crate::api_types::{Message, Role};
use crate::llm::{CompletionParams, LlmClient};
use crate::retry::UpstreamError;
use chrono::Utc;
use kitsune_core::{
    AchievementEngine, AchievementId, ActivityClassifier, CompanionError, CompanionProgress,
    ConversationTurn, LevelUp, LlmConfig, Mood, XpGrant,
};
use kitsune_store::ProgressStore;
use std::time::Duration;

type Result<T> = std::result::Result<T, CompanionError>;

/// Per-turn knobs taken from `[llm]`.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub system_prompt: String,
    pub params: CompletionParams,
    pub timeout: Duration,
    pub max_history: usize,
}

impl TurnSettings {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            system_prompt: config.system_prompt.clone(),
            params: CompletionParams {
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            },
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            max_history: config.max_history_messages,
        }
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

/// Everything the UI needs to render the result of a turn.
#[derive(Debug)]
pub struct TurnOutcome {
    pub reply: String,
    pub grants: Vec<XpGrant>,
    pub level_ups: Vec<LevelUp>,
    pub new_achievements: Vec<AchievementId>,
    /// Set only when the tail count grew this turn.
    pub new_tail_stage: Option<u8>,
    pub progress: CompanionProgress,
    /// The turn still counts in memory when saving fails; call
    /// [`CompanionController::save`] to retry.
    pub save_error: Option<CompanionError>,
}

pub struct CompanionController {
    client: Box<dyn LlmClient>,
    store: ProgressStore,
    classifier: ActivityClassifier,
    achievements: AchievementEngine,
    progress: CompanionProgress,
    history: Vec<Message>,
    settings: TurnSettings,
}

impl CompanionController {
    pub fn new(
        client: Box<dyn LlmClient>,
        store: ProgressStore,
        classifier: ActivityClassifier,
        progress: CompanionProgress,
        settings: TurnSettings,
    ) -> Self {
        Self {
            client,
            store,
            classifier,
            achievements: AchievementEngine::default(),
            progress,
            history: Vec::new(),
            settings,
        }
    }

    pub fn progress(&self) -> &CompanionProgress {
        &self.progress
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    pub async fn handle_turn(&mut self, user_message: &str) -> Result<TurnOutcome> {
        let user_message = user_message.trim();
        if user_message.is_empty() {
            return Err(CompanionError::invalid("message is empty"));
        }

        let reply = self.ask_model(user_message).await?;

        // Past this point the turn is committed.
        let turn = ConversationTurn::new(user_message, reply.as_str());
        let grants = self.classifier.classify(&turn);
        let tail_before = self.progress.tail_stage();

        self.progress.total_interactions = self.progress.total_interactions.saturating_add(1);
        let level_ups: Vec<LevelUp> = grants
            .iter()
            .filter_map(|g| self.progress.ledger.apply_experience(g.skill, g.amount))
            .collect();
        self.progress.mood = Mood::after_turn(
            self.progress.mood,
            &grants,
            self.classifier.baseline(),
            &level_ups,
        );

        let now = Utc::now().max(self.progress.created_at);
        self.progress.last_updated_at = now;
        let new_achievements = self.achievements.evaluate(&mut self.progress, now);

        let tail_after = self.progress.tail_stage();
        let new_tail_stage = (tail_after > tail_before).then_some(tail_after);
        if let Some(stage) = new_tail_stage {
            tracing::info!(
                "Kitsune grew tail {} (total level {})",
                stage,
                self.progress.total_level()
            );
        }

        self.remember(user_message, &reply);

        let save_error = match self.store.save(&self.progress) {
            Ok(()) => None,
            Err(e) => {
                tracing::error!("Failed to save progress: {}", e);
                Some(e)
            }
        };

        Ok(TurnOutcome {
            reply,
            grants,
            level_ups,
            new_achievements,
            new_tail_stage,
            progress: self.progress.clone(),
            save_error,
        })
    }

    async fn ask_model(&self, user_message: &str) -> Result<String> {
        let mut messages = self.history.clone();
        messages.push(Message::user(user_message));

        let call = self
            .client
            .complete(&self.settings.system_prompt, messages, self.settings.params.clone());
        let response = match tokio::time::timeout(self.settings.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!("{} request failed: {:#}", self.client.name(), e);
                return Err(match e.downcast::<UpstreamError>() {
                    Ok(upstream) => upstream.into(),
                    Err(other) => CompanionError::UpstreamUnavailable(format!("{:#}", other)),
                });
            }
            Err(_) => {
                tracing::warn!(
                    "{} did not answer within {:?}",
                    self.client.name(),
                    self.settings.timeout
                );
                return Err(CompanionError::UpstreamUnavailable(format!(
                    "no reply within {}s",
                    self.settings.timeout.as_secs()
                )));
            }
        };

        let reply = response.text.trim();
        if reply.is_empty() {
            return Err(CompanionError::UpstreamUnavailable(
                "model returned an empty reply".to_string(),
            ));
        }
        Ok(reply.to_string())
    }

    fn remember(&mut self, user_message: &str, reply: &str) {
        self.history.push(Message::user(user_message));
        self.history.push(Message::assistant(reply));

        let cap = self.settings.max_history;
        if self.history.len() > cap {
            let overflow = self.history.len() - cap;
            self.history.drain(0..overflow);
        }
        // A conversation must not open on an assistant message.
        while matches!(self.history.first(), Some(m) if m.role == Role::Assistant) {
            self.history.remove(0);
        }
    }

    /// Write the current progress again, e.g. after a failed save.
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.progress)
    }

    /// Start over: fresh progress on disk and in memory, empty history.
    pub fn reset(&mut self) -> Result<&CompanionProgress> {
        self.progress = self.store.reset()?;
        self.history.clear();
        Ok(&self.progress)
    }

    pub async fn health_check(&self) -> Result<()> {
        match tokio::time::timeout(self.settings.timeout, self.client.health_check()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(CompanionError::UpstreamUnavailable(format!("{:#}", e))),
            Err(_) => Err(CompanionError::UpstreamUnavailable(
                "health check timed out".to_string(),
            )),
        }
    }
}
