//! Plain-text views of the companion for the terminal.

use kitsune_core::{AchievementEngine, CompanionProgress, SkillId, MAX_TAIL_STAGE};
use kitsune_reasoning::TurnOutcome;

const BAR_WIDTH: usize = 20;

pub fn status(progress: &CompanionProgress) -> String {
    let stage = progress.tail_stage();
    let tails = format!("(=^.^=){}", "~".repeat(usize::from(stage)));
    let next = match progress.next_tail_threshold() {
        Some(t) => format!("next tail at total level {}", t),
        None => "all tails grown".to_string(),
    };
    format!(
        "{} {}/{} tails | total level {} | mood {} | {} interactions | {}",
        tails,
        stage,
        MAX_TAIL_STAGE,
        progress.total_level(),
        progress.mood,
        progress.total_interactions,
        next
    )
}

pub fn progress_bar(into: u64, span: u64) -> String {
    let filled = if span == 0 {
        BAR_WIDTH
    } else {
        ((into.min(span) as f64 / span as f64) * BAR_WIDTH as f64) as usize
    };
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub fn skills(progress: &CompanionProgress) -> String {
    let mut out = String::new();
    for skill in SkillId::ALL {
        let state = progress.ledger.skill(skill);
        let bar = match progress.ledger.progress_to_next(skill) {
            Some((into, span)) => format!("{} {}/{}", progress_bar(into, span), into, span),
            None => format!("{} max", progress_bar(1, 1)),
        };
        out.push_str(&format!(
            "{:<16} lvl {:>2}  {:>10} xp  {}\n",
            skill.display_name(),
            state.level,
            state.experience,
            bar
        ));
    }
    out
}

pub fn achievements(progress: &CompanionProgress) -> String {
    let mut out = String::new();
    for rule in AchievementEngine::default().rules() {
        let mark = match progress.unlocked.get(&rule.id) {
            Some(at) => format!("[x] {}", at.format("%Y-%m-%d")),
            None => "[ ]           ".to_string(),
        };
        out.push_str(&format!(
            "{} {:<20} {:?}  {}\n",
            mark, rule.name, rule.tier, rule.description
        ));
    }
    out.push_str(&format!(
        "{}/{} unlocked\n",
        progress.unlocked_count(),
        AchievementEngine::default().rules().len()
    ));
    out
}

pub fn emotes(progress: &CompanionProgress) -> String {
    let names: Vec<&str> = progress.available_emotes().iter().map(|e| e.name()).collect();
    format!("Emotes: {}", names.join(", "))
}

/// Lines shown under the reply.
pub fn outcome(outcome: &TurnOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    if !outcome.grants.is_empty() {
        let grants: Vec<String> = outcome
            .grants
            .iter()
            .map(|g| format!("+{} {}", g.amount, g.skill.display_name()))
            .collect();
        lines.push(grants.join("  "));
    }
    for up in &outcome.level_ups {
        lines.push(format!(
            "Level up! {} {} -> {}",
            up.skill.display_name(),
            up.old_level,
            up.new_level
        ));
    }
    for id in &outcome.new_achievements {
        let rule = id.rule();
        lines.push(format!("Achievement unlocked: {} ({})", rule.name, rule.description));
    }
    if let Some(stage) = outcome.new_tail_stage {
        lines.push(format!("Kitsune grew a new tail! Now {}/{}", stage, MAX_TAIL_STAGE));
    }
    if let Some(e) = &outcome.save_error {
        lines.push(format!("Warning: progress not saved ({}). Use /save to retry.", e));
    }
    lines
}
