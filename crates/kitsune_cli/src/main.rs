use anyhow::Context;
use clap::Parser;
use kitsune_core::{ActivityClassifier, CompanionError, CompanionProgress, KitsuneConfig};
use kitsune_reasoning::{build_client, CompanionController, TurnSettings};
use kitsune_store::ProgressStore;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod render;

const DEFAULT_LOG_FILTER: &str =
    "kitsune=info,kitsune_core=info,kitsune_store=info,kitsune_reasoning=info";

#[derive(Parser, Debug)]
#[command(name = "kitsune", author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "kitsune.toml")]
    config: PathBuf,

    /// Where progress is saved (overrides [storage].save_path)
    #[arg(short, long, env = "KITSUNE_SAVE_PATH")]
    save: Option<PathBuf>,

    /// Model server base URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Backend: kitsune, ollama, openai or mock
    #[arg(short, long)]
    provider: Option<String>,

    /// Model name
    #[arg(short, long)]
    model: Option<String>,
}

const HELP: &str = "\
Commands:
  /status        tails, total level, mood
  /skills        skill levels with progress bars
  /achievements  unlocked and locked achievements
  /emotes        emotes available at this total level
  /save          save progress now
  /reset         start over (asks first)
  /health        check the model server
  /quit          exit
Anything else is sent to Kitsune.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut config = KitsuneConfig::load_or_default(&args.config)?;
    if let Some(save) = args.save {
        config.storage.save_path = save;
    }
    if let Some(endpoint) = args.endpoint {
        config.llm.endpoint = endpoint;
    }
    if let Some(provider) = args.provider {
        config.llm.provider = provider;
    }
    if let Some(model) = args.model {
        config.llm.model = model;
    }

    let table = config
        .progression
        .build_table()
        .context("Invalid [progression] table")?;
    let store = ProgressStore::new(config.storage.save_path.clone(), table);
    let mut rl = DefaultEditor::new()?;

    let progress = match load_progress(&store, &mut rl)? {
        Some(p) => p,
        None => {
            println!("Leaving the save file untouched. Bye!");
            return Ok(());
        }
    };

    let client = build_client(&config.llm)?;
    let mut controller = CompanionController::new(
        client,
        store,
        ActivityClassifier::new(config.classifier.clone()),
        progress,
        TurnSettings::from_config(&config.llm),
    );

    if let Err(e) = controller.health_check().await {
        warn!("{} is not reachable yet: {}", controller.client_name(), e);
    }

    println!("{}", render::status(controller.progress()));
    println!("Say hello to Kitsune. Type /help for commands.");

    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        match input {
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/status" => println!("{}", render::status(controller.progress())),
            "/skills" => print!("{}", render::skills(controller.progress())),
            "/achievements" => print!("{}", render::achievements(controller.progress())),
            "/emotes" => println!("{}", render::emotes(controller.progress())),
            "/save" => match controller.save() {
                Ok(()) => println!("Saved to {}", controller.store().path().display()),
                Err(e) => println!("[Save failed]: {}", e),
            },
            "/reset" => {
                if confirm(&mut rl, "Erase all progress? [y/N] ")? {
                    match controller.reset() {
                        Ok(p) => println!("{}", render::status(p)),
                        Err(e) => println!("[Reset failed]: {}", e),
                    }
                }
            }
            "/health" => match controller.health_check().await {
                Ok(()) => println!("{} is up.", controller.client_name()),
                Err(e) => println!("[Unavailable]: {}", e),
            },
            cmd if cmd.starts_with('/') => println!("Unknown command {}. Type /help.", cmd),
            message => match controller.handle_turn(message).await {
                Ok(outcome) => {
                    println!("\nKitsune: {}\n", outcome.reply);
                    for extra in render::outcome(&outcome) {
                        println!("  {}", extra);
                    }
                }
                Err(e) => {
                    error!("Turn failed: {}", e);
                    println!("\n[Kitsune is unavailable]: {}\n", e);
                }
            },
        }
    }

    if let Err(e) = controller.save() {
        error!("Final save failed: {}", e);
    }
    info!("Goodbye");
    Ok(())
}

/// Load saved progress. An unreadable save file is never discarded silently:
/// the user either resets (the old file is moved aside) or the program stops.
fn load_progress(
    store: &ProgressStore,
    rl: &mut DefaultEditor,
) -> anyhow::Result<Option<CompanionProgress>> {
    match store.load() {
        Ok(p) => Ok(Some(p)),
        Err(e @ CompanionError::CorruptData { .. }) => {
            println!("{}", e);
            if !confirm(rl, "Start over with fresh progress? The old file is kept aside. [y/N] ")? {
                return Ok(None);
            }
            if let Some(moved) = store.quarantine()? {
                println!("Old save moved to {}", moved.display());
            }
            Ok(Some(store.reset()?))
        }
        Err(e) => Err(e.into()),
    }
}

fn confirm(rl: &mut DefaultEditor, prompt: &str) -> anyhow::Result<bool> {
    match rl.readline(prompt) {
        Ok(answer) => Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
