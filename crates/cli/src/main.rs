mod render;

use cf_core::catalog;
use cf_core::config::loader::{load_config, CONFIG_DIR};
use cf_core::config::models::AppConfig;
use cf_core::engine::{Orchestrator, OrchestratorSettings};
use cf_core::init::{generate_codeflow_structure, InitOptions};
use cf_core::state::SessionManager;
use cf_core::store::{FileStore, Records};
use cf_core::transport::{HttpTransport, RetryPolicy, RetryingTransport};
use cf_protocol::config_models::ModelProvider;
use cf_protocol::ipc::{Event, Op};
use cf_protocol::run_models::RunStatus;
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Result, WrapErr};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

const STATE_FILE: &str = "state.json";

#[derive(Parser)]
#[command(name = "codeflow", version, about = "Multi-step LLM code generation workflows")]
struct Cli {
    /// Project directory containing `.codeflow/`
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Print events as JSON lines instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a `.codeflow/` directory with starter templates
    Init {
        /// Overwrite an existing `.codeflow/` directory
        #[arg(long)]
        force: bool,

        /// Only the default prompt and one automation
        #[arg(long)]
        minimal: bool,
    },
    /// Run one prompt to completion
    Run {
        prompt: String,

        /// Debug the final code after generation
        #[arg(long)]
        auto_debug: bool,

        /// Ask the model to reason step by step
        #[arg(long)]
        think: bool,

        /// Name of the system prompt to apply
        #[arg(long)]
        system_prompt: Option<String>,
    },
    /// Replay a saved automation
    Automate {
        /// Automation id
        id: String,

        /// Loop forever regardless of the saved setting (stop with Ctrl-C)
        #[arg(long)]
        infinite: bool,
    },
    /// Run a debug pass over a file
    Debug { file: PathBuf },
    /// Rate the most recent interaction (0-10)
    Rate { score: u8 },
    /// List available system prompts
    Prompts,
    /// List saved automations
    Automations,
    /// Export stored automations as JSON
    ExportAutomations,
    /// Replace stored automations with a JSON array from a file
    ImportAutomations { file: PathBuf },
    /// List the models a provider offers
    Models {
        #[arg(value_enum)]
        provider: ProviderArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Ollama,
    Lmstudio,
    Openai,
    Claude,
}

impl From<ProviderArg> for ModelProvider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Ollama => ModelProvider::Ollama,
            ProviderArg::Lmstudio => ModelProvider::Lmstudio,
            ProviderArg::Openai => ModelProvider::Openai,
            ProviderArg::Claude => ModelProvider::Claude,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let records = Records::new(Arc::new(FileStore::new(
        cli.root.join(CONFIG_DIR).join(STATE_FILE),
    )));

    match cli.command {
        Commands::Init { force, minimal } => {
            let written = generate_codeflow_structure(InitOptions {
                target_dir: cli.root.clone(),
                force,
                minimal,
            })
            .await?;
            for path in written {
                println!("{} {}", "created".green(), path.display());
            }
        }
        Commands::Run {
            prompt,
            auto_debug,
            think,
            system_prompt,
        } => {
            let config = load_config(&cli.root).await?;
            let mut settings = settings_for(&config, &records, system_prompt.as_deref()).await?;
            settings.auto_debug |= auto_debug;
            settings.thinking_mode |= think;

            let session = Session::start(&config, &records, settings, cli.json).await?;
            session.manager.submit_prompt(prompt).await?;
            session.finish(Until::RunEnds).await?;
        }
        Commands::Automate { id, infinite } => {
            let config = load_config(&cli.root).await?;
            let automation = match config.automation(&id) {
                Some(automation) => automation.clone(),
                None => records
                    .automations()
                    .await?
                    .into_iter()
                    .find(|a| a.id == id)
                    .ok_or_else(|| eyre!("automation '{id}' not found"))?,
            };
            let settings = settings_for(&config, &records, None).await?;

            let session = Session::start(&config, &records, settings, cli.json).await?;
            session
                .manager
                .handle_op(Op::StartAutomation {
                    prompts: automation.prompts,
                    infinite_loop: infinite || automation.infinite_loop,
                })
                .await?;
            session.finish(Until::AutomationEnds).await?;
        }
        Commands::Debug { file } => {
            let code = tokio::fs::read_to_string(&file)
                .await
                .wrap_err_with(|| format!("failed to read {}", file.display()))?;
            let config = load_config(&cli.root).await?;
            let settings = settings_for(&config, &records, None).await?;

            let session = Session::start(&config, &records, settings, cli.json).await?;
            session
                .manager
                .handle_op(Op::RequestDebug { code: Some(code) })
                .await?;
            session.finish(Until::RunEnds).await?;
        }
        Commands::Rate { score } => {
            records.score_last_interaction(score).await?;
            println!("{} last interaction rated {score}/10", "✔".green());
        }
        Commands::Prompts => {
            let config = load_config(&cli.root).await?;
            for prompt in &config.prompts {
                let marker = if prompt.default { " (default)" } else { "" };
                println!("{}{marker}  {}", prompt.name.bold(), prompt.description);
            }
            for name in records.system_prompts().await?.keys() {
                if config.prompt(name).is_none() {
                    println!("{}  {}", name.bold(), "built-in".dimmed());
                }
            }
        }
        Commands::Automations => {
            let config = load_config(&cli.root).await?;
            let stored = records.automations().await?;
            for automation in config.automations.iter().chain(stored.iter()) {
                let looping = if automation.infinite_loop { " (loop)" } else { "" };
                println!(
                    "{}{looping}  {}  [{} prompt(s)]",
                    automation.id.bold(),
                    automation.name,
                    automation.prompts.len()
                );
            }
        }
        Commands::ExportAutomations => {
            println!("{}", records.export_automations().await?);
        }
        Commands::ImportAutomations { file } => {
            let json = tokio::fs::read_to_string(&file)
                .await
                .wrap_err_with(|| format!("failed to read {}", file.display()))?;
            let count = records.import_automations(&json).await?;
            println!("{} imported {count} automation(s)", "✔".green());
        }
        Commands::Models { provider } => {
            let config = load_config(&cli.root).await?;
            let api_key = config.global.provider.as_ref().map(|p| p.api_key.clone());
            for model in catalog::available_models(provider.into(), api_key.as_deref()).await {
                println!("{}  {}  {}", model.id.bold(), model.name, model.description.dimmed());
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build run settings from the config file, falling back to stored choices.
async fn settings_for(
    config: &AppConfig,
    records: &Records,
    system_prompt: Option<&str>,
) -> Result<OrchestratorSettings> {
    let prompt_text = match system_prompt {
        Some(name) => match config.prompt(name) {
            Some(prompt) => prompt.content.clone(),
            None => records
                .system_prompts()
                .await?
                .remove(name)
                .ok_or_else(|| eyre!("system prompt '{name}' not found"))?,
        },
        None => match config.default_prompt() {
            Some(prompt) => prompt.content.clone(),
            None => records.current_system_prompt().await?,
        },
    };

    let mut settings = OrchestratorSettings::from_config(&config.global, Some(prompt_text));
    if settings.model.is_none() {
        settings.model = records.active_model().await?;
    }
    if settings.modules.is_empty() {
        settings.modules = records.active_modules().await?;
    }
    Ok(settings)
}

/// A session manager wired to the configured provider, plus the task printing its events.
struct Session {
    manager: Arc<SessionManager>,
    printer: tokio::task::JoinHandle<()>,
}

/// What a session waits for before exiting.
#[derive(Clone, Copy)]
enum Until {
    RunEnds,
    AutomationEnds,
}

impl Session {
    async fn start(
        config: &AppConfig,
        records: &Records,
        settings: OrchestratorSettings,
        json: bool,
    ) -> Result<Self> {
        let provider = match &config.global.provider {
            Some(provider) => Some(provider.clone()),
            None => records.provider_config().await?,
        };
        let transport = RetryingTransport::new(
            Arc::new(HttpTransport::new(provider, settings.model.clone())),
            RetryPolicy::from(config.global.retry),
        );

        let (events_tx, events_rx) = mpsc::channel(256);
        let printer = tokio::spawn(print_events(events_rx, json));
        let manager = SessionManager::with_records(
            Orchestrator::new(Arc::new(transport)),
            settings,
            events_tx,
            records.clone(),
        );

        Ok(Self {
            manager: Arc::new(manager),
            printer,
        })
    }

    /// Wait for the work to end, interrupting it on Ctrl-C, then flush output.
    async fn finish(self, until: Until) -> Result<()> {
        let interrupt = match until {
            Until::RunEnds => Op::CancelRun,
            Until::AutomationEnds => Op::StopAutomation,
        };
        let on_interrupt = {
            let manager = Arc::clone(&self.manager);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::debug!("Keyboard interrupt");
                    let _ = manager.handle_op(interrupt).await;
                }
            })
        };

        let outcome = match until {
            Until::RunEnds => match self.manager.wait().await {
                Some(run) if run.status == RunStatus::Error => {
                    Err(eyre!("run ended with an error"))
                }
                Some(_) => Ok(()),
                None => Err(eyre!("the run could not start")),
            },
            Until::AutomationEnds => match self.manager.wait_automation().await {
                Some(_) => Ok(()),
                None => Err(eyre!("the automation could not start")),
            },
        };
        on_interrupt.abort();
        let _ = on_interrupt.await;

        // The printer ends once the last sender, owned by the manager, is dropped.
        drop(self.manager);
        self.printer
            .await
            .map_err(|e| eyre!("event printer failed: {e}"))?;

        outcome
    }
}

async fn print_events(events_rx: mpsc::Receiver<Event>, json: bool) {
    let mut events = ReceiverStream::new(events_rx);
    while let Some(event) = events.next().await {
        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "failed to serialize event"),
            }
        } else if let Some(line) = render::format_event(&event) {
            println!("{line}");
        }
    }
}
