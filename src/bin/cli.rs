//! searchgraph CLI
//!
//! Ask one-off questions, chat interactively, and inspect configuration.

use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use tracing_subscriber::EnvFilter;

use searchgraph::agent::{
    run_with_callback, ChatCompletionsClient, ExecutedCall, LoopCallback, Message, RunContext,
    ToolInvocation, UnregisteredCall,
};
use searchgraph::config::{
    config_path, save_config, validate_config, Config, LogConfig, LogFormat,
};
use searchgraph::core::InMemoryCheckpointStore;
use searchgraph::tools::{TavilySearchTool, ToolRegistry};
use searchgraph::VERSION;

#[derive(Parser)]
#[command(
    name = "searchgraph",
    version = VERSION,
    about = "searchgraph - a web-search agent in your terminal",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// The question
        question: String,
        /// Session id to resume
        #[arg(long, short)]
        session: Option<String>,
    },

    /// Interactive chat mode
    Chat {
        /// Session id to use for the conversation
        #[arg(long, short)]
        session: Option<String>,
    },

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets omitted) and any issues
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file without asking
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    init_tracing(&config.log);

    match cli.command {
        Commands::Ask { question, session } => ask(&config, question, session).await,
        Commands::Chat { session } => chat(&config, session).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => show_config(&config),
            ConfigAction::Path => {
                println!("{}", config_path().display());
                Ok(())
            }
            ConfigAction::Init { force } => init_config(force),
        },
    }
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Build a run context from validated configuration
fn build_context(config: &Config) -> anyhow::Result<RunContext> {
    let validation = validate_config(config);
    for warning in &validation.warnings {
        tracing::warn!("Config: {}", warning);
    }
    if !validation.valid {
        for error in &validation.errors {
            eprintln!("{} {}", style("✗").red(), error);
        }
        bail!("Configuration is incomplete");
    }

    let model = ChatCompletionsClient::new(config.llm.clone())?;
    let tools = ToolRegistry::new().with(TavilySearchTool::new(config.search.clone())?)?;

    Ok(RunContext::from_config(
        &config.agent,
        Arc::new(model),
        Arc::new(tools),
        Arc::new(InMemoryCheckpointStore::new()),
    ))
}

/// Prints search activity as it happens
struct TerminalProgress;

#[async_trait]
impl LoopCallback for TerminalProgress {
    async fn on_tool_invocation(&self, invocation: &ToolInvocation) {
        println!(
            "   {} Searching: {}",
            style("🔍").bold(),
            style(invocation.query().unwrap_or("(no query)")).cyan()
        );
    }

    async fn on_tool_result(&self, call: &ExecutedCall) {
        for url in call.result.urls() {
            println!("      └─ {}", style(url).dim());
        }
    }

    async fn on_unregistered(&self, call: &UnregisteredCall) {
        println!(
            "   {} Model asked for unavailable tool '{}'",
            style("⚠").yellow(),
            call.name
        );
    }
}

async fn ask(config: &Config, question: String, session: Option<String>) -> anyhow::Result<()> {
    let ctx = build_context(config)?;
    let session = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let output = run_with_callback(&ctx, &session, vec![Message::user(question)], &TerminalProgress)
        .await?;

    println!("\n{}", output.answer().unwrap_or_default());
    for call in &output.report.unregistered {
        tracing::warn!("Unanswered tool request: {} ({})", call.name, call.id);
    }
    Ok(())
}

async fn chat(config: &Config, session: Option<String>) -> anyhow::Result<()> {
    let ctx = build_context(config)?;
    let session = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let theme = ColorfulTheme::default();

    println!("\n{}", style("searchgraph chat").cyan().bold());
    println!(
        "{}",
        style(format!("  Session {} · type 'exit' to quit", session)).dim()
    );

    loop {
        let input: String = Input::with_theme(&theme)
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;
        let input = input.trim();

        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit") {
            println!("{} Goodbye!\n", style("👋").bold());
            break;
        }

        match run_with_callback(&ctx, &session, vec![Message::user(input)], &TerminalProgress).await {
            Ok(output) => {
                println!(
                    "\n{} {}\n",
                    style("Assistant:").green().bold(),
                    output.answer().unwrap_or_default()
                );
            }
            Err(e) => eprintln!("{} {}\n", style("Error:").red().bold(), e),
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> anyhow::Result<()> {
    println!("{}", style(format!("# {}", config_path().display())).dim());
    println!("{}", serde_json::to_string_pretty(config)?);

    let validation = validate_config(config);
    for error in &validation.errors {
        println!("{} {}", style("✗").red(), error);
    }
    for warning in &validation.warnings {
        println!("{} {}", style("⚠").yellow(), warning);
    }
    if validation.valid {
        println!("{} Configuration is valid", style("✓").green());
    }
    Ok(())
}

fn init_config(force: bool) -> anyhow::Result<()> {
    let path = config_path();

    if path.exists() && !force {
        let overwrite = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{} exists. Overwrite?", path.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("   {} Cancelled.", style("ℹ").blue());
            return Ok(());
        }
    }

    save_config(&Config::default(), &path)?;
    println!("{} Wrote {}", style("✓").green(), path.display());
    println!(
        "   {}",
        style("API keys are read from GROQ_API_KEY and TAVILY_API_KEY").dim()
    );
    Ok(())
}
