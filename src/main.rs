//! ClawCore entry point: wire config, workspace, provider and agent, then
//! hand off to the interactive prompt.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossterm::style::Stylize;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use clawcore::agent::{Agent, AgentDeps, FileScanStateStore};
use clawcore::channels::cli::{run_repl, CliCallbacks};
use clawcore::config::{self, Config};
use clawcore::llm::create_llm_provider;
use clawcore::tools::{builtin, ToolRegistry};
use clawcore::workspace::Workspace;

#[derive(Debug, Parser)]
#[command(name = "clawcore", version, about = "Personal AI assistant with a workspace heartbeat")]
struct Cli {
    /// Workspace directory (defaults to ~/Desktop/ClawCore)
    #[arg(long, env = "CLAWCORE_WORKSPACE")]
    workspace: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let workspace_dir = config::resolve_workspace_dir(cli.workspace.as_deref());

    println!(
        "\n{}{}\n",
        "🦐 ClawCore".cyan().bold(),
        " — a core version of OpenClaw".dim()
    );
    println!("{}\n", format!("Workspace: {}", workspace_dir.display()).dim());

    let workspace = Workspace::new(&workspace_dir);
    workspace
        .init()
        .await
        .with_context(|| format!("failed to initialize workspace at {}", workspace_dir.display()))?;

    let mut config = Config::load(&workspace_dir).await;
    if !config.has_api_key() {
        config = prompt_for_llm_setup(config).await?;
    }

    let llm = create_llm_provider(&config.llm).context("failed to create LLM provider")?;

    let mut registry = ToolRegistry::new();
    builtin::register_builtins(&mut registry, &workspace);

    let agent = Agent::new(AgentDeps {
        llm,
        tools: Arc::new(registry),
        workspace: workspace.clone(),
        callbacks: Arc::new(CliCallbacks),
        scan_state: Arc::new(FileScanStateStore::new(workspace.scan_state_path())),
    });

    let heartbeat_interval = config
        .heartbeat
        .enabled
        .then_some(config.heartbeat.interval_minutes);
    agent
        .init(heartbeat_interval)
        .await
        .context("agent initialization failed")?;

    println!("{}", format!("Model: {}", config.llm.model).dim());
    println!();
    println!("{}", "📖 Quick Guide:".cyan());
    println!("{}", "  • Type exit or quit to leave".dim());
    println!("{}", "  • Type \"\"\" to enter multiline mode, \"\"\" again to send".dim());
    println!("{}", "  • Drag a file onto the terminal to copy it into user/".dim());
    println!("{}", "  • Add SKILL.md files under skills/ to extend what the assistant can do".dim());
    println!("{}\n", format!("\n{}", "─".repeat(60)).dim());

    run_repl(agent, workspace).await
}

/// Interactive first-time setup: read the API key (and optional overrides)
/// from the terminal, then persist them to config.json.
async fn prompt_for_llm_setup(mut config: Config) -> anyhow::Result<Config> {
    println!("{}", "⚠️  No API key configured.".yellow());
    println!("{}", "  Set it via environment variable or config file:".dim());
    println!("{}", "  Option 1: export OPENAI_API_KEY=sk-...".dim());
    println!(
        "{}\n",
        format!(
            "  Option 2: edit {}",
            config::config_path(&config.workspace).display()
        )
        .dim()
    );

    let mut editor = rustyline::DefaultEditor::new()?;

    let api_key = editor.readline(&"Enter API key: ".cyan().to_string())?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        anyhow::bail!("no API key provided");
    }
    config.llm.api_key = Some(SecretString::from(api_key.to_string()));

    let base_url =
        editor.readline(&format!("Base URL (default: {}): ", config.llm.base_url).cyan().to_string())?;
    if !base_url.trim().is_empty() {
        config.llm.base_url = base_url.trim().to_string();
    }

    let model = editor.readline(&format!("Model (default: {}): ", config.llm.model).cyan().to_string())?;
    if !model.trim().is_empty() {
        config.llm.model = model.trim().to_string();
    }

    config.save().await.context("failed to save config")?;
    println!("{}", "\n✓ Config saved.\n".green());
    Ok(config)
}
