//! jirasync - Reactive Jira sync engine
//!
//! Main entry point for the jirasync CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use jirasync::config::{validate_config, JiraSyncConfig};
use jirasync::integrations::{JiraAdapter, JiraGateway};
use jirasync::model::{IssueCache, IssueType, Task, TaskState};
use jirasync::storage::{IssuePersistence, JsonFilePersistence};
use jirasync::store::MemoryStore;
use jirasync::sync::{
    import_new_issues, persist_issue_state, Collaborators, EngineConfig, EventBus, SyncEngine,
};
use jirasync::ui::{LogNotifier, TerminalPrompter};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

/// jirasync - keep local tasks in sync with Jira
#[derive(Parser, Debug)]
#[command(name = "jirasync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/jirasync/config.yaml)
    #[arg(short, long, env = "JIRASYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Show info-level logs and notifications
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the sync engine until interrupted
    Run {
        /// Poll interval in seconds
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Write Prometheus metrics to this file on shutdown
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },

    /// Import new issues into the backlog once
    Import,

    /// Validate the configuration file
    Validate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = jirasync::logging::init(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match cli.config {
        Some(ref path) => JiraSyncConfig::load(path),
        None => JiraSyncConfig::load_default(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Commands::Validate => validate(&config),
        Commands::Import => import(config).await,
        Commands::Run {
            poll_interval,
            metrics_file,
        } => {
            let mut engine_config = EngineConfig::default();
            if let Some(secs) = poll_interval {
                engine_config = engine_config.with_poll_interval(Duration::from_secs(secs));
            }
            run_engine(config, engine_config).await?;
            if let Some(path) = metrics_file {
                std::fs::write(&path, jirasync::sync::metrics::encode_metrics())
                    .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
            }
            Ok(())
        }
    }
}

fn validate(config: &JiraSyncConfig) -> anyhow::Result<()> {
    match validate_config(config) {
        Ok(()) => {
            println!("Configuration is valid");
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                println!("  ✗ {}", error);
            }
            anyhow::bail!("{} configuration problem(s) found", errors.len())
        }
    }
}

/// One linked task per cached issue
fn tasks_from_cache(issues: &IssueCache) -> TaskState {
    TaskState::from_tasks(issues.ids.iter().filter_map(|id| issues.get(id)).map(|issue| {
        Task::new(format!("jira-{}", issue.id), issue.task_title())
            .with_issue(IssueType::Jira, issue.id.clone())
    }))
}

struct Wiring {
    bus: EventBus,
    store: Arc<MemoryStore>,
    persistence: Arc<JsonFilePersistence>,
    collab: Collaborators,
}

fn wire(config: &JiraSyncConfig, engine_config: &EngineConfig) -> anyhow::Result<Wiring> {
    let bus = engine_config.event_bus();
    let store = Arc::new(MemoryStore::new(bus.clone()));
    let notifier = Arc::new(LogNotifier);
    let adapter = Arc::new(JiraAdapter::new(&config.jira).context("Failed to create Jira client")?);
    let gateway = JiraGateway::new(adapter.clone(), store.clone(), notifier.clone())
        .with_import_jql(config.integration.auto_add_backlog_jql_query.clone());
    let persistence = Arc::new(JsonFilePersistence::new(&config.data_dir));

    let collab = Collaborators {
        state: store.clone(),
        tasks: store.clone(),
        gateway: Arc::new(gateway),
        persistence: persistence.clone(),
        prompter: Arc::new(TerminalPrompter::new(adapter)),
        notifier,
    };
    Ok(Wiring {
        bus,
        store,
        persistence,
        collab,
    })
}

async fn load_project(config: &JiraSyncConfig, wiring: &Wiring) -> anyhow::Result<String> {
    let project_id = config
        .project_id
        .clone()
        .context("No projectId configured")?;
    let issues = wiring
        .persistence
        .load_issues_for_project(&project_id, IssueType::Jira)
        .await?;
    let tasks = tasks_from_cache(&issues);
    wiring
        .store
        .load_project(project_id.clone(), config.integration.clone(), issues, tasks);
    Ok(project_id)
}

async fn import(config: JiraSyncConfig) -> anyhow::Result<()> {
    jirasync::config::validate_config_result(&config)?;
    let wiring = wire(&config, &EngineConfig::default())?;
    let project_id = load_project(&config, &wiring).await?;

    let summary = import_new_issues(&wiring.collab).await?;
    persist_issue_state(&wiring.collab).await?;

    if summary.imported.is_empty() {
        println!("No new issues to import for {}", project_id);
    }
    for issue in &summary.imported {
        println!("  + {}", issue.task_title());
    }
    Ok(())
}

async fn run_engine(config: JiraSyncConfig, engine_config: EngineConfig) -> anyhow::Result<()> {
    jirasync::config::validate_config_result(&config)?;
    let wiring = wire(&config, &engine_config)?;

    let mut engine = SyncEngine::new(engine_config, wiring.collab.clone(), wiring.bus.clone());
    engine.start();
    let project_id = load_project(&config, &wiring).await?;
    tracing::info!(project_id = %project_id, "Sync engine running");

    engine.run().await?;
    Ok(())
}
