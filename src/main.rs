mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use fairway::datasource::SlashGolfDataSource;
use fairway::domain::TournamentId;
use fairway::orchestration::{
    ResultsReconciler, RunMode, SyncSettings, TournamentLocks, TournamentSync,
};
use fairway::{api, config::Config, db::init_db, GolfDataSource, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let code = match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

async fn run(command: Command) -> anyhow::Result<i32> {
    let config = Config::from_env().context("Configuration error")?;

    let pool = init_db(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    let repo = Arc::new(Repository::new(pool));
    let locks = TournamentLocks::new();

    match command {
        Command::Serve { port } => {
            serve(repo, config, locks, port).await?;
            Ok(0)
        }
        Command::Sync { mode } => sync(repo, config, locks, mode).await,
        Command::Reconcile { tournament } => reconcile(repo, config, locks, tournament).await,
    }
}

async fn serve(
    repo: Arc<Repository>,
    config: Config,
    locks: TournamentLocks,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let port = port.unwrap_or(config.port);
    let app = api::create_router(api::AppState::new(repo, config, locks));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn sync(
    repo: Arc<Repository>,
    config: Config,
    locks: TournamentLocks,
    mode: RunMode,
) -> anyhow::Result<i32> {
    let api_key = config.require_api_key()?.to_string();
    let datasource = Arc::new(SlashGolfDataSource::new(
        config.slashgolf_api_url.clone(),
        config.slashgolf_api_host.clone(),
        api_key,
    ));
    let reconciler = ResultsReconciler::new(repo.clone(), locks);
    let sync = TournamentSync::new(
        datasource.clone() as Arc<dyn GolfDataSource>,
        repo,
        reconciler,
        SyncSettings::from(&config),
    );

    let report = sync.run(mode, chrono::Utc::now()).await?;
    tracing::info!(calls = datasource.call_count(), "Data source calls this run");
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(if report.errors.is_empty() { 0 } else { 1 })
}

async fn reconcile(
    repo: Arc<Repository>,
    config: Config,
    locks: TournamentLocks,
    tournament: Option<i64>,
) -> anyhow::Result<i32> {
    let reconciler = ResultsReconciler::new(repo, locks);

    match tournament {
        Some(id) => {
            let report = reconciler.reconcile(TournamentId::new(id)).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(0)
        }
        None => {
            let summary = reconciler.reconcile_pending(config.season).await?;
            for report in &summary.reconciled {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            for (id, err) in &summary.failed {
                eprintln!("{}: {}", id, err);
            }
            tracing::info!(
                reconciled = summary.reconciled.len(),
                failed = summary.failed.len(),
                "Pending tournaments reconciled"
            );
            Ok(if summary.failed.is_empty() { 0 } else { 1 })
        }
    }
}
