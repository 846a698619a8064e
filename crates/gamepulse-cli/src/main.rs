mod logging;
mod output;
mod run;
mod series;

use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use gamepulse_core::{AppConfig, DateWindow};
use gamepulse_db::{MetricStore, PoolConfig};

#[derive(Debug, Parser)]
#[command(name = "gamepulse")]
#[command(about = "Track a game's Steam popularity against Reddit mentions")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Record today's metric, refresh the window's mentions and write the outputs
    Run(RunArgs),
    /// Print the stored series and growth without fetching anything
    Series {
        /// Window length in days, ending today
        #[arg(long)]
        days: Option<u32>,

        /// Steam app id whose metric stream to read
        #[arg(long)]
        app_id: Option<String>,

        /// Path of the SQLite store
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Store maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Window length in days, ending today
    #[arg(long)]
    days: Option<u32>,

    /// Steam app id to sample
    #[arg(long)]
    app_id: Option<String>,

    /// Path of the SQLite store
    #[arg(long)]
    db: Option<PathBuf>,

    /// Where to write the series CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Where to write the SVG chart
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Print the window and sources without touching the network or store
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check that the store can be opened and queried
    Ping,
}

impl RunArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(days) = self.days {
            config.days = days;
        }
        if let Some(app_id) = &self.app_id {
            config.steam_app_id.clone_from(app_id);
        }
        if let Some(db) = &self.db {
            config.database_path.clone_from(db);
        }
        if let Some(csv) = &self.csv {
            config.output_csv.clone_from(csv);
        }
        if let Some(chart) = &self.chart {
            config.chart_path.clone_from(chart);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = gamepulse_core::load_app_config()?;

    match &cli.command {
        Some(Commands::Run(args)) => args.apply(&mut config),
        Some(Commands::Series { days, app_id, db }) => {
            if let Some(days) = days {
                config.days = *days;
            }
            if let Some(app_id) = app_id {
                config.steam_app_id.clone_from(app_id);
            }
            if let Some(db) = db {
                config.database_path.clone_from(db);
            }
        }
        Some(Commands::Db { .. }) | None => {}
    }

    logging::init_tracing(&config)?;
    tracing::debug!(?config, "loaded configuration");

    let today = Utc::now().date_naive();
    match cli.command {
        Some(Commands::Run(args)) if args.dry_run => print_dry_run(&config, today),
        Some(Commands::Run(_)) => run_command(&config, today).await,
        Some(Commands::Series { .. }) => {
            let store = open_store(&config).await?;
            let stream = run::metric_stream(&config.steam_app_id);
            let result = series::run_series(&store, &stream, config.days, today).await;
            store.close().await;
            result
        }
        Some(Commands::Db { command }) => db_command(&config, &command).await,
        None => {
            println!("gamepulse: nothing to do; try `gamepulse run` or `gamepulse --help`");
            Ok(())
        }
    }
}

async fn open_store(config: &AppConfig) -> anyhow::Result<MetricStore> {
    MetricStore::open(&config.database_path, PoolConfig::default())
        .await
        .with_context(|| format!("opening store {}", config.database_path.display()))
}

async fn run_command(config: &AppConfig, today: NaiveDate) -> anyhow::Result<()> {
    tracing::info!(env = %config.env, app_id = %config.steam_app_id, "gamepulse run starting");

    let metric = run::build_metric_chain(config)?;
    let mentions = run::build_mention_collector(config)?;
    let store = open_store(config).await?;
    let settings = run::RunSettings::from_config(config);

    let result = run::run_pipeline(&store, &metric, &mentions, &settings, today).await;
    store.close().await;
    let report = result?;

    println!(
        "{} {}: {} rows, metric source {}",
        config.game_name,
        report.window,
        report.rows.len(),
        report.metric_source
    );
    match &report.growth {
        Some(growth) => println!("growth: {growth}"),
        None => println!("growth: no metric observations in window"),
    }
    if report.outputs_failed > 0 {
        println!("{} output(s) failed; see log", report.outputs_failed);
    }
    tracing::info!(outputs_failed = report.outputs_failed, "gamepulse run finished");
    Ok(())
}

fn print_dry_run(config: &AppConfig, today: NaiveDate) -> anyhow::Result<()> {
    let window = DateWindow::ending_at(today, config.days)?;
    let metric = run::build_metric_chain(config)?;
    let tiers: Vec<&str> = metric.labels().collect();
    let mentions = run::build_mention_collector(config)?;
    let fallback = if mentions.has_secondary() {
        "reddit"
    } else {
        "none"
    };

    println!("dry-run: window {window} ({} days)", window.len());
    println!("dry-run: store {}", config.database_path.display());
    println!("dry-run: metric tiers [{}]", tiers.join(", "));
    println!(
        "dry-run: mentions via pushshift (fallback: {fallback}) for [{}] as '{}'",
        mentions.categories().join(", "),
        config.mention_category
    );
    println!(
        "dry-run: outputs {} and {}",
        config.output_csv.display(),
        config.chart_path.display()
    );
    Ok(())
}

async fn db_command(config: &AppConfig, command: &DbCommands) -> anyhow::Result<()> {
    let pool = gamepulse_db::connect_pool(&config.database_path, PoolConfig::default())
        .await
        .with_context(|| format!("opening store {}", config.database_path.display()))?;

    let result = match command {
        DbCommands::Migrate => gamepulse_db::run_migrations(&pool)
            .await
            .map(|applied| println!("applied {applied} migration(s)"))
            .map_err(anyhow::Error::from),
        DbCommands::Ping => gamepulse_db::ping(&pool)
            .await
            .map(|()| println!("store ok: {}", config.database_path.display()))
            .map_err(anyhow::Error::from),
    };
    pool.close().await;
    result
}
