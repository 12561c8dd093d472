use analytics::{GroupSummary, build_team_metrics, select_group};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::{Config, Secrets, init_tracing, load_config, load_config_from};
use core_types::month_start;
use database::{DbRepository, connect, run_migrations};
use std::net::SocketAddr;
use std::path::PathBuf;

/// The main entry point for the adboard metrics backend.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets and DATABASE_URL usually live in .env; a missing file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let _log_guard = init_tracing(&config.log)?;
    let secrets = Secrets::from_env();
    tracing::debug!(?secrets, "Loaded configuration.");

    match cli.command {
        Commands::Serve(args) => {
            if let Some(addr) = args.addr {
                config.server.addr = addr;
            }
            web_server::run_server(config, secrets).await?;
        }
        Commands::Sync => handle_sync(&config, &secrets).await?,
        Commands::Teams(args) => handle_teams(args, &config).await?,
    }
    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Backend for the ad campaign metrics dashboard.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file (default: ./config.toml, optional).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Pull the spreadsheet into the database once and exit.
    Sync,
    /// Print per-team totals for a date range.
    Teams(TeamsArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Listen address, overriding `server.addr` (e.g. "127.0.0.1:8080").
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[derive(Parser)]
struct TeamsArgs {
    /// First day, inclusive (format: YYYY-MM-DD). Defaults to the start of this month.
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day, inclusive (format: YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Only show the teams of this configured group.
    #[arg(long)]
    group: Option<String>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn open_repository(config: &Config) -> anyhow::Result<DbRepository> {
    let db_pool = connect(&config.database).await?;
    run_migrations(&db_pool).await?;
    Ok(DbRepository::new(db_pool))
}

/// Runs one spreadsheet sync and reports the outcome.
async fn handle_sync(config: &Config, secrets: &Secrets) -> anyhow::Result<()> {
    let db_repo = open_repository(config).await?;
    let report = sheet_sync::sync_from_config(&config.sync, secrets, &db_repo).await?;
    println!(
        "{} (fetched {}, upserted {})",
        report.message, report.rows_fetched, report.rows_upserted
    );
    Ok(())
}

/// Prints the team metrics table for a date range.
async fn handle_teams(args: TeamsArgs, config: &Config) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let to = args.to.unwrap_or(today);
    let from = args.from.unwrap_or_else(|| month_start(to));
    anyhow::ensure!(from <= to, "--from {} is after --to {}", from, to);

    let db_repo = open_repository(config).await?;
    let rows = db_repo.get_daily_metrics_between(from, to).await?;
    let mut teams = build_team_metrics(&rows);
    if let Some(group) = &args.group {
        let members = config
            .team_groups
            .get(group)
            .ok_or_else(|| anyhow::anyhow!("unknown team group '{}'", group))?;
        teams = select_group(&teams, members);
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Team",
        "Inquiries",
        "Planned",
        "Spend",
        "Planned spend",
        "Deposits",
        "CPM",
        "Cost/deposit",
        "Cover",
    ]);
    for team in &teams {
        table.add_row(vec![
            team.team_name.clone(),
            team.total_inquiries.to_string(),
            team.planned_inquiries.to_string(),
            team.actual_spend.round_dp(2).to_string(),
            team.planned_daily_spend.round_dp(2).to_string(),
            team.deposits_count.to_string(),
            team.cpm_cost_per_inquiry.round_dp(2).to_string(),
            team.cost_per_deposit.round_dp(2).to_string(),
            team.one_dollar_per_cover.round_dp(2).to_string(),
        ]);
    }

    let summary = GroupSummary::from_teams(&teams);
    println!("Teams from {} to {}", from, to);
    println!("{table}");
    println!(
        "{} teams | inquiries {} of {} ({}%) | spend {} of {} ({}%)",
        summary.team_count,
        summary.total_inquiries,
        summary.total_planned_inquiries,
        summary.inquiries.percentage.round_dp(1),
        summary.total_spend.round_dp(2),
        summary.total_planned_spend.round_dp(2),
        summary.spend.percentage.round_dp(1),
    );
    Ok(())
}
