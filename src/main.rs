mod app;
mod auth;
mod config;
mod db;
mod error;
mod export;
mod filters;
mod finance;
mod logging;
mod models;
mod sync;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, Utc};
use clap::{ArgAction, Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{error, info};
use tui::{backend::CrosstermBackend, Terminal};

use crate::app::{AppState, Settings, run_app};
use crate::auth::SupabaseAuth;
use crate::config::Config;
use crate::db::{Database, RecordStore};
use crate::export::{InvoiceDocument, InvoiceExporter};
use crate::filters::{ProjectFilters, StatusFilter, UPCOMING_LIMIT, display_deadline};
use crate::finance::format_money;
use crate::models::{PaymentStatus, WorkStatus};

#[derive(Parser)]
#[command(name = "studio-dashboard", version, about = "Admin dashboard for a media studio")]
struct Cli {
    /// More log detail (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Apply database migrations before running the command
    #[arg(long, global = true)]
    migrate: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive terminal dashboard (default)
    Dashboard,
    /// Print studio totals and the per-client rollup
    Summary,
    /// List one client's projects
    Projects {
        #[arg(long)]
        client: i64,
        /// all, not_started, editing, review, delivered or archived
        #[arg(long, default_value = "all")]
        work: StatusFilter<WorkStatus>,
        /// all, unpaid, partial or paid
        #[arg(long, default_value = "all")]
        payment: StatusFilter<PaymentStatus>,
    },
    /// Write a client's invoice document
    Export {
        #[arg(long)]
        client: i64,
        /// Output directory, defaults to EXPORT_DIR
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::init()?;
    logging::init_logging(&config.log_file, cli.verbose);
    info!(studio = %config.studio_name, "starting");

    // Initialize database connection
    let db = db::init(&config).await?;
    if cli.migrate {
        db.migrate().await?;
    }

    match cli.command.unwrap_or(Command::Dashboard) {
        Command::Dashboard => run_dashboard(&config, db).await,
        Command::Summary => print_summary(&config, &db).await,
        Command::Projects {
            client,
            work,
            payment,
        } => print_projects(&config, &db, client, ProjectFilters::new(work, payment)).await,
        Command::Export { client, out } => export_client(&config, &db, client, out).await,
    }
}

async fn run_dashboard(config: &Config, db: Database) -> Result<()> {
    let auth = SupabaseAuth::from_config(config)?;
    let mut app_state = AppState::new(Arc::new(db), Arc::new(auth), Settings::from_config(config));

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the main app loop
    let result = run_app(&mut terminal, &mut app_state).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Show any error message
    if let Err(err) = &result {
        error!("dashboard stopped: {:#}", err);
        println!("Error: {}", err);
    }

    println!("Thanks for using {}!", config.studio_name);

    result
}

async fn print_summary(config: &Config, db: &Database) -> Result<()> {
    let (clients, projects) = tokio::try_join!(db.list_clients(), db.list_projects())?;
    let stats = finance::client_stats(&projects);
    let totals = finance::studio_totals(&stats);
    let money = |value: f64| format_money(&config.currency_symbol, value);

    println!("{}", config.studio_name);
    println!(
        "Total budget: {}   Received: {}   Pending: {}",
        money(totals.total),
        money(totals.received),
        money(totals.pending)
    );
    println!("{} clients, {} projects", clients.len(), projects.len());
    println!();

    for client in &clients {
        let s = stats.get(&client.id).copied().unwrap_or_default();
        println!(
            "{:<32} {:>3} projects  total {:>10}  rec {:>10}  pend {:>10}",
            client.name,
            s.projects,
            money(s.total),
            money(s.received),
            money(s.pending)
        );
    }

    Ok(())
}

async fn print_projects(
    config: &Config,
    db: &Database,
    client_id: i64,
    project_filters: ProjectFilters,
) -> Result<()> {
    let (client, projects) = tokio::try_join!(
        db.get_client(client_id),
        db.list_client_projects(client_id)
    )?;
    let money = |value: f64| format_money(&config.currency_symbol, value);

    println!("{} ({})", client.name, client.contact_line());
    println!(
        "Work: {}   Payment: {}",
        project_filters.work, project_filters.payment
    );

    for project in filters::filter_projects(&projects, &project_filters) {
        let a = finance::amounts(project);
        println!(
            "{:<28} due {:<10}  budget {:>9}  rec {:>9}  pend {:>9}  {} / {}",
            project.name,
            display_deadline(project.deadline.as_deref()),
            money(a.cost),
            money(a.received),
            money(a.pending),
            project.work_status.map(|s| s.label()).unwrap_or_else(|| "-".to_string()),
            project.payment_status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
        );
    }

    let upcoming = filters::upcoming_deadlines(&projects, Utc::now(), UPCOMING_LIMIT);
    if !upcoming.is_empty() {
        println!();
        println!("Upcoming deadlines:");
        for project in upcoming {
            println!("  {}  {}", display_deadline(project.deadline.as_deref()), project.name);
        }
    }

    Ok(())
}

async fn export_client(
    config: &Config,
    db: &Database,
    client_id: i64,
    out: Option<PathBuf>,
) -> Result<()> {
    let (client, projects) = tokio::try_join!(
        db.get_client(client_id),
        db.list_client_projects(client_id)
    )?;

    let exporter = InvoiceExporter::new(out.unwrap_or_else(|| PathBuf::from(&config.export_dir)))?;
    let exported = exporter.export(&InvoiceDocument {
        studio_name: &config.studio_name,
        currency_symbol: &config.currency_symbol,
        generated_at: Local::now(),
        client: &client,
        projects: &projects,
    })?;

    println!("Markdown: {}", exported.markdown_path.display());
    match &exported.pdf_path {
        Some(pdf) => println!("PDF: {}", pdf.display()),
        None => println!("No PDF written: pandoc is unavailable or failed"),
    }

    Ok(())
}
