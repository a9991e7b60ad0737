use std::path::PathBuf;

use axum::{ServiceExt, extract::Request};
use clap::{Parser, Subcommand, ValueEnum};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tokio::net::TcpListener;
use tracker::api::{AppState, router};
use tracker::config::{Settings, redact_db_url};
use tracker::import::{self, EmployeeRows, ImportReport, OrderRows, Sheet};

#[derive(Parser)]
#[command(name = "tracker", about = "Production order board API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API (default)
    Serve,
    /// Load a spreadsheet without going through the API
    Import {
        #[arg(long, value_enum)]
        kind: ImportKind,
        /// .xlsx, .xls or .csv file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ImportKind {
    Employees,
    Orders,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init structured logging (respects RUST_LOG; defaults to info)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    tracing::info!(database = %redact_db_url(&settings.database_url), "connecting to database");

    let db = Database::connect(&settings.database_url).await?;
    Migrator::up(&db, None).await?;

    tracing::info!("database initialized");

    match cli.command {
        None | Some(Commands::Serve) => serve(db, settings).await?,
        Some(Commands::Import { kind, file }) => import_file(&db, kind, file).await?,
    }

    Ok(())
}

async fn serve(
    db: DatabaseConnection,
    settings: Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(addr = %settings.bind_addr, "API online");

    let app = router(AppState::new(db, settings));
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;
    Ok(())
}

async fn import_file(
    db: &DatabaseConnection,
    kind: ImportKind,
    file: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let bytes = tokio::fs::read(&file).await?;
    let sheet = Sheet::from_upload(&file_name, &bytes)?;

    let report: ImportReport = match kind {
        ImportKind::Employees => import::run_import(db, &sheet, &EmployeeRows).await?,
        ImportKind::Orders => import::run_import(db, &sheet, &OrderRows).await?,
    };

    for error in &report.errors {
        tracing::warn!(file = %file.display(), "{error}");
    }
    tracing::info!(
        file = %file.display(),
        inserted = report.inserted,
        skipped = report.errors.len(),
        "import complete"
    );
    Ok(())
}
