//! Applies or inspects the schema migrations.
//!
//! The database URL comes from `--database-url` or `DATABASE_URL`.

use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use powerloom_api::db::{establish_connection_with_config, DbConfig};
use powerloom_api::migrator::Migrator;

#[derive(Parser)]
#[command(name = "migration", about = "Powerloom schema migrations", version)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://powerloom.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply all pending migrations (default)
    Up,
    /// Roll back the last `steps` migrations
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Show applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let db = establish_connection_with_config(&DbConfig::for_tool(cli.database_url))
    .await?;

    match cli.command.unwrap_or(Command::Up) {
        Command::Up => {
            Migrator::up(&db, None).await?;
            info!("migrations applied");
        }
        Command::Down { steps } => {
            Migrator::down(&db, Some(steps)).await?;
            info!(steps, "migrations rolled back");
        }
        Command::Status => Migrator::status(&db).await?,
    }

    Ok(())
}
