//! Inserts the default customers, workshops, machines, design presets and
//! admin account. Safe to run repeatedly.
//!
//! Run with: cargo run --bin seed-data -- --database-url sqlite://powerloom.db?mode=rwc

use clap::Parser;
use tracing::info;

use powerloom_api::db::{establish_connection_with_config, run_migrations, DbConfig};
use powerloom_api::services::seed::{ensure_admin, seed_defaults};

#[derive(Parser)]
#[command(name = "seed-data", about = "Seed the powerloom database", version)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://powerloom.db?mode=rwc")]
    database_url: String,

    /// Apply migrations before seeding
    #[arg(long)]
    migrate: bool,

    /// Create an extra admin account with this username
    #[arg(long, requires = "admin_password")]
    admin_username: Option<String>,

    #[arg(long)]
    admin_password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let db = establish_connection_with_config(&DbConfig::for_tool(cli.database_url.clone()))
    .await?;

    if cli.migrate {
        run_migrations(&db).await?;
    }

    let report = seed_defaults(&db, true).await?;
    info!(
        customers = report.customers,
        workshops = report.workshops,
        machines = report.machines,
        design_presets = report.design_presets,
        admin_created = report.admin_created,
        "seed finished"
    );

    if let (Some(username), Some(password)) = (cli.admin_username, cli.admin_password) {
        if password.chars().count() < powerloom_api::services::admin::MIN_PASSWORD_LEN {
            anyhow::bail!("admin password is too short");
        }
        let created = ensure_admin(&db, &username, &password, None).await?;
        info!(%username, created, "extra admin account");
    }

    Ok(())
}
