use clap::{Args, Subcommand};
use gamepart_app::{config::StoreConfig, database};

#[derive(Debug, Args)]
pub(crate) struct DbCommand {
    #[command(subcommand)]
    command: DbSubcommand,
}

#[derive(Debug, Subcommand)]
enum DbSubcommand {
    /// Apply pending migrations
    Migrate,
}

pub(crate) async fn run(command: DbCommand, config: &StoreConfig) -> Result<(), String> {
    match command.command {
        DbSubcommand::Migrate => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| "DATABASE_URL is required".to_string())?;

            let pool = database::connect(url)
                .await
                .map_err(|error| format!("failed to connect to database: {error}"))?;

            database::migrate(&pool)
                .await
                .map_err(|error| format!("failed to migrate: {error}"))?;

            println!("migrations applied");

            Ok(())
        }
    }
}
