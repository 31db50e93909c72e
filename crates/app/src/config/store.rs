//! Store Config

use std::path::PathBuf;

use clap::Args;

/// Where documents are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreBackend {
    /// JSON files in the data directory.
    Local,

    /// Process memory, with push. Nothing survives the process.
    Memory,

    /// `PostgreSQL` with `LISTEN`/`NOTIFY` push.
    Postgres,
}

/// Persistence settings.
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Store backend (local, memory, postgres)
    #[arg(long = "store", env = "GAMEPART_STORE", value_enum, default_value_t = StoreBackend::Local)]
    pub backend: StoreBackend,

    /// Data directory for the local store
    #[arg(long, env = "GAMEPART_DATA_DIR", default_value = ".gamepart")]
    pub data_dir: PathBuf,

    /// `PostgreSQL` connection string, required by the postgres store
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}
