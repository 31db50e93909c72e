use std::io::{self, BufRead, Write};

use clap::{Args, Parser, Subcommand};
use gamepart_app::{
    auth::Credential,
    config::AppConfig,
    context::AppContext,
    observability::init_logging,
    storefront::{Notice, Storefront, StorefrontError},
};

mod cart;
mod categories;
mod checkout;
mod db;
mod describe;
mod orders;
mod parts;
mod subcategories;
mod table;
mod watch;

#[derive(Debug, Parser)]
#[command(name = "gamepart-app", about = "GamePart Hub CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(flatten)]
    session: SessionArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Credentials used to sign in before running a command.
#[derive(Debug, Args)]
struct SessionArgs {
    /// Username or email to sign in with
    #[arg(long, env = "GAMEPART_USERNAME")]
    username: Option<String>,

    /// Password to sign in with
    #[arg(long, env = "GAMEPART_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Browse and edit parts
    Parts(parts::PartsCommand),

    /// Manage categories
    Categories(categories::CategoriesCommand),

    /// Manage subcategories within a category
    Subcategories(subcategories::SubcategoriesCommand),

    /// Inspect and edit the cart
    Cart(cart::CartCommand),

    /// Place an order for the cart contents
    Checkout(checkout::CheckoutArgs),

    /// Inspect placed orders
    Orders(orders::OrdersCommand),

    /// Generate a part description
    Describe(describe::DescribeArgs),

    /// Print the price list whenever the catalog changes
    Watch(watch::WatchArgs),

    /// Database maintenance
    Db(db::DbCommand),
}

impl Cli {
    /// Parse flags and environment, loading `.env` first.
    pub(crate) fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        init_logging(&self.config.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        let command = match self.command {
            Commands::Db(command) => return db::run(command, &self.config.store).await,
            command => command,
        };

        let context = AppContext::from_config(&self.config)
            .await
            .map_err(|error| format!("failed to start: {error}"))?;

        let storefront = context.storefront();

        self.session.sign_in(&storefront).await?;

        match command {
            Commands::Parts(command) => parts::run(command, &storefront).await,
            Commands::Categories(command) => categories::run(command, &storefront).await,
            Commands::Subcategories(command) => subcategories::run(command, &storefront).await,
            Commands::Cart(command) => cart::run(command, &storefront).await,
            Commands::Checkout(args) => checkout::run(args, &storefront).await,
            Commands::Orders(command) => orders::run(command, &context).await,
            Commands::Describe(args) => describe::run(args, &storefront).await,
            Commands::Watch(args) => watch::run(args, &context).await,
            Commands::Db(_) => Ok(()),
        }
    }
}

impl SessionArgs {
    async fn sign_in(self, storefront: &Storefront) -> Result<(), String> {
        let (Some(username), Some(password)) = (self.username, self.password) else {
            return Ok(());
        };

        storefront
            .sign_in(Credential::new(username, password))
            .await
            .map(|_| ())
            .map_err(report)
    }
}

/// User-facing message for a failed storefront operation.
pub(crate) fn report(error: StorefrontError) -> String {
    Notice::from(&error).to_string()
}

/// Ask a yes/no question on stdin unless `assume_yes` is set.
pub(crate) fn confirm(prompt: &str, assume_yes: bool) -> Result<bool, String> {
    if assume_yes {
        return Ok(true);
    }

    let mut stdout = io::stdout();
    writeln!(stdout, "{prompt}").map_err(|error| error.to_string())?;
    write!(stdout, "[y/N] ").map_err(|error| error.to_string())?;
    stdout.flush().map_err(|error| error.to_string())?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|error| error.to_string())?;

    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
