use clap::{Args, Subcommand};
use gamepart_app::{context::AppContext, storefront::StorefrontError};

use crate::cli::{report, table};

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// List placed orders, oldest first
    List,
}

pub(crate) async fn run(command: OrdersCommand, context: &AppContext) -> Result<(), String> {
    match command.command {
        OrdersSubcommand::List => {
            let orders = context
                .orders
                .list_orders()
                .await
                .map_err(|error| report(StorefrontError::from(error)))?;

            println!("{}", table::orders(&orders));

            Ok(())
        }
    }
}
