use clap::{Args, Subcommand};
use gamepart::parts::PartId;
use gamepart_app::storefront::Storefront;

use crate::cli::{report, table};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Print the cart
    Show,

    /// Add one unit of a part
    Add { id: PartId },

    /// Change a line's quantity by DELTA; never drops below one
    Quantity {
        id: PartId,

        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },

    /// Remove a line
    Remove { id: PartId },

    /// Empty the cart
    Clear,
}

pub(crate) async fn run(command: CartCommand, storefront: &Storefront) -> Result<(), String> {
    match command.command {
        CartSubcommand::Show => {}
        CartSubcommand::Add { id } => {
            if !storefront.add_to_cart(id).await.map_err(report)? {
                println!("{id} is out of stock");
            }
        }
        CartSubcommand::Quantity { id, delta } => {
            if !storefront.update_quantity(id, delta).await {
                println!("{id} is not in the cart");
            }
        }
        CartSubcommand::Remove { id } => {
            if !storefront.remove_from_cart(id).await {
                println!("{id} is not in the cart");
            }
        }
        CartSubcommand::Clear => storefront.clear_cart().await,
    }

    println!("{}", table::cart(&storefront.cart().await));

    Ok(())
}
