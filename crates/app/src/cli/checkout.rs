use clap::Args;
use gamepart::pricing::format_amount;
use gamepart_app::storefront::{Storefront, notices::ORDER_PLACED};

use crate::cli::{confirm, report, table};

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Place the order without asking
    #[arg(short, long)]
    yes: bool,
}

pub(crate) async fn run(args: CheckoutArgs, storefront: &Storefront) -> Result<(), String> {
    storefront.open_cart().await.map_err(report)?;

    let cart = storefront.cart().await;
    println!("{}", table::cart(&cart));

    if let Err(error) = storefront.proceed_to_checkout().await {
        storefront.cancel_checkout().await.map_err(report)?;

        return Err(report(error));
    }

    if !confirm(&format!("Place order for {}?", format_amount(cart.total())), args.yes)? {
        storefront.cancel_checkout().await.map_err(report)?;

        return Ok(());
    }

    let order = storefront.confirm_checkout().await.map_err(report)?;

    println!("{ORDER_PLACED}");
    println!("order: {}", order.id);

    Ok(())
}
