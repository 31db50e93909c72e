use clap::Args;
use gamepart_app::context::AppContext;
use tracing::info;

use crate::cli::table;

#[derive(Debug, Args)]
pub(crate) struct WatchArgs {
    /// Only show parts in this category
    #[arg(long)]
    category: Option<String>,
}

pub(crate) async fn run(args: WatchArgs, context: &AppContext) -> Result<(), String> {
    if !context.is_listening() {
        return Err("the configured store does not push changes; use --store memory or postgres".to_string());
    }

    let mut revisions = context.catalog.revisions();

    loop {
        let catalog = context.catalog.catalog().await;
        let parts = catalog
            .parts()
            .iter()
            .filter(|part| args.category.as_deref().is_none_or(|name| part.category == name))
            .cloned()
            .collect::<Vec<_>>();

        println!("{}", table::price_list(&parts));

        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    return Ok(());
                }

                info!(revision = *revisions.borrow(), "catalog changed");
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}
