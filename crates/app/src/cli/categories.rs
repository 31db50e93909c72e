use clap::{Args, Subcommand};
use gamepart_app::storefront::{Storefront, notices::delete_category_prompt};

use crate::cli::{confirm, report};

#[derive(Debug, Args)]
pub(crate) struct CategoriesCommand {
    #[command(subcommand)]
    command: CategoriesSubcommand,
}

#[derive(Debug, Subcommand)]
enum CategoriesSubcommand {
    /// List categories with their part counts and subcategories
    List,

    /// Append a category
    Add { name: String },

    /// Rename a category and move its parts
    Rename { from: String, to: String },

    /// Delete a category and every part in it
    Delete {
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub(crate) async fn run(command: CategoriesCommand, storefront: &Storefront) -> Result<(), String> {
    match command.command {
        CategoriesSubcommand::List => {
            let catalog = storefront.catalog().await;

            for category in catalog.categories() {
                let subcategories = catalog.subcategories(category).collect::<Vec<_>>();

                println!(
                    "{category} ({}): {}",
                    catalog.part_count(category),
                    subcategories.join(", ")
                );
            }

            Ok(())
        }
        CategoriesSubcommand::Add { name } => {
            storefront.add_category(name).await.map_err(report)?;

            Ok(())
        }
        CategoriesSubcommand::Rename { from, to } => {
            let change = storefront
                .rename_category(from, to)
                .await
                .map_err(report)?;

            println!("moved {} parts", change.upserted_parts.len());

            Ok(())
        }
        CategoriesSubcommand::Delete { name, yes } => {
            let count = storefront.catalog().await.part_count(&name);

            if !confirm(&delete_category_prompt(&name, count), yes)? {
                return Ok(());
            }

            let change = storefront.delete_category(name).await.map_err(report)?;

            println!("deleted {} parts", change.removed_parts.len());

            Ok(())
        }
    }
}
