use clap::{Args, Subcommand};
use gamepart_app::storefront::{Storefront, notices::delete_subcategory_prompt};

use crate::cli::{confirm, report};

#[derive(Debug, Args)]
pub(crate) struct SubcategoriesCommand {
    #[command(subcommand)]
    command: SubcategoriesSubcommand,
}

#[derive(Debug, Subcommand)]
enum SubcategoriesSubcommand {
    /// List the subcategories of a category
    List { category: String },

    /// Rename a subcategory; an existing name is merged into
    Rename {
        category: String,
        from: String,
        to: String,
    },

    /// Delete every part in a subcategory
    Delete {
        category: String,
        subcategory: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub(crate) async fn run(
    command: SubcategoriesCommand,
    storefront: &Storefront,
) -> Result<(), String> {
    match command.command {
        SubcategoriesSubcommand::List { category } => {
            let catalog = storefront.catalog().await;

            for subcategory in catalog.subcategories(&category) {
                println!(
                    "{subcategory} ({})",
                    catalog.subcategory_part_count(&category, subcategory)
                );
            }

            Ok(())
        }
        SubcategoriesSubcommand::Rename { category, from, to } => {
            let change = storefront
                .rename_subcategory(category, from, to)
                .await
                .map_err(report)?;

            println!("moved {} parts", change.upserted_parts.len());

            Ok(())
        }
        SubcategoriesSubcommand::Delete {
            category,
            subcategory,
            yes,
        } => {
            let count = storefront
                .catalog()
                .await
                .subcategory_part_count(&category, &subcategory);

            if !confirm(&delete_subcategory_prompt(&category, &subcategory, count), yes)? {
                return Ok(());
            }

            let change = storefront
                .delete_subcategory(category, subcategory)
                .await
                .map_err(report)?;

            println!("deleted {} parts", change.removed_parts.len());

            Ok(())
        }
    }
}
