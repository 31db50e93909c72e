use clap::{Args, Subcommand};
use gamepart::{
    filter::CategoryFilter,
    parts::{PartData, PartId},
};
use gamepart_app::storefront::{Storefront, notices::DELETE_PART_PROMPT};

use crate::cli::{confirm, report, table};

#[derive(Debug, Args)]
pub(crate) struct PartsCommand {
    #[command(subcommand)]
    command: PartsSubcommand,
}

#[derive(Debug, Subcommand)]
enum PartsSubcommand {
    /// Print the price list
    List(ListArgs),

    /// Create a part
    Add(PartFields),

    /// Replace every editable field of a part
    Update(UpdateArgs),

    /// Delete a part
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Only parts in this category
    #[arg(long)]
    category: Option<String>,

    /// Only parts in this subcategory (requires --category)
    #[arg(long, requires = "category")]
    subcategory: Option<String>,

    /// Case-insensitive search over name, description and subcategory
    #[arg(long, default_value = "")]
    search: String,
}

#[derive(Debug, Args)]
pub(crate) struct PartFields {
    #[arg(long)]
    name: String,

    #[arg(long)]
    category: String,

    #[arg(long)]
    subcategory: String,

    /// Price in whole TWD
    #[arg(long)]
    price: u64,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long, default_value = "")]
    image_url: String,

    /// Mark the part as unavailable
    #[arg(long)]
    out_of_stock: bool,
}

impl From<PartFields> for PartData {
    fn from(fields: PartFields) -> Self {
        Self {
            name: fields.name,
            category: fields.category,
            subcategory: fields.subcategory,
            price: fields.price,
            description: fields.description,
            image_url: fields.image_url,
            in_stock: !fields.out_of_stock,
        }
    }
}

#[derive(Debug, Args)]
struct UpdateArgs {
    id: PartId,

    #[command(flatten)]
    fields: PartFields,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    id: PartId,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

pub(crate) async fn run(command: PartsCommand, storefront: &Storefront) -> Result<(), String> {
    match command.command {
        PartsSubcommand::List(args) => {
            storefront
                .select_category(args.category.map_or(CategoryFilter::All, CategoryFilter::Only))
                .await;
            storefront.select_subcategory(args.subcategory).await;
            storefront.set_search(args.search).await;

            println!("{}", table::price_list(&storefront.visible_parts().await));

            Ok(())
        }
        PartsSubcommand::Add(fields) => {
            let change = storefront
                .create_part(fields.into())
                .await
                .map_err(report)?;

            if let Some(part) = change.part() {
                println!("created {}", part.id);
            }

            Ok(())
        }
        PartsSubcommand::Update(args) => {
            storefront
                .update_part(args.id, args.fields.into())
                .await
                .map_err(report)?;

            println!("updated {}", args.id);

            Ok(())
        }
        PartsSubcommand::Delete(args) => {
            if !confirm(DELETE_PART_PROMPT, args.yes)? {
                return Ok(());
            }

            storefront.delete_part(args.id).await.map_err(report)?;

            println!("deleted {}", args.id);

            Ok(())
        }
    }
}
