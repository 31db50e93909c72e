use clap::Args;
use gamepart::parts::{PartData, PartId};
use gamepart_app::{descriptions::DescriptionRequest, storefront::Storefront};

use crate::cli::report;

#[derive(Debug, Args)]
pub(crate) struct DescribeArgs {
    /// Part name
    #[arg(long)]
    name: String,

    /// Console system
    #[arg(long)]
    category: String,

    #[arg(long)]
    subcategory: Option<String>,

    /// Store the generated text as this part's description
    #[arg(long)]
    save: Option<PartId>,
}

pub(crate) async fn run(args: DescribeArgs, storefront: &Storefront) -> Result<(), String> {
    let text = storefront
        .generate_description(DescriptionRequest::new(
            args.name,
            args.category,
            args.subcategory,
        ))
        .await
        .map_err(report)?;

    println!("{text}");

    let Some(id) = args.save else {
        return Ok(());
    };

    let part = storefront
        .catalog()
        .await
        .part(id)
        .cloned()
        .ok_or_else(|| format!("part not found: {id}"))?;

    storefront
        .update_part(
            id,
            PartData {
                name: part.name,
                category: part.category,
                subcategory: part.subcategory,
                price: part.price,
                description: text,
                image_url: part.image_url,
                in_stock: part.in_stock,
            },
        )
        .await
        .map_err(report)?;

    println!("saved to {id}");

    Ok(())
}
