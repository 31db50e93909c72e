//! Table rendering for command output.

use gamepart::{
    cart::Cart,
    checkout::{Order, Purchaser},
    parts::Part,
    pricing::format_amount,
};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};

fn render(builder: Builder, amount_columns: &[usize]) -> String {
    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);

    for &column in amount_columns {
        table.modify(Columns::new(column..=column), Alignment::right());
    }

    table.to_string()
}

/// Parts with their prices and availability.
pub(crate) fn price_list(parts: &[Part]) -> String {
    let mut builder = Builder::default();

    builder.push_record(["ID", "Name", "Category", "Subcategory", "Price", "Stock"]);

    for part in parts {
        builder.push_record([
            part.id.to_string(),
            part.name.clone(),
            part.category.clone(),
            part.subcategory.clone(),
            format_amount(part.price),
            if part.in_stock { "yes" } else { "no" }.to_string(),
        ]);
    }

    render(builder, &[4])
}

/// Cart lines followed by the total.
pub(crate) fn cart(cart: &Cart) -> String {
    let mut builder = Builder::default();

    builder.push_record(["ID", "Name", "Unit price", "Qty", "Subtotal"]);

    for item in cart.items() {
        builder.push_record([
            item.part.id.to_string(),
            item.part.name.clone(),
            format_amount(item.part.price),
            item.quantity.to_string(),
            format_amount(item.subtotal()),
        ]);
    }

    builder.push_record([
        String::new(),
        "Total".to_string(),
        String::new(),
        cart.unit_count().to_string(),
        format_amount(cart.total()),
    ]);

    render(builder, &[2, 3, 4])
}

pub(crate) fn orders(orders: &[Order]) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Order", "Placed", "Purchaser", "Lines", "Total"]);

    for order in orders {
        let purchaser = match &order.purchaser {
            Purchaser::Anonymous => "anonymous".to_string(),
            Purchaser::User { uid, email } => email.clone().unwrap_or_else(|| uid.clone()),
        };

        builder.push_record([
            order.id.to_string(),
            order.created_at.to_string(),
            purchaser,
            order.items.len().to_string(),
            format_amount(order.total),
        ]);
    }

    render(builder, &[3, 4])
}
