use std::num::NonZeroU32;

use buybin::products::Product;
use buybin_app::manager::CartManager;
use clap::Args;
use rust_decimal::Decimal;
use tracing::warn;

use super::checkout;

#[derive(Debug, Args)]
pub(crate) struct AddArgs {
    /// Product identifier
    #[arg(long)]
    id: String,

    /// Current selling price
    #[arg(long)]
    price: Decimal,

    /// Price before any markdown
    #[arg(long)]
    original_price: Option<Decimal>,

    /// Markdown percentage shown on the product card
    #[arg(long, default_value_t = 0)]
    discount_percent: u8,

    /// Display title
    #[arg(long)]
    title: Option<String>,

    /// Image URL
    #[arg(long)]
    image: Option<String>,

    /// Category name
    #[arg(long)]
    category: Option<String>,

    /// Number of units to add
    #[arg(long, default_value = "1")]
    quantity: NonZeroU32,
}

impl AddArgs {
    fn into_product(self) -> Product {
        let mut product =
            Product::new(self.id, self.price).with_discount_percent(self.discount_percent);

        if let Some(original_price) = self.original_price {
            product = product.with_original_price(original_price);
        }

        if let Some(title) = self.title {
            product = product.with_title(title);
        }

        if let Some(image) = self.image {
            product = product.with_image(image);
        }

        if let Some(category) = self.category {
            product = product.with_category(category);
        }

        product
    }
}

#[derive(Debug, Args)]
pub(crate) struct UpdateArgs {
    /// Product identifier
    #[arg(long)]
    id: String,

    /// New quantity; values below one are ignored
    #[arg(long)]
    quantity: u32,
}

#[derive(Debug, Args)]
pub(crate) struct RemoveArgs {
    /// Product identifier
    #[arg(long)]
    id: String,
}

pub(crate) async fn add(manager: &CartManager, args: AddArgs) -> Result<(), String> {
    let quantity = args.quantity;

    manager
        .add_to_cart(args.into_product(), quantity)
        .await
        .map_err(|error| format!("failed to add product: {error}"))?;

    checkout::show(manager)
}

pub(crate) async fn update(manager: &CartManager, args: UpdateArgs) -> Result<(), String> {
    let updated = manager
        .update_quantity(args.id.as_str(), args.quantity)
        .await
        .map_err(|error| format!("failed to update quantity: {error}"))?;

    if !updated {
        warn!(product_id = %args.id, quantity = args.quantity, "cart unchanged");
    }

    checkout::show(manager)
}

pub(crate) async fn remove(manager: &CartManager, args: RemoveArgs) -> Result<(), String> {
    let removed = manager
        .remove_item(args.id.as_str())
        .await
        .map_err(|error| format!("failed to remove product: {error}"))?;

    if !removed {
        warn!(product_id = %args.id, "product not in cart");
    }

    checkout::show(manager)
}

pub(crate) async fn clear(manager: &CartManager) -> Result<(), String> {
    manager
        .clear_cart()
        .await
        .map_err(|error| format!("failed to clear cart: {error}"))?;

    checkout::show(manager)
}
