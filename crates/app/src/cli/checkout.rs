use std::io::{self, Write};

use buybin::{pricing::ShippingOption, summary::CartSummary};
use buybin_app::manager::CartManager;
use clap::Args;
use rusty_money::iso;

#[derive(Debug, Args)]
pub(crate) struct PricingArgs {
    /// Promotion code to apply
    #[arg(long)]
    promo_code: Option<String>,

    /// Shipping option (standard, express, free)
    #[arg(long, default_value = "standard")]
    shipping: ShippingOption,
}

async fn apply_pricing(manager: &CartManager, args: &PricingArgs) -> Result<(), String> {
    if let Some(code) = &args.promo_code {
        manager
            .apply_promo_code(code)
            .await
            .map_err(|error| format!("failed to apply promotion code: {error}"))?;
    }

    manager
        .set_shipping(args.shipping)
        .await
        .map_err(|error| format!("failed to select shipping: {error}"))
}

pub(crate) fn show(manager: &CartManager) -> Result<(), String> {
    let state = manager.state();

    CartSummary::new(state.cart(), state.policy())
        .write_to(io::stdout().lock(), state.cart(), iso::GBP)
        .map_err(|error| format!("failed to write cart: {error}"))
}

pub(crate) async fn summary(manager: &CartManager, args: PricingArgs) -> Result<(), String> {
    apply_pricing(manager, &args).await?;

    show(manager)
}

pub(crate) async fn order(manager: &CartManager, args: PricingArgs) -> Result<(), String> {
    apply_pricing(manager, &args).await?;

    let draft = manager
        .order_draft()
        .map_err(|error| format!("failed to draft order: {error}"))?;

    let json = serde_json::to_string_pretty(&draft)
        .map_err(|error| format!("failed to encode order: {error}"))?;

    writeln!(io::stdout().lock(), "{json}")
        .map_err(|error| format!("failed to write order: {error}"))
}
