use buybin_app::{
    config::CartConfig,
    context::AppContext,
    identity::SignedInUser,
    manager::{CartManager, Transition},
    observability,
};
use clap::{Parser, Subcommand};
use tracing::info;
use zeroize::Zeroizing;

mod checkout;
mod items;

#[derive(Debug, Parser)]
#[command(name = "buybin-cart", about = "BuyBin cart CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: CartConfig,

    /// Sign in as this user before running the command
    #[arg(long, requires = "token")]
    user_id: Option<String>,

    /// Bearer token for the signed-in user
    #[arg(long, env = "BUYBIN_ID_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the cart
    Show,

    /// Add a product to the cart
    Add(items::AddArgs),

    /// Change a line's quantity
    Update(items::UpdateArgs),

    /// Remove a line
    Remove(items::RemoveArgs),

    /// Empty the cart
    Clear,

    /// Show the checkout summary
    Summary(checkout::PricingArgs),

    /// Print the order document for the cart as JSON
    Order(checkout::PricingArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init_subscriber(&self.config.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        let context = AppContext::from_config(&self.config)
            .map_err(|error| format!("failed to initialise cart session: {error}"))?;

        let manager = context.spawn_manager();

        if let Some(user_id) = self.user_id {
            let token = Zeroizing::new(self.token.unwrap_or_default());
            sign_in(&manager, SignedInUser::with_token(user_id, token.as_str())).await?;
        }

        manager
            .loaded()
            .await
            .map_err(|error| format!("failed to load cart: {error}"))?;

        let result = match self.command {
            Commands::Show => checkout::show(&manager),
            Commands::Add(args) => items::add(&manager, args).await,
            Commands::Update(args) => items::update(&manager, args).await,
            Commands::Remove(args) => items::remove(&manager, args).await,
            Commands::Clear => items::clear(&manager).await,
            Commands::Summary(args) => checkout::summary(&manager, args).await,
            Commands::Order(args) => checkout::order(&manager, args).await,
        };

        manager
            .flush()
            .await
            .map_err(|error| format!("failed to persist cart: {error}"))?;

        result
    }
}

async fn sign_in(manager: &CartManager, user: SignedInUser) -> Result<(), String> {
    let user_id = user.id().clone();

    let transition = manager
        .on_auth_change(Some(user))
        .await
        .map_err(|error| format!("failed to sign in: {error}"))?;

    match transition {
        Transition::SignedIn => {
            info!(%user_id, "signed in");
            Ok(())
        }
        Transition::CredentialUnavailable => {
            Err(format!("failed to sign in {user_id}: credential unavailable"))
        }
        Transition::RemoteUnavailable => Err(format!(
            "failed to sign in {user_id}: account cart could not be read"
        )),
        Transition::SignedOut => Err(format!("failed to sign in {user_id}")),
    }
}
