//! Command-line driver for the cart engine against a live Appwrite project.
//!
//! # Usage
//!
//! ```bash
//! APPWRITE_ENDPOINT=https://cloud.appwrite.io/v1 \
//! APPWRITE_PROJECT_ID=shop APPWRITE_DATABASE_ID=main \
//! APPWRITE_CART_COLLECTION_ID=cart_items APPWRITE_JWT=... \
//!   storefront-cart <user-id> [toggle <item> | delete <item> | stock <item> <qty>]
//! ```
//!
//! Without a command the cart is loaded and printed. With one, the command is
//! applied, confirmed or compensated, and the resulting cart printed.

use anyhow::{Context, bail};
use std::sync::Arc;
use std::time::Duration;
use storefront_cart::{
    AppwriteConfig, AppwriteGateway, CartAction, CartEnvironment, CartItemId, CartReducer,
    CartState, LoadStatus, UserData,
};
use storefront_cart_core::environment::SystemClock;
use storefront_cart_runtime::Store;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const WAIT: Duration = Duration::from_secs(30);

type CartStore = Store<
    CartState,
    CartAction,
    CartEnvironment<AppwriteGateway>,
    CartReducer<AppwriteGateway>,
>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((user_id, command)) = args.split_first() else {
        bail!("usage: storefront-cart <user-id> [toggle <item> | delete <item> | stock <item> <qty>]");
    };
    let command = parse_command(command)?;

    let config = AppwriteConfig::from_env().context("loading Appwrite configuration")?;
    info!(endpoint = %config.endpoint, "Connecting to Appwrite");
    let gateway = AppwriteGateway::new(config)?;

    let env = CartEnvironment::new(gateway, Arc::new(SystemClock));
    let store: CartStore = Store::new(CartState::new(), CartReducer::new(), env);

    store
        .send(CartAction::SetUser { user: Some(UserData::new(user_id.as_str())) })
        .await?;
    store.send(CartAction::LoadCart).await?.wait_with_timeout(WAIT).await?;

    if let LoadStatus::Failed(reason) = store.state(|s| s.load.clone()).await {
        bail!("could not load cart: {reason}");
    }

    for action in command {
        store.send(action).await?.wait_with_timeout(WAIT).await?;
    }

    print_cart(&store).await;
    store.shutdown().await?;
    Ok(())
}

fn parse_command(args: &[String]) -> anyhow::Result<Vec<CartAction>> {
    let words: Vec<&str> = args.iter().map(String::as_str).collect();
    let actions = match words.as_slice() {
        [] => Vec::new(),
        ["toggle", id] => vec![CartAction::ToggleOrdering { id: CartItemId::new(*id) }],
        ["delete", id] => vec![CartAction::DeleteItem { id: CartItemId::new(*id) }],
        ["stock", id, qty] => {
            let id = CartItemId::new(*id);
            vec![
                CartAction::QuantityInput { id: id.clone(), text: (*qty).to_string() },
                CartAction::ConfirmQuantity { id },
            ]
        },
        _ => bail!("unknown command: {}", words.join(" ")),
    };
    Ok(actions)
}

async fn print_cart(store: &CartStore) {
    let state = store.state(CartState::clone).await;

    if let Some(rejection) = &state.last_rejection {
        println!("Rejected: {rejection:?}");
    }

    for item in &state.items {
        let marker = if item.ordering { "[x]" } else { "[ ]" };
        println!(
            "{marker} {:<24} {:>4} x {:>8} = {:>9}  ({})",
            item.name,
            item.stock,
            item.price,
            item.line_total(),
            item.cart_item_id
        );
        if let Some(error) = state.error_for(&item.cart_item_id) {
            println!("    ! {} ({})", error.message, error.kind);
        }
    }

    println!(
        "{} item(s), {} marked for order, order total {}",
        state.items.len(),
        state.items.ordering_items().count(),
        state.items.ordering_total()
    );
}
