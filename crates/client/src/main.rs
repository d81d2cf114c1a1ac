//! Favsync - composition root binary.
//!
//! Usage: `favsync [toggle <item-id>]`

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use favsync_client::{
    ClientConfig, FavoritesService, FavoritesSession, HttpFavoritesGateway, ToggleOutcome,
};
use favsync_domain::ItemId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "favsync_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let toggle = parse_args(std::env::args().skip(1))?;

    let config = ClientConfig::from_env();
    tracing::info!(api_url = %config.api_url, "Starting favsync");

    let gateway = HttpFavoritesGateway::from_config(&config)
        .with_context(|| format!("Invalid API URL: {}", config.api_url))?;
    let service = Arc::new(FavoritesService::new(Arc::new(gateway), config.favorites));
    let session = FavoritesSession::new(service);
    session.on_auth_changed(true);

    let membership = session.membership();
    membership
        .refresh()
        .await
        .context("Failed to load favorite ids")?;

    if let Some(item_id) = toggle {
        match membership.toggle(&item_id).await {
            Ok(ToggleOutcome::Added) => println!("Added {item_id} to favorites"),
            Ok(ToggleOutcome::Removed) => println!("Removed {item_id} from favorites"),
            Ok(ToggleOutcome::Ignored) => println!("{item_id} is already being updated"),
            Err(e) => eprintln!("{e}"),
        }
    }

    let preview = session
        .preview()
        .items()
        .await
        .context("Failed to load favorites preview")?;

    println!("{} favorites", membership.count());
    for item in preview.iter() {
        println!(
            "  {}  {} | {} | {}",
            item.id,
            item.title,
            item.display_location(),
            item.display_price()
        );
    }

    session.on_auth_changed(false);
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Option<ItemId>> {
    match (args.next().as_deref(), args.next(), args.next()) {
        (None, _, _) => Ok(None),
        (Some("toggle"), Some(id), None) if !id.trim().is_empty() => Ok(Some(ItemId::new(id))),
        _ => bail!("usage: favsync [toggle <item-id>]"),
    }
}
