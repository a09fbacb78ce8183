use std::sync::Arc;
use std::time::Duration;

use log::info;

use vtt_server::action_core::ActionCore;
use vtt_server::broadcast::Broadcaster;
use vtt_server::character_store::CharacterStore;
use vtt_server::chat::ChatStore;
use vtt_server::config::Config;
use vtt_server::logging;
use vtt_server::net::{self, AppState};
use vtt_server::persistence::InMemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load("vtt-server.toml")?;
    logging::initialize_logger(logging::level_from_str(&config.log_level), config.log_file.as_deref());

    info!("starting vtt-server on {}", config.bind_address);

    let store = Arc::new(InMemoryStore::new());
    let action_core = Arc::new(ActionCore::new(Arc::clone(&store), Duration::from_secs(config.debounce_save_seconds)));
    let character_store = Arc::new(CharacterStore::new(Arc::clone(&store)));
    let chat_store = Arc::new(ChatStore::new());

    let jwt_secret = std::env::var("VTT_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".to_string());
    let state = Arc::new(AppState {
        action_core: Arc::clone(&action_core),
        character_store,
        chat_store,
        broadcaster: Broadcaster::new(),
        jwt_secret,
    });

    let shutdown_core = Arc::clone(&action_core);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received, flushing pending saves");
            shutdown_core.flush_all_pending_saves().await;
            std::process::exit(0);
        }
    });

    let router = net::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
