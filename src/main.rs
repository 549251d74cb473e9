use hokm::config::ServerConfig;
use hokm::history::{
    InMemoryMatchHistoryRepository, MatchHistoryRepository, PostgresMatchHistoryRepository,
};
use hokm::websockets::InMemoryConnectionManager;
use hokm::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hokm=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hokm game server");

    let config = ServerConfig::from_env();
    if config.rules.round_trick_threshold < 7 {
        warn!(
            threshold = config.rules.round_trick_threshold,
            "Rounds end at this many tricks rather than the traditional seven"
        );
    }
    info!(
        match_target = config.rules.match_target,
        reconnect_grace_secs = config.timing.reconnect_grace.as_secs(),
        cross_room_replacement = config.cross_room_replacement,
        "Configuration loaded"
    );

    let history: Arc<dyn MatchHistoryRepository + Send + Sync> = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            let repository = PostgresMatchHistoryRepository::new(pool);
            repository.ensure_schema().await?;
            info!("Match history stored in PostgreSQL");
            Arc::new(repository)
        }
        None => {
            info!("Match history kept in memory");
            Arc::new(InMemoryMatchHistoryRepository::new())
        }
    };

    let listen_addr = config.listen_addr.clone();
    let app_state = AppState::new(config, Arc::new(InMemoryConnectionManager::new()), history);
    let app = hokm::app(app_state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("Server running on http://{}", listen_addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
