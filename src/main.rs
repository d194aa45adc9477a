use clap::Parser;
use opztv_catalog::config::{Config, mask_token};
use opztv_catalog::igdb::IgdbClient;
use opztv_catalog::repository::Repository;
use opztv_catalog::server::router::{AppState, catalog_router};
use opztv_catalog::storage::Storage;
use opztv_catalog::youtube::YoutubeClient;
use opztv_catalog::{storage, sync};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "opztv-catalog", about = "Catalog service for channel uploads")]
struct Cli {
    /// HTTP server port.
    #[arg(long, default_value_t = 8088)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let cfg = Config::from_env()?;

    info!(
        sqlite_path = %cfg.sqlite_path.as_deref().unwrap_or("<none>"),
        d1_account_id = %cfg.d1_account_id.as_deref().unwrap_or("<none>"),
        cloudflare_api_token = %mask_token(cfg.cloudflare_api_token.as_deref().unwrap_or("")),
        igdb_client_id = %cfg.igdb_client_id.as_deref().unwrap_or("<none>"),
        web_root = %cfg.web_root(),
        "starting with configuration"
    );

    let storage = storage::connect(&cfg).await?;
    let repo = Arc::new(Repository::new(storage.clone()));

    let (igdb_client_id, igdb_client_secret) = cfg.igdb_credentials()?;
    let igdb = Arc::new(IgdbClient::new(igdb_client_id, igdb_client_secret));

    let youtube = Arc::new(YoutubeClient::new(
        cfg.youtube_api_key.clone().unwrap_or_default(),
    ));

    if let Some(minutes) = cfg.sync_interval_minutes() {
        tokio::spawn(sync::run_scheduled(
            repo.clone(),
            youtube.clone(),
            Duration::from_secs(minutes * 60),
        ));
    }

    let state = AppState::new(repo, igdb, youtube);
    let web_root = PathBuf::from(cfg.web_root());
    let app = catalog_router(state, &web_root);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    storage.close().await;
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
