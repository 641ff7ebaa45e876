use axum_helpers::bind;
use core_config::AppConfig;
use std::io;
use tokio::net::TcpListener;

/// Binds the API and metrics listeners concurrently.
pub async fn bind_listeners(config: &AppConfig) -> io::Result<(TcpListener, TcpListener)> {
    let api_server = config.server();
    let metrics_server = config.metrics_server();

    tokio::try_join!(bind(&api_server), bind(&metrics_server))
}
