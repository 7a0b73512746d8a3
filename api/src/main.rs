use std::net::{Ipv4Addr, SocketAddr};

use image_transformation_api::{app, config::EnvVars, RouterOptions, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let environment_variables = envy::from_env::<EnvVars>()?;

    let server_config = match ServerConfig::from_env_vars(&environment_variables) {
        Ok(server_config) => server_config,
        Err(err) => {
            tracing::error!(error = %err, "media store initialization failed");
            return Err(err.into());
        }
    };
    let router_options = RouterOptions::from_env_vars(&environment_variables)?;

    let app = app(server_config, router_options);

    let listener =
        tokio::net::TcpListener::bind((Ipv4Addr::UNSPECIFIED, environment_variables.port)).await?;
    tracing::info!(
        port = environment_variables.port,
        frontend_url = %environment_variables.frontend_url,
        "server running"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
