mod config;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env().expect("invalid configuration");

    // Non-fatal: the browser talks to the platform directly.
    if config.probe_platform {
        match services::platform_probe::probe(&config.public).await {
            Ok(()) => tracing::info!(url = %config.public.supabase_url, "platform reachable"),
            Err(e) => tracing::warn!(error = %e, "platform probe failed; continuing"),
        }
    }

    let port = config.port;
    let state = state::AppState::new(config.public);
    let app = routes::app(state).expect("leptos app init failed");
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "markbook listening");
    axum::serve(listener, app).await.expect("server failed");
}
