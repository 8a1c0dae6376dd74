/// Simulated metrics backend
/// Serves random samples so the dashboard can be run without a real service

#[cfg(feature = "server")]
pub mod routes;

#[cfg(feature = "server")]
pub mod handlers;

#[cfg(feature = "server")]
pub use routes::create_router;

#[cfg(feature = "server")]
pub async fn run(host: String, port: u16) -> anyhow::Result<()> {
    use std::net::SocketAddr;

    let app = create_router(handlers::ServerState::new());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("🚀 Simulated metrics backend");
    println!("   📍 Metrics: http://{}/metrics", addr);
    println!("   💚 Health:  http://{}/api/health", addr);
    println!();

    tracing::info!("Backend server starting on {}...", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
