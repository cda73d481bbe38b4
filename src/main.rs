use std::net::SocketAddr;

use studentjobs_backend::{
    config::{get_config, init_config, StorageBackend},
    database::pool::create_pool,
    middleware::canonical_host::{redirect_to_canonical_host, CanonicalHost},
    routes, AppState,
};
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let config = get_config();
    info!(
        city = %config.city.city_name,
        host = %config.city.canonical_host,
        environment = %config.environment,
        "Starting job board backend"
    );

    let pool = create_pool(config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::from_config(config, pool)?;

    let mut app = routes::router(app_state, config.max_body_bytes);

    if let StorageBackend::Local {
        uploads_dir,
        public_base_url,
    } = &config.storage
    {
        if public_base_url.starts_with('/') {
            info!("Serving uploads from: {}", uploads_dir.display());
            app = app.nest_service(public_base_url, ServeDir::new(uploads_dir));
        }
    }

    let canonical = CanonicalHost::new(config.city.canonical_host.clone(), config.is_production());
    let app = app
        .layer(axum::middleware::from_fn_with_state(
            canonical,
            redirect_to_canonical_host,
        ))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
