use tokio::net::TcpListener;
use tracing::{error, info};
use wayfarer::config::AppConfig;
use wayfarer::db::{init_pool, migrate};
use wayfarer::error::AppError;
use wayfarer::routes::create_router;
use wayfarer::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let db = init_pool(&config.database_url).await?;

    if let Err(err) = migrate(&db).await {
        error!("migration failed: {err:?}");
        return Err(err);
    }

    if config.mail.smtp.is_none() {
        info!("SMTP_HOST not set, emails will only be logged");
    }

    let state = AppState::from_pool(config.clone(), db)?;
    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,wayfarer=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
