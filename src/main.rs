use dotenvy::dotenv;
use std::sync::Arc;
use survey_intake::config::Config;
use survey_intake::cors::OriginAllowList;
use survey_intake::database::{self, AppState, PgSurveyStore};
use survey_intake::storage::CloudinaryUploader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;

    // Connections
    let pool = database::connect_db(&config.database_url, config.db_max_connections).await?;
    database::run_migrations(&pool).await?;
    tracing::info!("Database connected, migrations applied");

    let uploader = CloudinaryUploader::new(config.cloudinary.clone())?;

    let app_state = AppState {
        store: Arc::new(PgSurveyStore::new(pool)),
        uploader: Arc::new(uploader),
    };

    let allow_list = OriginAllowList::new(&config.allowed_origins);
    tracing::info!("CORS allow-list has {} origins", allow_list.len());

    let app = survey_intake::create_router(app_state, allow_list, config.max_upload_bytes);

    // Run
    let addr = config.listen_addr();
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
