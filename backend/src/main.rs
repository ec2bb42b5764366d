use bot_arena_backend::error::AppError;
use bot_arena_backend::{
    config::Config,
    counter::MatchIdCounter,
    db::create_pool,
    handlers, observability,
    runner::RunnerClient,
    services::registry::{ScrimmageRegistry, TournamentRegistry},
    state::AppState,
    storage::StorageHandler,
};
use std::sync::Arc;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    let telemetry = observability::init(&config)?;

    tracing::info_span!("app_startup").in_scope(|| {
        tracing::info!("Application starting up");
    });

    std::fs::create_dir_all(&config.temp_dir)?;

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;

    let runner = RunnerClient::new(&config);
    runner.open_workspace().await?;

    let storage = Arc::new(StorageHandler::new(&config, pool.clone())?);

    let first_match_id = storage.next_match_id().await?;
    tracing::info!(first_match_id, "seeded match id counter");

    let state = Arc::new(AppState {
        pool,
        runner,
        storage,
        engine: tokio::sync::RwLock::new(None),
        match_counter: MatchIdCounter::new(first_match_id),
        scrimmages: ScrimmageRegistry::default(),
        tournaments: TournamentRegistry::default(),
        config: config.clone(),
    });

    let app = handlers::router(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(tracing::Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    );

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("match orchestration server running at http://{}", addr);

    axum::serve(listener, app).await?;

    telemetry.shutdown();

    Ok(())
}
