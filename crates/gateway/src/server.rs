use std::{net::SocketAddr, sync::Arc, time::Duration};

use {
    axum::{
        Router,
        extract::{ConnectInfo, State, WebSocketUpgrade},
        response::{IntoResponse, Json},
        routing::{get, post},
    },
    secrecy::{ExposeSecret, Secret},
    sqlx::SqlitePool,
    tower_http::cors::{Any, CorsLayer},
    tracing::{info, warn},
};

use {
    carbot_auth::CredentialVerifier,
    carbot_catalog::SqliteCatalog,
    carbot_config::CarbotConfig,
    carbot_history::SqliteExchangeStore,
    carbot_media::UnsplashImageSearch,
    carbot_nlu::WitClassifier,
    carbot_resolver::ResolutionEngine,
};

use crate::{state::GatewayState, ws::handle_connection};

// ── Shared app state ─────────────────────────────────────────────────────────

/// Long-lived collaborators shared by every channel.
pub struct GatewayServices {
    pub verifier: CredentialVerifier,
    pub engine: ResolutionEngine,
    pub store: SqliteExchangeStore,
}

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayState>,
    pub services: Arc<GatewayServices>,
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>, services: Arc<GatewayServices>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/resolve", post(resolve_handler))
        .route("/ws", get(ws_upgrade_handler))
        .layer(cors)
        .with_state(AppState {
            gateway: state,
            services,
        })
}

/// Wire the service bundle from config. Fails only on a missing JWT secret;
/// missing NLU/media credentials degrade to apology answers at resolve time.
pub async fn build_services(
    config: &CarbotConfig,
    pool: &SqlitePool,
) -> anyhow::Result<GatewayServices> {
    let jwt_secret = config.auth.jwt_secret.as_ref().ok_or_else(|| {
        anyhow::anyhow!("auth.jwt_secret is not configured (set CARBOT_JWT_SECRET)")
    })?;
    let verifier = CredentialVerifier::new(jwt_secret.expose_secret());

    let nlu_token = config.nlu.token.clone().unwrap_or_else(|| {
        warn!("nlu.token is not configured; classification requests will be rejected upstream");
        Secret::new(String::new())
    });
    let classifier = WitClassifier::new(
        config.nlu.base_url.clone(),
        config.nlu.api_version.clone(),
        nlu_token,
        Duration::from_secs(config.nlu.timeout_seconds),
    );

    let access_key = config.media.access_key.clone().unwrap_or_else(|| {
        warn!("media.access_key is not configured; image requests will be rejected upstream");
        Secret::new(String::new())
    });
    let images = UnsplashImageSearch::new(
        config.media.base_url.clone(),
        access_key,
        Duration::from_secs(config.media.timeout_seconds),
    );

    SqliteCatalog::init(pool).await?;
    SqliteExchangeStore::init(pool).await?;
    let catalog = SqliteCatalog::new(pool.clone());

    Ok(GatewayServices {
        verifier,
        engine: ResolutionEngine::new(Arc::new(classifier), Arc::new(images), Arc::new(catalog)),
        store: SqliteExchangeStore::new(pool.clone()),
    })
}

/// Start the gateway HTTP + WebSocket server.
pub async fn start_gateway(
    bind: Option<String>,
    port: Option<u16>,
    config_dir: Option<std::path::PathBuf>,
    data_dir: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    if let Some(dir) = config_dir {
        carbot_config::set_config_dir(dir);
    }
    if let Some(dir) = data_dir {
        carbot_config::set_data_dir(dir);
    }

    let mut config = carbot_config::discover_and_load();
    carbot_config::apply_env_overrides(&mut config);
    if let Some(bind) = bind {
        config.gateway.bind = bind;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }

    let db_path = config
        .database
        .path
        .clone()
        .unwrap_or_else(|| carbot_config::data_dir().join("carbot.db"));
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let pool = SqlitePool::connect(&format!("sqlite://{}?mode=rwc", db_path.display())).await?;

    let services = Arc::new(build_services(&config, &pool).await?);
    let state = Arc::new(GatewayState::new());
    let app = build_gateway_app(Arc::clone(&state), services);

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    info!(%addr, db = %db_path.display(), "gateway listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.gateway.version,
        "connections": state.gateway.channel_count().await,
    }))
}

#[derive(serde::Deserialize)]
struct ResolveRequest {
    text: String,
}

/// Out-of-channel resolution: no credential, no persistence.
async fn resolve_handler(
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> impl IntoResponse {
    let response = state.services.engine.resolve(&req.text).await;
    Json(serde_json::json!({ "response": response }))
}

async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state.gateway, state.services, addr))
}
