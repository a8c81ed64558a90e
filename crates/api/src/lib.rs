mod config;
mod error;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::HeaderValue;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use estate_agents::{EstateAgent, GeminiClient};
use estate_core::{Buyer, ChatInput, ChatReply, NewBuyer, NewSeller, NewUser, Seller, User};
use estate_observability::{AppMetrics, MetricsSnapshot};
use estate_storage::{BuyerRepository, SellerRepository, Store, UserRepository};
use serde::Serialize;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use crate::config::AppConfig;
pub use crate::error::ApiError;

const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<EstateAgent<GeminiClient>>,
    pub store: Arc<Store>,
    pub metrics: Arc<AppMetrics>,
    pub allowed_origin: HeaderValue,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    store: &'static str,
    completion_configured: bool,
    metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
struct BuyersResponse {
    buyers: Vec<Buyer>,
}

#[derive(Debug, Serialize)]
struct BuyerCreatedResponse {
    message: &'static str,
    buyer: Buyer,
}

#[derive(Debug, Serialize)]
struct SellersResponse {
    sellers: Vec<Seller>,
}

#[derive(Debug, Serialize)]
struct SellerCreatedResponse {
    message: &'static str,
    seller: Seller,
}

#[derive(Debug, Serialize)]
struct UserCreatedResponse {
    message: &'static str,
    user: User,
}

pub async fn build_app(config: AppConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let (store, seeded) = Store::open(&config.database_url)
        .await
        .with_context(|| format!("failed to open record store at {}", config.database_url))?;
    info!(
        backend = store.backend_name(),
        buyers_seeded = seeded.buyers_inserted,
        sellers_seeded = seeded.sellers_inserted,
        "record store ready"
    );

    if config.completion.api_key.is_none() {
        warn!("no completion api key configured, chat replies will use the fallback text");
    }

    let deadline = config.completion.timeout;
    let completion = GeminiClient::new(config.completion)?;
    let agent = Arc::new(EstateAgent::new(
        Arc::new(completion),
        deadline,
        metrics.clone(),
    ));

    let allowed_origin = HeaderValue::from_str(&config.allowed_origin)
        .with_context(|| format!("invalid allowed origin {:?}", config.allowed_origin))?;

    let state = ApiState {
        agent,
        store: Arc::new(store),
        metrics,
        allowed_origin,
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/buyers", get(list_buyers).post(add_buyer))
        .route("/api/sellers", get(list_sellers).post(add_seller))
        .route("/api/users", post(add_user))
        .route("/chat", post(chat))
        .layer(build_cors_layer(&state.allowed_origin))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    Json(StatusResponse { status: "running" })
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "running",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        store: state.store.backend_name(),
        completion_configured: state.agent.completion().config().api_key.is_some(),
        metrics: state.metrics.snapshot(),
    })
}

async fn list_buyers(State(state): State<ApiState>) -> Result<Json<BuyersResponse>, ApiError> {
    let buyers = state.store.list_buyers().await?;
    Ok(Json(BuyersResponse { buyers }))
}

async fn add_buyer(
    State(state): State<ApiState>,
    Json(request): Json<NewBuyer>,
) -> Result<Json<BuyerCreatedResponse>, ApiError> {
    let buyer = state.store.create_buyer(request).await?;
    state.metrics.inc_buyer_created();
    info!(buyer_id = buyer.id, "buyer added");

    Ok(Json(BuyerCreatedResponse {
        message: "Buyer added successfully",
        buyer,
    }))
}

async fn list_sellers(State(state): State<ApiState>) -> Result<Json<SellersResponse>, ApiError> {
    let sellers = state.store.list_sellers().await?;
    Ok(Json(SellersResponse { sellers }))
}

async fn add_seller(
    State(state): State<ApiState>,
    Json(request): Json<NewSeller>,
) -> Result<Json<SellerCreatedResponse>, ApiError> {
    let seller = state.store.create_seller(request).await?;
    state.metrics.inc_seller_created();
    info!(seller_id = seller.id, "seller added");

    Ok(Json(SellerCreatedResponse {
        message: "Seller added successfully",
        seller,
    }))
}

async fn add_user(
    State(state): State<ApiState>,
    Json(request): Json<NewUser>,
) -> Result<Json<UserCreatedResponse>, ApiError> {
    let user = state.store.create_user(request).await?;
    info!(user_id = user.id, role = %user.role, "user registered");

    Ok(Json(UserCreatedResponse {
        message: "User registered successfully",
        user,
    }))
}

async fn chat(State(state): State<ApiState>, Json(request): Json<ChatInput>) -> Json<ChatReply> {
    Json(state.agent.handle_chat(&request.message).await)
}

fn build_cors_layer(allowed_origin: &HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list([allowed_origin.clone()]))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
