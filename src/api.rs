use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderName, Method, StatusCode, header},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};

use crate::{
    clients::health::HealthChecker,
    dispatch::Dispatcher,
    error::DispatchError,
    models::{health::HealthStatus, request::NotificationRequest, response::DispatchResponse},
};

pub struct AppState {
    pub dispatcher: Dispatcher,
    pub health_checker: HealthChecker,
}

/// CORS answers every `OPTIONS` request as a permissive preflight; other
/// non-POST methods on the dispatch routes get 405.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ]);

    Router::new()
        .route("/", post(send_push_notification))
        .route("/send-push-notification", post(send_push_notification))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_api_server(
    state: Arc<AppState>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "Push dispatch server started");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn send_push_notification(
    State(state): State<Arc<AppState>>,
    payload: Bytes,
) -> Result<Json<DispatchResponse>, DispatchError> {
    let request = NotificationRequest::from_slice(&payload)?;
    debug!(
        bulk = request.user_ids.is_some(),
        template_name = request.template_name.as_deref(),
        "Received push notification request"
    );

    let response = state.dispatcher.dispatch(request).await?;
    Ok(Json(response))
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_checker.check_all().await;

    let status_code = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}
