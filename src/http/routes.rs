//! HTTP route definitions

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::app::AppState;
use crate::game::{ErrorKind, MatchError, MatchId, MatchSnapshot, ParticipantId};
use crate::http::extract::{ApiJson, ApiQuery};
use crate::http::middleware::rate_limit;
use crate::http::protocol::{
    AckResponse, CatalogResponse, CreateMatchRequest, CreateMatchResponse, ErrorBody,
    HealthResponse, JoinMatchRequest, StateQuery, SubmitActionRequest, SubmitActionResponse,
    SubmitMapRequest, SubmitTeamRequest,
};
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = match &state.config.client_origin {
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
                .collect();
            CorsLayer::new().allow_origin(allowed)
        }
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([header::CONTENT_TYPE]);

    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/catalog", get(catalog_handler));

    // Match protocol, behind the request budget
    let match_routes = Router::new()
        .route("/matches", post(create_match_handler))
        .route("/matches/:match_id", get(get_state_handler))
        .route("/matches/:match_id/join", post(join_match_handler))
        .route("/matches/:match_id/team", post(submit_team_handler))
        .route("/matches/:match_id/map", post(submit_map_handler))
        .route("/matches/:match_id/actions", post(submit_action_handler))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .merge(public_routes)
        .merge(match_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Service endpoints
// ============================================================================

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: uptime_secs(),
        active_matches: state.match_registry.active_matches(),
    })
}

async fn catalog_handler() -> Json<CatalogResponse> {
    Json(CatalogResponse::build())
}

// ============================================================================
// Match setup
// ============================================================================

async fn create_match_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateMatchRequest>,
) -> Result<(StatusCode, Json<CreateMatchResponse>), AppError> {
    let creator = ParticipantId::parse(&req.player_id)?;
    let match_id = state.match_registry.create(creator);
    Ok((StatusCode::CREATED, Json(CreateMatchResponse { match_id })))
}

async fn join_match_handler(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    ApiJson(req): ApiJson<JoinMatchRequest>,
) -> Result<Json<AckResponse>, AppError> {
    let match_id = MatchId::from(match_id);
    let joiner = ParticipantId::parse(&req.player_id)?;

    state
        .match_registry
        .mutate(&match_id, |m| m.join(joiner))
        .map_err(|e| rejected(&match_id, "join", e))?;

    Ok(Json(AckResponse {
        message: "joined match".to_string(),
    }))
}

async fn submit_team_handler(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    ApiJson(req): ApiJson<SubmitTeamRequest>,
) -> Result<Json<AckResponse>, AppError> {
    let match_id = MatchId::from(match_id);
    let participant = ParticipantId::parse(&req.player_id)?;

    let name = state
        .match_registry
        .mutate(&match_id, |m| m.submit_team(&participant, &req.team))
        .map_err(|e| rejected(&match_id, "submit_team", e))?;

    Ok(Json(AckResponse {
        message: format!("team {} submitted", name),
    }))
}

async fn submit_map_handler(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    ApiJson(req): ApiJson<SubmitMapRequest>,
) -> Result<Json<AckResponse>, AppError> {
    let match_id = MatchId::from(match_id);
    let participant = ParticipantId::parse(&req.player_id)?;

    let map = state
        .match_registry
        .mutate(&match_id, |m| m.submit_map(&participant, &req.map))
        .map_err(|e| rejected(&match_id, "submit_map", e))?;

    Ok(Json(AckResponse {
        message: format!("map {} selected", map),
    }))
}

// ============================================================================
// Play
// ============================================================================

async fn get_state_handler(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    ApiQuery(query): ApiQuery<StateQuery>,
) -> Result<Json<MatchSnapshot>, AppError> {
    let match_id = MatchId::from(match_id);
    let viewer = query
        .player_id
        .as_deref()
        .map(ParticipantId::parse)
        .transpose()?;

    let snapshot = state.match_registry.snapshot(&match_id, viewer.as_ref())?;
    Ok(Json(snapshot))
}

async fn submit_action_handler(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    ApiJson(req): ApiJson<SubmitActionRequest>,
) -> Result<Json<SubmitActionResponse>, AppError> {
    let match_id = MatchId::from(match_id);
    let participant = ParticipantId::parse(&req.player_id)?;

    let response = state
        .match_registry
        .mutate(&match_id, |m| {
            let resolution = m.submit_action(&participant, &req.command)?;
            Ok(SubmitActionResponse {
                narrative: resolution.narrative,
                phase: m.phase,
                turn_number: m.turn_number,
                active_side: m.active,
                finished: resolution.finished,
            })
        })
        .map_err(|e| rejected(&match_id, "submit_action", e))?;

    Ok(Json(response))
}

fn rejected(match_id: &MatchId, operation: &'static str, err: MatchError) -> MatchError {
    warn!(match_id = %match_id, operation, error = %err, "Request rejected");
    err
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Too many requests")]
    RateLimited,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Match(e) => e.kind(),
            AppError::BadRequest(_) => ErrorKind::InvalidInput,
            AppError::RateLimited => ErrorKind::RateLimited,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let kind = self.kind();
        let status = match kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
            ErrorKind::InvalidPhase => StatusCode::CONFLICT,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: self.to_string(),
            kind,
        };

        (status, Json(body)).into_response()
    }
}
