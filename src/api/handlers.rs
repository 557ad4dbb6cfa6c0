//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    services::GenerateError,
    state::AppState,
    tasks::TimerOp,
    workout::{Wod, WodRequest},
};
use super::responses::{
    ErrorResponse, HealthResponse, PreferencesResponse, StatusResponse, TimerResponse,
    WorkoutResponse,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: String) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

/// Load a workout and answer with its fresh timer
async fn load(state: &AppState, workout: Wod) -> Result<Json<WorkoutResponse>, ApiError> {
    if let Err(e) = workout.validate() {
        warn!("Rejected workout: {}", e);
        return Err(api_error(StatusCode::BAD_REQUEST, e));
    }

    match state.load_workout(workout.clone()).await {
        Ok(view) => {
            let timer = TimerResponse::loaded(&workout, view);
            Ok(Json(WorkoutResponse { workout, timer }))
        }
        Err(e) => {
            error!("Failed to load workout: {}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e))
        }
    }
}

/// Handle POST /workout - Display a workout and build its timer
pub async fn load_workout_handler(
    State(state): State<Arc<AppState>>,
    Json(workout): Json<Wod>,
) -> Result<Json<WorkoutResponse>, ApiError> {
    info!("Workout endpoint called - loading {:?}", workout.wod_title);
    load(&state, workout).await
}

/// Handle POST /workout/generate - Generate a workout, then display it
pub async fn generate_workout_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WodRequest>,
) -> Result<Json<WorkoutResponse>, ApiError> {
    let Some(generator) = &state.generator else {
        warn!("Generate endpoint called without a configured generator");
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            GenerateError::NotConfigured.to_string(),
        ));
    };

    let saved = state
        .get_preferences()
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;
    let request = request.merged_with(&saved);

    match generator.generate(&request).await {
        Ok(workout) => load(&state, workout).await,
        Err(e) => {
            let status = match e {
                GenerateError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                GenerateError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                GenerateError::Upstream(_) | GenerateError::InvalidResponse(_) => {
                    StatusCode::BAD_GATEWAY
                }
            };
            error!("Workout generation failed: {}", e);
            Err(api_error(status, e.to_string()))
        }
    }
}

/// Apply an operation to the loaded timer
async fn apply(state: &AppState, op: TimerOp) -> Result<Json<TimerResponse>, StatusCode> {
    match state.apply(op).await {
        Ok(Some(outcome)) => {
            info!(
                "Timer {} endpoint called - {}",
                op.name(),
                if outcome.accepted { "accepted" } else { "ignored" }
            );
            Ok(Json(TimerResponse::from_outcome(op.name(), outcome)))
        }
        Ok(None) => {
            warn!("Timer {} called with no workout loaded", op.name());
            Err(StatusCode::NOT_FOUND)
        }
        Err(e) => {
            error!("Failed to apply timer {}: {}", op.name(), e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /timer/start - Begin the 10 second countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    apply(&state, TimerOp::Start).await
}

/// Handle POST /timer/pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    apply(&state, TimerOp::Pause).await
}

/// Handle POST /timer/resume
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    apply(&state, TimerOp::Resume).await
}

/// Handle POST /timer/reset
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    apply(&state, TimerOp::Reset).await
}

/// Handle POST /timer/rounds/add
pub async fn add_round_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    apply(&state, TimerOp::AddRound).await
}

/// Handle POST /timer/rounds/subtract
pub async fn subtract_round_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    apply(&state, TimerOp::SubtractRound).await
}

/// Handle DELETE /timer - Tear down the loaded workout's timer
pub async fn unload_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.clear_session().await {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(e) => {
            error!("Failed to unload workout: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Handle GET /preferences
pub async fn get_preferences_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PreferencesResponse>, StatusCode> {
    match state.get_preferences() {
        Ok(preferences) => Ok(Json(PreferencesResponse {
            preferences,
            timestamp: chrono::Utc::now(),
        })),
        Err(e) => {
            error!("Failed to read preferences: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle PUT /preferences - Replace the saved preferences
pub async fn put_preferences_handler(
    State(state): State<Arc<AppState>>,
    Json(preferences): Json<WodRequest>,
) -> Result<Json<PreferencesResponse>, StatusCode> {
    match state.set_preferences(preferences) {
        Ok(preferences) => {
            info!("Preferences endpoint called - preferences saved");
            Ok(Json(PreferencesResponse {
                preferences,
                timestamp: chrono::Utc::now(),
            }))
        }
        Err(e) => {
            error!("Failed to save preferences: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return the loaded workout and timer
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let session = match state.get_session() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to get session: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();
    let (workout, timer) = match session {
        Some(session) => (Some(session.workout), Some(session.timer.view())),
        None => (None, None),
    };

    Ok(Json(StatusResponse {
        workout,
        timer,
        generator_configured: state.generator.is_some(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
