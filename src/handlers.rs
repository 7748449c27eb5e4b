use crate::errors::AppError;
use crate::models::{AnswerLabel, MessageResponse, SubmitRequest, Tally};
use crate::state::AppState;
use crate::ui::{INDEX_HTML, RESULTS_HTML};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Html,
    Json,
};
use tracing::{error, info, warn};

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn results_page() -> Html<&'static str> {
    Html(RESULTS_HTML)
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let label = parse_answer(payload)?;

    let tally = state.store.increment(label).await.map_err(|err| {
        error!("failed to save answer {label}: {err}");
        AppError::SubmitFailed(err)
    })?;
    info!("answer {label} saved, count now {}", tally.get(label));

    Ok(Json(MessageResponse::new("Ответ успешно сохранен")))
}

pub async fn results_data(State(state): State<AppState>) -> Json<Tally> {
    Json(state.store.read_all().await.tally)
}

pub async fn reset(State(state): State<AppState>) -> Result<Json<MessageResponse>, AppError> {
    state.store.reset_all().await.map_err(|err| {
        error!("failed to reset results: {err}");
        AppError::ResetFailed(err)
    })?;
    info!("results reset");

    Ok(Json(MessageResponse::new("Результаты успешно сброшены")))
}

fn parse_answer(
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<AnswerLabel, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("rejected submit body: {rejection}");
        AppError::InvalidAnswer
    })?;

    let answer = request.answer.ok_or(AppError::InvalidAnswer)?;
    answer.parse::<AnswerLabel>().map_err(|err| {
        warn!("rejected submit: {err}");
        AppError::InvalidAnswer
    })
}
