//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::auth::AuthUser;
use crate::domain::Level;
use crate::error::{ApiError, ApiResult};
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_languages(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let out: Vec<LanguageOut> = state.languages.iter().map(LanguageOut::from).collect();
  Json(out)
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_quizzes(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuizQuery>,
) -> ApiResult<Json<Vec<QuizOut>>> {
  let level = match q.level.as_deref().filter(|s| !s.is_empty()) {
    Some(s) => Some(Level::parse(s).ok_or_else(|| ApiError::BadRequest(format!("Unknown level: {}", s)))?),
    None => None,
  };
  let language = q.language.as_deref().filter(|s| !s.is_empty());
  let quizzes: Vec<QuizOut> = state
    .list_quizzes(language, level)
    .into_iter()
    .map(|quiz| quiz_out(quiz, state.language(&quiz.language)))
    .collect();
  info!(target: "quiz", count = quizzes.len(), "HTTP quizzes listed");
  Ok(Json(quizzes))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_quiz(
  State(state): State<Arc<AppState>>,
  Path(id): Path<u64>,
) -> ApiResult<Json<QuizOut>> {
  let quiz = state
    .get_quiz(id)
    .ok_or_else(|| ApiError::NotFound(format!("Unknown quiz: {}", id)))?;
  Ok(Json(quiz_out(quiz, state.language(&quiz.language))))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_signup(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SignupIn>,
) -> ApiResult<(StatusCode, Json<AuthOut>)> {
  Ok((StatusCode::CREATED, Json(signup(&state, &body).await?)))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_login(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LoginIn>,
) -> ApiResult<Json<AuthOut>> {
  Ok(Json(login(&state, &body).await?))
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.user_id))]
pub async fn http_me(State(state): State<Arc<AppState>>, user: AuthUser) -> ApiResult<Json<UserOut>> {
  let account = state
    .user_by_id(&user.user_id)
    .await
    .ok_or_else(|| ApiError::Unauthorized("Unknown user".into()))?;
  Ok(Json(UserOut::from(&account)))
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.user_id))]
pub async fn http_start_quiz(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
  Path(id): Path<u64>,
) -> ApiResult<Json<ProgressOut>> {
  Ok(Json(start_quiz(&state, &user.user_id, id).await?))
}

#[instrument(level = "info", skip(state, user, body), fields(user_id = %user.user_id, answers = body.answers.len()))]
pub async fn http_submit_quiz(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
  Path(id): Path<u64>,
  Json(body): Json<SubmitIn>,
) -> ApiResult<Json<QuizResultOut>> {
  Ok(Json(submit_quiz(&state, &user.user_id, id, &body.answers).await?))
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.user_id))]
pub async fn http_review_answers(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
  Path(id): Path<u64>,
) -> ApiResult<Json<Vec<UserAnswerOut>>> {
  Ok(Json(review_answers(&state, &user.user_id, id).await?))
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.user_id))]
pub async fn http_progress(State(state): State<Arc<AppState>>, user: AuthUser) -> ApiResult<Json<Vec<ProgressOut>>> {
  Ok(Json(progress_for_user(&state, &user.user_id).await?))
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.user_id))]
pub async fn http_progress_by_language(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
  Query(q): Query<ProgressByLanguageQuery>,
) -> ApiResult<Json<Vec<ProgressOut>>> {
  Ok(Json(progress_by_language(&state, &user.user_id, q.language.as_deref()).await?))
}

#[instrument(level = "info", skip(state, body), fields(transcript_len = body.transcript.len()))]
pub async fn http_post_speech(
  State(state): State<Arc<AppState>>,
  Path(id): Path<u64>,
  Json(body): Json<SpeechIn>,
) -> ApiResult<Json<SpeechMatchOut>> {
  let matched = match_spoken_answer(&state, id, &body.transcript)?;
  info!(target: "speech", question_id = id, selected = matched.selected_option_id, "HTTP spoken answer matched");
  Ok(Json(matched))
}
