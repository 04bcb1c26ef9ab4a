//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Starting a quiz (progress get-or-create / reset)
//!   - Grading a submission and recording answers
//!   - Matching a spoken transcript to the closest option of a speech question
//!   - Progress and answer-review lookups
//!   - Account signup and login (token issue)

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::{create_token, User};
use crate::domain::{Question, QuestionType, Quiz, UserAnswer};
use crate::error::{ApiError, ApiResult};
use crate::protocol::{
  progress_out, AnswerIn, AuthOut, LoginIn, ProgressOut, QuizResultOut, SignupIn, SpeechMatchOut, UserAnswerOut,
  UserOut,
};
use crate::similarity::SimilarityScorer;
use crate::state::AppState;
use crate::util::trunc_for_log;

fn require_quiz(state: &AppState, quiz_id: u64) -> ApiResult<&Quiz> {
  state
    .get_quiz(quiz_id)
    .ok_or_else(|| ApiError::NotFound(format!("Unknown quiz: {}", quiz_id)))
}

fn require_user(user_id: &str) -> ApiResult<&str> {
  let user = user_id.trim();
  if user.is_empty() {
    return Err(ApiError::BadRequest("user id is required".into()));
  }
  Ok(user)
}

const MIN_PASSWORD_LEN: usize = 8;

fn issue_token(state: &AppState, user: &User) -> ApiResult<AuthOut> {
  let access = create_token(&state.jwt_secret, user).map_err(|e| {
    error!(target: "lingo_backend", error = %e, "Token encoding failed");
    ApiError::Internal("Could not issue token".into())
  })?;
  Ok(AuthOut { user: UserOut::from(user), access })
}

/// Register an account and log it in. Emails are unique ignoring case.
#[instrument(level = "info", skip(state, body), fields(email = %body.email))]
pub async fn signup(state: &AppState, body: &SignupIn) -> ApiResult<AuthOut> {
  let email = body.email.trim();
  if email.is_empty() || !email.contains('@') {
    return Err(ApiError::BadRequest("Enter a valid email address.".into()));
  }
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "Password must be at least {} characters.",
      MIN_PASSWORD_LEN
    )));
  }

  let user = state
    .insert_user(User::new(email, body.full_name.trim(), &body.password))
    .await
    .ok_or_else(|| ApiError::BadRequest("A user with this email already exists.".into()))?;
  info!(target: "lingo_backend", user = %user.id, "Account created");
  issue_token(state, &user)
}

#[instrument(level = "info", skip(state, body), fields(email = %body.email))]
pub async fn login(state: &AppState, body: &LoginIn) -> ApiResult<AuthOut> {
  let email = body.email.trim();
  if email.is_empty() || body.password.is_empty() {
    return Err(ApiError::BadRequest("Please provide both email and password".into()));
  }
  match state.user_by_email(email).await {
    Some(user) if user.verify_password(&body.password) => {
      info!(target: "lingo_backend", user = %user.id, "Login succeeded");
      issue_token(state, &user)
    }
    _ => {
      warn!(target: "lingo_backend", "Login rejected");
      Err(ApiError::Unauthorized("Invalid credentials".into()))
    }
  }
}

#[instrument(level = "info", skip(state), fields(%user_id, %quiz_id))]
pub async fn start_quiz(state: &AppState, user_id: &str, quiz_id: u64) -> ApiResult<ProgressOut> {
  let user = require_user(user_id)?;
  let quiz = require_quiz(state, quiz_id)?;
  let progress = state.start_progress(user, quiz.id).await;
  info!(target: "quiz", user = %user, quiz_id, "Quiz started");
  Ok(progress_out(&progress, Some(quiz)))
}

/// Grade `answers` against `quiz` without touching any store.
///
/// Each answer must name a question of this quiz (at most once). TTS questions
/// are correct when the user is confident; every other type needs an option
/// that belongs to the question.
pub fn grade_answers(
  state: &AppState,
  quiz: &Quiz,
  user_id: &str,
  answers: &[AnswerIn],
) -> ApiResult<(Vec<UserAnswer>, QuizResultOut)> {
  let mut graded: Vec<UserAnswer> = Vec::with_capacity(answers.len());

  for a in answers {
    let question = state
      .get_question(a.question_id)
      .ok_or_else(|| ApiError::NotFound(format!("Unknown question: {}", a.question_id)))?;
    if question.quiz_id != quiz.id {
      return Err(ApiError::BadRequest(format!(
        "Question {} does not belong to quiz {}",
        question.id, quiz.id
      )));
    }
    if graded.iter().any(|g| g.question_id == question.id) {
      return Err(ApiError::BadRequest(format!("Question {} answered twice", question.id)));
    }

    let (selected_option_id, is_correct) = grade_one(question, a)?;
    graded.push(UserAnswer {
      user_id: user_id.to_string(),
      question_id: question.id,
      selected_option_id,
      is_correct,
      created_at: Utc::now(),
    });
  }

  let total_questions = graded.len();
  let correct_answers = graded.iter().filter(|g| g.is_correct).count();
  let score_percentage = if total_questions > 0 {
    correct_answers as f32 / total_questions as f32 * 100.0
  } else {
    0.0
  };

  Ok((graded, QuizResultOut { total_questions, correct_answers, score_percentage, completed: true }))
}

fn grade_one(question: &Question, answer: &AnswerIn) -> ApiResult<(Option<u64>, bool)> {
  if question.question_type == QuestionType::Tts {
    return Ok((None, answer.confident));
  }
  let option_id = answer.selected_option_id.ok_or_else(|| {
    ApiError::BadRequest(format!("Question {} needs a selectedOptionId", question.id))
  })?;
  let option = question.option(option_id).ok_or_else(|| {
    ApiError::BadRequest(format!("Option {} does not belong to question {}", option_id, question.id))
  })?;
  Ok((Some(option.id), option.is_correct))
}

#[instrument(level = "info", skip(state, answers), fields(%user_id, %quiz_id, answers = answers.len()))]
pub async fn submit_quiz(
  state: &AppState,
  user_id: &str,
  quiz_id: u64,
  answers: &[AnswerIn],
) -> ApiResult<QuizResultOut> {
  let user = require_user(user_id)?;
  let quiz = require_quiz(state, quiz_id)?;
  let (graded, result) = grade_answers(state, quiz, user, answers)?;
  state.record_submission(user, quiz, graded, result.score_percentage).await;
  info!(
    target: "quiz",
    user = %user,
    quiz_id,
    correct = result.correct_answers,
    total = result.total_questions,
    score = %format!("{:.1}", result.score_percentage),
    "Quiz submitted"
  );
  Ok(result)
}

/// Map a final transcript to the closest option of a speech question.
#[instrument(level = "info", skip(state, transcript), fields(%question_id, transcript_len = transcript.len()))]
pub fn match_spoken_answer(state: &AppState, question_id: u64, transcript: &str) -> ApiResult<SpeechMatchOut> {
  let question = state
    .get_question(question_id)
    .ok_or_else(|| ApiError::NotFound(format!("Unknown question: {}", question_id)))?;
  if question.question_type != QuestionType::Speech {
    return Err(ApiError::BadRequest(format!(
      "Question {} does not accept spoken answers",
      question_id
    )));
  }

  let candidates = question.candidates();
  let best = SimilarityScorer::new().best_match(transcript, &candidates)?;
  debug!(
    target: "speech",
    question_id,
    transcript = %trunc_for_log(transcript, 80),
    selected = best.candidate.id,
    similarity = best.similarity,
    "Spoken answer matched"
  );

  Ok(SpeechMatchOut {
    question_id,
    selected_option_id: best.candidate.id,
    similarity: best.similarity,
    transcript: transcript.to_string(),
  })
}

pub async fn progress_for_user(state: &AppState, user_id: &str) -> ApiResult<Vec<ProgressOut>> {
  let user = require_user(user_id)?;
  Ok(state
    .progress_for_user(user)
    .await
    .iter()
    .map(|p| progress_out(p, state.get_quiz(p.quiz_id)))
    .collect())
}

pub async fn progress_by_language(
  state: &AppState,
  user_id: &str,
  language: Option<&str>,
) -> ApiResult<Vec<ProgressOut>> {
  let user = require_user(user_id)?;
  let code = match language.map(str::trim) {
    Some(c) if !c.is_empty() => c,
    _ => return Err(ApiError::BadRequest("Language parameter is required".into())),
  };
  Ok(state
    .progress_by_language(user, code)
    .await
    .iter()
    .map(|p| progress_out(p, state.get_quiz(p.quiz_id)))
    .collect())
}

pub async fn review_answers(state: &AppState, user_id: &str, quiz_id: u64) -> ApiResult<Vec<UserAnswerOut>> {
  let user = require_user(user_id)?;
  let quiz = require_quiz(state, quiz_id)?;
  Ok(state.answers_for(user, quiz).await.iter().map(UserAnswerOut::from).collect())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::parse_quiz_config;
  use crate::auth::{create_token, User};
use crate::domain::Level;
  use crate::similarity::MatchError;

  fn answer(question_id: u64, option: Option<u64>) -> AnswerIn {
    AnswerIn { question_id, selected_option_id: option, confident: false }
  }

  fn correct_option(q: &Question) -> u64 {
    q.options.iter().find(|o| o.is_correct).unwrap().id
  }

  fn wrong_option(q: &Question) -> u64 {
    q.options.iter().find(|o| !o.is_correct).unwrap().id
  }

  #[tokio::test]
  async fn submission_scores_percentage_and_completes() {
    let state = AppState::default();
    let quiz = state.list_quizzes(Some("es"), Some(Level::Beginner))[0].clone();
    let q1 = &quiz.questions[0];
    let q2 = &quiz.questions[1];

    let result = submit_quiz(
      &state,
      "ana",
      quiz.id,
      &[answer(q1.id, Some(correct_option(q1))), answer(q2.id, Some(wrong_option(q2)))],
    )
    .await
    .unwrap();

    assert_eq!(result, QuizResultOut { total_questions: 2, correct_answers: 1, score_percentage: 50.0, completed: true });
    let progress = state.progress_for_user("ana").await;
    assert_eq!(progress.len(), 1);
    assert!(progress[0].completed);
    assert_eq!(progress[0].score, 50.0);
  }

  #[tokio::test]
  async fn resubmission_replaces_previous_answers() {
    let state = AppState::default();
    let quiz = state.list_quizzes(Some("it"), Some(Level::Expert))[0].clone();
    let q1 = &quiz.questions[0];
    let q2 = &quiz.questions[1];

    submit_quiz(&state, "ana", quiz.id, &[answer(q1.id, Some(wrong_option(q1))), answer(q2.id, Some(wrong_option(q2)))])
      .await
      .unwrap();
    submit_quiz(&state, "ana", quiz.id, &[answer(q1.id, Some(correct_option(q1)))]).await.unwrap();

    let review = review_answers(&state, "ana", quiz.id).await.unwrap();
    assert_eq!(review.len(), 1);
    assert!(review[0].is_correct);
  }

  #[tokio::test]
  async fn empty_submission_scores_zero() {
    let state = AppState::default();
    let result = submit_quiz(&state, "ana", 1, &[]).await.unwrap();
    assert_eq!(result.total_questions, 0);
    assert_eq!(result.score_percentage, 0.0);
  }

  #[test]
  fn tts_questions_follow_confidence() {
    let state = AppState::default();
    let quiz = state.list_quizzes(Some("de"), Some(Level::Intermediate))[0];
    let tts = quiz.questions.iter().find(|q| q.question_type == QuestionType::Tts).unwrap();

    let sure = AnswerIn { question_id: tts.id, selected_option_id: None, confident: true };
    let unsure = AnswerIn { question_id: tts.id, selected_option_id: None, confident: false };
    let (_, r) = grade_answers(&state, quiz, "ana", &[sure]).unwrap();
    assert_eq!(r.correct_answers, 1);
    let (_, r) = grade_answers(&state, quiz, "ana", &[unsure]).unwrap();
    assert_eq!(r.correct_answers, 0);
  }

  #[test]
  fn rejects_foreign_question_and_option() {
    let state = AppState::default();
    let es = state.list_quizzes(Some("es"), Some(Level::Beginner))[0];
    let fr = state.list_quizzes(Some("fr"), Some(Level::Beginner))[0];

    let foreign_q = answer(fr.questions[0].id, Some(fr.questions[0].options[0].id));
    assert!(matches!(grade_answers(&state, es, "ana", &[foreign_q]), Err(ApiError::BadRequest(_))));

    let foreign_opt = answer(es.questions[0].id, Some(fr.questions[0].options[0].id));
    assert!(matches!(grade_answers(&state, es, "ana", &[foreign_opt]), Err(ApiError::BadRequest(_))));

    let missing = answer(es.questions[0].id, None);
    assert!(matches!(grade_answers(&state, es, "ana", &[missing]), Err(ApiError::BadRequest(_))));

    let unknown = answer(99_999, Some(1));
    assert!(matches!(grade_answers(&state, es, "ana", &[unknown]), Err(ApiError::NotFound(_))));
  }

  #[test]
  fn duplicate_answers_are_rejected() {
    let state = AppState::default();
    let es = state.list_quizzes(Some("es"), Some(Level::Beginner))[0];
    let q = &es.questions[0];
    let dup = [answer(q.id, Some(correct_option(q))), answer(q.id, Some(correct_option(q)))];
    assert!(matches!(grade_answers(&state, es, "ana", &dup), Err(ApiError::BadRequest(_))));
  }

  #[tokio::test]
  async fn unknown_quiz_and_blank_user() {
    let state = AppState::default();
    assert!(matches!(start_quiz(&state, "ana", 4242).await, Err(ApiError::NotFound(_))));
    assert!(matches!(start_quiz(&state, "  ", 1).await, Err(ApiError::BadRequest(_))));
  }

  #[test]
  fn spoken_answer_picks_closest_option() {
    let state = AppState::default();
    let quiz = state.list_quizzes(Some("fr"), Some(Level::Intermediate))[0];
    let q = quiz.questions.iter().find(|q| q.question_type == QuestionType::Speech).unwrap();

    let m = match_spoken_answer(&state, q.id, "comment allez vous").unwrap();
    let picked = q.option(m.selected_option_id).unwrap();
    assert_eq!(picked.text, "Comment allez-vous?");
    assert!(m.similarity > 0.8 && m.similarity < 1.0);
  }

  #[test]
  fn spoken_answer_rejected_for_other_types() {
    let state = AppState::default();
    let quiz = state.list_quizzes(Some("es"), Some(Level::Beginner))[0];
    let err = match_spoken_answer(&state, quiz.questions[0].id, "hola").unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
  }

  #[test]
  fn speech_question_without_options_is_invalid_argument() {
    let cfg = parse_quiz_config(
      r#"
        [[quizzes]]
        language = "es"
        level = "intermediate"

        [[quizzes.questions]]
        text = "Say anything"
        question_type = "speech"
        correct_answer = "Hola"
      "#,
    )
    .unwrap();
    let state = AppState::from_config(Some(cfg));
    let quiz = state.list_quizzes(Some("es"), Some(Level::Intermediate))[0];
    let err = match_spoken_answer(&state, quiz.questions[0].id, "hola").unwrap_err();
    assert!(matches!(err, ApiError::Match(MatchError::InvalidArgument(_))));
  }

  fn signup_body(email: &str, password: &str) -> SignupIn {
    SignupIn { email: email.into(), password: password.into(), full_name: "Ana".into() }
  }

  #[tokio::test]
  async fn signup_then_login_issue_tokens_for_same_user() {
    let state = AppState::default();
    let created = signup(&state, &signup_body("ana@example.com", "secret123")).await.unwrap();
    assert_eq!(created.user.email, "ana@example.com");

    let again = login(&state, &LoginIn { email: "ANA@example.com".into(), password: "secret123".into() })
      .await
      .unwrap();
    assert_eq!(again.user.id, created.user.id);
    let claims = crate::auth::validate_token(&state.jwt_secret, &again.access).unwrap();
    assert_eq!(claims.sub, created.user.id);
  }

  #[tokio::test]
  async fn signup_validates_and_rejects_duplicates() {
    let state = AppState::default();
    assert!(matches!(signup(&state, &signup_body("not-an-email", "secret123")).await, Err(ApiError::BadRequest(_))));
    assert!(matches!(signup(&state, &signup_body("ana@example.com", "short")).await, Err(ApiError::BadRequest(_))));
    signup(&state, &signup_body("ana@example.com", "secret123")).await.unwrap();
    let dup = signup(&state, &signup_body("ana@example.com", "other-secret")).await.unwrap_err();
    assert_eq!(dup.to_string(), "A user with this email already exists.");
  }

  #[tokio::test]
  async fn login_rejects_wrong_password_and_missing_fields() {
    let state = AppState::default();
    signup(&state, &signup_body("ana@example.com", "secret123")).await.unwrap();
    let wrong = LoginIn { email: "ana@example.com".into(), password: "secret124".into() };
    assert!(matches!(login(&state, &wrong).await, Err(ApiError::Unauthorized(_))));
    let unknown = LoginIn { email: "ben@example.com".into(), password: "secret123".into() };
    assert!(matches!(login(&state, &unknown).await, Err(ApiError::Unauthorized(_))));
    let empty = LoginIn { email: "ana@example.com".into(), password: String::new() };
    assert!(matches!(login(&state, &empty).await, Err(ApiError::BadRequest(_))));
  }

  #[tokio::test]
  async fn progress_by_language_requires_language() {
    let state = AppState::default();
    assert!(matches!(progress_by_language(&state, "ana", None).await, Err(ApiError::BadRequest(_))));
    assert!(matches!(progress_by_language(&state, "ana", Some(" ")).await, Err(ApiError::BadRequest(_))));
    assert!(progress_by_language(&state, "ana", Some("es")).await.unwrap().is_empty());
  }
}
