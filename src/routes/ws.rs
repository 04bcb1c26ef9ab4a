//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.
//!
//! The upgrade is authenticated (`?token=` or a bearer header); every message on
//! the socket then acts as that user.
//!
//! Every connection owns one `SpeechSession`: the browser streams recognition
//! results, and only the final one is matched against the question options.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    Query, State, WebSocketUpgrade,
  },
  http::HeaderMap,
  response::Response,
};
use tracing::{debug, error, info, instrument, warn};

use crate::auth::{bearer_token, user_from_token, AuthUser};
use crate::domain::QuestionType;
use crate::error::{ApiError, ApiResult};
use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage, WsAuthQuery};
use crate::speech::{CaptureEvent, SpeechSession};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state, q, headers))]
pub async fn ws_upgrade(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
  Query(q): Query<WsAuthQuery>,
  headers: HeaderMap,
) -> ApiResult<Response> {
  info!(target: "lingo_backend", "WebSocket upgrade requested");
  let token = q
    .token
    .as_deref()
    .or_else(|| bearer_token(&headers))
    .ok_or_else(|| ApiError::Unauthorized("Authentication credentials were not provided".into()))?;
  let user = user_from_token(&state, token).await?;
  Ok(ws.on_upgrade(move |socket| handle_ws(socket, state, user)))
}

#[instrument(level = "info", skip(socket, state, user), fields(user_id = %user.user_id))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, user: AuthUser) {
  info!(target: "lingo_backend", "WebSocket connected");
  let mut session = SpeechSession::new();

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "lingo_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &user, &mut session).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "lingo_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }

  if session.is_active() {
    session.abort();
    debug!(target: "speech", "Recording session aborted on disconnect");
  }
  info!(target: "lingo_backend", "WebSocket disconnected");
}

fn error_reply(e: ApiError) -> ServerWsMessage {
  warn!(target: "lingo_backend", error = %e, "WS request failed");
  ServerWsMessage::Error { message: e.to_string() }
}

#[instrument(level = "info", skip(state, user, session), fields(user_id = %user.user_id))]
pub async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &AppState,
  user: &AuthUser,
  session: &mut SpeechSession,
) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartQuiz { quiz_id } => match start_quiz(state, &user.user_id, quiz_id).await {
      Ok(progress) => ServerWsMessage::Progress { progress },
      Err(e) => error_reply(e),
    },

    ClientWsMessage::SubmitQuiz { quiz_id, answers } => {
      match submit_quiz(state, &user.user_id, quiz_id, &answers).await {
        Ok(result) => ServerWsMessage::QuizResult { result },
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::SpeechStart { question_id } => {
      let Some(question) = state.get_question(question_id) else {
        return error_reply(ApiError::NotFound(format!("Unknown question: {}", question_id)));
      };
      if question.question_type != QuestionType::Speech {
        return error_reply(ApiError::BadRequest(format!(
          "Question {} does not accept spoken answers",
          question_id
        )));
      }
      session.start(question_id);
      debug!(target: "speech", question_id, "Recording session started");
      ServerWsMessage::SpeechListening { question_id }
    }

    ClientWsMessage::SpeechResult { text, is_final } => match session.push_result(&text, is_final) {
      Ok(CaptureEvent::Interim(text)) => ServerWsMessage::SpeechInterim { text },
      Ok(CaptureEvent::Final(fin)) => match match_spoken_answer(state, fin.question_id, &fin.text) {
        Ok(matched) => {
          info!(target: "speech", question_id = fin.question_id, selected = matched.selected_option_id, "WS spoken answer matched");
          ServerWsMessage::SpeechMatch { matched }
        }
        Err(e) => error_reply(e),
      },
      Err(e) => error_reply(e.into()),
    },

    ClientWsMessage::SpeechStop => match (session.stop(), session.question_id()) {
      (true, Some(question_id)) => {
        debug!(target: "speech", question_id, "Recording stop requested; awaiting final result");
        ServerWsMessage::SpeechStopping { question_id }
      }
      _ => ServerWsMessage::SpeechEnded,
    },

    ClientWsMessage::SpeechEnd => {
      session.end();
      ServerWsMessage::SpeechEnded
    }

    ClientWsMessage::SpeechAbort => {
      session.abort();
      debug!(target: "speech", "Recording session aborted");
      ServerWsMessage::SpeechEnded
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Level;

  fn ana() -> AuthUser {
    AuthUser { user_id: "ana".into(), email: "ana@example.com".into() }
  }

  fn speech_question(state: &AppState) -> (u64, String) {
    let quiz = state.list_quizzes(Some("it"), Some(Level::Intermediate))[0];
    let q = quiz.questions.iter().find(|q| q.question_type == QuestionType::Speech).unwrap();
    let correct = q.options.iter().find(|o| o.is_correct).unwrap();
    (q.id, correct.text.clone())
  }

  async fn send(msg: ClientWsMessage, state: &AppState, session: &mut SpeechSession) -> ServerWsMessage {
    handle_client_ws(msg, state, &ana(), session).await
  }

  #[tokio::test]
  async fn interim_then_final_yields_one_match() {
    let state = AppState::default();
    let mut session = SpeechSession::new();
    let (qid, text) = speech_question(&state);

    let r = send(ClientWsMessage::SpeechStart { question_id: qid }, &state, &mut session).await;
    assert!(matches!(r, ServerWsMessage::SpeechListening { question_id } if question_id == qid));

    let r = send(ClientWsMessage::SpeechResult { text: "come".into(), is_final: false }, &state, &mut session).await;
    assert!(matches!(r, ServerWsMessage::SpeechInterim { .. }));

    let r = send(ClientWsMessage::SpeechResult { text: text.to_lowercase(), is_final: true }, &state, &mut session).await;
    match r {
      ServerWsMessage::SpeechMatch { matched } => assert_eq!(matched.similarity, 1.0),
      other => panic!("unexpected reply: {:?}", other),
    }

    let r = send(ClientWsMessage::SpeechResult { text, is_final: true }, &state, &mut session).await;
    assert!(matches!(r, ServerWsMessage::Error { .. }));
  }

  #[tokio::test]
  async fn aborted_session_is_not_scored() {
    let state = AppState::default();
    let mut session = SpeechSession::new();
    let (qid, text) = speech_question(&state);

    send(ClientWsMessage::SpeechStart { question_id: qid }, &state, &mut session).await;
    let r = send(ClientWsMessage::SpeechAbort, &state, &mut session).await;
    assert!(matches!(r, ServerWsMessage::SpeechEnded));
    let r = send(ClientWsMessage::SpeechResult { text, is_final: true }, &state, &mut session).await;
    assert!(matches!(r, ServerWsMessage::Error { .. }));
  }

  #[tokio::test]
  async fn stop_waits_for_final_but_end_discards_it() {
    let state = AppState::default();
    let mut session = SpeechSession::new();
    let (qid, text) = speech_question(&state);

    send(ClientWsMessage::SpeechStart { question_id: qid }, &state, &mut session).await;
    let r = send(ClientWsMessage::SpeechStop, &state, &mut session).await;
    assert!(matches!(r, ServerWsMessage::SpeechStopping { question_id } if question_id == qid));

    let r = send(ClientWsMessage::SpeechEnd, &state, &mut session).await;
    assert!(matches!(r, ServerWsMessage::SpeechEnded));
    let r = send(ClientWsMessage::SpeechResult { text, is_final: true }, &state, &mut session).await;
    assert!(matches!(r, ServerWsMessage::Error { .. }));
  }

  #[tokio::test]
  async fn stop_after_final_reports_ended() {
    let state = AppState::default();
    let mut session = SpeechSession::new();
    let (qid, text) = speech_question(&state);

    let r = send(ClientWsMessage::SpeechStop, &state, &mut session).await;
    assert!(matches!(r, ServerWsMessage::SpeechEnded));

    send(ClientWsMessage::SpeechStart { question_id: qid }, &state, &mut session).await;
    send(ClientWsMessage::SpeechResult { text, is_final: true }, &state, &mut session).await;
    let r = send(ClientWsMessage::SpeechStop, &state, &mut session).await;
    assert!(matches!(r, ServerWsMessage::SpeechEnded));
  }

  #[tokio::test]
  async fn start_for_unknown_question_fails() {
    let state = AppState::default();
    let mut session = SpeechSession::new();
    let r = send(ClientWsMessage::SpeechStart { question_id: 77_777 }, &state, &mut session).await;
    assert!(matches!(r, ServerWsMessage::Error { .. }));
    assert!(!session.is_active());
  }

  #[tokio::test]
  async fn start_for_non_speech_question_fails() {
    let state = AppState::default();
    let mut session = SpeechSession::new();
    let mc = state.list_quizzes(Some("es"), Some(Level::Beginner))[0].questions[0].id;
    let r = send(ClientWsMessage::SpeechStart { question_id: mc }, &state, &mut session).await;
    match r {
      ServerWsMessage::Error { message } => assert!(message.contains("does not accept spoken answers")),
      other => panic!("unexpected reply: {:?}", other),
    }
    assert!(!session.is_active());
  }

  #[tokio::test]
  async fn quiz_messages_act_as_authenticated_user() {
    let state = AppState::default();
    let mut session = SpeechSession::new();
    let r = send(ClientWsMessage::StartQuiz { quiz_id: 1 }, &state, &mut session).await;
    assert!(matches!(r, ServerWsMessage::Progress { .. }));
    assert_eq!(state.progress_for_user("ana").await.len(), 1);
    assert!(state.progress_for_user("ben").await.is_empty());
  }
}
