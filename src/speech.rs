//! Speech capture session for one WebSocket connection.
//!
//! The browser runs recognition and streams its results here. A session is
//! started for one question, may receive any number of interim results, and
//! hands out at most one final transcript. Only that final transcript is ever
//! scored against the question options.
//!
//! Lifecycle:
//!   Idle --start--> Listening --stop--> Stopping
//!   Listening | Stopping --final result--> Finished
//!   any --abort / end--> Idle
//!
//! `stop` only asks the recognizer to finish; a final result that arrives
//! afterwards is still delivered. `abort` discards the session outright.

use thiserror::Error;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CaptureState {
  #[default]
  Idle,
  Listening { question_id: u64, interim: String },
  Stopping { question_id: u64, interim: String },
  Finished { question_id: u64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpeechError {
  #[error("no active recording session")]
  NotListening,
}

/// Transcript delivered once per session, ready for matching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalTranscript {
  pub question_id: u64,
  pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureEvent {
  /// Partial recognition; display only.
  Interim(String),
  Final(FinalTranscript),
}

#[derive(Debug, Default)]
pub struct SpeechSession {
  state: CaptureState,
}

impl SpeechSession {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> &CaptureState {
    &self.state
  }

  pub fn is_active(&self) -> bool {
    matches!(self.state, CaptureState::Listening { .. } | CaptureState::Stopping { .. })
  }

  /// Question of the current or last session, if any.
  pub fn question_id(&self) -> Option<u64> {
    match &self.state {
      CaptureState::Idle => None,
      CaptureState::Listening { question_id, .. }
      | CaptureState::Stopping { question_id, .. }
      | CaptureState::Finished { question_id } => Some(*question_id),
    }
  }

  /// Begin recording for `question_id`. Any previous session is dropped.
  pub fn start(&mut self, question_id: u64) {
    self.state = CaptureState::Listening { question_id, interim: String::new() };
  }

  /// Feed one recognition result. `text` is the full transcript so far.
  pub fn push_result(&mut self, text: &str, is_final: bool) -> Result<CaptureEvent, SpeechError> {
    let question_id = match &mut self.state {
      CaptureState::Listening { question_id, interim } | CaptureState::Stopping { question_id, interim } => {
        if !is_final {
          interim.clear();
          interim.push_str(text);
          return Ok(CaptureEvent::Interim(text.to_string()));
        }
        *question_id
      }
      CaptureState::Idle | CaptureState::Finished { .. } => return Err(SpeechError::NotListening),
    };

    self.state = CaptureState::Finished { question_id };
    Ok(CaptureEvent::Final(FinalTranscript { question_id, text: text.to_string() }))
  }

  /// User pressed stop. Returns false when nothing was recording.
  pub fn stop(&mut self) -> bool {
    match std::mem::take(&mut self.state) {
      CaptureState::Listening { question_id, interim } => {
        self.state = CaptureState::Stopping { question_id, interim };
        true
      }
      other => {
        self.state = other;
        false
      }
    }
  }

  /// Recognizer ended (or errored) without a pending final result.
  pub fn end(&mut self) {
    self.state = CaptureState::Idle;
  }

  pub fn abort(&mut self) {
    self.state = CaptureState::Idle;
  }
}
