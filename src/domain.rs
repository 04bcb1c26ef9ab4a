//! Domain models: languages, quizzes, questions with options, and per-user progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::similarity::Candidate;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Language {
  pub id: u64,
  pub name: String,
  pub code: String, // "es", "fr", ...
  pub flag_emoji: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Level {
  Beginner,
  Intermediate,
  Expert,
}

impl Level {
  pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Expert];

  pub fn as_str(&self) -> &'static str {
    match self {
      Level::Beginner => "beginner",
      Level::Intermediate => "intermediate",
      Level::Expert => "expert",
    }
  }

  pub fn title(&self) -> &'static str {
    match self {
      Level::Beginner => "Beginner",
      Level::Intermediate => "Intermediate",
      Level::Expert => "Expert",
    }
  }

  pub fn parse(s: &str) -> Option<Level> {
    Level::ALL.into_iter().find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
  }
}

/// How a question is answered.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
  /// Click one option.
  MultipleChoice,
  /// Say the answer; the transcript is matched to the closest option.
  Speech,
  /// Pick the correct translation among options.
  Translation,
  /// Listen to audio, then confirm confidence. No options.
  Tts,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionOption {
  pub id: u64,
  pub text: String,
  #[serde(default)]
  pub is_correct: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
  pub id: u64,
  pub quiz_id: u64,
  pub text: String,
  pub question_type: QuestionType,
  pub correct_answer: String,
  #[serde(default)]
  pub audio_url: Option<String>,
  #[serde(default)]
  pub options: Vec<QuestionOption>,
}

impl Question {
  /// Options as matcher candidates, in display order.
  pub fn candidates(&self) -> Vec<Candidate<u64>> {
    self.options.iter().map(|o| Candidate::new(o.id, o.text.clone())).collect()
  }

  pub fn option(&self, option_id: u64) -> Option<&QuestionOption> {
    self.options.iter().find(|o| o.id == option_id)
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quiz {
  pub id: u64,
  pub language: String, // language code
  pub level: Level,
  pub title: String,
  pub description: String,
  pub questions: Vec<Question>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProgress {
  pub id: String,
  pub user_id: String,
  pub quiz_id: u64,
  pub score: f32,
  pub completed: bool,
  pub last_attempted: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserAnswer {
  pub user_id: String,
  pub question_id: u64,
  pub selected_option_id: Option<u64>,
  pub is_correct: bool,
  pub created_at: DateTime<Utc>,
}
