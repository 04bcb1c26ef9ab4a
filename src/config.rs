//! Loading the quiz catalogue (languages + quizzes) from TOML.
//!
//! Schema:
//!
//! ```toml
//! [[languages]]
//! name = "Portuguese"
//! code = "pt"
//! flag_emoji = "🇵🇹"
//!
//! [[quizzes]]
//! language = "pt"
//! level = "beginner"
//! # title / description default to "Portuguese - Beginner" / "Learn Portuguese at Beginner level"
//!
//! [[quizzes.questions]]
//! text = 'How do you say "hello" in Portuguese?'
//! question_type = "multiple_choice"
//! correct_answer = "Olá"
//! options = ["Hola", "Ciao", "Olá"]
//! ```
//!
//! An option is correct when its text equals `correct_answer`.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{Level, QuestionType};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub languages: Vec<LanguageCfg>,
  #[serde(default)]
  pub quizzes: Vec<QuizCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LanguageCfg {
  pub name: String,
  pub code: String,
  #[serde(default)]
  pub flag_emoji: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuizCfg {
  pub language: String,
  pub level: Level,
  #[serde(default)] pub title: Option<String>,
  #[serde(default)] pub description: Option<String>,
  #[serde(default)] pub questions: Vec<QuestionCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  pub text: String,
  pub question_type: QuestionType,
  pub correct_answer: String,
  #[serde(default)] pub audio_url: Option<String>,
  #[serde(default)] pub options: Vec<String>,
}

pub fn parse_quiz_config(s: &str) -> Result<QuizConfig, toml::de::Error> {
  toml::from_str::<QuizConfig>(s)
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_quiz_config_from_env() -> Option<QuizConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_quiz_config(&s) {
      Ok(cfg) => {
        info!(target: "lingo_backend", %path, languages = cfg.languages.len(), quizzes = cfg.quizzes.len(), "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lingo_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lingo_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
