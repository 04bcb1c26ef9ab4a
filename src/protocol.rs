//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Inputs use camelCase ids (`quizId`, `questionId`), outputs stay snake_case.
//! The caller's identity always comes from the bearer token, never from a body.
//! Correctness data (`is_correct`, `correct_answer`) never leaves the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::User;
use crate::domain::{Language, Level, Question, QuestionType, Quiz, UserAnswer, UserProgress};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartQuiz {
        #[serde(rename = "quizId")]
        quiz_id: u64,
    },
    SubmitQuiz {
        #[serde(rename = "quizId")]
        quiz_id: u64,
        answers: Vec<AnswerIn>,
    },
    SpeechStart {
        #[serde(rename = "questionId")]
        question_id: u64,
    },
    SpeechResult {
        text: String,
        #[serde(rename = "isFinal", default)]
        is_final: bool,
    },
    SpeechStop,
    SpeechEnd,
    SpeechAbort,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Progress {
        progress: ProgressOut,
    },
    QuizResult {
        result: QuizResultOut,
    },
    SpeechListening {
        question_id: u64,
    },
    SpeechInterim {
        text: String,
    },
    SpeechMatch {
        matched: SpeechMatchOut,
    },
    /// Stop accepted; the final result for `question_id` may still arrive.
    SpeechStopping {
        question_id: u64,
    },
    SpeechEnded,
    Error {
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct LanguageOut {
    pub id: u64,
    pub name: String,
    pub code: String,
    pub flag_emoji: String,
}

impl From<&Language> for LanguageOut {
    fn from(l: &Language) -> Self {
        Self {
            id: l.id,
            name: l.name.clone(),
            code: l.code.clone(),
            flag_emoji: l.flag_emoji.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptionOut {
    pub id: u64,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub id: u64,
    pub text: String,
    pub question_type: QuestionType,
    pub options: Vec<OptionOut>,
    pub audio_url: Option<String>,
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct QuizOut {
    pub id: u64,
    pub language: Option<LanguageOut>,
    pub level: Level,
    pub title: String,
    pub description: String,
    pub questions: Vec<QuestionOut>,
}

#[derive(Debug, Serialize)]
pub struct QuizSummaryOut {
    pub id: u64,
    pub language: String,
    pub level: Level,
    pub title: String,
}

pub fn question_out(q: &Question, language: &str) -> QuestionOut {
    QuestionOut {
        id: q.id,
        text: q.text.clone(),
        question_type: q.question_type,
        options: q
            .options
            .iter()
            .map(|o| OptionOut { id: o.id, text: o.text.clone() })
            .collect(),
        audio_url: q.audio_url.clone(),
        language: language.to_string(),
    }
}

/// Convert a full `Quiz` (internal) to the public DTO.
pub fn quiz_out(quiz: &Quiz, language: Option<&Language>) -> QuizOut {
    QuizOut {
        id: quiz.id,
        language: language.map(LanguageOut::from),
        level: quiz.level,
        title: quiz.title.clone(),
        description: quiz.description.clone(),
        questions: quiz.questions.iter().map(|q| question_out(q, &quiz.language)).collect(),
    }
}

pub fn quiz_summary(quiz: &Quiz) -> QuizSummaryOut {
    QuizSummaryOut {
        id: quiz.id,
        language: quiz.language.clone(),
        level: quiz.level,
        title: quiz.title.clone(),
    }
}

#[derive(Debug, Serialize)]
pub struct ProgressOut {
    pub id: String,
    pub quiz: Option<QuizSummaryOut>,
    pub score: f32,
    pub completed: bool,
    pub last_attempted: DateTime<Utc>,
}

pub fn progress_out(p: &UserProgress, quiz: Option<&Quiz>) -> ProgressOut {
    ProgressOut {
        id: p.id.clone(),
        quiz: quiz.map(quiz_summary),
        score: p.score,
        completed: p.completed,
        last_attempted: p.last_attempted,
    }
}

#[derive(Debug, Serialize)]
pub struct UserAnswerOut {
    pub question_id: u64,
    pub selected_option_id: Option<u64>,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&UserAnswer> for UserAnswerOut {
    fn from(a: &UserAnswer) -> Self {
        Self {
            question_id: a.question_id,
            selected_option_id: a.selected_option_id,
            is_correct: a.is_correct,
            created_at: a.created_at,
        }
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct QuizQuery {
    pub language: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressByLanguageQuery {
    pub language: Option<String>,
}

/// `/ws?token=<jwt>`; browsers cannot set headers on the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: Option<String>,
}

/// One answer in a submission. TTS questions send `confident` instead of an option.
#[derive(Clone, Debug, Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "questionId")]
    pub question_id: u64,
    #[serde(rename = "selectedOptionId", default)]
    pub selected_option_id: Option<u64>,
    #[serde(default)]
    pub confident: bool,
}

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
    pub answers: Vec<AnswerIn>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct QuizResultOut {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub score_percentage: f32,
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct SpeechIn {
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct SpeechMatchOut {
    pub question_id: u64,
    pub selected_option_id: u64,
    pub similarity: f64,
    pub transcript: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupIn {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "fullName", default)]
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginIn {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub date_joined: DateTime<Utc>,
}

impl From<&User> for UserOut {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            email: u.email.clone(),
            full_name: u.full_name.clone(),
            date_joined: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthOut {
    pub user: UserOut,
    pub access: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
