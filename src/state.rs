//! Application state: the quiz catalogue and the per-user stores.
//!
//! This module owns:
//!   - languages and quizzes (built once at startup, read-only afterwards)
//!   - a question-id index into the quizzes
//!   - user progress and recorded answers (behind one RwLock)
//!   - registered accounts, keyed by lower-cased email
//!   - the JWT signing secret (JWT_SECRET, or a random one per process)
//!
//! The catalogue comes from QUIZ_CONFIG_PATH (if set) and is completed with the
//! built-in seeds; seeds never replace a (language, level) pair from config.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::auth::User;
use crate::config::{load_quiz_config_from_env, QuizConfig, QuizCfg};
use crate::domain::{Language, Level, Question, QuestionOption, Quiz, UserAnswer, UserProgress};
use crate::seeds::{seed_languages, seed_quizzes};
use crate::util::fill_template;

const DEFAULT_TITLE: &str = "{name} - {level}";
const DEFAULT_DESCRIPTION: &str = "Learn {name} at {level} level";

type UserKey = (String, u64);

#[derive(Debug, Default)]
struct UserStore {
    progress: HashMap<UserKey, UserProgress>,
    answers: HashMap<UserKey, UserAnswer>,
}

pub struct AppState {
    pub languages: Vec<Language>,
    pub quizzes: BTreeMap<u64, Quiz>,
    pub jwt_secret: String,
    question_index: HashMap<u64, u64>,
    store: RwLock<UserStore>,
    users: RwLock<HashMap<String, User>>,
}

#[derive(Default)]
struct IdGen {
    quiz: u64,
    question: u64,
    option: u64,
}

impl AppState {
    /// Build state from env: load config, then fill in seeds.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let mut state = Self::from_config(load_quiz_config_from_env());
        match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => state.jwt_secret = secret,
            _ => {
                warn!(target: "lingo_backend", "JWT_SECRET not set; using a random secret (tokens die with the process).")
            }
        }
        state
    }

    pub fn from_config(cfg: Option<QuizConfig>) -> Self {
        let cfg = cfg.unwrap_or_default();

        let mut languages: Vec<Language> = Vec::new();
        for lc in cfg.languages.into_iter().chain(seed_languages()) {
            if languages.iter().any(|l| l.code == lc.code) {
                continue;
            }
            languages.push(Language {
                id: languages.len() as u64 + 1,
                name: lc.name,
                code: lc.code,
                flag_emoji: lc.flag_emoji,
            });
        }

        let mut ids = IdGen::default();
        let mut quizzes = BTreeMap::new();
        let mut taken: HashSet<(String, Level)> = HashSet::new();
        let mut question_index = HashMap::new();

        for qc in cfg.quizzes.into_iter().chain(seed_quizzes()) {
            let Some(lang) = languages.iter().find(|l| l.code == qc.language) else {
                error!(target: "quiz", language = %qc.language, "Skipping quiz: unknown language code.");
                continue;
            };
            if !taken.insert((qc.language.clone(), qc.level)) {
                warn!(target: "quiz", language = %qc.language, level = qc.level.as_str(), "Skipping duplicate quiz for language/level.");
                continue;
            }
            let quiz = build_quiz(qc, lang, &mut ids);
            for q in &quiz.questions {
                question_index.insert(q.id, quiz.id);
            }
            quizzes.insert(quiz.id, quiz);
        }

        for lang in &languages {
            let count = quizzes.values().filter(|q| q.language == lang.code).count();
            info!(target: "quiz", code = %lang.code, quizzes = count, "Startup quiz inventory");
        }

        Self {
            languages,
            quizzes,
            jwt_secret: Uuid::new_v4().to_string(),
            question_index,
            store: RwLock::new(UserStore::default()),
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new account. Returns None when the email is already taken.
    #[instrument(level = "debug", skip(self, user), fields(email = %user.email))]
    pub async fn insert_user(&self, user: User) -> Option<User> {
        let mut users = self.users.write().await;
        let key = user.email.to_lowercase();
        if users.contains_key(&key) {
            return None;
        }
        users.insert(key, user.clone());
        Some(user)
    }

    pub async fn user_by_email(&self, email: &str) -> Option<User> {
        self.users.read().await.get(&email.to_lowercase()).cloned()
    }

    pub async fn user_by_id(&self, id: &str) -> Option<User> {
        self.users.read().await.values().find(|u| u.id == id).cloned()
    }

    pub fn language(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.code == code)
    }

    /// Quizzes filtered by language code and/or level, in id order.
    pub fn list_quizzes(&self, language: Option<&str>, level: Option<Level>) -> Vec<&Quiz> {
        self.quizzes
            .values()
            .filter(|q| language.map_or(true, |code| q.language == code))
            .filter(|q| level.map_or(true, |lv| q.level == lv))
            .collect()
    }

    pub fn get_quiz(&self, id: u64) -> Option<&Quiz> {
        self.quizzes.get(&id)
    }

    pub fn get_question(&self, id: u64) -> Option<&Question> {
        let quiz = self.quizzes.get(self.question_index.get(&id)?)?;
        quiz.questions.iter().find(|q| q.id == id)
    }

    /// Get-or-create progress; retaking a completed quiz resets it.
    #[instrument(level = "debug", skip(self))]
    pub async fn start_progress(&self, user_id: &str, quiz_id: u64) -> UserProgress {
        let mut store = self.store.write().await;
        let progress = store
            .progress
            .entry((user_id.to_string(), quiz_id))
            .or_insert_with(|| new_progress(user_id, quiz_id));
        if progress.completed {
            progress.score = 0.0;
            progress.completed = false;
        }
        progress.last_attempted = Utc::now();
        progress.clone()
    }

    /// Replace the user's answers for `quiz` and mark the quiz completed with `score`.
    #[instrument(level = "debug", skip(self, quiz, answers), fields(quiz_id = quiz.id, answers = answers.len()))]
    pub async fn record_submission(
        &self,
        user_id: &str,
        quiz: &Quiz,
        answers: Vec<UserAnswer>,
        score: f32,
    ) -> UserProgress {
        let mut store = self.store.write().await;
        for q in &quiz.questions {
            store.answers.remove(&(user_id.to_string(), q.id));
        }
        for a in answers {
            store.answers.insert((user_id.to_string(), a.question_id), a);
        }

        let progress = store
            .progress
            .entry((user_id.to_string(), quiz.id))
            .or_insert_with(|| new_progress(user_id, quiz.id));
        progress.score = score;
        progress.completed = true;
        progress.last_attempted = Utc::now();
        progress.clone()
    }

    pub async fn progress_for_user(&self, user_id: &str) -> Vec<UserProgress> {
        let store = self.store.read().await;
        let mut out: Vec<UserProgress> = store
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|p| p.quiz_id);
        out
    }

    pub async fn progress_by_language(&self, user_id: &str, code: &str) -> Vec<UserProgress> {
        self.progress_for_user(user_id)
            .await
            .into_iter()
            .filter(|p| self.get_quiz(p.quiz_id).is_some_and(|q| q.language == code))
            .collect()
    }

    /// Recorded answers of one user for one quiz, in question order.
    pub async fn answers_for(&self, user_id: &str, quiz: &Quiz) -> Vec<UserAnswer> {
        let store = self.store.read().await;
        quiz.questions
            .iter()
            .filter_map(|q| store.answers.get(&(user_id.to_string(), q.id)).cloned())
            .collect()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(None)
    }
}

fn new_progress(user_id: &str, quiz_id: u64) -> UserProgress {
    UserProgress {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        quiz_id,
        score: 0.0,
        completed: false,
        last_attempted: Utc::now(),
    }
}

fn build_quiz(qc: QuizCfg, lang: &Language, ids: &mut IdGen) -> Quiz {
    ids.quiz += 1;
    let quiz_id = ids.quiz;
    let pairs = [("name", lang.name.as_str()), ("level", qc.level.title())];

    let questions = qc
        .questions
        .into_iter()
        .map(|qq| {
            ids.question += 1;
            let options = qq
                .options
                .into_iter()
                .map(|text| {
                    ids.option += 1;
                    QuestionOption {
                        id: ids.option,
                        is_correct: text == qq.correct_answer,
                        text,
                    }
                })
                .collect();
            Question {
                id: ids.question,
                quiz_id,
                text: qq.text,
                question_type: qq.question_type,
                correct_answer: qq.correct_answer,
                audio_url: qq.audio_url,
                options,
            }
        })
        .collect();

    Quiz {
        id: quiz_id,
        language: lang.code.clone(),
        level: qc.level,
        title: qc.title.unwrap_or_else(|| fill_template(DEFAULT_TITLE, &pairs)),
        description: qc
            .description
            .unwrap_or_else(|| fill_template(DEFAULT_DESCRIPTION, &pairs)),
        questions,
    }
}
