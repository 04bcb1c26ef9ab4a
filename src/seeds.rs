//! Built-in catalogue: four languages × three levels, so the service is useful
//! without any external config.

use crate::config::{LanguageCfg, QuestionCfg, QuizCfg};
use crate::domain::{Level, QuestionType};

pub fn seed_languages() -> Vec<LanguageCfg> {
  [
    ("Spanish", "es", "🇪🇸"),
    ("French", "fr", "🇫🇷"),
    ("German", "de", "🇩🇪"),
    ("Italian", "it", "🇮🇹"),
  ]
  .into_iter()
  .map(|(name, code, flag)| LanguageCfg { name: name.into(), code: code.into(), flag_emoji: flag.into() })
  .collect()
}

fn q(kind: QuestionType, text: &str, correct: &str, options: &[&str]) -> QuestionCfg {
  QuestionCfg {
    text: text.into(),
    question_type: kind,
    correct_answer: correct.into(),
    audio_url: None,
    options: options.iter().map(|o| o.to_string()).collect(),
  }
}

fn beginner(code: &str) -> Vec<QuestionCfg> {
  use QuestionType::MultipleChoice as Mc;
  match code {
    "es" => vec![
      q(Mc, "How do you say \"hello\" in Spanish?", "Hola", &["Bonjour", "Ciao", "Hola"]),
      q(Mc, "What is \"goodbye\" in Spanish?", "Adiós", &["Au revoir", "Arrivederci", "Adiós"]),
    ],
    "fr" => vec![
      q(Mc, "How do you say \"hello\" in French?", "Bonjour", &["Hola", "Ciao", "Bonjour"]),
      q(Mc, "What is \"goodbye\" in French?", "Au revoir", &["Adiós", "Arrivederci", "Au revoir"]),
    ],
    "de" => vec![
      q(Mc, "How do you say \"hello\" in German?", "Hallo", &["Bonjour", "Ciao", "Hallo"]),
      q(Mc, "What is \"goodbye\" in German?", "Auf Wiedersehen", &["Au revoir", "Arrivederci", "Auf Wiedersehen"]),
    ],
    "it" => vec![
      q(Mc, "How do you say \"hello\" in Italian?", "Ciao", &["Bonjour", "Hola", "Ciao"]),
      q(Mc, "What is \"goodbye\" in Italian?", "Arrivederci", &["Au revoir", "Adiós", "Arrivederci"]),
    ],
    _ => Vec::new(),
  }
}

fn intermediate(code: &str) -> Vec<QuestionCfg> {
  use QuestionType::{Speech, Tts};
  let confident = |text: &str| q(Tts, text, "confident", &[]);
  match code {
    "es" => vec![
      q(Speech, "Listen and repeat: \"¿Cómo estás?\"", "¿Cómo estás?", &["Muy bien", "Regular", "Mal", "¿Cómo estás?"]),
      q(Speech, "Practice saying: \"Mucho gusto\"", "Mucho gusto", &["Mucho gusto", "Buenos días", "Gracias"]),
      confident("¿Qué hora es?"),
    ],
    "fr" => vec![
      q(Speech, "Listen and repeat: \"Comment allez-vous?\"", "Comment allez-vous?", &["Très bien", "Comme ci comme ça", "Comment allez-vous?"]),
      q(Speech, "Practice saying: \"Enchanté\"", "Enchanté", &["Enchanté", "Bonjour", "Merci"]),
      confident("Quelle heure est-il?"),
    ],
    "de" => vec![
      q(Speech, "Listen and repeat: \"Wie geht es dir?\"", "Wie geht es dir?", &["Sehr gut", "Es geht", "Wie geht es dir?"]),
      q(Speech, "Practice saying: \"Freut mich\"", "Freut mich", &["Freut mich", "Guten Morgen", "Danke"]),
      confident("Wie spät ist es?"),
    ],
    "it" => vec![
      q(Speech, "Listen and repeat: \"Come stai?\"", "Come stai?", &["Molto bene", "Così così", "Come stai?"]),
      q(Speech, "Practice saying: \"Piacere\"", "Piacere", &["Piacere", "Buongiorno", "Grazie"]),
      confident("Che ore sono?"),
    ],
    _ => Vec::new(),
  }
}

fn expert(code: &str) -> Vec<QuestionCfg> {
  use QuestionType::Translation as Tr;
  match code {
    "es" => vec![
      q(Tr, "Translate: \"I would like to practice my Spanish\"", "Me gustaría practicar mi español",
        &["Me gusta español", "Quiero hablar español", "Me gustaría practicar mi español"]),
      q(Tr, "What is the correct way to say \"I have been learning Spanish for two years\"?",
        "He estado aprendiendo español durante dos años",
        &["Estoy aprendiendo español por dos años", "Aprendo español desde dos años", "He estado aprendiendo español durante dos años"]),
    ],
    "fr" => vec![
      q(Tr, "Translate: \"I would like to practice my French\"", "Je voudrais pratiquer mon français",
        &["Je veux français", "Je parle français", "Je voudrais pratiquer mon français"]),
      q(Tr, "What is the correct way to say \"I have been learning French for two years\"?",
        "J'apprends le français depuis deux ans",
        &["Je suis apprendre français pour deux ans", "Je parle français pour deux ans", "J'apprends le français depuis deux ans"]),
    ],
    "de" => vec![
      q(Tr, "Translate: \"I would like to practice my German\"", "Ich möchte mein Deutsch üben",
        &["Ich mag Deutsch", "Ich spreche Deutsch", "Ich möchte mein Deutsch üben"]),
      q(Tr, "What is the correct way to say \"I have been learning German for two years\"?",
        "Ich lerne seit zwei Jahren Deutsch",
        &["Ich lerne Deutsch für zwei Jahre", "Ich spreche Deutsch seit zwei Jahre", "Ich lerne seit zwei Jahren Deutsch"]),
    ],
    "it" => vec![
      q(Tr, "Translate: \"I would like to practice my Italian\"", "Vorrei praticare il mio italiano",
        &["Mi piace italiano", "Parlo italiano", "Vorrei praticare il mio italiano"]),
      q(Tr, "What is the correct way to say \"I have been learning Italian for two years\"?",
        "Studio italiano da due anni",
        &["Studio italiano per due anni", "Parlo italiano da due anni", "Studio italiano da due anni"]),
    ],
    _ => Vec::new(),
  }
}

/// One quiz per (language, level). Titles/descriptions are filled from defaults.
pub fn seed_quizzes() -> Vec<QuizCfg> {
  let mut out = Vec::new();
  for lang in seed_languages() {
    for level in Level::ALL {
      let questions = match level {
        Level::Beginner => beginner(&lang.code),
        Level::Intermediate => intermediate(&lang.code),
        Level::Expert => expert(&lang.code),
      };
      out.push(QuizCfg { language: lang.code.clone(), level, title: None, description: None, questions });
    }
  }
  out
}
