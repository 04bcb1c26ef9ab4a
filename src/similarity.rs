//! Spoken-answer matching: normalized Levenshtein similarity between a speech
//! transcript and the options of a question.
//!
//! Both sides are lower-cased (Unicode case folding, not locale-sensitive) and
//! compared per `char`. The best candidate is picked left to right with a
//! strict `>`, so the first candidate in input order wins every tie.
//!
//! Example:
//!   transcript "helo" vs option "hello" → distance 1, similarity 0.8

use thiserror::Error;

/// One selectable answer: an identifier plus the text the user may speak.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate<I> {
  pub id: I,
  pub text: String,
}

impl<I> Candidate<I> {
  pub fn new(id: I, text: impl Into<String>) -> Self {
    Self { id, text: text.into() }
  }
}

/// Winning candidate and its similarity against the transcript.
#[derive(Debug, PartialEq)]
pub struct Match<'c, I> {
  pub candidate: &'c Candidate<I>,
  pub similarity: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
  #[error("invalid argument: {0}")]
  InvalidArgument(&'static str),
}

/// Levenshtein scorer owning a scratch DP table.
///
/// The table is cleared and resized per comparison, so scoring N candidates
/// allocates at most once per growth instead of once per candidate.
#[derive(Debug, Default)]
pub struct SimilarityScorer {
  table: Vec<usize>,
}

impl SimilarityScorer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Classic `(a+1) × (b+1)` edit distance with unit costs.
  pub fn distance(&mut self, a: &[char], b: &[char]) -> usize {
    let cols = b.len() + 1;
    self.table.clear();
    self.table.resize((a.len() + 1) * cols, 0);
    let dp = &mut self.table;

    for i in 0..=a.len() {
      dp[i * cols] = i;
    }
    for (j, cell) in dp.iter_mut().take(cols).enumerate() {
      *cell = j;
    }

    for i in 1..=a.len() {
      for j in 1..=b.len() {
        let diag = dp[(i - 1) * cols + (j - 1)];
        dp[i * cols + j] = if a[i - 1] == b[j - 1] {
          diag
        } else {
          let up = dp[(i - 1) * cols + j];
          let left = dp[i * cols + (j - 1)];
          1 + up.min(left).min(diag)
        };
      }
    }

    dp[a.len() * cols + b.len()]
  }

  fn similarity_folded(&mut self, a: &[char], b: &[char]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
      return 1.0;
    }
    let dist = self.distance(a, b);
    (max_len - dist) as f64 / max_len as f64
  }

  /// Case-insensitive similarity in `[0, 1]`.
  pub fn score(&mut self, transcript: &str, text: &str) -> f64 {
    let spoken = fold(transcript);
    let option = fold(text);
    self.similarity_folded(&spoken, &option)
  }

  /// Pick the candidate whose text is closest to `transcript`.
  ///
  /// Fails with `InvalidArgument` on an empty candidate list; any transcript,
  /// including the empty string, is accepted.
  pub fn best_match<'c, I>(
    &mut self,
    transcript: &str,
    candidates: &'c [Candidate<I>],
  ) -> Result<Match<'c, I>, MatchError> {
    let (first, rest) = candidates
      .split_first()
      .ok_or(MatchError::InvalidArgument("candidates must not be empty"))?;

    let spoken = fold(transcript);
    let mut best = Match {
      candidate: first,
      similarity: self.similarity_folded(&spoken, &fold(&first.text)),
    };

    for candidate in rest {
      let similarity = self.similarity_folded(&spoken, &fold(&candidate.text));
      if similarity > best.similarity {
        best = Match { candidate, similarity };
      }
    }

    Ok(best)
  }
}

fn fold(s: &str) -> Vec<char> {
  s.to_lowercase().chars().collect()
}

/// Case-sensitive Levenshtein distance between two strings, per `char`.
pub fn edit_distance(a: &str, b: &str) -> usize {
  let a: Vec<char> = a.chars().collect();
  let b: Vec<char> = b.chars().collect();
  SimilarityScorer::new().distance(&a, &b)
}

/// Case-insensitive normalized similarity; both strings empty → 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
  SimilarityScorer::new().score(a, b)
}

/// One-shot convenience over [`SimilarityScorer::best_match`].
pub fn best_match<'c, I>(transcript: &str, candidates: &'c [Candidate<I>]) -> Result<Match<'c, I>, MatchError> {
  SimilarityScorer::new().best_match(transcript, candidates)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn opts(texts: &[&str]) -> Vec<Candidate<u64>> {
    texts
      .iter()
      .enumerate()
      .map(|(i, t)| Candidate::new(i as u64 + 1, *t))
      .collect()
  }

  #[test]
  fn identical_text_ignoring_case_scores_one() {
    assert_eq!(similarity("Bonjour", "bONJOUR"), 1.0);
    assert_eq!(similarity("École", "ÉCOLE"), 1.0);
  }

  #[test]
  fn both_empty_scores_one() {
    assert_eq!(similarity("", ""), 1.0);
  }

  #[test]
  fn empty_against_text_scores_zero() {
    assert_eq!(similarity("", "hola"), 0.0);
    assert_eq!(similarity("hola", ""), 0.0);
  }

  #[test]
  fn distance_classic_cases() {
    assert_eq!(edit_distance("kitten", "sitting"), 3);
    assert_eq!(edit_distance("flaw", "lawn"), 2);
    assert_eq!(edit_distance("", "abc"), 3);
    assert_eq!(edit_distance("abc", "abc"), 0);
  }

  #[test]
  fn distance_counts_chars_not_bytes() {
    assert_eq!(edit_distance("adiós", "adios"), 1);
    assert_eq!(edit_distance("ñ", "n"), 1);
  }

  #[test]
  fn distance_and_similarity_are_symmetric() {
    let pairs = [("gracias", "grazie"), ("merci", "mercy"), ("", "ciao"), ("wie geht", "wie gehts")];
    for (a, b) in pairs {
      assert_eq!(edit_distance(a, b), edit_distance(b, a), "{a} / {b}");
      assert_eq!(similarity(a, b), similarity(b, a), "{a} / {b}");
    }
  }

  #[test]
  fn similarity_stays_in_unit_interval() {
    let words = ["", "a", "hola", "au revoir", "Auf Wiedersehen", "xyz", "ÀÉÎ"];
    for a in words {
      for b in words {
        let s = similarity(a, b);
        assert!((0.0..=1.0).contains(&s), "{a:?} vs {b:?} gave {s}");
      }
    }
  }

  #[test]
  fn helo_matches_hello_at_point_eight() {
    let candidates = opts(&["hello"]);
    let m = best_match("helo", &candidates).unwrap();
    assert_eq!(m.candidate.id, 1);
    assert!((m.similarity - 0.8).abs() < 1e-9);
  }

  #[test]
  fn bonjour_beats_bonsoir() {
    let candidates = opts(&["bonjour", "bonsoir"]);
    let m = best_match("bonjour", &candidates).unwrap();
    assert_eq!(m.candidate.id, 1);
    assert_eq!(m.similarity, 1.0);

    let other = similarity("bonjour", "bonsoir");
    assert!((other - 5.0 / 7.0).abs() < 1e-9);
  }

  #[test]
  fn empty_transcript_tie_goes_to_first() {
    let candidates = opts(&["a", "bb"]);
    let m = best_match("", &candidates).unwrap();
    assert_eq!(m.candidate.id, 1);
    assert_eq!(m.similarity, 0.0);

    let reversed = vec![Candidate::new(2u64, "bb"), Candidate::new(1u64, "a")];
    assert_eq!(best_match("", &reversed).unwrap().candidate.id, 2);
  }

  #[test]
  fn equal_scores_keep_first_occurrence() {
    // "cat" vs "bat" and "cat" vs "car" are both one substitution away.
    let candidates = opts(&["bat", "car"]);
    assert_eq!(best_match("cat", &candidates).unwrap().candidate.id, 1);

    let swapped = vec![Candidate::new(7u64, "car"), Candidate::new(8u64, "bat")];
    assert_eq!(best_match("cat", &swapped).unwrap().candidate.id, 7);
  }

  #[test]
  fn later_strictly_better_candidate_wins() {
    let candidates = opts(&["Bonjour", "Ciao", "Hola"]);
    let m = best_match("ola", &candidates).unwrap();
    assert_eq!(m.candidate.text, "Hola");
  }

  #[test]
  fn empty_candidates_is_invalid_argument() {
    let candidates: Vec<Candidate<u64>> = Vec::new();
    let err = best_match("hola", &candidates).unwrap_err();
    assert!(matches!(err, MatchError::InvalidArgument(_)));
  }

  #[test]
  fn scorer_reuse_gives_same_results() {
    let mut scorer = SimilarityScorer::new();
    let long = scorer.score("he estado aprendiendo español", "he estado aprendiendo espanol");
    let short = scorer.score("si", "no");
    assert_eq!(short, 0.0);
    assert_eq!(long, similarity("he estado aprendiendo español", "he estado aprendiendo espanol"));
    assert_eq!(scorer.score("helo", "hello"), 0.8);
  }
}
