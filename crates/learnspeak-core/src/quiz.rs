//! Quiz grading.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::QuizQuestion;

/// Minimum score (percent) for a quiz attempt to count as completed.
pub const PASS_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswer {
  pub question_id: Uuid,
  pub answer:      String,
}

/// One attempt at a topic's quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmission {
  pub user_id:            Uuid,
  pub topic_id:           Uuid,
  #[serde(default)]
  pub journey_id:         Option<Uuid>,
  #[serde(default)]
  pub time_spent_seconds: u32,
  pub answers:            Vec<QuizAnswer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
  pub question_id:    Uuid,
  pub user_answer:    String,
  pub correct_answer: String,
  pub is_correct:     bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
  pub topic_id:      Uuid,
  pub score:         f64,
  pub passed:        bool,
  pub correct_count: usize,
  pub total_count:   usize,
  pub results:       Vec<QuestionResult>,
}

/// Grade `answers` against `questions` by exact string match.
///
/// Answers naming an unknown question get no result row but still count
/// toward `total_count`.
pub fn grade(
  topic_id: Uuid,
  questions: &[QuizQuestion],
  answers: &[QuizAnswer],
) -> QuizResult {
  let by_id: HashMap<Uuid, &QuizQuestion> =
    questions.iter().map(|q| (q.question_id, q)).collect();

  let results: Vec<QuestionResult> = answers
    .iter()
    .filter_map(|a| {
      let question = by_id.get(&a.question_id)?;
      Some(QuestionResult {
        question_id:    a.question_id,
        user_answer:    a.answer.clone(),
        correct_answer: question.correct_answer.clone(),
        is_correct:     a.answer == question.correct_answer,
      })
    })
    .collect();

  let correct_count = results.iter().filter(|r| r.is_correct).count();
  let total_count = answers.len();
  let score = if total_count == 0 {
    0.0
  } else {
    correct_count as f64 / total_count as f64 * 100.0
  };

  QuizResult {
    topic_id,
    score,
    passed: score >= PASS_THRESHOLD,
    correct_count,
    total_count,
    results,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::content::QuestionType;

  fn question(topic_id: Uuid, correct: &str) -> QuizQuestion {
    QuizQuestion {
      question_id:    Uuid::new_v4(),
      topic_id,
      question_type:  QuestionType::Translation,
      question_text:  "?".into(),
      correct_answer: correct.into(),
      options:        vec![correct.into(), "other".into()],
    }
  }

  fn answer(q: &QuizQuestion, text: &str) -> QuizAnswer {
    QuizAnswer { question_id: q.question_id, answer: text.into() }
  }

  #[test]
  fn all_correct_passes() {
    let topic = Uuid::new_v4();
    let qs = [question(topic, "Hallo"), question(topic, "Danke")];
    let result =
      grade(topic, &qs, &[answer(&qs[0], "Hallo"), answer(&qs[1], "Danke")]);
    assert_eq!(result.score, 100.0);
    assert!(result.passed);
    assert_eq!(result.results.len(), 2);
  }

  #[test]
  fn match_is_exact() {
    let topic = Uuid::new_v4();
    let qs = [question(topic, "Hallo")];
    let result = grade(topic, &qs, &[answer(&qs[0], "hallo")]);
    assert!(!result.results[0].is_correct);
    assert!(!result.passed);
  }

  #[test]
  fn threshold_is_inclusive() {
    let topic = Uuid::new_v4();
    let qs: Vec<_> = (0..10).map(|_| question(topic, "a")).collect();
    let answers: Vec<_> = qs
      .iter()
      .enumerate()
      .map(|(i, q)| answer(q, if i < 7 { "a" } else { "b" }))
      .collect();
    let result = grade(topic, &qs, &answers);
    assert_eq!(result.score, 70.0);
    assert!(result.passed);
  }

  #[test]
  fn unknown_questions_count_against_score() {
    let topic = Uuid::new_v4();
    let qs = [question(topic, "a")];
    let stray = QuizAnswer { question_id: Uuid::new_v4(), answer: "a".into() };
    let result = grade(topic, &qs, &[answer(&qs[0], "a"), stray]);
    assert_eq!(result.results.len(), 1);
    assert_eq!(result.total_count, 2);
    assert_eq!(result.score, 50.0);
  }

  #[test]
  fn no_answers_scores_zero() {
    let topic = Uuid::new_v4();
    let result = grade(topic, &[question(topic, "a")], &[]);
    assert_eq!(result.score, 0.0);
    assert!(!result.passed);
  }
}
