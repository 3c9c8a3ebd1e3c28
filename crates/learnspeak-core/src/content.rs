//! Curriculum structure: journeys, topics and quiz questions.
//!
//! Content is read-only from the point of view of the progress core. It
//! supplies the shape of a journey; all learner state lives in
//! [`crate::progress`] and [`crate::assignment`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Topics ──────────────────────────────────────────────────────────────────

/// Difficulty band of a topic.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TopicLevel {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
}

/// A themed collection of vocabulary, optionally paired with quiz questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
  pub topic_id:    Uuid,
  pub name:        String,
  pub description: String,
  pub level:       TopicLevel,
  pub created_at:  DateTime<Utc>,
}

/// Input to a backend's topic creation; the store assigns id and timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTopic {
  pub name:        String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub level:       TopicLevel,
}

// ─── Journeys ────────────────────────────────────────────────────────────────

/// An ordered curriculum of topics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journey {
  pub journey_id:  Uuid,
  pub name:        String,
  pub description: String,
  pub created_at:  DateTime<Utc>,
}

/// Input to a backend's journey creation.
///
/// `topic_ids` are linked in the given order with `sequence_order`
/// 1, 2, 3, ...
#[derive(Debug, Clone)]
pub struct NewJourney {
  pub name:        String,
  pub description: String,
  pub topic_ids:   Vec<Uuid>,
}

/// One link of a journey's curriculum order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyTopic {
  pub journey_id:     Uuid,
  pub topic_id:       Uuid,
  pub sequence_order: i32,
}

/// Orders links by ascending `sequence_order`, keeping the incoming order
/// for ties.
pub fn sort_links(links: &mut [JourneyTopic]) {
  links.sort_by_key(|l| l.sequence_order);
}

/// What a learner is shown for the next unlocked topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSummary {
  pub topic_id:       Uuid,
  pub name:           String,
  pub description:    String,
  pub level:          TopicLevel,
  pub sequence_order: i32,
  pub quiz_count:     u32,
}

impl TopicSummary {
  pub fn new(topic: Topic, sequence_order: i32, quiz_count: u32) -> Self {
    Self {
      topic_id: topic.topic_id,
      name: topic.name,
      description: topic.description,
      level: topic.level,
      sequence_order,
      quiz_count,
    }
  }
}

// ─── Quiz questions ──────────────────────────────────────────────────────────

/// How a question is presented to the learner.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
  #[default]
  Translation,
  Listening,
  Image,
}

/// A multiple-choice question attached to a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
  pub question_id:    Uuid,
  pub topic_id:       Uuid,
  pub question_type:  QuestionType,
  pub question_text:  String,
  pub correct_answer: String,
  pub options:        Vec<String>,
}

/// Input to a backend's question creation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuizQuestion {
  #[serde(default)]
  pub question_type:  QuestionType,
  pub question_text:  String,
  pub correct_answer: String,
  #[serde(default)]
  pub options:        Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn link(order: i32, topic_id: Uuid) -> JourneyTopic {
    JourneyTopic { journey_id: Uuid::nil(), topic_id, sequence_order: order }
  }

  #[test]
  fn sort_links_is_stable_on_ties() {
    let (a, b, c, d) =
      (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let mut links = vec![link(2, a), link(1, b), link(2, c), link(1, d)];
    sort_links(&mut links);

    let order: Vec<Uuid> = links.iter().map(|l| l.topic_id).collect();
    assert_eq!(order, vec![b, d, a, c]);
  }

  #[test]
  fn level_serialises_lowercase() {
    let json = serde_json::to_string(&TopicLevel::Intermediate).unwrap();
    assert_eq!(json, "\"intermediate\"");
  }
}
