//! Curriculum import.
//!
//! A curriculum file is JSON: a list of topics (each with an optional quiz)
//! and a list of journeys that reference topics by `key`, in curriculum
//! order.
//!
//! ```json
//! {
//!   "topics": [
//!     { "key": "greetings", "name": "Greetings", "level": "beginner",
//!       "quiz": [{ "question_text": "Hello", "correct_answer": "Hallo",
//!                  "options": ["Hallo", "Tschüss"] }] }
//!   ],
//!   "journeys": [
//!     { "name": "German A1", "topics": ["greetings"] }
//!   ]
//! }
//! ```

use std::{collections::HashMap, path::Path};

use learnspeak_core::content::{NewJourney, NewQuizQuestion, NewTopic};
use learnspeak_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
pub struct Curriculum {
  #[serde(default)]
  pub topics:   Vec<TopicEntry>,
  #[serde(default)]
  pub journeys: Vec<JourneyEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TopicEntry {
  /// File-local identifier used by [`JourneyEntry::topics`].
  pub key:   String,
  #[serde(flatten)]
  pub topic: NewTopic,
  #[serde(default)]
  pub quiz:  Vec<NewQuizQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct JourneyEntry {
  pub name:        String,
  #[serde(default)]
  pub description: String,
  pub topics:      Vec<String>,
}

/// Counts of what an import created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
  pub topics:    usize,
  pub questions: usize,
  pub journeys:  usize,
}

impl Curriculum {
  pub fn from_path(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(serde_json::from_str(&raw)?)
  }

  /// Topic keys must be unique and every journey reference must resolve.
  /// [`import`] runs this before any write.
  pub fn validate(&self) -> Result<()> {
    let mut keys = std::collections::HashSet::new();
    for entry in &self.topics {
      if !keys.insert(entry.key.as_str()) {
        return Err(Error::DuplicateTopic(entry.key.clone()));
      }
    }
    for journey in &self.journeys {
      if let Some(key) = journey.topics.iter().find(|k| !keys.contains(k.as_str())) {
        return Err(Error::UnknownTopic {
          journey: journey.name.clone(),
          key:     key.clone(),
        });
      }
    }
    Ok(())
  }
}

/// Create every topic, question and journey in `curriculum`.
pub async fn import(store: &SqliteStore, curriculum: Curriculum) -> Result<SeedReport> {
  curriculum.validate()?;

  let mut report = SeedReport::default();
  let mut ids: HashMap<String, Uuid> = HashMap::new();

  for entry in curriculum.topics {
    let topic = store.create_topic(entry.topic).await?;
    for question in entry.quiz {
      store.add_quiz_question(topic.topic_id, question).await?;
      report.questions += 1;
    }
    ids.insert(entry.key, topic.topic_id);
    report.topics += 1;
  }

  for entry in curriculum.journeys {
    let topic_ids = entry
      .topics
      .iter()
      .filter_map(|key| ids.get(key).copied())
      .collect();
    let journey = store
      .create_journey(NewJourney {
        name: entry.name,
        description: entry.description,
        topic_ids,
      })
      .await?;
    info!(journey_id = %journey.journey_id, name = %journey.name, "journey imported");
    report.journeys += 1;
  }

  info!(
    topics = report.topics,
    questions = report.questions,
    journeys = report.journeys,
    "curriculum imported"
  );
  Ok(report)
}
