//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width UTC RFC 3339 strings
//! (nanosecond precision, `Z` suffix), so they compare correctly as text. UUIDs are stored as
//! hyphenated lowercase strings. Quiz options are a compact JSON array.

use chrono::{DateTime, SecondsFormat, Utc};
use learnspeak_core::{
  assignment::{AssignmentStatus, JourneyAssignment},
  content::{Journey, JourneyTopic, QuestionType, QuizQuestion, Topic, TopicLevel},
  invitation::JourneyInvitation,
  progress::{ActivityType, ProgressEvent},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_level(l: TopicLevel) -> &'static str {
  match l {
    TopicLevel::Beginner => "beginner",
    TopicLevel::Intermediate => "intermediate",
    TopicLevel::Advanced => "advanced",
  }
}

pub fn decode_level(s: &str) -> Result<TopicLevel> {
  match s {
    "beginner" => Ok(TopicLevel::Beginner),
    "intermediate" => Ok(TopicLevel::Intermediate),
    "advanced" => Ok(TopicLevel::Advanced),
    other => Err(Error::Decode { column: "level", value: other.into() }),
  }
}

pub fn encode_question_type(t: QuestionType) -> &'static str {
  match t {
    QuestionType::Translation => "translation",
    QuestionType::Listening => "listening",
    QuestionType::Image => "image",
  }
}

pub fn decode_question_type(s: &str) -> Result<QuestionType> {
  match s {
    "translation" => Ok(QuestionType::Translation),
    "listening" => Ok(QuestionType::Listening),
    "image" => Ok(QuestionType::Image),
    other => {
      Err(Error::Decode { column: "question_type", value: other.into() })
    }
  }
}

pub fn decode_activity_type(s: &str) -> Result<ActivityType> {
  match s {
    "flashcard" => Ok(ActivityType::Flashcard),
    "quiz" => Ok(ActivityType::Quiz),
    other => {
      Err(Error::Decode { column: "activity_type", value: other.into() })
    }
  }
}

pub fn decode_status(s: &str) -> Result<AssignmentStatus> {
  match s {
    "assigned" => Ok(AssignmentStatus::Assigned),
    "in_progress" => Ok(AssignmentStatus::InProgress),
    "completed" => Ok(AssignmentStatus::Completed),
    other => Err(Error::Decode { column: "status", value: other.into() }),
  }
}

// ─── Options ─────────────────────────────────────────────────────────────────

pub fn encode_options(options: &[String]) -> Result<String> {
  Ok(serde_json::to_string(options)?)
}

pub fn decode_options(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `topics` row.
pub struct RawTopic {
  pub topic_id:    String,
  pub name:        String,
  pub description: String,
  pub level:       String,
  pub created_at:  String,
}

impl RawTopic {
  pub const COLUMNS: &'static str = "topic_id, name, description, level, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      topic_id:    row.get(0)?,
      name:        row.get(1)?,
      description: row.get(2)?,
      level:       row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_topic(self) -> Result<Topic> {
    Ok(Topic {
      topic_id:    decode_uuid(&self.topic_id)?,
      name:        self.name,
      description: self.description,
      level:       decode_level(&self.level)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawJourney {
  pub journey_id:  String,
  pub name:        String,
  pub description: String,
  pub created_at:  String,
}

impl RawJourney {
  pub const COLUMNS: &'static str = "journey_id, name, description, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      journey_id:  row.get(0)?,
      name:        row.get(1)?,
      description: row.get(2)?,
      created_at:  row.get(3)?,
    })
  }

  pub fn into_journey(self) -> Result<Journey> {
    Ok(Journey {
      journey_id:  decode_uuid(&self.journey_id)?,
      name:        self.name,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawJourneyTopic {
  pub journey_id:     String,
  pub topic_id:       String,
  pub sequence_order: i32,
}

impl RawJourneyTopic {
  pub fn into_link(self) -> Result<JourneyTopic> {
    Ok(JourneyTopic {
      journey_id:     decode_uuid(&self.journey_id)?,
      topic_id:       decode_uuid(&self.topic_id)?,
      sequence_order: self.sequence_order,
    })
  }
}

pub struct RawQuizQuestion {
  pub question_id:    String,
  pub topic_id:       String,
  pub question_type:  String,
  pub question_text:  String,
  pub correct_answer: String,
  pub options:        String,
}

impl RawQuizQuestion {
  pub fn into_question(self) -> Result<QuizQuestion> {
    Ok(QuizQuestion {
      question_id:    decode_uuid(&self.question_id)?,
      topic_id:       decode_uuid(&self.topic_id)?,
      question_type:  decode_question_type(&self.question_type)?,
      question_text:  self.question_text,
      correct_answer: self.correct_answer,
      options:        decode_options(&self.options)?,
    })
  }
}

/// Raw values read directly from a `progress_events` row.
pub struct RawProgressEvent {
  pub event_id:           String,
  pub user_id:            String,
  pub topic_id:           String,
  pub journey_id:         Option<String>,
  pub activity_type:      String,
  pub completed:          bool,
  pub score:              Option<f64>,
  pub time_spent_seconds: u32,
  pub completed_at:       Option<String>,
  pub recorded_at:        String,
}

impl RawProgressEvent {
  pub const COLUMNS: &'static str = "event_id, user_id, topic_id, journey_id, \
                             activity_type, completed, score, \
                             time_spent_seconds, completed_at, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:           row.get(0)?,
      user_id:            row.get(1)?,
      topic_id:           row.get(2)?,
      journey_id:         row.get(3)?,
      activity_type:      row.get(4)?,
      completed:          row.get(5)?,
      score:              row.get(6)?,
      time_spent_seconds: row.get(7)?,
      completed_at:       row.get(8)?,
      recorded_at:        row.get(9)?,
    })
  }

  pub fn into_event(self) -> Result<ProgressEvent> {
    Ok(ProgressEvent {
      event_id:           decode_uuid(&self.event_id)?,
      user_id:            decode_uuid(&self.user_id)?,
      topic_id:           decode_uuid(&self.topic_id)?,
      journey_id:         decode_opt_uuid(self.journey_id)?,
      activity_type:      decode_activity_type(&self.activity_type)?,
      completed:          self.completed,
      score:              self.score,
      time_spent_seconds: self.time_spent_seconds,
      completed_at:       decode_opt_dt(self.completed_at)?,
      recorded_at:        decode_dt(&self.recorded_at)?,
    })
  }
}

pub struct RawAssignment {
  pub assignment_id: String,
  pub user_id:       String,
  pub journey_id:    String,
  pub assigned_by:   String,
  pub status:        String,
  pub assigned_at:   String,
  pub started_at:    Option<String>,
  pub completed_at:  Option<String>,
}

impl RawAssignment {
  pub const COLUMNS: &'static str = "assignment_id, user_id, journey_id, assigned_by, \
                             status, assigned_at, started_at, completed_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      assignment_id: row.get(0)?,
      user_id:       row.get(1)?,
      journey_id:    row.get(2)?,
      assigned_by:   row.get(3)?,
      status:        row.get(4)?,
      assigned_at:   row.get(5)?,
      started_at:    row.get(6)?,
      completed_at:  row.get(7)?,
    })
  }

  pub fn into_assignment(self) -> Result<JourneyAssignment> {
    Ok(JourneyAssignment {
      assignment_id: decode_uuid(&self.assignment_id)?,
      user_id:       decode_uuid(&self.user_id)?,
      journey_id:    decode_uuid(&self.journey_id)?,
      assigned_by:   decode_uuid(&self.assigned_by)?,
      status:        decode_status(&self.status)?,
      assigned_at:   decode_dt(&self.assigned_at)?,
      started_at:    decode_opt_dt(self.started_at)?,
      completed_at:  decode_opt_dt(self.completed_at)?,
    })
  }
}

pub struct RawInvitation {
  pub invitation_id: String,
  pub journey_id:    String,
  pub token:         String,
  pub created_by:    String,
  pub expires_at:    Option<String>,
  pub max_uses:      Option<u32>,
  pub current_uses:  u32,
  pub is_active:     bool,
  pub created_at:    String,
}

impl RawInvitation {
  pub const COLUMNS: &'static str = "invitation_id, journey_id, token, created_by, \
                             expires_at, max_uses, current_uses, is_active, \
                             created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      invitation_id: row.get(0)?,
      journey_id:    row.get(1)?,
      token:         row.get(2)?,
      created_by:    row.get(3)?,
      expires_at:    row.get(4)?,
      max_uses:      row.get(5)?,
      current_uses:  row.get(6)?,
      is_active:     row.get(7)?,
      created_at:    row.get(8)?,
    })
  }

  pub fn into_invitation(self) -> Result<JourneyInvitation> {
    Ok(JourneyInvitation {
      invitation_id: decode_uuid(&self.invitation_id)?,
      journey_id:    decode_uuid(&self.journey_id)?,
      token:         self.token,
      created_by:    decode_uuid(&self.created_by)?,
      expires_at:    decode_opt_dt(self.expires_at)?,
      max_uses:      self.max_uses,
      current_uses:  self.current_uses,
      is_active:     self.is_active,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
