//! [`SqliteStore`]: the SQLite implementation of the LearnSpeak capability
//! traits.

use std::path::Path;

use chrono::{DateTime, Utc};
use learnspeak_core::{
  Error as CoreError,
  assignment::{
    AssignmentQuery, AssignmentStatus, JourneyAssignment, NewAssignment, Transition,
  },
  content::{
    Journey, JourneyTopic, NewJourney, NewQuizQuestion, NewTopic, QuizQuestion,
    Topic,
  },
  invitation::{JourneyInvitation, NewInvitation, TOKEN_BYTES},
  progress::{ActivityType, NewProgressEvent, ProgressEvent},
  store::{AssignmentStore, Backend, ContentRepository, ProgressStore},
};
use rand_core::{OsRng, RngCore as _};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawAssignment, RawInvitation, RawJourney, RawJourneyTopic, RawProgressEvent,
    RawQuizQuestion, RawTopic, encode_dt, encode_level, encode_options,
    encode_question_type, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A LearnSpeak store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

fn new_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Curriculum writes ─────────────────────────────────────────────────

  pub async fn create_topic(&self, input: NewTopic) -> Result<Topic> {
    let topic = Topic {
      topic_id:    Uuid::new_v4(),
      name:        input.name,
      description: input.description,
      level:       input.level,
      created_at:  Utc::now(),
    };

    let id_str    = encode_uuid(topic.topic_id);
    let name      = topic.name.clone();
    let desc      = topic.description.clone();
    let level_str = encode_level(topic.level);
    let at_str    = encode_dt(topic.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO topics (topic_id, name, description, level, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, desc, level_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(topic)
  }

  /// Create a journey and link `input.topic_ids` with sequence orders
  /// 1, 2, 3, ... Every topic must already exist.
  pub async fn create_journey(&self, input: NewJourney) -> Result<Journey> {
    let journey = Journey {
      journey_id:  Uuid::new_v4(),
      name:        input.name,
      description: input.description,
      created_at:  Utc::now(),
    };

    let id_str     = encode_uuid(journey.journey_id);
    let name       = journey.name.clone();
    let desc       = journey.description.clone();
    let at_str     = encode_dt(journey.created_at);
    let topic_strs: Vec<(Uuid, String)> = input
      .topic_ids
      .iter()
      .map(|id| (*id, encode_uuid(*id)))
      .collect();

    let missing: Option<Uuid> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (id, id_s) in &topic_strs {
          let exists = tx
            .query_row(
              "SELECT 1 FROM topics WHERE topic_id = ?1",
              rusqlite::params![id_s],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if !exists {
            return Ok(Some(*id));
          }
        }

        tx.execute(
          "INSERT INTO journeys (journey_id, name, description, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, desc, at_str],
        )?;
        for (order, (_, topic_s)) in topic_strs.iter().enumerate() {
          tx.execute(
            "INSERT INTO journey_topics (journey_id, topic_id, sequence_order)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![id_str, topic_s, order as i64 + 1],
          )?;
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    if let Some(topic_id) = missing {
      return Err(CoreError::TopicNotFound(topic_id).into());
    }
    Ok(journey)
  }

  /// Append a topic to a journey's curriculum at an explicit position.
  pub async fn link_topic(
    &self,
    journey_id: Uuid,
    topic_id: Uuid,
    sequence_order: i32,
  ) -> Result<JourneyTopic> {
    let journey_s = encode_uuid(journey_id);
    let topic_s   = encode_uuid(topic_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO journey_topics (journey_id, topic_id, sequence_order)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![journey_s, topic_s, sequence_order],
        )?;
        Ok(())
      })
      .await?;

    Ok(JourneyTopic { journey_id, topic_id, sequence_order })
  }

  pub async fn add_quiz_question(
    &self,
    topic_id: Uuid,
    input: NewQuizQuestion,
  ) -> Result<QuizQuestion> {
    if self.get_topic(topic_id).await?.is_none() {
      return Err(CoreError::TopicNotFound(topic_id).into());
    }

    let question = QuizQuestion {
      question_id:    Uuid::new_v4(),
      topic_id,
      question_type:  input.question_type,
      question_text:  input.question_text,
      correct_answer: input.correct_answer,
      options:        input.options,
    };

    let id_str      = encode_uuid(question.question_id);
    let topic_str   = encode_uuid(topic_id);
    let type_str    = encode_question_type(question.question_type);
    let text        = question.question_text.clone();
    let answer      = question.correct_answer.clone();
    let options_str = encode_options(&question.options)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO quiz_questions (
             question_id, topic_id, question_type, question_text,
             correct_answer, options
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, topic_str, type_str, text, answer, options_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(question)
  }

  pub async fn list_journeys(&self) -> Result<Vec<Journey>> {
    let raws: Vec<RawJourney> = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {} FROM journeys ORDER BY created_at, rowid",
          RawJourney::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawJourney::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawJourney::into_journey).collect()
  }

  async fn insert_event(&self, event: &ProgressEvent) -> Result<()> {
    let event_s     = encode_uuid(event.event_id);
    let user_s      = encode_uuid(event.user_id);
    let topic_s     = encode_uuid(event.topic_id);
    let journey_s   = event.journey_id.map(encode_uuid);
    let activity    = event.activity_type.as_str();
    let completed   = event.completed;
    let score       = event.score;
    let seconds     = event.time_spent_seconds;
    let done_at_s   = event.completed_at.map(encode_dt);
    let recorded_s  = encode_dt(event.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO progress_events (
             event_id, user_id, topic_id, journey_id, activity_type,
             completed, score, time_spent_seconds, completed_at, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            event_s, user_s, topic_s, journey_s, activity, completed, score,
            seconds, done_at_s, recorded_s,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn materialise(input: NewProgressEvent) -> ProgressEvent {
  ProgressEvent {
    event_id:           Uuid::new_v4(),
    user_id:            input.user_id,
    topic_id:           input.topic_id,
    journey_id:         input.journey_id,
    activity_type:      input.activity_type,
    completed:          input.completed,
    score:              input.score,
    time_spent_seconds: input.time_spent_seconds,
    completed_at:       input.completed_at,
    recorded_at:        Utc::now(),
  }
}

fn select_assignment(
  conn: &rusqlite::Connection,
  user_s: &str,
  journey_s: &str,
) -> rusqlite::Result<Option<RawAssignment>> {
  let sql = format!(
    "SELECT {} FROM journey_assignments WHERE user_id = ?1 AND journey_id = ?2",
    RawAssignment::COLUMNS
  );
  conn
    .query_row(&sql, rusqlite::params![user_s, journey_s], RawAssignment::from_row)
    .optional()
}

fn into_transition((raw, changed): (RawAssignment, bool)) -> Result<Transition> {
  Ok(Transition { assignment: raw.into_assignment()?, changed })
}

/// What happened inside the `redeem_invitation` transaction.
enum Redeem {
  Claimed,
  AlreadyAssigned,
  /// No use could be claimed; carries the invitation row, if any.
  Rejected(Option<RawInvitation>),
}

impl Backend for SqliteStore {
  type Error = Error;
}

// ─── ContentRepository impl ──────────────────────────────────────────────────

impl ContentRepository for SqliteStore {
  async fn get_journey(&self, journey_id: Uuid) -> Result<Option<Journey>> {
    let id_str = encode_uuid(journey_id);

    let raw: Option<RawJourney> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM journeys WHERE journey_id = ?1",
          RawJourney::COLUMNS
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawJourney::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawJourney::into_journey).transpose()
  }

  async fn journey_topics(&self, journey_id: Uuid) -> Result<Vec<JourneyTopic>> {
    let id_str = encode_uuid(journey_id);

    let raws: Option<Vec<RawJourneyTopic>> = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM journeys WHERE journey_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }

        let mut stmt = conn.prepare(
          "SELECT journey_id, topic_id, sequence_order
           FROM journey_topics
           WHERE journey_id = ?1
           ORDER BY sequence_order, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawJourneyTopic {
              journey_id:     row.get(0)?,
              topic_id:       row.get(1)?,
              sequence_order: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await?;

    raws
      .ok_or(Error::Core(CoreError::JourneyNotFound(journey_id)))?
      .into_iter()
      .map(RawJourneyTopic::into_link)
      .collect()
  }

  async fn get_topic(&self, topic_id: Uuid) -> Result<Option<Topic>> {
    let id_str = encode_uuid(topic_id);

    let raw: Option<RawTopic> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {} FROM topics WHERE topic_id = ?1", RawTopic::COLUMNS);
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawTopic::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTopic::into_topic).transpose()
  }

  async fn quiz_count(&self, topic_id: Uuid) -> Result<u32> {
    let id_str = encode_uuid(topic_id);

    let count: Option<u32> = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM topics WHERE topic_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }
        let n: u32 = conn.query_row(
          "SELECT COUNT(*) FROM quiz_questions WHERE topic_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?;
        Ok(Some(n))
      })
      .await?;

    count.ok_or(Error::Core(CoreError::TopicNotFound(topic_id)))
  }

  async fn quiz_questions(&self, topic_id: Uuid) -> Result<Vec<QuizQuestion>> {
    let id_str = encode_uuid(topic_id);

    let raws: Vec<RawQuizQuestion> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT question_id, topic_id, question_type, question_text,
                  correct_answer, options
           FROM quiz_questions
           WHERE topic_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawQuizQuestion {
              question_id:    row.get(0)?,
              topic_id:       row.get(1)?,
              question_type:  row.get(2)?,
              question_text:  row.get(3)?,
              correct_answer: row.get(4)?,
              options:        row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawQuizQuestion::into_question).collect()
  }
}

// ─── ProgressStore impl ──────────────────────────────────────────────────────

impl ProgressStore for SqliteStore {
  async fn find_progress_events(
    &self,
    user_id: Uuid,
    topic_id: Uuid,
    activity_type: ActivityType,
  ) -> Result<Vec<ProgressEvent>> {
    let user_s   = encode_uuid(user_id);
    let topic_s  = encode_uuid(topic_id);
    let activity = activity_type.as_str();

    let raws: Vec<RawProgressEvent> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM progress_events
           WHERE user_id = ?1 AND topic_id = ?2 AND activity_type = ?3
           ORDER BY recorded_at, rowid",
          RawProgressEvent::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_s, topic_s, activity],
            RawProgressEvent::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProgressEvent::into_event).collect()
  }

  async fn create_progress_event(
    &self,
    input: NewProgressEvent,
  ) -> Result<ProgressEvent> {
    let event = materialise(input);
    self.insert_event(&event).await?;
    Ok(event)
  }

  async fn record_flashcard_completion(
    &self,
    input: NewProgressEvent,
  ) -> Result<ProgressEvent> {
    let fresh       = materialise(input);
    let user_s      = encode_uuid(fresh.user_id);
    let topic_s     = encode_uuid(fresh.topic_id);
    let event_s     = encode_uuid(fresh.event_id);
    let journey_s   = fresh.journey_id.map(encode_uuid);
    let seconds     = fresh.time_spent_seconds;
    let done_at_s   = fresh.completed_at.map(encode_dt);
    let recorded_s  = encode_dt(fresh.recorded_at);

    let raw: RawProgressEvent = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing: Option<String> = tx
          .query_row(
            "SELECT event_id FROM progress_events
             WHERE user_id = ?1 AND topic_id = ?2 AND activity_type = 'flashcard'
             ORDER BY rowid LIMIT 1",
            rusqlite::params![user_s, topic_s],
            |r| r.get(0),
          )
          .optional()?;

        let id = match existing {
          Some(id) => {
            tx.execute(
              "UPDATE progress_events
               SET completed = 1,
                   time_spent_seconds = time_spent_seconds + ?2,
                   journey_id = COALESCE(journey_id, ?3),
                   completed_at = COALESCE(completed_at, ?4)
               WHERE event_id = ?1",
              rusqlite::params![id, seconds, journey_s, done_at_s],
            )?;
            id
          }
          None => {
            tx.execute(
              "INSERT INTO progress_events (
                 event_id, user_id, topic_id, journey_id, activity_type,
                 completed, score, time_spent_seconds, completed_at, recorded_at
               ) VALUES (?1, ?2, ?3, ?4, 'flashcard', 1, NULL, ?5, ?6, ?7)",
              rusqlite::params![
                event_s, user_s, topic_s, journey_s, seconds, done_at_s,
                recorded_s,
              ],
            )?;
            event_s
          }
        };

        let sql = format!(
          "SELECT {} FROM progress_events WHERE event_id = ?1",
          RawProgressEvent::COLUMNS
        );
        let raw = tx.query_row(&sql, rusqlite::params![id], RawProgressEvent::from_row)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    let event = raw.into_event()?;
    debug!(
      event_id = %event.event_id,
      total_seconds = event.time_spent_seconds,
      "flashcard event recorded"
    );
    Ok(event)
  }

  async fn topic_progress(
    &self,
    user_id: Uuid,
    topic_id: Uuid,
  ) -> Result<Vec<ProgressEvent>> {
    let user_s  = encode_uuid(user_id);
    let topic_s = encode_uuid(topic_id);

    let raws: Vec<RawProgressEvent> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM progress_events
           WHERE user_id = ?1 AND topic_id = ?2
           ORDER BY recorded_at, rowid",
          RawProgressEvent::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![user_s, topic_s], RawProgressEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProgressEvent::into_event).collect()
  }
}

// ─── AssignmentStore impl ────────────────────────────────────────────────────

impl AssignmentStore for SqliteStore {
  // ── Assignments ───────────────────────────────────────────────────────

  async fn insert_assignment(
    &self,
    input: NewAssignment,
  ) -> Result<JourneyAssignment> {
    let assignment = JourneyAssignment {
      assignment_id: Uuid::new_v4(),
      user_id:       input.user_id,
      journey_id:    input.journey_id,
      assigned_by:   input.assigned_by,
      status:        AssignmentStatus::Assigned,
      assigned_at:   input.assigned_at,
      started_at:    None,
      completed_at:  None,
    };

    let id_s       = encode_uuid(assignment.assignment_id);
    let user_s     = encode_uuid(assignment.user_id);
    let journey_s  = encode_uuid(assignment.journey_id);
    let by_s       = encode_uuid(assignment.assigned_by);
    let status_s   = assignment.status.as_str();
    let at_s       = encode_dt(assignment.assigned_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO journey_assignments (
             assignment_id, user_id, journey_id, assigned_by, status, assigned_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (user_id, journey_id) DO NOTHING",
          rusqlite::params![id_s, user_s, journey_s, by_s, status_s, at_s],
        )?;
        Ok(n == 1)
      })
      .await?;

    if !inserted {
      return Err(
        CoreError::AlreadyAssigned {
          user_id:    assignment.user_id,
          journey_id: assignment.journey_id,
        }
        .into(),
      );
    }
    Ok(assignment)
  }

  async fn get_assignment(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
  ) -> Result<Option<JourneyAssignment>> {
    let user_s    = encode_uuid(user_id);
    let journey_s = encode_uuid(journey_id);

    let raw: Option<RawAssignment> = self
      .conn
      .call(move |conn| Ok(select_assignment(conn, &user_s, &journey_s)?))
      .await?;

    raw.map(RawAssignment::into_assignment).transpose()
  }

  async fn start_assignment(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<Option<Transition>> {
    let user_s    = encode_uuid(user_id);
    let journey_s = encode_uuid(journey_id);
    let at_s      = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE journey_assignments
           SET status = ?3, started_at = ?4
           WHERE user_id = ?1 AND journey_id = ?2 AND status = ?5",
          rusqlite::params![
            user_s,
            journey_s,
            AssignmentStatus::InProgress.as_str(),
            at_s,
            AssignmentStatus::Assigned.as_str(),
          ],
        )? == 1;
        let raw = select_assignment(&tx, &user_s, &journey_s)?;
        tx.commit()?;
        Ok(raw.map(|raw| (raw, changed)))
      })
      .await?
      .map(into_transition)
      .transpose()
  }

  async fn complete_assignment(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<Option<Transition>> {
    let user_s    = encode_uuid(user_id);
    let journey_s = encode_uuid(journey_id);
    let at_s      = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE journey_assignments
           SET status = ?3, completed_at = ?4
           WHERE user_id = ?1 AND journey_id = ?2",
          rusqlite::params![
            user_s,
            journey_s,
            AssignmentStatus::Completed.as_str(),
            at_s,
          ],
        )? == 1;
        let raw = select_assignment(&tx, &user_s, &journey_s)?;
        tx.commit()?;
        Ok(raw.map(|raw| (raw, changed)))
      })
      .await?
      .map(into_transition)
      .transpose()
  }

  async fn delete_assignment(&self, user_id: Uuid, journey_id: Uuid) -> Result<bool> {
    let user_s    = encode_uuid(user_id);
    let journey_s = encode_uuid(journey_id);

    let deleted: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM journey_assignments WHERE user_id = ?1 AND journey_id = ?2",
          rusqlite::params![user_s, journey_s],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn list_assignments(
    &self,
    query: AssignmentQuery,
  ) -> Result<(Vec<JourneyAssignment>, u64)> {
    let user_s    = query.user_id.map(encode_uuid);
    let journey_s = query.journey_id.map(encode_uuid);
    let status_s  = query.status.map(AssignmentStatus::as_str);
    let limit     = i64::from(query.page.page_size);
    let offset    = query.page.offset() as i64;

    let (raws, total): (Vec<RawAssignment>, u64) = self
      .conn
      .call(move |conn| {
        // NULL parameters disable their filter.
        let filter = "(?1 IS NULL OR user_id = ?1)
                      AND (?2 IS NULL OR journey_id = ?2)
                      AND (?3 IS NULL OR status = ?3)";

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM journey_assignments WHERE {filter}"),
          rusqlite::params![user_s, journey_s, status_s],
          |r| r.get(0),
        )?;

        let sql = format!(
          "SELECT {} FROM journey_assignments
           WHERE {filter}
           ORDER BY assigned_at DESC, rowid DESC
           LIMIT ?4 OFFSET ?5",
          RawAssignment::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_s, journey_s, status_s, limit, offset],
            RawAssignment::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((rows, total as u64))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawAssignment::into_assignment)
      .collect::<Result<_>>()?;
    Ok((items, total))
  }

  // ── Invitations ───────────────────────────────────────────────────────

  async fn create_invitation(&self, input: NewInvitation) -> Result<JourneyInvitation> {
    let invitation = JourneyInvitation {
      invitation_id: Uuid::new_v4(),
      journey_id:    input.journey_id,
      token:         new_token(),
      created_by:    input.created_by,
      expires_at:    input.expires_at,
      max_uses:      input.max_uses,
      current_uses:  0,
      is_active:     true,
      created_at:    input.created_at,
    };

    let id_s      = encode_uuid(invitation.invitation_id);
    let journey_s = encode_uuid(invitation.journey_id);
    let token     = invitation.token.clone();
    let by_s      = encode_uuid(invitation.created_by);
    let expires_s = invitation.expires_at.map(encode_dt);
    let max_uses  = invitation.max_uses;
    let at_s      = encode_dt(invitation.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO journey_invitations (
             invitation_id, journey_id, token, created_by, expires_at,
             max_uses, current_uses, is_active, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 1, ?7)",
          rusqlite::params![id_s, journey_s, token, by_s, expires_s, max_uses, at_s],
        )?;
        Ok(())
      })
      .await?;

    Ok(invitation)
  }

  async fn get_invitation(&self, invitation_id: Uuid) -> Result<Option<JourneyInvitation>> {
    let id_s = encode_uuid(invitation_id);

    let raw: Option<RawInvitation> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM journey_invitations WHERE invitation_id = ?1",
          RawInvitation::COLUMNS
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_s], RawInvitation::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawInvitation::into_invitation).transpose()
  }

  async fn get_invitation_by_token(
    &self,
    token: String,
  ) -> Result<Option<JourneyInvitation>> {
    let raw: Option<RawInvitation> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM journey_invitations WHERE token = ?1",
          RawInvitation::COLUMNS
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![token], RawInvitation::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawInvitation::into_invitation).transpose()
  }

  async fn list_invitations(&self, journey_id: Uuid) -> Result<Vec<JourneyInvitation>> {
    let journey_s = encode_uuid(journey_id);

    let raws: Vec<RawInvitation> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM journey_invitations
           WHERE journey_id = ?1
           ORDER BY created_at DESC, rowid DESC",
          RawInvitation::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![journey_s], RawInvitation::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInvitation::into_invitation).collect()
  }

  async fn redeem_invitation(
    &self,
    invitation_id: Uuid,
    input: NewAssignment,
  ) -> Result<JourneyAssignment> {
    let assignment = JourneyAssignment {
      assignment_id: Uuid::new_v4(),
      user_id:       input.user_id,
      journey_id:    input.journey_id,
      assigned_by:   input.assigned_by,
      status:        AssignmentStatus::Assigned,
      assigned_at:   input.assigned_at,
      started_at:    None,
      completed_at:  None,
    };

    let invitation_s = encode_uuid(invitation_id);
    let id_s         = encode_uuid(assignment.assignment_id);
    let user_s       = encode_uuid(assignment.user_id);
    let journey_s    = encode_uuid(assignment.journey_id);
    let by_s         = encode_uuid(assignment.assigned_by);
    let status_s     = assignment.status.as_str();
    let at_s         = encode_dt(assignment.assigned_at);

    let outcome: Redeem = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Guards and increment in one statement.
        let claimed = tx.execute(
          "UPDATE journey_invitations SET current_uses = current_uses + 1
           WHERE invitation_id = ?1
             AND is_active = 1
             AND (expires_at IS NULL OR expires_at > ?2)
             AND (max_uses IS NULL OR current_uses < max_uses)",
          rusqlite::params![invitation_s, at_s],
        )?;
        if claimed == 0 {
          let sql = format!(
            "SELECT {} FROM journey_invitations WHERE invitation_id = ?1",
            RawInvitation::COLUMNS
          );
          let raw = tx
            .query_row(&sql, rusqlite::params![invitation_s], RawInvitation::from_row)
            .optional()?;
          return Ok(Redeem::Rejected(raw));
        }

        let inserted = tx.execute(
          "INSERT INTO journey_assignments (
             assignment_id, user_id, journey_id, assigned_by, status, assigned_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (user_id, journey_id) DO NOTHING",
          rusqlite::params![id_s, user_s, journey_s, by_s, status_s, at_s],
        )?;
        if inserted == 0 {
          // Dropping `tx` rolls the claim back.
          return Ok(Redeem::AlreadyAssigned);
        }

        tx.commit()?;
        Ok(Redeem::Claimed)
      })
      .await?;

    match outcome {
      Redeem::Claimed => Ok(assignment),
      Redeem::AlreadyAssigned => Err(
        CoreError::AlreadyAssigned {
          user_id:    assignment.user_id,
          journey_id: assignment.journey_id,
        }
        .into(),
      ),
      Redeem::Rejected(None) => Err(CoreError::InvitationNotFound.into()),
      Redeem::Rejected(Some(raw)) => {
        let invitation = raw.into_invitation()?;
        let reason = invitation.validity(assignment.assigned_at).message();
        Err(CoreError::InvitationInvalid(reason.to_string()).into())
      }
    }
  }

  async fn deactivate_invitation(&self, invitation_id: Uuid) -> Result<()> {
    let id_s = encode_uuid(invitation_id);

    let updated: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE journey_invitations SET is_active = 0 WHERE invitation_id = ?1",
          rusqlite::params![id_s],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(CoreError::InvitationNotFound.into());
    }
    Ok(())
  }
}
