//! SQL schema for the LearnSpeak SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS topics (
    topic_id    TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    level       TEXT NOT NULL,   -- 'beginner' | 'intermediate' | 'advanced'
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS journeys (
    journey_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL
);

-- Curriculum order. Ties on sequence_order fall back to rowid, i.e. the
-- order the links were inserted.
CREATE TABLE IF NOT EXISTS journey_topics (
    journey_id     TEXT    NOT NULL REFERENCES journeys(journey_id) ON DELETE CASCADE,
    topic_id       TEXT    NOT NULL REFERENCES topics(topic_id),
    sequence_order INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS quiz_questions (
    question_id    TEXT PRIMARY KEY,
    topic_id       TEXT NOT NULL REFERENCES topics(topic_id) ON DELETE CASCADE,
    question_type  TEXT NOT NULL,   -- 'translation' | 'listening' | 'image'
    question_text  TEXT NOT NULL,
    correct_answer TEXT NOT NULL,
    options        TEXT NOT NULL DEFAULT '[]'   -- JSON array of strings
);

-- One flashcard row per (user, topic), updated in place on repeat sessions.
-- Quiz rows are append-only, one per attempt.
CREATE TABLE IF NOT EXISTS progress_events (
    event_id           TEXT    PRIMARY KEY,
    user_id            TEXT    NOT NULL,
    topic_id           TEXT    NOT NULL REFERENCES topics(topic_id),
    journey_id         TEXT,
    activity_type      TEXT    NOT NULL,   -- 'flashcard' | 'quiz'
    completed          INTEGER NOT NULL,
    score              REAL,
    time_spent_seconds INTEGER NOT NULL DEFAULT 0,
    completed_at       TEXT,
    recorded_at        TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS journey_assignments (
    assignment_id TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL,
    journey_id    TEXT NOT NULL REFERENCES journeys(journey_id) ON DELETE CASCADE,
    assigned_by   TEXT NOT NULL,
    status        TEXT NOT NULL,   -- 'assigned' | 'in_progress' | 'completed'
    assigned_at   TEXT NOT NULL,
    started_at    TEXT,
    completed_at  TEXT,
    UNIQUE (user_id, journey_id)
);

CREATE TABLE IF NOT EXISTS journey_invitations (
    invitation_id TEXT    PRIMARY KEY,
    journey_id    TEXT    NOT NULL REFERENCES journeys(journey_id) ON DELETE CASCADE,
    token         TEXT    NOT NULL UNIQUE,
    created_by    TEXT    NOT NULL,
    expires_at    TEXT,
    max_uses      INTEGER,            -- NULL = unlimited
    current_uses  INTEGER NOT NULL DEFAULT 0,
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS journey_topics_journey_idx ON journey_topics(journey_id);
CREATE INDEX IF NOT EXISTS quiz_questions_topic_idx   ON quiz_questions(topic_id);
CREATE INDEX IF NOT EXISTS progress_user_topic_idx    ON progress_events(user_id, topic_id, activity_type);
CREATE INDEX IF NOT EXISTS assignments_user_idx       ON journey_assignments(user_id);
CREATE INDEX IF NOT EXISTS invitations_journey_idx    ON journey_invitations(journey_id);

PRAGMA user_version = 1;
";
