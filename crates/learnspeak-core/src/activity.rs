//! Producers of progress events: flashcard sessions and quiz attempts.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  progress::{ActivityType, NewProgressEvent, ProgressEvent},
  quiz::{QuizResult, QuizSubmission, grade},
  store::{ContentRepository, ProgressStore},
  time::Clock,
};

pub struct ActivityRecorder<C, P> {
  content:  Arc<C>,
  progress: Arc<P>,
  clock:    Clock,
}

impl<C: ContentRepository, P: ProgressStore> ActivityRecorder<C, P> {
  pub fn new(content: Arc<C>, progress: Arc<P>, clock: Clock) -> Self {
    Self { content, progress, clock }
  }

  /// Mark the topic's flashcards as done for the user. Repeated sessions
  /// accumulate `time_spent_seconds` on the same event.
  pub async fn complete_flashcards(
    &self,
    user_id: Uuid,
    topic_id: Uuid,
    journey_id: Option<Uuid>,
    time_spent_seconds: u32,
  ) -> Result<ProgressEvent> {
    self.require_topic(topic_id).await?;

    let event = self
      .progress
      .record_flashcard_completion(NewProgressEvent {
        user_id,
        topic_id,
        journey_id,
        activity_type: ActivityType::Flashcard,
        completed: true,
        score: None,
        time_spent_seconds,
        completed_at: Some(self.clock.now()),
      })
      .await
      .map_err(Into::into)?;

    info!(
      %user_id,
      %topic_id,
      total_seconds = event.time_spent_seconds,
      "flashcards completed"
    );
    Ok(event)
  }

  /// Grade a quiz attempt and record it. Every attempt is kept; only a
  /// passing one marks the quiz as completed.
  pub async fn submit_quiz(&self, submission: QuizSubmission) -> Result<QuizResult> {
    let QuizSubmission { user_id, topic_id, journey_id, time_spent_seconds, answers } =
      submission;

    let questions = self
      .content
      .quiz_questions(topic_id)
      .await
      .map_err(Into::into)?;
    if questions.is_empty() {
      return Err(Error::NoQuizQuestions(topic_id));
    }

    let result = grade(topic_id, &questions, &answers);

    self
      .progress
      .create_progress_event(NewProgressEvent {
        user_id,
        topic_id,
        journey_id,
        activity_type: ActivityType::Quiz,
        completed: result.passed,
        score: Some(result.score),
        time_spent_seconds,
        completed_at: result.passed.then(|| self.clock.now()),
      })
      .await
      .map_err(Into::into)?;

    info!(
      %user_id,
      %topic_id,
      score = result.score,
      passed = result.passed,
      "quiz submitted"
    );
    Ok(result)
  }

  async fn require_topic(&self, topic_id: Uuid) -> Result<()> {
    self
      .content
      .get_topic(topic_id)
      .await
      .map_err(Into::into)?
      .map(|_| ())
      .ok_or(Error::TopicNotFound(topic_id))
  }
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, Utc};

  use super::*;
  use crate::{
    aggregator::ProgressAggregator,
    content::TopicLevel,
    memory::MemoryStore,
    quiz::QuizAnswer,
  };

  fn t0() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
  }

  fn recorder(store: &Arc<MemoryStore>) -> ActivityRecorder<MemoryStore, MemoryStore> {
    ActivityRecorder::new(store.clone(), store.clone(), Clock::fixed(t0()))
  }

  async fn submit(
    store: &Arc<MemoryStore>,
    user_id: Uuid,
    topic_id: Uuid,
    answers: &[&str],
  ) -> QuizResult {
    let questions = store.quiz_questions(topic_id).await.unwrap();
    let answers = questions
      .iter()
      .zip(answers)
      .map(|(q, a)| QuizAnswer { question_id: q.question_id, answer: a.to_string() })
      .collect();
    recorder(store)
      .submit_quiz(QuizSubmission {
        user_id,
        topic_id,
        journey_id: None,
        time_spent_seconds: 60,
        answers,
      })
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn repeated_flashcards_accumulate_time() {
    let store = Arc::new(MemoryStore::default());
    let topic = store.add_topic("T", TopicLevel::Beginner, 0);
    let user = Uuid::new_v4();
    let rec = recorder(&store);

    rec.complete_flashcards(user, topic, None, 120).await.unwrap();
    let event = rec.complete_flashcards(user, topic, None, 45).await.unwrap();

    assert_eq!(event.time_spent_seconds, 165);
    assert_eq!(event.completed_at, Some(t0()));
    assert_eq!(store.events().len(), 1);
  }

  #[tokio::test]
  async fn flashcards_for_unknown_topic_fail() {
    let store = Arc::new(MemoryStore::default());
    let err = recorder(&store)
      .complete_flashcards(Uuid::new_v4(), Uuid::new_v4(), None, 10)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::TopicNotFound(_)));
    assert!(store.events().is_empty());
  }

  #[tokio::test]
  async fn failing_quiz_does_not_complete_topic() {
    let store = Arc::new(MemoryStore::default());
    let topic = store.add_topic("T", TopicLevel::Beginner, 4);
    let journey = store.add_journey("J", &[(topic, 1)]);
    let user = Uuid::new_v4();

    recorder(&store).complete_flashcards(user, topic, None, 30).await.unwrap();
    let result = submit(&store, user, topic, &["answer", "answer", "no", "no"]).await;
    assert_eq!(result.score, 50.0);
    assert!(!result.passed);

    let agg = ProgressAggregator::new(store.clone(), store.clone());
    assert!(agg.completed_topic_ids(user, journey).await.unwrap().is_empty());

    let result =
      submit(&store, user, topic, &["answer", "answer", "answer", "no"]).await;
    assert!(result.passed);
    assert!(agg.completed_topic_ids(user, journey).await.unwrap().contains(&topic));

    let quiz_events: Vec<_> = store
      .events()
      .into_iter()
      .filter(|e| e.activity_type == ActivityType::Quiz)
      .collect();
    assert_eq!(quiz_events.len(), 2);
    assert_eq!(quiz_events[0].completed_at, None);
    assert_eq!(quiz_events[1].score, Some(75.0));
  }

  #[tokio::test]
  async fn quiz_without_questions_is_rejected() {
    let store = Arc::new(MemoryStore::default());
    let topic = store.add_topic("T", TopicLevel::Beginner, 0);
    let err = recorder(&store)
      .submit_quiz(QuizSubmission {
        user_id:            Uuid::new_v4(),
        topic_id:           topic,
        journey_id:         None,
        time_spent_seconds: 0,
        answers:            vec![],
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::NoQuizQuestions(t) if t == topic));
  }
}
