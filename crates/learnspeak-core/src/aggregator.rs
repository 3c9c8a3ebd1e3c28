//! Derives a learner's position in a journey from raw progress events.

use std::{
  collections::{BTreeSet, HashMap},
  sync::Arc,
};

use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  content::{JourneyTopic, TopicSummary},
  progress::{
    ActivityType, JourneyProgress, ProgressSnapshot, topic_completed,
  },
  store::{ContentRepository, ProgressStore},
};

/// Read-only view over content and progress for one (user, journey) at a
/// time. Holds no state between calls.
pub struct ProgressAggregator<C, P> {
  content:  Arc<C>,
  progress: Arc<P>,
}

impl<C, P> Clone for ProgressAggregator<C, P> {
  fn clone(&self) -> Self {
    Self { content: self.content.clone(), progress: self.progress.clone() }
  }
}

/// One evaluation pass over a journey.
struct Evaluation {
  links:       Vec<JourneyTopic>,
  completed:   BTreeSet<Uuid>,
  quiz_counts: HashMap<Uuid, u32>,
}

impl<C: ContentRepository, P: ProgressStore> ProgressAggregator<C, P> {
  pub fn new(content: Arc<C>, progress: Arc<P>) -> Self {
    Self { content, progress }
  }

  /// Topics of the journey the user has completed.
  pub async fn completed_topic_ids(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
  ) -> Result<BTreeSet<Uuid>> {
    Ok(self.evaluate(user_id, journey_id).await?.completed)
  }

  pub async fn journey_progress(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
  ) -> Result<JourneyProgress> {
    let eval = self.evaluate(user_id, journey_id).await?;
    Ok(JourneyProgress::new(eval.links.len(), eval.completed.len()))
  }

  /// The first topic in sequence order the user has not completed, or
  /// `None` when the journey is finished.
  pub async fn next_topic(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
  ) -> Result<Option<TopicSummary>> {
    let eval = self.evaluate(user_id, journey_id).await?;
    self.summarise_next(&eval).await
  }

  /// Progress and next topic from a single evaluation pass.
  pub async fn snapshot(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
  ) -> Result<ProgressSnapshot> {
    let eval = self.evaluate(user_id, journey_id).await?;
    let next = self.summarise_next(&eval).await?;
    let progress = JourneyProgress::new(eval.links.len(), eval.completed.len());
    Ok(ProgressSnapshot::new(progress, next))
  }

  /// Whether one topic satisfies the completion rule for the user, and the
  /// topic's quiz count.
  pub async fn topic_status(
    &self,
    user_id: Uuid,
    topic_id: Uuid,
  ) -> Result<(bool, u32)> {
    let quiz_count =
      self.content.quiz_count(topic_id).await.map_err(Into::into)?;

    let flashcards = self
      .progress
      .find_progress_events(user_id, topic_id, ActivityType::Flashcard)
      .await
      .map_err(Into::into)?;

    let quizzes = if quiz_count > 0 && flashcards.iter().any(|e| e.completed)
    {
      self
        .progress
        .find_progress_events(user_id, topic_id, ActivityType::Quiz)
        .await
        .map_err(Into::into)?
    } else {
      Vec::new()
    };

    Ok((topic_completed(&flashcards, quiz_count, &quizzes), quiz_count))
  }

  async fn evaluate(&self, user_id: Uuid, journey_id: Uuid) -> Result<Evaluation> {
    let links = self
      .content
      .journey_topics(journey_id)
      .await
      .map_err(Into::into)?;

    let mut completed = BTreeSet::new();
    let mut quiz_counts = HashMap::with_capacity(links.len());

    for link in &links {
      if quiz_counts.contains_key(&link.topic_id) {
        continue;
      }
      let (done, quiz_count) = self.topic_status(user_id, link.topic_id).await?;
      quiz_counts.insert(link.topic_id, quiz_count);
      if done {
        completed.insert(link.topic_id);
      }
    }

    debug!(
      %user_id,
      %journey_id,
      total = links.len(),
      completed = completed.len(),
      "evaluated journey progress"
    );

    Ok(Evaluation { links, completed, quiz_counts })
  }

  async fn summarise_next(
    &self,
    eval: &Evaluation,
  ) -> Result<Option<TopicSummary>> {
    let Some(link) =
      eval.links.iter().find(|l| !eval.completed.contains(&l.topic_id))
    else {
      return Ok(None);
    };

    let topic = self
      .content
      .get_topic(link.topic_id)
      .await
      .map_err(Into::into)?
      .ok_or(Error::TopicNotFound(link.topic_id))?;

    let quiz_count = eval.quiz_counts.get(&link.topic_id).copied().unwrap_or(0);
    Ok(Some(TopicSummary::new(topic, link.sequence_order, quiz_count)))
  }
}
