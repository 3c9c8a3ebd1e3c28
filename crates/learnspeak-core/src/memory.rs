//! In-memory backend used by the service tests in this crate.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error,
  assignment::{AssignmentQuery, JourneyAssignment, NewAssignment, Transition},
  content::{
    Journey, JourneyTopic, QuestionType, QuizQuestion, Topic, TopicLevel,
    sort_links,
  },
  invitation::{JourneyInvitation, NewInvitation},
  progress::{ActivityType, NewProgressEvent, ProgressEvent},
  store::{AssignmentStore, Backend, ContentRepository, ProgressStore},
};

#[derive(Default)]
struct Inner {
  journeys:    Vec<Journey>,
  links:       Vec<JourneyTopic>,
  topics:      Vec<Topic>,
  questions:   Vec<QuizQuestion>,
  events:      Vec<ProgressEvent>,
  assignments: Vec<JourneyAssignment>,
  invitations: Vec<JourneyInvitation>,
}

impl Inner {
  fn assignment_mut(
    &mut self,
    user_id: Uuid,
    journey_id: Uuid,
  ) -> Option<&mut JourneyAssignment> {
    self
      .assignments
      .iter_mut()
      .find(|a| a.user_id == user_id && a.journey_id == journey_id)
  }

  fn insert(&mut self, input: NewAssignment) -> Result<JourneyAssignment, Error> {
    if self
      .assignments
      .iter()
      .any(|a| a.user_id == input.user_id && a.journey_id == input.journey_id)
    {
      return Err(Error::AlreadyAssigned {
        user_id:    input.user_id,
        journey_id: input.journey_id,
      });
    }
    let assignment = JourneyAssignment {
      assignment_id: Uuid::new_v4(),
      user_id:       input.user_id,
      journey_id:    input.journey_id,
      assigned_by:   input.assigned_by,
      status:        Default::default(),
      assigned_at:   input.assigned_at,
      started_at:    None,
      completed_at:  None,
    };
    self.assignments.push(assignment.clone());
    Ok(assignment)
  }
}

#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<Inner>,
}

impl MemoryStore {
  /// Adds a topic with `quiz_count` questions whose correct answer is
  /// `"answer"`.
  pub fn add_topic(&self, name: &str, level: TopicLevel, quiz_count: u32) -> Uuid {
    let mut inner = self.inner.lock().unwrap();
    let topic_id = Uuid::new_v4();
    inner.topics.push(Topic {
      topic_id,
      name: name.to_string(),
      description: String::new(),
      level,
      created_at: Utc::now(),
    });
    for i in 0..quiz_count {
      inner.questions.push(QuizQuestion {
        question_id: Uuid::new_v4(),
        topic_id,
        question_type: QuestionType::Translation,
        question_text: format!("{name} #{i}"),
        correct_answer: "answer".into(),
        options: vec!["answer".into(), "wrong".into()],
      });
    }
    topic_id
  }

  pub fn add_journey(&self, name: &str, topics: &[(Uuid, i32)]) -> Uuid {
    let mut inner = self.inner.lock().unwrap();
    let journey_id = Uuid::new_v4();
    inner.journeys.push(Journey {
      journey_id,
      name: name.to_string(),
      description: String::new(),
      created_at: Utc::now(),
    });
    for &(topic_id, sequence_order) in topics {
      inner.links.push(JourneyTopic { journey_id, topic_id, sequence_order });
    }
    journey_id
  }

  pub fn events(&self) -> Vec<ProgressEvent> {
    self.inner.lock().unwrap().events.clone()
  }
}

impl Backend for MemoryStore {
  type Error = Error;
}

impl ContentRepository for MemoryStore {
  async fn get_journey(&self, journey_id: Uuid) -> Result<Option<Journey>, Error> {
    let inner = self.inner.lock().unwrap();
    Ok(inner.journeys.iter().find(|j| j.journey_id == journey_id).cloned())
  }

  async fn journey_topics(
    &self,
    journey_id: Uuid,
  ) -> Result<Vec<JourneyTopic>, Error> {
    let inner = self.inner.lock().unwrap();
    if !inner.journeys.iter().any(|j| j.journey_id == journey_id) {
      return Err(Error::JourneyNotFound(journey_id));
    }
    let mut links: Vec<JourneyTopic> = inner
      .links
      .iter()
      .filter(|l| l.journey_id == journey_id)
      .cloned()
      .collect();
    sort_links(&mut links);
    Ok(links)
  }

  async fn get_topic(&self, topic_id: Uuid) -> Result<Option<Topic>, Error> {
    let inner = self.inner.lock().unwrap();
    Ok(inner.topics.iter().find(|t| t.topic_id == topic_id).cloned())
  }

  async fn quiz_count(&self, topic_id: Uuid) -> Result<u32, Error> {
    let inner = self.inner.lock().unwrap();
    if !inner.topics.iter().any(|t| t.topic_id == topic_id) {
      return Err(Error::TopicNotFound(topic_id));
    }
    Ok(inner.questions.iter().filter(|q| q.topic_id == topic_id).count() as u32)
  }

  async fn quiz_questions(
    &self,
    topic_id: Uuid,
  ) -> Result<Vec<QuizQuestion>, Error> {
    let inner = self.inner.lock().unwrap();
    Ok(
      inner
        .questions
        .iter()
        .filter(|q| q.topic_id == topic_id)
        .cloned()
        .collect(),
    )
  }
}

fn materialise(input: NewProgressEvent) -> ProgressEvent {
  ProgressEvent {
    event_id: Uuid::new_v4(),
    user_id: input.user_id,
    topic_id: input.topic_id,
    journey_id: input.journey_id,
    activity_type: input.activity_type,
    completed: input.completed,
    score: input.score,
    time_spent_seconds: input.time_spent_seconds,
    completed_at: input.completed_at,
    recorded_at: Utc::now(),
  }
}

impl ProgressStore for MemoryStore {
  async fn find_progress_events(
    &self,
    user_id: Uuid,
    topic_id: Uuid,
    activity_type: ActivityType,
  ) -> Result<Vec<ProgressEvent>, Error> {
    let inner = self.inner.lock().unwrap();
    Ok(
      inner
        .events
        .iter()
        .filter(|e| {
          e.user_id == user_id
            && e.topic_id == topic_id
            && e.activity_type == activity_type
        })
        .cloned()
        .collect(),
    )
  }

  async fn create_progress_event(
    &self,
    input: NewProgressEvent,
  ) -> Result<ProgressEvent, Error> {
    let event = materialise(input);
    self.inner.lock().unwrap().events.push(event.clone());
    Ok(event)
  }

  async fn record_flashcard_completion(
    &self,
    input: NewProgressEvent,
  ) -> Result<ProgressEvent, Error> {
    let mut inner = self.inner.lock().unwrap();
    let existing = inner.events.iter_mut().find(|e| {
      e.user_id == input.user_id
        && e.topic_id == input.topic_id
        && e.activity_type == ActivityType::Flashcard
    });
    match existing {
      Some(event) => {
        event.completed = true;
        event.time_spent_seconds += input.time_spent_seconds;
        event.journey_id = event.journey_id.or(input.journey_id);
        event.completed_at = event.completed_at.or(input.completed_at);
        Ok(event.clone())
      }
      None => {
        let event = materialise(input);
        inner.events.push(event.clone());
        Ok(event)
      }
    }
  }

  async fn topic_progress(
    &self,
    user_id: Uuid,
    topic_id: Uuid,
  ) -> Result<Vec<ProgressEvent>, Error> {
    let inner = self.inner.lock().unwrap();
    Ok(
      inner
        .events
        .iter()
        .filter(|e| e.user_id == user_id && e.topic_id == topic_id)
        .cloned()
        .collect(),
    )
  }
}

impl AssignmentStore for MemoryStore {
  async fn insert_assignment(
    &self,
    input: NewAssignment,
  ) -> Result<JourneyAssignment, Error> {
    self.inner.lock().unwrap().insert(input)
  }

  async fn get_assignment(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
  ) -> Result<Option<JourneyAssignment>, Error> {
    let inner = self.inner.lock().unwrap();
    Ok(
      inner
        .assignments
        .iter()
        .find(|a| a.user_id == user_id && a.journey_id == journey_id)
        .cloned(),
    )
  }

  async fn start_assignment(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<Option<Transition>, Error> {
    let mut inner = self.inner.lock().unwrap();
    Ok(inner.assignment_mut(user_id, journey_id).map(|a| {
      let changed = a.start(at);
      Transition { assignment: a.clone(), changed }
    }))
  }

  async fn complete_assignment(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<Option<Transition>, Error> {
    let mut inner = self.inner.lock().unwrap();
    Ok(inner.assignment_mut(user_id, journey_id).map(|a| {
      a.complete(at);
      Transition { assignment: a.clone(), changed: true }
    }))
  }

  async fn delete_assignment(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
  ) -> Result<bool, Error> {
    let mut inner = self.inner.lock().unwrap();
    let before = inner.assignments.len();
    inner
      .assignments
      .retain(|a| !(a.user_id == user_id && a.journey_id == journey_id));
    Ok(inner.assignments.len() != before)
  }

  async fn list_assignments(
    &self,
    query: AssignmentQuery,
  ) -> Result<(Vec<JourneyAssignment>, u64), Error> {
    let inner = self.inner.lock().unwrap();
    let mut matches: Vec<JourneyAssignment> = inner
      .assignments
      .iter()
      .filter(|a| query.user_id.is_none_or(|id| a.user_id == id))
      .filter(|a| query.journey_id.is_none_or(|id| a.journey_id == id))
      .filter(|a| query.status.is_none_or(|s| a.status == s))
      .cloned()
      .collect();
    matches.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
    let total = matches.len() as u64;
    let page = matches
      .into_iter()
      .skip(query.page.offset() as usize)
      .take(query.page.page_size as usize)
      .collect();
    Ok((page, total))
  }

  async fn create_invitation(
    &self,
    input: NewInvitation,
  ) -> Result<JourneyInvitation, Error> {
    let invitation = JourneyInvitation {
      invitation_id: Uuid::new_v4(),
      journey_id:    input.journey_id,
      token:         Uuid::new_v4().simple().to_string(),
      created_by:    input.created_by,
      expires_at:    input.expires_at,
      max_uses:      input.max_uses,
      current_uses:  0,
      is_active:     true,
      created_at:    input.created_at,
    };
    self.inner.lock().unwrap().invitations.push(invitation.clone());
    Ok(invitation)
  }

  async fn get_invitation(
    &self,
    invitation_id: Uuid,
  ) -> Result<Option<JourneyInvitation>, Error> {
    let inner = self.inner.lock().unwrap();
    Ok(
      inner
        .invitations
        .iter()
        .find(|i| i.invitation_id == invitation_id)
        .cloned(),
    )
  }

  async fn get_invitation_by_token(
    &self,
    token: String,
  ) -> Result<Option<JourneyInvitation>, Error> {
    let inner = self.inner.lock().unwrap();
    Ok(inner.invitations.iter().find(|i| i.token == token).cloned())
  }

  async fn list_invitations(
    &self,
    journey_id: Uuid,
  ) -> Result<Vec<JourneyInvitation>, Error> {
    let inner = self.inner.lock().unwrap();
    let mut list: Vec<JourneyInvitation> = inner
      .invitations
      .iter()
      .filter(|i| i.journey_id == journey_id)
      .cloned()
      .collect();
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(list)
  }

  async fn redeem_invitation(
    &self,
    invitation_id: Uuid,
    input: NewAssignment,
  ) -> Result<JourneyAssignment, Error> {
    let mut inner = self.inner.lock().unwrap();
    let validity = inner
      .invitations
      .iter()
      .find(|i| i.invitation_id == invitation_id)
      .ok_or(Error::InvitationNotFound)?
      .validity(input.assigned_at);
    if !validity.is_valid() {
      return Err(Error::InvitationInvalid(validity.message().to_string()));
    }
    let assignment = inner.insert(input)?;
    if let Some(inv) = inner
      .invitations
      .iter_mut()
      .find(|i| i.invitation_id == invitation_id)
    {
      inv.current_uses += 1;
    }
    Ok(assignment)
  }

  async fn deactivate_invitation(&self, invitation_id: Uuid) -> Result<(), Error> {
    let mut inner = self.inner.lock().unwrap();
    let inv = inner
      .invitations
      .iter_mut()
      .find(|i| i.invitation_id == invitation_id)
      .ok_or(Error::InvitationNotFound)?;
    inv.is_active = false;
    Ok(())
  }
}
