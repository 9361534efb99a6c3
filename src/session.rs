// Suggestion session state machine, one observation per camera tick

use crate::error::SessionError;
use crate::models::{Emotion, Observation};
use crate::perception::product_labels;
use tracing::{debug, info};

/// Where the session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Camera off
    #[default]
    Idle,
    /// Camera on, nothing usable seen yet
    Scanning,
    /// A fresh (emotion, product) pair was just suggested
    Suggesting,
    /// A positive product is saved and the prompt awaits an answer
    AwaitingExploration,
    /// Viewer asked for catalog details
    ResolvedShow,
    /// Viewer declined
    ResolvedDecline,
}

/// The viewer's reply to the exploration prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

/// What the session emitted during one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Generic "analyzing" placeholder
    Analyzing,
    /// New suggestion for a changed (emotion, product) pair
    Suggested { emotion: Emotion, product: String },
    /// Yes/no prompt for the saved product
    ExplorationOffered { product: String },
}

/// The suggestion currently on screen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Suggestion {
    /// Camera off, nothing to suggest
    #[default]
    Ready,
    Analyzing,
    Recommend { emotion: Emotion, product: String },
}

/// Mutable context for one interactive run
#[derive(Debug, Clone, Default)]
pub struct Session {
    camera_active: bool,
    last_emotion: Option<Emotion>,
    last_product: Option<String>,
    saved_positive_product: Option<String>,
    exploration_offered: bool,
    exploration_answered: bool,
    wants_details: bool,
    declined_details: bool,
    state: SessionState,
    suggestion: Suggestion,
}

impl Session {
    /// Creates a session with every flag cleared and the camera off
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position in the run
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether ticks are being applied
    pub fn camera_active(&self) -> bool {
        self.camera_active
    }

    /// Emotion of the last emitted suggestion
    pub fn last_emotion(&self) -> Option<Emotion> {
        self.last_emotion
    }

    /// Product of the last emitted suggestion
    pub fn last_product(&self) -> Option<&str> {
        self.last_product.as_deref()
    }

    /// Product tied to the latest positive suggestion
    pub fn saved_positive_product(&self) -> Option<&str> {
        self.saved_positive_product.as_deref()
    }

    /// Whether the prompt was shown for the saved product
    pub fn exploration_offered(&self) -> bool {
        self.exploration_offered
    }

    /// Whether the viewer replied to the prompt
    pub fn exploration_answered(&self) -> bool {
        self.exploration_answered
    }

    /// Viewer answered yes
    pub fn wants_details(&self) -> bool {
        self.wants_details
    }

    /// Viewer answered no
    pub fn declined_details(&self) -> bool {
        self.declined_details
    }

    /// The suggestion the display should currently show
    pub fn suggestion(&self) -> &Suggestion {
        &self.suggestion
    }

    /// True while the camera runs and the yes/no prompt is unanswered.
    ///
    /// A stopped session keeps its flags but no longer takes answers.
    pub fn awaiting_answer(&self) -> bool {
        self.camera_active
            && self.saved_positive_product.is_some()
            && self.exploration_offered
            && !self.exploration_answered
    }

    /// Turns the camera on, starting a fresh run.
    ///
    /// Whatever the previous run left behind (including a resolved outcome
    /// that has already been displayed) is discarded.
    pub fn start_camera(&mut self) {
        *self = Self {
            camera_active: true,
            state: SessionState::Scanning,
            suggestion: Suggestion::Analyzing,
            ..Self::default()
        };
        info!("Session started");
    }

    /// Turns the camera off without touching the exploration flags
    pub fn stop_camera(&mut self) {
        if !self.camera_active {
            return;
        }
        self.camera_active = false;
        if !matches!(
            self.state,
            SessionState::ResolvedShow | SessionState::ResolvedDecline
        ) {
            self.state = SessionState::Idle;
        }
        self.suggestion = Suggestion::Ready;
        info!("Camera stopped, state {:?}", self.state);
    }

    /// Applies one observation. Does nothing while the camera is off.
    pub fn tick(&mut self, observation: &Observation) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if !self.camera_active {
            return events;
        }

        let products = product_labels(&observation.objects);
        match (observation.emotion, products.first()) {
            (Some(emotion), Some(product)) => {
                let product = (*product).to_string();
                if self.is_repeat(emotion, &product) {
                    debug!("Suppressing repeated suggestion {} / {}", emotion, product);
                } else {
                    self.last_emotion = Some(emotion);
                    self.last_product = Some(product.clone());
                    self.state = SessionState::Suggesting;
                    self.suggestion = Suggestion::Recommend {
                        emotion,
                        product: product.clone(),
                    };
                    debug!("Suggesting {} for {}", product, emotion);

                    if emotion.is_positive() {
                        info!("Saved positive product {}", product);
                        self.saved_positive_product = Some(product.clone());
                        self.exploration_offered = false;
                        self.exploration_answered = false;
                    }
                    events.push(SessionEvent::Suggested { emotion, product });
                }
            }
            _ => {
                self.suggestion = Suggestion::Analyzing;
                self.state = SessionState::Scanning;
                events.push(SessionEvent::Analyzing);
            }
        }

        if let Some(product) = self.saved_positive_product.as_ref() {
            if !self.exploration_answered && !self.exploration_offered {
                self.exploration_offered = true;
                self.state = SessionState::AwaitingExploration;
                info!("Offering exploration for {}", product);
                events.push(SessionEvent::ExplorationOffered {
                    product: product.clone(),
                });
            } else if self.awaiting_answer() {
                self.state = SessionState::AwaitingExploration;
            }
        }

        events
    }

    /// Records the viewer's reply to the exploration prompt.
    ///
    /// Either answer stops the camera. Rejected when no prompt is pending.
    pub fn answer(&mut self, answer: Answer) -> Result<SessionState, SessionError> {
        if !self.awaiting_answer() {
            return Err(SessionError::NotAwaitingAnswer);
        }

        self.exploration_answered = true;
        self.camera_active = false;
        self.suggestion = Suggestion::Ready;
        self.state = match answer {
            Answer::Yes => {
                self.wants_details = true;
                SessionState::ResolvedShow
            }
            Answer::No => {
                self.declined_details = true;
                SessionState::ResolvedDecline
            }
        };
        info!("Exploration answered {:?}", answer);
        Ok(self.state)
    }

    fn is_repeat(&self, emotion: Emotion, product: &str) -> bool {
        self.last_emotion == Some(emotion) && self.last_product.as_deref() == Some(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(objects: &[&str], emotion: Option<Emotion>) -> Observation {
        Observation::new(objects.iter().map(|s| s.to_string()).collect(), emotion)
    }

    fn suggested_count(events: &[SessionEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Suggested { .. }))
            .count()
    }

    fn running() -> Session {
        let mut session = Session::new();
        session.start_camera();
        session
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.camera_active());
        assert!(session.saved_positive_product().is_none());
        assert!(!session.exploration_offered());
        assert!(!session.wants_details());
        assert!(!session.declined_details());
        assert_eq!(session.suggestion(), &Suggestion::Ready);
    }

    #[test]
    fn test_tick_ignored_while_camera_off() {
        let mut session = Session::new();
        let events = session.tick(&obs(&["Book"], Some(Emotion::Happy)));
        assert!(events.is_empty());
        assert!(session.last_product().is_none());
    }

    #[test]
    fn test_empty_observation_emits_analyzing_without_mutation() {
        let mut session = running();
        session.tick(&obs(&["cup"], Some(Emotion::Sad)));

        for observation in [
            obs(&[], Some(Emotion::Happy)),
            obs(&["cup"], None),
            obs(&["person"], Some(Emotion::Happy)),
            Observation::empty(),
        ] {
            let events = session.tick(&observation);
            assert_eq!(events, vec![SessionEvent::Analyzing]);
            assert_eq!(session.suggestion(), &Suggestion::Analyzing);
            assert_eq!(session.last_emotion(), Some(Emotion::Sad));
            assert_eq!(session.last_product(), Some("cup"));
            assert_eq!(session.state(), SessionState::Scanning);
        }
    }

    #[test]
    fn test_book_happy_scenario() {
        let mut session = running();
        let first = session.tick(&obs(&["Book"], Some(Emotion::Happy)));
        assert_eq!(
            first[0],
            SessionEvent::Suggested {
                emotion: Emotion::Happy,
                product: "Book".to_string()
            }
        );
        assert_eq!(session.saved_positive_product(), Some("Book"));

        let second = session.tick(&obs(&["Book"], Some(Emotion::Happy)));
        assert_eq!(suggested_count(&second), 0);
    }

    #[test]
    fn test_identical_pair_twice_emits_once() {
        let mut session = running();
        let mut total = 0;
        for _ in 0..2 {
            total += suggested_count(&session.tick(&obs(&["laptop"], Some(Emotion::Angry))));
        }
        assert_eq!(total, 1);
    }

    #[test]
    fn test_person_filtered_before_product_choice() {
        let mut session = running();
        session.tick(&obs(&["Person", "bottle", "book"], Some(Emotion::Sad)));
        assert_eq!(session.last_product(), Some("bottle"));
    }

    #[test]
    fn test_positive_emotions_save_product_and_reset_offer() {
        for emotion in [Emotion::Happy, Emotion::Neutral, Emotion::Curious] {
            let mut session = running();
            session.tick(&obs(&["cup"], Some(Emotion::Happy)));
            assert!(session.exploration_offered());

            let events = session.tick(&obs(&["chair"], Some(emotion)));
            assert_eq!(session.saved_positive_product(), Some("chair"));
            // Offer reset, then re-armed for the new product
            assert!(events.contains(&SessionEvent::ExplorationOffered {
                product: "chair".to_string()
            }));
        }
    }

    #[test]
    fn test_negative_emotion_keeps_saved_product() {
        let mut session = running();
        session.tick(&obs(&["book"], Some(Emotion::Happy)));
        session.tick(&obs(&["laptop"], Some(Emotion::Angry)));
        assert_eq!(session.saved_positive_product(), Some("book"));
        assert_eq!(session.last_product(), Some("laptop"));
    }

    #[test]
    fn test_negative_emotion_never_offers() {
        let mut session = running();
        let events = session.tick(&obs(&["book"], Some(Emotion::Fear)));
        assert!(!events
            .iter()
            .any(|e| matches!(e, SessionEvent::ExplorationOffered { .. })));
        assert_eq!(session.state(), SessionState::Suggesting);
    }

    #[test]
    fn test_prompt_offered_once_per_saved_product() {
        let mut session = running();
        let mut offers = 0;
        let feed = [
            obs(&["book"], Some(Emotion::Happy)),
            obs(&["book"], Some(Emotion::Happy)),
            obs(&[], None),
            obs(&["cup"], Some(Emotion::Sad)),
            obs(&["book"], Some(Emotion::Sad)),
        ];
        for observation in &feed {
            offers += session
                .tick(observation)
                .iter()
                .filter(|e| matches!(e, SessionEvent::ExplorationOffered { .. }))
                .count();
        }
        assert_eq!(offers, 1);
        assert_eq!(session.state(), SessionState::AwaitingExploration);
    }

    #[test]
    fn test_answer_yes_resolves_show() {
        let mut session = running();
        session.tick(&obs(&["book"], Some(Emotion::Happy)));
        assert_eq!(session.answer(Answer::Yes), Ok(SessionState::ResolvedShow));
        assert!(session.wants_details());
        assert!(session.exploration_answered());
        assert!(!session.camera_active());
        assert!(!session.declined_details());
    }

    #[test]
    fn test_answer_no_resolves_decline() {
        let mut session = running();
        session.tick(&obs(&["book"], Some(Emotion::Neutral)));
        assert_eq!(session.answer(Answer::No), Ok(SessionState::ResolvedDecline));
        assert!(session.declined_details());
        assert!(!session.wants_details());
        assert!(!session.camera_active());
    }

    #[test]
    fn test_answer_without_prompt_is_rejected() {
        let mut session = running();
        session.tick(&obs(&["book"], Some(Emotion::Sad)));
        assert_eq!(
            session.answer(Answer::Yes),
            Err(SessionError::NotAwaitingAnswer)
        );
        assert!(session.camera_active());
        assert!(!session.wants_details());
    }

    #[test]
    fn test_second_answer_is_rejected() {
        let mut session = running();
        session.tick(&obs(&["book"], Some(Emotion::Happy)));
        session.answer(Answer::No).unwrap();
        assert_eq!(
            session.answer(Answer::Yes),
            Err(SessionError::NotAwaitingAnswer)
        );
        assert!(!session.wants_details());
    }

    #[test]
    fn test_manual_stop_keeps_flags() {
        let mut session = running();
        session.tick(&obs(&["book"], Some(Emotion::Happy)));
        session.stop_camera();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.saved_positive_product(), Some("book"));
        assert!(session.exploration_offered());
        assert!(!session.wants_details());
        assert!(!session.declined_details());
    }

    #[test]
    fn test_answer_after_manual_stop_is_rejected() {
        let mut session = running();
        session.tick(&obs(&["book"], Some(Emotion::Happy)));
        assert!(session.awaiting_answer());
        session.stop_camera();

        assert!(!session.awaiting_answer());
        assert_eq!(
            session.answer(Answer::Yes),
            Err(SessionError::NotAwaitingAnswer)
        );
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.wants_details());
        assert!(!session.exploration_answered());
        assert!(session.exploration_offered());
    }

    #[test]
    fn test_restart_resets_session() {
        let mut session = running();
        session.tick(&obs(&["book"], Some(Emotion::Happy)));
        session.answer(Answer::Yes).unwrap();
        assert_eq!(session.state(), SessionState::ResolvedShow);

        session.start_camera();
        assert_eq!(session.state(), SessionState::Scanning);
        assert!(session.camera_active());
        assert!(session.saved_positive_product().is_none());
        assert!(!session.wants_details());
        assert!(session.last_emotion().is_none());
    }

    #[test]
    fn test_ticks_continue_while_awaiting() {
        let mut session = running();
        session.tick(&obs(&["book"], Some(Emotion::Happy)));
        let events = session.tick(&obs(&["phone"], Some(Emotion::Sad)));
        assert_eq!(suggested_count(&events), 1);
        assert!(session.awaiting_answer());
        assert_eq!(session.state(), SessionState::AwaitingExploration);
    }
}
