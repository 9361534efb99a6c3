use emoticart::camera::{CameraOpener, FrameSource};
use emoticart::catalog::Catalog;
use emoticart::error::{KioskError, Result};
use emoticart::kiosk::Kiosk;
use emoticart::models::{Emotion, Frame, Observation};
use emoticart::perception::Perception;
use emoticart::presentation::{self, Outcome};
use emoticart::session::{Answer, SessionEvent, SessionState, Suggestion};
use std::collections::VecDeque;
use std::fs;

struct Webcam;

impl FrameSource for Webcam {
    fn read_frame(&mut self) -> Result<Frame> {
        Ok(Frame::filled(8, 6, [128, 128, 128]))
    }
}

struct AlwaysOpens;

impl CameraOpener for AlwaysOpens {
    type Source = Webcam;

    fn open(&mut self) -> Result<Webcam> {
        Ok(Webcam)
    }
}

struct NeverOpens;

impl CameraOpener for NeverOpens {
    type Source = Webcam;

    fn open(&mut self) -> Result<Webcam> {
        Err(KioskError::CameraOpen("permission denied".to_string()))
    }
}

/// Replays a fixed list of observations, then sees nothing
struct Script(VecDeque<Observation>);

impl Script {
    fn new(items: Vec<(Vec<&str>, Option<Emotion>)>) -> Self {
        Self(
            items
                .into_iter()
                .map(|(objects, emotion)| {
                    Observation::new(objects.into_iter().map(String::from).collect(), emotion)
                })
                .collect(),
        )
    }
}

impl Perception for Script {
    fn observe(&mut self, _frame: &Frame) -> Observation {
        self.0.pop_front().unwrap_or_default()
    }
}

const CATALOG: &str = "\
Category,Title,Price (INR),Description
Books,Atomic Habits,499,Small changes remarkable results
Food,Dark Chocolate,150,70 percent cocoa
books,The Hobbit,350,There and back again
";

fn count_suggestions(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Suggested { .. }))
        .count()
}

#[test]
fn test_happy_book_then_yes_shows_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("product_data.csv");
    fs::write(&catalog_path, CATALOG).unwrap();

    let perception = Script::new(vec![
        (vec![], None),
        (vec!["person", "Book"], Some(Emotion::Happy)),
        (vec!["person", "Book"], Some(Emotion::Happy)),
    ]);
    let mut kiosk = Kiosk::new(AlwaysOpens, perception);
    kiosk.start_camera().unwrap();

    let first = kiosk.tick().unwrap();
    assert_eq!(first.events, vec![SessionEvent::Analyzing]);
    assert_eq!(kiosk.session().state(), SessionState::Scanning);

    let second = kiosk.tick().unwrap();
    assert_eq!(count_suggestions(&second.events), 1);
    match kiosk.session().suggestion() {
        Suggestion::Recommend { emotion, product } => {
            assert_eq!(emotion.to_string(), "Happy");
            assert_eq!(product, "Book");
        }
        other => panic!("expected a recommendation, got {other:?}"),
    }
    assert_eq!(kiosk.session().saved_positive_product(), Some("Book"));
    assert_eq!(kiosk.session().state(), SessionState::AwaitingExploration);

    let third = kiosk.tick().unwrap();
    assert_eq!(count_suggestions(&third.events), 0);

    kiosk.answer(Answer::Yes).unwrap();
    assert!(kiosk.session().wants_details());
    assert!(!kiosk.session().camera_active());

    let shown = presentation::outcome(kiosk.session(), || Catalog::load(&catalog_path));
    match shown {
        Outcome::Details { products, .. } => {
            let titles: Vec<&str> = products.iter().map(|p| p.title.as_str()).collect();
            assert_eq!(titles, vec!["Atomic Habits", "The Hobbit"]);
        }
        other => panic!("expected details, got {other:?}"),
    }
}

#[test]
fn test_no_answer_declines_without_catalog() {
    let perception = Script::new(vec![(vec!["cup"], Some(Emotion::Neutral))]);
    let mut kiosk = Kiosk::new(AlwaysOpens, perception);
    kiosk.start_camera().unwrap();
    kiosk.tick();

    assert_eq!(kiosk.answer(Answer::No), Ok(SessionState::ResolvedDecline));
    assert!(kiosk.session().declined_details());
    assert!(!kiosk.session().camera_active());

    let shown = presentation::outcome(kiosk.session(), || {
        panic!("declined sessions must not read the catalog")
    });
    assert!(matches!(shown, Outcome::Declined(_)));
}

#[test]
fn test_camera_open_failure_keeps_session() {
    let mut kiosk = Kiosk::new(NeverOpens, Script::new(vec![]));
    let err = kiosk.start_camera().unwrap_err();
    assert!(matches!(err, KioskError::CameraOpen(_)));
    assert!(!kiosk.session().camera_active());
    assert_eq!(kiosk.session().state(), SessionState::Idle);
    assert!(kiosk.session().last_product().is_none());
    assert!(kiosk.notice().is_some());
}

#[test]
fn test_sad_viewer_is_never_prompted() {
    let perception = Script::new(vec![
        (vec!["laptop"], Some(Emotion::Sad)),
        (vec!["bottle"], Some(Emotion::Angry)),
        (vec!["laptop"], Some(Emotion::Fear)),
    ]);
    let mut kiosk = Kiosk::new(AlwaysOpens, perception);
    kiosk.start_camera().unwrap();

    let mut suggestions = 0;
    for _ in 0..3 {
        let report = kiosk.tick().unwrap();
        suggestions += count_suggestions(&report.events);
        assert!(!report
            .events
            .iter()
            .any(|e| matches!(e, SessionEvent::ExplorationOffered { .. })));
    }
    assert_eq!(suggestions, 3);
    assert!(kiosk.session().saved_positive_product().is_none());
    assert!(kiosk.answer(Answer::Yes).is_err());
}
