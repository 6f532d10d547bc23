use std::time::Duration;

use super::*;
use crate::logic::clock::ManualClock;
use crate::logic::config::ModelConfig;
use crate::logic::enrollment::EnrolledReference;
use crate::logic::error::DetectorError;
use crate::logic::reference::{BiometricTemplate, EnrollmentMethod, TemplateSample};
use crate::logic::testing::{centered_face, descriptor, face_at, test_frame, ScriptedDetector, StaticFrames};

struct Fixture {
    cycle: VerificationCycle,
    detector: Arc<ScriptedDetector>,
    frames: Arc<StaticFrames>,
    reference: SharedReference,
}

async fn fixture(detector: ScriptedDetector) -> Fixture {
    let detector = Arc::new(detector);
    let frames = Arc::new(StaticFrames::new(test_frame()));
    let models = Arc::new(ModelLoader::new());
    models
        .ensure_loaded(detector.as_ref(), &ModelConfig::default())
        .await
        .unwrap();
    let reference: SharedReference = Arc::default();

    let cycle = VerificationCycle::new(
        VerificationConfig::default(),
        detector.clone(),
        frames.clone(),
        Arc::new(ManualClock::new(5_000)),
        models,
        reference.clone(),
    );
    Fixture { cycle, detector, frames, reference }
}

fn enroll(reference: &SharedReference, threshold: f32) {
    let samples = (0..2)
        .map(|i| TemplateSample {
            descriptor: descriptor(0.0),
            quality: 0.9,
            captured_at_ms: i,
        })
        .collect();
    let template = BiometricTemplate::new(EnrollmentMethod::LiveVideo, samples, threshold).unwrap();
    *reference.write() = Some(EnrolledReference::new(template));
}

#[tokio::test]
async fn test_not_ready_without_models() {
    let cycle = VerificationCycle::new(
        VerificationConfig::default(),
        Arc::new(ScriptedDetector::new().with_face(Some(centered_face(0.0)))),
        Arc::new(StaticFrames::new(test_frame())),
        Arc::new(ManualClock::new(0)),
        Arc::new(ModelLoader::new()),
        Arc::default(),
    );

    let result = cycle.verify_once().await;
    assert_eq!(result.outcome, CycleOutcome::NotReady);
    assert!(!result.face_detected);
    assert_eq!(result.message.as_deref(), Some(NOT_READY_MESSAGE));
    assert_eq!(cycle.quality().total_frames, 0);
    assert!(cycle.history().is_empty());
}

#[tokio::test]
async fn test_not_ready_without_frame() {
    let f = fixture(ScriptedDetector::new().with_face(Some(centered_face(0.0)))).await;

    f.frames.set(None);
    assert_eq!(f.cycle.verify_once().await.outcome, CycleOutcome::NotReady);

    f.frames.set(Some(Frame::filled(0, 480, [0, 0, 0])));
    assert_eq!(f.cycle.verify_once().await.outcome, CycleOutcome::NotReady);

    assert_eq!(f.detector.detect_face_calls(), 0);
    assert_eq!(f.cycle.quality().total_frames, 0);
}

#[tokio::test]
async fn test_no_face_counts_frame() {
    let f = fixture(ScriptedDetector::new()).await;

    let result = f.cycle.verify_once().await;

    assert_eq!(result.outcome, CycleOutcome::NoFace);
    assert_eq!(result.timestamp_ms, 5_000);
    let quality = f.cycle.quality();
    assert_eq!(quality.total_frames, 1);
    assert_eq!(quality.successful_frames, 0);
}

#[tokio::test]
async fn test_no_face_stays_out_of_history() {
    let f = fixture(ScriptedDetector::new()).await;

    for _ in 0..3 {
        assert!(!f.cycle.verify_once().await.face_detected);
    }
    assert!(f.cycle.history().is_empty());
    assert_eq!(f.cycle.quality().total_frames, 3);

    let verdict = f.cycle.stability();
    assert!(!verdict.stable);
    assert_eq!(verdict.count, 0);

    // only detected faces take part in the vote
    f.detector.set_face(Ok(Some(centered_face(0.0))));
    f.cycle.verify_once().await;
    assert_eq!(f.cycle.history().len(), 1);
}

#[tokio::test]
async fn test_without_reference_uses_detector_score() {
    let f = fixture(ScriptedDetector::new().with_face(Some(centered_face(0.0)))).await;

    let result = f.cycle.verify_once().await;

    assert!(result.face_detected);
    assert!(result.in_frame);
    assert!(result.identity_match);
    assert!((result.confidence - 0.92).abs() < 1e-6);
    assert!(result.distance.is_none());
}

#[tokio::test]
async fn test_match_confidence_against_reference() {
    let f = fixture(ScriptedDetector::new()).await;
    enroll(&f.reference, 0.5);

    f.detector.push_face(Ok(Some(centered_face(0.3))));
    let close = f.cycle.verify_once().await;
    assert!(close.identity_match);
    assert!((close.confidence - 0.4).abs() < 1e-5);
    assert_eq!(close.match_label.as_deref(), Some("authorized_user"));

    f.detector.push_face(Ok(Some(centered_face(0.6))));
    let far = f.cycle.verify_once().await;
    assert!(!far.identity_match);
    assert!(far.is_mismatch());
    assert!((far.confidence - 0.09).abs() < 1e-5);
    assert_eq!(far.match_label.as_deref(), Some("unknown"));

    let quality = f.cycle.quality();
    assert_eq!(quality.successful_frames, 2);
    assert!((quality.average_confidence - 0.245).abs() < 1e-5);
}

#[tokio::test]
async fn test_loose_matcher_threshold_does_not_widen_match() {
    let f = fixture(ScriptedDetector::new()).await;
    enroll(&f.reference, 0.6);

    f.detector.push_face(Ok(Some(centered_face(0.55))));
    let result = f.cycle.verify_once().await;

    // labelled by the matcher, rejected by the verification cut-off
    assert_eq!(result.match_label.as_deref(), Some("authorized_user"));
    assert!(!result.identity_match);
    assert!(result.is_mismatch());
    assert!((result.confidence - 0.095).abs() < 1e-5);

    f.detector.push_face(Ok(Some(centered_face(0.45))));
    let close = f.cycle.verify_once().await;
    assert!(close.identity_match);
    assert!((close.confidence - 0.1).abs() < 1e-5);
}

#[tokio::test]
async fn test_face_near_edge_is_out_of_frame() {
    let f = fixture(ScriptedDetector::new()).await;

    // centre at (60, 240): inside the 96 px left margin
    let edge = face_at(BoundingBox::new(10.0, 190.0, 100.0, 100.0), Some(descriptor(0.0)));
    f.detector.push_face(Ok(Some(edge)));

    let result = f.cycle.verify_once().await;
    assert!(result.face_detected);
    assert!(!result.in_frame);
}

#[test]
fn test_in_frame_margin_is_strict() {
    // 640 x 480: margins are 96 and 72
    let on_edge = BoundingBox::new(46.0, 200.0, 100.0, 80.0);
    assert!(!is_face_in_frame(&on_edge, 640, 480, 0.15));

    let inside = BoundingBox::new(47.0, 200.0, 100.0, 80.0);
    assert!(is_face_in_frame(&inside, 640, 480, 0.15));
}

#[tokio::test]
async fn test_detector_fault_is_contained() {
    let f = fixture(ScriptedDetector::new()).await;
    f.detector.push_face(Err(DetectorError::new("backend crashed")));

    let result = f.cycle.verify_once().await;

    assert_eq!(result.outcome, CycleOutcome::Fault);
    assert!(!result.face_detected);
    assert!(result.error.as_deref().unwrap_or_default().contains("backend crashed"));
    let quality = f.cycle.quality();
    assert_eq!(quality.faults, 1);
    assert_eq!(quality.total_frames, 0);
    assert!(f.cycle.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reentrant_call_is_busy() {
    let detector = ScriptedDetector::new()
        .with_face(Some(centered_face(0.0)))
        .with_latency(Duration::from_millis(100));
    let f = fixture(detector).await;

    let (a, b) = tokio::join!(f.cycle.verify_once(), f.cycle.verify_once());

    assert_eq!(a.outcome, CycleOutcome::Detected);
    assert_eq!(b.outcome, CycleOutcome::NotReady);
    assert_eq!(b.message.as_deref(), Some(BUSY_MESSAGE));
    assert_eq!(f.detector.max_in_flight(), 1);
    assert_eq!(f.cycle.history().len(), 1);

    // guard released
    assert_eq!(f.cycle.verify_once().await.outcome, CycleOutcome::Detected);
}

#[tokio::test]
async fn test_history_is_bounded_and_resettable() {
    let f = fixture(ScriptedDetector::new().with_face(Some(centered_face(0.0)))).await;

    for _ in 0..12 {
        f.cycle.verify_once().await;
    }
    assert_eq!(f.cycle.history().len(), 10);
    assert!(f.cycle.stability().stable);

    f.cycle.reset();
    assert!(f.cycle.history().is_empty());
    assert_eq!(f.cycle.quality().total_frames, 0);
    assert!(!f.cycle.stability().stable);
}
