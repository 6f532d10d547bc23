//! Enrollment Engine
//!
//! Captures a biometric reference from live video, a still image or
//! externally supplied detections, persists it through the
//! `ReferenceStore` and publishes a fresh `Matcher`.
//!
//! A valid in-memory reference short-circuits enrollment (cache hit).
//! Call `reset` first to enroll again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;

use super::clock::Clock;
use super::config::EnrollmentConfig;
use super::detector::{BoundingBox, Detector, DetectorOptions, FaceDetection, Frame, FrameSource, ModelLoader};
use super::error::{MonitorError, MonitorResult};
use super::matcher::Matcher;
use super::reference::{
    BiometricTemplate, EnrollmentMethod, ReferenceMetadata, ReferenceStore, TemplateSample,
};

/// Active template and the matcher built from it
#[derive(Debug, Clone)]
pub struct EnrolledReference {
    pub template: Arc<BiometricTemplate>,
    pub matcher: Arc<Matcher>,
}

impl EnrolledReference {
    pub fn new(template: BiometricTemplate) -> Self {
        let matcher = Matcher::from_template(&template);
        Self {
            template: Arc::new(template),
            matcher: Arc::new(matcher),
        }
    }
}

/// Shared-read, single-writer slot for the active reference
pub type SharedReference = Arc<RwLock<Option<EnrolledReference>>>;

/// Where enrollment samples come from
pub enum EnrollmentSource {
    LiveVideo(Arc<dyn FrameSource>),
    StaticImage(Frame),
    /// Detections already produced by the collaborator
    Detections(Vec<FaceDetection>),
}

impl EnrollmentSource {
    fn method(&self) -> EnrollmentMethod {
        match self {
            EnrollmentSource::LiveVideo(_) => EnrollmentMethod::LiveVideo,
            EnrollmentSource::StaticImage(_) => EnrollmentMethod::StaticImage,
            EnrollmentSource::Detections(_) => EnrollmentMethod::Imported,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentResult {
    pub samples: usize,
    /// Reference was already in memory; nothing was sampled
    pub from_cache: bool,
    /// Reference was restored from the session store
    pub from_storage: bool,
    pub method: EnrollmentMethod,
    pub face_box: Option<BoundingBox>,
    pub detection_score: Option<f32>,
    pub metadata: Option<ReferenceMetadata>,
}

/// Sampled descriptors plus the first face seen
struct Capture {
    samples: Vec<TemplateSample>,
    face_box: Option<BoundingBox>,
}

pub struct EnrollmentEngine {
    config: EnrollmentConfig,
    options: DetectorOptions,
    detector: Arc<dyn Detector>,
    clock: Arc<dyn Clock>,
    models: Arc<ModelLoader>,
    store: Arc<ReferenceStore>,
    reference: SharedReference,
    restored: AtomicBool,
}

impl EnrollmentEngine {
    pub fn new(
        config: EnrollmentConfig,
        options: DetectorOptions,
        detector: Arc<dyn Detector>,
        clock: Arc<dyn Clock>,
        models: Arc<ModelLoader>,
        store: Arc<ReferenceStore>,
        reference: SharedReference,
    ) -> Self {
        Self {
            config,
            options,
            detector,
            clock,
            models,
            store,
            reference,
            restored: AtomicBool::new(false),
        }
    }

    /// Restore a stored reference into memory. Returns true when one was found.
    pub fn restore(&self) -> bool {
        match self.store.load() {
            Some(template) => {
                log::info!("Restored face reference from session storage");
                *self.reference.write() = Some(EnrolledReference::new(template));
                self.restored.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub fn has_reference(&self) -> bool {
        self.reference.read().is_some()
    }

    pub fn current(&self) -> Option<EnrolledReference> {
        self.reference.read().clone()
    }

    pub async fn enroll(&self, source: EnrollmentSource) -> MonitorResult<EnrollmentResult> {
        if let Some(cached) = self.cached_result() {
            log::info!("Using cached face reference ({} samples)", cached.samples);
            return Ok(cached);
        }

        if !self.models.is_loaded() {
            return Err(MonitorError::NotReady("detector models not loaded".to_string()));
        }

        let method = source.method();
        let (capture, threshold) = match source {
            EnrollmentSource::LiveVideo(frames) => {
                (self.capture_live(frames.as_ref()).await?, self.config.video_threshold)
            }
            EnrollmentSource::StaticImage(frame) => {
                (self.capture_image(&frame).await?, self.config.image_threshold)
            }
            EnrollmentSource::Detections(detections) => {
                (self.capture_detections(detections)?, self.config.video_threshold)
            }
        };

        let template = BiometricTemplate::new(method, capture.samples, threshold)?;
        self.store.save(&template)?;

        let detection_score = template.samples().first().map(|s| s.quality);
        let samples = template.len();
        *self.reference.write() = Some(EnrolledReference::new(template));
        self.restored.store(false, Ordering::SeqCst);

        log::info!(
            "Face reference captured: {} samples via {:?}, threshold {}",
            samples,
            method,
            threshold
        );

        Ok(EnrollmentResult {
            samples,
            from_cache: false,
            from_storage: false,
            method,
            face_box: capture.face_box,
            detection_score,
            metadata: self.store.describe(),
        })
    }

    /// Forget the reference in memory and in the session store
    pub fn reset(&self) -> MonitorResult<()> {
        *self.reference.write() = None;
        self.restored.store(false, Ordering::SeqCst);
        self.store.clear()?;
        log::info!("Face reference reset");
        Ok(())
    }

    fn cached_result(&self) -> Option<EnrollmentResult> {
        let reference = self.reference.read().clone()?;
        let template = &reference.template;
        Some(EnrollmentResult {
            samples: template.len(),
            from_cache: true,
            from_storage: self.restored.load(Ordering::SeqCst),
            method: template.method(),
            face_box: None,
            detection_score: template.samples().first().map(|s| s.quality),
            metadata: self.store.describe(),
        })
    }

    async fn capture_live(&self, frames: &dyn FrameSource) -> MonitorResult<Capture> {
        self.wait_for_frame(frames).await?;

        let mut capture = Capture {
            samples: Vec::with_capacity(self.config.sample_attempts),
            face_box: None,
        };

        for attempt in 1..=self.config.sample_attempts {
            tokio::time::sleep(Duration::from_millis(self.config.sample_interval_ms)).await;

            let Some(frame) = frames.frame().filter(Frame::is_ready) else {
                log::debug!("Enrollment sample {}: video not ready", attempt);
                continue;
            };

            match self.detector.detect_face(&frame, &self.options).await {
                Ok(Some(face)) => {
                    if !self.push_sample(&mut capture, face) {
                        log::debug!("Enrollment sample {}: face without descriptor", attempt);
                    }
                }
                Ok(None) => log::debug!("Enrollment sample {}: no face", attempt),
                Err(e) => log::warn!("Enrollment sample {} failed: {}", attempt, e),
            }
        }

        let required = self.config.min_samples;
        if capture.samples.len() < required {
            log::warn!(
                "Enrollment aborted: {}/{} usable samples",
                capture.samples.len(),
                required
            );
            return Err(MonitorError::InsufficientSamples {
                captured: capture.samples.len(),
                required,
            });
        }
        Ok(capture)
    }

    async fn capture_image(&self, frame: &Frame) -> MonitorResult<Capture> {
        if !frame.is_ready() {
            return Err(MonitorError::NotReady("image has no dimensions".to_string()));
        }

        let mut capture = Capture {
            samples: Vec::with_capacity(1),
            face_box: None,
        };
        let face = self
            .detector
            .detect_face(frame, &self.options)
            .await?
            .ok_or(MonitorError::NoFaceDetected)?;

        if !self.push_sample(&mut capture, face) {
            return Err(MonitorError::NoFaceDetected);
        }
        Ok(capture)
    }

    fn capture_detections(&self, detections: Vec<FaceDetection>) -> MonitorResult<Capture> {
        let mut capture = Capture {
            samples: Vec::with_capacity(detections.len()),
            face_box: None,
        };
        for face in detections {
            self.push_sample(&mut capture, face);
        }

        if capture.samples.is_empty() {
            return Err(MonitorError::NoFaceDetected);
        }
        Ok(capture)
    }

    /// Keep a face as a sample; false when it carries no descriptor
    fn push_sample(&self, capture: &mut Capture, face: FaceDetection) -> bool {
        let Some(descriptor) = face.descriptor else {
            return false;
        };
        capture.face_box.get_or_insert(face.bbox);
        capture.samples.push(TemplateSample {
            descriptor,
            quality: face.score,
            captured_at_ms: self.clock.now_ms(),
        });
        true
    }

    async fn wait_for_frame(&self, frames: &dyn FrameSource) -> MonitorResult<()> {
        let deadline = tokio::time::Instant::now()
            + Duration::from_millis(self.config.frame_ready_timeout_ms);

        loop {
            if frames.frame().is_some_and(|f| f.is_ready()) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                log::warn!("Video never became ready for enrollment");
                return Err(MonitorError::NotReady("video not ready".to_string()));
            }
            tokio::time::sleep(Duration::from_millis(self.config.frame_ready_poll_ms)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::clock::TokioClock;
    use crate::logic::config::ModelConfig;
    use crate::logic::reference::MemorySessionStore;
    use crate::logic::testing::{centered_face, descriptor, test_frame, ScriptedDetector, StaticFrames};

    struct Fixture {
        engine: EnrollmentEngine,
        detector: Arc<ScriptedDetector>,
        session: Arc<MemorySessionStore>,
    }

    async fn fixture(detector: ScriptedDetector) -> Fixture {
        let detector = Arc::new(detector);
        let session = Arc::new(MemorySessionStore::new());
        let models = Arc::new(ModelLoader::new());
        models
            .ensure_loaded(detector.as_ref(), &ModelConfig::default())
            .await
            .unwrap();

        let engine = EnrollmentEngine::new(
            EnrollmentConfig::default(),
            DetectorOptions::default(),
            detector.clone(),
            Arc::new(TokioClock::new()),
            models,
            Arc::new(ReferenceStore::new(session.clone())),
            Arc::new(RwLock::new(None)),
        );
        Fixture { engine, detector, session }
    }

    fn live() -> EnrollmentSource {
        EnrollmentSource::LiveVideo(Arc::new(StaticFrames::new(test_frame())))
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_enrollment_uses_video_threshold() {
        let f = fixture(ScriptedDetector::new().with_face(Some(centered_face(0.0)))).await;

        let result = f.engine.enroll(live()).await.unwrap();

        assert_eq!(result.samples, 5);
        assert!(!result.from_cache);
        assert_eq!(result.method, EnrollmentMethod::LiveVideo);
        assert!(result.face_box.is_some());
        assert_eq!(result.metadata.as_ref().map(|m| m.samples_count), Some(5));

        let reference = f.engine.current().unwrap();
        assert_eq!(reference.matcher.threshold(), 0.5);
        assert_eq!(f.detector.detect_face_calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_too_few_samples_persists_nothing() {
        let detector = ScriptedDetector::new();
        detector.push_face(Ok(Some(centered_face(0.0))));
        // remaining attempts fall back to "no face"
        let f = fixture(detector).await;

        let err = f.engine.enroll(live()).await.unwrap_err();

        assert_eq!(err, MonitorError::InsufficientSamples { captured: 1, required: 2 });
        assert!(!f.engine.has_reference());
        assert!(f.session.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_reference_skips_sampling() {
        let f = fixture(ScriptedDetector::new().with_face(Some(centered_face(0.0)))).await;
        f.engine.enroll(live()).await.unwrap();
        let calls = f.detector.detect_face_calls();

        for _ in 0..2 {
            let again = f.engine.enroll(live()).await.unwrap();
            assert!(again.from_cache);
            assert_eq!(again.samples, 5);
        }
        assert_eq!(f.detector.detect_face_calls(), calls);
    }

    #[tokio::test]
    async fn test_image_enrollment() {
        let f = fixture(ScriptedDetector::new().with_face(Some(centered_face(0.1)))).await;

        let result = f
            .engine
            .enroll(EnrollmentSource::StaticImage(test_frame()))
            .await
            .unwrap();

        assert_eq!(result.samples, 1);
        assert_eq!(result.method, EnrollmentMethod::StaticImage);
        assert_eq!(f.engine.current().unwrap().matcher.threshold(), 0.6);
    }

    #[tokio::test]
    async fn test_image_without_face() {
        let f = fixture(ScriptedDetector::new()).await;

        let err = f
            .engine
            .enroll(EnrollmentSource::StaticImage(test_frame()))
            .await
            .unwrap_err();
        assert_eq!(err, MonitorError::NoFaceDetected);
    }

    #[tokio::test]
    async fn test_imported_detections() {
        let f = fixture(ScriptedDetector::new()).await;
        let mut no_descriptor = centered_face(0.0);
        no_descriptor.descriptor = None;

        let result = f
            .engine
            .enroll(EnrollmentSource::Detections(vec![no_descriptor, centered_face(0.2)]))
            .await
            .unwrap();

        assert_eq!(result.samples, 1);
        assert_eq!(result.method, EnrollmentMethod::Imported);
        let reference = f.engine.current().unwrap();
        assert_eq!(reference.template.samples()[0].descriptor, descriptor(0.2));
        assert_eq!(f.detector.detect_face_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_wait_is_bounded() {
        let f = fixture(ScriptedDetector::new().with_face(Some(centered_face(0.0)))).await;
        let started = tokio::time::Instant::now();

        let err = f
            .engine
            .enroll(EnrollmentSource::LiveVideo(Arc::new(StaticFrames::empty())))
            .await
            .unwrap_err();

        assert!(matches!(err, MonitorError::NotReady(_)));
        assert!(started.elapsed() >= Duration::from_millis(10_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_then_restore() {
        let f = fixture(ScriptedDetector::new().with_face(Some(centered_face(0.0)))).await;
        f.engine.enroll(live()).await.unwrap();

        // a second engine over the same session sees the stored record
        *f.engine.reference.write() = None;
        assert!(f.engine.restore());
        let cached = f.engine.enroll(live()).await.unwrap();
        assert!(cached.from_cache);
        assert!(cached.from_storage);

        f.engine.reset().unwrap();
        assert!(!f.engine.has_reference());
        assert!(f.session.is_empty());
        assert!(!f.engine.restore());
    }

    #[tokio::test]
    async fn test_models_must_be_loaded() {
        let engine = EnrollmentEngine::new(
            EnrollmentConfig::default(),
            DetectorOptions::default(),
            Arc::new(ScriptedDetector::new()),
            Arc::new(TokioClock::new()),
            Arc::new(ModelLoader::new()),
            Arc::new(ReferenceStore::new(Arc::new(MemorySessionStore::new()))),
            Arc::new(RwLock::new(None)),
        );

        let err = engine
            .enroll(EnrollmentSource::StaticImage(test_frame()))
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::NotReady(_)));
    }
}
