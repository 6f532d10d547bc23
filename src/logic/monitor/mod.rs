//! Integrity Monitor - Session Facade
//!
//! One `IntegrityMonitor` per monitoring session. It owns the reference
//! store, enrollment engine, verification cycle, fusion policy and the
//! scheduler that drives four polling loops:
//!
//! | Loop      | Source                  | Feeds                          |
//! |-----------|-------------------------|--------------------------------|
//! | identity  | `verify_once`           | status updates, identity alert |
//! | faces     | `detect_face_meshes`    | multi-face, head-pose alerts   |
//! | objects   | `detect_objects`        | forbidden-object alerts        |
//! | sound     | `frequency_bins`        | sound alerts                   |


use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::config::MonitorConfig;
use super::detector::{AudioSource, Detector, DetectorOptions, Frame, FrameSource, ModelLoader};
use super::enrollment::{EnrollmentEngine, EnrollmentResult, EnrollmentSource, SharedReference};
use super::error::{MonitorError, MonitorResult};
use super::events::{emit_status, LogNotifier, Notifier};
use super::evidence::{AlertDispatcher, EvidenceSink, NullEvidenceSink};
use super::fusion::{FusedAlert, FusionPolicy};
use super::reference::{MemorySessionStore, ReferenceMetadata, ReferenceStore, SessionStore};
use super::scheduler::MonitoringScheduler;
use super::verification::{
    DetectionResult, QualityReport, StabilityVerdict, StatusTracker, VerificationCycle,
};

/// Collaborators injected into a monitor
#[derive(Clone)]
pub struct MonitorDeps {
    pub detector: Arc<dyn Detector>,
    pub frames: Arc<dyn FrameSource>,
    pub audio: Arc<dyn AudioSource>,
    pub session: Arc<dyn SessionStore>,
    pub notifier: Arc<dyn Notifier>,
    pub evidence: Arc<dyn EvidenceSink>,
    pub clock: Arc<dyn Clock>,
}

impl MonitorDeps {
    /// In-memory session, log-only notifier, no evidence upload, wall clock
    pub fn new(
        detector: Arc<dyn Detector>,
        frames: Arc<dyn FrameSource>,
        audio: Arc<dyn AudioSource>,
    ) -> Self {
        Self {
            detector,
            frames,
            audio,
            session: Arc::new(MemorySessionStore::new()),
            notifier: Arc::new(LogNotifier),
            evidence: Arc::new(NullEvidenceSink),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = session;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_evidence(mut self, evidence: Arc<dyn EvidenceSink>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

struct MonitorInner {
    config: MonitorConfig,
    detector: Arc<dyn Detector>,
    frames: Arc<dyn FrameSource>,
    audio: Arc<dyn AudioSource>,
    clock: Arc<dyn Clock>,
    models: Arc<ModelLoader>,
    store: Arc<ReferenceStore>,
    enrollment: EnrollmentEngine,
    verification: VerificationCycle,
    fusion: Mutex<FusionPolicy>,
    status: Mutex<StatusTracker>,
    dispatcher: AlertDispatcher,
}

pub struct IntegrityMonitor {
    session_id: Uuid,
    inner: Arc<MonitorInner>,
    scheduler: MonitoringScheduler,
}

impl IntegrityMonitor {
    /// Build a monitor and restore any reference left in the session store
    pub fn new(config: MonitorConfig, deps: MonitorDeps) -> Self {
        let models = Arc::new(ModelLoader::new());
        let store = Arc::new(ReferenceStore::new(deps.session.clone()));
        let reference: SharedReference = Arc::default();
        let options = DetectorOptions {
            min_score: config.verification.min_face_score,
            input_size: config.verification.input_size,
        };

        let enrollment = EnrollmentEngine::new(
            config.enrollment.clone(),
            options,
            deps.detector.clone(),
            deps.clock.clone(),
            models.clone(),
            store.clone(),
            reference.clone(),
        );
        let verification = VerificationCycle::new(
            config.verification.clone(),
            deps.detector.clone(),
            deps.frames.clone(),
            deps.clock.clone(),
            models.clone(),
            reference,
        );
        let dispatcher = AlertDispatcher::new(
            deps.notifier.clone(),
            deps.evidence.clone(),
            deps.frames.clone(),
            deps.clock.clone(),
            config.evidence.clone(),
        );
        let fusion = Mutex::new(FusionPolicy::new(config.alerts.clone()));

        enrollment.restore();

        let session_id = Uuid::new_v4();
        log::info!("Integrity monitor created (session {})", session_id);

        Self {
            session_id,
            inner: Arc::new(MonitorInner {
                config,
                detector: deps.detector,
                frames: deps.frames,
                audio: deps.audio,
                clock: deps.clock,
                models,
                store,
                enrollment,
                verification,
                fusion,
                status: Mutex::new(StatusTracker::new()),
                dispatcher,
            }),
            scheduler: MonitoringScheduler::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    // ============================================
    // Lifecycle
    // ============================================

    /// Load detector models (bounded retry)
    pub async fn initialize(&self) -> MonitorResult<()> {
        let inner = &self.inner;
        inner
            .models
            .ensure_loaded(inner.detector.as_ref(), &inner.config.models)
            .await
    }

    pub fn is_ready(&self) -> bool {
        self.inner.models.is_loaded()
    }

    /// Start every polling loop with fresh history, quality and alert state
    pub fn start(&self) -> MonitorResult<()> {
        if !self.is_ready() {
            return Err(MonitorError::NotReady("detector models not loaded".to_string()));
        }
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(MonitorError::NotReady("no async runtime to run the loops".to_string()));
        }
        if self.scheduler.is_active() {
            log::debug!("Monitoring already active");
            return Ok(());
        }

        self.inner.reset_session_state();
        self.scheduler.activate();

        let intervals = &self.inner.config.scheduler;
        self.spawn("identity", intervals.identity_interval_ms, |inner| async move {
            inner.identity_cycle().await
        });
        self.spawn("faces", intervals.head_pose_interval_ms, |inner| async move {
            inner.face_cycle().await
        });
        self.spawn("objects", intervals.object_interval_ms, |inner| async move {
            inner.object_cycle().await
        });
        self.spawn("sound", intervals.sound_interval_ms, |inner| async move {
            inner.sound_cycle()
        });

        log::info!("Monitoring started (session {})", self.session_id);
        Ok(())
    }

    pub fn stop(&self) {
        if self.scheduler.is_active() {
            log::info!("Monitoring stopped (session {})", self.session_id);
        }
        self.scheduler.stop();
    }

    pub fn is_monitoring(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Stop monitoring and destroy the session's reference
    pub fn end_session(&self) -> MonitorResult<()> {
        self.stop();
        self.reset_reference()?;
        self.inner.models.unload();
        log::info!("Session {} ended", self.session_id);
        Ok(())
    }

    // ============================================
    // Enrollment
    // ============================================

    pub async fn enroll(&self, source: EnrollmentSource) -> MonitorResult<EnrollmentResult> {
        let result = self.inner.enrollment.enroll(source).await?;
        if !result.from_cache {
            self.inner.reset_session_state();
        }
        Ok(result)
    }

    /// Drop the reference so the next `enroll` samples again
    pub fn reset_reference(&self) -> MonitorResult<()> {
        self.inner.enrollment.reset()?;
        self.inner.reset_session_state();
        Ok(())
    }

    pub fn has_reference(&self) -> bool {
        self.inner.enrollment.has_reference()
    }

    pub fn reference_info(&self) -> Option<ReferenceMetadata> {
        self.inner.store.describe()
    }

    // ============================================
    // Queries
    // ============================================

    pub async fn verify_once(&self) -> DetectionResult {
        self.inner.verification.verify_once().await
    }

    pub fn current_stability(&self) -> StabilityVerdict {
        self.inner.verification.stability()
    }

    pub fn detection_quality(&self) -> QualityReport {
        self.inner.verification.quality()
    }

    pub fn history(&self) -> Vec<DetectionResult> {
        self.inner.verification.history()
    }

    /// Collaborator closed an object notification
    pub fn dismiss_object(&self, class: &str) {
        let now = self.inner.clock.now_ms();
        self.inner.fusion.lock().dismiss_object(class, now);
    }

    fn spawn<F, Fut>(&self, name: &'static str, interval_ms: u64, cycle: F)
    where
        F: Fn(Arc<MonitorInner>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let inner = self.inner.clone();
        self.scheduler
            .spawn_loop(name, Duration::from_millis(interval_ms), move || cycle(inner.clone()));
    }
}

impl MonitorInner {
    fn reset_session_state(&self) {
        self.verification.reset();
        self.fusion.lock().reset();
        self.status.lock().reset();
    }

    fn ready_frame(&self) -> Option<Frame> {
        self.frames.frame().filter(Frame::is_ready)
    }

    fn dispatch_all(&self, alerts: Vec<FusedAlert>) {
        for alert in &alerts {
            self.dispatcher.dispatch(alert);
        }
    }

    async fn identity_cycle(&self) {
        let result = self.verification.verify_once().await;

        let update = self.status.lock().observe(&result);
        if let Some(update) = update {
            emit_status(self.dispatcher.notifier(), &update);
        }

        let alert = self.fusion.lock().observe_identity(&result, self.clock.now_ms());
        self.dispatch_all(alert.into_iter().collect());
    }

    async fn face_cycle(&self) {
        let Some(frame) = self.ready_frame() else {
            return;
        };
        match self.detector.detect_face_meshes(&frame).await {
            Ok(meshes) => {
                let alerts = self.fusion.lock().observe_faces(&meshes, self.clock.now_ms());
                self.dispatch_all(alerts);
            }
            Err(e) => log::debug!("Face mesh detection failed: {}", e),
        }
    }

    async fn object_cycle(&self) {
        let Some(frame) = self.ready_frame() else {
            return;
        };
        match self.detector.detect_objects(&frame).await {
            Ok(detections) => {
                let alerts = self.fusion.lock().observe_objects(&detections, self.clock.now_ms());
                self.dispatch_all(alerts);
            }
            Err(e) => log::debug!("Object detection failed: {}", e),
        }
    }

    fn sound_cycle(&self) {
        let Some(bins) = self.audio.frequency_bins() else {
            return;
        };
        let alert = self.fusion.lock().observe_sound(&bins, self.clock.now_ms());
        self.dispatch_all(alert.into_iter().collect());
    }
}
