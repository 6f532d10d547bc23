//! Scripted collaborators shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::detector::{
    AudioSource, BoundingBox, Detector, DetectorOptions, FaceDetection, FaceMesh, Frame,
    FrameSource, ObjectDetection, Point,
};
use super::error::DetectorError;
use super::events::{AlertEvent, Notifier, SignalKind, StatusUpdate};
use super::evidence::{Evidence, EvidenceSink};

pub const DESCRIPTOR_LEN: usize = 128;
pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 128-d descriptor whose first component is `v`, rest zero
pub fn descriptor(v: f32) -> Vec<f32> {
    let mut d = vec![0.0; DESCRIPTOR_LEN];
    d[0] = v;
    d
}

pub fn test_frame() -> Frame {
    Frame::filled(FRAME_WIDTH, FRAME_HEIGHT, [90, 120, 150])
}

/// Face at the frame centre carrying `descriptor(v)`
pub fn centered_face(v: f32) -> FaceDetection {
    face_at(BoundingBox::new(220.0, 140.0, 200.0, 200.0), Some(descriptor(v)))
}

pub fn face_at(bbox: BoundingBox, descriptor: Option<Vec<f32>>) -> FaceDetection {
    FaceDetection {
        bbox,
        landmarks: Vec::new(),
        descriptor,
        score: 0.92,
    }
}

/// 468-point mesh with the nose offset by (dx, dy) from the face centre
pub fn mesh_with_offsets(dx: f32, dy: f32) -> FaceMesh {
    let mut landmarks = vec![Point::new(0.5, 0.5); 468];
    landmarks[1] = Point::new(0.5 + dx, 0.5 + dy);
    landmarks[33] = Point::new(0.4, 0.4);
    landmarks[263] = Point::new(0.6, 0.4);
    landmarks[10] = Point::new(0.5, 0.3);
    landmarks[152] = Point::new(0.5, 0.7);
    FaceMesh { landmarks }
}

pub fn object(class: &str, score: f32) -> ObjectDetection {
    ObjectDetection {
        class: class.to_string(),
        score,
        bbox: BoundingBox::new(10.0, 10.0, 50.0, 80.0),
    }
}

// ============================================
// Detector
// ============================================

pub type FaceScript = Result<Option<FaceDetection>, DetectorError>;

/// Detector double: queued answers first, then the fallback
pub struct ScriptedDetector {
    model_failures: AtomicU32,
    model_load_calls: AtomicU32,
    faces: Mutex<VecDeque<FaceScript>>,
    fallback_face: Mutex<FaceScript>,
    meshes: Mutex<Vec<FaceMesh>>,
    objects: Mutex<Vec<ObjectDetection>>,
    latency: Duration,
    face_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self {
            model_failures: AtomicU32::new(0),
            model_load_calls: AtomicU32::new(0),
            faces: Mutex::new(VecDeque::new()),
            fallback_face: Mutex::new(Ok(None)),
            meshes: Mutex::new(Vec::new()),
            objects: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
            face_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn fail_model_loads(self, n: u32) -> Self {
        self.model_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_face(self, face: Option<FaceDetection>) -> Self {
        *self.fallback_face.lock() = Ok(face);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_meshes(self, meshes: Vec<FaceMesh>) -> Self {
        *self.meshes.lock() = meshes;
        self
    }

    pub fn with_objects(self, objects: Vec<ObjectDetection>) -> Self {
        *self.objects.lock() = objects;
        self
    }

    pub fn set_face(&self, face: FaceScript) {
        *self.fallback_face.lock() = face;
    }

    pub fn push_face(&self, face: FaceScript) {
        self.faces.lock().push_back(face);
    }

    pub fn model_load_calls(&self) -> u32 {
        self.model_load_calls.load(Ordering::SeqCst)
    }

    pub fn detect_face_calls(&self) -> usize {
        self.face_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    async fn load_models(&self) -> Result<(), DetectorError> {
        self.model_load_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.model_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.model_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(DetectorError::new("model fetch failed"));
        }
        Ok(())
    }

    async fn detect_face(
        &self,
        _frame: &Frame,
        _options: &DetectorOptions,
    ) -> Result<Option<FaceDetection>, DetectorError> {
        self.face_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let queued = self.faces.lock().pop_front();
        let answer = queued.unwrap_or_else(|| self.fallback_face.lock().clone());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        answer
    }

    async fn detect_objects(&self, _frame: &Frame) -> Result<Vec<ObjectDetection>, DetectorError> {
        Ok(self.objects.lock().clone())
    }

    async fn detect_face_meshes(&self, _frame: &Frame) -> Result<Vec<FaceMesh>, DetectorError> {
        Ok(self.meshes.lock().clone())
    }
}

// ============================================
// Sources
// ============================================

#[derive(Default)]
pub struct StaticFrames {
    frame: Mutex<Option<Frame>>,
}

impl StaticFrames {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame: Mutex::new(Some(frame)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn set(&self, frame: Option<Frame>) {
        *self.frame.lock() = frame;
    }
}

impl FrameSource for StaticFrames {
    fn frame(&self) -> Option<Frame> {
        self.frame.lock().clone()
    }
}

/// Audio source with every bin at one level
#[derive(Default)]
pub struct ConstantAudio {
    level: Mutex<Option<u8>>,
}

impl ConstantAudio {
    pub fn new(level: u8) -> Self {
        Self {
            level: Mutex::new(Some(level)),
        }
    }

    pub fn set(&self, level: u8) {
        *self.level.lock() = Some(level);
    }
}

impl AudioSource for ConstantAudio {
    fn frequency_bins(&self) -> Option<Vec<u8>> {
        let level = *self.level.lock();
        level.map(|level| vec![level; 64])
    }
}

// ============================================
// Sinks
// ============================================

#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<AlertEvent>>,
    statuses: Mutex<Vec<StatusUpdate>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<AlertEvent> {
        self.alerts.lock().clone()
    }

    pub fn alerts_for(&self, signal: SignalKind) -> usize {
        self.alerts.lock().iter().filter(|a| a.signal == signal).count()
    }

    pub fn statuses(&self) -> Vec<StatusUpdate> {
        self.statuses.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, alert: &AlertEvent) -> Result<(), String> {
        self.alerts.lock().push(alert.clone());
        Ok(())
    }

    fn status(&self, update: &StatusUpdate) -> Result<(), String> {
        self.statuses.lock().push(update.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    submitted: Mutex<Vec<Evidence>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that rejects every submission
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn submitted(&self) -> Vec<Evidence> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl EvidenceSink for RecordingSink {
    async fn submit(&self, evidence: Evidence) -> Result<(), String> {
        if self.fail {
            return Err("upload rejected".to_string());
        }
        self.submitted.lock().push(evidence);
        Ok(())
    }
}
