use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DETECTOR_INPUT_SIZE, DEFAULT_MIN_FACE_SCORE};

/// Bytes per pixel of a `Frame` (packed RGB)
pub const FRAME_CHANNELS: usize = 3;

/// One captured video frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Packed RGB8, row-major
    pub pixels: Arc<[u8]>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// Solid-colour frame
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels: Vec<u8> = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * FRAME_CHANNELS)
            .collect();
        Self::new(width, height, pixels)
    }

    /// Frame has positive dimensions
    pub fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Pixel buffer length agrees with the dimensions
    pub fn is_well_formed(&self) -> bool {
        self.pixels.len() == self.width as usize * self.height as usize * FRAME_CHANNELS
    }
}

/// Axis-aligned box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Landmark point (pixel or normalized, depending on the producer)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Single-face detector output
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetection {
    pub bbox: BoundingBox,
    pub landmarks: Vec<Point>,
    pub descriptor: Option<Vec<f32>>,
    pub score: f32,
}

/// Normalized face mesh used for head-pose estimation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaceMesh {
    pub landmarks: Vec<Point>,
}

/// Object classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDetection {
    pub class: String,
    pub score: f32,
    pub bbox: BoundingBox,
}

/// Options passed to `detect_face`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorOptions {
    pub min_score: f32,
    pub input_size: u32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_FACE_SCORE,
            input_size: DEFAULT_DETECTOR_INPUT_SIZE,
        }
    }
}
