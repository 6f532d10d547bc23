//! Head-pose classification from a normalized face mesh.

use super::types::HeadDirection;
use crate::logic::detector::{FaceMesh, Point};

/// Mesh landmark indices
const NOSE_TIP: usize = 1;
const LEFT_EYE_OUTER: usize = 33;
const RIGHT_EYE_OUTER: usize = 263;
const FOREHEAD: usize = 10;
const CHIN: usize = 152;

/// Classify gaze direction. Meshes too small to index count as center.
///
/// Looking down (at the desk) is reported as center.
pub fn classify(mesh: &FaceMesh, yaw_threshold: f32, pitch_threshold: f32) -> HeadDirection {
    let lm = &mesh.landmarks;
    let (Some(nose), Some(eye_l), Some(eye_r), Some(forehead), Some(chin)) = (
        lm.get(NOSE_TIP),
        lm.get(LEFT_EYE_OUTER),
        lm.get(RIGHT_EYE_OUTER),
        lm.get(FOREHEAD),
        lm.get(CHIN),
    ) else {
        return HeadDirection::Center;
    };

    let dx = nose.x - midpoint(eye_l, eye_r).x;
    let dy = nose.y - midpoint(forehead, chin).y;

    if dy < -pitch_threshold {
        HeadDirection::Up
    } else if dy > pitch_threshold {
        HeadDirection::Center
    } else if dx > yaw_threshold {
        HeadDirection::Left
    } else if dx < -yaw_threshold {
        HeadDirection::Right
    } else {
        HeadDirection::Center
    }
}

fn midpoint(a: &Point, b: &Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}
