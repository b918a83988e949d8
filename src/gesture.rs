//! Finger-pose gesture classification.
//!
//! A pure mapping from one frame's hand keypoints to a [`Gesture`]. Each finger is judged
//! "extended" or "curled" by projecting tip-minus-lower-joint onto an axis derived from the hand
//! itself, so the result does not depend on how the hand is rotated or whether the camera image
//! is mirrored:
//!
//! - index..pinky use the hand's *up* axis (wrist towards the middle-finger knuckle),
//! - the thumb uses the *lateral* axis (pinky knuckle towards index knuckle, orthogonal to up).
//!
//! Thresholds are fractions of the hand scale (wrist to middle-finger knuckle distance).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::landmark::{Finger, Keypoint, LandmarkIdx, LANDMARK_COUNT};

/// Hands smaller than this (in pixels, wrist to middle knuckle) are treated as noise.
const MIN_HAND_SCALE: f32 = 1.0;

/// The recognised pose for one frame, with the position each pose needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// No hand, or a finger pattern that maps to nothing.
    None,
    /// Only the index finger extended: draw at `tip`.
    IndexUp { tip: Keypoint },
    /// Index and middle extended: pan, tracking `center` (midpoint of both tips).
    TwoUp { center: Keypoint },
    /// Only the thumb extended: clear everything.
    ThumbUp,
    /// Only the pinky extended: solve what is drawn.
    PinkyUp,
}

impl Gesture {
    pub fn kind(&self) -> GestureKind {
        match self {
            Gesture::None => GestureKind::None,
            Gesture::IndexUp { .. } => GestureKind::IndexUp,
            Gesture::TwoUp { .. } => GestureKind::TwoUp,
            Gesture::ThumbUp => GestureKind::ThumbUp,
            Gesture::PinkyUp => GestureKind::PinkyUp,
        }
    }
}

/// [`Gesture`] without its payload, for logging and frame-to-frame comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureKind {
    #[default]
    None,
    IndexUp,
    TwoUp,
    ThumbUp,
    PinkyUp,
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GestureKind::None => "NONE",
            GestureKind::IndexUp => "DRAW",
            GestureKind::TwoUp => "MOVE",
            GestureKind::ThumbUp => "CLEAR",
            GestureKind::PinkyUp => "SOLVE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureThresholds {
    /// Minimum tip-past-PIP distance along the up axis, as a fraction of hand scale.
    pub finger_extension: f32,
    /// Minimum tip-past-IP distance along the lateral axis, as a fraction of hand scale.
    pub thumb_extension: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            finger_extension: 0.10,
            thumb_extension: 0.10,
        }
    }
}

/// Extended/curled state of all five fingers, one bit per finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerSet(u8);

impl FingerSet {
    pub fn only(fingers: &[Finger]) -> Self {
        let mut set = Self::default();
        for &f in fingers {
            set.insert(f);
        }
        set
    }

    pub fn insert(&mut self, finger: Finger) {
        self.0 |= 1 << finger as u8;
    }

    pub fn contains(self, finger: Finger) -> bool {
        self.0 & (1 << finger as u8) != 0
    }
}

/// Works out which fingers are extended.
///
/// Returns `None` for an incomplete landmark set or a degenerate (collapsed) hand.
pub fn finger_states(hand: &[Keypoint], thresholds: &GestureThresholds) -> Option<FingerSet> {
    if hand.len() < LANDMARK_COUNT {
        return None;
    }

    let wrist = LandmarkIdx::Wrist.of(hand);
    let (ux, uy) = LandmarkIdx::MiddleFingerMcp.of(hand).sub(wrist);
    let scale = (ux * ux + uy * uy).sqrt();
    // also rejects NaN coordinates
    if !(scale >= MIN_HAND_SCALE) {
        return None;
    }
    let up = (ux / scale, uy / scale);

    let (sx, sy) = LandmarkIdx::IndexFingerMcp
        .of(hand)
        .sub(LandmarkIdx::PinkyMcp.of(hand));
    let along = sx * up.0 + sy * up.1;
    let (lx, ly) = (sx - along * up.0, sy - along * up.1);
    let lateral_len = (lx * lx + ly * ly).sqrt();
    if !(lateral_len >= 1e-3 * scale) {
        return None;
    }
    let lateral = (lx / lateral_len, ly / lateral_len);

    let mut set = FingerSet::default();
    for finger in Finger::ALL {
        let (dx, dy) = finger.tip().of(hand).sub(finger.lower_joint().of(hand));
        let (axis, threshold) = match finger {
            Finger::Thumb => (lateral, thresholds.thumb_extension),
            _ => (up, thresholds.finger_extension),
        };
        if dx * axis.0 + dy * axis.1 > threshold * scale {
            set.insert(finger);
        }
    }
    Some(set)
}

/// Classifies one frame. `hand` is `None` when the detector saw no hand.
///
/// Patterns outside the four known poses yield [`Gesture::None`]; no closest-match guessing.
pub fn classify(hand: Option<&[Keypoint]>, thresholds: &GestureThresholds) -> Gesture {
    let Some(hand) = hand else {
        return Gesture::None;
    };
    let Some(set) = finger_states(hand, thresholds) else {
        return Gesture::None;
    };

    if set == FingerSet::only(&[Finger::Index]) {
        Gesture::IndexUp {
            tip: LandmarkIdx::IndexFingerTip.of(hand),
        }
    } else if set == FingerSet::only(&[Finger::Index, Finger::Middle]) {
        let center = LandmarkIdx::IndexFingerTip
            .of(hand)
            .midpoint(LandmarkIdx::MiddleFingerTip.of(hand));
        Gesture::TwoUp { center }
    } else if set == FingerSet::only(&[Finger::Thumb]) {
        Gesture::ThumbUp
    } else if set == FingerSet::only(&[Finger::Pinky]) {
        Gesture::PinkyUp
    } else {
        Gesture::None
    }
}

/// Synthetic hands for tests: an upright hand in hand-local units, then rotated/scaled/mirrored
/// into frame pixels.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    // (u, v): u towards the thumb side, v towards the fingertips; wrist at the origin.
    const MCPS: [(f32, f32); 4] = [(0.35, 0.95), (0.0, 1.0), (-0.25, 0.95), (-0.5, 0.85)];

    pub struct Pose {
        pub extended: [bool; 5],
        pub angle_deg: f32,
        pub mirrored: bool,
        pub scale: f32,
        pub origin: (f32, f32),
    }

    impl Pose {
        pub fn new(extended: [bool; 5]) -> Self {
            Self { extended, angle_deg: 0.0, mirrored: false, scale: 100.0, origin: (320.0, 400.0) }
        }

        pub fn rotated(mut self, angle_deg: f32) -> Self {
            self.angle_deg = angle_deg;
            self
        }

        pub fn mirrored(mut self) -> Self {
            self.mirrored = true;
            self
        }

        pub fn at(mut self, x: f32, y: f32) -> Self {
            self.origin = (x, y);
            self
        }

        pub fn keypoints(&self) -> Vec<Keypoint> {
            let t = self.angle_deg.to_radians();
            // image y grows downwards, so "up" for an upright hand is -y
            let up = (t.sin(), -t.cos());
            let side = if self.mirrored { -1.0 } else { 1.0 };
            let lateral = (side * t.cos(), side * t.sin());
            let map = |(u, v): (f32, f32)| {
                Keypoint::new(
                    self.origin.0 + self.scale * (u * lateral.0 + v * up.0),
                    self.origin.1 + self.scale * (u * lateral.1 + v * up.1),
                )
            };

            let mut local = vec![(0.0, 0.0)];
            let thumb_tip = if self.extended[0] { (0.8, 0.7) } else { (0.45, 0.7) };
            local.extend([(0.25, 0.2), (0.45, 0.4), (0.6, 0.55), thumb_tip]);
            for (i, &(u, v)) in MCPS.iter().enumerate() {
                let tip = if self.extended[i + 1] { v + 0.75 } else { v + 0.1 };
                let dip = if self.extended[i + 1] { v + 0.5 } else { v + 0.2 };
                local.extend([(u, v), (u, v + 0.3), (u, dip), (u, tip)]);
            }
            local.into_iter().map(map).collect()
        }
    }

    pub fn hand(extended: [bool; 5]) -> Vec<Keypoint> {
        Pose::new(extended).keypoints()
    }

    pub const INDEX: [bool; 5] = [false, true, false, false, false];
    pub const TWO: [bool; 5] = [false, true, true, false, false];
    pub const THUMB: [bool; 5] = [true, false, false, false, false];
    pub const PINKY: [bool; 5] = [false, false, false, false, true];
    pub const FIST: [bool; 5] = [false; 5];
}
