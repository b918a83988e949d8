//! Hand landmark names and the 2-D keypoints the detector hands us each frame.

use crate::types::PixelPos;

/// Number of landmarks in a complete hand.
pub const LANDMARK_COUNT: usize = 21;

/// A landmark position in frame pixel coordinates (y grows downwards).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
}

impl Keypoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Keypoint) -> Keypoint {
        Keypoint::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    pub fn to_pixel(self) -> PixelPos {
        PixelPos::new(self.x.round() as i32, self.y.round() as i32)
    }

    pub(crate) fn sub(self, other: Keypoint) -> (f32, f32) {
        (self.x - other.x, self.y - other.y)
    }
}

/// Names for the hand landmarks, in the order the detector emits them.
///
/// - **CMC**: carpometacarpal joint, the lowest joint of the thumb.
/// - **MCP**: metacarpophalangeal joint, the knuckles near the palm.
/// - **PIP**: proximal interphalangeal joint, between the MCP and DIP.
/// - **IP**: the thumb's single interphalangeal joint.
/// - **DIP**: distal interphalangeal joint, the highest joint of a finger.
/// - **Tip**: placed on the tip of the finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl LandmarkIdx {
    #[inline]
    pub fn of(self, hand: &[Keypoint]) -> Keypoint {
        hand[self as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    pub fn tip(self) -> LandmarkIdx {
        match self {
            Finger::Thumb => LandmarkIdx::ThumbTip,
            Finger::Index => LandmarkIdx::IndexFingerTip,
            Finger::Middle => LandmarkIdx::MiddleFingerTip,
            Finger::Ring => LandmarkIdx::RingFingerTip,
            Finger::Pinky => LandmarkIdx::PinkyTip,
        }
    }

    /// The joint the tip is compared against when deciding extended vs curled.
    pub fn lower_joint(self) -> LandmarkIdx {
        match self {
            Finger::Thumb => LandmarkIdx::ThumbIp,
            Finger::Index => LandmarkIdx::IndexFingerPip,
            Finger::Middle => LandmarkIdx::MiddleFingerPip,
            Finger::Ring => LandmarkIdx::RingFingerPip,
            Finger::Pinky => LandmarkIdx::PinkyPip,
        }
    }
}
