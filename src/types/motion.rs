//! Headset and controller transforms

use serde::{Deserialize, Serialize};

use super::Vec3;

/// Orientation quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.z, self.w].iter().all(|v| v.is_finite())
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Position and orientation of one tracked device
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose3 {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose3 {
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

/// Headset and both hands, sampled together at send time
///
/// The wire layout is flat, one position and one rotation per device, using
/// the field names the processing server already understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSnapshot {
    pub headset_position: Vec3,
    pub headset_rotation: Quat,
    pub left_hand_position: Vec3,
    pub left_hand_rotation: Quat,
    pub right_hand_position: Vec3,
    pub right_hand_rotation: Quat,
}

impl MotionSnapshot {
    pub fn from_devices(headset: Pose3, left_hand: Pose3, right_hand: Pose3) -> Self {
        Self {
            headset_position: headset.position,
            headset_rotation: headset.rotation,
            left_hand_position: left_hand.position,
            left_hand_rotation: left_hand.rotation,
            right_hand_position: right_hand.position,
            right_hand_rotation: right_hand.rotation,
        }
    }

    /// Whether every component can be written as a JSON number
    pub fn is_finite(&self) -> bool {
        [self.headset_position, self.left_hand_position, self.right_hand_position]
            .iter()
            .all(Vec3::is_finite)
            && [self.headset_rotation, self.left_hand_rotation, self.right_hand_rotation]
                .iter()
                .all(Quat::is_finite)
    }
}
