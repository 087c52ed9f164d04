//! Body-pose keypoints

use serde::{Deserialize, Serialize};

/// Position in headset world space (meters)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// JSON has no NaN or infinity, serde_json writes them as `null`
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A keypoint as exposed by the pose source, before indexing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedKeypoint {
    pub position: Vec3,
    pub active: bool,
}

/// One keypoint on the wire
///
/// `index` is the position of the joint in the pose model's joint sequence.
/// It stays stable even when neighbouring joints are filtered out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeypointRecord {
    pub index: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub active: bool,
}

impl KeypointRecord {
    pub fn new(index: u32, position: Vec3, active: bool) -> Self {
        Self { index, x: position.x, y: position.y, z: position.z, active }
    }
}

/// Ordered keypoints of one pose sample, possibly empty
///
/// An empty snapshot means the pose subsystem is running but tracks nothing;
/// it still serializes as `{"keypoints":[]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSnapshot {
    pub keypoints: Vec<KeypointRecord>,
}

impl PoseSnapshot {
    pub fn new(keypoints: Vec<KeypointRecord>) -> Self {
        Self { keypoints }
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    /// Number of keypoints flagged active
    pub fn active_count(&self) -> usize {
        self.keypoints.iter().filter(|k| k.active).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypoint_serializes_flat() {
        let record = KeypointRecord::new(5, Vec3::new(0.5, 1.25, -2.0), true);
        let json = serde_json::to_value(record).unwrap();

        assert_eq!(json["index"], 5);
        assert_eq!(json["x"], 0.5);
        assert_eq!(json["y"], 1.25);
        assert_eq!(json["z"], -2.0);
        assert_eq!(json["active"], true);
    }

    #[test]
    fn nan_and_infinity_are_not_finite() {
        assert!(Vec3::new(0.0, -1.5, 3.0).is_finite());
        assert!(!Vec3::new(f32::NAN, 0.0, 0.0).is_finite());
        assert!(!Vec3::new(0.0, 0.0, f32::NEG_INFINITY).is_finite());
    }

    #[test]
    fn empty_snapshot_keeps_keypoints_field() {
        let json = serde_json::to_string(&PoseSnapshot::default()).unwrap();
        assert_eq!(json, r#"{"keypoints":[]}"#);
    }

    #[test]
    fn active_count_ignores_inactive_joints() {
        let snapshot = PoseSnapshot::new(vec![
            KeypointRecord::new(0, Vec3::default(), true),
            KeypointRecord::new(1, Vec3::default(), false),
            KeypointRecord::new(2, Vec3::default(), true),
        ]);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.active_count(), 2);
    }
}
