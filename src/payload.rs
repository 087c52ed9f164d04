//! Uplink payload assembly
//!
//! The payload is a flat JSON object. Absent parts are left out entirely
//! rather than sent as `null`, with one exception: a pose snapshot that is
//! present but empty is still sent as `{"keypoints":[]}` so the server can
//! tell "pose tracking idle" apart from "pose tracking not running".
//!
//! ```rust
//! use framecast::payload::PayloadBuilder;
//! use framecast::types::PoseSnapshot;
//!
//! let payload = PayloadBuilder::build(None, Some(PoseSnapshot::default()), None, None);
//! assert_eq!(payload.to_json_string().unwrap(), r#"{"blazepose_detections":{"keypoints":[]}}"#);
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use crate::Result;
use crate::encoder::EncodedImage;
use crate::types::{MotionSnapshot, PoseSnapshot};

/// Serializable body of one uplink POST
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UplinkPayload {
    /// Base64 of the JPEG frame
    #[serde(rename = "image_for_opencv", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(rename = "blazepose_detections", skip_serializing_if = "Option::is_none")]
    pub pose: Option<PoseSnapshot>,

    #[serde(rename = "game_state", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(rename = "quest_values", skip_serializing_if = "Option::is_none")]
    pub motion: Option<MotionSnapshot>,
}

impl UplinkPayload {
    /// Whether the payload carries image or pose data
    pub fn is_send_worthy(&self) -> bool {
        self.image.is_some() || self.pose.is_some()
    }

    /// Request body bytes
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Builds payloads from the parts sampled in one capture cycle
pub struct PayloadBuilder;

impl PayloadBuilder {
    /// Assemble a payload. Pure: same inputs, same payload.
    pub fn build(
        image: Option<&EncodedImage>,
        pose: Option<PoseSnapshot>,
        state: Option<String>,
        motion: Option<MotionSnapshot>,
    ) -> UplinkPayload {
        UplinkPayload { image: image.map(|img| STANDARD.encode(&img.bytes)), pose, state, motion }
    }
}
