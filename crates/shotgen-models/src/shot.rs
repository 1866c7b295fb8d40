//! Shot-list models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single camera/action entry in a shot list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShotEntry {
    /// 1-indexed position within the segment
    pub shot_number: u32,

    /// Shot start, seconds from segment start
    pub start_seconds: f64,

    /// Shot end, seconds from segment start
    pub end_seconds: f64,

    /// Camera placement and movement
    pub camera: String,

    /// On-screen action
    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framing: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,

    /// Continuity markers established or honoured by this shot
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub continuity: Vec<String>,
}

impl ShotEntry {
    pub fn new(
        shot_number: u32,
        start_seconds: f64,
        end_seconds: f64,
        camera: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            shot_number,
            start_seconds,
            end_seconds,
            camera: camera.into(),
            action: action.into(),
            framing: None,
            lighting: None,
            audio: None,
            transition: None,
            continuity: Vec::new(),
        }
    }

    /// Shot length in seconds.
    pub fn duration(&self) -> f64 {
        (self.end_seconds - self.start_seconds).max(0.0)
    }
}

/// Validated, ordered shot list for one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShotListDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    pub shots: Vec<ShotEntry>,

    /// Continuity markers handed to the next segment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub continuity_out: Vec<String>,
}

impl ShotListDescription {
    /// Total covered time from the first shot start to the last shot end.
    pub fn covered_seconds(&self) -> f64 {
        match (self.shots.first(), self.shots.last()) {
            (Some(first), Some(last)) => (last.end_seconds - first.start_seconds).max(0.0),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shot_requires_core_fields() {
        let json = r#"{ "shotNumber": 1, "startSeconds": 0, "endSeconds": 2.5, "camera": "wide" }"#;
        assert!(serde_json::from_str::<ShotEntry>(json).is_err());
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{ "shotNumber": 1, "startSeconds": 0, "endSeconds": 2.5,
                        "camera": "wide static", "action": "door opens" }"#;
        let shot: ShotEntry = serde_json::from_str(json).unwrap();
        assert!(shot.lighting.is_none());
        assert!(shot.continuity.is_empty());
        assert_eq!(shot.duration(), 2.5);
    }

    #[test]
    fn test_covered_seconds() {
        let list = ShotListDescription {
            title: None,
            summary: None,
            shots: vec![
                ShotEntry::new(1, 0.5, 3.0, "wide", "enter"),
                ShotEntry::new(2, 3.0, 7.5, "close", "react"),
            ],
            continuity_out: Vec::new(),
        };
        assert_eq!(list.covered_seconds(), 7.0);
    }
}
