//! Segment request models.

use std::borrow::Cow;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::options::GenerationOptions;

/// Longest segment accepted for shot-list generation (seconds).
pub const MAX_SEGMENT_SECONDS: f64 = 600.0;

/// Free-text style hints forwarded to the prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StyleOptions {
    /// Overall look, e.g. "handheld documentary"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_style: Option<String>,

    /// Preferred camera language, e.g. "slow dolly moves"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_style: Option<String>,

    /// Target aspect ratio, e.g. "9:16"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,

    /// Edit pacing, e.g. "fast cuts"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pacing: Option<String>,
}

impl StyleOptions {
    pub fn is_empty(&self) -> bool {
        self.visual_style.is_none()
            && self.camera_style.is_none()
            && self.aspect_ratio.is_none()
            && self.pacing.is_none()
    }
}

/// One video segment submitted for shot-list generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRequest {
    /// Caller-side identifier, echoed into logs only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Short segment title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Scene description the shot list is derived from
    #[validate(custom(function = "validate_not_blank"))]
    pub scene: String,

    /// Segment length in seconds
    #[validate(range(exclusive_min = 0.0, max = "MAX_SEGMENT_SECONDS"))]
    pub duration_seconds: f64,

    /// Continuity markers carried over from neighbouring segments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub continuity: Vec<String>,

    /// Characters that appear in the segment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub characters: Vec<String>,

    /// Style hints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleOptions>,
}

impl SegmentRequest {
    /// Create a request with the required fields only.
    pub fn new(scene: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            id: None,
            title: None,
            scene: scene.into(),
            duration_seconds,
            continuity: Vec::new(),
            characters: Vec::new(),
            style: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_continuity(mut self, marker: impl Into<String>) -> Self {
        self.continuity.push(marker.into());
        self
    }

    pub fn with_character(mut self, name: impl Into<String>) -> Self {
        self.characters.push(name.into());
        self
    }

    pub fn with_style(mut self, style: StyleOptions) -> Self {
        self.style = Some(style);
        self
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank")
            .with_message(Cow::Borrowed("scene must not be blank")));
    }
    Ok(())
}

/// Inbound batch shape handed over by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSubmission {
    pub segments: Vec<SegmentRequest>,

    #[serde(default)]
    pub options: Option<GenerationOptions>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_segment() {
        let segment = SegmentRequest::new("A courier sprints across a rooftop", 8.0);
        assert!(segment.validate().is_ok());
    }

    #[test]
    fn test_blank_scene_rejected() {
        let segment = SegmentRequest::new("   ", 8.0);
        let err = segment.validate().unwrap_err();
        assert!(err.field_errors().contains_key("scene"));
    }

    #[test]
    fn test_duration_bounds() {
        assert!(SegmentRequest::new("scene", 0.0).validate().is_err());
        assert!(SegmentRequest::new("scene", -3.0).validate().is_err());
        assert!(SegmentRequest::new("scene", MAX_SEGMENT_SECONDS + 1.0)
            .validate()
            .is_err());
        assert!(SegmentRequest::new("scene", MAX_SEGMENT_SECONDS)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "scene": "Two friends argue in a diner",
            "durationSeconds": 12.5,
            "continuity": ["coffee cup half full"],
            "style": { "aspectRatio": "9:16" }
        }"#;
        let segment: SegmentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(segment.duration_seconds, 12.5);
        assert_eq!(segment.continuity, vec!["coffee cup half full"]);
        assert_eq!(
            segment.style.unwrap().aspect_ratio.as_deref(),
            Some("9:16")
        );
        assert!(segment.characters.is_empty());
    }

    #[test]
    fn test_missing_scene_is_a_deserialize_error() {
        let json = r#"{ "durationSeconds": 4 }"#;
        assert!(serde_json::from_str::<SegmentRequest>(json).is_err());
    }

    #[test]
    fn test_batch_submission_without_options() {
        let json = r#"{ "segments": [{ "scene": "x", "durationSeconds": 1 }] }"#;
        let batch: BatchSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(batch.segments.len(), 1);
        assert!(batch.options.is_none());
    }
}
