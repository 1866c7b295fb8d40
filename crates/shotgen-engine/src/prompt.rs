//! Prompt rendering for shot-list generation.
//!
//! `build` is pure: the same segment and options always render the same
//! prompt. Segment fields are embedded as a JSON document, so quotes,
//! backslashes and code fences in caller text cannot break the template.

use serde_json::{Map, Value};
use shotgen_models::{GenerationMode, GenerationOptions, SegmentRequest};

const PREAMBLE: &str = "You are a film director and storyboard artist. \
Break the video segment below into a precise, frame-by-frame shot list.";

const STANDARD_SCHEMA: &str = r#"{
  "title": "short working title",
  "summary": "one-sentence summary of the segment",
  "shots": [
    {
      "shotNumber": 1,
      "startSeconds": 0.0,
      "endSeconds": 2.5,
      "camera": "shot size, angle and movement",
      "action": "what happens on screen"
    }
  ]
}"#;

const PLUS_SCHEMA: &str = r#"{
  "title": "short working title",
  "summary": "one-sentence summary of the segment",
  "shots": [
    {
      "shotNumber": 1,
      "startSeconds": 0.0,
      "endSeconds": 2.5,
      "camera": "shot size, angle and movement",
      "action": "what happens on screen",
      "framing": "composition and subject placement",
      "lighting": "key light, mood and colour temperature",
      "audio": "dialogue, effects or music cue",
      "transition": "cut, dissolve, match cut, ..."
    }
  ]
}"#;

const CONTINUITY_SCHEMA: &str = r#"{
  "title": "short working title",
  "summary": "one-sentence summary of the segment",
  "shots": [
    {
      "shotNumber": 1,
      "startSeconds": 0.0,
      "endSeconds": 2.5,
      "camera": "shot size, angle and movement",
      "action": "what happens on screen",
      "framing": "composition and subject placement",
      "lighting": "key light, mood and colour temperature",
      "audio": "dialogue, effects or music cue",
      "transition": "cut, dissolve, match cut, ...",
      "continuity": ["props, wardrobe, positions or eyelines this shot establishes or honours"]
    }
  ],
  "continuityOut": ["state the next segment must pick up from"]
}"#;

const STANDARD_GUIDELINES: &[&str] = &[
    "Describe camera and action concretely enough to shoot from.",
    "Prefer 2 to 8 second shots unless the action demands otherwise.",
];

const PLUS_GUIDELINES: &[&str] = &[
    "Describe camera and action concretely enough to shoot from.",
    "Give every shot framing, lighting, audio and transition notes.",
    "Vary shot sizes to keep the edit readable.",
];

const CONTINUITY_GUIDELINES: &[&str] = &[
    "Describe camera and action concretely enough to shoot from.",
    "Give every shot framing, lighting, audio and transition notes.",
    "Honour every incoming continuity marker in the first shots that can show it.",
    "List in each shot's continuity array the markers it establishes or honours.",
    "Fill continuityOut with the state the following segment must match.",
];

struct Template {
    schema: &'static str,
    guidelines: &'static [&'static str],
}

impl Template {
    fn for_mode(mode: GenerationMode) -> Self {
        match mode {
            GenerationMode::Standard => Self {
                schema: STANDARD_SCHEMA,
                guidelines: STANDARD_GUIDELINES,
            },
            GenerationMode::Plus => Self {
                schema: PLUS_SCHEMA,
                guidelines: PLUS_GUIDELINES,
            },
            GenerationMode::EnhancedContinuity => Self {
                schema: CONTINUITY_SCHEMA,
                guidelines: CONTINUITY_GUIDELINES,
            },
        }
    }
}

/// Render the backend prompt for one segment.
pub fn build(segment: &SegmentRequest, options: &GenerationOptions) -> String {
    let template = Template::for_mode(options.mode);
    let duration = segment.duration_seconds;

    let guidelines = template
        .guidelines
        .iter()
        .map(|g| format!("- {}", g))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"{PREAMBLE}

SEGMENT (JSON):
{segment}

Return ONLY a single JSON object with this schema:
{schema}

Guidelines:
{guidelines}

Output rules:
- Return ONLY the JSON object and nothing else. No markdown fences, no commentary.
- Number shots from 1 in chronological order.
- startSeconds and endSeconds are numbers of seconds within [0, {duration}].
- Shots must not overlap and must cover the segment from 0 to {duration} seconds.
"#,
        segment = segment_block(segment),
        schema = template.schema,
    )
}

/// Segment fields as pretty-printed JSON with a stable key order.
fn segment_block(segment: &SegmentRequest) -> String {
    let mut fields = Map::new();

    if let Some(title) = &segment.title {
        fields.insert("title".into(), Value::from(title.as_str()));
    }
    fields.insert("scene".into(), Value::from(segment.scene.as_str()));
    fields.insert(
        "durationSeconds".into(),
        Value::from(segment.duration_seconds),
    );
    if !segment.characters.is_empty() {
        fields.insert("characters".into(), Value::from(segment.characters.clone()));
    }
    if !segment.continuity.is_empty() {
        fields.insert("continuity".into(), Value::from(segment.continuity.clone()));
    }
    if let Some(style) = segment.style.as_ref().filter(|s| !s.is_empty()) {
        let mut style_fields = Map::new();
        let hints = [
            ("visualStyle", &style.visual_style),
            ("cameraStyle", &style.camera_style),
            ("aspectRatio", &style.aspect_ratio),
            ("pacing", &style.pacing),
        ];
        for (key, value) in hints {
            if let Some(v) = value {
                style_fields.insert(key.into(), Value::from(v.as_str()));
            }
        }
        fields.insert("style".into(), Value::Object(style_fields));
    }

    format!("{:#}", Value::Object(fields))
}
