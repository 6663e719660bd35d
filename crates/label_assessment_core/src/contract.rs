use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MAX_LABELS: i32 = 100;
pub const MIN_CONFIDENCE: f32 = 0.0;
pub const DEFAULT_COMPONENT_NAME: &str = "rekognition-image-assessment";

/// Label detection response fields, keyed the way the service names them
/// (`Labels`, `LabelModelVersion`, ...).
pub type LabelResultSet = Map<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub container: Option<String>,
    pub object_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelRequest {
    pub image_ref: ImageRef,
    pub max_labels: i32,
    pub min_confidence: f32,
}

/// Builds the fixed-shape request for a task descriptor.
///
/// `bucket` and `key` are not validated. A missing field is forwarded as
/// absent and left for the service to reject. A present but non-string field
/// (`"key": 123`) cannot name an S3 object either, so it is also forwarded as
/// absent rather than coerced into a string.
pub fn build_label_request(input: &Value) -> LabelRequest {
    LabelRequest {
        image_ref: ImageRef {
            container: string_field(input, "bucket"),
            object_key: string_field(input, "key"),
        },
        max_labels: MAX_LABELS,
        min_confidence: MIN_CONFIDENCE,
    }
}

fn string_field(input: &Value, name: &str) -> Option<String> {
    input.get(name).and_then(Value::as_str).map(str::to_string)
}

/// Copies every entry of `overlay` into `base`. On a key collision the
/// `overlay` value wins.
pub fn shallow_merge(
    mut base: Map<String, Value>,
    overlay: Map<String, Value>,
) -> Map<String, Value> {
    for (key, value) in overlay {
        base.insert(key, value);
    }
    base
}

/// Merges a label result set over the task descriptor it was produced for.
/// A descriptor that is not a JSON object contributes no fields.
pub fn merge_output(input: &Value, result: LabelResultSet) -> Value {
    let base = match input {
        Value::Object(fields) => fields.clone(),
        _ => Map::new(),
    };
    Value::Object(shallow_merge(base, result))
}

pub fn failure_message(component: &str, input: &Value, error: &str) -> String {
    let rendered_input =
        serde_json::to_string_pretty(input).unwrap_or_else(|_| input.to_string());
    format!("Error in [{component}]. Function input [{rendered_input}]. Error [{error}].")
}
