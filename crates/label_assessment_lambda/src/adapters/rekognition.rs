use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_rekognition::error::DisplayErrorContext;
use aws_sdk_rekognition::operation::detect_labels::DetectLabelsOutput;
use aws_sdk_rekognition::types::{BoundingBox, Image, Instance, Label, S3Object};
use label_assessment_core::contract::{LabelRequest, LabelResultSet};
use serde_json::{Map, Value};

use crate::adapters::label_detection::LabelDetector;
use crate::config::AssessmentConfig;

/// Loads shared AWS configuration with SDK retries disabled, so each
/// `DetectLabels` call is a single attempt and throttling surfaces to the
/// orchestrator immediately.
pub async fn load_sdk_config(config: &AssessmentConfig) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).retry_config(RetryConfig::disabled());
    if let Some(region) = config.region.clone() {
        loader = loader.region(Region::new(region));
    }
    loader.load().await
}

pub struct RekognitionLabelDetector {
    client: aws_sdk_rekognition::Client,
}

impl RekognitionLabelDetector {
    pub fn new(client: aws_sdk_rekognition::Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Self {
        Self::new(aws_sdk_rekognition::Client::new(sdk_config))
    }
}

#[async_trait]
impl LabelDetector for RekognitionLabelDetector {
    async fn detect_labels(&self, request: &LabelRequest) -> Result<LabelResultSet, String> {
        let s3_object = S3Object::builder()
            .set_bucket(request.image_ref.container.clone())
            .set_name(request.image_ref.object_key.clone())
            .build();

        self.client
            .detect_labels()
            .image(Image::builder().s3_object(s3_object).build())
            .max_labels(request.max_labels)
            .min_confidence(request.min_confidence)
            .send()
            .await
            .map(|output| label_result_set(&output))
            .map_err(|error| DisplayErrorContext(&error).to_string())
    }
}

/// Renders a `DetectLabels` response with the service's own field names so
/// downstream workflow steps see the same shape the JavaScript SDK returned.
/// Absent optional fields are omitted.
pub fn label_result_set(output: &DetectLabelsOutput) -> LabelResultSet {
    let mut fields = Map::new();
    fields.insert(
        "Labels".to_string(),
        Value::Array(output.labels().iter().map(label_value).collect()),
    );
    if let Some(version) = output.label_model_version() {
        fields.insert(
            "LabelModelVersion".to_string(),
            Value::from(version.to_string()),
        );
    }
    if let Some(correction) = output.orientation_correction() {
        fields.insert(
            "OrientationCorrection".to_string(),
            Value::from(correction.as_str().to_string()),
        );
    }
    fields
}

fn label_value(label: &Label) -> Value {
    let mut fields = Map::new();
    insert_opt(&mut fields, "Name", label.name().map(Value::from));
    insert_opt(&mut fields, "Confidence", label.confidence().map(number));
    fields.insert(
        "Instances".to_string(),
        Value::Array(label.instances().iter().map(instance_value).collect()),
    );
    fields.insert(
        "Parents".to_string(),
        named_list(label.parents().iter().map(|parent| parent.name())),
    );
    fields.insert(
        "Aliases".to_string(),
        named_list(label.aliases().iter().map(|alias| alias.name())),
    );
    fields.insert(
        "Categories".to_string(),
        named_list(label.categories().iter().map(|category| category.name())),
    );
    Value::Object(fields)
}

fn instance_value(instance: &Instance) -> Value {
    let mut fields = Map::new();
    insert_opt(
        &mut fields,
        "BoundingBox",
        instance.bounding_box().map(bounding_box_value),
    );
    insert_opt(&mut fields, "Confidence", instance.confidence().map(number));
    Value::Object(fields)
}

fn bounding_box_value(bounding_box: &BoundingBox) -> Value {
    let mut fields = Map::new();
    insert_opt(&mut fields, "Width", bounding_box.width().map(number));
    insert_opt(&mut fields, "Height", bounding_box.height().map(number));
    insert_opt(&mut fields, "Left", bounding_box.left().map(number));
    insert_opt(&mut fields, "Top", bounding_box.top().map(number));
    Value::Object(fields)
}

fn named_list<'a>(names: impl Iterator<Item = Option<&'a str>>) -> Value {
    Value::Array(
        names
            .map(|name| {
                let mut fields = Map::new();
                insert_opt(&mut fields, "Name", name.map(Value::from));
                Value::Object(fields)
            })
            .collect(),
    )
}

fn insert_opt(fields: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        fields.insert(key.to_string(), value);
    }
}

// Goes through the shortest decimal form so 98.2f32 stays 98.2 rather than
// widening to 98.19999694824219.
fn number(value: f32) -> Value {
    value
        .to_string()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
