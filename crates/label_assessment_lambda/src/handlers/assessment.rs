use label_assessment_core::contract::{build_label_request, failure_message, merge_output};
use serde_json::{json, Value};

use crate::adapters::label_detection::LabelDetector;
use crate::config::AssessmentConfig;

/// The external label detection call failed. `message` is the full diagnostic
/// reported to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentError {
    pub message: String,
}

impl std::fmt::Display for AssessmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AssessmentError {}

/// Requests labels for the image named by `input` and merges them over it.
///
/// The detector is called exactly once. Any detector error is returned as an
/// `AssessmentError` without retrying, and no partial payload is produced.
pub async fn handle_assessment_event(
    input: &Value,
    config: &AssessmentConfig,
    detector: &impl LabelDetector,
) -> Result<Value, AssessmentError> {
    log_assessment_info(
        config,
        "assessment_started",
        json!({
            "bucket": input.get("bucket").cloned().unwrap_or(Value::Null),
            "key": input.get("key").cloned().unwrap_or(Value::Null),
        }),
    );

    let request = build_label_request(input);
    match detector.detect_labels(&request).await {
        Ok(result) => {
            log_assessment_info(
                config,
                "labels_retrieved",
                json!({ "result": Value::Object(result.clone()) }),
            );
            Ok(merge_output(input, result))
        }
        Err(error) => {
            let message = failure_message(&config.component_name, input, &error);
            log_assessment_error(
                config,
                "assessment_failed",
                json!({
                    "message": message.clone(),
                    "error": error,
                }),
            );
            Err(AssessmentError { message })
        }
    }
}

fn log_assessment_info(config: &AssessmentConfig, event: &str, details: Value) {
    eprintln!(
        "{}",
        json!({
            "component": config.component_name,
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

fn log_assessment_error(config: &AssessmentConfig, event: &str, details: Value) {
    eprintln!(
        "{}",
        json!({
            "component": config.component_name,
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use label_assessment_core::contract::{LabelRequest, LabelResultSet};

    use super::*;

    struct CapturingDetector {
        requests: Mutex<Vec<LabelRequest>>,
        response: Result<Value, String>,
    }

    impl CapturingDetector {
        fn succeeding(response: Value) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response: Ok(response),
            }
        }

        fn failing(error: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response: Err(error.to_string()),
            }
        }

        fn requests(&self) -> Vec<LabelRequest> {
            self.requests.lock().expect("poisoned mutex").clone()
        }
    }

    #[async_trait]
    impl LabelDetector for CapturingDetector {
        async fn detect_labels(&self, request: &LabelRequest) -> Result<LabelResultSet, String> {
            self.requests
                .lock()
                .expect("poisoned mutex")
                .push(request.clone());
            match &self.response {
                Ok(Value::Object(fields)) => Ok(fields.clone()),
                Ok(other) => panic!("test response must be an object, got {other}"),
                Err(error) => Err(error.clone()),
            }
        }
    }

    #[tokio::test]
    async fn issues_single_fixed_request_for_descriptor_image() {
        let detector = CapturingDetector::succeeding(json!({"Labels": []}));
        handle_assessment_event(
            &json!({"bucket": "photos", "key": "cat.jpg", "execution": "abc"}),
            &AssessmentConfig::default(),
            &detector,
        )
        .await
        .expect("assessment should succeed");

        let requests = detector.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            serde_json::to_value(&requests[0]).expect("request should serialize"),
            json!({
                "imageRef": {"container": "photos", "objectKey": "cat.jpg"},
                "maxLabels": 100,
                "minConfidence": 0.0
            })
        );
    }

    #[tokio::test]
    async fn merges_labels_into_descriptor() {
        let detector =
            CapturingDetector::succeeding(json!({"Labels": [{"Name": "Cat", "Confidence": 98.2}]}));
        let output = handle_assessment_event(
            &json!({"bucket": "photos", "key": "cat.jpg"}),
            &AssessmentConfig::default(),
            &detector,
        )
        .await
        .expect("assessment should succeed");

        assert_eq!(
            output,
            json!({
                "bucket": "photos",
                "key": "cat.jpg",
                "Labels": [{"Name": "Cat", "Confidence": 98.2}]
            })
        );
    }

    #[tokio::test]
    async fn response_fields_win_and_pass_through_fields_survive() {
        let detector = CapturingDetector::succeeding(json!({
            "Labels": [],
            "key": "overwritten.jpg",
            "LabelModelVersion": "3.0"
        }));
        let output = handle_assessment_event(
            &json!({"bucket": "photos", "key": "cat.jpg", "workflow": {"step": 2}}),
            &AssessmentConfig::default(),
            &detector,
        )
        .await
        .expect("assessment should succeed");

        assert_eq!(
            output,
            json!({
                "bucket": "photos",
                "key": "overwritten.jpg",
                "workflow": {"step": 2},
                "Labels": [],
                "LabelModelVersion": "3.0"
            })
        );
    }

    #[tokio::test]
    async fn failure_reports_input_and_error_without_payload() {
        let detector = CapturingDetector::failing("NoSuchKey");
        let input = json!({"bucket": "photos", "key": "missing.jpg"});
        let error = handle_assessment_event(&input, &AssessmentConfig::default(), &detector)
            .await
            .expect_err("assessment should fail");

        assert!(error.message.contains("missing.jpg"));
        assert!(error.message.contains("NoSuchKey"));
        assert!(error
            .message
            .starts_with("Error in [rekognition-image-assessment]. Function input ["));
        assert!(error.message.ends_with("Error [NoSuchKey]."));
        assert_eq!(error.to_string(), error.message);
        assert_eq!(detector.requests().len(), 1);
    }

    #[tokio::test]
    async fn failure_names_configured_component() {
        let detector = CapturingDetector::failing("ThrottlingException");
        let config = AssessmentConfig {
            component_name: "image-labels".to_string(),
            region: None,
        };
        let error = handle_assessment_event(&json!({"bucket": "b", "key": "k"}), &config, &detector)
            .await
            .expect_err("assessment should fail");

        assert!(error.message.starts_with("Error in [image-labels]."));
    }

    #[tokio::test]
    async fn repeated_invocations_are_identical() {
        let detector =
            CapturingDetector::succeeding(json!({"Labels": [{"Name": "Dog", "Confidence": 91.0}]}));
        let input = json!({"bucket": "photos", "key": "dog.jpg"});
        let config = AssessmentConfig::default();

        let first = handle_assessment_event(&input, &config, &detector)
            .await
            .expect("first assessment should succeed");
        let second = handle_assessment_event(&input, &config, &detector)
            .await
            .expect("second assessment should succeed");

        assert_eq!(first, second);
        let requests = detector.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn forwards_missing_key_and_relays_service_rejection() {
        let detector = CapturingDetector::failing("InvalidParameterException");
        let input = json!({"bucket": "photos"});
        let error = handle_assessment_event(&input, &AssessmentConfig::default(), &detector)
            .await
            .expect_err("service rejection should surface");

        let requests = detector.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].image_ref.container.as_deref(), Some("photos"));
        assert_eq!(requests[0].image_ref.object_key, None);
        assert!(error.message.contains("InvalidParameterException"));
    }

    #[tokio::test]
    async fn forwards_missing_fields_and_relays_service_success() {
        let detector = CapturingDetector::succeeding(json!({"Labels": []}));
        let output = handle_assessment_event(&json!({}), &AssessmentConfig::default(), &detector)
            .await
            .expect("service success should be relayed");

        assert_eq!(output, json!({"Labels": []}));
        assert_eq!(detector.requests()[0].image_ref.container, None);
    }
}
