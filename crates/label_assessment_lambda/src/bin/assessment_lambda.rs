use label_assessment_lambda::adapters::rekognition::{load_sdk_config, RekognitionLabelDetector};
use label_assessment_lambda::config::AssessmentConfig;
use label_assessment_lambda::handlers::assessment::handle_assessment_event;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let config = AssessmentConfig::from_env();
    let sdk_config = load_sdk_config(&config).await;
    let detector = RekognitionLabelDetector::from_sdk_config(&sdk_config);

    handle_assessment_event(&event.payload, &config, &detector)
        .await
        .map_err(|error| Error::from(error.message))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::run(service_fn(handle_request)).await
}
