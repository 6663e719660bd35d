use async_trait::async_trait;
use label_assessment_core::contract::{LabelRequest, LabelResultSet};

/// A label detection capability. Each call is a single request/response
/// exchange; implementations must not retry.
#[async_trait]
pub trait LabelDetector: Send + Sync {
    async fn detect_labels(&self, request: &LabelRequest) -> Result<LabelResultSet, String>;
}
