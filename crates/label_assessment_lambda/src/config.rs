use label_assessment_core::contract::DEFAULT_COMPONENT_NAME;

pub const COMPONENT_NAME_ENV: &str = "ASSESSMENT_COMPONENT_NAME";
pub const REGION_ENV: &str = "ASSESSMENT_REGION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentConfig {
    /// Name reported in log lines and failure diagnostics.
    pub component_name: String,
    /// Rekognition region override. `None` defers to the AWS default provider chain.
    pub region: Option<String>,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            component_name: DEFAULT_COMPONENT_NAME.to_string(),
            region: None,
        }
    }
}

impl AssessmentConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            component_name: non_blank(COMPONENT_NAME_ENV)
                .unwrap_or_else(|| DEFAULT_COMPONENT_NAME.to_string()),
            region: non_blank(REGION_ENV),
        }
    }
}
