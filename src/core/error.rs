use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidYaml,
    ConfigInvalidValue,
    ConfigNotFound,

    ValidationInvalidArgument,

    CredentialsIdentityFailed,
    CredentialsCommandFailed,
    CredentialsParseFailed,

    KubePodNotFound,

    RefreshStepFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidYaml => "config.invalid_yaml",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",
            ErrorCode::ConfigNotFound => "config.not_found",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::CredentialsIdentityFailed => "credentials.identity_failed",
            ErrorCode::CredentialsCommandFailed => "credentials.command_failed",
            ErrorCode::CredentialsParseFailed => "credentials.parse_failed",

            ErrorCode::KubePodNotFound => "kube.pod_not_found",

            ErrorCode::RefreshStepFailed => "refresh.step_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidYamlDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigNotFoundDetails {
    pub tried: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodNotFoundDetails {
    pub namespace: String,
    pub pod_prefix: String,
}

/// Failure of a must-succeed workflow step. The command is stored redacted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFailedDetails {
    pub step: String,
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        let details = to_details(ConfigMissingKeyDetails {
            key: key.into(),
            path,
        });

        Self::new(
            ErrorCode::ConfigMissingKey,
            "Missing required configuration key",
            details,
        )
    }

    pub fn config_invalid_yaml(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        let details = to_details(ConfigInvalidYamlDetails {
            path: path.into(),
            error: err.to_string(),
        });

        Self::new(
            ErrorCode::ConfigInvalidYaml,
            "Invalid YAML in configuration",
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    pub fn config_not_found(tried: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            "No configuration file found",
            to_details(ConfigNotFoundDetails { tried }),
        )
        .with_hint("Create config.yaml in the working directory or pass --config <PATH>")
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn credentials_identity_failed(stderr: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::CredentialsIdentityFailed,
            "Cloud identity check failed",
            serde_json::json!({ "stderr": stderr.into() }),
        )
        .with_hint("Refresh your cloud session (for example `aws sso login`) and retry")
    }

    pub fn credentials_command_failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::CredentialsCommandFailed,
            format!("credential_cmd exited with {}", exit_code),
            serde_json::json!({ "exitCode": exit_code, "stderr": stderr.into() }),
        )
        .with_hint("Run credential_cmd by hand to see why it fails, then retry")
    }

    pub fn credentials_parse_failed(problem: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::CredentialsParseFailed,
            "Could not extract temporary credentials",
            serde_json::json!({ "problem": problem.into() }),
        )
        .with_hint(
            "credential_cmd must print JSON with AccessKeyId, SecretAccessKey, SessionToken and Expiration",
        )
    }

    pub fn pod_not_found(namespace: impl Into<String>, pod_prefix: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let details = to_details(PodNotFoundDetails {
            namespace: namespace.clone(),
            pod_prefix: pod_prefix.into(),
        });

        Self::new(ErrorCode::KubePodNotFound, "No running pod matched", details)
            .with_hint(format!("Run 'kubectl -n {} get pods' to check pod names", namespace))
    }

    pub fn step_failed(details: StepFailedDetails) -> Self {
        let message = format!("Step '{}' failed", details.step);
        Self::new(ErrorCode::RefreshStepFailed, message, to_details(details))
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalJsonErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    /// Attach an extra key to the details object.
    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        if !self.details.is_object() {
            self.details = Value::Object(serde_json::Map::new());
        }
        if let Value::Object(map) = &mut self.details {
            map.insert(key.to_string(), value);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_failed_names_step_in_message() {
        let err = Error::step_failed(StepFailedDetails {
            step: "dump".to_string(),
            command: "pg_dump".to_string(),
            exit_code: 1,
            stdout: String::new(),
            stderr: "boom".to_string(),
        });

        assert_eq!(err.code, ErrorCode::RefreshStepFailed);
        assert_eq!(err.message, "Step 'dump' failed");
        assert_eq!(err.details["exitCode"], 1);
        assert_eq!(err.details["stderr"], "boom");
    }

    #[test]
    fn with_detail_extends_details_object() {
        let err = Error::pod_not_found("prod", "api-")
            .with_detail("cleanup", serde_json::json!([]));

        assert_eq!(err.details["podPrefix"], "api-");
        assert!(err.details["cleanup"].is_array());
        assert_eq!(err.hints.len(), 1);
    }

    #[test]
    fn codes_are_dotted() {
        assert_eq!(ErrorCode::KubePodNotFound.as_str(), "kube.pod_not_found");
        assert_eq!(ErrorCode::ConfigInvalidYaml.as_str(), "config.invalid_yaml");
    }
}
