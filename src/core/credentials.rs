//! Temporary cloud credentials for kubectl.
//!
//! The configured credential command prints a JSON document (the shape of
//! `aws sts assume-role`). All whitespace is stripped before matching, so
//! pretty-printed and compact output both work.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::shell;
use regex::Regex;
use serde::Serialize;

const CREDENTIALS_PATTERN: &str = r#""AccessKeyId":"([^"]+)","SecretAccessKey":"([^"]+)","SessionToken":"([^"]+)","Expiration""#;
const EXPIRATION_PATTERN: &str = r#""Expiration":"([^"]+)""#;

#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<String>,
}

impl std::fmt::Debug for AccessCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCredentials")
            .field("access_key_id", &crate::redact::mask_tail(&self.access_key_id))
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

/// What `pgpull credentials` reports. Never carries the secret parts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsSummary {
    pub access_key_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

impl AccessCredentials {
    /// Env assignments prepended to every kubectl invocation.
    pub fn env_prefix(&self) -> String {
        [
            shell::env_assignment("AWS_ACCESS_KEY_ID", &self.access_key_id),
            shell::env_assignment("AWS_SECRET_ACCESS_KEY", &self.secret_access_key),
            shell::env_assignment("AWS_SESSION_TOKEN", &self.session_token),
        ]
        .join(" ")
    }

    pub fn secrets(&self) -> Vec<String> {
        vec![self.secret_access_key.clone(), self.session_token.clone()]
    }

    pub fn summary(&self) -> CredentialsSummary {
        CredentialsSummary {
            access_key_id: crate::redact::mask_tail(&self.access_key_id),
            expiration: self.expiration.clone(),
        }
    }
}

/// Pull the three credential parts out of the credential command output.
pub fn extract(raw: &str) -> Result<AccessCredentials> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    let pattern =
        Regex::new(CREDENTIALS_PATTERN).map_err(|e| Error::internal_unexpected(e.to_string()))?;
    let caps = pattern.captures(&compact).ok_or_else(|| {
        Error::credentials_parse_failed(
            "Output did not contain AccessKeyId, SecretAccessKey, SessionToken and Expiration in order",
        )
    })?;

    let expiration = Regex::new(EXPIRATION_PATTERN)
        .ok()
        .and_then(|re| re.captures(&compact))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    Ok(AccessCredentials {
        access_key_id: caps[1].to_string(),
        secret_access_key: caps[2].to_string(),
        session_token: caps[3].to_string(),
        expiration,
    })
}

/// Pre-flight: the identity check must succeed before credentials are fetched.
pub fn verify_identity(session: &Session, identity_check_cmd: &str) -> Result<()> {
    let identity = session.exec(identity_check_cmd);
    if !identity.success {
        return Err(Error::credentials_identity_failed(
            session.redact(identity.error_text()),
        ));
    }
    Ok(())
}

/// Run the identity pre-flight and the credential command.
///
/// Returns `None` when no credential command is configured; kubectl then
/// relies on the ambient kube credentials.
pub fn acquire(session: &Session, config: &Config) -> Result<Option<AccessCredentials>> {
    let Some(credential_cmd) = config.credential_cmd() else {
        log_status!("credentials", "No credential_cmd configured, using ambient kube credentials");
        return Ok(None);
    };

    verify_identity(session, &config.identity_check_cmd)?;

    let output = session.exec(credential_cmd);
    if !output.success {
        return Err(Error::credentials_command_failed(
            output.exit_code,
            session.redact(output.error_text()),
        ));
    }

    let access = extract(&output.stdout)?;
    log_status!(
        "credentials",
        "Using access key {}",
        crate::redact::mask_tail(&access.access_key_id)
    );
    Ok(Some(access))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSUME_ROLE_OUTPUT: &str = r#"{
    "Credentials": {
        "AccessKeyId": "ASIAEXAMPLE1234",
        "SecretAccessKey": "wJalrXUtnFEMI/K7MDENG+bPxRfiCY",
        "SessionToken": "FwoGZXIvYXdzEJr//////////wEaDA==",
        "Expiration": "2026-10-18T12:00:00+00:00"
    },
    "AssumedRoleUser": {
        "Arn": "arn:aws:sts::123456789012:assumed-role/dev/session"
    }
}"#;

    #[test]
    fn extracts_pretty_printed_credentials() {
        let access = extract(ASSUME_ROLE_OUTPUT).unwrap();
        assert_eq!(access.access_key_id, "ASIAEXAMPLE1234");
        assert_eq!(access.secret_access_key, "wJalrXUtnFEMI/K7MDENG+bPxRfiCY");
        assert_eq!(access.session_token, "FwoGZXIvYXdzEJr//////////wEaDA==");
        assert_eq!(
            access.expiration.as_deref(),
            Some("2026-10-18T12:00:00+00:00")
        );
    }

    #[test]
    fn rejects_output_without_expiration() {
        let raw = r#"{"AccessKeyId":"a","SecretAccessKey":"b","SessionToken":"c"}"#;
        let err = extract(raw).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::CredentialsParseFailed);
    }

    #[test]
    fn rejects_unrelated_output() {
        assert!(extract("An error occurred (ExpiredToken)").is_err());
    }

    #[test]
    fn env_prefix_quotes_values_with_metacharacters() {
        let access = AccessCredentials {
            access_key_id: "AKIA".to_string(),
            secret_access_key: "a/b+c".to_string(),
            session_token: "tok$en".to_string(),
            expiration: None,
        };
        assert_eq!(
            access.env_prefix(),
            "AWS_ACCESS_KEY_ID=AKIA AWS_SECRET_ACCESS_KEY=a/b+c AWS_SESSION_TOKEN='tok$en'"
        );
    }

    #[test]
    fn debug_output_hides_secrets() {
        let access = extract(ASSUME_ROLE_OUTPUT).unwrap();
        let debug = format!("{:?}", access);
        assert!(!debug.contains("wJalrXUtnFEMI"));
        assert!(!debug.contains("FwoGZXIvYXdz"));
        assert!(debug.contains("****1234"));
    }
}
