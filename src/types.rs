//! Core types and errors shared by the registry client and the config checker.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while talking to the registry.
#[derive(Error, Debug)]
pub enum QuayError {
    #[error(
        "team {team} is not found in org {organization}. \
         contact org owner to create the team manually."
    )]
    TeamNotFound { team: String, organization: String },

    #[error("request failed\nCode: {status}\n{body}")]
    RequestFailed { status: u16, body: String },

    #[error("Too many page follows (limit {limit})")]
    TooManyPages { limit: usize },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl QuayError {
    /// HTTP status carried by a generic request failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            QuayError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, QuayError>;

/// Failures while running the external config validator.
///
/// These never reach callers of `check_config`; they are folded into a
/// failed `ValidationResult`.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("command '{command}' returned {status}: {stderr}")]
    Exit {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Outcome of running the external config validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    succeeded: bool,
    output: String,
}

impl ValidationResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            output: output.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Captured stdout on success, the error description on failure.
    pub fn output(&self) -> &str {
        &self.output
    }
}

impl From<ValidationResult> for bool {
    fn from(result: ValidationResult) -> bool {
        result.succeeded
    }
}

impl From<&ValidationResult> for bool {
    fn from(result: &ValidationResult) -> bool {
        result.succeeded
    }
}

/// Single-line rendering: newlines in the output are dropped.
impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.output.replace('\n', ""))
    }
}

/// Repository visibility on the registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn from_public(is_public: bool) -> Self {
        if is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repository entry as returned by the registry listing.
///
/// Only the commonly used fields are typed. Everything else the server sends
/// is kept in `extra` so the record round-trips verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Permission level of a team on a repository. `None` means no permission.
pub type Role = Option<String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_result_bool() {
        assert!(bool::from(ValidationResult::success("ok")));
        assert!(!bool::from(&ValidationResult::failure("nope")));
    }

    #[test]
    fn test_validation_result_display_strips_newlines() {
        let result = ValidationResult::failure("Error running amtool:\nbad\nconfig\n");
        assert_eq!(result.to_string(), "Error running amtool:badconfig");
        assert_eq!(result.output(), "Error running amtool:\nbad\nconfig\n");
    }

    #[test]
    fn test_visibility_from_public() {
        assert_eq!(Visibility::from_public(true).as_str(), "public");
        assert_eq!(Visibility::from_public(false).as_str(), "private");
        assert_eq!(
            serde_json::to_value(Visibility::Private).unwrap(),
            serde_json::json!("private")
        );
    }

    #[test]
    fn test_repository_keeps_unknown_fields() {
        let raw = serde_json::json!({
            "namespace": "acme",
            "name": "api",
            "description": null,
            "is_public": true,
            "is_starred": false,
            "last_modified": 1700000000
        });

        let repo: Repository = serde_json::from_value(raw).unwrap();
        assert_eq!(repo.name.as_deref(), Some("api"));
        assert_eq!(repo.is_public, Some(true));
        assert_eq!(repo.extra.get("is_starred"), Some(&serde_json::json!(false)));
        assert_eq!(
            repo.extra.get("last_modified"),
            Some(&serde_json::json!(1700000000))
        );
    }

    #[test]
    fn test_error_status() {
        let err = QuayError::RequestFailed {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("Code: 502"));

        let err = QuayError::TooManyPages { limit: 15 };
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_process_error_messages() {
        let err = ProcessError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "No such file or directory",
        ));
        assert_eq!(err.to_string(), "No such file or directory");
    }

    #[test]
    fn test_team_not_found_message() {
        let err = QuayError::TeamNotFound {
            team: "blue".to_string(),
            organization: "acme".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("team blue"));
        assert!(message.contains("org acme"));
    }
}
