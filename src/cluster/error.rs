//! Error classification for cluster API calls.

use thiserror::Error;

use super::ResourceKind;

/// HTTP status the API server uses for missing objects.
const STATUS_NOT_FOUND: u16 = 404;

/// Reason the API server reports when a create collides with an existing name.
const REASON_ALREADY_EXISTS: &str = "AlreadyExists";

/// Errors raised by [`super::ClusterClient`] implementations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ClusterError {
    /// Raised when the requested object does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Kind of the missing object.
        kind: ResourceKind,
        /// Name of the missing object.
        name: String,
    },
    /// Raised when a create collides with an existing object.
    #[error("{kind} '{name}' already exists")]
    AlreadyExists {
        /// Kind of the conflicting object.
        kind: ResourceKind,
        /// Name of the conflicting object.
        name: String,
    },
    /// Any other status returned by the API server.
    #[error("api error {code} ({reason}): {message}")]
    Api {
        /// HTTP status code.
        code: u16,
        /// Machine-readable reason reported by the server.
        reason: String,
        /// Human-readable message reported by the server.
        message: String,
    },
    /// Raised when the request never produced an API status.
    #[error("transport error: {0}")]
    Transport(String),
    /// Raised when the client cannot be configured.
    #[error("cluster configuration error: {0}")]
    Config(String),
}

impl ClusterError {
    /// Classifies a `kube` error for the given object.
    #[must_use]
    pub fn from_kube(err: kube::Error, kind: ResourceKind, name: &str) -> Self {
        match err {
            kube::Error::Api(response) if response.code == STATUS_NOT_FOUND => Self::NotFound {
                kind,
                name: name.to_owned(),
            },
            kube::Error::Api(response) if response.reason == REASON_ALREADY_EXISTS => {
                Self::AlreadyExists {
                    kind,
                    name: name.to_owned(),
                }
            }
            kube::Error::Api(response) => Self::Api {
                code: response.code,
                reason: response.reason,
                message: response.message,
            },
            other => Self::Transport(other.to_string()),
        }
    }

    /// Returns `true` when the error reports a missing object.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` when the error reports a naming collision.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

impl From<kube::config::KubeconfigError> for ClusterError {
    fn from(value: kube::config::KubeconfigError) -> Self {
        Self::Config(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;
    use rstest::rstest;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: String::from("Failure"),
            message: format!("simulated {reason}"),
            reason: reason.to_owned(),
            code,
        })
    }

    #[test]
    fn maps_404_to_not_found() {
        let err = ClusterError::from_kube(api_error(404, "NotFound"), ResourceKind::Claim, "old");
        assert_eq!(
            err,
            ClusterError::NotFound {
                kind: ResourceKind::Claim,
                name: String::from("old"),
            }
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn maps_already_exists_reason() {
        let err = ClusterError::from_kube(
            api_error(409, "AlreadyExists"),
            ResourceKind::Claim,
            "new",
        );
        assert!(err.is_already_exists(), "unexpected mapping: {err:?}");
    }

    #[rstest]
    #[case(409, "Conflict")]
    #[case(403, "Forbidden")]
    #[case(500, "InternalError")]
    fn other_statuses_pass_through(#[case] code: u16, #[case] reason: &str) {
        let err = ClusterError::from_kube(api_error(code, reason), ResourceKind::Volume, "pv-1");
        let ClusterError::Api {
            code: actual_code,
            reason: actual_reason,
            ..
        } = err
        else {
            panic!("expected Api variant, got {err:?}");
        };
        assert_eq!(actual_code, code);
        assert_eq!(actual_reason, reason);
    }

    #[test]
    fn display_names_kind_and_object() {
        let err = ClusterError::AlreadyExists {
            kind: ResourceKind::Claim,
            name: String::from("new-pvc"),
        };
        assert_eq!(
            err.to_string(),
            "PersistentVolumeClaim 'new-pvc' already exists"
        );
    }
}
