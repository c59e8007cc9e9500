//! HTTP status mapping.
//!
//! Maps service errors to HTTP statuses and a stable `error_type` tag, so
//! clients can tell the failure kinds apart without parsing messages.
//!
//! | Error | Status |
//! |---|---|
//! | `NotFound`, `AbsentValue` | 404 |
//! | `AlreadyExists`, `DuplicateValue` | 409 |
//! | `PermissionDenied` | 403 |
//! | `StoreUnavailable` | 503 |
//! | `InvalidPath`, `InvalidArgument` | 400 |
//! | `Rejected`, `Incomplete` | 500 |

use axum::http::StatusCode;
use serde_json::{Value, json};

use super::ServiceError;

/// HTTP status for a service error
pub fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::NotFound { .. } | ServiceError::AbsentValue { .. } => StatusCode::NOT_FOUND,
        ServiceError::AlreadyExists { .. } | ServiceError::DuplicateValue { .. } => {
            StatusCode::CONFLICT
        }
        ServiceError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        ServiceError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::InvalidPath(_) | ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        ServiceError::Rejected(_) | ServiceError::Incomplete { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Stable machine-readable tag for a service error
pub fn error_type(error: &ServiceError) -> &'static str {
    match error {
        ServiceError::NotFound { .. } => "NotFound",
        ServiceError::AlreadyExists { .. } => "AlreadyExists",
        ServiceError::DuplicateValue { .. } => "DuplicateValue",
        ServiceError::AbsentValue { .. } => "AbsentValue",
        ServiceError::PermissionDenied(_) => "PermissionDenied",
        ServiceError::StoreUnavailable(_) => "StoreUnavailable",
        ServiceError::Rejected(_) => "Rejected",
        ServiceError::InvalidPath(_) => "InvalidPath",
        ServiceError::InvalidArgument(_) => "InvalidArgument",
        ServiceError::Incomplete { .. } => "Incomplete",
    }
}

/// Extra detail attached to the error envelope
pub fn error_details(error: &ServiceError) -> Value {
    match error {
        ServiceError::PermissionDenied(denied) => json!({
            "error_type": error_type(error),
            "principal": denied.principal,
            "action": denied.action,
        }),
        ServiceError::Incomplete { path, step, .. } => json!({
            "error_type": error_type(error),
            "path": path,
            "step": step.to_string(),
            "hint": "Re-run the reconcile operation to create the missing entries"
        }),
        _ => json!({ "error_type": error_type(error) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PathError, PermissionDeniedError};
    use crate::lifecycle::CreationStep;

    #[test]
    fn test_not_found_kinds() {
        assert_eq!(
            status_for(&ServiceError::not_found("ou=Acme")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ServiceError::AbsentValue {
                path: "cn=eng".into(),
                value: "uid=bob".into()
            }),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflicts() {
        assert_eq!(
            status_for(&ServiceError::AlreadyExists {
                path: "ou=Acme".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&ServiceError::DuplicateValue {
                path: "cn=eng".into(),
                value: "uid=alice".into()
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_permission_denied() {
        let err = ServiceError::from(PermissionDeniedError::new(
            "bob",
            "create organization",
            "only super administrators are permitted",
        ));
        assert_eq!(status_for(&err), StatusCode::FORBIDDEN);

        let details = error_details(&err);
        assert_eq!(details["principal"], "bob");
        assert_eq!(details["error_type"], "PermissionDenied");
    }

    #[test]
    fn test_bad_request_and_unavailable() {
        assert_eq!(
            status_for(&ServiceError::from(PathError::InvalidBranch("x".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ServiceError::missing_argument("orgName")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ServiceError::StoreUnavailable("down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_incomplete_details() {
        let err = ServiceError::Incomplete {
            path: "ou=Acme".into(),
            step: CreationStep::GroupsContainer,
            source: Box::new(ServiceError::StoreUnavailable("timeout".into())),
        };
        assert_eq!(status_for(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_details(&err)["path"], "ou=Acme");
    }
}
