//! Error types and the error classifier.
//!
//! Engine operations fail with an [`EngineError`]: either a rejection whose
//! [`Rejection`] kind is fixed where the condition is detected, a store
//! failure, or an expired deadline. [`classify`] turns that into an
//! [`AppError`] carrying one of the stable [`ErrorCode`]s. Classification
//! happens once, at the service boundary, and never inside a transaction.

use crate::db::DbError;
use serde::{Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;

/// Stable error codes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    TeamExists,
    PrExists,
    PrMerged,
    NotAssigned,
    NoCandidate,
    NotFound,
    Unknown,
}

/// Transport-independent class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    BadRequest,
    Conflict,
    NotFound,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TeamExists => "TEAM_EXISTS",
            Self::PrExists => "PR_EXISTS",
            Self::PrMerged => "PR_MERGED",
            Self::NotAssigned => "NOT_ASSIGNED",
            Self::NoCandidate => "NO_CANDIDATE",
            Self::NotFound => "NOT_FOUND",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Response class used by the transport layer.
    pub fn status_class(&self) -> StatusClass {
        match self {
            Self::TeamExists => StatusClass::BadRequest,
            Self::PrExists | Self::PrMerged | Self::NotAssigned | Self::NoCandidate => {
                StatusClass::Conflict
            }
            Self::NotFound => StatusClass::NotFound,
            Self::Unknown => StatusClass::Internal,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conditions the engine rejects on its own, set where they are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The pull request is merged and its reviewers are frozen.
    PrMerged,
    /// The user is not a current reviewer of the pull request.
    NotAssigned,
    /// No eligible replacement reviewer exists.
    NoCandidate,
    /// A referenced pull request, user or team does not exist.
    NotFound,
}

/// Failure of an engine operation, before classification.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{message}")]
    Rejected { kind: Rejection, message: String },

    #[error(transparent)]
    Store(#[from] DbError),

    #[error("deadline of {0:?} exceeded; transaction rolled back")]
    DeadlineExceeded(Duration),
}

impl EngineError {
    pub fn rejected(kind: Rejection, message: impl Into<String>) -> Self {
        Self::Rejected {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::rejected(Rejection::NotFound, message)
    }

    /// The rejection kind, if the engine rejected the request itself.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Rejected { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(DbError::from(err))
    }
}

/// Operation whose failure is being classified.
///
/// A unique-key clash means something different depending on what was being
/// created, so the classifier needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateTeam,
    GetTeam,
    SetUserActive,
    GetUserReviews,
    CreatePr,
    MergePr,
    ReassignPr,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateTeam => "create_team",
            Self::GetTeam => "get_team",
            Self::SetUserActive => "set_user_active",
            Self::GetUserReviews => "get_user_reviews",
            Self::CreatePr => "create_pr",
            Self::MergePr => "merge_pr",
            Self::ReassignPr => "reassign_pr",
        }
    }
}

/// Classified failure returned to callers.
///
/// Serializes as `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, message)
    }

    pub fn status_class(&self) -> StatusClass {
        self.code.status_class()
    }
}

impl Serialize for AppError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Body<'a> {
            code: ErrorCode,
            message: &'a str,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            error: Body<'a>,
        }

        Envelope {
            error: Body {
                code: self.code,
                message: &self.message,
            },
        }
        .serialize(serializer)
    }
}

/// Map an engine failure to a stable error code.
///
/// This is a pure mapping. Anything it does not recognise becomes `UNKNOWN`
/// with the underlying message kept intact.
pub fn classify(op: Operation, err: EngineError) -> AppError {
    match err {
        EngineError::Rejected { kind, message } => {
            let code = match kind {
                Rejection::PrMerged => ErrorCode::PrMerged,
                Rejection::NotAssigned => ErrorCode::NotAssigned,
                Rejection::NoCandidate => ErrorCode::NoCandidate,
                Rejection::NotFound => ErrorCode::NotFound,
            };
            AppError::new(code, message)
        }
        EngineError::Store(DbError::UniqueViolation(detail)) => match op {
            Operation::CreateTeam => AppError::new(ErrorCode::TeamExists, "team already exists"),
            Operation::CreatePr => AppError::new(ErrorCode::PrExists, "PR id already exists"),
            _ => AppError::unknown(format!("unique constraint violated: {}", detail)),
        },
        EngineError::Store(DbError::ConstraintViolation(_)) => match op {
            Operation::CreatePr => AppError::not_found("author not found"),
            _ => AppError::not_found("referenced entity not found"),
        },
        EngineError::Store(DbError::NoRows) => AppError::not_found("resource not found"),
        other @ (EngineError::Store(_) | EngineError::DeadlineExceeded(_)) => {
            AppError::unknown(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = AppError::new(ErrorCode::PrMerged, "cannot reassign on merged PR");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"]["code"], "PR_MERGED");
        assert_eq!(json["error"]["message"], "cannot reassign on merged PR");
    }

    #[test]
    fn test_rejections_keep_their_kind() {
        let cases = [
            (Rejection::PrMerged, ErrorCode::PrMerged),
            (Rejection::NotAssigned, ErrorCode::NotAssigned),
            (Rejection::NoCandidate, ErrorCode::NoCandidate),
            (Rejection::NotFound, ErrorCode::NotFound),
        ];
        for (kind, code) in cases {
            let err = classify(Operation::ReassignPr, EngineError::rejected(kind, "msg"));
            assert_eq!(err.code, code);
            assert_eq!(err.message, "msg");
        }
    }

    #[test]
    fn test_unique_violation_depends_on_operation() {
        let dup = || EngineError::Store(DbError::UniqueViolation("UNIQUE constraint failed".into()));
        assert_eq!(classify(Operation::CreateTeam, dup()).code, ErrorCode::TeamExists);
        assert_eq!(classify(Operation::CreatePr, dup()).code, ErrorCode::PrExists);

        let other = classify(Operation::ReassignPr, dup());
        assert_eq!(other.code, ErrorCode::Unknown);
        assert!(other.message.contains("UNIQUE constraint failed"));
    }

    #[test]
    fn test_missing_references_are_not_found() {
        let err = classify(
            Operation::CreatePr,
            EngineError::Store(DbError::ConstraintViolation("FOREIGN KEY constraint failed".into())),
        );
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = classify(Operation::MergePr, EngineError::Store(DbError::NoRows));
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_unrecognised_failures_keep_message() {
        let err = classify(
            Operation::CreatePr,
            EngineError::Store(DbError::Sqlite(sqlx::Error::PoolTimedOut)),
        );
        assert_eq!(err.code, ErrorCode::Unknown);
        assert!(err.message.contains(&sqlx::Error::PoolTimedOut.to_string()));

        let err = classify(
            Operation::MergePr,
            EngineError::DeadlineExceeded(Duration::from_millis(250)),
        );
        assert_eq!(err.code, ErrorCode::Unknown);
        assert!(err.message.contains("250ms"));

        let err = classify(
            Operation::CreatePr,
            EngineError::DeadlineExceeded(Duration::from_micros(300)),
        );
        assert!(err.message.contains("300µs"), "{}", err.message);
    }

    #[test]
    fn test_status_classes() {
        assert_eq!(ErrorCode::TeamExists.status_class(), StatusClass::BadRequest);
        assert_eq!(ErrorCode::NoCandidate.status_class(), StatusClass::Conflict);
        assert_eq!(ErrorCode::NotFound.status_class(), StatusClass::NotFound);
        assert_eq!(ErrorCode::Unknown.status_class(), StatusClass::Internal);
    }

    #[test]
    fn test_display_impl() {
        let err = AppError::not_found("team not found");
        assert_eq!(format!("{}", err), "NOT_FOUND: team not found");
    }
}
