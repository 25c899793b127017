use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use canopy_aggregator::{Outcome, SubmitError};
use canopy_core_types::{RawSubmission, Votes};
use canopy_metrics::SharedRegistry;

use crate::state::AppState;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Fail,
}

/// Body of every response to `POST /add_tree`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub status: Status,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Votes counted so far, while the tally is pending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<Votes>,

    /// Winning type, once the tree request is committed
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub tree_type: Option<String>,
}

impl Reply {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
            error: None,
            votes: None,
            tree_type: None,
        }
    }

    fn fail(message: impl Into<String>, error: impl ToString) -> Self {
        Self {
            status: Status::Fail,
            message: message.into(),
            error: Some(error.to_string()),
            votes: None,
            tree_type: None,
        }
    }
}

/// Response to a submission, carrying its status code.
pub struct SubmitResponse(StatusCode, Reply);

impl SubmitResponse {
    pub fn status(&self) -> StatusCode {
        self.0
    }

    pub fn reply(&self) -> &Reply {
        &self.1
    }

    fn invalid(error: impl ToString) -> Self {
        Self(
            StatusCode::BAD_REQUEST,
            Reply::fail("Invalid input data", error),
        )
    }
}

impl IntoResponse for SubmitResponse {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

impl From<Outcome> for SubmitResponse {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Pending { votes, .. } => Self(
                StatusCode::OK,
                Reply {
                    votes: Some(votes),
                    ..Reply::success(format!(
                        "Thank you. Vote no. {votes} for this tree has been received."
                    ))
                },
            ),
            Outcome::Committed { tree_type, .. } => Self(
                StatusCode::CREATED,
                Reply {
                    tree_type: Some(tree_type.to_string()),
                    ..Reply::success("Tree request added successfully")
                },
            ),
        }
    }
}

impl From<SubmitError> for SubmitResponse {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(e) => Self::invalid(e),
            SubmitError::Persistence { source, .. } => Self(
                StatusCode::INTERNAL_SERVER_ERROR,
                Reply::fail("Failed to add the tree request", source),
            ),
            SubmitError::ConcurrencyInvariantViolation(e) => Self(
                StatusCode::INTERNAL_SERVER_ERROR,
                Reply::fail("Internal error", e),
            ),
        }
    }
}

/// `POST /add_tree`
pub async fn add_tree(
    State(state): State<AppState>,
    payload: Result<Json<RawSubmission>, JsonRejection>,
) -> SubmitResponse {
    let raw = match payload {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected malformed request body");
            return SubmitResponse::invalid(rejection.body_text());
        }
    };

    match state.aggregator().submit(&raw).await {
        Ok(outcome) => outcome.into(),
        Err(e) => e.into(),
    }
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// `GET /metrics`
pub async fn export_metrics(State(registry): State<SharedRegistry>) -> Response {
    let mut buf = String::new();

    match canopy_metrics::export(&registry, &mut buf) {
        Ok(()) => buf.into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

impl FromRef<AppState> for SharedRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.registry().clone()
    }
}

#[cfg(test)]
mod tests {
    use canopy_core_types::{Field, ValidationError};
    use canopy_core_votekeeper::InvariantViolation;

    use super::*;

    #[test]
    fn pending_reply_counts_votes() {
        let response = SubmitResponse::from(Outcome::Pending {
            name: "OakA".into(),
            votes: 2,
            threshold: 3,
        });

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            serde_json::to_value(response.reply()).unwrap(),
            serde_json::json!({
                "status": "success",
                "message": "Thank you. Vote no. 2 for this tree has been received.",
                "votes": 2,
            })
        );
    }

    #[test]
    fn committed_reply_names_the_winner() {
        let response = SubmitResponse::from(Outcome::Committed {
            name: "OakA".into(),
            tree_type: "Oak".into(),
            votes: 3,
            request_id: 1,
        });

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.reply().tree_type.as_deref(), Some("Oak"));
        assert_eq!(response.reply().message, "Tree request added successfully");
    }

    #[test]
    fn validation_error_is_a_bad_request() {
        let response = SubmitResponse::from(SubmitError::Validation(
            ValidationError::MissingField(Field::Latitude),
        ));

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.reply().status, Status::Fail);
        assert_eq!(response.reply().message, "Invalid input data");
        assert_eq!(
            response.reply().error.as_deref(),
            Some("missing field `latitude`")
        );
    }

    #[test]
    fn invariant_violation_is_an_internal_error() {
        let response = SubmitResponse::from(SubmitError::ConcurrencyInvariantViolation(
            InvariantViolation::CountMismatch {
                name: "OakA".into(),
                counted: 2,
                total: 3,
            },
        ));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            serde_json::to_value(response.reply()).unwrap(),
            serde_json::json!({
                "status": "fail",
                "message": "Internal error",
                "error": "tally for `OakA` counts 2 votes across types but holds a total of 3",
            })
        );
    }
}
