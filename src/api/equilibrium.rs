//! `POST /calculate-equilibrium`.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::AppState;
use crate::domain::network::NetworkRequest;
use crate::domain::report::EquilibriumReport;

/// Response body: either the structured report or `{ "error": string }`.
///
/// Delivery always succeeds at the transport level; the handler returns
/// 200 for computation failures too. Callers branch on the presence of
/// the `error` key, not on the status code.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CalculateResponse {
    Report(Box<EquilibriumReport>),
    Error { error: String },
}

impl CalculateResponse {
    fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

pub async fn calculate_equilibrium(
    State(state): State<AppState>,
    body: String,
) -> Json<CalculateResponse> {
    let request: NetworkRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(err) => {
            tracing::debug!(error = %err, "rejecting undecodable request body");
            return Json(CalculateResponse::error(format!("invalid input data: {err}")));
        }
    };

    // The computation is synchronous and CPU-bound; keep it off the
    // runtime's I/O workers.
    let engine = state.engine.clone();
    let outcome = tokio::task::spawn_blocking(move || engine.analyze(&request)).await;

    let response = match outcome {
        Ok(Ok(report)) => CalculateResponse::Report(Box::new(report)),
        Ok(Err(err)) => {
            tracing::warn!(kind = err.kind(), error = %err, "equilibrium computation failed");
            CalculateResponse::error(err.to_string())
        }
        Err(join_error) => {
            tracing::error!(error = %join_error, "equilibrium worker aborted");
            CalculateResponse::error(format!("an unexpected error occurred: {join_error}"))
        }
    };

    Json(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_serializes_with_error_key_only() {
        let response = CalculateResponse::error("Validation error: no edges provided");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Validation error: no edges provided"})
        );
    }
}
