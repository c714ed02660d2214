//! Credit evaluation endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use credit_core::{BatchEvaluation, CreditError, EvaluationRequest, EvaluationResponse};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{AppError, AppState};

/// Body of `POST /evaluate/batch`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BatchRequest {
    /// `{"requests": [{"ticker": "AAPL", "industry_type": 2}, ...]}`
    List { requests: Vec<EvaluationRequest> },
    /// `{"tickers": "AAPL, MSFT", "industry_types": "2, 2"}`
    Dashboard {
        tickers: String,
        industry_types: String,
    },
}

impl BatchRequest {
    pub fn into_requests(self) -> Result<Vec<EvaluationRequest>, CreditError> {
        match self {
            BatchRequest::List { requests } => Ok(requests),
            BatchRequest::Dashboard {
                tickers,
                industry_types,
            } => parse_dashboard_input(&tickers, &industry_types),
        }
    }
}

/// Parse comma separated tickers and industry types, one type per ticker.
///
/// Blank entries are dropped and tickers are uppercased. Industry codes are
/// only checked for being integers here; range checks happen per ticker.
pub fn parse_dashboard_input(
    tickers: &str,
    industry_types: &str,
) -> Result<Vec<EvaluationRequest>, CreditError> {
    let tickers: Vec<String> = split_list(tickers).map(str::to_uppercase).collect();
    let raw_types: Vec<&str> = split_list(industry_types).collect();

    if tickers.is_empty() {
        return Err(CreditError::validation("Please enter at least one ticker symbol."));
    }
    if raw_types.is_empty() {
        return Err(CreditError::validation("Please enter at least one industry type."));
    }
    if tickers.len() != raw_types.len() {
        return Err(CreditError::validation(format!(
            "Mismatch: {} ticker(s) provided but {} industry type(s). \
             Provide one industry type per ticker.",
            tickers.len(),
            raw_types.len()
        )));
    }

    let codes = raw_types
        .iter()
        .map(|raw| raw.parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| CreditError::validation("Industry types must be integers: 1, 2, or 3."))?;

    Ok(tickers
        .into_iter()
        .zip(codes)
        .map(|(ticker, code)| EvaluationRequest::new(ticker, code))
        .collect())
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn bad_body(rejection: JsonRejection) -> AppError {
    AppError::with_status(
        StatusCode::BAD_REQUEST,
        anyhow::anyhow!("Invalid request body: {}", rejection.body_text()),
    )
}

pub fn evaluate_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/evaluate", post(evaluate))
        .route("/evaluate/batch", post(evaluate_batch))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /evaluate
async fn evaluate(
    State(state): State<AppState>,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<Json<EvaluationResponse>, AppError> {
    let Json(request) = payload.map_err(bad_body)?;

    state
        .evaluator
        .evaluate(&request)
        .await
        .map(Json)
        .map_err(|e| AppError::for_ticker(request.normalized_ticker(), e))
}

/// POST /evaluate/batch
async fn evaluate_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchEvaluation>, AppError> {
    let Json(body) = payload.map_err(bad_body)?;
    let requests = body
        .into_requests()
        .map_err(|e| AppError::for_ticker("", e))?;

    if requests.is_empty() {
        return Err(AppError::for_ticker(
            "",
            CreditError::validation("At least one ticker is required."),
        ));
    }
    if requests.len() > state.max_batch_size {
        return Err(AppError::for_ticker(
            "",
            CreditError::validation(format!(
                "Batch of {} tickers exceeds the limit of {}.",
                requests.len(),
                state.max_batch_size
            )),
        ));
    }

    Ok(Json(state.evaluator.evaluate_batch(requests).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_input_skips_blanks_and_uppercases() {
        let requests = parse_dashboard_input(" aapl, ,msft,", "2, 3").unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].ticker, "AAPL");
        assert_eq!(requests[0].industry_type, 2);
        assert_eq!(requests[1].ticker, "MSFT");
        assert_eq!(requests[1].industry_type, 3);
    }

    #[test]
    fn test_dashboard_input_count_mismatch() {
        let err = parse_dashboard_input("AAPL, MSFT", "2").unwrap_err();
        assert!(err.to_string().contains("Mismatch: 2 ticker(s)"));
    }

    #[test]
    fn test_dashboard_input_rejects_non_integer_types() {
        let err = parse_dashboard_input("AAPL", "two").unwrap_err();
        assert!(matches!(err, CreditError::Validation(_)));
        assert!(parse_dashboard_input("AAPL", "2.5").is_err());
    }

    #[test]
    fn test_dashboard_input_requires_entries() {
        assert!(parse_dashboard_input(" , ", "1").is_err());
        assert!(parse_dashboard_input("AAPL", "").is_err());
    }

    #[test]
    fn test_out_of_range_codes_are_left_for_evaluation() {
        let requests = parse_dashboard_input("AAPL", "7").unwrap();
        assert_eq!(requests[0].industry_type, 7);
    }

    #[test]
    fn test_batch_request_accepts_both_forms() {
        let list: BatchRequest = serde_json::from_value(json!({
            "requests": [{ "ticker": "AAPL", "industry_type": 1 }]
        }))
        .unwrap();
        assert_eq!(list.into_requests().unwrap().len(), 1);

        let dashboard: BatchRequest = serde_json::from_value(json!({
            "tickers": "AAPL, MSFT",
            "industry_types": "1, 2"
        }))
        .unwrap();
        assert_eq!(dashboard.into_requests().unwrap().len(), 2);
    }
}
