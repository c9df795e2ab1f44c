use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    CalculationResult, CalculatorInfo, CalculatorType, EngineError, ParameterSet, calculate,
    catalog, format_currency,
};
use crate::insight::{
    DisabledNarrativeGenerator, GeminiConfig, GeminiNarrativeGenerator, InMemoryCreditLedger,
    InsightError, InsightOutcome, InsightService, NarrativeGenerator,
};

/// Header carrying the authenticated user id, set by the identity layer in
/// front of this service.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_endpoint: String,
    pub insight_timeout: Duration,
    pub starting_credits: u32,
}

#[derive(Clone)]
pub struct AppState {
    insights: InsightService,
}

impl AppState {
    pub fn new(insights: InsightService) -> Self {
        Self { insights }
    }

    pub fn from_config(config: &ServerConfig) -> std::io::Result<Self> {
        let generator: Arc<dyn NarrativeGenerator> = match &config.gemini_api_key {
            Some(key) if !key.trim().is_empty() => {
                let generator = GeminiNarrativeGenerator::new(GeminiConfig {
                    api_key: key.clone(),
                    model: config.gemini_model.clone(),
                    endpoint: config.gemini_endpoint.clone(),
                    timeout: config.insight_timeout,
                })
                .map_err(std::io::Error::other)?;
                Arc::new(generator)
            }
            _ => {
                tracing::warn!("no narrative API key configured; insights will use fallback text");
                Arc::new(DisabledNarrativeGenerator)
            }
        };
        let ledger = Arc::new(InMemoryCreditLedger::new(config.starting_credits));
        Ok(Self::new(InsightService::new(ledger, generator)))
    }
}

/// Calculation request as sent by the web form. Every parameter is optional
/// and falls back to the form default; the short names the form state uses
/// are accepted as aliases.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    #[serde(rename = "type", alias = "calculator")]
    calculator: Option<String>,
    #[serde(alias = "amount")]
    monthly_contribution: Option<f64>,
    #[serde(alias = "rate")]
    annual_rate_percent: Option<f64>,
    years: Option<f64>,
    #[serde(alias = "inflation")]
    inflation_rate_percent: Option<f64>,
    #[serde(alias = "expense")]
    monthly_expense: Option<f64>,
    #[serde(alias = "assets")]
    total_assets: Option<f64>,
    #[serde(alias = "liabilities")]
    total_liabilities: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
struct ApiRequest {
    kind: CalculatorType,
    params: ParameterSet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormattedTotals {
    total_value: String,
    invested_amount: String,
    returns: String,
}

impl From<&CalculationResult> for FormattedTotals {
    fn from(result: &CalculationResult) -> Self {
        Self {
            total_value: format_currency(result.total_value),
            invested_amount: format_currency(result.invested_amount),
            returns: format_currency(result.returns),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    calculator: CalculatorType,
    parameters: ParameterSet,
    result: CalculationResult,
    formatted: FormattedTotals,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsightResponse {
    #[serde(flatten)]
    outcome: InsightOutcome,
    formatted: FormattedTotals,
}

#[derive(Debug, Serialize)]
struct CreditsResponse {
    credits: u32,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let state = AppState::from_config(&config)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, model = %config.gemini_model, "wealth calculator API listening");

    axum::serve(listener, router(state)).await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/calculators", get(calculators_handler))
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .route("/api/insight", post(insight_handler))
        .route("/api/credits", get(credits_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn calculators_handler() -> Response {
    let entries: Vec<CalculatorInfo> = catalog();
    json_response(StatusCode::OK, entries)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_get_handler(Query(payload): Query<CalculatePayload>) -> Response {
    calculate_handler_impl(payload)
}

async fn calculate_post_handler(Json(payload): Json<CalculatePayload>) -> Response {
    calculate_handler_impl(payload)
}

fn calculate_handler_impl(payload: CalculatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match calculate(request.kind, &request.params) {
        Ok(result) => json_response(
            StatusCode::OK,
            CalculateResponse {
                calculator: request.kind,
                formatted: FormattedTotals::from(&result),
                parameters: request.params,
                result,
            },
        ),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

async fn insight_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CalculatePayload>,
) -> Response {
    let Some(user_id) = user_id_from_headers(&headers) else {
        return error_response(StatusCode::UNAUTHORIZED, "sign in to request insights");
    };
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match state
        .insights
        .request_insight(&user_id, request.kind, &request.params)
        .await
    {
        Ok(outcome) => {
            let formatted = FormattedTotals::from(&outcome.result);
            json_response(StatusCode::OK, InsightResponse { outcome, formatted })
        }
        Err(e) => {
            let status = insight_error_status(&e);
            if status.is_server_error() {
                tracing::error!(%user_id, error = %e, "insight request failed");
            }
            error_response(status, &e.to_string())
        }
    }
}

async fn credits_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(user_id) = user_id_from_headers(&headers) else {
        return error_response(StatusCode::UNAUTHORIZED, "sign in to view credits");
    };
    match state.insights.credits(&user_id).await {
        Ok(credits) => json_response(StatusCode::OK, CreditsResponse { credits }),
        Err(e) => error_response(insight_error_status(&e), &e.to_string()),
    }
}

fn user_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn insight_error_status(err: &InsightError) -> StatusCode {
    match err {
        InsightError::Engine(_) => StatusCode::BAD_REQUEST,
        InsightError::CreditsExhausted => StatusCode::PAYMENT_REQUIRED,
        InsightError::Ledger(_) => StatusCode::SERVICE_UNAVAILABLE,
        InsightError::Api(_)
        | InsightError::Network(_)
        | InsightError::InvalidResponse(_)
        | InsightError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: CalculatePayload) -> Result<ApiRequest, String> {
    let Some(tag) = payload.calculator else {
        return Err("type is required".to_string());
    };
    let kind = tag
        .parse::<CalculatorType>()
        .map_err(|e: EngineError| e.to_string())?;

    let mut params = ParameterSet::default();
    if let Some(v) = payload.monthly_contribution {
        params.monthly_contribution = v;
    }
    if let Some(v) = payload.annual_rate_percent {
        params.annual_rate_percent = v;
    }
    if let Some(v) = payload.years {
        params.years = v;
    }
    if let Some(v) = payload.inflation_rate_percent {
        params.inflation_rate_percent = v;
    }
    if let Some(v) = payload.monthly_expense {
        params.monthly_expense = v;
    }
    if let Some(v) = payload.total_assets {
        params.total_assets = v;
    }
    if let Some(v) = payload.total_liabilities {
        params.total_liabilities = v;
    }

    Ok(ApiRequest { kind, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::HeaderValue;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn state_with_credits(credits: u32) -> AppState {
        AppState::new(InsightService::new(
            Arc::new(InMemoryCreditLedger::new(credits)),
            Arc::new(DisabledNarrativeGenerator),
        ))
    }

    fn user_headers(user: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(user).expect("header"));
        headers
    }

    #[test]
    fn api_request_from_json_parses_canonical_keys() {
        let request = api_request_from_json(
            r#"{
              "type": "SIP",
              "monthlyContribution": 5000,
              "annualRatePercent": 10.5,
              "years": 15
            }"#,
        )
        .expect("valid request");

        assert_eq!(request.kind, CalculatorType::Sip);
        assert_eq!(request.params.monthly_contribution, 5_000.0);
        assert_eq!(request.params.annual_rate_percent, 10.5);
        assert_eq!(request.params.years, 15.0);
        assert_eq!(request.params.monthly_expense, 30_000.0);
    }

    #[test]
    fn api_request_from_json_accepts_form_aliases() {
        let request = api_request_from_json(
            r#"{
              "calculator": "net-worth",
              "assets": 750000,
              "liabilities": 900000,
              "amount": 1,
              "rate": 2,
              "inflation": 3,
              "expense": 4
            }"#,
        )
        .expect("valid request");

        assert_eq!(request.kind, CalculatorType::NetWorth);
        assert_eq!(request.params.total_assets, 750_000.0);
        assert_eq!(request.params.total_liabilities, 900_000.0);
        assert_eq!(request.params.monthly_contribution, 1.0);
        assert_eq!(request.params.annual_rate_percent, 2.0);
        assert_eq!(request.params.inflation_rate_percent, 3.0);
        assert_eq!(request.params.monthly_expense, 4.0);
    }

    #[test]
    fn api_request_requires_known_type() {
        let err = api_request_from_json(r#"{"years": 3}"#).expect_err("type missing");
        assert!(err.contains("type"));

        let err = api_request_from_json(r#"{"type": "CRYPTO"}"#).expect_err("unknown type");
        assert!(err.contains("unknown calculator type"));
    }

    #[test]
    fn api_request_rejects_non_numeric_parameter() {
        let err = api_request_from_json(r#"{"type": "FD", "rate": "twelve"}"#)
            .expect_err("must reject");
        assert!(err.starts_with("Invalid API JSON payload"));
    }

    #[test]
    fn user_id_header_must_be_non_empty() {
        assert_eq!(user_id_from_headers(&HeaderMap::new()), None);
        assert_eq!(user_id_from_headers(&user_headers("  ")), None);
        assert_eq!(
            user_id_from_headers(&user_headers("user-42")),
            Some("user-42".to_string())
        );
    }

    #[test]
    fn insight_errors_map_to_statuses() {
        assert_eq!(
            insight_error_status(&InsightError::CreditsExhausted),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            insight_error_status(&InsightError::Engine(EngineError::UnknownCalculator(
                "X".to_string()
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            insight_error_status(&InsightError::Api("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn calculate_returns_result_and_formatted_totals() {
        let payload = CalculatePayload {
            calculator: Some("SIP".to_string()),
            ..CalculatePayload::default()
        };
        let response = calculate_handler_impl(payload);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );

        let body = body_json(response).await;
        assert_eq!(body["calculator"], "SIP");
        assert_eq!(body["result"]["totalValue"], 232_339.0);
        assert_eq!(body["result"]["segments"][0]["label"], "Invested Capital");
        assert_eq!(body["formatted"]["totalValue"], "$232,339");
        assert_eq!(body["formatted"]["returns"], "$112,339");
    }

    #[tokio::test]
    async fn calculate_rejects_negative_input() {
        let payload = CalculatePayload {
            calculator: Some("EMERGENCY_FUND".to_string()),
            monthly_expense: Some(-10.0),
            ..CalculatePayload::default()
        };
        let response = calculate_handler_impl(payload);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().expect("message").contains("monthlyExpense"));
    }

    #[tokio::test]
    async fn insight_requires_identity() {
        let response = insight_handler(
            State(state_with_credits(5)),
            HeaderMap::new(),
            Json(CalculatePayload {
                calculator: Some("FD".to_string()),
                ..CalculatePayload::default()
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn insight_serves_fallback_then_requires_upgrade() {
        let state = state_with_credits(1);
        let payload = || {
            Json(CalculatePayload {
                calculator: Some("RETIREMENT".to_string()),
                ..CalculatePayload::default()
            })
        };

        let first = insight_handler(State(state.clone()), user_headers("u1"), payload()).await;
        assert_eq!(first.status(), StatusCode::OK);
        let body = body_json(first).await;
        assert_eq!(body["creditsRemaining"], 0);
        assert_eq!(body["fallback"], true);
        assert_eq!(body["calculator"], "RETIREMENT");
        assert!(body["formatted"]["totalValue"].as_str().expect("formatted").starts_with('$'));

        let second = insight_handler(State(state.clone()), user_headers("u1"), payload()).await;
        assert_eq!(second.status(), StatusCode::PAYMENT_REQUIRED);

        let credits = credits_handler(State(state), user_headers("u1")).await;
        assert_eq!(body_json(credits).await["credits"], 0);
    }

    #[tokio::test]
    async fn catalog_endpoint_lists_calculators() {
        let body = body_json(calculators_handler().await).await;
        let entries = body.as_array().expect("array");
        assert_eq!(entries.len(), 8);
        assert_eq!(entries[0]["id"], "SIP");
        assert_eq!(entries[0]["title"], "SIP Calculator");
    }
}
