// Subscription Revenue Forecast - Web Server
// REST API with Axum over one immutable analysis snapshot

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subscription_forecast::{
    analyze, load_ledger, read_ledger, AnalysisConfig, AnalysisError, AnalysisReport,
    CadenceForecast, ItemError, SubscriptionSummary, YearDelta, YearTotal,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
struct AppState {
    report: Arc<AnalysisReport>,
    config: Arc<AnalysisConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn fail(status: StatusCode, message: impl ToString) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message.to_string()),
        }),
    )
        .into_response()
}

fn status_for(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Yearly revenue response
#[derive(Serialize)]
struct RevenueResponse {
    totals: Vec<YearTotal>,
    deltas: Vec<YearDelta>,
}

#[derive(Deserialize)]
struct RankingQuery {
    k: Option<usize>,
}

#[derive(Serialize)]
struct RankingResponse {
    k: usize,
    growth: Vec<YearDelta>,
    loss: Vec<YearDelta>,
}

#[derive(Serialize)]
struct ForecastResponse {
    year: i32,
    total: f64,
    returning_revenue: f64,
    new_revenue: f64,
    by_cadence: Vec<CadenceForecast>,
    skipped: Vec<ItemError>,
}

#[derive(Deserialize)]
struct AnalyzeQuery {
    start_year: Option<i32>,
    end_year: Option<i32>,
    k: Option<usize>,
    lenient: Option<bool>,
}

fn with_deltas(report: &AnalysisReport, years: &[i32]) -> Vec<YearDelta> {
    years
        .iter()
        .map(|year| YearDelta {
            year: *year,
            delta: report.delta_of(*year).unwrap_or_default(),
        })
        .collect()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/report - Full analysis
async fn get_report(State(state): State<AppState>) -> Response {
    ApiResponse::ok(state.report.as_ref())
}

/// GET /api/subscriptions - Every classified subscription
async fn get_subscriptions(State(state): State<AppState>) -> Response {
    ApiResponse::ok(&state.report.subscriptions)
}

/// GET /api/subscriptions/:id - One subscription
async fn get_subscription(State(state): State<AppState>, Path(id): Path<u32>) -> Response {
    match state.report.subscription(id) {
        Some(sub) => ApiResponse::<&SubscriptionSummary>::ok(sub),
        None => fail(StatusCode::NOT_FOUND, format!("Subscription {} not found", id)),
    }
}

/// GET /api/revenue - Yearly totals and deltas
async fn get_revenue(State(state): State<AppState>) -> Response {
    ApiResponse::ok(RevenueResponse {
        totals: state.report.yearly_totals(),
        deltas: state.report.deltas.clone(),
    })
}

/// GET /api/rankings?k=5 - Top growth / loss years
async fn get_rankings(State(state): State<AppState>, Query(query): Query<RankingQuery>) -> Response {
    let k = query.k.unwrap_or(state.report.config.top_k);

    match state.report.rankings(k) {
        Ok((growth, loss)) => ApiResponse::ok(RankingResponse {
            k,
            growth: with_deltas(&state.report, &growth),
            loss: with_deltas(&state.report, &loss),
        }),
        Err(e) => fail(StatusCode::BAD_REQUEST, e),
    }
}

/// GET /api/forecast - Next-year forecast breakdown
async fn get_forecast(State(state): State<AppState>) -> Response {
    let forecast = &state.report.forecast;
    ApiResponse::ok(ForecastResponse {
        year: forecast.year,
        total: forecast.total(),
        returning_revenue: forecast.returning_revenue,
        new_revenue: forecast.new_revenue,
        by_cadence: forecast.by_cadence.clone(),
        skipped: forecast.errors.clone(),
    })
}

/// POST /api/analyze - Analyze a CSV body as an independent run
async fn post_analyze(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    body: Bytes,
) -> Response {
    let mut config = state.config.as_ref().clone();
    if let Some(start) = query.start_year {
        config.start_year = start;
    }
    if let Some(end) = query.end_year {
        config.end_year = end;
    }
    if let Some(k) = query.k {
        config.top_k = k;
    }
    if let Some(lenient) = query.lenient {
        config.strict_parsing = !lenient;
    }

    let result = read_ledger(body.as_ref(), config.strict_parsing)
        .and_then(|ledger| analyze(&ledger, &config));

    match result {
        Ok(report) => {
            info!(fingerprint = %report.fingerprint, "{}", report.summary());
            ApiResponse::ok(report)
        }
        Err(e) => {
            error!(error = %e, "analyze request failed");
            fail(status_for(&e), e)
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    // Optional config path as first argument
    let config = match std::env::args().nth(1) {
        Some(path) => AnalysisConfig::from_file(&path)?,
        None => AnalysisConfig::default(),
    };
    config.validate()?;

    let ledger = load_ledger(&config.input, config.strict_parsing)?;
    let report = analyze(&ledger, &config)?;
    info!("{}", report.summary());

    // Create shared state
    let state = AppState {
        report: Arc::new(report),
        config: Arc::new(config),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/report", get(get_report))
        .route("/subscriptions", get(get_subscriptions))
        .route("/subscriptions/:id", get(get_subscription))
        .route("/revenue", get(get_revenue))
        .route("/rankings", get(get_rankings))
        .route("/forecast", get(get_forecast))
        .route("/analyze", post(post_analyze))
        .with_state(state);

    // Build main router
    let app = Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    // Start server
    let addr = std::env::var("FORECAST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 Server running on http://{}", addr);
    info!("   API: http://{}/api/report", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
