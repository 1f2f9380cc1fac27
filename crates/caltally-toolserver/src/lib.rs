//! Read-only HTTP API over a loaded calendar.
//!
//! Exposes the same queries as the CLI as JSON, so a plotting tool or other
//! local collaborator can pull category totals and daily series without
//! parsing the calendar itself. The calendar is loaded once before the
//! server starts and never reloaded.

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use caltally_core::{
    AggregationConfig, CategoryHours, CoreError, DailyConfig, DailyHours, Event, SeriesSummary,
    TimeRange, summarize,
};
use caltally_fs::{Calendar, CaltallyConfig};
use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

/// Server state shared across handlers.
struct AppState {
    calendar: Calendar,
    config: CaltallyConfig,
    timezone: Tz,
}

/// Start the tool server.
///
/// # Errors
/// Returns error if binding fails or server encounters an error.
pub async fn serve(
    calendar: Calendar,
    config: CaltallyConfig,
    timezone: Tz,
    host: &str,
    port: u16,
) -> Result<()> {
    let state = Arc::new(AppState {
        calendar,
        config,
        timezone,
    });
    let events = state.calendar.events().len();

    let addr = format!("{host}:{port}");
    info!(address = %addr, events, "Starting tool server");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(events))
        .route("/hours", get(hours))
        .route("/daily", get(daily))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// --- Request/Response types ---

/// Query parameters accepted by every data endpoint; each endpoint reads the
/// ones that apply to it.
#[derive(Debug, Default, Deserialize)]
struct RangeQuery {
    from: Option<String>,
    to: Option<String>,
    week: Option<i64>,
    depth: Option<usize>,
    /// Comma separated labels.
    ignore: Option<String>,
    include_all_day: Option<bool>,
    /// Comma separated top-level categories.
    category: Option<String>,
}

fn split_list(value: Option<&str>) -> impl Iterator<Item = String> + '_ {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    events: usize,
    skipped: usize,
}

#[derive(Debug, Serialize)]
struct EventsResponse {
    range: TimeRange,
    count: usize,
    events: Vec<Event>,
}

#[derive(Debug, Serialize)]
struct HoursResponse {
    range: TimeRange,
    depth: usize,
    total: f64,
    categories: CategoryHours,
}

#[derive(Debug, Serialize)]
struct DailyResponse {
    range: TimeRange,
    categories: BTreeSet<String>,
    days: DailyHours,
    summary: Option<SeriesSummary>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl AppState {
    fn range(&self, query: &RangeQuery) -> Result<TimeRange, CoreError> {
        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        TimeRange::select(
            query.from.as_deref(),
            query.to.as_deref(),
            query.week,
            self.timezone,
            today,
        )
    }

    fn aggregation(&self, query: &RangeQuery) -> Result<AggregationConfig, CoreError> {
        let mut config = self.config.aggregation(self.range(query)?);
        if let Some(depth) = query.depth {
            config.depth = depth;
        }
        config.ignore.extend(split_list(query.ignore.as_deref()));
        if let Some(include) = query.include_all_day {
            config.include_all_day = include;
        }
        Ok(config)
    }

    fn daily(&self, query: &RangeQuery) -> Result<DailyConfig, CoreError> {
        let mut config = self.config.daily(self.range(query)?, self.timezone);
        let categories: BTreeSet<String> = split_list(query.category.as_deref()).collect();
        if !categories.is_empty() {
            config.categories = categories;
        }
        Ok(config)
    }
}

// --- Handlers ---

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        events: state.calendar.events().len(),
        skipped: state.calendar.skipped().len(),
    })
}

async fn events(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<EventsResponse>, AppError> {
    let Query(query) = query?;
    let range = state.range(&query)?;

    let events: Vec<Event> = state
        .calendar
        .events_between(&range)
        .into_iter()
        .cloned()
        .collect();
    debug!(count = events.len(), "Served events");

    Ok(Json(EventsResponse {
        range,
        count: events.len(),
        events,
    }))
}

async fn hours(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<HoursResponse>, AppError> {
    let Query(query) = query?;
    let config = state.aggregation(&query)?;

    let categories = state.calendar.category_hours(&config);
    Ok(Json(HoursResponse {
        range: config.range,
        depth: config.depth,
        total: categories.values().sum(),
        categories,
    }))
}

async fn daily(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<DailyResponse>, AppError> {
    let Query(query) = query?;
    let config = state.daily(&query)?;

    let days = state.calendar.daily_hours(&config);
    Ok(Json(DailyResponse {
        range: config.range,
        summary: summarize(&days),
        categories: config.categories,
        days,
    }))
}

async fn not_found() -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        error: anyhow::anyhow!("not found"),
    }
}

// --- Error handling ---

struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ErrorResponse {
            error: self.error.to_string(),
        });

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        let bad_request = error.is::<QueryRejection>()
            || error
                .downcast_ref::<CoreError>()
                .is_some_and(|e| !e.is_fatal());

        Self {
            status: if bad_request {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            },
            error,
        }
    }
}
