use crate::config::Listener as ListenerConfig;
use crate::ical::codec::CalendarWriter;
use crate::repository::ReleaseRepository;
use crate::types::{Release, ReleaseStatus, ReleaseType, UnknownReleaseType};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use url::{Url, form_urlencoded};

const CLOSED_COLOR: &str = "#6db33f";
const OVERDUE_COLOR: &str = "#d14";

#[derive(thiserror::Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("invalid allowed origin: {0}")]
    InvalidOrigin(String),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ApiError {
    #[error("invalid date {0:?}, expected yyyy-mm-dd")]
    InvalidDate(String),
    #[error(transparent)]
    InvalidType(#[from] UnknownReleaseType),
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error_message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorResponse {
            error_message: self.to_string(),
        });
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

/// Builds the HTTP API over the release repository. Browsers may only read
/// it from `allowed_origins`.
pub fn router(
    repository: Arc<ReleaseRepository>,
    allowed_origins: &[String],
) -> Result<Router, ServeError> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ServeError::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET]);

    Ok(Router::new()
        .route("/releases", get(events))
        .route("/ical", get(calendar))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .layer(cors)
        .with_state(repository))
}

pub async fn serve<F>(listener: &ListenerConfig, app: Router, shutdown: F) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", listener.host, listener.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "serving release calendar");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// A release in the shape expected by browser calendar widgets.
#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct CalendarEvent {
    title: String,
    all_day: bool,
    start: NaiveDate,
    url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    background_color: Option<&'static str>,
}

impl CalendarEvent {
    fn new(release: Release, today: NaiveDate) -> Self {
        let background_color = if release.status == ReleaseStatus::Closed {
            Some(CLOSED_COLOR)
        } else if release.is_overdue(today) {
            Some(OVERDUE_COLOR)
        } else {
            None
        };
        let mut title = format!("{} {}", release.project, release.name);
        if release.release_type == ReleaseType::Enterprise {
            title.push_str(" (Enterprise)");
        }
        CalendarEvent {
            title,
            all_day: true,
            start: release.date,
            url: release.url,
            background_color,
        }
    }
}

#[derive(Deserialize, Debug)]
struct EventsParams {
    start: String,
    end: String,
    #[serde(rename = "type")]
    release_type: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CalendarParams {
    #[serde(rename = "type")]
    release_type: Option<String>,
}

fn parse_date(value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ApiError::InvalidDate(value.into()))
}

fn parse_type(value: Option<&str>) -> Result<Option<ReleaseType>, ApiError> {
    Ok(value.map(str::parse).transpose()?)
}

async fn events(
    State(repository): State<Arc<ReleaseRepository>>,
    Query(params): Query<EventsParams>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let start = parse_date(&params.start)?;
    let end = parse_date(&params.end)?;
    let release_type = parse_type(params.release_type.as_deref())?;
    let today = Utc::now().date_naive();

    let events = repository
        .find_all_of_type_in_period(release_type, start, end)
        .into_iter()
        .map(|release| CalendarEvent::new(release, today))
        .collect();
    Ok(Json(events))
}

async fn calendar(
    State(repository): State<Arc<ReleaseRepository>>,
    Query(params): Query<CalendarParams>,
) -> Result<Response, ApiError> {
    let release_type = parse_type(params.release_type.as_deref())?;
    let name = match release_type {
        None => "Spring Releases",
        Some(ReleaseType::Oss) => "Spring OSS Releases",
        Some(ReleaseType::Enterprise) => "Spring Enterprise Releases",
    };

    let mut writer = CalendarWriter::new(name, Utc::now());
    for release in repository.find_all_of_type(release_type) {
        let uid = event_uid(&release);
        writer.all_day_event(
            &uid,
            &format!("{} {}", release.project, release.name),
            release.date,
        );
    }

    Ok((
        [(header::CONTENT_TYPE, "text/calendar; charset=utf-8")],
        writer.finish(),
    )
        .into_response())
}

/// Stable across polls so that subscribed calendars update events in place.
/// Each part is form-encoded, so distinct releases never share a UID.
fn event_uid(release: &Release) -> String {
    let encode = |s: &str| -> String { form_urlencoded::byte_serialize(s.as_bytes()).collect() };
    format!(
        "{}/{}/{}@releases",
        release.release_type.to_string().to_ascii_lowercase(),
        encode(&release.project),
        encode(&release.name)
    )
}

async fn health() -> &'static str {
    "ok\n"
}

async fn ready(State(repository): State<Arc<ReleaseRepository>>) -> (StatusCode, &'static str) {
    if repository.is_ready() {
        (StatusCode::OK, "ok\n")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready\n")
    }
}
