use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Environment;
use crate::error::{Error, Result};
use crate::filters::{
    Filters, COURSE_SORT_SAFELIST, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, DEFAULT_SORT,
};
use crate::models::{CoursePatch, NewCourse};
use crate::repository::CourseRepository;
use crate::validation::validate_filters;

#[derive(Clone)]
pub struct AppState {
    pub courses: CourseRepository,
    pub env: Environment,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/status", get(status))
        .route("/v1/courses", get(list_courses).post(create_course))
        .route(
            "/v1/courses/:id",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .with_state(state)
}

/// Whole-request deadline, answered with 408 when exceeded.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Server-wide layers: request tracing, permissive CORS, a request
/// deadline, and panics turned into 500 responses.
pub fn with_middleware(app: Router, request_timeout: Duration) -> Router {
    app.layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.env.as_str(),
    }))
}

#[derive(Deserialize, Debug, Default)]
struct ListParams {
    name: Option<String>,
    tags: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
    sort: Option<String>,
}

async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>> {
    let name = params.name.unwrap_or_default();
    let tags = read_csv(params.tags.as_deref());

    let filters = Filters {
        page: read_int(params.page.as_deref(), DEFAULT_PAGE)
            .ok_or_else(|| Error::BadRequest("invalid page number".into()))?,
        page_size: read_int(params.page_size.as_deref(), DEFAULT_PAGE_SIZE)
            .ok_or_else(|| Error::BadRequest("invalid page size".into()))?,
        sort: params
            .sort
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SORT.to_string()),
        sort_safelist: COURSE_SORT_SAFELIST,
    };
    validate_filters(&filters)?;

    let (courses, metadata) = state.courses.list(&name, &tags, &filters).await?;
    Ok(Json(json!({ "courses": courses, "metadata": metadata })))
}

async fn create_course(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewCourse>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<Value>)> {
    let Json(input) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;
    input.validate()?;

    let course = state.courses.insert(&input.normalized()).await?;

    let mut headers = HeaderMap::new();
    let location = format!("/v1/courses/{}", course.id);
    if let Ok(value) = HeaderValue::from_str(&location) {
        headers.insert(header::LOCATION, value);
    }

    Ok((StatusCode::CREATED, headers, Json(json!({ "course": course }))))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = read_id(&id)?;
    let course = state.courses.get(id).await?;
    Ok(Json(json!({ "course": course })))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<CoursePatch>, JsonRejection>,
) -> Result<Json<Value>> {
    let id = read_id(&id)?;
    let Json(patch) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;

    let mut course = state.courses.get(id).await?;
    patch.apply(&mut course);
    course.validate()?;

    state.courses.update(&mut course).await?;
    Ok(Json(json!({ "course": course })))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = read_id(&id)?;
    state.courses.delete(id).await?;
    Ok(Json(json!({ "message": "course successfully deleted" })))
}

// --- helpers ---

fn read_id(raw: &str) -> Result<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(Error::NotFound),
    }
}

fn read_csv(raw: Option<&str>) -> Vec<String> {
    match raw {
        None | Some("") => Vec::new(),
        Some(csv) => csv.split(',').map(str::to_string).collect(),
    }
}

fn read_int(raw: Option<&str>, default: i64) -> Option<i64> {
    match raw {
        None | Some("") => Some(default),
        Some(s) => s.parse().ok(),
    }
}
