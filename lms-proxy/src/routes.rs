//! Pass-through routes mirroring the LMS REST API under `/api/lms`.
use axum::{
    Json,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::info;

use crate::{config::AppState, error::Error, lms::segment};

pub async fn get_status_ping() -> impl IntoResponse {
    info!("Status");
    StatusCode::OK
}

async fn forward(
    state: &AppState,
    action: &'static str,
    method: Method,
    path: String,
    query: Option<String>,
    body: Option<Value>,
) -> Result<Response, Error> {
    let upstream = state
        .lms
        .forward(action, method, &path, query.as_deref(), body)
        .await?;

    Ok(match upstream.body {
        Some(body) => (upstream.status, Json(body)).into_response(),
        None => upstream.status.into_response(),
    })
}

/// Bodies are optional: the client starts attempts with an empty POST.
fn json_body(bytes: &Bytes) -> Result<Option<Value>, Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| Error::BadRequest(format!("request body is not valid JSON: {e}")))
}

// Users

pub async fn get_me(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    forward(
        &state,
        "fetch current user",
        Method::GET,
        "users/me".into(),
        query,
        None,
    )
    .await
}

// Courses

pub async fn get_courses(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    forward(
        &state,
        "fetch courses",
        Method::GET,
        "courses".into(),
        query,
        None,
    )
    .await
}

pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let path = format!("courses/{}", segment(&course_id)?);
    forward(&state, "fetch course", Method::GET, path, query, None).await
}

pub async fn get_course_questions(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let path = format!("courses/{}/questions", segment(&course_id)?);
    forward(&state, "fetch questions", Method::GET, path, query, None).await
}

pub async fn post_course_question(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, Error> {
    let path = format!("courses/{}/questions", segment(&course_id)?);
    forward(
        &state,
        "create question",
        Method::POST,
        path,
        query,
        json_body(&body)?,
    )
    .await
}

pub async fn get_course_exams(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let path = format!("courses/{}/exams", segment(&course_id)?);
    forward(&state, "fetch exams", Method::GET, path, query, None).await
}

pub async fn post_course_exam(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, Error> {
    let path = format!("courses/{}/exams", segment(&course_id)?);
    forward(
        &state,
        "create exam",
        Method::POST,
        path,
        query,
        json_body(&body)?,
    )
    .await
}

// Question bank

pub async fn get_question_types(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    forward(
        &state,
        "fetch question types",
        Method::GET,
        "question-types".into(),
        query,
        None,
    )
    .await
}

pub async fn get_question(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let path = format!("questions/{}", segment(&question_id)?);
    forward(&state, "fetch question", Method::GET, path, query, None).await
}

pub async fn put_question(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, Error> {
    let path = format!("questions/{}", segment(&question_id)?);
    forward(
        &state,
        "update question",
        Method::PUT,
        path,
        query,
        json_body(&body)?,
    )
    .await
}

pub async fn delete_question(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let path = format!("questions/{}", segment(&question_id)?);
    forward(&state, "delete question", Method::DELETE, path, query, None).await
}

// Exams

pub async fn get_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let path = format!("exams/{}", segment(&exam_id)?);
    forward(&state, "fetch exam", Method::GET, path, query, None).await
}

pub async fn put_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, Error> {
    let path = format!("exams/{}", segment(&exam_id)?);
    forward(
        &state,
        "update exam",
        Method::PUT,
        path,
        query,
        json_body(&body)?,
    )
    .await
}

pub async fn delete_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let path = format!("exams/{}", segment(&exam_id)?);
    forward(&state, "delete exam", Method::DELETE, path, query, None).await
}

pub async fn get_exam_questions(
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let path = format!("exams/{}/questions", segment(&exam_id)?);
    forward(
        &state,
        "fetch exam questions",
        Method::GET,
        path,
        query,
        None,
    )
    .await
}

pub async fn post_exam_question(
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, Error> {
    let path = format!("exams/{}/questions", segment(&exam_id)?);
    forward(
        &state,
        "add exam question",
        Method::POST,
        path,
        query,
        json_body(&body)?,
    )
    .await
}

pub async fn get_exam_users(
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let path = format!("exams/{}/users", segment(&exam_id)?);
    forward(&state, "fetch exam results", Method::GET, path, query, None).await
}

// Own attempts

pub async fn get_my_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let path = format!("users/me/exams/{}", segment(&exam_id)?);
    forward(&state, "fetch exam attempt", Method::GET, path, query, None).await
}

pub async fn post_my_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, Error> {
    let path = format!("users/me/exams/{}", segment(&exam_id)?);
    forward(
        &state,
        "start exam",
        Method::POST,
        path,
        query,
        json_body(&body)?,
    )
    .await
}

pub async fn put_my_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, Error> {
    let path = format!("users/me/exams/{}", segment(&exam_id)?);
    forward(
        &state,
        "submit exam",
        Method::PUT,
        path,
        query,
        json_body(&body)?,
    )
    .await
}
