//! Local exam lifecycle routes under `/api`.
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use exam_utils::attempt::{Attempt, ExamReport};
use lms_schema::{
    Exam, Student, Variant,
    input::{AnswersRequest, ExamCreate, ExamUpdate, StudentCreate, VariantRequest},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{config::AppState, error::Error};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListExamsQuery {
    course_id: Option<String>,
}

// Exams

pub async fn list_exams(
    State(state): State<AppState>,
    Query(params): Query<ListExamsQuery>,
) -> Json<Vec<Exam>> {
    Json(state.store.list_exams(params.course_id.as_deref()).await)
}

pub async fn post_exam(
    State(state): State<AppState>,
    Json(input): Json<ExamCreate>,
) -> Result<(StatusCode, Json<Exam>), Error> {
    let exam = state.store.create_exam(input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

pub async fn get_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
) -> Result<Json<Exam>, Error> {
    Ok(Json(state.store.get_exam(exam_id).await?))
}

pub async fn put_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
    Json(update): Json<ExamUpdate>,
) -> Result<Json<Exam>, Error> {
    Ok(Json(state.store.update_exam(exam_id, update, Utc::now()).await?))
}

pub async fn delete_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    state.store.delete_exam(exam_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
) -> Result<Json<Exam>, Error> {
    Ok(Json(state.store.publish_exam(exam_id, Utc::now()).await?))
}

pub async fn close_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
) -> Result<Json<Exam>, Error> {
    Ok(Json(state.store.close_exam(exam_id, Utc::now()).await?))
}

pub async fn get_exam_report(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
) -> Result<Json<ExamReport>, Error> {
    Ok(Json(state.store.exam_report(exam_id).await?))
}

// Variants

pub async fn list_variants(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
) -> Result<Json<Vec<Variant>>, Error> {
    Ok(Json(state.store.list_variants(exam_id).await?))
}

pub async fn post_variants(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
    request: Option<Json<VariantRequest>>,
) -> Result<(StatusCode, Json<Vec<Variant>>), Error> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let variants = state.store.generate_variants(exam_id, request.count).await?;
    Ok((StatusCode::CREATED, Json(variants)))
}

pub async fn get_variant(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
) -> Result<Json<Variant>, Error> {
    Ok(Json(state.store.get_variant(variant_id).await?))
}

pub async fn delete_variant(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    state.store.delete_variant(variant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Students

pub async fn list_students(State(state): State<AppState>) -> Json<Vec<Student>> {
    Json(state.store.list_students().await)
}

pub async fn post_student(
    State(state): State<AppState>,
    Json(input): Json<StudentCreate>,
) -> Result<(StatusCode, Json<Student>), Error> {
    let student = state.store.create_student(input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> Result<Json<Student>, Error> {
    Ok(Json(state.store.get_student(student_id).await?))
}

// Attempts

pub async fn get_attempt(
    State(state): State<AppState>,
    Path((student_id, exam_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Attempt>, Error> {
    Ok(Json(state.store.get_attempt(student_id, exam_id).await?))
}

pub async fn start_attempt(
    State(state): State<AppState>,
    Path((student_id, exam_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Attempt>, Error> {
    Ok(Json(
        state
            .store
            .start_attempt(student_id, exam_id, Utc::now())
            .await?,
    ))
}

pub async fn save_answers(
    State(state): State<AppState>,
    Path((student_id, exam_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<AnswersRequest>,
) -> Result<Json<Attempt>, Error> {
    Ok(Json(
        state
            .store
            .save_answers(student_id, exam_id, request.answers, Utc::now())
            .await?,
    ))
}

/// Final answers are optional, the saved ones are graded either way.
pub async fn submit_attempt(
    State(state): State<AppState>,
    Path((student_id, exam_id)): Path<(Uuid, Uuid)>,
    request: Option<Json<AnswersRequest>>,
) -> Result<Json<Attempt>, Error> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(
        state
            .store
            .submit_attempt(student_id, exam_id, request.answers, Utc::now())
            .await?,
    ))
}
