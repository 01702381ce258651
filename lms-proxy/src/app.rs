use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    LatencyUnit,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, warn};

use crate::{
    config::{AppState, EnvVars, Environment},
    exams, routes,
};

pub fn router(state: AppState) -> Router {
    let request_timeout_in_ms = state.env_vars.request_timeout_in_ms;
    let request_body_size_limit = state.env_vars.request_body_size_limit;
    let cors = cors_layer(&state.env_vars);

    Router::new()
        .route("/status/ping", get(routes::get_status_ping))
        // LMS pass-through
        .route("/api/lms/users/me", get(routes::get_me))
        .route("/api/lms/courses", get(routes::get_courses))
        .route("/api/lms/courses/{course_id}", get(routes::get_course))
        .route(
            "/api/lms/courses/{course_id}/questions",
            get(routes::get_course_questions).post(routes::post_course_question),
        )
        .route(
            "/api/lms/courses/{course_id}/exams",
            get(routes::get_course_exams).post(routes::post_course_exam),
        )
        .route("/api/lms/question-types", get(routes::get_question_types))
        .route(
            "/api/lms/questions/{question_id}",
            get(routes::get_question)
                .put(routes::put_question)
                .delete(routes::delete_question),
        )
        .route(
            "/api/lms/exams/{exam_id}",
            get(routes::get_exam)
                .put(routes::put_exam)
                .delete(routes::delete_exam),
        )
        .route(
            "/api/lms/exams/{exam_id}/questions",
            get(routes::get_exam_questions).post(routes::post_exam_question),
        )
        .route("/api/lms/exams/{exam_id}/users", get(routes::get_exam_users))
        .route(
            "/api/lms/users/me/exams/{exam_id}",
            get(routes::get_my_exam)
                .post(routes::post_my_exam)
                .put(routes::put_my_exam),
        )
        // Local exam lifecycle
        .route("/api/exams", get(exams::list_exams).post(exams::post_exam))
        .route(
            "/api/exams/{exam_id}",
            get(exams::get_exam)
                .put(exams::put_exam)
                .delete(exams::delete_exam),
        )
        .route("/api/exams/{exam_id}/publish", post(exams::publish_exam))
        .route("/api/exams/{exam_id}/close", post(exams::close_exam))
        .route("/api/exams/{exam_id}/report", get(exams::get_exam_report))
        .route(
            "/api/exams/{exam_id}/variants",
            get(exams::list_variants).post(exams::post_variants),
        )
        .route(
            "/api/variants/{variant_id}",
            get(exams::get_variant).delete(exams::delete_variant),
        )
        .route(
            "/api/students",
            get(exams::list_students).post(exams::post_student),
        )
        .route("/api/students/{student_id}", get(exams::get_student))
        .route(
            "/api/students/{student_id}/exams/{exam_id}",
            get(exams::get_attempt)
                .post(exams::start_attempt)
                .put(exams::save_answers),
        )
        .route(
            "/api/students/{student_id}/exams/{exam_id}/submit",
            post(exams::submit_attempt),
        )
        .layer(TimeoutLayer::new(Duration::from_millis(
            request_timeout_in_ms,
        )))
        .layer(RequestBodyLimitLayer::new(request_body_size_limit))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        .with_state(state)
}

/// Any origin in development, otherwise only `ALLOWED_ORIGINS`.
fn cors_layer(env_vars: &EnvVars) -> CorsLayer {
    if env_vars.environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = env_vars
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%origin, error = %e, "ignoring invalid origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
