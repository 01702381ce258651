pub mod app;
pub mod config;
pub mod error;
pub mod exams;
pub mod lms;
pub mod routes;
pub mod store;
