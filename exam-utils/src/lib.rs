//! Exam Utility Functions
//!
//! ## Current API
//!
//! - Validate exam config
//! - Generate exam variants
//! - Validate generated variants
//! - Calculate attempt score
//! - Construct attempt views and exam reports
//!
pub mod attempt;
pub mod error;
pub mod generation;
pub mod misc;

#[cfg(test)]
mod test_utils;
