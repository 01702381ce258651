//! Records shared by the proxy and the exam utilities.
//!
//! Field names serialize in camelCase, matching what the web client sends.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod input;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: Uuid,
    pub text: String,
    pub is_correct: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[default]
    SingleChoice,
    MultipleChoice,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub kind: QuestionKind,
    pub tags: Vec<String>,
    pub points: f64,
    pub answers: Vec<Answer>,
    pub deprecated: bool,
}

impl Question {
    /// Whether the question carries every tag in `group`.
    pub fn has_tags(&self, group: &[String]) -> bool {
        group.iter().all(|tag| self.tags.contains(tag))
    }

    pub fn number_of_correct_answers(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagConfig {
    pub group: Vec<String>,
    pub number_of_questions: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamConfig {
    /// `0` means the exam has no time limit.
    #[serde(default)]
    pub total_time_in_s: u64,
    pub passing_percent: f64,
    pub questions_per_variant: usize,
    #[serde(default)]
    pub tags: Vec<TagConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    #[default]
    Draft,
    Published,
    Closed,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: Uuid,
    pub course_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub status: ExamStatus,
    pub config: ExamConfig,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exam {
    pub fn question(&self, id: &Uuid) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantQuestion {
    pub question_id: Uuid,
    /// Answers shown for the question, in display order
    pub answers: Vec<Uuid>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub name: String,
    pub questions: Vec<VariantQuestion>,
    pub created_at: DateTime<Utc>,
}

impl Variant {
    pub fn question(&self, id: &Uuid) -> Option<&VariantQuestion> {
        self.questions.iter().find(|q| &q.question_id == id)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Teacher,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAnswer {
    pub question_id: Uuid,
    pub selected: Vec<Uuid>,
    pub saved_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    #[default]
    InProgress,
    Submitted,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamAttempt {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub variant_id: Uuid,
    pub student_id: Uuid,
    pub status: AttemptStatus,
    pub start_time: DateTime<Utc>,
    pub submission_time: Option<DateTime<Utc>>,
    pub answers: Vec<StudentAnswer>,
    pub score: Option<f64>,
    pub passed: Option<bool>,
}

impl ExamAttempt {
    pub fn answer(&self, question_id: &Uuid) -> Option<&StudentAnswer> {
        self.answers.iter().find(|a| &a.question_id == question_id)
    }
}

/// Body of every error response, local or forwarded from the LMS.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
