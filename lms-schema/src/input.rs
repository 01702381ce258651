//! Request payloads accepted by the local exam routes.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Answer, ExamConfig, Question, QuestionKind, Role, StudentAnswer};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub text: String,
    #[serde(default)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_points")]
    pub points: f64,
    pub answers: Vec<AnswerInput>,
    #[serde(default)]
    pub deprecated: bool,
}

fn default_points() -> f64 {
    1.0
}

impl QuestionInput {
    /// Builds a question with freshly assigned ids.
    pub fn into_question(self) -> Question {
        Question {
            id: Uuid::new_v4(),
            text: self.text,
            kind: self.kind,
            tags: self.tags,
            points: self.points,
            answers: self
                .answers
                .into_iter()
                .map(|a| Answer {
                    id: Uuid::new_v4(),
                    text: a.text,
                    is_correct: a.is_correct,
                })
                .collect(),
            deprecated: self.deprecated,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamCreate {
    pub course_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub config: ExamConfig,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

/// Partial update. Absent fields are left untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub config: Option<ExamConfig>,
    pub questions: Option<Vec<QuestionInput>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCreate {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantRequest {
    #[serde(default = "default_variant_count")]
    pub count: usize,
}

impl Default for VariantRequest {
    fn default() -> Self {
        Self {
            count: default_variant_count(),
        }
    }
}

fn default_variant_count() -> usize {
    1
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub question_id: Uuid,
    #[serde(default)]
    pub selected: Vec<Uuid>,
}

impl AnswerSubmission {
    pub fn into_student_answer(self, saved_at: DateTime<Utc>) -> StudentAnswer {
        let mut selected = Vec::with_capacity(self.selected.len());
        for id in self.selected {
            if !selected.contains(&id) {
                selected.push(id);
            }
        }
        StudentAnswer {
            question_id: self.question_id,
            selected,
            saved_at,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswersRequest {
    #[serde(default)]
    pub answers: Vec<AnswerSubmission>,
}
