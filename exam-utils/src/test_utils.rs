use chrono::{TimeZone, Utc};
use lms_schema::{
    Answer, Exam, ExamAttempt, ExamConfig, ExamStatus, Question, QuestionKind, StudentAnswer,
    TagConfig, Variant, VariantQuestion,
};
use uuid::Uuid;

fn question(
    text: &str,
    kind: QuestionKind,
    tags: &[&str],
    points: f64,
    correct: &[bool],
) -> Question {
    Question {
        id: Uuid::new_v4(),
        text: text.to_string(),
        kind,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        points,
        answers: correct
            .iter()
            .enumerate()
            .map(|(i, &is_correct)| Answer {
                id: Uuid::new_v4(),
                text: format!("{text} answer {i}"),
                is_correct,
            })
            .collect(),
        deprecated: false,
    }
}

/// Six questions, the last one deprecated. Question 4 is multiple choice and
/// worth 3 points.
pub fn exam() -> Exam {
    use QuestionKind::*;
    let mut deprecated = question("q5", SingleChoice, &["js"], 1.0, &[true, false]);
    deprecated.deprecated = true;

    Exam {
        id: Uuid::new_v4(),
        name: "Web basics".to_string(),
        status: ExamStatus::Draft,
        config: ExamConfig {
            total_time_in_s: 600,
            passing_percent: 50.0,
            questions_per_variant: 3,
            tags: vec![
                TagConfig {
                    group: vec!["html".to_string()],
                    number_of_questions: 1,
                },
                TagConfig {
                    group: vec!["css".to_string()],
                    number_of_questions: 1,
                },
            ],
        },
        questions: vec![
            question("q0", SingleChoice, &["html"], 1.0, &[true, false, false]),
            question("q1", SingleChoice, &["html", "forms"], 1.0, &[false, true, false]),
            question("q2", SingleChoice, &["css"], 1.0, &[false, false, true]),
            question("q3", SingleChoice, &["css"], 1.0, &[true, false]),
            question("q4", MultipleChoice, &["js"], 3.0, &[true, true, false, false]),
            deprecated,
        ],
        ..Default::default()
    }
}

/// Variant holding the questions at `indices`, answers in exam order.
pub fn variant_of(exam: &Exam, indices: &[usize]) -> Variant {
    Variant {
        id: Uuid::new_v4(),
        exam_id: exam.id,
        name: "Variant A".to_string(),
        questions: indices
            .iter()
            .map(|&i| VariantQuestion {
                question_id: exam.questions[i].id,
                answers: exam.questions[i].answers.iter().map(|a| a.id).collect(),
            })
            .collect(),
        ..Default::default()
    }
}

pub fn attempt_with(variant: &Variant, answers: Vec<(Uuid, Vec<Uuid>)>) -> ExamAttempt {
    let start_time = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    ExamAttempt {
        id: Uuid::new_v4(),
        exam_id: variant.exam_id,
        variant_id: variant.id,
        student_id: Uuid::new_v4(),
        start_time,
        answers: answers
            .into_iter()
            .map(|(question_id, selected)| StudentAnswer {
                question_id,
                selected,
                saved_at: start_time,
            })
            .collect(),
        ..Default::default()
    }
}
