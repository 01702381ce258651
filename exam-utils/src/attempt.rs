use chrono::{DateTime, Duration, Utc};
use lms_schema::{AttemptStatus, Exam, ExamAttempt, QuestionKind, Variant};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::misc::compare_answers;

/// Attempt as shown to the student taking it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub exam_name: String,
    pub variant_id: Uuid,
    pub variant_name: String,
    pub student_id: Uuid,
    pub status: AttemptStatus,
    pub start_time: DateTime<Utc>,
    /// `None` when the exam has no time limit
    pub expires_at: Option<DateTime<Utc>>,
    pub submission_time: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    pub passed: Option<bool>,
    pub questions: Vec<AttemptQuestion>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptQuestion {
    pub id: Uuid,
    pub text: String,
    pub kind: QuestionKind,
    pub points: f64,
    /// Only the answers generated for the variant, in display order
    pub answers: Vec<AttemptAnswer>,
    pub selected: Vec<Uuid>,
    pub saved_at: Option<DateTime<Utc>>,
    /// Revealed once the attempt is submitted
    pub correct: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptAnswer {
    pub id: Uuid,
    pub text: String,
    /// Revealed once the attempt is submitted
    pub is_correct: Option<bool>,
}

/// When the attempt stops accepting answers, if ever.
///
/// A limit too large to represent is treated as no limit.
pub fn attempt_expiry(exam: &Exam, attempt: &ExamAttempt) -> Option<DateTime<Utc>> {
    match exam.config.total_time_in_s {
        0 => None,
        seconds => {
            let limit = Duration::try_seconds(i64::try_from(seconds).ok()?)?;
            attempt.start_time.checked_add_signed(limit)
        }
    }
}

/// Constructs an `Attempt`:
/// - Orders questions and answers as generated for the variant
/// - Adds selected answers and save times from the attempt
/// - Reveals correctness only for submitted attempts
///
/// NOTE: Variant questions missing from the exam are skipped. The store only
/// builds variants from the exam they belong to.
pub fn construct_attempt(exam: &Exam, variant: &Variant, exam_attempt: &ExamAttempt) -> Attempt {
    let reveal = exam_attempt.status == AttemptStatus::Submitted;
    let mut questions = Vec::with_capacity(variant.questions.len());

    for variant_question in &variant.questions {
        let Some(question) = exam.question(&variant_question.question_id) else {
            continue;
        };

        let answers = variant_question
            .answers
            .iter()
            .filter_map(|id| question.answers.iter().find(|a| &a.id == id))
            .map(|a| AttemptAnswer {
                id: a.id,
                text: a.text.clone(),
                is_correct: reveal.then_some(a.is_correct),
            })
            .collect();

        let attempt_answer = exam_attempt.answer(&question.id);
        let selected = attempt_answer
            .map(|a| a.selected.clone())
            .unwrap_or_default();
        let correct = reveal.then(|| {
            compare_answers(&question.answers, &variant_question.answers, &selected)
        });

        questions.push(AttemptQuestion {
            id: question.id,
            text: question.text.clone(),
            kind: question.kind.clone(),
            points: question.points,
            answers,
            selected,
            saved_at: attempt_answer.map(|a| a.saved_at),
            correct,
        });
    }

    Attempt {
        id: exam_attempt.id,
        exam_id: exam.id,
        exam_name: exam.name.clone(),
        variant_id: variant.id,
        variant_name: variant.name.clone(),
        student_id: exam_attempt.student_id,
        status: exam_attempt.status.clone(),
        start_time: exam_attempt.start_time,
        expires_at: attempt_expiry(exam, exam_attempt),
        submission_time: exam_attempt.submission_time,
        score: exam_attempt.score,
        passed: exam_attempt.passed,
        questions,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStats {
    pub total_questions: usize,
    pub answered: usize,
    pub correct: usize,
    /// Seconds between start and submission, for submitted attempts
    pub time_to_complete: Option<f64>,
    pub average_time_per_question: Option<f64>,
}

pub fn get_attempt_stats(attempt: &Attempt) -> AttemptStats {
    let total_questions = attempt.questions.len();
    let answered = attempt
        .questions
        .iter()
        .filter(|q| !q.selected.is_empty())
        .count();
    let correct = attempt
        .questions
        .iter()
        .filter(|q| q.correct == Some(true))
        .count();

    let time_to_complete = attempt
        .submission_time
        .map(|end| (end - attempt.start_time).num_milliseconds() as f64 / 1000.0);
    let average_time_per_question = time_to_complete
        .filter(|_| total_questions > 0)
        .map(|t| t / total_questions as f64);

    AttemptStats {
        total_questions,
        answered,
        correct,
        time_to_complete,
        average_time_per_question,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamReport {
    pub exam_id: Uuid,
    pub exam_name: String,
    pub variants: usize,
    pub attempts_started: usize,
    pub attempts_submitted: usize,
    pub passed: usize,
    /// Share of submitted attempts that passed, `0.0..=1.0`
    pub pass_rate: Option<f64>,
    pub average_score: Option<f64>,
    pub highest_score: Option<f64>,
    pub lowest_score: Option<f64>,
    pub average_time_to_complete: Option<f64>,
    pub questions: Vec<QuestionReport>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionReport {
    pub question_id: Uuid,
    pub text: String,
    /// Submitted attempts whose variant contained the question
    pub times_shown: usize,
    pub times_correct: usize,
    pub correct_rate: Option<f64>,
}

/// Aggregates the attempts of one exam. Only submitted attempts contribute to
/// scores and per-question figures.
pub fn build_exam_report(
    exam: &Exam,
    variants: &[Variant],
    attempts: &[ExamAttempt],
) -> ExamReport {
    let mut questions: Vec<QuestionReport> = exam
        .questions
        .iter()
        .map(|q| QuestionReport {
            question_id: q.id,
            text: q.text.clone(),
            times_shown: 0,
            times_correct: 0,
            correct_rate: None,
        })
        .collect();

    let mut scores = vec![];
    let mut times = vec![];
    let mut passed = 0;

    for exam_attempt in attempts
        .iter()
        .filter(|a| a.exam_id == exam.id && a.status == AttemptStatus::Submitted)
    {
        let Some(variant) = variants.iter().find(|v| v.id == exam_attempt.variant_id) else {
            continue;
        };
        let attempt = construct_attempt(exam, variant, exam_attempt);

        if let Some(score) = attempt.score {
            scores.push(score);
        }
        if attempt.passed == Some(true) {
            passed += 1;
        }
        if let Some(time) = get_attempt_stats(&attempt).time_to_complete {
            times.push(time);
        }

        for attempt_question in &attempt.questions {
            if let Some(report) = questions
                .iter_mut()
                .find(|r| r.question_id == attempt_question.id)
            {
                report.times_shown += 1;
                if attempt_question.correct == Some(true) {
                    report.times_correct += 1;
                }
            }
        }
    }

    for report in questions.iter_mut() {
        if report.times_shown > 0 {
            report.correct_rate = Some(report.times_correct as f64 / report.times_shown as f64);
        }
    }

    let attempts_submitted = attempts
        .iter()
        .filter(|a| a.exam_id == exam.id && a.status == AttemptStatus::Submitted)
        .count();

    ExamReport {
        exam_id: exam.id,
        exam_name: exam.name.clone(),
        variants: variants.iter().filter(|v| v.exam_id == exam.id).count(),
        attempts_started: attempts.iter().filter(|a| a.exam_id == exam.id).count(),
        attempts_submitted,
        passed,
        pass_rate: (attempts_submitted > 0).then(|| passed as f64 / attempts_submitted as f64),
        average_score: mean(&scores),
        highest_score: scores.iter().copied().reduce(f64::max),
        lowest_score: scores.iter().copied().reduce(f64::min),
        average_time_to_complete: mean(&times),
        questions,
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
