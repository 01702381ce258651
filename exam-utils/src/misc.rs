use lms_schema::{Answer, Exam, ExamAttempt, QuestionKind, Variant};
use uuid::Uuid;

use crate::error::Error;

/// Calculates the attempt score, and compares score >= pass_score
pub fn check_attempt_pass(exam: &Exam, variant: &Variant, attempt: &ExamAttempt) -> bool {
    let passing_percent = exam.config.passing_percent;
    if let Ok(score) = calculate_score(exam, variant, attempt) {
        return score >= passing_percent;
    }
    false
}

/// Percentage of the variant's points earned by the attempt.
///
/// Unanswered questions earn nothing.
pub fn calculate_score(
    exam: &Exam,
    variant: &Variant,
    attempt: &ExamAttempt,
) -> Result<f64, Error> {
    for attempt_answer in &attempt.answers {
        if variant.question(&attempt_answer.question_id).is_none() {
            return Err(Error::Grading(format!(
                "Attempt question {} must exist in variant {}",
                attempt_answer.question_id, variant.id
            )));
        }
    }

    let mut total_points = 0.0;
    let mut earned_points = 0.0;

    for variant_question in &variant.questions {
        let exam_question = exam.question(&variant_question.question_id).ok_or_else(|| {
            Error::Grading(format!(
                "Variant question {} must exist in exam {}",
                variant_question.question_id, exam.id
            ))
        })?;

        total_points += exam_question.points;

        let Some(attempt_answer) = attempt.answer(&variant_question.question_id) else {
            continue;
        };

        if compare_answers(
            &exam_question.answers,
            &variant_question.answers,
            &attempt_answer.selected,
        ) {
            earned_points += exam_question.points;
        }
    }

    if total_points <= 0.0 {
        return Err(Error::Grading(format!(
            "Variant {} carries no points",
            variant.id
        )));
    }

    Ok((earned_points / total_points) * 100.0)
}

/// An attempt answer is correct when it selects exactly the correct answers
/// that were shown to the student.
pub fn compare_answers(
    exam_answers: &[Answer],
    generated_answers: &[Uuid],
    attempt_answers: &[Uuid],
) -> bool {
    let correct_generated_answers: Vec<&Uuid> = generated_answers
        .iter()
        .filter(|gen_ans| {
            exam_answers
                .iter()
                .any(|exam_ans| exam_ans.is_correct && &exam_ans.id == *gen_ans)
        })
        .collect();

    let answers_equal = correct_generated_answers
        .iter()
        .all(|&correct_answer| attempt_answers.contains(correct_answer));

    answers_equal && correct_generated_answers.len() == attempt_answers.len()
}

/// Longest time limit an exam can have, one week.
pub const MAX_TOTAL_TIME_IN_S: u64 = 7 * 24 * 60 * 60;

/// Validate Exam Config:
/// - `exam.name` is not empty
/// - `config.total_time_in_s` is at most `MAX_TOTAL_TIME_IN_S`
/// - `config.passing_percent` is between 0 and 100
/// - `config.questions_per_variant` is positive and there are enough active questions
/// - `config.tags` is solvable
/// - `questions.text` is not empty and `questions.points` is positive
/// - `questions.answers` has at least one correct answer, exactly one for single choice
/// - `questions.answers.text` is not empty
pub fn validate_config(exam: &Exam) -> Result<(), String> {
    let config = &exam.config;

    if exam.name.trim().is_empty() {
        return Err("Exam name is empty".into());
    }

    if config.total_time_in_s > MAX_TOTAL_TIME_IN_S {
        return Err(format!(
            "Config total time must be at most {MAX_TOTAL_TIME_IN_S} seconds, got {}",
            config.total_time_in_s
        ));
    }

    if !(0.0..=100.0).contains(&config.passing_percent) {
        return Err("Config passing percent must be between 0.0 and 100.0".into());
    }

    if config.questions_per_variant == 0 {
        return Err("Config questions per variant must be greater than 0".into());
    }

    let active_questions = exam.questions.iter().filter(|q| !q.deprecated);
    let available = active_questions.clone().count();
    if available < config.questions_per_variant {
        return Err(format!(
            "Not enough questions for a variant. Available: {}, Required: {}",
            available, config.questions_per_variant
        ));
    }

    for tag_config in &config.tags {
        if tag_config.number_of_questions > config.questions_per_variant {
            return Err(format!(
                "Tag config {:?} requires more questions than a variant holds ({})",
                tag_config.group, config.questions_per_variant
            ));
        }
        let available_questions = active_questions
            .clone()
            .filter(|q| q.has_tags(&tag_config.group))
            .count();
        if available_questions < tag_config.number_of_questions {
            return Err(format!(
                "Not enough questions for tag config: {:?}. Available: {}, Required: {}",
                tag_config.group, available_questions, tag_config.number_of_questions
            ));
        }
    }

    for question in &exam.questions {
        if question.text.trim().is_empty() {
            return Err(format!("Question {} has empty text", question.id));
        }
        if question.points <= 0.0 {
            return Err(format!("Question {} must be worth more than 0 points", question.id));
        }
        let num_correct_answers = question.number_of_correct_answers();
        if num_correct_answers == 0 {
            return Err(format!("Question {} has no correct answers", question.id));
        }
        if question.kind == QuestionKind::SingleChoice && num_correct_answers > 1 {
            return Err(format!(
                "Single choice question {} has {} correct answers",
                question.id, num_correct_answers
            ));
        }
        for answer in &question.answers {
            if answer.text.trim().is_empty() {
                return Err(format!(
                    "Answer {} in question {} has empty text",
                    answer.id, question.id
                ));
            }
        }
    }

    Ok(())
}
