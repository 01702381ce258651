use chrono::Utc;
use lms_schema::{Exam, Question, Variant, VariantQuestion};
use rand::{Rng, seq::SliceRandom};
use tracing::trace;
use uuid::Uuid;

use crate::error::Error;

/// Number of times a random allocation is retried before giving up.
const MAX_GENERATION_ATTEMPTS: usize = 10;

/// Generates a variant of the exam, based on the exam configuration.
///
/// Can fail if the config is unsolvable, or if the greedy allocation keeps
/// getting stuck.
pub fn generate_variant(exam: &Exam, name: impl Into<String>) -> Result<Variant, Error> {
    let mut rng = rand::rng();
    generate_variant_with_rng(exam, name, &mut rng)
}

pub fn generate_variant_with_rng<R: Rng + ?Sized>(
    exam: &Exam,
    name: impl Into<String>,
    rng: &mut R,
) -> Result<Variant, Error> {
    let name = name.into();
    let mut last_error = None;

    for attempt in 0..MAX_GENERATION_ATTEMPTS {
        match allocate_questions(exam, rng) {
            Ok(questions) => {
                let variant = Variant {
                    id: Uuid::new_v4(),
                    exam_id: exam.id,
                    name,
                    questions,
                    created_at: Utc::now(),
                };
                validate_variant(exam, &variant)?;
                return Ok(variant);
            }
            Err(e) => {
                trace!(attempt, error = %e, "allocation failed, retrying");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        Error::Generation(format!("Unable to generate variant for exam {}", exam.id))
    }))
}

fn allocate_questions<R: Rng + ?Sized>(
    exam: &Exam,
    rng: &mut R,
) -> Result<Vec<VariantQuestion>, Error> {
    let config = &exam.config;
    if config.questions_per_variant == 0 {
        return Err(Error::Generation(format!(
            "{}: Invalid exam config - variant must hold at least one question.",
            exam.id
        )));
    }

    let mut pool: Vec<&Question> = exam.questions.iter().filter(|q| !q.deprecated).collect();
    pool.shuffle(rng);

    // Most specific tag groups first, they have the fewest candidates.
    let mut sorted_tag_config = config.tags.clone();
    sorted_tag_config.sort_by(|a, b| b.group.len().cmp(&a.group.len()));

    let mut chosen: Vec<&Question> = Vec::with_capacity(config.questions_per_variant);

    for tag_config in &sorted_tag_config {
        // A question picked for an earlier group can fulfill this one too.
        let already_fulfilled = chosen
            .iter()
            .filter(|q| q.has_tags(&tag_config.group))
            .count();
        let needed = tag_config.number_of_questions.saturating_sub(already_fulfilled);

        for _ in 0..needed {
            let position = pool
                .iter()
                .position(|q| q.has_tags(&tag_config.group))
                .ok_or_else(|| {
                    Error::Generation(format!(
                        "Invalid Exam Configuration for exam \"{}\". Not enough questions for tag group \"{}\".",
                        exam.id,
                        tag_config.group.join(",")
                    ))
                })?;
            chosen.push(pool.remove(position));
        }
    }

    if chosen.len() > config.questions_per_variant {
        return Err(Error::Generation(format!(
            "Tag configs for exam \"{}\" require {} questions, but a variant holds {}.",
            exam.id,
            chosen.len(),
            config.questions_per_variant
        )));
    }

    let remaining = config.questions_per_variant - chosen.len();
    if pool.len() < remaining {
        return Err(Error::Generation(format!(
            "Invalid Exam Configuration for exam \"{}\". Not enough questions to fill a variant.",
            exam.id
        )));
    }
    chosen.extend(pool.drain(..remaining));
    chosen.shuffle(rng);

    trace!(number_of_questions = chosen.len(), "questions allocated");

    Ok(chosen
        .into_iter()
        .map(|question| {
            let mut answers: Vec<Uuid> = question.answers.iter().map(|a| a.id).collect();
            answers.shuffle(rng);
            VariantQuestion {
                question_id: question.id,
                answers,
            }
        })
        .collect())
}

/// Given a variant, validate it for basic properties:
/// 1) No duplicates
/// 2) Every question and answer exists in the exam
/// 3) Question count matches the exam config
pub fn validate_variant(exam: &Exam, variant: &Variant) -> Result<(), Error> {
    if variant.exam_id != exam.id {
        return Err(Error::Generation(format!(
            "variant {} belongs to exam {}, not {}",
            variant.id, variant.exam_id, exam.id
        )));
    }

    if variant.questions.len() != exam.config.questions_per_variant {
        return Err(Error::Generation(format!(
            "variant {} has {} questions, expected {}",
            variant.id,
            variant.questions.len(),
            exam.config.questions_per_variant
        )));
    }

    let mut q_ids = vec![];
    let mut a_ids = vec![];
    for q in &variant.questions {
        if q_ids.contains(&q.question_id) {
            return Err(Error::Generation(format!(
                "question id {} duplicate of question id",
                q.question_id
            )));
        }
        q_ids.push(q.question_id);

        let exam_question = exam.question(&q.question_id).ok_or_else(|| {
            Error::Generation(format!(
                "question id {} does not exist in exam {}",
                q.question_id, exam.id
            ))
        })?;

        for a in &q.answers {
            if a_ids.contains(a) {
                return Err(Error::Generation(format!(
                    "answer id {} duplicate of answer id",
                    a
                )));
            }
            if !exam_question.answers.iter().any(|ea| &ea.id == a) {
                return Err(Error::Generation(format!(
                    "answer id {} does not belong to question {}",
                    a, q.question_id
                )));
            }
            a_ids.push(*a);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{exam, variant_of};
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn generated_variant_satisfies_config() {
        let exam = exam();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let variant = generate_variant_with_rng(&exam, "Variant A", &mut rng).unwrap();
            assert_eq!(variant.questions.len(), 3);
            assert_eq!(variant.name, "Variant A");
            assert!(validate_variant(&exam, &variant).is_ok());

            let questions: Vec<&Question> = variant
                .questions
                .iter()
                .map(|vq| exam.question(&vq.question_id).unwrap())
                .collect();
            assert!(questions.iter().all(|q| !q.deprecated));
            for tag_config in &exam.config.tags {
                let count = questions.iter().filter(|q| q.has_tags(&tag_config.group)).count();
                assert!(count >= tag_config.number_of_questions);
            }
            for vq in &variant.questions {
                let q = exam.question(&vq.question_id).unwrap();
                assert_eq!(vq.answers.len(), q.answers.len());
            }
        }
    }

    #[test]
    fn overlapping_tag_groups_share_questions() {
        let mut exam = exam();
        exam.config.questions_per_variant = 1;
        exam.config.tags = vec![
            lms_schema::TagConfig {
                group: vec!["html".to_string(), "forms".to_string()],
                number_of_questions: 1,
            },
            lms_schema::TagConfig {
                group: vec!["html".to_string()],
                number_of_questions: 1,
            },
        ];

        let variant = generate_variant(&exam, "Variant A").unwrap();
        assert_eq!(variant.questions[0].question_id, exam.questions[1].id);
    }

    #[test]
    fn unsolvable_tags_fail() {
        let mut exam = exam();
        exam.config.tags[0].number_of_questions = 3;
        assert!(matches!(
            generate_variant(&exam, "Variant A"),
            Err(Error::Generation(_))
        ));
    }

    #[test]
    fn too_few_questions_fail() {
        let mut exam = exam();
        exam.config.questions_per_variant = 6;
        assert!(generate_variant(&exam, "Variant A").is_err());
    }

    #[test]
    fn duplicate_question_is_invalid() {
        let exam = exam();
        let variant = variant_of(&exam, &[0, 0, 2]);
        let err = validate_variant(&exam, &variant).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn foreign_answer_is_invalid() {
        let exam = exam();
        let mut variant = variant_of(&exam, &[0, 1, 2]);
        variant.questions[0].answers.push(Uuid::new_v4());
        let err = validate_variant(&exam, &variant).unwrap_err();
        assert!(err.to_string().contains("does not belong"));
    }
}
