//! In-memory exam, variant, student and attempt stores.
//!
//! All state sits behind one lock. Each operation holds it for its whole
//! read-modify-write.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use exam_utils::{
    attempt::{Attempt, ExamReport, attempt_expiry, build_exam_report, construct_attempt},
    generation::generate_variant,
    misc::{calculate_score, check_attempt_pass, validate_config},
};
use lms_schema::{
    AttemptStatus, Exam, ExamAttempt, ExamStatus, QuestionKind, Role, Student, Variant,
    input::{AnswerSubmission, ExamCreate, ExamUpdate, StudentCreate},
};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Error;

/// Upper bound for one variant generation request, one per letter.
pub const MAX_VARIANTS_PER_REQUEST: usize = 26;

#[derive(Debug, Default)]
pub struct Store {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    exams: HashMap<Uuid, Exam>,
    variants: HashMap<Uuid, Variant>,
    students: HashMap<Uuid, Student>,
    /// Keyed by (student, exam). One attempt per student and exam.
    attempts: HashMap<(Uuid, Uuid), ExamAttempt>,
    /// Index of the next variant name per exam. Never reused after deletes.
    next_variant: HashMap<Uuid, usize>,
}

impl Inner {
    fn exam(&self, id: &Uuid) -> Result<&Exam, Error> {
        self.exams
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("exam {id} not found")))
    }

    fn exam_mut(&mut self, id: &Uuid) -> Result<&mut Exam, Error> {
        self.exams
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("exam {id} not found")))
    }

    fn variant(&self, id: &Uuid) -> Result<&Variant, Error> {
        self.variants
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("variant {id} not found")))
    }

    fn student(&self, id: &Uuid) -> Result<&Student, Error> {
        self.students
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("student {id} not found")))
    }

    fn exam_variants(&self, exam_id: &Uuid) -> Vec<Variant> {
        let mut variants: Vec<Variant> = self
            .variants
            .values()
            .filter(|v| &v.exam_id == exam_id)
            .cloned()
            .collect();
        variants.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| name_order(a).cmp(&name_order(b)))
        });
        variants
    }

    fn exam_has_attempts(&self, exam_id: &Uuid) -> bool {
        self.attempts.values().any(|a| &a.exam_id == exam_id)
    }

    fn view(&self, attempt: &ExamAttempt) -> Result<Attempt, Error> {
        let exam = self.exam(&attempt.exam_id)?;
        let variant = self.variant(&attempt.variant_id)?;
        Ok(construct_attempt(exam, variant, attempt))
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // Exams

    pub async fn list_exams(&self, course_id: Option<&str>) -> Vec<Exam> {
        let inner = self.inner.read().await;
        let mut exams: Vec<Exam> = inner
            .exams
            .values()
            .filter(|e| course_id.is_none() || e.course_id.as_deref() == course_id)
            .cloned()
            .collect();
        exams.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        exams
    }

    pub async fn get_exam(&self, id: Uuid) -> Result<Exam, Error> {
        self.inner.read().await.exam(&id).cloned()
    }

    pub async fn create_exam(&self, input: ExamCreate, now: DateTime<Utc>) -> Result<Exam, Error> {
        if input.name.trim().is_empty() {
            return Err(Error::BadRequest("exam name must not be empty".to_string()));
        }

        let exam = Exam {
            id: Uuid::new_v4(),
            course_id: input.course_id,
            name: input.name,
            description: input.description,
            status: ExamStatus::Draft,
            config: input.config,
            questions: input
                .questions
                .into_iter()
                .map(|q| q.into_question())
                .collect(),
            created_at: now,
            updated_at: now,
        };

        info!(exam = %exam.id, questions = exam.questions.len(), "exam created");
        self.inner.write().await.exams.insert(exam.id, exam.clone());
        Ok(exam)
    }

    /// Only draft exams can change. Replacing the config or the question pool
    /// drops the exam's variants, they no longer match.
    pub async fn update_exam(
        &self,
        id: Uuid,
        update: ExamUpdate,
        now: DateTime<Utc>,
    ) -> Result<Exam, Error> {
        let mut inner = self.inner.write().await;
        let exam = inner.exam_mut(&id)?;
        if exam.status != ExamStatus::Draft {
            return Err(Error::Conflict(format!("exam {id} is no longer a draft")));
        }

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(Error::BadRequest("exam name must not be empty".to_string()));
            }
            exam.name = name;
        }
        if let Some(description) = update.description {
            exam.description = Some(description);
        }
        let invalidates_variants = update.config.is_some() || update.questions.is_some();
        if let Some(config) = update.config {
            exam.config = config;
        }
        if let Some(questions) = update.questions {
            exam.questions = questions.into_iter().map(|q| q.into_question()).collect();
        }
        exam.updated_at = now;
        let exam = exam.clone();

        if invalidates_variants {
            let before = inner.variants.len();
            inner.variants.retain(|_, v| v.exam_id != id);
            debug!(exam = %id, dropped = before - inner.variants.len(), "variants dropped");
        }

        Ok(exam)
    }

    pub async fn delete_exam(&self, id: Uuid) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        inner.exam(&id)?;
        if inner.exam_has_attempts(&id) {
            return Err(Error::Conflict(format!("exam {id} has attempts")));
        }
        inner.exams.remove(&id);
        inner.variants.retain(|_, v| v.exam_id != id);
        inner.next_variant.remove(&id);
        info!(exam = %id, "exam deleted");
        Ok(())
    }

    pub async fn publish_exam(&self, id: Uuid, now: DateTime<Utc>) -> Result<Exam, Error> {
        let mut inner = self.inner.write().await;
        let exam = inner.exam(&id)?;
        if exam.status != ExamStatus::Draft {
            return Err(Error::Conflict(format!("exam {id} is not a draft")));
        }
        validate_config(exam).map_err(exam_utils::error::Error::InvalidConfig)?;
        if !inner.variants.values().any(|v| v.exam_id == id) {
            return Err(Error::Conflict(format!(
                "exam {id} needs at least one variant before publishing"
            )));
        }

        let exam = inner.exam_mut(&id)?;
        exam.status = ExamStatus::Published;
        exam.updated_at = now;
        info!(exam = %id, "exam published");
        Ok(exam.clone())
    }

    pub async fn close_exam(&self, id: Uuid, now: DateTime<Utc>) -> Result<Exam, Error> {
        let mut inner = self.inner.write().await;
        let exam = inner.exam_mut(&id)?;
        if exam.status != ExamStatus::Published {
            return Err(Error::Conflict(format!("exam {id} is not published")));
        }
        exam.status = ExamStatus::Closed;
        exam.updated_at = now;
        info!(exam = %id, "exam closed");
        Ok(exam.clone())
    }

    // Variants

    pub async fn generate_variants(
        &self,
        exam_id: Uuid,
        count: usize,
    ) -> Result<Vec<Variant>, Error> {
        if count == 0 || count > MAX_VARIANTS_PER_REQUEST {
            return Err(Error::BadRequest(format!(
                "variant count must be between 1 and {MAX_VARIANTS_PER_REQUEST}"
            )));
        }

        let mut inner = self.inner.write().await;
        let exam = inner.exam(&exam_id)?;
        if exam.status == ExamStatus::Closed {
            return Err(Error::Conflict(format!("exam {exam_id} is closed")));
        }
        validate_config(exam).map_err(exam_utils::error::Error::InvalidConfig)?;

        let next = inner.next_variant.get(&exam_id).copied().unwrap_or(0);
        let variants = (0..count)
            .map(|i| generate_variant(exam, variant_name(next + i)))
            .collect::<Result<Vec<_>, _>>()?;

        for variant in &variants {
            inner.variants.insert(variant.id, variant.clone());
        }
        inner.next_variant.insert(exam_id, next + count);
        info!(exam = %exam_id, count, "variants generated");
        Ok(variants)
    }

    pub async fn list_variants(&self, exam_id: Uuid) -> Result<Vec<Variant>, Error> {
        let inner = self.inner.read().await;
        inner.exam(&exam_id)?;
        Ok(inner.exam_variants(&exam_id))
    }

    pub async fn get_variant(&self, id: Uuid) -> Result<Variant, Error> {
        self.inner.read().await.variant(&id).cloned()
    }

    pub async fn delete_variant(&self, id: Uuid) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        inner.variant(&id)?;
        if inner.attempts.values().any(|a| a.variant_id == id) {
            return Err(Error::Conflict(format!("variant {id} is assigned to attempts")));
        }
        inner.variants.remove(&id);
        Ok(())
    }

    // Students

    pub async fn create_student(
        &self,
        input: StudentCreate,
        now: DateTime<Utc>,
    ) -> Result<Student, Error> {
        let name = input.name.trim();
        let email = input.email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(Error::BadRequest(
                "student name and email must not be empty".to_string(),
            ));
        }

        let mut inner = self.inner.write().await;
        if inner
            .students
            .values()
            .any(|s| s.email.eq_ignore_ascii_case(email))
        {
            return Err(Error::Conflict(format!("email {email} is already registered")));
        }

        let student = Student {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            role: input.role,
            created_at: now,
        };
        inner.students.insert(student.id, student.clone());
        Ok(student)
    }

    pub async fn list_students(&self) -> Vec<Student> {
        let inner = self.inner.read().await;
        let mut students: Vec<Student> = inner.students.values().cloned().collect();
        students.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        students
    }

    pub async fn get_student(&self, id: Uuid) -> Result<Student, Error> {
        self.inner.read().await.student(&id).cloned()
    }

    // Attempts

    /// Starts the student's attempt, or resumes the one in progress.
    ///
    /// New attempts get the variant with the fewest attempts so far.
    pub async fn start_attempt(
        &self,
        student_id: Uuid,
        exam_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Attempt, Error> {
        let mut inner = self.inner.write().await;
        let student = inner.student(&student_id)?;
        if student.role != Role::Student {
            return Err(Error::Server(
                axum::http::StatusCode::FORBIDDEN,
                format!("{} is not a student", student.email),
            ));
        }
        let exam = inner.exam(&exam_id)?;
        if exam.status != ExamStatus::Published {
            return Err(Error::Conflict(format!("exam {exam_id} is not open")));
        }

        if let Some(attempt) = inner.attempts.get(&(student_id, exam_id)) {
            if attempt.status == AttemptStatus::Submitted {
                return Err(Error::Conflict(format!(
                    "exam {exam_id} was already submitted"
                )));
            }
            debug!(attempt = %attempt.id, "resuming attempt");
            return inner.view(attempt);
        }

        // Ties go to the oldest variant
        let variant_id = inner
            .exam_variants(&exam_id)
            .iter()
            .min_by_key(|v| {
                inner
                    .attempts
                    .values()
                    .filter(|at| at.variant_id == v.id)
                    .count()
            })
            .map(|v| v.id)
            .ok_or_else(|| Error::Conflict(format!("exam {exam_id} has no variants")))?;

        let attempt = ExamAttempt {
            id: Uuid::new_v4(),
            exam_id,
            variant_id,
            student_id,
            status: AttemptStatus::InProgress,
            start_time: now,
            submission_time: None,
            answers: vec![],
            score: None,
            passed: None,
        };
        info!(
            attempt = %attempt.id,
            student = %student_id,
            exam = %exam_id,
            variant = %variant_id,
            "attempt started"
        );
        let view = inner.view(&attempt)?;
        inner.attempts.insert((student_id, exam_id), attempt);
        Ok(view)
    }

    pub async fn get_attempt(&self, student_id: Uuid, exam_id: Uuid) -> Result<Attempt, Error> {
        let inner = self.inner.read().await;
        let attempt = inner
            .attempts
            .get(&(student_id, exam_id))
            .ok_or_else(|| Error::NotFound(format!("no attempt for exam {exam_id}")))?;
        inner.view(attempt)
    }

    /// Autosave. Each submission replaces the saved answer for its question.
    pub async fn save_answers(
        &self,
        student_id: Uuid,
        exam_id: Uuid,
        answers: Vec<AnswerSubmission>,
        now: DateTime<Utc>,
    ) -> Result<Attempt, Error> {
        let mut inner = self.inner.write().await;
        let mut attempt = in_progress_attempt(&inner, student_id, exam_id)?.clone();
        let exam = inner.exam(&exam_id)?;
        if expired(exam, &attempt, now) {
            return Err(Error::Conflict(format!(
                "time limit for exam {exam_id} has passed"
            )));
        }

        apply_answers(exam, inner.variant(&attempt.variant_id)?, &mut attempt, answers, now)?;
        let view = inner.view(&attempt)?;
        inner.attempts.insert((student_id, exam_id), attempt);
        Ok(view)
    }

    /// Saves the final answers, unless the time limit has passed, then grades
    /// the attempt.
    pub async fn submit_attempt(
        &self,
        student_id: Uuid,
        exam_id: Uuid,
        answers: Vec<AnswerSubmission>,
        now: DateTime<Utc>,
    ) -> Result<Attempt, Error> {
        let mut inner = self.inner.write().await;
        let mut attempt = in_progress_attempt(&inner, student_id, exam_id)?.clone();
        let exam = inner.exam(&exam_id)?;
        let variant = inner.variant(&attempt.variant_id)?;

        if expired(exam, &attempt, now) {
            if !answers.is_empty() {
                debug!(attempt = %attempt.id, "time limit passed, final answers ignored");
            }
        } else {
            apply_answers(exam, variant, &mut attempt, answers, now)?;
        }

        let score = calculate_score(exam, variant, &attempt)?;
        attempt.status = AttemptStatus::Submitted;
        attempt.submission_time = Some(now);
        attempt.score = Some(score);
        attempt.passed = Some(check_attempt_pass(exam, variant, &attempt));
        info!(attempt = %attempt.id, score, passed = ?attempt.passed, "attempt submitted");

        let view = inner.view(&attempt)?;
        inner.attempts.insert((student_id, exam_id), attempt);
        Ok(view)
    }

    pub async fn exam_report(&self, exam_id: Uuid) -> Result<ExamReport, Error> {
        let inner = self.inner.read().await;
        let exam = inner.exam(&exam_id)?;
        let variants = inner.exam_variants(&exam_id);
        let attempts: Vec<ExamAttempt> = inner
            .attempts
            .values()
            .filter(|a| a.exam_id == exam_id)
            .cloned()
            .collect();
        Ok(build_exam_report(exam, &variants, &attempts))
    }
}

fn in_progress_attempt(
    inner: &Inner,
    student_id: Uuid,
    exam_id: Uuid,
) -> Result<&ExamAttempt, Error> {
    let attempt = inner
        .attempts
        .get(&(student_id, exam_id))
        .ok_or_else(|| Error::NotFound(format!("no attempt for exam {exam_id}")))?;
    if attempt.status != AttemptStatus::InProgress {
        return Err(Error::Conflict(format!(
            "exam {exam_id} was already submitted"
        )));
    }
    Ok(attempt)
}

fn expired(exam: &Exam, attempt: &ExamAttempt, now: DateTime<Utc>) -> bool {
    attempt_expiry(exam, attempt).is_some_and(|expiry| now > expiry)
}

/// Validates every submission before touching the attempt, so a bad request
/// saves nothing.
fn apply_answers(
    exam: &Exam,
    variant: &Variant,
    attempt: &mut ExamAttempt,
    answers: Vec<AnswerSubmission>,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    let mut student_answers = Vec::with_capacity(answers.len());
    for submission in answers {
        let variant_question = variant.question(&submission.question_id).ok_or_else(|| {
            Error::BadRequest(format!(
                "question {} is not part of this exam",
                submission.question_id
            ))
        })?;
        let answer = submission.into_student_answer(now);
        if let Some(foreign) = answer
            .selected
            .iter()
            .find(|id| !variant_question.answers.contains(id))
        {
            return Err(Error::BadRequest(format!(
                "answer {foreign} does not belong to question {}",
                answer.question_id
            )));
        }
        let single_choice = exam
            .question(&answer.question_id)
            .is_some_and(|q| q.kind == QuestionKind::SingleChoice);
        if single_choice && answer.selected.len() > 1 {
            return Err(Error::BadRequest(format!(
                "question {} accepts a single answer",
                answer.question_id
            )));
        }
        student_answers.push(answer);
    }

    for answer in student_answers {
        match attempt
            .answers
            .iter_mut()
            .find(|a| a.question_id == answer.question_id)
        {
            Some(existing) => *existing = answer,
            None => attempt.answers.push(answer),
        }
    }
    Ok(())
}

/// "Variant A" .. "Variant Z", then "Variant 27" onwards.
fn variant_name(index: usize) -> String {
    if index < 26 {
        format!("Variant {}", (b'A' + index as u8) as char)
    } else {
        format!("Variant {}", index + 1)
    }
}

/// Orders "Variant Z" before "Variant 27" and "Variant 99" before "Variant 100".
fn name_order(variant: &Variant) -> (usize, &str) {
    (variant.name.len(), variant.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use lms_schema::{
        ExamConfig, TagConfig,
        input::{AnswerInput, QuestionInput},
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap()
    }

    fn question(text: &str, tag: &str) -> QuestionInput {
        QuestionInput {
            text: text.to_string(),
            kind: QuestionKind::SingleChoice,
            tags: vec![tag.to_string()],
            points: 1.0,
            answers: vec![
                AnswerInput {
                    text: "right".to_string(),
                    is_correct: true,
                },
                AnswerInput {
                    text: "wrong".to_string(),
                    is_correct: false,
                },
            ],
            deprecated: false,
        }
    }

    fn exam_input() -> ExamCreate {
        ExamCreate {
            course_id: Some("web-101".to_string()),
            name: "Midterm".to_string(),
            description: None,
            config: ExamConfig {
                total_time_in_s: 1800,
                passing_percent: 60.0,
                questions_per_variant: 2,
                tags: vec![TagConfig {
                    group: vec!["css".to_string()],
                    number_of_questions: 1,
                }],
            },
            questions: vec![
                question("What is HTML?", "html"),
                question("What is CSS?", "css"),
                question("What is a selector?", "css"),
            ],
        }
    }

    fn student_input(email: &str) -> StudentCreate {
        StudentCreate {
            name: "Bat-Erdene".to_string(),
            email: email.to_string(),
            role: Role::Student,
        }
    }

    async fn published_exam(store: &Store, variants: usize) -> Exam {
        let exam = store.create_exam(exam_input(), now()).await.unwrap();
        store.generate_variants(exam.id, variants).await.unwrap();
        store.publish_exam(exam.id, now()).await.unwrap()
    }

    fn right_answers(attempt: &Attempt, exam: &Exam) -> Vec<AnswerSubmission> {
        attempt
            .questions
            .iter()
            .map(|q| {
                let question = exam.question(&q.id).unwrap();
                AnswerSubmission {
                    question_id: q.id,
                    selected: question
                        .answers
                        .iter()
                        .filter(|a| a.is_correct)
                        .map(|a| a.id)
                        .collect(),
                }
            })
            .collect()
    }

    #[test]
    fn variant_names() {
        assert_eq!(variant_name(0), "Variant A");
        assert_eq!(variant_name(25), "Variant Z");
        assert_eq!(variant_name(26), "Variant 27");
    }

    #[test]
    fn variant_names_sort_in_sequence() {
        let names = ["Variant 100", "Variant 27", "Variant Z", "Variant 99", "Variant B"];
        let mut variants: Vec<Variant> = names
            .iter()
            .map(|name| Variant {
                name: name.to_string(),
                ..Default::default()
            })
            .collect();
        variants.sort_by(|a, b| name_order(a).cmp(&name_order(b)));
        let sorted: Vec<&str> = variants.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            sorted,
            ["Variant B", "Variant Z", "Variant 27", "Variant 99", "Variant 100"]
        );
    }

    #[tokio::test]
    async fn variant_names_are_not_reused_after_delete() {
        let store = Store::new();
        let exam = store.create_exam(exam_input(), now()).await.unwrap();
        let variants = store.generate_variants(exam.id, 2).await.unwrap();

        store.delete_variant(variants[0].id).await.unwrap();
        let added = store.generate_variants(exam.id, 1).await.unwrap();
        assert_eq!(added[0].name, "Variant C");

        let names: Vec<String> = store
            .list_variants(exam.id)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, ["Variant B", "Variant C"]);
    }

    #[tokio::test]
    async fn publishing_requires_a_variant() {
        let store = Store::new();
        let exam = store.create_exam(exam_input(), now()).await.unwrap();

        let err = store.publish_exam(exam.id, now()).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let variants = store.generate_variants(exam.id, 2).await.unwrap();
        assert_eq!(variants[0].name, "Variant A");
        assert_eq!(variants[1].name, "Variant B");

        let exam = store.publish_exam(exam.id, now()).await.unwrap();
        assert_eq!(exam.status, ExamStatus::Published);

        let err = store
            .update_exam(exam.id, ExamUpdate::default(), now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn invalid_config_cannot_generate_variants() {
        let store = Store::new();
        let mut input = exam_input();
        input.config.questions_per_variant = 4;
        let exam = store.create_exam(input, now()).await.unwrap();

        let err = store.generate_variants(exam.id, 1).await.unwrap_err();
        assert!(matches!(
            err,
            Error::ExamUtils(exam_utils::error::Error::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn updating_questions_drops_variants() {
        let store = Store::new();
        let exam = store.create_exam(exam_input(), now()).await.unwrap();
        store.generate_variants(exam.id, 3).await.unwrap();

        let update = ExamUpdate {
            questions: Some(exam_input().questions),
            ..Default::default()
        };
        store.update_exam(exam.id, update, now()).await.unwrap();
        assert!(store.list_variants(exam.id).await.unwrap().is_empty());

        let update = ExamUpdate {
            description: Some("Chapters 1-3".to_string()),
            ..Default::default()
        };
        store.generate_variants(exam.id, 1).await.unwrap();
        let exam = store.update_exam(exam.id, update, now()).await.unwrap();
        assert_eq!(exam.description.as_deref(), Some("Chapters 1-3"));
        assert_eq!(store.list_variants(exam.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = Store::new();
        store
            .create_student(student_input("saraa@example.mn"), now())
            .await
            .unwrap();
        let err = store
            .create_student(student_input("SARAA@example.mn"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn variants_are_spread_across_students() {
        let store = Store::new();
        let exam = published_exam(&store, 2).await;

        let mut assigned = vec![];
        for i in 0..4 {
            let student = store
                .create_student(student_input(&format!("s{i}@example.mn")), now())
                .await
                .unwrap();
            let attempt = store.start_attempt(student.id, exam.id, now()).await.unwrap();
            assigned.push(attempt.variant_name);
        }
        assigned.sort();
        assert_eq!(assigned, ["Variant A", "Variant A", "Variant B", "Variant B"]);
    }

    #[tokio::test]
    async fn attempt_lifecycle() {
        let store = Store::new();
        let exam = published_exam(&store, 1).await;
        let student = store
            .create_student(student_input("tuul@example.mn"), now())
            .await
            .unwrap();

        let attempt = store.start_attempt(student.id, exam.id, now()).await.unwrap();
        assert_eq!(attempt.status, AttemptStatus::InProgress);
        assert_eq!(attempt.expires_at, Some(now() + Duration::seconds(1800)));

        let answers = right_answers(&attempt, &exam);
        let saved = store
            .save_answers(student.id, exam.id, answers[..1].to_vec(), now())
            .await
            .unwrap();
        assert_eq!(saved.questions.iter().filter(|q| !q.selected.is_empty()).count(), 1);

        // Resuming returns the same attempt with saved answers
        let resumed = store.start_attempt(student.id, exam.id, now()).await.unwrap();
        assert_eq!(resumed.id, attempt.id);
        assert_eq!(resumed.questions[0].selected, answers[0].selected);

        let later = now() + Duration::minutes(5);
        let submitted = store
            .submit_attempt(student.id, exam.id, answers[1..].to_vec(), later)
            .await
            .unwrap();
        assert_eq!(submitted.status, AttemptStatus::Submitted);
        assert_eq!(submitted.score, Some(100.0));
        assert_eq!(submitted.passed, Some(true));
        assert_eq!(submitted.submission_time, Some(later));
        assert!(submitted.questions.iter().all(|q| q.correct == Some(true)));

        let err = store
            .save_answers(student.id, exam.id, vec![], later)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        let err = store.start_attempt(student.id, exam.id, later).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let report = store.exam_report(exam.id).await.unwrap();
        assert_eq!(report.attempts_submitted, 1);
        assert_eq!(report.passed, 1);

        let err = store.delete_exam(exam.id).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn answers_after_time_limit_are_rejected() {
        let store = Store::new();
        let exam = published_exam(&store, 1).await;
        let student = store
            .create_student(student_input("dorj@example.mn"), now())
            .await
            .unwrap();
        let attempt = store.start_attempt(student.id, exam.id, now()).await.unwrap();
        let answers = right_answers(&attempt, &exam);

        let late = now() + Duration::seconds(1801);
        let err = store
            .save_answers(student.id, exam.id, answers.clone(), late)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let submitted = store
            .submit_attempt(student.id, exam.id, answers, late)
            .await
            .unwrap();
        assert_eq!(submitted.score, Some(0.0));
        assert_eq!(submitted.passed, Some(false));
    }

    #[tokio::test]
    async fn foreign_and_multiple_selections_are_rejected() {
        let store = Store::new();
        let exam = published_exam(&store, 1).await;
        let student = store
            .create_student(student_input("oyun@example.mn"), now())
            .await
            .unwrap();
        let attempt = store.start_attempt(student.id, exam.id, now()).await.unwrap();
        let question = &attempt.questions[0];

        let foreign = AnswerSubmission {
            question_id: question.id,
            selected: vec![Uuid::new_v4()],
        };
        let err = store
            .save_answers(student.id, exam.id, vec![foreign], now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));

        let both = AnswerSubmission {
            question_id: question.id,
            selected: question.answers.iter().map(|a| a.id).collect(),
        };
        let err = store
            .save_answers(student.id, exam.id, vec![both], now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));

        let unknown_question = AnswerSubmission {
            question_id: Uuid::new_v4(),
            selected: vec![],
        };
        let err = store
            .save_answers(student.id, exam.id, vec![unknown_question], now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));

        let view = store.get_attempt(student.id, exam.id).await.unwrap();
        assert!(view.questions.iter().all(|q| q.selected.is_empty()));
    }

    #[tokio::test]
    async fn teachers_cannot_take_exams() {
        let store = Store::new();
        let exam = published_exam(&store, 1).await;
        let mut input = student_input("bagsh@example.mn");
        input.role = Role::Teacher;
        let teacher = store.create_student(input, now()).await.unwrap();

        let err = store.start_attempt(teacher.id, exam.id, now()).await.unwrap_err();
        assert!(matches!(err, Error::Server(code, _) if code == axum::http::StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn closed_exam_rejects_new_attempts() {
        let store = Store::new();
        let exam = published_exam(&store, 1).await;
        store.close_exam(exam.id, now()).await.unwrap();
        let student = store
            .create_student(student_input("naraa@example.mn"), now())
            .await
            .unwrap();

        let err = store.start_attempt(student.id, exam.id, now()).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        let err = store.generate_variants(exam.id, 1).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }
}
