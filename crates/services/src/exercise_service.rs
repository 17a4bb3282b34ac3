use std::sync::Arc;

use serde::Serialize;
use storage::repository::{ContentRepository, ProgressRepository};
use tracing::{info, instrument};
use tutor_core::grading::normalize_answer;
use tutor_core::model::{ExerciseAttempt, ExerciseId};

use crate::Clock;
use crate::error::ServiceError;

/// Outcome of a submitted answer. The correct answer and explanation are
/// always revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
}

/// Grades answers and appends them to the attempt log.
#[derive(Clone)]
pub struct ExerciseService {
    clock: Clock,
    content: Arc<dyn ContentRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ExerciseService {
    #[must_use]
    pub fn new(
        clock: Clock,
        content: Arc<dyn ContentRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            content,
            progress,
        }
    }

    /// Grade `answer` against the exercise and record the attempt.
    ///
    /// Every call that passes validation appends one attempt, including
    /// repeated identical answers.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the exercise does not exist, checked
    /// before the answer itself.
    /// Returns `ServiceError::InvalidInput` if the answer is blank or has no
    /// gradable characters left after normalization.
    /// Returns `ServiceError::Storage` if the lookup or the append fails.
    #[instrument(skip_all, fields(exercise_id = %exercise_id))]
    pub async fn submit_answer(
        &self,
        exercise_id: &ExerciseId,
        answer: &str,
    ) -> Result<AnswerFeedback, ServiceError> {
        let exercise = self
            .content
            .get_exercise(exercise_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("exercise", exercise_id))?;

        if answer.trim().is_empty() {
            return Err(ServiceError::invalid("answer cannot be blank"));
        }
        if normalize_answer(answer).trim().is_empty() {
            return Err(ServiceError::invalid("answer has nothing to grade"));
        }

        let is_correct = exercise.is_correct(answer);
        let attempt =
            ExerciseAttempt::new(exercise_id.clone(), answer, is_correct, self.clock.now());
        self.progress.record_attempt(&attempt).await?;
        info!(is_correct, "answer recorded");

        Ok(AnswerFeedback {
            is_correct,
            correct_answer: exercise.correct_answer().to_owned(),
            explanation: exercise.explanation().to_owned(),
        })
    }
}
