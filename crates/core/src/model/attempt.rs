use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ids::{ExerciseId, LessonId, TopicId};

//
// ─── EXERCISE ATTEMPT ─────────────────────────────────────────────────────────
//

/// One graded answer submission. Attempts form an append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseAttempt {
    pub exercise_id: ExerciseId,
    pub user_answer: String,
    pub is_correct: bool,
    pub attempted_at: DateTime<Utc>,
}

impl ExerciseAttempt {
    #[must_use]
    pub fn new(
        exercise_id: ExerciseId,
        user_answer: impl Into<String>,
        is_correct: bool,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            exercise_id,
            user_answer: user_answer.into(),
            is_correct,
            attempted_at,
        }
    }
}

//
// ─── LESSON PROGRESS ──────────────────────────────────────────────────────────
//

/// Completion state of a lesson, keyed by `(topic_id, lesson_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub topic_id: TopicId,
    pub lesson_id: LessonId,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    /// A completed record stamped at `at`.
    #[must_use]
    pub fn completed(topic_id: TopicId, lesson_id: LessonId, at: DateTime<Utc>) -> Self {
        Self {
            topic_id,
            lesson_id,
            completed: true,
            completed_at: Some(at),
        }
    }
}
