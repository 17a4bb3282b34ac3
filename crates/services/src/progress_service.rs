use std::sync::Arc;

use storage::repository::{ContentRepository, ProgressRepository};
use tracing::{debug, info, instrument};
use tutor_core::model::{Exercise, ExerciseId, LessonId, LessonProgress, TopicId};
use tutor_core::progress::{TopicProgressSummary, summarize_topic};

use crate::Clock;
use crate::error::ServiceError;

/// Lesson completion and per-topic progress.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    content: Arc<dyn ContentRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
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

    /// Mark a lesson complete. Repeating the call only refreshes the
    /// completion timestamp.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if either id is blank or the
    /// lesson belongs to another topic.
    /// Returns `ServiceError::NotFound` if the lesson does not exist.
    /// Returns `ServiceError::Storage` if repository access fails.
    #[instrument(skip_all, fields(lesson_id = %lesson_id, topic_id = %topic_id))]
    pub async fn mark_lesson_complete(
        &self,
        lesson_id: &LessonId,
        topic_id: &TopicId,
    ) -> Result<(), ServiceError> {
        if lesson_id.as_str().trim().is_empty() {
            return Err(ServiceError::invalid("lesson id cannot be blank"));
        }
        if topic_id.as_str().trim().is_empty() {
            return Err(ServiceError::invalid("topic id cannot be blank"));
        }

        let lesson = self
            .content
            .get_lesson(lesson_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("lesson", lesson_id))?;
        if lesson.topic_id() != topic_id {
            return Err(ServiceError::invalid(format!(
                "lesson {lesson_id} belongs to topic {}, not {topic_id}",
                lesson.topic_id()
            )));
        }

        self.progress
            .mark_lesson_complete(lesson_id, topic_id, self.clock.now())
            .await?;
        info!("lesson marked complete");
        Ok(())
    }

    /// True if the lesson has been completed under any topic. Unknown lessons
    /// are simply not complete.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn is_lesson_complete(&self, lesson_id: &LessonId) -> Result<bool, ServiceError> {
        debug!(%lesson_id, "checking lesson completion");
        Ok(self.progress.is_lesson_complete(lesson_id).await?)
    }

    /// Recompute a topic's progress summary from the current store state.
    ///
    /// An unknown topic yields a summary of zeros with no average score.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn topic_progress(
        &self,
        topic_id: &TopicId,
    ) -> Result<TopicProgressSummary, ServiceError> {
        debug!(%topic_id, "computing topic progress");

        let lessons = self.content.list_lessons_by_topic(topic_id).await?;
        let mut exercises: Vec<Exercise> = Vec::new();
        for lesson in &lessons {
            exercises.extend(self.content.list_exercises_by_lesson(lesson.id()).await?);
        }
        let exercise_ids: Vec<ExerciseId> = exercises.iter().map(|e| e.id().clone()).collect();

        let progress = self.progress.all_progress().await?;
        let attempts = self.progress.attempts_for_exercises(&exercise_ids).await?;

        Ok(summarize_topic(
            topic_id, &lessons, &exercises, &progress, &attempts,
        ))
    }

    /// Every lesson completion record, ordered by topic then lesson.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn all_progress(&self) -> Result<Vec<LessonProgress>, ServiceError> {
        debug!("listing all progress");
        Ok(self.progress.all_progress().await?)
    }
}
