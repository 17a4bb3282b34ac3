use std::sync::Arc;

use serde::Serialize;
use storage::repository::ContentRepository;
use tracing::{debug, info, instrument};
use tutor_core::curriculum::{Curriculum, CurriculumDraft};
use tutor_core::model::{
    Exercise, ExerciseId, Lesson, LessonId, Level, Subject, Topic, TopicId,
};

use crate::error::ServiceError;

/// Counts of what a curriculum load wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub topics: usize,
    pub lessons: usize,
    pub exercises: usize,
}

impl LoadSummary {
    fn of(curriculum: &Curriculum) -> Self {
        Self {
            topics: curriculum.topics().len(),
            lessons: curriculum.lessons().len(),
            exercises: curriculum.exercises().len(),
        }
    }
}

/// Read access to curriculum content, plus seeding.
#[derive(Clone)]
pub struct CatalogService {
    content: Arc<dyn ContentRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(content: Arc<dyn ContentRepository>) -> Self {
        Self { content }
    }

    /// Load an already validated curriculum.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the store rejects the load, e.g.
    /// with `StorageError::Conflict` on a position clash.
    #[instrument(skip_all, fields(topics = curriculum.topics().len()))]
    pub async fn load_curriculum(
        &self,
        curriculum: &Curriculum,
    ) -> Result<LoadSummary, ServiceError> {
        self.content.load_curriculum(curriculum).await?;
        let summary = LoadSummary::of(curriculum);
        info!(
            lessons = summary.lessons,
            exercises = summary.exercises,
            "curriculum loaded"
        );
        Ok(summary)
    }

    /// Parse several JSON documents, validate them as one curriculum and load
    /// it. Documents may reference entities defined in each other.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Curriculum` if any document is malformed or the
    /// combined curriculum is invalid; nothing is written in that case.
    /// Returns `ServiceError::Storage` if the load fails.
    pub async fn load_documents<S: AsRef<str>>(
        &self,
        documents: &[S],
    ) -> Result<LoadSummary, ServiceError> {
        let mut draft = CurriculumDraft::default();
        for doc in documents {
            draft.extend(CurriculumDraft::from_json(doc.as_ref())?);
        }
        let curriculum = draft.validate()?;
        self.load_curriculum(&curriculum).await
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn list_topics(&self) -> Result<Vec<Topic>, ServiceError> {
        debug!("listing topics");
        Ok(self.content.list_topics().await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn list_topics_by_subject(
        &self,
        subject: Subject,
    ) -> Result<Vec<Topic>, ServiceError> {
        debug!(%subject, "listing topics by subject");
        Ok(self.content.list_topics_by_subject(subject).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn list_topics_by_level(&self, level: Level) -> Result<Vec<Topic>, ServiceError> {
        debug!(%level, "listing topics by level");
        Ok(self.content.list_topics_by_level(level).await?)
    }

    /// Fetch a topic by id.
    ///
    /// Returns `Ok(None)` when the topic does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn get_topic(&self, id: &TopicId) -> Result<Option<Topic>, ServiceError> {
        debug!(topic_id = %id, "fetching topic");
        Ok(self.content.get_topic(id).await?)
    }

    /// Lessons of a topic ordered by position; empty for an unknown topic.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn list_lessons_by_topic(
        &self,
        topic_id: &TopicId,
    ) -> Result<Vec<Lesson>, ServiceError> {
        debug!(%topic_id, "listing lessons");
        Ok(self.content.list_lessons_by_topic(topic_id).await?)
    }

    /// Returns `Ok(None)` when the lesson does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, ServiceError> {
        debug!(lesson_id = %id, "fetching lesson");
        Ok(self.content.get_lesson(id).await?)
    }

    /// Exercises of a lesson ordered by position; empty for an unknown lesson.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn list_exercises_by_lesson(
        &self,
        lesson_id: &LessonId,
    ) -> Result<Vec<Exercise>, ServiceError> {
        debug!(%lesson_id, "listing exercises");
        Ok(self.content.list_exercises_by_lesson(lesson_id).await?)
    }

    /// Returns `Ok(None)` when the exercise does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn get_exercise(&self, id: &ExerciseId) -> Result<Option<Exercise>, ServiceError> {
        debug!(exercise_id = %id, "fetching exercise");
        Ok(self.content.get_exercise(id).await?)
    }
}
