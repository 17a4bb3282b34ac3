use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tutor_core::curriculum::Curriculum;
use tutor_core::model::{
    Exercise, ExerciseAttempt, ExerciseId, Lesson, LessonId, LessonProgress, Level, Subject,
    Topic, TopicId, exercise, lesson, topic,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Read-only curriculum lookups plus the seed-time load.
///
/// Lookups of a single entity return `Ok(None)` when the id is unknown;
/// list operations return an empty vector for an unknown parent.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Insert (or overwrite by id) every entity of a validated curriculum in
    /// one atomic step.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if an incoming row takes the position
    /// of a stored row the load does not overwrite, or other storage errors.
    async fn load_curriculum(&self, curriculum: &Curriculum) -> Result<(), StorageError>;

    /// All topics in catalog order (level, subject, id).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError>;

    /// Topics of one subject, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_topics_by_subject(&self, subject: Subject) -> Result<Vec<Topic>, StorageError>;

    /// Topics of one level, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_topics_by_level(&self, level: Level) -> Result<Vec<Topic>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_topic(&self, id: &TopicId) -> Result<Option<Topic>, StorageError>;

    /// Lessons of a topic ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_lessons_by_topic(&self, topic_id: &TopicId)
    -> Result<Vec<Lesson>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, StorageError>;

    /// Exercises of a lesson ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_exercises_by_lesson(
        &self,
        lesson_id: &LessonId,
    ) -> Result<Vec<Exercise>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_exercise(&self, id: &ExerciseId) -> Result<Option<Exercise>, StorageError>;
}

/// Learner state: an append-only attempt log and upserted lesson completions.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Append an attempt. Never fails because of earlier attempts.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn record_attempt(&self, attempt: &ExerciseAttempt) -> Result<(), StorageError>;

    /// Upsert the completion record for `(topic_id, lesson_id)`, refreshing
    /// its timestamp when it already exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn mark_lesson_complete(
        &self,
        lesson_id: &LessonId,
        topic_id: &TopicId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// True if any record for the lesson, under any topic, is completed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn is_lesson_complete(&self, lesson_id: &LessonId) -> Result<bool, StorageError>;

    /// Every completion record, ordered by `(topic_id, lesson_id)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn all_progress(&self) -> Result<Vec<LessonProgress>, StorageError>;

    /// The whole attempt log in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn attempts(&self) -> Result<Vec<ExerciseAttempt>, StorageError>;

    /// Attempts on any of the given exercises, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn attempts_for_exercises(
        &self,
        ids: &[ExerciseId],
    ) -> Result<Vec<ExerciseAttempt>, StorageError>;
}

//
// ─── IN-MEMORY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Default)]
struct ContentTables {
    topics: HashMap<TopicId, Topic>,
    lessons: HashMap<LessonId, Lesson>,
    exercises: HashMap<ExerciseId, Exercise>,
}

#[derive(Debug, Default)]
struct ProgressLog {
    attempts: Vec<ExerciseAttempt>,
    lessons: BTreeMap<(TopicId, LessonId), LessonProgress>,
}

/// Map-backed repository. Each store sits behind a single mutex, so every
/// mutation is one critical section.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    content: Arc<Mutex<ContentTables>>,
    progress: Arc<Mutex<ProgressLog>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository pre-loaded with `curriculum`.
    #[must_use]
    pub fn with_curriculum(curriculum: &Curriculum) -> Self {
        let repo = Self::new();
        if let Ok(mut tables) = repo.content.lock() {
            tables.insert_all(curriculum);
        }
        repo
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

impl ContentTables {
    fn insert_all(&mut self, curriculum: &Curriculum) {
        for t in curriculum.topics() {
            self.topics.insert(t.id().clone(), t.clone());
        }
        for l in curriculum.lessons() {
            self.lessons.insert(l.id().clone(), l.clone());
        }
        for e in curriculum.exercises() {
            self.exercises.insert(e.id().clone(), e.clone());
        }
    }

    /// True if an incoming row would share a position with a stored row that
    /// this load leaves in place. Rows being overwritten are judged by their
    /// incoming position only, so reorders within a load are accepted.
    fn position_clash(&self, curriculum: &Curriculum) -> bool {
        let lessons: HashSet<&LessonId> = curriculum.lessons().iter().map(Lesson::id).collect();
        let lesson_slots: HashSet<(&TopicId, u32)> = self
            .lessons
            .values()
            .filter(|kept| !lessons.contains(kept.id()))
            .map(|kept| (kept.topic_id(), kept.position()))
            .collect();
        let lesson_clash = curriculum
            .lessons()
            .iter()
            .any(|new| lesson_slots.contains(&(new.topic_id(), new.position())));

        let exercises: HashSet<&ExerciseId> =
            curriculum.exercises().iter().map(Exercise::id).collect();
        let exercise_slots: HashSet<(&LessonId, u32)> = self
            .exercises
            .values()
            .filter(|kept| !exercises.contains(kept.id()))
            .map(|kept| (kept.lesson_id(), kept.position()))
            .collect();
        let exercise_clash = curriculum
            .exercises()
            .iter()
            .any(|new| exercise_slots.contains(&(new.lesson_id(), new.position())));

        lesson_clash || exercise_clash
    }

    fn topics_where(&self, keep: impl Fn(&Topic) -> bool) -> Vec<Topic> {
        let mut out: Vec<Topic> = self.topics.values().filter(|&t| keep(t)).cloned().collect();
        topic::sort_catalog(&mut out);
        out
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn load_curriculum(&self, curriculum: &Curriculum) -> Result<(), StorageError> {
        let mut tables = lock(&self.content)?;
        if tables.position_clash(curriculum) {
            return Err(StorageError::Conflict);
        }
        tables.insert_all(curriculum);
        Ok(())
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError> {
        Ok(lock(&self.content)?.topics_where(|_| true))
    }

    async fn list_topics_by_subject(&self, subject: Subject) -> Result<Vec<Topic>, StorageError> {
        Ok(lock(&self.content)?.topics_where(|t| t.subject() == subject))
    }

    async fn list_topics_by_level(&self, level: Level) -> Result<Vec<Topic>, StorageError> {
        Ok(lock(&self.content)?.topics_where(|t| t.level() == level))
    }

    async fn get_topic(&self, id: &TopicId) -> Result<Option<Topic>, StorageError> {
        Ok(lock(&self.content)?.topics.get(id).cloned())
    }

    async fn list_lessons_by_topic(
        &self,
        topic_id: &TopicId,
    ) -> Result<Vec<Lesson>, StorageError> {
        let tables = lock(&self.content)?;
        let mut out: Vec<Lesson> = tables
            .lessons
            .values()
            .filter(|l| l.topic_id() == topic_id)
            .cloned()
            .collect();
        lesson::sort_by_position(&mut out);
        Ok(out)
    }

    async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, StorageError> {
        Ok(lock(&self.content)?.lessons.get(id).cloned())
    }

    async fn list_exercises_by_lesson(
        &self,
        lesson_id: &LessonId,
    ) -> Result<Vec<Exercise>, StorageError> {
        let tables = lock(&self.content)?;
        let mut out: Vec<Exercise> = tables
            .exercises
            .values()
            .filter(|e| e.lesson_id() == lesson_id)
            .cloned()
            .collect();
        exercise::sort_by_position(&mut out);
        Ok(out)
    }

    async fn get_exercise(&self, id: &ExerciseId) -> Result<Option<Exercise>, StorageError> {
        Ok(lock(&self.content)?.exercises.get(id).cloned())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn record_attempt(&self, attempt: &ExerciseAttempt) -> Result<(), StorageError> {
        lock(&self.progress)?.attempts.push(attempt.clone());
        Ok(())
    }

    async fn mark_lesson_complete(
        &self,
        lesson_id: &LessonId,
        topic_id: &TopicId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let record = LessonProgress::completed(topic_id.clone(), lesson_id.clone(), at);
        lock(&self.progress)?
            .lessons
            .insert((topic_id.clone(), lesson_id.clone()), record);
        Ok(())
    }

    async fn is_lesson_complete(&self, lesson_id: &LessonId) -> Result<bool, StorageError> {
        let log = lock(&self.progress)?;
        Ok(log
            .lessons
            .values()
            .any(|p| &p.lesson_id == lesson_id && p.completed))
    }

    async fn all_progress(&self) -> Result<Vec<LessonProgress>, StorageError> {
        Ok(lock(&self.progress)?.lessons.values().cloned().collect())
    }

    async fn attempts(&self) -> Result<Vec<ExerciseAttempt>, StorageError> {
        Ok(lock(&self.progress)?.attempts.clone())
    }

    async fn attempts_for_exercises(
        &self,
        ids: &[ExerciseId],
    ) -> Result<Vec<ExerciseAttempt>, StorageError> {
        let wanted: HashSet<&ExerciseId> = ids.iter().collect();
        let log = lock(&self.progress)?;
        Ok(log
            .attempts
            .iter()
            .filter(|a| wanted.contains(&a.exercise_id))
            .cloned()
            .collect())
    }
}

/// Content and progress repositories behind trait objects, so backends can be
/// swapped without touching services.
#[derive(Clone)]
pub struct Storage {
    pub content: Arc<dyn ContentRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: ContentRepository + ProgressRepository + Clone + 'static,
    {
        let content: Arc<dyn ContentRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self { content, progress }
    }
}
