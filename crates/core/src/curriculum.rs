//! Curriculum documents: the only way content enters a store.
//!
//! A [`CurriculumDraft`] is the deserialized JSON document. Validating it
//! builds every entity through its constructor and then checks the
//! cross-entity invariants: unique identifiers, parent references that
//! resolve, and unique positions within each parent.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use thiserror::Error;

use crate::model::{
    Exercise, ExerciseError, ExerciseId, ExerciseKind, ExerciseType, Lesson, LessonError,
    LessonId, Level, Subject, Topic, TopicError, TopicId,
};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CurriculumError {
    #[error("invalid curriculum document: {0}")]
    Parse(String),
    #[error("topic {id}: {source}")]
    Topic {
        id: TopicId,
        #[source]
        source: TopicError,
    },
    #[error("lesson {id}: {source}")]
    Lesson {
        id: LessonId,
        #[source]
        source: LessonError,
    },
    #[error("exercise {id}: {source}")]
    Exercise {
        id: ExerciseId,
        #[source]
        source: ExerciseError,
    },
    #[error("duplicate topic id: {0}")]
    DuplicateTopic(TopicId),
    #[error("duplicate lesson id: {0}")]
    DuplicateLesson(LessonId),
    #[error("duplicate exercise id: {0}")]
    DuplicateExercise(ExerciseId),
    #[error("lesson {lesson} references unknown topic {topic}")]
    UnknownTopic { lesson: LessonId, topic: TopicId },
    #[error("exercise {exercise} references unknown lesson {lesson}")]
    UnknownLesson {
        exercise: ExerciseId,
        lesson: LessonId,
    },
    #[error("topic {topic} has more than one lesson at position {position}")]
    DuplicateLessonPosition { topic: TopicId, position: u32 },
    #[error("lesson {lesson} has more than one exercise at position {position}")]
    DuplicateExercisePosition { lesson: LessonId, position: u32 },
}

//
// ─── DRAFTS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDraft {
    pub id: String,
    pub title: String,
    pub subject: Subject,
    pub level: Level,
    #[serde(default)]
    pub description: String,
    pub lesson_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub order: u32,
    #[serde(default)]
    pub has_exercises: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDraft {
    pub id: String,
    pub lesson_id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    pub order: u32,
}

/// Unvalidated curriculum document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CurriculumDraft {
    #[serde(default)]
    pub topics: Vec<TopicDraft>,
    #[serde(default)]
    pub lessons: Vec<LessonDraft>,
    #[serde(default)]
    pub exercises: Vec<ExerciseDraft>,
}

impl CurriculumDraft {
    /// Parse a JSON document without validating it.
    ///
    /// # Errors
    ///
    /// Returns `CurriculumError::Parse` if the JSON is malformed or has the
    /// wrong shape.
    pub fn from_json(json: &str) -> Result<Self, CurriculumError> {
        serde_json::from_str(json).map_err(|e| CurriculumError::Parse(e.to_string()))
    }

    /// Append another document, so several files can be validated together.
    pub fn extend(&mut self, other: CurriculumDraft) {
        self.topics.extend(other.topics);
        self.lessons.extend(other.lessons);
        self.exercises.extend(other.exercises);
    }

    /// Build every entity and check the cross-entity invariants.
    ///
    /// # Errors
    ///
    /// Returns the first `CurriculumError` encountered.
    pub fn validate(self) -> Result<Curriculum, CurriculumError> {
        let topics = self
            .topics
            .into_iter()
            .map(|d| {
                let id = TopicId::new(d.id);
                Topic::new(
                    id.clone(),
                    d.title,
                    d.subject,
                    d.level,
                    d.description,
                    d.lesson_count,
                )
                .map_err(|source| CurriculumError::Topic { id, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let lessons = self
            .lessons
            .into_iter()
            .map(|d| {
                let id = LessonId::new(d.id);
                Lesson::new(
                    id.clone(),
                    TopicId::new(d.topic_id),
                    d.title,
                    d.content,
                    d.order,
                    d.has_exercises,
                )
                .map_err(|source| CurriculumError::Lesson { id, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exercises = self
            .exercises
            .into_iter()
            .map(|d| {
                let id = ExerciseId::new(d.id);
                ExerciseKind::from_parts(d.exercise_type, d.options)
                    .and_then(|kind| {
                        Exercise::new(
                            id.clone(),
                            LessonId::new(d.lesson_id),
                            d.question,
                            kind,
                            d.correct_answer,
                            d.explanation,
                            d.order,
                        )
                    })
                    .map_err(|source| CurriculumError::Exercise { id, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Curriculum::new(topics, lessons, exercises)
    }
}

//
// ─── CURRICULUM ───────────────────────────────────────────────────────────────
//

/// A validated set of topics, lessons and exercises.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Curriculum {
    topics: Vec<Topic>,
    lessons: Vec<Lesson>,
    exercises: Vec<Exercise>,
}

impl Curriculum {
    /// Check referential integrity and position uniqueness.
    ///
    /// # Errors
    ///
    /// Returns `CurriculumError` for duplicate ids, dangling parent
    /// references, or clashing positions.
    pub fn new(
        topics: Vec<Topic>,
        lessons: Vec<Lesson>,
        exercises: Vec<Exercise>,
    ) -> Result<Self, CurriculumError> {
        let mut topic_ids = HashSet::with_capacity(topics.len());
        for topic in &topics {
            if !topic_ids.insert(topic.id()) {
                return Err(CurriculumError::DuplicateTopic(topic.id().clone()));
            }
        }

        let mut lesson_ids = HashSet::with_capacity(lessons.len());
        let mut lesson_slots: HashMap<&TopicId, HashSet<u32>> = HashMap::new();
        for lesson in &lessons {
            if !lesson_ids.insert(lesson.id()) {
                return Err(CurriculumError::DuplicateLesson(lesson.id().clone()));
            }
            if !topic_ids.contains(lesson.topic_id()) {
                return Err(CurriculumError::UnknownTopic {
                    lesson: lesson.id().clone(),
                    topic: lesson.topic_id().clone(),
                });
            }
            if !lesson_slots
                .entry(lesson.topic_id())
                .or_default()
                .insert(lesson.position())
            {
                return Err(CurriculumError::DuplicateLessonPosition {
                    topic: lesson.topic_id().clone(),
                    position: lesson.position(),
                });
            }
        }

        let mut exercise_ids = HashSet::with_capacity(exercises.len());
        let mut exercise_slots: HashMap<&LessonId, HashSet<u32>> = HashMap::new();
        for exercise in &exercises {
            if !exercise_ids.insert(exercise.id()) {
                return Err(CurriculumError::DuplicateExercise(exercise.id().clone()));
            }
            if !lesson_ids.contains(exercise.lesson_id()) {
                return Err(CurriculumError::UnknownLesson {
                    exercise: exercise.id().clone(),
                    lesson: exercise.lesson_id().clone(),
                });
            }
            if !exercise_slots
                .entry(exercise.lesson_id())
                .or_default()
                .insert(exercise.position())
            {
                return Err(CurriculumError::DuplicateExercisePosition {
                    lesson: exercise.lesson_id().clone(),
                    position: exercise.position(),
                });
            }
        }

        Ok(Self {
            topics,
            lessons,
            exercises,
        })
    }

    /// Parse and validate a JSON document in one step.
    ///
    /// # Errors
    ///
    /// See [`CurriculumDraft::from_json`] and [`CurriculumDraft::validate`].
    pub fn from_json(json: &str) -> Result<Self, CurriculumError> {
        CurriculumDraft::from_json(json)?.validate()
    }

    #[must_use]
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
