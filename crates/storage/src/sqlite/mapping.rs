use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tutor_core::model::{
    Exercise, ExerciseAttempt, ExerciseId, ExerciseKind, ExerciseType, Lesson, LessonId,
    LessonProgress, Level, Subject, Topic, TopicId,
};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Classifies a query failure: unique-constraint violations become
/// `Conflict`, everything else is a connection-level failure.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn options_to_json(kind: &ExerciseKind) -> Result<Option<String>, StorageError> {
    kind.options()
        .map(|options| serde_json::to_string(options).map_err(ser))
        .transpose()
}

fn options_from_json(raw: Option<String>) -> Result<Option<Vec<String>>, StorageError> {
    raw.map(|s| serde_json::from_str::<Vec<String>>(&s).map_err(ser))
        .transpose()
}

pub(crate) fn map_topic_row(row: &SqliteRow) -> Result<Topic, StorageError> {
    let subject: Subject = row
        .try_get::<String, _>("subject")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let level: Level = row
        .try_get::<String, _>("level")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    Topic::new(
        TopicId::new(row.try_get::<String, _>("id").map_err(ser)?),
        row.try_get::<String, _>("title").map_err(ser)?,
        subject,
        level,
        row.try_get::<String, _>("description").map_err(ser)?,
        u32_from_i64("lesson_count", row.try_get("lesson_count").map_err(ser)?)?,
    )
    .map_err(ser)
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    Lesson::new(
        LessonId::new(row.try_get::<String, _>("id").map_err(ser)?),
        TopicId::new(row.try_get::<String, _>("topic_id").map_err(ser)?),
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("content").map_err(ser)?,
        u32_from_i64("position", row.try_get("position").map_err(ser)?)?,
        row.try_get::<bool, _>("has_exercises").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_exercise_row(row: &SqliteRow) -> Result<Exercise, StorageError> {
    let exercise_type: ExerciseType = row
        .try_get::<String, _>("kind")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let options = options_from_json(row.try_get("options").map_err(ser)?)?;
    let kind = ExerciseKind::from_parts(exercise_type, options).map_err(ser)?;

    Exercise::new(
        ExerciseId::new(row.try_get::<String, _>("id").map_err(ser)?),
        LessonId::new(row.try_get::<String, _>("lesson_id").map_err(ser)?),
        row.try_get::<String, _>("question").map_err(ser)?,
        kind,
        row.try_get::<String, _>("correct_answer").map_err(ser)?,
        row.try_get::<String, _>("explanation").map_err(ser)?,
        u32_from_i64("position", row.try_get("position").map_err(ser)?)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<LessonProgress, StorageError> {
    Ok(LessonProgress {
        topic_id: TopicId::new(row.try_get::<String, _>("topic_id").map_err(ser)?),
        lesson_id: LessonId::new(row.try_get::<String, _>("lesson_id").map_err(ser)?),
        completed: row.try_get("completed").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<ExerciseAttempt, StorageError> {
    Ok(ExerciseAttempt::new(
        ExerciseId::new(row.try_get::<String, _>("exercise_id").map_err(ser)?),
        row.try_get::<String, _>("user_answer").map_err(ser)?,
        row.try_get("is_correct").map_err(ser)?,
        row.try_get("attempted_at").map_err(ser)?,
    ))
}
