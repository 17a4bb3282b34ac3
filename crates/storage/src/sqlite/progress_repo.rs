use chrono::{DateTime, Utc};
use tutor_core::model::{ExerciseAttempt, ExerciseId, LessonId, LessonProgress, TopicId};

use super::{
    SqliteRepository,
    mapping::{db_err, map_attempt_row, map_progress_row},
};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn record_attempt(&self, attempt: &ExerciseAttempt) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO exercise_attempts (exercise_id, user_answer, is_correct, attempted_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(attempt.exercise_id.as_str())
        .bind(attempt.user_answer.as_str())
        .bind(attempt.is_correct)
        .bind(attempt.attempted_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn mark_lesson_complete(
        &self,
        lesson_id: &LessonId,
        topic_id: &TopicId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO lesson_progress (topic_id, lesson_id, completed, completed_at)
                VALUES (?1, ?2, 1, ?3)
                ON CONFLICT(topic_id, lesson_id) DO UPDATE SET
                    completed = 1,
                    completed_at = excluded.completed_at
            ",
        )
        .bind(topic_id.as_str())
        .bind(lesson_id.as_str())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn is_lesson_complete(&self, lesson_id: &LessonId) -> Result<bool, StorageError> {
        let row = sqlx::query(
            r"
                SELECT 1 FROM lesson_progress
                WHERE lesson_id = ?1 AND completed = 1
                LIMIT 1
            ",
        )
        .bind(lesson_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.is_some())
    }

    async fn all_progress(&self) -> Result<Vec<LessonProgress>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT topic_id, lesson_id, completed, completed_at
                FROM lesson_progress
                ORDER BY topic_id ASC, lesson_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }

    async fn attempts(&self) -> Result<Vec<ExerciseAttempt>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT exercise_id, user_answer, is_correct, attempted_at
                FROM exercise_attempts
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&row)?);
        }
        Ok(out)
    }

    async fn attempts_for_exercises(
        &self,
        ids: &[ExerciseId],
    ) -> Result<Vec<ExerciseAttempt>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            r"
            SELECT exercise_id, user_answer, is_correct, attempted_at
            FROM exercise_attempts
            WHERE exercise_id IN (
            ",
        );
        for i in 0..ids.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 1).to_string());
        }
        sql.push_str(")\nORDER BY id ASC\n");

        let mut q = sqlx::query(&sql);
        for id in ids {
            q = q.bind(id.as_str());
        }

        let rows = q.fetch_all(&self.pool).await.map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&row)?);
        }
        Ok(out)
    }
}
