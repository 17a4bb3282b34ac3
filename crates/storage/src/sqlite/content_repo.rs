use tutor_core::curriculum::Curriculum;
use tutor_core::model::{
    Exercise, ExerciseId, Lesson, LessonId, Level, Subject, Topic, TopicId,
};

use super::{
    SqliteRepository,
    mapping::{db_err, map_exercise_row, map_lesson_row, map_topic_row, options_to_json},
};
use crate::repository::{ContentRepository, StorageError};

const TOPIC_COLUMNS: &str = "id, title, subject, level, description, lesson_count";
const CATALOG_ORDER: &str = "ORDER BY level_rank ASC, subject ASC, id ASC";

impl SqliteRepository {
    async fn fetch_topics(
        &self,
        filter: &str,
        arg: Option<&'static str>,
    ) -> Result<Vec<Topic>, StorageError> {
        let sql = format!("SELECT {TOPIC_COLUMNS} FROM topics {filter} {CATALOG_ORDER}");
        let mut q = sqlx::query(&sql);
        if let Some(arg) = arg {
            q = q.bind(arg);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(db_err)?;

        let mut topics = Vec::with_capacity(rows.len());
        for row in rows {
            topics.push(map_topic_row(&row)?);
        }
        Ok(topics)
    }
}

#[async_trait::async_trait]
impl ContentRepository for SqliteRepository {
    async fn load_curriculum(&self, curriculum: &Curriculum) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        for topic in curriculum.topics() {
            sqlx::query(
                r"
                INSERT INTO topics (id, title, subject, level, level_rank, description, lesson_count)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    subject = excluded.subject,
                    level = excluded.level,
                    level_rank = excluded.level_rank,
                    description = excluded.description,
                    lesson_count = excluded.lesson_count
                ",
            )
            .bind(topic.id().as_str())
            .bind(topic.title())
            .bind(topic.subject().as_str())
            .bind(topic.level().as_str())
            .bind(i64::from(topic.level().rank()))
            .bind(topic.description())
            .bind(i64::from(topic.lesson_count()))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        // Overwritten rows give up their slots first, so a reload may reorder
        // them; only rows this load keeps can still clash.
        for lesson in curriculum.lessons() {
            sqlx::query("UPDATE lessons SET position = -1 - position WHERE id = ?1")
                .bind(lesson.id().as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }
        for exercise in curriculum.exercises() {
            sqlx::query("UPDATE exercises SET position = -1 - position WHERE id = ?1")
                .bind(exercise.id().as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        for lesson in curriculum.lessons() {
            sqlx::query(
                r"
                INSERT INTO lessons (id, topic_id, title, content, position, has_exercises)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    topic_id = excluded.topic_id,
                    title = excluded.title,
                    content = excluded.content,
                    position = excluded.position,
                    has_exercises = excluded.has_exercises
                ",
            )
            .bind(lesson.id().as_str())
            .bind(lesson.topic_id().as_str())
            .bind(lesson.title())
            .bind(lesson.content())
            .bind(i64::from(lesson.position()))
            .bind(lesson.has_exercises())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        for exercise in curriculum.exercises() {
            sqlx::query(
                r"
                INSERT INTO exercises (
                    id, lesson_id, question, kind, options, correct_answer, explanation, position
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(id) DO UPDATE SET
                    lesson_id = excluded.lesson_id,
                    question = excluded.question,
                    kind = excluded.kind,
                    options = excluded.options,
                    correct_answer = excluded.correct_answer,
                    explanation = excluded.explanation,
                    position = excluded.position
                ",
            )
            .bind(exercise.id().as_str())
            .bind(exercise.lesson_id().as_str())
            .bind(exercise.question())
            .bind(exercise.kind().exercise_type().as_str())
            .bind(options_to_json(exercise.kind())?)
            .bind(exercise.correct_answer())
            .bind(exercise.explanation())
            .bind(i64::from(exercise.position()))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError> {
        self.fetch_topics("", None).await
    }

    async fn list_topics_by_subject(&self, subject: Subject) -> Result<Vec<Topic>, StorageError> {
        self.fetch_topics("WHERE subject = ?1", Some(subject.as_str()))
            .await
    }

    async fn list_topics_by_level(&self, level: Level) -> Result<Vec<Topic>, StorageError> {
        self.fetch_topics("WHERE level = ?1", Some(level.as_str()))
            .await
    }

    async fn get_topic(&self, id: &TopicId) -> Result<Option<Topic>, StorageError> {
        let sql = format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_topic_row).transpose()
    }

    async fn list_lessons_by_topic(
        &self,
        topic_id: &TopicId,
    ) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, topic_id, title, content, position, has_exercises
            FROM lessons
            WHERE topic_id = ?1
            ORDER BY position ASC, id ASC
            ",
        )
        .bind(topic_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut lessons = Vec::with_capacity(rows.len());
        for row in rows {
            lessons.push(map_lesson_row(&row)?);
        }
        Ok(lessons)
    }

    async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, topic_id, title, content, position, has_exercises
            FROM lessons
            WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_lesson_row).transpose()
    }

    async fn list_exercises_by_lesson(
        &self,
        lesson_id: &LessonId,
    ) -> Result<Vec<Exercise>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, lesson_id, question, kind, options, correct_answer, explanation, position
            FROM exercises
            WHERE lesson_id = ?1
            ORDER BY position ASC, id ASC
            ",
        )
        .bind(lesson_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut exercises = Vec::with_capacity(rows.len());
        for row in rows {
            exercises.push(map_exercise_row(&row)?);
        }
        Ok(exercises)
    }

    async fn get_exercise(&self, id: &ExerciseId) -> Result<Option<Exercise>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, lesson_id, question, kind, options, correct_answer, explanation, position
            FROM exercises
            WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_exercise_row).transpose()
    }
}
