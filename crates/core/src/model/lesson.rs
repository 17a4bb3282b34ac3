use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{LessonId, TopicId, is_blank};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson id cannot be blank")]
    BlankId,
    #[error("lesson must belong to a topic")]
    BlankTopicId,
    #[error("lesson title cannot be empty")]
    EmptyTitle,
}

/// Educational content for a topic.
///
/// `content` is rich text (HTML in practice) and is kept verbatim.
/// `position` orders lessons within their topic and is serialized as `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    id: LessonId,
    topic_id: TopicId,
    title: String,
    content: String,
    #[serde(rename = "order")]
    position: u32,
    has_exercises: bool,
}

impl Lesson {
    /// # Errors
    ///
    /// Returns `LessonError` if an identifier is blank or the title is empty.
    pub fn new(
        id: LessonId,
        topic_id: TopicId,
        title: impl Into<String>,
        content: impl Into<String>,
        position: u32,
        has_exercises: bool,
    ) -> Result<Self, LessonError> {
        if is_blank(id.as_str()) {
            return Err(LessonError::BlankId);
        }
        if is_blank(topic_id.as_str()) {
            return Err(LessonError::BlankTopicId);
        }
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle);
        }

        Ok(Self {
            id,
            topic_id,
            title,
            content: content.into(),
            position,
            has_exercises,
        })
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn topic_id(&self) -> &TopicId {
        &self.topic_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    #[must_use]
    pub fn has_exercises(&self) -> bool {
        self.has_exercises
    }
}

/// Sorts lessons by position, falling back to id for equal positions.
pub fn sort_by_position(lessons: &mut [Lesson]) {
    lessons.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(id: &str, position: u32) -> Lesson {
        Lesson::new(LessonId::new(id), TopicId::new("1"), id, "<p>body</p>", position, false)
            .unwrap()
    }

    #[test]
    fn content_is_kept_verbatim() {
        let l = Lesson::new(
            LessonId::new("l1"),
            TopicId::new("1"),
            " What are Cells? ",
            "  <h2>Intro</h2> ",
            0,
            true,
        )
        .unwrap();
        assert_eq!(l.title(), "What are Cells?");
        assert_eq!(l.content(), "  <h2>Intro</h2> ");
        assert!(l.has_exercises());
    }

    #[test]
    fn rejects_missing_parent() {
        let err = Lesson::new(LessonId::new("l1"), TopicId::new(""), "T", "", 0, false)
            .unwrap_err();
        assert_eq!(err, LessonError::BlankTopicId);
    }

    #[test]
    fn sorts_by_position_regardless_of_insertion() {
        let mut lessons = vec![lesson("l3", 2), lesson("l1", 0), lesson("l2", 1)];
        sort_by_position(&mut lessons);
        let ids: Vec<&str> = lessons.iter().map(|l| l.id().as_str()).collect();
        assert_eq!(ids, ["l1", "l2", "l3"]);
    }

    #[test]
    fn position_serializes_as_order() {
        let json = serde_json::to_value(lesson("l2", 1)).unwrap();
        assert_eq!(json["order"], 1);
        assert_eq!(json["topicId"], "1");
        assert_eq!(json["hasExercises"], false);
    }
}
