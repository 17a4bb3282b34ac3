use std::collections::HashSet;

use serde::Serialize;

use crate::model::{Exercise, ExerciseAttempt, ExerciseId, Lesson, LessonId, LessonProgress, TopicId};

/// Progress summary for one topic, recomputed from store state on every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProgressSummary {
    pub topic_id: TopicId,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    /// Number of attempts (not distinct exercises) on the topic's exercises.
    pub exercises_completed: usize,
    pub total_exercises: usize,
    /// Percentage of correct attempts; `None` when there are no attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
}

/// Aggregate a topic's progress.
///
/// - `lessons` are the topic's lessons; `exercises` may contain exercises of
///   other lessons, which are ignored.
/// - Completed lessons are counted from progress records keyed to `topic_id`.
/// - Every attempt on one of the topic's exercises counts, retries included.
#[must_use]
pub fn summarize_topic(
    topic_id: &TopicId,
    lessons: &[Lesson],
    exercises: &[Exercise],
    progress: &[LessonProgress],
    attempts: &[ExerciseAttempt],
) -> TopicProgressSummary {
    let lesson_ids: HashSet<&LessonId> = lessons.iter().map(Lesson::id).collect();
    let exercise_ids: HashSet<&ExerciseId> = exercises
        .iter()
        .filter(|e| lesson_ids.contains(e.lesson_id()))
        .map(Exercise::id)
        .collect();

    let completed_lessons = progress
        .iter()
        .filter(|p| &p.topic_id == topic_id && p.completed)
        .count();

    let (attempted, correct) = attempts
        .iter()
        .filter(|a| exercise_ids.contains(&a.exercise_id))
        .fold((0usize, 0usize), |(n, ok), a| {
            (n + 1, ok + usize::from(a.is_correct))
        });

    TopicProgressSummary {
        topic_id: topic_id.clone(),
        completed_lessons,
        total_lessons: lessons.len(),
        exercises_completed: attempted,
        total_exercises: exercise_ids.len(),
        average_score: percentage(correct, attempted),
    }
}

/// `part / whole * 100`, or `None` when `whole` is zero.
#[must_use]
pub fn percentage(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        return None;
    }
    // Counts are bounded by the attempt log length; f64 precision is ample.
    #[allow(clippy::cast_precision_loss)]
    let (part, whole) = (part as f64, whole as f64);
    Some(part * 100.0 / whole)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExerciseKind, TopicId};
    use crate::time::fixed_now;

    fn lesson(id: &str, topic: &str, position: u32) -> Lesson {
        Lesson::new(LessonId::new(id), TopicId::new(topic), id, "", position, true).unwrap()
    }

    fn exercise(id: &str, lesson: &str, position: u32) -> Exercise {
        Exercise::new(
            ExerciseId::new(id),
            LessonId::new(lesson),
            "Q?",
            ExerciseKind::ShortAnswer,
            "answer",
            "",
            position,
        )
        .unwrap()
    }

    fn attempt(exercise: &str, ok: bool) -> ExerciseAttempt {
        ExerciseAttempt::new(ExerciseId::new(exercise), "x", ok, fixed_now())
    }

    fn done(topic: &str, lesson: &str) -> LessonProgress {
        LessonProgress::completed(TopicId::new(topic), LessonId::new(lesson), fixed_now())
    }

    #[test]
    fn counts_lessons_attempts_and_score() {
        let topic = TopicId::new("1");
        let lessons = [lesson("l1", "1", 0), lesson("l2", "1", 1), lesson("l3", "1", 2)];
        let exercises = [
            exercise("e1", "l1", 0),
            exercise("e2", "l1", 1),
            exercise("e4", "l2", 0),
            exercise("e6", "l6", 0),
        ];
        let progress = [done("1", "l1"), done("1", "l2"), done("6", "l6")];
        let attempts = [
            attempt("e1", true),
            attempt("e1", false),
            attempt("e2", true),
            attempt("e4", true),
            attempt("e4", false),
            attempt("e6", true),
        ];

        let summary = summarize_topic(&topic, &lessons, &exercises, &progress, &attempts);
        assert_eq!(summary.completed_lessons, 2);
        assert_eq!(summary.total_lessons, 3);
        assert_eq!(summary.exercises_completed, 5);
        assert_eq!(summary.total_exercises, 3);
        let score = summary.average_score.unwrap();
        assert!((score - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_attempts_leaves_score_absent() {
        let topic = TopicId::new("6");
        let lessons = [lesson("l6", "6", 0)];
        let exercises = [exercise("e6", "l6", 0)];

        let summary = summarize_topic(&topic, &lessons, &exercises, &[], &[]);
        assert_eq!(summary.exercises_completed, 0);
        assert_eq!(summary.average_score, None);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("averageScore").is_none());
        assert_eq!(json["totalExercises"], 1);
    }

    #[test]
    fn unknown_topic_yields_zero_summary() {
        let summary = summarize_topic(&TopicId::new("nope"), &[], &[], &[], &[]);
        assert_eq!(summary.total_lessons, 0);
        assert_eq!(summary.completed_lessons, 0);
        assert_eq!(summary.average_score, None);
    }

    #[test]
    fn percentage_guards_zero() {
        assert_eq!(percentage(0, 0), None);
        assert_eq!(percentage(1, 4), Some(25.0));
    }
}
