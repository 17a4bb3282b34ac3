mod attempt;
pub mod exercise;
mod ids;
pub mod lesson;
pub mod topic;

pub use ids::{ExerciseId, LessonId, ParseIdError, TopicId};

pub use attempt::{ExerciseAttempt, LessonProgress};
pub use exercise::{Exercise, ExerciseError, ExerciseKind, ExerciseType};
pub use lesson::{Lesson, LessonError};
pub use topic::{Level, Subject, Topic, TopicError};
