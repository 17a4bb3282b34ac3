use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grading::{grade, normalize_answer};
use crate::model::ids::{ExerciseId, LessonId, is_blank};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("exercise id cannot be blank")]
    BlankId,
    #[error("exercise must belong to a lesson")]
    BlankLessonId,
    #[error("exercise question cannot be empty")]
    EmptyQuestion,
    #[error("correct answer cannot be empty")]
    EmptyCorrectAnswer,
    #[error("unknown exercise type: {0}")]
    UnknownType(String),
    #[error("multiple-choice exercises need at least two options")]
    TooFewOptions,
    #[error("multiple-choice options cannot be blank")]
    BlankOption,
    #[error("correct answer does not match any option")]
    AnswerNotAnOption,
    #[error("only multiple-choice exercises carry options")]
    UnexpectedOptions,
    #[error("true/false answer must be \"true\" or \"false\"")]
    InvalidTrueFalseAnswer,
}

//
// ─── EXERCISE TYPE ────────────────────────────────────────────────────────────
//

/// Bare discriminant of [`ExerciseKind`], as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl ExerciseType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseType::MultipleChoice => "multiple-choice",
            ExerciseType::TrueFalse => "true-false",
            ExerciseType::ShortAnswer => "short-answer",
        }
    }
}

impl FromStr for ExerciseType {
    type Err = ExerciseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple-choice" => Ok(ExerciseType::MultipleChoice),
            "true-false" => Ok(ExerciseType::TrueFalse),
            "short-answer" => Ok(ExerciseType::ShortAnswer),
            other => Err(ExerciseError::UnknownType(other.to_string())),
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── EXERCISE KIND ────────────────────────────────────────────────────────────
//

/// Answer format of an exercise. Only multiple-choice carries options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ExerciseKind {
    MultipleChoice { options: Vec<String> },
    TrueFalse,
    ShortAnswer,
}

impl ExerciseKind {
    /// Rebuild a kind from its flat representation (type tag plus optional options).
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::TooFewOptions` when a multiple-choice exercise
    /// has no options, or `ExerciseError::UnexpectedOptions` when another type
    /// carries a non-empty option list.
    pub fn from_parts(
        exercise_type: ExerciseType,
        options: Option<Vec<String>>,
    ) -> Result<Self, ExerciseError> {
        match exercise_type {
            ExerciseType::MultipleChoice => Ok(ExerciseKind::MultipleChoice {
                options: options.ok_or(ExerciseError::TooFewOptions)?,
            }),
            other => {
                if options.is_some_and(|o| !o.is_empty()) {
                    return Err(ExerciseError::UnexpectedOptions);
                }
                Ok(match other {
                    ExerciseType::TrueFalse => ExerciseKind::TrueFalse,
                    _ => ExerciseKind::ShortAnswer,
                })
            }
        }
    }

    #[must_use]
    pub fn exercise_type(&self) -> ExerciseType {
        match self {
            ExerciseKind::MultipleChoice { .. } => ExerciseType::MultipleChoice,
            ExerciseKind::TrueFalse => ExerciseType::TrueFalse,
            ExerciseKind::ShortAnswer => ExerciseType::ShortAnswer,
        }
    }

    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        match self {
            ExerciseKind::MultipleChoice { options } => Some(options),
            _ => None,
        }
    }

    fn check_answer(&self, correct_answer: &str) -> Result<(), ExerciseError> {
        match self {
            ExerciseKind::MultipleChoice { options } => {
                if options.len() < 2 {
                    return Err(ExerciseError::TooFewOptions);
                }
                if options.iter().any(|o| normalize_answer(o).is_empty()) {
                    return Err(ExerciseError::BlankOption);
                }
                if !options.iter().any(|o| grade(o, correct_answer)) {
                    return Err(ExerciseError::AnswerNotAnOption);
                }
                Ok(())
            }
            ExerciseKind::TrueFalse => match normalize_answer(correct_answer).as_str() {
                "true" | "false" => Ok(()),
                _ => Err(ExerciseError::InvalidTrueFalseAnswer),
            },
            ExerciseKind::ShortAnswer => Ok(()),
        }
    }
}

//
// ─── EXERCISE ─────────────────────────────────────────────────────────────────
//

/// A graded question attached to a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    id: ExerciseId,
    lesson_id: LessonId,
    question: String,
    #[serde(flatten)]
    kind: ExerciseKind,
    correct_answer: String,
    explanation: String,
    #[serde(rename = "order")]
    position: u32,
}

impl Exercise {
    /// Build an exercise, checking the answer against its kind.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` when identifiers or question are blank, the
    /// correct answer normalizes to nothing, or the answer does not fit the
    /// kind (see [`ExerciseKind`]).
    pub fn new(
        id: ExerciseId,
        lesson_id: LessonId,
        question: impl Into<String>,
        kind: ExerciseKind,
        correct_answer: impl Into<String>,
        explanation: impl Into<String>,
        position: u32,
    ) -> Result<Self, ExerciseError> {
        if is_blank(id.as_str()) {
            return Err(ExerciseError::BlankId);
        }
        if is_blank(lesson_id.as_str()) {
            return Err(ExerciseError::BlankLessonId);
        }
        let question = question.into().trim().to_string();
        if question.is_empty() {
            return Err(ExerciseError::EmptyQuestion);
        }
        let correct_answer = correct_answer.into();
        if normalize_answer(&correct_answer).is_empty() {
            return Err(ExerciseError::EmptyCorrectAnswer);
        }
        kind.check_answer(&correct_answer)?;

        Ok(Self {
            id,
            lesson_id,
            question,
            kind,
            correct_answer,
            explanation: explanation.into(),
            position,
        })
    }

    #[must_use]
    pub fn id(&self) -> &ExerciseId {
        &self.id
    }

    #[must_use]
    pub fn lesson_id(&self) -> &LessonId {
        &self.lesson_id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn kind(&self) -> &ExerciseKind {
        &self.kind
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Grades a submission against this exercise's correct answer.
    #[must_use]
    pub fn is_correct(&self, submitted: &str) -> bool {
        grade(submitted, &self.correct_answer)
    }
}

/// Sorts exercises by position, falling back to id for equal positions.
pub fn sort_by_position(exercises: &mut [Exercise]) {
    exercises.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
