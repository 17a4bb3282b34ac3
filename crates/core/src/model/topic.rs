use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{TopicId, is_blank};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopicError {
    #[error("topic id cannot be blank")]
    BlankId,
    #[error("topic title cannot be empty")]
    EmptyTitle,
    #[error("unknown subject: {0}")]
    UnknownSubject(String),
    #[error("unknown level: {0}")]
    UnknownLevel(String),
}

//
// ─── SUBJECT / LEVEL ──────────────────────────────────────────────────────────
//

/// Science subject a topic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Biology,
    Chemistry,
    Physics,
}

impl Subject {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Subject::Biology => "biology",
            Subject::Chemistry => "chemistry",
            Subject::Physics => "physics",
        }
    }
}

impl FromStr for Subject {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "biology" => Ok(Subject::Biology),
            "chemistry" => Ok(Subject::Chemistry),
            "physics" => Ok(Subject::Physics),
            other => Err(TopicError::UnknownSubject(other.to_string())),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Curriculum stage. Declaration order is the catalog order: KS3, GCSE, A-Level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "ks3")]
    Ks3,
    #[serde(rename = "gcse")]
    Gcse,
    #[serde(rename = "a-level")]
    ALevel,
}

impl Level {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Ks3 => "ks3",
            Level::Gcse => "gcse",
            Level::ALevel => "a-level",
        }
    }

    /// Position of the level in the catalog (0 = KS3).
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Level::Ks3 => 0,
            Level::Gcse => 1,
            Level::ALevel => 2,
        }
    }
}

impl FromStr for Level {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ks3" => Ok(Level::Ks3),
            "gcse" => Ok(Level::Gcse),
            "a-level" => Ok(Level::ALevel),
            other => Err(TopicError::UnknownLevel(other.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── TOPIC ────────────────────────────────────────────────────────────────────
//

/// A learning topic within a subject and level.
///
/// `lesson_count` is the advertised number of lessons and is stored as given;
/// it is not recomputed from the lessons actually present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    id: TopicId,
    title: String,
    subject: Subject,
    level: Level,
    description: String,
    lesson_count: u32,
}

impl Topic {
    /// Build a topic, trimming the title and description.
    ///
    /// # Errors
    ///
    /// Returns `TopicError::BlankId` or `TopicError::EmptyTitle`.
    pub fn new(
        id: TopicId,
        title: impl Into<String>,
        subject: Subject,
        level: Level,
        description: impl Into<String>,
        lesson_count: u32,
    ) -> Result<Self, TopicError> {
        if is_blank(id.as_str()) {
            return Err(TopicError::BlankId);
        }
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(TopicError::EmptyTitle);
        }

        Ok(Self {
            id,
            title,
            subject,
            level,
            description: description.into().trim().to_string(),
            lesson_count,
        })
    }

    #[must_use]
    pub fn id(&self) -> &TopicId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn lesson_count(&self) -> u32 {
        self.lesson_count
    }

    /// Catalog order: level, then subject name, then id.
    #[must_use]
    pub fn catalog_cmp(&self, other: &Self) -> Ordering {
        self.level
            .cmp(&other.level)
            .then_with(|| self.subject.as_str().cmp(other.subject.as_str()))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Sorts topics into catalog order in place.
pub fn sort_catalog(topics: &mut [Topic]) {
    topics.sort_by(Topic::catalog_cmp);
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
