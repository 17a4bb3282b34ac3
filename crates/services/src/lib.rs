#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod exercise_service;
pub mod progress_service;

pub use tutor_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::{CatalogService, LoadSummary};
pub use error::{AppServicesError, ServiceError};
pub use exercise_service::{AnswerFeedback, ExerciseService};
pub use progress_service::ProgressService;
