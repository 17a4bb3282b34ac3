#![forbid(unsafe_code)]

pub mod curriculum;
pub mod grading;
pub mod model;
pub mod progress;
pub mod time;

pub use time::Clock;
