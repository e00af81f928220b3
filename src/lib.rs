pub mod aggregate;
pub mod config;
pub mod consistency;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod report;
pub mod sentiment;
pub mod store;
pub mod summary;

pub use engine::{parse_day, DailyAnalyzer};
pub use error::{AnalysisError, AnalysisResult, ErrorReport};
pub use models::{DailyReport, FeedbackRecord, MealEntry, MealType};
pub use store::FeedbackStore;
