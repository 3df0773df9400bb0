mod errors;
pub mod models;
pub mod repository;
pub mod tracker;

pub use errors::{ProgressError, StoreError};
pub use models::{ProgressKey, StudentProgress};
pub use repository::{InMemoryProgressStore, ProgressStore};
pub use tracker::ProgressTracker;
