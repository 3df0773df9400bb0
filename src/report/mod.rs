pub mod models;
pub mod reporter;
pub mod sink;

pub use models::{GameMetrics, GameResult};
pub use reporter::{ReportFailure, ResultReporter};
pub use sink::{InMemoryResultSink, ReportError, ResultSink};
