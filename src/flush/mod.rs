pub mod batch;
pub mod orchestrator;
pub mod outcome;

pub use batch::{Batch, BatchEntry};
pub use orchestrator::{Clock, FlushReport, Flusher, Routing};
pub use outcome::{FlushError, FlushOutcome};
