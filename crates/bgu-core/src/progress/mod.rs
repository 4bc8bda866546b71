//! Aggregate progress bookkeeping across jobs.

mod store;
mod throttle;

pub use store::{JobProgress, ProgressStore};
pub use throttle::ProgressThrottle;
