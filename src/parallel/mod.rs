pub mod batch;
pub mod pool;

pub use batch::{batch_ranges, trial_batches, TrialBatch, TRIAL_STREAMS};
pub use pool::{BuiltPool, WorkerPool};
