pub mod job;
pub mod queue;
pub mod store;

pub use job::{Job, JobStatus};
pub use queue::DispatchQueue;
pub use store::JobStore;
