pub mod snapshot;
pub mod task;

pub use snapshot::{Cap, QueueSnapshot};
pub use task::Task;
