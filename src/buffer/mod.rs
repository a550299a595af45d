pub mod batch;
pub mod error;
pub mod queue;

pub use batch::{Batch, BatchType, CollectorIdentity};
pub use error::BufferError;
pub use queue::{Enqueued, EventQueue};
