use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("Invalid buffer capacity: {capacity}")]
    InvalidCapacity { capacity: usize },
}
