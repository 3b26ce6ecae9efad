//! Infrastructure error types for velac-util.

use thiserror::Error;

/// Error type for symbol interning operations.
#[derive(Debug, Error)]
pub enum InternError {
    /// Symbol index not present in the interner.
    #[error("symbol not found: index {index}")]
    NotFound { index: u32 },
}
