//! Error types (A2, ambient). Hand-rolled `Display`/`Error` impls, matching
//! the teacher's own `ParseError` rather than pulling in `thiserror`.

use std::fmt;

/// A malformed knowledge base, query, or CSV payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputError {
    pub message: String,
    pub position: Option<usize>,
}

impl InputError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), position: None }
    }

    pub fn at(message: impl Into<String>, position: usize) -> Self {
        Self { message: message.into(), position: Some(position) }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{} (at position {})", self.message, pos),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for InputError {}

/// The world set implied by a signature and domain would exceed the
/// configured capacity (§4.3, edge case).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityError {
    pub interpretable_count: usize,
    pub limit: usize,
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "signature induces {} interpretables (2^{} worlds), exceeding the capacity limit of {}",
            self.interpretable_count, self.interpretable_count, self.limit
        )
    }
}

impl std::error::Error for CapacityError {}

/// Top-level error for the library's external interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    Input(InputError),
    Capacity(CapacityError),
    /// The knowledge base is inconsistent: no tolerance pair exists.
    Inconsistent,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Input(e) => write!(f, "{e}"),
            CoreError::Capacity(e) => write!(f, "{e}"),
            CoreError::Inconsistent => write!(f, "knowledge base is inconsistent: no tolerance pair exists"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<InputError> for CoreError {
    fn from(e: InputError) -> Self {
        CoreError::Input(e)
    }
}

impl From<CapacityError> for CoreError {
    fn from(e: CapacityError) -> Self {
        CoreError::Capacity(e)
    }
}
