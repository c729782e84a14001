//! Emitter errors

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// Invalid plan structure
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}
