use thiserror::Error;

/// Error type for opaque-id operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HashidError {
    /// Input is not a hash produced by this codec. Deliberately carries no
    /// decoded value: attacker-supplied garbage must never resolve to an id.
    #[error("Invalid hash")]
    InvalidHash,

    #[error("Invalid codec configuration: {0}")]
    InvalidConfiguration(String),
}
