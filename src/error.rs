//! setup-time error taxonomy
//!
//! planning-time outcomes (unfilled slots, missing combinations, forbidden
//! violations) are not errors — they are values produced by the scheduler
//! and the checker. this type only covers the fatal case: malformed input
//! discovered while assembling the rule network or the duty catalog.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("rule {rule} references unknown entity {entity}")]
    UnknownEntity { rule: String, entity: String },

    #[error("duty form {duty} has invalid max-in-a-row {value} (must be >= 1)")]
    InvalidMaxInARow { duty: String, value: u32 },

    #[error("duty form {duty} references unknown group {group}")]
    UnknownGroup { duty: String, group: String },

    #[error("person {person} has invalid work-capacity {value} (must be in (0, 1])")]
    InvalidWorkCapacity { person: String, value: f64 },

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RosterError>;
