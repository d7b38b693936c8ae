//! Library to assign people to duty slots across a calendar horizon under a
//! rich, priority-ordered, constraint-driven assignment engine.
//!
//! for an example of how to wire a config into a planning run, see main.rs

pub mod calendar;
pub mod candidates;
pub mod checker;
pub mod config;
pub mod csv;
pub mod error;
pub mod model;
pub mod queue;
pub mod rules;
pub mod scheduler;

pub use checker::{Checker, Violation};
pub use error::{Result, RosterError};
pub use rules::{Rule, RuleNetwork, RuleStatus};
pub use scheduler::{Scheduler, SchedulerOutcome};
