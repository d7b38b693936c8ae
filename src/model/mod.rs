//! domain entities: people, duty forms, wishes, and the produced plan

pub mod duty;
pub mod entity;
pub mod person;
pub mod plan;
pub mod wish;

pub use duty::{DutyCatalog, DutyForm, DutyGroup};
pub use entity::{DutyFormId, DutyGroupId, EntityRef, PersonId, RotationTemplateId, RuleId};
pub use person::{Person, PersonRegistry, RotationConcrete};
pub use plan::PlanState;
pub use wish::{FreeWish, Wish, WishRegistry};
