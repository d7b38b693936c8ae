//! the rule: a tagged variant replacing the source's rule-type hierarchy
//! (Design Note "Replacing inheritance hierarchy of rules" — dispatch on
//! `is_relevant`/`check` via exhaustive match instead of OOP dispatch)

pub mod network;

pub use network::RuleNetwork;

use chrono::{Datelike, Duration, NaiveDate};

use crate::model::duty::DutyCatalog;
use crate::model::entity::{DutyFormId, EntityRef, PersonId, RotationTemplateId, RuleId};
use crate::model::person::PersonRegistry;
use crate::model::plan::PlanState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Must,
    Should,
    May,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Combination,
    Forbidden,
}

/// the participants of a rule, keyed by subtype (spec.md §3's `subtype`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    DutyDuty(DutyFormId, DutyFormId),
    PersonPerson(PersonId, PersonId),
    PersonDuty(PersonId, DutyFormId),
    /// rotation <-> duty
    Combination(RotationTemplateId, DutyFormId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub id: RuleId,
    pub weight: Weight,
    pub effect: Effect,
    pub subject: Subject,
}

/// outcome of evaluating one rule on one date (spec.md §4.6)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleStatus {
    Ok,
    CombinationMissing,
    ForbiddenViolated,
}

impl Rule {
    /// the two entities this rule connects, for rule-network indexing
    pub fn participants(&self) -> (EntityRef, EntityRef) {
        match &self.subject {
            Subject::DutyDuty(a, b) => (EntityRef::Duty(a.clone()), EntityRef::Duty(b.clone())),
            Subject::PersonPerson(a, b) => {
                (EntityRef::Person(a.clone()), EntityRef::Person(b.clone()))
            }
            Subject::PersonDuty(p, f) => (EntityRef::Person(p.clone()), EntityRef::Duty(f.clone())),
            Subject::Combination(r, f) => {
                (EntityRef::Rotation(r.clone()), EntityRef::Duty(f.clone()))
            }
        }
    }

    /// for a `DutyDuty` rule, the other duty form and the linked day implied
    /// by placing `from` on `date` (spec.md §4.5 step 2, §GLOSSARY "linked
    /// day"): the first weekday match for the other form, searched forward
    /// in `[d, d+7)` if `from` is the rule's first participant, else
    /// backward in `[d-7, d]`.
    pub fn linked_duty_day(
        &self,
        date: NaiveDate,
        from: &DutyFormId,
        catalog: &DutyCatalog,
    ) -> Option<(DutyFormId, NaiveDate)> {
        let Subject::DutyDuty(f1, f2) = &self.subject else {
            return None;
        };
        let (other, forward) = if from == f1 {
            (f2, true)
        } else if from == f2 {
            (f1, false)
        } else {
            return None;
        };
        let weekday = catalog.duty(other)?.applicable_weekday;
        let linked_date = (0..7)
            .map(|i| {
                if forward {
                    date + Duration::days(i)
                } else {
                    date - Duration::days(i)
                }
            })
            .find(|d| d.weekday() == weekday)?;
        Some((other.clone(), linked_date))
    }

    /// is this rule checkable on `date` at all? (spec.md §4.6: "for each
    /// date in plan's date set where rule.is-relevant(date) is true")
    pub fn is_relevant(&self, date: NaiveDate, catalog: &DutyCatalog, people: &PersonRegistry) -> bool {
        match &self.subject {
            Subject::DutyDuty(f1, _) => catalog
                .duty(f1)
                .is_some_and(|d| d.applicable_weekday == date.weekday()),
            Subject::PersonPerson(..) | Subject::PersonDuty(..) => true,
            Subject::Combination(template, _) => people
                .iter()
                .any(|p| p.active_rotation(date) == Some(template)),
        }
    }

    /// spec.md §4.6: DutyDuty linkage test, person-pair concurrency test,
    /// direct person-duty holding test, or rotation-duty holding test,
    /// judged against the rule's effect.
    pub fn check(
        &self,
        date: NaiveDate,
        plan: &PlanState,
        catalog: &DutyCatalog,
        people: &PersonRegistry,
    ) -> RuleStatus {
        match &self.subject {
            Subject::DutyDuty(f1, f2) => {
                let Some((_, linked_date)) = self.linked_duty_day(date, f1, catalog) else {
                    return RuleStatus::Ok;
                };
                let linked = matches!(
                    (plan.get(date, f1), plan.get(linked_date, f2)),
                    (Some(p1), Some(p2)) if p1 == p2
                );
                self.judge(linked)
            }
            Subject::PersonPerson(p1, p2) => {
                let linked = plan.duties_on(date).any(|(duty_a, holder_a)| {
                    holder_a == p1
                        && catalog.duty(duty_a).is_some_and(|form| {
                            form.linked_forms
                                .iter()
                                .any(|duty_b| plan.get(date, duty_b) == Some(p2))
                        })
                });
                self.judge(linked)
            }
            Subject::PersonDuty(p, f) => self.judge(plan.get(date, f) == Some(p)),
            Subject::Combination(template, f) => {
                let satisfied = people
                    .iter()
                    .filter(|p| p.active_rotation(date) == Some(template))
                    .all(|p| plan.get(date, f) == Some(&p.id));
                self.judge(satisfied)
            }
        }
    }

    fn judge(&self, condition_holds: bool) -> RuleStatus {
        match (self.effect, condition_holds) {
            (Effect::Combination, true) => RuleStatus::Ok,
            (Effect::Combination, false) => RuleStatus::CombinationMissing,
            (Effect::Forbidden, true) => RuleStatus::ForbiddenViolated,
            (Effect::Forbidden, false) => RuleStatus::Ok,
        }
    }
}
