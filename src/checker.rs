//! post-hoc checker (spec.md §4.6): iterates every registered rule, evaluates
//! it on each date it is relevant for, and reports the violations. Read-only
//! and pure over `PlanState` — the repair phase that acts on these violations
//! is an external collaborator (spec.md §4.7); this module only detects.

use chrono::NaiveDate;

use crate::model::duty::DutyCatalog;
use crate::model::entity::RuleId;
use crate::model::person::PersonRegistry;
use crate::model::plan::PlanState;
use crate::rules::{RuleNetwork, RuleStatus};

/// one rule that failed to hold on one date (spec.md §7's `CombinationMissing`
/// / `ForbiddenViolated` outcomes). `RuleStatus::Ok` never appears here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub date: NaiveDate,
    pub status: RuleStatus,
    pub rule: RuleId,
}

/// stateless; exists only to namespace the check, the way `RuleNetwork` and
/// `Scheduler` are namespaced structs over otherwise-pure functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Checker;

impl Checker {
    pub fn new() -> Self {
        Self
    }

    /// spec.md §4.6: for every rule, for every date in the plan's date set
    /// where the rule `is_relevant`, evaluate `check` and collect anything
    /// that isn't `RuleStatus::Ok`. Sorted by `(date, rule id)` so repeated
    /// runs over an unchanged plan produce byte-identical output (P9).
    pub fn run(
        &self,
        plan: &PlanState,
        network: &RuleNetwork,
        catalog: &DutyCatalog,
        people: &PersonRegistry,
    ) -> Vec<Violation> {
        let mut violations: Vec<Violation> = plan
            .dates()
            .flat_map(|&date| {
                network
                    .rules()
                    .filter(move |rule| rule.is_relevant(date, catalog, people))
                    .filter_map(move |rule| {
                        let status = rule.check(date, plan, catalog, people);
                        (status != RuleStatus::Ok).then_some(Violation {
                            date,
                            status,
                            rule: rule.id,
                        })
                    })
            })
            .collect();

        violations.sort_by_key(|v| (v.date, v.rule));
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::{DutyFormId, PersonId};
    use crate::model::person::{Person, PersonRegistry};
    use crate::rules::{Effect, Rule, Subject, Weight};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// scenario 5 (spec.md §8): a forbidden PersonPerson pair holding linked
    /// duties on the same day is caught as `ForbiddenViolated`.
    #[test]
    fn forbidden_pair_held_together_is_reported() {
        let a = DutyFormId::new("duty-a");
        let b = DutyFormId::new("duty-b");
        let catalog = DutyCatalog::build(
            vec![
                crate::model::duty::DutyForm {
                    id: a.clone(),
                    applicable_weekday: chrono::Weekday::Mon,
                    group: crate::model::entity::DutyGroupId::new("g"),
                    follow_up_free: false,
                    max_in_a_row: 3,
                    max_per_month: 31,
                    weight: 1.0,
                    linked_forms: vec![b.clone()],
                },
                crate::model::duty::DutyForm {
                    id: b.clone(),
                    applicable_weekday: chrono::Weekday::Mon,
                    group: crate::model::entity::DutyGroupId::new("g"),
                    follow_up_free: false,
                    max_in_a_row: 3,
                    max_per_month: 31,
                    weight: 1.0,
                    linked_forms: vec![a.clone()],
                },
            ],
            vec![crate::model::duty::DutyGroup {
                id: crate::model::entity::DutyGroupId::new("g"),
                applies_on_holidays: false,
            }],
        )
        .unwrap();

        let p1 = PersonId::new("p1");
        let p2 = PersonId::new("p2");
        let people = PersonRegistry::new(vec![Person::new("p1", 1.0), Person::new("p2", 1.0)]);

        let mut network = RuleNetwork::new();
        network.register(Rule {
            id: RuleId(1),
            weight: Weight::Must,
            effect: Effect::Forbidden,
            subject: Subject::PersonPerson(p1.clone(), p2.clone()),
        });

        let mut plan = PlanState::new();
        let date = d(2025, 9, 1);
        plan.place(date, a, p1);
        plan.place(date, b, p2);

        let violations = Checker::new().run(&plan, &network, &catalog, &people);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].status, RuleStatus::ForbiddenViolated);
    }

    /// scenario 3 (spec.md §8): a MUST-COMBINATION pair held by the same
    /// person on both legs is reported OK, i.e. produces no violation.
    #[test]
    fn satisfied_combination_is_not_reported() {
        let f = DutyFormId::new("friday");
        let s = DutyFormId::new("sunday");
        let catalog = DutyCatalog::build(
            vec![
                crate::model::duty::DutyForm {
                    id: f.clone(),
                    applicable_weekday: chrono::Weekday::Fri,
                    group: crate::model::entity::DutyGroupId::new("g"),
                    follow_up_free: false,
                    max_in_a_row: 3,
                    max_per_month: 31,
                    weight: 1.0,
                    linked_forms: vec![],
                },
                crate::model::duty::DutyForm {
                    id: s.clone(),
                    applicable_weekday: chrono::Weekday::Sun,
                    group: crate::model::entity::DutyGroupId::new("g"),
                    follow_up_free: false,
                    max_in_a_row: 3,
                    max_per_month: 31,
                    weight: 1.0,
                    linked_forms: vec![],
                },
            ],
            vec![crate::model::duty::DutyGroup {
                id: crate::model::entity::DutyGroupId::new("g"),
                applies_on_holidays: false,
            }],
        )
        .unwrap();

        let people = PersonRegistry::new(vec![Person::new("p1", 1.0)]);
        let p1 = PersonId::new("p1");

        let mut network = RuleNetwork::new();
        network.register(Rule {
            id: RuleId(1),
            weight: Weight::Must,
            effect: Effect::Combination,
            subject: Subject::DutyDuty(f.clone(), s.clone()),
        });

        let mut plan = PlanState::new();
        plan.place(d(2025, 9, 5), f, p1.clone()); // Friday
        plan.place(d(2025, 9, 7), s, p1); // Sunday

        let violations = Checker::new().run(&plan, &network, &catalog, &people);
        assert!(violations.is_empty());
    }

    /// missing leg of a MUST-COMBINATION rule is reported as `CombinationMissing`
    #[test]
    fn missing_combination_leg_is_reported() {
        let f = DutyFormId::new("friday");
        let s = DutyFormId::new("sunday");
        let catalog = DutyCatalog::build(
            vec![
                crate::model::duty::DutyForm {
                    id: f.clone(),
                    applicable_weekday: chrono::Weekday::Fri,
                    group: crate::model::entity::DutyGroupId::new("g"),
                    follow_up_free: false,
                    max_in_a_row: 3,
                    max_per_month: 31,
                    weight: 1.0,
                    linked_forms: vec![],
                },
                crate::model::duty::DutyForm {
                    id: s.clone(),
                    applicable_weekday: chrono::Weekday::Sun,
                    group: crate::model::entity::DutyGroupId::new("g"),
                    follow_up_free: false,
                    max_in_a_row: 3,
                    max_per_month: 31,
                    weight: 1.0,
                    linked_forms: vec![],
                },
            ],
            vec![crate::model::duty::DutyGroup {
                id: crate::model::entity::DutyGroupId::new("g"),
                applies_on_holidays: false,
            }],
        )
        .unwrap();

        let people = PersonRegistry::new(vec![Person::new("p1", 1.0)]);
        let p1 = PersonId::new("p1");

        let mut network = RuleNetwork::new();
        network.register(Rule {
            id: RuleId(1),
            weight: Weight::Must,
            effect: Effect::Combination,
            subject: Subject::DutyDuty(f.clone(), s),
        });

        let mut plan = PlanState::new();
        plan.place(d(2025, 9, 5), f, p1); // Friday only, Sunday never placed

        let violations = Checker::new().run(&plan, &network, &catalog, &people);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].status, RuleStatus::CombinationMissing);
    }

    /// P9: running the checker twice over an unchanged plan is idempotent
    #[test]
    fn idempotent_across_repeated_runs() {
        let catalog = DutyCatalog::build(vec![], vec![]).unwrap();
        let people = PersonRegistry::new(vec![]);
        let network = RuleNetwork::new();
        let plan = PlanState::new();

        let checker = Checker::new();
        assert_eq!(
            checker.run(&plan, &network, &catalog, &people),
            checker.run(&plan, &network, &catalog, &people)
        );
    }
}
