//! the six concrete scenarios from spec.md §8, as integration tests against
//! the public library surface.

use chrono::{NaiveDate, Weekday};

use duty_roster::calendar::HolidayCalendar;
use duty_roster::model::duty::{DutyCatalog, DutyForm, DutyGroup};
use duty_roster::model::entity::{DutyFormId, DutyGroupId, PersonId, RuleId};
use duty_roster::model::person::{Person, PersonRegistry};
use duty_roster::model::plan::PlanState;
use duty_roster::model::wish::WishRegistry;
use duty_roster::rules::{Effect, Rule, RuleNetwork, Subject, Weight};
use duty_roster::{Checker, Scheduler};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn group(id: &str, applies_on_holidays: bool) -> DutyGroup {
    DutyGroup {
        id: DutyGroupId::new(id),
        applies_on_holidays,
    }
}

fn duty(id: &str, weekday: Weekday, follow_up_free: bool, max_in_a_row: u32) -> DutyForm {
    DutyForm {
        id: DutyFormId::new(id),
        applicable_weekday: weekday,
        group: DutyGroupId::new("g"),
        follow_up_free,
        max_in_a_row,
        max_per_month: 31,
        weight: 1.0,
        linked_forms: vec![],
    }
}

/// scenario 1: 1 person, 1 Monday duty, 1 Monday in horizon
#[test]
fn single_person_single_slot() {
    let catalog = DutyCatalog::build(vec![duty("monday", Weekday::Mon, false, 3)], vec![group("g", false)]).unwrap();
    let people = PersonRegistry::new(vec![Person::new("alice", 1.0)]);
    let network = RuleNetwork::new();
    let mut wishes = WishRegistry::new();
    let mut plan = PlanState::new();
    let calendar = HolidayCalendar::default();

    let outcome = Scheduler::default().run(
        &people,
        &catalog,
        &network,
        &mut wishes,
        &mut plan,
        d(2025, 9, 1), // Monday
        1,
        &calendar,
    );

    assert!(outcome.unfilled.is_empty());
    assert_eq!(plan.get(d(2025, 9, 1), &DutyFormId::new("monday")), Some(&PersonId::new("alice")));

    let violations = Checker::new().run(&plan, &network, &catalog, &people);
    assert!(violations.is_empty());
}

/// scenario 2: a follow-up-free Friday night duty cascades P1 off Saturday
#[test]
fn follow_up_free_cascade() {
    let catalog = DutyCatalog::build(
        vec![
            duty("friday-night", Weekday::Fri, true, 3),
            duty("saturday-day", Weekday::Sat, false, 3),
        ],
        vec![group("g", false)],
    )
    .unwrap();
    let people = PersonRegistry::new(vec![Person::new("p1", 1.0), Person::new("p2", 1.0)]);
    let network = RuleNetwork::new();
    let mut wishes = WishRegistry::new();
    wishes.add_wish(PersonId::new("p1"), d(2025, 9, 5), DutyFormId::new("friday-night"));
    let mut plan = PlanState::new();
    let calendar = HolidayCalendar::default();

    let outcome = Scheduler::default().run(
        &people,
        &catalog,
        &network,
        &mut wishes,
        &mut plan,
        d(2025, 9, 5), // Friday
        2,             // Friday + Saturday
        &calendar,
    );

    assert!(outcome.unfilled.is_empty());
    assert_eq!(
        plan.get(d(2025, 9, 5), &DutyFormId::new("friday-night")),
        Some(&PersonId::new("p1"))
    );
    assert_ne!(
        plan.get(d(2025, 9, 6), &DutyFormId::new("saturday-day")),
        Some(&PersonId::new("p1"))
    );
    assert_eq!(
        plan.get(d(2025, 9, 6), &DutyFormId::new("saturday-day")),
        Some(&PersonId::new("p2"))
    );
}

/// scenario 3: MUST-COMBINATION(F, S) forces the same person on both
#[test]
fn mandatory_combination_places_same_person_on_both_legs() {
    let catalog = DutyCatalog::build(
        vec![duty("friday", Weekday::Fri, false, 3), duty("sunday", Weekday::Sun, false, 3)],
        vec![group("g", false)],
    )
    .unwrap();
    let people = PersonRegistry::new(vec![Person::new("p1", 1.0), Person::new("p2", 1.0)]);
    let mut network = RuleNetwork::new();
    network.register(Rule {
        id: RuleId(1),
        weight: Weight::Must,
        effect: Effect::Combination,
        subject: Subject::DutyDuty(DutyFormId::new("friday"), DutyFormId::new("sunday")),
    });
    let mut wishes = WishRegistry::new();
    let mut plan = PlanState::new();
    let calendar = HolidayCalendar::default();

    let outcome = Scheduler::default().run(
        &people,
        &catalog,
        &network,
        &mut wishes,
        &mut plan,
        d(2025, 9, 5), // Friday
        3,             // through Sunday
        &calendar,
    );

    assert!(outcome.unfilled.is_empty());
    let friday_holder = plan.get(d(2025, 9, 5), &DutyFormId::new("friday")).unwrap();
    let sunday_holder = plan.get(d(2025, 9, 7), &DutyFormId::new("sunday")).unwrap();
    assert_eq!(friday_holder, sunday_holder);

    let violations = Checker::new().run(&plan, &network, &catalog, &people);
    assert!(violations.is_empty());
}

/// scenario 4: in-a-row limit of 2 leaves the third day unfilled
#[test]
fn in_a_row_limit_leaves_third_day_unfilled() {
    // one duty form can only apply to a single weekday, so model three
    // consecutive days of the same duty form via a seeded plan and check
    // the third day is ineligible rather than via three weekday variants.
    let catalog = DutyCatalog::build(vec![duty("d", Weekday::Mon, false, 2)], vec![group("g", false)]).unwrap();
    let people = PersonRegistry::new(vec![Person::new("alice", 1.0)]);
    let network = RuleNetwork::new();
    let wishes = WishRegistry::new();
    let mut plan = PlanState::new();
    plan.place(d(2025, 9, 1), DutyFormId::new("d"), PersonId::new("alice"));
    plan.place(d(2025, 9, 2), DutyFormId::new("d"), PersonId::new("alice"));

    assert!(!duty_roster::candidates::static_eligible(
        d(2025, 9, 3),
        people.get(&PersonId::new("alice")).unwrap(),
        &DutyFormId::new("d"),
        &catalog,
        &plan,
        &wishes,
        &network,
    ));
}

/// scenario 5: MUST-FORBIDDEN(P1, P2) must never co-occur on linked duties
#[test]
fn forbidden_pair_never_co_placed() {
    let a = DutyFormId::new("duty-a");
    let b = DutyFormId::new("duty-b");
    let catalog = DutyCatalog::build(
        vec![
            DutyForm {
                linked_forms: vec![b.clone()],
                ..duty("duty-a", Weekday::Mon, false, 3)
            },
            DutyForm {
                linked_forms: vec![a.clone()],
                ..duty("duty-b", Weekday::Mon, false, 3)
            },
        ],
        vec![group("g", false)],
    )
    .unwrap();
    let people = PersonRegistry::new(vec![Person::new("p1", 1.0), Person::new("p2", 1.0), Person::new("p3", 1.0)]);
    let mut network = RuleNetwork::new();
    network.register(Rule {
        id: RuleId(1),
        weight: Weight::Must,
        effect: Effect::Forbidden,
        subject: Subject::PersonPerson(PersonId::new("p1"), PersonId::new("p2")),
    });
    let mut wishes = WishRegistry::new();
    let mut plan = PlanState::new();
    let calendar = HolidayCalendar::default();

    Scheduler::default().run(
        &people,
        &catalog,
        &network,
        &mut wishes,
        &mut plan,
        d(2025, 9, 1), // Monday
        1,
        &calendar,
    );

    let violations = Checker::new().run(&plan, &network, &catalog, &people);
    assert!(violations.iter().all(|v| v.status != duty_roster::RuleStatus::ForbiddenViolated));
}

/// scenario 6: among equal-fulfilled wishers, more submitted wishes wins
#[test]
fn wish_tie_break_prefers_more_submitted_requests() {
    let catalog = DutyCatalog::build(vec![duty("duty", Weekday::Mon, false, 3)], vec![group("g", false)]).unwrap();
    let people = PersonRegistry::new(vec![Person::new("p1", 1.0), Person::new("p2", 1.0)]);
    let network = RuleNetwork::new();
    let mut wishes = WishRegistry::new();

    // p1 submitted 5 wishes total (this slot + 4 others on later dates it
    // isn't eligible for anymore, just to run up the counter), p2 submitted 1
    for day in 2..6 {
        wishes.add_wish(PersonId::new("p1"), d(2025, 9, day), DutyFormId::new("duty"));
    }
    wishes.add_wish(PersonId::new("p1"), d(2025, 9, 1), DutyFormId::new("duty"));
    wishes.add_wish(PersonId::new("p2"), d(2025, 9, 1), DutyFormId::new("duty"));

    let mut plan = PlanState::new();
    let calendar = HolidayCalendar::default();

    Scheduler::default().run(
        &people,
        &catalog,
        &network,
        &mut wishes,
        &mut plan,
        d(2025, 9, 1), // Monday
        1,
        &calendar,
    );

    assert_eq!(plan.get(d(2025, 9, 1), &DutyFormId::new("duty")), Some(&PersonId::new("p1")));
}
