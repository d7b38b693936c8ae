//! static eligibility filter and the per-day planning map it feeds
//! (spec.md §4.2-4.3)

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};

use crate::calendar::{HolidayCalendar, horizon};
use crate::model::duty::DutyCatalog;
use crate::model::entity::{DutyFormId, EntityRef, PersonId};
use crate::model::person::{Person, PersonRegistry};
use crate::model::plan::PlanState;
use crate::model::wish::WishRegistry;
use crate::rules::{Effect, RuleNetwork, Weight};

/// spec.md §4.2: true iff all six static-eligibility conditions hold.
/// dynamic caps (I7) are **not** checked here — they apply at selection
/// time (§4.5.1).
pub fn static_eligible(
    date: NaiveDate,
    person: &Person,
    duty: &DutyFormId,
    catalog: &DutyCatalog,
    plan: &PlanState,
    wishes: &WishRegistry,
    network: &RuleNetwork,
) -> bool {
    let Some(duty_form) = catalog.duty(duty) else {
        return false;
    };

    // 1. not absent, duty-fit
    if person.is_absent(date) || !person.duty_fit {
        return false;
    }
    // 2. no free-wish
    if wishes.has_free_wish(&person.id, date) {
        return false;
    }
    // 3. no MUST-FORBIDDEN PersonDuty rule
    if network.exists(
        &EntityRef::Person(person.id.clone()),
        &EntityRef::Duty(duty.clone()),
        Weight::Must,
        Effect::Forbidden,
    ) {
        return false;
    }
    // 4. did not hold a follow-up-free duty yesterday
    if plan.held_follow_up_free(date - Duration::days(1), &person.id, catalog) {
        return false;
    }
    // 5. not at the in-a-row limit for this duty form
    if plan.run_before(date, duty, &person.id) >= duty_form.max_in_a_row {
        return false;
    }
    // 6. if already holding a duty today, it must be MUST-COMBINATION with this one
    let held_today = plan.duties_held_by(date, &person.id);
    if !held_today.is_empty()
        && !held_today.iter().any(|g| {
            network.exists(
                &EntityRef::Duty(duty.clone()),
                &EntityRef::Duty(g.clone()),
                Weight::Must,
                Effect::Combination,
            )
        })
    {
        return false;
    }
    // 7. active rotation must not be MUST-FORBIDDEN against this duty
    if let Some(rotation) = person.active_rotation(date)
        && network.exists(
            &EntityRef::Rotation(rotation.clone()),
            &EntityRef::Duty(duty.clone()),
            Weight::Must,
            Effect::Forbidden,
        )
    {
        return false;
    }

    true
}

/// `date -> duty-form -> (wished?, candidate-set)` (spec.md §4.3)
pub type PlanningMap = BTreeMap<NaiveDate, BTreeMap<DutyFormId, (bool, BTreeSet<PersonId>)>>;

/// builds the planning map for `[start, start+horizon_days)`. Holiday days
/// use only the SUNDAY-weekday variant of each holiday-eligible group
/// (spec.md §4.3's holiday policy); other days use the duties whose
/// weekday equals the date's weekday.
#[allow(clippy::too_many_arguments)]
pub fn build_planning_map(
    start: NaiveDate,
    horizon_days: u32,
    catalog: &DutyCatalog,
    people: &PersonRegistry,
    plan: &PlanState,
    wishes: &WishRegistry,
    network: &RuleNetwork,
    calendar: &HolidayCalendar,
) -> PlanningMap {
    let mut map = PlanningMap::new();

    for date in horizon(start, horizon_days) {
        let relevant = if calendar.is_holiday(date) {
            catalog.holiday_forms()
        } else {
            catalog.forms_for_weekday(date.weekday())
        };

        let mut day_map = BTreeMap::new();
        for duty in relevant {
            let candidates: BTreeSet<PersonId> = people
                .iter()
                .filter(|p| static_eligible(date, p, &duty, catalog, plan, wishes, network))
                .map(|p| p.id.clone())
                .collect();
            let wished = wishes.is_requested(date, &duty);
            day_map.insert(duty, (wished, candidates));
        }
        if !day_map.is_empty() {
            map.insert(date, day_map);
        }
    }

    map
}
