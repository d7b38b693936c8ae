//! the scheduler driver (spec.md §4.5): pops queue entries, resolves single
//! vs. joint placement, selects the best candidate, and cascades removals.

use std::collections::{BTreeSet, HashSet};

use chrono::{Duration, NaiveDate};

use crate::calendar::HolidayCalendar;
use crate::candidates::build_planning_map;
use crate::model::duty::DutyCatalog;
use crate::model::entity::{DutyFormId, EntityRef, PersonId, RuleId};
use crate::model::person::PersonRegistry;
use crate::model::plan::{PlanState, month_of};
use crate::model::wish::WishRegistry;
use crate::queue::{PlanningQueue, QueueEntry};
use crate::rules::{Effect, Rule, RuleNetwork, Subject, Weight};

/// the plan mutations the driver couldn't make: every unfilled slot it left
/// behind (spec.md §7's `Unfilled` outcome)
#[derive(Debug, Clone, Default)]
pub struct SchedulerOutcome {
    pub unfilled: Vec<(NaiveDate, DutyFormId)>,
}

/// spec.md §4.5's driver. `margin` is the `select-best` headroom parameter
/// from §9: "the source allows the post-facto selection filter... to use
/// `< max - 1`... preserved as-is; an implementer may parametrize this
/// margin" — exposed here rather than hardcoded.
#[derive(Debug, Clone)]
pub struct Scheduler {
    pub margin: i64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self { margin: 1 }
    }
}

impl Scheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &self,
        people: &PersonRegistry,
        catalog: &DutyCatalog,
        network: &RuleNetwork,
        wishes: &mut WishRegistry,
        plan: &mut PlanState,
        start: NaiveDate,
        horizon_days: u32,
        calendar: &HolidayCalendar,
    ) -> SchedulerOutcome {
        let map = build_planning_map(start, horizon_days, catalog, people, plan, wishes, network, calendar);
        let mut queue = PlanningQueue::build(map, wishes, network);
        let mut outcome = SchedulerOutcome::default();

        while !queue.is_empty() {
            queue.resort();
            let Some(entry) = queue.pop_top() else {
                break;
            };

            if entry.candidates.is_empty() {
                tracing::warn!(date = %entry.date, duty = %entry.duty, "slot unfilled: no candidates");
                outcome.unfilled.push((entry.date, entry.duty));
                continue;
            }

            let combination_rules = self.must_combination_duty_rules(&entry.duty, network);

            // the joint path and the single-placement fallback are mutually
            // exclusive arms (Design Notes §9's bug-fix: the source's
            // ambiguous fall-through-and-still-run-the-caller's-branch is
            // replaced with a clean if/else so a slot is never placed twice)
            let placed = if combination_rules.is_empty() {
                self.place_single(&entry, people, catalog, network, wishes, plan, &mut queue)
            } else {
                match self.place_joint(&entry, &combination_rules, people, catalog, network, wishes, plan, &mut queue) {
                    true => true,
                    false => self.place_single(&entry, people, catalog, network, wishes, plan, &mut queue),
                }
            };

            if !placed {
                outcome.unfilled.push((entry.date, entry.duty));
            }
        }

        outcome
    }

    fn must_combination_duty_rules(&self, duty: &DutyFormId, network: &RuleNetwork) -> Vec<Rule> {
        network
            .rules_of(&EntityRef::Duty(duty.clone()))
            .into_iter()
            .filter(|r| {
                r.weight == Weight::Must
                    && r.effect == Effect::Combination
                    && matches!(r.subject, Subject::DutyDuty(..))
            })
            .cloned()
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn place_joint(
        &self,
        entry: &QueueEntry,
        rules: &[Rule],
        people: &PersonRegistry,
        catalog: &DutyCatalog,
        network: &RuleNetwork,
        wishes: &mut WishRegistry,
        plan: &mut PlanState,
        queue: &mut PlanningQueue,
    ) -> bool {
        let mut joint_cand = entry.candidates.clone();
        let mut links: Vec<(DutyFormId, NaiveDate)> = Vec::new();

        for rule in rules {
            let Some((other_duty, other_date)) = rule.linked_duty_day(entry.date, &entry.duty, catalog) else {
                return false;
            };
            let Some(other_cand) = queue.candidates_for(other_date, &other_duty) else {
                return false;
            };
            joint_cand = joint_cand.intersection(other_cand).cloned().collect();
            links.push((other_duty, other_date));
            if joint_cand.is_empty() {
                return false;
            }
        }

        let Some(person) = self.select_best(
            entry.date,
            &entry.duty,
            &joint_cand,
            true,
            people,
            catalog,
            network,
            wishes,
            plan,
            queue,
        ) else {
            return false;
        };

        self.place(entry.date, entry.duty.clone(), person.clone(), plan, catalog, network, queue);
        for (other_duty, other_date) in &links {
            self.place(*other_date, other_duty.clone(), person.clone(), plan, catalog, network, queue);
            wishes.mark_fulfilled(*other_date, other_duty, &person);
            queue.take_entry(*other_date, other_duty);
        }

        true
    }

    #[allow(clippy::too_many_arguments)]
    fn place_single(
        &self,
        entry: &QueueEntry,
        people: &PersonRegistry,
        catalog: &DutyCatalog,
        network: &RuleNetwork,
        wishes: &mut WishRegistry,
        plan: &mut PlanState,
        queue: &mut PlanningQueue,
    ) -> bool {
        let Some(person) = self.select_best(
            entry.date,
            &entry.duty,
            &entry.candidates,
            false,
            people,
            catalog,
            network,
            wishes,
            plan,
            queue,
        ) else {
            return false;
        };
        self.place(entry.date, entry.duty.clone(), person, plan, catalog, network, queue);
        true
    }

    fn place(
        &self,
        date: NaiveDate,
        duty: DutyFormId,
        person: PersonId,
        plan: &mut PlanState,
        catalog: &DutyCatalog,
        network: &RuleNetwork,
        queue: &mut PlanningQueue,
    ) {
        plan.place(date, duty.clone(), person.clone());
        let mut visited = HashSet::new();
        self.cascade_remove(&person, date, &duty, queue, catalog, network, &mut visited);
    }

    /// spec.md §4.5.3, the top-level removal for a person newly placed on
    /// `(date, duty)`: drop them from every entry on `date`, from tomorrow if
    /// `duty` is follow-up-free, and retroactively from yesterday's
    /// follow-up-free entries (the driver may plan out of chronological
    /// order). The MUST-FORBIDDEN DutyDuty chain this placement triggers is
    /// handled separately by [`Self::cascade_forbidden_chain`]: that chain
    /// only ever speculatively drops `person` from one linked slot at a time,
    /// never the whole day `person` doesn't actually occupy.
    #[allow(clippy::too_many_arguments)]
    fn cascade_remove(
        &self,
        person: &PersonId,
        date: NaiveDate,
        duty: &DutyFormId,
        queue: &mut PlanningQueue,
        catalog: &DutyCatalog,
        network: &RuleNetwork,
        visited: &mut HashSet<(RuleId, NaiveDate)>,
    ) {
        queue.remove_person_from_day(date, person);

        if catalog.duty(duty).is_some_and(|d| d.follow_up_free) {
            queue.remove_person_from_day(date + Duration::days(1), person);
        }

        // the driver may plan out of chronological order; guard against a
        // retroactive follow-up-free violation on yesterday's entries
        let yesterday = date - Duration::days(1);
        for prev_duty in queue.duties_on(yesterday) {
            if catalog.duty(&prev_duty).is_some_and(|d| d.follow_up_free) {
                queue.remove_person_from_duty(yesterday, &prev_duty, person);
            }
        }

        self.cascade_forbidden_chain(person, date, duty, queue, catalog, network, visited);
    }

    /// spec.md §4.5.3's final bullet: for every MUST-FORBIDDEN DutyDuty rule
    /// touching `duty`, remove `person` from the single linked slot `(d',
    /// other-duty)` the rule implies, then recurse through that slot's own
    /// forbidden rules. Re-entrant but terminating per Design Note
    /// "Re-entrant cascade removal" (`visited` tracks `(rule, date)` pairs).
    /// Unlike [`Self::cascade_remove`], this never touches the rest of `d'`'s
    /// entries or follow-up-free pruning — `person` isn't placed on `d'`,
    /// only barred from this one slot.
    #[allow(clippy::too_many_arguments)]
    fn cascade_forbidden_chain(
        &self,
        person: &PersonId,
        date: NaiveDate,
        duty: &DutyFormId,
        queue: &mut PlanningQueue,
        catalog: &DutyCatalog,
        network: &RuleNetwork,
        visited: &mut HashSet<(RuleId, NaiveDate)>,
    ) {
        for rule in network.rules_of(&EntityRef::Duty(duty.clone())) {
            if rule.weight != Weight::Must || rule.effect != Effect::Forbidden {
                continue;
            }
            if !matches!(rule.subject, Subject::DutyDuty(..)) {
                continue;
            }
            if !visited.insert((rule.id, date)) {
                continue;
            }
            if let Some((other_duty, other_date)) = rule.linked_duty_day(date, duty, catalog) {
                queue.remove_person_from_duty(other_date, &other_duty, person);
                self.cascade_forbidden_chain(person, other_date, &other_duty, queue, catalog, network, visited);
            }
        }
    }

    /// spec.md §4.5.1
    #[allow(clippy::too_many_arguments)]
    fn select_best(
        &self,
        date: NaiveDate,
        duty: &DutyFormId,
        candidates: &BTreeSet<PersonId>,
        bypass: bool,
        people: &PersonRegistry,
        catalog: &DutyCatalog,
        network: &RuleNetwork,
        wishes: &mut WishRegistry,
        plan: &PlanState,
        queue: &PlanningQueue,
    ) -> Option<PersonId> {
        // §4.5.1(a)'s "if |K|=1, return the sole member" still has to clear
        // the dynamic caps from (c) — candidates only ever passed *static*
        // eligibility (§4.2's note: "dynamic caps are not checked here; they
        // are applied at selection time"), so a lone survivor that's already
        // at its monthly cap must still be rejected rather than force-placed.
        if candidates.len() == 1 {
            let person = candidates.iter().next()?;
            let eligible = self.passes_dynamic_caps(person, date, duty, people, catalog, network, plan)
                && (bypass || self.passes_consecutive_checks(person, date, duty, catalog, plan));
            return eligible.then(|| person.clone());
        }

        let wishers: Vec<PersonId> = wishes
            .wish_persons(date, duty)
            .into_iter()
            .filter(|p| candidates.contains(p))
            .collect();

        if !wishers.is_empty()
            && let Some(person) =
                self.select_best_wish(&wishers, date, duty, bypass, people, catalog, network, wishes, plan, queue)
        {
            wishes.mark_fulfilled(date, duty, &person);
            return Some(person);
        }

        let mut survivors: Vec<&PersonId> = candidates
            .iter()
            .filter(|p| self.passes_dynamic_caps(p, date, duty, people, catalog, network, plan))
            .filter(|p| bypass || self.passes_consecutive_checks(p, date, duty, catalog, plan))
            .collect();

        survivors.sort_by(|a, b| {
            let wa = plan.weighted_total_in_month(a, month_of(date), catalog);
            let wb = plan.weighted_total_in_month(b, month_of(date), catalog);
            wa.total_cmp(&wb)
                .then_with(|| queue.availability_count(a).cmp(&queue.availability_count(b)))
                .then_with(|| (0.5 * wa).total_cmp(&(0.5 * wb)))
                .then_with(|| a.cmp(b))
        });

        survivors.first().map(|p| (*p).clone())
    }

    /// spec.md §4.5.2
    #[allow(clippy::too_many_arguments)]
    fn select_best_wish(
        &self,
        wishers: &[PersonId],
        date: NaiveDate,
        duty: &DutyFormId,
        bypass: bool,
        people: &PersonRegistry,
        catalog: &DutyCatalog,
        network: &RuleNetwork,
        wishes: &WishRegistry,
        plan: &PlanState,
        queue: &PlanningQueue,
    ) -> Option<PersonId> {
        let mut ordered = wishers.to_vec();
        ordered.sort_by(|a, b| {
            wishes
                .fulfilled_count(a)
                .cmp(&wishes.fulfilled_count(b))
                .then_with(|| wishes.submitted_count(b).cmp(&wishes.submitted_count(a)))
                .then_with(|| queue.availability_count(a).cmp(&queue.availability_count(b)))
                .then_with(|| {
                    plan.weighted_total_in_month(a, month_of(date), catalog)
                        .total_cmp(&plan.weighted_total_in_month(b, month_of(date), catalog))
                })
                .then_with(|| a.cmp(b))
        });

        ordered.into_iter().find(|p| {
            self.passes_dynamic_caps(p, date, duty, people, catalog, network, plan)
                && (bypass || self.passes_consecutive_checks(p, date, duty, catalog, plan))
        })
    }

    /// spec.md §4.5.1(c): the dynamic caps, checked at selection time
    #[allow(clippy::too_many_arguments)]
    fn passes_dynamic_caps(
        &self,
        person_id: &PersonId,
        date: NaiveDate,
        duty: &DutyFormId,
        people: &PersonRegistry,
        catalog: &DutyCatalog,
        network: &RuleNetwork,
        plan: &PlanState,
    ) -> bool {
        let Some(person) = people.get(person_id) else {
            return false;
        };
        let Some(duty_form) = catalog.duty(duty) else {
            return false;
        };

        let weighted = plan.weighted_total_in_month(person_id, month_of(date), catalog);
        if weighted >= (person.monthly_cap() - self.margin) as f64 {
            return false;
        }
        if plan.duty_count_in_month(person_id, duty, month_of(date)) >= duty_form.max_per_month as usize {
            return false;
        }

        for linked in &duty_form.linked_forms {
            if let Some(holder) = plan.get(date, linked)
                && holder != person_id
                && network.exists(
                    &EntityRef::Person(person_id.clone()),
                    &EntityRef::Person(holder.clone()),
                    Weight::Must,
                    Effect::Forbidden,
                )
            {
                return false;
            }
        }

        true
    }

    /// spec.md §4.5.1(c)'s bypass-only checks: follow-up-free yesterday and
    /// the in-a-row limit. Skipped for joint placement (spec.md §4.5 step 3
    /// passes `with-consecutive-bypass=true`).
    fn passes_consecutive_checks(
        &self,
        person_id: &PersonId,
        date: NaiveDate,
        duty: &DutyFormId,
        catalog: &DutyCatalog,
        plan: &PlanState,
    ) -> bool {
        if plan.held_follow_up_free(date - Duration::days(1), person_id, catalog) {
            return false;
        }
        let Some(duty_form) = catalog.duty(duty) else {
            return false;
        };
        plan.run_before(date, duty, person_id) < duty_form.max_in_a_row
    }
}
