//! the produced duty plan: `date -> duty-form -> person`, plus the read
//! queries the scheduler needs (monthly totals, consecutive runs, ...)

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::model::duty::DutyCatalog;
use crate::model::entity::{DutyFormId, PersonId};

pub type Month = (i32, u32);

pub fn month_of(date: NaiveDate) -> Month {
    (date.year(), date.month())
}

/// `date -> duty-form -> person`
#[derive(Debug, Clone, Default)]
pub struct PlanState {
    entries: BTreeMap<NaiveDate, BTreeMap<DutyFormId, PersonId>>,
}

impl PlanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// bulk-load an externally seeded plan (spec.md §3, `seed-plan` input)
    pub fn seed(&mut self, seed: BTreeMap<NaiveDate, BTreeMap<DutyFormId, PersonId>>) {
        for (date, duties) in seed {
            let slot = self.entries.entry(date).or_default();
            for (duty, person) in duties {
                slot.insert(duty, person);
            }
        }
    }

    pub fn place(&mut self, date: NaiveDate, duty: DutyFormId, person: PersonId) {
        self.entries.entry(date).or_default().insert(duty, person);
    }

    pub fn unplace(&mut self, date: NaiveDate, duty: &DutyFormId) -> Option<PersonId> {
        let removed = self.entries.get_mut(&date).and_then(|m| m.remove(duty));
        if let Some(slot) = self.entries.get(&date) {
            if slot.is_empty() {
                self.entries.remove(&date);
            }
        }
        removed
    }

    pub fn get(&self, date: NaiveDate, duty: &DutyFormId) -> Option<&PersonId> {
        self.entries.get(&date)?.get(duty)
    }

    pub fn duties_on(&self, date: NaiveDate) -> impl Iterator<Item = (&DutyFormId, &PersonId)> {
        self.entries
            .get(&date)
            .into_iter()
            .flat_map(|m| m.iter())
    }

    /// any duty form `person` holds on `date`, if more than one this just
    /// returns the first found (I2 permits at most a MUST-COMBINATION pair)
    pub fn duties_held_by(&self, date: NaiveDate, person: &PersonId) -> Vec<DutyFormId> {
        self.duties_on(date)
            .filter(|(_, p)| *p == person)
            .map(|(f, _)| f.clone())
            .collect()
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.entries.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// consecutive days, counting backward from (and including) `date`, that
    /// `person` has held `duty`; spec.md §4.2 point 5's `run(p, f, d)`
    /// counts only days strictly before `date` — use [`PlanState::run_before`]
    /// for the eligibility check and this for post-placement bookkeeping.
    pub fn run_ending(&self, date: NaiveDate, duty: &DutyFormId, person: &PersonId) -> u32 {
        let mut run = 0u32;
        let mut cursor = date;
        loop {
            match self.get(cursor, duty) {
                Some(p) if p == person => {
                    run += 1;
                    cursor -= Duration::days(1);
                }
                _ => break,
            }
        }
        run
    }

    /// `run(p, f, d)` from spec.md §4.2: the consecutive days before `d`
    /// (d-1, d-2, ...) that `p` held `f`
    pub fn run_before(&self, date: NaiveDate, duty: &DutyFormId, person: &PersonId) -> u32 {
        self.run_ending(date - Duration::days(1), duty, person)
    }

    /// did `person` hold any follow-up-free duty on `date`?
    pub fn held_follow_up_free(&self, date: NaiveDate, person: &PersonId, catalog: &DutyCatalog) -> bool {
        self.duties_on(date).any(|(duty, p)| {
            p == person
                && catalog
                    .duty(duty)
                    .map(|d| d.follow_up_free)
                    .unwrap_or(false)
        })
    }

    /// count of assignments of `duty` to `person` within `month`
    pub fn duty_count_in_month(&self, person: &PersonId, duty: &DutyFormId, month: Month) -> usize {
        self.entries
            .iter()
            .filter(|(date, _)| month_of(**date) == month)
            .filter(|(_, slots)| slots.get(duty).map(|p| p == person).unwrap_or(false))
            .count()
    }

    /// sum of `duty.weight` over all duties `person` holds within `month`
    pub fn weighted_total_in_month(&self, person: &PersonId, month: Month, catalog: &DutyCatalog) -> f64 {
        self.entries
            .iter()
            .filter(|(date, _)| month_of(**date) == month)
            .flat_map(|(_, slots)| slots.iter())
            .filter(|(_, p)| *p == person)
            .filter_map(|(duty, _)| catalog.duty(duty))
            .map(|d| d.weight)
            .sum()
    }
}
