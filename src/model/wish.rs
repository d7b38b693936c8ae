//! wish registry: per-(date, duty) requests, free-day requests, and the
//! per-person submitted/fulfilled counters used to break ties fairly

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::model::entity::{DutyFormId, PersonId};

#[derive(Debug, Clone)]
pub struct Wish {
    pub person: PersonId,
    pub date: NaiveDate,
    pub duty: DutyFormId,
    pub fulfilled: bool,
}

/// spec.md §3's `FreeWish`: a person's request to hold no duty at all on
/// `date`. Identity is `(person, date)`, unique per the data model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FreeWish {
    pub person: PersonId,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default)]
struct PersonCounters {
    submitted: u32,
    fulfilled: u32,
}

#[derive(Debug, Clone, Default)]
pub struct WishRegistry {
    // (date, duty) -> persons who requested it, in submission order
    by_slot: BTreeMap<(NaiveDate, DutyFormId), Vec<Wish>>,
    counters: HashMap<PersonId, PersonCounters>,
    free_wishes: HashSet<FreeWish>,
}

impl WishRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_wish(&mut self, person: PersonId, date: NaiveDate, duty: DutyFormId) {
        self.counters.entry(person.clone()).or_default().submitted += 1;
        self.by_slot
            .entry((date, duty.clone()))
            .or_default()
            .push(Wish {
                person,
                date,
                duty,
                fulfilled: false,
            });
    }

    pub fn add_free_wish(&mut self, person: PersonId, date: NaiveDate) {
        self.free_wishes.insert(FreeWish { person, date });
    }

    pub fn has_free_wish(&self, person: &PersonId, date: NaiveDate) -> bool {
        self.free_wishes.contains(&FreeWish {
            person: person.clone(),
            date,
        })
    }

    pub fn is_requested(&self, date: NaiveDate, duty: &DutyFormId) -> bool {
        self.by_slot
            .get(&(date, duty.clone()))
            .is_some_and(|w| !w.is_empty())
    }

    /// persons who wished for this slot, in the order they were submitted
    pub fn wish_persons(&self, date: NaiveDate, duty: &DutyFormId) -> Vec<PersonId> {
        self.by_slot
            .get(&(date, duty.clone()))
            .map(|ws| ws.iter().map(|w| w.person.clone()).collect())
            .unwrap_or_default()
    }

    pub fn submitted_count(&self, person: &PersonId) -> u32 {
        self.counters.get(person).map(|c| c.submitted).unwrap_or(0)
    }

    pub fn fulfilled_count(&self, person: &PersonId) -> u32 {
        self.counters.get(person).map(|c| c.fulfilled).unwrap_or(0)
    }

    /// mark a wish fulfilled; returns true if a matching unsatisfied wish existed
    pub fn mark_fulfilled(&mut self, date: NaiveDate, duty: &DutyFormId, person: &PersonId) -> bool {
        let Some(wishes) = self.by_slot.get_mut(&(date, duty.clone())) else {
            return false;
        };
        let Some(w) = wishes
            .iter_mut()
            .find(|w| &w.person == person && !w.fulfilled)
        else {
            return false;
        };
        w.fulfilled = true;
        self.counters.entry(person.clone()).or_default().fulfilled += 1;
        true
    }

    /// every fulfilled wish, for property P8 ("every fulfilled wish
    /// corresponds to an actual assignment")
    pub fn fulfilled_wishes(&self) -> Vec<&Wish> {
        self.by_slot
            .values()
            .flatten()
            .filter(|w| w.fulfilled)
            .collect()
    }
}
