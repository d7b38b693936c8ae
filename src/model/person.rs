//! person master data
//!
//! per spec.md's ownership note, people are read-only shared references
//! during planning: all mutable bookkeeping (which duties a person actually
//! holds, on which dates) lives in [`crate::model::plan::PlanState`], not
//! here. this mirrors the teacher's `PersonState`, but moves the mutable
//! tracking fields (`total_services`, `weekday_counts`, ...) out of the
//! person and into the plan, since this spec's selection rules need to
//! query the shared plan (monthly totals, consecutive runs) rather than a
//! per-person running tally that the original single-pass algorithm kept.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::model::entity::{PersonId, RotationTemplateId};

/// a concrete, dated rotation assignment for one person
///
/// identity is `(person, active_interval)`; stored inline on the person
/// since the person is always the first half of that identity.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationConcrete {
    pub active_interval: (NaiveDate, NaiveDate),
    pub rotation_template: RotationTemplateId,
}

impl RotationConcrete {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.active_interval.0 <= date && date <= self.active_interval.1
    }
}

#[derive(Debug, Clone)]
pub struct Person {
    pub id: PersonId,
    /// work capacity, (0, 1]; used as the monthly duty cap `round(10 * capacity)`
    pub work_capacity: f64,
    pub duty_fit: bool,
    pub absences: BTreeSet<NaiveDate>,
    pub rotations: Vec<RotationConcrete>,
}

impl Person {
    pub fn new(id: impl Into<PersonId>, work_capacity: f64) -> Self {
        Self {
            id: id.into(),
            work_capacity,
            duty_fit: true,
            absences: BTreeSet::new(),
            rotations: Vec::new(),
        }
    }

    pub fn is_absent(&self, date: NaiveDate) -> bool {
        self.absences.contains(&date)
    }

    /// the rotation template active for this person on `date`, if any
    pub fn active_rotation(&self, date: NaiveDate) -> Option<&RotationTemplateId> {
        self.rotations
            .iter()
            .find(|r| r.covers(date))
            .map(|r| &r.rotation_template)
    }

    /// monthly duty cap derived from work capacity, per I7
    pub fn monthly_cap(&self) -> i64 {
        (10.0 * self.work_capacity).round() as i64
    }
}

/// a lookup table of people, keyed by id
#[derive(Debug, Clone, Default)]
pub struct PersonRegistry {
    people: BTreeMap<PersonId, Person>,
}

impl PersonRegistry {
    pub fn new(people: Vec<Person>) -> Self {
        Self {
            people: people.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn get(&self, id: &PersonId) -> Option<&Person> {
        self.people.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &PersonId> {
        self.people.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn monthly_cap_rounds_to_nearest() {
        let p = Person::new("alice", 0.75);
        assert_eq!(p.monthly_cap(), 8); // round(7.5) = 8
    }

    #[test]
    fn absence_lookup() {
        let mut p = Person::new("bob", 1.0);
        p.absences.insert(d(2025, 3, 4));
        assert!(p.is_absent(d(2025, 3, 4)));
        assert!(!p.is_absent(d(2025, 3, 5)));
    }

    #[test]
    fn active_rotation_matches_interval() {
        let mut p = Person::new("carla", 1.0);
        p.rotations.push(RotationConcrete {
            active_interval: (d(2025, 1, 1), d(2025, 1, 31)),
            rotation_template: RotationTemplateId::new("senior-oncall"),
        });

        assert_eq!(
            p.active_rotation(d(2025, 1, 15)),
            Some(&RotationTemplateId::new("senior-oncall"))
        );
        assert_eq!(p.active_rotation(d(2025, 2, 1)), None);
    }

    #[test]
    fn registry_looks_up_by_id() {
        let reg = PersonRegistry::new(vec![Person::new("a", 1.0), Person::new("b", 0.5)]);
        assert!(reg.get(&PersonId::new("a")).is_some());
        assert!(reg.get(&PersonId::new("z")).is_none());
        assert_eq!(reg.len(), 2);
    }
}
