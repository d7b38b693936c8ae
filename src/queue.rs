//! the dynamic-priority planning queue (spec.md §4.4)
//!
//! Design Note "Dynamic priority queue": a binary heap can't represent keys
//! that mutate after insertion (candidate-set size shrinks as people get
//! placed). Implemented as option (a), "full rebuild" — a `Vec` resorted
//! after every placement — chosen explicitly for clarity over a
//! decrease-key heap, per spec.md §9.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::candidates::PlanningMap;
use crate::model::entity::{DutyFormId, EntityRef, PersonId};
use crate::model::wish::WishRegistry;
use crate::rules::RuleNetwork;

#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub date: NaiveDate,
    pub duty: DutyFormId,
    pub wished: bool,
    pub wish_count: u32,
    pub fine_priority: i64,
    pub candidates: BTreeSet<PersonId>,
    seq: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PlanningQueue {
    entries: Vec<QueueEntry>,
}

impl PlanningQueue {
    /// builds the queue from a planning map, fixing each entry's
    /// `wish_count` (static: drawn from the wish registry, not the mutating
    /// candidate set) and `fine_priority`; insertion order follows the map's
    /// iteration order (chronological day, then duty-form id) per §5's
    /// reproducibility requirement.
    pub fn build(map: PlanningMap, wishes: &WishRegistry, network: &RuleNetwork) -> Self {
        let mut seq = 0u64;
        let mut entries = Vec::new();
        for (date, duties) in map {
            for (duty, (wished, candidates)) in duties {
                let wish_count = wishes.wish_persons(date, &duty).len() as u32;
                let fine_priority = network.fine_priority(&EntityRef::Duty(duty.clone()));
                entries.push(QueueEntry {
                    date,
                    duty,
                    wished,
                    wish_count,
                    fine_priority,
                    candidates,
                    seq,
                });
                seq += 1;
            }
        }
        let mut queue = Self { entries };
        queue.resort();
        queue
    }

    /// spec.md §4.4's lexicographic comparator: wished first, then fewer
    /// wishers, then tighter candidate sets, then higher fine-priority,
    /// with insertion order as the final, stable tie-break.
    pub fn resort(&mut self) {
        self.entries.sort_by(|a, b| {
            let key = |e: &QueueEntry| {
                (
                    u8::from(!e.wished),
                    e.wish_count,
                    e.candidates.len(),
                    -e.fine_priority,
                    e.seq,
                )
            };
            key(a).cmp(&key(b))
        });
    }

    pub fn pop_top(&mut self) -> Option<QueueEntry> {
        (!self.entries.is_empty()).then(|| self.entries.remove(0))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn candidates_for(&self, date: NaiveDate, duty: &DutyFormId) -> Option<&BTreeSet<PersonId>> {
        self.entries
            .iter()
            .find(|e| e.date == date && &e.duty == duty)
            .map(|e| &e.candidates)
    }

    /// removes and returns a still-queued entry, used to consume the
    /// second leg of a joint placement
    pub fn take_entry(&mut self, date: NaiveDate, duty: &DutyFormId) -> Option<QueueEntry> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.date == date && &e.duty == duty)?;
        Some(self.entries.remove(idx))
    }

    pub fn duties_on(&self, date: NaiveDate) -> Vec<DutyFormId> {
        self.entries
            .iter()
            .filter(|e| e.date == date)
            .map(|e| e.duty.clone())
            .collect()
    }

    pub fn remove_person_from_day(&mut self, date: NaiveDate, person: &PersonId) {
        for e in self.entries.iter_mut().filter(|e| e.date == date) {
            e.candidates.remove(person);
        }
    }

    pub fn remove_person_from_duty(&mut self, date: NaiveDate, duty: &DutyFormId, person: &PersonId) {
        if let Some(e) = self
            .entries
            .iter_mut()
            .find(|e| e.date == date && &e.duty == duty)
        {
            e.candidates.remove(person);
        }
    }

    /// `queue-availability-count(p)` (spec.md §4.5.1): entries whose
    /// candidate set still contains `p`
    pub fn availability_count(&self, person: &PersonId) -> usize {
        self.entries
            .iter()
            .filter(|e| e.candidates.contains(person))
            .count()
    }
}
