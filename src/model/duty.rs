//! duty catalog: duty forms, their groups, and the weekday/holiday lookup

use std::collections::BTreeMap;

use chrono::Weekday;

use crate::error::{Result, RosterError};
use crate::model::entity::{DutyFormId, DutyGroupId};

/// equivalence class of duty forms across weekdays; carries holiday applicability
#[derive(Debug, Clone)]
pub struct DutyGroup {
    pub id: DutyGroupId,
    pub applies_on_holidays: bool,
}

/// a concrete shift type tied to a weekday with its own rules
#[derive(Debug, Clone)]
pub struct DutyForm {
    pub id: DutyFormId,
    pub applicable_weekday: Weekday,
    pub group: DutyGroupId,
    pub follow_up_free: bool,
    pub max_in_a_row: u32,
    pub max_per_month: u32,
    pub weight: f64,
    /// other duty forms considered "concurrent" with this one on the same day
    pub linked_forms: Vec<DutyFormId>,
}

impl DutyForm {
    pub fn validate(&self) -> Result<()> {
        if self.max_in_a_row < 1 {
            return Err(RosterError::InvalidMaxInARow {
                duty: self.id.to_string(),
                value: self.max_in_a_row,
            });
        }
        Ok(())
    }
}

/// read-only index of duty forms and groups, by id
#[derive(Debug, Clone, Default)]
pub struct DutyCatalog {
    forms: BTreeMap<DutyFormId, DutyForm>,
    groups: BTreeMap<DutyGroupId, DutyGroup>,
}

impl DutyCatalog {
    pub fn build(forms: Vec<DutyForm>, groups: Vec<DutyGroup>) -> Result<Self> {
        let groups: BTreeMap<_, _> = groups.into_iter().map(|g| (g.id.clone(), g)).collect();

        for f in &forms {
            f.validate()?;
            if !groups.contains_key(&f.group) {
                return Err(RosterError::UnknownGroup {
                    duty: f.id.to_string(),
                    group: f.group.to_string(),
                });
            }
        }

        Ok(Self {
            forms: forms.into_iter().map(|f| (f.id.clone(), f)).collect(),
            groups,
        })
    }

    pub fn duty(&self, id: &DutyFormId) -> Option<&DutyForm> {
        self.forms.get(id)
    }

    pub fn group(&self, id: &DutyGroupId) -> Option<&DutyGroup> {
        self.groups.get(id)
    }

    pub fn all_forms(&self) -> impl Iterator<Item = &DutyForm> {
        self.forms.values()
    }

    /// duty forms applicable on a plain (non-holiday) weekday
    pub fn forms_for_weekday(&self, weekday: Weekday) -> Vec<DutyFormId> {
        self.forms
            .values()
            .filter(|f| f.applicable_weekday == weekday)
            .map(|f| f.id.clone())
            .collect()
    }

    /// only the SUNDAY-weekday variant of each holiday-eligible group is
    /// scheduled on holidays (spec.md §4.3's holiday policy)
    pub fn holiday_forms(&self) -> Vec<DutyFormId> {
        self.forms
            .values()
            .filter(|f| f.applicable_weekday == Weekday::Sun)
            .filter(|f| {
                self.groups
                    .get(&f.group)
                    .map(|g| g.applies_on_holidays)
                    .unwrap_or(false)
            })
            .map(|f| f.id.clone())
            .collect()
    }
}
